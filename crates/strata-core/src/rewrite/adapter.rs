/*!
# Delegating Adapter

A rule that forwards claimed nodes to a method on a collaborator found in the
lowering context, so logic that already lives in a recursive-descent lowerer
can take part in a stage without being duplicated.

The claimed kinds, the method and the context key are fixed once in a
[`DelegateDescriptor`]; every rule instance built from it shares the same
descriptor.
*/

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use tracing::trace;

use crate::node::{Node, NodeKind};

use super::context::{CollaboratorKey, LoweringContext};
use super::patterns::{KindSet, NodePattern};
use super::rules::{LoweringRule, Rewrite};
use super::RewriteResult;

/// Context key delegates are looked up under unless a descriptor says otherwise
pub const DEFAULT_DELEGATE_KEY: &str = "transformer";

/// Method invoked on the delegate with the claimed node
pub type DelegateMethod<D> = fn(&D, &Node) -> RewriteResult<Node>;

/// Immutable adapter configuration
pub struct DelegateDescriptor<D> {
    claims: KindSet,
    method_name: &'static str,
    method: DelegateMethod<D>,
    key: Cow<'static, str>,
}

impl<D> DelegateDescriptor<D> {
    pub fn new(
        claims: impl IntoIterator<Item = NodeKind>,
        method_name: &'static str,
        method: DelegateMethod<D>,
    ) -> Self {
        Self {
            claims: KindSet::of(claims),
            method_name,
            method,
            key: Cow::Borrowed(DEFAULT_DELEGATE_KEY),
        }
    }

    /// Look the delegate up under `key` instead of the default
    pub fn with_key(mut self, key: impl Into<Cow<'static, str>>) -> Self {
        self.key = key.into();
        self
    }

    pub fn claims(&self) -> &KindSet {
        &self.claims
    }

    pub fn method_name(&self) -> &'static str {
        self.method_name
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<D> std::fmt::Debug for DelegateDescriptor<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateDescriptor")
            .field("claims", &self.claims)
            .field("method_name", &self.method_name)
            .field("key", &self.key)
            .finish()
    }
}

/// Rule that forwards to `D`'s configured method
pub struct DelegatingRule<D> {
    name: &'static str,
    descriptor: Arc<DelegateDescriptor<D>>,
}

impl<D> DelegatingRule<D> {
    pub fn new(name: &'static str, descriptor: DelegateDescriptor<D>) -> Self {
        Self::from_shared(name, Arc::new(descriptor))
    }

    /// Build another instance over an existing descriptor
    pub fn from_shared(name: &'static str, descriptor: Arc<DelegateDescriptor<D>>) -> Self {
        Self { name, descriptor }
    }

    pub fn descriptor(&self) -> &Arc<DelegateDescriptor<D>> {
        &self.descriptor
    }
}

impl<D> Clone for DelegatingRule<D> {
    fn clone(&self) -> Self {
        Self::from_shared(self.name, self.descriptor.clone())
    }
}

impl<D: Any> LoweringRule for DelegatingRule<D> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Forwards claimed nodes to a method on a context-supplied delegate"
    }

    fn requires(&self) -> Vec<CollaboratorKey> {
        vec![CollaboratorKey::Delegate(self.descriptor.key.clone())]
    }

    fn is_inert(&self) -> bool {
        self.descriptor.claims.is_empty()
    }

    fn applies(&self, node: &Node, _context: &LoweringContext<'_>) -> bool {
        self.descriptor.claims.matches(node)
    }

    fn apply(&self, node: &Node, context: &LoweringContext<'_>) -> RewriteResult<Rewrite> {
        let descriptor = &self.descriptor;
        let delegate = context.delegate::<D>(&descriptor.key)?;

        trace!(
            rule = self.name,
            method = descriptor.method_name,
            key = %descriptor.key,
            node = %node.kind(),
            "delegating"
        );

        let replacement = (descriptor.method)(delegate, node)?;
        Ok(Rewrite::Replaced(replacement))
    }
}
