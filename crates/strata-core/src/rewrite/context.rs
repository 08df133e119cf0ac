/*!
# Lowering Context

Per-invocation collaborators that rules may consult. A context borrows
everything it holds and is threaded through exactly one `RewriteEngine::apply`
call; the engine never stores it.
*/

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use crate::ast::{ImportSelection, MatchArm};
use crate::errors::LoweringError;
use crate::events::EventBus;
use crate::hir::{HirArm, HirNode, HirType, TypedValue};
use crate::stdlib::{FunctionDecl, StdlibResolution};
use crate::target::TargetNode;

use super::RewriteResult;

/// Lowers one arm body; receives the arm and the bindings its pattern introduces
pub type TransformArm<'a> = dyn Fn(&MatchArm, &[(String, HirType)]) -> RewriteResult<HirNode> + 'a;

/// Called once per resolved standard library function
pub type RegisterFunction<'a> = dyn Fn(&FunctionDecl) -> RewriteResult<()> + 'a;

/// Called once per unresolved import item with the import's origin
pub type MissingItemHandler<'a> = dyn Fn(&str, Option<&str>) -> RewriteResult<()> + 'a;

/// Lowers arbitrary HighIR expressions to the target AST
pub trait ExpressionLowerer {
    fn lower_expression(&self, node: &HirNode) -> RewriteResult<TargetNode>;
}

impl<F> ExpressionLowerer for F
where
    F: Fn(&HirNode) -> RewriteResult<TargetNode>,
{
    fn lower_expression(&self, node: &HirNode) -> RewriteResult<TargetNode> {
        self(node)
    }
}

/// Normalized arms and unified result type of a match expression
#[derive(Debug, Clone, PartialEq)]
pub struct MatchAnalysis {
    pub arms: Vec<HirArm>,
    pub result_type: HirType,
}

/// Pattern compilation, binding extraction, exhaustiveness and result typing
pub trait MatchAnalyzer {
    /// `transform_arm` may be invoked any number of times per arm
    fn analyze(
        &self,
        scrutinee_type: &HirType,
        arms: &[MatchArm],
        transform_arm: &TransformArm<'_>,
    ) -> RewriteResult<MatchAnalysis>;
}

/// Resolves an import path plus selection against known declarations
pub trait StdlibResolver {
    fn resolve(&self, path: &str, selection: &ImportSelection) -> RewriteResult<StdlibResolution>;
}

/// Names of the collaborator slots a rule can require
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollaboratorKey {
    Lowerer,
    Scrutinee,
    MatchAnalyzer,
    TransformArm,
    StdlibRegistry,
    RegisterStdlibFunction,
    OnMissingItem,
    EventBus,
    /// Delegate registered under a custom key
    Delegate(Cow<'static, str>),
}

impl CollaboratorKey {
    pub fn as_str(&self) -> &str {
        match self {
            CollaboratorKey::Lowerer => "lowerer",
            CollaboratorKey::Scrutinee => "scrutinee",
            CollaboratorKey::MatchAnalyzer => "match_analyzer",
            CollaboratorKey::TransformArm => "transform_arm",
            CollaboratorKey::StdlibRegistry => "stdlib_registry",
            CollaboratorKey::RegisterStdlibFunction => "register_stdlib_function",
            CollaboratorKey::OnMissingItem => "on_missing_item",
            CollaboratorKey::EventBus => "event_bus",
            CollaboratorKey::Delegate(key) => key,
        }
    }
}

impl fmt::Display for CollaboratorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Default)]
pub struct LoweringContext<'a> {
    lowerer: Option<&'a dyn ExpressionLowerer>,
    scrutinee: Option<&'a TypedValue>,
    match_analyzer: Option<&'a dyn MatchAnalyzer>,
    transform_arm: Option<&'a TransformArm<'a>>,
    stdlib_registry: Option<&'a dyn StdlibResolver>,
    register_stdlib_function: Option<&'a RegisterFunction<'a>>,
    on_missing_item: Option<&'a MissingItemHandler<'a>>,
    event_bus: Option<&'a EventBus>,
    delegates: Vec<(Cow<'static, str>, &'a dyn Any)>,
}

impl<'a> LoweringContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lowerer(mut self, lowerer: &'a dyn ExpressionLowerer) -> Self {
        self.lowerer = Some(lowerer);
        self
    }

    pub fn with_scrutinee(mut self, scrutinee: &'a TypedValue) -> Self {
        self.scrutinee = Some(scrutinee);
        self
    }

    pub fn with_match_analyzer(mut self, analyzer: &'a dyn MatchAnalyzer) -> Self {
        self.match_analyzer = Some(analyzer);
        self
    }

    pub fn with_transform_arm(mut self, transform_arm: &'a TransformArm<'a>) -> Self {
        self.transform_arm = Some(transform_arm);
        self
    }

    pub fn with_stdlib_registry(mut self, registry: &'a dyn StdlibResolver) -> Self {
        self.stdlib_registry = Some(registry);
        self
    }

    pub fn with_register_stdlib_function(mut self, callback: &'a RegisterFunction<'a>) -> Self {
        self.register_stdlib_function = Some(callback);
        self
    }

    pub fn with_on_missing_item(mut self, callback: &'a MissingItemHandler<'a>) -> Self {
        self.on_missing_item = Some(callback);
        self
    }

    pub fn with_event_bus(mut self, bus: &'a EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Make `delegate` available to delegating rules under `key`
    ///
    /// A later delegate under the same key replaces the earlier one.
    pub fn with_delegate<D: Any>(mut self, key: impl Into<Cow<'static, str>>, delegate: &'a D) -> Self {
        let key = key.into();
        self.delegates.retain(|(existing, _)| *existing != key);
        self.delegates.push((key, delegate as &'a dyn Any));
        self
    }

    pub fn lowerer(&self) -> Result<&'a dyn ExpressionLowerer, LoweringError> {
        self.lowerer
            .ok_or_else(|| LoweringError::missing(CollaboratorKey::Lowerer))
    }

    pub fn scrutinee(&self) -> Result<&'a TypedValue, LoweringError> {
        self.scrutinee
            .ok_or_else(|| LoweringError::missing(CollaboratorKey::Scrutinee))
    }

    pub fn match_analyzer(&self) -> Result<&'a dyn MatchAnalyzer, LoweringError> {
        self.match_analyzer
            .ok_or_else(|| LoweringError::missing(CollaboratorKey::MatchAnalyzer))
    }

    pub fn transform_arm(&self) -> Result<&'a TransformArm<'a>, LoweringError> {
        self.transform_arm
            .ok_or_else(|| LoweringError::missing(CollaboratorKey::TransformArm))
    }

    pub fn stdlib_registry(&self) -> Result<&'a dyn StdlibResolver, LoweringError> {
        self.stdlib_registry
            .ok_or_else(|| LoweringError::missing(CollaboratorKey::StdlibRegistry))
    }

    pub fn register_stdlib_function(&self) -> Result<&'a RegisterFunction<'a>, LoweringError> {
        self.register_stdlib_function
            .ok_or_else(|| LoweringError::missing(CollaboratorKey::RegisterStdlibFunction))
    }

    pub fn on_missing_item(&self) -> Result<&'a MissingItemHandler<'a>, LoweringError> {
        self.on_missing_item
            .ok_or_else(|| LoweringError::missing(CollaboratorKey::OnMissingItem))
    }

    pub fn event_bus(&self) -> Result<&'a EventBus, LoweringError> {
        self.event_bus
            .ok_or_else(|| LoweringError::missing(CollaboratorKey::EventBus))
    }

    /// Look up the delegate stored under `key` as a `D`
    pub fn delegate<D: Any>(&self, key: &str) -> Result<&'a D, LoweringError> {
        let delegate: &'a dyn Any = self
            .delegates
            .iter()
            .find(|(existing, _)| existing.as_ref() == key)
            .map(|(_, delegate)| *delegate)
            .ok_or_else(|| LoweringError::missing(key))?;

        delegate
            .downcast_ref::<D>()
            .ok_or_else(|| LoweringError::collaborator_type(key, std::any::type_name::<D>()))
    }

    pub fn has(&self, key: &CollaboratorKey) -> bool {
        match key {
            CollaboratorKey::Lowerer => self.lowerer.is_some(),
            CollaboratorKey::Scrutinee => self.scrutinee.is_some(),
            CollaboratorKey::MatchAnalyzer => self.match_analyzer.is_some(),
            CollaboratorKey::TransformArm => self.transform_arm.is_some(),
            CollaboratorKey::StdlibRegistry => self.stdlib_registry.is_some(),
            CollaboratorKey::RegisterStdlibFunction => self.register_stdlib_function.is_some(),
            CollaboratorKey::OnMissingItem => self.on_missing_item.is_some(),
            CollaboratorKey::EventBus => self.event_bus.is_some(),
            CollaboratorKey::Delegate(name) => {
                self.delegates.iter().any(|(existing, _)| existing == name)
            }
        }
    }

    /// Check that every key in `required` is present, reporting all that are not
    pub fn require(&self, required: &[CollaboratorKey]) -> Result<(), LoweringError> {
        let mut missing: Vec<String> = Vec::new();
        for key in required {
            let name = key.to_string();
            if !self.has(key) && !missing.contains(&name) {
                missing.push(name);
            }
        }

        match missing.len() {
            0 => Ok(()),
            1 => Err(LoweringError::MissingCollaborator {
                key: missing.remove(0),
            }),
            _ => Err(LoweringError::MissingCollaborators { keys: missing }),
        }
    }

    fn present_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = [
            CollaboratorKey::Lowerer,
            CollaboratorKey::Scrutinee,
            CollaboratorKey::MatchAnalyzer,
            CollaboratorKey::TransformArm,
            CollaboratorKey::StdlibRegistry,
            CollaboratorKey::RegisterStdlibFunction,
            CollaboratorKey::OnMissingItem,
            CollaboratorKey::EventBus,
        ]
        .into_iter()
        .filter(|key| self.has(key))
        .map(|key| key.to_string())
        .collect();
        keys.extend(self.delegates.iter().map(|(key, _)| key.to_string()));
        keys
    }
}

impl fmt::Debug for LoweringContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoweringContext")
            .field("collaborators", &self.present_keys())
            .finish()
    }
}
