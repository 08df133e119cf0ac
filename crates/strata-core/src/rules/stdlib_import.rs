/*!
# Standard Library Import Resolution

Resolves `import` declarations against the standard library registry.
Every resolved function is registered through `register_stdlib_function` and
announced on the event bus; every unknown name goes to `on_missing_item` and
is announced as well. Selective and wildcard imports share this path.
*/

use tracing::debug;

use crate::ast::SourceAst;
use crate::errors::LoweringError;
use crate::events::Event;
use crate::hir::HirNode;
use crate::node::Node;
use crate::rewrite::{CollaboratorKey, LoweringContext, LoweringRule, Rewrite, RewriteResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct StdlibImportResolution;

impl StdlibImportResolution {
    pub fn new() -> Self {
        Self
    }
}

impl LoweringRule for StdlibImportResolution {
    fn name(&self) -> &'static str {
        "StdlibImportResolution"
    }

    fn description(&self) -> &'static str {
        "Resolves standard library imports and registers the imported functions"
    }

    fn requires(&self) -> Vec<CollaboratorKey> {
        vec![
            CollaboratorKey::StdlibRegistry,
            CollaboratorKey::RegisterStdlibFunction,
            CollaboratorKey::OnMissingItem,
            CollaboratorKey::EventBus,
        ]
    }

    fn applies(&self, node: &Node, _context: &LoweringContext<'_>) -> bool {
        matches!(node, Node::Source(SourceAst::Import(_)))
    }

    fn apply(&self, node: &Node, context: &LoweringContext<'_>) -> RewriteResult<Rewrite> {
        let Node::Source(SourceAst::Import(import)) = node else {
            return Err(LoweringError::unexpected_node(
                self.name(),
                "an import declaration",
                node.kind(),
            )
            .into());
        };

        // No side effect may happen before every collaborator is known to be present
        context.require(&self.requires())?;
        let registry = context.stdlib_registry()?;
        let register = context.register_stdlib_function()?;
        let on_missing = context.on_missing_item()?;
        let bus = context.event_bus()?;

        let resolution = registry.resolve(&import.path, &import.selection)?;
        debug!(
            module = %import.path,
            resolved = resolution.resolved.len(),
            missing = resolution.missing.len(),
            "import resolved"
        );

        let mut functions = Vec::with_capacity(resolution.resolved.len());
        for decl in resolution.resolved {
            register(&decl)?;
            functions.push(decl.name.clone());
            bus.publish(Event::StdlibFunctionImported {
                module: import.path.clone(),
                function: decl,
            })?;
        }

        for name in resolution.missing {
            on_missing(name.as_str(), import.origin.as_deref())?;
            bus.publish(Event::StdlibMissingItem {
                module: import.path.clone(),
                name,
                origin: import.origin.clone(),
            })?;
        }

        Ok(Rewrite::replaced(HirNode::Import {
            module: import.path.clone(),
            functions,
        }))
    }
}
