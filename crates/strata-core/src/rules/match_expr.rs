/*!
# Match Expression Desugaring

Turns a source match expression into a HighIR match node. Pattern compilation,
binding extraction, exhaustiveness and result typing all belong to the
context's `match_analyzer`; this rule only hands it the scrutinee type, the
arms and the `transform_arm` callback, and builds the node from what it
returns.
*/

use tracing::debug;

use crate::ast::SourceAst;
use crate::errors::LoweringError;
use crate::hir::HirNode;
use crate::node::Node;
use crate::rewrite::{CollaboratorKey, LoweringContext, LoweringRule, Rewrite, RewriteResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct MatchDesugaring;

impl MatchDesugaring {
    pub fn new() -> Self {
        Self
    }
}

impl LoweringRule for MatchDesugaring {
    fn name(&self) -> &'static str {
        "MatchDesugaring"
    }

    fn description(&self) -> &'static str {
        "Desugars source match expressions into HighIR match nodes via the match analyzer"
    }

    fn requires(&self) -> Vec<CollaboratorKey> {
        vec![
            CollaboratorKey::Scrutinee,
            CollaboratorKey::MatchAnalyzer,
            CollaboratorKey::TransformArm,
        ]
    }

    fn applies(&self, node: &Node, _context: &LoweringContext<'_>) -> bool {
        matches!(node, Node::Source(SourceAst::Match { .. }))
    }

    fn apply(&self, node: &Node, context: &LoweringContext<'_>) -> RewriteResult<Rewrite> {
        let Node::Source(SourceAst::Match { arms, .. }) = node else {
            return Err(LoweringError::unexpected_node(
                self.name(),
                "a source match expression",
                node.kind(),
            )
            .into());
        };

        let scrutinee = context.scrutinee()?;
        let analyzer = context.match_analyzer()?;
        let transform_arm = context.transform_arm()?;

        let analysis = analyzer.analyze(&scrutinee.ty, arms, transform_arm)?;
        debug!(
            arms = analysis.arms.len(),
            result_type = %analysis.result_type,
            "match analyzed"
        );

        Ok(Rewrite::replaced(HirNode::Match {
            scrutinee: Box::new(scrutinee.node.clone()),
            arms: analysis.arms,
            result_type: analysis.result_type,
        }))
    }
}
