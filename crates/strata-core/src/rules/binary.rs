/*!
# Binary Expression Lowering

Lowers HighIR binary expressions into target binary expressions. Operands are
lowered through the context's `lowerer`; this rule knows nothing about how
arbitrary subexpressions are lowered.
*/

use crate::errors::LoweringError;
use crate::hir::HirNode;
use crate::node::Node;
use crate::rewrite::{CollaboratorKey, LoweringContext, LoweringRule, Rewrite, RewriteResult};
use crate::target::{OperatorPadding, TargetNode};

/// Lowers `left op right`, keeping the operator text verbatim
///
/// The emitted node always carries single-space padding so it prints as
/// `left op right`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryExpressionLowering;

impl BinaryExpressionLowering {
    pub fn new() -> Self {
        Self
    }
}

impl LoweringRule for BinaryExpressionLowering {
    fn name(&self) -> &'static str {
        "BinaryExpressionLowering"
    }

    fn description(&self) -> &'static str {
        "Lowers HighIR binary expressions to target binary expressions"
    }

    fn requires(&self) -> Vec<CollaboratorKey> {
        vec![CollaboratorKey::Lowerer]
    }

    fn applies(&self, node: &Node, _context: &LoweringContext<'_>) -> bool {
        matches!(node, Node::Hir(HirNode::Binary { .. }))
    }

    fn apply(&self, node: &Node, context: &LoweringContext<'_>) -> RewriteResult<Rewrite> {
        let Node::Hir(HirNode::Binary { left, op, right, .. }) = node else {
            return Err(LoweringError::unexpected_node(
                self.name(),
                "a HighIR binary expression",
                node.kind(),
            )
            .into());
        };

        let lowerer = context.lowerer()?;
        let left = lowerer.lower_expression(left)?;
        let right = lowerer.lower_expression(right)?;

        Ok(Rewrite::replaced(TargetNode::Binary {
            left: Box::new(left),
            operator: op.clone(),
            right: Box::new(right),
            padding: OperatorPadding::single(),
        }))
    }
}
