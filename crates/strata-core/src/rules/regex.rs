/*!
# Regex Literal Lowering

Lowers HighIR regex literals into a call of the target regex constructor with
the pattern as its only argument. The constructor is chosen from the literal's
flags alone.
*/

use crate::config::LoweringConfig;
use crate::errors::LoweringError;
use crate::hir::HirNode;
use crate::node::Node;
use crate::rewrite::{LoweringContext, LoweringRule, Rewrite, RewriteResult};
use crate::target::TargetNode;

#[derive(Debug, Clone)]
pub struct RegexLiteralLowering {
    constructor: String,
    case_insensitive_constructor: String,
    case_insensitive_flag: char,
}

impl RegexLiteralLowering {
    pub fn new() -> Self {
        Self::from_config(&LoweringConfig::default())
    }

    pub fn from_config(config: &LoweringConfig) -> Self {
        Self {
            constructor: config.regex_constructor.clone(),
            case_insensitive_constructor: config.regex_case_insensitive_constructor.clone(),
            case_insensitive_flag: config.case_insensitive_flag,
        }
    }

    /// Constructor name for a literal with `flags`
    pub fn constructor_for(&self, flags: &str) -> &str {
        if flags.contains(self.case_insensitive_flag) {
            &self.case_insensitive_constructor
        } else {
            &self.constructor
        }
    }
}

impl Default for RegexLiteralLowering {
    fn default() -> Self {
        Self::new()
    }
}

impl LoweringRule for RegexLiteralLowering {
    fn name(&self) -> &'static str {
        "RegexLiteralLowering"
    }

    fn description(&self) -> &'static str {
        "Lowers HighIR regex literals to a regex constructor call"
    }

    fn applies(&self, node: &Node, _context: &LoweringContext<'_>) -> bool {
        matches!(node, Node::Hir(HirNode::Regex { .. }))
    }

    fn apply(&self, node: &Node, _context: &LoweringContext<'_>) -> RewriteResult<Rewrite> {
        let Node::Hir(HirNode::Regex { pattern, flags }) = node else {
            return Err(LoweringError::unexpected_node(
                self.name(),
                "a HighIR regex literal",
                node.kind(),
            )
            .into());
        };

        // The printer quotes and escapes the pattern text
        let call = TargetNode::call(
            self.constructor_for(flags),
            vec![TargetNode::string(pattern.as_str())],
        );
        Ok(Rewrite::replaced(call))
    }
}
