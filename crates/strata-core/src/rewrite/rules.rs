/*!
# Lowering Rules

Core trait and utilities for defining lowering rules.
*/

use std::time::Duration;

use crate::node::Node;

use super::context::{CollaboratorKey, LoweringContext};
use super::patterns::NodePattern;
use super::RewriteResult;

/// Outcome of applying a rule
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Rewrite {
    /// Leave the running result as it was
    Unchanged,
    /// Install this node as the new running result
    Replaced(Node),
}

impl Rewrite {
    pub fn replaced(node: impl Into<Node>) -> Self {
        Rewrite::Replaced(node.into())
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self, Rewrite::Replaced(_))
    }

    /// The replacement, or `current` when unchanged
    pub fn into_node(self, current: Node) -> Node {
        match self {
            Rewrite::Unchanged => current,
            Rewrite::Replaced(node) => node,
        }
    }
}

/// Core trait for lowering rules
///
/// Rules must not keep per-compilation state: a registered instance may be
/// reused for every application, including from several threads at once.
pub trait LoweringRule: Send + Sync {
    /// Human-readable name for this rule
    fn name(&self) -> &'static str;

    /// Detailed description of what this rule does
    fn description(&self) -> &'static str {
        ""
    }

    /// Collaborators `apply` will look up
    fn requires(&self) -> Vec<CollaboratorKey> {
        Vec::new()
    }

    /// True when the rule's configuration can never match any node
    fn is_inert(&self) -> bool {
        false
    }

    /// Check if this rule claims the given node
    fn applies(&self, node: &Node, context: &LoweringContext<'_>) -> bool;

    /// Lower the node
    fn apply(&self, node: &Node, context: &LoweringContext<'_>) -> RewriteResult<Rewrite>;
}

/// A rule built from a node pattern and a closure
pub struct FnRule<F>
where
    F: Fn(&Node, &LoweringContext<'_>) -> RewriteResult<Rewrite> + Send + Sync,
{
    pub name: &'static str,
    pub description: &'static str,
    pub pattern: Box<dyn NodePattern>,
    pub transformer: F,
}

impl<F> FnRule<F>
where
    F: Fn(&Node, &LoweringContext<'_>) -> RewriteResult<Rewrite> + Send + Sync,
{
    pub fn new(name: &'static str, pattern: impl NodePattern + 'static, transformer: F) -> Self {
        Self {
            name,
            description: "",
            pattern: Box::new(pattern),
            transformer,
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

impl<F> LoweringRule for FnRule<F>
where
    F: Fn(&Node, &LoweringContext<'_>) -> RewriteResult<Rewrite> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn is_inert(&self) -> bool {
        self.pattern.is_empty()
    }

    fn applies(&self, node: &Node, _context: &LoweringContext<'_>) -> bool {
        self.pattern.matches(node)
    }

    fn apply(&self, node: &Node, context: &LoweringContext<'_>) -> RewriteResult<Rewrite> {
        (self.transformer)(node, context)
    }
}

/// Rule execution statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleStats {
    pub rule_name: String,
    /// Stage the rule is registered in; empty for standalone counters
    pub stage: String,
    pub applications: u64,
    pub replacements: u64,
    pub errors: u64,
    pub total_time: Duration,
}

impl RuleStats {
    pub fn new(rule_name: String) -> Self {
        Self {
            rule_name,
            ..Self::default()
        }
    }

    pub fn for_stage(stage: String, rule_name: String) -> Self {
        Self {
            rule_name,
            stage,
            ..Self::default()
        }
    }

    /// Fraction of applications that produced a replacement
    pub fn replacement_rate(&self) -> f64 {
        if self.applications == 0 {
            0.0
        } else {
            (self.replacements as f64) / (self.applications as f64)
        }
    }

    pub fn average_time(&self) -> Duration {
        if self.applications == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total_time.as_nanos() / u128::from(self.applications);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::HirNode;
    use crate::node::NodeKind;
    use crate::rewrite::patterns::KindSet;

    #[test]
    fn test_rewrite_into_node() {
        let current = Node::from(HirNode::int(1));
        assert_eq!(Rewrite::Unchanged.into_node(current.clone()), current);

        let replacement = Node::from(HirNode::int(2));
        assert_eq!(
            Rewrite::Replaced(replacement.clone()).into_node(current),
            replacement
        );
    }

    #[test]
    fn test_fn_rule_uses_pattern() {
        let rule = FnRule::new("noop", KindSet::of([NodeKind::HirLiteral]), |_, _| {
            Ok(Rewrite::Unchanged)
        });
        let context = LoweringContext::new();

        assert!(rule.applies(&Node::from(HirNode::int(1)), &context));
        assert!(!rule.applies(&Node::from(HirNode::regex("a", "")), &context));
        assert!(!rule.is_inert());
    }

    #[test]
    fn test_empty_pattern_is_inert() {
        let rule = FnRule::new("inert", KindSet::empty(), |_, _| Ok(Rewrite::Unchanged));
        assert!(rule.is_inert());
    }

    #[test]
    fn test_stats_rates() {
        let mut stats = RuleStats::new("r".to_string());
        assert_eq!(stats.replacement_rate(), 0.0);
        assert_eq!(stats.average_time(), Duration::ZERO);

        stats.applications = 4;
        stats.replacements = 1;
        stats.total_time = Duration::from_millis(8);
        assert_eq!(stats.replacement_rate(), 0.25);
        assert_eq!(stats.average_time(), Duration::from_millis(2));
    }

    #[test]
    fn test_average_time_beyond_u32_applications() {
        let mut stats = RuleStats::new("r".to_string());
        stats.applications = 1 << 32;
        stats.total_time = Duration::from_secs(1 << 32);
        assert_eq!(stats.average_time(), Duration::from_secs(1));
    }
}
