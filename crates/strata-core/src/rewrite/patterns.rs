/*!
# Node Patterns

Applicability tests shared by the delegating adapter and closure rules.
*/

use std::collections::BTreeSet;

use crate::node::{Node, NodeKind};

/// Pattern matcher for nodes
pub trait NodePattern: Send + Sync {
    /// Check if this pattern matches the given node
    fn matches(&self, node: &Node) -> bool;

    /// True if the pattern can never match
    fn is_empty(&self) -> bool {
        false
    }
}

/// Generic predicate matcher
impl<F> NodePattern for F
where
    F: Fn(&Node) -> bool + Send + Sync,
{
    fn matches(&self, node: &Node) -> bool {
        self(node)
    }
}

/// Variant-membership set: matches a node iff its kind is in the set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindSet {
    kinds: BTreeSet<NodeKind>,
}

impl KindSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of(kinds: impl IntoIterator<Item = NodeKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn contains(&self, kind: NodeKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeKind> + '_ {
        self.kinds.iter().copied()
    }
}

impl NodePattern for KindSet {
    fn matches(&self, node: &Node) -> bool {
        self.contains(node.kind())
    }

    fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl FromIterator<NodeKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = NodeKind>>(iter: I) -> Self {
        Self::of(iter)
    }
}
