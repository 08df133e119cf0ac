// Target-language AST
// Output of the codegen stage; printed back to source by `printer`.

pub mod printer;
pub use printer::{escape_string_literal, ToSource};

use serde::{Deserialize, Serialize};

/// Spaces printed around a binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorPadding {
    pub before: u8,
    pub after: u8,
}

impl OperatorPadding {
    /// Exactly one space on each side: `a + b`
    pub const fn single() -> Self {
        Self {
            before: 1,
            after: 1,
        }
    }

    pub const fn none() -> Self {
        Self {
            before: 0,
            after: 0,
        }
    }
}

impl Default for OperatorPadding {
    fn default() -> Self {
        Self::single()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetNode {
    Identifier(String),
    Number(String),
    /// Unescaped string contents; the printer quotes and escapes them
    StringLiteral(String),
    Boolean(bool),
    Nil,

    Binary {
        left: Box<TargetNode>,
        operator: String,
        right: Box<TargetNode>,
        padding: OperatorPadding,
    },

    Call {
        callee: Box<TargetNode>,
        args: Vec<TargetNode>,
    },
}

impl TargetNode {
    pub fn identifier(name: impl Into<String>) -> Self {
        TargetNode::Identifier(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        TargetNode::StringLiteral(value.into())
    }

    pub fn number(value: impl ToString) -> Self {
        TargetNode::Number(value.to_string())
    }

    pub fn binary(left: TargetNode, operator: impl Into<String>, right: TargetNode) -> Self {
        TargetNode::Binary {
            left: Box::new(left),
            operator: operator.into(),
            right: Box::new(right),
            padding: OperatorPadding::single(),
        }
    }

    /// Call of a named function
    pub fn call(callee: impl Into<String>, args: Vec<TargetNode>) -> Self {
        TargetNode::Call {
            callee: Box::new(TargetNode::Identifier(callee.into())),
            args,
        }
    }
}
