//! High-level intermediate representation
//!
//! Sits between the source AST and the target AST. Match expressions are
//! desugared into this form and every expression carries its resolved type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::Pattern;

/// Resolved type of a HighIR expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HirType {
    Int,
    Float,
    String,
    Bool,
    Nil,
    Regex,
    Named(String),
    Function { params: Vec<HirType>, ret: Box<HirType> },
    Unknown,
}

impl fmt::Display for HirType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HirType::Int => write!(f, "Int"),
            HirType::Float => write!(f, "Float"),
            HirType::String => write!(f, "String"),
            HirType::Bool => write!(f, "Bool"),
            HirType::Nil => write!(f, "Nil"),
            HirType::Regex => write!(f, "Regex"),
            HirType::Named(name) => write!(f, "{name}"),
            HirType::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "fn({params}) -> {ret}")
            }
            HirType::Unknown => write!(f, "?"),
        }
    }
}

/// Literal values shared by the source AST patterns and HighIR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
}

impl Literal {
    pub fn ty(&self) -> HirType {
        match self {
            Literal::Int(_) => HirType::Int,
            Literal::Float(_) => HirType::Float,
            Literal::Str(_) => HirType::String,
            Literal::Bool(_) => HirType::Bool,
            Literal::Nil => HirType::Nil,
        }
    }
}

/// A lowered value together with its type, e.g. a match scrutinee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    pub node: HirNode,
    pub ty: HirType,
}

impl TypedValue {
    pub fn new(node: HirNode, ty: HirType) -> Self {
        Self { node, ty }
    }
}

/// A normalized match arm as produced by the match analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HirArm {
    pub pattern: Pattern,
    /// Names bound by the pattern with their types
    pub bindings: Vec<(String, HirType)>,
    pub guard: Option<HirNode>,
    pub body: HirNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HirNode {
    Literal(Literal),

    Identifier {
        name: String,
        ty: HirType,
    },

    Binary {
        left: Box<HirNode>,
        op: String,
        right: Box<HirNode>,
        ty: HirType,
    },

    Regex {
        pattern: String,
        flags: String,
    },

    Call {
        callee: String,
        args: Vec<HirNode>,
        ty: HirType,
    },

    Match {
        scrutinee: Box<HirNode>,
        arms: Vec<HirArm>,
        result_type: HirType,
    },

    /// Functions brought into scope by a resolved import
    Import {
        module: String,
        functions: Vec<String>,
    },
}

impl HirNode {
    pub fn int(value: i64) -> Self {
        HirNode::Literal(Literal::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        HirNode::Literal(Literal::Str(value.into()))
    }

    pub fn identifier(name: impl Into<String>, ty: HirType) -> Self {
        HirNode::Identifier {
            name: name.into(),
            ty,
        }
    }

    pub fn binary(left: HirNode, op: impl Into<String>, right: HirNode, ty: HirType) -> Self {
        HirNode::Binary {
            left: Box::new(left),
            op: op.into(),
            right: Box::new(right),
            ty,
        }
    }

    pub fn regex(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        HirNode::Regex {
            pattern: pattern.into(),
            flags: flags.into(),
        }
    }

    pub fn call(callee: impl Into<String>, args: Vec<HirNode>, ty: HirType) -> Self {
        HirNode::Call {
            callee: callee.into(),
            args,
            ty,
        }
    }

    /// Static type of this expression
    pub fn ty(&self) -> HirType {
        match self {
            HirNode::Literal(literal) => literal.ty(),
            HirNode::Identifier { ty, .. }
            | HirNode::Binary { ty, .. }
            | HirNode::Call { ty, .. } => ty.clone(),
            HirNode::Regex { .. } => HirType::Regex,
            HirNode::Match { result_type, .. } => result_type.clone(),
            HirNode::Import { .. } => HirType::Nil,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_type_display() {
        let ty = HirType::Function {
            params: vec![HirType::String, HirType::Int],
            ret: Box::new(HirType::Nil),
        };
        assert_eq!(ty.to_string(), "fn(String, Int) -> Nil");
    }

    #[test]
    fn test_node_types() {
        assert_eq!(HirNode::regex("a+", "i").ty(), HirType::Regex);
        assert_eq!(
            HirNode::binary(HirNode::int(1), "+", HirNode::int(2), HirType::Int).ty(),
            HirType::Int
        );
        assert_eq!(HirNode::string("x").ty(), HirType::String);
    }
}
