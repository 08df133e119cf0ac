//! The node union the rewrite engine operates on.
//!
//! A [`Node`] belongs to exactly one of three families. Rules claim nodes by
//! their [`NodeKind`], which is determined entirely by the variant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::SourceAst;
use crate::hir::HirNode;
use crate::target::TargetNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Source,
    Hir,
    Target,
}

/// Flat variant tag across all three families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    SourceNumber,
    SourceString,
    SourceBoolean,
    SourceIdentifier,
    SourceRegex,
    SourceBinary,
    SourceCall,
    SourceMatch,
    SourceImport,

    HirLiteral,
    HirIdentifier,
    HirBinary,
    HirRegex,
    HirCall,
    HirMatch,
    HirImport,

    TargetIdentifier,
    TargetNumber,
    TargetString,
    TargetBoolean,
    TargetNil,
    TargetBinary,
    TargetCall,
}

impl NodeKind {
    pub fn family(self) -> Family {
        use NodeKind::*;
        match self {
            SourceNumber | SourceString | SourceBoolean | SourceIdentifier | SourceRegex
            | SourceBinary | SourceCall | SourceMatch | SourceImport => Family::Source,
            HirLiteral | HirIdentifier | HirBinary | HirRegex | HirCall | HirMatch
            | HirImport => Family::Hir,
            TargetIdentifier | TargetNumber | TargetString | TargetBoolean | TargetNil
            | TargetBinary | TargetCall => Family::Target,
        }
    }

    pub fn as_str(self) -> &'static str {
        use NodeKind::*;
        match self {
            SourceNumber => "source number",
            SourceString => "source string",
            SourceBoolean => "source boolean",
            SourceIdentifier => "source identifier",
            SourceRegex => "source regex",
            SourceBinary => "source binary expression",
            SourceCall => "source call",
            SourceMatch => "source match expression",
            SourceImport => "source import",
            HirLiteral => "HighIR literal",
            HirIdentifier => "HighIR identifier",
            HirBinary => "HighIR binary expression",
            HirRegex => "HighIR regex literal",
            HirCall => "HighIR call",
            HirMatch => "HighIR match expression",
            HirImport => "HighIR import",
            TargetIdentifier => "target identifier",
            TargetNumber => "target number",
            TargetString => "target string literal",
            TargetBoolean => "target boolean",
            TargetNil => "target nil",
            TargetBinary => "target binary expression",
            TargetCall => "target call",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Source(SourceAst),
    Hir(HirNode),
    Target(TargetNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Source(ast) => match ast {
                SourceAst::Number(_) => NodeKind::SourceNumber,
                SourceAst::String(_) => NodeKind::SourceString,
                SourceAst::Boolean(_) => NodeKind::SourceBoolean,
                SourceAst::Identifier(_) => NodeKind::SourceIdentifier,
                SourceAst::Regex { .. } => NodeKind::SourceRegex,
                SourceAst::Binary { .. } => NodeKind::SourceBinary,
                SourceAst::Call { .. } => NodeKind::SourceCall,
                SourceAst::Match { .. } => NodeKind::SourceMatch,
                SourceAst::Import(_) => NodeKind::SourceImport,
            },
            Node::Hir(hir) => match hir {
                HirNode::Literal(_) => NodeKind::HirLiteral,
                HirNode::Identifier { .. } => NodeKind::HirIdentifier,
                HirNode::Binary { .. } => NodeKind::HirBinary,
                HirNode::Regex { .. } => NodeKind::HirRegex,
                HirNode::Call { .. } => NodeKind::HirCall,
                HirNode::Match { .. } => NodeKind::HirMatch,
                HirNode::Import { .. } => NodeKind::HirImport,
            },
            Node::Target(target) => match target {
                TargetNode::Identifier(_) => NodeKind::TargetIdentifier,
                TargetNode::Number(_) => NodeKind::TargetNumber,
                TargetNode::StringLiteral(_) => NodeKind::TargetString,
                TargetNode::Boolean(_) => NodeKind::TargetBoolean,
                TargetNode::Nil => NodeKind::TargetNil,
                TargetNode::Binary { .. } => NodeKind::TargetBinary,
                TargetNode::Call { .. } => NodeKind::TargetCall,
            },
        }
    }

    pub fn family(&self) -> Family {
        self.kind().family()
    }

    pub fn as_source(&self) -> Option<&SourceAst> {
        match self {
            Node::Source(ast) => Some(ast),
            _ => None,
        }
    }

    pub fn as_hir(&self) -> Option<&HirNode> {
        match self {
            Node::Hir(hir) => Some(hir),
            _ => None,
        }
    }

    pub fn as_target(&self) -> Option<&TargetNode> {
        match self {
            Node::Target(target) => Some(target),
            _ => None,
        }
    }

    pub fn into_target(self) -> Result<TargetNode, Node> {
        match self {
            Node::Target(target) => Ok(target),
            other => Err(other),
        }
    }

    pub fn into_hir(self) -> Result<HirNode, Node> {
        match self {
            Node::Hir(hir) => Ok(hir),
            other => Err(other),
        }
    }
}

impl From<SourceAst> for Node {
    fn from(ast: SourceAst) -> Self {
        Node::Source(ast)
    }
}

impl From<HirNode> for Node {
    fn from(hir: HirNode) -> Self {
        Node::Hir(hir)
    }
}

impl From<TargetNode> for Node {
    fn from(target: TargetNode) -> Self {
        Node::Target(target)
    }
}
