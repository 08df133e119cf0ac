// Source-language AST
// Produced by the parser (external); consumed by the core_ir stage rules.

use serde::{Deserialize, Serialize};

use crate::hir::Literal;

/// Pattern on the left of a match arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// Ignore pattern: _
    Wildcard,
    /// Binds the matched value to a name: x
    Binding(String),
    /// Matches a literal value: 1, "a", true
    Literal(Literal),
    /// Constructor pattern: Some(x), Pair(a, b)
    Constructor { name: String, fields: Vec<Pattern> },
}

impl Pattern {
    /// Names bound by this pattern, left to right
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_bound_names(&mut names);
        names
    }

    fn collect_bound_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Pattern::Binding(name) => names.push(name),
            Pattern::Constructor { fields, .. } => {
                for field in fields {
                    field.collect_bound_names(names);
                }
            }
            Pattern::Wildcard | Pattern::Literal(_) => {}
        }
    }

    /// True when the pattern matches any value
    pub fn is_irrefutable(&self) -> bool {
        matches!(self, Pattern::Wildcard | Pattern::Binding(_))
    }
}

/// One pattern/body pair of a match expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<SourceAst>,
    pub body: SourceAst,
}

impl MatchArm {
    pub fn new(pattern: Pattern, body: SourceAst) -> Self {
        Self {
            pattern,
            guard: None,
            body,
        }
    }

    pub fn with_guard(mut self, guard: SourceAst) -> Self {
        self.guard = Some(guard);
        self
    }
}

/// Which names an import brings into scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImportSelection {
    /// import IO.{println, print}
    Items(Vec<String>),
    /// import IO.*
    All,
}

/// import <path>[.{items} | .*]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Module path, e.g. "IO"
    pub path: String,
    pub selection: ImportSelection,
    /// Where the import was written (file or module name), if known
    pub origin: Option<String>,
}

impl ImportDecl {
    pub fn items<I, S>(path: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            selection: ImportSelection::Items(items.into_iter().map(Into::into).collect()),
            origin: None,
        }
    }

    pub fn all(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            selection: ImportSelection::All,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceAst {
    // Literals
    Number(i64),
    String(String),
    Boolean(bool),

    Identifier(String),

    /// /pattern/flags
    Regex {
        pattern: String,
        flags: String,
    },

    Binary {
        left: Box<SourceAst>,
        op: String,
        right: Box<SourceAst>,
    },

    Call {
        callee: Box<SourceAst>,
        args: Vec<SourceAst>,
    },

    Match {
        scrutinee: Box<SourceAst>,
        arms: Vec<MatchArm>,
    },

    Import(ImportDecl),
}

impl SourceAst {
    pub fn identifier(name: impl Into<String>) -> Self {
        SourceAst::Identifier(name.into())
    }

    pub fn binary(left: SourceAst, op: impl Into<String>, right: SourceAst) -> Self {
        SourceAst::Binary {
            left: Box::new(left),
            op: op.into(),
            right: Box::new(right),
        }
    }

    pub fn match_expr(scrutinee: SourceAst, arms: Vec<MatchArm>) -> Self {
        SourceAst::Match {
            scrutinee: Box::new(scrutinee),
            arms,
        }
    }
}
