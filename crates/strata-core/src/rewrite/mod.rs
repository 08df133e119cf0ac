/*!
# Staged Rewrite Engine

Registers lowering rules into named pipeline stages and applies them, in
registration order, to one node at a time.

## Architecture

- `LoweringRule`: two-operation contract (`applies`, `apply`) every rule implements
- `Rewrite`: explicit rule outcome, either `Unchanged` or `Replaced(node)`
- `RewriteEngine`: stage → ordered rule list, plus the sequential `apply` fold
- `DelegatingRule`: forwards to a method on a collaborator found in the context
- `LoweringContext`: per-invocation collaborators (lowerer, analyzer, callbacks, ...)

## Example Usage

```rust,ignore
use strata_core::rewrite::{LoweringContext, RewriteEngine, Stage};
use strata_core::rules::{BinaryExpressionLowering, RegexLiteralLowering};

let mut engine = RewriteEngine::new();
engine.register(Stage::CODEGEN, BinaryExpressionLowering::new());
engine.register(Stage::CODEGEN, RegexLiteralLowering::new());

let context = LoweringContext::new().with_lowerer(&lowerer);
let lowered = engine.apply(&Stage::CODEGEN, node, &context)?;
```

Within one stage every rule is tested against the *current* result, so a rule
may match a node produced by an earlier rule of the same stage.
*/

pub mod adapter;
pub mod context;
pub mod engine;
pub mod patterns;
pub mod rules;

use std::borrow::Cow;
use std::fmt;

// Re-export main types
pub use adapter::{DelegateDescriptor, DelegatingRule, DEFAULT_DELEGATE_KEY};
pub use context::{
    CollaboratorKey, ExpressionLowerer, LoweringContext, MatchAnalysis, MatchAnalyzer,
    MissingItemHandler, RegisterFunction, StdlibResolver, TransformArm,
};
pub use engine::{InstancePolicy, RewriteEngine};
pub use patterns::{KindSet, NodePattern};
pub use rules::{FnRule, LoweringRule, Rewrite, RuleStats};

// Common result type for rewrites
pub type RewriteResult<T> = anyhow::Result<T>;

/// Named point in the pipeline at which an ordered rule list is applied
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stage(Cow<'static, str>);

impl Stage {
    /// Source AST → HighIR (match desugaring, import resolution)
    pub const CORE_IR: Stage = Stage(Cow::Borrowed("core_ir"));
    /// HighIR → target AST
    pub const CODEGEN: Stage = Stage(Cow::Borrowed("codegen"));

    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Stage(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Stage {
    fn from(name: &'static str) -> Self {
        Stage(Cow::Borrowed(name))
    }
}
