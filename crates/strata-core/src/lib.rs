//! # Strata Core
//!
//! Staged AST-to-AST lowering for a compiler front end:
//! - Source AST, HighIR and target AST node families
//! - Rewrite engine with named stages and ordered rule lists
//! - Delegating adapter that forwards nodes to a collaborator method
//! - Concrete rules for match desugaring, stdlib imports, binary and regex lowering
//! - Standard library registry and event bus
//!
//! The crate has no parser or type checker of its own. Callers hand the
//! engine nodes plus a [`rewrite::LoweringContext`] holding whatever
//! collaborators the registered rules need.

#![warn(clippy::all)]

pub mod ast;
pub mod config;
pub mod errors;
pub mod events;
pub mod hir;
pub mod node;
pub mod pipeline;
pub mod rewrite;
pub mod rules;
pub mod stdlib;
pub mod target;

// Re-export commonly used types
pub use ast::{ImportDecl, ImportSelection, MatchArm, Pattern, SourceAst};
pub use config::LoweringConfig;
pub use errors::LoweringError;
pub use events::{Event, EventBus, EventKind};
pub use hir::{HirArm, HirNode, HirType, Literal, TypedValue};
pub use node::{Family, Node, NodeKind};
pub use pipeline::{Pipeline, TargetEmitter};
pub use rewrite::{
    DelegateDescriptor, DelegatingRule, InstancePolicy, LoweringContext, LoweringRule, Rewrite,
    RewriteEngine, RewriteResult, Stage,
};
pub use stdlib::{FunctionDecl, StdlibRegistry, StdlibResolution};
pub use target::{TargetNode, ToSource};

/// Strata version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for Strata components
///
/// Honors `RUST_LOG` and falls back to `strata_core=info`.
pub fn init_tracing() {
    init_tracing_with("strata_core=info");
}

/// Initialize tracing with `default_directive` used when `RUST_LOG` is unset
///
/// Calling it twice is harmless; the second subscriber is simply not installed.
pub fn init_tracing_with(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
