/*!
# Lowering Rules

Concrete rules for the core_ir and codegen stages.
*/

pub mod binary;
pub mod match_expr;
pub mod regex;
pub mod stdlib_import;

// Re-export commonly used rules
pub use binary::BinaryExpressionLowering;
pub use match_expr::MatchDesugaring;
pub use regex::RegexLiteralLowering;
pub use stdlib_import::StdlibImportResolution;
