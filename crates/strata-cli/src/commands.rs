//! CLI command implementations
//!
//! Each command returns its report as a string so `main` only prints it.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use tracing::{debug, warn};

use strata_core::{
    Event, EventBus, FunctionDecl, HirNode, ImportDecl, LoweringConfig, Pipeline, StdlibRegistry,
    ToSource,
};

/// Options for `strata lower`
#[derive(Debug, Clone, Default)]
pub struct LowerOptions {
    /// JSON file holding one HighIR expression
    pub file: PathBuf,
    pub config: Option<PathBuf>,
    /// Append per-rule statistics to the output
    pub stats: bool,
}

/// Options for `strata import`
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub module: String,
    pub items: Vec<String>,
    pub all: bool,
    /// JSON registry used instead of the builtin modules
    pub stdlib: Option<PathBuf>,
    pub origin: Option<String>,
}

fn load_config(path: Option<&PathBuf>) -> Result<LoweringConfig> {
    match path {
        Some(path) => LoweringConfig::from_json_file(path),
        None => Ok(LoweringConfig::default()),
    }
}

/// Lower a HighIR expression read from JSON and print it as target source
pub fn run_lower(options: &LowerOptions) -> Result<String> {
    let json = fs::read_to_string(&options.file)
        .with_context(|| format!("reading {}", options.file.display()))?;
    let hir: HirNode = serde_json::from_str(&json)
        .with_context(|| format!("parsing HighIR from {}", options.file.display()))?;

    let pipeline = Pipeline::new(load_config(options.config.as_ref())?)?;
    let target = pipeline.lower_expression(&hir)?;

    let mut output = target.to_source();
    if options.stats {
        let mut stats = pipeline.engine().stats();
        stats.sort_by(|a, b| (&a.stage, &a.rule_name).cmp(&(&b.stage, &b.rule_name)));

        output.push_str("\n\nRule statistics:");
        for rule in stats {
            write!(
                output,
                "\n  {}/{}: {} applied, {} replaced, {} errors",
                rule.stage, rule.rule_name, rule.applications, rule.replacements, rule.errors
            )?;
        }
    }

    Ok(output)
}

/// Resolve an import against the stdlib registry and report every imported
/// and missing item
pub fn run_import(options: &ImportOptions) -> Result<String> {
    if options.all && !options.items.is_empty() {
        bail!("--all cannot be combined with explicit items");
    }
    if !options.all && options.items.is_empty() {
        bail!("nothing to import: name one or more items or pass --all");
    }

    let registry = match &options.stdlib {
        Some(path) => StdlibRegistry::from_json_file(path)?,
        None => StdlibRegistry::with_builtins(),
    };

    let mut import = if options.all {
        ImportDecl::all(options.module.as_str())
    } else {
        ImportDecl::items(options.module.as_str(), options.items.iter().cloned())
    };
    if let Some(origin) = &options.origin {
        import = import.with_origin(origin.as_str());
    }

    let bus = EventBus::new();
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = lines.clone();
    bus.subscribe_all(move |event| {
        let line = match event {
            Event::StdlibFunctionImported { function, .. } => {
                format!("imported {}", function.signature())
            }
            Event::StdlibMissingItem {
                module,
                name,
                origin: Some(origin),
            } => format!("missing {module}.{name} (from {origin})"),
            Event::StdlibMissingItem { module, name, .. } => format!("missing {module}.{name}"),
        };
        sink.lock().push(line);
        Ok(())
    });

    let register = |decl: &FunctionDecl| -> Result<()> {
        debug!(function = %decl.signature(), "function registered");
        Ok(())
    };
    let on_missing = |name: &str, origin: Option<&str>| -> Result<()> {
        warn!(
            module = %options.module,
            name,
            origin = origin.unwrap_or("-"),
            "import item not found"
        );
        Ok(())
    };

    let pipeline = Pipeline::new(LoweringConfig::default())?;
    pipeline.resolve_import(&import, &registry, &bus, &register, &on_missing)?;

    let report = lines.lock().join("\n");
    Ok(report)
}
