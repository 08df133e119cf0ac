//! Standard library signature registry
//!
//! Resolves `import` paths and item lists into known function declarations.
//! The registry ships with a small builtin set and can also be loaded from
//! JSON:
//!
//! ```json
//! { "modules": { "IO": [ { "name": "println", "params": ["String"], "returns": "Nil" } ] } }
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::ast::ImportSelection;
use crate::errors::LoweringError;
use crate::hir::HirType;
use crate::rewrite::{RewriteResult, StdlibResolver};

fn default_exported() -> bool {
    true
}

/// Signature of a standard library function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    /// Filled in from the enclosing module when loading
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub params: Vec<HirType>,
    pub returns: HirType,
    /// Internal helpers are not importable
    #[serde(default = "default_exported")]
    pub exported: bool,
}

impl FunctionDecl {
    pub fn new(
        module: impl Into<String>,
        name: impl Into<String>,
        params: Vec<HirType>,
        returns: HirType,
    ) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            params,
            returns,
            exported: true,
        }
    }

    pub fn internal(mut self) -> Self {
        self.exported = false;
        self
    }

    /// `IO.println(String) -> Nil`
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}.{}({}) -> {}", self.module, self.name, params, self.returns)
    }

    pub fn ty(&self) -> HirType {
        HirType::Function {
            params: self.params.clone(),
            ret: Box::new(self.returns.clone()),
        }
    }
}

/// Outcome of resolving one import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StdlibResolution {
    pub resolved: Vec<FunctionDecl>,
    /// Requested names the module does not export
    pub missing: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    modules: IndexMap<String, Vec<FunctionDecl>>,
}

/// In-memory standard library registry
#[derive(Debug, Clone, Default)]
pub struct StdlibRegistry {
    modules: IndexMap<String, IndexMap<String, FunctionDecl>>,
}

impl StdlibRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin modules
    pub fn with_builtins() -> Self {
        use HirType::*;

        let mut registry = Self::new();
        let list = || Named("List".to_string());

        for decl in [
            FunctionDecl::new("IO", "println", vec![String], Nil),
            FunctionDecl::new("IO", "print", vec![String], Nil),
            FunctionDecl::new("IO", "read_line", vec![], String),
            FunctionDecl::new("IO", "flush_buffers", vec![], Nil).internal(),
            FunctionDecl::new("Str", "length", vec![String], Int),
            FunctionDecl::new("Str", "upcase", vec![String], String),
            FunctionDecl::new("Str", "downcase", vec![String], String),
            FunctionDecl::new("Str", "split", vec![String, String], list()),
            FunctionDecl::new("Math", "abs", vec![Int], Int),
            FunctionDecl::new("Math", "max", vec![Int, Int], Int),
            FunctionDecl::new("Math", "min", vec![Int, Int], Int),
            FunctionDecl::new("Math", "sqrt", vec![Float], Float),
            FunctionDecl::new("Regex", "matches", vec![Regex, String], Bool),
            FunctionDecl::new("Regex", "replace", vec![Regex, String, String], String),
        ] {
            registry.define(decl);
        }

        registry
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let file: RegistryFile = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (module, decls) in file.modules {
            // Empty modules are still importable
            registry.modules.entry(module.clone()).or_default();
            for mut decl in decls {
                decl.module = module.clone();
                registry.define(decl);
            }
        }
        Ok(registry)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading stdlib registry {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing stdlib registry {}", path.display()))
    }

    /// Add or replace a declaration in its module
    pub fn define(&mut self, decl: FunctionDecl) {
        self.modules
            .entry(decl.module.clone())
            .or_default()
            .insert(decl.name.clone(), decl);
    }

    pub fn has_module(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn lookup(&self, path: &str, name: &str) -> Option<&FunctionDecl> {
        self.modules.get(path)?.get(name)
    }
}

impl StdlibResolver for StdlibRegistry {
    fn resolve(&self, path: &str, selection: &ImportSelection) -> RewriteResult<StdlibResolution> {
        let module = self
            .modules
            .get(path)
            .ok_or_else(|| LoweringError::UnknownStdlibModule {
                path: path.to_string(),
            })?;

        let mut resolution = StdlibResolution::default();
        match selection {
            ImportSelection::All => {
                resolution.resolved = module.values().filter(|d| d.exported).cloned().collect();
            }
            ImportSelection::Items(items) => {
                let unique: IndexSet<&str> = items.iter().map(String::as_str).collect();
                for name in unique {
                    match module.get(name) {
                        Some(decl) if decl.exported => resolution.resolved.push(decl.clone()),
                        _ => resolution.missing.push(name.to_string()),
                    }
                }
            }
        }

        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn items(names: &[&str]) -> ImportSelection {
        ImportSelection::Items(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn test_selective_resolution_splits_resolved_and_missing() {
        let registry = StdlibRegistry::with_builtins();
        let resolution = registry
            .resolve("IO", &items(&["println", "NO_SUCH", "println"]))
            .unwrap();

        let names: Vec<_> = resolution.resolved.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["println"]);
        assert_eq!(resolution.missing, vec!["NO_SUCH".to_string()]);
    }

    #[test]
    fn test_wildcard_skips_internal_functions() {
        let registry = StdlibRegistry::with_builtins();
        let resolution = registry.resolve("IO", &ImportSelection::All).unwrap();

        let names: Vec<_> = resolution.resolved.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["println", "print", "read_line"]);
        assert!(resolution.missing.is_empty());
    }

    #[test]
    fn test_internal_function_is_missing_when_selected() {
        let registry = StdlibRegistry::with_builtins();
        let resolution = registry.resolve("IO", &items(&["flush_buffers"])).unwrap();
        assert!(resolution.resolved.is_empty());
        assert_eq!(resolution.missing, vec!["flush_buffers".to_string()]);
    }

    #[test]
    fn test_unknown_module_is_an_error() {
        let registry = StdlibRegistry::with_builtins();
        let err = registry.resolve("Net", &ImportSelection::All).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LoweringError>(),
            Some(&LoweringError::UnknownStdlibModule {
                path: "Net".to_string()
            })
        );
    }

    #[test]
    fn test_from_json_fills_module() {
        let registry = StdlibRegistry::from_json(
            r#"{ "modules": {
                "Time": [ { "name": "now", "returns": "Int" } ],
                "Empty": []
            } }"#,
        )
        .unwrap();

        let decl = registry.lookup("Time", "now").unwrap();
        assert_eq!(decl.module, "Time");
        assert!(decl.exported);
        assert_eq!(decl.signature(), "Time.now() -> Int");
        assert!(registry.has_module("Empty"));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stdlib.json");
        fs::write(
            &path,
            r#"{ "modules": { "IO": [ { "name": "println", "params": ["String"], "returns": "Nil" } ] } }"#,
        )
        .unwrap();

        let registry = StdlibRegistry::from_json_file(&path).unwrap();
        assert_eq!(registry.module_names().collect::<Vec<_>>(), vec!["IO"]);
    }
}
