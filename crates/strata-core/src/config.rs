use std::fs;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::errors::LoweringError;
use crate::rewrite::DEFAULT_DELEGATE_KEY;

/// Lowering pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringConfig {
    /// Constructor called for regex literals without the case-insensitive flag
    pub regex_constructor: String,
    /// Constructor called when the case-insensitive flag is present
    pub regex_case_insensitive_constructor: String,
    /// Flag character that selects the case-insensitive constructor
    pub case_insensitive_flag: char,
    /// Context key the pipeline's recursive-descent lowerer is registered under
    pub delegate_key: String,
    /// Maximum nesting depth when lowering subexpressions
    pub max_lowering_depth: usize,
    /// Record per-rule statistics
    pub collect_stats: bool,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self {
            regex_constructor: "Regex.new".to_string(),
            regex_case_insensitive_constructor: "Regex.new_case_insensitive".to_string(),
            case_insensitive_flag: 'i',
            delegate_key: DEFAULT_DELEGATE_KEY.to_string(),
            max_lowering_depth: 256,
            collect_stats: true,
        }
    }
}

impl LoweringConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("loading config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), LoweringError> {
        if self.regex_constructor.is_empty() || self.regex_case_insensitive_constructor.is_empty() {
            return Err(LoweringError::Config(
                "regex constructor names must not be empty".to_string(),
            ));
        }
        if self.delegate_key.is_empty() {
            return Err(LoweringError::Config("delegate_key must not be empty".to_string()));
        }
        if self.max_lowering_depth == 0 {
            return Err(LoweringError::Config(
                "max_lowering_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LoweringConfig::from_json(r#"{ "regex_constructor": "re" }"#).unwrap();
        assert_eq!(config.regex_constructor, "re");
        assert_eq!(config.case_insensitive_flag, 'i');
        assert_eq!(config.delegate_key, "transformer");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = LoweringConfig::from_json(r#"{ "max_lowering_depth": 0 }"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoweringError>(),
            Some(LoweringError::Config(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strata.json");
        fs::write(&path, r#"{ "case_insensitive_flag": "x", "collect_stats": false }"#).unwrap();

        let config = LoweringConfig::from_json_file(&path).unwrap();
        assert_eq!(config.case_insensitive_flag, 'x');
        assert!(!config.collect_stats);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = LoweringConfig::from_json_file("/nonexistent/strata.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/strata.json"));
    }
}
