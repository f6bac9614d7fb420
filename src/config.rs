use crate::classifier::RuleTable;
use crate::columns::ColumnAliases;
use crate::error::{ReportError, Result};
use crate::normalize::DEFAULT_PLACEHOLDER_NAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine configuration. Every section is optional in the file; missing
/// parts fall back to the built-in reference tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name used for rows whose product name is missing.
    pub placeholder_name: String,
    /// Keep only the first N rows of the top-products table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_products_limit: Option<usize>,
    pub columns: ColumnAliases,
    pub classifier: RuleTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placeholder_name: DEFAULT_PLACEHOLDER_NAME.to_string(),
            top_products_limit: None,
            columns: ColumnAliases::default(),
            classifier: RuleTable::default(),
        }
    }
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(s).map_err(|e| ReportError::Config(e.to_string()))?;
        cfg.classifier.validate().map_err(ReportError::Config)?;
        Ok(cfg)
    }

    /// Defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(p) = path else {
            return Ok(Config::default());
        };
        let s = fs::read_to_string(p).map_err(|source| ReportError::Io {
            path: p.to_path_buf(),
            source,
        })?;
        Config::from_toml(&s).map_err(|e| match e {
            ReportError::Config(msg) => ReportError::Config(format!("{}: {}", p.display(), msg)),
            other => other,
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ReportError::Config(e.to_string()))
    }
}
