//! `rulepack.toml` loading.
//!
//! ```toml
//! [options]
//! call_prefix = "op_"
//! strict = false
//!
//! [operators]
//! logged = "operators/logged.json"
//! ```
//!
//! Operator paths are resolved relative to the directory holding the file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use miette::{IntoDiagnostic, miette};
use rulepack_lang::Options;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub options: Options,
    /// Operator name to a file holding its body as a host expression in JSON,
    /// in the order the file lists them.
    pub operators: IndexMap<String, PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> miette::Result<Self> {
        if !path.exists() {
            return Err(miette!("Config file not found: {}", path.display()));
        }

        let content = fs::read_to_string(path).into_diagnostic()?;
        let mut config = Self::parse(&content)?;

        if let Some(base) = path.parent() {
            for operator in config.operators.values_mut() {
                if operator.is_relative() {
                    *operator = base.join(&*operator);
                }
            }
        }

        tracing::debug!(path = %path.display(), operators = config.operators.len(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> miette::Result<Self> {
        toml::from_str(content).into_diagnostic()
    }
}
