//! Configuration management for the view linter.
//!
//! Handles:
//! - Command-line argument parsing
//! - Rule configuration file loading

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::rules::{builtin_rules, RuleSettings};

/// Command-line arguments for the view linter
#[derive(Debug, Parser)]
#[command(name = "view-lint")]
#[command(about = "Lint view definition JSON files for structure and convention issues")]
#[command(version)]
pub struct Args {
    /// View definition files to lint
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Path to the rule configuration JSON file
    #[arg(long, default_value = "rule-config.json")]
    pub config: PathBuf,

    /// Fail on orphaned entries instead of attaching them to a synthetic root
    #[arg(long)]
    pub strict: bool,

    /// Also list files that came back clean
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level for diagnostics (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Rule activation settings keyed by rule id.
#[derive(Debug, Clone, Default)]
pub struct LintConfig {
    pub rules: BTreeMap<String, RuleSettings>,
}

impl LintConfig {
    /// Load rule settings from a JSON file mapping rule id to settings.
    ///
    /// Keys starting with `_` are comments and non-object values are
    /// ignored, so configuration files can carry annotations.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration file {}", path.display()))?;
        let values: BTreeMap<String, serde_json::Value> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;

        let mut rules = BTreeMap::new();
        for (id, value) in values {
            if id.starts_with('_') {
                continue;
            }
            if !value.is_object() {
                log::warn!("ignoring non-object configuration for '{id}'");
                continue;
            }
            let settings: RuleSettings = serde_json::from_value(value).with_context(|| {
                format!("invalid settings for rule '{id}' in {}", path.display())
            })?;
            rules.insert(id, settings);
        }
        Ok(Self { rules })
    }

    /// Every built-in rule enabled with default parameters.
    pub fn builtin_defaults() -> Self {
        let rules = builtin_rules()
            .into_iter()
            .map(|descriptor| (descriptor.id.to_string(), RuleSettings::default()))
            .collect();
        Self { rules }
    }
}
