//! Pluggable lint rules.
//!
//! A rule is a [`NodeVisitor`] with declared node-kind interests and an
//! optional post-process hook for batch analysis. Rules accumulate raw
//! [`Report`]s; the engine stamps them with severity and rule id. Rule types
//! plug into the [`registry`](crate::rules::registry) through
//! [`RuleDescriptor`]s, and [`builtin_rules`] is the crate's explicit
//! registration list.

pub mod naming;
pub mod polling;
pub mod registry;
pub mod script_lint;

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigurationError, RuleError};
use crate::model::{NodeKind, NodeVisitor};

/// Finding severity. Warnings never fail a run; errors do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A raw issue reported by a rule, before the engine stamps severity and
/// rule id onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub node_path: String,
    pub message: String,
}

impl Report {
    pub fn new(node_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_path: node_path.into(),
            message: message.into(),
        }
    }
}

/// Rule parameters from the configuration file.
pub type RuleParams = serde_json::Map<String, Value>;

/// The pluggable analyzer contract.
///
/// Instances carry mutable state (collected scripts, accumulated reports)
/// and are bound to a single document run; they are never shared across
/// documents or threads.
pub trait Rule: NodeVisitor {
    /// Node kinds this rule wants dispatched. Never empty for a registered
    /// rule.
    fn interests(&self) -> &[NodeKind];

    /// Batch hook invoked once after the traversal, e.g. to run one external
    /// analysis over everything collected during visits.
    fn post_process(&mut self) -> Result<(), RuleError> {
        Ok(())
    }

    /// Drain the reports accumulated so far.
    fn take_reports(&mut self) -> Vec<Report>;
}

/// How one rule type plugs into the registry.
#[derive(Clone)]
pub struct RuleDescriptor {
    pub id: &'static str,
    pub description: &'static str,
    pub default_severity: Severity,
    /// Optional parameter coercion/validation applied before construction.
    pub preprocess: Option<fn(RuleParams) -> Result<RuleParams, ConfigurationError>>,
    pub build: fn(&RuleParams) -> Result<Box<dyn Rule>, ConfigurationError>,
}

/// Per-rule activation settings from the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Overrides the rule's default severity when set.
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub params: RuleParams,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
            params: RuleParams::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// The crate's built-in rule types, in registration order.
pub fn builtin_rules() -> Vec<RuleDescriptor> {
    vec![
        naming::descriptor(),
        polling::descriptor(),
        script_lint::descriptor(),
    ]
}

pub(crate) fn param_u64(
    params: &RuleParams,
    key: &str,
    default: u64,
) -> Result<u64, ConfigurationError> {
    match params.get(key) {
        None => Ok(default),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| ConfigurationError::new(key, "expected a non-negative integer")),
        Some(other) => Err(ConfigurationError::new(
            key,
            format!("expected a non-negative integer, got {other}"),
        )),
    }
}

pub(crate) fn param_opt_usize(
    params: &RuleParams,
    key: &str,
) -> Result<Option<usize>, ConfigurationError> {
    match params.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| ConfigurationError::new(key, "expected a non-negative integer")),
        Some(other) => Err(ConfigurationError::new(
            key,
            format!("expected a non-negative integer, got {other}"),
        )),
    }
}

pub(crate) fn param_str(
    params: &RuleParams,
    key: &str,
) -> Result<Option<String>, ConfigurationError> {
    match params.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ConfigurationError::new(
            key,
            format!("expected a string, got {other}"),
        )),
    }
}

pub(crate) fn param_str_list(
    params: &RuleParams,
    key: &str,
) -> Result<Option<Vec<String>>, ConfigurationError> {
    match params.get(key) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(ConfigurationError::new(
                    key,
                    format!("expected an array of strings, got element {other}"),
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(ConfigurationError::new(
            key,
            format!("expected an array of strings, got {other}"),
        )),
    }
}
