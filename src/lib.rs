//! View definition linter.
//!
//! Analyzes hierarchical JSON view definitions for structure and convention
//! issues via pluggable rules.
//!
//! The pipeline:
//! - flatten a nested document into ordered path-value entries
//! - rebuild a typed, traversable node tree through heuristic path
//!   classification
//! - dispatch the tree to configured rules through a closed visitor contract
//! - merge per-rule findings into one deterministic, severity-tagged result

pub mod config;
pub mod engine;
pub mod error;
pub mod flatten;
pub mod model;
pub mod rules;

// Re-exports for clean public API
pub use config::LintConfig;
pub use engine::{lint_document, Finding, LintEngine, LintResult};
pub use flatten::{flatten, FlatEntry, PropertyValue};
pub use model::{Model, ModelBuilder, NodeKind, NodeVisitor, ViewNode};
pub use rules::registry::{ConfiguredRule, RuleRegistry};
pub use rules::{builtin_rules, Rule, RuleDescriptor, Severity};
