//! Lint engine.
//!
//! Orchestrates one run over one document: traverse the model in its
//! deterministic pre-order, dispatch each node to every configured rule
//! whose interests include the node's kind, invoke post-process hooks, and
//! merge everything into an ordered [`LintResult`]. Rule failures are
//! isolated: a failing visit or post-process call becomes an error finding
//! and never aborts dispatch to the remaining rules and nodes.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde_json::Value;

use crate::error::LintError;
use crate::flatten::flatten;
use crate::model::{Model, ModelBuilder};
use crate::rules::registry::ConfiguredRule;
use crate::rules::Severity;

/// Rule id carried by classification-ambiguity warnings from the build.
pub const CLASSIFICATION_RULE_ID: &str = "classification";

/// One reported issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub severity: Severity,
    pub rule_id: String,
    pub node_path: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.rule_id, self.node_path, self.message
        )
    }
}

/// Ordered findings from one run.
#[derive(Debug, Default)]
pub struct LintResult {
    findings: Vec<Finding>,
}

impl LintResult {
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

/// One-shot engine: rule instances carry per-document state, so the engine
/// consumes itself on `run` and is rebuilt per document.
pub struct LintEngine {
    rules: Vec<ConfiguredRule>,
}

impl LintEngine {
    pub fn new(rules: Vec<ConfiguredRule>) -> Self {
        Self { rules }
    }

    pub fn run(mut self, model: &Model) -> LintResult {
        let node_order: HashMap<&str, usize> = model
            .traversal()
            .iter()
            .enumerate()
            .map(|(position, &id)| (model.node(id).path.as_str(), position))
            .collect();

        let mut findings = Vec::new();

        for warning in model.warnings() {
            findings.push(Finding {
                severity: Severity::Warning,
                rule_id: CLASSIFICATION_RULE_ID.to_string(),
                node_path: warning.path.clone(),
                message: warning.message.clone(),
            });
        }

        for &id in model.traversal() {
            let node = model.node(id);
            let kind = node.kind();
            for configured in &mut self.rules {
                if !configured.rule.interests().contains(&kind) {
                    continue;
                }
                if let Err(err) = node.accept(configured.rule.as_mut()) {
                    findings.push(Finding {
                        severity: Severity::Error,
                        rule_id: configured.id.clone(),
                        node_path: node.path.clone(),
                        message: format!("rule execution failed: {err}"),
                    });
                }
            }
        }

        for configured in &mut self.rules {
            if let Err(err) = configured.rule.post_process() {
                findings.push(Finding {
                    severity: Severity::Error,
                    rule_id: configured.id.clone(),
                    node_path: String::new(),
                    message: format!("post-processing failed: {err}"),
                });
            }
        }

        for configured in &mut self.rules {
            for report in configured.rule.take_reports() {
                findings.push(Finding {
                    severity: configured.severity,
                    rule_id: configured.id.clone(),
                    node_path: report.node_path,
                    message: report.message,
                });
            }
        }

        // Node traversal order, then rule registration order, then message.
        let rule_order: HashMap<&str, usize> = self
            .rules
            .iter()
            .map(|configured| (configured.id.as_str(), configured.order))
            .collect();
        findings.sort_by(|a, b| {
            let key = |f: &Finding| {
                (
                    node_order.get(f.node_path.as_str()).copied().unwrap_or(usize::MAX),
                    rule_order.get(f.rule_id.as_str()).copied().unwrap_or(usize::MAX),
                )
            };
            key(a).cmp(&key(b)).then_with(|| a.message.cmp(&b.message))
        });

        debug!(
            "lint run finished: {} findings over {} nodes",
            findings.len(),
            model.len()
        );
        LintResult { findings }
    }
}

/// Full pipeline for one document: flatten, build, run. Build-phase errors
/// abort atomically with no partial result.
pub fn lint_document(
    document: &Value,
    rules: Vec<ConfiguredRule>,
    strict: bool,
) -> Result<LintResult, LintError> {
    let entries = flatten(document)?;
    let model = ModelBuilder::new().strict(strict).build(&entries)?;
    Ok(LintEngine::new(rules).run(&model))
}
