//! Polling interval rule.
//!
//! Expression bindings that poll via `now(...)` must use an interval at or
//! above a configurable minimum. A bare `now()` polls on every scan and is
//! always flagged.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConfigurationError, RuleError};
use crate::model::{ExpressionBindingData, NodeKind, NodeVisitor, ViewNode};
use crate::rules::{param_u64, Report, Rule, RuleDescriptor, RuleParams, Severity};

pub const RULE_ID: &str = "polling-interval";

const DEFAULT_MIN_INTERVAL_MS: u64 = 10_000;

static NOW_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"now\s*\(\s*(\d*)\s*\)").unwrap());
static NOW_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"now\s*\(").unwrap());

pub struct PollingIntervalRule {
    min_interval_ms: u64,
    reports: Vec<Report>,
}

impl PollingIntervalRule {
    pub fn from_params(params: &RuleParams) -> Result<Self, ConfigurationError> {
        Ok(Self {
            min_interval_ms: param_u64(params, "min_interval_ms", DEFAULT_MIN_INTERVAL_MS)?,
            reports: Vec::new(),
        })
    }

    fn check_expression(&mut self, node_path: &str, expression: &str) {
        if !expression.contains("now") {
            return;
        }

        let mut saw_call = false;
        for captures in NOW_CALL.captures_iter(expression) {
            saw_call = true;
            let interval = captures.get(1).map_or("", |m| m.as_str());
            if interval.is_empty() {
                self.reports.push(Report::new(
                    node_path,
                    format!("'now()' polls on every scan in '{expression}'"),
                ));
                continue;
            }
            match interval.parse::<u64>() {
                Ok(ms) if ms > 0 && ms < self.min_interval_ms => {
                    self.reports.push(Report::new(
                        node_path,
                        format!(
                            "polling interval {ms}ms is below the {}ms minimum in '{expression}'",
                            self.min_interval_ms
                        ),
                    ));
                }
                Ok(_) => {}
                Err(_) => {
                    self.reports.push(Report::new(
                        node_path,
                        format!("unparseable polling interval '{interval}' in '{expression}'"),
                    ));
                }
            }
        }

        if !saw_call && NOW_OPEN.is_match(expression) {
            self.reports.push(Report::new(
                node_path,
                format!("malformed 'now(...)' call in '{expression}'"),
            ));
        }
    }
}

impl NodeVisitor for PollingIntervalRule {
    fn visit_expression_binding(
        &mut self,
        node: &ViewNode,
        data: &ExpressionBindingData,
    ) -> Result<(), RuleError> {
        self.check_expression(&node.path, &data.expression);
        Ok(())
    }
}

impl Rule for PollingIntervalRule {
    fn interests(&self) -> &[NodeKind] {
        &[NodeKind::ExpressionBinding]
    }

    fn take_reports(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }
}

pub fn descriptor() -> RuleDescriptor {
    RuleDescriptor {
        id: RULE_ID,
        description: "Expression bindings should not poll faster than the configured minimum",
        default_severity: Severity::Error,
        preprocess: None,
        build: |params| Ok(Box::new(PollingIntervalRule::from_params(params)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(min: Option<u64>) -> PollingIntervalRule {
        let params = match min {
            Some(ms) => {
                let serde_json::Value::Object(map) = json!({ "min_interval_ms": ms }) else {
                    panic!("expected object");
                };
                map
            }
            None => RuleParams::new(),
        };
        PollingIntervalRule::from_params(&params).unwrap()
    }

    fn check(rule: &mut PollingIntervalRule, expression: &str) -> Vec<Report> {
        rule.check_expression("root.props.text", expression);
        std::mem::take(&mut rule.reports)
    }

    #[test]
    fn slow_polling_passes() {
        let mut rule = rule(None);
        assert!(check(&mut rule, "now(60000)").is_empty());
        assert!(check(&mut rule, "toInt({value}) + 1").is_empty());
        // Zero disables polling entirely.
        assert!(check(&mut rule, "now(0)").is_empty());
    }

    #[test]
    fn fast_polling_is_flagged() {
        let mut rule = rule(None);
        let reports = check(&mut rule, "dateFormat(now(500), 'HH:mm')");
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("500ms"));
        assert_eq!(reports[0].node_path, "root.props.text");
    }

    #[test]
    fn bare_now_is_flagged() {
        let mut rule = rule(None);
        let reports = check(&mut rule, "now()");
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("every scan"));
    }

    #[test]
    fn malformed_call_is_flagged() {
        let mut rule = rule(None);
        let reports = check(&mut rule, "now(interval)");
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("malformed"));
    }

    #[test]
    fn custom_minimum_applies() {
        let mut rule = rule(Some(1_000));
        assert!(check(&mut rule, "now(5000)").is_empty());
        assert_eq!(check(&mut rule, "now(500)").len(), 1);
    }

    #[test]
    fn every_call_in_an_expression_is_checked() {
        let mut rule = rule(None);
        let reports = check(&mut rule, "now(500) + now(200)");
        assert_eq!(reports.len(), 2);
    }
}
