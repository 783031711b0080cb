//! Script quality rule.
//!
//! Collects every script body during traversal and, in its post-process
//! hook, hands the whole batch to a [`ScriptAnalyzer`] exactly once per
//! document. Returned line numbers are mapped back to the originating nodes
//! through the offset table recorded while concatenating.
//!
//! The default analyzer shells out to an external command (the script
//! quality collaborator); tests inject an in-process implementation.

use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{ConfigurationError, RuleError};
use crate::model::{
    CustomMethodData, EventHandlerData, MessageHandlerData, NodeKind, NodeVisitor, TransformData,
    ViewNode,
};
use crate::rules::{param_str, param_str_list, Report, Rule, RuleDescriptor, RuleParams, Severity};

pub const RULE_ID: &str = "script-lint";

/// One issue returned by an analyzer, positioned in the concatenated source.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptIssue {
    pub line: usize,
    pub message: String,
}

/// The external script-quality collaborator, seen from the core.
pub trait ScriptAnalyzer {
    fn analyze(&self, source: &str) -> Result<Vec<ScriptIssue>, RuleError>;
}

/// Feeds the concatenated source to an external command on stdin and parses
/// `line:message` lines from its stdout. A non-zero exit status is expected
/// from linters that found something; only spawn/IO failures are errors.
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl ScriptAnalyzer for CommandAnalyzer {
    fn analyze(&self, source: &str) -> Result<Vec<ScriptIssue>, RuleError> {
        debug!("running script analyzer: {}", self.program);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        Ok(parse_analyzer_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

pub(crate) fn parse_analyzer_output(text: &str) -> Vec<ScriptIssue> {
    text.lines()
        .filter_map(|line| {
            let (line_no, message) = line.split_once(':')?;
            let line_no = line_no.trim().parse::<usize>().ok()?;
            let message = message.trim();
            if message.is_empty() {
                return None;
            }
            Some(ScriptIssue {
                line: line_no,
                message: message.to_string(),
            })
        })
        .collect()
}

struct CollectedScript {
    path: String,
    start_line: usize,
    line_count: usize,
}

pub struct ScriptLintRule {
    analyzer: Option<Box<dyn ScriptAnalyzer>>,
    source: String,
    next_line: usize,
    collected: Vec<CollectedScript>,
    reports: Vec<Report>,
}

impl Default for ScriptLintRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptLintRule {
    /// Without an analyzer the rule collects scripts but reports nothing.
    pub fn new() -> Self {
        Self {
            analyzer: None,
            source: String::new(),
            next_line: 1,
            collected: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn with_analyzer(analyzer: Box<dyn ScriptAnalyzer>) -> Self {
        Self {
            analyzer: Some(analyzer),
            ..Self::new()
        }
    }

    pub fn from_params(params: &RuleParams) -> Result<Self, ConfigurationError> {
        let command = param_str(params, "command")?;
        let args = param_str_list(params, "args")?.unwrap_or_default();
        Ok(match command {
            Some(program) => Self::with_analyzer(Box::new(CommandAnalyzer::new(program, args))),
            None => Self::new(),
        })
    }

    fn collect(&mut self, node_path: &str, body: &str) {
        // One comment header per script keeps the concatenated source
        // debuggable when the external tool echoes context.
        self.source.push_str(&format!("# {node_path}\n"));
        self.next_line += 1;

        let line_count = body.lines().count().max(1);
        self.collected.push(CollectedScript {
            path: node_path.to_string(),
            start_line: self.next_line,
            line_count,
        });

        self.source.push_str(body);
        if !body.ends_with('\n') {
            self.source.push('\n');
        }
        self.source.push('\n');
        self.next_line += line_count + 1;
    }

    fn path_for_line(&self, line: usize) -> Option<&str> {
        self.collected
            .iter()
            .find(|script| line >= script.start_line && line < script.start_line + script.line_count)
            .map(|script| script.path.as_str())
    }
}

impl NodeVisitor for ScriptLintRule {
    fn visit_message_handler(
        &mut self,
        node: &ViewNode,
        data: &MessageHandlerData,
    ) -> Result<(), RuleError> {
        self.collect(&node.path, &data.body);
        Ok(())
    }

    fn visit_custom_method(
        &mut self,
        node: &ViewNode,
        data: &CustomMethodData,
    ) -> Result<(), RuleError> {
        self.collect(&node.path, &data.body);
        Ok(())
    }

    fn visit_transform(&mut self, node: &ViewNode, data: &TransformData) -> Result<(), RuleError> {
        self.collect(&node.path, &data.body);
        Ok(())
    }

    fn visit_event_handler(
        &mut self,
        node: &ViewNode,
        data: &EventHandlerData,
    ) -> Result<(), RuleError> {
        self.collect(&node.path, &data.body);
        Ok(())
    }
}

impl Rule for ScriptLintRule {
    fn interests(&self) -> &[NodeKind] {
        &NodeKind::SCRIPTS
    }

    fn post_process(&mut self) -> Result<(), RuleError> {
        let Some(analyzer) = &self.analyzer else {
            return Ok(());
        };
        if self.collected.is_empty() {
            return Ok(());
        }

        debug!(
            "analyzing {} scripts ({} lines) in one batch",
            self.collected.len(),
            self.next_line - 1
        );
        let issues = analyzer.analyze(&self.source)?;
        let mapped: Vec<Report> = issues
            .into_iter()
            .map(|issue| match self.path_for_line(issue.line) {
                Some(path) => Report::new(path, issue.message),
                None => Report::new(
                    "",
                    format!("analyzer issue at unmapped line {}: {}", issue.line, issue.message),
                ),
            })
            .collect();
        self.reports.extend(mapped);
        Ok(())
    }

    fn take_reports(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }
}

pub fn descriptor() -> RuleDescriptor {
    RuleDescriptor {
        id: RULE_ID,
        description: "Script bodies should pass the configured external analyzer",
        default_severity: Severity::Error,
        preprocess: None,
        build: |params| Ok(Box::new(ScriptLintRule::from_params(params)?)),
    }
}
