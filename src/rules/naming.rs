//! Name pattern rule.
//!
//! Validates the names of components, custom methods, message handlers,
//! event handlers, and properties against a naming convention or a custom
//! regex. Convention violations come with a suggested rename.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{ConfigurationError, RuleError};
use crate::model::{
    ComponentData, CustomMethodData, EventHandlerData, MessageHandlerData, NodeKind, NodeVisitor,
    PropertyData, ViewNode,
};
use crate::rules::{
    param_opt_usize, param_str, param_str_list, Report, Rule, RuleDescriptor, RuleParams, Severity,
};

pub const RULE_ID: &str = "name-pattern";

/// Word boundaries inside an undelimited name: `DataTable` -> [Data, Table],
/// `parseJSONFast` -> [parse, JSON, Fast].
static WORD_SPLITTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][a-z0-9]*|[a-z0-9]+|[A-Z]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Convention {
    Pascal,
    Camel,
    Snake,
    Kebab,
    ScreamingSnake,
    Title,
}

impl Convention {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "PascalCase" => Some(Self::Pascal),
            "camelCase" => Some(Self::Camel),
            "snake_case" => Some(Self::Snake),
            "kebab-case" => Some(Self::Kebab),
            "SCREAMING_SNAKE_CASE" => Some(Self::ScreamingSnake),
            "Title Case" => Some(Self::Title),
            _ => None,
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            Self::Pascal => r"^[A-Z][a-zA-Z0-9]*$",
            Self::Camel => r"^[a-z][a-zA-Z0-9]*$",
            Self::Snake => r"^[a-z][a-z0-9_]*$",
            Self::Kebab => r"^[a-z][a-z0-9-]*$",
            Self::ScreamingSnake => r"^[A-Z][A-Z0-9_]*$",
            Self::Title => r"^[A-Z][a-z]*(\s[A-Z][a-z]*)*$",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Pascal => "PascalCase",
            Self::Camel => "camelCase",
            Self::Snake => "snake_case",
            Self::Kebab => "kebab-case",
            Self::ScreamingSnake => "SCREAMING_SNAKE_CASE",
            Self::Title => "Title Case",
        }
    }

    /// Reassemble split name parts according to this convention.
    fn apply(self, parts: &[String]) -> String {
        match self {
            Self::Pascal => parts.iter().map(|p| capitalize(p)).collect(),
            Self::Camel => {
                let mut out = String::new();
                for (i, part) in parts.iter().enumerate() {
                    if i == 0 {
                        out.push_str(&part.to_lowercase());
                    } else {
                        out.push_str(&capitalize(part));
                    }
                }
                out
            }
            Self::Snake => parts
                .iter()
                .map(|p| p.to_lowercase())
                .collect::<Vec<_>>()
                .join("_"),
            Self::Kebab => parts
                .iter()
                .map(|p| p.to_lowercase())
                .collect::<Vec<_>>()
                .join("-"),
            Self::ScreamingSnake => parts
                .iter()
                .map(|p| p.to_uppercase())
                .collect::<Vec<_>>()
                .join("_"),
            Self::Title => parts
                .iter()
                .map(|p| capitalize(p))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[derive(Debug)]
pub struct NamePatternRule {
    pattern: Regex,
    pattern_description: String,
    convention: Option<Convention>,
    min_length: usize,
    max_length: Option<usize>,
    forbidden: BTreeSet<String>,
    skip: BTreeSet<String>,
    targets: Vec<NodeKind>,
    reports: Vec<Report>,
}

impl NamePatternRule {
    pub fn from_params(params: &RuleParams) -> Result<Self, ConfigurationError> {
        let convention_name = param_str(params, "convention")?;
        let custom_pattern = param_str(params, "custom_pattern")?;
        if convention_name.is_some() && custom_pattern.is_some() {
            return Err(ConfigurationError::new(
                "custom_pattern",
                "cannot be combined with 'convention'; choose one",
            ));
        }

        let (pattern, pattern_description, convention) = match custom_pattern {
            Some(raw) => {
                let pattern = Regex::new(&raw)
                    .map_err(|err| ConfigurationError::new("custom_pattern", err.to_string()))?;
                (pattern, format!("custom pattern '{raw}'"), None)
            }
            None => {
                let convention = match convention_name {
                    Some(name) => Convention::parse(&name).ok_or_else(|| {
                        ConfigurationError::new(
                            "convention",
                            format!("unknown naming convention '{name}'"),
                        )
                    })?,
                    None => Convention::Pascal,
                };
                let pattern = Regex::new(convention.pattern())
                    .map_err(|err| ConfigurationError::new("convention", err.to_string()))?;
                (pattern, convention.describe().to_string(), Some(convention))
            }
        };

        let targets = match param_str_list(params, "target_node_types")? {
            Some(names) => {
                let mut kinds = Vec::new();
                for name in names {
                    let kind = NodeKind::parse(&name).ok_or_else(|| {
                        ConfigurationError::new(
                            "target_node_types",
                            format!("unknown node kind '{name}'"),
                        )
                    })?;
                    if !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
                kinds
            }
            None => vec![NodeKind::Component],
        };
        if targets.is_empty() {
            return Err(ConfigurationError::new(
                "target_node_types",
                "must not be empty",
            ));
        }

        let skip = match param_str_list(params, "skip_names")? {
            Some(names) => names.into_iter().collect(),
            None => BTreeSet::from(["root".to_string()]),
        };

        Ok(Self {
            pattern,
            pattern_description,
            convention,
            min_length: param_opt_usize(params, "min_length")?.unwrap_or(1),
            max_length: param_opt_usize(params, "max_length")?,
            forbidden: param_str_list(params, "forbidden_names")?
                .unwrap_or_default()
                .into_iter()
                .collect(),
            skip,
            targets,
            reports: Vec::new(),
        })
    }

    fn check(&mut self, node: &ViewNode, name: &str) {
        if name.is_empty() || self.skip.contains(name) {
            return;
        }
        let kind = node.kind();

        if self.forbidden.contains(name) {
            self.reports.push(Report::new(
                node.path.as_str(),
                format!("name '{name}' is forbidden for {kind}"),
            ));
            return;
        }
        if name.len() < self.min_length {
            self.reports.push(Report::new(
                node.path.as_str(),
                format!(
                    "name '{name}' is too short (minimum {} characters) for {kind}",
                    self.min_length
                ),
            ));
            return;
        }
        if let Some(max_length) = self.max_length {
            if name.len() > max_length {
                self.reports.push(Report::new(
                    node.path.as_str(),
                    format!("name '{name}' is too long (maximum {max_length} characters) for {kind}"),
                ));
                return;
            }
        }

        if !self.pattern.is_match(name) {
            let mut message = format!(
                "name '{name}' does not follow {} for {kind}",
                self.pattern_description
            );
            if let Some(convention) = self.convention {
                let suggestion = convention.apply(&split_name(name));
                if !suggestion.is_empty() && suggestion != name {
                    message.push_str(&format!(" (suggestion: '{suggestion}')"));
                }
            }
            self.reports.push(Report::new(node.path.as_str(), message));
        }
    }
}

/// Split a name on delimiters, then on case boundaries when undelimited.
fn split_name(name: &str) -> Vec<String> {
    let parts: Vec<String> = name
        .split(['-', '_', ' '])
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if parts.len() == 1 {
        let words: Vec<String> = WORD_SPLITTER
            .find_iter(&parts[0])
            .map(|m| m.as_str().to_string())
            .collect();
        if words.len() > 1 {
            return words;
        }
    }
    parts
}

impl NodeVisitor for NamePatternRule {
    fn visit_component(&mut self, node: &ViewNode, data: &ComponentData) -> Result<(), RuleError> {
        self.check(node, &data.name);
        Ok(())
    }

    fn visit_message_handler(
        &mut self,
        node: &ViewNode,
        data: &MessageHandlerData,
    ) -> Result<(), RuleError> {
        self.check(node, &data.message_type);
        Ok(())
    }

    fn visit_custom_method(
        &mut self,
        node: &ViewNode,
        data: &CustomMethodData,
    ) -> Result<(), RuleError> {
        self.check(node, &data.name);
        Ok(())
    }

    fn visit_event_handler(
        &mut self,
        node: &ViewNode,
        data: &EventHandlerData,
    ) -> Result<(), RuleError> {
        self.check(node, &data.event_type);
        Ok(())
    }

    fn visit_property(&mut self, node: &ViewNode, data: &PropertyData) -> Result<(), RuleError> {
        self.check(node, &data.name);
        Ok(())
    }
}

impl Rule for NamePatternRule {
    fn interests(&self) -> &[NodeKind] {
        &self.targets
    }

    fn take_reports(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }
}

/// Accept a bare string where a list of node kinds is expected.
fn preprocess(mut params: RuleParams) -> Result<RuleParams, ConfigurationError> {
    if let Some(value) = params.get("target_node_types") {
        if value.is_string() {
            let single = value.clone();
            params.insert(
                "target_node_types".to_string(),
                Value::Array(vec![single]),
            );
        }
    }
    Ok(params)
}

pub fn descriptor() -> RuleDescriptor {
    RuleDescriptor {
        id: RULE_ID,
        description: "Names should follow the configured naming convention",
        default_severity: Severity::Warning,
        preprocess: Some(preprocess),
        build: |params| Ok(Box::new(NamePatternRule::from_params(params)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::PropertyValue;
    use crate::model::{NodeData, NodeId};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn rule(params: Value) -> NamePatternRule {
        let Value::Object(map) = params else {
            panic!("expected object");
        };
        NamePatternRule::from_params(&map).unwrap()
    }

    fn component(name: &str) -> ViewNode {
        ViewNode {
            id: NodeId(0),
            path: "root".to_string(),
            parent: None,
            properties: BTreeMap::new(),
            data: NodeData::Component(ComponentData {
                name: name.to_string(),
                component_type: "button".to_string(),
                children: Vec::new(),
            }),
        }
    }

    fn run_on(rule: &mut NamePatternRule, node: &ViewNode) -> Vec<Report> {
        node.accept(rule).unwrap();
        rule.take_reports()
    }

    #[test]
    fn pascal_case_violation_reports_with_suggestion() {
        let mut rule = rule(json!({ "convention": "PascalCase" }));
        let reports = run_on(&mut rule, &component("btn1"));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].node_path, "root");
        assert!(reports[0].message.contains("btn1"));
        assert!(reports[0].message.contains("suggestion: 'Btn1'"));
    }

    #[test]
    fn conforming_names_pass() {
        let mut rule = rule(json!({ "convention": "PascalCase" }));
        assert!(run_on(&mut rule, &component("DataTable")).is_empty());
        assert!(run_on(&mut rule, &component("Btn1")).is_empty());
    }

    #[test]
    fn root_is_skipped_by_default() {
        let mut rule = rule(json!({ "convention": "PascalCase" }));
        assert!(run_on(&mut rule, &component("root")).is_empty());
    }

    #[test]
    fn forbidden_and_length_constraints() {
        let mut rule = rule(json!({
            "convention": "PascalCase",
            "forbidden_names": ["Temp"],
            "min_length": 3,
            "max_length": 10
        }));
        assert!(run_on(&mut rule, &component("Temp"))[0]
            .message
            .contains("forbidden"));
        assert!(run_on(&mut rule, &component("Ab"))[0]
            .message
            .contains("too short"));
        assert!(run_on(&mut rule, &component("AbcdefghijK"))[0]
            .message
            .contains("too long"));
    }

    #[test]
    fn custom_pattern_overrides_convention() {
        let mut rule = rule(json!({ "custom_pattern": "^btn_[a-z]+$" }));
        assert!(run_on(&mut rule, &component("btn_save")).is_empty());
        let reports = run_on(&mut rule, &component("Save"));
        assert_eq!(reports.len(), 1);
        // No convention, no suggestion.
        assert!(!reports[0].message.contains("suggestion"));
    }

    #[test]
    fn snake_case_suggestion_splits_camel_words() {
        let mut rule = rule(json!({ "convention": "snake_case" }));
        let reports = run_on(&mut rule, &component("VeryBadProperty"));
        assert!(reports[0].message.contains("'very_bad_property'"));
    }

    #[test]
    fn configurable_targets_reach_properties() {
        let mut rule = rule(json!({
            "convention": "camelCase",
            "target_node_types": ["property"]
        }));
        assert_eq!(rule.interests(), &[NodeKind::Property][..]);

        let node = ViewNode {
            id: NodeId(0),
            path: "root.props.MyText".to_string(),
            parent: None,
            properties: BTreeMap::new(),
            data: NodeData::Property(PropertyData {
                name: "MyText".to_string(),
                value: PropertyValue::Str("x".to_string()),
            }),
        };
        let reports = run_on(&mut rule, &node);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("'myText'"));
    }

    #[test]
    fn rejects_conflicting_and_malformed_params() {
        let Value::Object(both) = json!({
            "convention": "PascalCase",
            "custom_pattern": "^x$"
        }) else {
            panic!("expected object");
        };
        assert_eq!(
            NamePatternRule::from_params(&both).unwrap_err().key,
            "custom_pattern"
        );

        let Value::Object(unknown) = json!({ "convention": "SpongeCase" }) else {
            panic!("expected object");
        };
        assert_eq!(
            NamePatternRule::from_params(&unknown).unwrap_err().key,
            "convention"
        );

        let Value::Object(bad_kind) = json!({ "target_node_types": ["gadget"] }) else {
            panic!("expected object");
        };
        assert_eq!(
            NamePatternRule::from_params(&bad_kind).unwrap_err().key,
            "target_node_types"
        );
    }

    #[test]
    fn preprocess_coerces_single_target_string() {
        let Value::Object(params) = json!({ "target_node_types": "component" }) else {
            panic!("expected object");
        };
        let processed = preprocess(params).unwrap();
        assert_eq!(
            processed.get("target_node_types"),
            Some(&json!(["component"]))
        );
    }
}
