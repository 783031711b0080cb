//! Rule registry.
//!
//! An explicitly constructed registry of rule descriptors with a documented
//! lifecycle: populated once at startup (registration needs `&mut self`),
//! read-only thereafter. Registration validates each candidate against the
//! rule contract; discovery collects per-candidate failures so one broken
//! contributed rule cannot block the rest. Concurrent registration requires
//! external synchronization.

use std::collections::BTreeMap;

use log::{debug, warn};
use thiserror::Error;

use crate::error::{ConfigurationError, RuleValidationError};
use crate::model::NodeKind;
use crate::rules::{builtin_rules, Rule, RuleDescriptor, RuleParams, RuleSettings, Severity};

/// Read-only facts about a registered rule, captured at registration time.
#[derive(Debug, Clone)]
pub struct RuleMetadata {
    pub id: String,
    pub description: String,
    pub default_severity: Severity,
    /// Interests of a default-constructed instance.
    pub interests: Vec<NodeKind>,
}

struct RegisteredRule {
    descriptor: RuleDescriptor,
    metadata: RuleMetadata,
}

/// Activation failure for a single configured rule.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("unknown rule '{0}'")]
    UnknownRule(String),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Outcome of a discovery pass: what registered, what failed and why.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub registered: Vec<String>,
    pub failures: Vec<(String, RuleValidationError)>,
}

/// A rule instance activated for one document run, bound to its id,
/// effective severity, and registration order.
pub struct ConfiguredRule {
    pub id: String,
    pub severity: Severity,
    pub(crate) order: usize,
    pub(crate) rule: Box<dyn Rule>,
}

#[derive(Default)]
pub struct RuleRegistry {
    entries: Vec<RegisteredRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the crate's built-in rules.
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        let report = registry.discover(builtin_rules());
        for (id, err) in &report.failures {
            warn!("built-in rule '{id}' failed registration: {err}");
        }
        registry
    }

    /// Validate and register one rule type.
    pub fn register(
        &mut self,
        descriptor: RuleDescriptor,
    ) -> Result<&'static str, RuleValidationError> {
        let id = descriptor.id;
        if id.is_empty() {
            return Err(RuleValidationError::EmptyId);
        }
        if self.entries.iter().any(|e| e.descriptor.id == id) {
            return Err(RuleValidationError::DuplicateId(id.to_string()));
        }
        if descriptor.description.trim().is_empty() {
            return Err(RuleValidationError::MissingDescription(id.to_string()));
        }

        // The contract requires construction from empty parameters and at
        // least one declared interest; probe with a throwaway instance.
        let probe =
            (descriptor.build)(&RuleParams::new()).map_err(|source| {
                RuleValidationError::Construction {
                    id: id.to_string(),
                    source,
                }
            })?;
        let interests = probe.interests().to_vec();
        if interests.is_empty() {
            return Err(RuleValidationError::NoInterests(id.to_string()));
        }

        let metadata = RuleMetadata {
            id: id.to_string(),
            description: descriptor.description.to_string(),
            default_severity: descriptor.default_severity,
            interests,
        };
        debug!("registered rule '{id}'");
        self.entries.push(RegisteredRule {
            descriptor,
            metadata,
        });
        Ok(id)
    }

    /// Register every candidate that validates; collect the rest as
    /// failures instead of raising.
    pub fn discover(&mut self, candidates: Vec<RuleDescriptor>) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        for candidate in candidates {
            let candidate_id = candidate.id.to_string();
            match self.register(candidate) {
                Ok(id) => report.registered.push(id.to_string()),
                Err(err) => {
                    warn!("skipping rule '{candidate_id}': {err}");
                    report.failures.push((candidate_id, err));
                }
            }
        }
        report
    }

    pub fn get(&self, id: &str) -> Option<&RuleDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.descriptor)
    }

    pub fn metadata(&self, id: &str) -> Option<&RuleMetadata> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.metadata)
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.descriptor.id == id)
    }

    /// Registered rule ids in registration order.
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.descriptor.id).collect()
    }

    /// Build one rule instance from its settings. `Ok(None)` means the rule
    /// is disabled.
    pub fn activate(
        &self,
        id: &str,
        settings: &RuleSettings,
    ) -> Result<Option<ConfiguredRule>, ActivationError> {
        let (order, entry) = self
            .entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.descriptor.id == id)
            .ok_or_else(|| ActivationError::UnknownRule(id.to_string()))?;

        if !settings.enabled {
            return Ok(None);
        }

        let params = match entry.descriptor.preprocess {
            Some(preprocess) => preprocess(settings.params.clone())?,
            None => settings.params.clone(),
        };
        let rule = (entry.descriptor.build)(&params)?;

        Ok(Some(ConfiguredRule {
            id: id.to_string(),
            severity: settings.severity.unwrap_or(entry.metadata.default_severity),
            order,
            rule,
        }))
    }

    /// Activate every configured rule, collecting per-rule failures so one
    /// bad activation cannot block the rest. Active rules come back in
    /// registration order.
    pub fn activate_all(
        &self,
        configured: &BTreeMap<String, RuleSettings>,
    ) -> (Vec<ConfiguredRule>, Vec<(String, ActivationError)>) {
        let mut active = Vec::new();
        let mut failures = Vec::new();
        for (id, settings) in configured {
            if id.starts_with('_') {
                continue;
            }
            match self.activate(id, settings) {
                Ok(Some(rule)) => active.push(rule),
                Ok(None) => debug!("rule '{id}' is disabled"),
                Err(err) => {
                    warn!("cannot activate rule '{id}': {err}");
                    failures.push((id.clone(), err));
                }
            }
        }
        active.sort_by_key(|rule| rule.order);
        (active, failures)
    }
}
