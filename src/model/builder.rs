//! Model construction.
//!
//! Rebuilds the typed node tree from a document's flattened entries: anchors
//! come from the classifier table, nodes are instantiated parents-first, and
//! every entry ends up claimed by exactly one node, either as an anchor
//! attribute or as a property-bag member.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::error::ModelError;
use crate::flatten::{FlatEntry, PropertyValue};
use crate::model::classify::{classify_entry, Classification};
use crate::model::node::{
    ComponentData, CustomMethodData, EventHandlerData, ExpressionBindingData, HandlerScope,
    MessageHandlerData, NodeData, NodeId, NodeKind, PropertyBindingData, PropertyData,
    TagBindingData, TransformData, ViewNode,
};
use crate::model::path;
use crate::model::{BuildWarning, Model};

/// Containers under a component anchor whose entries belong to the
/// component's own bag rather than to standalone property nodes.
const COMPONENT_CONTAINERS: &[&str] = &["meta", "position", "propConfig", "scripts", "events"];

/// Top-level containers that only make sense inside an anchored node; an
/// entry under one of these with no anchor ancestor is an orphan.
const ORPHAN_CONTAINERS: &[&str] = &["meta", "binding", "scripts", "events"];

struct Seed {
    path: String,
    kind: NodeKind,
    /// Scalar payload for property seeds; structural anchors resolve their
    /// attributes through lookups instead.
    value: Option<PropertyValue>,
}

enum Claim {
    /// Bag member of the node anchored at the given path.
    Bag(String),
    /// The entry's own property node.
    Own(String),
    /// No owning anchor; lands in the synthetic root's bag.
    Orphan,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBuilder {
    strict: bool,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// In strict mode orphaned member entries fail the build instead of
    /// attaching to a synthetic root.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(&self, entries: &[FlatEntry]) -> Result<Model, ModelError> {
        let lookup: HashMap<&str, &PropertyValue> = entries
            .iter()
            .map(|entry| (entry.path.as_str(), &entry.value))
            .collect();

        // Anchor seeds from the classifier table.
        let mut seeds: Vec<Seed> = Vec::new();
        let mut seed_kinds: HashMap<String, NodeKind> = HashMap::new();
        let mut warnings: Vec<BuildWarning> = Vec::new();
        let mut classifications = Vec::with_capacity(entries.len());

        for entry in entries {
            let classification = classify_entry(&entry.path, &entry.value);
            match &classification {
                Classification::Anchor { anchor, kind } => {
                    add_seed(&mut seeds, &mut seed_kinds, anchor.clone(), *kind, None)?;
                }
                Classification::Ambiguous { message } => {
                    warnings.push(BuildWarning {
                        path: entry.path.clone(),
                        message: message.clone(),
                    });
                    add_seed(
                        &mut seeds,
                        &mut seed_kinds,
                        entry.path.clone(),
                        NodeKind::Property,
                        Some(entry.value.clone()),
                    )?;
                }
                Classification::Member => {}
            }
            classifications.push(classification);
        }

        // Claim resolution. Members join the nearest anchor's bag when that
        // anchor reserves them, become standalone property nodes otherwise,
        // and fall back to the synthetic root when nothing owns them.
        let mut claims_per_entry: Vec<Claim> = Vec::with_capacity(entries.len());
        for (entry, classification) in entries.iter().zip(&classifications) {
            let claim = match classification {
                Classification::Anchor { anchor, .. } => Claim::Bag(anchor.clone()),
                Classification::Ambiguous { .. } => Claim::Own(entry.path.clone()),
                Classification::Member => {
                    self.resolve_member(entry, &mut seeds, &mut seed_kinds)?
                }
            };
            claims_per_entry.push(claim);
        }

        // Parents strictly before children: ascending path length, path as
        // tie-break (which also orders sibling indices numerically).
        seeds.sort_by(|a, b| (a.path.len(), &a.path).cmp(&(b.path.len(), &b.path)));

        let mut nodes: Vec<ViewNode> = Vec::new();
        let mut owned: Vec<Vec<NodeId>> = Vec::new();
        let mut index: HashMap<String, NodeId> = HashMap::new();
        let mut anchor_ids: HashMap<String, NodeId> = HashMap::new();
        let mut by_kind: HashMap<NodeKind, Vec<NodeId>> = HashMap::new();
        let mut roots: Vec<NodeId> = Vec::new();

        let has_orphans = claims_per_entry
            .iter()
            .any(|claim| matches!(claim, Claim::Orphan));
        let mut synthetic_root = None;
        if has_orphans {
            let id = NodeId(0);
            debug!("attaching orphaned entries to a synthetic root");
            nodes.push(ViewNode {
                id,
                path: String::new(),
                parent: None,
                properties: BTreeMap::new(),
                data: NodeData::Property(PropertyData {
                    name: String::new(),
                    value: PropertyValue::Null,
                }),
            });
            owned.push(Vec::new());
            index.insert(String::new(), id);
            by_kind.entry(NodeKind::Property).or_default().push(id);
            roots.push(id);
            synthetic_root = Some(id);
        }

        for seed in &seeds {
            let id = NodeId(nodes.len());
            let parent = nearest_created_anchor(&anchor_ids, &seed.path);
            let data = make_data(seed, &lookup);
            let is_component = matches!(data, NodeData::Component(_));

            nodes.push(ViewNode {
                id,
                path: seed.path.clone(),
                parent,
                properties: BTreeMap::new(),
                data,
            });
            owned.push(Vec::new());

            match parent {
                Some(pid) => {
                    owned[pid.0].push(id);
                    if is_component {
                        if let NodeData::Component(parent_data) = &mut nodes[pid.0].data {
                            parent_data.children.push(id);
                        }
                    }
                }
                None => roots.push(id),
            }

            index.insert(seed.path.clone(), id);
            anchor_ids.insert(seed.path.clone(), id);
            by_kind.entry(seed.kind).or_default().push(id);
        }

        // Materialize property bags and the entry-ownership map.
        let mut claims: HashMap<String, NodeId> = HashMap::with_capacity(entries.len());
        for (entry, claim) in entries.iter().zip(&claims_per_entry) {
            match claim {
                Claim::Bag(anchor) => {
                    let id = index[anchor.as_str()];
                    let key = path::relative_key(anchor, &entry.path).to_string();
                    nodes[id.0].properties.insert(key, entry.value.clone());
                    claims.insert(entry.path.clone(), id);
                }
                Claim::Own(node_path) => {
                    claims.insert(entry.path.clone(), index[node_path.as_str()]);
                }
                Claim::Orphan => {
                    if let Some(id) = synthetic_root {
                        nodes[id.0]
                            .properties
                            .insert(entry.path.clone(), entry.value.clone());
                        claims.insert(entry.path.clone(), id);
                    }
                }
            }
        }

        // Pre-order traversal over roots in creation order.
        let mut traversal = Vec::with_capacity(nodes.len());
        let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            traversal.push(id);
            for &child in owned[id.0].iter().rev() {
                stack.push(child);
            }
        }

        debug!(
            "built model: {} nodes, {} roots, {} warnings",
            nodes.len(),
            roots.len(),
            warnings.len()
        );

        Ok(Model {
            nodes,
            index,
            by_kind,
            owned,
            roots,
            traversal,
            claims,
            warnings,
        })
    }

    fn resolve_member(
        &self,
        entry: &FlatEntry,
        seeds: &mut Vec<Seed>,
        seed_kinds: &mut HashMap<String, NodeKind>,
    ) -> Result<Claim, ModelError> {
        match nearest_seed(seed_kinds, &entry.path) {
            Some((anchor, NodeKind::Component)) => {
                let first = path::first_relative_segment(&anchor, &entry.path);
                let relative = path::relative_key(&anchor, &entry.path);
                if relative == "type" || COMPONENT_CONTAINERS.contains(&first) {
                    Ok(Claim::Bag(anchor))
                } else {
                    add_seed(
                        seeds,
                        seed_kinds,
                        entry.path.clone(),
                        NodeKind::Property,
                        Some(entry.value.clone()),
                    )?;
                    Ok(Claim::Own(entry.path.clone()))
                }
            }
            // Bindings and scripts absorb everything beneath their anchor.
            Some((anchor, _)) => Ok(Claim::Bag(anchor)),
            None => {
                let first = path::first_relative_segment("", &entry.path);
                if ORPHAN_CONTAINERS.contains(&first) {
                    if self.strict {
                        return Err(ModelError::OrphanEntry {
                            path: entry.path.clone(),
                        });
                    }
                    Ok(Claim::Orphan)
                } else {
                    add_seed(
                        seeds,
                        seed_kinds,
                        entry.path.clone(),
                        NodeKind::Property,
                        Some(entry.value.clone()),
                    )?;
                    Ok(Claim::Own(entry.path.clone()))
                }
            }
        }
    }
}

fn add_seed(
    seeds: &mut Vec<Seed>,
    seed_kinds: &mut HashMap<String, NodeKind>,
    anchor: String,
    kind: NodeKind,
    value: Option<PropertyValue>,
) -> Result<(), ModelError> {
    if let Some(&existing) = seed_kinds.get(&anchor) {
        return Err(ModelError::DuplicateAnchor {
            path: anchor,
            existing,
            incoming: kind,
        });
    }
    seed_kinds.insert(anchor.clone(), kind);
    seeds.push(Seed {
        path: anchor,
        kind,
        value,
    });
    Ok(())
}

/// Longest proper-prefix anchor for `entry_path` among the seeds. Walks the
/// parent chain, so the deepest (most specific) anchor wins.
fn nearest_seed(
    seed_kinds: &HashMap<String, NodeKind>,
    entry_path: &str,
) -> Option<(String, NodeKind)> {
    let mut current = entry_path;
    while let Some(parent) = path::parent_path(current) {
        if let Some(&kind) = seed_kinds.get(parent) {
            return Some((parent.to_string(), kind));
        }
        current = parent;
    }
    None
}

fn nearest_created_anchor(anchor_ids: &HashMap<String, NodeId>, node_path: &str) -> Option<NodeId> {
    let mut current = node_path;
    while let Some(parent) = path::parent_path(current) {
        if let Some(&id) = anchor_ids.get(parent) {
            return Some(id);
        }
        current = parent;
    }
    None
}

fn join(anchor: &str, suffix: &str) -> String {
    if anchor.is_empty() {
        suffix.to_string()
    } else {
        format!("{anchor}.{suffix}")
    }
}

fn get_str<'a>(lookup: &HashMap<&str, &'a PropertyValue>, key: &str) -> Option<&'a str> {
    lookup.get(key).and_then(|value| value.as_str())
}

fn get_bool(lookup: &HashMap<&str, &PropertyValue>, key: &str) -> bool {
    lookup
        .get(key)
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

fn make_data(seed: &Seed, lookup: &HashMap<&str, &PropertyValue>) -> NodeData {
    let anchor = seed.path.as_str();
    match seed.kind {
        NodeKind::Component => NodeData::Component(ComponentData {
            name: get_str(lookup, &join(anchor, "meta.name"))
                .unwrap_or("unknown")
                .to_string(),
            component_type: get_str(lookup, &join(anchor, "type"))
                .unwrap_or("unknown")
                .to_string(),
            children: Vec::new(),
        }),
        NodeKind::ExpressionBinding => NodeData::ExpressionBinding(ExpressionBindingData {
            expression: get_str(lookup, &join(anchor, "binding.config.expression"))
                .unwrap_or("unknown")
                .to_string(),
        }),
        NodeKind::PropertyBinding => NodeData::PropertyBinding(PropertyBindingData {
            target_path: get_str(lookup, &join(anchor, "binding.config.path"))
                .unwrap_or("unknown")
                .to_string(),
        }),
        NodeKind::TagBinding => NodeData::TagBinding(TagBindingData {
            tag_path: get_str(lookup, &join(anchor, "binding.config.tagPath"))
                .unwrap_or("unknown")
                .to_string(),
        }),
        NodeKind::MessageHandler => NodeData::MessageHandler(MessageHandlerData {
            message_type: get_str(lookup, &join(anchor, "messageType"))
                .unwrap_or("unknown")
                .to_string(),
            scope: HandlerScope {
                page: get_bool(lookup, &join(anchor, "pageScope")),
                session: get_bool(lookup, &join(anchor, "sessionScope")),
                view: get_bool(lookup, &join(anchor, "viewScope")),
            },
            body: get_str(lookup, &join(anchor, "script"))
                .unwrap_or_default()
                .to_string(),
        }),
        NodeKind::CustomMethod => {
            let mut params = Vec::new();
            loop {
                let key = join(anchor, &format!("params[{}]", params.len()));
                match lookup.get(key.as_str()) {
                    Some(value) => params.push(value.to_string()),
                    None => break,
                }
            }
            NodeData::CustomMethod(CustomMethodData {
                name: get_str(lookup, &join(anchor, "name"))
                    .unwrap_or("unknown")
                    .to_string(),
                params,
                body: get_str(lookup, &join(anchor, "script"))
                    .unwrap_or_default()
                    .to_string(),
            })
        }
        NodeKind::Transform => NodeData::Transform(TransformData {
            owning_binding_path: owning_binding_path(anchor),
            body: get_str(lookup, &join(anchor, "script"))
                .unwrap_or_default()
                .to_string(),
        }),
        NodeKind::EventHandler => NodeData::EventHandler(EventHandlerData {
            event_type: path::last_segment(anchor).to_string(),
            scope: get_str(lookup, &join(anchor, "scope"))
                .unwrap_or("L")
                .to_string(),
            body: get_str(lookup, &join(anchor, "script"))
                .or_else(|| get_str(lookup, &join(anchor, "config.script")))
                .unwrap_or_default()
                .to_string(),
        }),
        NodeKind::Property => NodeData::Property(PropertyData {
            name: path::last_segment(&seed.path).to_string(),
            value: seed.value.clone().unwrap_or(PropertyValue::Null),
        }),
    }
}

/// The component property a transform's binding is attached to.
fn owning_binding_path(anchor: &str) -> String {
    if let Some(cut) = anchor.rfind(".binding.") {
        anchor[..cut].to_string()
    } else if anchor.starts_with("binding.") {
        String::new()
    } else {
        "unknown".to_string()
    }
}
