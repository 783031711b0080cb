//! Heuristic path classification.
//!
//! Decides, from path shape alone, which flattened entries anchor a new node
//! and which variant that node is. The heuristics live in one ordered table
//! evaluated first-match-wins, so adding an anchor shape is a data change
//! rather than new control flow. Entries matched by no predicate are members:
//! they either join an ancestor's property bag or fall back to standalone
//! property nodes (the builder's concern).

use crate::flatten::PropertyValue;
use crate::model::node::NodeKind;
use crate::model::path;

/// Classification outcome for a single entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// The entry starts a new node at `anchor`.
    Anchor { anchor: String, kind: NodeKind },
    /// The entry looked like an anchor but its shape is unusable; it
    /// degrades to a plain property node and the message becomes a warning
    /// finding.
    Ambiguous { message: String },
    /// Not an anchor-defining entry.
    Member,
}

type Predicate = fn(&str, &PropertyValue) -> Option<Classification>;

/// Ordered anchor predicates; the first match wins.
const CLASSIFIERS: &[(&str, Predicate)] = &[
    ("component", classify_component),
    ("binding", classify_binding),
    ("message-handler", classify_message_handler),
    ("custom-method", classify_custom_method),
    ("event-handler", classify_event_handler),
    ("transform", classify_transform),
];

pub fn classify_entry(entry_path: &str, value: &PropertyValue) -> Classification {
    for (_, predicate) in CLASSIFIERS {
        if let Some(classification) = predicate(entry_path, value) {
            return classification;
        }
    }
    Classification::Member
}

fn strip_suffix<'a>(entry_path: &'a str, suffix: &str) -> Option<&'a str> {
    if entry_path == suffix {
        return Some("");
    }
    entry_path
        .strip_suffix(suffix)
        .and_then(|head| head.strip_suffix('.'))
}

fn classify_component(entry_path: &str, _value: &PropertyValue) -> Option<Classification> {
    strip_suffix(entry_path, "meta.name").map(|anchor| Classification::Anchor {
        anchor: anchor.to_string(),
        kind: NodeKind::Component,
    })
}

fn classify_binding(entry_path: &str, value: &PropertyValue) -> Option<Classification> {
    let anchor = strip_suffix(entry_path, "binding.type")?;
    let kind = match value.as_str() {
        Some("expr") | Some("expression") => NodeKind::ExpressionBinding,
        Some("property") => NodeKind::PropertyBinding,
        Some("tag") => NodeKind::TagBinding,
        other => {
            let shown = other.map_or_else(|| value.to_string(), str::to_string);
            return Some(Classification::Ambiguous {
                message: format!(
                    "unrecognized binding type '{shown}' at '{anchor}'; treating entry as a plain property"
                ),
            });
        }
    };
    Some(Classification::Anchor {
        anchor: anchor.to_string(),
        kind,
    })
}

fn classify_message_handler(entry_path: &str, _value: &PropertyValue) -> Option<Classification> {
    let anchor = strip_suffix(entry_path, "script")?;
    if !path::has_indexed_segment(anchor, "messageHandlers") {
        return None;
    }
    Some(Classification::Anchor {
        anchor: anchor.to_string(),
        kind: NodeKind::MessageHandler,
    })
}

fn classify_custom_method(entry_path: &str, _value: &PropertyValue) -> Option<Classification> {
    let anchor = strip_suffix(entry_path, "script")?;
    if !path::has_indexed_segment(anchor, "customMethods") {
        return None;
    }
    Some(Classification::Anchor {
        anchor: anchor.to_string(),
        kind: NodeKind::CustomMethod,
    })
}

fn classify_event_handler(entry_path: &str, _value: &PropertyValue) -> Option<Classification> {
    // Both serializations anchor the same container: `events.onClick.script`
    // and the alternative `events.onClick.config.script`.
    let anchor = strip_suffix(entry_path, "config.script")
        .or_else(|| strip_suffix(entry_path, "script"))?;
    let parent = path::parent_path(anchor)?;
    if path::last_segment(parent) != "events" {
        return None;
    }
    Some(Classification::Anchor {
        anchor: anchor.to_string(),
        kind: NodeKind::EventHandler,
    })
}

fn classify_transform(entry_path: &str, _value: &PropertyValue) -> Option<Classification> {
    let anchor = strip_suffix(entry_path, "script")?;
    if !path::has_indexed_segment(anchor, "transforms")
        || !path::segments(anchor).any(|s| s == "binding")
    {
        return None;
    }
    Some(Classification::Anchor {
        anchor: anchor.to_string(),
        kind: NodeKind::Transform,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(entry_path: &str, value: PropertyValue) -> Classification {
        classify_entry(entry_path, &value)
    }

    fn str_value(s: &str) -> PropertyValue {
        PropertyValue::Str(s.to_string())
    }

    #[test]
    fn meta_name_anchors_component_at_enclosing_container() {
        assert_eq!(
            classify("root.children[2].meta.name", str_value("Btn")),
            Classification::Anchor {
                anchor: "root.children[2]".to_string(),
                kind: NodeKind::Component,
            }
        );
        // A document-level meta.name anchors the empty path.
        assert_eq!(
            classify("meta.name", str_value("View")),
            Classification::Anchor {
                anchor: String::new(),
                kind: NodeKind::Component,
            }
        );
        assert_eq!(classify("root.metadata.name", str_value("x")), Classification::Member);
    }

    #[test]
    fn binding_type_value_selects_binding_kind() {
        for (value, kind) in [
            ("expr", NodeKind::ExpressionBinding),
            ("expression", NodeKind::ExpressionBinding),
            ("property", NodeKind::PropertyBinding),
            ("tag", NodeKind::TagBinding),
        ] {
            assert_eq!(
                classify("root.props.text.binding.type", str_value(value)),
                Classification::Anchor {
                    anchor: "root.props.text".to_string(),
                    kind,
                }
            );
        }
    }

    #[test]
    fn unknown_binding_type_is_ambiguous() {
        let classification = classify("root.props.text.binding.type", str_value("query"));
        let Classification::Ambiguous { message } = classification else {
            panic!("expected ambiguity, got {classification:?}");
        };
        assert!(message.contains("query"));
        assert!(message.contains("root.props.text"));
    }

    #[test]
    fn script_anchors_by_container_shape() {
        assert_eq!(
            classify("root.scripts.messageHandlers[0].script", str_value("pass")),
            Classification::Anchor {
                anchor: "root.scripts.messageHandlers[0]".to_string(),
                kind: NodeKind::MessageHandler,
            }
        );
        assert_eq!(
            classify("root.scripts.customMethods[1].script", str_value("pass")),
            Classification::Anchor {
                anchor: "root.scripts.customMethods[1]".to_string(),
                kind: NodeKind::CustomMethod,
            }
        );
        assert_eq!(
            classify("root.events.onClick.script", str_value("print(1)")),
            Classification::Anchor {
                anchor: "root.events.onClick".to_string(),
                kind: NodeKind::EventHandler,
            }
        );
        assert_eq!(
            classify("root.events.onClick.config.script", str_value("print(1)")),
            Classification::Anchor {
                anchor: "root.events.onClick".to_string(),
                kind: NodeKind::EventHandler,
            }
        );
        assert_eq!(
            classify(
                "root.props.text.binding.transforms[0].script",
                str_value("return value")
            ),
            Classification::Anchor {
                anchor: "root.props.text.binding.transforms[0]".to_string(),
                kind: NodeKind::Transform,
            }
        );
    }

    #[test]
    fn handler_containers_win_over_the_event_predicate() {
        // messageHandlers paths also end in `.script`; table order keeps them
        // from being misread as event handlers.
        let classification = classify(
            "root.events.onClick.messageHandlers[0].script",
            str_value("pass"),
        );
        assert_eq!(
            classification,
            Classification::Anchor {
                anchor: "root.events.onClick.messageHandlers[0]".to_string(),
                kind: NodeKind::MessageHandler,
            }
        );
    }

    #[test]
    fn plain_scalar_paths_are_members() {
        assert_eq!(classify("root.props.text", str_value("hello")), Classification::Member);
        assert_eq!(classify("root.type", str_value("button")), Classification::Member);
        assert_eq!(
            classify("root.scripts.messageHandlers[0].messageType", str_value("go")),
            Classification::Member
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let cases = [
            ("root.meta.name", str_value("A")),
            ("root.props.x.binding.type", str_value("tag")),
            ("root.events.onChange.script", str_value("pass")),
            ("root.props.y", PropertyValue::Int(3)),
        ];
        for (entry_path, value) in &cases {
            assert_eq!(
                classify_entry(entry_path, value),
                classify_entry(entry_path, value)
            );
        }
    }
}
