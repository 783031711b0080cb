//! View node types and visitor dispatch.
//!
//! The node hierarchy is a closed sum type: every variant the classifier can
//! produce is enumerated here, and rules receive nodes through the
//! [`NodeVisitor`] double-dispatch contract. Extending the hierarchy means
//! touching [`NodeKind`], [`NodeData`], [`NodeVisitor`], and the classifier
//! table together; nothing is discovered implicitly.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::RuleError;
use crate::flatten::PropertyValue;

/// Stable identifier of a node inside one [`Model`](crate::model::Model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Discriminant of the closed node variant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Component,
    ExpressionBinding,
    PropertyBinding,
    TagBinding,
    MessageHandler,
    CustomMethod,
    Transform,
    EventHandler,
    Property,
}

impl NodeKind {
    pub const ALL: [NodeKind; 9] = [
        NodeKind::Component,
        NodeKind::ExpressionBinding,
        NodeKind::PropertyBinding,
        NodeKind::TagBinding,
        NodeKind::MessageHandler,
        NodeKind::CustomMethod,
        NodeKind::Transform,
        NodeKind::EventHandler,
        NodeKind::Property,
    ];

    /// The binding variants.
    pub const BINDINGS: [NodeKind; 3] = [
        NodeKind::ExpressionBinding,
        NodeKind::PropertyBinding,
        NodeKind::TagBinding,
    ];

    /// The script-carrying variants.
    pub const SCRIPTS: [NodeKind; 4] = [
        NodeKind::MessageHandler,
        NodeKind::CustomMethod,
        NodeKind::Transform,
        NodeKind::EventHandler,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::ExpressionBinding => "expression_binding",
            Self::PropertyBinding => "property_binding",
            Self::TagBinding => "tag_binding",
            Self::MessageHandler => "message_handler",
            Self::CustomMethod => "custom_method",
            Self::Transform => "transform",
            Self::EventHandler => "event_handler",
            Self::Property => "property",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message handler scope flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerScope {
    pub page: bool,
    pub session: bool,
    pub view: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentData {
    pub name: String,
    pub component_type: String,
    /// Ordered child components. Other owned nodes hang off the parent link.
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionBindingData {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBindingData {
    pub target_path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagBindingData {
    pub tag_path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageHandlerData {
    pub message_type: String,
    pub scope: HandlerScope,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomMethodData {
    pub name: String,
    pub params: Vec<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformData {
    pub owning_binding_path: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventHandlerData {
    pub event_type: String,
    pub scope: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyData {
    pub name: String,
    pub value: PropertyValue,
}

/// Variant payloads. Closed set; see the module docs before adding one.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Component(ComponentData),
    ExpressionBinding(ExpressionBindingData),
    PropertyBinding(PropertyBindingData),
    TagBinding(TagBindingData),
    MessageHandler(MessageHandlerData),
    CustomMethod(CustomMethodData),
    Transform(TransformData),
    EventHandler(EventHandlerData),
    Property(PropertyData),
}

/// One typed node in the rebuilt view tree.
///
/// `parent` is a lookup edge, never an ownership edge; ownership lives in
/// the model's arena. The property bag holds every flattened entry under
/// this node's anchor that no deeper node claimed, keyed by the path suffix
/// relative to the anchor.
#[derive(Debug, Clone)]
pub struct ViewNode {
    pub id: NodeId,
    pub path: String,
    pub parent: Option<NodeId>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub data: NodeData,
}

impl ViewNode {
    pub fn kind(&self) -> NodeKind {
        match &self.data {
            NodeData::Component(_) => NodeKind::Component,
            NodeData::ExpressionBinding(_) => NodeKind::ExpressionBinding,
            NodeData::PropertyBinding(_) => NodeKind::PropertyBinding,
            NodeData::TagBinding(_) => NodeKind::TagBinding,
            NodeData::MessageHandler(_) => NodeKind::MessageHandler,
            NodeData::CustomMethod(_) => NodeKind::CustomMethod,
            NodeData::Transform(_) => NodeKind::Transform,
            NodeData::EventHandler(_) => NodeKind::EventHandler,
            NodeData::Property(_) => NodeKind::Property,
        }
    }

    /// Script body for the script-carrying variants.
    pub fn script_body(&self) -> Option<&str> {
        match &self.data {
            NodeData::MessageHandler(d) => Some(&d.body),
            NodeData::CustomMethod(d) => Some(&d.body),
            NodeData::Transform(d) => Some(&d.body),
            NodeData::EventHandler(d) => Some(&d.body),
            _ => None,
        }
    }

    /// Double-dispatch to the visitor method matching this node's variant.
    pub fn accept(&self, visitor: &mut dyn NodeVisitor) -> Result<(), RuleError> {
        match &self.data {
            NodeData::Component(d) => visitor.visit_component(self, d),
            NodeData::ExpressionBinding(d) => visitor.visit_expression_binding(self, d),
            NodeData::PropertyBinding(d) => visitor.visit_property_binding(self, d),
            NodeData::TagBinding(d) => visitor.visit_tag_binding(self, d),
            NodeData::MessageHandler(d) => visitor.visit_message_handler(self, d),
            NodeData::CustomMethod(d) => visitor.visit_custom_method(self, d),
            NodeData::Transform(d) => visitor.visit_transform(self, d),
            NodeData::EventHandler(d) => visitor.visit_event_handler(self, d),
            NodeData::Property(d) => visitor.visit_property(self, d),
        }
    }
}

/// Per-variant visit contract with no-op defaults.
///
/// A rule implements only the methods for the kinds it cares about; every
/// method is fallible so the engine can isolate a failing rule without
/// aborting the run.
#[allow(unused_variables)]
pub trait NodeVisitor {
    fn visit_component(&mut self, node: &ViewNode, data: &ComponentData) -> Result<(), RuleError> {
        Ok(())
    }

    fn visit_expression_binding(
        &mut self,
        node: &ViewNode,
        data: &ExpressionBindingData,
    ) -> Result<(), RuleError> {
        Ok(())
    }

    fn visit_property_binding(
        &mut self,
        node: &ViewNode,
        data: &PropertyBindingData,
    ) -> Result<(), RuleError> {
        Ok(())
    }

    fn visit_tag_binding(&mut self, node: &ViewNode, data: &TagBindingData) -> Result<(), RuleError> {
        Ok(())
    }

    fn visit_message_handler(
        &mut self,
        node: &ViewNode,
        data: &MessageHandlerData,
    ) -> Result<(), RuleError> {
        Ok(())
    }

    fn visit_custom_method(
        &mut self,
        node: &ViewNode,
        data: &CustomMethodData,
    ) -> Result<(), RuleError> {
        Ok(())
    }

    fn visit_transform(&mut self, node: &ViewNode, data: &TransformData) -> Result<(), RuleError> {
        Ok(())
    }

    fn visit_event_handler(
        &mut self,
        node: &ViewNode,
        data: &EventHandlerData,
    ) -> Result<(), RuleError> {
        Ok(())
    }

    fn visit_property(&mut self, node: &ViewNode, data: &PropertyData) -> Result<(), RuleError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(data: NodeData) -> ViewNode {
        ViewNode {
            id: NodeId(0),
            path: "root".to_string(),
            parent: None,
            properties: BTreeMap::new(),
            data,
        }
    }

    struct ComponentCounter {
        components: usize,
    }

    impl NodeVisitor for ComponentCounter {
        fn visit_component(
            &mut self,
            _node: &ViewNode,
            _data: &ComponentData,
        ) -> Result<(), RuleError> {
            self.components += 1;
            Ok(())
        }
    }

    #[test]
    fn accept_dispatches_to_matching_method() {
        let component = node(NodeData::Component(ComponentData {
            name: "Btn1".to_string(),
            component_type: "button".to_string(),
            children: Vec::new(),
        }));
        let property = node(NodeData::Property(PropertyData {
            name: "text".to_string(),
            value: PropertyValue::Str("hello".to_string()),
        }));

        let mut visitor = ComponentCounter { components: 0 };
        component.accept(&mut visitor).unwrap();
        property.accept(&mut visitor).unwrap();
        assert_eq!(visitor.components, 1);
    }

    #[test]
    fn unhandled_variants_default_to_noop() {
        struct Silent;
        impl NodeVisitor for Silent {}

        let script = node(NodeData::EventHandler(EventHandlerData {
            event_type: "onClick".to_string(),
            scope: "L".to_string(),
            body: "print(1)".to_string(),
        }));
        assert!(script.accept(&mut Silent).is_ok());
    }

    #[test]
    fn kind_round_trips_through_names() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeKind::parse("widget"), None);
    }

    #[test]
    fn script_body_only_for_script_kinds() {
        let handler = node(NodeData::MessageHandler(MessageHandlerData {
            message_type: "refresh".to_string(),
            scope: HandlerScope::default(),
            body: "pass".to_string(),
        }));
        assert_eq!(handler.script_body(), Some("pass"));

        let property = node(NodeData::Property(PropertyData {
            name: "x".to_string(),
            value: PropertyValue::Int(1),
        }));
        assert!(property.script_body().is_none());
    }
}
