//! Normalized in-memory representation of an ArchiMate exchange model.
//!
//! The same types serve three roles: the [`Blueprint`] parsed from a
//! template, the caller-supplied [`OverrideDocument`] (every field optional,
//! absence means "inherit"), and the [`ConsolidatedModel`] produced by the
//! merge. JSON field names follow the exchange datamodel convention
//! (`elementRef`, `relationshipRef`, `child_order`, ...) so override
//! documents round-trip unchanged.

use serde::{Deserialize, Serialize};

/// Localized text payload (`name`, `documentation`, `label`).
///
/// Deserializes from either a plain JSON string or `{"text": ..., "lang": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TextPayload")]
pub struct LocalizedText {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl LocalizedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: None,
        }
    }

    pub fn with_lang(text: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: Some(lang.into()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextPayload {
    Plain(String),
    Tagged {
        text: String,
        #[serde(default)]
        lang: Option<String>,
    },
}

impl From<TextPayload> for LocalizedText {
    fn from(value: TextPayload) -> Self {
        match value {
            TextPayload::Plain(text) => Self { text, lang: None },
            TextPayload::Tagged { text, lang } => Self { text, lang },
        }
    }
}

/// A `property` entry attached to an element, relationship or view part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<LocalizedText>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Element {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relationship {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

/// One node of the `organizations` forest. Items either reference a model
/// identifier (`identifierRef`) or act as labeled folders with nested items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(rename = "identifierRef", skip_serializing_if = "Option::is_none")]
    pub identifier_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrganizationItem>,
}

/// Rectangle geometry of a view node. Each channel is independently optional
/// so a partial override can move a node without resizing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
}

impl Bounds {
    /// True when the rectangle is fully specified and renderable.
    pub fn is_resolved(&self) -> bool {
        self.x.is_some() && self.y.is_some() && self.w.is_some() && self.h.is_some()
    }

    /// Merges `other` onto `self` channel by channel.
    pub fn apply(&mut self, other: &Bounds) {
        if other.x.is_some() {
            self.x = other.x;
        }
        if other.y.is_some() {
            self.y = other.y;
        }
        if other.w.is_some() {
            self.w = other.w;
        }
        if other.h.is_some() {
            self.h = other.h;
        }
    }
}

/// RGBA color as the exchange format encodes it: r/g/b in 0..=255 and the
/// alpha channel as an opacity percentage in 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Color {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<u8>,
}

impl Color {
    pub fn is_empty(&self) -> bool {
        self.r.is_none() && self.g.is_none() && self.b.is_none() && self.a.is_none()
    }

    pub fn apply(&mut self, other: &Color) {
        if other.r.is_some() {
            self.r = other.r;
        }
        if other.g.is_some() {
            self.g = other.g;
        }
        if other.b.is_some() {
            self.b = other.b;
        }
        if other.a.is_some() {
            self.a = other.a;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Font {
    pub fn apply(&mut self, other: &Font) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.size.is_some() {
            self.size = other.size;
        }
        if other.style.is_some() {
            self.style = other.style.clone();
        }
        if let Some(color) = &other.color {
            self.color.get_or_insert_with(Color::default).apply(color);
        }
    }
}

/// Visual style of a node or connection. Merged channel by channel so a
/// partial override never erases unspecified channels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    #[serde(rename = "fillColor", skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
    #[serde(rename = "lineColor", skip_serializing_if = "Option::is_none")]
    pub line_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

impl Style {
    pub fn apply(&mut self, other: &Style) {
        if let Some(fill) = &other.fill_color {
            self.fill_color.get_or_insert_with(Color::default).apply(fill);
        }
        if let Some(line) = &other.line_color {
            self.line_color.get_or_insert_with(Color::default).apply(line);
        }
        if let Some(font) = &other.font {
            self.font.get_or_insert_with(Font::default).apply(font);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

/// Child-element kinds encountered while parsing a view region, in document
/// order. Replayed verbatim when the region is re-serialized so an untouched
/// view keeps its exact child sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChildToken {
    Style,
    Label,
    Name,
    Documentation,
    Node,
    Connection,
    Points,
    Properties,
    ViewRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "relationshipRef", skip_serializing_if = "Option::is_none")]
    pub relationship_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub child_order: Vec<ChildToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(rename = "elementRef", skip_serializing_if = "Option::is_none")]
    pub element_ref: Option<String>,
    #[serde(rename = "relationshipRef", skip_serializing_if = "Option::is_none")]
    pub relationship_ref: Option<String>,
    #[serde(rename = "viewRef", skip_serializing_if = "Option::is_none")]
    pub view_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<ViewNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub child_order: Vec<ChildToken>,
}

impl ViewNode {
    /// Merge key: the identifier when present, otherwise a composite key on
    /// the reference attributes (view nodes are frequently unlabeled).
    pub fn merge_key(&self) -> Option<String> {
        if let Some(id) = &self.id {
            return Some(id.clone());
        }
        if let Some(element) = &self.element_ref {
            return Some(format!("elementRef:{element}"));
        }
        if let Some(relationship) = &self.relationship_ref {
            return Some(format!("relationshipRef:{relationship}"));
        }
        self.view_ref.as_ref().map(|view| format!("viewRef:{view}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDiagram {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<ViewNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub child_order: Vec<ChildToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<LocalizedText>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Views {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub viewpoints: Vec<Viewpoint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagrams: Vec<ViewDiagram>,
}

impl Views {
    pub fn is_empty(&self) -> bool {
        self.viewpoints.is_empty() && self.diagrams.is_empty()
    }
}

/// The parsed template, and by extension (all fields being optional) both
/// the override document and the merge output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blueprint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_documentation: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<Element>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relationship>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<OrganizationItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<Views>,
}

impl Blueprint {
    /// Looks up an element by identifier.
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id.as_deref() == Some(id))
    }

    /// Looks up a relationship by identifier.
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relations.iter().find(|r| r.id.as_deref() == Some(id))
    }

    pub fn diagrams(&self) -> &[ViewDiagram] {
        self.views.as_ref().map(|v| v.diagrams.as_slice()).unwrap_or(&[])
    }
}

/// Caller-supplied override: same shape as [`Blueprint`], every field
/// optional. JSON `null` deserializes to `None` and is treated the same as an
/// absent field (inherit from the blueprint).
pub type OverrideDocument = Blueprint;

/// Result of merging an [`OverrideDocument`] onto a [`Blueprint`].
pub type ConsolidatedModel = Blueprint;

/// Strips a namespace prefix from a type name (`archimate:ApplicationComponent`
/// compares as `ApplicationComponent`).
pub fn local_type_name(kind: &str) -> &str {
    kind.rsplit(':').next().unwrap_or(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn localized_text_accepts_string_and_object() {
        let plain: LocalizedText = serde_json::from_value(json!("Hello")).unwrap();
        assert_eq!(plain, LocalizedText::new("Hello"));

        let tagged: LocalizedText =
            serde_json::from_value(json!({"text": "Olá", "lang": "pt-BR"})).unwrap();
        assert_eq!(tagged, LocalizedText::with_lang("Olá", "pt-BR"));
    }

    #[test]
    fn override_document_fields_default_to_absent() {
        let doc: OverrideDocument = serde_json::from_value(json!({
            "elements": [{"id": "id-a", "name": "A"}]
        }))
        .unwrap();
        assert_eq!(doc.elements.len(), 1);
        assert!(doc.relations.is_empty());
        assert!(doc.views.is_none());
        assert_eq!(doc.elements[0].name, Some(LocalizedText::new("A")));
    }

    #[test]
    fn null_fields_deserialize_as_absent() {
        let doc: OverrideDocument = serde_json::from_value(json!({
            "model_identifier": null,
            "elements": [{"id": "id-a", "documentation": null}]
        }))
        .unwrap();
        assert!(doc.model_identifier.is_none());
        assert!(doc.elements[0].documentation.is_none());
    }

    #[test]
    fn bounds_apply_is_channel_wise() {
        let mut bounds = Bounds {
            x: Some(10.0),
            y: Some(20.0),
            w: Some(100.0),
            h: Some(80.0),
        };
        bounds.apply(&Bounds {
            x: Some(50.0),
            ..Bounds::default()
        });
        assert_eq!(bounds.x, Some(50.0));
        assert_eq!(bounds.w, Some(100.0));
    }

    #[test]
    fn style_apply_preserves_unset_channels() {
        let mut style = Style {
            fill_color: Some(Color {
                r: Some(255),
                g: Some(250),
                b: Some(240),
                a: Some(100),
            }),
            ..Style::default()
        };
        style.apply(&Style {
            fill_color: Some(Color {
                r: Some(0),
                ..Color::default()
            }),
            ..Style::default()
        });
        let fill = style.fill_color.unwrap();
        assert_eq!(fill.r, Some(0));
        assert_eq!(fill.g, Some(250));
        assert_eq!(fill.a, Some(100));
    }

    #[test]
    fn view_node_merge_key_falls_back_to_refs() {
        let node = ViewNode {
            element_ref: Some("id-el".into()),
            ..ViewNode::default()
        };
        assert_eq!(node.merge_key().as_deref(), Some("elementRef:id-el"));

        let anonymous = ViewNode::default();
        assert_eq!(anonymous.merge_key(), None);
    }

    #[test]
    fn local_type_name_strips_prefix() {
        assert_eq!(local_type_name("archimate:ApplicationComponent"), "ApplicationComponent");
        assert_eq!(local_type_name("BusinessActor"), "BusinessActor");
    }
}
