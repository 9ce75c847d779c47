//! Template parsing: exchange XML into a normalized [`Blueprint`].
//!
//! The walk is a pure read in document order. View geometry is parsed
//! recursively and the child-element sequence of every view region is
//! recorded (`child_order`) because the copy-patch writer replays that exact
//! sequence when it rebuilds an unmodified region.

use crate::dom::XmlDocument;
use crate::error::{Error, Result};
use crate::model::{
    Blueprint, Bounds, ChildToken, Color, Connection, Element, Font, LocalizedText,
    OrganizationItem, Point, Property, Relationship, Style, ViewDiagram, ViewNode, Viewpoint,
    Views, local_type_name,
};
use crate::text::clean_text_opt;
use crate::{XML_NS, XSI_NS};
use serde::Serialize;
use std::fs;
use std::path::Path;

type XmlNode<'a, 'b> = roxmltree::Node<'a, 'b>;

/// Parses a template file into a [`Blueprint`].
pub fn parse_blueprint(path: &Path) -> Result<Blueprint> {
    let raw = read_template(path)?;
    let doc = parse_xml(path, &raw)?;
    Ok(blueprint_from_root(doc.root_element()))
}

/// Parses a template file into the owned mutable tree used for patching.
pub fn parse_document(path: &Path) -> Result<XmlDocument> {
    let raw = read_template(path)?;
    XmlDocument::parse(&raw).map_err(|err| Error::MalformedTemplate {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| Error::MalformedTemplate {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

fn parse_xml<'a>(path: &Path, raw: &'a str) -> Result<roxmltree::Document<'a>> {
    roxmltree::Document::parse(raw).map_err(|err| Error::MalformedTemplate {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

/// Lightweight per-view rows for template discovery surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSummary {
    pub identifier: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub views: Vec<ViewSummary>,
}

/// Reads just the identification header and view listing of a template.
pub fn template_summary(path: &Path) -> Result<TemplateSummary> {
    let raw = read_template(path)?;
    let doc = parse_xml(path, &raw)?;
    let root = doc.root_element();

    let mut views = Vec::new();
    if let Some(diagrams) = find_child(root, "views").and_then(|v| find_child(v, "diagrams")) {
        for (index, view) in child_elements(diagrams, "view").enumerate() {
            let identifier = view
                .attribute("identifier")
                .map(str::to_string)
                .unwrap_or_else(|| format!("view-{}", index + 1));
            let name = text_payload(find_child(view, "name"))
                .map(|n| n.text)
                .unwrap_or_else(|| identifier.clone());
            views.push(ViewSummary {
                identifier,
                name,
                documentation: text_payload(find_child(view, "documentation")).map(|d| d.text),
                index,
            });
        }
    }

    Ok(TemplateSummary {
        path: path.display().to_string(),
        model_identifier: root.attribute("identifier").map(str::to_string),
        model_name: text_payload(find_child(root, "name")).map(|n| n.text),
        documentation: text_payload(find_child(root, "documentation")).map(|d| d.text),
        views,
    })
}

fn blueprint_from_root(root: XmlNode<'_, '_>) -> Blueprint {
    let mut blueprint = Blueprint {
        model_identifier: root.attribute("identifier").map(str::to_string),
        model_name: text_payload(find_child(root, "name")),
        model_documentation: text_payload(find_child(root, "documentation")),
        ..Blueprint::default()
    };

    if let Some(elements) = find_child(root, "elements") {
        blueprint.elements = child_elements(elements, "element").map(parse_element).collect();
    }
    if let Some(relationships) = find_child(root, "relationships") {
        blueprint.relations = child_elements(relationships, "relationship")
            .map(parse_relationship)
            .collect();
    }
    if let Some(organizations) = find_child(root, "organizations") {
        blueprint.organizations = child_elements(organizations, "item")
            .map(parse_organization_item)
            .collect();
    }
    if let Some(views_root) = find_child(root, "views") {
        let mut views = Views::default();
        if let Some(viewpoints) = find_child(views_root, "viewpoints") {
            views.viewpoints = child_elements(viewpoints, "viewpoint")
                .map(|vp| Viewpoint {
                    id: vp.attribute("identifier").map(str::to_string),
                    name: text_payload(find_child(vp, "name")),
                    documentation: text_payload(find_child(vp, "documentation")),
                })
                .collect();
        }
        if let Some(diagrams) = find_child(views_root, "diagrams") {
            views.diagrams = child_elements(diagrams, "view").map(parse_view_diagram).collect();
        }
        if !views.is_empty() {
            blueprint.views = Some(views);
        }
    }

    blueprint
}

fn local_name<'a>(node: XmlNode<'a, '_>) -> &'a str {
    node.tag_name().name()
}

fn find_child<'a, 'b>(node: XmlNode<'a, 'b>, local: &str) -> Option<XmlNode<'a, 'b>> {
    node.children()
        .find(|child| child.is_element() && local_name(*child) == local)
}

fn child_elements<'a, 'b, 'c>(
    node: XmlNode<'a, 'b>,
    local: &'c str,
) -> impl Iterator<Item = XmlNode<'a, 'b>> + use<'a, 'b, 'c> {
    node.children()
        .filter(move |child| child.is_element() && local_name(*child) == local)
}

fn text_payload(node: Option<XmlNode<'_, '_>>) -> Option<LocalizedText> {
    let node = node?;
    let text = clean_text_opt(node.text().unwrap_or(""))?;
    Some(LocalizedText {
        text,
        lang: node.attribute((XML_NS, "lang")).map(str::to_string),
    })
}

fn xsi_type(node: XmlNode<'_, '_>) -> Option<String> {
    node.attribute((XSI_NS, "type"))
        .map(|value| local_type_name(value).to_string())
}

fn coerce_f64(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.trim().parse::<f64>().ok())
}

fn coerce_u8(value: Option<&str>) -> Option<u8> {
    coerce_f64(value).map(|v| v.round().clamp(0.0, 255.0) as u8)
}

fn parse_color(node: Option<XmlNode<'_, '_>>) -> Option<Color> {
    let node = node?;
    let color = Color {
        r: coerce_u8(node.attribute("r")),
        g: coerce_u8(node.attribute("g")),
        b: coerce_u8(node.attribute("b")),
        a: coerce_u8(node.attribute("a")),
    };
    if color.is_empty() { None } else { Some(color) }
}

fn parse_font(node: Option<XmlNode<'_, '_>>) -> Option<Font> {
    let node = node?;
    let font = Font {
        name: node.attribute("name").map(str::to_string),
        size: coerce_f64(node.attribute("size")),
        style: node.attribute("style").map(str::to_string),
        color: parse_color(find_child(node, "color")),
    };
    if font.name.is_none() && font.size.is_none() && font.style.is_none() && font.color.is_none() {
        None
    } else {
        Some(font)
    }
}

fn parse_style(node: Option<XmlNode<'_, '_>>) -> Option<Style> {
    let node = node?;
    let style = Style {
        fill_color: parse_color(find_child(node, "fillColor")),
        line_color: parse_color(find_child(node, "lineColor")),
        font: parse_font(find_child(node, "font")),
    };
    if style.fill_color.is_none() && style.line_color.is_none() && style.font.is_none() {
        None
    } else {
        Some(style)
    }
}

fn parse_properties(node: Option<XmlNode<'_, '_>>) -> Vec<Property> {
    let Some(node) = node else {
        return Vec::new();
    };
    child_elements(node, "property")
        .map(|prop| Property {
            identifier: prop.attribute("identifier").map(str::to_string),
            key: prop.attribute("key").map(str::to_string),
            value: prop.attribute("value").map(str::to_string),
            documentation: text_payload(find_child(prop, "documentation")),
        })
        .collect()
}

fn parse_element(node: XmlNode<'_, '_>) -> Element {
    Element {
        id: node.attribute("identifier").map(str::to_string),
        kind: xsi_type(node),
        name: text_payload(find_child(node, "name")),
        documentation: text_payload(find_child(node, "documentation")),
        properties: parse_properties(find_child(node, "properties")),
    }
}

fn parse_relationship(node: XmlNode<'_, '_>) -> Relationship {
    Relationship {
        id: node.attribute("identifier").map(str::to_string),
        kind: xsi_type(node),
        source: node.attribute("source").map(str::to_string),
        target: node.attribute("target").map(str::to_string),
        documentation: text_payload(find_child(node, "documentation")),
        properties: parse_properties(find_child(node, "properties")),
    }
}

fn parse_organization_item(node: XmlNode<'_, '_>) -> OrganizationItem {
    OrganizationItem {
        identifier: node.attribute("identifier").map(str::to_string),
        identifier_ref: node.attribute("identifierRef").map(str::to_string),
        label: text_payload(find_child(node, "label")),
        documentation: text_payload(find_child(node, "documentation")),
        items: child_elements(node, "item").map(parse_organization_item).collect(),
    }
}

fn parse_connection(node: XmlNode<'_, '_>) -> Connection {
    let mut connection = Connection {
        id: node.attribute("identifier").map(str::to_string),
        kind: xsi_type(node),
        relationship_ref: node.attribute("relationshipRef").map(str::to_string),
        source: node.attribute("source").map(str::to_string),
        target: node.attribute("target").map(str::to_string),
        ..Connection::default()
    };

    for child in node.children().filter(|c| c.is_element()) {
        match local_name(child) {
            "style" => {
                connection.child_order.push(ChildToken::Style);
                connection.style = parse_style(Some(child));
            }
            "label" => {
                connection.child_order.push(ChildToken::Label);
                connection.label = text_payload(Some(child));
            }
            "documentation" => {
                connection.documentation = text_payload(Some(child));
            }
            "points" => {
                connection.child_order.push(ChildToken::Points);
                connection.points = child_elements(child, "point")
                    .map(|pt| Point {
                        x: coerce_f64(pt.attribute("x")),
                        y: coerce_f64(pt.attribute("y")),
                    })
                    .filter(|pt| pt.x.is_some() || pt.y.is_some())
                    .collect();
            }
            "properties" => {
                connection.child_order.push(ChildToken::Properties);
                connection.properties = parse_properties(Some(child));
            }
            _ => {}
        }
    }

    connection
}

fn parse_view_node(node: XmlNode<'_, '_>) -> ViewNode {
    let bounds = Bounds {
        x: coerce_f64(node.attribute("x")),
        y: coerce_f64(node.attribute("y")),
        w: coerce_f64(node.attribute("w")),
        h: coerce_f64(node.attribute("h")),
    };

    let mut view_node = ViewNode {
        id: node.attribute("identifier").map(str::to_string),
        kind: xsi_type(node),
        bounds: (bounds.x.is_some()
            || bounds.y.is_some()
            || bounds.w.is_some()
            || bounds.h.is_some())
        .then_some(bounds),
        element_ref: node.attribute("elementRef").map(str::to_string),
        relationship_ref: node.attribute("relationshipRef").map(str::to_string),
        ..ViewNode::default()
    };

    for child in node.children().filter(|c| c.is_element()) {
        match local_name(child) {
            "style" => {
                view_node.child_order.push(ChildToken::Style);
                view_node.style = parse_style(Some(child));
            }
            "label" => {
                view_node.child_order.push(ChildToken::Label);
                view_node.label = text_payload(Some(child));
            }
            "documentation" => {
                view_node.documentation = text_payload(Some(child));
            }
            "node" => {
                view_node.child_order.push(ChildToken::Node);
                view_node.nodes.push(parse_view_node(child));
            }
            "connection" => {
                view_node.child_order.push(ChildToken::Connection);
                view_node.connections.push(parse_connection(child));
            }
            "viewRef" => {
                view_node.child_order.push(ChildToken::ViewRef);
                if let Some(reference) = child.attribute("ref") {
                    view_node.view_ref = Some(reference.to_string());
                }
            }
            "properties" => {
                view_node.child_order.push(ChildToken::Properties);
                view_node.properties = parse_properties(Some(child));
            }
            _ => {}
        }
    }

    view_node
}

fn parse_view_diagram(node: XmlNode<'_, '_>) -> ViewDiagram {
    let mut diagram = ViewDiagram {
        id: node.attribute("identifier").map(str::to_string),
        kind: xsi_type(node),
        ..ViewDiagram::default()
    };

    for child in node.children().filter(|c| c.is_element()) {
        match local_name(child) {
            "name" => {
                diagram.name = text_payload(Some(child));
            }
            "documentation" => {
                diagram.documentation = text_payload(Some(child));
            }
            "style" => {
                diagram.child_order.push(ChildToken::Style);
            }
            "label" => {
                diagram.child_order.push(ChildToken::Label);
            }
            "node" => {
                diagram.child_order.push(ChildToken::Node);
                diagram.nodes.push(parse_view_node(child));
            }
            "connection" => {
                diagram.child_order.push(ChildToken::Connection);
                diagram.connections.push(parse_connection(child));
            }
            "properties" => {
                diagram.child_order.push(ChildToken::Properties);
                diagram.properties = parse_properties(Some(child));
            }
            _ => {}
        }
    }

    diagram
}
