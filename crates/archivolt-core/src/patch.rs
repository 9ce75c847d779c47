//! Copy-patch writer: consolidated model applied onto a copy of the
//! original template tree.
//!
//! The original document (not the blueprint abstraction) is the structural
//! source of truth: regions the model does not touch are re-serialized
//! verbatim, namespace declarations included. Three rules keep the output
//! importable by the exporting tool:
//!
//! - `xsi:type` is always written as the unprefixed local name;
//! - injected `name`/`documentation` children land at the index mandated by
//!   the schema's per-parent child sequence, never appended;
//! - documentation newlines are carried as the literal `&#xD;` entity, with
//!   a final pass undoing the double-escaping the text escaper introduces.

use crate::dom::{QName, XmlDocument, XmlElement, XmlNode};
use crate::error::{Error, Result};
use crate::model::{
    ChildToken, Color, Connection, ConsolidatedModel, Element, Font, LocalizedText,
    OrganizationItem, Point, Property, Relationship, Style, ViewDiagram, ViewNode,
    local_type_name,
};
use rustc_hash::FxHashSet;

/// Schema-mandated child sequences for the parents we inject text into.
const MODEL_ORDER: &[&str] = &[
    "name",
    "documentation",
    "properties",
    "metadata",
    "elements",
    "relationships",
    "organizations",
    "propertyDefinitions",
    "views",
];
const ELEMENT_ORDER: &[&str] = &["name", "documentation", "properties"];
const RELATIONSHIP_ORDER: &[&str] = &["documentation", "properties"];

fn sequence_for(parent_local: &str) -> &'static [&'static str] {
    match parent_local {
        "model" => MODEL_ORDER,
        "element" => ELEMENT_ORDER,
        "relationship" => RELATIONSHIP_ORDER,
        _ => &[],
    }
}

/// Maps `XxxRelationship` spellings onto the RelationshipTypeEnum values the
/// schema expects.
fn normalize_relationship_kind(kind: &str) -> &str {
    match local_type_name(kind) {
        "CompositionRelationship" => "Composition",
        "AggregationRelationship" => "Aggregation",
        "AssignmentRelationship" => "Assignment",
        "RealizationRelationship" => "Realization",
        "ServingRelationship" => "Serving",
        "AccessRelationship" => "Access",
        "InfluenceRelationship" => "Influence",
        "TriggeringRelationship" => "Triggering",
        "FlowRelationship" => "Flow",
        "SpecializationRelationship" => "Specialization",
        "AssociationRelationship" => "Association",
        other => other,
    }
}

/// Encodes newlines as a literal CR entity, keeping the LF after it so the
/// serialized document stays readable.
fn encode_doc_cr(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "&#xD;\n")
}

fn xsi_type_name() -> QName {
    QName::prefixed("xsi", "type")
}

fn xml_lang_name() -> QName {
    QName::prefixed("xml", "lang")
}

fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Patches a copy of `original` to carry the consolidated model and
/// serializes it.
pub fn patch_document(original: &XmlDocument, model: &ConsolidatedModel) -> Result<String> {
    let mut doc = original.clone();
    let root = &mut doc.root;

    for anchor in ["elements", "relationships", "views"] {
        if root.find_child(anchor).is_none() {
            return Err(Error::TemplateStructure { anchor });
        }
    }

    ensure_xsi_declared(root);

    if let Some(identifier) = &model.model_identifier {
        root.set_attr(QName::local("identifier"), identifier.clone());
    }
    if let Some(name) = &model.model_name {
        upsert_in_order(root, "name", &name.text, name.lang.as_deref());
    }
    if let Some(documentation) = &model.model_documentation {
        upsert_in_order(
            root,
            "documentation",
            &encode_doc_cr(&documentation.text),
            documentation.lang.as_deref(),
        );
    }

    replace_section(root, "elements", build_elements_section(&model.elements));
    replace_section(
        root,
        "relationships",
        build_relationships_section(&model.relations),
    );
    if !model.organizations.is_empty() {
        replace_section(
            root,
            "organizations",
            build_organizations_section(&model.organizations),
        );
    }
    if let Some(views) = &model.views {
        if !views.diagrams.is_empty() {
            let views_el = root
                .find_child_mut("views")
                .ok_or(Error::TemplateStructure { anchor: "views" })?;
            replace_section(views_el, "diagrams", build_diagrams_section(&views.diagrams));
        }
    }

    let views_el = root
        .find_child_mut("views")
        .ok_or(Error::TemplateStructure { anchor: "views" })?;
    ensure_views_sequence(views_el);
    ensure_view_name_first(views_el);

    let removed = prune_dangling_org_items(root);
    if removed > 0 {
        tracing::warn!(removed, "pruned organization items with unresolved references");
    }

    let text = doc.to_xml_string();
    Ok(text.replace("&amp;#xD;", "&#xD;"))
}

/// The template is expected to declare `xmlns:xsi` on its root; degraded
/// templates get the declaration added so `xsi:type` stays resolvable.
fn ensure_xsi_declared(root: &mut XmlElement) {
    let declared = root
        .namespaces
        .iter()
        .any(|(prefix, _)| prefix.as_deref() == Some("xsi"));
    if !declared {
        root.namespaces
            .push((Some("xsi".to_string()), crate::XSI_NS.to_string()));
    }
}

/// Index into `children` where a `tag` child belongs per the parent's
/// schema sequence.
fn ordered_insert_index(parent: &XmlElement, tag: &str) -> usize {
    let seq = sequence_for(parent.local_name());
    let tag_rank = seq.iter().position(|t| *t == tag).unwrap_or(seq.len());
    for (index, child) in parent.children.iter().enumerate() {
        if let XmlNode::Element(el) = child {
            if let Some(rank) = seq.iter().position(|t| *t == el.local_name()) {
                if rank > tag_rank {
                    return index;
                }
            }
        }
    }
    parent.children.len()
}

/// Inserts or replaces a localized text child at its mandated position.
/// `xml:lang` is only touched when a language was actually supplied.
fn upsert_in_order(parent: &mut XmlElement, tag: &str, text: &str, lang: Option<&str>) {
    if let Some(existing) = parent.find_child_mut(tag) {
        existing.set_text(text);
        if let Some(lang) = lang {
            existing.set_attr(xml_lang_name(), lang);
        }
        return;
    }

    let index = ordered_insert_index(parent, tag);
    let mut el = XmlElement::new(QName::local(tag));
    if let Some(lang) = lang {
        el.set_attr(xml_lang_name(), lang);
    }
    el.set_text(text);
    parent.insert_element(index, el);
}

/// Replaces the `tag` child with a freshly built section, keeping its
/// position (or the schema position when the template lacked the section).
fn replace_section(parent: &mut XmlElement, tag: &str, section: XmlElement) {
    if let Some(index) = parent.child_index(tag) {
        parent.remove_child(index);
        parent.insert_element(index, section);
    } else {
        let index = ordered_insert_index(parent, tag);
        parent.insert_element(index, section);
    }
}

fn text_child(tag: &str, payload: &LocalizedText, encode: bool) -> XmlElement {
    let mut el = XmlElement::new(QName::local(tag));
    if let Some(lang) = &payload.lang {
        el.set_attr(xml_lang_name(), lang.clone());
    }
    if encode {
        el.set_text(encode_doc_cr(&payload.text));
    } else {
        el.set_text(payload.text.clone());
    }
    el
}

fn build_color(tag: &str, color: &Color) -> XmlElement {
    let mut el = XmlElement::new(QName::local(tag));
    for (attr, value) in [("r", color.r), ("g", color.g), ("b", color.b), ("a", color.a)] {
        if let Some(value) = value {
            el.set_attr(QName::local(attr), value.to_string());
        }
    }
    el
}

fn build_font(font: &Font) -> XmlElement {
    let mut el = XmlElement::new(QName::local("font"));
    if let Some(name) = &font.name {
        el.set_attr(QName::local("name"), name.clone());
    }
    if let Some(size) = font.size {
        el.set_attr(QName::local("size"), fmt_num(size));
    }
    if let Some(style) = &font.style {
        el.set_attr(QName::local("style"), style.clone());
    }
    if let Some(color) = &font.color {
        el.push_element(build_color("color", color));
    }
    el
}

fn build_style(style: &Style) -> XmlElement {
    let mut el = XmlElement::new(QName::local("style"));
    if let Some(fill) = &style.fill_color {
        el.push_element(build_color("fillColor", fill));
    }
    if let Some(line) = &style.line_color {
        el.push_element(build_color("lineColor", line));
    }
    if let Some(font) = &style.font {
        el.push_element(build_font(font));
    }
    el
}

fn build_properties_section(properties: &[Property]) -> XmlElement {
    let mut section = XmlElement::new(QName::local("properties"));
    for property in properties {
        let mut el = XmlElement::new(QName::local("property"));
        if let Some(identifier) = &property.identifier {
            el.set_attr(QName::local("identifier"), identifier.clone());
        }
        if let Some(key) = &property.key {
            el.set_attr(QName::local("key"), key.clone());
        }
        if let Some(value) = &property.value {
            el.set_attr(QName::local("value"), value.clone());
        }
        if let Some(documentation) = &property.documentation {
            el.push_element(text_child("documentation", documentation, true));
        }
        section.push_element(el);
    }
    section
}

fn build_element(element: &Element) -> XmlElement {
    let mut el = XmlElement::new(QName::local("element"));
    if let Some(id) = &element.id {
        el.set_attr(QName::local("identifier"), id.clone());
    }
    if let Some(kind) = &element.kind {
        el.set_attr(xsi_type_name(), local_type_name(kind).to_string());
    }
    if let Some(name) = &element.name {
        el.push_element(text_child("name", name, false));
    }
    if let Some(documentation) = &element.documentation {
        el.push_element(text_child("documentation", documentation, true));
    }
    if !element.properties.is_empty() {
        el.push_element(build_properties_section(&element.properties));
    }
    el
}

fn build_elements_section(elements: &[Element]) -> XmlElement {
    let mut section = XmlElement::new(QName::local("elements"));
    for element in elements {
        section.push_element(build_element(element));
    }
    section
}

fn build_relationship(relation: &Relationship) -> XmlElement {
    let mut el = XmlElement::new(QName::local("relationship"));
    if let Some(id) = &relation.id {
        el.set_attr(QName::local("identifier"), id.clone());
    }
    if let Some(source) = &relation.source {
        el.set_attr(QName::local("source"), source.clone());
    }
    if let Some(target) = &relation.target {
        el.set_attr(QName::local("target"), target.clone());
    }
    if let Some(kind) = &relation.kind {
        el.set_attr(
            xsi_type_name(),
            normalize_relationship_kind(kind).to_string(),
        );
    }
    // No <name> on relationships: some schema variants reject it.
    if let Some(documentation) = &relation.documentation {
        el.push_element(text_child("documentation", documentation, true));
    }
    if !relation.properties.is_empty() {
        el.push_element(build_properties_section(&relation.properties));
    }
    el
}

fn build_relationships_section(relations: &[Relationship]) -> XmlElement {
    let mut section = XmlElement::new(QName::local("relationships"));
    for relation in relations {
        section.push_element(build_relationship(relation));
    }
    section
}

fn build_organization_item(item: &OrganizationItem) -> XmlElement {
    let mut el = XmlElement::new(QName::local("item"));
    if let Some(identifier) = &item.identifier {
        el.set_attr(QName::local("identifier"), identifier.clone());
    }
    if let Some(reference) = &item.identifier_ref {
        el.set_attr(QName::local("identifierRef"), reference.clone());
    }
    if let Some(label) = &item.label {
        el.push_element(text_child("label", label, false));
    }
    if let Some(documentation) = &item.documentation {
        el.push_element(text_child("documentation", documentation, true));
    }
    for child in &item.items {
        el.push_element(build_organization_item(child));
    }
    el
}

fn build_organizations_section(items: &[OrganizationItem]) -> XmlElement {
    let mut section = XmlElement::new(QName::local("organizations"));
    for item in items {
        section.push_element(build_organization_item(item));
    }
    section
}

fn default_connection_kind(connection: &Connection) -> &'static str {
    if connection.relationship_ref.is_some() {
        "Relationship"
    } else {
        "Line"
    }
}

fn build_connection(connection: &Connection) -> XmlElement {
    let mut el = XmlElement::new(QName::local("connection"));
    if let Some(id) = &connection.id {
        el.set_attr(QName::local("identifier"), id.clone());
    }
    if let Some(reference) = &connection.relationship_ref {
        el.set_attr(QName::local("relationshipRef"), reference.clone());
    }
    if let Some(source) = &connection.source {
        el.set_attr(QName::local("source"), source.clone());
    }
    if let Some(target) = &connection.target {
        el.set_attr(QName::local("target"), target.clone());
    }
    let kind = connection
        .kind
        .as_deref()
        .map(local_type_name)
        .unwrap_or_else(|| default_connection_kind(connection));
    el.set_attr(xsi_type_name(), kind.to_string());

    let mut style_done = false;
    let mut label_done = false;
    let mut points_done = false;
    for token in &connection.child_order {
        match token {
            ChildToken::Style => {
                if let Some(style) = &connection.style {
                    el.push_element(build_style(style));
                }
                style_done = true;
            }
            ChildToken::Label => {
                if let Some(label) = &connection.label {
                    el.push_element(text_child("label", label, false));
                }
                label_done = true;
            }
            ChildToken::Points => {
                if !connection.points.is_empty() {
                    el.push_element(build_points(&connection.points));
                }
                points_done = true;
            }
            ChildToken::Properties => {
                if !connection.properties.is_empty() {
                    el.push_element(build_properties_section(&connection.properties));
                }
            }
            _ => {}
        }
    }
    // Content introduced by an override has no recorded position; append it.
    if !style_done {
        if let Some(style) = &connection.style {
            el.push_element(build_style(style));
        }
    }
    if !label_done {
        if let Some(label) = &connection.label {
            el.push_element(text_child("label", label, false));
        }
    }
    if !points_done && !connection.points.is_empty() {
        el.push_element(build_points(&connection.points));
    }
    el
}

fn build_points(points: &[Point]) -> XmlElement {
    let mut el = XmlElement::new(QName::local("points"));
    for point in points {
        let mut point_el = XmlElement::new(QName::local("point"));
        if let Some(x) = point.x {
            point_el.set_attr(QName::local("x"), fmt_num(x));
        }
        if let Some(y) = point.y {
            point_el.set_attr(QName::local("y"), fmt_num(y));
        }
        el.push_element(point_el);
    }
    el
}

fn default_node_kind(node: &ViewNode) -> &'static str {
    if node.element_ref.is_some() {
        "Element"
    } else if !node.nodes.is_empty() {
        "Container"
    } else if node.label.is_some() {
        "Label"
    } else {
        "Container"
    }
}

const DEFAULT_NODE_ORDER: &[ChildToken] = &[
    ChildToken::Style,
    ChildToken::Label,
    ChildToken::Node,
    ChildToken::Connection,
    ChildToken::ViewRef,
];

fn build_view_node(node: &ViewNode) -> XmlElement {
    let mut el = XmlElement::new(QName::local("node"));
    if let Some(id) = &node.id {
        el.set_attr(QName::local("identifier"), id.clone());
    }
    if let Some(bounds) = &node.bounds {
        for (attr, value) in [
            ("x", bounds.x),
            ("y", bounds.y),
            ("w", bounds.w),
            ("h", bounds.h),
        ] {
            if let Some(value) = value {
                el.set_attr(QName::local(attr), fmt_num(value));
            }
        }
    }
    let kind = node
        .kind
        .as_deref()
        .map(local_type_name)
        .unwrap_or_else(|| default_node_kind(node));
    el.set_attr(xsi_type_name(), kind.to_string());
    if let Some(reference) = &node.element_ref {
        el.set_attr(QName::local("elementRef"), reference.clone());
    }
    if let Some(reference) = &node.relationship_ref {
        el.set_attr(QName::local("relationshipRef"), reference.clone());
    }

    let order: &[ChildToken] = if node.child_order.is_empty() {
        DEFAULT_NODE_ORDER
    } else {
        &node.child_order
    };

    let mut node_idx = 0;
    let mut conn_idx = 0;
    let mut style_done = false;
    let mut label_done = false;
    for token in order {
        match token {
            ChildToken::Style => {
                if let Some(style) = &node.style {
                    el.push_element(build_style(style));
                }
                style_done = true;
            }
            ChildToken::Label => {
                if let Some(label) = &node.label {
                    el.push_element(text_child("label", label, false));
                }
                label_done = true;
            }
            ChildToken::Node => {
                if node_idx < node.nodes.len() {
                    el.push_element(build_view_node(&node.nodes[node_idx]));
                    node_idx += 1;
                }
            }
            ChildToken::Connection => {
                if conn_idx < node.connections.len() {
                    el.push_element(build_connection(&node.connections[conn_idx]));
                    conn_idx += 1;
                }
            }
            ChildToken::ViewRef => {
                if let Some(reference) = &node.view_ref {
                    let mut view_ref = XmlElement::new(QName::local("viewRef"));
                    view_ref.set_attr(QName::local("ref"), reference.clone());
                    el.push_element(view_ref);
                }
            }
            ChildToken::Properties => {
                if !node.properties.is_empty() {
                    el.push_element(build_properties_section(&node.properties));
                }
            }
            _ => {}
        }
    }
    if !style_done {
        if let Some(style) = &node.style {
            el.push_element(build_style(style));
        }
    }
    if !label_done {
        if let Some(label) = &node.label {
            el.push_element(text_child("label", label, false));
        }
    }
    while node_idx < node.nodes.len() {
        el.push_element(build_view_node(&node.nodes[node_idx]));
        node_idx += 1;
    }
    while conn_idx < node.connections.len() {
        el.push_element(build_connection(&node.connections[conn_idx]));
        conn_idx += 1;
    }
    el
}

fn build_view(diagram: &ViewDiagram) -> XmlElement {
    let mut el = XmlElement::new(QName::local("view"));
    if let Some(id) = &diagram.id {
        el.set_attr(QName::local("identifier"), id.clone());
    }
    let kind = diagram.kind.as_deref().map(local_type_name).unwrap_or("Diagram");
    el.set_attr(xsi_type_name(), kind.to_string());

    // The schema wants <name> first; synthesize one when the view has none.
    let name = diagram
        .name
        .clone()
        .unwrap_or_else(|| LocalizedText::new("View"));
    el.push_element(text_child("name", &name, false));
    if let Some(documentation) = &diagram.documentation {
        el.push_element(text_child("documentation", documentation, true));
    }

    let mut node_idx = 0;
    let mut conn_idx = 0;
    for token in &diagram.child_order {
        match token {
            ChildToken::Node => {
                if node_idx < diagram.nodes.len() {
                    el.push_element(build_view_node(&diagram.nodes[node_idx]));
                    node_idx += 1;
                }
            }
            ChildToken::Connection => {
                if conn_idx < diagram.connections.len() {
                    el.push_element(build_connection(&diagram.connections[conn_idx]));
                    conn_idx += 1;
                }
            }
            ChildToken::Properties => {
                if !diagram.properties.is_empty() {
                    el.push_element(build_properties_section(&diagram.properties));
                }
            }
            _ => {}
        }
    }
    while node_idx < diagram.nodes.len() {
        el.push_element(build_view_node(&diagram.nodes[node_idx]));
        node_idx += 1;
    }
    while conn_idx < diagram.connections.len() {
        el.push_element(build_connection(&diagram.connections[conn_idx]));
        conn_idx += 1;
    }
    el
}

fn build_diagrams_section(diagrams: &[ViewDiagram]) -> XmlElement {
    let mut section = XmlElement::new(QName::local("diagrams"));
    for diagram in diagrams {
        section.push_element(build_view(diagram));
    }
    section
}

/// `views` must list `viewpoints` before `diagrams`, and the schema requires
/// at least one viewpoint.
fn ensure_views_sequence(views: &mut XmlElement) {
    let diagrams_index = views.child_index("diagrams");
    match views.child_index("viewpoints") {
        None => {
            let viewpoints = XmlElement::new(QName::local("viewpoints"));
            let index = diagrams_index.unwrap_or(0);
            views.insert_element(index, viewpoints);
        }
        Some(vp_index) => {
            if let Some(d_index) = diagrams_index {
                if vp_index > d_index {
                    let node = views.remove_child(vp_index);
                    if let XmlNode::Element(el) = node {
                        views.insert_element(d_index, el);
                    }
                }
            }
        }
    }

    if let Some(viewpoints) = views.find_child_mut("viewpoints") {
        if viewpoints.find_child("viewpoint").is_none() {
            let mut viewpoint = XmlElement::new(QName::local("viewpoint"));
            viewpoint.set_attr(QName::local("identifier"), "id-viewpoint-default");
            let mut name = XmlElement::new(QName::local("name"));
            name.set_text("Default Viewpoint");
            viewpoint.push_element(name);
            viewpoints.push_element(viewpoint);
        }
    }
}

/// Every view's first child must be its `name` element.
fn ensure_view_name_first(views: &mut XmlElement) {
    let Some(diagrams) = views.find_child_mut("diagrams") else {
        return;
    };
    for view in diagrams
        .child_elements_mut()
        .filter(|el| matches!(el.local_name(), "view" | "diagram"))
    {
        match view.child_index("name") {
            None => {
                let mut name = XmlElement::new(QName::local("name"));
                name.set_text("View");
                view.insert_element(0, name);
            }
            Some(0) => {}
            Some(index) => {
                let node = view.remove_child(index);
                if let XmlNode::Element(el) = node {
                    view.insert_element(0, el);
                }
            }
        }
    }
}

fn collect_identifiers(element: &XmlElement, out: &mut FxHashSet<String>) {
    if let Some(identifier) = element.attr_local("identifier") {
        out.insert(identifier.to_string());
    }
    for child in element.child_elements() {
        collect_identifiers(child, out);
    }
}

/// Removes organization `item`s whose `identifierRef` resolves to nothing,
/// then repeatedly removes reference-less items left without children until
/// a fixed point.
pub(crate) fn prune_dangling_org_items(root: &mut XmlElement) -> usize {
    let mut ids = FxHashSet::default();
    collect_identifiers(root, &mut ids);

    let Some(organizations) = root.find_child_mut("organizations") else {
        return 0;
    };

    let mut removed = prune_unresolved(organizations, &ids);
    loop {
        let pass = prune_empty(organizations);
        if pass == 0 {
            break;
        }
        removed += pass;
    }
    removed
}

fn prune_unresolved(parent: &mut XmlElement, ids: &FxHashSet<String>) -> usize {
    let mut removed = 0;
    for child in parent.child_elements_mut() {
        removed += prune_unresolved(child, ids);
    }
    let mut index = 0;
    while index < parent.children.len() {
        let drop = match &parent.children[index] {
            XmlNode::Element(el) if el.local_name() == "item" => el
                .attr_local("identifierRef")
                .map(|reference| !ids.contains(reference))
                .unwrap_or(false),
            _ => false,
        };
        if drop {
            parent.remove_child(index);
            removed += 1;
        } else {
            index += 1;
        }
    }
    removed
}

fn prune_empty(parent: &mut XmlElement) -> usize {
    let mut removed = 0;
    for child in parent.child_elements_mut() {
        removed += prune_empty(child);
    }
    let mut index = 0;
    while index < parent.children.len() {
        let drop = match &parent.children[index] {
            XmlNode::Element(el) if el.local_name() == "item" => {
                el.attr_local("identifierRef").is_none()
                    && !el.child_elements().any(|c| c.local_name() == "item")
            }
            _ => false,
        };
        if drop {
            parent.remove_child(index);
            removed += 1;
        } else {
            index += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::model::{Blueprint, OverrideDocument};
    use crate::parse::{parse_blueprint, parse_document};
    use serde_json::json;
    use std::path::PathBuf;

    fn template_on_disk() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = crate::parse::tests::write_template(&dir);
        (dir, path)
    }

    fn consolidate(path: &std::path::Path, overrides: OverrideDocument) -> Blueprint {
        let blueprint = parse_blueprint(path).unwrap();
        merge(&blueprint, &overrides).model
    }

    #[test]
    fn empty_override_round_trips_logically() {
        let (_dir, path) = template_on_disk();
        let original = parse_document(&path).unwrap();
        let model = consolidate(&path, OverrideDocument::default());

        let output = patch_document(&original, &model).unwrap();

        let out_path = path.with_file_name("patched.xml");
        std::fs::write(&out_path, &output).unwrap();
        let reparsed = parse_blueprint(&out_path).unwrap();
        let source = parse_blueprint(&path).unwrap();

        assert_eq!(reparsed.model_identifier, source.model_identifier);
        assert_eq!(reparsed.elements, source.elements);
        assert_eq!(reparsed.relations, source.relations);
        assert_eq!(reparsed.organizations, source.organizations);
        assert_eq!(
            reparsed.diagrams()[0].nodes,
            source.diagrams()[0].nodes
        );
        assert_eq!(
            reparsed.diagrams()[0].connections,
            source.diagrams()[0].connections
        );
        assert!(output.contains("xmlns=\"http://www.opengroup.org/xsd/archimate/3.0/\""));
        assert!(output.contains("xsi:type=\"ApplicationComponent\""));
        assert!(!output.contains("xsi:type=\"archimate:"));
    }

    #[test]
    fn model_children_follow_schema_order() {
        let (_dir, path) = template_on_disk();
        let original = parse_document(&path).unwrap();
        // Override key order deliberately lists views before elements.
        let overrides: OverrideDocument = serde_json::from_value(json!({
            "views": {"diagrams": [{"id": "id-view-1", "name": "Reordered"}]},
            "model_documentation": {"text": "Updated docs"},
            "elements": [{"id": "id-a", "name": "A2"}]
        }))
        .unwrap();
        let model = consolidate(&path, overrides);
        let output = patch_document(&original, &model).unwrap();

        let positions: Vec<usize> = ["<name", "<documentation", "<elements", "<relationships", "<organizations", "<views"]
            .iter()
            .map(|needle| output.find(needle).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn documentation_newlines_become_cr_entities() {
        let (_dir, path) = template_on_disk();
        let original = parse_document(&path).unwrap();
        let overrides: OverrideDocument = serde_json::from_value(json!({
            "elements": [{"id": "id-a", "documentation": {"text": "Line1\nLine2"}}]
        }))
        .unwrap();
        let model = consolidate(&path, overrides);
        let output = patch_document(&original, &model).unwrap();

        assert!(output.contains("Line1&#xD;\nLine2"));
        assert!(!output.contains("&amp;#xD;"));
    }

    #[test]
    fn unresolved_organization_refs_are_pruned_to_fixed_point() {
        let (_dir, path) = template_on_disk();
        let original = parse_document(&path).unwrap();
        let overrides: OverrideDocument = serde_json::from_value(json!({
            "organizations": [
                {"label": "Ghost town", "items": [{"identifierRef": "id-ghost"}]}
            ]
        }))
        .unwrap();
        let model = consolidate(&path, overrides);
        let output = patch_document(&original, &model).unwrap();

        assert!(!output.contains("id-ghost"));
        // The emptied folder goes with its only child.
        assert!(!output.contains("Ghost town"));
        // Valid references survive.
        assert!(output.contains("identifierRef=\"id-a\""));
    }

    #[test]
    fn pruning_is_idempotent() {
        let (_dir, path) = template_on_disk();
        let mut doc = parse_document(&path).unwrap();
        // Inject a dangling item directly into the tree.
        let orgs = doc.root.find_child_mut("organizations").unwrap();
        let mut ghost = XmlElement::new(QName::local("item"));
        ghost.set_attr(QName::local("identifierRef"), "id-ghost");
        orgs.push_element(ghost);

        let first = prune_dangling_org_items(&mut doc.root);
        let after_first = doc.to_xml_string();
        let second = prune_dangling_org_items(&mut doc.root);
        let after_second = doc.to_xml_string();

        assert!(first > 0);
        assert_eq!(second, 0);
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn synthesizes_default_viewpoint_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-viewpoints.xml");
        std::fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.opengroup.org/xsd/archimate/3.0/"
       xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
       identifier="id-m">
  <name>Bare</name>
  <elements>
    <element identifier="id-a" xsi:type="ApplicationComponent"/>
  </elements>
  <relationships/>
  <views>
    <diagrams>
      <view identifier="id-v1" xsi:type="Diagram">
        <node identifier="id-n1" elementRef="id-a" xsi:type="Element" x="0" y="0" w="10" h="10"/>
      </view>
    </diagrams>
  </views>
</model>"#,
        )
        .unwrap();

        let original = parse_document(&path).unwrap();
        let model = consolidate(&path, OverrideDocument::default());
        let output = patch_document(&original, &model).unwrap();

        let viewpoints_at = output.find("<viewpoints>").unwrap();
        let diagrams_at = output.find("<diagrams>").unwrap();
        assert!(viewpoints_at < diagrams_at);
        assert!(output.contains("id-viewpoint-default"));
        assert!(output.contains("Default Viewpoint"));
        // The patched view leads with its name element.
        let view_at = output.find("<view ").unwrap();
        let name_at = output[view_at..].find("<name>").unwrap();
        let node_at = output[view_at..].find("<node ").unwrap();
        assert!(name_at < node_at);
    }

    #[test]
    fn missing_views_anchor_is_a_structure_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-views.xml");
        std::fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.opengroup.org/xsd/archimate/3.0/"
       xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
       identifier="id-m">
  <elements/>
  <relationships/>
</model>"#,
        )
        .unwrap();

        let original = parse_document(&path).unwrap();
        let err = patch_document(&original, &Blueprint::default()).unwrap_err();
        assert!(matches!(err, Error::TemplateStructure { anchor: "views" }));
    }

    #[test]
    fn relationship_kinds_are_normalized() {
        let (_dir, path) = template_on_disk();
        let original = parse_document(&path).unwrap();
        let overrides: OverrideDocument = serde_json::from_value(json!({
            "relations": [
                {"id": "id-r2", "type": "ServingRelationship", "source": "id-b", "target": "id-a"}
            ]
        }))
        .unwrap();
        let model = consolidate(&path, overrides);
        let output = patch_document(&original, &model).unwrap();
        assert!(output.contains("identifier=\"id-r2\""));
        assert!(output.contains("xsi:type=\"Serving\""));
        assert!(!output.contains("ServingRelationship"));
    }
}
