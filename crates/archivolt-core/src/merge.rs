//! Merge engine: override document onto blueprint, by identifier.
//!
//! Collections merge as a structural union keyed by identifier: blueprint
//! entries keep their template order and receive field-level overwrites,
//! override entries with unknown identifiers are appended afterwards.
//! Geometry (`bounds`) and `style` merge channel by channel so a partial
//! override never erases unspecified values. Dangling references are
//! flagged in the outcome, never rejected here; the copy-patch stage decides
//! what to prune.

use crate::model::{
    Blueprint, Connection, ConsolidatedModel, Element, OrganizationItem, OverrideDocument,
    Relationship, ViewDiagram, ViewNode, Views,
};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DanglingKind {
    /// A relationship `source`/`target` that resolves to no element or relationship.
    RelationshipEndpoint,
    /// A view node `elementRef` that resolves to no element.
    ElementRef,
    /// A view node or connection `relationshipRef` that resolves to no relationship.
    RelationshipRef,
    /// A connection `source`/`target` that resolves to no node in its view.
    ConnectionEndpoint,
    /// An organization `identifierRef` that resolves to no known identifier.
    OrganizationRef,
}

#[derive(Debug, Clone)]
pub struct DanglingReference {
    pub kind: DanglingKind,
    /// The identifier that failed to resolve.
    pub reference: String,
    /// Where it was encountered (owning item identifier or collection path).
    pub context: String,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub model: ConsolidatedModel,
    pub dangling: Vec<DanglingReference>,
}

/// Merges `overrides` onto `blueprint`.
pub fn merge(blueprint: &Blueprint, overrides: &OverrideDocument) -> MergeOutcome {
    let mut model = Blueprint {
        model_identifier: overrides
            .model_identifier
            .clone()
            .or_else(|| blueprint.model_identifier.clone()),
        model_name: overrides
            .model_name
            .clone()
            .or_else(|| blueprint.model_name.clone()),
        model_documentation: overrides
            .model_documentation
            .clone()
            .or_else(|| blueprint.model_documentation.clone()),
        ..Blueprint::default()
    };

    model.elements = merge_elements(&blueprint.elements, &overrides.elements);
    model.relations = merge_relations(&blueprint.relations, &overrides.relations);
    model.organizations = merge_organizations(&blueprint.organizations, &overrides.organizations);
    model.views = merge_views(blueprint.views.as_ref(), overrides.views.as_ref());

    let dangling = collect_dangling(&model);
    MergeOutcome { model, dangling }
}

fn generated_id() -> String {
    format!("id-{}", uuid::Uuid::new_v4())
}

fn merge_elements(template: &[Element], overrides: &[Element]) -> Vec<Element> {
    let mut keyed: IndexMap<String, Element> = IndexMap::new();
    let mut extras: Vec<Element> = Vec::new();
    for item in overrides {
        match &item.id {
            Some(id) => {
                keyed.insert(id.clone(), item.clone());
            }
            None => extras.push(item.clone()),
        }
    }

    let mut merged = Vec::with_capacity(template.len() + keyed.len() + extras.len());
    for element in template {
        let mut element = element.clone();
        if let Some(over) = element.id.as_ref().and_then(|id| keyed.shift_remove(id)) {
            if over.name.is_some() {
                element.name = over.name;
            }
            if over.documentation.is_some() {
                element.documentation = over.documentation;
            }
            if over.kind.is_some() {
                element.kind = over.kind;
            }
            if !over.properties.is_empty() {
                element.properties = over.properties;
            }
        }
        merged.push(element);
    }
    merged.extend(keyed.into_values());
    for mut extra in extras {
        extra.id = Some(generated_id());
        merged.push(extra);
    }
    merged
}

fn merge_relations(template: &[Relationship], overrides: &[Relationship]) -> Vec<Relationship> {
    let mut keyed: IndexMap<String, Relationship> = IndexMap::new();
    let mut extras: Vec<Relationship> = Vec::new();
    for item in overrides {
        match &item.id {
            Some(id) => {
                keyed.insert(id.clone(), item.clone());
            }
            None => extras.push(item.clone()),
        }
    }

    let mut merged = Vec::with_capacity(template.len() + keyed.len() + extras.len());
    for relation in template {
        let mut relation = relation.clone();
        if let Some(over) = relation.id.as_ref().and_then(|id| keyed.shift_remove(id)) {
            if over.source.is_some() {
                relation.source = over.source;
            }
            if over.target.is_some() {
                relation.target = over.target;
            }
            if over.documentation.is_some() {
                relation.documentation = over.documentation;
            }
            if over.kind.is_some() {
                relation.kind = over.kind;
            }
            if !over.properties.is_empty() {
                relation.properties = over.properties;
            }
        }
        merged.push(relation);
    }
    merged.extend(keyed.into_values());
    for mut extra in extras {
        extra.id = Some(generated_id());
        merged.push(extra);
    }
    merged
}

fn organization_key(item: &OrganizationItem) -> Option<String> {
    if let Some(identifier) = &item.identifier {
        return Some(format!("identifier:{identifier}"));
    }
    if let Some(reference) = &item.identifier_ref {
        return Some(format!("identifierRef:{reference}"));
    }
    item.label.as_ref().map(|label| format!("label:{}", label.text))
}

fn merge_organizations(
    template: &[OrganizationItem],
    overrides: &[OrganizationItem],
) -> Vec<OrganizationItem> {
    let mut keyed: IndexMap<String, OrganizationItem> = IndexMap::new();
    let mut extras: Vec<OrganizationItem> = Vec::new();
    for item in overrides {
        match organization_key(item) {
            Some(key) => {
                keyed.insert(key, item.clone());
            }
            None => extras.push(item.clone()),
        }
    }

    let mut merged = Vec::with_capacity(template.len() + keyed.len() + extras.len());
    for item in template {
        let mut item = item.clone();
        let over = organization_key(&item).and_then(|key| keyed.shift_remove(&key));
        if let Some(over) = &over {
            if over.label.is_some() {
                item.label = over.label.clone();
            }
            if over.documentation.is_some() {
                item.documentation = over.documentation.clone();
            }
        }
        item.items = merge_organizations(
            &item.items,
            over.as_ref().map(|o| o.items.as_slice()).unwrap_or(&[]),
        );
        merged.push(item);
    }
    merged.extend(keyed.into_values());
    merged.extend(extras);
    merged
}

fn merge_views(template: Option<&Views>, overrides: Option<&Views>) -> Option<Views> {
    if template.is_none() && overrides.is_none() {
        return None;
    }
    let template = template.cloned().unwrap_or_default();
    let override_diagrams = overrides.map(|v| v.diagrams.as_slice()).unwrap_or(&[]);

    let mut keyed: IndexMap<String, ViewDiagram> = IndexMap::new();
    let mut extras: Vec<ViewDiagram> = Vec::new();
    for diagram in override_diagrams {
        match &diagram.id {
            Some(id) => {
                keyed.insert(id.clone(), diagram.clone());
            }
            None => extras.push(diagram.clone()),
        }
    }

    let mut diagrams = Vec::with_capacity(template.diagrams.len() + keyed.len() + extras.len());
    for diagram in &template.diagrams {
        let mut diagram = diagram.clone();
        let over = diagram.id.as_ref().and_then(|id| keyed.shift_remove(id));
        if let Some(over) = &over {
            if over.name.is_some() {
                diagram.name = over.name.clone();
            }
            if over.documentation.is_some() {
                diagram.documentation = over.documentation.clone();
            }
            if over.kind.is_some() {
                diagram.kind = over.kind.clone();
            }
            if !over.properties.is_empty() {
                diagram.properties = over.properties.clone();
            }
        }
        diagram.nodes = merge_view_nodes(
            &diagram.nodes,
            over.as_ref().map(|o| o.nodes.as_slice()).unwrap_or(&[]),
        );
        diagram.connections = merge_view_connections(
            &diagram.connections,
            over.as_ref().map(|o| o.connections.as_slice()).unwrap_or(&[]),
        );
        diagrams.push(diagram);
    }
    for (_, mut extra) in keyed {
        if extra.id.is_none() {
            extra.id = Some(generated_id());
        }
        diagrams.push(extra);
    }
    for mut extra in extras {
        extra.id = Some(generated_id());
        diagrams.push(extra);
    }

    let views = Views {
        viewpoints: template.viewpoints,
        diagrams,
    };
    (!views.is_empty()).then_some(views)
}

fn merge_view_nodes(template: &[ViewNode], overrides: &[ViewNode]) -> Vec<ViewNode> {
    let mut keyed: IndexMap<String, ViewNode> = IndexMap::new();
    let mut extras: Vec<ViewNode> = Vec::new();
    for node in overrides {
        match node.merge_key() {
            Some(key) => {
                keyed.insert(key, node.clone());
            }
            None => extras.push(node.clone()),
        }
    }

    let mut merged = Vec::with_capacity(template.len() + keyed.len() + extras.len());
    for node in template {
        let mut node = node.clone();
        let over = node.merge_key().and_then(|key| keyed.shift_remove(&key));
        if let Some(over) = &over {
            apply_node_override(&mut node, over);
        }
        node.nodes = merge_view_nodes(
            &node.nodes,
            over.as_ref().map(|o| o.nodes.as_slice()).unwrap_or(&[]),
        );
        node.connections = merge_view_connections(
            &node.connections,
            over.as_ref().map(|o| o.connections.as_slice()).unwrap_or(&[]),
        );
        merged.push(node);
    }
    merged.extend(keyed.into_values());
    merged.extend(extras);
    merged
}

fn apply_node_override(node: &mut ViewNode, over: &ViewNode) {
    if over.label.is_some() {
        node.label = over.label.clone();
    }
    if over.documentation.is_some() {
        node.documentation = over.documentation.clone();
    }
    if over.kind.is_some() {
        node.kind = over.kind.clone();
    }
    if over.element_ref.is_some() {
        node.element_ref = over.element_ref.clone();
    }
    if over.relationship_ref.is_some() {
        node.relationship_ref = over.relationship_ref.clone();
    }
    if over.view_ref.is_some() {
        node.view_ref = over.view_ref.clone();
    }
    if let Some(bounds) = &over.bounds {
        node.bounds.get_or_insert_default().apply(bounds);
    }
    if let Some(style) = &over.style {
        node.style.get_or_insert_default().apply(style);
    }
    if !over.properties.is_empty() {
        node.properties = over.properties.clone();
    }
    if !over.child_order.is_empty() {
        node.child_order = over.child_order.clone();
    }
}

fn merge_view_connections(template: &[Connection], overrides: &[Connection]) -> Vec<Connection> {
    let mut keyed: IndexMap<String, Connection> = IndexMap::new();
    let mut extras: Vec<Connection> = Vec::new();
    for connection in overrides {
        match &connection.id {
            Some(id) => {
                keyed.insert(id.clone(), connection.clone());
            }
            None => extras.push(connection.clone()),
        }
    }

    let mut merged = Vec::with_capacity(template.len() + keyed.len() + extras.len());
    for connection in template {
        let mut connection = connection.clone();
        if let Some(over) = connection.id.as_ref().and_then(|id| keyed.shift_remove(id)) {
            if over.label.is_some() {
                connection.label = over.label;
            }
            if over.documentation.is_some() {
                connection.documentation = over.documentation;
            }
            if over.kind.is_some() {
                connection.kind = over.kind;
            }
            if over.relationship_ref.is_some() {
                connection.relationship_ref = over.relationship_ref;
            }
            if over.source.is_some() {
                connection.source = over.source;
            }
            if over.target.is_some() {
                connection.target = over.target;
            }
            if let Some(style) = &over.style {
                connection.style.get_or_insert_default().apply(style);
            }
            if !over.points.is_empty() {
                connection.points = over.points;
            }
            if !over.properties.is_empty() {
                connection.properties = over.properties;
            }
        }
        merged.push(connection);
    }
    merged.extend(keyed.into_values());
    merged.extend(extras);
    merged
}

fn collect_dangling(model: &ConsolidatedModel) -> Vec<DanglingReference> {
    let element_ids: FxHashSet<&str> = model
        .elements
        .iter()
        .filter_map(|e| e.id.as_deref())
        .collect();
    let relation_ids: FxHashSet<&str> = model
        .relations
        .iter()
        .filter_map(|r| r.id.as_deref())
        .collect();

    let mut dangling = Vec::new();

    for relation in &model.relations {
        let context = relation.id.clone().unwrap_or_else(|| "relationship".into());
        for endpoint in [&relation.source, &relation.target] {
            if let Some(reference) = endpoint {
                if !element_ids.contains(reference.as_str())
                    && !relation_ids.contains(reference.as_str())
                {
                    dangling.push(DanglingReference {
                        kind: DanglingKind::RelationshipEndpoint,
                        reference: reference.clone(),
                        context: context.clone(),
                    });
                }
            }
        }
    }

    let mut known_ids: FxHashSet<String> = FxHashSet::default();
    known_ids.extend(element_ids.iter().map(|id| id.to_string()));
    known_ids.extend(relation_ids.iter().map(|id| id.to_string()));

    if let Some(views) = &model.views {
        for viewpoint in &views.viewpoints {
            if let Some(id) = &viewpoint.id {
                known_ids.insert(id.clone());
            }
        }
        for diagram in &views.diagrams {
            if let Some(id) = &diagram.id {
                known_ids.insert(id.clone());
            }
            let mut node_ids: FxHashSet<String> = FxHashSet::default();
            collect_node_ids(&diagram.nodes, &mut node_ids);
            known_ids.extend(node_ids.iter().cloned());
            for connection in &diagram.connections {
                if let Some(id) = &connection.id {
                    known_ids.insert(id.clone());
                }
            }

            let view_context = diagram.id.clone().unwrap_or_else(|| "view".into());
            check_nodes(
                &diagram.nodes,
                &element_ids,
                &relation_ids,
                &view_context,
                &mut dangling,
            );
            for connection in &diagram.connections {
                check_connection(
                    connection,
                    &relation_ids,
                    &node_ids,
                    &view_context,
                    &mut dangling,
                );
            }
        }
    }

    check_organizations(&model.organizations, &known_ids, &mut dangling);

    for issue in &dangling {
        tracing::warn!(
            reference = %issue.reference,
            context = %issue.context,
            "unresolved reference in consolidated model"
        );
    }
    dangling
}

fn collect_node_ids(nodes: &[ViewNode], out: &mut FxHashSet<String>) {
    for node in nodes {
        if let Some(id) = &node.id {
            out.insert(id.clone());
        }
        collect_node_ids(&node.nodes, out);
    }
}

fn check_nodes(
    nodes: &[ViewNode],
    element_ids: &FxHashSet<&str>,
    relation_ids: &FxHashSet<&str>,
    context: &str,
    dangling: &mut Vec<DanglingReference>,
) {
    for node in nodes {
        let node_context = node.id.clone().unwrap_or_else(|| context.to_string());
        if let Some(reference) = &node.element_ref {
            if !element_ids.contains(reference.as_str()) {
                dangling.push(DanglingReference {
                    kind: DanglingKind::ElementRef,
                    reference: reference.clone(),
                    context: node_context.clone(),
                });
            }
        }
        if let Some(reference) = &node.relationship_ref {
            if !relation_ids.contains(reference.as_str()) {
                dangling.push(DanglingReference {
                    kind: DanglingKind::RelationshipRef,
                    reference: reference.clone(),
                    context: node_context.clone(),
                });
            }
        }
        check_nodes(&node.nodes, element_ids, relation_ids, context, dangling);
    }
}

fn check_connection(
    connection: &Connection,
    relation_ids: &FxHashSet<&str>,
    node_ids: &FxHashSet<String>,
    context: &str,
    dangling: &mut Vec<DanglingReference>,
) {
    let conn_context = connection.id.clone().unwrap_or_else(|| context.to_string());
    if let Some(reference) = &connection.relationship_ref {
        if !relation_ids.contains(reference.as_str()) {
            dangling.push(DanglingReference {
                kind: DanglingKind::RelationshipRef,
                reference: reference.clone(),
                context: conn_context.clone(),
            });
        }
    }
    for endpoint in [&connection.source, &connection.target] {
        if let Some(reference) = endpoint {
            if !node_ids.contains(reference) {
                dangling.push(DanglingReference {
                    kind: DanglingKind::ConnectionEndpoint,
                    reference: reference.clone(),
                    context: conn_context.clone(),
                });
            }
        }
    }
}

fn check_organizations(
    items: &[OrganizationItem],
    known_ids: &FxHashSet<String>,
    dangling: &mut Vec<DanglingReference>,
) {
    for item in items {
        if let Some(reference) = &item.identifier_ref {
            if !known_ids.contains(reference) {
                dangling.push(DanglingReference {
                    kind: DanglingKind::OrganizationRef,
                    reference: reference.clone(),
                    context: "organizations".into(),
                });
            }
        }
        check_organizations(&item.items, known_ids, dangling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bounds, Color, LocalizedText, Style};
    use serde_json::json;

    fn blueprint() -> Blueprint {
        serde_json::from_value(json!({
            "model_identifier": "id-model-1",
            "model_name": {"text": "Base"},
            "elements": [
                {"id": "id-a", "type": "ApplicationComponent", "name": "Service A"},
                {"id": "id-b", "type": "ApplicationComponent", "name": "Service B"}
            ],
            "relations": [
                {"id": "id-r1", "type": "Serving", "source": "id-a", "target": "id-b"}
            ],
            "organizations": [
                {"label": "Application", "items": [
                    {"identifierRef": "id-a"},
                    {"identifierRef": "id-b"}
                ]}
            ],
            "views": {
                "diagrams": [{
                    "id": "id-view-1",
                    "name": "Context",
                    "nodes": [
                        {"id": "id-n1", "elementRef": "id-a",
                         "bounds": {"x": 0.0, "y": 0.0, "w": 100.0, "h": 80.0},
                         "style": {"fillColor": {"r": 255, "g": 250, "b": 240, "a": 100}}},
                        {"id": "id-n2", "elementRef": "id-b",
                         "bounds": {"x": 200.0, "y": 0.0, "w": 100.0, "h": 80.0}}
                    ],
                    "connections": [
                        {"id": "id-c1", "relationshipRef": "id-r1",
                         "source": "id-n1", "target": "id-n2"}
                    ]
                }]
            }
        }))
        .unwrap()
    }

    #[test]
    fn override_name_wins_and_untouched_entries_survive() {
        let base = blueprint();
        let overrides: OverrideDocument = serde_json::from_value(json!({
            "elements": [{"id": "id-a", "name": "Renamed"}]
        }))
        .unwrap();

        let outcome = merge(&base, &overrides);
        assert_eq!(
            outcome.model.element("id-a").unwrap().name,
            Some(LocalizedText::new("Renamed"))
        );
        assert_eq!(
            outcome.model.element("id-b").unwrap().name,
            Some(LocalizedText::new("Service B"))
        );
        assert!(outcome.dangling.is_empty());
    }

    #[test]
    fn new_identifiers_append_after_template_order() {
        let base = blueprint();
        let overrides: OverrideDocument = serde_json::from_value(json!({
            "elements": [
                {"id": "id-c", "type": "DataObject", "name": "New"},
                {"id": "id-a", "name": "First"}
            ]
        }))
        .unwrap();

        let outcome = merge(&base, &overrides);
        let ids: Vec<_> = outcome
            .model
            .elements
            .iter()
            .map(|e| e.id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["id-a", "id-b", "id-c"]);
    }

    #[test]
    fn appended_entries_without_id_get_generated_identifiers() {
        let base = blueprint();
        let overrides: OverrideDocument = serde_json::from_value(json!({
            "elements": [{"type": "DataObject", "name": "Anonymous"}]
        }))
        .unwrap();

        let outcome = merge(&base, &overrides);
        let appended = outcome.model.elements.last().unwrap();
        assert!(appended.id.as_deref().unwrap().starts_with("id-"));
    }

    #[test]
    fn node_style_and_bounds_merge_channel_wise() {
        let base = blueprint();
        let overrides: OverrideDocument = serde_json::from_value(json!({
            "views": {"diagrams": [{
                "id": "id-view-1",
                "nodes": [{"id": "id-n1",
                           "bounds": {"x": 40.0},
                           "style": {"fillColor": {"r": 0}}}]
            }]}
        }))
        .unwrap();

        let outcome = merge(&base, &overrides);
        let node = &outcome.model.diagrams()[0].nodes[0];
        assert_eq!(
            node.bounds,
            Some(Bounds {
                x: Some(40.0),
                y: Some(0.0),
                w: Some(100.0),
                h: Some(80.0)
            })
        );
        assert_eq!(
            node.style.as_ref().unwrap().fill_color,
            Some(Color {
                r: Some(0),
                g: Some(250),
                b: Some(240),
                a: Some(100)
            })
        );
        assert_eq!(node.style.as_ref().map(|s| s.line_color), Some(None));
    }

    #[test]
    fn unlabeled_nodes_match_by_element_ref() {
        let base = blueprint();
        let overrides: OverrideDocument = serde_json::from_value(json!({
            "views": {"diagrams": [{
                "id": "id-view-1",
                "nodes": [{"elementRef": "id-a", "label": "Edge label"}]
            }]}
        }))
        .unwrap();

        let mut base_unlabeled = base.clone();
        base_unlabeled
            .views
            .as_mut()
            .unwrap()
            .diagrams[0]
            .nodes[0]
            .id = None;

        let outcome = merge(&base_unlabeled, &overrides);
        let view = &outcome.model.diagrams()[0];
        assert_eq!(view.nodes.len(), 2);
        assert_eq!(
            view.nodes[0].label,
            Some(LocalizedText::new("Edge label"))
        );
    }

    #[test]
    fn dangling_references_are_flagged_not_fatal() {
        let base = blueprint();
        let overrides: OverrideDocument = serde_json::from_value(json!({
            "relations": [
                {"id": "id-r2", "type": "Flow", "source": "id-a", "target": "id-missing"}
            ],
            "organizations": [
                {"identifierRef": "id-ghost"}
            ]
        }))
        .unwrap();

        let outcome = merge(&base, &overrides);
        assert_eq!(outcome.dangling.len(), 2);
        assert!(outcome
            .dangling
            .iter()
            .any(|d| d.kind == DanglingKind::RelationshipEndpoint && d.reference == "id-missing"));
        assert!(outcome
            .dangling
            .iter()
            .any(|d| d.kind == DanglingKind::OrganizationRef && d.reference == "id-ghost"));
    }

    #[test]
    fn partial_style_override_keeps_existing_font() {
        let mut style = Style::default();
        style.apply(&serde_json::from_value(json!({"font": {"name": "Segoe UI"}})).unwrap());
        style.apply(&serde_json::from_value(json!({"font": {"size": 9.0}})).unwrap());
        let font = style.font.unwrap();
        assert_eq!(font.name.as_deref(), Some("Segoe UI"));
        assert_eq!(font.size, Some(9.0));
    }
}
