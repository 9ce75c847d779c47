//! Builds a flat, renderable scene from one consolidated diagram view.
//!
//! The scene resolves everything the SVG writer needs up front: absolute
//! rectangles, display titles (node label, else the referenced element's
//! name, else an identifier), type captions and styles. Nodes without
//! resolvable bounds cannot be drawn; a connection anchored to one is a
//! hard error rather than a silently missing line.

use crate::geometry::Rect;
use crate::{Error, Result};
use archivolt_core::model::{
    Color, Connection, ConsolidatedModel, LocalizedText, ViewDiagram, ViewNode,
};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub key: String,
    pub title: String,
    pub type_line: Option<String>,
    pub rect: Rect,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
}

#[derive(Debug, Clone)]
pub struct SceneConnection {
    pub key: Option<String>,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub stroke: Option<Color>,
}

#[derive(Debug, Clone)]
pub struct ViewScene {
    pub view_id: Option<String>,
    pub name: String,
    pub nodes: Vec<SceneNode>,
    pub connections: Vec<SceneConnection>,
}

struct ElementInfo {
    name: Option<String>,
    kind: Option<String>,
}

/// Flattens `diagram` into a [`ViewScene`], resolving element references
/// against the consolidated model.
pub fn build_scene(diagram: &ViewDiagram, model: &ConsolidatedModel) -> Result<ViewScene> {
    let name = diagram
        .name
        .as_ref()
        .map(|n| n.text.clone())
        .or_else(|| diagram.id.clone())
        .unwrap_or_else(|| "View".to_string());

    let mut elements: FxHashMap<&str, ElementInfo> = FxHashMap::default();
    for element in &model.elements {
        if let Some(id) = element.id.as_deref() {
            elements.insert(
                id,
                ElementInfo {
                    name: element.name.as_ref().map(|n| n.text.clone()),
                    kind: element.kind.clone(),
                },
            );
        }
    }
    let mut relation_kinds: FxHashMap<&str, Option<String>> = FxHashMap::default();
    for relation in &model.relations {
        if let Some(id) = relation.id.as_deref() {
            relation_kinds.insert(id, relation.kind.clone());
        }
    }

    let mut nodes = Vec::new();
    let mut connections = Vec::new();
    let mut anonymous = 0usize;
    for node in &diagram.nodes {
        flatten_node(node, &elements, &mut nodes, &mut connections, &mut anonymous);
    }
    for connection in &diagram.connections {
        connections.push(connection.clone());
    }

    if nodes.is_empty() {
        return Err(Error::EmptyRenderableView { view: name });
    }

    let node_keys: FxHashSet<String> = nodes.iter().map(|node| node.key.clone()).collect();

    let mut scene_connections = Vec::with_capacity(connections.len());
    for connection in &connections {
        let Some(scene_connection) =
            resolve_connection(connection, &node_keys, &relation_kinds)?
        else {
            continue;
        };
        scene_connections.push(scene_connection);
    }

    Ok(ViewScene {
        view_id: diagram.id.clone(),
        name,
        nodes,
        connections: scene_connections,
    })
}

fn flatten_node(
    node: &ViewNode,
    elements: &FxHashMap<&str, ElementInfo>,
    out: &mut Vec<SceneNode>,
    connections: &mut Vec<Connection>,
    anonymous: &mut usize,
) {
    let key = node.id.clone().or_else(|| node.merge_key()).unwrap_or_else(|| {
        *anonymous += 1;
        format!("node-{anonymous}")
    });

    let element = node.element_ref.as_deref().and_then(|id| elements.get(id));
    let title = text_of(&node.label)
        .or_else(|| element.and_then(|e| e.name.clone()))
        .or_else(|| node.element_ref.clone())
        .unwrap_or_else(|| key.clone());
    let type_line = element
        .and_then(|e| e.kind.clone())
        .or_else(|| match node.kind.as_deref() {
            Some("Element") | Some("Container") | Some("Label") | None => None,
            Some(other) => Some(other.to_string()),
        });

    if let Some(bounds) = node.bounds.filter(|b| b.is_resolved()) {
        out.push(SceneNode {
            key,
            title,
            type_line,
            rect: Rect {
                x: bounds.x.unwrap_or(0.0),
                y: bounds.y.unwrap_or(0.0),
                w: bounds.w.unwrap_or(0.0),
                h: bounds.h.unwrap_or(0.0),
            },
            fill: node.style.as_ref().and_then(|s| s.fill_color),
            stroke: node.style.as_ref().and_then(|s| s.line_color),
        });
    }

    for child in &node.nodes {
        flatten_node(child, elements, out, connections, anonymous);
    }
    for connection in &node.connections {
        connections.push(connection.clone());
    }
}

fn resolve_connection(
    connection: &Connection,
    node_keys: &FxHashSet<String>,
    relation_kinds: &FxHashMap<&str, Option<String>>,
) -> Result<Option<SceneConnection>> {
    let (Some(source), Some(target)) = (&connection.source, &connection.target) else {
        // Free-floating lines without endpoints carry no renderable geometry.
        return Ok(None);
    };

    let connection_name = connection
        .id
        .clone()
        .unwrap_or_else(|| "connection".to_string());
    for endpoint in [source, target] {
        if !node_keys.contains(endpoint) {
            return Err(Error::UnresolvedEndpoint {
                connection: connection_name,
                endpoint: endpoint.clone(),
            });
        }
    }

    let label = text_of(&connection.label).or_else(|| {
        connection
            .relationship_ref
            .as_deref()
            .and_then(|id| relation_kinds.get(id).cloned().flatten())
    });

    Ok(Some(SceneConnection {
        key: connection.id.clone(),
        source: source.clone(),
        target: target.clone(),
        label,
        stroke: connection.style.as_ref().and_then(|s| s.line_color),
    }))
}

fn text_of(payload: &Option<LocalizedText>) -> Option<String> {
    payload.as_ref().map(|p| p.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivolt_core::model::Blueprint;
    use serde_json::json;

    fn model() -> Blueprint {
        serde_json::from_value(json!({
            "elements": [
                {"id": "id-a", "type": "ApplicationComponent", "name": "Service A"},
                {"id": "id-b", "type": "ApplicationComponent", "name": "Service B"}
            ],
            "relations": [
                {"id": "id-r1", "type": "Serving", "source": "id-a", "target": "id-b"}
            ],
            "views": {"diagrams": [{
                "id": "id-view-1",
                "name": "Context",
                "nodes": [
                    {"id": "id-n1", "elementRef": "id-a",
                     "bounds": {"x": 0.0, "y": 0.0, "w": 100.0, "h": 80.0}},
                    {"id": "id-n2", "elementRef": "id-b",
                     "bounds": {"x": 200.0, "y": 0.0, "w": 100.0, "h": 80.0}}
                ],
                "connections": [
                    {"id": "id-c1", "relationshipRef": "id-r1",
                     "source": "id-n1", "target": "id-n2"}
                ]
            }]}
        }))
        .unwrap()
    }

    #[test]
    fn scene_resolves_titles_from_elements() {
        let model = model();
        let scene = build_scene(&model.diagrams()[0], &model).unwrap();
        assert_eq!(scene.name, "Context");
        assert_eq!(scene.nodes.len(), 2);
        assert_eq!(scene.nodes[0].title, "Service A");
        assert_eq!(scene.nodes[0].type_line.as_deref(), Some("ApplicationComponent"));
    }

    #[test]
    fn connection_label_falls_back_to_relationship_kind() {
        let model = model();
        let scene = build_scene(&model.diagrams()[0], &model).unwrap();
        assert_eq!(scene.connections.len(), 1);
        assert_eq!(scene.connections[0].label.as_deref(), Some("Serving"));
    }

    #[test]
    fn view_without_bounds_is_an_error() {
        let mut model = model();
        for node in &mut model.views.as_mut().unwrap().diagrams[0].nodes {
            node.bounds = None;
        }
        let err = build_scene(&model.diagrams()[0], &model).unwrap_err();
        assert!(matches!(err, Error::EmptyRenderableView { .. }));
    }

    #[test]
    fn connection_to_missing_node_is_an_error() {
        let mut model = model();
        model.views.as_mut().unwrap().diagrams[0].nodes.remove(1);
        let err = build_scene(&model.diagrams()[0], &model).unwrap_err();
        match err {
            Error::UnresolvedEndpoint { endpoint, .. } => assert_eq!(endpoint, "id-n2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nested_nodes_flatten_with_their_connections() {
        let model: Blueprint = serde_json::from_value(json!({
            "elements": [{"id": "id-a", "name": "Parent"}],
            "views": {"diagrams": [{
                "id": "id-view-1",
                "nodes": [{
                    "id": "id-outer", "elementRef": "id-a",
                    "bounds": {"x": 0.0, "y": 0.0, "w": 300.0, "h": 200.0},
                    "nodes": [{
                        "id": "id-inner", "label": "Inner",
                        "bounds": {"x": 20.0, "y": 20.0, "w": 80.0, "h": 40.0}
                    }],
                    "connections": [{
                        "id": "id-c", "source": "id-outer", "target": "id-inner"
                    }]
                }]
            }]}
        }))
        .unwrap();

        let scene = build_scene(&model.diagrams()[0], &model).unwrap();
        assert_eq!(scene.nodes.len(), 2);
        assert_eq!(scene.connections.len(), 1);
        assert_eq!(scene.nodes[1].title, "Inner");
    }
}
