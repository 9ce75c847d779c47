//! SVG emission for a resolved [`ViewScene`].

use crate::color::{css_opacity, css_rgb};
use crate::geometry::{Rect, anchor_toward, bounding_box};
use crate::scene::ViewScene;
use crate::{Error, Result};
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Fixed margin added around the tight bounding box of the view.
    pub margin: f64,
    pub font_family: String,
    pub title_font_size: f64,
    pub type_font_size: f64,
    pub corner_radius: f64,
    /// Paint used when a node carries no fill style.
    pub default_fill: String,
    /// Paint used when a node or connection carries no line style.
    pub default_stroke: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            margin: 24.0,
            font_family: "Segoe UI, Arial, sans-serif".to_string(),
            title_font_size: 13.0,
            type_font_size: 11.0,
            corner_radius: 6.0,
            default_fill: "#f4f6fb".to_string(),
            default_stroke: "#4d6ed3".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedView {
    pub svg: String,
    pub width: u32,
    pub height: u32,
}

/// Renders the scene to a standalone SVG document using the template's own
/// coordinates translated by the margin.
pub fn render_view(scene: &ViewScene, options: &RenderOptions) -> Result<RenderedView> {
    let Some((min_x, min_y, max_x, max_y)) =
        bounding_box(scene.nodes.iter().map(|node| node.rect))
    else {
        return Err(Error::EmptyRenderableView {
            view: scene.name.clone(),
        });
    };

    let tx = options.margin - min_x;
    let ty = options.margin - min_y;
    let width = (max_x - min_x) + options.margin * 2.0;
    let height = (max_y - min_y) + options.margin * 2.0;

    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = fmt(width),
        h = fmt(height)
    );
    let _ = writeln!(
        &mut out,
        r##"<defs><marker id="arrow" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="7" markerHeight="7" orient="auto-start-reverse"><path d="M 0 0 L 10 5 L 0 10 z" fill="#333333"/></marker></defs>"##
    );

    out.push_str("<g class=\"nodes\">\n");
    for node in &scene.nodes {
        let rect = node.rect.translated(tx, ty);
        let fill = node
            .fill
            .as_ref()
            .map(css_rgb)
            .unwrap_or_else(|| options.default_fill.clone());
        let stroke = node
            .stroke
            .as_ref()
            .map(css_rgb)
            .unwrap_or_else(|| options.default_stroke.clone());

        let _ = write!(
            &mut out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}" stroke="{}" stroke-width="1.5""#,
            fmt(rect.x),
            fmt(rect.y),
            fmt(rect.w),
            fmt(rect.h),
            fmt(options.corner_radius),
            escape_attr(&fill),
            escape_attr(&stroke)
        );
        if let Some(opacity) = node.fill.as_ref().and_then(css_opacity) {
            let _ = write!(&mut out, r#" fill-opacity="{}""#, fmt(opacity));
        }
        if let Some(opacity) = node.stroke.as_ref().and_then(css_opacity) {
            let _ = write!(&mut out, r#" stroke-opacity="{}""#, fmt(opacity));
        }
        out.push_str("/>\n");

        let (cx, cy) = rect.center();
        let title_y = if node.type_line.is_some() { cy - 7.0 } else { cy };
        let _ = writeln!(
            &mut out,
            r##"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle" font-family="{}" font-size="{}" fill="#1a2b6d">{}</text>"##,
            fmt(cx),
            fmt(title_y),
            escape_attr(&options.font_family),
            fmt(options.title_font_size),
            escape_text(&node.title)
        );
        if let Some(type_line) = &node.type_line {
            let _ = writeln!(
                &mut out,
                r##"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle" font-family="{}" font-size="{}" fill="#4d6ed3">{}</text>"##,
                fmt(cx),
                fmt(cy + 9.0),
                escape_attr(&options.font_family),
                fmt(options.type_font_size),
                escape_text(type_line)
            );
        }
    }
    out.push_str("</g>\n");

    out.push_str("<g class=\"connections\">\n");
    for connection in &scene.connections {
        let source = scene.nodes.iter().find(|n| n.key == connection.source);
        let target = scene.nodes.iter().find(|n| n.key == connection.target);
        let (Some(source), Some(target)) = (source, target) else {
            // The scene builder guarantees both endpoints; a miss here means
            // the caller mutated the scene, so skip rather than panic.
            continue;
        };

        let source_rect = source.rect.translated(tx, ty);
        let target_rect = target.rect.translated(tx, ty);
        let (x1, y1) = anchor_toward(&source_rect, target_rect.center());
        let (x2, y2) = anchor_toward(&target_rect, source_rect.center());

        let stroke = connection
            .stroke
            .as_ref()
            .map(css_rgb)
            .unwrap_or_else(|| "#333333".to_string());
        let _ = writeln!(
            &mut out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1.2" marker-end="url(#arrow)"/>"#,
            fmt(x1),
            fmt(y1),
            fmt(x2),
            fmt(y2),
            escape_attr(&stroke)
        );

        if let Some(label) = &connection.label {
            let mx = (x1 + x2) / 2.0;
            let my = (y1 + y2) / 2.0;
            let _ = writeln!(
                &mut out,
                r##"<text x="{}" y="{}" text-anchor="middle" font-family="{}" font-size="{}" fill="#333333">{}</text>"##,
                fmt(mx),
                fmt(my - 4.0),
                escape_attr(&options.font_family),
                fmt(options.type_font_size),
                escape_text(label)
            );
        }
    }
    out.push_str("</g>\n");
    out.push_str("</svg>\n");

    Ok(RenderedView {
        svg: out,
        width: width.ceil().max(1.0) as u32,
        height: height.ceil().max(1.0) as u32,
    })
}

fn fmt(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = escape_text(text);
    if out.contains('"') {
        out = out.replace('"', "&quot;");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneConnection, SceneNode};
    use archivolt_core::model::Color;

    fn two_node_scene() -> ViewScene {
        ViewScene {
            view_id: Some("id-view-1".into()),
            name: "Context".into(),
            nodes: vec![
                SceneNode {
                    key: "id-n1".into(),
                    title: "Service A".into(),
                    type_line: Some("ApplicationComponent".into()),
                    rect: Rect { x: 0.0, y: 0.0, w: 100.0, h: 80.0 },
                    fill: Some(Color {
                        r: Some(255),
                        g: Some(250),
                        b: Some(240),
                        a: Some(50),
                    }),
                    stroke: None,
                },
                SceneNode {
                    key: "id-n2".into(),
                    title: "Service B".into(),
                    type_line: None,
                    rect: Rect { x: 200.0, y: 0.0, w: 100.0, h: 80.0 },
                    fill: None,
                    stroke: None,
                },
            ],
            connections: vec![SceneConnection {
                key: Some("id-c1".into()),
                source: "id-n1".into(),
                target: "id-n2".into(),
                label: Some("serves".into()),
                stroke: None,
            }],
        }
    }

    #[test]
    fn node_positions_keep_template_spacing() {
        let rendered = render_view(&two_node_scene(), &RenderOptions::default()).unwrap();
        assert!(rendered.svg.contains(r#"<rect x="24" y="24""#));
        assert!(rendered.svg.contains(r#"<rect x="224" y="24""#));
        assert_eq!(rendered.width, 348);
        assert_eq!(rendered.height, 128);
    }

    #[test]
    fn connection_terminates_on_rectangle_edges() {
        let rendered = render_view(&two_node_scene(), &RenderOptions::default()).unwrap();
        // Right edge of node 1 is x = 24 + 100; left edge of node 2 is x = 224.
        assert!(rendered.svg.contains(r#"<line x1="124" y1="64" x2="224" y2="64""#));
        assert!(rendered.svg.contains("marker-end=\"url(#arrow)\""));
    }

    #[test]
    fn translucent_fill_emits_opacity() {
        let rendered = render_view(&two_node_scene(), &RenderOptions::default()).unwrap();
        assert!(rendered.svg.contains(r#"fill="rgb(255,250,240)""#));
        assert!(rendered.svg.contains(r#"fill-opacity="0.5""#));
    }

    #[test]
    fn labels_are_escaped() {
        let mut scene = two_node_scene();
        scene.nodes[0].title = "A & B <C>".into();
        let rendered = render_view(&scene, &RenderOptions::default()).unwrap();
        assert!(rendered.svg.contains("A &amp; B &lt;C&gt;"));
    }

    #[test]
    fn empty_scene_is_an_error() {
        let scene = ViewScene {
            view_id: None,
            name: "Empty".into(),
            nodes: Vec::new(),
            connections: Vec::new(),
        };
        let err = render_view(&scene, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyRenderableView { .. }));
    }
}
