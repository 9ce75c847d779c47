//! Per-view render pipeline: consolidate, select diagrams, render to SVG,
//! write artifacts and expose embeddable `data:` URIs.

pub use archivolt_render::{
    RenderOptions, RenderedView, SceneConnection, SceneNode, ViewScene, build_scene, render_view,
};

#[cfg(feature = "raster")]
pub mod raster;

use crate::{EngineError, Studio};
use archivolt_core::model::{OverrideDocument, ViewDiagram};
use base64::Engine as _;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum HeadlessError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Render(#[from] archivolt_render::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no view matches filter \"{filter}\"")]
    NoMatchingView { filter: String },
}

pub type Result<T> = std::result::Result<T, HeadlessError>;

/// One successfully rendered view.
#[derive(Debug, Clone)]
pub struct ViewArtifact {
    pub view_id: Option<String>,
    pub view_name: String,
    pub svg: String,
    pub svg_path: PathBuf,
    pub svg_data_uri: String,
    pub width: u32,
    pub height: u32,
}

/// A view that could not be rendered; other views are unaffected.
#[derive(Debug, Clone)]
pub struct ViewFailure {
    pub view: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct RenderOutcome {
    pub artifacts: Vec<ViewArtifact>,
    pub failures: Vec<ViewFailure>,
}

/// File-name-safe slug for a view.
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { '-' })
        .collect();
    let slug: Vec<&str> = slug.split('-').filter(|part| !part.is_empty()).collect();
    if slug.is_empty() {
        "view".to_string()
    } else {
        slug.join("-")
    }
}

pub fn svg_data_uri(svg: &str) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(svg)
    )
}

fn matches_filter(diagram: &ViewDiagram, tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return true;
    }
    let id = diagram.id.as_deref().unwrap_or("").to_lowercase();
    let name = diagram
        .name
        .as_ref()
        .map(|n| n.text.to_lowercase())
        .unwrap_or_default();
    tokens.iter().any(|token| *token == id || *token == name)
}

fn filter_tokens(filter: Option<&str>) -> Vec<String> {
    filter
        .map(|f| {
            f.split(',')
                .map(|token| token.trim().to_lowercase())
                .filter(|token| !token.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Consolidates `template` + `overrides` and renders every selected view.
///
/// A view that cannot produce a scene (no usable bounds, unresolvable
/// connection endpoint) becomes a [`ViewFailure`] instead of aborting the
/// remaining views.
pub fn render_views(
    studio: &Studio,
    template: &Path,
    overrides: &OverrideDocument,
    filter: Option<&str>,
    output_dir: Option<&Path>,
    options: &RenderOptions,
) -> Result<RenderOutcome> {
    let consolidation = studio.consolidate(template, overrides)?;
    let tokens = filter_tokens(filter);

    let selected: Vec<&ViewDiagram> = consolidation
        .model
        .diagrams()
        .iter()
        .filter(|diagram| matches_filter(diagram, &tokens))
        .collect();
    if selected.is_empty() && !tokens.is_empty() {
        return Err(HeadlessError::NoMatchingView {
            filter: filter.unwrap_or_default().to_string(),
        });
    }

    let target_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| studio.output_dir().to_path_buf());
    fs::create_dir_all(&target_dir)?;

    let mut outcome = RenderOutcome::default();
    for diagram in selected {
        let view_name = diagram
            .name
            .as_ref()
            .map(|n| n.text.clone())
            .or_else(|| diagram.id.clone())
            .unwrap_or_else(|| "View".to_string());

        let rendered = build_scene(diagram, &consolidation.model)
            .and_then(|scene| render_view(&scene, options));
        let rendered = match rendered {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!(view = %view_name, error = %err, "view skipped");
                outcome.failures.push(ViewFailure {
                    view: view_name,
                    error: err.to_string(),
                });
                continue;
            }
        };

        let filename = format!(
            "{}.svg",
            slugify(diagram.id.as_deref().unwrap_or(&view_name))
        );
        let svg_path = target_dir.join(filename);
        fs::write(&svg_path, &rendered.svg)?;

        outcome.artifacts.push(ViewArtifact {
            view_id: diagram.id.clone(),
            view_name,
            svg_data_uri: svg_data_uri(&rendered.svg),
            svg: rendered.svg,
            svg_path,
            width: rendered.width,
            height: rendered.height,
        });
    }

    Ok(outcome)
}
