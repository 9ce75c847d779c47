#![forbid(unsafe_code)]

//! Headless renderer for ArchiMate diagram views.
//!
//! This is a renderer, not a layout engine: node and connection geometry is
//! the template's own coordinate space, translated onto the canvas with a
//! fixed margin and never recomputed.

pub mod color;
pub mod geometry;
pub mod scene;
pub mod svg;

pub use scene::{SceneConnection, SceneNode, ViewScene, build_scene};
pub use svg::{RenderOptions, RenderedView, render_view};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("view \"{view}\" has no node with resolvable bounds")]
    EmptyRenderableView { view: String },
    #[error("connection \"{connection}\" endpoint \"{endpoint}\" resolves to no renderable node")]
    UnresolvedEndpoint {
        connection: String,
        endpoint: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
