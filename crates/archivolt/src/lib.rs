#![forbid(unsafe_code)]

//! `archivolt` turns an ArchiMate exchange template plus a JSON override
//! document into a patched, schema-validated exchange file and per-view
//! SVG/PNG renders.
//!
//! # Features
//!
//! - `render`: enable the view renderer pipeline (`archivolt::render`)
//! - `raster`: enable PNG/JPG output via pure-Rust SVG rasterization

pub use archivolt_core::*;

mod studio;
pub use studio::{
    Consolidation, EngineError, GenerateOptions, GeneratedDocument, Studio,
    override_from_json, override_from_value,
};

#[cfg(feature = "render")]
pub mod render;
