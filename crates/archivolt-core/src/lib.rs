#![forbid(unsafe_code)]

//! ArchiMate exchange-format engine (headless).
//!
//! The pipeline is copy-patch oriented: a template document is parsed into a
//! normalized [`model::Blueprint`], a caller-supplied override document is
//! merged onto it, and the result is written back by mutating a copy of the
//! *original* XML tree so that untouched regions (namespace declarations
//! included) survive byte-for-byte. Offline XSD validation runs against the
//! official schema set with locally rewritten `schemaLocation` references.

pub mod cache;
pub mod dom;
pub mod error;
pub mod merge;
pub mod model;
pub mod parse;
pub mod patch;
pub mod text;
pub mod xsd;

pub use cache::BlueprintCache;
pub use error::{Error, Result};
pub use merge::{DanglingKind, DanglingReference, MergeOutcome, merge};
pub use model::{Blueprint, ConsolidatedModel, OverrideDocument};
pub use parse::{parse_blueprint, parse_document, template_summary};
pub use patch::patch_document;
pub use xsd::{ValidationReport, validate};

/// Namespace of the ArchiMate Model Exchange File Format.
pub const ARCHIMATE_NS: &str = "http://www.opengroup.org/xsd/archimate/3.0/";
/// XML Schema instance namespace (`xsi:type`).
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// The XML namespace itself (`xml:lang`).
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
