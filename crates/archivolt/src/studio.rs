//! End-to-end pipeline entry point: parse (cached) → merge → patch →
//! validate, with artifact writing.

use archivolt_core::merge::DanglingReference;
use archivolt_core::model::{ConsolidatedModel, OverrideDocument};
use archivolt_core::parse::TemplateSummary;
use archivolt_core::xsd::ValidationReport;
use archivolt_core::{BlueprintCache, merge, parse_blueprint, parse_document, patch_document,
    template_summary, validate};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_OUTPUT_DIR: &str = "outputs";
const DEFAULT_DOCUMENT_FILENAME: &str = "model_exchange.xml";
const DEFAULT_DATAMODEL_FILENAME: &str = "model_datamodel.json";

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] archivolt_core::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("override document JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Decodes an override document from JSON text.
pub fn override_from_json(text: &str) -> Result<OverrideDocument> {
    Ok(serde_json::from_str(text)?)
}

/// Decodes an override document from an already-parsed JSON value.
pub fn override_from_value(value: serde_json::Value) -> Result<OverrideDocument> {
    Ok(serde_json::from_value(value)?)
}

/// Consolidated model plus its caller-facing serializations.
#[derive(Debug, Clone)]
pub struct Consolidation {
    pub model: ConsolidatedModel,
    /// Pretty-printed JSON of the consolidated model.
    pub json: String,
    pub dangling: Vec<DanglingReference>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Target path for the patched XML; defaults to
    /// `<output_dir>/model_exchange.xml`.
    pub output_path: Option<PathBuf>,
    /// Directory holding the official schema set; validation is skipped
    /// when absent.
    pub schema_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub path: PathBuf,
    #[serde(skip)]
    pub xml: String,
    /// `None` when validation was skipped.
    pub validation: Option<ValidationReport>,
}

impl GeneratedDocument {
    /// True when validation ran and reported no errors.
    pub fn is_valid(&self) -> bool {
        self.validation.as_ref().map(|report| report.ok).unwrap_or(false)
    }
}

/// Owns the session blueprint cache and drives the copy-patch pipeline.
pub struct Studio {
    cache: BlueprintCache,
    output_dir: PathBuf,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new()
    }
}

impl Studio {
    pub fn new() -> Self {
        Self {
            cache: BlueprintCache::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn cache(&self) -> &BlueprintCache {
        &self.cache
    }

    /// Template identification header plus its view listing.
    pub fn describe(&self, template: &Path) -> Result<TemplateSummary> {
        Ok(template_summary(template)?)
    }

    /// Merges the override onto the (cached) blueprint of `template`.
    pub fn consolidate(
        &self,
        template: &Path,
        overrides: &OverrideDocument,
    ) -> Result<Consolidation> {
        let blueprint = self.cache.get_or_parse(template)?;
        let outcome = merge(&blueprint, overrides);
        let json = serde_json::to_string_pretty(&outcome.model)?;
        Ok(Consolidation {
            model: outcome.model,
            json,
            dangling: outcome.dangling,
        })
    }

    /// Writes the consolidated model's pretty JSON to `path` (default
    /// `<output_dir>/model_datamodel.json`), creating parent directories.
    pub fn save_consolidated(
        &self,
        consolidation: &Consolidation,
        path: Option<&Path>,
    ) -> Result<PathBuf> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_DATAMODEL_FILENAME));
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, &consolidation.json)?;
        tracing::debug!(path = %path.display(), "consolidated datamodel written");
        Ok(path)
    }

    /// Full copy-patch run: consolidate, patch a copy of the original
    /// document, write it out, optionally validate.
    pub fn generate(
        &self,
        template: &Path,
        overrides: &OverrideDocument,
        options: &GenerateOptions,
    ) -> Result<GeneratedDocument> {
        let consolidation = self.consolidate(template, overrides)?;
        let original = parse_document(template)?;
        let xml = patch_document(&original, &consolidation.model)?;

        let path = options
            .output_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_DOCUMENT_FILENAME));
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, &xml)?;
        tracing::debug!(path = %path.display(), "patched document written");

        let validation = match &options.schema_dir {
            Some(schema_dir) => Some(validate(&path, schema_dir)?),
            None => None,
        };

        Ok(GeneratedDocument {
            path,
            xml,
            validation,
        })
    }

    /// Uncached parse, exposed for callers that bypass the cache on purpose.
    pub fn parse_uncached(
        &self,
        template: &Path,
    ) -> Result<archivolt_core::model::Blueprint> {
        Ok(parse_blueprint(template)?)
    }

    /// Cached blueprint access for read-only inspection.
    pub fn blueprint(
        &self,
        template: &Path,
    ) -> Result<Arc<archivolt_core::model::Blueprint>> {
        Ok(self.cache.get_or_parse(template)?)
    }
}
