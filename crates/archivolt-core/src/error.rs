pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed template {path}: {message}")]
    MalformedTemplate { path: String, message: String },

    #[error("template structure error: required `{anchor}` section not found")]
    TemplateStructure { anchor: &'static str },

    #[error("schema setup failed: {message}")]
    SchemaSetup { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("override document JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
