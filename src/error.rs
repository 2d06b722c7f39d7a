//! Error taxonomy of the encoder and the projection model.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapSpaceError {
    /// Degenerate geometry; the map is skipped.
    #[error("degenerate geometry: {0}")]
    Geometry(String),

    /// The map is filtered out by game mode, flag or extent. Not a failure.
    #[error("map not selected: {0}")]
    SelectionMismatch(String),

    /// A packed vector does not match its declared layout.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("cannot fit model: {0}")]
    Fit(String),

    #[error("dimension mismatch: expected {expected} values, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapSpaceError>;
