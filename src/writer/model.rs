//! Model file output.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::pca::ProjectionModel;

/// Serialize the whole model first, then write it in one go, so a failed
/// serialization never leaves a partial file behind.
pub fn emit(model: &ProjectionModel, path: &Path) -> Result<()> {
    let json = model.to_json()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    info!(path = %path.display(), components = model.component_count(), "model written");
    Ok(())
}

pub fn load(path: &Path) -> Result<ProjectionModel> {
    let json = fs::read_to_string(path)?;
    ProjectionModel::from_json(&json)
}
