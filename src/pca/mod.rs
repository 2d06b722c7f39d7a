//! Linear projection model over a map-vector dataset.
//!
//! A model carries the dataset it was fitted on, so a model file alone is
//! enough for predict/invert without the original space file.
pub mod transform;

pub use transform::{FitOptions, Pca};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MapSpaceError, Result};
use crate::model::Dataset;

#[derive(Debug, Clone)]
pub struct ProjectionModel {
    dataset: Dataset,
    pca: Pca,
    component_count: usize,
}

/// On-disk shape of a model file.
#[derive(Serialize, Deserialize)]
struct ModelFile {
    dataset: Dataset,
    pca: Pca,
}

impl ProjectionModel {
    pub fn fit(dataset: Dataset) -> Result<Self> {
        Self::fit_with(dataset, FitOptions::default())
    }

    /// Blocking fit over the whole dataset. Rows must all be as long as the
    /// dataset's declared ranges.
    pub fn fit_with(dataset: Dataset, options: FitOptions) -> Result<Self> {
        if dataset.data.is_empty() {
            return Err(MapSpaceError::Fit("dataset has no rows".into()));
        }
        let declared = dataset.dimensions();
        if let Some((i, row)) = dataset
            .data
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != declared)
        {
            return Err(MapSpaceError::Fit(format!(
                "row {i} has {} values, dimension ranges declare {declared}",
                row.len()
            )));
        }

        let pca = Pca::fit(&dataset.data, options)?;
        info!(
            rows = dataset.data.len(),
            features = declared,
            components = pca.component_count(),
            "model fitted"
        );
        Ok(Self::from_parts(dataset, pca))
    }

    fn from_parts(dataset: Dataset, pca: Pca) -> Self {
        let component_count = pca.component_count();
        Self {
            dataset,
            pca,
            component_count,
        }
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    pub fn feature_count(&self) -> usize {
        self.pca.feature_count()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn pca(&self) -> &Pca {
        &self.pca
    }

    /// Map vector → component coordinates.
    pub fn predict(&self, vector: &[f64]) -> Result<Vec<f64>> {
        self.pca.predict(vector)
    }

    /// Component coordinates → reconstructed map vector. Short inputs are
    /// zero-padded, which holds the missing components at the dataset mean.
    pub fn invert(&self, reduced: &[f64]) -> Result<Vec<f64>> {
        if reduced.len() > self.component_count {
            return Err(MapSpaceError::DimensionMismatch {
                expected: self.component_count,
                got: reduced.len(),
            });
        }
        let mut padded = reduced.to_vec();
        padded.resize(self.component_count, 0.0);
        self.pca.invert(&padded)
    }

    /// Best reconstruction of `vector` the model can express.
    pub fn project(&self, vector: &[f64]) -> Result<Vec<f64>> {
        self.invert(&self.predict(vector)?)
    }

    /// Reconstruction of `vector` through its first `components` coordinates.
    pub fn project_with(&self, vector: &[f64], components: usize) -> Result<Vec<f64>> {
        let mut reduced = self.predict(vector)?;
        reduced.truncate(components);
        self.invert(&reduced)
    }

    pub fn explained_variance(&self) -> Vec<f64> {
        self.pca.explained_variance()
    }

    pub fn cumulative_variance(&self) -> Vec<f64> {
        self.pca.cumulative_variance()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&ModelFile {
            dataset: self.dataset.clone(),
            pca: self.pca.clone(),
        })?)
    }

    /// Load a model document; the component count comes from the stored
    /// basis, not from any training-time setting.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json)?;
        file.pca.validate()?;
        if file.dataset.dimensions() != file.pca.feature_count() {
            return Err(MapSpaceError::InvalidModel(format!(
                "dataset declares {} dimensions, transform has {} features",
                file.dataset.dimensions(),
                file.pca.feature_count()
            )));
        }
        Ok(Self::from_parts(file.dataset, file.pca))
    }
}
