//! Principal component transform over row-observations.
//!
//! Fitting runs a thin SVD of the centered (optionally standardized) data
//! matrix; the right singular vectors are the loadings, ranked by
//! descending singular value.

use nalgebra::{DMatrix, SVD};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::error::{MapSpaceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FitOptions {
    /// Divide every feature by its standard deviation after centering.
    pub scale: bool,
    /// Keep at most this many components; all of `min(n, p)` otherwise.
    pub max_components: Option<usize>,
}

/// Serialized form: `means`, optional `stdevs`, one loading row per
/// component and the matching eigenvalues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pca {
    pub center: bool,
    pub scale: bool,
    pub means: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdevs: Option<Vec<f64>>,
    pub loadings: Vec<Vec<f64>>,
    pub eigenvalues: Vec<f64>,
}

impl Pca {
    pub fn fit(rows: &[Vec<f64>], options: FitOptions) -> Result<Self> {
        let n = rows.len();
        let p = rows
            .first()
            .map(|r| r.len())
            .ok_or_else(|| MapSpaceError::Fit("dataset has no rows".into()))?;
        if p == 0 {
            return Err(MapSpaceError::Fit("rows have no features".into()));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != p) {
            return Err(MapSpaceError::Fit(format!(
                "row {i} has {} values, row 0 has {p}",
                row.len()
            )));
        }

        let mut x = DMatrix::from_fn(n, p, |r, c| rows[r][c]);

        let means: Vec<f64> = (0..p).map(|c| x.column(c).mean()).collect();
        for c in 0..p {
            x.column_mut(c).add_scalar_mut(-means[c]);
        }

        let stdevs = if options.scale {
            let denom = (n.max(2) - 1) as f64;
            let sd: Vec<f64> = (0..p)
                .map(|c| {
                    let s = (x.column(c).norm_squared() / denom).sqrt();
                    // constant features stay unscaled
                    if s > f64::EPSILON { s } else { 1.0 }
                })
                .collect();
            for c in 0..p {
                x.column_mut(c).unscale_mut(sd[c]);
            }
            Some(sd)
        } else {
            None
        };

        let svd = SVD::try_new(x, false, true, f64::EPSILON, 0)
            .ok_or_else(|| MapSpaceError::Fit("SVD did not converge".into()))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| MapSpaceError::Fit("SVD produced no right singular vectors".into()))?;

        let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
        order.sort_by(|&a, &b| {
            svd.singular_values[b]
                .partial_cmp(&svd.singular_values[a])
                .unwrap_or(Ordering::Equal)
        });
        if let Some(max) = options.max_components {
            if max == 0 {
                return Err(MapSpaceError::Fit("max_components must be at least 1".into()));
            }
            order.truncate(max);
        }

        let denom = if n > 1 { (n - 1) as f64 } else { 1.0 };
        let mut loadings = Vec::with_capacity(order.len());
        let mut eigenvalues = Vec::with_capacity(order.len());
        for &k in &order {
            let mut row: Vec<f64> = v_t.row(k).iter().copied().collect();
            orient(&mut row);
            loadings.push(row);
            let s = svd.singular_values[k];
            eigenvalues.push(s * s / denom);
        }

        debug!(
            observations = n,
            features = p,
            components = loadings.len(),
            "fitted principal components"
        );

        Ok(Self {
            center: true,
            scale: options.scale,
            means,
            stdevs,
            loadings,
            eigenvalues,
        })
    }

    pub fn feature_count(&self) -> usize {
        self.means.len()
    }

    pub fn component_count(&self) -> usize {
        self.loadings.len()
    }

    /// Check the internal shape after deserialization.
    pub fn validate(&self) -> Result<()> {
        let p = self.feature_count();
        if self.loadings.is_empty() {
            return Err(MapSpaceError::InvalidModel("no components".into()));
        }
        if self.loadings.len() != self.eigenvalues.len() {
            return Err(MapSpaceError::InvalidModel(format!(
                "{} loadings but {} eigenvalues",
                self.loadings.len(),
                self.eigenvalues.len()
            )));
        }
        if let Some(i) = self.loadings.iter().position(|l| l.len() != p) {
            return Err(MapSpaceError::InvalidModel(format!(
                "loading {i} does not have {p} features"
            )));
        }
        match &self.stdevs {
            Some(sd) if self.scale && sd.len() != p => Err(MapSpaceError::InvalidModel(
                "stdevs do not match feature count".into(),
            )),
            None if self.scale => Err(MapSpaceError::InvalidModel(
                "scaled model without stdevs".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Forward projection of one observation onto every component.
    pub fn predict(&self, vector: &[f64]) -> Result<Vec<f64>> {
        let p = self.feature_count();
        if vector.len() != p {
            return Err(MapSpaceError::DimensionMismatch {
                expected: p,
                got: vector.len(),
            });
        }

        let standardized: Vec<f64> = (0..p).map(|i| self.to_model_space(i, vector[i])).collect();
        Ok(self
            .loadings
            .iter()
            .map(|l| l.iter().zip(&standardized).map(|(a, b)| a * b).sum())
            .collect())
    }

    /// Reconstruction from the first `reduced.len()` components; the rest
    /// are held at zero, i.e. at the mean.
    pub fn invert(&self, reduced: &[f64]) -> Result<Vec<f64>> {
        if reduced.len() > self.component_count() {
            return Err(MapSpaceError::DimensionMismatch {
                expected: self.component_count(),
                got: reduced.len(),
            });
        }

        let p = self.feature_count();
        let mut out = vec![0.0; p];
        for (z, loading) in reduced.iter().zip(&self.loadings) {
            for (o, l) in out.iter_mut().zip(loading) {
                *o += z * l;
            }
        }
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.from_model_space(i, *o);
        }
        Ok(out)
    }

    /// Share of total variance carried by each component.
    pub fn explained_variance(&self) -> Vec<f64> {
        let total: f64 = self.eigenvalues.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.eigenvalues.len()];
        }
        self.eigenvalues.iter().map(|e| e / total).collect()
    }

    pub fn cumulative_variance(&self) -> Vec<f64> {
        self.explained_variance()
            .iter()
            .scan(0.0, |acc, v| {
                *acc += v;
                Some(*acc)
            })
            .collect()
    }

    #[inline]
    fn to_model_space(&self, i: usize, v: f64) -> f64 {
        let centered = if self.center { v - self.means[i] } else { v };
        match &self.stdevs {
            Some(sd) if self.scale => centered / sd[i],
            _ => centered,
        }
    }

    #[inline]
    fn from_model_space(&self, i: usize, v: f64) -> f64 {
        let unscaled = match &self.stdevs {
            Some(sd) if self.scale => v * sd[i],
            _ => v,
        };
        if self.center { unscaled + self.means[i] } else { unscaled }
    }
}

/// Flip a loading so its largest-magnitude entry is positive.
fn orient(loading: &mut [f64]) {
    let pivot = loading
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    if pivot < 0.0 {
        loading.iter_mut().for_each(|v| *v = -*v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Points spread along the line y = 2x with a little noise in y.
    fn line_rows() -> Vec<Vec<f64>> {
        (0..8)
            .map(|i| {
                let x = i as f64;
                let noise = if i % 2 == 0 { 0.05 } else { -0.05 };
                vec![x, 2.0 * x + noise]
            })
            .collect()
    }

    #[test]
    fn test_first_component_follows_the_line() {
        let pca = Pca::fit(&line_rows(), FitOptions::default()).unwrap();
        assert_eq!(pca.component_count(), 2);

        let l = &pca.loadings[0];
        let norm = 5f64.sqrt();
        assert_relative_eq!(l[0], 1.0 / norm, epsilon = 1e-2);
        assert_relative_eq!(l[1], 2.0 / norm, epsilon = 1e-2);
        assert!(pca.eigenvalues[0] > pca.eigenvalues[1]);
    }

    #[test]
    fn test_predict_invert_full_rank_is_identity() {
        let rows = line_rows();
        let pca = Pca::fit(&rows, FitOptions::default()).unwrap();
        for row in &rows {
            let z = pca.predict(row).unwrap();
            let back = pca.invert(&z).unwrap();
            assert_relative_eq!(back[0], row[0], epsilon = 1e-9);
            assert_relative_eq!(back[1], row[1], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_empty_reduced_vector_gives_mean() {
        let pca = Pca::fit(&line_rows(), FitOptions::default()).unwrap();
        let back = pca.invert(&[]).unwrap();
        assert_relative_eq!(back[0], 3.5, epsilon = 1e-12);
        assert_relative_eq!(back[1], 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scaled_fit_round_trips() {
        let rows = vec![
            vec![1.0, 100.0, 3.0],
            vec![2.0, 300.0, 3.0],
            vec![4.0, 200.0, 3.0],
            vec![3.0, 500.0, 3.0],
        ];
        let options = FitOptions {
            scale: true,
            max_components: None,
        };
        let pca = Pca::fit(&rows, options).unwrap();
        pca.validate().unwrap();
        for row in &rows {
            let back = pca.invert(&pca.predict(row).unwrap()).unwrap();
            for (a, b) in back.iter().zip(row) {
                assert_relative_eq!(a, b, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_max_components_caps_basis() {
        let options = FitOptions {
            scale: false,
            max_components: Some(1),
        };
        let pca = Pca::fit(&line_rows(), options).unwrap();
        assert_eq!(pca.component_count(), 1);
    }

    #[test]
    fn test_zero_max_components_rejected() {
        let options = FitOptions {
            scale: false,
            max_components: Some(0),
        };
        let err = Pca::fit(&line_rows(), options).unwrap_err();
        assert!(matches!(err, MapSpaceError::Fit(_)), "got {err}");
    }

    #[test]
    fn test_explained_variance_descending() {
        let pca = Pca::fit(&line_rows(), FitOptions::default()).unwrap();
        let ev = pca.explained_variance();
        assert!(ev[0] >= ev[1]);
        let cumulative = pca.cumulative_variance();
        assert_relative_eq!(*cumulative.last().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        let err = Pca::fit(&rows, FitOptions::default()).unwrap_err();
        assert!(matches!(err, MapSpaceError::Fit(_)), "got {err}");
    }

    #[test]
    fn test_empty_rows_rejected() {
        assert!(matches!(
            Pca::fit(&[], FitOptions::default()),
            Err(MapSpaceError::Fit(_))
        ));
    }

    #[test]
    fn test_invert_rejects_too_many_components() {
        let pca = Pca::fit(&line_rows(), FitOptions::default()).unwrap();
        assert!(matches!(
            pca.invert(&[0.0, 0.0, 0.0]),
            Err(MapSpaceError::DimensionMismatch { expected: 2, got: 3 })
        ));
    }
}
