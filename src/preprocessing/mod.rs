//! Preprocessing transformers for data standardization.
//!
//! The linear model family is trained on standardized inputs; the scaler
//! fitted at training time is persisted alongside the model and re-applied
//! at inference.
//!
//! # Example
//!
//! ```
//! use riesgo::preprocessing::StandardScaler;
//! use riesgo::primitives::Matrix;
//!
//! let data = Matrix::from_vec(3, 2, vec![
//!     0.0, 0.0,
//!     1.0, 10.0,
//!     2.0, 20.0,
//! ]).expect("valid matrix dimensions");
//!
//! let mut scaler = StandardScaler::new();
//! let scaled = scaler.fit_transform(&data).expect("fit_transform succeeds");
//!
//! // Each column now has mean ≈ 0
//! let (n_rows, n_cols) = scaled.shape();
//! for j in 0..n_cols {
//!     let mean: f64 = (0..n_rows).map(|i| scaled.get(i, j)).sum::<f64>() / n_rows as f64;
//!     assert!(mean.abs() < 1e-9);
//! }
//! ```

use crate::error::{Result, RiesgoError};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;


/// Variances below this floor are treated as constant features and left
/// unscaled.
const STD_FLOOR: f64 = 1e-10;

/// Standardizes features by removing the mean and scaling to unit variance.
///
/// The standard score of a sample x is: z = (x - mean) / std.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f64>>,
    /// Standard deviation of each feature (computed during fit).
    std: Option<Vec<f64>>,
    /// Whether to center the data (subtract mean).
    with_mean: bool,
    /// Whether to scale the data (divide by std).
    with_std: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Creates a new `StandardScaler` with centering and scaling enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
            with_mean: true,
            with_std: true,
        }
    }

    /// Sets whether to center the data by subtracting the mean.
    #[must_use]
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    /// Sets whether to scale the data by dividing by standard deviation.
    #[must_use]
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.with_std = with_std;
        self
    }

    /// Returns true if the scaler has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Returns the mean of each feature.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn mean(&self) -> &[f64] {
        self.mean
            .as_ref()
            .expect("Scaler not fitted. Call fit() first.")
    }

    /// Returns the standard deviation of each feature.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn std(&self) -> &[f64] {
        self.std
            .as_ref()
            .expect("Scaler not fitted. Call fit() first.")
    }

    /// Fits the scaler to data, computing per-feature mean and std.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is empty.
    pub fn fit(&mut self, x: &Matrix<f64>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples == 0 {
            return Err("Cannot fit scaler with zero samples".into());
        }

        let mut mean = vec![0.0; n_features];
        for i in 0..n_samples {
            for (j, m) in mean.iter_mut().enumerate() {
                *m += x.get(i, j);
            }
        }
        for m in &mut mean {
            *m /= n_samples as f64;
        }

        let mut std = vec![0.0; n_features];
        for i in 0..n_samples {
            for (j, s) in std.iter_mut().enumerate() {
                let diff = x.get(i, j) - mean[j];
                *s += diff * diff;
            }
        }
        for s in &mut std {
            *s = (*s / n_samples as f64).sqrt();
        }

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    /// Transforms a single sample using fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler is not fitted or the sample length
    /// does not match the fitted feature count.
    pub fn transform_row(&self, x: &[f64]) -> Result<Vec<f64>> {
        let mean = self
            .mean
            .as_ref()
            .ok_or_else(|| RiesgoError::from("Scaler not fitted"))?;
        let std = self
            .std
            .as_ref()
            .ok_or_else(|| RiesgoError::from("Scaler not fitted"))?;

        if x.len() != mean.len() {
            return Err(RiesgoError::InputShape {
                expected: mean.len(),
                actual: x.len(),
            });
        }

        let mut out = Vec::with_capacity(x.len());
        for (j, &val) in x.iter().enumerate() {
            let mut v = val;
            if self.with_mean {
                v -= mean[j];
            }
            if self.with_std && std[j] > STD_FLOOR {
                v /= std[j];
            }
            out.push(v);
        }
        Ok(out)
    }

    /// Transforms data using fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler is not fitted or dimensions mismatch.
    pub fn transform(&self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        let (n_samples, n_features) = x.shape();
        let mut result = Vec::with_capacity(n_samples * n_features);

        for i in 0..n_samples {
            result.extend(self.transform_row(x.row_slice(i))?);
        }

        Matrix::from_vec(n_samples, n_features, result).map_err(Into::into)
    }

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    pub fn fit_transform(&mut self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Saves the fitted scaler to a binary file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| RiesgoError::Serialization(format!("scaler serialization failed: {e}")))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Loads a scaler from a binary file.
    ///
    /// # Errors
    ///
    /// Returns an error if file reading or deserialization fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        bincode::deserialize(&bytes)
            .map_err(|e| RiesgoError::Serialization(format!("scaler deserialization failed: {e}")))
    }
}
