//! Linear classification models.
//!
//! Implements multinomial (softmax) logistic regression, the crate's
//! "linear" model family. The model carries one coefficient row per class,
//! which the explainer consumes for coefficient-based attribution.
//!
//! # Example
//!
//! ```
//! use riesgo::linear_model::SoftmaxRegression;
//! use riesgo::prelude::*;
//!
//! let x = Matrix::from_vec(4, 1, vec![-2.0, -1.0, 1.0, 2.0]).expect("valid matrix");
//! let y = vec![0, 0, 1, 1];
//!
//! let mut model = SoftmaxRegression::new()
//!     .with_learning_rate(0.5)
//!     .with_max_iter(2000);
//! model.fit(&x, &y).expect("training data is valid");
//!
//! let proba = model.predict_proba(&[2.0]).expect("in-shape input");
//! assert!(proba[1] > proba[0]);
//! ```

use crate::error::{Result, RiesgoError};
use crate::primitives::{Matrix, Vector};
use crate::traits::ProbabilisticClassifier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;


/// Multinomial logistic regression trained with batch gradient descent on
/// the cross-entropy loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxRegression {
    /// Per-class coefficient rows (n_classes × n_features)
    coefficients: Option<Matrix<f64>>,
    /// Per-class intercept terms
    intercepts: Option<Vector<f64>>,
    /// Learning rate for gradient descent
    learning_rate: f64,
    /// Maximum number of iterations
    max_iter: usize,
    /// Convergence tolerance on gradient magnitude
    tol: f64,
}

impl Default for SoftmaxRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftmaxRegression {
    /// Creates a new softmax regression classifier with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercepts: None,
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-4,
        }
    }

    /// Sets the learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Per-class coefficient matrix (n_classes × n_features), if fitted.
    #[must_use]
    pub fn coefficients(&self) -> Option<&Matrix<f64>> {
        self.coefficients.as_ref()
    }

    /// Per-class intercepts, if fitted.
    #[must_use]
    pub fn intercepts(&self) -> Option<&Vector<f64>> {
        self.intercepts.as_ref()
    }

    /// Numerically stable softmax over class scores.
    fn softmax(scores: &[f64]) -> Vec<f64> {
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|&z| (z - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }

    /// Class scores z_c = w_c · x + b_c for one sample.
    fn scores(coef: &Matrix<f64>, intercepts: &Vector<f64>, x: &[f64]) -> Vec<f64> {
        let (n_classes, n_features) = coef.shape();
        let mut scores = Vec::with_capacity(n_classes);
        for c in 0..n_classes {
            let mut z = intercepts[c];
            for j in 0..n_features {
                z += coef.get(c, j) * x[j];
            }
            scores.push(z);
        }
        scores
    }

    /// Fits the model to training data.
    ///
    /// # Arguments
    ///
    /// * `x` - Feature matrix (`n_samples` × `n_features`)
    /// * `y` - Class labels (`n_samples`), contiguous codes starting at 0
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions mismatch, the data is empty, or the
    /// labels do not form at least two classes.
    pub fn fit(&mut self, x: &Matrix<f64>, y: &[usize]) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if n_samples != y.len() {
            return Err("Number of samples in X and y must match".into());
        }
        if n_samples == 0 {
            return Err("Cannot fit with zero samples".into());
        }

        let n_classes = y.iter().max().copied().unwrap_or(0) + 1;
        if n_classes < 2 {
            return Err("Need at least 2 classes for classification".into());
        }

        let mut coef = Matrix::zeros(n_classes, n_features);
        let mut intercepts = Vector::zeros(n_classes);

        for _ in 0..self.max_iter {
            let mut coef_grad = Matrix::zeros(n_classes, n_features);
            let mut intercept_grad = Vector::zeros(n_classes);

            for i in 0..n_samples {
                let row = x.row_slice(i);
                let probas = Self::softmax(&Self::scores(&coef, &intercepts, row));

                for c in 0..n_classes {
                    // dL/dz_c = p_c - 1{y == c}
                    let error = probas[c] - if y[i] == c { 1.0 } else { 0.0 };
                    intercept_grad[c] += error;
                    for j in 0..n_features {
                        coef_grad.set(c, j, coef_grad.get(c, j) + error * row[j]);
                    }
                }
            }

            let n = n_samples as f64;
            let mut max_grad: f64 = 0.0;
            for c in 0..n_classes {
                let ig = intercept_grad[c] / n;
                intercepts[c] -= self.learning_rate * ig;
                max_grad = max_grad.max(ig.abs());
                for j in 0..n_features {
                    let g = coef_grad.get(c, j) / n;
                    coef.set(c, j, coef.get(c, j) - self.learning_rate * g);
                    max_grad = max_grad.max(g.abs());
                }
            }

            if max_grad < self.tol {
                break;
            }
        }

        self.coefficients = Some(coef);
        self.intercepts = Some(intercepts);
        Ok(())
    }

    /// Predicts class labels for samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or dimensions mismatch.
    pub fn predict(&self, x: &Matrix<f64>) -> Result<Vec<usize>> {
        let (n_samples, _) = x.shape();
        let mut predictions = Vec::with_capacity(n_samples);
        for i in 0..n_samples {
            let proba = self.predict_proba(x.row_slice(i))?;
            predictions.push(proba.argmax().unwrap_or(0));
        }
        Ok(predictions)
    }

    /// Computes accuracy on test data.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or dimensions mismatch.
    pub fn score(&self, x: &Matrix<f64>, y: &[usize]) -> Result<f64> {
        let predictions = self.predict(x)?;
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(pred, truth)| pred == truth)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }

    /// Saves the trained model to a binary file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| RiesgoError::Serialization(format!("model serialization failed: {e}")))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Loads a model from a binary file.
    ///
    /// # Errors
    ///
    /// Returns an error if file reading or deserialization fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        bincode::deserialize(&bytes)
            .map_err(|e| RiesgoError::Serialization(format!("model deserialization failed: {e}")))
    }
}

impl ProbabilisticClassifier for SoftmaxRegression {
    fn n_classes(&self) -> usize {
        self.coefficients.as_ref().map_or(0, |c| c.n_rows())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vector<f64>> {
        let coef = self
            .coefficients
            .as_ref()
            .ok_or_else(|| RiesgoError::from("Model not fitted"))?;
        let intercepts = self
            .intercepts
            .as_ref()
            .ok_or_else(|| RiesgoError::from("Model not fitted"))?;

        if features.len() != coef.n_cols() {
            return Err(RiesgoError::InputShape {
                expected: coef.n_cols(),
                actual: features.len(),
            });
        }

        let probas = Self::softmax(&Self::scores(coef, intercepts, features));
        Ok(Vector::from_vec(probas))
    }
}
