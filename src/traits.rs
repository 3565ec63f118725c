//! Capability traits shared across model families.
//!
//! These traits define the API contracts the inference pipeline consumes,
//! independent of how a particular model family is implemented.

use crate::error::Result;
use crate::primitives::Vector;

/// Contract for classifiers that emit a class probability distribution.
///
/// Implementors guarantee that the returned distribution has `n_classes()`
/// entries, that every entry is non-negative, and that the entries sum to 1
/// up to floating-point tolerance.
///
/// # Examples
///
/// ```
/// use riesgo::prelude::*;
///
/// let x = Matrix::from_vec(4, 1, vec![-12.0, -11.0, 4.0, 5.0]).expect("valid matrix");
/// let y = vec![1, 1, 0, 0];
///
/// let mut tree = DecisionTreeClassifier::new();
/// tree.fit(&x, &y).expect("fit succeeds");
///
/// let proba = tree.predict_proba(&[-11.5]).expect("in-shape input");
/// assert_eq!(proba.len(), 2);
/// assert!((proba.sum() - 1.0).abs() < 1e-9);
/// ```
pub trait ProbabilisticClassifier {
    /// Number of classes the classifier was trained on (0 if not fitted).
    fn n_classes(&self) -> usize;

    /// Predicts the class probability distribution for a single sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the sample length
    /// does not match the training feature count.
    fn predict_proba(&self, features: &[f64]) -> Result<Vector<f64>>;
}
