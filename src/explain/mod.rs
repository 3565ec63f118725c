//! Per-feature attribution and explanation of predictions.
//!
//! The explainer computes a signed contribution for every feature toward
//! the predicted class and names the strongest drivers. Each model family
//! has its own attribution strategy:
//!
//! - **Tree family**: exact additive decomposition along the decision path
//!   (the change in the predicted class's probability at every split,
//!   attributed to the split feature). Attempted first and only.
//! - **Linear family**: an ordered fallback ladder — background-centered
//!   linear attribution, then coefficient×value, then uniform weights.
//!   Each tier runs only if the previous one failed; the terminal tier
//!   cannot fail, so explanation requests always succeed barring malformed
//!   numeric input.
//!
//! The ladder is an explicit ordered list of named strategies, not an
//! incidental chain of error handlers: the order is part of the contract.
//!
//! # Example
//!
//! ```
//! use riesgo::prelude::*;
//!
//! let x = Matrix::from_vec(4, 2, vec![
//!     -12.0, 4.0,
//!     -11.0, 5.0,
//!       4.0, 1.0,
//!       5.0, 1.0,
//! ]).expect("valid matrix");
//! let y = vec![1, 1, 0, 0];
//! let mut tree = DecisionTreeClassifier::new();
//! tree.fit(&x, &y).expect("fit succeeds");
//!
//! let bundle = ArtifactBundle::new(
//!     ModelArtifact::Tree(tree),
//!     None,
//!     LabelMapping::from_labels(&[RiskLevel::Low, RiskLevel::Moderate]),
//!     vec!["min_temp_c".to_string(), "mean_aqi".to_string()],
//! );
//!
//! let row: FeatureRow = [("min_temp_c", -11.5), ("mean_aqi", 4.5)].into_iter().collect();
//! let explanation = Explainer::new(&bundle).explain_row(&row).expect("explains");
//!
//! assert_eq!(explanation.prediction.as_str(), "Moderate");
//! assert_eq!(explanation.attribution.len(), 2);
//! ```

use crate::artifacts::{ArtifactBundle, ModelArtifact, ModelFamily};
use crate::error::{Result, RiesgoError};
use crate::features::FeatureRow;
use crate::predict::{PredictedLabel, Prediction, Predictor};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(test)]
mod tests;

/// Default number of top driver features named in an explanation.
pub const DEFAULT_TOP_N: usize = 3;

/// A prediction together with its per-feature attribution.
///
/// `top_reasons` is always a subsequence of `attribution`'s keys, ordered
/// by descending absolute contribution with original-feature-order
/// tie-break. The attribution map always covers every feature, independent
/// of how many reasons are surfaced.
///
/// Serializes to the wire contract consumed by the serving layer:
/// `prediction`, `confidence`, `top_reasons`, `shap_values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Predicted risk label, or `"Unknown"` for an unmapped class
    pub prediction: PredictedLabel,
    /// Probability mass of the predicted class, in [0, 1]
    pub confidence: f64,
    /// Up to N strongest drivers, most influential first
    pub top_reasons: Vec<String>,
    /// Signed contribution of every feature toward the predicted class
    #[serde(rename = "shap_values")]
    pub attribution: BTreeMap<String, f64>,
}

/// An attribution strategy: (bundle, model-input vector, predicted class)
/// to signed per-feature contributions.
type AttributionFn = fn(&ArtifactBundle, &[f64], usize) -> Result<Vec<f64>>;

/// The ordered attribution ladder for a model family.
///
/// The first strategy to succeed wins. The tree family has exactly one,
/// deliberately: path decomposition is exact, and anything else would be
/// less faithful. The linear ladder ends in a strategy that cannot fail.
fn strategies(family: ModelFamily) -> &'static [(&'static str, AttributionFn)] {
    match family {
        ModelFamily::Tree => &[("tree_path", tree_path_attribution)],
        ModelFamily::Linear => &[
            ("linear_background", linear_background_attribution),
            ("coefficient", coefficient_attribution),
            ("uniform", uniform_attribution),
        ],
    }
}

/// Exact decision-path decomposition for the tree family.
fn tree_path_attribution(bundle: &ArtifactBundle, x: &[f64], class: usize) -> Result<Vec<f64>> {
    match bundle.model() {
        ModelArtifact::Tree(model) => model.path_contributions(x, class),
        ModelArtifact::Linear(_) => {
            Err("tree attribution requires a tree-family model".into())
        }
    }
}

/// Linear attribution centered on a background expectation.
///
/// `attribution[i] = coef[class][i] * (x[i] - background[i])` where the
/// background is the scaler's fitted feature means passed through the
/// scaler itself (the expected input in model space). Without a fitted
/// scaler there is no background distribution to center on, and the tier
/// fails over to plain coefficient attribution.
fn linear_background_attribution(
    bundle: &ArtifactBundle,
    x: &[f64],
    class: usize,
) -> Result<Vec<f64>> {
    let ModelArtifact::Linear(model) = bundle.model() else {
        return Err("linear attribution requires a linear-family model".into());
    };
    let scaler = bundle
        .scaler()
        .filter(|s| s.is_fitted())
        .ok_or_else(|| RiesgoError::from("no background distribution available"))?;

    let coef = model
        .coefficients()
        .ok_or_else(|| RiesgoError::from("model has no fitted coefficients"))?;
    if class >= coef.n_rows() || x.len() != coef.n_cols() {
        return Err("coefficient shape does not match input".into());
    }

    let background = scaler.transform_row(scaler.mean())?;
    Ok((0..x.len())
        .map(|i| coef.get(class, i) * (x[i] - background[i]))
        .collect())
}

/// Coefficient×value attribution from the model's learned per-class
/// coefficients.
fn coefficient_attribution(bundle: &ArtifactBundle, x: &[f64], class: usize) -> Result<Vec<f64>> {
    let ModelArtifact::Linear(model) = bundle.model() else {
        return Err("coefficient attribution requires a linear-family model".into());
    };
    let coef = model
        .coefficients()
        .ok_or_else(|| RiesgoError::from("model has no fitted coefficients"))?;
    if class >= coef.n_rows() || x.len() != coef.n_cols() {
        return Err("coefficient shape does not match input".into());
    }

    Ok((0..x.len()).map(|i| coef.get(class, i) * x[i]).collect())
}

/// Terminal fallback: equal weight for every feature, ignoring model
/// internals entirely.
fn uniform_attribution(_bundle: &ArtifactBundle, x: &[f64], _class: usize) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err("empty feature vector".into());
    }
    Ok(vec![1.0 / x.len() as f64; x.len()])
}

/// Explains predictions over an immutable artifact bundle.
#[derive(Debug, Clone, Copy)]
pub struct Explainer<'a> {
    bundle: &'a ArtifactBundle,
    top_n: usize,
}

impl<'a> Explainer<'a> {
    /// Creates an explainer over a loaded bundle with the default top-N.
    #[must_use]
    pub fn new(bundle: &'a ArtifactBundle) -> Self {
        Self {
            bundle,
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Sets how many top driver features are named in `top_reasons`.
    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Predicts and explains a named feature row.
    ///
    /// # Errors
    ///
    /// Propagates prediction failures (`ArtifactMissing`, `InputShape`)
    /// unchanged; attribution failures surface as
    /// [`RiesgoError::Explanation`].
    pub fn explain_row(&self, row: &FeatureRow) -> Result<Explanation> {
        let prediction = Predictor::new(self.bundle).predict_row(row)?;
        self.explain_prediction(&prediction)
    }

    /// Predicts and explains an ordered feature vector.
    ///
    /// # Errors
    ///
    /// As for [`Explainer::explain_row`].
    pub fn explain_vector(&self, features: Vec<f64>) -> Result<Explanation> {
        let prediction = Predictor::new(self.bundle).predict_vector(features)?;
        self.explain_prediction(&prediction)
    }

    /// Explains an already-computed prediction.
    ///
    /// # Errors
    ///
    /// Returns [`RiesgoError::Explanation`] when attribution fails.
    pub fn explain_prediction(&self, prediction: &Prediction) -> Result<Explanation> {
        let values = self.attribute(&prediction.model_input, prediction.class_index)?;
        let order = self.bundle.feature_order();

        let top_reasons = top_reasons(&values, order, self.top_n);
        let attribution = order
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect();

        Ok(Explanation {
            prediction: prediction.label,
            confidence: prediction.confidence,
            top_reasons,
            attribution,
        })
    }

    /// Runs the family's attribution ladder for one model-input vector.
    ///
    /// Strategies are attempted strictly in order; the first success wins.
    /// Every failure short of the last is absorbed (and logged at debug
    /// level); exhausting the ladder or feeding it malformed numeric input
    /// is an [`RiesgoError::Explanation`].
    ///
    /// # Errors
    ///
    /// Returns [`RiesgoError::Explanation`] on non-finite input or when no
    /// strategy succeeds.
    pub fn attribute(&self, x: &[f64], class: usize) -> Result<Vec<f64>> {
        if x.iter().any(|v| !v.is_finite()) {
            return Err(RiesgoError::explanation("non-finite feature value"));
        }

        let family = self.bundle.family();
        let mut last_error = None;
        for (name, strategy) in strategies(family) {
            match strategy(self.bundle, x, class) {
                Ok(values) if values.len() == x.len() && values.iter().all(|v| v.is_finite()) => {
                    return Ok(values);
                }
                Ok(_) => {
                    debug!("attribution strategy {name} returned a malformed result");
                    last_error = Some(format!("{name}: malformed attribution result"));
                }
                Err(e) => {
                    debug!("attribution strategy {name} failed: {e}");
                    last_error = Some(format!("{name}: {e}"));
                }
            }
        }

        Err(RiesgoError::explanation(
            last_error.unwrap_or_else(|| "no attribution strategy available".to_string()),
        ))
    }
}

/// Names the strongest drivers: descending absolute contribution, ties
/// kept in original feature order, first `n` taken.
fn top_reasons(values: &[f64], order: &[String], n: usize) -> Vec<String> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    // stable sort: equal magnitudes keep declaration order
    indices.sort_by(|&a, &b| {
        values[b]
            .abs()
            .partial_cmp(&values[a].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
        .into_iter()
        .take(n)
        .map(|i| order[i].clone())
        .collect()
}
