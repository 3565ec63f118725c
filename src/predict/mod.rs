//! Prediction over a loaded artifact bundle.
//!
//! The predictor densifies a feature row into the bundle's trained order,
//! applies the scaler when the linear family expects standardized input,
//! and derives the predicted label and confidence from the classifier's
//! probability distribution.

use crate::artifacts::{ArtifactBundle, ModelFamily};
use crate::error::{Result, RiesgoError};
use crate::features::{FeatureRow, RiskLevel};
use crate::primitives::Vector;
use crate::traits::ProbabilisticClassifier;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;


/// The outcome label of a prediction.
///
/// The label mapping may cover fewer classes than the classifier emits
/// (levels absent from the training data); a class index outside the
/// mapping resolves to `Unknown` instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictedLabel {
    /// A risk level covered by the label mapping.
    Known(RiskLevel),
    /// The classifier emitted a class the mapping does not cover.
    Unknown,
}

impl PredictedLabel {
    /// The label string, `"Unknown"` for the sentinel.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PredictedLabel::Known(level) => level.as_str(),
            PredictedLabel::Unknown => "Unknown",
        }
    }

    /// Returns the covered risk level, if any.
    #[must_use]
    pub fn known(self) -> Option<RiskLevel> {
        match self {
            PredictedLabel::Known(level) => Some(level),
            PredictedLabel::Unknown => None,
        }
    }
}

impl fmt::Display for PredictedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RiskLevel> for PredictedLabel {
    fn from(level: RiskLevel) -> Self {
        PredictedLabel::Known(level)
    }
}

impl Serialize for PredictedLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PredictedLabel {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        struct LabelVisitor;

        impl Visitor<'_> for LabelVisitor {
            type Value = PredictedLabel;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a risk level string or \"Unknown\"")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Self::Value, E> {
                if value == "Unknown" {
                    return Ok(PredictedLabel::Unknown);
                }
                value
                    .parse::<RiskLevel>()
                    .map(PredictedLabel::Known)
                    .map_err(|_| E::unknown_variant(value, &["Low", "Moderate", "High", "Unknown"]))
            }
        }

        deserializer.deserialize_str(LabelVisitor)
    }
}

/// Result of a single classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted risk label, or `Unknown` when the class is unmapped
    pub label: PredictedLabel,
    /// Probability mass of the predicted class
    pub confidence: f64,
    /// Index of the predicted class in the distribution
    pub class_index: usize,
    /// Full probability distribution over classes
    pub distribution: Vector<f64>,
    /// The vector the classifier actually consumed (post-scaling)
    pub model_input: Vec<f64>,
}

/// Classifies feature rows against an immutable artifact bundle.
///
/// Pure function of (bundle, row): carries no state of its own and never
/// mutates the bundle, so concurrent use is safe.
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    bundle: &'a ArtifactBundle,
}

impl<'a> Predictor<'a> {
    /// Creates a predictor over a loaded bundle.
    #[must_use]
    pub fn new(bundle: &'a ArtifactBundle) -> Self {
        Self { bundle }
    }

    /// Densifies a feature row following the bundle's feature order.
    ///
    /// Names in the order that are absent from the row default to 0; names
    /// in the row that are not part of the order are ignored.
    #[must_use]
    pub fn vector_from_row(&self, row: &FeatureRow) -> Vec<f64> {
        row.to_vector(self.bundle.feature_order())
    }

    /// Classifies a named feature row.
    ///
    /// # Errors
    ///
    /// Propagates classifier failures; see [`Predictor::predict_vector`].
    pub fn predict_row(&self, row: &FeatureRow) -> Result<Prediction> {
        self.predict_vector(self.vector_from_row(row))
    }

    /// Classifies an ordered feature vector.
    ///
    /// The vector must follow the bundle's feature order. Scaling is
    /// applied iff the bundle is linear-family and carries a fitted scaler;
    /// otherwise the vector passes through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RiesgoError::InputShape`] when the vector length does not
    /// match the bundle's feature order, and propagates classifier errors.
    pub fn predict_vector(&self, features: Vec<f64>) -> Result<Prediction> {
        let expected = self.bundle.n_features();
        if features.len() != expected {
            return Err(RiesgoError::InputShape {
                expected,
                actual: features.len(),
            });
        }

        let model_input = self.scale(features)?;
        let distribution = self.bundle.model().predict_proba(&model_input)?;

        if distribution.iter().any(|p| !p.is_finite()) {
            return Err("classifier returned a non-finite probability".into());
        }

        let class_index = distribution
            .argmax()
            .ok_or_else(|| RiesgoError::from("classifier returned an empty distribution"))?;
        let confidence = distribution[class_index];
        let label = self
            .bundle
            .label_mapping()
            .label_for(class_index)
            .map_or(PredictedLabel::Unknown, PredictedLabel::Known);

        Ok(Prediction {
            label,
            confidence,
            class_index,
            distribution,
            model_input,
        })
    }

    /// Applies the bundle's scaler when the model family expects it.
    fn scale(&self, features: Vec<f64>) -> Result<Vec<f64>> {
        match (self.bundle.family(), self.bundle.scaler()) {
            (ModelFamily::Linear, Some(scaler)) if scaler.is_fitted() => {
                scaler.transform_row(&features)
            }
            _ => Ok(features),
        }
    }
}
