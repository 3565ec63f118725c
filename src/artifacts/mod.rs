//! Trained-artifact bundle: loading, saving, and capability dispatch.
//!
//! An [`ArtifactBundle`] is the immutable set of trained objects consumed at
//! inference time: a classifier, an optional scaler, the label↔code mapping,
//! and the feature-name order. It is created once by an offline training
//! job, loaded read-only at service start, and never mutated afterward —
//! request handling receives it by reference instead of going through
//! process-wide caches.
//!
//! # On-disk layout
//!
//! A bundle is a named directory of serialized objects:
//!
//! ```text
//! models/
//! ├── tree.model          # bincode classifier (tree family)
//! ├── linear.model        # bincode classifier (linear family)
//! ├── scaler.model        # bincode StandardScaler (optional)
//! ├── risk_mapping.json   # label -> code mapping (mandatory)
//! └── feature_names.json  # ordered feature names (optional)
//! ```
//!
//! The classifier and mapping are mandatory; a missing feature-name file
//! falls back to the canonical order, and a missing scaler degrades the
//! linear family to raw passthrough. Both fallbacks are documented
//! behavior, not errors.

use crate::error::{Result, RiesgoError};
use crate::features::{canonical_feature_order, RiskLevel};
use crate::linear_model::SoftmaxRegression;
use crate::preprocessing::StandardScaler;
use crate::primitives::Vector;
use crate::traits::ProbabilisticClassifier;
use crate::tree::DecisionTreeClassifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[cfg(test)]
mod tests;

/// File name of the scaler artifact.
pub const SCALER_FILE: &str = "scaler.model";
/// File name of the label mapping artifact.
pub const RISK_MAPPING_FILE: &str = "risk_mapping.json";
/// File name of the feature order artifact.
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";

/// The two supported model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Decision-tree classifier; attribution decomposes the decision path.
    Tree,
    /// Softmax regression over standardized inputs; attribution goes
    /// through the linear fallback ladder.
    Linear,
}

impl ModelFamily {
    /// The family's selector string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModelFamily::Tree => "tree",
            ModelFamily::Linear => "linear",
        }
    }

    /// File name of this family's classifier artifact.
    #[must_use]
    pub fn artifact_file(self) -> &'static str {
        match self {
            ModelFamily::Tree => "tree.model",
            ModelFamily::Linear => "linear.model",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = RiesgoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tree" => Ok(ModelFamily::Tree),
            "linear" => Ok(ModelFamily::Linear),
            other => Err(format!("unknown model family: {other}").into()),
        }
    }
}

/// Bijection between risk labels and the contiguous integer codes the
/// classifier was trained with.
///
/// The mapping may cover fewer classes than the classifier emits when some
/// levels were absent from the training data; the predictor resolves
/// uncovered class indices to the `Unknown` sentinel instead of erroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMapping {
    codes: BTreeMap<RiskLevel, usize>,
}

impl LabelMapping {
    /// The canonical full mapping: Low = 0, Moderate = 1, High = 2.
    #[must_use]
    pub fn full() -> Self {
        Self::from_labels(&RiskLevel::ALL)
    }

    /// Builds a contiguous mapping from the labels present in training
    /// data, coded in canonical severity order.
    #[must_use]
    pub fn from_labels(labels: &[RiskLevel]) -> Self {
        let mut present: Vec<RiskLevel> = labels.to_vec();
        present.sort();
        present.dedup();
        Self {
            codes: present
                .into_iter()
                .enumerate()
                .map(|(code, label)| (label, code))
                .collect(),
        }
    }

    /// The code a label was trained as.
    #[must_use]
    pub fn code(&self, label: RiskLevel) -> Option<usize> {
        self.codes.get(&label).copied()
    }

    /// Inverse lookup: the label behind a class code.
    #[must_use]
    pub fn label_for(&self, code: usize) -> Option<RiskLevel> {
        self.codes
            .iter()
            .find(|(_, &c)| c == code)
            .map(|(&label, _)| label)
    }

    /// Number of labels covered by the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if the mapping covers no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// A trained classifier of either family.
///
/// Carries its own family tag so that dispatch is a match on capability,
/// not a string comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelArtifact {
    /// Tree-family classifier
    Tree(DecisionTreeClassifier),
    /// Linear-family classifier
    Linear(SoftmaxRegression),
}

impl ModelArtifact {
    /// The family this model belongs to.
    #[must_use]
    pub fn family(&self) -> ModelFamily {
        match self {
            ModelArtifact::Tree(_) => ModelFamily::Tree,
            ModelArtifact::Linear(_) => ModelFamily::Linear,
        }
    }
}

impl ProbabilisticClassifier for ModelArtifact {
    fn n_classes(&self) -> usize {
        match self {
            ModelArtifact::Tree(model) => model.n_classes(),
            ModelArtifact::Linear(model) => model.n_classes(),
        }
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vector<f64>> {
        match self {
            ModelArtifact::Tree(model) => model.predict_proba(features),
            ModelArtifact::Linear(model) => model.predict_proba(features),
        }
    }
}

/// The immutable set of trained objects consumed at inference time.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    model: ModelArtifact,
    scaler: Option<StandardScaler>,
    label_mapping: LabelMapping,
    feature_order: Vec<String>,
}

impl ArtifactBundle {
    /// Assembles a bundle from already-loaded parts.
    #[must_use]
    pub fn new(
        model: ModelArtifact,
        scaler: Option<StandardScaler>,
        label_mapping: LabelMapping,
        feature_order: Vec<String>,
    ) -> Self {
        Self {
            model,
            scaler,
            label_mapping,
            feature_order,
        }
    }

    /// Loads a bundle for the given family from a directory of artifacts.
    ///
    /// The classifier and label mapping are mandatory. A missing
    /// feature-name artifact falls back to the canonical order; for the
    /// linear family a missing scaler artifact means raw features pass
    /// through unscaled.
    ///
    /// # Errors
    ///
    /// Returns [`RiesgoError::ArtifactMissing`] when the classifier or
    /// label mapping cannot be found, and I/O or serialization errors when
    /// present artifacts cannot be read.
    pub fn load<P: AsRef<Path>>(dir: P, family: ModelFamily) -> Result<Self> {
        let dir = dir.as_ref();

        let model_path = dir.join(family.artifact_file());
        if !model_path.exists() {
            return Err(RiesgoError::artifact_missing(model_path.display().to_string()));
        }
        let model = match family {
            ModelFamily::Tree => ModelArtifact::Tree(DecisionTreeClassifier::load(&model_path)?),
            ModelFamily::Linear => ModelArtifact::Linear(SoftmaxRegression::load(&model_path)?),
        };

        let mapping_path = dir.join(RISK_MAPPING_FILE);
        if !mapping_path.exists() {
            return Err(RiesgoError::artifact_missing(
                mapping_path.display().to_string(),
            ));
        }
        let label_mapping: LabelMapping = serde_json::from_slice(&fs::read(&mapping_path)?)
            .map_err(|e| RiesgoError::Serialization(format!("invalid label mapping: {e}")))?;

        let names_path = dir.join(FEATURE_NAMES_FILE);
        let feature_order = if names_path.exists() {
            serde_json::from_slice(&fs::read(&names_path)?)
                .map_err(|e| RiesgoError::Serialization(format!("invalid feature names: {e}")))?
        } else {
            canonical_feature_order()
        };

        // The linear family trains on standardized input; its scaler is
        // optional and its absence degrades to raw passthrough.
        let scaler = match family {
            ModelFamily::Linear => {
                let scaler_path = dir.join(SCALER_FILE);
                if scaler_path.exists() {
                    Some(StandardScaler::load(&scaler_path)?)
                } else {
                    None
                }
            }
            ModelFamily::Tree => None,
        };

        Ok(Self::new(model, scaler, label_mapping, feature_order))
    }

    /// Writes the bundle's artifacts to a directory, creating it if needed.
    ///
    /// Produces the exact layout [`ArtifactBundle::load`] consumes, so the
    /// offline training job round-trips through the loader's format.
    ///
    /// # Errors
    ///
    /// Returns an error if any artifact cannot be serialized or written.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        match &self.model {
            ModelArtifact::Tree(model) => model.save(dir.join(ModelFamily::Tree.artifact_file()))?,
            ModelArtifact::Linear(model) => {
                model.save(dir.join(ModelFamily::Linear.artifact_file()))?;
            }
        }

        if let Some(scaler) = &self.scaler {
            scaler.save(dir.join(SCALER_FILE))?;
        }

        let mapping = serde_json::to_vec_pretty(&self.label_mapping)
            .map_err(|e| RiesgoError::Serialization(format!("label mapping: {e}")))?;
        fs::write(dir.join(RISK_MAPPING_FILE), mapping)?;

        let names = serde_json::to_vec_pretty(&self.feature_order)
            .map_err(|e| RiesgoError::Serialization(format!("feature names: {e}")))?;
        fs::write(dir.join(FEATURE_NAMES_FILE), names)?;

        Ok(())
    }

    /// The loaded classifier.
    #[must_use]
    pub fn model(&self) -> &ModelArtifact {
        &self.model
    }

    /// The family of the loaded classifier.
    #[must_use]
    pub fn family(&self) -> ModelFamily {
        self.model.family()
    }

    /// The fitted scaler, if one was trained and persisted.
    #[must_use]
    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    /// The label↔code mapping the classifier was trained with.
    #[must_use]
    pub fn label_mapping(&self) -> &LabelMapping {
        &self.label_mapping
    }

    /// The feature order the classifier was trained with.
    #[must_use]
    pub fn feature_order(&self) -> &[String] {
        &self.feature_order
    }

    /// Number of features the bundle expects per sample.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_order.len()
    }
}
