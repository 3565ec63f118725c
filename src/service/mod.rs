//! Request orchestration over the prediction and explanation pipeline.
//!
//! The service owns the immutable artifact bundle for the process lifetime
//! and exposes the single- and batch-request entry points consumed by the
//! serving layer. Batch processing isolates per-item failures: one bad row
//! never aborts the rest of the batch.

use crate::artifacts::{ArtifactBundle, ModelFamily};
use crate::error::Result;
use crate::explain::{Explainer, Explanation, DEFAULT_TOP_N};
use crate::features::FeatureRow;
use crate::predict::Predictor;
use log::warn;
use std::collections::BTreeMap;
use std::path::Path;


/// Orchestrates Predictor + Explainer for single and batch requests.
///
/// All operations are pure functions of the bundle and the input row; the
/// service carries no other cross-call state.
#[derive(Debug, Clone)]
pub struct PredictionService {
    bundle: ArtifactBundle,
    top_n: usize,
}

impl PredictionService {
    /// Creates a service over an already-loaded bundle.
    #[must_use]
    pub fn new(bundle: ArtifactBundle) -> Self {
        Self {
            bundle,
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Loads the bundle for `family` from an artifact directory.
    ///
    /// # Errors
    ///
    /// Propagates loader failures, notably
    /// [`crate::error::RiesgoError::ArtifactMissing`].
    pub fn from_dir<P: AsRef<Path>>(dir: P, family: ModelFamily) -> Result<Self> {
        Ok(Self::new(ArtifactBundle::load(dir, family)?))
    }

    /// Sets how many top driver features explanations name.
    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// The bundle the service was constructed with.
    #[must_use]
    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    /// Resolves a requested family against the loaded artifacts.
    ///
    /// When they disagree, the loaded bundle's family silently substitutes
    /// for the request — the request is overridden, not rejected. This
    /// reproduces the upstream compatibility behavior; a warning is logged
    /// because the override is an easy footgun.
    fn resolve_family(&self, requested: ModelFamily) -> ModelFamily {
        let loaded = self.bundle.family();
        if requested != loaded {
            warn!(
                "requested model family {requested} does not match loaded artifacts; using {loaded}"
            );
        }
        loaded
    }

    /// Predicts and explains a single feature row.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::error::RiesgoError::Explanation`],
    /// [`crate::error::RiesgoError::ArtifactMissing`], and
    /// [`crate::error::RiesgoError::InputShape`]
    /// to the caller.
    pub fn explain_one(&self, row: &FeatureRow, family: ModelFamily) -> Result<Explanation> {
        self.resolve_family(family);
        Explainer::new(&self.bundle)
            .with_top_n(self.top_n)
            .explain_row(row)
    }

    /// Predicts and explains a batch of feature rows.
    ///
    /// Returns one entry per input, in input order. A failure on one item
    /// is caught and logged; that position holds `None`; processing
    /// continues for the remaining items.
    #[must_use]
    pub fn explain_many(
        &self,
        rows: &[FeatureRow],
        family: ModelFamily,
    ) -> Vec<Option<Explanation>> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| match self.explain_one(row, family) {
                Ok(explanation) => Some(explanation),
                Err(e) => {
                    warn!("explanation failed for batch item {idx}: {e}");
                    None
                }
            })
            .collect()
    }

    /// Predicts and explains a row, degrading to a bare prediction when
    /// only the explanation fails.
    ///
    /// Prediction availability is prioritized over explanation
    /// availability: on explanation failure the result carries the direct
    /// prediction, the first top-N names of the feature order as reasons,
    /// and an empty attribution map, with a warning logged.
    ///
    /// # Errors
    ///
    /// Fails only when the prediction itself fails.
    pub fn assess(&self, row: &FeatureRow, family: ModelFamily) -> Result<Explanation> {
        match self.explain_one(row, family) {
            Ok(explanation) => Ok(explanation),
            Err(e) => {
                warn!("explanation failed: {e}; falling back to direct prediction");
                let prediction = Predictor::new(&self.bundle).predict_row(row)?;
                let top_reasons = self
                    .bundle
                    .feature_order()
                    .iter()
                    .take(self.top_n)
                    .cloned()
                    .collect();
                Ok(Explanation {
                    prediction: prediction.label,
                    confidence: prediction.confidence,
                    top_reasons,
                    attribution: BTreeMap::new(),
                })
            }
        }
    }
}
