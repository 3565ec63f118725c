//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use riesgo::prelude::*;
//! ```

pub use crate::artifacts::{ArtifactBundle, LabelMapping, ModelArtifact, ModelFamily};
pub use crate::error::{Result, RiesgoError};
pub use crate::explain::{Explainer, Explanation, DEFAULT_TOP_N};
pub use crate::features::{
    canonical_feature_order, risk_level, wind_chill, DailyAggregates, FeatureRow, RiskLevel,
    FEATURE_NAMES,
};
pub use crate::linear_model::SoftmaxRegression;
pub use crate::predict::{PredictedLabel, Prediction, Predictor};
pub use crate::preprocessing::StandardScaler;
pub use crate::primitives::{Matrix, Vector};
pub use crate::service::PredictionService;
pub use crate::traits::ProbabilisticClassifier;
pub use crate::tree::DecisionTreeClassifier;
