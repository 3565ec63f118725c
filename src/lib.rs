//! Riesgo: daily cold & air-quality risk classification with explainable
//! predictions, in pure Rust.
//!
//! Riesgo turns one location-day of weather/air-quality aggregates into a
//! discrete risk level (Low / Moderate / High) and a human-interpretable
//! explanation attributing the prediction to specific input factors. Two
//! model families sit behind one capability contract — a decision tree and
//! a softmax regression — each with its own attribution strategy and a
//! fallback ladder that keeps explanation requests from ever failing
//! outright.
//!
//! # Quick Start
//!
//! ```
//! use riesgo::prelude::*;
//!
//! // Derive features and rule labels for some training days
//! let days = [
//!     DailyAggregates { min_temp_c: -14.0, avg_temp_c: -8.0, wind_speed: 6.0, humidity: 80.0, mean_aqi: 3.0 },
//!     DailyAggregates { min_temp_c: -12.0, avg_temp_c: -6.0, wind_speed: 7.0, humidity: 78.0, mean_aqi: 4.0 },
//!     DailyAggregates { min_temp_c: -2.0, avg_temp_c: 3.0, wind_speed: 4.0, humidity: 70.0, mean_aqi: 2.0 },
//!     DailyAggregates { min_temp_c: -1.0, avg_temp_c: 4.0, wind_speed: 3.0, humidity: 72.0, mean_aqi: 2.0 },
//!     DailyAggregates { min_temp_c: 8.0, avg_temp_c: 14.0, wind_speed: 2.0, humidity: 60.0, mean_aqi: 1.0 },
//!     DailyAggregates { min_temp_c: 9.0, avg_temp_c: 15.0, wind_speed: 2.0, humidity: 55.0, mean_aqi: 1.0 },
//! ];
//! let order = canonical_feature_order();
//! let mut data = Vec::new();
//! let mut labels = Vec::new();
//! for day in &days {
//!     data.extend(day.to_row().to_vector(&order));
//!     labels.push(day.risk_level().code());
//! }
//! let x = Matrix::from_vec(days.len(), order.len(), data).expect("consistent dimensions");
//!
//! // Train the tree family and bundle the artifacts
//! let mut tree = DecisionTreeClassifier::new().with_max_depth(4);
//! tree.fit(&x, &labels).expect("training data is valid");
//! let bundle = ArtifactBundle::new(
//!     ModelArtifact::Tree(tree),
//!     None,
//!     LabelMapping::full(),
//!     order,
//! );
//!
//! // Classify and explain a new day
//! let service = PredictionService::new(bundle);
//! let today = DailyAggregates {
//!     min_temp_c: -13.0, avg_temp_c: -7.0, wind_speed: 6.5, humidity: 79.0, mean_aqi: 3.5,
//! };
//! let explanation = service
//!     .explain_one(&today.to_row(), ModelFamily::Tree)
//!     .expect("explanation succeeds");
//!
//! assert_eq!(explanation.prediction.as_str(), "High");
//! assert!(explanation.top_reasons.len() <= 3);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`features`]: Wind chill, rule-based risk labels, feature rows
//! - [`preprocessing`]: Data transformers (StandardScaler)
//! - [`tree`]: Decision tree classifier with path attribution
//! - [`linear_model`]: Softmax regression classifier
//! - [`artifacts`]: Trained-artifact bundle, loader and writer
//! - [`predict`]: Prediction over a loaded bundle
//! - [`explain`]: Per-feature attribution with fallback ladder
//! - [`service`]: Single and batch request orchestration

pub mod artifacts;
pub mod error;
pub mod explain;
pub mod features;
pub mod linear_model;
pub mod predict;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod service;
pub mod traits;
pub mod tree;

pub use error::{Result, RiesgoError};
pub use primitives::{Matrix, Vector};
pub use traits::ProbabilisticClassifier;
