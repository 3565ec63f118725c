//! Feature derivation for daily weather/air-quality aggregates.
//!
//! This module implements the deterministic rules that turn raw daily
//! aggregates into model features and rule-based risk labels:
//!
//! - **Wind chill index**: adjusted felt-temperature combining temperature
//!   and wind speed.
//! - **Risk level rules**: fixed-priority thresholds over minimum
//!   temperature, mean AQI, and wind chill.
//!
//! # Example
//!
//! ```
//! use riesgo::features::{risk_level, wind_chill, RiskLevel};
//!
//! // Calm, mild day: wind chill is the identity passthrough.
//! assert_eq!(wind_chill(12.0, 3.0), 12.0);
//!
//! // Deep cold dominates the rule priority.
//! assert_eq!(risk_level(-12.0, 1.0, 0.0), RiskLevel::High);
//! ```

use crate::error::{Result, RiesgoError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;


/// Canonical feature schema, in training order.
///
/// The artifact bundle records the order its classifier was trained with;
/// this constant is the documented fallback when that artifact is absent.
pub const FEATURE_NAMES: [&str; 6] = [
    "min_temp_c",
    "avg_temp_c",
    "wind_speed",
    "humidity",
    "wind_chill",
    "mean_aqi",
];

/// Returns the canonical feature order as owned strings.
#[must_use]
pub fn canonical_feature_order() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect()
}

/// Discrete classification of combined cold/air-quality hazard.
///
/// Persisted and trained as an integer code; codes are contiguous starting
/// at 0 and match the classifier's internal class ordering
/// (Low = 0, Moderate = 1, High = 2).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RiskLevel {
    /// No cold or air-quality hazard.
    Low,
    /// Elevated hazard: freezing temperatures, poor air, or notable chill.
    Moderate,
    /// Dangerous hazard: deep cold, very poor air, or severe chill.
    High,
}

impl RiskLevel {
    /// All levels, in canonical code order.
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High];

    /// The level's canonical integer code.
    #[must_use]
    pub fn code(self) -> usize {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Moderate => 1,
            RiskLevel::High => 2,
        }
    }

    /// The level's label string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = RiesgoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Moderate" => Ok(RiskLevel::Moderate),
            "High" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level: {other}").into()),
        }
    }
}

/// Computes the wind chill index from temperature and wind speed.
///
/// Wind speed is given in meters per second and converted to km/h (×3.6).
/// When `temp_c > 10` or the converted speed is at most 4.8 km/h, wind chill
/// is undefined in this regime and the temperature passes through unchanged.
/// Otherwise the standard index is computed:
///
/// ```text
/// 13.12 + 0.6215·T − 11.37·V^0.16 + 0.3965·T·V^0.16
/// ```
///
/// with T in °C and V in km/h.
#[must_use]
pub fn wind_chill(temp_c: f64, wind_speed_m_s: f64) -> f64 {
    let wind_kmh = wind_speed_m_s * 3.6;

    if temp_c > 10.0 || wind_kmh <= 4.8 {
        return temp_c;
    }

    let v_pow = wind_kmh.powf(0.16);
    13.12 + 0.6215 * temp_c - 11.37 * v_pow + 0.3965 * temp_c * v_pow
}

/// Classifies a day into a risk level from its derived aggregates.
///
/// Conditions are evaluated in fixed priority: the High tier is checked
/// before the Moderate tier (the tiers are not mutually exclusive by
/// construction).
#[must_use]
pub fn risk_level(min_temp_c: f64, mean_aqi: f64, wind_chill: f64) -> RiskLevel {
    if min_temp_c < -10.0 || mean_aqi >= 4.0 || wind_chill < -15.0 {
        RiskLevel::High
    } else if min_temp_c < 0.0 || mean_aqi >= 3.0 || wind_chill < -5.0 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

/// Named numeric inputs describing one location-day.
///
/// A mapping from feature name to value. Names absent from the mapping
/// default to 0 when the row is densified against a feature order; extra
/// names are ignored. Both behaviors are part of the upstream contract,
/// not errors.
///
/// # Example
///
/// ```
/// use riesgo::features::FeatureRow;
///
/// let mut row = FeatureRow::new();
/// row.insert("min_temp_c", -5.0);
/// row.insert("mean_aqi", 3.0);
///
/// let order = vec!["min_temp_c".to_string(), "wind_chill".to_string()];
/// assert_eq!(row.to_vector(&order), vec![-5.0, 0.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRow {
    values: BTreeMap<String, f64>,
}

impl FeatureRow {
    /// Creates an empty feature row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a named feature value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Looks up a feature value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Number of named values in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Densifies the row into a vector following the given feature order.
    ///
    /// Names in `order` that are absent from the row default to 0.
    #[must_use]
    pub fn to_vector(&self, order: &[String]) -> Vec<f64> {
        order
            .iter()
            .map(|name| self.get(name).unwrap_or(0.0))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FeatureRow {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Raw daily aggregates for one location-day, as supplied by the upstream
/// feature-aggregation collaborator.
///
/// Wind chill is derived from the *average* temperature and mean wind speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregates {
    /// Minimum temperature over the day, °C
    pub min_temp_c: f64,
    /// Mean temperature over the day, °C
    pub avg_temp_c: f64,
    /// Mean wind speed over the day, m/s
    pub wind_speed: f64,
    /// Mean relative humidity over the day, %
    pub humidity: f64,
    /// Mean air-quality index over the day
    pub mean_aqi: f64,
}

impl DailyAggregates {
    /// Derives the wind chill index for this day.
    #[must_use]
    pub fn wind_chill(&self) -> f64 {
        wind_chill(self.avg_temp_c, self.wind_speed)
    }

    /// Applies the rule-based risk classification to this day.
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        risk_level(self.min_temp_c, self.mean_aqi, self.wind_chill())
    }

    /// Produces the complete canonical feature row for this day.
    #[must_use]
    pub fn to_row(&self) -> FeatureRow {
        [
            ("min_temp_c", self.min_temp_c),
            ("avg_temp_c", self.avg_temp_c),
            ("wind_speed", self.wind_speed),
            ("humidity", self.humidity),
            ("wind_chill", self.wind_chill()),
            ("mean_aqi", self.mean_aqi),
        ]
        .into_iter()
        .collect()
    }
}
