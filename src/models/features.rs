//! Model input features.
//!
//! The artifact declares which features it was trained on, in order
//! (`feature_names`). This module knows how to compute each recognised
//! feature from a county's EV-total series; the schema decides which of them
//! end up in the row and where.

use serde::{Deserialize, Serialize};

use crate::math::trend_slope;

/// Minimum series length needed to compute the lag/rolling features.
pub const MIN_HISTORY: usize = 3;

/// Window for the `ev_growth_slope` trend fit.
const SLOPE_WINDOW: usize = 6;

/// A feature the model may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    MonthsSinceStart,
    CountyEncoded,
    EvTotalLag1,
    EvTotalLag2,
    EvTotalLag3,
    #[serde(rename = "ev_total_roll_mean_3")]
    EvTotalRollMean3,
    #[serde(rename = "ev_total_pct_change_1")]
    EvTotalPctChange1,
    #[serde(rename = "ev_total_pct_change_3")]
    EvTotalPctChange3,
    EvGrowthSlope,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::MonthsSinceStart,
        Feature::CountyEncoded,
        Feature::EvTotalLag1,
        Feature::EvTotalLag2,
        Feature::EvTotalLag3,
        Feature::EvTotalRollMean3,
        Feature::EvTotalPctChange1,
        Feature::EvTotalPctChange3,
        Feature::EvGrowthSlope,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::MonthsSinceStart => "months_since_start",
            Feature::CountyEncoded => "county_encoded",
            Feature::EvTotalLag1 => "ev_total_lag1",
            Feature::EvTotalLag2 => "ev_total_lag2",
            Feature::EvTotalLag3 => "ev_total_lag3",
            Feature::EvTotalRollMean3 => "ev_total_roll_mean_3",
            Feature::EvTotalPctChange1 => "ev_total_pct_change_1",
            Feature::EvTotalPctChange3 => "ev_total_pct_change_3",
            Feature::EvGrowthSlope => "ev_growth_slope",
        }
    }
}

/// Ordered feature list from the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    features: Vec<Feature>,
}

impl FeatureSchema {
    /// Rejects an empty or repeated feature list.
    pub fn new(features: Vec<Feature>) -> Result<Self, String> {
        if features.is_empty() {
            return Err("feature_names is empty".to_string());
        }
        for (i, f) in features.iter().enumerate() {
            if features[..i].contains(f) {
                return Err(format!("feature '{}' listed more than once", f.name()));
            }
        }
        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Lay out one input row in schema order.
    pub fn build_row(&self, step: &StepInputs) -> Vec<f64> {
        self.features
            .iter()
            .map(|f| match f {
                Feature::MonthsSinceStart => step.months_since_start as f64,
                Feature::CountyEncoded => step.county_encoded as f64,
                Feature::EvTotalLag1 => step.engineered.lag1,
                Feature::EvTotalLag2 => step.engineered.lag2,
                Feature::EvTotalLag3 => step.engineered.lag3,
                Feature::EvTotalRollMean3 => step.engineered.roll_mean_3,
                Feature::EvTotalPctChange1 => step.engineered.pct_change_1,
                Feature::EvTotalPctChange3 => step.engineered.pct_change_3,
                Feature::EvGrowthSlope => step.engineered.growth_slope,
            })
            .collect()
    }
}

/// Series-derived features for the next step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineeredFeatures {
    pub lag1: f64,
    pub lag2: f64,
    pub lag3: f64,
    pub roll_mean_3: f64,
    pub pct_change_1: f64,
    pub pct_change_3: f64,
    pub growth_slope: f64,
}

impl EngineeredFeatures {
    /// Compute features from the series so far (history plus earlier
    /// predictions). Returns `None` when fewer than `MIN_HISTORY` values exist.
    pub fn from_series(series: &[f64]) -> Option<Self> {
        let n = series.len();
        if n < MIN_HISTORY {
            return None;
        }

        let lag1 = series[n - 1];
        let lag2 = series[n - 2];
        let lag3 = series[n - 3];

        let pct_change_1 = if lag2 != 0.0 { (lag1 - lag2) / lag2 } else { 0.0 };
        let pct_change_3 = match n.checked_sub(4).map(|i| series[i]) {
            Some(base) if base != 0.0 => (lag1 - base) / base,
            _ => 0.0,
        };

        let window = &series[n - n.min(SLOPE_WINDOW)..];

        Some(Self {
            lag1,
            lag2,
            lag3,
            roll_mean_3: (lag1 + lag2 + lag3) / 3.0,
            pct_change_1,
            pct_change_3,
            growth_slope: trend_slope(window),
        })
    }
}

/// Everything needed to build one input row.
#[derive(Debug, Clone, Copy)]
pub struct StepInputs {
    pub months_since_start: i64,
    pub county_encoded: i64,
    pub engineered: EngineeredFeatures,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engineered_features_from_short_series() {
        let f = EngineeredFeatures::from_series(&[100.0, 110.0, 121.0]).unwrap();
        assert_eq!(f.lag1, 121.0);
        assert_eq!(f.lag2, 110.0);
        assert_eq!(f.lag3, 100.0);
        assert!((f.roll_mean_3 - 110.333_333).abs() < 1e-5);
        assert!((f.pct_change_1 - 0.1).abs() < 1e-12);
        // Fewer than four values: no 3-step change.
        assert_eq!(f.pct_change_3, 0.0);
        // polyfit([0,1,2], [100,110,121]) slope = 10.5
        assert!((f.growth_slope - 10.5).abs() < 1e-9);
    }

    #[test]
    fn pct_changes_guard_zero_denominators() {
        let f = EngineeredFeatures::from_series(&[0.0, 5.0, 0.0, 10.0]).unwrap();
        assert_eq!(f.pct_change_1, 0.0);
        assert_eq!(f.pct_change_3, 0.0);

        let f = EngineeredFeatures::from_series(&[50.0, 60.0, 70.0, 100.0]).unwrap();
        assert!((f.pct_change_3 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn slope_uses_the_last_six_values() {
        // Early values are wild; the last six rise by exactly 2 per step.
        let series = [1_000.0, -500.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0];
        let f = EngineeredFeatures::from_series(&series).unwrap();
        assert!((f.growth_slope - 2.0).abs() < 1e-9);
    }

    #[test]
    fn too_short_series_has_no_features() {
        assert!(EngineeredFeatures::from_series(&[1.0, 2.0]).is_none());
    }

    #[test]
    fn schema_orders_the_row() {
        let schema = FeatureSchema::new(vec![
            Feature::EvTotalLag1,
            Feature::MonthsSinceStart,
            Feature::CountyEncoded,
        ])
        .unwrap();
        let step = StepInputs {
            months_since_start: 72,
            county_encoded: 4,
            engineered: EngineeredFeatures::from_series(&[1.0, 2.0, 3.0]).unwrap(),
        };
        assert_eq!(schema.build_row(&step), vec![3.0, 72.0, 4.0]);
    }

    #[test]
    fn schema_rejects_duplicates_and_empty() {
        assert!(FeatureSchema::new(vec![]).is_err());
        let err = FeatureSchema::new(vec![Feature::EvTotalLag1, Feature::EvTotalLag1]).unwrap_err();
        assert!(err.contains("ev_total_lag1"), "{err}");
    }

    #[test]
    fn serde_names_match_the_training_columns() {
        for f in Feature::ALL {
            let json = serde_json::to_string(&f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.name()));
        }
        let f: Feature = serde_json::from_str("\"ev_total_roll_mean_3\"").unwrap();
        assert_eq!(f, Feature::EvTotalRollMean3);
    }
}
