//! Recursive multi-step forecasting.
//!
//! Each step builds one feature row from the working series (history plus the
//! predictions made so far), asks the model for the next value, optionally
//! clamps it, and appends it to the series. Nothing is fitted here.

use crate::domain::{CountyHistory, ForecastOptions, ForecastPoint, Horizon, Period};
use crate::error::DashError;
use crate::models::{EngineeredFeatures, ForecastModel, MIN_HISTORY, Regressor, StepInputs};

/// Produce `horizon` monthly points following the county's last record.
///
/// `dataset_start` is the earliest period in the whole dataset; the model's
/// `months_since_start` feature counts from it.
pub fn generate_forecast(
    model: &ForecastModel,
    history: &CountyHistory<'_>,
    dataset_start: Period,
    horizon: Horizon,
    options: ForecastOptions,
) -> Result<Vec<ForecastPoint>, DashError> {
    let last_period = history
        .last_period()
        .ok_or_else(|| DashError::Inference(format!("no history for county '{}'", history.county)))?;

    let mut series = history.ev_totals();
    if series.len() < MIN_HISTORY {
        return Err(DashError::Inference(format!(
            "insufficient history for '{}': need at least {MIN_HISTORY} months, have {}",
            history.county,
            series.len()
        )));
    }

    let last_actual = series[series.len() - 1];
    let base_months = last_period.months_since(dataset_start);
    let schema = model.schema();

    let mut points = Vec::with_capacity(horizon.months() as usize);
    let mut period = last_period;

    for step in 1..=horizon.months() {
        let engineered = EngineeredFeatures::from_series(&series)
            .ok_or_else(|| DashError::Inference("series too short for lag features".to_string()))?;
        let inputs = StepInputs {
            months_since_start: base_months + i64::from(step),
            county_encoded: history.encoding,
            engineered,
        };
        let row = schema.build_row(&inputs);

        let raw = model
            .predict_one(&row)
            .map_err(|e| DashError::Inference(format!("step {step}: {e}")))?;
        if !raw.is_finite() {
            return Err(DashError::Inference(format!(
                "step {step}: model returned a non-finite value ({raw})"
            )));
        }

        let value = if options.guardrails {
            let previous = points.last().map(|p: &ForecastPoint| p.predicted_value);
            apply_guardrails(raw, last_actual, previous)
        } else {
            raw
        };

        period = period.next();
        tracing::trace!(%period, raw, value, "forecast step");
        points.push(ForecastPoint {
            period,
            predicted_value: value,
        });
        series.push(value);
    }

    tracing::debug!(
        county = history.county,
        horizon = horizon.months(),
        last = points.last().map(|p| p.predicted_value),
        "forecast generated"
    );
    Ok(points)
}

/// Clamp one raw prediction.
///
/// `previous` is the prior forecast point; `None` on the first step, where the
/// bounds are taken relative to the last observed value instead.
pub fn apply_guardrails(raw: f64, last_actual: f64, previous: Option<f64>) -> f64 {
    let value = match previous {
        None => {
            let c = last_actual;
            if raw < 0.7 * c {
                0.95 * c
            } else if raw > 1.5 * c {
                1.1 * c
            } else {
                raw
            }
        }
        Some(q) => {
            let p = if raw < 0.8 * q {
                0.98 * q
            } else if raw > 1.3 * q {
                1.05 * q
            } else {
                raw
            };
            // Registrations are cumulative; keep a gentle upward trend.
            p.max(1.01 * q)
        }
    };
    value.max(0.1)
}
