//! Read the forecasting model artifact.
//!
//! The artifact is a JSON document:
//!
//! ```text
//! {
//!   "format": "ev-forecast-model",
//!   "version": 1,
//!   "feature_names": ["months_since_start", "county_encoded", ...],
//!   "estimator": { "kind": "random_forest", "trees": [...] }
//! }
//! ```
//!
//! Feature names are resolved against the features this crate can compute; an
//! unknown name means the artifact was trained on inputs we cannot produce.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use serde::Deserialize;

use crate::error::DashError;
use crate::models::{EstimatorSpec, Feature, FeatureSchema, ForecastModel, Regressor};

pub const MODEL_FORMAT: &str = "ev-forecast-model";
pub const MODEL_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct ModelFile {
    format: String,
    version: u32,
    feature_names: Vec<String>,
    estimator: EstimatorSpec,
}

/// Load and validate the model artifact at `path`.
pub fn load_model(path: &Path) -> Result<ForecastModel, DashError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DashError::MissingFile {
            what: "model file",
            path: path.to_path_buf(),
        },
        _ => DashError::incompatible_model(path, format!("cannot open: {e}")),
    })?;

    let model = read_model(BufReader::new(file), path)?;
    tracing::info!(
        path = %path.display(),
        estimator = %model.describe(),
        "loaded model artifact"
    );
    Ok(model)
}

/// Parse an artifact from any reader. `source` is only used in error messages.
pub fn read_model<R: Read>(reader: R, source: &Path) -> Result<ForecastModel, DashError> {
    let raw: ModelFile = serde_json::from_reader(reader)
        .map_err(|e| DashError::incompatible_model(source, format!("invalid JSON: {e}")))?;

    if raw.format != MODEL_FORMAT {
        return Err(DashError::incompatible_model(
            source,
            format!("expected format '{MODEL_FORMAT}', found '{}'", raw.format),
        ));
    }
    if raw.version != MODEL_VERSION {
        return Err(DashError::incompatible_model(
            source,
            format!("unsupported version {} (expected {MODEL_VERSION})", raw.version),
        ));
    }

    let features = raw
        .feature_names
        .iter()
        .map(|name| resolve_feature(name))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|m| DashError::incompatible_model(source, m))?;
    let schema = FeatureSchema::new(features).map_err(|m| DashError::incompatible_model(source, m))?;

    ForecastModel::new(schema, raw.estimator).map_err(|m| DashError::incompatible_model(source, m))
}

fn resolve_feature(name: &str) -> Result<Feature, String> {
    Feature::ALL
        .into_iter()
        .find(|f| f.name() == name)
        .ok_or_else(|| format!("unknown feature '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    fn parse(json: &str) -> Result<ForecastModel, DashError> {
        read_model(json.as_bytes(), Path::new("model.json"))
    }

    #[test]
    fn loads_forest_fixture() {
        let model = load_model(&fixture("forest_model.json")).unwrap();
        assert_eq!(model.schema().len(), 9);
        assert!(model.describe().starts_with("random forest"), "{}", model.describe());
    }

    #[test]
    fn loads_linear_fixture() {
        let model = load_model(&fixture("linear_model.json")).unwrap();
        assert_eq!(model.schema().features()[0], Feature::EvTotalLag1);
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let err = load_model(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, DashError::MissingFile { what: "model file", .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unknown_feature_is_incompatible() {
        let err = parse(
            r#"{"format":"ev-forecast-model","version":1,
                "feature_names":["ev_total_lag1","median_income"],
                "estimator":{"kind":"linear","intercept":0.0,"coefficients":[1.0,1.0]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DashError::IncompatibleModel { .. }));
        assert!(err.to_string().contains("median_income"), "{err}");
    }

    #[test]
    fn wrong_format_or_version_is_incompatible() {
        let err = parse(
            r#"{"format":"pickle","version":1,"feature_names":["ev_total_lag1"],
                "estimator":{"kind":"linear","intercept":0.0,"coefficients":[1.0]}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("pickle"), "{err}");

        let err = parse(
            r#"{"format":"ev-forecast-model","version":9,"feature_names":["ev_total_lag1"],
                "estimator":{"kind":"linear","intercept":0.0,"coefficients":[1.0]}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("version 9"), "{err}");
    }

    #[test]
    fn garbage_is_incompatible() {
        let err = parse("not json at all").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
