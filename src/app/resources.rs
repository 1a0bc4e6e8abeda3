//! Process-lifetime inputs shared by every front end.

use std::sync::Arc;

use crate::domain::DashConfig;
use crate::error::DashError;
use crate::io::{Dataset, LoadOnce, load_dataset, load_model};
use crate::models::ForecastModel;

/// Configuration plus the lazily loaded dataset and model.
///
/// Both inputs are read at most once; every caller gets the same `Arc`.
#[derive(Debug)]
pub struct Resources {
    config: DashConfig,
    dataset: LoadOnce<Dataset>,
    model: LoadOnce<ForecastModel>,
}

impl Resources {
    pub fn new(config: DashConfig) -> Self {
        Self {
            dataset: LoadOnce::new(config.data_path.clone()),
            model: LoadOnce::new(config.model_path.clone()),
            config,
        }
    }

    pub fn config(&self) -> &DashConfig {
        &self.config
    }

    pub fn dataset(&self) -> Result<Arc<Dataset>, DashError> {
        self.dataset.get_or_load(load_dataset)
    }

    pub fn model(&self) -> Result<Arc<ForecastModel>, DashError> {
        self.model.get_or_load(load_model)
    }

    /// Load both inputs now so missing or broken files stop startup.
    pub fn preload(&self) -> Result<(Arc<Dataset>, Arc<ForecastModel>), DashError> {
        Ok((self.dataset()?, self.model()?))
    }
}
