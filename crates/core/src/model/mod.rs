pub mod regression;
pub mod store;
pub mod text;

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use regression::{AllocationRegressor, AllocationSample, RidgeAllocationModel};
pub use store::{LoadedModel, ModelStore};
pub use text::{LabelledText, NaiveBayesClassifier, TextClassifier, TextPrediction};

pub const MODEL_VERSION: &str = "1.0.0";

/// Fit quality measured on the training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub fit_score: f64,
}

/// Something that can be fitted from labelled samples.
pub trait TrainModel: Sized {
    type Sample;

    fn train(samples: &[Self::Sample]) -> Result<(Self, TrainingReport), EngineError>;
}

/// Identity of a committed model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: Uuid,
    pub name: String,
    pub version: String,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
    pub fit_score: f64,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, report: &TrainingReport) -> Self {
        Self {
            model_id: Uuid::new_v4(),
            name: name.into(),
            version: MODEL_VERSION.to_string(),
            trained_at: Utc::now(),
            training_samples: report.samples,
            fit_score: report.fit_score,
        }
    }
}
