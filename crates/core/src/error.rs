use std::fmt;

/// Failures inside the decision engines.
///
/// Only `Validation` is ever returned to callers of the public contracts.
/// `ModelUnavailable` and `Prediction` are recovered inside the engines and
/// surface as fallback decisions that carry the message for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Validation(String),
    ModelUnavailable(String),
    Prediction(String),
    Training(String),
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::ModelUnavailable(_) => "model_unavailable",
            EngineError::Prediction(_) => "prediction",
            EngineError::Training(_) => "training",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            EngineError::Validation(d)
            | EngineError::ModelUnavailable(d)
            | EngineError::Prediction(d)
            | EngineError::Training(d) => d,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine error (kind={}): {}", self.kind(), self.detail())
    }
}

impl std::error::Error for EngineError {}
