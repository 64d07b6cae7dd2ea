use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Which kind of source produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "rule")]
    Rule,
    #[serde(rename = "ml")]
    Model,
}

/// A value proposed by a source together with the confidence it assigns to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal<T> {
    pub value: T,
    pub confidence: f64,
}

impl<T> Signal<T> {
    pub fn new(value: T, confidence: f64) -> Self {
        Self {
            value,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// A deterministic rule table or a trained model, seen through the same lens.
///
/// `Ok(None)` means the source has nothing to say about the input (no keyword
/// hit, for instance). Orchestrators own the precedence between sources; a
/// source never looks at another source's output.
pub trait DecisionSource<I: ?Sized> {
    type Output;

    fn kind(&self) -> SourceKind;

    fn decide(&self, input: &I) -> Result<Option<Signal<Self::Output>>, EngineError>;
}

/// Runs one model call; a panic inside the model becomes a `Prediction` error.
pub(crate) fn guard_model<T>(
    model: &str,
    call: impl FnOnce() -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|_| {
        tracing::error!(model, "model panicked during prediction");
        Err(EngineError::Prediction(format!(
            "{model} panicked during prediction"
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signal_confidence_is_clamped() {
        assert_eq!(Signal::new("x", 1.7).confidence, 1.0);
        assert_eq!(Signal::new("x", -0.2).confidence, 0.0);
    }

    #[test]
    fn source_kind_uses_short_wire_names() {
        assert_eq!(serde_json::to_value(SourceKind::Rule).unwrap(), json!("rule"));
        assert_eq!(serde_json::to_value(SourceKind::Model).unwrap(), json!("ml"));
    }

    #[test]
    fn model_panic_becomes_prediction_error() {
        let err = guard_model::<()>("stub", || panic!("bad weights")).unwrap_err();
        assert_eq!(
            err,
            EngineError::Prediction("stub panicked during prediction".to_string())
        );
        assert_eq!(guard_model("stub", || Ok(7)), Ok(7));
    }
}
