use crate::decision::SourceKind;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Needs,
    Wants,
    Savings,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Needs => "Needs",
            Category::Wants => "Wants",
            Category::Savings => "Savings",
            Category::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Rule,
    Ml,
    Hybrid,
    RulePriority,
    MlPriority,
    RuleFallback,
    None,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub description: String,
    #[serde(default)]
    pub amount: Option<f64>,
}

impl Transaction {
    pub fn new(description: impl Into<String>, amount: Option<f64>) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }

    /// Amounts are spend, never refunds; a present amount must be finite and `>= 0`.
    pub fn validate_amount(&self) -> Result<(), EngineError> {
        match self.amount {
            Some(a) if !a.is_finite() || a < 0.0 => Err(EngineError::Validation(format!(
                "amount must be a non-negative number (got {a})"
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub category: Category,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationDecision {
    pub description: String,
    pub category: Category,
    pub confidence: f64,
    pub method: Method,
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<BTreeMap<SourceKind, Alternative>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl CategorizationDecision {
    pub fn new(
        description: impl Into<String>,
        category: Category,
        confidence: f64,
        method: Method,
        amount: Option<f64>,
    ) -> Self {
        Self {
            description: description.into(),
            category,
            confidence: confidence.clamp(0.0, 1.0),
            method,
            amount,
            transaction_id: None,
            alternatives: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// The decision returned for input that cannot be categorized at all.
    pub fn failed(
        description: impl Into<String>,
        amount: Option<f64>,
        error: impl Into<String>,
    ) -> Self {
        Self::new(description, Category::Other, 0.0, Method::Error, amount).with_error(error)
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_alternatives(mut self, alternatives: BTreeMap<SourceKind, Alternative>) -> Self {
        self.alternatives = Some(alternatives);
        self
    }

    pub fn with_transaction_id(mut self, id: usize) -> Self {
        self.transaction_id = Some(id);
        self
    }
}
