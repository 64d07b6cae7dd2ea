use crate::decision::{guard_model, DecisionSource, Signal, SourceKind};
use crate::domain::portfolio::{
    AllocationMethod, AllocationVector, PortfolioRecommendation, RawAllocation,
    RecommendationMetadata,
};
use crate::domain::profile::UserProfile;
use crate::error::EngineError;
use crate::model::regression::DEFAULT_RIDGE_LAMBDA;
use crate::model::{
    AllocationRegressor, AllocationSample, ModelInfo, ModelStore, RidgeAllocationModel,
};
use crate::portfolio::constraints::{AllocationConstraintEngine, ConstrainedAllocation};
use crate::portfolio::insights::{build_insights, implementation_plan};
use crate::portfolio::metrics::{self, PortfolioMetrics};
use crate::portfolio::tables;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};

pub const FALLBACK_CONFIDENCE: f64 = 0.6;

const MODEL_MISSING: &str = "allocation model not available";

/// Confidence in a model-backed recommendation, driven by savings readiness.
pub fn model_confidence(readiness: f64) -> f64 {
    (0.8 + (readiness - 50.0) / 500.0).clamp(0.6, 0.95)
}

/// Fixed per-risk-profile mixes; always has an answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackTable;

impl DecisionSource<UserProfile> for FallbackTable {
    type Output = RawAllocation;

    fn kind(&self) -> SourceKind {
        SourceKind::Rule
    }

    fn decide(&self, profile: &UserProfile) -> Result<Option<Signal<RawAllocation>>, EngineError> {
        let mix: RawAllocation = tables::fallback_mix(profile.risk_profile)
            .iter()
            .copied()
            .collect();
        Ok(Some(Signal::new(mix, FALLBACK_CONFIDENCE)))
    }
}

/// Adapts a loaded regressor to the decision-source lens.
pub struct RegressorSource<'a>(pub &'a dyn AllocationRegressor);

impl DecisionSource<UserProfile> for RegressorSource<'_> {
    type Output = RawAllocation;

    fn kind(&self) -> SourceKind {
        SourceKind::Model
    }

    fn decide(&self, profile: &UserProfile) -> Result<Option<Signal<RawAllocation>>, EngineError> {
        let features = profile.features();
        let raw = guard_model(self.0.name(), || self.0.predict(&features))?;
        let confidence = model_confidence(metrics::health_scores(profile).readiness);
        Ok(Some(Signal::new(raw, confidence)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileOutcome {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<PortfolioRecommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelReadiness {
    Ready,
    NotReady,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub status: ModelReadiness,
    pub model: Option<ModelInfo>,
}

pub struct PortfolioAdvisor {
    regressor: ModelStore<dyn AllocationRegressor>,
    constraints: AllocationConstraintEngine,
    fallback: FallbackTable,
    ridge_lambda: f64,
}

impl PortfolioAdvisor {
    /// No allocation model yet; every recommendation uses the fallback table.
    pub fn untrained(constraints: AllocationConstraintEngine) -> Self {
        Self {
            regressor: ModelStore::empty(),
            constraints,
            fallback: FallbackTable,
            ridge_lambda: DEFAULT_RIDGE_LAMBDA,
        }
    }

    pub fn with_regressor(
        constraints: AllocationConstraintEngine,
        regressor: Box<dyn AllocationRegressor>,
        info: ModelInfo,
    ) -> Self {
        let advisor = Self::untrained(constraints);
        advisor.regressor.swap(regressor, info);
        advisor
    }

    pub fn with_ridge_lambda(mut self, lambda: f64) -> Self {
        self.ridge_lambda = lambda;
        self
    }

    pub fn recommend(&self, profile: &UserProfile) -> Result<PortfolioRecommendation, EngineError> {
        profile.validate()?;

        match self.model_allocation(profile) {
            Ok((constrained, confidence, info)) => {
                let metadata = RecommendationMetadata {
                    method: AllocationMethod::MlModel,
                    confidence_score: confidence,
                    model: Some(info),
                    error: None,
                };
                Ok(assemble(profile, constrained, metadata))
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    kind = err.kind(),
                    risk_profile = ?profile.risk_profile,
                    "serving rule-based fallback allocation"
                );
                Ok(self.fallback_recommendation(profile, err.to_string()))
            }
        }
    }

    /// One outcome per input, in input order; a bad profile never sinks the batch.
    pub fn batch_recommend(&self, profiles: &[UserProfile]) -> Vec<ProfileOutcome> {
        profiles
            .par_iter()
            .enumerate()
            .map(|(index, profile)| {
                match catch_unwind(AssertUnwindSafe(|| self.recommend(profile))) {
                    Ok(Ok(rec)) => ProfileOutcome {
                        index,
                        recommendation: Some(rec),
                        error: None,
                    },
                    Ok(Err(err)) => ProfileOutcome {
                        index,
                        recommendation: None,
                        error: Some(err.to_string()),
                    },
                    Err(_) => {
                        tracing::error!(index, "recommendation panicked");
                        ProfileOutcome {
                            index,
                            recommendation: None,
                            error: Some("recommendation failed unexpectedly".to_string()),
                        }
                    }
                }
            })
            .collect()
    }

    /// Fits a new ridge model, checks it serves a usable allocation, then swaps it in.
    pub fn retrain(&self, samples: &[AllocationSample]) -> Result<ModelInfo, EngineError> {
        let (model, report) = RidgeAllocationModel::train_with_lambda(samples, self.ridge_lambda)?;
        if let Some(sample) = samples.first() {
            let raw = model.predict(&sample.profile.features())?;
            self.constraints
                .apply(&raw, sample.profile.risk_profile)
                .map_err(|e| {
                    EngineError::Training(format!("trained model is unusable: {}", e.detail()))
                })?;
        }
        let info = ModelInfo::new(model.name(), &report);
        self.regressor.swap(Box::new(model), info.clone());
        Ok(info)
    }

    pub fn model_status(&self) -> ModelStatus {
        let model = self.regressor.info();
        ModelStatus {
            status: if model.is_some() {
                ModelReadiness::Ready
            } else {
                ModelReadiness::NotReady
            },
            model,
        }
    }

    fn model_allocation(
        &self,
        profile: &UserProfile,
    ) -> Result<(ConstrainedAllocation, f64, ModelInfo), EngineError> {
        let loaded = self
            .regressor
            .current()
            .ok_or_else(|| EngineError::ModelUnavailable(MODEL_MISSING.to_string()))?;
        let signal = RegressorSource(loaded.model.as_ref())
            .decide(profile)?
            .ok_or_else(|| EngineError::ModelUnavailable(MODEL_MISSING.to_string()))?;
        let constrained = self.constraints.constrain(&signal.value, profile.risk_profile)?;
        Ok((constrained, signal.confidence, loaded.info.clone()))
    }

    fn fallback_recommendation(
        &self,
        profile: &UserProfile,
        error: String,
    ) -> PortfolioRecommendation {
        let (raw, confidence) = match self.fallback.decide(profile) {
            Ok(Some(signal)) => (signal.value, signal.confidence),
            _ => (
                tables::fallback_mix(profile.risk_profile).iter().copied().collect(),
                FALLBACK_CONFIDENCE,
            ),
        };
        // The fallback mixes are valid allocations; the policy may still trim equity.
        let constrained = self
            .constraints
            .constrain(&raw, profile.risk_profile)
            .unwrap_or_else(|_| ConstrainedAllocation {
                allocation: AllocationVector::from_weights(raw),
                equity_capped_from: None,
            });
        let metadata = RecommendationMetadata {
            method: AllocationMethod::RuleBasedFallback,
            confidence_score: confidence,
            model: None,
            error: Some(error),
        };
        assemble(profile, constrained, metadata)
    }
}

fn assemble(
    profile: &UserProfile,
    constrained: ConstrainedAllocation,
    metadata: RecommendationMetadata,
) -> PortfolioRecommendation {
    let ConstrainedAllocation {
        allocation,
        equity_capped_from,
    } = constrained;
    let investment_amount = profile.investment_amount_or_default();
    let stats = PortfolioMetrics::of(&allocation);
    let health = metrics::health_scores(profile);

    PortfolioRecommendation {
        amounts: metrics::amounts(&allocation, investment_amount),
        by_asset_class: metrics::by_asset_class(&allocation),
        expected_return: stats.expected_return,
        expected_returns: metrics::expected_returns(profile, investment_amount, &stats),
        risk_level: stats.risk_level,
        risk_score: stats.risk_score,
        diversification_score: stats.diversification_score,
        suitability_score: metrics::suitability_score(&health),
        health,
        insights: build_insights(profile, &allocation, equity_capped_from),
        plan: implementation_plan(investment_amount),
        investment_amount,
        allocation,
        metadata,
    }
}
