use crate::domain::portfolio::{AllocationVector, Instrument, RawAllocation};
use crate::domain::profile::RiskProfile;
use crate::error::EngineError;
use crate::portfolio::tables::RiskLimits;
use std::collections::BTreeMap;

/// Weights below this are dropped before renormalizing.
pub const MIN_WEIGHT: f64 = 0.01;

/// Which risk profiles get an equity ceiling, and where trimmed equity goes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintPolicy {
    pub min_weight: f64,
    pub equity_caps: BTreeMap<RiskProfile, f64>,
    /// Shares of the trimmed equity mass; they sum to 1.
    pub redistribution: Vec<(Instrument, f64)>,
}

impl ConstraintPolicy {
    /// Only Conservative profiles are capped.
    pub fn conservative_only() -> Self {
        Self::with_caps([RiskProfile::Conservative])
    }

    /// Every profile is capped at its risk-matrix equity maximum.
    pub fn all_profiles() -> Self {
        Self::with_caps(RiskProfile::ALL)
    }

    fn with_caps(profiles: impl IntoIterator<Item = RiskProfile>) -> Self {
        Self {
            min_weight: MIN_WEIGHT,
            equity_caps: profiles
                .into_iter()
                .map(|p| (p, RiskLimits::for_profile(p).equity_max))
                .collect(),
            redistribution: vec![(Instrument::FixedDeposits, 0.6), (Instrument::DebtFunds, 0.4)],
        }
    }

    pub fn equity_cap(&self, profile: RiskProfile) -> Option<f64> {
        self.equity_caps.get(&profile).copied()
    }
}

impl Default for ConstraintPolicy {
    fn default() -> Self {
        Self::conservative_only()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstrainedAllocation {
    pub allocation: AllocationVector,
    /// Equity weight before the ceiling was enforced, if it had to be.
    pub equity_capped_from: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct AllocationConstraintEngine {
    policy: ConstraintPolicy,
}

impl AllocationConstraintEngine {
    pub fn new(policy: ConstraintPolicy) -> Self {
        Self { policy }
    }

    pub fn apply(
        &self,
        raw: &RawAllocation,
        profile: RiskProfile,
    ) -> Result<AllocationVector, EngineError> {
        self.constrain(raw, profile).map(|c| c.allocation)
    }

    /// Prune, renormalize, then enforce the equity ceiling for `profile`.
    pub fn constrain(
        &self,
        raw: &RawAllocation,
        profile: RiskProfile,
    ) -> Result<ConstrainedAllocation, EngineError> {
        if let Some((instrument, w)) = raw.iter().find(|(_, w)| !w.is_finite()) {
            return Err(EngineError::Prediction(format!(
                "model produced a non-finite weight for {instrument:?}: {w}"
            )));
        }

        let mut weights: BTreeMap<Instrument, f64> = raw
            .iter()
            .filter(|(_, w)| **w >= self.policy.min_weight)
            .map(|(i, w)| (*i, *w))
            .collect();

        let total: f64 = weights.values().sum();
        if weights.is_empty() || total <= 0.0 {
            return Err(EngineError::Prediction(
                "no instrument left after pruning small weights".to_string(),
            ));
        }
        for w in weights.values_mut() {
            *w /= total;
        }

        let mut equity_capped_from = None;
        if let Some(cap) = self.policy.equity_cap(profile) {
            let equity: f64 = weights
                .iter()
                .filter(|(i, _)| i.is_equity())
                .map(|(_, w)| w)
                .sum();
            if equity > cap {
                let factor = cap / equity;
                let trimmed = equity - cap;
                for (_, w) in weights.iter_mut().filter(|(i, _)| i.is_equity()) {
                    *w *= factor;
                }
                for (instrument, share) in &self.policy.redistribution {
                    *weights.entry(*instrument).or_insert(0.0) += trimmed * share;
                }
                tracing::debug!(?profile, equity, cap, "equity ceiling enforced");
                equity_capped_from = Some(equity);
            }
        }

        Ok(ConstrainedAllocation {
            allocation: AllocationVector::from_weights(weights),
            equity_capped_from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(weights: &[(Instrument, f64)]) -> RawAllocation {
        weights.iter().copied().collect()
    }

    #[test]
    fn prunes_small_and_negative_weights_then_normalizes() {
        let engine = AllocationConstraintEngine::default();
        let out = engine
            .apply(
                &raw(&[
                    (Instrument::LargeCapStocks, 0.6),
                    (Instrument::DebtFunds, 0.6),
                    (Instrument::Gold, 0.005),
                    (Instrument::International, -0.2),
                ]),
                RiskProfile::Moderate,
            )
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!((out.total() - 1.0).abs() < 1e-12);
        assert!((out.weight(Instrument::LargeCapStocks) - 0.5).abs() < 1e-12);
        assert_eq!(out.weight(Instrument::Gold), 0.0);
    }

    #[test]
    fn conservative_equity_is_capped_and_redistributed() {
        let engine = AllocationConstraintEngine::default();
        let out = engine
            .constrain(
                &raw(&[
                    (Instrument::LargeCapStocks, 0.5),
                    (Instrument::SmallCapStocks, 0.3),
                    (Instrument::Gold, 0.2),
                ]),
                RiskProfile::Conservative,
            )
            .unwrap();
        let a = &out.allocation;
        assert!((out.equity_capped_from.unwrap() - 0.8).abs() < 1e-12);
        assert!(a.equity_weight() <= 0.3 + 1e-9);
        assert!((a.total() - 1.0).abs() < 1e-9);
        // 0.5 of trimmed mass: 60% to deposits, 40% to debt funds.
        assert!((a.weight(Instrument::FixedDeposits) - 0.3).abs() < 1e-9);
        assert!((a.weight(Instrument::DebtFunds) - 0.2).abs() < 1e-9);
        // Equity keeps its internal proportions.
        let ratio = a.weight(Instrument::LargeCapStocks) / a.weight(Instrument::SmallCapStocks);
        assert!((ratio - 5.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn default_policy_leaves_other_profiles_alone() {
        let engine = AllocationConstraintEngine::default();
        let out = engine
            .constrain(
                &raw(&[(Instrument::SmallCapStocks, 0.9), (Instrument::DebtFunds, 0.1)]),
                RiskProfile::Aggressive,
            )
            .unwrap();
        assert!(out.equity_capped_from.is_none());
        assert!((out.allocation.equity_weight() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn all_profiles_policy_caps_aggressive_at_eighty_percent() {
        let engine = AllocationConstraintEngine::new(ConstraintPolicy::all_profiles());
        let out = engine
            .apply(
                &raw(&[(Instrument::SmallCapStocks, 0.9), (Instrument::DebtFunds, 0.1)]),
                RiskProfile::Aggressive,
            )
            .unwrap();
        assert!(out.equity_weight() <= 0.8 + 1e-9);
        assert!((out.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_model_output_is_a_prediction_error() {
        let engine = AllocationConstraintEngine::default();
        let nan = raw(&[(Instrument::Gold, f64::NAN), (Instrument::DebtFunds, 0.5)]);
        assert!(matches!(
            engine.apply(&nan, RiskProfile::Moderate),
            Err(EngineError::Prediction(_))
        ));
        let tiny = raw(&[(Instrument::Gold, 0.001), (Instrument::DebtFunds, -3.0)]);
        assert!(matches!(
            engine.apply(&tiny, RiskProfile::Moderate),
            Err(EngineError::Prediction(_))
        ));
    }
}
