use crate::domain::portfolio::{
    AllocationVector, AssetClass, ExpectedReturns, HealthScores, Instrument, Projection, RiskLevel,
};
use crate::domain::profile::UserProfile;
use crate::portfolio::tables;
use std::collections::BTreeMap;

const DIVERSIFICATION_MIN_WEIGHT: f64 = 0.05;
const DIVERSIFICATION_POINTS: f64 = 20.0;
const PROJECTION_YEARS: i32 = 10;

/// Portfolio-level figures derived from a constrained allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioMetrics {
    pub expected_return: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub diversification_score: f64,
}

impl PortfolioMetrics {
    pub fn of(allocation: &AllocationVector) -> Self {
        let risk_score = weighted(allocation, tables::risk_score);
        Self {
            expected_return: weighted(allocation, tables::expected_return),
            risk_score,
            risk_level: risk_level(risk_score),
            diversification_score: diversification_score(allocation),
        }
    }
}

fn weighted(allocation: &AllocationVector, table: fn(Instrument) -> f64) -> f64 {
    let total = allocation.total();
    if total <= 0.0 {
        return 0.0;
    }
    allocation.iter().map(|(i, w)| w * table(i)).sum::<f64>() / total
}

pub fn risk_level(risk_score: f64) -> RiskLevel {
    if risk_score < 3.0 {
        RiskLevel::Low
    } else if risk_score < 6.0 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

pub fn diversification_score(allocation: &AllocationVector) -> f64 {
    let meaningful = allocation
        .iter()
        .filter(|(_, w)| *w > DIVERSIFICATION_MIN_WEIGHT)
        .count();
    meaningful as f64 * DIVERSIFICATION_POINTS
}

pub fn health_scores(profile: &UserProfile) -> HealthScores {
    let income_lakhs = profile.income / 100_000.0;
    let age = profile.age as f64;
    HealthScores {
        stability: clamp_score(
            100.0 - profile.debt_to_income_ratio() * 100.0 + income_lakhs * 20.0,
        ),
        readiness: clamp_score(70.0 + profile.savings_to_income_ratio() * 30.0),
        risk_capacity: clamp_score((65.0 - age) * 1.5 + income_lakhs * 10.0),
    }
}

pub fn suitability_score(health: &HealthScores) -> f64 {
    (0.4 * health.stability + 0.3 * health.readiness + 0.3 * health.risk_capacity).min(100.0)
}

pub fn expected_returns(
    profile: &UserProfile,
    investment_amount: f64,
    metrics: &PortfolioMetrics,
) -> ExpectedReturns {
    let horizon = (65 - profile.age as i64).clamp(1, 30) as u32;
    let projection = (investment_amount > 0.0).then(|| Projection {
        monthly_investment: investment_amount,
        projected_value: investment_amount
            * (1.0 + metrics.expected_return / 100.0).powi(PROJECTION_YEARS),
        total_invested: investment_amount * 12.0 * PROJECTION_YEARS as f64,
    });
    ExpectedReturns {
        time_horizon_years: horizon,
        risk_adjusted_return: metrics.expected_return - 0.5 * metrics.risk_score,
        volatility_estimate: 2.0 * metrics.risk_score,
        projection,
    }
}

pub fn amounts(allocation: &AllocationVector, investment_amount: f64) -> BTreeMap<Instrument, f64> {
    allocation
        .iter()
        .map(|(i, w)| (i, w * investment_amount))
        .collect()
}

/// Percent of the portfolio held in each asset class; every class is listed.
pub fn by_asset_class(allocation: &AllocationVector) -> BTreeMap<AssetClass, f64> {
    AssetClass::ALL
        .iter()
        .map(|c| (*c, allocation.class_weight(*c) * 100.0))
        .collect()
}

fn clamp_score(v: f64) -> f64 {
    v.clamp(0.0, 100.0)
}
