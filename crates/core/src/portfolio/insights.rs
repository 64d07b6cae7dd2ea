use crate::domain::portfolio::{AllocationVector, ImplementationPlan, Insights, Instrument};
use crate::domain::profile::{GoalType, RiskProfile, UserProfile};
use crate::portfolio::tables::GoalStrategy;

const HEAVY_LARGE_CAP: f64 = 0.3;
const CORE_FIXED_INCOME: f64 = 0.5;
const WELL_DIVERSIFIED_COUNT: usize = 5;
const HIGH_DEBT_RATIO: f64 = 0.3;
const LIQUIDITY_FOCUS: f64 = 0.8;
const LOW_INVESTMENT_RATIO: f64 = 0.15;

/// Declarative insight rules over a finished allocation.
///
/// `equity_capped_from` is the equity weight the model asked for when the
/// ceiling had to cut it down.
pub fn build_insights(
    profile: &UserProfile,
    allocation: &AllocationVector,
    equity_capped_from: Option<f64>,
) -> Insights {
    let mut out = Insights::default();

    if allocation.weight(Instrument::LargeCapStocks) > HEAVY_LARGE_CAP {
        out.portfolio.push(
            "Heavy allocation to large-cap stocks provides stability with growth potential".into(),
        );
    }
    let core_fixed: f64 = [
        Instrument::FixedDeposits,
        Instrument::DebtFunds,
        Instrument::GovernmentBonds,
    ]
    .iter()
    .map(|i| allocation.weight(*i))
    .sum();
    if core_fixed > CORE_FIXED_INCOME {
        out.portfolio.push(
            "Conservative allocation ensures capital protection with steady returns".into(),
        );
    }
    if allocation.iter().filter(|(_, w)| *w > 0.05).count() >= WELL_DIVERSIFIED_COUNT {
        out.portfolio
            .push("Well-diversified portfolio reduces concentration risk".into());
    }

    match profile.risk_profile {
        RiskProfile::Conservative => out.risk_management.push(
            "Low-risk profile maintained with emphasis on capital preservation".into(),
        ),
        RiskProfile::Aggressive => out
            .risk_management
            .push("Higher risk tolerance allows for greater growth potential".into()),
        RiskProfile::Moderate => {}
    }
    if profile.debt_to_income_ratio() > HIGH_DEBT_RATIO {
        out.risk_management.push(
            "High debt ratio suggests prioritizing debt reduction alongside investments".into(),
        );
    }
    if let Some(requested) = equity_capped_from {
        out.risk_management.push(format!(
            "Equity exposure reduced from {:.0}% to {:.0}% to respect the {:?} risk ceiling",
            requested * 100.0,
            allocation.equity_weight() * 100.0,
            profile.risk_profile
        ));
    }

    let strategy = GoalStrategy::for_goal(profile.goal_type);
    if strategy.liquidity_importance >= LIQUIDITY_FOCUS {
        let goal = match profile.goal_type {
            GoalType::EmergencyFund => "emergency fund",
            _ => "short-term goal",
        };
        out.goal_alignment.push(format!(
            "Liquid investments prioritized for {goal} accessibility"
        ));
    }
    if profile.goal_type == GoalType::Retirement {
        out.goal_alignment
            .push("Long-term growth focus aligns with retirement planning horizon".into());
    }

    if profile.age < 30 {
        out.improvement
            .push("Consider increasing equity allocation for long-term wealth creation".into());
    } else if profile.age > 50 {
        out.improvement.push(
            "Gradually shift towards more stable investments as retirement approaches".into(),
        );
    }
    if profile.investment_to_income_ratio() < LOW_INVESTMENT_RATIO {
        out.improvement.push(
            "Consider increasing monthly investment amount to accelerate wealth building".into(),
        );
    }

    out
}

pub fn implementation_plan(investment_amount: f64) -> ImplementationPlan {
    ImplementationPlan {
        immediate_actions: vec![
            "Open investment accounts with recommended fund houses".into(),
            format!("Set up SIP for ₹{investment_amount:.0} monthly investment"),
            "Complete KYC documentation for all investment platforms".into(),
        ],
        short_term_plan: vec![
            "Monitor portfolio performance monthly".into(),
            "Review and rebalance allocation quarterly".into(),
            "Increase SIP amount by 10% annually".into(),
        ],
        long_term_strategy: vec![
            "Gradually shift to more conservative allocation after age 50".into(),
            "Consider tax-efficient investment options".into(),
            "Review goals and risk appetite annually".into(),
        ],
        monitoring: vec![
            "Track portfolio returns against benchmark indices".into(),
            "Rebalance if any asset class deviates by >5%".into(),
            "Annual review with financial advisor recommended".into(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation(weights: &[(Instrument, f64)]) -> AllocationVector {
        AllocationVector::from_weights(weights.iter().copied().collect())
    }

    #[test]
    fn conservative_emergency_fund() {
        let mut p =
            UserProfile::new(40_000.0, 55, RiskProfile::Conservative, GoalType::EmergencyFund);
        p.debt_amount = 20_000.0;
        p.investment_amount = Some(4_000.0);
        let a = allocation(&[
            (Instrument::FixedDeposits, 0.4),
            (Instrument::DebtFunds, 0.3),
            (Instrument::LargeCapStocks, 0.2),
            (Instrument::Gold, 0.1),
        ]);
        let i = build_insights(&p, &a, None);
        assert_eq!(i.portfolio.len(), 1);
        assert!(i.portfolio[0].contains("capital protection"));
        assert_eq!(i.risk_management.len(), 2);
        assert!(i.goal_alignment[0].contains("emergency fund"));
        assert_eq!(i.improvement.len(), 2);
    }

    #[test]
    fn reports_equity_ceiling() {
        let p = UserProfile::new(75_000.0, 28, RiskProfile::Conservative, GoalType::Retirement);
        let a = allocation(&[
            (Instrument::LargeCapStocks, 0.3),
            (Instrument::FixedDeposits, 0.42),
            (Instrument::DebtFunds, 0.28),
        ]);
        let i = build_insights(&p, &a, Some(0.65));
        assert!(i
            .risk_management
            .iter()
            .any(|s| s.contains("from 65% to 30%")));
        assert!(i.goal_alignment[0].contains("retirement"));
    }

    #[test]
    fn plan_mentions_monthly_amount() {
        let plan = implementation_plan(15_000.0);
        assert!(plan.immediate_actions[1].contains("₹15000"));
        assert_eq!(plan.monitoring.len(), 3);
    }
}
