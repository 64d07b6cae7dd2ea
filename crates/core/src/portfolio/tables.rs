//! Fixed lookup tables keyed by instrument, risk profile and goal.

use crate::domain::portfolio::Instrument;
use crate::domain::profile::{GoalType, RiskProfile};

/// Long-run expected annual return, in percent.
pub fn expected_return(instrument: Instrument) -> f64 {
    use Instrument::*;
    match instrument {
        FixedDeposits => 6.5,
        DebtFunds => 7.5,
        GovernmentBonds => 7.0,
        CorporateBonds => 8.0,
        LargeCapStocks => 12.0,
        MidCapStocks => 14.0,
        SmallCapStocks => 15.0,
        SectoralFunds => 13.0,
        BalancedFunds => 10.0,
        ArbitrageFunds => 6.0,
        MultiAsset => 9.0,
        Gold => 8.0,
        RealEstate => 11.0,
        International => 10.0,
    }
}

/// Risk on a 1 (capital safe) to 8 (most volatile) scale.
pub fn risk_score(instrument: Instrument) -> f64 {
    use Instrument::*;
    match instrument {
        FixedDeposits | GovernmentBonds => 1.0,
        DebtFunds | CorporateBonds | ArbitrageFunds => 2.0,
        BalancedFunds => 4.0,
        MultiAsset | Gold => 5.0,
        LargeCapStocks | RealEstate => 6.0,
        MidCapStocks | SectoralFunds | International => 7.0,
        SmallCapStocks => 8.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLimits {
    pub equity_max: f64,
}

impl RiskLimits {
    pub const fn for_profile(profile: RiskProfile) -> Self {
        match profile {
            RiskProfile::Conservative => Self { equity_max: 0.3 },
            RiskProfile::Moderate => Self { equity_max: 0.6 },
            RiskProfile::Aggressive => Self { equity_max: 0.8 },
        }
    }
}

/// How much a goal values liquidity, in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalStrategy {
    pub liquidity_importance: f64,
}

impl GoalStrategy {
    pub const fn for_goal(goal: GoalType) -> Self {
        let liquidity_importance = match goal {
            GoalType::EmergencyFund => 0.9,
            GoalType::Retirement => 0.3,
            GoalType::WealthBuilding => 0.4,
            GoalType::EducationFund => 0.6,
            GoalType::HouseDownPayment => 0.7,
            GoalType::VacationFund => 0.8,
        };
        Self {
            liquidity_importance,
        }
    }
}

const CONSERVATIVE_MIX: &[(Instrument, f64)] = &[
    (Instrument::FixedDeposits, 0.4),
    (Instrument::DebtFunds, 0.3),
    (Instrument::LargeCapStocks, 0.2),
    (Instrument::Gold, 0.1),
];

const MODERATE_MIX: &[(Instrument, f64)] = &[
    (Instrument::LargeCapStocks, 0.3),
    (Instrument::DebtFunds, 0.25),
    (Instrument::FixedDeposits, 0.25),
    (Instrument::MidCapStocks, 0.2),
];

const AGGRESSIVE_MIX: &[(Instrument, f64)] = &[
    (Instrument::LargeCapStocks, 0.4),
    (Instrument::MidCapStocks, 0.3),
    (Instrument::SmallCapStocks, 0.2),
    (Instrument::DebtFunds, 0.1),
];

/// Fixed mix served when no allocation model can be used.
pub fn fallback_mix(profile: RiskProfile) -> &'static [(Instrument, f64)] {
    match profile {
        RiskProfile::Conservative => CONSERVATIVE_MIX,
        RiskProfile::Moderate => MODERATE_MIX,
        RiskProfile::Aggressive => AGGRESSIVE_MIX,
    }
}
