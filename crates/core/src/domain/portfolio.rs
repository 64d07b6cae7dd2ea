use crate::model::ModelInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    FixedIncome,
    Equity,
    Hybrid,
    Alternatives,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::FixedIncome,
        AssetClass::Equity,
        AssetClass::Hybrid,
        AssetClass::Alternatives,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    FixedDeposits,
    DebtFunds,
    GovernmentBonds,
    CorporateBonds,
    LargeCapStocks,
    MidCapStocks,
    SmallCapStocks,
    SectoralFunds,
    BalancedFunds,
    ArbitrageFunds,
    MultiAsset,
    Gold,
    RealEstate,
    International,
}

impl Instrument {
    pub const ALL: [Instrument; 14] = [
        Instrument::FixedDeposits,
        Instrument::DebtFunds,
        Instrument::GovernmentBonds,
        Instrument::CorporateBonds,
        Instrument::LargeCapStocks,
        Instrument::MidCapStocks,
        Instrument::SmallCapStocks,
        Instrument::SectoralFunds,
        Instrument::BalancedFunds,
        Instrument::ArbitrageFunds,
        Instrument::MultiAsset,
        Instrument::Gold,
        Instrument::RealEstate,
        Instrument::International,
    ];

    pub fn asset_class(self) -> AssetClass {
        use Instrument::*;
        match self {
            FixedDeposits | DebtFunds | GovernmentBonds | CorporateBonds => AssetClass::FixedIncome,
            LargeCapStocks | MidCapStocks | SmallCapStocks | SectoralFunds => AssetClass::Equity,
            BalancedFunds | ArbitrageFunds | MultiAsset => AssetClass::Hybrid,
            Gold | RealEstate | International => AssetClass::Alternatives,
        }
    }

    pub fn is_equity(self) -> bool {
        self.asset_class() == AssetClass::Equity
    }
}

/// Unconstrained model output: any real number per instrument.
pub type RawAllocation = BTreeMap<Instrument, f64>;

/// Instrument weights after constraint processing.
///
/// Inside the crate only the constraint engine builds these; every vector it
/// hands out sums to 1 and holds no negative weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationVector(BTreeMap<Instrument, f64>);

impl AllocationVector {
    pub(crate) fn from_weights(weights: BTreeMap<Instrument, f64>) -> Self {
        Self(weights)
    }

    pub fn weight(&self, instrument: Instrument) -> f64 {
        self.0.get(&instrument).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Instrument, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn class_weight(&self, class: AssetClass) -> f64 {
        self.iter()
            .filter(|(i, _)| i.asset_class() == class)
            .map(|(_, w)| w)
            .sum()
    }

    pub fn equity_weight(&self) -> f64 {
        self.class_weight(AssetClass::Equity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    MlModel,
    RuleBasedFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScores {
    pub stability: f64,
    pub readiness: f64,
    pub risk_capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub monthly_investment: f64,
    pub projected_value: f64,
    pub total_invested: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedReturns {
    pub time_horizon_years: u32,
    pub risk_adjusted_return: f64,
    pub volatility_estimate: f64,
    pub projection: Option<Projection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub portfolio: Vec<String>,
    pub risk_management: Vec<String>,
    pub goal_alignment: Vec<String>,
    pub improvement: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImplementationPlan {
    pub immediate_actions: Vec<String>,
    pub short_term_plan: Vec<String>,
    pub long_term_strategy: Vec<String>,
    pub monitoring: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationMetadata {
    pub method: AllocationMethod,
    pub confidence_score: f64,
    pub model: Option<ModelInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRecommendation {
    pub allocation: AllocationVector,
    pub investment_amount: f64,
    pub amounts: BTreeMap<Instrument, f64>,
    pub by_asset_class: BTreeMap<AssetClass, f64>,
    pub expected_return: f64,
    pub expected_returns: ExpectedReturns,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub diversification_score: f64,
    pub health: HealthScores,
    pub suitability_score: f64,
    pub insights: Insights,
    pub plan: ImplementationPlan,
    pub metadata: RecommendationMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fourteen_instruments_over_four_classes() {
        assert_eq!(Instrument::ALL.len(), 14);
        for class in AssetClass::ALL {
            assert!(Instrument::ALL.iter().any(|i| i.asset_class() == class));
        }
        let equity: Vec<_> = Instrument::ALL.iter().filter(|i| i.is_equity()).collect();
        assert_eq!(equity.len(), 4);
    }

    #[test]
    fn allocation_serializes_as_plain_map() {
        let mut w = BTreeMap::new();
        w.insert(Instrument::LargeCapStocks, 0.6);
        w.insert(Instrument::Gold, 0.4);
        let v = serde_json::to_value(AllocationVector::from_weights(w)).unwrap();
        assert_eq!(v, json!({"large_cap_stocks": 0.6, "gold": 0.4}));
    }

    #[test]
    fn class_weight_sums_members() {
        let mut w = BTreeMap::new();
        w.insert(Instrument::LargeCapStocks, 0.25);
        w.insert(Instrument::SmallCapStocks, 0.15);
        w.insert(Instrument::FixedDeposits, 0.6);
        let a = AllocationVector::from_weights(w);
        assert!((a.equity_weight() - 0.4).abs() < 1e-12);
        assert!((a.class_weight(AssetClass::FixedIncome) - 0.6).abs() < 1e-12);
        assert_eq!(a.class_weight(AssetClass::Hybrid), 0.0);
    }
}
