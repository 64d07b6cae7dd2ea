use crate::error::EngineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 3] = [
        RiskProfile::Conservative,
        RiskProfile::Moderate,
        RiskProfile::Aggressive,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GoalType {
    #[serde(rename = "Emergency Fund")]
    EmergencyFund,
    #[serde(rename = "Retirement")]
    Retirement,
    #[serde(rename = "Wealth Building")]
    WealthBuilding,
    #[serde(rename = "Education Fund")]
    EducationFund,
    #[serde(rename = "House Down Payment")]
    HouseDownPayment,
    #[serde(rename = "Vacation Fund")]
    VacationFund,
}

impl GoalType {
    pub const ALL: [GoalType; 6] = [
        GoalType::EmergencyFund,
        GoalType::Retirement,
        GoalType::WealthBuilding,
        GoalType::EducationFund,
        GoalType::HouseDownPayment,
        GoalType::VacationFund,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    #[default]
    Salaried,
    #[serde(rename = "Self-Employed")]
    SelfEmployed,
    Business,
    Professional,
    Student,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 5] = [
        EmploymentType::Salaried,
        EmploymentType::SelfEmployed,
        EmploymentType::Business,
        EmploymentType::Professional,
        EmploymentType::Student,
    ];
}

const DEFAULT_EXPENSE_RATIO: f64 = 0.7;
const DEFAULT_INVESTMENT_RATIO: f64 = 0.2;
const RETIREMENT_AGE: f64 = 65.0;

/// Monthly figures in the user's currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub income: f64,
    pub age: u32,
    pub risk_profile: RiskProfile,
    pub goal_type: GoalType,
    #[serde(default)]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub existing_savings: f64,
    #[serde(default)]
    pub debt_amount: f64,
    #[serde(default)]
    pub monthly_expenses: Option<f64>,
    #[serde(default)]
    pub investment_amount: Option<f64>,
}

impl UserProfile {
    pub fn new(income: f64, age: u32, risk_profile: RiskProfile, goal_type: GoalType) -> Self {
        Self {
            income,
            age,
            risk_profile,
            goal_type,
            employment_type: EmploymentType::default(),
            existing_savings: 0.0,
            debt_amount: 0.0,
            monthly_expenses: None,
            investment_amount: None,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.income.is_finite() || self.income <= 0.0 {
            return Err(EngineError::Validation(format!(
                "income must be positive (got {})",
                self.income
            )));
        }
        if !(18..=100).contains(&self.age) {
            return Err(EngineError::Validation(format!(
                "age must be between 18 and 100 (got {})",
                self.age
            )));
        }
        non_negative("existing_savings", self.existing_savings)?;
        non_negative("debt_amount", self.debt_amount)?;
        if let Some(v) = self.monthly_expenses {
            non_negative("monthly_expenses", v)?;
        }
        if let Some(v) = self.investment_amount {
            non_negative("investment_amount", v)?;
        }
        Ok(())
    }

    pub fn monthly_expenses_or_default(&self) -> f64 {
        self.monthly_expenses
            .unwrap_or(self.income * DEFAULT_EXPENSE_RATIO)
    }

    pub fn investment_amount_or_default(&self) -> f64 {
        self.investment_amount
            .unwrap_or(self.income * DEFAULT_INVESTMENT_RATIO)
    }

    pub fn debt_to_income_ratio(&self) -> f64 {
        ratio(self.debt_amount, self.income)
    }

    pub fn savings_to_income_ratio(&self) -> f64 {
        ratio(self.existing_savings, self.income)
    }

    pub fn investment_to_income_ratio(&self) -> f64 {
        ratio(self.investment_amount_or_default(), self.income)
    }

    /// Share of a working life still ahead; negative past retirement age.
    pub fn age_factor(&self) -> f64 {
        (RETIREMENT_AGE - self.age as f64) / RETIREMENT_AGE
    }

    pub fn features(&self) -> ProfileFeatures {
        ProfileFeatures {
            income: self.income,
            age: self.age as f64,
            existing_savings: self.existing_savings,
            debt_amount: self.debt_amount,
            monthly_expenses: self.monthly_expenses_or_default(),
            investment_amount: self.investment_amount_or_default(),
            debt_to_income_ratio: self.debt_to_income_ratio(),
            savings_to_income_ratio: self.savings_to_income_ratio(),
            investment_to_income_ratio: self.investment_to_income_ratio(),
            age_factor: self.age_factor(),
            employment_type: self.employment_type,
            risk_profile: self.risk_profile,
            goal_type: self.goal_type,
        }
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::Validation(format!(
            "{field} must be a non-negative number (got {value})"
        )));
    }
    Ok(())
}

fn ratio(numerator: f64, income: f64) -> f64 {
    if income > 0.0 {
        numerator / income
    } else {
        0.0
    }
}

/// The model-facing view of a profile: defaults resolved, ratios derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFeatures {
    pub income: f64,
    pub age: f64,
    pub existing_savings: f64,
    pub debt_amount: f64,
    pub monthly_expenses: f64,
    pub investment_amount: f64,
    pub debt_to_income_ratio: f64,
    pub savings_to_income_ratio: f64,
    pub investment_to_income_ratio: f64,
    pub age_factor: f64,
    pub employment_type: EmploymentType,
    pub risk_profile: RiskProfile,
    pub goal_type: GoalType,
}

impl ProfileFeatures {
    pub const NUMERIC_LEN: usize = 10;

    pub fn numeric(&self) -> [f64; Self::NUMERIC_LEN] {
        [
            self.income,
            self.age,
            self.existing_savings,
            self.debt_amount,
            self.monthly_expenses,
            self.investment_amount,
            self.debt_to_income_ratio,
            self.savings_to_income_ratio,
            self.investment_to_income_ratio,
            self.age_factor,
        ]
    }
}
