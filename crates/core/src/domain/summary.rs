use crate::domain::transaction::{CategorizationDecision, Category};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only snapshot of a user's month, handed to the advice generator as
/// prompt context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub savings_amount: f64,
    pub savings_rate: f64,
    pub category_breakdown: BTreeMap<Category, f64>,
    pub top_category: Option<Category>,
    pub financial_health_score: u32,
}

impl FinancialSummary {
    pub fn from_decisions(monthly_income: f64, decisions: &[CategorizationDecision]) -> Self {
        let mut category_breakdown = BTreeMap::<Category, f64>::new();
        let mut total_expenses = 0.0;
        for d in decisions {
            let amount = d.amount.unwrap_or(0.0);
            total_expenses += amount;
            *category_breakdown.entry(d.category).or_insert(0.0) += amount;
        }

        let savings_amount = (monthly_income - total_expenses).max(0.0);
        let raw_rate = if monthly_income > 0.0 {
            savings_amount / monthly_income * 100.0
        } else {
            0.0
        };

        // Strict comparison keeps the first category in declaration order on ties.
        let mut top_category: Option<(Category, f64)> = None;
        for (cat, amount) in &category_breakdown {
            match top_category {
                Some((_, best)) if *amount <= best => {}
                _ => top_category = Some((*cat, *amount)),
            }
        }

        // Tiers use the unrounded rate; only the reported rate is rounded.
        let financial_health_score = health_score(
            raw_rate,
            category_breakdown.len(),
            monthly_income,
        );

        Self {
            total_income: monthly_income,
            total_expenses,
            savings_amount,
            savings_rate: round2(raw_rate),
            category_breakdown,
            top_category: top_category.map(|(c, _)| c),
            financial_health_score,
        }
    }
}

fn health_score(savings_rate: f64, category_count: usize, income: f64) -> u32 {
    let savings_part = if savings_rate >= 20.0 {
        40
    } else if savings_rate >= 15.0 {
        32
    } else if savings_rate >= 10.0 {
        24
    } else if savings_rate >= 5.0 {
        16
    } else {
        8
    };

    let spread_part = match category_count {
        n if n >= 5 => 30,
        n if n >= 3 => 24,
        2 => 18,
        _ => 12,
    };

    let income_part = if income >= 50_000.0 {
        30
    } else if income >= 30_000.0 {
        24
    } else if income >= 20_000.0 {
        18
    } else {
        12
    };

    (savings_part + spread_part + income_part).clamp(10, 100)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
