use crate::domain::portfolio::{Instrument, RawAllocation};
use crate::domain::profile::{
    EmploymentType, GoalType, ProfileFeatures, RiskProfile, UserProfile,
};
use crate::error::EngineError;
use crate::model::{TrainModel, TrainingReport};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A trained model mapping profile features to per-instrument weights.
///
/// Output is not required to be normalized or even non-negative; the
/// constraint engine owns that.
pub trait AllocationRegressor: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &ProfileFeatures) -> Result<RawAllocation, EngineError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSample {
    pub profile: UserProfile,
    pub allocation: BTreeMap<Instrument, f64>,
}

pub const DEFAULT_RIDGE_LAMBDA: f64 = 1e-3;

const ENCODED_LEN: usize = ProfileFeatures::NUMERIC_LEN
    + EmploymentType::ALL.len()
    + RiskProfile::ALL.len()
    + GoalType::ALL.len()
    + 1;

const TARGETS: usize = Instrument::ALL.len();

/// Multi-output ridge regression over standardized numeric features and
/// one-hot categoricals.
#[derive(Debug, Clone)]
pub struct RidgeAllocationModel {
    means: [f64; ProfileFeatures::NUMERIC_LEN],
    scales: [f64; ProfileFeatures::NUMERIC_LEN],
    // ENCODED_LEN x TARGETS
    weights: DMatrix<f64>,
}

impl RidgeAllocationModel {
    pub fn train_with_lambda(
        samples: &[AllocationSample],
        lambda: f64,
    ) -> Result<(Self, TrainingReport), EngineError> {
        if samples.is_empty() {
            return Err(EngineError::Training(
                "allocation regressor needs at least one sample".to_string(),
            ));
        }
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(EngineError::Training(format!(
                "ridge lambda must be positive (got {lambda})"
            )));
        }

        let features: Vec<ProfileFeatures> =
            samples.iter().map(|s| s.profile.features()).collect();
        let targets: Vec<[f64; TARGETS]> = samples
            .iter()
            .enumerate()
            .map(|(i, s)| target_row(i, &s.allocation))
            .collect::<Result<_, _>>()?;

        let (means, scales) = standardization(&features);
        let rows: Vec<[f64; ENCODED_LEN]> = features
            .iter()
            .map(|f| encode(f, &means, &scales))
            .collect();

        let x = DMatrix::from_fn(rows.len(), ENCODED_LEN, |i, j| rows[i][j]);
        let y = DMatrix::from_fn(targets.len(), TARGETS, |i, t| targets[i][t]);

        // Normal equations: (XᵀX + λI')W = XᵀY, bias left unpenalized.
        let mut xtx = x.transpose() * &x;
        for i in 0..ENCODED_LEN - 1 {
            xtx[(i, i)] += lambda;
        }
        let xty = x.transpose() * &y;

        let weights = xtx.lu().solve(&xty).ok_or_else(|| {
            EngineError::Training("ridge normal equations are singular".to_string())
        })?;
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(EngineError::Training(
                "ridge solution contains non-finite weights".to_string(),
            ));
        }

        let model = Self {
            means,
            scales,
            weights,
        };

        let predictions: Vec<[f64; TARGETS]> = rows.iter().map(|x| model.apply(x)).collect();
        let report = TrainingReport {
            samples: samples.len(),
            fit_score: mean_r2(&targets, &predictions),
        };

        tracing::info!(
            samples = report.samples,
            lambda,
            r2 = report.fit_score,
            "trained ridge allocation model"
        );

        Ok((model, report))
    }

    fn apply(&self, x: &[f64; ENCODED_LEN]) -> [f64; TARGETS] {
        let y = self.weights.tr_mul(&DVector::from_column_slice(x));
        let mut out = [0.0; TARGETS];
        out.copy_from_slice(y.as_slice());
        out
    }
}

impl TrainModel for RidgeAllocationModel {
    type Sample = AllocationSample;

    fn train(samples: &[AllocationSample]) -> Result<(Self, TrainingReport), EngineError> {
        Self::train_with_lambda(samples, DEFAULT_RIDGE_LAMBDA)
    }
}

impl AllocationRegressor for RidgeAllocationModel {
    fn name(&self) -> &str {
        "ridge_regression"
    }

    fn predict(&self, features: &ProfileFeatures) -> Result<RawAllocation, EngineError> {
        let x = encode(features, &self.means, &self.scales);
        if x.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::Prediction(
                "profile features are not finite".to_string(),
            ));
        }
        let y = self.apply(&x);
        Ok(Instrument::ALL.iter().copied().zip(y).collect())
    }
}

fn target_row(
    index: usize,
    allocation: &BTreeMap<Instrument, f64>,
) -> Result<[f64; TARGETS], EngineError> {
    let mut row = [0.0; TARGETS];
    for (t, instrument) in Instrument::ALL.iter().enumerate() {
        let w = allocation.get(instrument).copied().unwrap_or(0.0);
        if !w.is_finite() {
            return Err(EngineError::Training(format!(
                "sample {index} has a non-finite weight for {instrument:?}"
            )));
        }
        row[t] = w;
    }
    Ok(row)
}

type Moments = (
    [f64; ProfileFeatures::NUMERIC_LEN],
    [f64; ProfileFeatures::NUMERIC_LEN],
);

fn standardization(features: &[ProfileFeatures]) -> Moments {
    let n = features.len() as f64;
    let mut means = [0.0; ProfileFeatures::NUMERIC_LEN];
    for f in features {
        for (m, v) in means.iter_mut().zip(f.numeric()) {
            *m += v / n;
        }
    }
    let mut scales = [0.0; ProfileFeatures::NUMERIC_LEN];
    for f in features {
        for ((s, v), m) in scales.iter_mut().zip(f.numeric()).zip(&means) {
            *s += (v - m).powi(2) / n;
        }
    }
    for s in scales.iter_mut() {
        *s = s.sqrt();
        if *s < 1e-12 {
            *s = 1.0;
        }
    }
    (means, scales)
}

fn encode(
    f: &ProfileFeatures,
    means: &[f64; ProfileFeatures::NUMERIC_LEN],
    scales: &[f64; ProfileFeatures::NUMERIC_LEN],
) -> [f64; ENCODED_LEN] {
    let mut x = [0.0; ENCODED_LEN];
    for (i, v) in f.numeric().iter().enumerate() {
        x[i] = (v - means[i]) / scales[i];
    }
    let mut offset = ProfileFeatures::NUMERIC_LEN;
    one_hot(&mut x, offset, &EmploymentType::ALL, f.employment_type);
    offset += EmploymentType::ALL.len();
    one_hot(&mut x, offset, &RiskProfile::ALL, f.risk_profile);
    offset += RiskProfile::ALL.len();
    one_hot(&mut x, offset, &GoalType::ALL, f.goal_type);
    x[ENCODED_LEN - 1] = 1.0;
    x
}

fn one_hot<T: PartialEq + Copy>(x: &mut [f64], offset: usize, levels: &[T], value: T) {
    if let Some(pos) = levels.iter().position(|l| *l == value) {
        x[offset + pos] = 1.0;
    }
}

fn mean_r2(targets: &[[f64; TARGETS]], predictions: &[[f64; TARGETS]]) -> f64 {
    let n = targets.len() as f64;
    let mut scores = Vec::with_capacity(TARGETS);
    for t in 0..TARGETS {
        let mean = targets.iter().map(|y| y[t]).sum::<f64>() / n;
        let ss_tot: f64 = targets.iter().map(|y| (y[t] - mean).powi(2)).sum();
        if ss_tot < 1e-12 {
            continue;
        }
        let ss_res: f64 = targets
            .iter()
            .zip(predictions)
            .map(|(y, p)| (y[t] - p[t]).powi(2))
            .sum();
        scores.push(1.0 - ss_res / ss_tot);
    }
    if scores.is_empty() {
        1.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(risk: RiskProfile, age: u32, weights: &[(Instrument, f64)]) -> AllocationSample {
        AllocationSample {
            profile: UserProfile::new(
                60_000.0 + age as f64 * 500.0,
                age,
                risk,
                GoalType::Retirement,
            ),
            allocation: weights.iter().copied().collect(),
        }
    }

    fn training_set() -> Vec<AllocationSample> {
        use Instrument::*;
        let mut out = Vec::new();
        for age in [25, 35, 45, 55] {
            out.push(sample(
                RiskProfile::Conservative,
                age,
                &[(FixedDeposits, 0.5), (DebtFunds, 0.3), (LargeCapStocks, 0.2)],
            ));
            out.push(sample(
                RiskProfile::Moderate,
                age,
                &[(FixedDeposits, 0.3), (LargeCapStocks, 0.4), (MidCapStocks, 0.3)],
            ));
            out.push(sample(
                RiskProfile::Aggressive,
                age,
                &[(LargeCapStocks, 0.4), (MidCapStocks, 0.3), (SmallCapStocks, 0.3)],
            ));
        }
        out
    }

    #[test]
    fn recovers_profile_dependent_allocations() {
        let (model, report) = RidgeAllocationModel::train(&training_set()).unwrap();
        assert_eq!(report.samples, 12);
        assert!(report.fit_score > 0.99, "r2 = {}", report.fit_score);

        let p = UserProfile::new(75_000.0, 40, RiskProfile::Aggressive, GoalType::Retirement);
        let raw = model.predict(&p.features()).unwrap();
        assert_eq!(raw.len(), 14);
        assert!((raw[&Instrument::SmallCapStocks] - 0.3).abs() < 0.05);
        assert!(raw[&Instrument::FixedDeposits].abs() < 0.05);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let (model, _) = RidgeAllocationModel::train(&training_set()).unwrap();
        let f = UserProfile::new(50_000.0, 30, RiskProfile::Moderate, GoalType::EmergencyFund)
            .features();
        let a = model.predict(&f).unwrap();
        let b = model.predict(&f).unwrap();
        for i in Instrument::ALL {
            assert_eq!(a[&i].to_bits(), b[&i].to_bits());
        }
    }

    #[test]
    fn single_sample_is_enough() {
        let set = vec![sample(
            RiskProfile::Moderate,
            30,
            &[(Instrument::Gold, 1.0)],
        )];
        let (model, _) = RidgeAllocationModel::train(&set).unwrap();
        let raw = model.predict(&set[0].profile.features()).unwrap();
        assert!((raw[&Instrument::Gold] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_training_input() {
        assert!(RidgeAllocationModel::train(&[]).is_err());
        let bad = vec![sample(
            RiskProfile::Moderate,
            30,
            &[(Instrument::Gold, f64::NAN)],
        )];
        assert!(matches!(
            RidgeAllocationModel::train(&bad),
            Err(EngineError::Training(_))
        ));
        assert!(RidgeAllocationModel::train_with_lambda(&training_set(), 0.0).is_err());
    }
}
