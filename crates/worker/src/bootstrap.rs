use anyhow::Context;
use finzer_core::categorize::{corpus, TransactionCategorizer};
use finzer_core::config::Settings;
use finzer_core::domain::transaction::Transaction;
use finzer_core::model::{AllocationSample, LabelledText};
use finzer_core::portfolio::{AllocationConstraintEngine, PortfolioAdvisor};
use serde::de::DeserializeOwned;
use std::path::Path;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {} failed", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {} failed", path.display()))
}

/// Trains the text classifier from `samples`, or from the built-in corpus.
pub fn build_categorizer(samples: Option<&Path>) -> anyhow::Result<TransactionCategorizer> {
    let training: Vec<LabelledText> = match samples {
        Some(path) => read_json(path)?,
        None => corpus::labelled_transactions(),
    };
    let categorizer =
        TransactionCategorizer::train(&training).context("train text classifier failed")?;
    tracing::info!(
        samples = training.len(),
        source = samples.map(|p| p.display().to_string()).unwrap_or_else(|| "built-in".into()),
        "transaction categorizer ready"
    );
    Ok(categorizer)
}

/// Without allocation samples the advisor only serves the fallback table.
pub fn build_advisor(
    settings: &Settings,
    samples: Option<&Path>,
) -> anyhow::Result<PortfolioAdvisor> {
    let constraints =
        AllocationConstraintEngine::new(settings.equity_cap_policy.constraint_policy());
    let advisor =
        PortfolioAdvisor::untrained(constraints).with_ridge_lambda(settings.ridge_lambda);

    match samples {
        Some(path) => {
            let training: Vec<AllocationSample> = read_json(path)?;
            let info = advisor
                .retrain(&training)
                .with_context(|| format!("train allocation model from {} failed", path.display()))?;
            tracing::info!(
                model_id = %info.model_id,
                samples = info.training_samples,
                fit_score = info.fit_score,
                "portfolio advisor ready"
            );
        }
        None => {
            tracing::warn!(
                "no allocation samples configured; recommendations use the rule-based fallback"
            );
        }
    }
    Ok(advisor)
}

pub fn check_batch(kind: &str, len: usize, max: usize) -> anyhow::Result<()> {
    anyhow::ensure!(len > 0, "{kind} input is empty");
    anyhow::ensure!(
        len <= max,
        "{kind} batch of {len} exceeds the limit of {max}"
    );
    Ok(())
}

/// Batch limits plus the amount rule; a refund-style negative amount rejects the file.
pub fn check_transactions(transactions: &[Transaction], max: usize) -> anyhow::Result<()> {
    check_batch("transaction", transactions.len(), max)?;
    for (idx, txn) in transactions.iter().enumerate() {
        txn.validate_amount()
            .with_context(|| format!("transaction {idx} ({:?}) is invalid", txn.description))?;
    }
    Ok(())
}
