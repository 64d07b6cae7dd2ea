use clap::{Parser, Subcommand};
use finzer_core::domain::profile::UserProfile;
use finzer_core::domain::summary::FinancialSummary;
use finzer_core::domain::transaction::Transaction;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bootstrap;

#[derive(Debug, Parser)]
#[command(name = "finzer_worker")]
struct Args {
    /// JSON array of `{description, category}` used to train the text classifier.
    /// Overrides FINZER_TRANSACTION_SAMPLES; the built-in corpus is used when neither is set.
    #[arg(long, global = true)]
    transaction_samples: Option<PathBuf>,

    /// JSON array of `{profile, allocation}` used to train the allocation model.
    /// Overrides FINZER_ALLOCATION_SAMPLES.
    #[arg(long, global = true)]
    allocation_samples: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Categorize a JSON array of transactions.
    Categorize {
        #[arg(long)]
        input: PathBuf,
    },
    /// Recommend a portfolio for each profile in a JSON array.
    Recommend {
        #[arg(long)]
        input: PathBuf,
    },
    /// Categorize a month of transactions and summarize it against income.
    Analyze {
        #[arg(long)]
        income: f64,
        #[arg(long)]
        input: PathBuf,
    },
    /// Print categorizer and allocation model status.
    ModelInfo,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finzer_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args, &settings) {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %format!("{err:#}"), "worker run failed");
        return Err(err);
    }
    Ok(())
}

fn run(args: Args, settings: &finzer_core::config::Settings) -> anyhow::Result<()> {
    let transaction_samples = args
        .transaction_samples
        .or_else(|| settings.transaction_samples.clone());
    let allocation_samples = args
        .allocation_samples
        .or_else(|| settings.allocation_samples.clone());

    match args.command {
        Command::Categorize { input } => {
            let transactions: Vec<Transaction> = bootstrap::read_json(&input)?;
            bootstrap::check_transactions(&transactions, settings.max_batch_transactions)?;

            let categorizer = bootstrap::build_categorizer(transaction_samples.as_deref())?;
            let results = categorizer.batch_categorize(&transactions);
            let summary = categorizer.summarize(&results);
            print_json(&serde_json::json!({ "results": results, "summary": summary }))
        }
        Command::Recommend { input } => {
            let profiles: Vec<UserProfile> = bootstrap::read_json(&input)?;
            bootstrap::check_batch("profile", profiles.len(), settings.max_batch_profiles)?;

            let advisor = bootstrap::build_advisor(settings, allocation_samples.as_deref())?;
            print_json(&advisor.batch_recommend(&profiles))
        }
        Command::Analyze { income, input } => {
            anyhow::ensure!(
                income.is_finite() && income > 0.0,
                "--income must be positive (got {income})"
            );
            let transactions: Vec<Transaction> = bootstrap::read_json(&input)?;
            bootstrap::check_transactions(&transactions, settings.max_batch_transactions)?;

            let categorizer = bootstrap::build_categorizer(transaction_samples.as_deref())?;
            let decisions = categorizer.batch_categorize(&transactions);
            let summary = FinancialSummary::from_decisions(income, &decisions);
            tracing::info!(
                total_expenses = summary.total_expenses,
                savings_rate = summary.savings_rate,
                health = summary.financial_health_score,
                "financial summary computed"
            );
            print_json(&summary)
        }
        Command::ModelInfo => {
            let categorizer = bootstrap::build_categorizer(transaction_samples.as_deref())?;
            let advisor = bootstrap::build_advisor(settings, allocation_samples.as_deref())?;
            print_json(&serde_json::json!({
                "categorizer": categorizer.model_info(),
                "allocation_model": advisor.model_status(),
            }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

fn init_sentry(settings: &finzer_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
