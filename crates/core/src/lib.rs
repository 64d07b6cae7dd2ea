pub mod categorize;
pub mod decision;
pub mod domain;
pub mod error;
pub mod model;
pub mod portfolio;

pub mod config {
    use crate::model::regression::DEFAULT_RIDGE_LAMBDA;
    use crate::portfolio::ConstraintPolicy;
    use anyhow::{bail, Context};
    use std::path::PathBuf;
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum EquityCapPolicy {
        #[default]
        ConservativeOnly,
        AllProfiles,
    }

    impl EquityCapPolicy {
        pub fn constraint_policy(self) -> ConstraintPolicy {
            match self {
                EquityCapPolicy::ConservativeOnly => ConstraintPolicy::conservative_only(),
                EquityCapPolicy::AllProfiles => ConstraintPolicy::all_profiles(),
            }
        }
    }

    impl FromStr for EquityCapPolicy {
        type Err = anyhow::Error;

        fn from_str(s: &str) -> anyhow::Result<Self> {
            match s.trim() {
                "conservative_only" => Ok(EquityCapPolicy::ConservativeOnly),
                "all_profiles" => Ok(EquityCapPolicy::AllProfiles),
                other => bail!(
                    "unknown equity cap policy {other:?} \
                     (expected conservative_only or all_profiles)"
                ),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub transaction_samples: Option<PathBuf>,
        pub allocation_samples: Option<PathBuf>,
        pub equity_cap_policy: EquityCapPolicy,
        pub max_batch_transactions: usize,
        pub max_batch_profiles: usize,
        pub ridge_lambda: f64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            let equity_cap_policy = match var("FINZER_EQUITY_CAP_POLICY") {
                Some(v) => v
                    .parse::<EquityCapPolicy>()
                    .context("FINZER_EQUITY_CAP_POLICY is invalid")?,
                None => EquityCapPolicy::default(),
            };

            let ridge_lambda = parse_or(
                var("FINZER_RIDGE_LAMBDA"),
                "FINZER_RIDGE_LAMBDA",
                DEFAULT_RIDGE_LAMBDA,
            )?;
            anyhow::ensure!(
                ridge_lambda.is_finite() && ridge_lambda > 0.0,
                "FINZER_RIDGE_LAMBDA must be positive (got {ridge_lambda})"
            );

            Ok(Self {
                sentry_dsn: var("SENTRY_DSN"),
                transaction_samples: var("FINZER_TRANSACTION_SAMPLES").map(PathBuf::from),
                allocation_samples: var("FINZER_ALLOCATION_SAMPLES").map(PathBuf::from),
                equity_cap_policy,
                max_batch_transactions: parse_or(
                    var("FINZER_MAX_BATCH_TRANSACTIONS"),
                    "FINZER_MAX_BATCH_TRANSACTIONS",
                    100,
                )?,
                max_batch_profiles: parse_or(
                    var("FINZER_MAX_BATCH_PROFILES"),
                    "FINZER_MAX_BATCH_PROFILES",
                    50,
                )?,
                ridge_lambda,
            })
        }
    }

    fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match value {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("{key} is not a valid value: {v:?}")),
            None => Ok(default),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
            let map: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|k| map.get(k).cloned())
        }

        #[test]
        fn defaults_when_unset() {
            let s = settings(&[]).unwrap();
            assert_eq!(s.equity_cap_policy, EquityCapPolicy::ConservativeOnly);
            assert_eq!(s.max_batch_transactions, 100);
            assert_eq!(s.max_batch_profiles, 50);
            assert_eq!(s.ridge_lambda, DEFAULT_RIDGE_LAMBDA);
            assert!(s.transaction_samples.is_none());
            assert!(s.sentry_dsn.is_none());
        }

        #[test]
        fn reads_overrides() {
            let s = settings(&[
                ("FINZER_EQUITY_CAP_POLICY", "all_profiles"),
                ("FINZER_MAX_BATCH_PROFILES", "10"),
                ("FINZER_ALLOCATION_SAMPLES", "/tmp/alloc.json"),
                ("SENTRY_DSN", ""),
            ])
            .unwrap();
            assert_eq!(s.equity_cap_policy, EquityCapPolicy::AllProfiles);
            assert_eq!(s.max_batch_profiles, 10);
            assert_eq!(s.allocation_samples, Some(PathBuf::from("/tmp/alloc.json")));
            assert!(s.sentry_dsn.is_none());
            assert_eq!(
                s.equity_cap_policy.constraint_policy().equity_caps.len(),
                3
            );
        }

        #[test]
        fn rejects_malformed_values() {
            assert!(settings(&[("FINZER_EQUITY_CAP_POLICY", "none")]).is_err());
            assert!(settings(&[("FINZER_MAX_BATCH_TRANSACTIONS", "lots")]).is_err());
            assert!(settings(&[("FINZER_RIDGE_LAMBDA", "-1")]).is_err());
        }
    }
}
