use crate::categorize::rules::KeywordRuleMatcher;
use crate::decision::{guard_model, DecisionSource, Signal, SourceKind};
use crate::domain::transaction::{
    Alternative, CategorizationDecision, Category, Method, Transaction,
};
use crate::error::EngineError;
use crate::model::{
    LabelledText, ModelInfo, ModelStore, NaiveBayesClassifier, TextClassifier, TrainModel,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Rule matches above this confidence skip the classifier entirely.
const RULE_SHORT_CIRCUIT: f64 = 0.5;
/// Rule matches at or below this confidence never compete with the classifier.
const RULE_CONFLICT_MIN: f64 = 0.3;

const EMPTY_DESCRIPTION: &str = "Empty description provided";
const CLASSIFIER_MISSING: &str = "text classifier not available";

/// Adapts a loaded text classifier to the decision-source lens.
pub struct ClassifierSource<'a>(pub &'a dyn TextClassifier);

impl DecisionSource<str> for ClassifierSource<'_> {
    type Output = Category;

    fn kind(&self) -> SourceKind {
        SourceKind::Model
    }

    fn decide(&self, input: &str) -> Result<Option<Signal<Category>>, EngineError> {
        let prediction = guard_model(self.0.name(), || self.0.predict(input))?;
        Ok(Some(Signal::new(prediction.category, prediction.confidence())))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed_count: usize,
    pub category_totals: BTreeMap<Category, f64>,
    pub total_amount: f64,
    /// Percent of `total_amount`, rounded to two decimals.
    pub category_distribution: BTreeMap<Category, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizerInfo {
    pub is_trained: bool,
    pub model: Option<ModelInfo>,
    pub categories: Vec<Category>,
    pub rules_count: BTreeMap<Category, usize>,
}

/// Two-stage categorizer: keyword rules first, the text classifier second.
pub struct TransactionCategorizer {
    rules: KeywordRuleMatcher,
    classifier: ModelStore<dyn TextClassifier>,
}

impl TransactionCategorizer {
    /// Rules only; every call that needs the classifier falls back.
    pub fn untrained(rules: KeywordRuleMatcher) -> Self {
        Self {
            rules,
            classifier: ModelStore::empty(),
        }
    }

    pub fn with_classifier(
        rules: KeywordRuleMatcher,
        classifier: Box<dyn TextClassifier>,
        info: ModelInfo,
    ) -> Self {
        Self {
            rules,
            classifier: ModelStore::with_model(classifier, info),
        }
    }

    /// Default keyword table plus a naive Bayes model fitted on `samples`.
    pub fn train(samples: &[LabelledText]) -> Result<Self, EngineError> {
        let categorizer = Self::untrained(KeywordRuleMatcher::default());
        categorizer.retrain(samples)?;
        Ok(categorizer)
    }

    pub fn categorize(&self, description: &str, amount: Option<f64>) -> CategorizationDecision {
        let description = description.trim();
        if description.is_empty() {
            return CategorizationDecision::failed(description, amount, EMPTY_DESCRIPTION);
        }

        let rule = self.rules.decide(description).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "keyword rules failed");
            None
        });

        if let Some(r) = &rule {
            if r.confidence > RULE_SHORT_CIRCUIT {
                tracing::debug!(
                    category = r.value.as_str(),
                    confidence = r.confidence,
                    "rule match"
                );
                return CategorizationDecision::new(
                    description,
                    r.value,
                    r.confidence,
                    Method::Rule,
                    amount,
                );
            }
        }

        let Some(model) = self.classifier.current() else {
            return fallback(description, amount, rule, CLASSIFIER_MISSING);
        };

        let ml = match ClassifierSource(model.model.as_ref()).decide(description) {
            Ok(Some(signal)) => signal,
            Ok(None) => return fallback(description, amount, rule, CLASSIFIER_MISSING),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    classifier = model.model.name(),
                    "classifier prediction failed"
                );
                return fallback(description, amount, rule, err.to_string());
            }
        };

        let decision = resolve(description, amount, rule, ml);
        tracing::debug!(
            category = decision.category.as_str(),
            confidence = decision.confidence,
            method = ?decision.method,
            "categorized transaction"
        );
        decision
    }

    pub fn categorize_transaction(&self, transaction: &Transaction) -> CategorizationDecision {
        self.categorize(&transaction.description, transaction.amount)
    }

    /// One decision per input, in input order, tagged with its index.
    pub fn batch_categorize(&self, transactions: &[Transaction]) -> Vec<CategorizationDecision> {
        transactions
            .par_iter()
            .enumerate()
            .map(|(idx, txn)| {
                let decision = catch_unwind(AssertUnwindSafe(|| self.categorize_transaction(txn)))
                    .unwrap_or_else(|_| {
                        tracing::error!(transaction_id = idx, "categorization panicked");
                        CategorizationDecision::failed(
                            txn.description.trim(),
                            txn.amount,
                            "categorization failed unexpectedly",
                        )
                    });
                decision.with_transaction_id(idx)
            })
            .collect()
    }

    pub fn summarize(&self, decisions: &[CategorizationDecision]) -> BatchSummary {
        let mut category_totals = BTreeMap::<Category, f64>::new();
        for d in decisions {
            *category_totals.entry(d.category).or_insert(0.0) += d.amount.unwrap_or(0.0);
        }
        let total_amount: f64 = category_totals.values().sum();

        let category_distribution = category_totals
            .iter()
            .map(|(cat, amount)| {
                let pct = if total_amount > 0.0 {
                    round2(amount / total_amount * 100.0)
                } else {
                    0.0
                };
                (*cat, pct)
            })
            .collect();

        BatchSummary {
            processed_count: decisions.len(),
            category_totals,
            total_amount,
            category_distribution,
        }
    }

    /// Fits a fresh classifier and swaps it in; on error the current one stays.
    pub fn retrain(&self, samples: &[LabelledText]) -> Result<ModelInfo, EngineError> {
        let (model, report) = NaiveBayesClassifier::train(samples)?;
        if let Some(sample) = samples.first() {
            model.predict(&sample.description)?;
        }
        let info = ModelInfo::new(model.name(), &report);
        self.classifier.swap(Box::new(model), info.clone());
        Ok(info)
    }

    pub fn model_info(&self) -> CategorizerInfo {
        CategorizerInfo {
            is_trained: self.classifier.is_loaded(),
            model: self.classifier.info(),
            categories: self.rules.categories(),
            rules_count: self.rules.keyword_counts(),
        }
    }
}

fn fallback(
    description: &str,
    amount: Option<f64>,
    rule: Option<Signal<Category>>,
    error: impl Into<String>,
) -> CategorizationDecision {
    let decision = match rule {
        Some(r) => CategorizationDecision::new(
            description,
            r.value,
            r.confidence,
            Method::RuleFallback,
            amount,
        ),
        None => {
            CategorizationDecision::new(description, Category::Other, 0.0, Method::None, amount)
        }
    };
    decision.with_error(error)
}

fn resolve(
    description: &str,
    amount: Option<f64>,
    rule: Option<Signal<Category>>,
    ml: Signal<Category>,
) -> CategorizationDecision {
    let Some(rule) = rule.filter(|r| r.confidence > RULE_CONFLICT_MIN) else {
        return CategorizationDecision::new(
            description,
            ml.value,
            ml.confidence,
            Method::Ml,
            amount,
        );
    };

    if rule.value == ml.value {
        let confidence = ((rule.confidence + ml.confidence) / 2.0).min(1.0);
        return CategorizationDecision::new(
            description,
            rule.value,
            confidence,
            Method::Hybrid,
            amount,
        );
    }

    let mut alternatives = BTreeMap::new();
    alternatives.insert(
        SourceKind::Rule,
        Alternative {
            category: rule.value,
            confidence: rule.confidence,
        },
    );
    alternatives.insert(
        SourceKind::Model,
        Alternative {
            category: ml.value,
            confidence: ml.confidence,
        },
    );

    // Equal confidence goes to the rule.
    let (winner, method) = if rule.confidence >= ml.confidence {
        (rule, Method::RulePriority)
    } else {
        (ml, Method::MlPriority)
    };
    CategorizationDecision::new(description, winner.value, winner.confidence, method, amount)
        .with_alternatives(alternatives)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::corpus::labelled_transactions;
    use crate::model::{TextPrediction, TrainingReport};

    struct Fixed {
        category: Category,
        confidence: f64,
    }

    impl TextClassifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, text: &str) -> Result<TextPrediction, EngineError> {
            if text.contains("boom") {
                panic!("classifier blew up");
            }
            if text.contains("fail") {
                return Err(EngineError::Prediction("model exploded".to_string()));
            }
            Ok(TextPrediction {
                category: self.category,
                probabilities: BTreeMap::from([(self.category, self.confidence)]),
            })
        }
    }

    fn stubbed(category: Category, confidence: f64) -> TransactionCategorizer {
        let info = ModelInfo::new(
            "fixed",
            &TrainingReport {
                samples: 1,
                fit_score: 1.0,
            },
        );
        TransactionCategorizer::with_classifier(
            KeywordRuleMatcher::default(),
            Box::new(Fixed {
                category,
                confidence,
            }),
            info,
        )
    }

    fn trained() -> TransactionCategorizer {
        TransactionCategorizer::train(&labelled_transactions()).unwrap()
    }

    #[test]
    fn empty_description_is_an_error_decision() {
        let d = trained().categorize("   ", Some(10.0));
        assert_eq!(d.category, Category::Other);
        assert_eq!(d.confidence, 0.0);
        assert_eq!(d.method, Method::Error);
        assert_eq!(d.error.as_deref(), Some(EMPTY_DESCRIPTION));
    }

    #[test]
    fn strong_rule_match_skips_classifier() {
        // The stub would say Wants; five Needs keywords win outright.
        let d = stubbed(Category::Wants, 0.99)
            .categorize("Rent electricity water groceries EMI", Some(1200.0));
        assert_eq!(d.category, Category::Needs);
        assert_eq!(d.method, Method::Rule);
        assert_eq!(d.confidence, 1.0);
        assert_eq!(d.amount, Some(1200.0));
    }

    #[test]
    fn swiggy_delivery_is_wants() {
        let d = trained().categorize("Swiggy Food Delivery", Some(450.0));
        assert_eq!(d.category, Category::Wants);
        assert!(matches!(d.method, Method::Rule | Method::Hybrid));
        assert!((0.0..=1.0).contains(&d.confidence));
    }

    #[test]
    fn agreeing_sources_average_confidence() {
        // "rent bill": two Needs hits, rule confidence 0.4.
        let d = stubbed(Category::Needs, 0.8).categorize("rent bill", None);
        assert_eq!(d.method, Method::Hybrid);
        assert!((d.confidence - 0.6).abs() < 1e-12);
        assert!(d.alternatives.is_none());
    }

    #[test]
    fn conflicting_sources_pick_higher_confidence() {
        let d = stubbed(Category::Wants, 0.9).categorize("rent bill", None);
        assert_eq!(d.category, Category::Wants);
        assert_eq!(d.method, Method::MlPriority);
        assert_eq!(d.confidence, 0.9);
        let alts = d.alternatives.unwrap();
        assert_eq!(alts[&SourceKind::Rule].category, Category::Needs);
        assert_eq!(alts[&SourceKind::Model].category, Category::Wants);

        let d = stubbed(Category::Wants, 0.35).categorize("rent bill", None);
        assert_eq!(d.category, Category::Needs);
        assert_eq!(d.method, Method::RulePriority);
        assert!((d.confidence - 0.4).abs() < 1e-12);
    }

    #[test]
    fn equal_confidence_prefers_rule() {
        let d = stubbed(Category::Savings, 0.4).categorize("rent bill", None);
        assert_eq!(d.category, Category::Needs);
        assert_eq!(d.method, Method::RulePriority);
    }

    #[test]
    fn weak_rule_defers_to_classifier() {
        // One Needs hit ("metro") is too weak to compete.
        let d = stubbed(Category::Wants, 0.7).categorize("metro xyz", None);
        assert_eq!(d.category, Category::Wants);
        assert_eq!(d.method, Method::Ml);
        assert_eq!(d.confidence, 0.7);
    }

    #[test]
    fn missing_classifier_falls_back_to_rules() {
        let c = TransactionCategorizer::untrained(KeywordRuleMatcher::default());
        let d = c.categorize("rent bill", None);
        assert_eq!(d.method, Method::RuleFallback);
        assert_eq!(d.category, Category::Needs);
        assert!((d.confidence - 0.4).abs() < 1e-12);

        let d = c.categorize("qwerty", None);
        assert_eq!(d.method, Method::None);
        assert_eq!(d.category, Category::Other);
        assert_eq!(d.confidence, 0.0);
        assert_eq!(d.error.as_deref(), Some(CLASSIFIER_MISSING));
    }

    #[test]
    fn prediction_error_keeps_message() {
        let c = stubbed(Category::Wants, 0.9);
        let d = c.categorize("rent fail", None);
        assert_eq!(d.method, Method::RuleFallback);
        assert_eq!(d.category, Category::Needs);
        assert!(d.error.unwrap().contains("model exploded"));

        let d = c.categorize("fail", None);
        assert_eq!(d.method, Method::None);
        assert_eq!(d.category, Category::Other);
        assert!(d.error.is_some());
    }

    #[test]
    fn batch_preserves_order_and_survives_classifier_panics() {
        let c = stubbed(Category::Wants, 0.9);
        let input = vec![
            Transaction::new("Rent electricity water groceries EMI", Some(100.0)),
            Transaction::new("boom", Some(5.0)),
            Transaction::new("", None),
            Transaction::new("Netflix", Some(20.0)),
        ];
        let out = c.batch_categorize(&input);
        assert_eq!(out.len(), 4);
        for (i, d) in out.iter().enumerate() {
            assert_eq!(d.transaction_id, Some(i));
        }
        assert_eq!(out[0].method, Method::Rule);
        assert_eq!(out[1].method, Method::None);
        assert_eq!(out[1].description, "boom");
        assert!(out[1].error.as_deref().unwrap().contains("panicked"));
        assert_eq!(out[2].method, Method::Error);
        assert_eq!(out[3].category, Category::Wants);
    }

    #[test]
    fn classifier_panic_falls_back_to_rule_signal() {
        let c = stubbed(Category::Wants, 0.9);
        let d = c.categorize("rent bill boom", Some(900.0));
        assert_eq!(d.method, Method::RuleFallback);
        assert_eq!(d.category, Category::Needs);
        assert!((d.confidence - 0.4).abs() < 1e-12);
        assert_eq!(d.amount, Some(900.0));
        assert!(d.error.unwrap().contains("fixed panicked"));

        let d = c.categorize("boom", None);
        assert_eq!(d.method, Method::None);
        assert_eq!(d.category, Category::Other);
    }

    #[test]
    fn summary_reports_totals_and_distribution() {
        let c = TransactionCategorizer::untrained(KeywordRuleMatcher::default());
        let decisions = c.batch_categorize(&[
            Transaction::new("Rent electricity water groceries EMI", Some(750.0)),
            Transaction::new("SIP PPF NPS pension crypto", Some(250.0)),
            Transaction::new("Swiggy", None),
        ]);
        let s = c.summarize(&decisions);
        assert_eq!(s.processed_count, 3);
        assert_eq!(s.total_amount, 1000.0);
        assert_eq!(s.category_totals[&Category::Needs], 750.0);
        assert_eq!(s.category_distribution[&Category::Needs], 75.0);
        assert_eq!(s.category_distribution[&Category::Savings], 25.0);
        assert_eq!(s.category_distribution[&Category::Wants], 0.0);

        let empty = c.summarize(&c.batch_categorize(&[Transaction::new("Swiggy", None)]));
        assert!(empty.category_distribution.values().all(|p| *p == 0.0));
    }

    #[test]
    fn failed_retrain_keeps_previous_model() {
        let c = trained();
        let before = c.model_info().model.unwrap();
        assert!(c.retrain(&[]).is_err());
        assert_eq!(c.model_info().model.unwrap().model_id, before.model_id);

        let after = c.retrain(&labelled_transactions()).unwrap();
        assert_ne!(after.model_id, before.model_id);
        assert_eq!(c.model_info().model.unwrap().model_id, after.model_id);
    }

    #[test]
    fn model_info_describes_rules_and_model() {
        let untrained = TransactionCategorizer::untrained(KeywordRuleMatcher::default());
        let info = untrained.model_info();
        assert!(!info.is_trained);
        assert!(info.model.is_none());
        assert_eq!(
            info.categories,
            vec![Category::Needs, Category::Wants, Category::Savings]
        );
        assert_eq!(info.rules_count[&Category::Wants], 30);

        let info = trained().model_info();
        assert!(info.is_trained);
        assert_eq!(info.model.unwrap().name, "naive_bayes");
    }
}
