use crate::domain::transaction::Category;
use crate::error::EngineError;
use crate::model::{TrainModel, TrainingReport};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A trained text model mapping a description to a category distribution.
pub trait TextClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, text: &str) -> Result<TextPrediction, EngineError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPrediction {
    pub category: Category,
    pub probabilities: BTreeMap<Category, f64>,
}

impl TextPrediction {
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .values()
            .copied()
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledText {
    pub description: String,
    pub category: Category,
}

impl LabelledText {
    pub fn new(description: impl Into<String>, category: Category) -> Self {
        Self {
            description: description.into(),
            category,
        }
    }
}

const SMOOTHING: f64 = 1.0;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is", "it",
    "of", "on", "or", "the", "to", "via", "with",
];

/// Lowercased alphanumeric unigrams plus adjacent-word bigrams.
pub fn features(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect();

    let mut out = words.clone();
    for pair in words.windows(2) {
        out.push(format!("{} {}", pair[0], pair[1]));
    }
    out
}

#[derive(Debug, Clone)]
struct ClassStats {
    log_prior: f64,
    token_counts: HashMap<String, f64>,
    total_tokens: f64,
}

/// Multinomial naive Bayes over description n-grams.
#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    classes: BTreeMap<Category, ClassStats>,
    vocabulary: BTreeSet<String>,
}

impl NaiveBayesClassifier {
    fn log_posteriors(&self, tokens: &[String]) -> BTreeMap<Category, f64> {
        let vocab = self.vocabulary.len() as f64;
        self.classes
            .iter()
            .map(|(cat, stats)| {
                let denom = stats.total_tokens + SMOOTHING * vocab;
                let mut score = stats.log_prior;
                for t in tokens.iter().filter(|t| self.vocabulary.contains(*t)) {
                    let count = stats.token_counts.get(t).copied().unwrap_or(0.0);
                    score += ((count + SMOOTHING) / denom).ln();
                }
                (*cat, score)
            })
            .collect()
    }

    fn classify(&self, text: &str) -> TextPrediction {
        let tokens = features(text);
        let log_post = self.log_posteriors(&tokens);

        let max = log_post.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: BTreeMap<Category, f64> = log_post
            .iter()
            .map(|(c, s)| (*c, (s - max).exp()))
            .collect();
        let norm: f64 = exp.values().sum();
        let probabilities: BTreeMap<Category, f64> =
            exp.into_iter().map(|(c, e)| (c, e / norm)).collect();

        let mut best = (Category::Other, f64::NEG_INFINITY);
        for (cat, p) in &probabilities {
            if *p > best.1 {
                best = (*cat, *p);
            }
        }

        TextPrediction {
            category: best.0,
            probabilities,
        }
    }
}

impl TrainModel for NaiveBayesClassifier {
    type Sample = LabelledText;

    fn train(samples: &[LabelledText]) -> Result<(Self, TrainingReport), EngineError> {
        if samples.is_empty() {
            return Err(EngineError::Training(
                "text classifier needs at least one sample".to_string(),
            ));
        }

        let mut docs = BTreeMap::<Category, usize>::new();
        let mut classes = BTreeMap::<Category, ClassStats>::new();
        let mut vocabulary = BTreeSet::new();

        for sample in samples {
            *docs.entry(sample.category).or_insert(0) += 1;
            let stats = classes.entry(sample.category).or_insert_with(|| ClassStats {
                log_prior: 0.0,
                token_counts: HashMap::new(),
                total_tokens: 0.0,
            });
            for token in features(&sample.description) {
                *stats.token_counts.entry(token.clone()).or_insert(0.0) += 1.0;
                stats.total_tokens += 1.0;
                vocabulary.insert(token);
            }
        }

        if classes.len() < 2 {
            return Err(EngineError::Training(format!(
                "text classifier needs at least two categories (got {})",
                classes.len()
            )));
        }
        if vocabulary.is_empty() {
            return Err(EngineError::Training(
                "training descriptions produced an empty vocabulary".to_string(),
            ));
        }

        let n = samples.len() as f64;
        for (cat, stats) in classes.iter_mut() {
            stats.log_prior = (docs[cat] as f64 / n).ln();
        }

        let model = Self {
            classes,
            vocabulary,
        };

        let correct = samples
            .iter()
            .filter(|s| model.classify(&s.description).category == s.category)
            .count();
        let report = TrainingReport {
            samples: samples.len(),
            fit_score: correct as f64 / n,
        };

        tracing::info!(
            samples = report.samples,
            vocabulary = model.vocabulary.len(),
            accuracy = report.fit_score,
            "trained naive bayes text classifier"
        );

        Ok((model, report))
    }
}

impl TextClassifier for NaiveBayesClassifier {
    fn name(&self) -> &str {
        "naive_bayes"
    }

    fn predict(&self, text: &str) -> Result<TextPrediction, EngineError> {
        let prediction = self.classify(text);
        if prediction.probabilities.values().any(|p| !p.is_finite()) {
            return Err(EngineError::Prediction(format!(
                "non-finite class probability for {text:?}"
            )));
        }
        Ok(prediction)
    }
}
