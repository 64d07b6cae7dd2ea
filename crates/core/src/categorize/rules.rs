use crate::decision::{DecisionSource, Signal, SourceKind};
use crate::domain::transaction::Category;
use crate::error::EngineError;
use std::collections::BTreeMap;

/// Hits needed for a rule match to reach full confidence.
const FULL_CONFIDENCE_HITS: f64 = 5.0;

const NEEDS: &[&str] = &[
    "rent", "electricity", "water", "groceries", "emi", "bill", "loan", "mortgage", "insurance",
    "medical", "doctor", "hospital", "pharmacy", "supermarket", "utility", "gas", "fuel",
    "transport", "bus", "train", "metro", "tuition", "education", "school", "college",
    "maintenance", "repair", "essential", "basic", "necessary",
];

const WANTS: &[&str] = &[
    "swiggy", "zomato", "netflix", "amazon", "shopping", "myntra", "flipkart", "movie", "cinema",
    "restaurant", "cafe", "bar", "pub", "fashion", "electronics", "entertainment", "game",
    "gaming", "vacation", "travel", "hotel", "spa", "salon", "luxury", "hobby", "subscription",
    "streaming", "dining", "takeout", "delivery",
];

const SAVINGS: &[&str] = &[
    "fd", "sip", "investment", "mutual fund", "stock", "equity", "bond", "fixed deposit",
    "recurring deposit", "ppf", "nps", "retirement", "pension", "gold", "crypto", "bitcoin",
    "save", "invest", "portfolio", "asset", "wealth", "fund", "scheme",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleMatch {
    pub category: Category,
    pub hits: usize,
    pub confidence: f64,
}

/// Keyword table scored by case-insensitive substring hits.
#[derive(Debug, Clone)]
pub struct KeywordRuleMatcher {
    // Order of this list is the tie-break order.
    rules: Vec<(Category, Vec<String>)>,
}

impl Default for KeywordRuleMatcher {
    fn default() -> Self {
        Self::new(vec![
            (Category::Needs, NEEDS.iter().map(|s| s.to_string()).collect()),
            (Category::Wants, WANTS.iter().map(|s| s.to_string()).collect()),
            (Category::Savings, SAVINGS.iter().map(|s| s.to_string()).collect()),
        ])
    }
}

impl KeywordRuleMatcher {
    pub fn new(rules: Vec<(Category, Vec<String>)>) -> Self {
        let rules = rules
            .into_iter()
            .map(|(cat, words)| {
                let words = words
                    .into_iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (cat, words)
            })
            .collect();
        Self { rules }
    }

    pub fn categories(&self) -> Vec<Category> {
        self.rules.iter().map(|(c, _)| *c).collect()
    }

    pub fn keyword_counts(&self) -> BTreeMap<Category, usize> {
        self.rules.iter().map(|(c, w)| (*c, w.len())).collect()
    }

    pub fn match_description(&self, description: &str) -> Option<RuleMatch> {
        let text = description.to_lowercase();

        let mut best: Option<(Category, usize)> = None;
        for (category, words) in &self.rules {
            let hits = words.iter().filter(|w| text.contains(w.as_str())).count();
            if hits == 0 {
                continue;
            }
            match best {
                Some((_, top)) if hits <= top => {}
                _ => best = Some((*category, hits)),
            }
        }

        best.map(|(category, hits)| RuleMatch {
            category,
            hits,
            confidence: (hits as f64 / FULL_CONFIDENCE_HITS).min(1.0),
        })
    }
}

impl DecisionSource<str> for KeywordRuleMatcher {
    type Output = Category;

    fn kind(&self) -> SourceKind {
        SourceKind::Rule
    }

    fn decide(&self, input: &str) -> Result<Option<Signal<Category>>, EngineError> {
        Ok(self
            .match_description(input)
            .map(|m| Signal::new(m.category, m.confidence)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_hits_case_insensitively() {
        let m = KeywordRuleMatcher::default()
            .match_description("Swiggy Food DELIVERY")
            .unwrap();
        assert_eq!(m.category, Category::Wants);
        assert_eq!(m.hits, 2);
        assert!((m.confidence - 0.4).abs() < 1e-12);
    }

    #[test]
    fn five_hits_reach_full_confidence() {
        let m = KeywordRuleMatcher::default()
            .match_description("rent electricity water groceries emi")
            .unwrap();
        assert_eq!(m.category, Category::Needs);
        assert_eq!(m.confidence, 1.0);

        let m = KeywordRuleMatcher::default()
            .match_description("sip ppf nps pension bitcoin crypto")
            .unwrap();
        assert_eq!(m.category, Category::Savings);
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn multi_word_keywords_match_as_phrases() {
        let m = KeywordRuleMatcher::default()
            .match_description("HDFC Fixed Deposit")
            .unwrap();
        assert_eq!(m.category, Category::Savings);
        // "fixed deposit" only; "fd" does not occur in the text.
        assert_eq!(m.hits, 1);
    }

    #[test]
    fn ties_go_to_first_declared_category() {
        // One Needs hit ("rent") and one Wants hit ("movie").
        let m = KeywordRuleMatcher::default()
            .match_description("rent movie")
            .unwrap();
        assert_eq!(m.category, Category::Needs);

        let reversed = KeywordRuleMatcher::new(vec![
            (Category::Wants, vec!["movie".into()]),
            (Category::Needs, vec!["rent".into()]),
        ]);
        assert_eq!(
            reversed.match_description("rent movie").unwrap().category,
            Category::Wants
        );
    }

    #[test]
    fn no_hit_means_no_signal() {
        let matcher = KeywordRuleMatcher::default();
        assert!(matcher.match_description("xyz 123").is_none());
        assert_eq!(matcher.decide("xyz 123").unwrap(), None);
        assert_eq!(matcher.kind(), SourceKind::Rule);
    }

    #[test]
    fn keyword_counts_cover_default_table() {
        let counts = KeywordRuleMatcher::default().keyword_counts();
        assert_eq!(counts[&Category::Needs], 30);
        assert_eq!(counts[&Category::Wants], 30);
        assert_eq!(counts[&Category::Savings], 23);
    }
}
