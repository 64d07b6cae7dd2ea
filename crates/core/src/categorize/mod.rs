pub mod corpus;
pub mod engine;
pub mod rules;

pub use engine::{BatchSummary, CategorizerInfo, ClassifierSource, TransactionCategorizer};
pub use rules::{KeywordRuleMatcher, RuleMatch};
