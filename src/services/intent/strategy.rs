//! Intent Strategies
//!
//! A strategy turns query text into an `IntentResult`. The rule-based
//! strategy is the deterministic primary; the model-assisted strategy
//! (see `model_assisted`) is the optional fallback. `IntentRouter` composes
//! them.

use async_trait::async_trait;
use thiserror::Error;

use super::classifier::{IntentClassifier, IntentResult};

/// Why a strategy could not produce a decision.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecisionError {
    #[error("decision engine timed out after {0}s")]
    Timeout(u64),

    #[error("decision engine request failed: {0}")]
    Provider(String),

    #[error("decision engine returned unparseable output: {0}")]
    Parse(String),
}

#[async_trait]
pub trait IntentStrategy: Send + Sync {
    /// Short name used in logs and thought steps.
    fn name(&self) -> &'static str;

    /// Decide the intent of `text`. `prior` is the result of any earlier
    /// strategy, for context.
    async fn decide(&self, text: &str, prior: Option<&IntentResult>) -> Result<IntentResult, DecisionError>;
}

/// Deterministic regex classification.
#[derive(Default)]
pub struct RuleBasedStrategy {
    classifier: IntentClassifier,
}

impl RuleBasedStrategy {
    pub fn new(classifier: IntentClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }
}

#[async_trait]
impl IntentStrategy for RuleBasedStrategy {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    async fn decide(&self, text: &str, _prior: Option<&IntentResult>) -> Result<IntentResult, DecisionError> {
        Ok(self.classifier.classify(text))
    }
}
