//! Intent Router
//!
//! Runs the primary (rule-based) strategy on every request and escalates to
//! the optional fallback strategy only when the primary result is below the
//! confidence threshold.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::classifier::IntentResult;
use super::strategy::IntentStrategy;

/// Outcome of asking the fallback strategy to reconsider.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconsideration {
    /// A confident decision, and the strategy that produced it.
    Resolved {
        result: IntentResult,
        strategy: &'static str,
    },
    /// Still ambiguous; the caller should ask for clarification.
    Unresolved { reason: String },
}

pub struct IntentRouter {
    primary: Arc<dyn IntentStrategy>,
    fallback: Option<Arc<dyn IntentStrategy>>,
    threshold: f64,
}

impl IntentRouter {
    pub fn new(primary: Arc<dyn IntentStrategy>, threshold: f64) -> Self {
        Self {
            primary,
            fallback: None,
            threshold,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn IntentStrategy>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Primary classification. A failing primary strategy degrades to `unknown`.
    pub async fn classify(&self, text: &str) -> IntentResult {
        match self.primary.decide(text, None).await {
            Ok(result) => result,
            Err(e) => {
                warn!(strategy = self.primary.name(), error = %e, "primary intent strategy failed");
                IntentResult::unknown(format!("Classification failed: {}", e))
            }
        }
    }

    pub fn needs_reconsideration(&self, result: &IntentResult) -> bool {
        !result.is_confident(self.threshold)
    }

    /// Ask the fallback strategy to disambiguate a low-confidence result.
    ///
    /// A confident `prior` is returned untouched. The fallback call runs on
    /// its own task so it finishes and logs even if this future is dropped.
    pub async fn reconsider(&self, text: &str, prior: &IntentResult) -> Reconsideration {
        if prior.is_confident(self.threshold) {
            return Reconsideration::Resolved {
                result: prior.clone(),
                strategy: self.primary.name(),
            };
        }

        let Some(fallback) = self.fallback.clone() else {
            return Reconsideration::Unresolved {
                reason: "no decision engine configured".to_string(),
            };
        };

        let strategy = fallback.name();
        let owned_text = text.to_string();
        let owned_prior = prior.clone();
        let handle = tokio::spawn(async move {
            let outcome = fallback.decide(&owned_text, Some(&owned_prior)).await;
            match &outcome {
                Ok(result) => info!(
                    strategy,
                    intent = %result.intent,
                    confidence = result.confidence,
                    "decision engine answered"
                ),
                Err(e) => warn!(strategy, error = %e, "decision engine unavailable"),
            }
            outcome
        });

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(strategy, error = %e, "decision engine task aborted");
                return Reconsideration::Unresolved {
                    reason: format!("decision engine task failed: {}", e),
                };
            }
        };

        match outcome {
            Ok(result) if result.is_confident(self.threshold) => {
                Reconsideration::Resolved { result, strategy }
            }
            Ok(result) => {
                debug!(intent = %result.intent, confidence = result.confidence, "decision engine inconclusive");
                Reconsideration::Unresolved {
                    reason: format!(
                        "decision engine was not confident ({} at {:.2})",
                        result.intent, result.confidence
                    ),
                }
            }
            Err(e) => Reconsideration::Unresolved { reason: e.to_string() },
        }
    }
}
