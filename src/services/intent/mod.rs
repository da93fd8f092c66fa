//! Intent Services
//!
//! Rule-based classification, the optional model-assisted decision engine,
//! and the router that composes them.

pub mod classifier;
pub mod model_assisted;
pub mod router;
pub mod strategy;

pub use classifier::{IntentClassifier, IntentResult};
pub use model_assisted::ModelAssistedStrategy;
pub use router::{IntentRouter, Reconsideration};
pub use strategy::{DecisionError, IntentStrategy, RuleBasedStrategy};
