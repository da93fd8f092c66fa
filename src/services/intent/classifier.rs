//! Intent Classifier
//!
//! Maps free-text requests onto workflow intents using ordered regex families,
//! one per intent. Pure and synchronous: no I/O, never fails.
//!
//! Tie-break: every intent contributes its most specific match (the longest
//! matched span, then the higher weight). The intent whose match spans the
//! most text wins; if two intents tie on span length the result is `unknown`
//! with confidence 0. Confidence is the winning pattern's weight, not a
//! probability.

use regex::Regex;
use serde::{Deserialize, Serialize};
use windsite_core::WorkflowIntent;

/// Result of intent classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Classified intent
    pub intent: WorkflowIntent,
    /// Confidence in the classification (0.0 - 1.0)
    pub confidence: f64,
    /// Human-readable reasoning
    pub reasoning: String,
}

impl IntentResult {
    pub fn new(intent: WorkflowIntent, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            intent,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
        }
    }

    pub fn unknown(reasoning: impl Into<String>) -> Self {
        Self::new(WorkflowIntent::Unknown, 0.0, reasoning)
    }

    /// Check if the confidence is above a threshold.
    pub fn is_confident(&self, threshold: f64) -> bool {
        !self.intent.is_unknown() && self.confidence >= threshold
    }
}

/// Pattern entry: compiled regex + associated score.
struct PatternEntry {
    regex: Regex,
    score: f64,
}

/// Best match of one intent family.
#[derive(Debug, Clone, Copy)]
struct FamilyMatch {
    intent: WorkflowIntent,
    span: usize,
    score: f64,
}

/// Rule-based workflow intent classifier.
pub struct IntentClassifier {
    families: Vec<(WorkflowIntent, Vec<PatternEntry>)>,
    continuation: Option<Regex>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Create a new classifier with compiled regex patterns.
    pub fn new() -> Self {
        let families = vec![
            (
                WorkflowIntent::TerrainAnalysis,
                Self::compile_patterns(&[
                    (r"(?i)\bterrain\s+analy(sis|ses|ze)\b", 0.95),
                    (r"(?i)\banaly[sz]e\s+(the\s+)?(terrain|site|topography)\b", 0.90),
                    (r"(?i)\b(buildable|unbuildable|exclusion)\s+(area|zone)s?\b", 0.85),
                    (r"(?i)\bterrain\b", 0.75),
                    (r"(?i)\btopograph(y|ic)\b", 0.70),
                ]),
            ),
            (
                WorkflowIntent::LayoutOptimization,
                Self::compile_patterns(&[
                    (r"(?i)\blayout\s+optimi[sz]ation\b", 0.95),
                    (r"(?i)\boptimi[sz]e\s+(the\s+)?(wind\s+farm\s+|turbine\s+|farm\s+)?layout\b", 0.95),
                    (r"(?i)\blayout\s+(with|for|of)\s+\d+\s+turbines?\b", 0.95),
                    (r"(?i)\b(turbine|farm)\s+(layout|placement|positions?)\b", 0.90),
                    (r"(?i)\bplace\s+\d+\s+turbines?\b", 0.85),
                    (r"(?i)\blayout\b", 0.60),
                ]),
            ),
            (
                WorkflowIntent::WakeSimulation,
                Self::compile_patterns(&[
                    (r"(?i)\bwake\s+(simulation|analysis|loss(es)?|model(l)?ing|effects?)\b", 0.95),
                    (r"(?i)\brun\s+(a\s+|the\s+)?(wake\s+)?simulation\b", 0.90),
                    (r"(?i)\b(annual\s+energy\s+production|aep)\b", 0.85),
                    (r"(?i)\benergy\s+yield\b", 0.80),
                    (r"(?i)\bwake\b", 0.70),
                    (r"(?i)\bsimulat(e|ion)\b", 0.60),
                ]),
            ),
            (
                WorkflowIntent::ReportGeneration,
                Self::compile_patterns(&[
                    (r"(?i)\breport\s+generation\b", 0.95),
                    (r"(?i)\b(generate|create|produce|write)\s+(a\s+|the\s+)?(\w+\s+)?report\b", 0.95),
                    (r"(?i)\b(final|summary|project|site)\s+report\b", 0.90),
                    (r"(?i)\breport\b", 0.60),
                ]),
            ),
            (
                WorkflowIntent::ProjectQuery,
                Self::compile_patterns(&[
                    (r"(?i)\b(project|site)\s+(status|progress|summary|overview)\b", 0.90),
                    (r"(?i)\blist\s+(my\s+|all\s+)?projects\b", 0.90),
                    (r"(?i)\bwhat('s|\s+is)\s+(the\s+)?(status|progress)\b", 0.85),
                    (r"(?i)\bwhich\s+steps?\s+(are|is)\s+(done|complete|completed|finished)\b", 0.85),
                    (r"(?i)\bshow\s+(me\s+)?(the\s+)?project\b", 0.80),
                ]),
            ),
        ];

        Self {
            families,
            continuation: Regex::new(
                r"(?i)^\s*(please\s+)?(continue|proceed|go\s+on|keep\s+going|next(\s+step)?|(do|run)\s+the\s+next\s+step)\b",
            )
            .ok(),
        }
    }

    /// Classify a message using rule-based heuristics.
    pub fn classify(&self, message: &str) -> IntentResult {
        let matches: Vec<FamilyMatch> = self
            .families
            .iter()
            .filter_map(|(intent, patterns)| Self::best_match(*intent, message, patterns))
            .collect();

        let Some(best_span) = matches.iter().map(|m| m.span).max() else {
            return IntentResult::unknown("No workflow pattern matched");
        };

        let leaders: Vec<&FamilyMatch> = matches.iter().filter(|m| m.span == best_span).collect();
        if leaders.len() > 1 {
            let tied = leaders
                .iter()
                .map(|m| m.intent.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return IntentResult::unknown(format!("Equally specific matches for {}", tied));
        }

        let winner = leaders[0];
        let reasoning = if winner.score >= 0.8 {
            format!("High confidence match for {} patterns", winner.intent)
        } else {
            format!("Weak match for {} patterns", winner.intent)
        };
        IntentResult::new(winner.intent, winner.score, reasoning)
    }

    /// Whether the message only asks to carry on with the next workflow step.
    pub fn is_continuation(&self, message: &str) -> bool {
        self.continuation
            .as_ref()
            .is_some_and(|regex| regex.is_match(message))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn compile_patterns(raw: &[(&str, f64)]) -> Vec<PatternEntry> {
        raw.iter()
            .filter_map(|(pattern, score)| {
                Regex::new(pattern).ok().map(|regex| PatternEntry {
                    regex,
                    score: *score,
                })
            })
            .collect()
    }

    fn best_match(intent: WorkflowIntent, message: &str, patterns: &[PatternEntry]) -> Option<FamilyMatch> {
        patterns
            .iter()
            .filter_map(|entry| {
                entry
                    .regex
                    .find_iter(message)
                    .map(|m| m.as_str().len())
                    .max()
                    .map(|span| FamilyMatch {
                        intent,
                        span,
                        score: entry.score,
                    })
            })
            .max_by(|a, b| {
                a.span
                    .cmp(&b.span)
                    .then(a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
            })
    }
}

// ============================================================================
// Tests
// ============================================================================
