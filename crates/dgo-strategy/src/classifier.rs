//! Instruction classification
//!
//! Decides whether an instruction demands the agentic path outright.
//! Pluggable so the phrase list can be replaced by a proper intent
//! classifier without touching the selector.

use std::fmt::Debug;

/// Classification verdict for one instruction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Escalation {
    /// Route straight to the agentic path, never attempting direct
    pub force_agentic: bool,
    /// The signal phrase that triggered the escalation, for logging
    pub matched_phrase: Option<String>,
}

impl Escalation {
    /// No escalation
    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        Self {
            force_agentic: false,
            matched_phrase: None,
        }
    }
}

/// Classifies instructions for strategy routing
pub trait InstructionClassifier: Send + Sync + Debug {
    /// Classify one instruction text
    fn classify(&self, instructions: &str) -> Escalation;
}

/// Signal phrases that indicate a comprehensive review
///
/// Requests to verify, reconcile, or refresh *all* data need the agentic
/// path's full view of the document; a localized direct edit would silently
/// miss most of the work.
const DEFAULT_SIGNAL_PHRASES: &[&str] = &[
    "verify all",
    "reconcile all",
    "refresh all",
    "update all",
    "check all",
    "review all",
    "recheck all",
    "audit",
    "comprehensive review",
    "go through everything",
];

/// Substring-matching classifier over a configured phrase list
#[derive(Debug, Clone)]
pub struct PhraseClassifier {
    phrases: Vec<String>,
}

impl PhraseClassifier {
    /// Classifier with an explicit phrase list
    #[must_use]
    pub fn new(phrases: Vec<String>) -> Self {
        Self {
            phrases: phrases.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Classifier with the built-in comprehensive-review phrases
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SIGNAL_PHRASES.iter().map(ToString::to_string).collect())
    }

    /// The phrases in effect
    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

impl Default for PhraseClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl InstructionClassifier for PhraseClassifier {
    fn classify(&self, instructions: &str) -> Escalation {
        let lowered = instructions.to_lowercase();
        for phrase in &self.phrases {
            if lowered.contains(phrase.as_str()) {
                return Escalation {
                    force_agentic: true,
                    matched_phrase: Some(phrase.clone()),
                };
            }
        }
        Escalation::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_edit_is_not_escalated() {
        let c = PhraseClassifier::with_defaults();
        let verdict = c.classify("Change the bar chart to a line chart");
        assert!(!verdict.force_agentic);
        assert!(verdict.matched_phrase.is_none());
    }

    #[test]
    fn reconcile_all_is_escalated() {
        let c = PhraseClassifier::with_defaults();
        let verdict = c.classify("Please reconcile all values against the sheet");
        assert!(verdict.force_agentic);
        assert_eq!(verdict.matched_phrase.as_deref(), Some("reconcile all"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let c = PhraseClassifier::with_defaults();
        assert!(c.classify("VERIFY ALL the numbers").force_agentic);
    }

    #[test]
    fn custom_phrase_list_replaces_defaults() {
        let c = PhraseClassifier::new(vec!["rebuild".into()]);
        assert!(c.classify("rebuild the whole dashboard").force_agentic);
        assert!(!c.classify("verify all numbers").force_agentic);
    }

    #[test]
    fn empty_instructions_are_not_escalated() {
        let c = PhraseClassifier::with_defaults();
        assert_eq!(c.classify(""), Escalation::none());
    }
}
