//! Strategy selection and fallback chain
//!
//! Routes each modification request to the direct (fast, deterministic)
//! path or the agentic (slow, sandboxed) path. The fallback is an explicit
//! two-stage chain with typed results: the path that actually produced the
//! artifact is visible in the outcome, never buried in error handling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capability::{
    CapabilityError, GenerationCapability, GenerationOutput, GenerationRequest,
};
use crate::classifier::{InstructionClassifier, PhraseClassifier};

/// Which capability produced an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPath {
    /// Fast, deterministic, cheap
    Direct,
    /// Slow, sandboxed, exploratory
    Agentic,
}

impl StrategyPath {
    /// String form used in logs and accounting labels
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Agentic => "agentic",
        }
    }
}

impl std::fmt::Display for StrategyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a routed generation run
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    /// The produced artifact and usage
    pub output: GenerationOutput,
    /// The path that actually ran to completion
    pub path: StrategyPath,
    /// True when the direct path failed and the agentic path recovered
    pub fell_back: bool,
    /// Signal phrase that forced the agentic path, when one matched
    pub escalated_by: Option<String>,
}

/// Strategy execution failure
///
/// Only raised when no path produced an artifact; a direct-path failure
/// recovered by the agentic path is not an error.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// The agentic path failed and direct was never in play
    #[error("agentic path failed: {0}")]
    AgenticFailed(#[source] CapabilityError),

    /// Both paths were tried and both failed
    #[error("all paths failed: direct: {direct}; agentic: {agentic}")]
    AllPathsFailed {
        /// Direct path failure
        direct: CapabilityError,
        /// Agentic path failure that followed
        agentic: CapabilityError,
    },
}

/// Routes modification requests across the two capability paths
pub struct StrategySelector {
    classifier: Arc<dyn InstructionClassifier>,
    direct: Arc<dyn GenerationCapability>,
    agentic: Arc<dyn GenerationCapability>,
    direct_enabled: bool,
}

impl std::fmt::Debug for StrategySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategySelector")
            .field("classifier", &self.classifier)
            .field("direct", &self.direct.name())
            .field("agentic", &self.agentic.name())
            .field("direct_enabled", &self.direct_enabled)
            .finish()
    }
}

impl StrategySelector {
    /// Selector with the default phrase classifier and direct path enabled
    #[must_use]
    pub fn new(
        direct: Arc<dyn GenerationCapability>,
        agentic: Arc<dyn GenerationCapability>,
    ) -> Self {
        Self {
            classifier: Arc::new(PhraseClassifier::with_defaults()),
            direct,
            agentic,
            direct_enabled: true,
        }
    }

    /// Replace the classifier
    #[inline]
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn InstructionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Enable or disable the direct path
    #[inline]
    #[must_use]
    pub fn with_direct_enabled(mut self, enabled: bool) -> Self {
        self.direct_enabled = enabled;
        self
    }

    /// Execute a request through the strategy chain
    ///
    /// # Routing
    /// 1. A comprehensive-review instruction forces the agentic path
    /// 2. Otherwise the direct path runs first when enabled
    /// 3. A direct failure falls back to the agentic path transparently
    /// 4. With direct disabled, the agentic path runs alone
    ///
    /// # Errors
    /// Only when no path produced an artifact; nothing partial is returned.
    pub async fn execute(
        &self,
        request: &GenerationRequest,
    ) -> Result<StrategyOutcome, StrategyError> {
        let escalation = self.classifier.classify(&request.instructions);

        if escalation.force_agentic {
            tracing::info!(
                phrase = escalation.matched_phrase.as_deref().unwrap_or(""),
                "comprehensive review detected, forcing agentic path"
            );
            let output = self
                .agentic
                .generate(request)
                .await
                .map_err(StrategyError::AgenticFailed)?;
            return Ok(StrategyOutcome {
                output,
                path: StrategyPath::Agentic,
                fell_back: false,
                escalated_by: escalation.matched_phrase,
            });
        }

        if !self.direct_enabled {
            let output = self
                .agentic
                .generate(request)
                .await
                .map_err(StrategyError::AgenticFailed)?;
            return Ok(StrategyOutcome {
                output,
                path: StrategyPath::Agentic,
                fell_back: false,
                escalated_by: None,
            });
        }

        match self.direct.generate(request).await {
            Ok(output) => Ok(StrategyOutcome {
                output,
                path: StrategyPath::Direct,
                fell_back: false,
                escalated_by: None,
            }),
            Err(direct_err) => {
                tracing::warn!(
                    capability = self.direct.name(),
                    error = %direct_err,
                    "direct path failed, falling back to agentic"
                );
                match self.agentic.generate(request).await {
                    Ok(output) => Ok(StrategyOutcome {
                        output,
                        path: StrategyPath::Agentic,
                        fell_back: true,
                        escalated_by: None,
                    }),
                    Err(agentic_err) => Err(StrategyError::AllPathsFailed {
                        direct: direct_err,
                        agentic: agentic_err,
                    }),
                }
            }
        }
    }
}
