//! Generation capability boundary
//!
//! The AI engines are external collaborators behind one trait: given
//! instructions, the current artifact, and source content, produce a new
//! artifact and report usage. Two implementations exist, a fast
//! deterministic one and a sandboxed agentic one, and they are
//! interchangeable from the orchestrator's point of view.

use async_trait::async_trait;

use dgo_content::{BrandingContext, DashboardConfig, DataProfile};
use dgo_ledger::UsageMetrics;

/// Input to a generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// What to do, in natural language
    pub instructions: String,
    /// The artifact being modified, absent for first-time generation
    pub current_config: Option<DashboardConfig>,
    /// Latest source content
    pub source_content: String,
    /// Precomputed column profile of the source content
    pub data_profile: DataProfile,
    /// Branding applied to the produced dashboard
    pub branding: BrandingContext,
}

impl GenerationRequest {
    /// Request for a brand-new dashboard
    #[must_use]
    pub fn initial(
        instructions: impl Into<String>,
        source_content: impl Into<String>,
        data_profile: DataProfile,
    ) -> Self {
        Self {
            instructions: instructions.into(),
            current_config: None,
            source_content: source_content.into(),
            data_profile,
            branding: BrandingContext::default(),
        }
    }

    /// Request modifying an existing dashboard
    #[must_use]
    pub fn modification(
        instructions: impl Into<String>,
        current_config: DashboardConfig,
        source_content: impl Into<String>,
        data_profile: DataProfile,
    ) -> Self {
        Self {
            instructions: instructions.into(),
            current_config: Some(current_config),
            source_content: source_content.into(),
            data_profile,
            branding: BrandingContext::default(),
        }
    }

    /// Attach branding context
    #[inline]
    #[must_use]
    pub fn with_branding(mut self, branding: BrandingContext) -> Self {
        self.branding = branding;
        self
    }
}

/// Output of a successful generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutput {
    /// The produced artifact
    pub config: DashboardConfig,
    /// Human-readable description of what changed
    pub change_summary: String,
    /// Measured usage; may be all-zero for sandboxed runs
    pub usage: UsageMetrics,
}

/// Generation run failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum CapabilityError {
    /// The engine ran and failed
    #[error("generation failed: {0}")]
    Generation(String),

    /// The engine could not be reached
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    /// The engine returned something unusable
    #[error("invalid output: {0}")]
    InvalidOutput(String),
}

/// An AI engine that can produce or modify dashboard artifacts
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Stable name used in logs and accounting labels
    fn name(&self) -> &'static str;

    /// Run one generation
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, CapabilityError>;
}
