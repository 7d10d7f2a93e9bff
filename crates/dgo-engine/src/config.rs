//! Engine configuration

use chrono::Duration;
use serde::{Deserialize, Serialize};

use dgo_content::BrandingContext;
use dgo_ledger::{CostModel, FlatUsageEstimate};

/// Orchestration engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whether the direct modification path may be attempted
    pub direct_enabled: bool,
    /// Maximum documents one sync batch will process
    pub sync_batch_limit: usize,
    /// Age of `last_synced_at` beyond which a document is due
    ///
    /// Intentionally shorter than the nominal daily cadence so scheduling
    /// jitter cannot push a document to every-other-day refreshes.
    pub freshness_threshold_secs: u64,
    /// Age of an in-flight status beyond which the reaper force-fails it
    pub stale_after_secs: u64,
    /// Lifetime of a processing lease
    pub lease_ttl_secs: u64,
    /// Credit cost model
    pub cost_model: CostModel,
    /// Usage substituted for unmetered agentic runs
    pub flat_agentic_estimate: FlatUsageEstimate,
    /// Branding applied to generated dashboards
    pub branding: BrandingContext,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With direct path enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_direct_enabled(mut self, enabled: bool) -> Self {
        self.direct_enabled = enabled;
        self
    }

    /// With batch size limit
    #[inline]
    #[must_use]
    pub fn with_sync_batch_limit(mut self, limit: usize) -> Self {
        self.sync_batch_limit = limit;
        self
    }

    /// With freshness threshold
    #[inline]
    #[must_use]
    pub fn with_freshness_threshold_secs(mut self, secs: u64) -> Self {
        self.freshness_threshold_secs = secs;
        self
    }

    /// With staleness threshold
    #[inline]
    #[must_use]
    pub fn with_stale_after_secs(mut self, secs: u64) -> Self {
        self.stale_after_secs = secs;
        self
    }

    /// With flat usage estimate
    #[inline]
    #[must_use]
    pub fn with_flat_agentic_estimate(mut self, estimate: FlatUsageEstimate) -> Self {
        self.flat_agentic_estimate = estimate;
        self
    }

    /// With branding context
    #[inline]
    #[must_use]
    pub fn with_branding(mut self, branding: BrandingContext) -> Self {
        self.branding = branding;
        self
    }

    /// Freshness threshold as a duration
    #[inline]
    #[must_use]
    pub fn freshness_threshold(&self) -> Duration {
        Duration::seconds(i64::try_from(self.freshness_threshold_secs).unwrap_or(i64::MAX))
    }

    /// Staleness threshold as a duration
    #[inline]
    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::seconds(i64::try_from(self.stale_after_secs).unwrap_or(i64::MAX))
    }

    /// Lease lifetime as a duration
    #[inline]
    #[must_use]
    pub fn lease_ttl(&self) -> Duration {
        Duration::seconds(i64::try_from(self.lease_ttl_secs).unwrap_or(i64::MAX))
    }

    /// Credits required up front before any AI call
    ///
    /// Derived from the flat estimate: the worst expected charge for a run
    /// whose real usage is not yet known.
    #[inline]
    #[must_use]
    pub fn preflight_credits(&self) -> u64 {
        self.cost_model.credits_for(
            self.flat_agentic_estimate.input_units,
            self.flat_agentic_estimate.output_units,
        )
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            direct_enabled: true,
            sync_batch_limit: 25,
            freshness_threshold_secs: 23 * 3600,
            stale_after_secs: 600,
            lease_ttl_secs: 600,
            cost_model: CostModel::default(),
            flat_agentic_estimate: FlatUsageEstimate::default(),
            branding: BrandingContext::default(),
        }
    }
}
