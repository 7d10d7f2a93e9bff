//! Credit cost model
//!
//! Converts raw AI usage (input/output units) into credits. Output units are
//! weighted more heavily than input units to reflect their asymmetric price,
//! and the weighted total is divided down with ceiling rounding so any
//! non-zero usage costs at least one credit.

use serde::{Deserialize, Serialize};

/// Raw usage reported by a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Units consumed as input
    pub input_units: u64,
    /// Units produced as output
    pub output_units: u64,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
    /// Number of agent turns, when the run was multi-turn
    pub turn_count: Option<u32>,
}

impl UsageMetrics {
    /// Usage with only unit counts
    #[inline]
    #[must_use]
    pub const fn of(input_units: u64, output_units: u64) -> Self {
        Self {
            input_units,
            output_units,
            duration_ms: 0,
            turn_count: None,
        }
    }

    /// True when the run reported no measured units at all
    ///
    /// Sandboxed agentic runs track their own consumption internally and may
    /// legitimately report zero here; accounting must then substitute a flat
    /// estimate rather than charge nothing.
    #[inline]
    #[must_use]
    pub const fn is_unmetered(&self) -> bool {
        self.input_units == 0 && self.output_units == 0
    }
}

/// Flat usage substituted for unmetered runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatUsageEstimate {
    /// Assumed input units
    pub input_units: u64,
    /// Assumed output units
    pub output_units: u64,
}

impl FlatUsageEstimate {
    /// Substitute this estimate when the actual usage is unmetered
    ///
    /// Preserves the run's duration and turn count either way.
    #[inline]
    #[must_use]
    pub fn or_actual(&self, actual: UsageMetrics) -> UsageMetrics {
        if actual.is_unmetered() {
            UsageMetrics {
                input_units: self.input_units,
                output_units: self.output_units,
                ..actual
            }
        } else {
            actual
        }
    }
}

impl Default for FlatUsageEstimate {
    fn default() -> Self {
        Self {
            input_units: 50_000,
            output_units: 20_000,
        }
    }
}

/// Credit cost model
///
/// `credits = ceil((input + output * output_weight) / credit_divisor)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostModel {
    /// Multiplier applied to output units before division
    pub output_weight: u64,
    /// Weighted units per credit
    pub credit_divisor: u64,
}

impl CostModel {
    /// Create a model with explicit parameters
    #[inline]
    #[must_use]
    pub const fn new(output_weight: u64, credit_divisor: u64) -> Self {
        Self {
            output_weight,
            credit_divisor,
        }
    }

    /// Credits for the given unit counts
    ///
    /// Rounds up, never down; returns 0 only when both counts are 0.
    #[inline]
    #[must_use]
    pub fn credits_for(&self, input_units: u64, output_units: u64) -> u64 {
        if input_units == 0 && output_units == 0 {
            return 0;
        }
        let weighted = input_units.saturating_add(output_units.saturating_mul(self.output_weight));
        weighted.div_ceil(self.credit_divisor).max(1)
    }

    /// Credits for a usage record
    #[inline]
    #[must_use]
    pub fn credits_for_usage(&self, usage: &UsageMetrics) -> u64 {
        self.credits_for(usage.input_units, usage.output_units)
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            output_weight: 5,
            credit_divisor: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_usage_costs_nothing() {
        assert_eq!(CostModel::default().credits_for(0, 0), 0);
    }

    #[test]
    fn ceiling_behavior() {
        let model = CostModel::default();
        assert_eq!(model.credits_for(10_000, 0), 1);
        assert_eq!(model.credits_for(10_001, 0), 2);
        assert_eq!(model.credits_for(1, 0), 1);
    }

    #[test]
    fn output_units_are_weighted() {
        let model = CostModel::default();
        // 2000 output units * weight 5 = 10000 weighted = 1 credit
        assert_eq!(model.credits_for(0, 2_000), 1);
        assert_eq!(model.credits_for(0, 2_001), 2);
    }

    #[test]
    fn unmetered_detection() {
        assert!(UsageMetrics::of(0, 0).is_unmetered());
        assert!(!UsageMetrics::of(1, 0).is_unmetered());
        assert!(!UsageMetrics::of(0, 1).is_unmetered());
    }

    #[test]
    fn flat_estimate_substitutes_only_when_unmetered() {
        let flat = FlatUsageEstimate::default();

        let unmetered = UsageMetrics {
            duration_ms: 1234,
            ..UsageMetrics::of(0, 0)
        };
        let billed = flat.or_actual(unmetered);
        assert_eq!(billed.input_units, 50_000);
        assert_eq!(billed.output_units, 20_000);
        assert_eq!(billed.duration_ms, 1234);

        let measured = UsageMetrics::of(300, 40);
        assert_eq!(flat.or_actual(measured), measured);
    }

    proptest! {
        #[test]
        fn cost_monotone_in_input(i in 0u64..1_000_000, o in 0u64..1_000_000, d in 1u64..100_000) {
            let model = CostModel::default();
            prop_assert!(model.credits_for(i + d, o) >= model.credits_for(i, o));
        }

        #[test]
        fn cost_monotone_in_output(i in 0u64..1_000_000, o in 0u64..1_000_000, d in 1u64..100_000) {
            let model = CostModel::default();
            prop_assert!(model.credits_for(i, o + d) >= model.credits_for(i, o));
        }

        #[test]
        fn nonzero_usage_costs_at_least_one(i in 0u64..1_000_000, o in 0u64..1_000_000) {
            prop_assume!(i > 0 || o > 0);
            prop_assert!(CostModel::default().credits_for(i, o) >= 1);
        }

        #[test]
        fn cost_never_rounds_down(i in 0u64..1_000_000_000) {
            let model = CostModel::default();
            let credits = model.credits_for(i, 0);
            // Credits must cover the weighted units in full.
            prop_assert!(credits * model.credit_divisor >= i);
        }
    }
}
