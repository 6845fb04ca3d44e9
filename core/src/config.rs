//! Scoring configuration.
//!
//! Two normalization schemes shipped in different dashboard revisions and
//! downstream consumers depend on both, so the scheme is an explicit,
//! selectable mode rather than a hardcoded behaviour.

use serde::{Deserialize, Serialize};

/// How raw activity/purchase metrics are normalized into 0–100 scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// `min(value * factor, 100)` with `factor = 100 / (mean_pos * 1.5)`.
    /// Engagement folds VIP tier in at a 60/40 split.
    LinearFactor,
    /// `clamp(50 + 25 * (value - mean) / stddev, 0, 100)` with mean/stddev
    /// computed over the whole batch including zeros. VIP tier is not
    /// folded into engagement under this mode.
    ZScore,
}

/// Static fallback benchmarks, used when a metric column is absent from
/// the uploaded batch. Values are per-day rates from the legacy dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultBenchmarks {
    pub tournaments_per_day: f64,
    pub marathons_per_day: f64,
    pub missions_per_day: f64,
    pub promos_per_day: f64,
    pub login_window_days: u32,
}

impl Default for DefaultBenchmarks {
    fn default() -> Self {
        Self {
            tournaments_per_day: 40.0,
            marathons_per_day: 11.0,
            missions_per_day: 3.0,
            promos_per_day: 9.0,
            login_window_days: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub normalization: NormalizationMode,
    /// Weight of the engagement sub-score in the overall score.
    pub overall_engagement_weight: f64,
    /// Weight of the purchase sub-score in the overall score. Purchases
    /// dominate because the revenue signal is prioritized.
    pub overall_purchase_weight: f64,
    pub defaults: DefaultBenchmarks,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationMode::LinearFactor,
            overall_engagement_weight: 0.3,
            overall_purchase_weight: 0.7,
            defaults: DefaultBenchmarks::default(),
        }
    }
}

impl ScoringConfig {
    pub fn with_mode(mode: NormalizationMode) -> Self {
        Self {
            normalization: mode,
            ..Self::default()
        }
    }
}
