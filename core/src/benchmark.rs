//! Benchmark estimation.
//!
//! All normalization is dataset-relative: before any row is scored, a
//! pre-pass over the whole batch derives per-metric statistics that the
//! score calculators then consume. Zero readings mean "did not participate",
//! not "performed at zero level", so the headline statistics exclude them —
//! including zeros would drag every benchmark toward the inactive tail.
//!
//! The z-score scheme is the exception: its mean/stddev deliberately
//! include zeros. Both sets of statistics are computed here once.

use serde::{Deserialize, Serialize};

use crate::{config::ScoringConfig, record::PlayerRecord};

/// The activity metrics the estimator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Tournaments,
    Marathons,
    Missions,
    Promos,
    Logins,
}

impl Metric {
    /// The four engagement activities, in weight order.
    pub const ACTIVITIES: [Metric; 4] = [
        Metric::Tournaments,
        Metric::Marathons,
        Metric::Missions,
        Metric::Promos,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Tournaments => "tournaments",
            Metric::Marathons => "marathons",
            Metric::Missions => "missions",
            Metric::Promos => "promos",
            Metric::Logins => "logins",
        }
    }

    /// Relative weight inside the engagement score. Logins only carry
    /// weight under the z-score scheme.
    pub fn engagement_weight(&self) -> f64 {
        match self {
            Metric::Tournaments => 2.0,
            Metric::Marathons => 2.5,
            Metric::Missions => 1.5,
            Metric::Promos => 1.0,
            Metric::Logins => 1.0,
        }
    }

    pub fn value(&self, record: &PlayerRecord) -> Option<f64> {
        match self {
            Metric::Tournaments => record.tournaments_3d,
            Metric::Marathons => record.marathons_3d,
            Metric::Missions => record.missions_3d,
            Metric::Promos => record.promos_3d,
            Metric::Logins => record.logins_3d,
        }
    }

    fn default_per_day(&self, config: &ScoringConfig) -> f64 {
        match self {
            Metric::Tournaments => config.defaults.tournaments_per_day,
            Metric::Marathons => config.defaults.marathons_per_day,
            Metric::Missions => config.defaults.missions_per_day,
            Metric::Promos => config.defaults.promos_per_day,
            Metric::Logins => 1.0,
        }
    }

    fn zero_mean_factor(&self) -> f64 {
        match self {
            // One login per day over a 3-day window maps to 100.
            Metric::Logins => 33.33,
            _ => 1.0,
        }
    }
}

/// Where the batch's benchmark parameters came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkSource {
    /// Computed from the uploaded batch.
    Dynamic,
    /// No activity column found; static fallbacks in effect.
    Default,
}

/// Normalization parameters for one metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricStats {
    /// Mean over strictly-positive samples; 0 when none exist.
    pub mean_positive: f64,
    /// Sample standard deviation over strictly-positive samples.
    pub std_positive: f64,
    /// Median over strictly-positive samples.
    pub median_positive: f64,
    /// Mean over all present samples, zeros included (z-score scheme).
    pub mean_all: f64,
    /// Sample standard deviation over all present samples, zeros included.
    pub std_all: f64,
    /// Window mean divided by the window length, for display benchmarks.
    pub per_day: f64,
    /// Linear normalization factor: a player at 1.5x the positive mean
    /// saturates at 100.
    pub factor: f64,
    /// Whether the column was present in the batch.
    pub dynamic: bool,
}

impl MetricStats {
    fn absent(per_day: f64, window_days: f64) -> Self {
        Self {
            mean_positive: 0.0,
            std_positive: 0.0,
            median_positive: 0.0,
            mean_all: 0.0,
            std_all: 0.0,
            per_day,
            factor: if per_day > 0.0 {
                100.0 / (per_day * window_days)
            } else {
                1.0
            },
            dynamic: false,
        }
    }

    fn from_samples(present: &[f64], window_days: f64, zero_mean_factor: f64) -> Self {
        let positive: Vec<f64> = present.iter().copied().filter(|v| *v > 0.0).collect();
        let mean_positive = mean(&positive);
        Self {
            mean_positive,
            std_positive: sample_std(&positive),
            median_positive: median(&positive),
            mean_all: mean(present),
            std_all: sample_std(present),
            per_day: mean_positive / window_days,
            factor: if mean_positive > 0.0 {
                100.0 / (mean_positive * 1.5)
            } else {
                zero_mean_factor
            },
            dynamic: true,
        }
    }
}

/// The full benchmark parameter set for one batch. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSet {
    pub source: BenchmarkSource,
    pub tournaments: MetricStats,
    pub marathons: MetricStats,
    pub missions: MetricStats,
    pub promos: MetricStats,
    pub logins: MetricStats,
    pub purchases: MetricStats,
    pub avg_ticket: MetricStats,
}

impl BenchmarkSet {
    pub fn estimate(records: &[PlayerRecord], config: &ScoringConfig) -> Self {
        let tournaments = activity_stats(records, Metric::Tournaments, config);
        let marathons = activity_stats(records, Metric::Marathons, config);
        let missions = activity_stats(records, Metric::Missions, config);
        let promos = activity_stats(records, Metric::Promos, config);
        let logins = activity_stats(records, Metric::Logins, config);

        let purchases = optional_stats(records.iter().map(|r| r.purchases_7d), 7.0, 33.33);
        let avg_ticket = optional_stats(records.iter().map(|r| r.avg_ticket_7d), 7.0, 2.0);

        let source = if [&tournaments, &marathons, &missions, &promos, &logins]
            .iter()
            .any(|s| s.dynamic)
        {
            BenchmarkSource::Dynamic
        } else {
            BenchmarkSource::Default
        };

        Self {
            source,
            tournaments,
            marathons,
            missions,
            promos,
            logins,
            purchases,
            avg_ticket,
        }
    }

    pub fn metric(&self, metric: Metric) -> &MetricStats {
        match metric {
            Metric::Tournaments => &self.tournaments,
            Metric::Marathons => &self.marathons,
            Metric::Missions => &self.missions,
            Metric::Promos => &self.promos,
            Metric::Logins => &self.logins,
        }
    }
}

fn activity_stats(records: &[PlayerRecord], metric: Metric, config: &ScoringConfig) -> MetricStats {
    let window = f64::from(config.defaults.login_window_days);
    let present: Vec<f64> = records.iter().filter_map(|r| metric.value(r)).collect();
    if present.is_empty() {
        MetricStats::absent(metric.default_per_day(config), window)
    } else {
        MetricStats::from_samples(&present, window, metric.zero_mean_factor())
    }
}

fn optional_stats(
    values: impl Iterator<Item = Option<f64>>,
    window_days: f64,
    zero_mean_factor: f64,
) -> MetricStats {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        let mut stats = MetricStats::absent(0.0, window_days);
        stats.factor = zero_mean_factor;
        stats
    } else {
        MetricStats::from_samples(&present, window_days, zero_mean_factor)
    }
}

// ── Plain statistics ─────────────────────────────────────────────────────────

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample standard deviation (n − 1); 0 for fewer than two samples.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
