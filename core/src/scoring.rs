//! The three sub-score calculators and the composite score.
//!
//! Pure functions over (record, benchmarks, config, reference date): no
//! mutation, no I/O, every output clamped to [0, 100]. Components whose
//! input is missing drop out and the remaining weights renormalize; the
//! documented defaults apply when nothing is left.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    benchmark::{BenchmarkSet, Metric, MetricStats},
    category::Category,
    config::{NormalizationMode, ScoringConfig},
    record::PlayerRecord,
};

/// Full scoring output for one player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSet {
    pub login: f64,
    pub engagement: f64,
    pub purchase: f64,
    pub overall: f64,
    pub category: Category,
}

/// Stateless calculator bound to one batch's benchmarks.
///
/// The reference date is injected rather than read from the system clock so
/// recency decay is reproducible in tests and in backfilled batches.
pub struct ScoreCalculator<'a> {
    benchmarks: &'a BenchmarkSet,
    config: &'a ScoringConfig,
    today: NaiveDate,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(benchmarks: &'a BenchmarkSet, config: &'a ScoringConfig, today: NaiveDate) -> Self {
        Self {
            benchmarks,
            config,
            today,
        }
    }

    pub fn score(&self, record: &PlayerRecord) -> ScoreSet {
        let login = self.login_score(record);
        let engagement = self.engagement_score(record);
        let purchase = self.purchase_score(record);
        let overall = clamp(
            engagement * self.config.overall_engagement_weight
                + purchase * self.config.overall_purchase_weight,
        );
        let category = Category::assign(engagement, purchase, overall, record.vip_tier);
        ScoreSet {
            login,
            engagement,
            purchase,
            overall,
            category,
        }
    }

    /// Login score: average of recency decay and login frequency, each
    /// optional. No signal at all reads as neutral (50) — an absent column
    /// is not evidence of churn.
    pub fn login_score(&self, record: &PlayerRecord) -> f64 {
        let mut components: Vec<f64> = Vec::with_capacity(2);

        if let Some(last_login) = record.last_login {
            let days = days_since(self.today, last_login);
            components.push(100.0 * (-days / 7.0).exp());
        }

        if let Some(count) = record.logins_3d {
            let factor = self.benchmarks.logins.factor;
            components.push((count * factor).min(100.0));
        }

        if components.is_empty() {
            50.0
        } else {
            clamp(components.iter().sum::<f64>() / components.len() as f64)
        }
    }

    /// Engagement score. Linear-factor mode folds the VIP tier in at a
    /// 60/40 split; z-score mode scores activities only (logins included).
    pub fn engagement_score(&self, record: &PlayerRecord) -> f64 {
        match self.config.normalization {
            NormalizationMode::LinearFactor => self.engagement_linear(record),
            NormalizationMode::ZScore => self.engagement_zscore(record),
        }
    }

    fn engagement_linear(&self, record: &PlayerRecord) -> f64 {
        let mut weighted = 0.0;
        let mut weights = 0.0;
        for metric in Metric::ACTIVITIES {
            if let Some(value) = metric.value(record) {
                let stats = self.benchmarks.metric(metric);
                let score = (value * stats.factor).min(100.0);
                weighted += score * metric.engagement_weight();
                weights += metric.engagement_weight();
            }
        }

        let mut parts = 0.0;
        let mut part_weights = 0.0;
        if weights > 0.0 {
            parts += (weighted / weights) * 0.60;
            part_weights += 0.60;
        }
        if let Some(tier) = record.vip_tier {
            let vip_score = 20.0 + (f64::from(tier) - 1.0) / 4.0 * 80.0;
            parts += vip_score * 0.40;
            part_weights += 0.40;
        }

        if part_weights > 0.0 {
            clamp(parts / part_weights)
        } else {
            40.0
        }
    }

    fn engagement_zscore(&self, record: &PlayerRecord) -> f64 {
        let mut weighted = 0.0;
        let mut weights = 0.0;
        let activities = [
            Metric::Tournaments,
            Metric::Marathons,
            Metric::Missions,
            Metric::Promos,
            Metric::Logins,
        ];
        for metric in activities {
            if let Some(value) = metric.value(record) {
                let stats = self.benchmarks.metric(metric);
                weighted += z_score(value, stats) * metric.engagement_weight();
                weights += metric.engagement_weight();
            }
        }

        if weights > 0.0 {
            clamp(weighted / weights)
        } else {
            40.0
        }
    }

    /// Purchase score: quantity 40%, average ticket 35%, recency 25%.
    /// No purchase signal at all means zero purchase health — this default
    /// is deliberately not neutral.
    pub fn purchase_score(&self, record: &PlayerRecord) -> f64 {
        let mut weighted = 0.0;
        let mut weights = 0.0;

        if let Some(qty) = record.purchases_7d {
            weighted += self.normalized(qty, &self.benchmarks.purchases) * 0.40;
            weights += 0.40;
        }

        if let Some(ticket) = record.avg_ticket_7d {
            weighted += self.normalized(ticket, &self.benchmarks.avg_ticket) * 0.35;
            weights += 0.35;
        }

        if let Some(last_purchase) = record.last_purchase {
            let days = days_since(self.today, last_purchase);
            weighted += 100.0 * (-days / 30.0).exp() * 0.25;
            weights += 0.25;
        }

        if weights > 0.0 {
            clamp(weighted / weights)
        } else {
            0.0
        }
    }

    fn normalized(&self, value: f64, stats: &MetricStats) -> f64 {
        match self.config.normalization {
            // `stats.factor` already encodes the 1.5x-mean saturation, with
            // the static fallback baked in when the positive mean is zero.
            NormalizationMode::LinearFactor => (value * stats.factor).min(100.0),
            NormalizationMode::ZScore => z_score(value, stats),
        }
    }
}

fn z_score(value: f64, stats: &MetricStats) -> f64 {
    let std = stats.std_all.max(1.0);
    clamp(50.0 + 25.0 * (value - stats.mean_all) / std)
}

fn clamp(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Whole days between the reference date and an event date, floored at 0
/// so future-dated rows do not inflate recency.
fn days_since(today: NaiveDate, event: NaiveDate) -> f64 {
    (today - event).num_days().max(0) as f64
}
