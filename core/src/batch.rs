//! Batch processing: raw table in, scored batch out.
//!
//! The pipeline is a strict pre-pass-then-map: benchmarks are estimated
//! once over the whole batch, then every row is scored against them. No
//! per-row recomputation of dataset statistics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    benchmark::BenchmarkSet,
    config::ScoringConfig,
    error::HealthResult,
    record::PlayerRecord,
    region::Region,
    scoring::{ScoreCalculator, ScoreSet},
    summary::BatchSummary,
    table::DataTable,
    vip::VipStatus,
};

/// A login score of at least this counts the player as active.
const ACTIVE_LOGIN_THRESHOLD: f64 = 50.0;

/// One fully scored player row.
#[derive(Debug, Clone)]
pub struct ScoredPlayer {
    pub record: PlayerRecord,
    pub scores: ScoreSet,
    pub active: bool,
    pub vip_status: Option<VipStatus>,
}

impl ScoredPlayer {
    pub fn suggested_action(&self) -> &'static str {
        self.scores.category.suggested_action()
    }
}

/// The complete result of processing one uploaded batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub batch_id: Uuid,
    pub processed_at: DateTime<Utc>,
    /// Date recency decay was measured against.
    pub reference_date: NaiveDate,
    pub benchmarks: BenchmarkSet,
    pub players: Vec<ScoredPlayer>,
    pub summary: BatchSummary,
}

impl BatchOutcome {
    /// Players in one region, for filtered views.
    pub fn players_in_region(&self, region: Region) -> Vec<&ScoredPlayer> {
        self.players
            .iter()
            .filter(|p| p.record.region == region)
            .collect()
    }

    /// Players at one VIP tier.
    pub fn players_at_tier(&self, tier: u8) -> Vec<&ScoredPlayer> {
        self.players
            .iter()
            .filter(|p| p.record.vip_tier == Some(tier))
            .collect()
    }
}

/// Score an uploaded batch against its own benchmarks.
///
/// `today` anchors the recency decays; pass the upload date (or the batch's
/// business date when backfilling history).
pub fn process_batch(
    table: &DataTable,
    config: &ScoringConfig,
    today: NaiveDate,
) -> HealthResult<BatchOutcome> {
    let records = PlayerRecord::from_table(table)?;
    let benchmarks = BenchmarkSet::estimate(&records, config);
    let calculator = ScoreCalculator::new(&benchmarks, config, today);

    let players: Vec<ScoredPlayer> = records
        .into_iter()
        .map(|record| {
            let scores = calculator.score(&record);
            let active = scores.login >= ACTIVE_LOGIN_THRESHOLD;
            let vip_status = VipStatus::evaluate(&record);
            ScoredPlayer {
                record,
                scores,
                active,
                vip_status,
            }
        })
        .collect();

    let summary = BatchSummary::build(&players);

    log::info!(
        "processed batch: {} players, {:.1}% active, mean overall {:.1}",
        summary.total_players,
        summary.pct_active,
        summary.mean_overall,
    );

    Ok(BatchOutcome {
        batch_id: Uuid::new_v4(),
        processed_at: Utc::now(),
        reference_date: today,
        benchmarks,
        players,
        summary,
    })
}

/// Flat row view of one scored player, shaped for export writers and for
/// the JSON "full table" endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRow {
    pub player_id: String,
    pub region: String,
    pub vip_tier: Option<u8>,
    pub score_login: f64,
    pub score_engagement: f64,
    pub score_purchase: f64,
    pub score_overall: f64,
    pub category: String,
    pub category_label: String,
    pub suggested_action: String,
    pub active: bool,
    pub vip_status: Option<String>,
}

impl PlayerRow {
    pub fn of(player: &ScoredPlayer) -> Self {
        Self {
            player_id: player.record.player_id.clone(),
            region: player.record.region.code().to_string(),
            vip_tier: player.record.vip_tier,
            score_login: player.scores.login,
            score_engagement: player.scores.engagement,
            score_purchase: player.scores.purchase,
            score_overall: player.scores.overall,
            category: player.scores.category.code().to_string(),
            category_label: player.scores.category.label().to_string(),
            suggested_action: player.suggested_action().to_string(),
            active: player.active,
            vip_status: player.vip_status.map(|s| s.label().to_string()),
        }
    }
}
