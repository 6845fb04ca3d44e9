//! Per-player daily history.
//!
//! Unlike the aggregate snapshots, per-player history is upserted: the
//! conflict key is (player_id, date), so re-saving within a day replaces
//! that day's row while each new day appends one.

use chrono::{Duration, NaiveDate, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::HistoryStore;
use crate::{batch::ScoredPlayer, error::HealthResult, types::PlayerId};

/// One persisted (player, day) history row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshotRecord {
    pub player_id: PlayerId,
    pub date: NaiveDate,
    pub score_overall: f64,
    pub score_engagement: f64,
    pub score_purchase: f64,
    pub score_login: f64,
    pub purchases_7d: Option<f64>,
    pub avg_ticket_7d: Option<f64>,
    pub tournaments_3d: Option<f64>,
    pub marathons_3d: Option<f64>,
    pub missions_3d: Option<f64>,
    pub promos_3d: Option<f64>,
    pub logins_3d: Option<f64>,
    pub category: String,
    pub vip_tier: Option<u8>,
    pub region: String,
    pub campaign_tag: Option<String>,
}

const SELECT_COLUMNS: &str = "player_id, date, score_overall, score_engagement, \
     score_purchase, score_login, purchases_7d, avg_ticket_7d, tournaments_3d, \
     marathons_3d, missions_3d, promotions_3d, logins_3d, category, vip_tier, \
     region, campaign_tag";

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlayerSnapshotRecord> {
    let date_text: String = row.get(1)?;
    let date = date_text.parse::<NaiveDate>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(PlayerSnapshotRecord {
        player_id: row.get(0)?,
        date,
        score_overall: row.get(2)?,
        score_engagement: row.get(3)?,
        score_purchase: row.get(4)?,
        score_login: row.get(5)?,
        purchases_7d: row.get(6)?,
        avg_ticket_7d: row.get(7)?,
        tournaments_3d: row.get(8)?,
        marathons_3d: row.get(9)?,
        missions_3d: row.get(10)?,
        promos_3d: row.get(11)?,
        logins_3d: row.get(12)?,
        category: row.get(13)?,
        vip_tier: row.get(14)?,
        region: row.get(15)?,
        campaign_tag: row.get(16)?,
    })
}

impl HistoryStore {
    /// Upsert one history row per player for `date`. One transaction per
    /// batch: either every row of the batch lands or none does.
    ///
    /// Returns the number of players written.
    pub fn save_player_snapshots(
        &self,
        players: &[ScoredPlayer],
        date: NaiveDate,
        campaign_tag: Option<&str>,
    ) -> HealthResult<usize> {
        let saved_at = Utc::now().to_rfc3339();
        let tx = self.conn().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO player_snapshots (
                    player_id, date, saved_at,
                    score_overall, score_engagement, score_purchase, score_login,
                    purchases_7d, avg_ticket_7d, tournaments_3d, marathons_3d,
                    missions_3d, promotions_3d, logins_3d,
                    category, vip_tier, region, campaign_tag
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18)
                ON CONFLICT(player_id, date) DO UPDATE SET
                    saved_at         = excluded.saved_at,
                    score_overall    = excluded.score_overall,
                    score_engagement = excluded.score_engagement,
                    score_purchase   = excluded.score_purchase,
                    score_login      = excluded.score_login,
                    purchases_7d     = excluded.purchases_7d,
                    avg_ticket_7d    = excluded.avg_ticket_7d,
                    tournaments_3d   = excluded.tournaments_3d,
                    marathons_3d     = excluded.marathons_3d,
                    missions_3d      = excluded.missions_3d,
                    promotions_3d    = excluded.promotions_3d,
                    logins_3d        = excluded.logins_3d,
                    category         = excluded.category,
                    vip_tier         = excluded.vip_tier,
                    region           = excluded.region,
                    campaign_tag     = excluded.campaign_tag",
            )?;
            for player in players {
                stmt.execute(params![
                    player.record.player_id,
                    date.to_string(),
                    saved_at,
                    player.scores.overall,
                    player.scores.engagement,
                    player.scores.purchase,
                    player.scores.login,
                    player.record.purchases_7d,
                    player.record.avg_ticket_7d,
                    player.record.tournaments_3d,
                    player.record.marathons_3d,
                    player.record.missions_3d,
                    player.record.promos_3d,
                    player.record.logins_3d,
                    player.scores.category.code(),
                    player.record.vip_tier,
                    player.record.region.code(),
                    campaign_tag,
                ])?;
            }
        }
        tx.commit()?;
        Ok(players.len())
    }

    /// One player's rows within the window ending at `as_of`, ascending by
    /// date.
    pub fn player_history(
        &self,
        player_id: &str,
        window_days: u32,
        as_of: NaiveDate,
    ) -> HealthResult<Vec<PlayerSnapshotRecord>> {
        let cutoff = as_of - Duration::days(i64::from(window_days));
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM player_snapshots
             WHERE player_id = ?1 AND date > ?2 AND date <= ?3
             ORDER BY date ASC"
        ))?;
        let rows = stmt
            .query_map(
                params![player_id, cutoff.to_string(), as_of.to_string()],
                read_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Every player's rows within the window, grouped by player through the
    /// ORDER BY. Feeds the transition search.
    pub fn recent_player_snapshots(
        &self,
        window_days: u32,
        as_of: NaiveDate,
    ) -> HealthResult<Vec<PlayerSnapshotRecord>> {
        let cutoff = as_of - Duration::days(i64::from(window_days));
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM player_snapshots
             WHERE date > ?1 AND date <= ?2
             ORDER BY player_id ASC, date ASC"
        ))?;
        let rows = stmt
            .query_map(params![cutoff.to_string(), as_of.to_string()], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All rows tagged with one campaign, ordered for per-player grouping.
    pub fn campaign_snapshots(&self, tag: &str) -> HealthResult<Vec<PlayerSnapshotRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM player_snapshots
             WHERE campaign_tag = ?1
             ORDER BY player_id ASC, date ASC"
        ))?;
        let rows = stmt
            .query_map(params![tag], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total history rows for one player (used in tests and diagnostics).
    pub fn player_row_count(&self, player_id: &str) -> HealthResult<i64> {
        self.conn()
            .query_row(
                "SELECT COUNT(*) FROM player_snapshots WHERE player_id = ?1",
                params![player_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
