//! Aggregate snapshot persistence and period comparison.

use chrono::{NaiveDate, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::HistoryStore;
use crate::{
    category::CoarseBucket,
    error::HealthResult,
    region::Region,
    summary::BatchSummary,
    types::SnapshotId,
};

/// The filter context a snapshot was saved under. `None` persists as 'all'.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotFilters {
    pub region: Option<Region>,
    pub vip: Option<u8>,
}

impl SnapshotFilters {
    fn region_code(&self) -> String {
        self.region.map_or_else(|| "all".into(), |r| r.code().into())
    }

    fn vip_code(&self) -> String {
        self.vip.map_or_else(|| "all".into(), |v| v.to_string())
    }
}

/// One persisted aggregate snapshot row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: SnapshotId,
    pub date: String,
    pub saved_at: String,
    pub total_players: i64,
    pub pct_active: f64,
    pub mean_overall: f64,
    pub mean_login: f64,
    pub mean_engagement: f64,
    pub mean_purchase: f64,
    pub bucket_elite: i64,
    pub bucket_good: i64,
    pub bucket_stable: i64,
    pub bucket_low: i64,
    pub bucket_risk_revenue: i64,
    pub bucket_risk_engagement: i64,
    pub region_filter: String,
    pub vip_filter: String,
}

/// One child bucket row of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterBucketRecord {
    pub bucket_name: String,
    pub count: i64,
    pub percent: f64,
    pub mean_purchase: f64,
    pub mean_engagement: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: String,
    pub total_players: i64,
    pub pct_active: f64,
    pub mean_overall: f64,
}

/// Aggregation of a snapshot date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub start: String,
    pub end: String,
    pub days: i64,
    pub mean_total_players: f64,
    pub mean_pct_active: f64,
    pub mean_overall: f64,
    /// First-vs-last deltas across the range.
    pub trend_total_players: i64,
    pub trend_pct_active: f64,
    pub trend_overall: f64,
    pub daily: Vec<DailyPoint>,
}

/// Latest snapshot plus day-over-day variation, for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub reference_date: String,
    pub total_players: i64,
    pub pct_active: f64,
    pub mean_overall: f64,
    pub mean_engagement: f64,
    pub mean_purchase: f64,
    /// Deltas against the previous snapshot; zeros when there is only one.
    pub delta_total_players: i64,
    pub delta_pct_active: f64,
    pub delta_overall: f64,
    pub buckets: Vec<ClusterBucketRecord>,
    pub evolution: Vec<DailyPoint>,
}

impl HistoryStore {
    /// Persist the batch summary as a dated aggregate snapshot plus one
    /// child row per category bucket. Returns the generated snapshot id.
    /// Aggregate history is append-only: saving twice for one date creates
    /// two rows.
    pub fn save_snapshot(
        &self,
        summary: &BatchSummary,
        filters: &SnapshotFilters,
        date: NaiveDate,
    ) -> HealthResult<SnapshotId> {
        let mut coarse = [0i64; 6];
        for breakdown in &summary.categories {
            let slot = match breakdown.category.coarse_bucket() {
                CoarseBucket::Elite => 0,
                CoarseBucket::Good => 1,
                CoarseBucket::Stable => 2,
                CoarseBucket::Low => 3,
                CoarseBucket::RiskRevenue => 4,
                CoarseBucket::RiskEngagement => 5,
            };
            coarse[slot] += breakdown.count;
        }

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO snapshots (
                date, saved_at, total_players, pct_active,
                mean_overall, mean_login, mean_engagement, mean_purchase,
                bucket_elite, bucket_good, bucket_stable, bucket_low,
                bucket_risk_revenue, bucket_risk_engagement,
                region_filter, vip_filter
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
            params![
                date.to_string(),
                Utc::now().to_rfc3339(),
                summary.total_players,
                summary.pct_active,
                summary.mean_overall,
                summary.mean_login,
                summary.mean_engagement,
                summary.mean_purchase,
                coarse[0],
                coarse[1],
                coarse[2],
                coarse[3],
                coarse[4],
                coarse[5],
                filters.region_code(),
                filters.vip_code(),
            ],
        )?;
        let snapshot_id = tx.last_insert_rowid();

        for breakdown in &summary.categories {
            tx.execute(
                "INSERT INTO cluster_buckets (
                    snapshot_id, bucket_name, count, percent,
                    mean_purchase, mean_engagement
                ) VALUES (?1,?2,?3,?4,?5,?6)",
                params![
                    snapshot_id,
                    breakdown.category.code(),
                    breakdown.count,
                    breakdown.percent,
                    breakdown.mean_purchase,
                    breakdown.mean_engagement,
                ],
            )?;
        }
        tx.commit()?;

        Ok(snapshot_id)
    }

    /// Filtered, most-recent-first snapshot listing.
    pub fn list_snapshots(
        &self,
        region: Option<&str>,
        vip: Option<&str>,
        limit: u32,
    ) -> HealthResult<Vec<SnapshotRecord>> {
        let mut sql = String::from("SELECT * FROM snapshots WHERE 1=1");
        let mut args: Vec<String> = Vec::new();

        if let Some(region) = region.filter(|r| *r != "all") {
            sql.push_str(" AND region_filter = ?");
            args.push(region.to_string());
        }
        if let Some(vip) = vip.filter(|v| *v != "all") {
            sql.push_str(" AND vip_filter = ?");
            args.push(vip.to_string());
        }
        sql.push_str(" ORDER BY saved_at DESC LIMIT ?");
        args.push(limit.to_string());

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                Ok(SnapshotRecord {
                    id: row.get("id")?,
                    date: row.get("date")?,
                    saved_at: row.get("saved_at")?,
                    total_players: row.get("total_players")?,
                    pct_active: row.get("pct_active")?,
                    mean_overall: row.get("mean_overall")?,
                    mean_login: row.get("mean_login")?,
                    mean_engagement: row.get("mean_engagement")?,
                    mean_purchase: row.get("mean_purchase")?,
                    bucket_elite: row.get("bucket_elite")?,
                    bucket_good: row.get("bucket_good")?,
                    bucket_stable: row.get("bucket_stable")?,
                    bucket_low: row.get("bucket_low")?,
                    bucket_risk_revenue: row.get("bucket_risk_revenue")?,
                    bucket_risk_engagement: row.get("bucket_risk_engagement")?,
                    region_filter: row.get("region_filter")?,
                    vip_filter: row.get("vip_filter")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Child bucket rows of one snapshot.
    pub fn snapshot_buckets(&self, snapshot_id: SnapshotId) -> HealthResult<Vec<ClusterBucketRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT bucket_name, count, percent, mean_purchase, mean_engagement
             FROM cluster_buckets WHERE snapshot_id = ?1
             ORDER BY count DESC",
        )?;
        let rows = stmt
            .query_map(params![snapshot_id], |row| {
                Ok(ClusterBucketRecord {
                    bucket_name: row.get(0)?,
                    count: row.get(1)?,
                    percent: row.get(2)?,
                    mean_purchase: row.get(3)?,
                    mean_engagement: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete one snapshot and its bucket rows. Returns whether anything
    /// was deleted — a miss is `false`, not an error.
    pub fn delete_snapshot(&self, snapshot_id: SnapshotId) -> HealthResult<bool> {
        let tx = self.conn().unchecked_transaction()?;
        // Children first: the foreign key has no ON DELETE CASCADE.
        tx.execute(
            "DELETE FROM cluster_buckets WHERE snapshot_id = ?1",
            params![snapshot_id],
        )?;
        let affected = tx.execute("DELETE FROM snapshots WHERE id = ?1", params![snapshot_id])?;
        tx.commit()?;
        Ok(affected > 0)
    }

    /// Delete every snapshot saved for one business date.
    pub fn delete_snapshots_by_date(&self, date: NaiveDate) -> HealthResult<bool> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "DELETE FROM cluster_buckets WHERE snapshot_id IN
               (SELECT id FROM snapshots WHERE date = ?1)",
            params![date.to_string()],
        )?;
        let affected = tx.execute(
            "DELETE FROM snapshots WHERE date = ?1",
            params![date.to_string()],
        )?;
        tx.commit()?;
        Ok(affected > 0)
    }

    /// Aggregate the snapshots in a date range into period means plus a
    /// first-vs-last trend. `None` when the range holds no snapshots.
    pub fn compare_periods(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HealthResult<Option<PeriodComparison>> {
        let mut stmt = self.conn().prepare(
            "SELECT date, total_players, pct_active, mean_overall
             FROM snapshots
             WHERE date BETWEEN ?1 AND ?2
             ORDER BY date ASC, saved_at ASC",
        )?;
        let points = stmt
            .query_map(params![start.to_string(), end.to_string()], |row| {
                Ok(DailyPoint {
                    date: row.get(0)?,
                    total_players: row.get(1)?,
                    pct_active: row.get(2)?,
                    mean_overall: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let Some((first, last)) = points.first().zip(points.last()) else {
            return Ok(None);
        };
        let n = points.len() as f64;

        Ok(Some(PeriodComparison {
            start: start.to_string(),
            end: end.to_string(),
            days: points.len() as i64,
            mean_total_players: points.iter().map(|p| p.total_players as f64).sum::<f64>() / n,
            mean_pct_active: points.iter().map(|p| p.pct_active).sum::<f64>() / n,
            mean_overall: points.iter().map(|p| p.mean_overall).sum::<f64>() / n,
            trend_total_players: last.total_players - first.total_players,
            trend_pct_active: last.pct_active - first.pct_active,
            trend_overall: last.mean_overall - first.mean_overall,
            daily: points.clone(),
        }))
    }

    /// Latest snapshot with day-over-day variation and a short evolution
    /// series, for presentation decks. `None` when no history exists.
    pub fn executive_summary(&self, days: u32) -> HealthResult<Option<ExecutiveSummary>> {
        let history = self.list_snapshots(None, None, days)?;
        let Some(latest) = history.first() else {
            return Ok(None);
        };

        let (delta_players, delta_active, delta_overall) = match history.get(1) {
            Some(prev) => (
                latest.total_players - prev.total_players,
                latest.pct_active - prev.pct_active,
                latest.mean_overall - prev.mean_overall,
            ),
            None => (0, 0.0, 0.0),
        };

        Ok(Some(ExecutiveSummary {
            reference_date: latest.date.clone(),
            total_players: latest.total_players,
            pct_active: latest.pct_active,
            mean_overall: latest.mean_overall,
            mean_engagement: latest.mean_engagement,
            mean_purchase: latest.mean_purchase,
            delta_total_players: delta_players,
            delta_pct_active: delta_active,
            delta_overall: delta_overall,
            buckets: self.snapshot_buckets(latest.id)?,
            evolution: history
                .iter()
                .take(7)
                .map(|s| DailyPoint {
                    date: s.date.clone(),
                    total_players: s.total_players,
                    pct_active: s.pct_active,
                    mean_overall: s.mean_overall,
                })
                .collect(),
        }))
    }
}
