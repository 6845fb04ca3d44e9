//! Evolution and fluctuation analysis over the per-player history.
//!
//! Everything here is read-only over the store and returns plain
//! serializable values. "No history" is a result, not an error.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    category::Category,
    error::HealthResult,
    store::{HistoryStore, PlayerSnapshotRecord},
    types::PlayerId,
};

/// Coarse direction of a score series, first vs last value only — this is
/// deliberately not a regression fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    fn of(first: f64, last: f64) -> Trend {
        if last > first {
            Trend::Increasing
        } else if last < first {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

/// Deltas across the four sub-scores.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreDeltas {
    pub overall: f64,
    pub engagement: f64,
    pub purchase: f64,
    pub login: f64,
}

impl ScoreDeltas {
    fn between(from: &PlayerSnapshotRecord, to: &PlayerSnapshotRecord) -> Self {
        Self {
            overall: to.score_overall - from.score_overall,
            engagement: to.score_engagement - from.score_engagement,
            purchase: to.score_purchase - from.score_purchase,
            login: to.score_login - from.score_login,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

fn score_stats(values: impl Iterator<Item = f64>) -> ScoreStats {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
        n += 1;
    }
    if n == 0 {
        ScoreStats {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
        }
    } else {
        ScoreStats {
            min,
            max,
            mean: sum / n as f64,
        }
    }
}

/// One day in a player's evolution series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionDay {
    pub date: NaiveDate,
    pub score_overall: f64,
    pub score_engagement: f64,
    pub score_purchase: f64,
    pub score_login: f64,
    pub category: String,
    /// Day-over-day deltas; zeros on the first day of the series.
    pub delta: ScoreDeltas,
    /// The category differs from the previous day's.
    pub category_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionSummary {
    pub overall: ScoreStats,
    pub engagement: ScoreStats,
    pub purchase: ScoreStats,
    pub login: ScoreStats,
    /// First-vs-last variation across the window.
    pub variation_total: ScoreDeltas,
    pub trend: Trend,
    pub category_changes: u32,
    pub current_category: String,
    /// Consecutive trailing days spent in the current category.
    pub current_category_streak: u32,
    pub suggested_action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEvolution {
    pub player_id: PlayerId,
    pub window_days: u32,
    pub days: Vec<EvolutionDay>,
    pub summary: EvolutionSummary,
}

/// Soft-failure wrapper: a player without rows in the window is a valid,
/// explicit answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvolutionReport {
    NoHistory { player_id: PlayerId },
    History(PlayerEvolution),
}

/// Classified movement between a player's earliest and latest category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Improved,
    Declined,
    Held,
    /// One endpoint is outside the fixed category order.
    Unranked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionDirection {
    Improved,
    Declined,
    Any,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerTransition {
    pub player_id: PlayerId,
    pub from_category: String,
    pub to_category: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub from_overall: f64,
    pub to_overall: f64,
    pub delta_overall: f64,
    pub movement: Movement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignPlayerDelta {
    pub player_id: PlayerId,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub delta: ScoreDeltas,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReport {
    pub campaign_tag: String,
    /// Players with at least one tagged row.
    pub participants: u32,
    /// Players with two or more tagged rows (the ones measured).
    pub evaluated: u32,
    pub improved: u32,
    pub declined: u32,
    pub held: u32,
    pub mean_delta: ScoreDeltas,
    pub players: Vec<CampaignPlayerDelta>,
}

/// Soft-failure wrapper for campaign analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CampaignImpact {
    NoData { campaign_tag: String },
    Report(CampaignReport),
}

/// An overall delta beyond this margin moves a campaign participant out of
/// the "held" bucket.
const CAMPAIGN_DELTA_MARGIN: f64 = 5.0;

pub struct EvolutionAnalyzer<'a> {
    store: &'a HistoryStore,
    as_of: NaiveDate,
}

impl<'a> EvolutionAnalyzer<'a> {
    pub fn new(store: &'a HistoryStore) -> Self {
        Self {
            store,
            as_of: chrono::Utc::now().date_naive(),
        }
    }

    /// Anchor the analysis window at an explicit date (tests, backfills).
    pub fn as_of(store: &'a HistoryStore, as_of: NaiveDate) -> Self {
        Self { store, as_of }
    }

    /// Build one player's evolution series over the window.
    pub fn player_evolution(
        &self,
        player_id: &str,
        window_days: u32,
    ) -> HealthResult<EvolutionReport> {
        let rows = self.store.player_history(player_id, window_days, self.as_of)?;
        if rows.is_empty() {
            return Ok(EvolutionReport::NoHistory {
                player_id: player_id.to_string(),
            });
        }

        let mut days = Vec::with_capacity(rows.len());
        let mut category_changes = 0u32;
        for (i, row) in rows.iter().enumerate() {
            let (delta, category_changed) = match i.checked_sub(1).map(|p| &rows[p]) {
                Some(prev) => (
                    ScoreDeltas::between(prev, row),
                    prev.category != row.category,
                ),
                None => (ScoreDeltas::default(), false),
            };
            if category_changed {
                category_changes += 1;
            }
            days.push(EvolutionDay {
                date: row.date,
                score_overall: row.score_overall,
                score_engagement: row.score_engagement,
                score_purchase: row.score_purchase,
                score_login: row.score_login,
                category: row.category.clone(),
                delta,
                category_changed,
            });
        }

        let first = &rows[0];
        let last = &rows[rows.len() - 1];
        let current_category = last.category.clone();
        let streak = rows
            .iter()
            .rev()
            .take_while(|r| r.category == current_category)
            .count() as u32;

        let summary = EvolutionSummary {
            overall: score_stats(rows.iter().map(|r| r.score_overall)),
            engagement: score_stats(rows.iter().map(|r| r.score_engagement)),
            purchase: score_stats(rows.iter().map(|r| r.score_purchase)),
            login: score_stats(rows.iter().map(|r| r.score_login)),
            variation_total: ScoreDeltas::between(first, last),
            trend: Trend::of(first.score_overall, last.score_overall),
            category_changes,
            suggested_action: Category::action_for_code(&current_category).to_string(),
            current_category,
            current_category_streak: streak,
        };

        Ok(EvolutionReport::History(PlayerEvolution {
            player_id: player_id.to_string(),
            window_days,
            days,
            summary,
        }))
    }

    /// Every player whose earliest-vs-latest window endpoints show a
    /// category transition matching the filters, ranked by movement
    /// magnitude (absolute overall delta, descending).
    pub fn players_with_transition(
        &self,
        origin: Option<Category>,
        destination: Option<Category>,
        window_days: u32,
        direction: TransitionDirection,
    ) -> HealthResult<Vec<PlayerTransition>> {
        let rows = self.store.recent_player_snapshots(window_days, self.as_of)?;

        let mut by_player: BTreeMap<&str, Vec<&PlayerSnapshotRecord>> = BTreeMap::new();
        for row in &rows {
            by_player.entry(&row.player_id).or_default().push(row);
        }

        let mut transitions = Vec::new();
        for (player_id, history) in by_player {
            // Rows arrive date-ascending; the endpoints are the comparison.
            if history.len() < 2 {
                continue;
            }
            let earliest = history[0];
            let latest = history[history.len() - 1];

            let movement = classify_movement(&earliest.category, &latest.category);

            if let Some(origin) = origin {
                if Category::from_code(&earliest.category) != Some(origin) {
                    continue;
                }
            }
            if let Some(destination) = destination {
                if Category::from_code(&latest.category) != Some(destination) {
                    continue;
                }
            }
            match direction {
                TransitionDirection::Improved if movement != Movement::Improved => continue,
                TransitionDirection::Declined if movement != Movement::Declined => continue,
                _ => {}
            }

            transitions.push(PlayerTransition {
                player_id: player_id.to_string(),
                from_category: earliest.category.clone(),
                to_category: latest.category.clone(),
                from_date: earliest.date,
                to_date: latest.date,
                from_overall: earliest.score_overall,
                to_overall: latest.score_overall,
                delta_overall: latest.score_overall - earliest.score_overall,
                movement,
            });
        }

        // Unranked moves sort after every ranked one, whatever their
        // delta; within each group, biggest movement first.
        transitions.sort_by(|a, b| {
            let unranked = |t: &PlayerTransition| t.movement == Movement::Unranked;
            unranked(a)
                .cmp(&unranked(b))
                .then_with(|| b.delta_overall.abs().total_cmp(&a.delta_overall.abs()))
        });
        Ok(transitions)
    }

    /// Before/after effect of one campaign: first-vs-last deltas per tagged
    /// player, bucketed by the ±5 overall-score margin.
    pub fn campaign_impact(&self, campaign_tag: &str) -> HealthResult<CampaignImpact> {
        let rows = self.store.campaign_snapshots(campaign_tag)?;
        if rows.is_empty() {
            return Ok(CampaignImpact::NoData {
                campaign_tag: campaign_tag.to_string(),
            });
        }

        let mut by_player: BTreeMap<&str, Vec<&PlayerSnapshotRecord>> = BTreeMap::new();
        for row in &rows {
            by_player.entry(&row.player_id).or_default().push(row);
        }

        let participants = by_player.len() as u32;
        let mut players = Vec::new();
        let (mut improved, mut declined, mut held) = (0u32, 0u32, 0u32);
        let mut sums = ScoreDeltas::default();

        for (player_id, history) in by_player {
            if history.len() < 2 {
                continue;
            }
            let first = history[0];
            let last = history[history.len() - 1];
            let delta = ScoreDeltas::between(first, last);

            if delta.overall > CAMPAIGN_DELTA_MARGIN {
                improved += 1;
            } else if delta.overall < -CAMPAIGN_DELTA_MARGIN {
                declined += 1;
            } else {
                held += 1;
            }

            sums.overall += delta.overall;
            sums.engagement += delta.engagement;
            sums.purchase += delta.purchase;
            sums.login += delta.login;

            players.push(CampaignPlayerDelta {
                player_id: player_id.to_string(),
                first_date: first.date,
                last_date: last.date,
                delta,
            });
        }

        let evaluated = players.len() as u32;
        let n = f64::from(evaluated.max(1));
        Ok(CampaignImpact::Report(CampaignReport {
            campaign_tag: campaign_tag.to_string(),
            participants,
            evaluated,
            improved,
            declined,
            held,
            mean_delta: ScoreDeltas {
                overall: sums.overall / n,
                engagement: sums.engagement / n,
                purchase: sums.purchase / n,
                login: sums.login / n,
            },
            players,
        }))
    }
}

/// Compare two category codes through the fixed quality order. Codes
/// outside the order (lateral segments, legacy values) are unranked.
fn classify_movement(from_code: &str, to_code: &str) -> Movement {
    let from = Category::from_code(from_code).and_then(|c| c.rank());
    let to = Category::from_code(to_code).and_then(|c| c.rank());
    match (from, to) {
        (Some(from), Some(to)) if to > from => Movement::Improved,
        (Some(from), Some(to)) if to < from => Movement::Declined,
        (Some(_), Some(_)) => Movement::Held,
        _ => Movement::Unranked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_follows_category_order() {
        assert_eq!(classify_movement("attention", "good"), Movement::Improved);
        assert_eq!(classify_movement("elite", "stable"), Movement::Declined);
        assert_eq!(classify_movement("good", "good"), Movement::Held);
        assert_eq!(classify_movement("potential", "good"), Movement::Unranked);
        assert_eq!(classify_movement("whatever", "good"), Movement::Unranked);
    }
}
