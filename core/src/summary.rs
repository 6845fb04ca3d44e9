//! Aggregate batch summary.
//!
//! Everything in here is a plain serializable value: the upload handler
//! returns it straight as JSON, the history store persists a slice of it,
//! and the export writer walks it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    batch::ScoredPlayer,
    category::Category,
    region::Region,
    vip::VipTier,
};

/// Compact per-player line for top-N listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerBrief {
    pub player_id: String,
    pub overall: f64,
    pub login: f64,
    pub engagement: f64,
    pub purchase: f64,
    pub category: Category,
    pub suggested_action: String,
}

impl PlayerBrief {
    fn of(player: &ScoredPlayer) -> Self {
        Self {
            player_id: player.record.player_id.clone(),
            overall: player.scores.overall,
            login: player.scores.login,
            engagement: player.scores.engagement,
            purchase: player.scores.purchase,
            category: player.scores.category,
            suggested_action: player.scores.category.suggested_action().to_string(),
        }
    }
}

/// One category's share of the batch, with the per-category score means
/// the cluster bucket rows persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub count: i64,
    pub percent: f64,
    pub mean_purchase: f64,
    pub mean_engagement: f64,
}

/// Summary of one slice of the batch (a region, a VIP tier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub count: i64,
    pub percent: f64,
    pub pct_active: f64,
    pub mean_overall: f64,
    pub mean_login: f64,
    pub mean_engagement: f64,
    pub mean_purchase: f64,
    pub top: Vec<PlayerBrief>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_players: i64,
    pub pct_active: f64,
    pub mean_overall: f64,
    pub mean_login: f64,
    pub mean_engagement: f64,
    pub mean_purchase: f64,
    pub categories: Vec<CategoryBreakdown>,
    pub top_players: Vec<PlayerBrief>,
    /// Keyed by region storage code.
    pub regions: BTreeMap<String, SegmentSummary>,
    /// Keyed by VIP tier number, present only when the batch carried tiers.
    pub vip_tiers: BTreeMap<u8, SegmentSummary>,
}

impl BatchSummary {
    pub fn build(players: &[ScoredPlayer]) -> Self {
        let refs: Vec<&ScoredPlayer> = players.iter().collect();
        let total = refs.len() as i64;
        let means = Means::over(&refs);

        let mut categories = Vec::new();
        for category in Category::ALL {
            let members: Vec<&ScoredPlayer> = refs
                .iter()
                .copied()
                .filter(|p| p.scores.category == category)
                .collect();
            if members.is_empty() {
                continue;
            }
            let m = Means::over(&members);
            categories.push(CategoryBreakdown {
                category,
                count: members.len() as i64,
                percent: percent(members.len(), refs.len()),
                mean_purchase: m.purchase,
                mean_engagement: m.engagement,
            });
        }

        let mut regions = BTreeMap::new();
        for region in Region::ALL {
            let members: Vec<&ScoredPlayer> = refs
                .iter()
                .copied()
                .filter(|p| p.record.region == region)
                .collect();
            if !members.is_empty() {
                regions.insert(
                    region.code().to_string(),
                    segment_summary(&members, refs.len(), 3),
                );
            }
        }

        let mut vip_tiers = BTreeMap::new();
        for tier in 1u8..=5 {
            let members: Vec<&ScoredPlayer> = refs
                .iter()
                .copied()
                .filter(|p| p.record.vip_tier == Some(tier))
                .collect();
            if !members.is_empty() {
                vip_tiers.insert(tier, segment_summary(&members, refs.len(), 3));
            }
        }

        Self {
            total_players: total,
            pct_active: percent(refs.iter().filter(|p| p.active).count(), refs.len()),
            mean_overall: means.overall,
            mean_login: means.login,
            mean_engagement: means.engagement,
            mean_purchase: means.purchase,
            categories,
            top_players: top_by_overall(&refs, 10),
            regions,
            vip_tiers,
        }
    }

    pub fn category_count(&self, category: Category) -> i64 {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map_or(0, |c| c.count)
    }

    /// Display name for a VIP tier key (used by report writers).
    pub fn vip_tier_name(tier: u8) -> &'static str {
        VipTier::get(tier).name
    }
}

struct Means {
    overall: f64,
    login: f64,
    engagement: f64,
    purchase: f64,
}

impl Means {
    fn over(players: &[&ScoredPlayer]) -> Self {
        let n = players.len().max(1) as f64;
        let mut sums = (0.0, 0.0, 0.0, 0.0);
        for p in players {
            sums.0 += p.scores.overall;
            sums.1 += p.scores.login;
            sums.2 += p.scores.engagement;
            sums.3 += p.scores.purchase;
        }
        Self {
            overall: sums.0 / n,
            login: sums.1 / n,
            engagement: sums.2 / n,
            purchase: sums.3 / n,
        }
    }
}

fn segment_summary(members: &[&ScoredPlayer], batch_size: usize, top_n: usize) -> SegmentSummary {
    let means = Means::over(members);
    SegmentSummary {
        count: members.len() as i64,
        percent: percent(members.len(), batch_size),
        pct_active: percent(members.iter().filter(|p| p.active).count(), members.len()),
        mean_overall: means.overall,
        mean_login: means.login,
        mean_engagement: means.engagement,
        mean_purchase: means.purchase,
        top: top_by_overall(members, top_n),
    }
}

fn top_by_overall(players: &[&ScoredPlayer], n: usize) -> Vec<PlayerBrief> {
    let mut sorted: Vec<&ScoredPlayer> = players.to_vec();
    sorted.sort_by(|a, b| b.scores.overall.total_cmp(&a.scores.overall));
    sorted.into_iter().take(n).map(PlayerBrief::of).collect()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
