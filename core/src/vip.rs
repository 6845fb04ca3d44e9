//! VIP tier metadata and expectation tracking.
//!
//! Each tier carries an expected weekly purchase profile; comparing a
//! player's actuals against it yields a coarse "is this VIP performing
//! like one" status used in the dashboard summary.

use serde::{Deserialize, Serialize};

use crate::record::PlayerRecord;

/// Static profile for one VIP tier (1–5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VipTier {
    pub tier: u8,
    pub name: &'static str,
    pub label: &'static str,
    pub expected_purchases_7d: f64,
    pub expected_avg_ticket: f64,
}

const TIERS: [VipTier; 5] = [
    VipTier {
        tier: 1,
        name: "Amethyst",
        label: "Starter",
        expected_purchases_7d: 1.0,
        expected_avg_ticket: 20.0,
    },
    VipTier {
        tier: 2,
        name: "Topaz",
        label: "Regular",
        expected_purchases_7d: 2.0,
        expected_avg_ticket: 35.0,
    },
    VipTier {
        tier: 3,
        name: "Emerald",
        label: "Loyal",
        expected_purchases_7d: 3.0,
        expected_avg_ticket: 50.0,
    },
    VipTier {
        tier: 4,
        name: "Opal",
        label: "Premium",
        expected_purchases_7d: 4.0,
        expected_avg_ticket: 75.0,
    },
    VipTier {
        tier: 5,
        name: "Beryl",
        label: "Elite",
        expected_purchases_7d: 5.0,
        expected_avg_ticket: 100.0,
    },
];

impl VipTier {
    /// Tier profile; out-of-range tiers fall back to tier 1.
    pub fn get(tier: u8) -> VipTier {
        TIERS
            .iter()
            .copied()
            .find(|t| t.tier == tier)
            .unwrap_or(TIERS[0])
    }
}

/// Performance of a player against their tier's purchase expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VipStatus {
    Exceeding,
    OnTarget,
    Below,
    Critical,
}

impl VipStatus {
    /// Weighted actual-vs-expected comparison: purchase count carries 60%,
    /// ticket size 40%. Thresholds at 120 / 90 / 60 percent.
    pub fn evaluate(record: &PlayerRecord) -> Option<VipStatus> {
        let tier = VipTier::get(record.vip_tier?);

        let qty = record.purchases_7d.unwrap_or(0.0);
        let ticket = record.avg_ticket_7d.unwrap_or(0.0);

        let qty_perf = if tier.expected_purchases_7d > 0.0 {
            qty / tier.expected_purchases_7d * 100.0
        } else {
            0.0
        };
        let ticket_perf = if tier.expected_avg_ticket > 0.0 {
            ticket / tier.expected_avg_ticket * 100.0
        } else {
            0.0
        };

        let performance = qty_perf * 0.6 + ticket_perf * 0.4;
        Some(if performance >= 120.0 {
            VipStatus::Exceeding
        } else if performance >= 90.0 {
            VipStatus::OnTarget
        } else if performance >= 60.0 {
            VipStatus::Below
        } else {
            VipStatus::Critical
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            VipStatus::Exceeding => "Exceeding target",
            VipStatus::OnTarget => "On target",
            VipStatus::Below => "Below expectation",
            VipStatus::Critical => "Critical",
        }
    }
}
