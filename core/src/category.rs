//! Player health categories.
//!
//! The category is an internal enum tag; display labels, CRM actions and
//! storage codes hang off it. The legacy dashboard keyed everything on the
//! decorated display string, which made the label format part of the
//! business logic — here the tag is the only thing compared or stored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Elite,
    ActiveVip,
    Good,
    Stable,
    Attention,
    HighRisk,
    RevenueDropRisk,
    EngagementDropRisk,
    ImminentChurn,
    OpportunityVip,
    Opportunity,
    Potential,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Elite,
        Category::ActiveVip,
        Category::Good,
        Category::Stable,
        Category::Attention,
        Category::HighRisk,
        Category::RevenueDropRisk,
        Category::EngagementDropRisk,
        Category::ImminentChurn,
        Category::OpportunityVip,
        Category::Opportunity,
        Category::Potential,
    ];

    /// Assign a category from the three sub-scores, the overall score and
    /// the VIP tier. Ordered rule list, first match wins; total over every
    /// input combination.
    pub fn assign(engagement: f64, purchase: f64, overall: f64, vip_tier: Option<u8>) -> Category {
        // Opportunities first: engaged players who are not spending are the
        // CRM priority, whatever their overall score says.
        if engagement >= 60.0 && purchase < 40.0 {
            return if vip_tier.unwrap_or(1) >= 3 {
                Category::OpportunityVip
            } else {
                Category::Opportunity
            };
        }

        if engagement >= 40.0 && (30.0..50.0).contains(&purchase) {
            return Category::Potential;
        }

        if overall >= 90.0 {
            Category::Elite
        } else if overall >= 80.0 {
            Category::ActiveVip
        } else if overall >= 65.0 {
            Category::Good
        } else if overall >= 50.0 {
            Category::Stable
        } else if overall >= 40.0 {
            Category::Attention
        } else if overall >= 25.0 {
            // Moderate risk band: identify the driver.
            if purchase < 25.0 && engagement < 35.0 {
                Category::HighRisk
            } else if purchase < engagement {
                Category::RevenueDropRisk
            } else {
                Category::EngagementDropRisk
            }
        } else {
            // Critical band.
            if purchase < 15.0 && engagement < 20.0 {
                Category::ImminentChurn
            } else if purchase < engagement {
                Category::RevenueDropRisk
            } else {
                Category::EngagementDropRisk
            }
        }
    }

    /// Stable storage code. This is the value persisted in
    /// `player_snapshots.category` and the cluster bucket names.
    pub fn code(&self) -> &'static str {
        match self {
            Category::Elite => "elite",
            Category::ActiveVip => "active_vip",
            Category::Good => "good",
            Category::Stable => "stable",
            Category::Attention => "attention",
            Category::HighRisk => "high_risk",
            Category::RevenueDropRisk => "revenue_drop_risk",
            Category::EngagementDropRisk => "engagement_drop_risk",
            Category::ImminentChurn => "imminent_churn",
            Category::OpportunityVip => "opportunity_vip",
            Category::Opportunity => "opportunity",
            Category::Potential => "potential",
        }
    }

    pub fn from_code(code: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Elite => "Elite",
            Category::ActiveVip => "Active VIP",
            Category::Good => "Good",
            Category::Stable => "Stable",
            Category::Attention => "Attention",
            Category::HighRisk => "High Risk",
            Category::RevenueDropRisk => "Risk: Revenue Drop",
            Category::EngagementDropRisk => "Risk: Engagement Drop",
            Category::ImminentChurn => "Imminent Churn",
            Category::OpportunityVip => "VIP Opportunity",
            Category::Opportunity => "Opportunity",
            Category::Potential => "Potential",
        }
    }

    /// Suggested CRM action for the segment.
    pub fn suggested_action(&self) -> &'static str {
        match self {
            Category::Elite => "Exclusive benefits + personalization",
            Category::ActiveVip => "Rewards + upsell",
            Category::Good => "Encourage more purchases",
            Category::Stable => "Keep the rhythm + notifications",
            Category::Attention => "Active re-engagement",
            Category::HighRisk => "Urgent special offer",
            Category::RevenueDropRisk => "Focus on conversion",
            Category::EngagementDropRisk => "Focus on activities",
            Category::ImminentChurn => "Call + last-chance offer",
            Category::OpportunityVip => "VIP care + tailored offer",
            Category::Opportunity => "Welcome offer + onboarding",
            Category::Potential => "Nurture + gradual incentives",
        }
    }

    /// Fallback action for categories read from storage that the current
    /// build does not recognize.
    pub const GENERIC_ACTION: &'static str = "General follow-up";

    /// Suggested action for a stored category code, falling back to the
    /// generic action for legacy codes.
    pub fn action_for_code(code: &str) -> &'static str {
        Category::from_code(code).map_or(Category::GENERIC_ACTION, |c| c.suggested_action())
    }

    /// Position in the fixed quality order used to classify transitions.
    /// Higher is better. Lateral segments (opportunity/potential) have no
    /// place in the order and return `None` — they sort last, never error.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Category::Elite => Some(9),
            Category::ActiveVip => Some(8),
            Category::Good => Some(7),
            Category::Stable => Some(6),
            Category::Attention => Some(5),
            Category::HighRisk => Some(4),
            Category::RevenueDropRisk => Some(3),
            Category::EngagementDropRisk => Some(2),
            Category::ImminentChurn => Some(1),
            Category::OpportunityVip | Category::Opportunity | Category::Potential => None,
        }
    }

    /// Coarse bucket used by the aggregate snapshot columns.
    pub fn coarse_bucket(&self) -> CoarseBucket {
        match self {
            Category::Elite => CoarseBucket::Elite,
            Category::ActiveVip | Category::Good => CoarseBucket::Good,
            Category::Stable | Category::Potential => CoarseBucket::Stable,
            Category::Attention | Category::Opportunity | Category::OpportunityVip => {
                CoarseBucket::Low
            }
            Category::RevenueDropRisk | Category::HighRisk | Category::ImminentChurn => {
                CoarseBucket::RiskRevenue
            }
            Category::EngagementDropRisk => CoarseBucket::RiskEngagement,
        }
    }
}

/// The six aggregate snapshot buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseBucket {
    Elite,
    Good,
    Stable,
    Low,
    RiskRevenue,
    RiskEngagement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opportunity_fires_before_score_bands() {
        // High engagement + low purchases would otherwise land in a risk
        // band via the low overall score.
        let c = Category::assign(70.0, 10.0, 28.0, Some(1));
        assert_eq!(c, Category::Opportunity);
        let c = Category::assign(70.0, 10.0, 28.0, Some(4));
        assert_eq!(c, Category::OpportunityVip);
    }

    #[test]
    fn risk_bands_distinguish_driver() {
        // overall in [25, 40): purchase lower than engagement.
        assert_eq!(
            Category::assign(45.0, 22.0, 28.9, None),
            Category::RevenueDropRisk
        );
        // Both low in the critical band.
        assert_eq!(
            Category::assign(10.0, 5.0, 6.5, None),
            Category::ImminentChurn
        );
    }

    #[test]
    fn codes_round_trip() {
        for c in Category::ALL {
            assert_eq!(Category::from_code(c.code()), Some(c));
        }
        assert_eq!(Category::from_code("nope"), None);
    }

    #[test]
    fn legacy_codes_get_the_generic_action() {
        assert_eq!(Category::action_for_code("elite"), Category::Elite.suggested_action());
        assert_eq!(Category::action_for_code("old_segment"), Category::GENERIC_ACTION);
    }
}
