//! The "last processed batch" cache.
//!
//! Readers must never observe a half-replaced batch, so the cache swaps a
//! whole `Arc<BatchOutcome>` under a short lock: a new batch is fully built
//! before it is published, and readers keep their own handle to whichever
//! batch they saw. Last write wins; cross-process safety is out of scope.

use std::sync::{Arc, RwLock};

use crate::batch::BatchOutcome;

#[derive(Default)]
pub struct BatchCache {
    current: RwLock<Option<Arc<BatchOutcome>>>,
}

impl BatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a freshly processed batch, replacing any previous one.
    pub fn publish(&self, outcome: BatchOutcome) -> Arc<BatchOutcome> {
        let shared = Arc::new(outcome);
        let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::clone(&shared));
        shared
    }

    /// Handle to the most recently published batch, if any.
    pub fn latest(&self) -> Option<Arc<BatchOutcome>> {
        let slot = self.current.read().unwrap_or_else(|e| e.into_inner());
        slot.clone()
    }

    /// Drop the cached batch (process shutdown / tests).
    pub fn clear(&self) {
        let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        batch::process_batch,
        config::ScoringConfig,
        table::{CellValue, DataTable},
    };
    use chrono::NaiveDate;

    fn outcome(players: usize) -> BatchOutcome {
        let mut t = DataTable::new(vec!["player_id".into()]);
        for i in 0..players {
            t.push_row(vec![CellValue::Text(format!("P{i}"))]);
        }
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        process_batch(&t, &ScoringConfig::default(), date).unwrap()
    }

    #[test]
    fn publish_replaces_and_old_handles_stay_valid() {
        let cache = BatchCache::new();
        assert!(cache.latest().is_none());

        let first = cache.publish(outcome(2));
        let second = cache.publish(outcome(5));

        // The old handle still sees the batch it was given.
        assert_eq!(first.summary.total_players, 2);
        assert_eq!(second.summary.total_players, 5);
        assert_eq!(cache.latest().unwrap().summary.total_players, 5);

        cache.clear();
        assert!(cache.latest().is_none());
    }
}
