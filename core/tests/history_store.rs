use chrono::NaiveDate;
use healthscore_core::{
    batch::process_batch,
    config::ScoringConfig,
    store::{HistoryStore, SnapshotFilters},
    table::{CellValue, DataTable},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn store() -> HistoryStore {
    let store = HistoryStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
}

fn sample_table(players: usize) -> DataTable {
    let mut t = DataTable::new(
        ["player_id", "nivel_vip", "qtd_torneios_3d", "qtd_compras_7d"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );
    for i in 0..players {
        t.push_row(vec![
            CellValue::Text(format!("P{i:03}")),
            CellValue::Number((i % 5 + 1) as f64),
            CellValue::Number((i * 3 % 40) as f64),
            CellValue::Number((i % 7) as f64),
        ]);
    }
    t
}

fn save_sample_snapshot(store: &HistoryStore, day: u32, players: usize) -> i64 {
    let outcome = process_batch(&sample_table(players), &ScoringConfig::default(), date(day)).unwrap();
    store
        .save_snapshot(&outcome.summary, &SnapshotFilters::default(), date(day))
        .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Saving a snapshot persists the headline numbers and one bucket row per
/// populated category.
#[test]
fn snapshot_round_trips() {
    let store = store();
    let outcome = process_batch(&sample_table(30), &ScoringConfig::default(), date(20)).unwrap();
    let id = store
        .save_snapshot(&outcome.summary, &SnapshotFilters::default(), date(20))
        .unwrap();

    let listed = store.list_snapshots(None, None, 10).unwrap();
    assert_eq!(listed.len(), 1);
    let snap = &listed[0];
    assert_eq!(snap.id, id);
    assert_eq!(snap.date, "2026-08-20");
    assert_eq!(snap.total_players, 30);
    assert_eq!(snap.region_filter, "all");

    let buckets = store.snapshot_buckets(id).unwrap();
    assert_eq!(buckets.len() as i64, outcome.summary.categories.len() as i64);
    let total: i64 = buckets.iter().map(|b| b.count).sum();
    assert_eq!(total, 30);
}

/// Aggregate history is append-only: two saves for the same date are two
/// rows, not one.
#[test]
fn same_date_snapshots_append() {
    let store = store();
    save_sample_snapshot(&store, 20, 10);
    save_sample_snapshot(&store, 20, 12);

    let listed = store.list_snapshots(None, None, 10).unwrap();
    assert_eq!(listed.len(), 2);
}

/// The six coarse bucket columns account for every player exactly once.
#[test]
fn coarse_buckets_partition_the_batch() {
    let store = store();
    save_sample_snapshot(&store, 21, 50);

    let snap = &store.list_snapshots(None, None, 1).unwrap()[0];
    let total = snap.bucket_elite
        + snap.bucket_good
        + snap.bucket_stable
        + snap.bucket_low
        + snap.bucket_risk_revenue
        + snap.bucket_risk_engagement;
    assert_eq!(total, 50);
}

/// Deleting removes the snapshot and its bucket rows; deleting a missing
/// id reports false instead of erroring.
#[test]
fn delete_snapshot_and_children() {
    let store = store();
    let id = save_sample_snapshot(&store, 20, 10);

    assert!(store.delete_snapshot(id).unwrap());
    assert!(store.list_snapshots(None, None, 10).unwrap().is_empty());
    assert!(store.snapshot_buckets(id).unwrap().is_empty());

    assert!(!store.delete_snapshot(id).unwrap());
    assert!(!store.delete_snapshot(99_999).unwrap());
}

/// Date-keyed deletion takes out every save for that business date and
/// leaves the others alone.
#[test]
fn delete_by_date() {
    let store = store();
    save_sample_snapshot(&store, 20, 10);
    save_sample_snapshot(&store, 20, 10);
    save_sample_snapshot(&store, 21, 10);

    assert!(store.delete_snapshots_by_date(date(20)).unwrap());
    let left = store.list_snapshots(None, None, 10).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].date, "2026-08-21");

    assert!(!store.delete_snapshots_by_date(date(20)).unwrap());
}

/// The filter columns persist and drive the listing.
#[test]
fn listing_filters_on_region_and_vip() {
    let store = store();
    let outcome = process_batch(&sample_table(10), &ScoringConfig::default(), date(20)).unwrap();
    store
        .save_snapshot(&outcome.summary, &SnapshotFilters::default(), date(20))
        .unwrap();
    store
        .save_snapshot(
            &outcome.summary,
            &SnapshotFilters {
                region: Some(healthscore_core::region::Region::Br),
                vip: Some(3),
            },
            date(20),
        )
        .unwrap();

    assert_eq!(store.list_snapshots(None, None, 10).unwrap().len(), 2);
    let br = store.list_snapshots(Some("br"), None, 10).unwrap();
    assert_eq!(br.len(), 1);
    assert_eq!(br[0].vip_filter, "3");
    assert!(store.list_snapshots(Some("es"), None, 10).unwrap().is_empty());
}

/// Period comparison aggregates the range and reports the first-vs-last
/// trend; an empty range is None, not an error.
#[test]
fn compare_periods_trend_and_empty() {
    let store = store();
    save_sample_snapshot(&store, 20, 10);
    save_sample_snapshot(&store, 22, 30);

    let cmp = store
        .compare_periods(date(19), date(23))
        .unwrap()
        .expect("range holds snapshots");
    assert_eq!(cmp.days, 2);
    assert_eq!(cmp.trend_total_players, 20);
    assert!((cmp.mean_total_players - 20.0).abs() < 1e-9);

    assert!(store.compare_periods(date(1), date(5)).unwrap().is_none());
}

/// The executive summary reads the latest snapshot, deltas against the
/// previous one, and caps the evolution series at 7 points.
#[test]
fn executive_summary_deltas() {
    let store = store();
    assert!(store.executive_summary(7).unwrap().is_none());

    for day in 1..=9 {
        save_sample_snapshot(&store, day, 10 + day as usize);
    }

    let summary = store.executive_summary(30).unwrap().expect("history exists");
    assert_eq!(summary.total_players, 19);
    assert_eq!(summary.delta_total_players, 1);
    assert!(summary.evolution.len() <= 7);
    assert!(!summary.buckets.is_empty());
}
