use chrono::NaiveDate;
use healthscore_core::{
    batch::ScoredPlayer,
    category::Category,
    evolution::{
        CampaignImpact, EvolutionAnalyzer, EvolutionReport, Movement, TransitionDirection, Trend,
    },
    record::PlayerRecord,
    region::Region,
    scoring::ScoreSet,
    store::HistoryStore,
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

/// A scored player with explicit scores and category, bypassing the
/// calculators — these tests exercise history analysis, not scoring.
fn player(id: &str, overall: f64, engagement: f64, category: Category) -> ScoredPlayer {
    ScoredPlayer {
        record: PlayerRecord {
            player_id: id.into(),
            vip_tier: None,
            last_login: None,
            logins_3d: None,
            tournaments_3d: None,
            marathons_3d: None,
            missions_3d: None,
            promos_3d: None,
            purchases_7d: None,
            avg_ticket_7d: None,
            last_purchase: None,
            region: Region::Int,
        },
        scores: ScoreSet {
            login: 50.0,
            engagement,
            purchase: overall,
            overall,
            category,
        },
        active: true,
        vip_status: None,
    }
}

fn save(store: &HistoryStore, day: u32, players: Vec<ScoredPlayer>) {
    store.save_player_snapshots(&players, date(day), None).unwrap();
}

// ── Player evolution ─────────────────────────────────────────────────────────

/// A player without rows in the window is an explicit NoHistory answer.
#[test]
fn unknown_player_reports_no_history() {
    let store = store();
    let analyzer = EvolutionAnalyzer::as_of(&store, date(30));

    match analyzer.player_evolution("ghost", 30).unwrap() {
        EvolutionReport::NoHistory { player_id } => assert_eq!(player_id, "ghost"),
        EvolutionReport::History(_) => panic!("expected NoHistory"),
    }
}

/// A single-day series has zero variation and a Stable trend.
#[test]
fn single_day_series_is_stable() {
    let store = store();
    save(&store, 20, vec![player("P1", 55.0, 50.0, Category::Stable)]);
    let analyzer = EvolutionAnalyzer::as_of(&store, date(30));

    let EvolutionReport::History(evo) = analyzer.player_evolution("P1", 30).unwrap() else {
        panic!("expected history");
    };
    assert_eq!(evo.days.len(), 1);
    assert_eq!(evo.summary.trend, Trend::Stable);
    assert_eq!(evo.summary.variation_total.overall, 0.0);
    assert_eq!(evo.summary.category_changes, 0);
    assert_eq!(evo.summary.current_category_streak, 1);
    assert!(!evo.days[0].category_changed);
}

/// Day-over-day deltas, category-change flags and the trailing streak over
/// a three-day improving series.
#[test]
fn improving_series_deltas_and_streak() {
    let store = store();
    save(&store, 20, vec![player("P1", 30.0, 30.0, Category::RevenueDropRisk)]);
    save(&store, 21, vec![player("P1", 45.0, 40.0, Category::Attention)]);
    save(&store, 22, vec![player("P1", 55.0, 50.0, Category::Stable)]);
    let analyzer = EvolutionAnalyzer::as_of(&store, date(25));

    let EvolutionReport::History(evo) = analyzer.player_evolution("P1", 10).unwrap() else {
        panic!("expected history");
    };
    assert_eq!(evo.days.len(), 3);
    assert!((evo.days[1].delta.overall - 15.0).abs() < 1e-9);
    assert!(evo.days[1].category_changed);
    assert!(evo.days[2].category_changed);
    assert_eq!(evo.summary.category_changes, 2);
    assert_eq!(evo.summary.trend, Trend::Increasing);
    assert!((evo.summary.variation_total.overall - 25.0).abs() < 1e-9);
    assert_eq!(evo.summary.current_category, "stable");
    assert_eq!(evo.summary.current_category_streak, 1);
    assert!((evo.summary.overall.min - 30.0).abs() < 1e-9);
    assert!((evo.summary.overall.max - 55.0).abs() < 1e-9);
}

// ── Transitions ──────────────────────────────────────────────────────────────

/// Direction filtering: an "improved" query only returns players whose
/// latest category outranks their earliest, sorted by movement magnitude.
#[test]
fn transition_direction_and_ordering() {
    let store = store();
    // riser: attention → good (big move). dipper: good → attention.
    // flat: stable → stable.
    save(
        &store,
        20,
        vec![
            player("riser", 42.0, 40.0, Category::Attention),
            player("dipper", 70.0, 60.0, Category::Good),
            player("flat", 55.0, 50.0, Category::Stable),
        ],
    );
    save(
        &store,
        24,
        vec![
            player("riser", 72.0, 65.0, Category::Good),
            player("dipper", 44.0, 40.0, Category::Attention),
            player("flat", 56.0, 50.0, Category::Stable),
        ],
    );
    let analyzer = EvolutionAnalyzer::as_of(&store, date(25));

    let improved = analyzer
        .players_with_transition(None, None, 10, TransitionDirection::Improved)
        .unwrap();
    assert_eq!(improved.len(), 1);
    assert_eq!(improved[0].player_id, "riser");
    assert_eq!(improved[0].movement, Movement::Improved);
    assert!((improved[0].delta_overall - 30.0).abs() < 1e-9);

    let any = analyzer
        .players_with_transition(None, None, 10, TransitionDirection::Any)
        .unwrap();
    assert_eq!(any.len(), 3);
    // Sorted by |overall delta| descending.
    assert_eq!(any[0].player_id, "riser");
    assert_eq!(any[2].player_id, "flat");
    assert_eq!(any[2].movement, Movement::Held);
}

/// Origin/destination filters key on the window endpoints.
#[test]
fn transition_endpoint_filters() {
    let store = store();
    save(&store, 20, vec![player("P1", 42.0, 40.0, Category::Attention)]);
    save(&store, 22, vec![player("P1", 60.0, 55.0, Category::Stable)]);
    save(&store, 24, vec![player("P1", 72.0, 65.0, Category::Good)]);
    let analyzer = EvolutionAnalyzer::as_of(&store, date(25));

    // The mid-window stop at Stable is not an endpoint.
    let hits = analyzer
        .players_with_transition(
            Some(Category::Attention),
            Some(Category::Good),
            10,
            TransitionDirection::Any,
        )
        .unwrap();
    assert_eq!(hits.len(), 1);

    let misses = analyzer
        .players_with_transition(
            Some(Category::Stable),
            None,
            10,
            TransitionDirection::Any,
        )
        .unwrap();
    assert!(misses.is_empty());
}

/// Lateral segments sit outside the quality order: their movement is
/// Unranked, they sort after every ranked transition regardless of delta,
/// and direction filters never match them.
#[test]
fn lateral_categories_are_unranked() {
    let store = store();
    // The lateral mover has by far the biggest delta (+30); the ranked
    // mover only +5.
    save(
        &store,
        20,
        vec![
            player("lateral", 40.0, 65.0, Category::Opportunity),
            player("ranked", 50.0, 45.0, Category::Attention),
        ],
    );
    save(
        &store,
        22,
        vec![
            player("lateral", 70.0, 65.0, Category::Good),
            player("ranked", 55.0, 50.0, Category::Stable),
        ],
    );
    let analyzer = EvolutionAnalyzer::as_of(&store, date(25));

    let any = analyzer
        .players_with_transition(None, None, 10, TransitionDirection::Any)
        .unwrap();
    assert_eq!(any.len(), 2);
    // Ranked first despite the smaller movement.
    assert_eq!(any[0].player_id, "ranked");
    assert_eq!(any[1].player_id, "lateral");
    assert_eq!(any[1].movement, Movement::Unranked);

    let improved = analyzer
        .players_with_transition(None, None, 10, TransitionDirection::Improved)
        .unwrap();
    assert_eq!(improved.len(), 1);
    assert_eq!(improved[0].player_id, "ranked");
}

/// A player with a single row in the window cannot transition.
#[test]
fn single_row_players_are_skipped() {
    let store = store();
    save(&store, 22, vec![player("P1", 60.0, 55.0, Category::Stable)]);
    let analyzer = EvolutionAnalyzer::as_of(&store, date(25));

    let any = analyzer
        .players_with_transition(None, None, 10, TransitionDirection::Any)
        .unwrap();
    assert!(any.is_empty());
}

// ── Campaign impact ──────────────────────────────────────────────────────────

fn save_tagged(store: &HistoryStore, day: u32, tag: &str, players: Vec<ScoredPlayer>) {
    store
        .save_player_snapshots(&players, date(day), Some(tag))
        .unwrap();
}

/// The ±5 margin buckets participants into improved / declined / held;
/// single-row participants count but are not evaluated.
#[test]
fn campaign_impact_buckets() {
    let store = store();
    save_tagged(
        &store,
        20,
        "verano",
        vec![
            player("up", 40.0, 40.0, Category::Attention),
            player("down", 60.0, 55.0, Category::Stable),
            player("same", 50.0, 45.0, Category::Stable),
            player("once", 30.0, 30.0, Category::HighRisk),
        ],
    );
    save_tagged(
        &store,
        24,
        "verano",
        vec![
            player("up", 52.0, 50.0, Category::Stable),
            player("down", 48.0, 45.0, Category::Attention),
            player("same", 53.0, 46.0, Category::Stable),
        ],
    );
    let analyzer = EvolutionAnalyzer::as_of(&store, date(25));

    let CampaignImpact::Report(report) = analyzer.campaign_impact("verano").unwrap() else {
        panic!("expected a report");
    };
    assert_eq!(report.participants, 4);
    assert_eq!(report.evaluated, 3);
    assert_eq!(report.improved, 1);
    assert_eq!(report.declined, 1);
    assert_eq!(report.held, 1);
    // Deltas: +12, -12, +3 → mean +1.
    assert!((report.mean_delta.overall - 1.0).abs() < 1e-9);
}

/// An unknown tag is an explicit NoData answer, not an empty report.
#[test]
fn unknown_campaign_reports_no_data() {
    let store = store();
    let analyzer = EvolutionAnalyzer::as_of(&store, date(25));

    match analyzer.campaign_impact("nope").unwrap() {
        CampaignImpact::NoData { campaign_tag } => assert_eq!(campaign_tag, "nope"),
        CampaignImpact::Report(_) => panic!("expected NoData"),
    }
}
