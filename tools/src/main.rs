//! health-runner: headless scoring runner.
//!
//! Generates a deterministic sample batch, scores it day by day, persists
//! the history and prints the resulting reports as JSON.
//!
//! Usage:
//!   health-runner --seed 42 --players 200 --days 14 --db health.db
//!   health-runner --seed 42 --mode zscore

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::env;

use healthscore_core::{
    batch::{process_batch, PlayerRow},
    benchmark::Metric,
    config::{NormalizationMode, ScoringConfig},
    evolution::{EvolutionAnalyzer, TransitionDirection},
    session::BatchCache,
    store::{HistoryStore, SnapshotFilters},
    table::{CellValue, DataTable},
};

/// Behavioural archetype driving a sample player's daily numbers.
#[derive(Clone, Copy)]
enum Archetype {
    Whale,
    Regular,
    Casual,
    Churning,
    Dormant,
}

impl Archetype {
    fn of(index: usize) -> Archetype {
        match index % 10 {
            0 => Archetype::Whale,
            1..=4 => Archetype::Regular,
            5..=7 => Archetype::Casual,
            8 => Archetype::Churning,
            _ => Archetype::Dormant,
        }
    }
}

const COLUMNS: [&str; 12] = [
    "player_id",
    "nivel_vip",
    "lastlogin",
    "qtd_logins_3d",
    "qtd_torneios_3d",
    "qtd_maratonas_3d",
    "qtd_missoes_3d",
    "qtd_promos_3d",
    "qtd_compras_7d",
    "ticket_medio_7d",
    "ultima_compra",
    "translation",
];

/// One day's sample batch. `day` shifts behaviour so the history has real
/// movement: churning players decay, whales climb slightly.
fn sample_table(rng: &mut Pcg64Mcg, players: usize, date: NaiveDate, day: u32) -> DataTable {
    let mut table = DataTable::new(COLUMNS.iter().map(|c| c.to_string()).collect());

    for i in 0..players {
        let archetype = Archetype::of(i);
        let drift = f64::from(day);

        let (vip, logins, activity_scale, purchases, ticket, login_gap, purchase_gap) =
            match archetype {
                Archetype::Whale => (
                    rng.gen_range(4..=5),
                    rng.gen_range(2.5..3.0) + drift * 0.02,
                    1.4 + drift * 0.01,
                    rng.gen_range(4.0..8.0),
                    rng.gen_range(80.0..200.0),
                    0i64,
                    rng.gen_range(0..2),
                ),
                Archetype::Regular => (
                    rng.gen_range(2..=3),
                    rng.gen_range(1.5..3.0),
                    1.0,
                    rng.gen_range(1.0..4.0),
                    rng.gen_range(25.0..60.0),
                    rng.gen_range(0..3),
                    rng.gen_range(1..6),
                ),
                Archetype::Casual => (
                    rng.gen_range(1..=2),
                    rng.gen_range(0.5..2.0),
                    0.6,
                    rng.gen_range(0.0..2.0),
                    rng.gen_range(5.0..30.0),
                    rng.gen_range(2..7),
                    rng.gen_range(5..15),
                ),
                Archetype::Churning => (
                    rng.gen_range(2..=4),
                    (1.5 - drift * 0.1).max(0.0),
                    (0.8 - drift * 0.05).max(0.05),
                    (2.0 - drift * 0.2).max(0.0),
                    rng.gen_range(20.0..50.0),
                    (drift * 0.5) as i64,
                    5 + (drift * 0.7) as i64,
                ),
                Archetype::Dormant => (
                    1,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    rng.gen_range(15..45),
                    rng.gen_range(30..90),
                ),
            };

        let last_login = date - Duration::days(login_gap);
        let last_purchase = date - Duration::days(purchase_gap);

        table.push_row(vec![
            CellValue::Text(format!("P{i:04}")),
            CellValue::Number(f64::from(vip)),
            CellValue::Text(last_login.to_string()),
            CellValue::Number((logins * 3.0).round()),
            CellValue::Number((rng.gen_range(20.0..60.0) * activity_scale).round()),
            CellValue::Number((rng.gen_range(5.0..16.0) * activity_scale).round()),
            CellValue::Number((rng.gen_range(1.0..5.0) * activity_scale).round()),
            CellValue::Number((rng.gen_range(4.0..14.0) * activity_scale).round()),
            CellValue::Number(purchases.round()),
            CellValue::Number(ticket),
            CellValue::Text(last_purchase.to_string()),
            CellValue::Text(
                match i % 3 {
                    0 => "pt_BR",
                    1 => "es_MX",
                    _ => "en_US",
                }
                .into(),
            ),
        ]);
    }
    table
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let players = parse_arg(&args, "--players", 200usize);
    let days = parse_arg(&args, "--days", 14u32);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let mode = if parse_arg(&args, "--mode", String::new()) == "zscore" {
        NormalizationMode::ZScore
    } else {
        NormalizationMode::LinearFactor
    };

    println!("health-runner");
    println!("  seed:    {seed}");
    println!("  players: {players}");
    println!("  days:    {days}");
    println!("  db:      {db}");
    println!();

    let store = if db == ":memory:" {
        HistoryStore::in_memory()?
    } else {
        HistoryStore::open(db)?
    };
    store.migrate()?;

    let config = ScoringConfig::with_mode(mode);
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let end_date = chrono::Utc::now().date_naive();
    let start_date = end_date - Duration::days(i64::from(days) - 1);

    // Days 4..8 of the run carry a campaign tag, so the impact report has
    // a before/after to chew on.
    let campaign = "retention_push";

    let cache = BatchCache::new();
    for day in 0..days {
        let date = start_date + Duration::days(i64::from(day));
        let table = sample_table(&mut rng, players, date, day);
        let outcome = process_batch(&table, &config, date)?;

        store.save_snapshot(&outcome.summary, &SnapshotFilters::default(), date)?;
        let tag = (4..8).contains(&day).then_some(campaign);
        // The aggregate snapshot stands even if the per-player save fails;
        // the two are separate committed units.
        if let Err(e) = store.save_player_snapshots(&outcome.players, date, tag) {
            log::warn!("player history save failed for {date}: {e}");
        }

        log::info!(
            "day {day} ({date}): mean overall {:.1}",
            outcome.summary.mean_overall
        );
        cache.publish(outcome);
    }

    let Some(outcome) = cache.latest() else {
        println!("no days simulated");
        return Ok(());
    };

    println!("── benchmarks ({})", end_date);
    for metric in Metric::ACTIVITIES {
        let stats = outcome.benchmarks.metric(metric);
        println!(
            "  {:<12} mean {:.1}  per-day {:.2}  factor {:.3}",
            metric.name(),
            stats.mean_positive,
            stats.per_day,
            stats.factor
        );
    }

    println!("── batch summary");
    println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    for region in healthscore_core::region::Region::ALL {
        let members = outcome.players_in_region(region);
        if !members.is_empty() {
            println!("  {} ({}): {} players", region.code(), region.display_name(), members.len());
        }
    }
    for (tier, segment) in &outcome.summary.vip_tiers {
        println!(
            "  tier {tier} ({}): {} players, mean overall {:.1}",
            healthscore_core::summary::BatchSummary::vip_tier_name(*tier),
            outcome.players_at_tier(*tier).len(),
            segment.mean_overall
        );
    }

    let sample_rows: Vec<PlayerRow> = outcome.players.iter().take(5).map(PlayerRow::of).collect();
    println!("── first rows of the full table");
    println!("{}", serde_json::to_string_pretty(&sample_rows)?);

    if let Some(exec) = store.executive_summary(days)? {
        println!("── executive summary");
        println!("{}", serde_json::to_string_pretty(&exec)?);
    }

    let analyzer = EvolutionAnalyzer::as_of(&store, end_date);

    // A churning archetype player, so the evolution shows a decline.
    let evolution = analyzer.player_evolution("P0008", days)?;
    println!("── evolution P0008");
    println!("{}", serde_json::to_string_pretty(&evolution)?);

    let declined =
        analyzer.players_with_transition(None, None, days, TransitionDirection::Declined)?;
    println!("── declined transitions: {}", declined.len());
    for t in declined.iter().take(10) {
        println!(
            "  {}: {} → {} ({:+.1})",
            t.player_id, t.from_category, t.to_category, t.delta_overall
        );
    }

    let impact = analyzer.campaign_impact(campaign)?;
    println!("── campaign impact");
    println!("{}", serde_json::to_string_pretty(&impact)?);

    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
