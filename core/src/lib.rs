//! Player health scoring engine.
//!
//! Pipeline: a raw activity table ([`table::DataTable`]) is parsed into
//! [`record::PlayerRecord`]s, batch benchmarks are estimated
//! ([`benchmark::BenchmarkSet`]), each player is scored
//! ([`scoring::ScoreCalculator`]) and categorized
//! ([`category::Category`]), and the resulting batch
//! ([`batch::BatchOutcome`]) can be persisted to the SQLite history
//! ([`store::HistoryStore`]) for evolution, transition and campaign
//! analysis ([`evolution::EvolutionAnalyzer`]).

pub mod batch;
pub mod benchmark;
pub mod category;
pub mod config;
pub mod error;
pub mod evolution;
pub mod record;
pub mod region;
pub mod scoring;
pub mod session;
pub mod store;
pub mod summary;
pub mod table;
pub mod types;
pub mod vip;

pub use batch::{process_batch, BatchOutcome, PlayerRow, ScoredPlayer};
pub use category::Category;
pub use config::{NormalizationMode, ScoringConfig};
pub use error::{HealthError, HealthResult};
pub use store::HistoryStore;
