//! Historical data model for ingested strategy-game saves.
//!
//! This crate defines the normalized per-game history that the extractor
//! fills from save snapshots: countries and their metrics, leaders, wars,
//! the galaxy map, interval facts and the historical event record. It is
//! independent of the save format — you can construct a [`GameHistory`]
//! programmatically or deserialize one from JSON.

/// Country records, governments, diplomacy flags and per-day metrics.
pub mod country;
/// The in-game calendar: day counts and `YYYY.MM.DD` date strings.
pub mod date;
/// Error types used throughout the crate.
pub mod error;
/// The historical event catalog.
pub mod event;
/// Political factions, including the synthetic "no faction" buckets.
pub mod faction;
/// Systems, planets, hyperlanes and system ownership intervals.
pub mod galaxy;
/// Leaders and species.
pub mod leader;
/// Aggregated demographics.
pub mod pops;
/// Per-game history tables and the thread-safe game registry.
pub mod store;
/// Chronological queries over recorded events.
pub mod timeline;
/// Wars, participants and battles.
pub mod war;

/// Re-export country types.
pub use country::{Attitude, Country, CountryData, CountryId};
/// Re-export calendar functions.
pub use date::{parse_date, render_date};
/// Re-export error types.
pub use error::{StoreError, StoreResult};
/// Re-export event types.
pub use event::{EventType, HistoricalEvent};
/// Re-export store types.
pub use store::{GameHistory, GameMeta, HistoryStore};
/// Re-export the timeline view.
pub use timeline::Timeline;
