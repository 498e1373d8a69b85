//! Gamestate traversal that turns parsed save snapshots into history.
//!
//! The entry point is [`extractor::Extractor::process_snapshot`]: it
//! validates a parsed gamestate, opens the game in an
//! [`annals_core::HistoryStore`] and runs one pass per concern over the
//! snapshot, all inside a single transaction. Passes reconcile what the
//! save shows against what is already recorded: interval facts that
//! persist are extended, facts that changed are closed and reopened, and
//! anything last seen too long ago starts over instead of stretching
//! across the gap.
//!
//! Individually broken rows never abort a snapshot. They are logged,
//! counted in [`extractor::SnapshotOutcome::warnings`] and dropped.

/// Knobs for the extraction passes.
pub mod config;
/// Extraction failure modes.
pub mod error;
/// The snapshot ingestion pipeline.
pub mod extractor;
/// Display-name rendering.
pub mod names;

mod countries;
mod diplomacy;
mod economy;
mod factions;
mod galaxy;
mod government;
mod leaders;
mod pops;
mod research;
mod rulers;
mod sectors;
mod session;
mod starbases;
mod wars;

/// Re-export the configuration type and its default window.
pub use config::{DEFAULT_STALENESS_WINDOW_DAYS, ExtractorConfig};
/// Re-export error types.
pub use error::{ExtractError, ExtractResult, ValidationError};
/// Re-export the extractor and its per-snapshot report.
pub use extractor::{Extractor, SnapshotOutcome};
