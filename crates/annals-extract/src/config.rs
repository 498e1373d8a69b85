//! Knobs for the extraction passes.

/// Days of silence before an interval fact is considered abandoned.
///
/// Wars vanish from saves once settled, pacts lapse without a trace, and
/// governors shuffle between sectors. When a fact has not been seen for
/// this long, the next sighting starts a fresh interval instead of
/// stretching the old one across the gap. Five in-game years.
pub const DEFAULT_STALENESS_WINDOW_DAYS: i64 = 5 * 360;

/// Configuration for snapshot extraction.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// How long an unobserved interval fact stays extendable, in days.
    pub staleness_window_days: i64,
    /// Record historical events and deep per-country detail (sectors,
    /// factions, rulers, research) only for the player. Identity and
    /// metric rows are still kept for everyone so references resolve.
    pub only_read_player_history: bool,
    /// Walk starbases to attribute system ownership.
    pub extract_system_ownership: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            staleness_window_days: DEFAULT_STALENESS_WINDOW_DAYS,
            only_read_player_history: false,
            extract_system_ownership: true,
        }
    }
}

impl ExtractorConfig {
    /// Set how long an unobserved interval fact stays extendable.
    pub fn with_staleness_window_days(mut self, days: i64) -> Self {
        self.staleness_window_days = days;
        self
    }

    /// Restrict per-day detail and events to the player country.
    pub fn with_only_read_player_history(mut self, only_player: bool) -> Self {
        self.only_read_player_history = only_player;
        self
    }

    /// Enable or disable the starbase ownership pass.
    pub fn with_extract_system_ownership(mut self, extract: bool) -> Self {
        self.extract_system_ownership = extract;
        self
    }
}
