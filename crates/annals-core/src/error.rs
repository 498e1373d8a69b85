use crate::country::CountryId;
use crate::war::WarId;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur when manipulating a game's history.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No history has been recorded under the given game identity.
    #[error("unknown game `{0}`")]
    UnknownGame(String),

    /// A row referenced a country id that has never been recorded.
    #[error("unknown country {0}")]
    UnknownCountry(CountryId),

    /// A row referenced a war id that has never been recorded.
    #[error("unknown war {0}")]
    UnknownWar(WarId),

    /// A new snapshot pre-dates a day that is already recorded.
    ///
    /// Re-processing a day that exists is allowed (the old snapshot is
    /// replaced); inserting a brand-new day before the latest one is not.
    #[error("snapshot day {day} precedes already-recorded day {latest}")]
    DayRegression {
        /// The rejected snapshot day.
        day: i64,
        /// The latest day already in the history.
        latest: i64,
    },

    /// An interval fact would end before it starts.
    #[error("interval ends on day {end_day}, before its start on day {start_day}")]
    InvalidInterval {
        /// First day of the interval.
        start_day: i64,
        /// Proposed final day of the interval.
        end_day: i64,
    },

    /// A country already has a metrics row for the given snapshot day.
    #[error("country {country} already has data for day {day}")]
    DuplicateCountryData {
        /// The country with the conflicting row.
        country: CountryId,
        /// The snapshot day recorded twice.
        day: i64,
    },
}
