//! Extraction failure modes.
//!
//! Anything that stops a whole snapshot from being ingested surfaces here.
//! Individually broken rows inside an otherwise usable gamestate never do;
//! those are logged, counted, and dropped so the rest of the snapshot still
//! lands.

use annals_core::StoreError;
use annals_core::date::DateError;

/// Alias for `Result<T, ExtractError>`.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// A gamestate that cannot be ingested at all.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The gamestate lacks a field without which nothing can be recorded.
    #[error("gamestate is missing `{0}`")]
    MissingField(&'static str),

    /// The snapshot date could not be interpreted.
    #[error(transparent)]
    Date(#[from] DateError),

    /// The gamestate does not identify exactly one player country.
    #[error("expected exactly one player country, found {candidates}")]
    AmbiguousPlayer {
        /// How many distinct player countries the gamestate listed.
        candidates: usize,
    },
}

/// Top-level failure of a snapshot ingestion.
///
/// When this is returned, the game's history is untouched: validation
/// errors are raised before the store is opened, and store errors abort
/// the transaction that would have committed the snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The snapshot was rejected before any history was touched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The history store refused an update.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_errors_convert_to_validation_errors() {
        let err = annals_core::parse_date("not a date");
        let validation: ValidationError = match err {
            Err(date_err) => date_err.into(),
            Ok(day) => panic!("expected a parse failure, got day {day}"),
        };
        match validation {
            ValidationError::Date(_) => {}
            other => panic!("expected a date error, got {other:?}"),
        }
    }

    #[test]
    fn store_errors_convert_to_extract_errors() {
        let err: ExtractError = StoreError::UnknownGame("nope".to_string()).into();
        assert!(err.to_string().contains("nope"));
    }
}
