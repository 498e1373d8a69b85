//! In-game calendar arithmetic.
//!
//! The game runs on a simplified calendar: every year has 12 months of 30
//! days each, and the campaign starts on 2200.01.01. All history is stored
//! as a day count relative to that epoch, so day 0 is 2200.01.01 and day
//! 360 is 2201.01.01. Day counts can be negative (leader birth dates are
//! routinely estimated to fall before the epoch) and [`render_date`] must
//! produce a sensible pre-epoch date for them.

use serde::{Deserialize, Serialize};

/// Days per in-game month.
pub const DAYS_PER_MONTH: i64 = 30;

/// Months per in-game year.
pub const MONTHS_PER_YEAR: i64 = 12;

/// Days per in-game year.
pub const DAYS_PER_YEAR: i64 = DAYS_PER_MONTH * MONTHS_PER_YEAR;

/// The campaign start year; 2200.01.01 is day 0.
pub const EPOCH_YEAR: i64 = 2200;

/// Errors raised when a `YYYY.MM.DD` date string cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum DateError {
    /// The string did not have three dot-separated integer fields.
    #[error("malformed date `{0}`: expected `YYYY.MM.DD`")]
    Malformed(String),
    /// The month or day field was outside the calendar's range.
    #[error("date `{0}` has a month or day out of range")]
    OutOfRange(String),
}

/// Parse a `YYYY.MM.DD` date string into days since 2200.01.01.
///
/// Months must be in `1..=12` and days in `1..=30`. Years before the epoch
/// are accepted and yield negative day counts.
pub fn parse_date(text: &str) -> Result<i64, DateError> {
    let mut fields = text.split('.');
    let mut next_field = || {
        fields
            .next()
            .and_then(|f| f.parse::<i64>().ok())
            .ok_or_else(|| DateError::Malformed(text.to_string()))
    };
    let year = next_field()?;
    let month = next_field()?;
    let day = next_field()?;
    if fields.next().is_some() {
        return Err(DateError::Malformed(text.to_string()));
    }
    if !(1..=MONTHS_PER_YEAR).contains(&month) || !(1..=DAYS_PER_MONTH).contains(&day) {
        return Err(DateError::OutOfRange(text.to_string()));
    }
    Ok((year - EPOCH_YEAR) * DAYS_PER_YEAR + (month - 1) * DAYS_PER_MONTH + (day - 1))
}

/// Render a day count as a `YYYY.MM.DD` date string.
///
/// Exact inverse of [`parse_date`] for every day count, including negative
/// ones: day -1 renders as `2199.12.30`.
pub fn render_date(days: i64) -> String {
    let year = EPOCH_YEAR + days.div_euclid(DAYS_PER_YEAR);
    let remaining = days.rem_euclid(DAYS_PER_YEAR);
    let month = remaining / DAYS_PER_MONTH + 1;
    let day = remaining % DAYS_PER_MONTH + 1;
    format!("{year}.{month:02}.{day:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn epoch_is_day_zero() {
        assert_eq!(parse_date("2200.01.01").unwrap(), 0);
        assert_eq!(render_date(0), "2200.01.01");
    }

    #[test]
    fn days_accumulate_across_months_and_years() {
        assert_eq!(parse_date("2200.01.02").unwrap(), 1);
        assert_eq!(parse_date("2200.02.01").unwrap(), 30);
        assert_eq!(parse_date("2201.01.01").unwrap(), 360);
        assert_eq!(parse_date("2250.06.15").unwrap(), 50 * 360 + 5 * 30 + 14);
    }

    #[test]
    fn far_future_sentinel_parses() {
        // Missing leader hire dates default to this sentinel upstream.
        assert_eq!(parse_date("10000.01.01").unwrap(), 7800 * 360);
    }

    #[test]
    fn pre_epoch_days_render_backwards() {
        assert_eq!(render_date(-1), "2199.12.30");
        assert_eq!(render_date(-360), "2199.01.01");
        assert_eq!(render_date(-725), "2197.12.26");
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for text in ["", "2200", "2200.01", "2200.01.01.05", "x.01.01", "2200.01.yes"] {
            match parse_date(text) {
                Err(DateError::Malformed(m)) => assert_eq!(m, text),
                other => panic!("expected malformed error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        for text in ["2200.00.01", "2200.13.01", "2200.01.00", "2200.01.31"] {
            match parse_date(text) {
                Err(DateError::OutOfRange(m)) => assert_eq!(m, text),
                other => panic!("expected out-of-range error for {text:?}, got {other:?}"),
            }
        }
    }

    proptest! {
        #[test]
        fn render_parse_round_trip(days in -100 * DAYS_PER_YEAR..=100 * DAYS_PER_YEAR) {
            let rendered = render_date(days);
            prop_assert_eq!(parse_date(&rendered).unwrap(), days);
        }

        #[test]
        fn parse_render_round_trip(
            year in EPOCH_YEAR..EPOCH_YEAR + 100,
            month in 1..=MONTHS_PER_YEAR,
            day in 1..=DAYS_PER_MONTH,
        ) {
            let text = format!("{year}.{month:02}.{day:02}");
            let days = parse_date(&text).unwrap();
            prop_assert_eq!(render_date(days), text);
        }
    }
}
