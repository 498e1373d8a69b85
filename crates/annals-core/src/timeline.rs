//! Chronological queries over a game's recorded events.

use crate::country::CountryId;
use crate::event::{EventType, HistoricalEvent};
use crate::store::GameHistory;

/// A filtered, chronologically sorted view over a history's events.
///
/// Filters consume and return the view, so queries chain:
///
/// ```
/// # use annals_core::store::{GameHistory, GameMeta};
/// # use annals_core::timeline::Timeline;
/// # use annals_core::event::EventType;
/// # let history = GameHistory::new(GameMeta::new("uni_1", "United Nations of Earth"));
/// let wars = Timeline::from_history(&history)
///     .of_type(EventType::War)
///     .known_only();
/// assert!(wars.is_empty());
/// ```
pub struct Timeline<'h> {
    events: Vec<&'h HistoricalEvent>,
}

impl<'h> Timeline<'h> {
    /// Build a view over every event of a history, sorted by start day.
    pub fn from_history(history: &'h GameHistory) -> Self {
        let mut events: Vec<&HistoricalEvent> = history.events().iter().collect();
        events.sort_by_key(|event| event.start_day);
        Self { events }
    }

    /// Keep events whose interval intersects `[from, to]`.
    ///
    /// Point events count as one-day intervals.
    pub fn range(mut self, from: i64, to: i64) -> Self {
        self.events
            .retain(|event| event.effective_end() >= from && event.start_day <= to);
        self
    }

    /// Keep events of one type.
    pub fn of_type(mut self, event_type: EventType) -> Self {
        self.events.retain(|event| event.event_type == event_type);
        self
    }

    /// Keep events a country is involved in, as actor or as target.
    pub fn involving(mut self, country: CountryId) -> Self {
        self.events.retain(|event| {
            event.country == Some(country) || event.target_country == Some(country)
        });
        self
    }

    /// Keep events the player has observed.
    pub fn known_only(mut self) -> Self {
        self.events.retain(|event| event.known_to_player);
        self
    }

    /// The events remaining in the view, ordered by start day.
    pub fn entries(&self) -> &[&'h HistoricalEvent] {
        &self.events
    }

    /// Number of events remaining in the view.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if no events remain.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
