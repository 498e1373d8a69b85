//! System ownership, read from the starbase table.
//!
//! Every starbase pins its system to an owner; intervals extend while
//! the owner holds the system and close when it changes hands.

use annals_core::country::{Country, CountryId};
use annals_core::event::{EventType, HistoricalEvent};
use annals_core::galaxy::{SystemId, SystemOwnership};
use annals_core::{GameHistory, StoreError};
use annals_save::Value;

use crate::galaxy::add_missing_system;
use crate::session::PassContext;

/// Record who holds each system this snapshot.
///
/// First possession of a system is an expansion; a change of hands
/// records a loss for the old owner and a gain for the new one, visible
/// to the player if either side has been met.
pub(crate) fn extract_system_ownership(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    gamestate: &Value,
) -> Result<(), StoreError> {
    let Some(starbases) = gamestate.get("starbases") else {
        return Ok(());
    };
    if !starbases.is_map() {
        return Ok(());
    }
    for (_, starbase) in starbases.entries_by_id() {
        if !starbase.is_map() {
            continue;
        }
        let (Some(owner), Some(system_raw)) = (
            starbase.get("owner").and_then(Value::as_int),
            starbase.get("system").and_then(Value::as_int),
        ) else {
            continue;
        };
        let owner = CountryId(owner);
        let system = SystemId(system_raw);
        let discoverer = history.country(owner).is_some().then_some(owner);
        if history.system(system).is_none()
            && !add_missing_system(history, gamestate, system, discoverer, ctx.now)?
        {
            continue;
        }
        if history.country(owner).is_none() {
            tracing::warn!(
                system = system_raw,
                country = owner.0,
                "cannot establish ownership for unrecorded country"
            );
            ctx.warnings += 1;
            continue;
        }

        let previous = match history.latest_ownership_mut(system) {
            Some(ownership) => {
                ownership.extend_to(ctx.now);
                Some(ownership.owner)
            }
            None => None,
        };
        if previous == Some(owner) {
            continue;
        }
        let new_met = history.country(owner).is_some_and(Country::has_met_player);
        match previous {
            None => {
                history.record_event(
                    HistoricalEvent::new(EventType::ExpandedToSystem, owner, ctx.now, new_met)
                        .with_system(system),
                )?;
            }
            Some(old) => {
                let known =
                    new_met || history.country(old).is_some_and(Country::has_met_player);
                history.record_event(
                    HistoricalEvent::new(EventType::LostSystem, old, ctx.now, known)
                        .with_target(owner)
                        .with_system(system),
                )?;
                history.record_event(
                    HistoricalEvent::new(EventType::GainedSystem, owner, ctx.now, known)
                        .with_target(old)
                        .with_system(system),
                )?;
            }
        }
        history.add_ownership(SystemOwnership {
            system,
            owner,
            start_day: ctx.now,
            end_day: ctx.now + 1,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use annals_core::GameMeta;
    use annals_core::galaxy::System;

    fn prepared() -> GameHistory {
        let mut history = GameHistory::new(GameMeta::new("game", "UNE"));
        history.add_country(Country::new(CountryId(0), "UNE", "default").as_player());
        let mut other = Country::new(CountryId(1), "Blorg", "default");
        other.record_first_contact(10);
        history.add_country(other);
        history.add_system(System {
            id: SystemId(3),
            name: "Border Reach".to_string(),
            star_class: "sc_m".to_string(),
            coordinate_x: 4.0,
            coordinate_y: 4.0,
        });
        history
    }

    fn starbases(owner: i64) -> Value {
        Value::map([(
            "starbases",
            Value::map([(
                "20",
                Value::map([("owner", Value::from(owner)), ("system", Value::from(3))]),
            )]),
        )])
    }

    #[test]
    fn first_possession_opens_an_interval_and_an_expansion_event() {
        let mut history = prepared();
        history.begin_snapshot(100).unwrap();
        let config = ExtractorConfig::default();
        let mut ctx = PassContext::new(&config, "game", 100, CountryId(0));

        extract_system_ownership(&mut history, &mut ctx, &starbases(0)).unwrap();

        let ownerships = history.ownerships();
        assert_eq!(ownerships.len(), 1);
        assert_eq!(ownerships[0].owner, CountryId(0));
        assert_eq!(ownerships[0].start_day, 100);
        assert_eq!(ownerships[0].end_day, 101);
        let expansion = history
            .events()
            .iter()
            .find(|e| e.event_type == EventType::ExpandedToSystem)
            .unwrap();
        assert_eq!(expansion.country, Some(CountryId(0)));
        assert_eq!(expansion.target_country, None);
        assert_eq!(expansion.system, Some(SystemId(3)));
    }

    #[test]
    fn a_steady_owner_just_extends_the_interval() {
        let mut history = prepared();
        let config = ExtractorConfig::default();
        history.begin_snapshot(100).unwrap();
        let mut ctx = PassContext::new(&config, "game", 100, CountryId(0));
        extract_system_ownership(&mut history, &mut ctx, &starbases(0)).unwrap();

        history.begin_snapshot(400).unwrap();
        let mut later = PassContext::new(&config, "game", 400, CountryId(0));
        extract_system_ownership(&mut history, &mut later, &starbases(0)).unwrap();

        let ownerships = history.ownerships();
        assert_eq!(ownerships.len(), 1);
        assert_eq!(ownerships[0].end_day, 400);
    }

    #[test]
    fn a_change_of_hands_records_loss_and_gain() {
        let mut history = prepared();
        let config = ExtractorConfig::default();
        history.begin_snapshot(100).unwrap();
        let mut ctx = PassContext::new(&config, "game", 100, CountryId(0));
        extract_system_ownership(&mut history, &mut ctx, &starbases(0)).unwrap();

        history.begin_snapshot(400).unwrap();
        let mut later = PassContext::new(&config, "game", 400, CountryId(0));
        extract_system_ownership(&mut history, &mut later, &starbases(1)).unwrap();

        let ownerships = history.ownerships();
        assert_eq!(ownerships.len(), 2);
        assert_eq!(ownerships[0].end_day, 400);
        assert_eq!(ownerships[1].owner, CountryId(1));
        assert_eq!(ownerships[1].start_day, 400);

        let lost = history
            .events()
            .iter()
            .find(|e| e.event_type == EventType::LostSystem)
            .unwrap();
        assert_eq!(lost.country, Some(CountryId(0)));
        assert_eq!(lost.target_country, Some(CountryId(1)));
        assert!(lost.known_to_player);
        let gained = history
            .events()
            .iter()
            .find(|e| e.event_type == EventType::GainedSystem)
            .unwrap();
        assert_eq!(gained.country, Some(CountryId(1)));
        assert_eq!(gained.target_country, Some(CountryId(0)));
    }

    #[test]
    fn an_unrecorded_owner_is_skipped_with_a_warning() {
        let mut history = prepared();
        history.begin_snapshot(100).unwrap();
        let config = ExtractorConfig::default();
        let mut ctx = PassContext::new(&config, "game", 100, CountryId(0));

        extract_system_ownership(&mut history, &mut ctx, &starbases(9)).unwrap();

        assert!(history.ownerships().is_empty());
        assert_eq!(ctx.warnings, 1);
    }
}
