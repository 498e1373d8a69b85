//! Diplomatic standing: the per-snapshot flags a country holds towards
//! the player, and the bilateral events behind them.

use annals_core::country::{Country, CountryId, PlayerRelations};
use annals_core::event::{EventType, HistoricalEvent};
use annals_core::leader::LeaderId;
use annals_core::{GameHistory, StoreError};
use annals_save::Value;

use crate::leaders::current_ruler;
use crate::session::{PassContext, table_entry};

/// Relation keys paired with the event seen from each side. Symmetric
/// arrangements use the same type in both directions.
const RELATION_EVENTS: [(&str, EventType, EventType); 7] = [
    ("is_rival", EventType::SentRivalry, EventType::ReceivedRivalry),
    (
        "closed_borders",
        EventType::ClosedBorders,
        EventType::ReceivedClosedBorders,
    ),
    (
        "defensive_pact",
        EventType::DefensivePact,
        EventType::DefensivePact,
    ),
    (
        "alliance",
        EventType::FormedFederation,
        EventType::FormedFederation,
    ),
    (
        "non_aggression_pledge",
        EventType::NonAggressionPact,
        EventType::NonAggressionPact,
    ),
    (
        "communications",
        EventType::FirstContact,
        EventType::FirstContact,
    ),
    (
        "commercial_pact",
        EventType::CommercialPact,
        EventType::CommercialPact,
    ),
];

/// Walk a country's relation entries, returning the flags it holds
/// towards the player and recording bilateral events for every active
/// arrangement.
///
/// Flags are read from the single relation targeting the player. If they
/// include communications, the country's first contact is recorded here,
/// so the contact day already counts as met for the events recorded
/// below. Events cover all relation targets already on record, one per
/// direction, extended while re-observed within the staleness window.
pub(crate) fn extract_diplomacy(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    country_dict: &Value,
    gamestate: &Value,
) -> Result<PlayerRelations, StoreError> {
    let mut towards_player = PlayerRelations::default();
    let Some(rows) = country_dict.get_path(&["relations_manager", "relation"]) else {
        return Ok(towards_player);
    };
    for relation in rows.iter_coerced() {
        if relation.get("country").and_then(Value::as_int) == Some(ctx.player.0) {
            towards_player = relation_flags(relation);
        }
    }
    if towards_player.communications
        && let Some(country) = history.country_mut(id)
    {
        country.record_first_contact(ctx.now);
    }
    if !ctx.tracks_history_of(id) {
        return Ok(towards_player);
    }
    let ruler = current_ruler(history, country_dict);
    for relation in rows.iter_coerced() {
        if !relation.is_map() {
            continue;
        }
        let Some(target) = relation.get("country").and_then(Value::as_int).map(CountryId)
        else {
            continue;
        };
        record_relation_events(history, ctx, id, target, ruler, relation, gamestate)?;
    }
    Ok(towards_player)
}

fn relation_flags(relation: &Value) -> PlayerRelations {
    let flag = |key: &str| {
        relation
            .get(key)
            .and_then(Value::as_yes_no)
            .unwrap_or(false)
    };
    PlayerRelations {
        rivalry: flag("is_rival"),
        defensive_pact: flag("defensive_pact"),
        federation: flag("alliance"),
        non_aggression_pact: flag("non_aggression_pledge"),
        closed_borders: flag("closed_borders"),
        communications: flag("communications"),
        migration_treaty: flag("migration_access"),
        commercial_pact: flag("commercial_pact"),
        research_agreement: false,
        sensor_link: false,
        neighbor: flag("borders"),
    }
}

fn record_relation_events(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    target: CountryId,
    ruler: Option<LeaderId>,
    relation: &Value,
    gamestate: &Value,
) -> Result<(), StoreError> {
    let Some(target_dict) =
        table_entry(gamestate.get("country"), target.0).filter(|entry| entry.is_map())
    else {
        return Ok(());
    };
    if history.country(target).is_none() {
        tracing::debug!(
            country = id.0,
            target = target.0,
            "relation target not on record yet"
        );
        return Ok(());
    }
    let target_type = target_dict.get("type").and_then(Value::as_str).unwrap_or("");
    let target_ruler = if matches!(
        target_type,
        "default" | "fallen_empire" | "awakened_fallen_empire"
    ) {
        current_ruler(history, target_dict)
    } else {
        None
    };
    let known = history.country(id).is_some_and(Country::has_met_player)
        && history.country(target).is_some_and(Country::has_met_player);

    for (key, outgoing, incoming) in RELATION_EVENTS {
        let active = relation.get(key).and_then(Value::as_yes_no).unwrap_or(false);
        if !active {
            continue;
        }
        upsert_relation_event(history, ctx, outgoing, id, target, ruler, known)?;
        upsert_relation_event(history, ctx, incoming, target, id, target_ruler, known)?;
    }
    Ok(())
}

fn upsert_relation_event(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    event_type: EventType,
    from: CountryId,
    to: CountryId,
    leader: Option<LeaderId>,
    known: bool,
) -> Result<(), StoreError> {
    let window = ctx.config.staleness_window_days;
    let matched = history.latest_event_mut(|event| {
        event.event_type == event_type
            && event.country == Some(from)
            && event.target_country == Some(to)
    });
    match matched {
        Some(event) if event.observed_within(ctx.now, window) => {
            event.extend_to(ctx.now);
            if known {
                event.mark_known();
            }
            Ok(())
        }
        _ => history.record_event(
            HistoricalEvent::new(event_type, from, ctx.now, known)
                .with_target(to)
                .with_leader(leader)
                .with_end_day(ctx.now),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use annals_core::GameMeta;

    fn two_countries() -> GameHistory {
        let mut history = GameHistory::new(GameMeta::new("game", "UNE"));
        history.add_country(Country::new(CountryId(0), "UNE", "default").as_player());
        let mut other = Country::new(CountryId(1), "Blorg", "default");
        other.record_first_contact(10);
        history.add_country(other);
        history
    }

    fn gamestate_with_relation(flags: &[(&str, &str)]) -> Value {
        let mut relation = vec![("country", Value::from(0))];
        for &(key, value) in flags {
            relation.push((key, Value::from(value)));
        }
        Value::map([(
            "country",
            Value::map([
                ("0", Value::map([("name", Value::from("UNE"))])),
                (
                    "1",
                    Value::map([
                        ("name", Value::from("Blorg")),
                        ("type", Value::from("default")),
                        (
                            "relations_manager",
                            Value::map([("relation", Value::map(relation))]),
                        ),
                    ]),
                ),
            ]),
        )])
    }

    #[test]
    fn flags_towards_the_player_are_read_from_the_relation() {
        let mut history = two_countries();
        history.begin_snapshot(100).unwrap();
        let config = ExtractorConfig::default();
        let ctx = PassContext::new(&config, "game", 100, CountryId(0));
        let gamestate = gamestate_with_relation(&[
            ("communications", "yes"),
            ("is_rival", "yes"),
            ("borders", "yes"),
            ("closed_borders", "no"),
        ]);
        let country_dict = table_entry(gamestate.get("country"), 1).unwrap();

        let relations =
            extract_diplomacy(&mut history, &ctx, CountryId(1), country_dict, &gamestate)
                .unwrap();

        assert!(relations.communications);
        assert!(relations.rivalry);
        assert!(relations.neighbor);
        assert!(!relations.closed_borders);
        assert!(!relations.federation);
    }

    #[test]
    fn an_active_rivalry_is_recorded_from_both_sides() {
        let mut history = two_countries();
        history.begin_snapshot(100).unwrap();
        let config = ExtractorConfig::default();
        let ctx = PassContext::new(&config, "game", 100, CountryId(0));
        let gamestate = gamestate_with_relation(&[("is_rival", "yes")]);
        let country_dict = table_entry(gamestate.get("country"), 1).unwrap();

        extract_diplomacy(&mut history, &ctx, CountryId(1), country_dict, &gamestate)
            .unwrap();

        let sent: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::SentRivalry)
            .collect();
        let received: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::ReceivedRivalry)
            .collect();
        assert_eq!(sent.len(), 1);
        assert_eq!(received.len(), 1);
        assert_eq!(sent[0].country, Some(CountryId(1)));
        assert_eq!(sent[0].target_country, Some(CountryId(0)));
        assert_eq!(received[0].country, Some(CountryId(0)));
        assert_eq!(received[0].target_country, Some(CountryId(1)));
        assert!(sent[0].known_to_player);
    }

    #[test]
    fn a_fresh_observation_extends_the_existing_arrangement() {
        let mut history = two_countries();
        history.begin_snapshot(100).unwrap();
        let config = ExtractorConfig::default();
        let gamestate = gamestate_with_relation(&[("defensive_pact", "yes")]);
        let country_dict = table_entry(gamestate.get("country"), 1).unwrap();

        let ctx = PassContext::new(&config, "game", 100, CountryId(0));
        extract_diplomacy(&mut history, &ctx, CountryId(1), country_dict, &gamestate)
            .unwrap();
        history.begin_snapshot(400).unwrap();
        let later = PassContext::new(&config, "game", 400, CountryId(0));
        extract_diplomacy(&mut history, &later, CountryId(1), country_dict, &gamestate)
            .unwrap();

        let pacts: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::DefensivePact)
            .collect();
        assert_eq!(pacts.len(), 2);
        assert_eq!(pacts[0].start_day, 100);
        assert_eq!(pacts[0].end_day, Some(400));
    }

    #[test]
    fn a_stale_arrangement_starts_a_new_interval() {
        let mut history = two_countries();
        history.begin_snapshot(100).unwrap();
        let config = ExtractorConfig::default();
        let gamestate = gamestate_with_relation(&[("non_aggression_pledge", "yes")]);
        let country_dict = table_entry(gamestate.get("country"), 1).unwrap();

        let ctx = PassContext::new(&config, "game", 100, CountryId(0));
        extract_diplomacy(&mut history, &ctx, CountryId(1), country_dict, &gamestate)
            .unwrap();
        history.begin_snapshot(2200).unwrap();
        let later = PassContext::new(&config, "game", 2200, CountryId(0));
        extract_diplomacy(&mut history, &later, CountryId(1), country_dict, &gamestate)
            .unwrap();

        let pacts: Vec<_> = history
            .events()
            .iter()
            .filter(|e| {
                e.event_type == EventType::NonAggressionPact && e.country == Some(CountryId(1))
            })
            .collect();
        assert_eq!(pacts.len(), 2);
        assert_eq!(pacts[0].end_day, Some(100));
        assert_eq!(pacts[1].start_day, 2200);
    }
}
