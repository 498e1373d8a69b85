//! Species rosters and leader lifecycles.

use std::collections::BTreeSet;

use annals_core::country::CountryId;
use annals_core::event::{EventType, HistoricalEvent};
use annals_core::leader::{Leader, LeaderId, Species, SpeciesId};
use annals_core::{GameHistory, StoreError};
use annals_save::Value;
use rand::Rng;

use crate::names::render_name;
use crate::session::{PassContext, table_entry};

/// Day count of 10000.01.01, the save's sentinel for dates that never
/// happened. A missing recruitment date must not win the minimum against
/// the real ones.
const NEVER_DAY: i64 = (10000 - 2200) * 360;

/// Record every species in the gamestate's roster.
///
/// Species are identified by their position in the save's list. Names,
/// classes, and traits are captured the first time a species is seen and
/// kept as recorded afterwards.
pub(crate) fn extract_species(history: &mut GameHistory, gamestate: &Value) {
    let Some(list) = gamestate.get("species").and_then(Value::as_list) else {
        return;
    };
    for (index, species_dict) in list.iter().enumerate() {
        let id = SpeciesId(index as i64);
        if history.species(id).is_some() {
            continue;
        }
        let mut traits = Vec::new();
        if let Some(trait_list) = species_dict.get_path(&["traits", "trait"]) {
            for trait_name in trait_list.iter_coerced() {
                if let Some(name) = trait_name.as_str() {
                    traits.push(history.intern(name));
                }
            }
        }
        history.add_species(Species {
            id,
            name: render_name(species_dict.get("name"), "Unnamed Species"),
            species_class: species_dict
                .get("class")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Class")
                .to_string(),
            parent: species_dict.get("base").and_then(Value::as_int).map(SpeciesId),
            traits,
        });
    }
}

/// The country's current ruler, when the save names one that is recorded
/// and active.
pub(crate) fn current_ruler(history: &GameHistory, country_dict: &Value) -> Option<LeaderId> {
    let ruler_id = country_dict
        .get("ruler")
        .and_then(Value::as_int)
        .unwrap_or(-1);
    if ruler_id < 0 {
        tracing::debug!("country names no ruler");
        return None;
    }
    let id = LeaderId(ruler_id);
    match history.leader(id) {
        Some(leader) if leader.is_active => Some(id),
        _ => {
            tracing::warn!(leader = ruler_id, "ruler is not an active recorded leader");
            None
        }
    }
}

/// Reconcile the country's leader roster with the save.
///
/// Recorded leaders no longer in the roster are retired with a death
/// event dated to their last sighting. A roster id that resurfaces under
/// a different name after a long silence has been recycled, so its old
/// holder is retired the same way. Everyone in the roster is then
/// upserted, with a level-up event when a leader has grown since last
/// seen.
pub(crate) fn extract_country_leaders(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    id: CountryId,
    country_dict: &Value,
    gamestate: &Value,
) -> Result<(), StoreError> {
    let leaders_table = gamestate.get("leaders");

    let mut owned = Vec::new();
    let mut owned_set = BTreeSet::new();
    if let Some(list) = country_dict.get("owned_leaders") {
        for leader in list.iter_coerced() {
            if let Some(leader_id) = leader.as_int()
                && owned_set.insert(leader_id)
            {
                owned.push(LeaderId(leader_id));
            }
        }
    }

    let stale_cutoff = ctx.stale_before();
    for leader_id in history.active_leaders_of(id) {
        let Some(leader) = history.leader(leader_id) else {
            continue;
        };
        let still_active = owned_set.contains(&leader_id.0) && {
            let current_name = table_entry(leaders_table, leader_id.0).map(leader_display_name);
            current_name.as_deref() == Some(leader.name.as_str())
                || leader.last_seen_day >= stale_cutoff
        };
        if still_active {
            continue;
        }
        let last_seen = leader.last_seen_day;
        let known = history
            .latest_country_data(id)
            .is_some_and(|data| data.attitude.reveals_economy_info());
        if let Some(leader) = history.leader_mut(leader_id) {
            leader.is_active = false;
        }
        history.record_event(
            HistoricalEvent::new(EventType::LeaderDied, id, last_seen, known)
                .with_leader(Some(leader_id))
                .with_end_day(last_seen),
        )?;
    }

    for leader_id in owned {
        let Some(leader_dict) = table_entry(leaders_table, leader_id.0) else {
            continue;
        };
        if !leader_dict.is_map() {
            continue;
        }
        if history.leader(leader_id).is_none() {
            add_new_leader(history, ctx, id, leader_id, leader_dict)?;
        }
        let level = leader_dict
            .get("level")
            .and_then(Value::as_int)
            .unwrap_or(-1);
        let mut leveled_up = false;
        if let Some(leader) = history.leader_mut(leader_id) {
            leader.is_active = true;
            leader.last_seen_day = ctx.now;
            if leader.last_level < level {
                leader.last_level = level;
                leveled_up = true;
            }
        }
        if leveled_up {
            let known = id == ctx.player;
            let description = history.intern(&level.to_string());
            history.record_event(
                HistoricalEvent::new(EventType::LevelUp, id, ctx.now, known)
                    .with_leader(Some(leader_id))
                    .with_description(description),
            )?;
        }
    }
    Ok(())
}

fn add_new_leader(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    country: CountryId,
    id: LeaderId,
    leader_dict: &Value,
) -> Result<(), StoreError> {
    // Rulers keep their original calling in `pre_ruler_class`.
    let leader_class = if let Some(pre_ruler) = leader_dict.get("pre_ruler_class") {
        pre_ruler.as_str().unwrap_or("Unknown class").to_string()
    } else {
        leader_dict
            .get("class")
            .and_then(Value::as_str)
            .unwrap_or("Unknown class")
            .to_string()
    };

    let recruited_day = [
        date_or_never(leader_dict.get("date")),
        date_or_never(leader_dict.get("start")),
        date_or_never(leader_dict.get("date_added")),
    ]
    .into_iter()
    .fold(ctx.now, i64::min);

    // Saves only give an age; scatter birthdays a little so an entire
    // cohort hired the same day is not born the same day.
    let age = leader_dict.get("age").and_then(Value::as_f64).unwrap_or(0.0);
    let jitter: i64 = ctx.rng.random_range(-15..=15);
    let birth_day = recruited_day - (360.0 * age) as i64 + jitter;

    let species = leader_dict
        .get("species_index")
        .and_then(Value::as_int)
        .map(SpeciesId)
        .filter(|sid| history.species(*sid).is_some());

    history.add_leader(Leader {
        id,
        country,
        name: leader_display_name(leader_dict),
        leader_class,
        gender: leader_dict
            .get("gender")
            .and_then(Value::as_str)
            .unwrap_or("Other")
            .to_string(),
        agenda: leader_dict
            .get("agenda")
            .and_then(Value::as_str)
            .map(str::to_string),
        species,
        recruited_day,
        birth_day,
        last_seen_day: ctx.now,
        last_level: leader_dict.get("level").and_then(Value::as_int).unwrap_or(0),
        is_active: true,
    });

    let known = history
        .latest_country_data(country)
        .is_some_and(|data| data.attitude.reveals_economy_info());
    history.record_event(
        HistoricalEvent::new(EventType::LeaderRecruited, country, recruited_day, known)
            .with_leader(Some(id))
            .with_end_day(ctx.now),
    )
}

/// A leader's display name: first name plus an optional second name.
fn leader_display_name(leader_dict: &Value) -> String {
    let first = render_name(leader_dict.get_path(&["name", "first_name"]), "");
    let second = render_name(leader_dict.get_path(&["name", "second_name"]), "");
    let full = format!("{first} {second}");
    let trimmed = full.trim();
    if trimmed.is_empty() {
        "Unknown Leader".to_string()
    } else {
        trimmed.to_string()
    }
}

fn date_or_never(value: Option<&Value>) -> i64 {
    value
        .and_then(Value::as_str)
        .and_then(|text| annals_core::parse_date(text).ok())
        .unwrap_or(NEVER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use annals_core::GameMeta;
    use annals_core::country::Country;

    fn gamestate_with_leader(level: i64) -> Value {
        Value::map([
            (
                "species",
                Value::list([Value::map([
                    ("name", Value::from("Human")),
                    ("class", Value::from("HUM")),
                    (
                        "traits",
                        Value::map([("trait", Value::from("trait_adaptive"))]),
                    ),
                ])]),
            ),
            (
                "leaders",
                Value::map([(
                    "11",
                    Value::map([
                        (
                            "name",
                            Value::map([
                                ("first_name", Value::from("Danar")),
                                ("second_name", Value::from("Tarvex")),
                            ]),
                        ),
                        ("class", Value::from("scientist")),
                        ("gender", Value::from("female")),
                        ("date", Value::from("2200.05.01")),
                        ("age", Value::from(32.0)),
                        ("level", Value::from(level)),
                        ("species_index", Value::from(0)),
                    ]),
                )]),
            ),
        ])
    }

    fn country_with_leader() -> Value {
        Value::map([("owned_leaders", Value::list([Value::from(11)]))])
    }

    fn fresh_history() -> GameHistory {
        let mut history = GameHistory::new(GameMeta::new("game", "UNE"));
        history.add_country(Country::new(CountryId(0), "UNE", "default").as_player());
        history
    }

    #[test]
    fn species_roster_is_recorded_with_interned_traits() {
        let mut history = fresh_history();
        extract_species(&mut history, &gamestate_with_leader(1));
        let species = history.species(SpeciesId(0)).unwrap();
        assert_eq!(species.name, "Human");
        assert_eq!(species.traits.len(), 1);
        let trait_text = &history.description(species.traits[0]).unwrap().text;
        assert_eq!(trait_text, "trait_adaptive");
    }

    #[test]
    fn new_leaders_are_recruited_with_an_event() {
        let mut history = fresh_history();
        history.begin_snapshot(300).unwrap();
        let gamestate = gamestate_with_leader(2);
        extract_species(&mut history, &gamestate);
        let config = ExtractorConfig::default();
        let mut ctx = PassContext::new(&config, "game", 300, CountryId(0));
        extract_country_leaders(&mut history, &mut ctx, CountryId(0), &country_with_leader(), &gamestate)
            .unwrap();

        let leader = history.leader(LeaderId(11)).unwrap();
        assert_eq!(leader.name, "Danar Tarvex");
        assert!(leader.is_active);
        // Hired 2200.05.01, day 120, before the snapshot day.
        assert_eq!(leader.recruited_day, 120);
        assert_eq!(leader.species, Some(SpeciesId(0)));
        // Thirty-two years back from hiring, within the jitter band.
        let expected_birth = 120 - 360 * 32;
        assert!((leader.birth_day - expected_birth).abs() <= 15);

        let recruited: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::LeaderRecruited)
            .collect();
        assert_eq!(recruited.len(), 1);
        assert_eq!(recruited[0].start_day, 120);
        assert_eq!(recruited[0].end_day, Some(300));
    }

    #[test]
    fn growing_a_level_records_a_level_up() {
        let mut history = fresh_history();
        history.begin_snapshot(300).unwrap();
        let config = ExtractorConfig::default();
        let gamestate = gamestate_with_leader(2);
        extract_species(&mut history, &gamestate);
        let mut ctx = PassContext::new(&config, "game", 300, CountryId(0));
        extract_country_leaders(&mut history, &mut ctx, CountryId(0), &country_with_leader(), &gamestate)
            .unwrap();

        history.begin_snapshot(400).unwrap();
        let leveled = gamestate_with_leader(3);
        let mut later = PassContext::new(&config, "game", 400, CountryId(0));
        extract_country_leaders(&mut history, &mut later, CountryId(0), &country_with_leader(), &leveled)
            .unwrap();

        let level_ups: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::LevelUp)
            .collect();
        assert_eq!(level_ups.len(), 1);
        assert!(level_ups[0].known_to_player);
        let description = level_ups[0].description.unwrap();
        assert_eq!(history.description(description).unwrap().text, "3");
        assert_eq!(history.leader(LeaderId(11)).unwrap().last_level, 3);
    }

    #[test]
    fn vanished_leaders_die_at_their_last_sighting() {
        let mut history = fresh_history();
        history.begin_snapshot(300).unwrap();
        let gamestate = gamestate_with_leader(2);
        extract_species(&mut history, &gamestate);
        let config = ExtractorConfig::default();
        let mut ctx = PassContext::new(&config, "game", 300, CountryId(0));
        extract_country_leaders(&mut history, &mut ctx, CountryId(0), &country_with_leader(), &gamestate)
            .unwrap();

        history.begin_snapshot(700).unwrap();
        let empty_roster = Value::map([(
            "owned_leaders",
            Value::list(Vec::<Value>::new()),
        )]);
        let mut later = PassContext::new(&config, "game", 700, CountryId(0));
        extract_country_leaders(&mut history, &mut later, CountryId(0), &empty_roster, &gamestate)
            .unwrap();

        assert!(!history.leader(LeaderId(11)).unwrap().is_active);
        let deaths: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::LeaderDied)
            .collect();
        assert_eq!(deaths.len(), 1);
        assert_eq!(deaths[0].start_day, 300);
        assert_eq!(deaths[0].end_day, Some(300));
    }

    #[test]
    fn the_ruler_must_be_recorded_and_active() {
        let mut history = fresh_history();
        history.begin_snapshot(300).unwrap();
        let gamestate = gamestate_with_leader(2);
        extract_species(&mut history, &gamestate);
        let config = ExtractorConfig::default();
        let mut ctx = PassContext::new(&config, "game", 300, CountryId(0));
        extract_country_leaders(&mut history, &mut ctx, CountryId(0), &country_with_leader(), &gamestate)
            .unwrap();

        let with_ruler = Value::map([("ruler", Value::from(11))]);
        assert_eq!(current_ruler(&history, &with_ruler), Some(LeaderId(11)));

        let unknown_ruler = Value::map([("ruler", Value::from(99))]);
        assert_eq!(current_ruler(&history, &unknown_ruler), None);

        let no_ruler = Value::map([("name", Value::from("Anarchy"))]);
        assert_eq!(current_ruler(&history, &no_ruler), None);
    }
}
