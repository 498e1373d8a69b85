//! War bookkeeping: declarations, participants, battles and the
//! settlement of wars that have left the saves.

use annals_core::country::{Country, CountryId};
use annals_core::event::{EventType, HistoricalEvent};
use annals_core::galaxy::{PlanetId, SystemId};
use annals_core::war::{
    Combat, CombatId, CombatParticipant, CombatType, War, WarId, WarOutcome, WarParticipant,
};
use annals_core::{GameHistory, StoreError};
use annals_save::Value;

use crate::galaxy::add_missing_system;
use crate::leaders::current_ruler;
use crate::session::{PassContext, table_entry};

/// Record every war listed in the snapshot: reopen or create the war
/// row, refresh exhaustion, keep the participant roster current and fold
/// in the cumulative battle list.
///
/// A war that shares its name with a long-settled predecessor starts a
/// fresh row; a terminal war still inside the staleness window is left
/// alone entirely.
pub(crate) fn extract_wars(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    gamestate: &Value,
) -> Result<(), StoreError> {
    let Some(wars) = gamestate.get("war") else {
        return Ok(());
    };
    let window = ctx.config.staleness_window_days;
    for (_, war_dict) in wars.entries_by_id() {
        if !war_dict.is_map() {
            continue;
        }
        let name = war_dict
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unnamed war")
            .to_string();
        let existing = history
            .latest_war_by_name(&name)
            .map(|war| (war.id, war.outcome, war.end_day));

        let war_id;
        if let Some((id, outcome, end_day)) = existing
            && !(outcome.is_terminal() && end_day < ctx.now - window)
        {
            war_id = id;
            if let Some(day) = force_peace_day(war_dict, "defender_force_peace", ctx.now) {
                settle_by_force_peace(history, id, day);
            } else if let Some(day) = force_peace_day(war_dict, "attacker_force_peace", ctx.now) {
                settle_by_force_peace(history, id, day);
            } else if outcome.is_terminal() {
                continue;
            } else if let Some(war) = history.war_mut(id) {
                war.advance_to(ctx.now);
            }
        } else {
            let start_day = war_dict
                .get("start_date")
                .and_then(Value::as_str)
                .and_then(|text| annals_core::parse_date(text).ok())
                .unwrap_or(ctx.now);
            war_id = history.add_war(War {
                id: WarId(0),
                name,
                start_day,
                end_day: ctx.now,
                outcome: WarOutcome::InProgress,
                attacker_exhaustion: 0.0,
                defender_exhaustion: 0.0,
            });
        }

        if let Some(war) = history.war_mut(war_id) {
            war.attacker_exhaustion = war_dict
                .get("attacker_war_exhaustion")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            war.defender_exhaustion = war_dict
                .get("defender_war_exhaustion")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
        }

        extract_participants(history, ctx, war_id, war_dict, gamestate)?;
        extract_battles(history, ctx, war_id, war_dict, gamestate)?;
    }
    Ok(())
}

/// The day a force-peace settlement takes effect, if its flag is set.
fn force_peace_day(war_dict: &Value, key: &str, fallback: i64) -> Option<i64> {
    let forced = war_dict
        .get(key)
        .and_then(Value::as_yes_no)
        .unwrap_or(false);
    if !forced {
        return None;
    }
    let date_key = format!("{key}_date");
    Some(
        war_dict
            .get(&date_key)
            .and_then(Value::as_str)
            .and_then(|text| annals_core::parse_date(text).ok())
            .unwrap_or(fallback),
    )
}

fn settle_by_force_peace(history: &mut GameHistory, war_id: WarId, day: i64) {
    if let Some(war) = history.war_mut(war_id) {
        war.resolve(WarOutcome::StatusQuo, day);
    }
}

fn extract_participants(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    war_id: WarId,
    war_dict: &Value,
    gamestate: &Value,
) -> Result<(), StoreError> {
    let attacker_goal = war_dict
        .get_path(&["attacker_war_goal", "type"])
        .and_then(Value::as_str)
        .map(str::to_string);
    let defender_goal = match war_dict.get("defender_war_goal") {
        Some(goal) if goal.is_map() => goal
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string),
        Some(goal) => goal
            .as_str()
            .filter(|text| !text.is_empty() && *text != "none")
            .map(str::to_string),
        None => None,
    };

    let attackers: Vec<i64> = side_countries(war_dict.get("attackers"));
    let defenders: Vec<i64> = side_countries(war_dict.get("defenders"));
    for &raw in attackers.iter().chain(defenders.iter()) {
        let country = CountryId(raw);
        let is_attacker = attackers.contains(&raw);
        if history.country(country).is_none() {
            tracing::warn!(country = raw, "war participant not on record, skipping");
            ctx.warnings += 1;
            continue;
        }
        if history.war_participant_mut(war_id, country).is_none() {
            let war_goal = if is_attacker {
                attacker_goal.clone()
            } else {
                defender_goal.clone()
            };
            history.add_war_participant(WarParticipant {
                war: war_id,
                country,
                is_attacker,
                war_goal,
            })?;
            let ruler = table_entry(gamestate.get("country"), raw)
                .and_then(|dict| current_ruler(history, dict));
            let met = history.country(country).is_some_and(Country::has_met_player);
            history.record_event(
                HistoricalEvent::new(EventType::War, country, ctx.now, met)
                    .with_leader(ruler)
                    .with_war(war_id)
                    .with_end_day(ctx.now),
            )?;
        }
        if let Some(participant) = history.war_participant_mut(war_id, country)
            && participant.war_goal.is_none()
        {
            participant.war_goal = defender_goal.clone();
        }
    }
    Ok(())
}

/// Country ids of one war side; the save lists them as small dicts.
fn side_countries(side: Option<&Value>) -> Vec<i64> {
    side.into_iter()
        .flat_map(Value::iter_coerced)
        .filter_map(|entry| entry.get("country").and_then(Value::as_int))
        .collect()
}

fn extract_battles(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    war_id: WarId,
    war_dict: &Value,
    gamestate: &Value,
) -> Result<(), StoreError> {
    let Some(battles) = war_dict.get("battles") else {
        return Ok(());
    };
    for battle in battles.iter_coerced() {
        if !battle.is_map() {
            continue;
        }
        let attackers: Vec<i64> = battle
            .get("attackers")
            .into_iter()
            .flat_map(Value::iter_coerced)
            .filter_map(Value::as_int)
            .collect();
        let defenders: Vec<i64> = battle
            .get("defenders")
            .into_iter()
            .flat_map(Value::iter_coerced)
            .filter_map(Value::as_int)
            .collect();
        if attackers.is_empty() || defenders.is_empty() {
            continue;
        }
        let Some(attacker_victory) = battle.get("attacker_victory").and_then(Value::as_yes_no)
        else {
            continue;
        };

        let planet = battle
            .get("planet")
            .and_then(Value::as_int)
            .and_then(|raw| history.planet(PlanetId(raw)))
            .map(|row| (row.id, row.system));
        let system = match planet {
            Some((_, system)) => Some(system),
            None => match battle.get("system").and_then(Value::as_int).map(SystemId) {
                Some(id) => {
                    let charted = history.system(id).is_some()
                        || add_missing_system(history, gamestate, id, None, ctx.now)?;
                    charted.then_some(id)
                }
                None => None,
            },
        };

        let combat_type =
            CombatType::from_name(battle.get("type").and_then(Value::as_str).unwrap_or(""));
        let day = battle
            .get("date")
            .and_then(Value::as_str)
            .and_then(|text| annals_core::parse_date(text).ok())
            .filter(|&day| day >= 0)
            .unwrap_or(ctx.now);
        let attacker_exhaustion = battle
            .get("attacker_war_exhaustion")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let defender_exhaustion = battle
            .get("defender_war_exhaustion")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        // Skirmishes that cost nobody anything are noise, except ground
        // invasions, which matter regardless.
        if attacker_exhaustion + defender_exhaustion <= 0.001 && combat_type != CombatType::Armies
        {
            continue;
        }

        let candidate = Combat {
            id: CombatId(0),
            war: war_id,
            system,
            planet: planet.map(|(id, _)| id),
            combat_type,
            attacker_victory,
            attacker_exhaustion,
            defender_exhaustion,
            day,
        };
        if history
            .combats()
            .iter()
            .any(|existing| existing.same_engagement(&candidate))
        {
            continue;
        }
        let combat_id = history.add_combat(candidate);

        let mut known = false;
        for &raw in attackers.iter().chain(defenders.iter()) {
            let country = CountryId(raw);
            let Some(row) = history.country(country) else {
                tracing::warn!(country = raw, "battle participant not on record, skipping");
                ctx.warnings += 1;
                continue;
            };
            known = known || row.has_met_player();
            if history.war_participant_mut(war_id, country).is_none() {
                tracing::debug!(
                    country = raw,
                    "battle participant is not part of the war, skipping"
                );
                continue;
            }
            history.add_combat_participant(CombatParticipant {
                combat: combat_id,
                country,
                is_attacker: attackers.contains(&raw),
            })?;
        }

        let event_type = if combat_type == CombatType::Armies {
            EventType::ArmyCombat
        } else {
            EventType::FleetCombat
        };
        let mut event = HistoricalEvent::unattributed(event_type, day, known).with_war(war_id);
        if let Some(id) = system {
            event = event.with_system(id);
        }
        if let Some((id, _)) = planet {
            event = event.with_planet(id);
        }
        history.record_event(event)?;
    }
    Ok(())
}

/// Close the books on wars the saves have stopped fighting: truces name
/// the wars they ended, and anything still marked in progress long after
/// it was last listed is resolved as unknown.
pub(crate) fn settle_finished_wars(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    gamestate: &Value,
) -> Result<(), StoreError> {
    if let Some(truces) = gamestate.get("truce") {
        if !truces.is_map() {
            return Ok(());
        }
        for (_, truce) in truces.entries_by_id() {
            if !truce.is_map() {
                continue;
            }
            let Some(name) = truce
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
            else {
                continue;
            };
            let truce_type = truce
                .get("truce_type")
                .and_then(Value::as_str)
                .unwrap_or("other");
            if truce_type != "war" {
                continue;
            }
            let Some(war_id) = history.latest_war_by_name(name).map(|war| war.id) else {
                continue;
            };
            let truce_start = truce
                .get("start_date")
                .and_then(Value::as_str)
                .and_then(|text| annals_core::parse_date(text).ok());

            let mut settled = false;
            if let Some(war) = history.war_mut(war_id) {
                // The start of the truce is the day the fighting stopped.
                if let Some(day) = truce_start {
                    war.end_day = day;
                }
                if war.outcome == WarOutcome::InProgress {
                    let outcome = settlement_outcome(war);
                    let end_day = war.end_day;
                    settled = war.resolve(outcome, end_day);
                }
            }
            if settled {
                record_peace_events(history, ctx, war_id, gamestate)?;
            }
        }
    }

    let window = ctx.config.staleness_window_days;
    let vanished: Vec<WarId> = history
        .wars()
        .filter(|war| {
            war.outcome == WarOutcome::InProgress && war.end_day < ctx.now - window
        })
        .map(|war| war.id)
        .collect();
    for war_id in vanished {
        let mut settled = false;
        if let Some(war) = history.war_mut(war_id) {
            let end_day = war.end_day;
            settled = war.resolve(WarOutcome::Unknown, end_day);
        }
        if settled {
            record_peace_events(history, ctx, war_id, gamestate)?;
        }
    }
    Ok(())
}

/// The side that bled less wins; an exact tie settles as status quo.
fn settlement_outcome(war: &War) -> WarOutcome {
    if war.attacker_exhaustion < war.defender_exhaustion {
        WarOutcome::AttackerVictory
    } else if war.defender_exhaustion < war.attacker_exhaustion {
        WarOutcome::DefenderVictory
    } else {
        WarOutcome::StatusQuo
    }
}

fn record_peace_events(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    war_id: WarId,
    gamestate: &Value,
) -> Result<(), StoreError> {
    let end_day = history.war(war_id).map_or(ctx.now, |war| war.end_day);
    let participants: Vec<CountryId> = history
        .war_participants(war_id)
        .map(|participant| participant.country)
        .collect();
    for country in participants {
        let exists = history.events().iter().any(|event| {
            event.event_type == EventType::Peace
                && event.country == Some(country)
                && event.war == Some(war_id)
        });
        if exists {
            continue;
        }
        let ruler = table_entry(gamestate.get("country"), country.0)
            .and_then(|dict| current_ruler(history, dict));
        let met = history.country(country).is_some_and(Country::has_met_player);
        history.record_event(
            HistoricalEvent::new(EventType::Peace, country, end_day, met)
                .with_leader(ruler)
                .with_war(war_id),
        )?;
    }
    Ok(())
}
