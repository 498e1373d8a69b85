//! Sector traversal: colonization, terraforming, habitable
//! megastructures and sector governorships.
//!
//! Colonies are walked sector by sector so each planetary event can name
//! the governor responsible for it.

use annals_core::country::{Country, CountryId};
use annals_core::event::{EventType, HistoricalEvent};
use annals_core::galaxy::{Planet, PlanetId, SystemId};
use annals_core::leader::LeaderId;
use annals_core::store::DescriptionId;
use annals_core::{GameHistory, StoreError};
use annals_save::Value;

use crate::galaxy::add_missing_system;
use crate::names::render_name;
use crate::session::{PassContext, table_entry};

/// Planet classes a colony ship can settle.
const COLONIZABLE_PLANETS: [&str; 12] = [
    "pc_desert",
    "pc_arid",
    "pc_savannah",
    "pc_tropical",
    "pc_continental",
    "pc_ocean",
    "pc_tundra",
    "pc_arctic",
    "pc_alpine",
    "pc_gaia",
    "pc_nuked",
    "pc_machine",
];

/// Constructed habitats that count as colonizable once finished.
const COLONIZABLE_MEGASTRUCTURES: [&str; 2] = ["pc_ringworld_habitable", "pc_habitat"];

/// Classes of planets that no longer support anything.
const DESTROYED_PLANETS: [&str; 13] = [
    "pc_shattered",
    "pc_shielded",
    "pc_ringworld_shielded",
    "pc_habitat_shielded",
    "pc_ringworld_habitable_damaged",
    "pc_broken",
    "pc_city",
    "pc_cracked",
    "pc_egg_cracked",
    "pc_shrouded",
    "pc_ai",
    "pc_infested",
    "pc_gray_goo",
];

fn is_colonizable(planet_class: &str) -> bool {
    COLONIZABLE_PLANETS.contains(&planet_class)
        || COLONIZABLE_MEGASTRUCTURES.contains(&planet_class)
}

fn is_destroyed(planet_class: &str) -> bool {
    DESTROYED_PLANETS.contains(&planet_class)
}

/// Walk a country's sectors and record every planetary development in
/// them, attributed to the sitting sector governor.
pub(crate) fn extract_sector_events(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    id: CountryId,
    country_dict: &Value,
    gamestate: &Value,
) -> Result<(), StoreError> {
    let Some(owned) = country_dict.get("owned_sectors") else {
        return Ok(());
    };
    let sectors = gamestate.get("sectors");
    for sector_id in owned.iter_coerced().filter_map(Value::as_int) {
        let Some(sector_dict) = table_entry(sectors, sector_id).filter(|entry| entry.is_map())
        else {
            continue;
        };
        let sector_name = render_name(sector_dict.get("name"), "Unnamed");
        let description = history.intern(&sector_name);
        let governor = sector_dict
            .get("governor")
            .and_then(Value::as_int)
            .map(LeaderId)
            .filter(|leader| {
                history
                    .leader(*leader)
                    .is_some_and(|row| row.country == id)
            });

        extract_planetary_events(history, ctx, id, sector_dict, governor, gamestate)?;

        let capital = sector_dict
            .get("local_capital")
            .and_then(Value::as_int)
            .and_then(|planet| history.planet(PlanetId(planet)))
            .map(|planet| (planet.id, planet.system));
        if let (Some(governor), Some(capital)) = (governor, capital) {
            record_governorship(history, ctx, id, governor, description, capital)?;
        }
    }
    Ok(())
}

fn extract_planetary_events(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    id: CountryId,
    sector_dict: &Value,
    governor: Option<LeaderId>,
    gamestate: &Value,
) -> Result<(), StoreError> {
    let Some(systems) = sector_dict.get("systems") else {
        return Ok(());
    };
    for system_id in systems.iter_coerced().filter_map(Value::as_int) {
        let system = SystemId(system_id);
        if history.system(system).is_none()
            && !add_missing_system(history, gamestate, system, Some(id), ctx.now)?
        {
            continue;
        }
        let Some(system_dict) = table_entry(gamestate.get("galactic_object"), system_id)
        else {
            continue;
        };
        let rendered = render_name(system_dict.get("name"), "Unnamed system");
        if let Some(row) = history.system_mut(system)
            && row.name != rendered
        {
            row.name = rendered;
        }

        let Some(planets) = system_dict.get("planet") else {
            continue;
        };
        for planet_id in planets.iter_coerced().filter_map(Value::as_int) {
            let Some(planet_dict) =
                table_entry(gamestate.get("planet"), planet_id).filter(|entry| entry.is_map())
            else {
                continue;
            };
            let planet_class = planet_dict
                .get("planet_class")
                .and_then(Value::as_str)
                .unwrap_or("");
            let colonizable = is_colonizable(planet_class);
            let terraformable = colonizable || has_terraforming_candidate(planet_dict);
            if !(colonizable || terraformable || is_destroyed(planet_class)) {
                continue;
            }
            let planet = upsert_planet(history, system, PlanetId(planet_id), planet_dict);
            if colonizable {
                record_colonization(history, ctx, id, system, planet, planet_dict, governor)?;
                if COLONIZABLE_MEGASTRUCTURES.contains(&planet_class) {
                    let name = if planet_class == "pc_ringworld_habitable" {
                        let system_name = render_name(system_dict.get("name"), "Unknown system");
                        format!("{system_name} Ringworld")
                    } else {
                        render_name(planet_dict.get("name"), "Unnamed planet")
                    };
                    record_megastructure(history, ctx, id, system, planet, name, governor)?;
                }
            }
            if terraformable {
                record_terraforming(history, ctx, id, system, planet, planet_dict, governor)?;
            }
        }
    }
    Ok(())
}

/// All modifiers currently attached to a planet, from both the timed and
/// the permanent table.
fn has_terraforming_candidate(planet_dict: &Value) -> bool {
    let timed = planet_dict
        .get("timed_modifiers")
        .into_iter()
        .flat_map(Value::iter_coerced)
        .filter_map(|entry| entry.get("modifier").and_then(Value::as_str));
    let permanent = planet_dict
        .get("planet_modifier")
        .into_iter()
        .flat_map(Value::iter_coerced)
        .filter_map(Value::as_str);
    timed
        .chain(permanent)
        .any(|modifier| modifier == "terraforming_candidate")
}

/// Create or refresh the planet row, keeping name and class current.
fn upsert_planet(
    history: &mut GameHistory,
    system: SystemId,
    id: PlanetId,
    planet_dict: &Value,
) -> PlanetId {
    let name = render_name(planet_dict.get("name"), "Unnamed planet");
    let planet_class = planet_dict
        .get("planet_class")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    if let Some(row) = history.planet_mut(id) {
        if row.name != name {
            row.name = name;
        }
        if row.planet_class != planet_class {
            row.planet_class = planet_class;
        }
        return id;
    }
    let colonized_day = planet_dict
        .get("colonize_date")
        .and_then(Value::as_str)
        .and_then(|text| annals_core::parse_date(text).ok());
    history.add_planet(Planet {
        id,
        system,
        name,
        planet_class,
        colonized_day,
    });
    id
}

fn record_colonization(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    system: SystemId,
    planet: PlanetId,
    planet_dict: &Value,
    governor: Option<LeaderId>,
) -> Result<(), StoreError> {
    let completed = planet_dict.get("colonize_date").is_some()
        || planet_dict
            .get("pop")
            .is_some_and(|pops| pops.iter_coerced().next().is_some());
    let in_progress = planet_dict.get("colonizer_pop").is_some();
    if !completed && !in_progress {
        return Ok(());
    }
    let parsed_date = planet_dict
        .get("colonize_date")
        .and_then(Value::as_str)
        .and_then(|text| annals_core::parse_date(text).ok());
    let mut end_day = parsed_date.unwrap_or(ctx.now);

    if let Some(row) = history.planet_mut(planet) {
        if row.colonized_day.is_some() {
            return Ok(());
        }
        if completed {
            // A colony reported only through its pops keeps no settlement
            // date, so the event stays open until one appears.
            row.colonized_day = parsed_date;
        }
    }

    let met = history.country(id).is_some_and(Country::has_met_player);
    let existing = history.latest_event_mut(|event| {
        event.event_type == EventType::Colonization && event.planet == Some(planet)
    });
    match existing {
        Some(event) => {
            event.end_day = Some(end_day.max(event.start_day));
            Ok(())
        }
        None => {
            let mut governor = governor;
            // Homeworlds observed at campaign start predate it.
            if ctx.now < 100 {
                end_day = end_day.min(0);
                if id == ctx.player {
                    end_day = 0;
                }
                governor = None;
            }
            history.record_event(
                HistoricalEvent::new(EventType::Colonization, id, ctx.now.min(end_day), met)
                    .with_leader(governor)
                    .with_planet(planet)
                    .with_system(system)
                    .with_end_day(end_day),
            )
        }
    }
}

fn record_terraforming(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    system: SystemId,
    planet: PlanetId,
    planet_dict: &Value,
    governor: Option<LeaderId>,
) -> Result<(), StoreError> {
    let Some(process) = planet_dict.get("terraform_process").filter(|entry| entry.is_map())
    else {
        return Ok(());
    };
    let current = planet_dict
        .get("planet_class")
        .and_then(Value::as_str)
        .unwrap_or("");
    let Some(target) = process.get("planet_class").and_then(Value::as_str) else {
        return Ok(());
    };
    if !is_colonizable(target) {
        tracing::info!(
            planet = planet.0,
            from = current,
            to = target,
            "unexpected terraforming target class"
        );
        return Ok(());
    }
    let text = format!("{current},{target}");
    let description = history.intern(&text);
    let window = ctx.config.staleness_window_days;
    let met = history.country(id).is_some_and(Country::has_met_player);
    let matched = history.latest_event_mut(|event| {
        event.event_type == EventType::Terraforming
            && event.description == Some(description)
            && event.system == Some(system)
            && event.planet == Some(planet)
    });
    match matched {
        Some(event) if event.observed_within(ctx.now, window) => {
            event.end_day = Some(ctx.now);
            Ok(())
        }
        _ => history.record_event(
            HistoricalEvent::new(EventType::Terraforming, id, ctx.now, met)
                .with_leader(governor)
                .with_planet(planet)
                .with_system(system)
                .with_description(description)
                .with_end_day(ctx.now),
        ),
    }
}

fn record_megastructure(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    system: SystemId,
    planet: PlanetId,
    name: String,
    governor: Option<LeaderId>,
) -> Result<(), StoreError> {
    let description = history.intern(&name);
    let met = history.country(id).is_some_and(Country::has_met_player);
    let matched = history.latest_event_mut(|event| {
        event.event_type == EventType::HabitatRingworldConstruction
            && event.system == Some(system)
            && event.description == Some(description)
    });
    match matched {
        Some(event) => {
            if !event.known_to_player && met {
                event.mark_known();
            }
            Ok(())
        }
        None => {
            tracing::info!(name = name.as_str(), "new habitable megastructure");
            history.record_event(
                HistoricalEvent::new(EventType::HabitatRingworldConstruction, id, ctx.now, met)
                    .with_leader(governor)
                    .with_planet(planet)
                    .with_system(system)
                    .with_description(description)
                    .with_end_day(ctx.now),
            )
        }
    }
}

fn record_governorship(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    governor: LeaderId,
    description: DescriptionId,
    capital: (PlanetId, SystemId),
) -> Result<(), StoreError> {
    let window = ctx.config.staleness_window_days;
    // The latest term over this sector, by interval end; a recent term by
    // the same governor is resumed rather than duplicated.
    let resumed_end = history
        .events()
        .iter()
        .filter(|event| {
            event.event_type == EventType::GovernedSector
                && event.description == Some(description)
        })
        .max_by_key(|event| event.effective_end())
        .filter(|event| {
            event.leader == Some(governor) && event.effective_end() > ctx.now - window
        })
        .map(|event| event.end_day);

    if let Some(end_key) = resumed_end {
        if let Some(event) = history.latest_event_mut(|event| {
            event.event_type == EventType::GovernedSector
                && event.description == Some(description)
                && event.leader == Some(governor)
                && event.end_day == end_key
        }) {
            event.extend_to(ctx.now);
            if event.planet.is_none() {
                event.planet = Some(capital.0);
                event.system = Some(capital.1);
            }
        }
        return Ok(());
    }
    let known = history
        .latest_country_data(id)
        .is_some_and(|data| data.attitude.reveals_economy_info());
    history.record_event(
        HistoricalEvent::new(EventType::GovernedSector, id, ctx.now, known)
            .with_leader(Some(governor))
            .with_description(description)
            .with_planet(capital.0)
            .with_system(capital.1)
            .with_end_day(ctx.now),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use annals_core::GameMeta;
    use annals_core::leader::Leader;

    fn governor(id: i64, country: CountryId) -> Leader {
        Leader {
            id: LeaderId(id),
            country,
            name: "Steward".to_string(),
            leader_class: "governor".to_string(),
            gender: "Other".to_string(),
            agenda: None,
            species: None,
            recruited_day: 0,
            birth_day: -9000,
            last_seen_day: 0,
            last_level: 1,
            is_active: true,
        }
    }

    fn gamestate(planet: Value) -> Value {
        Value::map([
            (
                "sectors",
                Value::map([(
                    "1",
                    Value::map([
                        ("name", Value::from("Core Sector")),
                        ("governor", Value::from(4)),
                        ("local_capital", Value::from(7)),
                        ("systems", Value::from(3)),
                    ]),
                )]),
            ),
            (
                "galactic_object",
                Value::map([(
                    "3",
                    Value::map([
                        ("name", Value::from("Sol")),
                        ("type", Value::from("star")),
                        ("star_class", Value::from("sc_g")),
                        (
                            "coordinate",
                            Value::map([("x", Value::from(0.0)), ("y", Value::from(0.0))]),
                        ),
                        ("planet", Value::from(7)),
                    ]),
                )]),
            ),
            ("planet", Value::map([("7", planet)])),
        ])
    }

    fn country_dict() -> Value {
        Value::map([("owned_sectors", Value::list([Value::from(1)]))])
    }

    fn prepared() -> GameHistory {
        let mut history = GameHistory::new(GameMeta::new("game", "UNE"));
        history.add_country(Country::new(CountryId(0), "UNE", "default").as_player());
        history.add_leader(governor(4, CountryId(0)));
        history
    }

    #[test]
    fn a_settled_homeworld_is_backdated_to_campaign_start() {
        let mut history = prepared();
        history.begin_snapshot(30).unwrap();
        let config = ExtractorConfig::default();
        let mut ctx = PassContext::new(&config, "game", 30, CountryId(0));
        let planet = Value::map([
            ("name", Value::from("Earth")),
            ("planet_class", Value::from("pc_continental")),
            ("pop", Value::list([Value::from(1), Value::from(2)])),
        ]);

        extract_sector_events(
            &mut history,
            &mut ctx,
            CountryId(0),
            &country_dict(),
            &gamestate(planet),
        )
        .unwrap();

        let colonies: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::Colonization)
            .collect();
        assert_eq!(colonies.len(), 1);
        assert_eq!(colonies[0].start_day, 0);
        assert_eq!(colonies[0].end_day, Some(0));
        assert_eq!(colonies[0].leader, None);
        assert_eq!(history.planet(PlanetId(7)).unwrap().name, "Earth");
    }

    #[test]
    fn a_colony_in_progress_closes_once_the_settlement_date_appears() {
        let mut history = prepared();
        let config = ExtractorConfig::default();
        let settling = Value::map([
            ("name", Value::from("Mars")),
            ("planet_class", Value::from("pc_desert")),
            ("colonizer_pop", Value::from(11)),
        ]);
        let settled = Value::map([
            ("name", Value::from("Mars")),
            ("planet_class", Value::from("pc_desert")),
            ("colonize_date", Value::from("2201.06.01")),
        ]);

        history.begin_snapshot(400).unwrap();
        let mut ctx = PassContext::new(&config, "game", 400, CountryId(0));
        extract_sector_events(
            &mut history,
            &mut ctx,
            CountryId(0),
            &country_dict(),
            &gamestate(settling),
        )
        .unwrap();
        assert_eq!(history.planet(PlanetId(7)).unwrap().colonized_day, None);

        history.begin_snapshot(700).unwrap();
        let mut later = PassContext::new(&config, "game", 700, CountryId(0));
        extract_sector_events(
            &mut history,
            &mut later,
            CountryId(0),
            &country_dict(),
            &gamestate(settled),
        )
        .unwrap();

        assert_eq!(history.planet(PlanetId(7)).unwrap().colonized_day, Some(510));
        let colony = history
            .events()
            .iter()
            .find(|e| e.event_type == EventType::Colonization)
            .unwrap();
        assert_eq!(colony.start_day, 400);
        assert_eq!(colony.end_day, Some(510));
    }

    #[test]
    fn terraforming_extends_while_the_process_runs() {
        let mut history = prepared();
        history.begin_snapshot(700).unwrap();
        let config = ExtractorConfig::default();
        let planet = Value::map([
            ("name", Value::from("Venus")),
            ("planet_class", Value::from("pc_arid")),
            (
                "terraform_process",
                Value::map([("planet_class", Value::from("pc_gaia"))]),
            ),
        ]);

        let mut ctx = PassContext::new(&config, "game", 700, CountryId(0));
        extract_sector_events(
            &mut history,
            &mut ctx,
            CountryId(0),
            &country_dict(),
            &gamestate(planet.clone()),
        )
        .unwrap();
        history.begin_snapshot(760).unwrap();
        let mut later = PassContext::new(&config, "game", 760, CountryId(0));
        extract_sector_events(
            &mut history,
            &mut later,
            CountryId(0),
            &country_dict(),
            &gamestate(planet),
        )
        .unwrap();

        let terraforming: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::Terraforming)
            .collect();
        assert_eq!(terraforming.len(), 1);
        assert_eq!(terraforming[0].start_day, 700);
        assert_eq!(terraforming[0].end_day, Some(760));
    }

    #[test]
    fn governors_resume_recent_terms_but_not_stale_ones() {
        let mut history = prepared();
        let config = ExtractorConfig::default();
        let planet = Value::map([
            ("name", Value::from("Earth")),
            ("planet_class", Value::from("pc_continental")),
            ("colonize_date", Value::from("2200.01.01")),
        ]);

        history.begin_snapshot(100).unwrap();
        let mut ctx = PassContext::new(&config, "game", 100, CountryId(0));
        extract_sector_events(
            &mut history,
            &mut ctx,
            CountryId(0),
            &country_dict(),
            &gamestate(planet.clone()),
        )
        .unwrap();

        history.begin_snapshot(400).unwrap();
        let mut fresh = PassContext::new(&config, "game", 400, CountryId(0));
        extract_sector_events(
            &mut history,
            &mut fresh,
            CountryId(0),
            &country_dict(),
            &gamestate(planet.clone()),
        )
        .unwrap();

        history.begin_snapshot(4000).unwrap();
        let mut stale = PassContext::new(&config, "game", 4000, CountryId(0));
        extract_sector_events(
            &mut history,
            &mut stale,
            CountryId(0),
            &country_dict(),
            &gamestate(planet),
        )
        .unwrap();

        let terms: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::GovernedSector)
            .collect();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].start_day, 100);
        assert_eq!(terms[0].end_day, Some(400));
        assert_eq!(terms[1].start_day, 4000);
        assert_eq!(terms[0].planet, Some(PlanetId(7)));
    }
}
