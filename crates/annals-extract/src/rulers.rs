//! Ruler-centric history: reigns, capital moves, traditions, ascension
//! perks and edicts.

use annals_core::country::{Country, CountryId};
use annals_core::event::{EventType, HistoricalEvent};
use annals_core::galaxy::{PlanetId, SystemId};
use annals_core::leader::LeaderId;
use annals_core::{GameHistory, StoreError};
use annals_save::Value;

use crate::leaders::current_ruler;
use crate::session::PassContext;

/// Record everything attributed to the sitting ruler: the reign itself,
/// capital relocations, adopted traditions, ascension perks and active
/// edicts. Countries without a recognizable ruler are skipped whole.
pub(crate) fn extract_ruler_events(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    id: CountryId,
    country_dict: &Value,
) -> Result<(), StoreError> {
    let Some(ruler) = current_ruler(history, country_dict) else {
        return Ok(());
    };
    let met = history.country(id).is_some_and(Country::has_met_player);
    let capital = capital_of(history, country_dict);

    extract_capital_relocation(history, ctx, id, ruler, capital, met)?;
    extract_reign(history, ctx, id, ruler, capital, met)?;

    let reveals = history
        .latest_country_data(id)
        .is_some_and(|data| data.attitude.reveals_economy_info());
    extract_adoptions(
        history,
        ctx,
        id,
        ruler,
        country_dict.get("traditions"),
        EventType::Tradition,
        reveals,
    )?;
    extract_adoptions(
        history,
        ctx,
        id,
        ruler,
        country_dict.get("ascension_perks"),
        EventType::AscensionPerk,
        met,
    )?;
    extract_edicts(history, ctx, id, ruler, country_dict, reveals)?;
    Ok(())
}

/// The country's capital planet together with its system, when the
/// planet is already on record.
fn capital_of(history: &GameHistory, country_dict: &Value) -> Option<(PlanetId, SystemId)> {
    let id = country_dict.get("capital").and_then(Value::as_int).map(PlanetId)?;
    let planet = history.planet(id)?;
    Some((planet.id, planet.system))
}

fn extract_capital_relocation(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    ruler: LeaderId,
    capital: Option<(PlanetId, SystemId)>,
    met: bool,
) -> Result<(), StoreError> {
    let previous = history
        .events()
        .iter()
        .rev()
        .find(|event| {
            event.event_type == EventType::CapitalRelocation && event.country == Some(id)
        })
        .and_then(|event| event.planet);
    // A lost capital is not a relocation; only a new seat of government
    // gets recorded.
    let moved = match capital {
        Some((planet, _)) => previous != Some(planet),
        None => previous.is_none(),
    };
    if !moved {
        return Ok(());
    }
    let mut event = HistoricalEvent::new(EventType::CapitalRelocation, id, ctx.now, met)
        .with_leader(Some(ruler));
    if let Some((planet, system)) = capital {
        event = event.with_planet(planet).with_system(system);
    }
    history.record_event(event)
}

fn extract_reign(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    ruler: LeaderId,
    capital: Option<(PlanetId, SystemId)>,
    met: bool,
) -> Result<(), StoreError> {
    let reign = history.latest_event_mut(|event| {
        event.event_type == EventType::RuledEmpire
            && event.country == Some(id)
            && event.leader == Some(ruler)
    });
    if let Some(reign) = reign {
        reign.end_day = Some((ctx.now - 1).max(reign.start_day));
        if met {
            reign.mark_known();
        }
        if reign.planet.is_none()
            && let Some((planet, system)) = capital
        {
            reign.planet = Some(planet);
            reign.system = Some(system);
        }
        return Ok(());
    }
    // Reigns observed right at campaign start are assumed to predate it.
    let start_day = if ctx.now < 100 { 0 } else { ctx.now };
    let mut event = HistoricalEvent::new(EventType::RuledEmpire, id, start_day, met)
        .with_leader(Some(ruler))
        .with_end_day(ctx.now);
    if let Some((planet, system)) = capital {
        event = event.with_planet(planet).with_system(system);
    }
    history.record_event(event)
}

/// One-time adoption events (traditions and ascension perks) keyed by
/// their interned name.
fn extract_adoptions(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    ruler: LeaderId,
    adopted: Option<&Value>,
    event_type: EventType,
    known: bool,
) -> Result<(), StoreError> {
    let Some(adopted) = adopted else {
        return Ok(());
    };
    for entry in adopted.iter_coerced() {
        let Some(name) = entry.as_str() else {
            continue;
        };
        let name = name.to_string();
        let description = history.intern(&name);
        let already = history.events().iter().any(|event| {
            event.event_type == event_type
                && event.country == Some(id)
                && event.description == Some(description)
        });
        if already {
            continue;
        }
        history.record_event(
            HistoricalEvent::new(event_type, id, ctx.now, known)
                .with_leader(Some(ruler))
                .with_description(description)
                .with_end_day(ctx.now),
        )?;
    }
    Ok(())
}

fn extract_edicts(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    id: CountryId,
    ruler: LeaderId,
    country_dict: &Value,
    known: bool,
) -> Result<(), StoreError> {
    let Some(edicts) = country_dict.get("edicts") else {
        return Ok(());
    };
    for edict in edicts.iter_coerced() {
        let Some(name) = edict.get("edict").and_then(Value::as_str) else {
            tracing::debug!("edict row without a name, skipping");
            ctx.warnings += 1;
            continue;
        };
        let expiry = edict
            .get("date")
            .and_then(Value::as_str)
            .and_then(|text| annals_core::parse_date(text).ok());
        let Some(expiry) = expiry.filter(|&day| day >= ctx.now) else {
            tracing::debug!(edict = name, "edict row without a usable expiry, skipping");
            ctx.warnings += 1;
            continue;
        };
        let name = name.to_string();
        let description = history.intern(&name);
        let already = history.events().iter().any(|event| {
            event.event_type == EventType::Edict
                && event.country == Some(id)
                && event.description == Some(description)
                && event.end_day == Some(expiry)
        });
        if already {
            continue;
        }
        history.record_event(
            HistoricalEvent::new(EventType::Edict, id, ctx.now, known)
                .with_leader(Some(ruler))
                .with_description(description)
                .with_end_day(expiry),
        )?;
    }
    Ok(())
}
