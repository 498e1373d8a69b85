//! The galaxy chart: systems and the hyperlane network.

use annals_core::country::CountryId;
use annals_core::event::{EventType, HistoricalEvent};
use annals_core::galaxy::{HyperLane, System, SystemId};
use annals_core::{GameHistory, StoreError};
use annals_save::Value;

use crate::names::render_name;
use crate::session::table_entry;

/// Chart every system and hyperlane in the gamestate.
///
/// Runs once, the first time a history sees this galaxy. Systems are added
/// before lanes so both endpoints of each lane resolve.
pub(crate) fn extract_galaxy(history: &mut GameHistory, gamestate: &Value) {
    let Some(objects) = gamestate.get("galactic_object") else {
        return;
    };
    for (id, system_dict) in objects.entries_by_id() {
        history.add_system(system_from_dict(SystemId(id), system_dict));
    }
    for (id, system_dict) in objects.entries_by_id() {
        add_lanes_from(history, SystemId(id), system_dict);
    }
}

/// Chart one system that another pass referenced before it was known.
///
/// Returns false when the gamestate has no record of the id either. When a
/// discovering country is given, the sighting is recorded as an event; the
/// galactic map itself is public, so the event is always visible.
pub(crate) fn add_missing_system(
    history: &mut GameHistory,
    gamestate: &Value,
    id: SystemId,
    discoverer: Option<CountryId>,
    now: i64,
) -> Result<bool, StoreError> {
    let Some(system_dict) = table_entry(gamestate.get("galactic_object"), id.0) else {
        tracing::warn!(system = id.0, "no gamestate entry for referenced system");
        return Ok(false);
    };
    history.add_system(system_from_dict(id, system_dict));
    if let Some(country) = discoverer {
        history.record_event(
            HistoricalEvent::new(EventType::DiscoveredNewSystem, country, now, true)
                .with_system(id)
                .with_end_day(now),
        )?;
    }
    add_lanes_from(history, id, system_dict);
    Ok(true)
}

fn system_from_dict(id: SystemId, system_dict: &Value) -> System {
    System {
        id,
        name: render_name(system_dict.get("name"), "Unnamed system"),
        star_class: system_dict
            .get("star_class")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        coordinate_x: system_dict
            .get_path(&["coordinate", "x"])
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        coordinate_y: system_dict
            .get_path(&["coordinate", "y"])
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
    }
}

/// Record lanes from one system to every neighbour already charted. The
/// store drops self-loops and duplicates, so charting both endpoints of a
/// lane records it exactly once.
fn add_lanes_from(history: &mut GameHistory, from: SystemId, system_dict: &Value) {
    let Some(lanes) = system_dict.get("hyperlane") else {
        return;
    };
    for lane in lanes.iter_coerced() {
        if let Some(to) = lane.get("to").and_then(Value::as_int)
            && history.system(SystemId(to)).is_some()
        {
            history.add_hyperlane(HyperLane {
                a: from,
                b: SystemId(to),
            });
        }
    }
}
