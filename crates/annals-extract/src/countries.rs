//! Country identity rows and per-day metric rows.

use annals_core::country::{Attitude, Country, CountryData, CountryId, PlayerRelations};
use annals_core::{GameHistory, StoreError};
use annals_save::Value;

use crate::names::render_name;
use crate::session::PassContext;

/// Get or create the identity row for one country and keep its name and
/// type current. The player's first contact is pinned to day zero.
pub(crate) fn upsert_country(
    history: &mut GameHistory,
    player: CountryId,
    id: CountryId,
    country_dict: &Value,
) {
    let name = render_name(country_dict.get("name"), "no name");
    let country_type = country_dict
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    if let Some(existing) = history.country_mut(id) {
        existing.name = name;
        existing.country_type = country_type;
        return;
    }
    let mut country = Country::new(id, name, country_type);
    if id == player {
        country = country.as_player();
        country.record_first_contact(0);
    }
    history.add_country(country);
}

/// Note which countries the player trades research or sensor access with.
/// Both parties of a deal are listed; the player is normalized to the
/// first slot and deals not involving the player are ignored.
pub(crate) fn extract_trade_agreements(ctx: &mut PassContext<'_>, gamestate: &Value) {
    let Some(trades) = gamestate.get("trade_deal") else {
        return;
    };
    for (_, trade) in trades.entries_by_id() {
        let mut first = trade.get("first");
        let mut second = trade.get("second");
        if party_country(first) != Some(ctx.player) {
            std::mem::swap(&mut first, &mut second);
        }
        if party_country(first) != Some(ctx.player) {
            continue;
        }
        let (Some(partner), Some(terms)) = (party_country(second), second) else {
            continue;
        };
        if terms.get("research_agreement").and_then(Value::as_yes_no) == Some(true) {
            ctx.research_agreements.insert(partner);
        }
        if terms.get("sensor_link").and_then(Value::as_yes_no) == Some(true) {
            ctx.sensor_links.insert(partner);
        }
    }
}

fn party_country(party: Option<&Value>) -> Option<CountryId> {
    party?.get("country").and_then(Value::as_int).map(CountryId)
}

/// Record the per-day metrics row for one country. Net resource flows
/// start at zero here; the economy pass fills them in afterwards.
pub(crate) fn extract_country_data(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    country_dict: &Value,
    relations: PlayerRelations,
) -> Result<(), StoreError> {
    let mut data = CountryData::new(id, ctx.now);
    data.relations = relations;
    data.relations.research_agreement = id == ctx.player || ctx.research_agreements.contains(&id);
    data.relations.sensor_link = id == ctx.player || ctx.sensor_links.contains(&id);
    data.attitude = attitude_towards_player(ctx, id, country_dict);

    data.military_power = number(country_dict, "military_power");
    data.tech_power = number(country_dict, "tech_power");
    data.economy_power = number(country_dict, "economy_power");
    data.fleet_size = number(country_dict, "fleet_size");
    data.empire_size = number(country_dict, "empire_size");
    data.empire_cohesion = number(country_dict, "empire_cohesion");
    data.victory_rank = country_dict
        .get("victory_rank")
        .and_then(Value::as_int)
        .unwrap_or(0);
    data.victory_score = number(country_dict, "victory_score");
    data.tech_count = country_dict
        .get_path(&["tech_status", "technology"])
        .map_or(0, |techs| techs.iter_coerced().count() as i64);
    data.exploration_progress = country_dict
        .get("surveyed")
        .map_or(0, |surveyed| surveyed.iter_coerced().count() as i64);
    data.owned_planets = ctx
        .country_planets
        .get(&id)
        .map_or(0, |planets| planets.len() as i64);
    data.controlled_systems = ctx
        .country_systems
        .get(&id)
        .map_or(0, |systems| systems.len() as i64);

    history.add_country_data(data)
}

fn number(country_dict: &Value, key: &str) -> f64 {
    country_dict.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// How this country's AI feels about the player. The player itself gets
/// the reserved top rung.
fn attitude_towards_player(ctx: &PassContext<'_>, id: CountryId, country_dict: &Value) -> Attitude {
    if id == ctx.player {
        return Attitude::IsPlayer;
    }
    if let Some(attitudes) = country_dict.get_path(&["ai", "attitude"]) {
        for entry in attitudes.iter_coerced() {
            if entry.get("country").and_then(Value::as_int) == Some(ctx.player.0)
                && let Some(name) = entry.get("attitude").and_then(Value::as_str)
            {
                return Attitude::from_name(name);
            }
        }
    }
    Attitude::Unknown
}
