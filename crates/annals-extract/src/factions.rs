//! Political factions and their leadership.

use annals_core::country::{Country, CountryId};
use annals_core::event::{EventType, HistoricalEvent};
use annals_core::faction::{FactionId, PoliticalFaction};
use annals_core::leader::LeaderId;
use annals_core::{GameHistory, StoreError};
use annals_save::Value;

use crate::names::render_name;
use crate::session::PassContext;

/// Record the factions active in one country, announce the new ones and
/// track who leads each. Closes by making sure the synthetic no-faction
/// buckets exist so demographic aggregation always has somewhere to put
/// unaffiliated pops.
pub(crate) fn extract_factions(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    id: CountryId,
    gamestate: &Value,
) -> Result<(), StoreError> {
    let met = history.country(id).is_some_and(Country::has_met_player);
    let reveals = history
        .latest_country_data(id)
        .is_some_and(|data| data.attitude.reveals_demographic_info());

    if let Some(factions) = gamestate.get("pop_factions") {
        for (raw_id, faction_dict) in factions.entries_by_id() {
            if !faction_dict.is_map() {
                continue;
            }
            let owner = faction_dict
                .get("country")
                .and_then(Value::as_int)
                .map(CountryId);
            if owner != Some(id) {
                continue;
            }
            let faction = FactionId(raw_id);
            if history.faction(id, faction).is_none() {
                let name = render_name(faction_dict.get("name"), "Unnamed faction");
                let kind = faction_dict
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                let faction_type = history.intern(&kind);
                history.add_faction(PoliticalFaction {
                    id: faction,
                    country: id,
                    name,
                    faction_type,
                });
                if !faction.is_synthetic() {
                    history.record_event(
                        HistoricalEvent::new(EventType::NewFaction, id, ctx.now, met)
                            .with_faction(faction)
                            .with_end_day(ctx.now),
                    )?;
                }
            }
            record_faction_leader(history, ctx, id, faction, faction_dict, reveals)?;
        }
    }
    history.ensure_synthetic_factions(id);
    Ok(())
}

fn record_faction_leader(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    id: CountryId,
    faction: FactionId,
    faction_dict: &Value,
    known: bool,
) -> Result<(), StoreError> {
    let leader_id = faction_dict
        .get("leader")
        .and_then(Value::as_int)
        .unwrap_or(-1);
    if leader_id < 0 {
        return Ok(());
    }
    let leader = LeaderId(leader_id);
    let belongs = history
        .leader(leader)
        .is_some_and(|row| row.country == id);
    if !belongs {
        tracing::warn!(
            country = id.0,
            leader = leader_id,
            "faction leader not on record, skipping"
        );
        ctx.warnings += 1;
        return Ok(());
    }
    let matched = history.latest_event_mut(|event| {
        event.event_type == EventType::FactionLeader
            && event.country == Some(id)
            && event.leader == Some(leader)
            && event.faction == Some(faction)
    });
    match matched {
        Some(event) => {
            event.extend_to(ctx.now);
            if known {
                event.mark_known();
            }
            Ok(())
        }
        None => history.record_event(
            HistoricalEvent::new(EventType::FactionLeader, id, ctx.now, known)
                .with_leader(Some(leader))
                .with_faction(faction)
                .with_end_day(ctx.now),
        ),
    }
}
