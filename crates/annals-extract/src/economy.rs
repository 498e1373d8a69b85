//! Monthly budget extraction.

use annals_core::GameHistory;
use annals_core::country::{BudgetItem, CountryId, ResourceFlows};
use annals_save::Value;

use crate::session::PassContext;

/// Accumulate the country's monthly budget into its metrics row.
///
/// Every line of the current month's balance contributes to the country's
/// net flows. For the player each line is additionally kept as its own
/// budget item, including the strategic resources that the net flows do
/// not track.
pub(crate) fn extract_economy(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    country_dict: &Value,
) {
    let Some(balance) = country_dict.get_path(&["budget", "current_month", "balance"]) else {
        return;
    };
    let Some(lines) = balance.as_map() else {
        return;
    };
    let is_player = id == ctx.player;

    // Iterate names in sorted order so re-ingesting a day replays budget
    // items identically.
    let mut names: Vec<&String> = lines.keys().collect();
    names.sort();

    let mut totals = ResourceFlows::default();
    for name in names {
        if name == "none" {
            continue;
        }
        let Some(values) = lines.get(name.as_str()) else {
            continue;
        };
        let Some(entries) = values.as_map() else {
            continue;
        };
        if entries.is_empty() {
            continue;
        }
        let mut flows = ResourceFlows::default();
        for (resource, amount) in entries {
            if let Some(amount) = amount.as_f64() {
                flows.accumulate(resource, amount);
            }
        }
        totals.add(&flows);

        if is_player {
            let strategic = |key: &str| -> f64 {
                values.get(key).and_then(Value::as_f64).unwrap_or(0.0)
            };
            let item = BudgetItem {
                country: id,
                day: ctx.now,
                name: history.intern(name),
                flows,
                volatile_motes: strategic("volatile_motes"),
                exotic_gases: strategic("exotic_gases"),
                rare_crystals: strategic("rare_crystals"),
                living_metal: strategic("living_metal"),
                zro: strategic("zro"),
                dark_matter: strategic("dark_matter"),
                nanites: strategic("nanites"),
            };
            history.add_budget_item(item);
        }
    }

    if let Some(data) = history.country_data_at_mut(id, ctx.now) {
        data.net_flows.add(&totals);
    }
}
