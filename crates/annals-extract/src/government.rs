//! Government composition tracking and reform events.

use std::collections::BTreeSet;

use annals_core::country::{CountryId, Government};
use annals_core::event::{EventType, HistoricalEvent};
use annals_core::{GameHistory, StoreError};
use annals_save::Value;

use crate::leaders::current_ruler;
use crate::names::render_name;
use crate::session::PassContext;

/// Track the country's government composition across snapshots.
///
/// The latest recorded composition is always closed at the day before the
/// snapshot. If the observed composition matches it, nothing else happens.
/// Otherwise a new composition interval opens, and when an older one was
/// actually replaced the change is recorded as a reform led by the
/// current ruler.
pub(crate) fn extract_government(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    country_dict: &Value,
) -> Result<(), StoreError> {
    let observed = observed_government(ctx, id, country_dict);

    let mut reformed = false;
    if let Some(previous) = history.latest_government_mut(id) {
        previous.end_day = (ctx.now - 1).max(previous.start_day);
        reformed = !previous.same_composition(&observed);
        if !reformed {
            return Ok(());
        }
    }
    history.add_government(observed)?;

    if reformed {
        let ruler = current_ruler(history, country_dict);
        let known = history.country(id).is_some_and(|c| c.has_met_player());
        history.record_event(
            HistoricalEvent::new(EventType::GovernmentReform, id, ctx.now, known)
                .with_leader(ruler)
                .with_end_day(ctx.now),
        )?;
    }
    Ok(())
}

/// Read the composition the snapshot shows. The interval opens a day
/// early and closes a day late so adjacent snapshots overlap instead of
/// leaving gaps; the next snapshot trims it back.
fn observed_government(ctx: &PassContext<'_>, id: CountryId, country_dict: &Value) -> Government {
    let gov_dict = country_dict.get("government");
    let field = |key: &str, default: &str| -> String {
        gov_dict
            .and_then(|g| g.get(key))
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    let mut ethics = BTreeSet::new();
    if let Some(ethic_list) = country_dict.get_path(&["ethos", "ethic"]) {
        for ethic in ethic_list.iter_coerced() {
            if let Some(name) = ethic.as_str() {
                ethics.insert(name.to_string());
            }
        }
    }
    let mut civics = BTreeSet::new();
    if let Some(civic_list) = gov_dict.and_then(|g| g.get("civics")) {
        for civic in civic_list.iter_coerced() {
            if let Some(name) = civic.as_str() {
                civics.insert(name.to_string());
            }
        }
    }
    Government {
        country: id,
        start_day: (ctx.now - 1).max(0),
        end_day: ctx.now + 1,
        name: render_name(country_dict.get("name"), "Unnamed Country"),
        gov_type: field("type", "other"),
        authority: field("authority", "other"),
        personality: country_dict
            .get("personality")
            .and_then(Value::as_str)
            .unwrap_or("unknown_personality")
            .to_string(),
        ethics,
        civics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use annals_core::GameMeta;
    use annals_core::country::Country;

    fn country_dict(name: &str, civics: &[&str]) -> Value {
        Value::map([
            ("name", Value::from(name)),
            (
                "ethos",
                Value::map([(
                    "ethic",
                    Value::list(vec![
                        Value::from("ethic_egalitarian"),
                        Value::from("ethic_xenophile"),
                    ]),
                )]),
            ),
            (
                "government",
                Value::map([
                    ("type", Value::from("gov_democratic")),
                    ("authority", Value::from("auth_democratic")),
                    (
                        "civics",
                        Value::list(civics.iter().map(|c| Value::from(*c)).collect::<Vec<_>>()),
                    ),
                ]),
            ),
        ])
    }

    fn history_with_country(id: CountryId) -> GameHistory {
        let mut history = GameHistory::new(GameMeta::new("game", "UNE"));
        let mut country = Country::new(id, "UNE", "default");
        country.record_first_contact(0);
        history.add_country(country);
        history
    }

    #[test]
    fn first_sighting_opens_an_interval_without_a_reform() {
        let mut history = history_with_country(CountryId(0));
        history.begin_snapshot(0).unwrap();
        let config = ExtractorConfig::default();
        let ctx = PassContext::new(&config, "game", 0, CountryId(0));
        let dict = country_dict("UNE", &["civic_beacon_of_liberty"]);
        extract_government(&mut history, &ctx, CountryId(0), &dict).unwrap();

        let govs: Vec<_> = history.governments(CountryId(0)).collect();
        assert_eq!(govs.len(), 1);
        // Day zero cannot open a day early.
        assert_eq!(govs[0].start_day, 0);
        assert_eq!(govs[0].end_day, 1);
        assert!(history.events().is_empty());
    }

    #[test]
    fn unchanged_composition_only_trims_the_open_interval() {
        let mut history = history_with_country(CountryId(0));
        history.begin_snapshot(0).unwrap();
        let config = ExtractorConfig::default();
        let ctx = PassContext::new(&config, "game", 0, CountryId(0));
        let dict = country_dict("UNE", &["civic_beacon_of_liberty"]);
        extract_government(&mut history, &ctx, CountryId(0), &dict).unwrap();

        history.begin_snapshot(360).unwrap();
        let later = PassContext::new(&config, "game", 360, CountryId(0));
        extract_government(&mut history, &later, CountryId(0), &dict).unwrap();

        let govs: Vec<_> = history.governments(CountryId(0)).collect();
        assert_eq!(govs.len(), 1);
        assert_eq!(govs[0].end_day, 359);
        assert!(history.events().is_empty());
    }

    #[test]
    fn changed_civics_close_the_old_interval_and_record_a_reform() {
        let mut history = history_with_country(CountryId(0));
        history.begin_snapshot(0).unwrap();
        let config = ExtractorConfig::default();
        let ctx = PassContext::new(&config, "game", 0, CountryId(0));
        extract_government(
            &mut history,
            &ctx,
            CountryId(0),
            &country_dict("UNE", &["civic_beacon_of_liberty"]),
        )
        .unwrap();

        history.begin_snapshot(360).unwrap();
        let later = PassContext::new(&config, "game", 360, CountryId(0));
        extract_government(
            &mut history,
            &later,
            CountryId(0),
            &country_dict("UNE", &["civic_meritocracy"]),
        )
        .unwrap();

        let govs: Vec<_> = history.governments(CountryId(0)).collect();
        assert_eq!(govs.len(), 2);
        assert_eq!(govs[0].end_day, 359);
        assert_eq!(govs[1].start_day, 359);
        assert_eq!(govs[1].end_day, 361);

        let reforms: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::GovernmentReform)
            .collect();
        assert_eq!(reforms.len(), 1);
        assert_eq!(reforms[0].start_day, 360);
        assert_eq!(reforms[0].end_day, Some(360));
        assert!(reforms[0].known_to_player);
    }

    #[test]
    fn a_changed_authority_counts_as_a_reform() {
        let mut history = history_with_country(CountryId(0));
        history.begin_snapshot(0).unwrap();
        let config = ExtractorConfig::default();
        let ctx = PassContext::new(&config, "game", 0, CountryId(0));
        let dict = country_dict("UNE", &["civic_beacon_of_liberty"]);
        extract_government(&mut history, &ctx, CountryId(0), &dict).unwrap();

        history.begin_snapshot(360).unwrap();
        let later = PassContext::new(&config, "game", 360, CountryId(0));
        let mut changed = country_dict("UNE", &["civic_beacon_of_liberty"]);
        if let Value::Map(entries) = &mut changed
            && let Some(Value::Map(gov)) = entries.get_mut("government")
        {
            gov.insert("authority".to_string(), Value::from("auth_dictatorial"));
        }
        extract_government(&mut history, &later, CountryId(0), &changed).unwrap();

        assert_eq!(history.governments(CountryId(0)).count(), 2);
        assert_eq!(
            history
                .events()
                .iter()
                .filter(|e| e.event_type == EventType::GovernmentReform)
                .count(),
            1
        );
    }
}
