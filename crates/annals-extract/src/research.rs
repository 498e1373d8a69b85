//! Research history: lead scientists and completed technologies.

use annals_core::country::CountryId;
use annals_core::event::{EventType, HistoricalEvent};
use annals_core::leader::LeaderId;
use annals_core::{GameHistory, StoreError};
use annals_save::Value;

use crate::session::PassContext;

/// The three research areas, with the capitalized display form used for
/// event descriptions.
const RESEARCH_AREAS: [(&str, &str); 3] = [
    ("physics", "Physics"),
    ("society", "Society"),
    ("engineering", "Engineering"),
];

/// Record who leads each research area and which technology tops its
/// queue.
///
/// A research-leader interval extends while the same scientist stays in
/// charge; under a different scientist the old interval simply stops
/// growing, and it resumes if that scientist returns. Completed
/// technologies are one-time events that keep their end day current
/// while the technology remains queued.
pub(crate) fn extract_tech_events(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    country_dict: &Value,
) -> Result<(), StoreError> {
    let Some(tech_status) = country_dict.get("tech_status") else {
        return Ok(());
    };
    if !tech_status.is_map() {
        return Ok(());
    }
    let reveals = history
        .latest_country_data(id)
        .is_some_and(|data| data.attitude.reveals_technology_info());

    for (area, display) in RESEARCH_AREAS {
        let scientist = tech_status
            .get_path(&["leaders", area])
            .and_then(Value::as_int)
            .map(LeaderId)
            .filter(|leader| history.leader(*leader).is_some());
        if let Some(scientist) = scientist {
            record_research_leader(history, ctx, id, scientist, display, reveals)?;
        }

        let queue_key = format!("{area}_queue");
        let Some(queue) = tech_status.get(&queue_key) else {
            continue;
        };
        let Some(progress) = queue.iter_coerced().next() else {
            continue;
        };
        let Some(tech_name) = progress.get("technology").and_then(Value::as_str) else {
            continue;
        };
        let tech_name = tech_name.to_string();
        let description = history.intern(&tech_name);
        if let Some(event) = history.latest_event_mut(|event| {
            event.event_type == EventType::ResearchedTechnology
                && event.country == Some(id)
                && event.description == Some(description)
        }) {
            event.extend_to(ctx.now);
        } else {
            let start_day = progress
                .get("date")
                .and_then(Value::as_str)
                .and_then(|text| annals_core::parse_date(text).ok())
                .unwrap_or(ctx.now);
            history.record_event(
                HistoricalEvent::new(EventType::ResearchedTechnology, id, start_day, reveals)
                    .with_leader(scientist)
                    .with_description(description)
                    .with_end_day(ctx.now.max(start_day)),
            )?;
        }
    }
    Ok(())
}

fn record_research_leader(
    history: &mut GameHistory,
    ctx: &PassContext<'_>,
    id: CountryId,
    scientist: LeaderId,
    display: &str,
    reveals: bool,
) -> Result<(), StoreError> {
    let description = history.intern(display);
    let latest = history.latest_event_mut(|event| {
        event.event_type == EventType::ResearchLeader
            && event.country == Some(id)
            && event.description == Some(description)
    });
    match latest {
        Some(event) if event.leader == Some(scientist) => {
            event.extend_to(ctx.now);
            Ok(())
        }
        // A different scientist leaves the old interval as it stands; the
        // handover itself is not worth an event.
        Some(_) => Ok(()),
        None => history.record_event(
            HistoricalEvent::new(EventType::ResearchLeader, id, ctx.now, reveals)
                .with_leader(Some(scientist))
                .with_description(description)
                .with_end_day(ctx.now),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use annals_core::GameMeta;
    use annals_core::country::Country;
    use annals_core::leader::Leader;

    fn leader(id: i64, country: CountryId) -> Leader {
        Leader {
            id: LeaderId(id),
            country,
            name: format!("Scientist {id}"),
            leader_class: "scientist".to_string(),
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

    fn tech_dict(scientist: i64, technology: &str) -> Value {
        Value::map([(
            "tech_status",
            Value::map([
                ("leaders", Value::map([("physics", Value::from(scientist))])),
                (
                    "physics_queue",
                    Value::list([Value::map([
                        ("technology", Value::from(technology)),
                        ("date", Value::from("2200.06.01")),
                    ])]),
                ),
            ]),
        )])
    }

    fn prepared() -> GameHistory {
        let mut history = GameHistory::new(GameMeta::new("game", "UNE"));
        history.add_country(Country::new(CountryId(0), "UNE", "default").as_player());
        history.add_leader(leader(5, CountryId(0)));
        history.add_leader(leader(6, CountryId(0)));
        history
    }

    #[test]
    fn research_leadership_extends_while_the_scientist_stays() {
        let mut history = prepared();
        history.begin_snapshot(200).unwrap();
        let config = ExtractorConfig::default();
        let ctx = PassContext::new(&config, "game", 200, CountryId(0));
        extract_tech_events(&mut history, &ctx, CountryId(0), &tech_dict(5, "tech_lasers_1"))
            .unwrap();

        history.begin_snapshot(300).unwrap();
        let later = PassContext::new(&config, "game", 300, CountryId(0));
        extract_tech_events(&mut history, &later, CountryId(0), &tech_dict(5, "tech_lasers_1"))
            .unwrap();

        let leads: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::ResearchLeader)
            .collect();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].start_day, 200);
        assert_eq!(leads[0].end_day, Some(300));
    }

    #[test]
    fn a_handover_freezes_the_old_interval() {
        let mut history = prepared();
        history.begin_snapshot(200).unwrap();
        let config = ExtractorConfig::default();
        let ctx = PassContext::new(&config, "game", 200, CountryId(0));
        extract_tech_events(&mut history, &ctx, CountryId(0), &tech_dict(5, "tech_lasers_1"))
            .unwrap();

        // Handover: the old interval stops growing and no new one opens.
        history.begin_snapshot(300).unwrap();
        let later = PassContext::new(&config, "game", 300, CountryId(0));
        extract_tech_events(&mut history, &later, CountryId(0), &tech_dict(6, "tech_lasers_1"))
            .unwrap();

        let leads: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::ResearchLeader)
            .collect();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].end_day, Some(200));
        assert_eq!(leads[0].leader, Some(LeaderId(5)));
    }

    #[test]
    fn completed_technology_is_recorded_once_and_extended() {
        let mut history = prepared();
        history.begin_snapshot(200).unwrap();
        let config = ExtractorConfig::default();
        let ctx = PassContext::new(&config, "game", 200, CountryId(0));
        extract_tech_events(&mut history, &ctx, CountryId(0), &tech_dict(5, "tech_shields_1"))
            .unwrap();

        history.begin_snapshot(260).unwrap();
        let later = PassContext::new(&config, "game", 260, CountryId(0));
        extract_tech_events(&mut history, &later, CountryId(0), &tech_dict(5, "tech_shields_1"))
            .unwrap();

        let techs: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.event_type == EventType::ResearchedTechnology)
            .collect();
        assert_eq!(techs.len(), 1);
        // Queue progress carries its own start date: 2200.06.01 is day 150.
        assert_eq!(techs[0].start_day, 150);
        assert_eq!(techs[0].end_day, Some(260));
    }
}
