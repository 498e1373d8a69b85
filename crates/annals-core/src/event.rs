//! The historical event catalog.
//!
//! Every notable fact the extractor derives from a snapshot becomes a
//! [`HistoricalEvent`]: some are points in time (a battle), some are
//! intervals whose end is pushed forward while the condition persists (a
//! rivalry, a ruler's tenure). Which optional references are set depends
//! entirely on the event type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::country::CountryId;
use crate::faction::FactionId;
use crate::galaxy::{PlanetId, SystemId};
use crate::leader::LeaderId;
use crate::store::DescriptionId;
use crate::war::WarId;

/// Everything that can happen in a game's recorded history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A country charted a system for the first time.
    DiscoveredNewSystem,
    /// A country changed its government composition.
    GovernmentReform,
    /// The country declared a rivalry.
    SentRivalry,
    /// The country was declared a rival.
    ReceivedRivalry,
    /// The country closed its borders to another.
    ClosedBorders,
    /// Another country closed its borders to this one.
    ReceivedClosedBorders,
    /// A mutual defensive pact held.
    DefensivePact,
    /// Shared federation membership held.
    FormedFederation,
    /// A non-aggression pact held.
    NonAggressionPact,
    /// Communications were established.
    FirstContact,
    /// A commercial pact held.
    CommercialPact,
    /// The country joined a war.
    War,
    /// The country came out of a war.
    Peace,
    /// A leader died or disappeared from the roster.
    LeaderDied,
    /// A leader was recruited.
    LeaderRecruited,
    /// A leader gained a skill level.
    LevelUp,
    /// A technology was researched (interval covers the research period).
    ResearchedTechnology,
    /// A scientist led one of the research areas.
    ResearchLeader,
    /// A ruler's tenure.
    RuledEmpire,
    /// The capital moved to a different planet.
    CapitalRelocation,
    /// A tradition was adopted.
    Tradition,
    /// An ascension perk was taken.
    AscensionPerk,
    /// An edict was in force until its recorded expiry.
    Edict,
    /// A new political faction formed.
    NewFaction,
    /// A leader headed a political faction.
    FactionLeader,
    /// A planet was colonized (interval covers the colonization).
    Colonization,
    /// A planet was terraformed toward a target class.
    Terraforming,
    /// A habitat or ringworld section became habitable.
    HabitatRingworldConstruction,
    /// A governor administered a sector.
    GovernedSector,
    /// A country claimed a previously unheld system.
    ExpandedToSystem,
    /// A country took a system from another.
    GainedSystem,
    /// A country lost a system to another.
    LostSystem,
    /// A fleet battle.
    FleetCombat,
    /// A ground battle.
    ArmyCombat,
}

impl EventType {
    /// The snake_case name used in serialized histories.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiscoveredNewSystem => "discovered_new_system",
            Self::GovernmentReform => "government_reform",
            Self::SentRivalry => "sent_rivalry",
            Self::ReceivedRivalry => "received_rivalry",
            Self::ClosedBorders => "closed_borders",
            Self::ReceivedClosedBorders => "received_closed_borders",
            Self::DefensivePact => "defensive_pact",
            Self::FormedFederation => "formed_federation",
            Self::NonAggressionPact => "non_aggression_pact",
            Self::FirstContact => "first_contact",
            Self::CommercialPact => "commercial_pact",
            Self::War => "war",
            Self::Peace => "peace",
            Self::LeaderDied => "leader_died",
            Self::LeaderRecruited => "leader_recruited",
            Self::LevelUp => "level_up",
            Self::ResearchedTechnology => "researched_technology",
            Self::ResearchLeader => "research_leader",
            Self::RuledEmpire => "ruled_empire",
            Self::CapitalRelocation => "capital_relocation",
            Self::Tradition => "tradition",
            Self::AscensionPerk => "ascension_perk",
            Self::Edict => "edict",
            Self::NewFaction => "new_faction",
            Self::FactionLeader => "faction_leader",
            Self::Colonization => "colonization",
            Self::Terraforming => "terraforming",
            Self::HabitatRingworldConstruction => "habitat_ringworld_construction",
            Self::GovernedSector => "governed_sector",
            Self::ExpandedToSystem => "expanded_to_system",
            Self::GainedSystem => "gained_system",
            Self::LostSystem => "lost_system",
            Self::FleetCombat => "fleet_combat",
            Self::ArmyCombat => "army_combat",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a game's historical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    /// What happened.
    pub event_type: EventType,
    /// The acting country. Battles have none; they belong to the war.
    pub country: Option<CountryId>,
    /// The other country, for bilateral events.
    pub target_country: Option<CountryId>,
    /// The leader involved, e.g. the ruler who signed or the governor.
    pub leader: Option<LeaderId>,
    /// The system involved.
    pub system: Option<SystemId>,
    /// The planet involved.
    pub planet: Option<PlanetId>,
    /// The faction involved.
    pub faction: Option<FactionId>,
    /// The war involved.
    pub war: Option<WarId>,
    /// Interned free text: a tech name, an edict name, a level, ...
    pub description: Option<DescriptionId>,
    /// Day the event happened or the interval began.
    pub start_day: i64,
    /// Final day of the interval, absent for pure point events.
    pub end_day: Option<i64>,
    /// Whether the player could plausibly have observed this event.
    /// Allowed to flip to true later, never back to false.
    pub known_to_player: bool,
}

impl HistoricalEvent {
    /// Create a point event with no references attached.
    pub fn new(
        event_type: EventType,
        country: CountryId,
        start_day: i64,
        known_to_player: bool,
    ) -> Self {
        Self {
            event_type,
            country: Some(country),
            target_country: None,
            leader: None,
            system: None,
            planet: None,
            faction: None,
            war: None,
            description: None,
            start_day,
            end_day: None,
            known_to_player,
        }
    }

    /// Create an event that is not attributed to any single country.
    pub fn unattributed(event_type: EventType, start_day: i64, known_to_player: bool) -> Self {
        Self {
            country: None,
            ..Self::new(event_type, CountryId(0), start_day, known_to_player)
        }
    }

    /// Attach the other country of a bilateral event.
    pub fn with_target(mut self, target: CountryId) -> Self {
        self.target_country = Some(target);
        self
    }

    /// Attach the leader involved, if one was resolved.
    pub fn with_leader(mut self, leader: Option<LeaderId>) -> Self {
        self.leader = leader;
        self
    }

    /// Attach the system involved.
    pub fn with_system(mut self, system: SystemId) -> Self {
        self.system = Some(system);
        self
    }

    /// Attach the planet involved.
    pub fn with_planet(mut self, planet: PlanetId) -> Self {
        self.planet = Some(planet);
        self
    }

    /// Attach the faction involved.
    pub fn with_faction(mut self, faction: FactionId) -> Self {
        self.faction = Some(faction);
        self
    }

    /// Attach the war involved.
    pub fn with_war(mut self, war: WarId) -> Self {
        self.war = Some(war);
        self
    }

    /// Attach interned descriptive text.
    pub fn with_description(mut self, description: DescriptionId) -> Self {
        self.description = Some(description);
        self
    }

    /// Give the event an interval end.
    pub fn with_end_day(mut self, end_day: i64) -> Self {
        self.end_day = Some(end_day);
        self
    }

    /// Push the interval end forward, never backward or before the start.
    ///
    /// A point event becomes an interval ending at `day`.
    pub fn extend_to(&mut self, day: i64) {
        let end = self.end_day.map_or(day, |e| e.max(day));
        self.end_day = Some(end.max(self.start_day));
    }

    /// Record that the player has (by now) observed this event.
    pub fn mark_known(&mut self) {
        self.known_to_player = true;
    }

    /// The last day the event covers: the interval end, or the start for
    /// point events.
    pub fn effective_end(&self) -> i64 {
        self.end_day.unwrap_or(self.start_day)
    }

    /// True if the interval was last observed within `window` days of `day`.
    ///
    /// This is the staleness test behind interval reconciliation: a fact
    /// closed longer ago than the window is history, and a fresh
    /// observation starts a new interval instead of stretching the old one.
    pub fn observed_within(&self, day: i64, window: i64) -> bool {
        self.effective_end() >= day - window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serialized_name() {
        for event_type in [
            EventType::DiscoveredNewSystem,
            EventType::GovernmentReform,
            EventType::HabitatRingworldConstruction,
            EventType::ArmyCombat,
        ] {
            let json = serde_json::to_string(&event_type).unwrap();
            assert_eq!(json, format!("\"{event_type}\""));
        }
    }

    #[test]
    fn extension_turns_point_into_interval() {
        let mut event = HistoricalEvent::new(EventType::SentRivalry, CountryId(1), 100, false);
        assert_eq!(event.effective_end(), 100);
        event.extend_to(460);
        assert_eq!(event.end_day, Some(460));
        event.extend_to(200);
        assert_eq!(event.end_day, Some(460), "extension must not move backward");
    }

    #[test]
    fn staleness_window_is_inclusive() {
        let event = HistoricalEvent::new(EventType::SentRivalry, CountryId(1), 100, false)
            .with_end_day(1000);
        assert!(event.observed_within(2800, 1800));
        assert!(!event.observed_within(2801, 1800));
    }

    #[test]
    fn builder_chain_attaches_references() {
        let event = HistoricalEvent::new(EventType::GainedSystem, CountryId(2), 500, true)
            .with_target(CountryId(7))
            .with_system(SystemId(31));
        assert_eq!(event.country, Some(CountryId(2)));
        assert_eq!(event.target_country, Some(CountryId(7)));
        assert_eq!(event.system, Some(SystemId(31)));
        assert_eq!(event.planet, None);
        assert_eq!(event.end_day, None);
    }

    #[test]
    fn unattributed_events_have_no_country() {
        let event = HistoricalEvent::unattributed(EventType::FleetCombat, 800, false)
            .with_war(WarId(3));
        assert_eq!(event.country, None);
        assert_eq!(event.war, Some(WarId(3)));
    }
}
