//! Countries, their per-snapshot metrics, and the attitude ladder that
//! gates what the player could plausibly know about them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::galaxy::PlanetId;
use crate::store::DescriptionId;

/// In-game numeric id of a country, stable for the lifetime of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CountryId(pub i64);

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A country's AI attitude toward the player.
///
/// Variants are ordered by increasing openness toward the player, so the
/// `reveals_*` predicates are ordinal thresholds. The information they gate
/// nests: demographic info implies economy info implies technology info
/// implies the country being known at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attitude {
    /// No attitude recorded; the country has not been observed.
    #[default]
    Unknown,
    /// Openly resentful.
    Angry,
    /// Considers itself superior.
    Arrogant,
    /// Spoiling for a fight.
    Belligerent,
    /// A subject chafing under its overlord.
    Disloyal,
    /// Demands submission.
    Domineering,
    /// Afraid of the player.
    Fearful,
    /// Openly hostile.
    Hostile,
    /// A fallen empire looking down on everyone.
    Imperious,
    /// Declared rival.
    Rival,
    /// Distrustful of the player's motives.
    Suspicious,
    /// Feels threatened by the player's power.
    Threatened,
    /// Generally negative disposition.
    Unfriendly,
    /// Keeping its distance.
    Wary,
    /// Barely acknowledges the player.
    Dismissive,
    /// No particular disposition either way.
    Neutral,
    /// Condescending but not unfriendly.
    Patronizing,
    /// Open to diplomacy.
    Receptive,
    /// On good terms.
    Cordial,
    /// A fallen empire that tolerates the player as a ward.
    Custodial,
    /// An overlord content with its subject.
    Overlord,
    /// Actively friendly.
    Friendly,
    /// A subject happy with its overlord.
    Loyal,
    /// Sworn protector.
    Protective,
    /// The player country itself.
    IsPlayer,
}

impl Attitude {
    /// Parse an attitude word as it appears in a save file.
    ///
    /// Anything unrecognized maps to [`Attitude::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "angry" => Self::Angry,
            "arrogant" => Self::Arrogant,
            "belligerent" => Self::Belligerent,
            "disloyal" => Self::Disloyal,
            "domineering" => Self::Domineering,
            "fearful" => Self::Fearful,
            "hostile" => Self::Hostile,
            "imperious" => Self::Imperious,
            "rival" => Self::Rival,
            "suspicious" => Self::Suspicious,
            "threatened" => Self::Threatened,
            "unfriendly" => Self::Unfriendly,
            "wary" => Self::Wary,
            "dismissive" => Self::Dismissive,
            "neutral" => Self::Neutral,
            "patronizing" => Self::Patronizing,
            "receptive" => Self::Receptive,
            "cordial" => Self::Cordial,
            "custodial" => Self::Custodial,
            "overlord" => Self::Overlord,
            "friendly" => Self::Friendly,
            "loyal" => Self::Loyal,
            "protective" => Self::Protective,
            _ => Self::Unknown,
        }
    }

    /// True if the country has been observed at all.
    pub fn is_known(&self) -> bool {
        *self != Self::Unknown
    }

    /// True if the player would know this country's research standing.
    pub fn reveals_technology_info(&self) -> bool {
        *self >= Self::Dismissive
    }

    /// True if the player would know this country's internal economy.
    pub fn reveals_economy_info(&self) -> bool {
        *self >= Self::Cordial
    }

    /// True if the player would know this country's population and leaders.
    pub fn reveals_demographic_info(&self) -> bool {
        *self >= Self::Friendly
    }
}

/// A long-lived country record, created on first sight and updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// In-game id.
    pub id: CountryId,
    /// Current display name; kept up to date across snapshots.
    pub name: String,
    /// Raw country type, e.g. `default` or `fallen_empire`.
    pub country_type: String,
    /// True for the single designated player country of a game.
    pub is_player: bool,
    /// Day the player first established communications, set at most once.
    pub first_contact_day: Option<i64>,
    /// Current capital planet, if one is recorded.
    pub capital: Option<PlanetId>,
}

impl Country {
    /// Create a country record with no player contact and no capital.
    pub fn new(id: CountryId, name: impl Into<String>, country_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            country_type: country_type.into(),
            is_player: false,
            first_contact_day: None,
            capital: None,
        }
    }

    /// Mark this country as the player, which counts as contact on day 0.
    pub fn as_player(mut self) -> Self {
        self.is_player = true;
        self.first_contact_day = Some(0);
        self
    }

    /// True once the player has either met this country or is it.
    pub fn has_met_player(&self) -> bool {
        self.is_player || self.first_contact_day.is_some()
    }

    /// Record the day communications were first established.
    ///
    /// The first recorded day wins; later calls are ignored.
    pub fn record_first_contact(&mut self, day: i64) {
        if self.first_contact_day.is_none() {
            self.first_contact_day = Some(day);
        }
    }

    /// True for country types whose history is fully tracked.
    ///
    /// Enclaves, marauders, leviathans and similar get an identity record
    /// only; their metrics and events are not worth extracting.
    pub fn tracks_full_history(&self) -> bool {
        matches!(
            self.country_type.as_str(),
            "default" | "fallen_empire" | "awakened_fallen_empire"
        )
    }
}

/// An interval fact describing a country's form of government.
///
/// At most one interval per country is open at a time; a change in
/// composition closes the old interval and opens a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Government {
    /// The governed country.
    pub country: CountryId,
    /// First day this government was in place.
    pub start_day: i64,
    /// Last day this government was observed; pushed forward while it persists.
    pub end_day: i64,
    /// Government display name.
    pub name: String,
    /// Government type, e.g. a democracy variant; defaults to `other`.
    pub gov_type: String,
    /// Authority, e.g. dictatorial; defaults to `other`.
    pub authority: String,
    /// AI personality; defaults to `unknown_personality`.
    pub personality: String,
    /// The country's ethics at the time.
    pub ethics: BTreeSet<String>,
    /// The government's civics at the time.
    pub civics: BTreeSet<String>,
}

impl Government {
    /// Push the end of this interval forward, never backward or before start.
    pub fn extend_to(&mut self, day: i64) {
        self.end_day = self.end_day.max(day).max(self.start_day);
    }

    /// True if both describe the same government composition.
    ///
    /// Compares ethics, civics, authority, type and name; personality is
    /// cosmetic and does not constitute a reform.
    pub fn same_composition(&self, other: &Government) -> bool {
        self.ethics == other.ethics
            && self.civics == other.civics
            && self.authority == other.authority
            && self.gov_type == other.gov_type
            && self.name == other.name
    }
}

/// Flags describing a country's standing relative to the player, captured
/// per snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRelations {
    /// Declared rivalry in either direction.
    pub rivalry: bool,
    /// Mutual defensive pact.
    pub defensive_pact: bool,
    /// Shared federation membership.
    pub federation: bool,
    /// Non-aggression pact.
    pub non_aggression_pact: bool,
    /// Borders closed to the player.
    pub closed_borders: bool,
    /// Communications established.
    pub communications: bool,
    /// Migration treaty.
    pub migration_treaty: bool,
    /// Commercial pact.
    pub commercial_pact: bool,
    /// Active research agreement.
    pub research_agreement: bool,
    /// Active sensor link.
    pub sensor_link: bool,
    /// Shares a border with the player.
    pub neighbor: bool,
}

/// Net monthly flows for the ten core resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceFlows {
    /// Energy credits.
    pub energy: f64,
    /// Minerals.
    pub minerals: f64,
    /// Food.
    pub food: f64,
    /// Alloys.
    pub alloys: f64,
    /// Consumer goods.
    pub consumer_goods: f64,
    /// Unity.
    pub unity: f64,
    /// Influence.
    pub influence: f64,
    /// Physics research.
    pub physics_research: f64,
    /// Society research.
    pub society_research: f64,
    /// Engineering research.
    pub engineering_research: f64,
}

impl ResourceFlows {
    /// Add `amount` to the flow named by a save-file resource key.
    ///
    /// Returns false (and changes nothing) for resources outside the core
    /// ten, e.g. strategic resources.
    pub fn accumulate(&mut self, resource: &str, amount: f64) -> bool {
        let slot = match resource {
            "energy" => &mut self.energy,
            "minerals" => &mut self.minerals,
            "food" => &mut self.food,
            "alloys" => &mut self.alloys,
            "consumer_goods" => &mut self.consumer_goods,
            "unity" => &mut self.unity,
            "influence" => &mut self.influence,
            "physics_research" => &mut self.physics_research,
            "society_research" => &mut self.society_research,
            "engineering_research" => &mut self.engineering_research,
            _ => return false,
        };
        *slot += amount;
        true
    }

    /// Add every flow of `other` into this one.
    pub fn add(&mut self, other: &ResourceFlows) {
        self.energy += other.energy;
        self.minerals += other.minerals;
        self.food += other.food;
        self.alloys += other.alloys;
        self.consumer_goods += other.consumer_goods;
        self.unity += other.unity;
        self.influence += other.influence;
        self.physics_research += other.physics_research;
        self.society_research += other.society_research;
        self.engineering_research += other.engineering_research;
    }
}

/// Point-in-time metrics for one country at one snapshot day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryData {
    /// The measured country.
    pub country: CountryId,
    /// Snapshot day the metrics belong to.
    pub day: i64,
    /// Military power score.
    pub military_power: f64,
    /// Technology power score.
    pub tech_power: f64,
    /// Economy power score.
    pub economy_power: f64,
    /// Total fleet size.
    pub fleet_size: f64,
    /// Empire size (sprawl).
    pub empire_size: f64,
    /// Empire cohesion.
    pub empire_cohesion: f64,
    /// Number of researched technologies.
    pub tech_count: i64,
    /// Number of surveyed objects.
    pub exploration_progress: i64,
    /// Number of owned planets.
    pub owned_planets: i64,
    /// Number of controlled systems.
    pub controlled_systems: i64,
    /// Victory rank at this snapshot.
    pub victory_rank: i64,
    /// Victory score at this snapshot.
    pub victory_score: f64,
    /// Net monthly resource flows, summed over all budget line items.
    pub net_flows: ResourceFlows,
    /// Attitude toward the player at this snapshot.
    pub attitude: Attitude,
    /// Diplomatic standing relative to the player at this snapshot.
    pub relations: PlayerRelations,
}

impl CountryData {
    /// Create an all-zero metrics row for a country and day.
    pub fn new(country: CountryId, day: i64) -> Self {
        Self {
            country,
            day,
            military_power: 0.0,
            tech_power: 0.0,
            economy_power: 0.0,
            fleet_size: 0.0,
            empire_size: 0.0,
            empire_cohesion: 0.0,
            tech_count: 0,
            exploration_progress: 0,
            owned_planets: 0,
            controlled_systems: 0,
            victory_rank: 0,
            victory_score: 0.0,
            net_flows: ResourceFlows::default(),
            attitude: Attitude::Unknown,
            relations: PlayerRelations::default(),
        }
    }
}

/// One named line item of the player's monthly budget at one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    /// The budgeting country (the player).
    pub country: CountryId,
    /// Snapshot day.
    pub day: i64,
    /// Interned line item name, e.g. `ships` or `pop_factions`.
    pub name: DescriptionId,
    /// Core resource flows contributed by this line item.
    pub flows: ResourceFlows,
    /// Net volatile motes.
    pub volatile_motes: f64,
    /// Net exotic gases.
    pub exotic_gases: f64,
    /// Net rare crystals.
    pub rare_crystals: f64,
    /// Net living metal.
    pub living_metal: f64,
    /// Net zro.
    pub zro: f64,
    /// Net dark matter.
    pub dark_matter: f64,
    /// Net nanites.
    pub nanites: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attitude_ladder_nests() {
        for attitude in [
            Attitude::Unknown,
            Attitude::Hostile,
            Attitude::Wary,
            Attitude::Neutral,
            Attitude::Cordial,
            Attitude::Friendly,
            Attitude::IsPlayer,
        ] {
            if attitude.reveals_demographic_info() {
                assert!(attitude.reveals_economy_info(), "{attitude:?}");
            }
            if attitude.reveals_economy_info() {
                assert!(attitude.reveals_technology_info(), "{attitude:?}");
            }
            if attitude.reveals_technology_info() {
                assert!(attitude.is_known(), "{attitude:?}");
            }
        }
    }

    #[test]
    fn attitude_parses_save_words() {
        assert_eq!(Attitude::from_name("friendly"), Attitude::Friendly);
        assert_eq!(Attitude::from_name("wary"), Attitude::Wary);
        assert_eq!(Attitude::from_name("definitely_not_real"), Attitude::Unknown);
        assert!(!Attitude::from_name("hostile").reveals_technology_info());
        assert!(Attitude::from_name("neutral").reveals_technology_info());
        assert!(!Attitude::from_name("neutral").reveals_economy_info());
        assert!(Attitude::from_name("loyal").reveals_demographic_info());
    }

    #[test]
    fn first_contact_is_recorded_once() {
        let mut country = Country::new(CountryId(5), "Blorg Commonality", "default");
        assert!(!country.has_met_player());
        country.record_first_contact(400);
        country.record_first_contact(900);
        assert_eq!(country.first_contact_day, Some(400));
        assert!(country.has_met_player());
    }

    #[test]
    fn player_country_counts_as_met() {
        let country = Country::new(CountryId(0), "United Nations of Earth", "default").as_player();
        assert!(country.is_player);
        assert!(country.has_met_player());
        assert_eq!(country.first_contact_day, Some(0));
    }

    #[test]
    fn unsupported_country_types_are_identity_only() {
        assert!(Country::new(CountryId(1), "X", "default").tracks_full_history());
        assert!(Country::new(CountryId(2), "X", "fallen_empire").tracks_full_history());
        assert!(!Country::new(CountryId(3), "X", "enclave").tracks_full_history());
        assert!(!Country::new(CountryId(4), "X", "dormant_marauders").tracks_full_history());
    }

    #[test]
    fn government_reform_ignores_personality() {
        let base = Government {
            country: CountryId(0),
            start_day: 0,
            end_day: 10,
            name: "Earth Custodianship".to_string(),
            gov_type: "gov_democracy".to_string(),
            authority: "auth_democratic".to_string(),
            personality: "unknown_personality".to_string(),
            ethics: ["ethic_egalitarian", "ethic_xenophile"]
                .into_iter()
                .map(String::from)
                .collect(),
            civics: ["civic_beacon_of_liberty"].into_iter().map(String::from).collect(),
        };

        let mut same = base.clone();
        same.personality = "federation_builders".to_string();
        assert!(base.same_composition(&same));

        let mut reformed = base.clone();
        reformed.civics.insert("civic_idealistic_foundation".to_string());
        assert!(!base.same_composition(&reformed));

        let mut new_authority = base.clone();
        new_authority.authority = "auth_oligarchic".to_string();
        assert!(!base.same_composition(&new_authority));
    }

    #[test]
    fn government_extension_never_moves_backward() {
        let mut gov = Government {
            country: CountryId(0),
            start_day: 100,
            end_day: 200,
            name: String::new(),
            gov_type: String::new(),
            authority: String::new(),
            personality: String::new(),
            ethics: BTreeSet::new(),
            civics: BTreeSet::new(),
        };
        gov.extend_to(150);
        assert_eq!(gov.end_day, 200);
        gov.extend_to(360);
        assert_eq!(gov.end_day, 360);
    }

    #[test]
    fn resource_flows_accumulate_known_keys() {
        let mut flows = ResourceFlows::default();
        assert!(flows.accumulate("energy", 12.5));
        assert!(flows.accumulate("energy", -2.5));
        assert!(flows.accumulate("society_research", 3.0));
        assert!(!flows.accumulate("volatile_motes", 1.0));
        assert!((flows.energy - 10.0).abs() < f64::EPSILON);
        assert!((flows.society_research - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn country_data_serde_round_trip() {
        let mut data = CountryData::new(CountryId(3), 720);
        data.military_power = 1500.0;
        data.attitude = Attitude::Cordial;
        data.relations.communications = true;

        let json = serde_json::to_string(&data).unwrap();
        let back: CountryData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}
