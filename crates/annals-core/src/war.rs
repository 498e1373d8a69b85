//! Wars, their participants, and individual battles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::country::CountryId;
use crate::galaxy::{PlanetId, SystemId};

/// Store-assigned id of a war.
///
/// Wars are matched across snapshots by name, not by their in-game id, so
/// a long game can contain several distinct wars with the same name. The
/// store hands out its own ids to keep them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WarId(pub i64);

impl fmt::Display for WarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned id of a recorded battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatId(pub i64);

impl fmt::Display for CombatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a war ended, if it has.
///
/// A war starts in progress and moves to exactly one terminal outcome; the
/// store never lets a terminal outcome change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarOutcome {
    /// The war is still being fought.
    InProgress,
    /// The attacking side won.
    AttackerVictory,
    /// The defending side won.
    DefenderVictory,
    /// Settled with no winner.
    StatusQuo,
    /// The war vanished from the saves without a recorded resolution.
    Unknown,
}

impl WarOutcome {
    /// True for every outcome except [`WarOutcome::InProgress`].
    pub fn is_terminal(&self) -> bool {
        *self != Self::InProgress
    }
}

/// A war between two coalitions of countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct War {
    /// Store-assigned id.
    pub id: WarId,
    /// War display name.
    pub name: String,
    /// Day the war was declared.
    pub start_day: i64,
    /// Last day the war was observed, or the day it ended.
    pub end_day: i64,
    /// Current outcome.
    pub outcome: WarOutcome,
    /// Accumulated war exhaustion of the attacking side.
    pub attacker_exhaustion: f64,
    /// Accumulated war exhaustion of the defending side.
    pub defender_exhaustion: f64,
}

impl War {
    /// Push the war's observed end forward while it is still listed.
    pub fn advance_to(&mut self, day: i64) {
        self.end_day = self.end_day.max(day).max(self.start_day);
    }

    /// Resolve the war with a terminal outcome at the given day.
    ///
    /// Returns false without changing anything if the war already has a
    /// terminal outcome. The end day may move backward here: a truce
    /// records the day the fighting actually stopped, which can pre-date
    /// the last snapshot that still listed the war.
    pub fn resolve(&mut self, outcome: WarOutcome, end_day: i64) -> bool {
        if self.outcome.is_terminal() || !outcome.is_terminal() {
            return false;
        }
        self.outcome = outcome;
        self.end_day = end_day.max(self.start_day);
        true
    }
}

/// One country's participation in a war.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarParticipant {
    /// The war.
    pub war: WarId,
    /// The participating country.
    pub country: CountryId,
    /// True for the attacking coalition.
    pub is_attacker: bool,
    /// The participant's war goal; defenders often have none at first and
    /// get it backfilled when the save starts reporting one.
    pub war_goal: Option<String>,
}

/// What kind of forces fought a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatType {
    /// Fleet engagement.
    Ships,
    /// Ground invasion.
    Armies,
    /// Anything the save did not classify.
    Other,
}

impl CombatType {
    /// Parse a battle type word from a save file; unrecognized words map
    /// to [`CombatType::Other`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "ships" => Self::Ships,
            "armies" => Self::Armies,
            _ => Self::Other,
        }
    }
}

/// One battle within a war.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combat {
    /// Store-assigned id.
    pub id: CombatId,
    /// The war this battle belongs to.
    pub war: WarId,
    /// The system the battle took place in, when known.
    pub system: Option<SystemId>,
    /// The planet, for ground battles.
    pub planet: Option<PlanetId>,
    /// Kind of engagement.
    pub combat_type: CombatType,
    /// True if the attacking side won.
    pub attacker_victory: bool,
    /// War exhaustion inflicted on the attacker.
    pub attacker_exhaustion: f64,
    /// War exhaustion inflicted on the defender.
    pub defender_exhaustion: f64,
    /// Day of the battle.
    pub day: i64,
}

impl Combat {
    /// True if the other record describes the same engagement.
    ///
    /// Saves list a war's battles cumulatively, so every snapshot repeats
    /// the ones already recorded; everything except the store id and the
    /// date identifies a battle.
    pub fn same_engagement(&self, other: &Combat) -> bool {
        self.war == other.war
            && self.system == other.system
            && self.planet == other.planet
            && self.combat_type == other.combat_type
            && self.attacker_victory == other.attacker_victory
            && self.attacker_exhaustion == other.attacker_exhaustion
            && self.defender_exhaustion == other.defender_exhaustion
    }
}

/// One country's side in a recorded battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatParticipant {
    /// The battle.
    pub combat: CombatId,
    /// The participating country.
    pub country: CountryId,
    /// True for the attacking side of the battle.
    pub is_attacker: bool,
}
