//! Leaders and the species they belong to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::country::CountryId;
use crate::store::DescriptionId;

/// In-game numeric id of a leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeaderId(pub i64);

impl fmt::Display for LeaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id of a species. Saves identify species by their position in the
/// top-level species list, so this is a list index rather than a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(pub i64);

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A species, captured once on first sight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// Save-file species index.
    pub id: SpeciesId,
    /// Species name.
    pub name: String,
    /// Species class, e.g. `MAM` or `ROBOT`.
    pub species_class: String,
    /// The species this one was genetically modified from, if any.
    pub parent: Option<SpeciesId>,
    /// Interned trait names.
    pub traits: Vec<DescriptionId>,
}

impl Species {
    /// True for non-sentient robot species, which get their own pop bucket.
    pub fn is_robotic(&self) -> bool {
        self.species_class == "ROBOT"
    }
}

/// A leader: scientist, admiral, governor, ruler, and so on.
///
/// Leader records are never deleted; a leader that disappears from its
/// country's roster is deactivated instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    /// In-game id.
    pub id: LeaderId,
    /// The country that recruited the leader.
    pub country: CountryId,
    /// Full display name.
    pub name: String,
    /// Leader class; for rulers, the class held before taking the throne.
    pub leader_class: String,
    /// Gender as recorded in the save, `Other` when absent.
    pub gender: String,
    /// The leader's agenda, if any.
    pub agenda: Option<String>,
    /// The leader's species, when one could be resolved.
    pub species: Option<SpeciesId>,
    /// Day the leader was recruited (never after the snapshot that first saw them).
    pub recruited_day: i64,
    /// Estimated day of birth, derived from age with a small cosmetic jitter.
    pub birth_day: i64,
    /// Last snapshot day the leader appeared on its country's roster.
    pub last_seen_day: i64,
    /// Last recorded skill level.
    pub last_level: i64,
    /// False once the leader has died or otherwise left the roster.
    pub is_active: bool,
}
