//! Political factions, including the synthetic buckets used for pops that
//! belong to no faction at all.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::country::CountryId;
use crate::store::DescriptionId;

/// In-game numeric id of a faction. The synthetic no-faction buckets use
/// fixed negative ids that can never collide with real factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(pub i64);

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pops that simply belong to no faction.
pub const NO_FACTION: FactionId = FactionId(-1);

/// Enslaved pops, which cannot join factions.
pub const NO_FACTION_ENSLAVED: FactionId = FactionId(-2);

/// Pops being purged.
pub const NO_FACTION_PURGE: FactionId = FactionId(-3);

/// Non-sentient robot pops.
pub const NO_FACTION_ROBOT: FactionId = FactionId(-4);

/// The synthetic faction ids with their display names and pseudo-ethics,
/// in the order they are created for each country.
pub const SYNTHETIC_FACTIONS: [(FactionId, &str, &str); 4] = [
    (NO_FACTION, "No faction", "no ethics"),
    (NO_FACTION_ENSLAVED, "No faction (enslaved)", "no ethics (enslaved)"),
    (NO_FACTION_PURGE, "No faction (purge)", "no ethics (purge)"),
    (NO_FACTION_ROBOT, "No faction (non-sentient robot)", "no ethics (robot)"),
];

/// A political faction within one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliticalFaction {
    /// In-game id, negative for the synthetic no-faction buckets.
    pub id: FactionId,
    /// The country the faction exists in.
    pub country: CountryId,
    /// Faction display name.
    pub name: String,
    /// Interned faction type, e.g. `prosperity`, or a pseudo-ethics label
    /// for the synthetic buckets.
    pub faction_type: DescriptionId,
}

impl FactionId {
    /// True for the synthetic no-faction buckets.
    pub fn is_synthetic(&self) -> bool {
        SYNTHETIC_FACTIONS.iter().any(|(id, _, _)| id == self)
    }
}
