//! Galaxy topology: systems, hyperlanes, planets, and the record of which
//! country held each system over time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::country::CountryId;

/// In-game numeric id of a star system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SystemId(pub i64);

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// In-game numeric id of a planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanetId(pub i64);

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A star system. Created once; the name may change as it is surveyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct System {
    /// In-game id.
    pub id: SystemId,
    /// Current system name.
    pub name: String,
    /// Star class, `Unknown` when the save does not record one.
    pub star_class: String,
    /// Galactic map x coordinate.
    pub coordinate_x: f64,
    /// Galactic map y coordinate.
    pub coordinate_y: f64,
}

/// An undirected hyperlane between two systems, recorded once per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperLane {
    /// One endpoint.
    pub a: SystemId,
    /// The other endpoint.
    pub b: SystemId,
}

impl HyperLane {
    /// True if this lane connects the same pair of systems, in either order.
    pub fn connects_same_pair(&self, other: &HyperLane) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

/// A planet worth tracking: colonizable, destroyed, or a terraforming
/// candidate. Name and class are kept up to date across snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// In-game id.
    pub id: PlanetId,
    /// The system the planet belongs to.
    pub system: SystemId,
    /// Current planet name.
    pub name: String,
    /// Current planet class, e.g. `pc_continental`.
    pub planet_class: String,
    /// Day the planet's colonization completed, once known.
    pub colonized_day: Option<i64>,
}

/// An interval fact recording which country held a system.
///
/// The latest interval per system is extended while the holder persists; a
/// change of holder closes it and opens a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemOwnership {
    /// The held system.
    pub system: SystemId,
    /// The holding country.
    pub owner: CountryId,
    /// First day of the holding.
    pub start_day: i64,
    /// Last day the holding was observed.
    pub end_day: i64,
}

impl SystemOwnership {
    /// Push the end of this interval forward, never backward or before start.
    pub fn extend_to(&mut self, day: i64) {
        self.end_day = self.end_day.max(day).max(self.start_day);
    }
}
