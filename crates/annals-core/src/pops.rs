//! Aggregated demographics.
//!
//! Per-pop rows in a snapshot are far too numerous to keep, so the
//! extractor buckets the player's pops along several axes and stores one
//! [`PopAggregate`] per non-empty bucket per snapshot day.

use serde::{Deserialize, Serialize};

use crate::country::CountryId;
use crate::faction::FactionId;
use crate::galaxy::PlanetId;
use crate::leader::SpeciesId;
use crate::store::DescriptionId;

/// The axis a demographic aggregate was bucketed along, with the
/// per-axis statistics that only make sense there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopBucket {
    /// Pops of one species.
    Species {
        /// The species the pops belong to.
        species: SpeciesId,
    },
    /// Pops backing one political faction.
    Faction {
        /// The faction the pops support.
        faction: FactionId,
        /// Mean faction approval across the bucket.
        approval: f64,
        /// Mean faction support across the bucket.
        support: f64,
    },
    /// Pops working one job.
    Job {
        /// Interned job name.
        job: DescriptionId,
    },
    /// Pops of one social stratum.
    Stratum {
        /// Interned stratum name.
        stratum: DescriptionId,
    },
    /// Pops holding one ethos.
    Ethos {
        /// Interned ethic name.
        ethos: DescriptionId,
    },
    /// Pops living on one planet.
    Planet {
        /// The planet the pops live on.
        planet: PlanetId,
        /// Mean emigration push across the planet's pops.
        migration: f64,
        /// Free amenities on the planet.
        free_amenities: f64,
        /// Free housing on the planet.
        free_housing: f64,
        /// Planet stability.
        stability: f64,
    },
}

/// One demographic bucket of one country on one snapshot day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopAggregate {
    /// The country the pops belong to.
    pub country: CountryId,
    /// Snapshot day the bucket was computed for.
    pub day: i64,
    /// Which axis and bucket this row aggregates.
    pub bucket: PopBucket,
    /// Number of pops in the bucket.
    pub pop_count: u32,
    /// Mean crime across the bucket.
    pub crime: f64,
    /// Mean happiness across the bucket.
    pub happiness: f64,
    /// Mean political power across the bucket.
    pub power: f64,
}

impl PopAggregate {
    /// Create an empty aggregate for a bucket; statistics start at zero.
    pub fn new(country: CountryId, day: i64, bucket: PopBucket) -> Self {
        Self {
            country,
            day,
            bucket,
            pop_count: 0,
            crime: 0.0,
            happiness: 0.0,
            power: 0.0,
        }
    }

    /// True if no pops fell into the bucket. Empty buckets are dropped
    /// rather than stored.
    pub fn is_empty(&self) -> bool {
        self.pop_count == 0
    }
}
