//! Demographic aggregation of the player's pops.
//!
//! Individual pops are far too numerous to archive per snapshot, so this
//! pass tallies them into per-axis buckets (species, faction, planet,
//! job, stratum, ethos) and stores one aggregate row per non-empty
//! bucket. Only pops on planets owned by the player are counted.

use std::collections::BTreeMap;

use annals_core::GameHistory;
use annals_core::country::CountryId;
use annals_core::faction::{FactionId, NO_FACTION, NO_FACTION_ENSLAVED, NO_FACTION_ROBOT};
use annals_core::galaxy::PlanetId;
use annals_core::leader::{Species, SpeciesId};
use annals_core::pops::{PopAggregate, PopBucket};
use annals_core::store::DescriptionId;
use annals_save::Value;

use crate::session::{PassContext, table_entry};

/// Running sums for one bucket; divided by the pop count on emission.
#[derive(Debug, Default, Clone, Copy)]
struct BucketTotals {
    count: u32,
    crime: f64,
    happiness: f64,
    power: f64,
}

impl BucketTotals {
    fn add(&mut self, crime: f64, happiness: f64, power: f64) {
        self.count += 1;
        self.crime += crime;
        self.happiness += happiness;
        self.power += power;
    }

    fn aggregate(&self, country: CountryId, day: i64, bucket: PopBucket) -> PopAggregate {
        let count = f64::from(self.count);
        PopAggregate {
            country,
            day,
            bucket,
            pop_count: self.count,
            crime: self.crime / count,
            happiness: self.happiness / count,
            power: self.power / count,
        }
    }
}

/// Bucket the player's pops along every axis and store the per-bucket
/// means for the snapshot day.
pub(crate) fn extract_pop_aggregates(
    history: &mut GameHistory,
    ctx: &mut PassContext<'_>,
    gamestate: &Value,
) {
    let Some(pops) = gamestate.get("pop") else {
        return;
    };

    let mut by_species: BTreeMap<SpeciesId, BucketTotals> = BTreeMap::new();
    let mut by_faction: BTreeMap<FactionId, BucketTotals> = BTreeMap::new();
    let mut by_planet: BTreeMap<PlanetId, BucketTotals> = BTreeMap::new();
    let mut by_job: BTreeMap<DescriptionId, BucketTotals> = BTreeMap::new();
    let mut by_stratum: BTreeMap<DescriptionId, BucketTotals> = BTreeMap::new();
    let mut by_ethos: BTreeMap<DescriptionId, BucketTotals> = BTreeMap::new();

    for (_, pop_dict) in pops.entries_by_id() {
        if !pop_dict.is_map() {
            continue;
        }
        let Some(planet) = pop_dict.get("planet").and_then(Value::as_int).map(PlanetId) else {
            continue;
        };
        if ctx.planet_owner.get(&planet) != Some(&ctx.player) {
            continue;
        }

        let crime = pop_dict.get("crime").and_then(Value::as_f64).unwrap_or(0.0);
        let happiness = pop_dict
            .get("happiness")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let power = pop_dict.get("power").and_then(Value::as_f64).unwrap_or(0.0);

        // A pop without a species index cannot be bucketed by species,
        // but still counts along every other axis.
        if let Some(species) = pop_dict.get("species_index").and_then(Value::as_int) {
            by_species
                .entry(SpeciesId(species))
                .or_default()
                .add(crime, happiness, power);
        }

        let faction = faction_bucket(history, pop_dict);
        by_faction
            .entry(faction)
            .or_default()
            .add(crime, happiness, power);

        by_planet
            .entry(planet)
            .or_default()
            .add(crime, happiness, power);

        let job = pop_dict
            .get("job")
            .and_then(Value::as_str)
            .unwrap_or("unemployed");
        let job = history.intern(job);
        by_job.entry(job).or_default().add(crime, happiness, power);

        let stratum = pop_dict
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or("unknown stratum");
        let stratum = history.intern(stratum);
        by_stratum
            .entry(stratum)
            .or_default()
            .add(crime, happiness, power);

        // Pops torn between several ethics carry a list here; those fall
        // into the no-ethos bucket together with pops that have none.
        let ethos = pop_dict
            .get("ethos")
            .and_then(|ethos| ethos.get("ethic"))
            .and_then(Value::as_str)
            .unwrap_or("ethic_no_ethos");
        let ethos = history.intern(ethos);
        by_ethos
            .entry(ethos)
            .or_default()
            .add(crime, happiness, power);
    }

    for (species, totals) in by_species {
        if history.species(species).is_none() {
            tracing::debug!(
                species = species.0,
                "pop references a species the archive never saw; dropping the bucket"
            );
            continue;
        }
        let bucket = PopBucket::Species { species };
        history.add_pop_aggregate(totals.aggregate(ctx.player, ctx.now, bucket));
    }

    let faction_table = gamestate.get("pop_factions");
    for (faction, totals) in by_faction {
        if history.faction(ctx.player, faction).is_none() {
            continue;
        }
        let faction_dict = table_entry(faction_table, faction.0);
        let approval = faction_dict
            .and_then(|dict| dict.get("faction_approval"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let support = faction_dict
            .and_then(|dict| dict.get("support"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let bucket = PopBucket::Faction {
            faction,
            approval,
            support,
        };
        history.add_pop_aggregate(totals.aggregate(ctx.player, ctx.now, bucket));
    }

    let planet_table = gamestate.get("planet");
    for (planet, totals) in by_planet {
        let Some(planet_dict) = table_entry(planet_table, planet.0).filter(|dict| dict.is_map())
        else {
            continue;
        };
        if history.planet(planet).is_none() {
            tracing::warn!(
                planet = planet.0,
                "pops live on a planet the archive has not recorded; dropping the bucket"
            );
            ctx.warnings += 1;
            continue;
        }
        let bucket = PopBucket::Planet {
            planet,
            migration: planet_dict
                .get("migration")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            free_amenities: planet_dict
                .get("free_amenities")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            free_housing: planet_dict
                .get("free_housing")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            stability: planet_dict
                .get("stability")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
        };
        history.add_pop_aggregate(totals.aggregate(ctx.player, ctx.now, bucket));
    }

    for (job, totals) in by_job {
        let bucket = PopBucket::Job { job };
        history.add_pop_aggregate(totals.aggregate(ctx.player, ctx.now, bucket));
    }
    for (stratum, totals) in by_stratum {
        let bucket = PopBucket::Stratum { stratum };
        history.add_pop_aggregate(totals.aggregate(ctx.player, ctx.now, bucket));
    }
    for (ethos, totals) in by_ethos {
        let bucket = PopBucket::Ethos { ethos };
        history.add_pop_aggregate(totals.aggregate(ctx.player, ctx.now, bucket));
    }
}

/// The faction bucket a pop falls into. Pops without a faction are split
/// into synthetic buckets by why they lack one.
fn faction_bucket(history: &GameHistory, pop_dict: &Value) -> FactionId {
    if let Some(faction) = pop_dict.get("pop_faction").and_then(Value::as_int) {
        return FactionId(faction);
    }
    if pop_dict.get("enslaved").and_then(Value::as_yes_no) == Some(true) {
        return NO_FACTION_ENSLAVED;
    }
    let robotic = pop_dict
        .get("species_index")
        .and_then(Value::as_int)
        .and_then(|id| history.species(SpeciesId(id)))
        .is_some_and(Species::is_robotic);
    if robotic { NO_FACTION_ROBOT } else { NO_FACTION }
}
