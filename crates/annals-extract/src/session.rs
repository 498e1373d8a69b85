//! State shared by the passes over one snapshot.

use std::collections::{BTreeSet, HashMap};

use annals_core::country::CountryId;
use annals_core::galaxy::{PlanetId, SystemId};
use annals_save::Value;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::ExtractorConfig;
use crate::error::ValidationError;

/// Read the snapshot's in-game date.
pub(crate) fn snapshot_day(gamestate: &Value) -> Result<i64, ValidationError> {
    let text = gamestate
        .get("date")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingField("date"))?;
    Ok(annals_core::parse_date(text)?)
}

/// Identify the player country.
///
/// The gamestate lists one entry per human player. Only single-player
/// campaigns are ingested, so anything but exactly one distinct country
/// is rejected.
pub(crate) fn player_country(gamestate: &Value) -> Result<CountryId, ValidationError> {
    let mut candidates = BTreeSet::new();
    if let Some(players) = gamestate.get("player") {
        for entry in players.iter_coerced() {
            if let Some(id) = entry.get("country").and_then(Value::as_int) {
                candidates.insert(id);
            }
        }
    }
    let found = candidates.len();
    let mut ids = candidates.into_iter();
    match (ids.next(), ids.next()) {
        (Some(id), None) => Ok(CountryId(id)),
        _ => Err(ValidationError::AmbiguousPlayer { candidates: found }),
    }
}

/// Fetch an entry from an id-keyed gamestate table.
pub(crate) fn table_entry(table: Option<&Value>, id: i64) -> Option<&Value> {
    table?.get(&id.to_string())
}

/// Mutable state threaded through every pass over one snapshot.
pub(crate) struct PassContext<'a> {
    /// In-game day of the snapshot being ingested.
    pub(crate) now: i64,
    /// The player country of this campaign.
    pub(crate) player: CountryId,
    /// Extraction knobs.
    pub(crate) config: &'a ExtractorConfig,
    /// Deterministic noise source, seeded from the game name.
    pub(crate) rng: StdRng,
    /// Planet to owning country, rebuilt each snapshot.
    pub(crate) planet_owner: HashMap<PlanetId, CountryId>,
    /// Country to the systems inside its sectors.
    pub(crate) country_systems: HashMap<CountryId, BTreeSet<SystemId>>,
    /// Country to the planets it owns.
    pub(crate) country_planets: HashMap<CountryId, BTreeSet<PlanetId>>,
    /// Countries holding a research agreement with the player.
    pub(crate) research_agreements: BTreeSet<CountryId>,
    /// Countries sharing sensor data with the player.
    pub(crate) sensor_links: BTreeSet<CountryId>,
    /// Rows dropped because they referenced entities nothing recorded.
    pub(crate) warnings: usize,
}

impl<'a> PassContext<'a> {
    pub(crate) fn new(
        config: &'a ExtractorConfig,
        game_name: &str,
        now: i64,
        player: CountryId,
    ) -> Self {
        Self {
            now,
            player,
            config,
            rng: StdRng::seed_from_u64(seed_from_name(game_name)),
            planet_owner: HashMap::new(),
            country_systems: HashMap::new(),
            country_planets: HashMap::new(),
            research_agreements: BTreeSet::new(),
            sensor_links: BTreeSet::new(),
            warnings: 0,
        }
    }

    /// Whether per-day detail and events are recorded for this country.
    pub(crate) fn tracks_history_of(&self, country: CountryId) -> bool {
        !self.config.only_read_player_history || country == self.player
    }

    /// First day still considered fresh for interval facts.
    pub(crate) fn stale_before(&self) -> i64 {
        self.now - self.config.staleness_window_days
    }
}

/// Build the planet and sector-system ownership lookups used by later
/// passes. Countries whose entry is not a map get empty sets so lookups
/// still resolve.
pub(crate) fn build_ownership_indices(ctx: &mut PassContext<'_>, gamestate: &Value) {
    let Some(countries) = gamestate.get("country") else {
        return;
    };
    let sectors = gamestate.get("sectors");
    for (id, country_dict) in countries.entries_by_id() {
        let country = CountryId(id);
        let mut planets = BTreeSet::new();
        if let Some(owned) = country_dict.get("owned_planets") {
            for planet in owned.iter_coerced() {
                if let Some(planet_id) = planet.as_int() {
                    planets.insert(PlanetId(planet_id));
                }
            }
        }
        for planet in &planets {
            ctx.planet_owner.insert(*planet, country);
        }

        let mut systems = BTreeSet::new();
        if let Some(owned_sectors) = country_dict.get("owned_sectors").and_then(Value::as_list) {
            for sector_id in owned_sectors {
                let Some(sector) = sector_id.as_int().and_then(|sid| table_entry(sectors, sid))
                else {
                    continue;
                };
                if let Some(sector_systems) = sector.get("systems") {
                    for system in sector_systems.iter_coerced() {
                        if let Some(system_id) = system.as_int() {
                            systems.insert(SystemId(system_id));
                        }
                    }
                }
            }
        }
        ctx.country_planets.insert(country, planets);
        ctx.country_systems.insert(country, systems);
    }
}

/// Stable FNV-1a hash of the game name, so per-campaign jitter (leader
/// birth dates) is reproducible across runs and machines.
fn seed_from_name(name: &str) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for byte in name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
