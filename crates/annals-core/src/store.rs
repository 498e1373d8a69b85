//! Per-game history storage.
//!
//! [`GameHistory`] holds the full normalized record of one game: every
//! table the extractor writes, behind methods that keep the cross-table
//! invariants intact. [`HistoryStore`] is the thread-safe registry of all
//! tracked games and provides all-or-nothing ingestion via
//! [`HistoryStore::transact`].

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::country::{BudgetItem, Country, CountryData, CountryId, Government};
use crate::error::{StoreError, StoreResult};
use crate::event::HistoricalEvent;
use crate::faction::{FactionId, PoliticalFaction, SYNTHETIC_FACTIONS};
use crate::galaxy::{HyperLane, Planet, PlanetId, System, SystemId, SystemOwnership};
use crate::leader::{Leader, LeaderId, Species, SpeciesId};
use crate::pops::PopAggregate;
use crate::war::{Combat, CombatId, CombatParticipant, War, WarId, WarParticipant};

/// Id of a piece of interned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DescriptionId(pub i64);

impl fmt::Display for DescriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free text (a technology name, a job, an edict) stored once and
/// referenced by id from events, factions, budgets and aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDescription {
    /// Id assigned when the text was first interned.
    pub id: DescriptionId,
    /// The interned text.
    pub text: String,
}

/// Identity and bookkeeping for one tracked game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMeta {
    /// Save-file identity of the game, stable across sessions.
    pub name: String,
    /// Name of the empire the player controls.
    pub player_country_name: String,
    /// When this history was created.
    pub created_at: DateTime<Utc>,
    /// When a snapshot was last ingested.
    pub updated_at: DateTime<Utc>,
}

impl GameMeta {
    /// Metadata for a game seen for the first time.
    pub fn new(name: impl Into<String>, player_country_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            player_country_name: player_country_name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One ingested save snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// In-game day of the snapshot.
    pub day: i64,
    /// Wall-clock time the snapshot was ingested.
    pub ingested_at: DateTime<Utc>,
}

/// The full normalized history of one game.
///
/// All tables are private; mutation goes through methods that maintain
/// referential integrity, interval ordering and snapshot-day monotonicity.
/// Save-assigned ids (countries, leaders, systems, ...) key their tables
/// directly; wars, battles and descriptions carry store-assigned ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameHistory {
    meta: GameMeta,
    snapshots: BTreeMap<i64, Snapshot>,
    countries: BTreeMap<CountryId, Country>,
    country_data: Vec<CountryData>,
    budget_items: Vec<BudgetItem>,
    governments: Vec<Government>,
    leaders: BTreeMap<LeaderId, Leader>,
    species: BTreeMap<SpeciesId, Species>,
    factions: Vec<PoliticalFaction>,
    systems: BTreeMap<SystemId, System>,
    planets: BTreeMap<PlanetId, Planet>,
    hyperlanes: Vec<HyperLane>,
    ownerships: Vec<SystemOwnership>,
    wars: BTreeMap<WarId, War>,
    war_participants: Vec<WarParticipant>,
    combats: Vec<Combat>,
    combat_participants: Vec<CombatParticipant>,
    events: Vec<HistoricalEvent>,
    pop_aggregates: Vec<PopAggregate>,
    descriptions: BTreeMap<DescriptionId, SharedDescription>,
    description_ids: HashMap<String, DescriptionId>,
    next_war: i64,
    next_combat: i64,
    next_description: i64,
}

impl GameHistory {
    /// Create an empty history for the given game.
    pub fn new(meta: GameMeta) -> Self {
        Self {
            meta,
            snapshots: BTreeMap::new(),
            countries: BTreeMap::new(),
            country_data: Vec::new(),
            budget_items: Vec::new(),
            governments: Vec::new(),
            leaders: BTreeMap::new(),
            species: BTreeMap::new(),
            factions: Vec::new(),
            systems: BTreeMap::new(),
            planets: BTreeMap::new(),
            hyperlanes: Vec::new(),
            ownerships: Vec::new(),
            wars: BTreeMap::new(),
            war_participants: Vec::new(),
            combats: Vec::new(),
            combat_participants: Vec::new(),
            events: Vec::new(),
            pop_aggregates: Vec::new(),
            descriptions: BTreeMap::new(),
            description_ids: HashMap::new(),
            next_war: 0,
            next_combat: 0,
            next_description: 0,
        }
    }

    /// Identity and bookkeeping of this game.
    pub fn meta(&self) -> &GameMeta {
        &self.meta
    }

    // ---- Snapshots ----

    /// Start recording a snapshot for `day`.
    ///
    /// Days must arrive in order: a day earlier than the latest recorded
    /// one is rejected, unless it is exactly a day already recorded. In
    /// that case the old snapshot is replaced and its per-day rows
    /// (country metrics, budgets, demographics) are dropped first, so
    /// re-processing the same save is idempotent. Events and intervals
    /// survive a replacement.
    pub fn begin_snapshot(&mut self, day: i64) -> StoreResult<()> {
        if let Some((&latest, _)) = self.snapshots.last_key_value()
            && day < latest
            && !self.snapshots.contains_key(&day)
        {
            return Err(StoreError::DayRegression { day, latest });
        }
        if self.snapshots.remove(&day).is_some() {
            self.country_data.retain(|row| row.day != day);
            self.budget_items.retain(|row| row.day != day);
            self.pop_aggregates.retain(|row| row.day != day);
        }
        let now = Utc::now();
        self.snapshots.insert(
            day,
            Snapshot {
                day,
                ingested_at: now,
            },
        );
        self.meta.updated_at = now;
        Ok(())
    }

    /// The most recent snapshot day, if any snapshot was recorded.
    pub fn last_day(&self) -> Option<i64> {
        self.snapshots.last_key_value().map(|(&day, _)| day)
    }

    /// All recorded snapshot days, ascending.
    pub fn snapshot_days(&self) -> impl Iterator<Item = i64> + '_ {
        self.snapshots.keys().copied()
    }

    /// True if a snapshot for `day` has been recorded.
    pub fn has_snapshot(&self, day: i64) -> bool {
        self.snapshots.contains_key(&day)
    }

    // ---- Countries ----

    /// Insert or replace a country row.
    pub fn add_country(&mut self, country: Country) {
        self.countries.insert(country.id, country);
    }

    /// Look up a country.
    pub fn country(&self, id: CountryId) -> Option<&Country> {
        self.countries.get(&id)
    }

    /// Look up a country for mutation.
    pub fn country_mut(&mut self, id: CountryId) -> Option<&mut Country> {
        self.countries.get_mut(&id)
    }

    /// All recorded countries, in id order.
    pub fn countries(&self) -> impl Iterator<Item = &Country> {
        self.countries.values()
    }

    /// The country flagged as player-controlled, if one was recorded.
    pub fn player_country(&self) -> Option<&Country> {
        self.countries.values().find(|country| country.is_player)
    }

    // ---- Country metrics ----

    /// Record a country's metrics for one snapshot day.
    pub fn add_country_data(&mut self, data: CountryData) -> StoreResult<()> {
        if !self.countries.contains_key(&data.country) {
            return Err(StoreError::UnknownCountry(data.country));
        }
        if self
            .country_data
            .iter()
            .any(|row| row.country == data.country && row.day == data.day)
        {
            return Err(StoreError::DuplicateCountryData {
                country: data.country,
                day: data.day,
            });
        }
        self.country_data.push(data);
        Ok(())
    }

    /// All per-day country metrics, in insertion (chronological) order.
    pub fn country_data(&self) -> &[CountryData] {
        &self.country_data
    }

    /// The metrics row of `country` for `day`, for in-place accumulation.
    pub fn country_data_at_mut(&mut self, country: CountryId, day: i64) -> Option<&mut CountryData> {
        self.country_data
            .iter_mut()
            .find(|row| row.country == country && row.day == day)
    }

    /// The most recently recorded metrics row of `country`.
    pub fn latest_country_data(&self, country: CountryId) -> Option<&CountryData> {
        self.country_data
            .iter()
            .rev()
            .find(|row| row.country == country)
    }

    /// Record one itemized budget row.
    pub fn add_budget_item(&mut self, item: BudgetItem) {
        self.budget_items.push(item);
    }

    /// All itemized budget rows.
    pub fn budget_items(&self) -> &[BudgetItem] {
        &self.budget_items
    }

    // ---- Governments ----

    /// Record a government interval.
    pub fn add_government(&mut self, government: Government) -> StoreResult<()> {
        if !self.countries.contains_key(&government.country) {
            return Err(StoreError::UnknownCountry(government.country));
        }
        if government.end_day < government.start_day {
            return Err(StoreError::InvalidInterval {
                start_day: government.start_day,
                end_day: government.end_day,
            });
        }
        self.governments.push(government);
        Ok(())
    }

    /// All government intervals of `country`, oldest first.
    pub fn governments(&self, country: CountryId) -> impl Iterator<Item = &Government> {
        self.governments
            .iter()
            .filter(move |government| government.country == country)
    }

    /// The government interval of `country` with the latest start.
    pub fn latest_government_mut(&mut self, country: CountryId) -> Option<&mut Government> {
        self.governments
            .iter_mut()
            .filter(|government| government.country == country)
            .max_by_key(|government| government.start_day)
    }

    // ---- Leaders and species ----

    /// Insert or replace a leader row.
    pub fn add_leader(&mut self, leader: Leader) {
        self.leaders.insert(leader.id, leader);
    }

    /// Look up a leader.
    pub fn leader(&self, id: LeaderId) -> Option<&Leader> {
        self.leaders.get(&id)
    }

    /// Look up a leader for mutation.
    pub fn leader_mut(&mut self, id: LeaderId) -> Option<&mut Leader> {
        self.leaders.get_mut(&id)
    }

    /// All recorded leaders, in id order.
    pub fn leaders(&self) -> impl Iterator<Item = &Leader> {
        self.leaders.values()
    }

    /// Ids of the leaders currently marked active for `country`.
    pub fn active_leaders_of(&self, country: CountryId) -> Vec<LeaderId> {
        self.leaders
            .values()
            .filter(|leader| leader.country == country && leader.is_active)
            .map(|leader| leader.id)
            .collect()
    }

    /// Insert a species row. Species are immutable once recorded.
    pub fn add_species(&mut self, species: Species) {
        self.species.insert(species.id, species);
    }

    /// Look up a species.
    pub fn species(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(&id)
    }

    /// All recorded species, in id order.
    pub fn all_species(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    // ---- Factions ----

    /// Record a political faction.
    pub fn add_faction(&mut self, faction: PoliticalFaction) {
        self.factions.push(faction);
    }

    /// Look up a faction of `country` by its save-assigned id.
    pub fn faction(&self, country: CountryId, id: FactionId) -> Option<&PoliticalFaction> {
        self.factions
            .iter()
            .find(|faction| faction.country == country && faction.id == id)
    }

    /// Look up a faction for mutation.
    pub fn faction_mut(&mut self, country: CountryId, id: FactionId) -> Option<&mut PoliticalFaction> {
        self.factions
            .iter_mut()
            .find(|faction| faction.country == country && faction.id == id)
    }

    /// All recorded factions.
    pub fn factions(&self) -> &[PoliticalFaction] {
        &self.factions
    }

    /// Make sure `country` has the four synthetic "no faction" buckets
    /// that demographic aggregation sorts unaffiliated pops into.
    pub fn ensure_synthetic_factions(&mut self, country: CountryId) {
        for (id, name, kind) in SYNTHETIC_FACTIONS {
            if self.faction(country, id).is_none() {
                let faction_type = self.intern(kind);
                self.factions.push(PoliticalFaction {
                    id,
                    country,
                    name: name.to_string(),
                    faction_type,
                });
            }
        }
    }

    // ---- Galaxy ----

    /// True once the one-time galaxy pass has populated the system table.
    pub fn has_galaxy(&self) -> bool {
        !self.systems.is_empty()
    }

    /// Insert or replace a system row.
    pub fn add_system(&mut self, system: System) {
        self.systems.insert(system.id, system);
    }

    /// Look up a system.
    pub fn system(&self, id: SystemId) -> Option<&System> {
        self.systems.get(&id)
    }

    /// Look up a system for mutation.
    pub fn system_mut(&mut self, id: SystemId) -> Option<&mut System> {
        self.systems.get_mut(&id)
    }

    /// All recorded systems, in id order.
    pub fn systems(&self) -> impl Iterator<Item = &System> {
        self.systems.values()
    }

    /// Insert or replace a planet row.
    pub fn add_planet(&mut self, planet: Planet) {
        self.planets.insert(planet.id, planet);
    }

    /// Look up a planet.
    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(&id)
    }

    /// Look up a planet for mutation.
    pub fn planet_mut(&mut self, id: PlanetId) -> Option<&mut Planet> {
        self.planets.get_mut(&id)
    }

    /// All recorded planets, in id order.
    pub fn planets(&self) -> impl Iterator<Item = &Planet> {
        self.planets.values()
    }

    /// Record a hyperlane. Self-loops and already-known pairs (in either
    /// orientation) are dropped.
    pub fn add_hyperlane(&mut self, lane: HyperLane) {
        if lane.a == lane.b {
            return;
        }
        if self
            .hyperlanes
            .iter()
            .any(|existing| existing.connects_same_pair(&lane))
        {
            return;
        }
        self.hyperlanes.push(lane);
    }

    /// All recorded hyperlanes.
    pub fn hyperlanes(&self) -> &[HyperLane] {
        &self.hyperlanes
    }

    // ---- System ownership ----

    /// Record a system ownership interval.
    pub fn add_ownership(&mut self, ownership: SystemOwnership) -> StoreResult<()> {
        if !self.countries.contains_key(&ownership.owner) {
            return Err(StoreError::UnknownCountry(ownership.owner));
        }
        if ownership.end_day < ownership.start_day {
            return Err(StoreError::InvalidInterval {
                start_day: ownership.start_day,
                end_day: ownership.end_day,
            });
        }
        self.ownerships.push(ownership);
        Ok(())
    }

    /// The most recently recorded ownership interval of `system`.
    pub fn latest_ownership_mut(&mut self, system: SystemId) -> Option<&mut SystemOwnership> {
        self.ownerships
            .iter_mut()
            .rev()
            .find(|ownership| ownership.system == system)
    }

    /// All recorded ownership intervals, in insertion order.
    pub fn ownerships(&self) -> &[SystemOwnership] {
        &self.ownerships
    }

    // ---- Wars and battles ----

    /// Record a war, assigning its store id. Wars are matched across
    /// snapshots by name, so one name may map to several rows over a
    /// long game.
    pub fn add_war(&mut self, mut war: War) -> WarId {
        let id = WarId(self.next_war);
        self.next_war += 1;
        war.id = id;
        self.wars.insert(id, war);
        id
    }

    /// Look up a war.
    pub fn war(&self, id: WarId) -> Option<&War> {
        self.wars.get(&id)
    }

    /// Look up a war for mutation.
    pub fn war_mut(&mut self, id: WarId) -> Option<&mut War> {
        self.wars.get_mut(&id)
    }

    /// All recorded wars, in id order.
    pub fn wars(&self) -> impl Iterator<Item = &War> {
        self.wars.values()
    }

    /// The most recently added war with the given name.
    pub fn latest_war_by_name(&self, name: &str) -> Option<&War> {
        self.wars
            .values()
            .filter(|war| war.name == name)
            .max_by_key(|war| war.id)
    }

    /// Record a war participant.
    pub fn add_war_participant(&mut self, participant: WarParticipant) -> StoreResult<()> {
        if !self.wars.contains_key(&participant.war) {
            return Err(StoreError::UnknownWar(participant.war));
        }
        if !self.countries.contains_key(&participant.country) {
            return Err(StoreError::UnknownCountry(participant.country));
        }
        self.war_participants.push(participant);
        Ok(())
    }

    /// All participants of `war`.
    pub fn war_participants(&self, war: WarId) -> impl Iterator<Item = &WarParticipant> {
        self.war_participants
            .iter()
            .filter(move |participant| participant.war == war)
    }

    /// A war participant row for mutation.
    pub fn war_participant_mut(
        &mut self,
        war: WarId,
        country: CountryId,
    ) -> Option<&mut WarParticipant> {
        self.war_participants
            .iter_mut()
            .find(|participant| participant.war == war && participant.country == country)
    }

    /// Record a battle, assigning its store id.
    pub fn add_combat(&mut self, mut combat: Combat) -> CombatId {
        let id = CombatId(self.next_combat);
        self.next_combat += 1;
        combat.id = id;
        self.combats.push(combat);
        id
    }

    /// All recorded battles.
    pub fn combats(&self) -> &[Combat] {
        &self.combats
    }

    /// Record a battle participant.
    pub fn add_combat_participant(&mut self, participant: CombatParticipant) -> StoreResult<()> {
        if !self.countries.contains_key(&participant.country) {
            return Err(StoreError::UnknownCountry(participant.country));
        }
        self.combat_participants.push(participant);
        Ok(())
    }

    /// All participants of `combat`.
    pub fn combat_participants(&self, combat: CombatId) -> impl Iterator<Item = &CombatParticipant> {
        self.combat_participants
            .iter()
            .filter(move |participant| participant.combat == combat)
    }

    // ---- Events ----

    /// Record a historical event.
    pub fn record_event(&mut self, event: HistoricalEvent) -> StoreResult<()> {
        if let Some(end) = event.end_day
            && end < event.start_day
        {
            return Err(StoreError::InvalidInterval {
                start_day: event.start_day,
                end_day: end,
            });
        }
        self.events.push(event);
        Ok(())
    }

    /// All recorded events, in insertion order.
    pub fn events(&self) -> &[HistoricalEvent] {
        &self.events
    }

    /// The most recently recorded event matching `predicate`, for
    /// interval reconciliation.
    pub fn latest_event_mut<F>(&mut self, mut predicate: F) -> Option<&mut HistoricalEvent>
    where
        F: FnMut(&HistoricalEvent) -> bool,
    {
        self.events.iter_mut().rev().find(|event| predicate(event))
    }

    // ---- Demographics ----

    /// Record a demographic aggregate.
    pub fn add_pop_aggregate(&mut self, aggregate: PopAggregate) {
        self.pop_aggregates.push(aggregate);
    }

    /// All recorded demographic aggregates.
    pub fn pop_aggregates(&self) -> &[PopAggregate] {
        &self.pop_aggregates
    }

    // ---- Interned text ----

    /// Intern a piece of text, returning the existing id if the same text
    /// was interned before.
    pub fn intern(&mut self, text: &str) -> DescriptionId {
        if let Some(&id) = self.description_ids.get(text) {
            return id;
        }
        let id = DescriptionId(self.next_description);
        self.next_description += 1;
        self.description_ids.insert(text.to_string(), id);
        self.descriptions.insert(
            id,
            SharedDescription {
                id,
                text: text.to_string(),
            },
        );
        id
    }

    /// Look up interned text by id.
    pub fn description(&self, id: DescriptionId) -> Option<&SharedDescription> {
        self.descriptions.get(&id)
    }

    /// All interned descriptions, in id order.
    pub fn descriptions(&self) -> impl Iterator<Item = &SharedDescription> {
        self.descriptions.values()
    }
}

/// Lock a game history, recovering from a poisoned mutex.
///
/// Committed state is only ever swapped wholesale under the lock, so a
/// panicked writer cannot have left a half-written history behind.
pub fn lock_history(game: &Mutex<GameHistory>) -> MutexGuard<'_, GameHistory> {
    game.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe registry of per-game histories.
///
/// Each game is guarded by its own mutex, so ingesting into one game never
/// blocks work on another. [`HistoryStore::transact`] runs a closure
/// against a private copy of the history and only commits the copy when
/// the closure succeeds, which gives snapshot ingestion all-or-nothing
/// semantics.
#[derive(Debug, Default)]
pub struct HistoryStore {
    games: RwLock<HashMap<String, Arc<Mutex<GameHistory>>>>,
}

impl HistoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the history for `name`, creating it if absent.
    ///
    /// Returns the handle and whether this call created the game.
    pub fn open(&self, name: &str, player_country_name: &str) -> (Arc<Mutex<GameHistory>>, bool) {
        if let Some(game) = self
            .games
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return (Arc::clone(game), false);
        }
        let mut games = self.games.write().unwrap_or_else(PoisonError::into_inner);
        match games.entry(name.to_string()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let history = GameHistory::new(GameMeta::new(name, player_country_name));
                let game = Arc::new(Mutex::new(history));
                entry.insert(Arc::clone(&game));
                (game, true)
            }
        }
    }

    /// Get the history for `name` without creating it.
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<GameHistory>>> {
        self.games
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(Arc::clone)
    }

    /// Names of all tracked games, sorted.
    pub fn game_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .games
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Run a read-only closure against the history of `name`.
    pub fn read<T>(&self, name: &str, f: impl FnOnce(&GameHistory) -> T) -> StoreResult<T> {
        let game = self
            .get(name)
            .ok_or_else(|| StoreError::UnknownGame(name.to_string()))?;
        let guard = lock_history(&game);
        Ok(f(&guard))
    }

    /// Run a fallible mutation against the history of `name`.
    ///
    /// The closure receives a working copy of the history. On `Ok` the
    /// copy replaces the committed state; on `Err` it is dropped and the
    /// committed state is untouched.
    pub fn transact<T, E>(
        &self,
        name: &str,
        f: impl FnOnce(&mut GameHistory) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let game = self
            .get(name)
            .ok_or_else(|| StoreError::UnknownGame(name.to_string()))?;
        let mut guard = lock_history(&game);
        let mut working = guard.clone();
        let value = f(&mut working)?;
        *guard = working;
        Ok(value)
    }
}
