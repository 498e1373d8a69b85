//! Snapshot ingestion: one orchestrated set of passes per save.

use annals_core::country::{Country, CountryId};
use annals_core::{GameHistory, HistoryStore};
use annals_save::Value;

use crate::config::ExtractorConfig;
use crate::countries::{extract_country_data, extract_trade_agreements, upsert_country};
use crate::diplomacy::extract_diplomacy;
use crate::economy::extract_economy;
use crate::error::{ExtractResult, ValidationError};
use crate::factions::extract_factions;
use crate::galaxy::extract_galaxy;
use crate::government::extract_government;
use crate::leaders::{extract_country_leaders, extract_species};
use crate::names::render_name;
use crate::pops::extract_pop_aggregates;
use crate::research::extract_tech_events;
use crate::rulers::extract_ruler_events;
use crate::sectors::extract_sector_events;
use crate::session::{
    PassContext, build_ownership_indices, player_country, snapshot_day, table_entry,
};
use crate::starbases::extract_system_ownership;
use crate::wars::{extract_wars, settle_finished_wars};

/// What one ingested snapshot did to a game's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOutcome {
    /// In-game day the snapshot covered.
    pub day: i64,
    /// True when a snapshot for the same day was already recorded and
    /// its per-day rows were replaced.
    pub replaced: bool,
    /// Countries known to the game after this snapshot.
    pub countries: usize,
    /// Historical events added by this snapshot.
    pub new_events: usize,
    /// Demographic aggregates added by this snapshot.
    pub pop_aggregates: usize,
    /// Rows dropped because they referenced entities nothing recorded.
    pub warnings: usize,
}

/// Turns parsed save snapshots into recorded history.
///
/// The extractor keeps no state between snapshots; everything it learns
/// lands in a [`HistoryStore`]. One instance can serve any number of
/// games, in any snapshot order the store accepts.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    /// Create an extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Ingest one gamestate into the store, under the game's history.
    ///
    /// The gamestate is validated first: a snapshot without a date, a
    /// readable country table or exactly one player country is rejected
    /// before the store is touched. After validation the whole snapshot
    /// is applied transactionally, so a mid-pass store error leaves the
    /// game's history exactly as it was.
    pub fn process_snapshot(
        &self,
        store: &HistoryStore,
        game_name: &str,
        gamestate: &Value,
    ) -> ExtractResult<SnapshotOutcome> {
        let now = snapshot_day(gamestate)?;
        let player = player_country(gamestate)?;
        if gamestate.get("country").is_none() {
            return Err(ValidationError::MissingField("country").into());
        }
        let player_name = render_name(
            table_entry(gamestate.get("country"), player.0).and_then(|dict| dict.get("name")),
            "no name",
        );

        let (_, created) = store.open(game_name, &player_name);
        if created {
            tracing::info!(
                game = game_name,
                player = player_name.as_str(),
                "tracking a new game"
            );
        }
        let outcome = store.transact(game_name, |history| {
            self.ingest(history, game_name, now, player, gamestate)
        })?;
        tracing::info!(
            game = game_name,
            day = outcome.day,
            replaced = outcome.replaced,
            new_events = outcome.new_events,
            warnings = outcome.warnings,
            "snapshot ingested"
        );
        Ok(outcome)
    }

    fn ingest(
        &self,
        history: &mut GameHistory,
        game_name: &str,
        now: i64,
        player: CountryId,
        gamestate: &Value,
    ) -> ExtractResult<SnapshotOutcome> {
        let countries = gamestate
            .get("country")
            .ok_or(ValidationError::MissingField("country"))?;

        let replaced = history.has_snapshot(now);
        history.begin_snapshot(now)?;
        let events_before = history.events().len();
        let aggregates_before = history.pop_aggregates().len();

        // The galactic map is fixed at galaxy generation, so one pass per
        // game is enough; stray systems are backfilled on demand later.
        if !history.has_galaxy() {
            extract_galaxy(history, gamestate);
        }
        extract_species(history, gamestate);

        let mut ctx = PassContext::new(&self.config, game_name, now, player);
        extract_trade_agreements(&mut ctx, gamestate);
        build_ownership_indices(&mut ctx, gamestate);

        for (raw_id, country_dict) in countries.entries_by_id() {
            if !country_dict.is_map() {
                continue;
            }
            let id = CountryId(raw_id);
            upsert_country(history, player, id, country_dict);
            if !history.country(id).is_some_and(Country::tracks_full_history) {
                continue;
            }

            extract_country_leaders(history, &mut ctx, id, country_dict, gamestate)?;
            let relations = extract_diplomacy(history, &ctx, id, country_dict, gamestate)?;
            extract_government(history, &ctx, id, country_dict)?;
            extract_country_data(history, &ctx, id, country_dict, relations)?;
            extract_economy(history, &ctx, id, country_dict);

            if !ctx.tracks_history_of(id) {
                continue;
            }
            extract_sector_events(history, &mut ctx, id, country_dict, gamestate)?;
            extract_factions(history, &mut ctx, id, gamestate)?;
            extract_ruler_events(history, &mut ctx, id, country_dict)?;
            extract_tech_events(history, &ctx, id, country_dict)?;
        }

        extract_wars(history, &mut ctx, gamestate)?;
        settle_finished_wars(history, &ctx, gamestate)?;
        if self.config.extract_system_ownership {
            extract_system_ownership(history, &mut ctx, gamestate)?;
        }
        // Demographics only exist for the player, and only once the
        // snapshot produced a metrics row to hang them off.
        if history
            .country_data()
            .iter()
            .any(|row| row.country == player && row.day == now)
        {
            extract_pop_aggregates(history, &mut ctx, gamestate);
        }

        Ok(SnapshotOutcome {
            day: now,
            replaced,
            countries: history.countries().count(),
            new_events: history.events().len() - events_before,
            pop_aggregates: history.pop_aggregates().len() - aggregates_before,
            warnings: ctx.warnings,
        })
    }
}
