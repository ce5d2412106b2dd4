// Player signal store: the read-only source of candidates and fixtures.
//
// A store answers two questions for a season: which players exist (with the
// history observed before a given period), and which fixtures each club plays
// over a window of upcoming periods. `InMemorySignalStore` serves a loaded
// `SignalSnapshot`; `CachedSignalStore` wraps any store with a TTL cache.

pub mod csv;

use crate::cache::TtlCache;
use crate::player::{ClubId, FixtureOutlook, PeriodId, PlayerCandidate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no signal data for season {season}")]
    UnknownSeason { season: String },

    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: ::csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// One fixture from a club's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubFixture {
    pub club: ClubId,
    pub period: PeriodId,
    pub opponent: ClubId,
    pub is_home: bool,
    pub difficulty: u8,
}

impl ClubFixture {
    pub fn outlook(&self) -> FixtureOutlook {
        FixtureOutlook {
            period: self.period,
            opponent: self.opponent,
            is_home: self.is_home,
            difficulty: self.difficulty,
        }
    }
}

/// Everything the engine reads for one season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub season: String,
    pub players: Vec<PlayerCandidate>,
    #[serde(default)]
    pub fixtures: Vec<ClubFixture>,
}

impl SignalSnapshot {
    /// Load a snapshot serialized as JSON.
    pub fn from_json_path(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| StoreError::Json {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Highest period with recorded history, if any.
    pub fn latest_period(&self) -> Option<PeriodId> {
        self.players
            .iter()
            .flat_map(|p| p.recent.iter().map(|r| r.period))
            .max()
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Read-only access to player signals. Implementations must be shareable
/// across the per-target solver threads.
pub trait PlayerSignalStore: Send + Sync {
    /// All players for the season. When `period` is given, each player's
    /// history is limited to periods before it.
    fn players(
        &self,
        season: &str,
        period: Option<PeriodId>,
    ) -> Result<Vec<PlayerCandidate>, StoreError>;

    /// Fixtures for periods `from .. from + horizon`, ordered by period.
    fn fixtures(
        &self,
        season: &str,
        from: PeriodId,
        horizon: u32,
    ) -> Result<Vec<ClubFixture>, StoreError>;
}

// ---------------------------------------------------------------------------
// InMemorySignalStore
// ---------------------------------------------------------------------------

pub struct InMemorySignalStore {
    snapshot: SignalSnapshot,
}

impl InMemorySignalStore {
    pub fn new(snapshot: SignalSnapshot) -> Self {
        InMemorySignalStore { snapshot }
    }

    pub fn snapshot(&self) -> &SignalSnapshot {
        &self.snapshot
    }

    fn check_season(&self, season: &str) -> Result<(), StoreError> {
        if season == self.snapshot.season {
            Ok(())
        } else {
            Err(StoreError::UnknownSeason {
                season: season.to_string(),
            })
        }
    }
}

impl PlayerSignalStore for InMemorySignalStore {
    fn players(
        &self,
        season: &str,
        period: Option<PeriodId>,
    ) -> Result<Vec<PlayerCandidate>, StoreError> {
        self.check_season(season)?;
        let players = self
            .snapshot
            .players
            .iter()
            .map(|p| {
                let mut p = p.clone();
                if let Some(limit) = period {
                    p.recent.retain(|r| r.period < limit);
                }
                p
            })
            .collect();
        Ok(players)
    }

    fn fixtures(
        &self,
        season: &str,
        from: PeriodId,
        horizon: u32,
    ) -> Result<Vec<ClubFixture>, StoreError> {
        self.check_season(season)?;
        let end = from.saturating_add(horizon);
        let mut out: Vec<ClubFixture> = self
            .snapshot
            .fixtures
            .iter()
            .filter(|f| f.period >= from && f.period < end)
            .cloned()
            .collect();
        out.sort_by_key(|f| (f.period, f.club));
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// CachedSignalStore
// ---------------------------------------------------------------------------

type PlayersKey = (String, Option<PeriodId>);
type FixturesKey = (String, PeriodId, u32);

/// Wraps another store and memoizes its answers for a bounded time.
pub struct CachedSignalStore<S> {
    inner: S,
    players: TtlCache<PlayersKey, Vec<PlayerCandidate>>,
    fixtures: TtlCache<FixturesKey, Vec<ClubFixture>>,
}

impl<S: PlayerSignalStore> CachedSignalStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        CachedSignalStore {
            inner,
            players: TtlCache::new(ttl),
            fixtures: TtlCache::new(ttl),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Forget every cached answer.
    pub fn invalidate(&self) {
        self.players.clear();
        self.fixtures.clear();
    }
}

impl<S: PlayerSignalStore> PlayerSignalStore for CachedSignalStore<S> {
    fn players(
        &self,
        season: &str,
        period: Option<PeriodId>,
    ) -> Result<Vec<PlayerCandidate>, StoreError> {
        self.players
            .get_or_try_insert_with((season.to_string(), period), || {
                debug!(season, ?period, "player cache miss");
                self.inner.players(season, period)
            })
    }

    fn fixtures(
        &self,
        season: &str,
        from: PeriodId,
        horizon: u32,
    ) -> Result<Vec<ClubFixture>, StoreError> {
        self.fixtures
            .get_or_try_insert_with((season.to_string(), from, horizon), || {
                debug!(season, from, horizon, "fixture cache miss");
                self.inner.fixtures(season, from, horizon)
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
