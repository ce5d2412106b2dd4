// Candidate pool: eligible players with their scores, built once per request.

use crate::error::OptimizeError;
use crate::player::{ClubId, PeriodId, PlayerCandidate, PlayerId, Position};
use crate::prediction::{PredictionResult, ScoreSource, ScoringChain};
use crate::rules::SQUAD_SIZE;
use crate::store::PlayerSignalStore;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A player together with its prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub player: PlayerCandidate,
    pub prediction: PredictionResult,
    pub source: ScoreSource,
}

impl ScoredCandidate {
    pub fn id(&self) -> PlayerId {
        self.player.id
    }

    pub fn position(&self) -> Position {
        self.player.position
    }

    pub fn club(&self) -> ClubId {
        self.player.club
    }

    pub fn price(&self) -> f64 {
        self.player.price
    }

    /// The selector objective.
    pub fn score(&self) -> f64 {
        self.prediction.optimization_score
    }

    pub fn expected_points(&self) -> f64 {
        self.prediction.expected_points
    }
}

/// Read-only, id-ordered set of scored candidates for one request.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    candidates: Vec<ScoredCandidate>,
    index: HashMap<PlayerId, usize>,
    horizon: u32,
}

impl CandidatePool {
    /// Build a pool directly from scored candidates. Candidates are
    /// re-ordered by id; a repeated id keeps the first occurrence.
    pub fn from_scored(mut candidates: Vec<ScoredCandidate>, horizon: u32) -> Self {
        candidates.sort_by_key(|c| c.id());
        candidates.dedup_by_key(|c| c.id());
        let index = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id(), i))
            .collect();
        CandidatePool {
            candidates,
            index,
            horizon,
        }
    }

    pub fn candidates(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    pub fn get(&self, id: PlayerId) -> Option<&ScoredCandidate> {
        self.index.get(&id).map(|&i| &self.candidates[i])
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    pub fn count_by_position(&self, position: Position) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.position() == position)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// What to read from the store for one request.
#[derive(Debug, Clone)]
pub struct PoolQuery<'a> {
    pub season: &'a str,
    pub period: Option<PeriodId>,
    pub horizon: u32,
    pub exclude: &'a BTreeSet<PlayerId>,
    pub lock: &'a BTreeSet<PlayerId>,
}

pub struct CandidatePoolBuilder<'a> {
    chain: &'a ScoringChain,
}

impl<'a> CandidatePoolBuilder<'a> {
    pub fn new(chain: &'a ScoringChain) -> Self {
        CandidatePoolBuilder { chain }
    }

    /// Read, filter and score the candidates for a request.
    ///
    /// 1. Load players (history limited to before the target period).
    /// 2. Attach each club's fixtures over the horizon window.
    /// 3. Drop excluded players and non-selectable statuses (unless locked).
    /// 4. Score every survivor through the scoring chain.
    pub fn build(
        &self,
        store: &dyn PlayerSignalStore,
        query: &PoolQuery<'_>,
    ) -> Result<CandidatePool, OptimizeError> {
        let horizon = query.horizon.max(1);
        let players = store.players(query.season, query.period)?;

        if let Some(missing) = query
            .lock
            .iter()
            .find(|id| !players.iter().any(|p| p.id == **id))
        {
            return Err(OptimizeError::InvalidRequest(format!(
                "locked player {missing} is not in the {} player list",
                query.season
            )));
        }

        let from = query.period.unwrap_or_else(|| {
            players
                .iter()
                .flat_map(|p| p.recent.iter().map(|r| r.period))
                .max()
                .map_or(1, |p| p + 1)
        });
        let fixtures = store.fixtures(query.season, from, horizon)?;
        let mut by_club: HashMap<ClubId, Vec<_>> = HashMap::new();
        for f in &fixtures {
            by_club.entry(f.club).or_default().push(f.outlook());
        }

        let total = players.len();
        let mut dropped_status = 0usize;
        let mut sources: HashMap<ScoreSource, usize> = HashMap::new();
        let mut scored = Vec::with_capacity(total);
        for mut player in players {
            if query.exclude.contains(&player.id) {
                continue;
            }
            let locked = query.lock.contains(&player.id);
            if !locked && !player.status.is_selectable() {
                dropped_status += 1;
                continue;
            }
            player.fixtures = by_club.get(&player.club).cloned().unwrap_or_default();
            player.fixtures.sort_by_key(|f| f.period);

            let (prediction, source) = self.chain.score(&player, horizon);
            *sources.entry(source).or_default() += 1;
            scored.push(ScoredCandidate {
                player,
                prediction,
                source,
            });
        }

        debug!(
            "pool for {} from period {}: {} players, {} unavailable dropped, sources {:?}",
            query.season, from, total, dropped_status, sources
        );

        if scored.len() < SQUAD_SIZE {
            return Err(OptimizeError::InsufficientCandidates {
                available: scored.len(),
                required: SQUAD_SIZE,
            });
        }

        let pool = CandidatePool::from_scored(scored, horizon);
        info!("candidate pool ready: {} eligible players", pool.len());
        Ok(pool)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PredictorWeights;
    use crate::player::AvailabilityStatus;
    use crate::store::{ClubFixture, InMemorySignalStore, SignalSnapshot};

    fn snapshot(n: u32) -> SignalSnapshot {
        let players = (1..=n)
            .map(|id| {
                let pos = Position::ALL[(id % 4) as usize];
                PlayerCandidate::new(id, &format!("P{id}"), id % 5, pos, 4.0 + id as f64 * 0.1)
            })
            .collect();
        let fixtures = (0..5)
            .map(|club| ClubFixture {
                club,
                period: 1,
                opponent: (club + 1) % 5,
                is_home: club % 2 == 0,
                difficulty: 3,
            })
            .collect();
        SignalSnapshot {
            season: "s".into(),
            players,
            fixtures,
        }
    }

    fn query<'a>(exclude: &'a BTreeSet<PlayerId>, lock: &'a BTreeSet<PlayerId>) -> PoolQuery<'a> {
        PoolQuery {
            season: "s",
            period: Some(1),
            horizon: 1,
            exclude,
            lock,
        }
    }

    #[test]
    fn builds_sorted_scored_pool_with_fixtures() {
        let store = InMemorySignalStore::new(snapshot(20));
        let chain = ScoringChain::standard(&PredictorWeights::default(), None);
        let empty = BTreeSet::new();
        let pool = CandidatePoolBuilder::new(&chain)
            .build(&store, &query(&empty, &empty))
            .unwrap();
        assert_eq!(pool.len(), 20);
        let ids: Vec<_> = pool.candidates().iter().map(|c| c.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert!(pool.candidates().iter().all(|c| c.player.fixtures.len() == 1));
        assert!(pool.candidates().iter().all(|c| c.score() > 0.0));
    }

    #[test]
    fn excluded_and_unavailable_dropped_unless_locked() {
        let mut snap = snapshot(20);
        snap.players[0].status = AvailabilityStatus::Injured; // id 1
        snap.players[1].status = AvailabilityStatus::Suspended; // id 2
        let store = InMemorySignalStore::new(snap);
        let chain = ScoringChain::standard(&PredictorWeights::default(), None);
        let exclude: BTreeSet<_> = [3].into_iter().collect();
        let lock: BTreeSet<_> = [2].into_iter().collect();
        let pool = CandidatePoolBuilder::new(&chain)
            .build(&store, &query(&exclude, &lock))
            .unwrap();
        assert!(!pool.contains(1));
        assert!(pool.contains(2));
        assert!(!pool.contains(3));
        assert_eq!(pool.len(), 18);
    }

    #[test]
    fn too_few_candidates() {
        let store = InMemorySignalStore::new(snapshot(14));
        let chain = ScoringChain::standard(&PredictorWeights::default(), None);
        let empty = BTreeSet::new();
        let err = CandidatePoolBuilder::new(&chain)
            .build(&store, &query(&empty, &empty))
            .unwrap_err();
        match err {
            OptimizeError::InsufficientCandidates {
                available,
                required,
            } => {
                assert_eq!(available, 14);
                assert_eq!(required, 15);
            }
            other => panic!("expected InsufficientCandidates, got: {other}"),
        }
    }

    #[test]
    fn unknown_locked_player_is_invalid() {
        let store = InMemorySignalStore::new(snapshot(20));
        let chain = ScoringChain::standard(&PredictorWeights::default(), None);
        let empty = BTreeSet::new();
        let lock: BTreeSet<_> = [999].into_iter().collect();
        let err = CandidatePoolBuilder::new(&chain)
            .build(&store, &query(&empty, &lock))
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidRequest(_)));
    }

    #[test]
    fn from_scored_dedupes_and_indexes() {
        let chain = ScoringChain::standard(&PredictorWeights::default(), None);
        let mk = |id| {
            let player = PlayerCandidate::new(id, "x", 1, Position::Defender, 5.0);
            let (prediction, source) = chain.score(&player, 1);
            ScoredCandidate {
                player,
                prediction,
                source,
            }
        };
        let pool = CandidatePool::from_scored(vec![mk(3), mk(1), mk(3)], 1);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(3).map(|c| c.id()), Some(3));
        assert_eq!(pool.count_by_position(Position::Defender), 2);
    }
}
