// A validated 15-player squad.

use crate::player::{ClubId, PlayerId, Position};
use crate::pool::{CandidatePool, ScoredCandidate};
use crate::rules::{Constraints, SQUAD_SIZE};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Tolerance for floating-point budget comparisons.
pub const BUDGET_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// One broken squad rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    Size { actual: usize },
    Duplicate(PlayerId),
    UnknownPlayer(PlayerId),
    OverBudget { cost: f64, budget: f64 },
    PositionCount { position: Position, actual: usize, required: usize },
    ClubLimit { club: ClubId, count: usize, max: usize },
    MissingLocked(PlayerId),
    ContainsExcluded(PlayerId),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Size { actual } => write!(f, "squad has {actual} players, need {SQUAD_SIZE}"),
            Violation::Duplicate(id) => write!(f, "player {id} selected twice"),
            Violation::UnknownPlayer(id) => write!(f, "player {id} is not in the pool"),
            Violation::OverBudget { cost, budget } => {
                write!(f, "cost {cost:.1} exceeds budget {budget:.1}")
            }
            Violation::PositionCount {
                position,
                actual,
                required,
            } => write!(f, "{actual} {position} selected, need {required}"),
            Violation::ClubLimit { club, count, max } => {
                write!(f, "{count} players from club {club}, max {max}")
            }
            Violation::MissingLocked(id) => write!(f, "locked player {id} missing"),
            Violation::ContainsExcluded(id) => write!(f, "excluded player {id} selected"),
        }
    }
}

// ---------------------------------------------------------------------------
// Squad
// ---------------------------------------------------------------------------

/// Fifteen scored candidates that satisfy every constraint. Only
/// obtainable through validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Squad {
    /// Ordered by position, then id.
    players: Vec<ScoredCandidate>,
}

impl Squad {
    /// Validate `players` against `constraints`.
    pub fn new(players: Vec<ScoredCandidate>, constraints: &Constraints) -> Result<Self, Vec<Violation>> {
        let violations = check(&players, constraints);
        if !violations.is_empty() {
            return Err(violations);
        }
        let mut players = players;
        players.sort_by_key(|p| (p.position(), p.id()));
        Ok(Squad { players })
    }

    /// Look up `ids` in the pool and validate the result.
    pub fn from_ids(
        pool: &CandidatePool,
        ids: &BTreeSet<PlayerId>,
        constraints: &Constraints,
    ) -> Result<Self, Vec<Violation>> {
        let mut players = Vec::with_capacity(ids.len());
        let mut unknown = Vec::new();
        for &id in ids {
            match pool.get(id) {
                Some(c) => players.push(c.clone()),
                None => unknown.push(Violation::UnknownPlayer(id)),
            }
        }
        if !unknown.is_empty() {
            return Err(unknown);
        }
        Squad::new(players, constraints)
    }

    pub fn players(&self) -> &[ScoredCandidate] {
        &self.players
    }

    pub fn ids(&self) -> BTreeSet<PlayerId> {
        self.players.iter().map(|p| p.id()).collect()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id() == id)
    }

    pub fn cost(&self) -> f64 {
        self.players.iter().map(|p| p.price()).sum()
    }

    /// Sum of optimization scores (the selector objective).
    pub fn total_score(&self) -> f64 {
        self.players.iter().map(|p| p.score()).sum()
    }

    pub fn total_expected_points(&self) -> f64 {
        self.players.iter().map(|p| p.expected_points()).sum()
    }

    pub fn by_position(&self, position: Position) -> impl Iterator<Item = &ScoredCandidate> {
        self.players.iter().filter(move |p| p.position() == position)
    }

    /// Number of reference players retained.
    pub fn kept_from(&self, reference: &BTreeSet<PlayerId>) -> usize {
        self.players
            .iter()
            .filter(|p| reference.contains(&p.id()))
            .count()
    }
}

/// Every rule `players` breaks under `constraints`.
pub fn check(players: &[ScoredCandidate], constraints: &Constraints) -> Vec<Violation> {
    let mut violations = Vec::new();

    if players.len() != constraints.quotas.total() {
        violations.push(Violation::Size {
            actual: players.len(),
        });
    }

    let mut seen = BTreeSet::new();
    for p in players {
        if !seen.insert(p.id()) {
            violations.push(Violation::Duplicate(p.id()));
        }
    }

    let cost: f64 = players.iter().map(|p| p.price()).sum();
    if cost > constraints.budget + BUDGET_EPSILON {
        violations.push(Violation::OverBudget {
            cost,
            budget: constraints.budget,
        });
    }

    for position in Position::ALL {
        let actual = players.iter().filter(|p| p.position() == position).count();
        let required = constraints.quotas.for_position(position);
        if actual != required {
            violations.push(Violation::PositionCount {
                position,
                actual,
                required,
            });
        }
    }

    let mut clubs: BTreeMap<ClubId, usize> = BTreeMap::new();
    for p in players {
        *clubs.entry(p.club()).or_default() += 1;
    }
    for (club, count) in clubs {
        if count > constraints.max_per_club {
            violations.push(Violation::ClubLimit {
                club,
                count,
                max: constraints.max_per_club,
            });
        }
    }

    for &id in &constraints.locked {
        if !seen.contains(&id) {
            violations.push(Violation::MissingLocked(id));
        }
    }
    for &id in &constraints.excluded {
        if seen.contains(&id) {
            violations.push(Violation::ContainsExcluded(id));
        }
    }

    violations
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
