// Squad selection: pick 15 candidates under the budget, quota, club,
// lock/exclude and transfer-window constraints, maximizing the expected
// points of the best starting XI and then the squad's total score.
//
// Two interchangeable implementations sit behind `SquadSelector`:
// an exact branch-and-bound search and a greedy constructor. The
// `ResilientSelector` composes them: exact first, greedy when the exact
// search is unavailable or runs out of time.

pub mod branch_bound;
pub mod greedy;
pub mod resilient;

pub use branch_bound::{BranchAndBoundSelector, ExactSolver};
pub use greedy::GreedySelector;
pub use resilient::ResilientSelector;

use crate::formation::{lineups_for, FormationShape};
use crate::player::{ClubId, PlayerId, Position};
use crate::pool::{CandidatePool, ScoredCandidate};
use crate::rules::{Chip, Constraints, SQUAD_SIZE};
use crate::squad::{Squad, BUDGET_EPSILON};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Tolerance for comparing squad values.
pub const VALUE_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Request / error
// ---------------------------------------------------------------------------

/// One selector invocation: the request constraints plus the transfer
/// count this solve aims for (`None` when there is no reference squad).
#[derive(Debug, Clone, Copy)]
pub struct SelectionRequest<'a> {
    pub constraints: &'a Constraints,
    pub transfer_target: Option<u32>,
    /// How far the transfer count may stray from the target.
    pub tolerance: u32,
}

impl<'a> SelectionRequest<'a> {
    /// A request for exactly `transfer_target` transfers.
    pub fn new(constraints: &'a Constraints, transfer_target: Option<u32>) -> Self {
        SelectionRequest {
            constraints,
            transfer_target,
            tolerance: 0,
        }
    }

    /// The same request, accepting one transfer either side of the target.
    pub fn widened(self) -> Self {
        SelectionRequest {
            tolerance: 1,
            ..self
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("no feasible squad: {reason}")]
    Infeasible { reason: String },

    #[error("search stopped after {nodes} nodes ({elapsed_ms} ms)")]
    Timeout {
        elapsed_ms: u64,
        nodes: u64,
        /// Best complete squad found before stopping.
        incumbent: Option<Box<Squad>>,
    },

    #[error("exact solver is not available")]
    SolverUnavailable,
}

impl SelectError {
    pub(crate) fn infeasible(reason: impl Into<String>) -> Self {
        SelectError::Infeasible {
            reason: reason.into(),
        }
    }
}

/// A squad selection strategy.
pub trait SquadSelector: Send + Sync {
    fn name(&self) -> &'static str;

    fn select(
        &self,
        pool: &CandidatePool,
        request: &SelectionRequest<'_>,
    ) -> Result<Squad, SelectError>;
}

// ---------------------------------------------------------------------------
// Transfer window
// ---------------------------------------------------------------------------

/// Allowed number of reference players kept in the squad.
///
/// For a target of `t` transfers and tolerance `d`, the number kept `k`
/// must satisfy `|(15 - k) - t| <= d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepWindow {
    pub min: usize,
    pub max: usize,
}

impl KeepWindow {
    pub fn for_request(request: &SelectionRequest<'_>) -> Option<Self> {
        let reference = request.constraints.reference.as_ref()?;
        let target = request.transfer_target? as usize;
        let tolerance = request.tolerance as usize;
        let size = SQUAD_SIZE;
        Some(KeepWindow {
            min: size.saturating_sub(target + tolerance),
            max: (size + tolerance)
                .saturating_sub(target)
                .min(size)
                .min(reference.len()),
        })
    }

    pub fn contains(&self, kept: usize) -> bool {
        (self.min..=self.max).contains(&kept)
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

// ---------------------------------------------------------------------------
// Objective
// ---------------------------------------------------------------------------

/// What the selectors maximize, compared lexicographically: expected
/// points of the best starting XI (every player under bench boost), then
/// the sum of optimization scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquadValue {
    pub lineup_points: f64,
    pub total_score: f64,
}

impl SquadValue {
    pub fn of(squad: &Squad, constraints: &Constraints) -> Self {
        let lineup_points = if constraints.chip == Some(Chip::BenchBoost) {
            squad.total_expected_points()
        } else {
            lineups_for(squad, 1)
                .first()
                .map_or(0.0, |l| l.xi_points)
        };
        SquadValue {
            lineup_points,
            total_score: squad.total_score(),
        }
    }

    /// Value of a selection that has not been validated yet. Matches `of`
    /// for any valid squad.
    pub(crate) fn of_players(players: &[&ScoredCandidate], constraints: &Constraints) -> Self {
        let total_score = players.iter().map(|c| c.score()).sum();
        if constraints.chip == Some(Chip::BenchBoost) {
            return SquadValue {
                lineup_points: players.iter().map(|c| c.expected_points()).sum(),
                total_score,
            };
        }
        let mut points: [Vec<f64>; 4] = Default::default();
        for c in players {
            points[c.position().index()].push(c.expected_points());
        }
        for group in &mut points {
            group.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        }
        let lineup_points = FormationShape::ALL
            .iter()
            .filter_map(|shape| {
                Position::ALL.iter().try_fold(0.0, |acc, &pos| {
                    let group = &points[pos.index()];
                    let r = shape.required(pos);
                    (group.len() >= r).then(|| acc + group[..r].iter().sum::<f64>())
                })
            })
            .fold(0.0, f64::max);
        SquadValue {
            lineup_points,
            total_score,
        }
    }

    /// Strictly better, beyond rounding noise.
    pub fn beats(&self, other: &SquadValue) -> bool {
        self.lineup_points > other.lineup_points + VALUE_EPSILON
            || (self.lineup_points >= other.lineup_points - VALUE_EPSILON
                && self.total_score > other.total_score + VALUE_EPSILON)
    }
}

/// Solve for exactly `target` transfers, accepting one either side when
/// the exact count is infeasible.
pub fn select_for_target(
    selector: &dyn SquadSelector,
    pool: &CandidatePool,
    constraints: &Constraints,
    target: Option<u32>,
) -> Result<Squad, SelectError> {
    let exact = SelectionRequest::new(constraints, target);
    match selector.select(pool, &exact) {
        Err(SelectError::Infeasible { reason })
            if target.is_some() && constraints.reference.is_some() =>
        {
            debug!(
                "exactly {:?} transfers infeasible ({}), widening the window",
                target, reason
            );
            selector.select(pool, &exact.widened())
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

/// Partial squad after seating the locked players.
#[derive(Debug, Clone)]
pub(crate) struct Seated<'a> {
    pub chosen: Vec<&'a ScoredCandidate>,
    /// Remaining slots per position, indexed by `Position::index()`.
    pub need: [usize; 4],
    pub spent: f64,
    pub clubs: HashMap<ClubId, usize>,
    pub kept: usize,
}

impl<'a> Seated<'a> {
    pub fn remaining(&self) -> usize {
        self.need.iter().sum()
    }

    pub fn club_count(&self, club: ClubId) -> usize {
        self.clubs.get(&club).copied().unwrap_or(0)
    }

    pub fn seat(&mut self, c: &'a ScoredCandidate, constraints: &Constraints) {
        self.need[c.position().index()] -= 1;
        self.spent += c.price();
        *self.clubs.entry(c.club()).or_default() += 1;
        if constraints.is_reference(c.id()) {
            self.kept += 1;
        }
        self.chosen.push(c);
    }

    pub fn unseat(&mut self, index: usize, constraints: &Constraints) -> &'a ScoredCandidate {
        let c = self.chosen.remove(index);
        self.need[c.position().index()] += 1;
        self.spent -= c.price();
        if let Some(n) = self.clubs.get_mut(&c.club()) {
            *n -= 1;
        }
        if constraints.is_reference(c.id()) {
            self.kept -= 1;
        }
        c
    }

    pub fn ids(&self) -> BTreeSet<PlayerId> {
        self.chosen.iter().map(|c| c.id()).collect()
    }
}

/// Seat every locked player, failing when the locks alone break a rule.
pub(crate) fn seat_locked<'a>(
    pool: &'a CandidatePool,
    constraints: &Constraints,
) -> Result<Seated<'a>, SelectError> {
    let mut seated = Seated {
        chosen: Vec::with_capacity(SQUAD_SIZE),
        need: constraints.quotas.as_array(),
        spent: 0.0,
        clubs: HashMap::new(),
        kept: 0,
    };
    for &id in &constraints.locked {
        if constraints.excluded.contains(&id) {
            return Err(SelectError::infeasible(format!(
                "player {id} is both locked and excluded"
            )));
        }
        let Some(c) = pool.get(id) else {
            return Err(SelectError::infeasible(format!(
                "locked player {id} is not in the candidate pool"
            )));
        };
        let slot = c.position().index();
        if seated.need[slot] == 0 {
            return Err(SelectError::infeasible(format!(
                "too many locked {} players",
                c.position()
            )));
        }
        if seated.club_count(c.club()) >= constraints.max_per_club {
            return Err(SelectError::infeasible(format!(
                "locked players exceed the limit for club {}",
                c.club()
            )));
        }
        seated.seat(c, constraints);
    }
    if seated.spent > constraints.budget + BUDGET_EPSILON {
        return Err(SelectError::infeasible(format!(
            "locked players cost {:.1}, over the budget of {:.1}",
            seated.spent, constraints.budget
        )));
    }
    Ok(seated)
}

/// Candidates a selector may still choose: not excluded, not locked.
pub(crate) fn free_candidates<'a>(
    pool: &'a CandidatePool,
    constraints: &Constraints,
) -> Vec<&'a ScoredCandidate> {
    pool.candidates()
        .iter()
        .filter(|c| !constraints.excluded.contains(&c.id()) && !constraints.locked.contains(&c.id()))
        .collect()
}

/// Validate a finished selection, including the transfer window.
pub(crate) fn finish(
    pool: &CandidatePool,
    ids: &BTreeSet<PlayerId>,
    request: &SelectionRequest<'_>,
) -> Result<Squad, SelectError> {
    let squad = Squad::from_ids(pool, ids, request.constraints).map_err(|violations| {
        SelectError::infeasible(
            violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        )
    })?;
    if let (Some(window), Some(reference)) =
        (KeepWindow::for_request(request), &request.constraints.reference)
    {
        let kept = squad.kept_from(reference);
        if !window.contains(kept) {
            return Err(SelectError::infeasible(format!(
                "keeps {kept} reference players, window is {}..={}",
                window.min, window.max
            )));
        }
    }
    Ok(squad)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
