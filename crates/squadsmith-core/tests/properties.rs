// Property-based tests for squad selection and lineups.
//
// Pools are generated per position with random prices, scores and clubs.
// Every squad a selector accepts must satisfy the composition rules and
// every lineup must be a legal formation. Across selectors and requests:
// the greedy selector finds a squad whenever the exact search does (club
// limits binding or not) and never beats it, exact transfer counts are met
// whenever they are feasible even from a weak reference squad, and more
// budget never lowers the best XI.

use proptest::prelude::*;
use squadsmith_core::formation::{lineups_for, FormationShape};
use squadsmith_core::player::{PlayerCandidate, PlayerId, Position};
use squadsmith_core::pool::{CandidatePool, ScoredCandidate};
use squadsmith_core::prediction::{PredictionResult, ScoreSource};
use squadsmith_core::rules::{Constraints, SQUAD_SIZE, XI_SIZE};
use squadsmith_core::selector::{
    select_for_target, BranchAndBoundSelector, GreedySelector, ResilientSelector, SelectError,
    SelectionRequest, SquadSelector, SquadValue,
};
use squadsmith_core::squad::{check, Squad};
use std::collections::BTreeSet;

/// (price in half-millions, score in tenths, club)
type RawPlayer = (u32, u32, u32);

fn raw_player() -> impl Strategy<Value = RawPlayer> {
    (8u32..=24, 0u32..=100, 0u32..8)
}

/// Position groups sized around the quotas (2/5/5/3).
fn raw_pool() -> impl Strategy<Value = [Vec<RawPlayer>; 4]> {
    (
        prop::collection::vec(raw_player(), 2..=5),
        prop::collection::vec(raw_player(), 5..=9),
        prop::collection::vec(raw_player(), 5..=9),
        prop::collection::vec(raw_player(), 3..=6),
    )
        .prop_map(|(gk, def, mid, fwd)| [gk, def, mid, fwd])
}

/// How players are spread over clubs.
#[derive(Debug, Clone, Copy)]
enum Clubs {
    /// Every player in a club of its own.
    Distinct,
    /// The generated club, 0-7.
    Raw,
    /// The generated club folded into this many clubs.
    Folded(u32),
}

fn build_pool(raw: &[Vec<RawPlayer>; 4], clubs: Clubs) -> CandidatePool {
    let mut players = Vec::new();
    let mut id = 1;
    for (position, group) in Position::ALL.into_iter().zip(raw) {
        for &(half_price, tenths, club) in group {
            let price = half_price as f64 * 0.5;
            let score = tenths as f64 / 10.0;
            let club = match clubs {
                Clubs::Distinct => id,
                Clubs::Raw => club,
                Clubs::Folded(n) => (club + id) % n,
            };
            players.push(ScoredCandidate {
                player: PlayerCandidate::new(id, &format!("P{id}"), club, position, price),
                prediction: PredictionResult {
                    optimization_score: score,
                    expected_points_per_period: score,
                    expected_points: score,
                    confidence: 0.5,
                    risk: 0.0,
                    captaincy_upside: score,
                },
                source: ScoreSource::Model,
            });
            id += 1;
        }
    }
    CandidatePool::from_scored(players, 1)
}

/// The same players with their scores turned upside down, so the best
/// squad of this pool is a weak squad of the original.
fn inverted(pool: &CandidatePool) -> CandidatePool {
    let players = pool
        .candidates()
        .iter()
        .cloned()
        .map(|mut c| {
            let flipped = 10.0 - c.prediction.expected_points;
            c.prediction.optimization_score = flipped;
            c.prediction.expected_points = flipped;
            c.prediction.expected_points_per_period = flipped;
            c.prediction.captaincy_upside = flipped;
            c
        })
        .collect();
    CandidatePool::from_scored(players, 1)
}

fn run(selector: &dyn SquadSelector, pool: &CandidatePool, c: &Constraints) -> Option<Squad> {
    selector.select(pool, &SelectionRequest::new(c, None)).ok()
}

fn exact() -> ResilientSelector {
    ResilientSelector::new(Box::new(BranchAndBoundSelector::default()))
}

/// Exact search result, `None` when it stopped before proving anything.
fn exact_outcome(pool: &CandidatePool, request: &SelectionRequest<'_>) -> Option<Result<Squad, SelectError>> {
    match BranchAndBoundSelector::default().select(pool, request) {
        Err(SelectError::Timeout { .. }) => None,
        other => Some(other),
    }
}

fn best_xi(squad: &Squad) -> f64 {
    lineups_for(squad, 1)[0].xi_points
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // =====================================
    // Squad invariants
    // =====================================

    #[test]
    fn accepted_squads_obey_every_rule(raw in raw_pool(), budget in 55u32..=130) {
        let pool = build_pool(&raw, Clubs::Raw);
        let c = Constraints::with_budget(budget as f64);
        for squad in [run(&exact(), &pool, &c), run(&GreedySelector, &pool, &c)].into_iter().flatten() {
            prop_assert!(check(squad.players(), &c).is_empty());
            prop_assert!(squad.cost() <= budget as f64 + 1e-6);
        }
    }

    #[test]
    fn locks_and_exclusions_are_honored(raw in raw_pool(), budget in 70u32..=130) {
        let pool = build_pool(&raw, Clubs::Raw);
        let mut c = Constraints::with_budget(budget as f64);
        c.locked.insert(1);
        c.excluded.insert(3);
        for squad in [run(&exact(), &pool, &c), run(&GreedySelector, &pool, &c)].into_iter().flatten() {
            prop_assert!(squad.contains(1));
            prop_assert!(!squad.contains(3));
        }
    }

    // =====================================
    // Greedy against exact
    // =====================================

    #[test]
    fn greedy_matches_exact_feasibility_without_club_pressure(
        raw in raw_pool(),
        budget in 55u32..=130,
    ) {
        let pool = build_pool(&raw, Clubs::Distinct);
        let c = Constraints::with_budget(budget as f64);
        let exact_squad = run(&exact(), &pool, &c);
        let greedy_squad = run(&GreedySelector, &pool, &c);
        prop_assert_eq!(exact_squad.is_some(), greedy_squad.is_some());
        if let (Some(e), Some(g)) = (exact_squad, greedy_squad) {
            prop_assert!(!SquadValue::of(&g, &c).beats(&SquadValue::of(&e, &c)));
        }
    }

    #[test]
    fn greedy_matches_exact_feasibility_when_club_caps_bind(
        raw in raw_pool(),
        budget in 60u32..=130,
        clubs in 5u32..=7,
        cap in 3usize..=4,
    ) {
        let pool = build_pool(&raw, Clubs::Folded(clubs));
        let mut c = Constraints::with_budget(budget as f64);
        c.max_per_club = cap;
        let request = SelectionRequest::new(&c, None);
        let outcome = exact_outcome(&pool, &request);
        prop_assume!(outcome.is_some());
        let greedy = GreedySelector.select(&pool, &request);
        match (outcome, greedy) {
            (Some(Ok(e)), Ok(g)) => {
                prop_assert!(check(g.players(), &c).is_empty());
                prop_assert!(!SquadValue::of(&g, &c).beats(&SquadValue::of(&e, &c)));
            }
            (Some(Ok(_)), Err(err)) => prop_assert!(false, "greedy failed where exact succeeded: {}", err),
            (Some(Err(_)), Ok(_)) => prop_assert!(false, "greedy found a squad exact ruled out"),
            _ => {}
        }
    }

    // =====================================
    // Transfer targets
    // =====================================

    #[test]
    fn exact_transfer_counts_from_a_weak_reference(
        raw in raw_pool(),
        budget in 70u32..=130,
        target in 0u32..=4,
    ) {
        let pool = build_pool(&raw, Clubs::Raw);
        let mut c = Constraints::with_budget(budget as f64);
        let weak = run(&exact(), &inverted(&pool), &c);
        prop_assume!(weak.is_some());
        let reference: BTreeSet<PlayerId> = weak.map(|s| s.ids()).unwrap_or_default();
        c.reference = Some(reference.clone());

        // Zero transfers always keeps the (feasible) reference intact.
        let kept = select_for_target(&exact(), &pool, &c, Some(0));
        prop_assert_eq!(kept.ok().map(|s| s.ids()), Some(reference.clone()));

        let strict = exact_outcome(&pool, &SelectionRequest::new(&c, Some(target)));
        prop_assume!(strict.is_some());
        let chosen = select_for_target(&exact(), &pool, &c, Some(target));
        if let Some(Ok(_)) = strict {
            let squad = chosen.ok();
            prop_assert!(squad.is_some());
            let transfers = squad.map(|s| SQUAD_SIZE - s.kept_from(&reference));
            prop_assert_eq!(transfers, Some(target as usize));
        } else if let Ok(squad) = chosen {
            let transfers = (SQUAD_SIZE - squad.kept_from(&reference)) as i64;
            prop_assert!((transfers - target as i64).abs() == 1);
        }
    }

    // =====================================
    // Budget
    // =====================================

    #[test]
    fn more_budget_never_lowers_the_best_xi(
        raw in raw_pool(),
        budget in 55u32..=120,
        extra in 1u32..=15,
        clubs in 5u32..=8,
    ) {
        let pool = build_pool(&raw, Clubs::Folded(clubs));
        let low = Constraints::with_budget(budget as f64);
        let high = Constraints::with_budget((budget + extra) as f64);
        let a = exact_outcome(&pool, &SelectionRequest::new(&low, None));
        let b = exact_outcome(&pool, &SelectionRequest::new(&high, None));
        prop_assume!(a.is_some() && b.is_some());
        if let (Some(Ok(a)), Some(b)) = (a, b) {
            let b = b.ok();
            prop_assert!(b.is_some(), "feasible at {} but not at {}", budget, budget + extra);
            let b = b.map(|s| best_xi(&s)).unwrap_or(f64::NEG_INFINITY);
            prop_assert!(b >= best_xi(&a) - 1e-9);
        }
    }

    // =====================================
    // Lineup invariants
    // =====================================

    #[test]
    fn lineups_are_legal_formations(raw in raw_pool()) {
        let pool = build_pool(&raw, Clubs::Distinct);
        let c = Constraints::with_budget(200.0);
        if let Some(squad) = run(&GreedySelector, &pool, &c) {
            let lineups = lineups_for(&squad, FormationShape::ALL.len());
            prop_assert_eq!(lineups.len(), FormationShape::ALL.len());
            for l in &lineups {
                prop_assert_eq!(l.starters.len(), XI_SIZE);
                let pos = |id: &u32| squad.players().iter().find(|p| p.id() == *id).map(|p| p.position());
                let count = |p: Position| l.starters.iter().filter(|id| pos(*id) == Some(p)).count();
                prop_assert_eq!(count(Position::Goalkeeper), 1);
                prop_assert_eq!(
                    FormationShape::from_counts(
                        count(Position::Defender),
                        count(Position::Midfielder),
                        count(Position::Forward),
                    ),
                    Some(l.shape)
                );
                prop_assert!(l.starters.contains(&l.captain));
                prop_assert!(l.starters.contains(&l.vice_captain));
                prop_assert_ne!(l.captain, l.vice_captain);
            }
            for pair in lineups.windows(2) {
                prop_assert!(pair[0].xi_points >= pair[1].xi_points);
            }
        }
    }
}
