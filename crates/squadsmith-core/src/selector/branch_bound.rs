// Exact 0/1 branch-and-bound squad search.
//
// Candidates are grouped by position and sorted by expected points, so the
// players picked from a group arrive strongest first and the first `r` of
// them are that position's starters. One pass runs per formation shape
// (a single pass counting every player under bench boost), and the passes
// share one incumbent. Each node decides one candidate (include, then
// skip) and is pruned on:
//   - bound:  lineup points + best remaining starter points, then total
//             score + best remaining scores, cannot beat the incumbent
//   - budget: spent + cheapest completion cost > budget
//   - club:   including would exceed the per-club ceiling
//   - window: the kept-reference count can no longer land in the window
//
// Locked candidates sit in their groups and are never skipped. Before the
// search, candidates that can never be needed are dropped (see
// `reduce_dominated`).

use super::{
    finish, seat_locked, KeepWindow, SelectError, SelectionRequest, SquadSelector, SquadValue,
};
use crate::config::SolverConfig;
use crate::formation::{starter_order, FormationShape};
use crate::player::{ClubId, PlayerId, Position};
use crate::pool::{CandidatePool, ScoredCandidate};
use crate::rules::{Chip, Constraints, SQUAD_SIZE};
use crate::squad::{Squad, BUDGET_EPSILON};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::debug;

/// Nodes between wall-clock checks.
const CLOCK_INTERVAL: u64 = 1024;

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Limits for one exact search.
#[derive(Debug, Clone)]
pub struct BranchAndBoundSelector {
    pub time_budget: Duration,
    pub max_nodes: u64,
}

impl Default for BranchAndBoundSelector {
    fn default() -> Self {
        BranchAndBoundSelector {
            time_budget: Duration::from_millis(2000),
            max_nodes: 2_000_000,
        }
    }
}

impl BranchAndBoundSelector {
    pub fn new(time_budget: Duration, max_nodes: u64) -> Self {
        BranchAndBoundSelector {
            time_budget,
            max_nodes,
        }
    }
}

impl SquadSelector for BranchAndBoundSelector {
    fn name(&self) -> &'static str {
        "branch_and_bound"
    }

    fn select(
        &self,
        pool: &CandidatePool,
        request: &SelectionRequest<'_>,
    ) -> Result<Squad, SelectError> {
        let constraints = request.constraints;
        let window = KeepWindow::for_request(request);
        if window.is_some_and(|w| w.is_empty()) {
            return Err(SelectError::infeasible(
                "transfer target cannot be met with this reference squad",
            ));
        }

        // The locks on their own must already be admissible.
        seat_locked(pool, constraints)?;
        let groups = build_groups(pool, constraints);
        let quotas = constraints.quotas.as_array();

        for pos in Position::ALL {
            let i = pos.index();
            if groups[i].len() < quotas[i] {
                return Err(SelectError::infeasible(format!(
                    "only {} {} candidates for {} slots",
                    groups[i].len(),
                    pos,
                    quotas[i]
                )));
            }
        }

        let start = Instant::now();
        let mut search = Search::new(groups, constraints, window, self, start);
        search.run();

        let elapsed_ms = start.elapsed().as_millis() as u64;
        debug!(
            "branch-and-bound target {:?}: {} nodes in {} ms, aborted={}",
            request.transfer_target, search.nodes, elapsed_ms, search.aborted
        );

        let best = search.best.take();
        if search.aborted {
            let incumbent = best
                .and_then(|(_, ids)| finish(pool, &ids, request).ok())
                .map(Box::new);
            return Err(SelectError::Timeout {
                elapsed_ms,
                nodes: search.nodes,
                incumbent,
            });
        }
        match best {
            Some((_, ids)) => finish(pool, &ids, request),
            None => Err(SelectError::infeasible(
                "no combination satisfies the budget, club and transfer constraints",
            )),
        }
    }
}

/// The exact solver as configured: active, or switched off.
pub enum ExactSolver {
    Active(BranchAndBoundSelector),
    Disabled,
}

impl ExactSolver {
    pub fn from_config(config: &SolverConfig) -> Self {
        if config.enabled {
            ExactSolver::Active(BranchAndBoundSelector::new(
                Duration::from_millis(config.time_budget_ms),
                config.max_nodes,
            ))
        } else {
            ExactSolver::Disabled
        }
    }
}

impl SquadSelector for ExactSolver {
    fn name(&self) -> &'static str {
        match self {
            ExactSolver::Active(s) => s.name(),
            ExactSolver::Disabled => "disabled",
        }
    }

    fn select(
        &self,
        pool: &CandidatePool,
        request: &SelectionRequest<'_>,
    ) -> Result<Squad, SelectError> {
        match self {
            ExactSolver::Active(s) => s.select(pool, request),
            ExactSolver::Disabled => Err(SelectError::SolverUnavailable),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate reduction
// ---------------------------------------------------------------------------

/// Group the non-excluded candidates by position in starter order, minus
/// dominated ones.
fn build_groups<'a>(
    pool: &'a CandidatePool,
    constraints: &Constraints,
) -> [Vec<&'a ScoredCandidate>; 4] {
    let quotas = constraints.quotas.as_array();
    let mut groups: [Vec<&'a ScoredCandidate>; 4] = Default::default();
    for c in pool.candidates() {
        if !constraints.excluded.contains(&c.id()) {
            groups[c.position().index()].push(c);
        }
    }
    for (i, group) in groups.iter_mut().enumerate() {
        group.sort_by(starter_order);
        if quotas[i] == 0 {
            group.clear();
            continue;
        }
        let before = group.len();
        *group = reduce_dominated(group, quotas[i], constraints);
        if group.len() < before {
            debug!(
                "{}: {} of {} candidates dominated",
                Position::ALL[i],
                before - group.len(),
                before
            );
        }
    }
    groups
}

/// `a` is at least as good as `b` in every respect that matters to the
/// search, and strictly better under (points, score, price, id).
fn dominates(a: &ScoredCandidate, b: &ScoredCandidate, constraints: &Constraints) -> bool {
    a.expected_points() >= b.expected_points()
        && a.score() >= b.score()
        && a.price() <= b.price()
        && constraints.is_reference(a.id()) == constraints.is_reference(b.id())
        && (a.expected_points() > b.expected_points()
            || a.score() > b.score()
            || a.price() < b.price()
            || a.id() < b.id())
}

/// Drop candidates that no optimal squad needs.
///
/// If `b` is in a squad and some dominator `a` is not, swapping `a` in for
/// `b` keeps every constraint and lowers neither the lineup points nor the
/// total score, unless `a`'s club is already full. With `need` slots in this
/// position at most `need - 1` dominators sit beside `b`, and the other 14
/// players fill at most `14 / max_per_club` clubs. Dominators from more
/// distinct clubs than that guarantee a usable swap. Locked candidates
/// always stay.
fn reduce_dominated<'a>(
    group: &[&'a ScoredCandidate],
    need: usize,
    constraints: &Constraints,
) -> Vec<&'a ScoredCandidate> {
    let max_per_club = constraints.max_per_club.max(1);
    let threshold = need.saturating_sub(1) + (SQUAD_SIZE - 1) / max_per_club + 1;
    group
        .iter()
        .filter(|b| {
            if constraints.locked.contains(&b.id()) {
                return true;
            }
            let mut clubs: HashSet<ClubId> = HashSet::new();
            for a in group {
                if dominates(a, b, constraints) {
                    clubs.insert(a.club());
                    if clubs.len() >= threshold {
                        return false;
                    }
                }
            }
            true
        })
        .copied()
        .collect()
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// `table[i][j]` = sum of the `j` smallest (or largest) values from index
/// `i` on. Entries with fewer than `j` values left are infinite.
fn best_k_suffix(values: &[f64], k: usize, largest: bool) -> Vec<Vec<f64>> {
    let n = values.len();
    let mut table = vec![vec![f64::INFINITY; k + 1]; n + 1];
    table[n][0] = 0.0;
    let mut kept: Vec<f64> = Vec::with_capacity(k + 1);
    for i in (0..n).rev() {
        let key = if largest { -values[i] } else { values[i] };
        let at = kept.partition_point(|&x| x <= key);
        kept.insert(at, key);
        kept.truncate(k);
        table[i][0] = 0.0;
        let mut acc = 0.0;
        for (j, &x) in kept.iter().enumerate() {
            acc += if largest { -x } else { x };
            table[i][j + 1] = acc;
        }
    }
    table
}

struct Search<'a, 'c> {
    groups: [Vec<&'a ScoredCandidate>; 4],
    quotas: [usize; 4],
    /// points[g][i] = expected points of the first i candidates in group g.
    points: [Vec<f64>; 4],
    /// top_scores[g][i][k] = largest k optimization scores in group g from i.
    top_scores: [Vec<Vec<f64>>; 4],
    /// cheapest[g][i][k] = cheapest k prices in group g from i.
    cheapest: [Vec<Vec<f64>>; 4],
    /// Reference / non-reference candidates in group g from index i.
    ref_suffix: [Vec<usize>; 4],
    other_suffix: [Vec<usize>; 4],
    /// Locked candidates in group g from index i.
    locked_suffix: [Vec<usize>; 4],
    /// Aggregates over groups g.. (index 4 is the empty tail).
    later_score: [f64; 5],
    later_cost: [f64; 5],
    later_ref_max: [usize; 5],
    later_forced: [usize; 5],

    /// Starters per group in the current pass, and the best starter points
    /// of groups g.. under it.
    starters: [usize; 4],
    later_points: [f64; 5],

    constraints: &'c Constraints,
    window: Option<KeepWindow>,

    chosen: Vec<PlayerId>,
    clubs: HashMap<ClubId, usize>,
    spent: f64,
    lineup: f64,
    score: f64,
    kept: usize,

    best: Option<(SquadValue, BTreeSet<PlayerId>)>,
    nodes: u64,
    max_nodes: u64,
    deadline: Instant,
    aborted: bool,
}

impl<'a, 'c> Search<'a, 'c> {
    fn new(
        groups: [Vec<&'a ScoredCandidate>; 4],
        constraints: &'c Constraints,
        window: Option<KeepWindow>,
        limits: &BranchAndBoundSelector,
        start: Instant,
    ) -> Self {
        let quotas = constraints.quotas.as_array();
        let mut points: [Vec<f64>; 4] = Default::default();
        let mut top_scores: [Vec<Vec<f64>>; 4] = Default::default();
        let mut cheapest: [Vec<Vec<f64>>; 4] = Default::default();
        let mut ref_suffix: [Vec<usize>; 4] = Default::default();
        let mut other_suffix: [Vec<usize>; 4] = Default::default();
        let mut locked_suffix: [Vec<usize>; 4] = Default::default();

        for g in 0..4 {
            let group = &groups[g];
            let n = group.len();

            let mut p = Vec::with_capacity(n + 1);
            p.push(0.0);
            for c in group {
                p.push(p[p.len() - 1] + c.expected_points());
            }
            points[g] = p;

            let scores: Vec<f64> = group.iter().map(|c| c.score()).collect();
            let prices: Vec<f64> = group.iter().map(|c| c.price()).collect();
            top_scores[g] = best_k_suffix(&scores, quotas[g], true);
            cheapest[g] = best_k_suffix(&prices, quotas[g], false);

            let mut refs = vec![0usize; n + 1];
            let mut others = vec![0usize; n + 1];
            let mut locks = vec![0usize; n + 1];
            for i in (0..n).rev() {
                let is_ref = constraints.is_reference(group[i].id());
                refs[i] = refs[i + 1] + usize::from(is_ref);
                others[i] = others[i + 1] + usize::from(!is_ref);
                locks[i] = locks[i + 1] + usize::from(constraints.locked.contains(&group[i].id()));
            }
            ref_suffix[g] = refs;
            other_suffix[g] = others;
            locked_suffix[g] = locks;
        }

        let mut later_score = [0.0; 5];
        let mut later_cost = [0.0; 5];
        let mut later_ref_max = [0usize; 5];
        let mut later_forced = [0usize; 5];
        for g in (0..4).rev() {
            let k = quotas[g];
            later_score[g] = later_score[g + 1] + top_scores[g][0][k];
            later_cost[g] = later_cost[g + 1] + cheapest[g][0][k];
            later_ref_max[g] = later_ref_max[g + 1] + k.min(ref_suffix[g][0]);
            later_forced[g] = later_forced[g + 1] + k.saturating_sub(other_suffix[g][0]);
        }

        Search {
            groups,
            quotas,
            points,
            top_scores,
            cheapest,
            ref_suffix,
            other_suffix,
            locked_suffix,
            later_score,
            later_cost,
            later_ref_max,
            later_forced,
            starters: quotas,
            later_points: [0.0; 5],
            constraints,
            window,
            chosen: Vec::with_capacity(SQUAD_SIZE),
            clubs: HashMap::new(),
            spent: 0.0,
            lineup: 0.0,
            score: 0.0,
            kept: 0,
            best: None,
            nodes: 0,
            max_nodes: limits.max_nodes,
            deadline: start + limits.time_budget,
            aborted: false,
        }
    }

    /// Starters per position for each pass: every formation the quotas can
    /// field, or the whole squad under bench boost.
    fn passes(&self) -> Vec<[usize; 4]> {
        if self.constraints.chip == Some(Chip::BenchBoost) {
            return vec![self.quotas];
        }
        let shapes: Vec<[usize; 4]> = FormationShape::ALL
            .iter()
            .map(|shape| Position::ALL.map(|pos| shape.required(pos)))
            .filter(|starters| starters.iter().zip(&self.quotas).all(|(s, q)| s <= q))
            .collect();
        if shapes.is_empty() {
            vec![self.quotas]
        } else {
            shapes
        }
    }

    fn run(&mut self) {
        for starters in self.passes() {
            self.starters = starters;
            for g in (0..4).rev() {
                self.later_points[g] = self.later_points[g + 1] + self.points[g][starters[g]];
            }
            self.visit(0, 0, self.quotas[0]);
            if self.aborted {
                return;
            }
        }
    }

    fn tick(&mut self) -> bool {
        self.nodes += 1;
        if self.nodes > self.max_nodes
            || (self.nodes % CLOCK_INTERVAL == 0 && Instant::now() >= self.deadline)
        {
            self.aborted = true;
        }
        self.aborted
    }

    fn can_improve(&self, lineup_bound: f64, score_bound: f64) -> bool {
        match &self.best {
            Some((best, _)) => SquadValue {
                lineup_points: lineup_bound,
                total_score: score_bound,
            }
            .beats(best),
            None => true,
        }
    }

    /// Decide candidate `i` of group `g` with `need` slots left in `g`.
    fn visit(&mut self, g: usize, i: usize, need: usize) {
        if self.tick() {
            return;
        }
        // Every remaining lock must still fit.
        if self.locked_suffix[g][i] > need {
            return;
        }

        if need == 0 {
            if g == 3 {
                self.record();
            } else {
                self.visit(g + 1, 0, self.quotas[g + 1]);
            }
            return;
        }

        let group_len = self.groups[g].len();
        if group_len - i < need {
            return;
        }

        // Value bound
        let picked = self.quotas[g] - need;
        let open_starters = self.starters[g].saturating_sub(picked).min(need);
        let points = &self.points[g];
        let lineup_bound =
            self.lineup + (points[i + open_starters] - points[i]) + self.later_points[g + 1];
        let score_bound = self.score + self.top_scores[g][i][need] + self.later_score[g + 1];
        if !self.can_improve(lineup_bound, score_bound) {
            return;
        }

        // Budget bound
        let min_cost = self.spent + self.cheapest[g][i][need] + self.later_cost[g + 1];
        if min_cost > self.constraints.budget + BUDGET_EPSILON {
            return;
        }

        // Window bounds
        if let Some(w) = self.window {
            let can_add = need.min(self.ref_suffix[g][i]) + self.later_ref_max[g + 1];
            let forced = need.saturating_sub(self.other_suffix[g][i]) + self.later_forced[g + 1];
            if self.kept + can_add < w.min || self.kept + forced > w.max {
                return;
            }
        }

        let c = self.groups[g][i];
        let locked = self.constraints.locked.contains(&c.id());
        let starter = picked < self.starters[g];
        let points_added = if starter { c.expected_points() } else { 0.0 };
        let club_count = self.clubs.get(&c.club()).copied().unwrap_or(0);
        let is_ref = self.constraints.is_reference(c.id());
        if club_count < self.constraints.max_per_club
            && self.spent + c.price() <= self.constraints.budget + BUDGET_EPSILON
        {
            self.chosen.push(c.id());
            *self.clubs.entry(c.club()).or_default() += 1;
            self.spent += c.price();
            self.score += c.score();
            self.lineup += points_added;
            if is_ref {
                self.kept += 1;
            }

            self.visit(g, i + 1, need - 1);

            self.chosen.pop();
            if let Some(n) = self.clubs.get_mut(&c.club()) {
                *n -= 1;
            }
            self.spent -= c.price();
            self.score -= c.score();
            self.lineup -= points_added;
            if is_ref {
                self.kept -= 1;
            }
            if self.aborted {
                return;
            }
        }

        if !locked {
            self.visit(g, i + 1, need);
        }
    }

    fn record(&mut self) {
        if let Some(w) = self.window {
            if !w.contains(self.kept) {
                return;
            }
        }
        let value = SquadValue {
            lineup_points: self.lineup,
            total_score: self.score,
        };
        let better = match &self.best {
            Some((best, _)) => value.beats(best),
            None => true,
        };
        if better {
            self.best = Some((value, self.chosen.iter().copied().collect()));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::lineups_for;
    use crate::testutil::{scored, standard_pool};

    fn solve(pool: &CandidatePool, c: &Constraints, target: Option<u32>) -> Result<Squad, SelectError> {
        BranchAndBoundSelector::default().select(pool, &SelectionRequest::new(c, target))
    }

    fn best_xi(squad: &Squad) -> f64 {
        lineups_for(squad, 1)[0].xi_points
    }

    /// Exhaustive optimum for tiny pools.
    fn brute_force(pool: &CandidatePool, c: &Constraints) -> Option<SquadValue> {
        let n = pool.len();
        let mut best: Option<SquadValue> = None;
        let cands = pool.candidates();
        for mask in 0u32..(1 << n) {
            if mask.count_ones() as usize != SQUAD_SIZE {
                continue;
            }
            let players: Vec<_> = (0..n)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| cands[i].clone())
                .collect();
            if let Ok(squad) = Squad::new(players, c) {
                let value = SquadValue::of(&squad, c);
                if best.map_or(true, |b| value.beats(&b)) {
                    best = Some(value);
                }
            }
        }
        best
    }

    fn small_pool() -> CandidatePool {
        // 3 GK, 6 DEF, 6 MID, 4 FWD = 19 players over 7 clubs
        let mut players = Vec::new();
        let mut id = 1;
        for (pos, n) in [
            (Position::Goalkeeper, 3),
            (Position::Defender, 6),
            (Position::Midfielder, 6),
            (Position::Forward, 4),
        ] {
            for k in 0..n {
                let price = 4.0 + ((id * 7) % 6) as f64;
                let score = 3.0 + ((id * 5) % 7) as f64 + k as f64 * 0.1;
                let mut p = scored(id, pos, id % 7, price, score);
                // lineup points and score disagree on some players
                p.prediction.expected_points = score + ((id * 3) % 4) as f64 * 0.5;
                players.push(p);
                id += 1;
            }
        }
        CandidatePool::from_scored(players, 1)
    }

    #[test]
    fn matches_brute_force_on_small_pool() {
        let pool = small_pool();
        for budget in [70.0, 80.0, 95.0, 200.0] {
            for chip in [None, Some(Chip::BenchBoost)] {
                let mut c = Constraints::with_budget(budget);
                c.chip = chip;
                let exact = brute_force(&pool, &c);
                match solve(&pool, &c, None) {
                    Ok(squad) => {
                        let best = exact.expect("solver found a squad brute force missed");
                        let found = SquadValue::of(&squad, &c);
                        assert!(
                            (found.lineup_points - best.lineup_points).abs() < 1e-6,
                            "budget {budget} chip {chip:?}"
                        );
                        assert!(
                            (found.total_score - best.total_score).abs() < 1e-6,
                            "budget {budget} chip {chip:?}"
                        );
                    }
                    Err(SelectError::Infeasible { .. }) => assert!(exact.is_none(), "budget {budget}"),
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
        }
    }

    #[test]
    fn respects_all_constraints_on_standard_pool() {
        let pool = standard_pool();
        let mut c = Constraints::with_budget(80.0);
        c.locked.insert(30);
        c.excluded.insert(29);
        let squad = solve(&pool, &c, None).unwrap();
        assert!(crate::squad::check(squad.players(), &c).is_empty());
        assert!(squad.contains(30));
        assert!(!squad.contains(29));
        assert!(squad.cost() <= 80.0 + 1e-9);
    }

    #[test]
    fn locked_weak_player_is_kept() {
        let pool = standard_pool();
        let c = Constraints::with_budget(100.0);
        let free = solve(&pool, &c, None).unwrap();
        let outsider = pool
            .candidates()
            .iter()
            .filter(|p| !free.contains(p.id()))
            .min_by(|a, b| a.score().partial_cmp(&b.score()).unwrap())
            .map(|p| p.id())
            .unwrap();
        let mut c = c;
        c.locked.insert(outsider);
        let squad = solve(&pool, &c, None).unwrap();
        assert!(squad.contains(outsider));
    }

    #[test]
    fn exact_transfer_count_is_honored() {
        let pool = standard_pool();
        let mut c = Constraints::with_budget(100.0);
        let base = solve(&pool, &Constraints::with_budget(78.0), None).unwrap();
        let reference = base.ids();
        c.reference = Some(reference.clone());
        for target in [0u32, 1, 3, 5] {
            let squad = solve(&pool, &c, Some(target)).unwrap();
            let transfers = SQUAD_SIZE - squad.kept_from(&reference);
            assert_eq!(transfers, target as usize, "target {target}");
        }
    }

    #[test]
    fn more_budget_never_lowers_the_best_xi() {
        // A spare keeper upgrade competes with a midfield upgrade: a squad
        // total objective would buy the keeper at 65.0 and lose XI points.
        let mut players = vec![
            scored(1, Position::Goalkeeper, 1, 4.0, 6.0),
            scored(2, Position::Goalkeeper, 2, 4.0, 1.0),
            scored(3, Position::Goalkeeper, 3, 7.0, 5.5),
            scored(4, Position::Midfielder, 4, 8.0, 8.0),
            scored(5, Position::Midfielder, 5, 6.0, 4.0),
        ];
        let mut id = 6;
        for (pos, n) in [
            (Position::Defender, 5),
            (Position::Midfielder, 4),
            (Position::Forward, 3),
        ] {
            for _ in 0..n {
                players.push(scored(id, pos, id, 4.0, 3.0));
                id += 1;
            }
        }
        let pool = CandidatePool::from_scored(players, 1);

        let mut previous = f64::NEG_INFINITY;
        for budget in [62.0, 63.0, 64.0, 65.0, 66.0, 70.0] {
            let squad = solve(&pool, &Constraints::with_budget(budget), None).unwrap();
            let xi = best_xi(&squad);
            assert!(xi >= previous - 1e-9, "budget {budget}: {xi} < {previous}");
            previous = xi;
        }
        let at_65 = solve(&pool, &Constraints::with_budget(65.0), None).unwrap();
        assert!((best_xi(&at_65) - 41.0).abs() < 1e-9);
        assert!(at_65.contains(4));
    }

    #[test]
    fn infeasible_budget() {
        let pool = standard_pool();
        let c = Constraints::with_budget(30.0);
        assert!(matches!(
            solve(&pool, &c, None),
            Err(SelectError::Infeasible { .. })
        ));
    }

    #[test]
    fn node_limit_reports_timeout() {
        let pool = standard_pool();
        let c = Constraints::with_budget(100.0);
        let tiny = BranchAndBoundSelector::new(Duration::from_secs(60), 5);
        let err = tiny
            .select(&pool, &SelectionRequest::new(&c, None))
            .unwrap_err();
        match err {
            SelectError::Timeout { nodes, .. } => assert!(nodes > 5),
            other => panic!("expected Timeout, got: {other}"),
        }
    }

    #[test]
    fn disabled_solver_is_unavailable() {
        let solver = ExactSolver::from_config(&SolverConfig {
            enabled: false,
            ..SolverConfig::default()
        });
        assert!(matches!(solver, ExactSolver::Disabled));
        let pool = standard_pool();
        let c = Constraints::with_budget(100.0);
        let r = solver.select(&pool, &SelectionRequest::new(&c, None));
        assert!(matches!(r, Err(SelectError::SolverUnavailable)));
    }

    #[test]
    fn dominated_candidates_removed_only_with_enough_clubs() {
        let c = Constraints::with_budget(100.0);
        // 10 strong cheap forwards from distinct clubs and one weak expensive one
        let mut players: Vec<_> = (1..=10)
            .map(|id| scored(id, Position::Forward, id, 5.0, 8.0))
            .collect();
        players.push(scored(11, Position::Forward, 11, 9.0, 2.0));
        let refs: Vec<&ScoredCandidate> = players.iter().collect();
        // need 3: threshold = 2 + 4 + 1 = 7 distinct clubs
        let kept = reduce_dominated(&refs, 3, &c);
        assert!(!kept.iter().any(|p| p.id() == 11));

        // a locked player is never dropped
        let mut locked = c.clone();
        locked.locked.insert(11);
        assert!(reduce_dominated(&refs, 3, &locked).iter().any(|p| p.id() == 11));

        // same players but all from one club: never enough distinct clubs
        let same_club: Vec<_> = players
            .iter()
            .map(|p| scored(p.id(), Position::Forward, 1, p.price(), p.score()))
            .collect();
        let refs: Vec<&ScoredCandidate> = same_club.iter().collect();
        let kept = reduce_dominated(&refs, 3, &c);
        assert_eq!(kept.len(), 11);
    }

    #[test]
    fn suffix_tables() {
        let t = best_k_suffix(&[3.0, 1.0, 2.0], 2, false);
        assert_eq!(t[0][2], 3.0);
        assert_eq!(t[1][2], 3.0);
        assert_eq!(t[2][1], 2.0);
        assert!(t[2][2].is_infinite());
        let t = best_k_suffix(&[3.0, 1.0, 2.0], 2, true);
        assert_eq!(t[0][2], 5.0);
        assert_eq!(t[1][1], 2.0);
    }
}
