// Greedy squad construction with a swap-improvement pass.
//
// Construction seats the locked players, then the best reference players
// needed to reach the transfer window floor, then fills the remaining slots
// in score order. A candidate is only taken when a cheapest-first
// completion after it (club and window aware) still fits the budget. When
// that single pass cannot complete a squad, a cheapest-first backtracking
// search looks for any valid squad. Either result is then improved by
// single swaps until none raises the squad value.

use super::{
    finish, free_candidates, seat_locked, KeepWindow, SelectError, SelectionRequest, Seated,
    SquadSelector, SquadValue,
};
use crate::player::PlayerId;
use crate::pool::{CandidatePool, ScoredCandidate};
use crate::rules::Constraints;
use crate::squad::{Squad, BUDGET_EPSILON};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Nodes the backtracking search may visit before giving up.
const BACKTRACK_NODE_LIMIT: u64 = 2_000_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySelector;

impl GreedySelector {
    pub fn new() -> Self {
        GreedySelector
    }
}

impl SquadSelector for GreedySelector {
    fn name(&self) -> &'static str {
        "greedy"
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

        let base = seat_locked(pool, constraints)?;
        let free = free_candidates(pool, constraints);

        let built = construct(base.clone(), &free, constraints, window).or_else(|| {
            debug!(
                "greedy fill failed for target {:?}, backtracking cheapest-first",
                request.transfer_target
            );
            Backtrack::new(base, &free, constraints, window).run()
        });
        let Some(mut seated) = built else {
            return Err(SelectError::infeasible(
                "greedy construction could not fill every slot within the budget",
            ));
        };

        let swaps = improve(&mut seated, &free, constraints, window);
        debug!(
            "greedy target {:?}: {} improving swaps",
            request.transfer_target, swaps
        );

        finish(pool, &seated.ids(), request)
    }
}

fn by_score(a: &&ScoredCandidate, b: &&ScoredCandidate) -> Ordering {
    b.score()
        .partial_cmp(&a.score())
        .unwrap_or(Ordering::Equal)
        .then(a.id().cmp(&b.id()))
}

fn by_price(a: &&ScoredCandidate, b: &&ScoredCandidate) -> Ordering {
    a.price()
        .partial_cmp(&b.price())
        .unwrap_or(Ordering::Equal)
        .then(a.id().cmp(&b.id()))
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Cost of filling `need` cheapest-first from candidates not yet taken,
/// after seating `next`. Club counts include `next`; players of a full club
/// and reference players beyond the window maximum are passed over.
/// `by_price` is every free candidate in ascending price order.
fn cheapest_completion(
    need: [usize; 4],
    seated: &Seated<'_>,
    next: &ScoredCandidate,
    constraints: &Constraints,
    window: Option<KeepWindow>,
    by_price: &[&ScoredCandidate],
    taken: &HashSet<PlayerId>,
) -> Option<f64> {
    let mut left = need;
    let mut remaining: usize = left.iter().sum();
    let mut clubs = seated.clubs.clone();
    *clubs.entry(next.club()).or_default() += 1;
    let mut kept = seated.kept + usize::from(constraints.is_reference(next.id()));
    let mut cost = 0.0;
    for c in by_price {
        if remaining == 0 {
            break;
        }
        if c.id() == next.id() || taken.contains(&c.id()) {
            continue;
        }
        let is_ref = constraints.is_reference(c.id());
        if is_ref && window.is_some_and(|w| kept >= w.max) {
            continue;
        }
        let slot = &mut left[c.position().index()];
        let count = clubs.entry(c.club()).or_default();
        if *slot > 0 && *count < constraints.max_per_club {
            *slot -= 1;
            *count += 1;
            remaining -= 1;
            cost += c.price();
            kept += usize::from(is_ref);
        }
    }
    (remaining == 0).then_some(cost)
}

fn fits(
    seated: &Seated<'_>,
    c: &ScoredCandidate,
    constraints: &Constraints,
    window: Option<KeepWindow>,
    by_price: &[&ScoredCandidate],
    taken: &HashSet<PlayerId>,
) -> bool {
    let slot = c.position().index();
    if seated.need[slot] == 0 || seated.club_count(c.club()) >= constraints.max_per_club {
        return false;
    }
    let mut need = seated.need;
    need[slot] -= 1;
    match cheapest_completion(need, seated, c, constraints, window, by_price, taken) {
        Some(rest) => seated.spent + c.price() + rest <= constraints.budget + BUDGET_EPSILON,
        None => false,
    }
}

fn construct<'a>(
    mut seated: Seated<'a>,
    free: &[&'a ScoredCandidate],
    constraints: &Constraints,
    window: Option<KeepWindow>,
) -> Option<Seated<'a>> {
    let mut cheapest: Vec<&ScoredCandidate> = free.to_vec();
    cheapest.sort_by(by_price);
    let mut ordered: Vec<&'a ScoredCandidate> = free.to_vec();
    ordered.sort_by(by_score);
    let mut taken: HashSet<PlayerId> = seated.chosen.iter().map(|c| c.id()).collect();

    // Reach the window floor with the best reference players.
    if let Some(w) = window {
        for &c in &ordered {
            if seated.kept >= w.min {
                break;
            }
            if constraints.is_reference(c.id())
                && fits(&seated, c, constraints, window, &cheapest, &taken)
            {
                taken.insert(c.id());
                seated.seat(c, constraints);
            }
        }
        if seated.kept < w.min {
            return None;
        }
    }

    for &c in &ordered {
        if seated.remaining() == 0 {
            break;
        }
        if taken.contains(&c.id()) {
            continue;
        }
        if let Some(w) = window {
            if constraints.is_reference(c.id()) && seated.kept >= w.max {
                continue;
            }
        }
        if fits(&seated, c, constraints, window, &cheapest, &taken) {
            taken.insert(c.id());
            seated.seat(c, constraints);
        }
    }

    (seated.remaining() == 0).then_some(seated)
}

// ---------------------------------------------------------------------------
// Backtracking
// ---------------------------------------------------------------------------

/// Depth-first search for any valid completion, cheapest candidates first.
/// Pruned on budget (cheapest fill of every open slot), club ceiling and
/// the reachable kept-reference range.
struct Backtrack<'a, 'c> {
    seated: Seated<'a>,
    /// Free candidates by position, ascending price.
    groups: [Vec<&'a ScoredCandidate>; 4],
    /// prices[g][i] = total price of the first i candidates of group g.
    prices: [Vec<f64>; 4],
    ref_suffix: [Vec<usize>; 4],
    other_suffix: [Vec<usize>; 4],
    /// Aggregates over groups g.. for the initial open slots.
    later_cost: [f64; 5],
    later_ref_max: [usize; 5],
    later_forced: [usize; 5],
    constraints: &'c Constraints,
    window: Option<KeepWindow>,
    nodes: u64,
}

impl<'a, 'c> Backtrack<'a, 'c> {
    fn new(
        seated: Seated<'a>,
        free: &[&'a ScoredCandidate],
        constraints: &'c Constraints,
        window: Option<KeepWindow>,
    ) -> Self {
        let mut groups: [Vec<&'a ScoredCandidate>; 4] = Default::default();
        for &c in free {
            groups[c.position().index()].push(c);
        }
        let mut prices: [Vec<f64>; 4] = Default::default();
        let mut ref_suffix: [Vec<usize>; 4] = Default::default();
        let mut other_suffix: [Vec<usize>; 4] = Default::default();
        for g in 0..4 {
            groups[g].sort_by(by_price);
            let group = &groups[g];
            let n = group.len();
            let mut p = Vec::with_capacity(n + 1);
            p.push(0.0);
            for c in group {
                p.push(p[p.len() - 1] + c.price());
            }
            prices[g] = p;
            let mut refs = vec![0usize; n + 1];
            let mut others = vec![0usize; n + 1];
            for i in (0..n).rev() {
                let is_ref = constraints.is_reference(group[i].id());
                refs[i] = refs[i + 1] + usize::from(is_ref);
                others[i] = others[i + 1] + usize::from(!is_ref);
            }
            ref_suffix[g] = refs;
            other_suffix[g] = others;
        }

        let mut later_cost = [0.0; 5];
        let mut later_ref_max = [0usize; 5];
        let mut later_forced = [0usize; 5];
        for g in (0..4).rev() {
            let need = seated.need[g];
            let cheapest = prices[g].get(need).copied().unwrap_or(f64::INFINITY);
            later_cost[g] = later_cost[g + 1] + cheapest;
            later_ref_max[g] = later_ref_max[g + 1] + need.min(ref_suffix[g][0]);
            later_forced[g] = later_forced[g + 1] + need.saturating_sub(other_suffix[g][0]);
        }

        Backtrack {
            seated,
            groups,
            prices,
            ref_suffix,
            other_suffix,
            later_cost,
            later_ref_max,
            later_forced,
            constraints,
            window,
            nodes: 0,
        }
    }

    fn run(mut self) -> Option<Seated<'a>> {
        let found = self.visit(0, 0);
        debug!("greedy backtracking: {} nodes, found={}", self.nodes, found);
        found.then_some(self.seated)
    }

    fn visit(&mut self, g: usize, i: usize) -> bool {
        self.nodes += 1;
        if self.nodes > BACKTRACK_NODE_LIMIT {
            return false;
        }

        let need = self.seated.need[g];
        if need == 0 {
            if g == 3 {
                return self.window.map_or(true, |w| w.contains(self.seated.kept));
            }
            return self.visit(g + 1, 0);
        }
        let group_len = self.groups[g].len();
        if group_len - i < need {
            return false;
        }

        let prices = &self.prices[g];
        let min_cost = self.seated.spent + (prices[i + need] - prices[i]) + self.later_cost[g + 1];
        if min_cost > self.constraints.budget + BUDGET_EPSILON {
            return false;
        }

        if let Some(w) = self.window {
            let kept = self.seated.kept;
            let can_add = need.min(self.ref_suffix[g][i]) + self.later_ref_max[g + 1];
            let forced = need.saturating_sub(self.other_suffix[g][i]) + self.later_forced[g + 1];
            if kept + can_add < w.min || kept + forced > w.max {
                return false;
            }
        }

        let c = self.groups[g][i];
        if self.seated.club_count(c.club()) < self.constraints.max_per_club {
            self.seated.seat(c, self.constraints);
            if self.visit(g, i + 1) {
                return true;
            }
            let last = self.seated.chosen.len() - 1;
            self.seated.unseat(last, self.constraints);
        }
        if self.nodes > BACKTRACK_NODE_LIMIT {
            return false;
        }
        self.visit(g, i + 1)
    }
}

// ---------------------------------------------------------------------------
// Improvement
// ---------------------------------------------------------------------------

/// Apply the best single same-position swap until none raises the squad
/// value. Locked players never leave. Returns the number of swaps made.
fn improve<'a>(
    seated: &mut Seated<'a>,
    free: &[&'a ScoredCandidate],
    constraints: &Constraints,
    window: Option<KeepWindow>,
) -> usize {
    let mut swaps = 0;
    loop {
        let taken: HashSet<PlayerId> = seated.chosen.iter().map(|c| c.id()).collect();
        let current = SquadValue::of_players(&seated.chosen, constraints);
        let mut best: Option<(SquadValue, usize, &'a ScoredCandidate)> = None;
        let mut trial = seated.chosen.clone();

        for (idx, &out) in seated.chosen.iter().enumerate() {
            if constraints.locked.contains(&out.id()) {
                continue;
            }
            for &inc in free {
                if inc.position() != out.position() || taken.contains(&inc.id()) {
                    continue;
                }
                let spent = seated.spent - out.price() + inc.price();
                if spent > constraints.budget + BUDGET_EPSILON {
                    continue;
                }
                if inc.club() != out.club()
                    && seated.club_count(inc.club()) >= constraints.max_per_club
                {
                    continue;
                }
                if let Some(w) = window {
                    let kept = seated.kept - usize::from(constraints.is_reference(out.id()))
                        + usize::from(constraints.is_reference(inc.id()));
                    if !w.contains(kept) {
                        continue;
                    }
                }
                trial[idx] = inc;
                let value = SquadValue::of_players(&trial, constraints);
                trial[idx] = out;
                let to_beat = best.as_ref().map_or(&current, |(v, _, _)| v);
                if value.beats(to_beat) {
                    best = Some((value, idx, inc));
                }
            }
        }

        let Some((_, idx, inc)) = best else {
            return swaps;
        };
        seated.unseat(idx, constraints);
        seated.seat(inc, constraints);
        swaps += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
