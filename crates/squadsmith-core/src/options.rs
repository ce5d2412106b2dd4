// Option building and ranking: squads plus lineups become scored, ranked
// recommendations.

use crate::config::{OptionsConfig, RulesConfig};
use crate::formation::{FormationShape, Lineup};
use crate::player::{ClubId, PlayerId, Position};
use crate::prediction::ScoreSource;
use crate::rules::{Chip, Constraints};
use crate::squad::Squad;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One squad member as reported in an option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionPlayer {
    pub id: PlayerId,
    pub name: String,
    pub club: ClubId,
    pub club_name: String,
    pub position: Position,
    pub price: f64,
    pub expected_points: f64,
    pub expected_points_per_period: f64,
    pub optimization_score: f64,
    pub confidence: f64,
    pub risk: f64,
    pub source: ScoreSource,
    pub starter: bool,
    pub captain: bool,
    pub vice_captain: bool,
    /// Bought relative to the reference squad.
    pub transfer_in: bool,
}

/// A ranked recommendation: one squad in one formation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadOption {
    pub players: Vec<OptionPlayer>,
    pub lineup: Lineup,
    pub formation: FormationShape,
    pub cost: f64,
    pub xi_points: f64,
    pub bench_points: f64,
    pub captain_bonus: f64,
    pub transfers_in: Vec<PlayerId>,
    pub transfers_out: Vec<PlayerId>,
    pub transfer_count: u32,
    pub transfer_penalty: f64,
    pub chip: Option<Chip>,
    pub effective_points: f64,
    /// Effective points on a 0-100 scale.
    pub composite_score: f64,
    /// Transfer count the selector aimed for, `None` without a reference.
    pub transfer_target: Option<u32>,
}

impl SquadOption {
    pub fn squad_ids(&self) -> BTreeSet<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Everything needed to price a (squad, lineup) pair for one request.
#[derive(Debug, Clone)]
pub struct OptionScoring<'a> {
    pub reference: Option<&'a BTreeSet<PlayerId>>,
    pub free_transfers: u32,
    pub chip: Option<Chip>,
    pub transfer_penalty: f64,
    /// Composite anchors over the whole horizon.
    pub typical_points: f64,
    pub ceiling_points: f64,
}

impl<'a> OptionScoring<'a> {
    pub fn new(constraints: &'a Constraints, rules: &RulesConfig, options: &OptionsConfig) -> Self {
        let horizon = constraints.horizon.max(1) as f64;
        OptionScoring {
            reference: constraints.reference.as_ref(),
            free_transfers: constraints.free_transfers,
            chip: constraints.chip,
            transfer_penalty: rules.transfer_penalty,
            typical_points: options.typical_xi_points * horizon,
            ceiling_points: options.ceiling_xi_points * horizon,
        }
    }

    pub fn penalty(&self, transfer_count: u32) -> f64 {
        if self.chip.is_some_and(|c| c.unlimited_transfers()) || transfer_count <= self.free_transfers {
            0.0
        } else {
            (transfer_count - self.free_transfers) as f64 * self.transfer_penalty
        }
    }

    /// Map effective points onto 0-100: linear to 50 at the typical anchor,
    /// then linear to 100 at the ceiling anchor.
    pub fn composite(&self, effective: f64) -> f64 {
        let typical = self.typical_points;
        let ceiling = self.ceiling_points;
        let raw = if typical <= 0.0 {
            0.0
        } else if effective <= typical {
            50.0 * effective / typical
        } else if ceiling > typical {
            50.0 + 50.0 * (effective - typical) / (ceiling - typical)
        } else {
            100.0
        };
        if raw.is_finite() {
            raw.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Price one lineup of a squad.
pub fn build_option(
    squad: &Squad,
    lineup: Lineup,
    transfer_target: Option<u32>,
    scoring: &OptionScoring<'_>,
) -> SquadOption {
    let ids = squad.ids();
    let (transfers_in, transfers_out): (Vec<PlayerId>, Vec<PlayerId>) = match scoring.reference {
        Some(reference) => (
            ids.difference(reference).copied().collect(),
            reference.difference(&ids).copied().collect(),
        ),
        None => (Vec::new(), Vec::new()),
    };
    let transfer_count = transfers_in.len() as u32;
    let transfer_penalty = scoring.penalty(transfer_count);

    let multiplier = if scoring.chip == Some(Chip::TripleCaptain) { 2.0 } else { 1.0 };
    let captain_bonus = lineup.captain_points * multiplier;
    let bench_contribution = if scoring.chip == Some(Chip::BenchBoost) {
        lineup.bench_points
    } else {
        0.0
    };
    let effective_points = lineup.xi_points + captain_bonus + bench_contribution - transfer_penalty;

    let starters: HashSet<PlayerId> = lineup.starters.iter().copied().collect();
    let bought: HashSet<PlayerId> = transfers_in.iter().copied().collect();
    let players = squad
        .players()
        .iter()
        .map(|c| OptionPlayer {
            id: c.id(),
            name: c.player.name.clone(),
            club: c.club(),
            club_name: c.player.club_name.clone(),
            position: c.position(),
            price: c.price(),
            expected_points: c.expected_points(),
            expected_points_per_period: c.prediction.expected_points_per_period,
            optimization_score: c.score(),
            confidence: c.prediction.confidence,
            risk: c.prediction.risk,
            source: c.source,
            starter: starters.contains(&c.id()),
            captain: c.id() == lineup.captain,
            vice_captain: c.id() == lineup.vice_captain,
            transfer_in: bought.contains(&c.id()),
        })
        .collect();

    SquadOption {
        players,
        formation: lineup.shape,
        cost: squad.cost(),
        xi_points: lineup.xi_points,
        bench_points: lineup.bench_points,
        captain_bonus,
        transfers_in,
        transfers_out,
        transfer_count,
        transfer_penalty,
        chip: scoring.chip,
        effective_points,
        composite_score: scoring.composite(effective_points),
        transfer_target,
        lineup,
    }
}

// ---------------------------------------------------------------------------
// Dedup / ranking
// ---------------------------------------------------------------------------

/// Keep the first squad for each distinct 15-player set.
pub fn dedupe_squads(squads: Vec<(Option<u32>, Squad)>) -> Vec<(Option<u32>, Squad)> {
    let mut seen: HashSet<BTreeSet<PlayerId>> = HashSet::new();
    squads
        .into_iter()
        .filter(|(_, squad)| seen.insert(squad.ids()))
        .collect()
}

/// 0: no penalty, 1: a paid hit of at most two transfers, 2: the rest.
fn tier(option: &SquadOption) -> u8 {
    if option.transfer_penalty <= 0.0 {
        0
    } else if option.transfer_count <= 2 {
        1
    } else {
        2
    }
}

/// Tier, then one or two moves ahead of other counts, then composite.
fn rank_order(a: &SquadOption, b: &SquadOption) -> Ordering {
    let outside_small = |o: &SquadOption| !(1..=2).contains(&o.transfer_count);
    tier(a)
        .cmp(&tier(b))
        .then(outside_small(a).cmp(&outside_small(b)))
        .then(
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(Ordering::Equal),
        )
        .then(a.transfer_count.cmp(&b.transfer_count))
        .then(a.formation.cmp(&b.formation))
        .then_with(|| a.squad_ids().cmp(&b.squad_ids()))
}

/// Sort options best first and keep at most `max_options`.
pub fn rank(mut options: Vec<SquadOption>, max_options: usize) -> Vec<SquadOption> {
    options.sort_by(rank_order);
    options.truncate(max_options);
    options
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::lineup_for_shape;
    use crate::pool::CandidatePool;
    use crate::testutil::{scored, standard_pool};

    fn squad_from(pool: &CandidatePool, ids: &[PlayerId]) -> Squad {
        Squad::from_ids(pool, &ids.iter().copied().collect(), &Constraints::with_budget(200.0)).unwrap()
    }

    /// GK 1,2; DEF 5-9; MID 15-19; FWD 25-27
    fn base_ids() -> Vec<PlayerId> {
        vec![1, 2, 5, 6, 7, 8, 9, 15, 16, 17, 18, 19, 25, 26, 27]
    }

    fn scoring_for(constraints: &Constraints) -> OptionScoring<'_> {
        OptionScoring::new(constraints, &RulesConfig::default(), &OptionsConfig::default())
    }

    fn option_for(squad: &Squad, constraints: &Constraints) -> SquadOption {
        let lineup = lineup_for_shape(squad, FormationShape::FourFourTwo).unwrap();
        build_option(squad, lineup, None, &scoring_for(constraints))
    }

    #[test]
    fn transfers_and_penalty() {
        let pool = standard_pool();
        let reference: BTreeSet<PlayerId> = base_ids().into_iter().collect();
        let mut ids = base_ids();
        // swap three: 5 -> 10, 15 -> 20, 25 -> 28
        for (out, inc) in [(5, 10), (15, 20), (25, 28)] {
            let at = ids.iter().position(|&i| i == out).unwrap();
            ids[at] = inc;
        }
        let squad = squad_from(&pool, &ids);

        let mut c = Constraints::with_budget(200.0);
        c.reference = Some(reference);
        c.free_transfers = 1;
        let opt = option_for(&squad, &c);
        assert_eq!(opt.transfer_count, 3);
        assert_eq!(opt.transfers_in, vec![10, 20, 28]);
        assert_eq!(opt.transfers_out, vec![5, 15, 25]);
        assert!((opt.transfer_penalty - 8.0).abs() < 1e-9);
        assert!(opt.players.iter().filter(|p| p.transfer_in).count() == 3);

        c.chip = Some(Chip::Wildcard);
        let opt = option_for(&squad, &c);
        assert_eq!(opt.transfer_penalty, 0.0);
    }

    #[test]
    fn chips_change_effective_points() {
        let pool = standard_pool();
        let squad = squad_from(&pool, &base_ids());
        let plain = option_for(&squad, &Constraints::with_budget(200.0));
        assert!((plain.captain_bonus - plain.lineup.captain_points).abs() < 1e-9);
        assert!((plain.effective_points - (plain.xi_points + plain.captain_bonus)).abs() < 1e-9);

        let mut c = Constraints::with_budget(200.0);
        c.chip = Some(Chip::TripleCaptain);
        let triple = option_for(&squad, &c);
        assert!((triple.captain_bonus - 2.0 * triple.lineup.captain_points).abs() < 1e-9);

        c.chip = Some(Chip::BenchBoost);
        let boost = option_for(&squad, &c);
        assert!(
            (boost.effective_points - (boost.xi_points + boost.captain_bonus + boost.bench_points)).abs()
                < 1e-9
        );
    }

    #[test]
    fn composite_anchors() {
        let c = Constraints::with_budget(100.0);
        let s = scoring_for(&c);
        assert_eq!(s.composite(0.0), 0.0);
        assert!((s.composite(27.5) - 25.0).abs() < 1e-9);
        assert!((s.composite(55.0) - 50.0).abs() < 1e-9);
        assert!((s.composite(70.0) - 75.0).abs() < 1e-9);
        assert_eq!(s.composite(200.0), 100.0);
        assert_eq!(s.composite(-10.0), 0.0);

        let mut long = Constraints::with_budget(100.0);
        long.horizon = 2;
        assert!((scoring_for(&long).composite(110.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn dedupe_keeps_first_target() {
        let pool = standard_pool();
        let a = squad_from(&pool, &base_ids());
        let mut other = base_ids();
        other[0] = 3;
        let b = squad_from(&pool, &other);
        let out = dedupe_squads(vec![(Some(0), a.clone()), (Some(1), a), (Some(2), b)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, Some(0));
        assert_eq!(out[1].0, Some(2));
    }

    fn bare(count: u32, penalty: f64, composite: f64) -> SquadOption {
        let players: Vec<_> = (1..=15)
            .map(|id| {
                let pos = match id {
                    1..=2 => Position::Goalkeeper,
                    3..=7 => Position::Defender,
                    8..=12 => Position::Midfielder,
                    _ => Position::Forward,
                };
                scored(id, pos, id, 5.0, 4.0)
            })
            .collect();
        let squad = Squad::new(players, &Constraints::with_budget(100.0)).unwrap();
        let c = Constraints::with_budget(100.0);
        let mut opt = option_for(&squad, &c);
        opt.transfer_count = count;
        opt.transfer_penalty = penalty;
        opt.composite_score = composite;
        opt
    }

    #[test]
    fn ranking_prefers_small_free_moves_then_composite() {
        let options = vec![
            bare(4, 8.0, 90.0),
            bare(2, 4.0, 80.0),
            bare(0, 0.0, 40.0),
            bare(1, 0.0, 40.0),
            bare(3, 0.0, 60.0),
        ];
        let ranked = rank(options, 10);
        let order: Vec<(u32, f64)> = ranked.iter().map(|o| (o.transfer_count, o.composite_score)).collect();
        assert_eq!(order, vec![(1, 40.0), (3, 60.0), (0, 40.0), (2, 80.0), (4, 90.0)]);
    }

    #[test]
    fn ranking_truncates() {
        let options = (0..5).map(|i| bare(0, 0.0, i as f64)).collect();
        let ranked = rank(options, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].composite_score, 4.0);
    }
}
