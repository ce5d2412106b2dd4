// Starting XI, bench order and captaincy for a squad.

use crate::player::{PlayerId, Position};
use crate::pool::ScoredCandidate;
use crate::rules::XI_SIZE;
use crate::squad::Squad;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ---------------------------------------------------------------------------
// FormationShape
// ---------------------------------------------------------------------------

/// Outfield shape of a starting XI: defenders-midfielders-forwards behind
/// one goalkeeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormationShape {
    #[serde(rename = "3-4-3")]
    ThreeFourThree,
    #[serde(rename = "3-5-2")]
    ThreeFiveTwo,
    #[serde(rename = "4-3-3")]
    FourThreeThree,
    #[serde(rename = "4-4-2")]
    FourFourTwo,
    #[serde(rename = "4-5-1")]
    FourFiveOne,
    #[serde(rename = "5-3-2")]
    FiveThreeTwo,
    #[serde(rename = "5-4-1")]
    FiveFourOne,
}

impl FormationShape {
    pub const ALL: [FormationShape; 7] = [
        FormationShape::ThreeFourThree,
        FormationShape::ThreeFiveTwo,
        FormationShape::FourThreeThree,
        FormationShape::FourFourTwo,
        FormationShape::FourFiveOne,
        FormationShape::FiveThreeTwo,
        FormationShape::FiveFourOne,
    ];

    /// (defenders, midfielders, forwards)
    pub fn counts(&self) -> (usize, usize, usize) {
        match self {
            FormationShape::ThreeFourThree => (3, 4, 3),
            FormationShape::ThreeFiveTwo => (3, 5, 2),
            FormationShape::FourThreeThree => (4, 3, 3),
            FormationShape::FourFourTwo => (4, 4, 2),
            FormationShape::FourFiveOne => (4, 5, 1),
            FormationShape::FiveThreeTwo => (5, 3, 2),
            FormationShape::FiveFourOne => (5, 4, 1),
        }
    }

    /// Starters required at `position`, goalkeeper included.
    pub fn required(&self, position: Position) -> usize {
        let (d, m, f) = self.counts();
        match position {
            Position::Goalkeeper => 1,
            Position::Defender => d,
            Position::Midfielder => m,
            Position::Forward => f,
        }
    }

    pub fn from_counts(d: usize, m: usize, f: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.counts() == (d, m, f))
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormationShape::ThreeFourThree => "3-4-3",
            FormationShape::ThreeFiveTwo => "3-5-2",
            FormationShape::FourThreeThree => "4-3-3",
            FormationShape::FourFourTwo => "4-4-2",
            FormationShape::FourFiveOne => "4-5-1",
            FormationShape::FiveThreeTwo => "5-3-2",
            FormationShape::FiveFourOne => "5-4-1",
        }
    }
}

impl fmt::Display for FormationShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Lineup
// ---------------------------------------------------------------------------

/// A squad split into starters and bench for one shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lineup {
    pub shape: FormationShape,
    /// Goalkeeper first, then defenders, midfielders, forwards.
    pub starters: Vec<PlayerId>,
    /// Reserve goalkeeper first, then outfielders by expected points.
    pub bench: Vec<PlayerId>,
    pub captain: PlayerId,
    pub vice_captain: PlayerId,
    /// Expected points of the starters over the horizon.
    pub xi_points: f64,
    pub bench_points: f64,
    /// Captain's expected points over the horizon.
    pub captain_points: f64,
}

/// Stronger starter first: expected points, then optimization score, then id.
pub(crate) fn starter_order(a: &&ScoredCandidate, b: &&ScoredCandidate) -> Ordering {
    b.expected_points()
        .partial_cmp(&a.expected_points())
        .unwrap_or(Ordering::Equal)
        .then(b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal))
        .then(a.id().cmp(&b.id()))
}

/// Captaincy order: per-period expectation, then id.
fn captain_order(a: &&ScoredCandidate, b: &&ScoredCandidate) -> Ordering {
    b.prediction
        .expected_points_per_period
        .partial_cmp(&a.prediction.expected_points_per_period)
        .unwrap_or(Ordering::Equal)
        .then(a.id().cmp(&b.id()))
}

/// Build the lineup for `shape`, or `None` when the squad cannot fill it.
pub fn lineup_for_shape(squad: &Squad, shape: FormationShape) -> Option<Lineup> {
    let mut starters: Vec<&ScoredCandidate> = Vec::with_capacity(XI_SIZE);
    let mut reserve_keepers: Vec<&ScoredCandidate> = Vec::new();
    let mut reserve_outfield: Vec<&ScoredCandidate> = Vec::new();

    for position in Position::ALL {
        let mut group: Vec<&ScoredCandidate> = squad.by_position(position).collect();
        let required = shape.required(position);
        if group.len() < required {
            return None;
        }
        group.sort_by(starter_order);
        let rest = group.split_off(required);
        starters.extend(group);
        match position {
            Position::Goalkeeper => reserve_keepers.extend(rest),
            _ => reserve_outfield.extend(rest),
        }
    }

    let mut ranked = starters.clone();
    ranked.sort_by(captain_order);
    let (captain, vice) = match ranked.as_slice() {
        [first, second, ..] => (*first, *second),
        _ => return None,
    };

    reserve_keepers.sort_by(starter_order);
    reserve_outfield.sort_by(starter_order);
    let bench: Vec<&ScoredCandidate> = reserve_keepers.into_iter().chain(reserve_outfield).collect();

    Some(Lineup {
        shape,
        xi_points: starters.iter().map(|c| c.expected_points()).sum(),
        bench_points: bench.iter().map(|c| c.expected_points()).sum(),
        captain_points: captain.expected_points(),
        captain: captain.id(),
        vice_captain: vice.id(),
        starters: starters.iter().map(|c| c.id()).collect(),
        bench: bench.iter().map(|c| c.id()).collect(),
    })
}

/// The best `limit` lineups for a squad by XI expected points. Shapes with
/// equal XI points keep their declaration order.
pub fn lineups_for(squad: &Squad, limit: usize) -> Vec<Lineup> {
    let mut lineups: Vec<Lineup> = FormationShape::ALL
        .into_iter()
        .filter_map(|shape| lineup_for_shape(squad, shape))
        .collect();
    lineups.sort_by(|a, b| {
        b.xi_points
            .partial_cmp(&a.xi_points)
            .unwrap_or(Ordering::Equal)
            .then(a.shape.cmp(&b.shape))
    });
    lineups.truncate(limit);
    lineups
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
