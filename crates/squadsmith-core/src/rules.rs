// Squad composition rules: position quotas, chips and per-request constraints.

use crate::player::{PlayerId, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Number of players in every squad.
pub const SQUAD_SIZE: usize = 15;
/// Number of starters in every lineup.
pub const XI_SIZE: usize = 11;

// ---------------------------------------------------------------------------
// Chip
// ---------------------------------------------------------------------------

/// One-off modifiers a manager may play for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chip {
    Wildcard,
    FreeHit,
    BenchBoost,
    TripleCaptain,
}

impl Chip {
    /// Wildcard and free hit lift the transfer limit for the period.
    pub fn unlimited_transfers(&self) -> bool {
        matches!(self, Chip::Wildcard | Chip::FreeHit)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Chip::Wildcard => "wildcard",
            Chip::FreeHit => "free_hit",
            Chip::BenchBoost => "bench_boost",
            Chip::TripleCaptain => "triple_captain",
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// PositionQuotas
// ---------------------------------------------------------------------------

/// Required number of players per position in a squad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionQuotas {
    pub goalkeepers: usize,
    pub defenders: usize,
    pub midfielders: usize,
    pub forwards: usize,
}

impl Default for PositionQuotas {
    fn default() -> Self {
        PositionQuotas {
            goalkeepers: 2,
            defenders: 5,
            midfielders: 5,
            forwards: 3,
        }
    }
}

impl PositionQuotas {
    pub fn for_position(&self, pos: Position) -> usize {
        match pos {
            Position::Goalkeeper => self.goalkeepers,
            Position::Defender => self.defenders,
            Position::Midfielder => self.midfielders,
            Position::Forward => self.forwards,
        }
    }

    /// Quotas indexed by `Position::index()`.
    pub fn as_array(&self) -> [usize; 4] {
        [
            self.goalkeepers,
            self.defenders,
            self.midfielders,
            self.forwards,
        ]
    }

    pub fn total(&self) -> usize {
        self.as_array().iter().sum()
    }
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Everything a selector needs to know about what makes a squad legal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub budget: f64,
    pub quotas: PositionQuotas,
    pub max_per_club: usize,
    pub locked: BTreeSet<PlayerId>,
    pub excluded: BTreeSet<PlayerId>,
    pub reference: Option<BTreeSet<PlayerId>>,
    pub free_transfers: u32,
    pub chip: Option<Chip>,
    pub horizon: u32,
}

impl Constraints {
    /// Standard rules with the given budget and no request-specific sets.
    pub fn with_budget(budget: f64) -> Self {
        Constraints {
            budget,
            quotas: PositionQuotas::default(),
            max_per_club: 3,
            locked: BTreeSet::new(),
            excluded: BTreeSet::new(),
            reference: None,
            free_transfers: 1,
            chip: None,
            horizon: 1,
        }
    }

    pub fn unlimited_transfers(&self) -> bool {
        self.chip.is_some_and(|c| c.unlimited_transfers())
    }

    pub fn is_reference(&self, id: PlayerId) -> bool {
        self.reference.as_ref().is_some_and(|r| r.contains(&id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
