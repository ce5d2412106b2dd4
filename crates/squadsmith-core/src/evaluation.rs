// Squad evaluation: how a given 15-player squad lines up, who captains it,
// and how exposed it is to absences.

use crate::error::OptimizeError;
use crate::formation::{lineups_for, FormationShape, Lineup};
use crate::options::{build_option, OptionScoring, SquadOption};
use crate::player::{AvailabilityStatus, PeriodId, PlayerId};
use crate::rules::Chip;
use crate::squad::Squad;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fixture difficulty reported when no squad member has a fixture.
const NEUTRAL_DIFFICULTY: f64 = 3.0;

fn default_horizon() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Evaluate an existing squad instead of building one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub season: String,
    pub squad: BTreeSet<PlayerId>,
    #[serde(default = "default_horizon")]
    pub horizon: u32,
    #[serde(default)]
    pub chip: Option<Chip>,
    #[serde(default)]
    pub target_period: Option<PeriodId>,
    /// Spending limit the bank is measured against. Defaults to the league
    /// budget.
    #[serde(default)]
    pub budget: Option<f64>,
}

impl EvaluateRequest {
    pub fn new(season: impl Into<String>, squad: BTreeSet<PlayerId>) -> Self {
        EvaluateRequest {
            season: season.into(),
            squad,
            horizon: default_horizon(),
            chip: None,
            target_period: None,
            budget: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), OptimizeError> {
        if self.season.trim().is_empty() {
            return Err(OptimizeError::InvalidRequest("season is empty".into()));
        }
        if self.horizon == 0 {
            return Err(OptimizeError::InvalidRequest(
                "horizon must be at least 1 period".into(),
            ));
        }
        if let Some(budget) = self.budget {
            if !(budget.is_finite() && budget > 0.0) {
                return Err(OptimizeError::InvalidRequest(format!(
                    "budget must be a positive number, got {budget}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSummary {
    /// Squad members whose status is anything but available.
    pub unavailable: Vec<PlayerId>,
    /// Twice the unavailable share, capped at 1.
    pub squad_risk: f64,
    pub mean_player_risk: f64,
    pub mean_confidence: f64,
    /// Mean fixture difficulty over the horizon.
    pub fixture_difficulty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadEvaluation {
    /// The squad in its best formation, priced like an optimizer option.
    pub best: SquadOption,
    /// Every formation the squad can field, best first.
    pub lineups: Vec<Lineup>,
    pub risk: RiskSummary,
    /// Points scored so far this season by the current members.
    pub season_points: f64,
    pub squad_value: f64,
    /// Budget left after buying the squad, never negative.
    pub bank: f64,
}

pub fn risk_summary(squad: &Squad) -> RiskSummary {
    let players = squad.players();
    let n = players.len().max(1) as f64;
    let unavailable: Vec<PlayerId> = players
        .iter()
        .filter(|c| c.player.status != AvailabilityStatus::Available)
        .map(|c| c.id())
        .collect();

    let difficulties: Vec<f64> = players
        .iter()
        .filter(|c| !c.player.fixtures.is_empty())
        .map(|c| {
            let fixtures = &c.player.fixtures;
            fixtures.iter().map(|f| f64::from(f.difficulty)).sum::<f64>() / fixtures.len() as f64
        })
        .collect();
    let fixture_difficulty = if difficulties.is_empty() {
        NEUTRAL_DIFFICULTY
    } else {
        difficulties.iter().sum::<f64>() / difficulties.len() as f64
    };

    RiskSummary {
        squad_risk: (2.0 * unavailable.len() as f64 / n).min(1.0),
        unavailable,
        mean_player_risk: players.iter().map(|c| c.prediction.risk).sum::<f64>() / n,
        mean_confidence: players.iter().map(|c| c.prediction.confidence).sum::<f64>() / n,
        fixture_difficulty,
    }
}

/// Line up, price and summarize a validated squad.
pub fn evaluate_squad(
    squad: &Squad,
    budget: f64,
    scoring: &OptionScoring<'_>,
) -> Result<SquadEvaluation, OptimizeError> {
    let lineups = lineups_for(squad, FormationShape::ALL.len());
    let Some(first) = lineups.first().cloned() else {
        return Err(OptimizeError::InvalidRequest(
            "squad cannot field any formation".into(),
        ));
    };
    let best = build_option(squad, first, None, scoring);
    let squad_value = squad.cost();
    Ok(SquadEvaluation {
        best,
        lineups,
        risk: risk_summary(squad),
        season_points: squad.players().iter().map(|c| c.player.season.total_points).sum(),
        squad_value,
        bank: (budget - squad_value).max(0.0),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
