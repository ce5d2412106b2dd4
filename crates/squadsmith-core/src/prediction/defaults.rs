// Deterministic last-resort scores from season rate or price.

use super::{PredictionResult, ScoreProvider, ScoreSource};
use crate::config::PredictorWeights;
use crate::player::PlayerCandidate;

const DEFAULT_CONFIDENCE: f64 = 0.3;
const DEFAULT_RISK: f64 = 0.5;

/// Season points-per-game when the player has season totals, otherwise a
/// position baseline scaled by price.
pub struct PriceDefaults {
    weights: PredictorWeights,
}

impl PriceDefaults {
    pub fn new(weights: PredictorWeights) -> Self {
        PriceDefaults { weights }
    }

    pub fn estimate(&self, candidate: &PlayerCandidate, horizon: u32) -> PredictionResult {
        let season = &candidate.season;
        let games = if !candidate.recent.is_empty() {
            candidate.recent.len() as f64
        } else {
            (season.total_points / 4.0).max(1.0)
        };
        let per_period = if season.total_points > 0.0 {
            season.total_points / games
        } else {
            candidate.position.baseline_points() * (0.6 + 0.05 * candidate.price.max(0.0))
        };
        PredictionResult::from_per_period(
            per_period,
            horizon,
            DEFAULT_CONFIDENCE,
            DEFAULT_RISK,
            per_period,
            &self.weights,
        )
    }
}

impl ScoreProvider for PriceDefaults {
    fn source(&self) -> ScoreSource {
        ScoreSource::Default
    }

    fn predict(&self, candidate: &PlayerCandidate, horizon: u32) -> Option<PredictionResult> {
        Some(self.estimate(candidate, horizon))
    }
}
