// Signal-based expected-value model.
//
// Blends season rate, short-term form, venue split, underlying xG/xA
// quality and ceiling into one per-period estimate, then applies fixture,
// volatility and availability multipliers.
//
// Algorithm:
//   1. Season score: PPG (or official form if larger), position baseline
//      when the player has no rate, plus position-weighted involvement
//      (clean sheets for GK/DEF, goals+assists for MID/FWD) and bonus rate.
//   2. Form score: official form, else a blend of weighted/last-3/last-5
//      form, else the season score; scaled by the clamped trend.
//   3. Weighted sum of season, form, venue PPG, 3 x recent xGI, ceiling, PPG.
//   4. Fixture (mean difficulty and home share over the horizon), big-haul
//      and consistency multipliers; xG regression.
//   5. Availability multiplier, a floor for established players, clamp.
//   6. For horizons > 1, regress toward season PPG before scaling.

use super::features::{self, PlayerFeatures};
use super::{PredictionResult, ScoreProvider, ScoreSource};
use crate::config::PredictorWeights;
use crate::player::{PlayerCandidate, Position};

const TREND_CLAMP: f64 = 3.0;
const NEUTRAL_DIFFICULTY: f64 = 3.0;
const XG_REGRESSION_CLAMP: f64 = 1.0;
const CONSISTENCY_SCALE: f64 = 20.0;
const STARTER_BASE: f64 = 0.6;
const DEFAULT_BLANK_RATE: f64 = 0.3;
const HARD_FIXTURE: f64 = 4.0;

/// The expected-value model over raw player signals. Always answers.
pub struct SignalModel {
    weights: PredictorWeights,
}

impl SignalModel {
    pub fn new(weights: PredictorWeights) -> Self {
        SignalModel { weights }
    }

    pub fn weights(&self) -> &PredictorWeights {
        &self.weights
    }

    /// Full prediction for a candidate over `horizon` periods.
    pub fn evaluate(&self, candidate: &PlayerCandidate, horizon: u32) -> PredictionResult {
        let horizon = horizon.max(1);
        let f = features::extract(candidate, horizon);
        let w = &self.weights;

        let single = self.single_period(candidate.position, &f);
        let rate = self.season_rate(&f);

        let per_period = if horizon > 1 && rate > 0.0 {
            let r = (w.regression_per_period * horizon as f64).min(w.regression_cap);
            single * (1.0 - r) + rate * r
        } else {
            single
        };

        let (confidence, risk) = confidence_and_risk(&f);
        let mut upside = per_period + 0.2 * f.ceiling + 5.0 * f.big_haul_rate;
        if f.next_difficulty >= HARD_FIXTURE {
            upside *= 0.8;
        }

        PredictionResult::from_per_period(per_period, horizon, confidence, risk, upside, w)
    }

    /// PPG, lifted to official form when that is higher.
    fn season_rate(&self, f: &PlayerFeatures) -> f64 {
        if f.official_form > 0.0 {
            f.ppg.max(f.official_form)
        } else {
            f.ppg
        }
    }

    /// Clamped single-period estimate before horizon regression.
    fn single_period(&self, position: Position, f: &PlayerFeatures) -> f64 {
        let w = &self.weights;
        let ppg = self.season_rate(f);

        let fixture_mult = (1.0 + w.difficulty_factor * (NEUTRAL_DIFFICULTY - f.avg_difficulty))
            * (1.0 + w.home_factor * (f.home_share - 0.5));
        let availability = self.availability(f);

        if !f.has_history {
            let base = position.baseline_points() * fixture_mult * availability;
            return base.clamp(w.min_points, w.max_points);
        }

        // 1. Season score
        let involvement = f.goals_per_game + f.assists_per_game;
        let mut season_score = if ppg > 0.0 {
            ppg
        } else {
            position.baseline_points()
        };
        season_score += match position {
            Position::Midfielder | Position::Forward => w.attacking_involvement * involvement,
            Position::Defender => {
                w.defender_clean_sheet * f.clean_sheet_rate + w.defender_involvement * involvement
            }
            Position::Goalkeeper => w.goalkeeper_clean_sheet * f.clean_sheet_rate,
        };
        season_score += w.bonus_weight * f.bonus_rate;

        // 2. Form score
        let mut form_score = if f.official_form > 0.0 {
            f.official_form
        } else if f.form_3 > 0.0 {
            w.form_weighted * f.weighted_form + w.form_last3 * f.form_3 + w.form_last5 * f.form_5
        } else {
            season_score
        };
        form_score *= 1.0 + w.trend_factor * f.trend.clamp(-TREND_CLAMP, TREND_CLAMP);

        // Venue split
        let venue = if f.next_home > 0.5 && f.home_ppg > 0.0 {
            f.home_ppg
        } else if f.next_home < 0.5 && f.away_ppg > 0.0 {
            f.away_ppg
        } else {
            0.0
        };

        // 3. Blend
        let recent_xgi = f.recent_xg + f.recent_xa;
        let mut base = w.season_weight * season_score
            + w.form_weight * form_score
            + w.venue_weight * venue
            + w.xgi_weight * (w.xgi_scale * recent_xgi)
            + w.ceiling_weight * f.ceiling
            + w.ppg_weight * ppg;

        // 4. Multipliers
        base *= fixture_mult;
        base *= 1.0 + w.big_haul_factor * f.big_haul_rate;
        base *= 1.0 - (f.consistency / CONSISTENCY_SCALE).min(w.consistency_cap);
        if ppg > 0.0 && f.xg_per_game > 0.0 {
            base += (-w.overperformance_factor * f.xg_overperformance)
                .clamp(-XG_REGRESSION_CLAMP, XG_REGRESSION_CLAMP);
        }

        // 5. Availability and floor
        base *= availability;
        if f.season_total > 20.0 && f.games >= 3.0 {
            base = base.max((0.5 * ppg).max(1.5));
        }

        base.clamp(w.min_points, w.max_points)
    }

    /// Multiplier in `[0, 1]` from fitness, minutes and starts.
    fn availability(&self, f: &PlayerFeatures) -> f64 {
        let fitness = f.chance_playing * (1.0 - self.weights.injury_penalty * f.injury_risk);
        let minutes = if f.recent_minutes < 30.0 {
            0.3
        } else if f.recent_minutes < 60.0 {
            0.7
        } else {
            1.0
        };
        let starter = STARTER_BASE + (1.0 - STARTER_BASE) * f.started_share;
        (fitness * minutes * starter).clamp(0.0, 1.0)
    }
}

fn confidence_and_risk(f: &PlayerFeatures) -> (f64, f64) {
    let games_factor = (f.games / 10.0).min(1.0);
    let consistency_factor = (1.0 - f.consistency / 10.0).max(0.0);
    let confidence =
        (0.3 * games_factor + 0.4 * consistency_factor + 0.3 * f.chance_playing).clamp(0.1, 0.95);

    let blank_rate = f.blank_rate.unwrap_or(DEFAULT_BLANK_RATE);
    let risk = (0.4 * f.injury_risk + 0.3 * blank_rate + 0.3 * (f.avg_difficulty - 1.0) / 4.0)
        .clamp(0.0, 1.0);

    (confidence, risk)
}

impl ScoreProvider for SignalModel {
    fn source(&self) -> ScoreSource {
        ScoreSource::Model
    }

    fn predict(&self, candidate: &PlayerCandidate, horizon: u32) -> Option<PredictionResult> {
        Some(self.evaluate(candidate, horizon))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
