// Expected-value prediction: per-player forward-looking scores.
//
// Scores come from a chain of providers asked in order. An externally
// trained model (`LearnedScores`) answers for the players it knows, the
// signal-based model (`SignalModel`) answers for everyone, and
// `PriceDefaults` guarantees an answer even for a chain built without it.

pub mod defaults;
pub mod features;
pub mod model;

pub use defaults::PriceDefaults;
pub use model::SignalModel;

use crate::config::PredictorWeights;
use crate::player::{PlayerCandidate, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// PredictionResult
// ---------------------------------------------------------------------------

/// Forward-looking value of one player over the request horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Objective value used by the squad selector.
    pub optimization_score: f64,
    /// Clamped single-period expectation after horizon regression.
    pub expected_points_per_period: f64,
    /// Expectation summed over the horizon.
    pub expected_points: f64,
    pub confidence: f64,
    pub risk: f64,
    pub captaincy_upside: f64,
}

impl PredictionResult {
    /// Assemble a result from a per-period expectation.
    ///
    /// `per_period` is clamped to the configured point range, confidence and
    /// risk to `[0, 1]`, and the optimization score discounts the horizon
    /// total by `risk_aversion * risk`.
    pub fn from_per_period(
        per_period: f64,
        horizon: u32,
        confidence: f64,
        risk: f64,
        captaincy_upside: f64,
        weights: &PredictorWeights,
    ) -> Self {
        let per_period = if per_period.is_finite() {
            per_period.clamp(weights.min_points, weights.max_points)
        } else {
            weights.min_points
        };
        let risk = if risk.is_finite() { risk.clamp(0.0, 1.0) } else { 1.0 };
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let expected_points = per_period * horizon.max(1) as f64;
        PredictionResult {
            optimization_score: expected_points * (1.0 - weights.risk_aversion * risk),
            expected_points_per_period: per_period,
            expected_points,
            confidence,
            risk,
            captaincy_upside: if captaincy_upside.is_finite() {
                captaincy_upside
            } else {
                per_period
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Which provider produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Learned,
    Model,
    Default,
}

/// A source of per-player predictions. Returning `None` passes the player
/// on to the next provider in the chain.
pub trait ScoreProvider: Send + Sync {
    fn source(&self) -> ScoreSource;
    fn predict(&self, candidate: &PlayerCandidate, horizon: u32) -> Option<PredictionResult>;
}

/// Per-period expectations supplied by an external model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPrediction {
    pub expected_points_per_period: f64,
    pub confidence: f64,
    pub risk: f64,
    #[serde(default)]
    pub captaincy_upside: Option<f64>,
}

/// Scores from a trained model, keyed by player id.
pub struct LearnedScores {
    predictions: HashMap<PlayerId, LearnedPrediction>,
    weights: PredictorWeights,
}

impl LearnedScores {
    pub fn new(predictions: HashMap<PlayerId, LearnedPrediction>, weights: PredictorWeights) -> Self {
        LearnedScores {
            predictions,
            weights,
        }
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

impl ScoreProvider for LearnedScores {
    fn source(&self) -> ScoreSource {
        ScoreSource::Learned
    }

    fn predict(&self, candidate: &PlayerCandidate, horizon: u32) -> Option<PredictionResult> {
        let learned = self.predictions.get(&candidate.id)?;
        if !learned.expected_points_per_period.is_finite() {
            return None;
        }
        Some(PredictionResult::from_per_period(
            learned.expected_points_per_period,
            horizon,
            learned.confidence,
            learned.risk,
            learned
                .captaincy_upside
                .unwrap_or(learned.expected_points_per_period),
            &self.weights,
        ))
    }
}

// ---------------------------------------------------------------------------
// ScoringChain
// ---------------------------------------------------------------------------

/// Ordered providers with a guaranteed final answer.
pub struct ScoringChain {
    providers: Vec<Box<dyn ScoreProvider>>,
    fallback: PriceDefaults,
}

impl ScoringChain {
    pub fn new(providers: Vec<Box<dyn ScoreProvider>>, weights: &PredictorWeights) -> Self {
        ScoringChain {
            providers,
            fallback: PriceDefaults::new(weights.clone()),
        }
    }

    /// Learned scores (when given), then the signal model, then defaults.
    pub fn standard(weights: &PredictorWeights, learned: Option<LearnedScores>) -> Self {
        let mut providers: Vec<Box<dyn ScoreProvider>> = Vec::new();
        if let Some(l) = learned.filter(|l| !l.is_empty()) {
            providers.push(Box::new(l));
        }
        providers.push(Box::new(SignalModel::new(weights.clone())));
        providers.push(Box::new(PriceDefaults::new(weights.clone())));
        ScoringChain::new(providers, weights)
    }

    /// Score a candidate with the first provider that answers.
    pub fn score(&self, candidate: &PlayerCandidate, horizon: u32) -> (PredictionResult, ScoreSource) {
        for provider in &self.providers {
            if let Some(result) = provider.predict(candidate, horizon) {
                return (result, provider.source());
            }
        }
        (
            self.fallback.estimate(candidate, horizon),
            ScoreSource::Default,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
