// Shared fixtures for unit tests.

use crate::player::{ClubId, PlayerCandidate, PlayerId, Position};
use crate::pool::{CandidatePool, ScoredCandidate};
use crate::prediction::{PredictionResult, ScoreSource};

/// A candidate whose optimization score and expected points both equal
/// `score` (horizon 1, zero risk).
pub(crate) fn scored(
    id: PlayerId,
    position: Position,
    club: ClubId,
    price: f64,
    score: f64,
) -> ScoredCandidate {
    ScoredCandidate {
        player: PlayerCandidate::new(id, &format!("Player {id}"), club, position, price),
        prediction: PredictionResult {
            optimization_score: score,
            expected_points_per_period: score,
            expected_points: score,
            confidence: 0.5,
            risk: 0.0,
            captaincy_upside: score,
        },
        source: ScoreSource::Model,
    }
}

/// 30 players: 4 GK (ids 1-4), 10 DEF (5-14), 10 MID (15-24), 6 FWD (25-30).
/// Club is `id % 10`, so no club holds more than three players. Prices run
/// 4.0-8.0 and scores are deterministic but unordered.
pub(crate) fn standard_pool() -> CandidatePool {
    let players = (1..=30)
        .map(|id: u32| {
            let position = match id {
                1..=4 => Position::Goalkeeper,
                5..=14 => Position::Defender,
                15..=24 => Position::Midfielder,
                _ => Position::Forward,
            };
            let price = 4.0 + ((id * 37) % 9) as f64 * 0.5;
            let score = 2.0 + ((id * 53) % 11) as f64 * 0.5 + price * 0.3;
            scored(id, position, id % 10, price, score)
        })
        .collect();
    CandidatePool::from_scored(players, 1)
}
