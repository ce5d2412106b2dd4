// JSON report printed to stdout.

use chrono::{DateTime, Utc};
use serde::Serialize;
use squadsmith_core::rules::Chip;
use squadsmith_core::{OptimizeRequest, SquadEvaluation, SquadOption};

#[derive(Debug, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub season: String,
    pub budget: f64,
    pub horizon: u32,
    pub chip: Option<Chip>,
    pub option_count: usize,
    pub options: Vec<SquadOption>,
}

impl Report {
    pub fn new(season: &str, request: &OptimizeRequest, options: Vec<SquadOption>) -> Self {
        Report {
            generated_at: Utc::now(),
            season: season.to_string(),
            budget: request.budget,
            horizon: request.horizon,
            chip: request.chip,
            option_count: options.len(),
            options,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub season: String,
    pub evaluation: SquadEvaluation,
}

impl EvaluationReport {
    pub fn new(season: &str, evaluation: SquadEvaluation) -> Self {
        EvaluationReport {
            generated_at: Utc::now(),
            season: season.to_string(),
            evaluation,
        }
    }
}
