// Library root: squad optimization engine and the modules it is built
// from, exposed for the app crate and integration tests.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod formation;
pub mod options;
pub mod player;
pub mod pool;
pub mod prediction;
pub mod rules;
pub mod selector;
pub mod squad;
pub mod store;

#[cfg(test)]
mod testutil;

pub use engine::{Engine, OptimizeRequest};
pub use error::OptimizeError;
pub use evaluation::{EvaluateRequest, SquadEvaluation};
pub use options::SquadOption;
