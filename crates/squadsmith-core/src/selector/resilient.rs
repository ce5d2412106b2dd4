// Exact-first selection with a greedy safety net.

use super::{
    finish, ExactSolver, GreedySelector, SelectError, SelectionRequest, SquadSelector, SquadValue,
};
use crate::pool::CandidatePool;
use crate::squad::Squad;
use tracing::{debug, warn};

/// Runs the primary selector and falls back to greedy construction when it
/// is unavailable or stops early. Infeasibility is reported as-is.
pub struct ResilientSelector {
    primary: Box<dyn SquadSelector>,
    fallback: GreedySelector,
}

impl ResilientSelector {
    pub fn new(primary: Box<dyn SquadSelector>) -> Self {
        ResilientSelector {
            primary,
            fallback: GreedySelector,
        }
    }

    pub fn from_solver(solver: ExactSolver) -> Self {
        Self::new(Box::new(solver))
    }

    pub fn primary_name(&self) -> &'static str {
        self.primary.name()
    }
}

impl SquadSelector for ResilientSelector {
    fn name(&self) -> &'static str {
        "resilient"
    }

    fn select(
        &self,
        pool: &CandidatePool,
        request: &SelectionRequest<'_>,
    ) -> Result<Squad, SelectError> {
        match self.primary.select(pool, request) {
            Ok(squad) => Ok(squad),
            Err(SelectError::SolverUnavailable) => {
                debug!(
                    "{} unavailable, using greedy for target {:?}",
                    self.primary.name(),
                    request.transfer_target
                );
                self.fallback.select(pool, request)
            }
            Err(SelectError::Timeout {
                elapsed_ms,
                nodes,
                incumbent,
            }) => {
                warn!(
                    "{} stopped after {} nodes ({} ms) for target {:?}, falling back to greedy",
                    self.primary.name(),
                    nodes,
                    elapsed_ms,
                    request.transfer_target
                );
                let greedy = self.fallback.select(pool, request);
                let squad = match (incumbent, greedy) {
                    (Some(inc), Ok(g)) => {
                        let constraints = request.constraints;
                        if SquadValue::of(&g, constraints).beats(&SquadValue::of(&inc, constraints)) {
                            g
                        } else {
                            *inc
                        }
                    }
                    (Some(inc), Err(_)) => *inc,
                    (None, Ok(g)) => g,
                    (None, Err(e)) => return Err(e),
                };
                finish(pool, &squad.ids(), request)
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
