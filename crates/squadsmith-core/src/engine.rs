// Optimization engine: one request in, ranked squad options out.
//
// Pipeline per request:
//   validate -> candidate pool -> one selector run per transfer target
//   (parallel, exact count first) -> dedup by player set -> lineups ->
//   price -> rank
//
// `evaluate` scores a supplied squad through the same pool, lineup and
// pricing steps.

use crate::config::Config;
use crate::error::OptimizeError;
use crate::evaluation::{evaluate_squad, EvaluateRequest, SquadEvaluation};
use crate::formation::lineups_for;
use crate::options::{build_option, dedupe_squads, rank, OptionScoring, SquadOption};
use crate::player::{PeriodId, PlayerId};
use crate::pool::{CandidatePool, CandidatePoolBuilder, PoolQuery};
use crate::prediction::{LearnedScores, ScoringChain};
use crate::rules::{Chip, Constraints};
use crate::selector::{select_for_target, ExactSolver, ResilientSelector, SelectError, SquadSelector};
use crate::squad::Squad;
use crate::store::PlayerSignalStore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

fn default_horizon() -> u32 {
    1
}

fn default_free_transfers() -> u32 {
    1
}

/// One optimization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub season: String,
    pub budget: f64,
    #[serde(default = "default_horizon")]
    pub horizon: u32,
    #[serde(default)]
    pub exclude: BTreeSet<PlayerId>,
    #[serde(default)]
    pub lock: BTreeSet<PlayerId>,
    #[serde(default)]
    pub chip: Option<Chip>,
    /// The manager's current squad, if any.
    #[serde(default)]
    pub reference_squad: Option<BTreeSet<PlayerId>>,
    #[serde(default = "default_free_transfers")]
    pub free_transfers: u32,
    /// Period being planned for. Defaults to the one after the latest
    /// recorded result.
    #[serde(default)]
    pub target_period: Option<PeriodId>,
    /// Overrides the configured transfer targets.
    #[serde(default)]
    pub transfer_targets: Option<Vec<u32>>,
}

impl OptimizeRequest {
    pub fn new(season: impl Into<String>, budget: f64) -> Self {
        OptimizeRequest {
            season: season.into(),
            budget,
            horizon: default_horizon(),
            exclude: BTreeSet::new(),
            lock: BTreeSet::new(),
            chip: None,
            reference_squad: None,
            free_transfers: default_free_transfers(),
            target_period: None,
            transfer_targets: None,
        }
    }

    fn validate(&self) -> Result<(), OptimizeError> {
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(OptimizeError::InvalidRequest(format!(
                "budget must be a positive number, got {}",
                self.budget
            )));
        }
        if self.horizon == 0 {
            return Err(OptimizeError::InvalidRequest(
                "horizon must be at least 1 period".into(),
            ));
        }
        if let Some(id) = self.lock.intersection(&self.exclude).next() {
            return Err(OptimizeError::InvalidRequest(format!(
                "player {id} is both locked and excluded"
            )));
        }
        if self.season.trim().is_empty() {
            return Err(OptimizeError::InvalidRequest("season is empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    config: Config,
    store: Arc<dyn PlayerSignalStore>,
    chain: ScoringChain,
    selector: Box<dyn SquadSelector>,
}

impl Engine {
    /// Engine with the standard scoring chain and the configured selector.
    pub fn new(config: Config, store: Arc<dyn PlayerSignalStore>) -> Self {
        let chain = ScoringChain::standard(&config.strategy.predictor, None);
        let selector = Box::new(ResilientSelector::from_solver(ExactSolver::from_config(
            &config.strategy.solver,
        )));
        Engine {
            config,
            store,
            chain,
            selector,
        }
    }

    /// Put externally trained scores ahead of the signal model.
    pub fn with_learned_scores(mut self, learned: LearnedScores) -> Self {
        info!("using {} learned player scores", learned.len());
        self.chain = ScoringChain::standard(&self.config.strategy.predictor, Some(learned));
        self
    }

    pub fn with_selector(mut self, selector: Box<dyn SquadSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Constraints for a request under the configured league rules.
    pub fn constraints_for(&self, request: &OptimizeRequest) -> Constraints {
        let rules = &self.config.rules;
        Constraints {
            budget: request.budget,
            quotas: rules.quotas,
            max_per_club: rules.max_per_club,
            locked: request.lock.clone(),
            excluded: request.exclude.clone(),
            reference: request.reference_squad.clone(),
            free_transfers: request.free_transfers,
            chip: request.chip,
            horizon: request.horizon,
        }
    }

    /// Transfer counts to solve for, in order, without repeats. `None`
    /// means a single unwindowed solve.
    fn transfer_targets(&self, request: &OptimizeRequest) -> Vec<Option<u32>> {
        if request.reference_squad.is_none() {
            return vec![None];
        }
        let options = &self.config.strategy.options;
        let targets = match &request.transfer_targets {
            Some(t) if !t.is_empty() => t.clone(),
            _ if request.chip.is_some_and(|c| c.unlimited_transfers()) => {
                options.unlimited_transfer_targets.clone()
            }
            _ => options.transfer_targets.clone(),
        };
        let mut seen = HashSet::new();
        targets
            .into_iter()
            .filter(|t| seen.insert(*t))
            .map(Some)
            .collect()
    }

    /// Score and filter the candidates for a request.
    pub fn build_pool(&self, request: &OptimizeRequest) -> Result<CandidatePool, OptimizeError> {
        CandidatePoolBuilder::new(&self.chain).build(
            self.store.as_ref(),
            &PoolQuery {
                season: &request.season,
                period: request.target_period,
                horizon: request.horizon,
                exclude: &request.exclude,
                lock: &request.lock,
            },
        )
    }

    /// Ranked squad options for a request.
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<Vec<SquadOption>, OptimizeError> {
        let started = Instant::now();
        request.validate()?;

        let constraints = self.constraints_for(request);
        let pool = self.build_pool(request)?;
        let targets = self.transfer_targets(request);
        info!(
            "optimizing {}: {} candidates, budget {:.1}, horizon {}, chip {:?}, targets {:?}",
            request.season,
            pool.len(),
            request.budget,
            request.horizon,
            request.chip,
            targets
        );

        let results: Vec<(Option<u32>, Result<Squad, SelectError>)> = targets
            .par_iter()
            .map(|&target| {
                let result = select_for_target(self.selector.as_ref(), &pool, &constraints, target);
                (target, result)
            })
            .collect();

        let attempted = results.len();
        let mut squads = Vec::with_capacity(attempted);
        let mut reasons = Vec::new();
        for (target, result) in results {
            match result {
                Ok(squad) => {
                    debug!(
                        "target {:?}: score {:.2}, cost {:.1}",
                        target,
                        squad.total_score(),
                        squad.cost()
                    );
                    squads.push((target, squad));
                }
                Err(e) => {
                    debug!("target {:?} skipped: {}", target, e);
                    reasons.push(match target {
                        Some(t) => format!("target {t}: {e}"),
                        None => e.to_string(),
                    });
                }
            }
        }
        if squads.is_empty() {
            warn!(
                "no feasible squad for {} after {} targets",
                request.season, attempted
            );
            return Err(OptimizeError::NoOptionsGenerated { attempted, reasons });
        }

        let unique = dedupe_squads(squads);
        let scoring = OptionScoring::new(&constraints, &self.config.rules, &self.config.strategy.options);
        let lineups_per_squad = self.config.strategy.options.lineups_per_squad;
        let mut options = Vec::new();
        for (target, squad) in &unique {
            for lineup in lineups_for(squad, lineups_per_squad) {
                options.push(build_option(squad, lineup, *target, &scoring));
            }
        }
        let ranked = rank(options, self.config.strategy.options.max_options);

        info!(
            "{} options from {} distinct squads in {} ms",
            ranked.len(),
            unique.len(),
            started.elapsed().as_millis()
        );
        Ok(ranked)
    }

    /// Best lineup, captaincy, pricing and risk for a supplied squad.
    ///
    /// Every squad member enters the pool whatever their status, and the
    /// squad must satisfy the league's position and club rules. The budget
    /// only sets the reported bank.
    pub fn evaluate(&self, request: &EvaluateRequest) -> Result<SquadEvaluation, OptimizeError> {
        request.validate()?;
        let no_exclusions = BTreeSet::new();
        let pool = CandidatePoolBuilder::new(&self.chain).build(
            self.store.as_ref(),
            &PoolQuery {
                season: &request.season,
                period: request.target_period,
                horizon: request.horizon,
                exclude: &no_exclusions,
                lock: &request.squad,
            },
        )?;

        let rules = &self.config.rules;
        let constraints = Constraints {
            budget: f64::INFINITY,
            quotas: rules.quotas,
            max_per_club: rules.max_per_club,
            locked: BTreeSet::new(),
            excluded: BTreeSet::new(),
            reference: None,
            free_transfers: 0,
            chip: request.chip,
            horizon: request.horizon,
        };
        let squad = Squad::from_ids(&pool, &request.squad, &constraints).map_err(|violations| {
            OptimizeError::InvalidRequest(
                violations
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        })?;

        let scoring = OptionScoring::new(&constraints, rules, &self.config.strategy.options);
        let evaluation = evaluate_squad(&squad, request.budget.unwrap_or(rules.budget), &scoring)?;
        info!(
            "evaluated {} squad: {} XI points in {}, risk {:.2}",
            request.season,
            evaluation.best.xi_points,
            evaluation.best.formation,
            evaluation.risk.squad_risk
        );
        Ok(evaluation)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
