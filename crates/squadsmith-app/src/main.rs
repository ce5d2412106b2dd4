// Squad optimizer entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout carries the JSON report)
// 2. Load config (copying defaults on first run)
// 3. Read the request: `squadsmith [request.json]` optimizes,
//    `squadsmith evaluate squad.json` evaluates a given squad
// 4. Load that season's signal snapshot from the configured CSV files
// 5. Run the engine on a blocking task under an overall timeout
// 6. Print the ranked options (or the evaluation) as JSON

mod report;
mod runner;

use squadsmith_core::config;
use squadsmith_core::prediction::{LearnedPrediction, LearnedScores};
use squadsmith_core::player::PlayerId;
use squadsmith_core::store::csv::load_snapshot_from_paths;
use squadsmith_core::store::CachedSignalStore;
use squadsmith_core::{Engine, EvaluateRequest, OptimizeRequest};

use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Ceiling for one whole request, all transfer targets included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Optional externally trained scores, read when present.
const LEARNED_SCORES_PATH: &str = "config/learned_scores.json";

const DEFAULT_SEASON: &str = "2025-26";

/// What this run was asked to do.
enum Command {
    Optimize(OptimizeRequest),
    Evaluate(EvaluateRequest),
}

impl Command {
    fn season(&self) -> &str {
        match self {
            Command::Optimize(r) => &r.season,
            Command::Evaluate(r) => &r.season,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("squadsmith starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: rules={}, budget {:.1}, max {} per club",
        config.rules.name, config.rules.budget, config.rules.max_per_club
    );

    // 3. Read the request
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args, config.rules.budget)?;

    // 4. Load the snapshot
    let snapshot = load_snapshot_from_paths(command.season(), &config.data_paths)
        .context("failed to load player signals")?;
    info!(
        "Loaded {} players and {} fixtures for {}",
        snapshot.players.len(),
        snapshot.fixtures.len(),
        snapshot.season
    );
    let store = CachedSignalStore::new(
        squadsmith_core::store::InMemorySignalStore::new(snapshot),
        Duration::from_secs(config.strategy.cache.ttl_secs),
    );

    let mut engine = Engine::new(config, Arc::new(store));
    if let Some(learned) = read_learned_scores(Path::new(LEARNED_SCORES_PATH), &engine)? {
        engine = engine.with_learned_scores(learned);
    }
    let engine = Arc::new(engine);

    // 5. Run the engine, 6. print the report
    let task_engine = Arc::clone(&engine);
    let json = match command {
        Command::Optimize(request) => {
            let task_request = request.clone();
            let options =
                runner::run_blocking(REQUEST_TIMEOUT, move || task_engine.optimize(&task_request))
                    .await
                    .context("optimizer did not complete")?
                    .context("optimization failed")?;
            let report = report::Report::new(&request.season, &request, options);
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        }
        Command::Evaluate(request) => {
            let task_request = request.clone();
            let evaluation =
                runner::run_blocking(REQUEST_TIMEOUT, move || task_engine.evaluate(&task_request))
                    .await
                    .context("evaluation did not complete")?
                    .context("evaluation failed")?;
            let report = report::EvaluationReport::new(&request.season, evaluation);
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        }
    };
    println!("{json}");

    info!("squadsmith finished");
    Ok(())
}

fn parse_command(args: &[String], default_budget: f64) -> anyhow::Result<Command> {
    match args {
        [] => Ok(Command::Optimize(OptimizeRequest::new(DEFAULT_SEASON, default_budget))),
        [mode, path] if mode == "evaluate" => Ok(Command::Evaluate(read_request(Path::new(path))?)),
        [mode] if mode == "evaluate" => anyhow::bail!("usage: squadsmith evaluate <squad.json>"),
        [path] => Ok(Command::Optimize(read_request(Path::new(path))?)),
        _ => anyhow::bail!("usage: squadsmith [request.json] | squadsmith evaluate <squad.json>"),
    }
}

fn read_request<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read request file {}", path.display()))?;
    let request: T = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse request file {}", path.display()))?;
    Ok(request)
}

fn read_learned_scores(path: &Path, engine: &Engine) -> anyhow::Result<Option<LearnedScores>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let predictions: HashMap<PlayerId, LearnedPrediction> = match serde_json::from_str(&text) {
        Ok(p) => p,
        Err(e) => {
            warn!("ignoring learned scores in {}: {}", path.display(), e);
            return Ok(None);
        }
    };
    Ok(Some(LearnedScores::new(
        predictions,
        engine.config().strategy.predictor.clone(),
    )))
}

/// Log directory: the platform data dir when available, else `./logs`.
fn log_dir() -> anyhow::Result<PathBuf> {
    if let Some(dirs) = directories::ProjectDirs::from("", "", "squadsmith") {
        return Ok(dirs.data_local_dir().join("logs"));
    }
    Ok(std::env::current_dir()?.join("logs"))
}

/// Initialize tracing to log to a file, keeping stdout clean for the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("squadsmith.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("squadsmith=info,squadsmith_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
