// Configuration loading and parsing (rules.toml, strategy.toml).

use crate::rules::{PositionQuotas, SQUAD_SIZE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub rules: RulesConfig,
    pub strategy: StrategyConfig,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// rules.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[rules]` table in rules.toml.
#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    rules: RulesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    pub name: String,
    pub budget: f64,
    pub max_per_club: usize,
    pub transfer_penalty: f64,
    pub quotas: PositionQuotas,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            name: "Classic Fantasy Football".into(),
            budget: 100.0,
            max_per_club: 3,
            transfer_penalty: 4.0,
            quotas: PositionQuotas::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    predictor: PredictorWeights,
    solver: SolverConfig,
    options: OptionsConfig,
    cache: CacheConfig,
    data_paths: DataPaths,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone, Default)]
pub struct StrategyConfig {
    pub predictor: PredictorWeights,
    pub solver: SolverConfig,
    pub options: OptionsConfig,
    pub cache: CacheConfig,
}

/// Weights of the expected-value blend. Missing keys fall back to the
/// tuned defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictorWeights {
    pub season_weight: f64,
    pub form_weight: f64,
    pub venue_weight: f64,
    pub xgi_weight: f64,
    pub ceiling_weight: f64,
    pub ppg_weight: f64,
    pub xgi_scale: f64,

    pub attacking_involvement: f64,
    pub defender_clean_sheet: f64,
    pub defender_involvement: f64,
    pub goalkeeper_clean_sheet: f64,
    pub bonus_weight: f64,

    pub form_weighted: f64,
    pub form_last3: f64,
    pub form_last5: f64,
    pub trend_factor: f64,

    pub difficulty_factor: f64,
    pub home_factor: f64,
    pub big_haul_factor: f64,
    pub consistency_cap: f64,
    pub overperformance_factor: f64,
    pub injury_penalty: f64,

    pub min_points: f64,
    pub max_points: f64,
    pub regression_per_period: f64,
    pub regression_cap: f64,

    pub risk_aversion: f64,
}

impl Default for PredictorWeights {
    fn default() -> Self {
        PredictorWeights {
            season_weight: 0.40,
            form_weight: 0.30,
            venue_weight: 0.10,
            xgi_weight: 0.10,
            ceiling_weight: 0.05,
            ppg_weight: 0.05,
            xgi_scale: 3.0,

            attacking_involvement: 1.5,
            defender_clean_sheet: 2.0,
            defender_involvement: 1.0,
            goalkeeper_clean_sheet: 3.0,
            bonus_weight: 0.5,

            form_weighted: 0.40,
            form_last3: 0.35,
            form_last5: 0.25,
            trend_factor: 0.04,

            difficulty_factor: 0.05,
            home_factor: 0.12,
            big_haul_factor: 0.2,
            consistency_cap: 0.1,
            overperformance_factor: 0.1,
            injury_penalty: 0.7,

            min_points: 0.5,
            max_points: 15.0,
            regression_per_period: 0.1,
            regression_cap: 0.4,

            risk_aversion: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    /// When false the greedy selector is used for every target.
    pub enabled: bool,
    pub time_budget_ms: u64,
    pub max_nodes: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            enabled: true,
            time_budget_ms: 2000,
            max_nodes: 2_000_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionsConfig {
    pub transfer_targets: Vec<u32>,
    pub unlimited_transfer_targets: Vec<u32>,
    pub lineups_per_squad: usize,
    pub typical_xi_points: f64,
    pub ceiling_xi_points: f64,
    pub max_options: usize,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        OptionsConfig {
            transfer_targets: vec![0, 1, 2, 3],
            unlimited_transfer_targets: vec![0, 1, 2, 3, 5, 7, 10],
            lineups_per_squad: 3,
            typical_xi_points: 55.0,
            ceiling_xi_points: 85.0,
            max_options: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { ttl_secs: 300 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
    pub history: String,
    pub fixtures: String,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            players: "data/players.csv".into(),
            history: "data/history.csv".into(),
            fixtures: "data/fixtures.csv".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/rules.toml` and
/// `config/strategy.toml`, both relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- rules.toml (required) ---
    let rules_path = config_dir.join("rules.toml");
    let rules_text = read_file(&rules_path)?;
    let rules_file: RulesFile =
        toml::from_str(&rules_text).map_err(|e| ConfigError::ParseError {
            path: rules_path.clone(),
            source: e,
        })?;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let config = Config {
        rules: rules_file.rules,
        strategy: StrategyConfig {
            predictor: strategy_file.predictor,
            solver: strategy_file.solver,
            options: strategy_file.options,
            cache: strategy_file.cache,
        },
        data_paths: strategy_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };

        // Templates stay in defaults/
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    // Rules
    let rules = &config.rules;
    if !(rules.budget.is_finite() && rules.budget > 0.0) {
        return Err(invalid(
            "rules.budget",
            format!("must be a positive number, got {}", rules.budget),
        ));
    }
    if rules.max_per_club == 0 {
        return Err(invalid("rules.max_per_club", "must be greater than 0".into()));
    }
    if !(rules.transfer_penalty.is_finite() && rules.transfer_penalty >= 0.0) {
        return Err(invalid(
            "rules.transfer_penalty",
            format!("must be a number >= 0, got {}", rules.transfer_penalty),
        ));
    }
    if rules.quotas.total() != SQUAD_SIZE {
        return Err(invalid(
            "rules.quotas",
            format!(
                "must sum to {SQUAD_SIZE}, got {}",
                rules.quotas.total()
            ),
        ));
    }
    if rules.quotas.goalkeepers < 1 {
        return Err(invalid(
            "rules.quotas.goalkeepers",
            "at least one goalkeeper is required".into(),
        ));
    }

    // Predictor
    let p = &config.strategy.predictor;
    if !(p.min_points >= 0.0 && p.min_points < p.max_points) {
        return Err(invalid(
            "predictor.min_points",
            format!(
                "must be >= 0 and below max_points ({}), got {}",
                p.max_points, p.min_points
            ),
        ));
    }
    let unit_fields: &[(&str, f64)] = &[
        ("predictor.risk_aversion", p.risk_aversion),
        ("predictor.regression_cap", p.regression_cap),
        ("predictor.consistency_cap", p.consistency_cap),
        ("predictor.injury_penalty", p.injury_penalty),
    ];
    for (name, val) in unit_fields {
        if !(0.0..=1.0).contains(val) {
            return Err(invalid(
                name,
                format!("must be between 0.0 and 1.0 inclusive, got {val}"),
            ));
        }
    }
    let weight_fields: &[(&str, f64)] = &[
        ("predictor.season_weight", p.season_weight),
        ("predictor.form_weight", p.form_weight),
        ("predictor.venue_weight", p.venue_weight),
        ("predictor.xgi_weight", p.xgi_weight),
        ("predictor.ceiling_weight", p.ceiling_weight),
        ("predictor.ppg_weight", p.ppg_weight),
    ];
    for (name, val) in weight_fields {
        if !(val.is_finite() && *val >= 0.0) {
            return Err(invalid(name, format!("must be a number >= 0, got {val}")));
        }
    }

    // Solver
    let solver = &config.strategy.solver;
    if solver.time_budget_ms == 0 {
        return Err(invalid("solver.time_budget_ms", "must be > 0".into()));
    }
    if solver.max_nodes == 0 {
        return Err(invalid("solver.max_nodes", "must be > 0".into()));
    }

    // Options
    let opts = &config.strategy.options;
    if opts.transfer_targets.is_empty() {
        return Err(invalid(
            "options.transfer_targets",
            "must list at least one target".into(),
        ));
    }
    if opts.unlimited_transfer_targets.is_empty() {
        return Err(invalid(
            "options.unlimited_transfer_targets",
            "must list at least one target".into(),
        ));
    }
    if opts.lineups_per_squad == 0 {
        return Err(invalid("options.lineups_per_squad", "must be > 0".into()));
    }
    if opts.max_options == 0 {
        return Err(invalid("options.max_options", "must be > 0".into()));
    }
    if !(opts.typical_xi_points.is_finite() && opts.typical_xi_points > 0.0) {
        return Err(invalid(
            "options.typical_xi_points",
            format!("must be > 0, got {}", opts.typical_xi_points),
        ));
    }
    if opts.ceiling_xi_points <= opts.typical_xi_points {
        return Err(invalid(
            "options.ceiling_xi_points",
            format!(
                "must be greater than typical_xi_points ({}), got {}",
                opts.typical_xi_points, opts.ceiling_xi_points
            ),
        ));
    }

    // Cache
    if config.strategy.cache.ttl_secs == 0 {
        return Err(invalid("cache.ttl_secs", "must be > 0".into()));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Helper: returns the workspace root holding `defaults/`
    /// (works whether `cargo test` runs from the crate root or repo root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let candidates = [cwd.clone(), manifest.join("../.."), cwd.join("../..")];
        for c in candidates {
            if c.join("defaults/rules.toml").exists() {
                return c;
            }
        }
        panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
    }

    /// Fresh temp dir with `config/` populated from the shipped defaults.
    fn temp_with_defaults(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let config_dir = tmp.join("config");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&config_dir).unwrap();
        let root = project_root();
        fs::copy(root.join("defaults/rules.toml"), config_dir.join("rules.toml")).unwrap();
        fs::copy(
            root.join("defaults/strategy.toml"),
            config_dir.join("strategy.toml"),
        )
        .unwrap();
        tmp
    }

    fn replace_in(path: &Path, from: &str, to: &str) {
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains(from), "{from:?} not found in {path:?}");
        fs::write(path, text.replacen(from, to, 1)).unwrap();
    }

    fn expect_field(err: ConfigError, expected: &str) {
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, expected);
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config_from_project_files() {
        let tmp = temp_with_defaults("squadsmith_config_valid");
        let config = load_config_from(&tmp).expect("should load valid config");

        // Rules assertions
        assert_eq!(config.rules.name, "Classic Fantasy Football");
        assert!((config.rules.budget - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.rules.max_per_club, 3);
        assert!((config.rules.transfer_penalty - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.rules.quotas, PositionQuotas::default());

        // Strategy assertions
        let p = &config.strategy.predictor;
        assert!((p.season_weight - 0.40).abs() < f64::EPSILON);
        assert!((p.risk_aversion - 0.1).abs() < f64::EPSILON);
        assert!((p.max_points - 15.0).abs() < f64::EPSILON);
        assert!(config.strategy.solver.enabled);
        assert_eq!(config.strategy.solver.time_budget_ms, 2000);
        assert_eq!(config.strategy.options.transfer_targets, vec![0, 1, 2, 3]);
        assert_eq!(
            config.strategy.options.unlimited_transfer_targets,
            vec![0, 1, 2, 3, 5, 7, 10]
        );
        assert_eq!(config.strategy.options.lineups_per_squad, 3);
        assert_eq!(config.strategy.options.max_options, 10);
        assert_eq!(config.strategy.cache.ttl_secs, 300);

        assert_eq!(config.data_paths.players, "data/players.csv");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn shipped_defaults_match_builtin_defaults() {
        let tmp = temp_with_defaults("squadsmith_config_builtin");
        let loaded = load_config_from(&tmp).unwrap();
        let builtin = Config::default();
        assert_eq!(loaded.rules.quotas, builtin.rules.quotas);
        assert_eq!(
            loaded.strategy.options.transfer_targets,
            builtin.strategy.options.transfer_targets
        );
        assert!(
            (loaded.strategy.predictor.form_last3 - builtin.strategy.predictor.form_last3).abs()
                < f64::EPSILON
        );
        assert!(validate(&builtin).is_ok());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn predictor_section_accepts_partial_keys() {
        let tmp = temp_with_defaults("squadsmith_config_partial_predictor");
        let path = tmp.join("config/strategy.toml");
        let text = fs::read_to_string(&path).unwrap();
        let start = text.find("[predictor]").unwrap();
        let end = text.find("[solver]").unwrap();
        let trimmed = format!(
            "{}[predictor]\nrisk_aversion = 0.25\n\n{}",
            &text[..start],
            &text[end..]
        );
        fs::write(&path, trimmed).unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert!((config.strategy.predictor.risk_aversion - 0.25).abs() < f64::EPSILON);
        assert!((config.strategy.predictor.season_weight - 0.40).abs() < f64::EPSILON);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_budget() {
        let tmp = temp_with_defaults("squadsmith_config_zero_budget");
        replace_in(&tmp.join("config/rules.toml"), "budget = 100.0", "budget = 0.0");
        expect_field(load_config_from(&tmp).unwrap_err(), "rules.budget");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_quotas_not_summing_to_fifteen() {
        let tmp = temp_with_defaults("squadsmith_config_bad_quotas");
        replace_in(&tmp.join("config/rules.toml"), "forwards = 3", "forwards = 4");
        expect_field(load_config_from(&tmp).unwrap_err(), "rules.quotas");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_max_per_club() {
        let tmp = temp_with_defaults("squadsmith_config_zero_club");
        replace_in(&tmp.join("config/rules.toml"), "max_per_club = 3", "max_per_club = 0");
        expect_field(load_config_from(&tmp).unwrap_err(), "rules.max_per_club");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_nan_transfer_penalty() {
        let tmp = temp_with_defaults("squadsmith_config_nan_penalty");
        replace_in(
            &tmp.join("config/rules.toml"),
            "transfer_penalty = 4.0",
            "transfer_penalty = nan",
        );
        expect_field(
            load_config_from(&tmp).unwrap_err(),
            "rules.transfer_penalty",
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_nan_blend_weight() {
        let tmp = temp_with_defaults("squadsmith_config_nan_weight");
        replace_in(
            &tmp.join("config/strategy.toml"),
            "season_weight = 0.40",
            "season_weight = nan",
        );
        expect_field(
            load_config_from(&tmp).unwrap_err(),
            "predictor.season_weight",
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_risk_aversion_out_of_range() {
        let tmp = temp_with_defaults("squadsmith_config_risk_aversion");
        replace_in(
            &tmp.join("config/strategy.toml"),
            "risk_aversion = 0.1",
            "risk_aversion = 1.5",
        );
        expect_field(
            load_config_from(&tmp).unwrap_err(),
            "predictor.risk_aversion",
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_inverted_point_range() {
        let tmp = temp_with_defaults("squadsmith_config_point_range");
        replace_in(
            &tmp.join("config/strategy.toml"),
            "min_points = 0.5",
            "min_points = 20.0",
        );
        expect_field(load_config_from(&tmp).unwrap_err(), "predictor.min_points");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_ceiling_below_typical() {
        let tmp = temp_with_defaults("squadsmith_config_anchors");
        replace_in(
            &tmp.join("config/strategy.toml"),
            "ceiling_xi_points = 85.0",
            "ceiling_xi_points = 40.0",
        );
        expect_field(
            load_config_from(&tmp).unwrap_err(),
            "options.ceiling_xi_points",
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_transfer_targets() {
        let tmp = temp_with_defaults("squadsmith_config_targets");
        replace_in(
            &tmp.join("config/strategy.toml"),
            "transfer_targets = [0, 1, 2, 3]",
            "transfer_targets = []",
        );
        expect_field(
            load_config_from(&tmp).unwrap_err(),
            "options.transfer_targets",
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_time_budget() {
        let tmp = temp_with_defaults("squadsmith_config_time_budget");
        replace_in(
            &tmp.join("config/strategy.toml"),
            "time_budget_ms = 2000",
            "time_budget_ms = 0",
        );
        expect_field(
            load_config_from(&tmp).unwrap_err(),
            "solver.time_budget_ms",
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_rules_toml() {
        let tmp = temp_with_defaults("squadsmith_config_missing_rules");
        fs::remove_file(tmp.join("config/rules.toml")).unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path } => {
                assert!(path.ends_with("rules.toml"));
            }
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_with_defaults("squadsmith_config_parse_error");
        fs::write(tmp.join("config/strategy.toml"), "[solver\nenabled = ").unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ParseError { path, .. } => {
                assert!(path.ends_with("strategy.toml"));
            }
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("squadsmith_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/rules.toml"), defaults_dir.join("rules.toml")).unwrap();
        fs::copy(
            root.join("defaults/strategy.toml"),
            defaults_dir.join("strategy.toml"),
        )
        .unwrap();
        fs::write(defaults_dir.join("request.json.example"), "{}\n").unwrap();

        assert!(!tmp.join("config").exists());

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 2);

        assert!(tmp.join("config/rules.toml").exists());
        assert!(tmp.join("config/strategy.toml").exists());
        assert!(!tmp.join("config/request.json.example").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("squadsmith_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/rules.toml"), defaults_dir.join("rules.toml")).unwrap();
        fs::copy(
            root.join("defaults/strategy.toml"),
            defaults_dir.join("strategy.toml"),
        )
        .unwrap();

        fs::write(config_dir.join("rules.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(copied[0].ends_with("strategy.toml"));

        let content = fs::read_to_string(config_dir.join("rules.toml")).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("squadsmith_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
