// Signal snapshot loading from CSV files.
//
// Three files make up a snapshot: one row per player (season aggregates and
// fitness), one row per player per completed period (history), and one row
// per club per upcoming period (fixtures). Malformed rows are skipped with a
// warning rather than failing the load.

use super::{ClubFixture, SignalSnapshot, StoreError};
use crate::config::DataPaths;
use crate::player::{
    AvailabilityStatus, ClubId, Fitness, PeriodId, PeriodResult, PlayerCandidate, PlayerId,
    Position, SeasonTotals,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// players.csv row. Columns beyond these are ignored.
#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: PlayerId,
    name: String,
    club: ClubId,
    #[serde(default)]
    club_name: String,
    position: String,
    price: f64,
    #[serde(default)]
    status: String,
    #[serde(default)]
    total_points: f64,
    #[serde(default)]
    goals: u32,
    #[serde(default)]
    assists: u32,
    #[serde(default)]
    clean_sheets: u32,
    #[serde(default)]
    bonus: u32,
    #[serde(default)]
    form: Option<f64>,
    #[serde(default)]
    chance_this: Option<u8>,
    #[serde(default)]
    chance_next: Option<u8>,
    #[serde(default)]
    has_news: Option<bool>,
}

/// history.csv row.
#[derive(Debug, Deserialize)]
struct RawHistory {
    player_id: PlayerId,
    period: PeriodId,
    points: f64,
    #[serde(default)]
    minutes: u32,
    #[serde(default)]
    goals: u32,
    #[serde(default)]
    assists: u32,
    #[serde(default, alias = "expected_goals")]
    xg: Option<f64>,
    #[serde(default, alias = "expected_assists")]
    xa: Option<f64>,
    #[serde(default)]
    was_home: Option<bool>,
}

/// fixtures.csv row.
#[derive(Debug, Deserialize)]
struct RawFixture {
    club: ClubId,
    period: PeriodId,
    opponent: ClubId,
    is_home: bool,
    difficulty: u8,
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerCandidate>, ::csv::Error> {
    let mut reader = ::csv::Reader::from_reader(rdr);
    let mut by_id: BTreeMap<PlayerId, PlayerCandidate> = BTreeMap::new();
    for result in reader.deserialize::<RawPlayer>() {
        match result {
            Ok(raw) => {
                let name = raw.name.trim().to_string();
                let Some(position) = Position::from_str_pos(&raw.position) else {
                    warn!("skipping player '{}': unknown position '{}'", name, raw.position);
                    continue;
                };
                if !(raw.price.is_finite() && raw.price > 0.0) {
                    warn!("skipping player '{}': invalid price {}", name, raw.price);
                    continue;
                }
                if !raw.total_points.is_finite() || raw.form.is_some_and(|f| !f.is_finite()) {
                    warn!("skipping player '{}': non-finite points or form", name);
                    continue;
                }
                if by_id.contains_key(&raw.id) {
                    warn!("duplicate player id {}, using latest row", raw.id);
                }
                by_id.insert(
                    raw.id,
                    PlayerCandidate {
                        id: raw.id,
                        name,
                        club: raw.club,
                        club_name: raw.club_name.trim().to_string(),
                        position,
                        price: raw.price,
                        status: AvailabilityStatus::from_code(&raw.status),
                        season: SeasonTotals {
                            total_points: raw.total_points,
                            goals: raw.goals,
                            assists: raw.assists,
                            clean_sheets: raw.clean_sheets,
                            bonus: raw.bonus,
                            form: raw.form,
                        },
                        recent: Vec::new(),
                        fixtures: Vec::new(),
                        fitness: Fitness {
                            chance_this: raw.chance_this.map(|c| c.min(100)),
                            chance_next: raw.chance_next.map(|c| c.min(100)),
                            has_news: raw.has_news.unwrap_or(false),
                        },
                    },
                );
            }
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
            }
        }
    }
    Ok(by_id.into_values().collect())
}

fn load_history_from_reader<R: Read>(
    rdr: R,
) -> Result<BTreeMap<PlayerId, Vec<PeriodResult>>, ::csv::Error> {
    let mut reader = ::csv::Reader::from_reader(rdr);
    let mut history: BTreeMap<PlayerId, Vec<PeriodResult>> = BTreeMap::new();
    for result in reader.deserialize::<RawHistory>() {
        match result {
            Ok(raw) => {
                let xg = raw.xg.unwrap_or(0.0);
                let xa = raw.xa.unwrap_or(0.0);
                if !(raw.points.is_finite() && xg.is_finite() && xa.is_finite()) {
                    warn!(
                        "skipping history for player {} period {}: non-finite value",
                        raw.player_id, raw.period
                    );
                    continue;
                }
                history.entry(raw.player_id).or_default().push(PeriodResult {
                    period: raw.period,
                    points: raw.points,
                    minutes: raw.minutes,
                    goals: raw.goals,
                    assists: raw.assists,
                    expected_goals: xg.max(0.0),
                    expected_assists: xa.max(0.0),
                    was_home: raw.was_home,
                });
            }
            Err(e) => {
                warn!("skipping malformed history row: {}", e);
            }
        }
    }
    // Most recent first; a repeated period keeps the later row.
    for rows in history.values_mut() {
        rows.reverse();
        rows.sort_by(|a, b| b.period.cmp(&a.period));
        rows.dedup_by_key(|r| r.period);
    }
    Ok(history)
}

fn load_fixtures_from_reader<R: Read>(rdr: R) -> Result<Vec<ClubFixture>, ::csv::Error> {
    let mut reader = ::csv::Reader::from_reader(rdr);
    let mut fixtures = Vec::new();
    for result in reader.deserialize::<RawFixture>() {
        match result {
            Ok(raw) => {
                if !(1..=5).contains(&raw.difficulty) {
                    warn!(
                        "skipping fixture for club {} period {}: difficulty {} outside 1-5",
                        raw.club, raw.period, raw.difficulty
                    );
                    continue;
                }
                fixtures.push(ClubFixture {
                    club: raw.club,
                    period: raw.period,
                    opponent: raw.opponent,
                    is_home: raw.is_home,
                    difficulty: raw.difficulty,
                });
            }
            Err(e) => {
                warn!("skipping malformed fixture row: {}", e);
            }
        }
    }
    Ok(fixtures)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, StoreError> {
    std::fs::File::open(path).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_err(path: &Path) -> impl FnOnce(::csv::Error) -> StoreError + '_ {
    move |e| StoreError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load player rows (without history) from a CSV file.
pub fn load_players(path: &Path) -> Result<Vec<PlayerCandidate>, StoreError> {
    load_players_from_reader(open(path)?).map_err(csv_err(path))
}

/// Load per-period history from a CSV file, keyed by player id,
/// most recent period first.
pub fn load_history(path: &Path) -> Result<BTreeMap<PlayerId, Vec<PeriodResult>>, StoreError> {
    load_history_from_reader(open(path)?).map_err(csv_err(path))
}

/// Load club fixtures from a CSV file.
pub fn load_fixtures(path: &Path) -> Result<Vec<ClubFixture>, StoreError> {
    load_fixtures_from_reader(open(path)?).map_err(csv_err(path))
}

/// Assemble a snapshot from the three CSV files named in `paths`.
/// The history file is optional: a missing file yields players with no
/// recorded periods.
pub fn load_snapshot_from_paths(season: &str, paths: &DataPaths) -> Result<SignalSnapshot, StoreError> {
    let mut players = load_players(Path::new(&paths.players))?;
    if players.is_empty() {
        return Err(StoreError::Validation(
            "player CSV produced zero valid rows".into(),
        ));
    }

    let history_path = Path::new(&paths.history);
    let mut history = if history_path.exists() {
        load_history(history_path)?
    } else {
        warn!("history file {} not found, continuing without history", paths.history);
        BTreeMap::new()
    };

    let known: std::collections::BTreeSet<PlayerId> = players.iter().map(|p| p.id).collect();
    let orphaned = history.keys().filter(|id| !known.contains(id)).count();
    if orphaned > 0 {
        warn!("{} history entries reference unknown players", orphaned);
    }
    for p in players.iter_mut() {
        if let Some(rows) = history.remove(&p.id) {
            p.recent = rows;
        }
    }

    let fixtures = load_fixtures(Path::new(&paths.fixtures))?;

    info!(
        "loaded snapshot {}: {} players, {} fixtures",
        season,
        players.len(),
        fixtures.len()
    );

    Ok(SignalSnapshot {
        season: season.to_string(),
        players,
        fixtures,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
