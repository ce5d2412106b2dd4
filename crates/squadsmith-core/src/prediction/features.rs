// Feature extraction: raw player signals into the numeric inputs of the
// expected-value model.
//
// Every feature has a documented default, so a player with no history, no
// fixtures and no fitness news still produces a complete feature set.

use crate::player::PlayerCandidate;

/// Points at or above which a period counts as a big haul.
pub const BIG_HAUL_POINTS: f64 = 8.0;
/// Points at or below which a period counts as a blank.
pub const BLANK_POINTS: f64 = 1.0;
/// Minutes at or above which an appearance counts as a start.
pub const START_MINUTES: u32 = 60;

const FORM_DECAY: f64 = 0.2;
const FORM_WINDOW: usize = 5;
const DEFAULT_CONSISTENCY: f64 = 5.0;
const NEUTRAL_DIFFICULTY: f64 = 3.0;

/// Model inputs for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerFeatures {
    // Season
    pub games: f64,
    pub season_total: f64,
    pub ppg: f64,
    pub official_form: f64,
    pub goals_per_game: f64,
    pub assists_per_game: f64,
    pub clean_sheet_rate: f64,
    pub bonus_rate: f64,
    pub xg_per_game: f64,
    pub xg_overperformance: f64,

    // Form
    pub form_3: f64,
    pub form_5: f64,
    pub weighted_form: f64,
    pub trend: f64,
    pub recent_xg: f64,
    pub recent_xa: f64,
    pub consistency: f64,
    pub ceiling: f64,

    // Fixtures
    pub next_difficulty: f64,
    pub next_home: f64,
    /// Mean difficulty over the horizon window.
    pub avg_difficulty: f64,
    /// Share of home fixtures in the horizon window.
    pub home_share: f64,

    // History
    pub home_ppg: f64,
    pub away_ppg: f64,
    pub big_haul_rate: f64,
    pub blank_rate: Option<f64>,

    // Fitness
    pub chance_playing: f64,
    pub injury_risk: f64,
    pub recent_minutes: f64,
    pub started_share: f64,

    pub has_history: bool,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Extract features over the fixtures in `horizon` periods from the
/// candidate's first attached fixture.
pub fn extract(candidate: &PlayerCandidate, horizon: u32) -> PlayerFeatures {
    let recent = &candidate.recent;
    let season = &candidate.season;
    let n = recent.len();

    // --- Season ---
    let games = if n > 0 {
        n as f64
    } else if season.total_points > 0.0 {
        (season.total_points / 4.0).max(1.0)
    } else {
        0.0
    };
    let recent_points: Vec<f64> = recent.iter().map(|r| r.points).collect();
    let season_total = if season.total_points > 0.0 {
        season.total_points
    } else {
        recent_points.iter().sum()
    };
    let per_game = |total: f64| if games > 0.0 { total / games } else { 0.0 };

    let goals = if season.goals > 0 {
        season.goals as f64
    } else {
        recent.iter().map(|r| r.goals as f64).sum()
    };
    let assists = if season.assists > 0 {
        season.assists as f64
    } else {
        recent.iter().map(|r| r.assists as f64).sum()
    };
    let observed_goals: f64 = recent.iter().map(|r| r.goals as f64).sum();
    let total_xg: f64 = recent.iter().map(|r| r.expected_goals).sum();
    let observed = |total: f64| if n > 0 { total / n as f64 } else { 0.0 };

    // --- Form ---
    let last5 = &recent_points[..n.min(FORM_WINDOW)];
    let form_3 = mean(&recent_points[..n.min(3)]);
    let form_5 = mean(last5);
    let weighted_form = if last5.is_empty() {
        0.0
    } else {
        let (num, den) = last5
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (i, p)| {
                let w = (-FORM_DECAY * i as f64).exp();
                (num + w * p, den + w)
            });
        num / den
    };
    let trend = if n >= 6 {
        mean(&recent_points[..3]) - mean(&recent_points[3..6])
    } else {
        0.0
    };
    let recent5 = &recent[..n.min(FORM_WINDOW)];
    let recent_xg = mean(&recent5.iter().map(|r| r.expected_goals).collect::<Vec<_>>());
    let recent_xa = mean(&recent5.iter().map(|r| r.expected_assists).collect::<Vec<_>>());
    let consistency = if n >= 3 {
        std_dev(last5)
    } else {
        DEFAULT_CONSISTENCY
    };
    let ceiling = last5.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // --- Fixtures ---
    let window: Vec<_> = match candidate.fixtures.first() {
        Some(first) => {
            let end = first.period.saturating_add(horizon.max(1));
            candidate
                .fixtures
                .iter()
                .filter(|f| f.period < end)
                .collect()
        }
        None => Vec::new(),
    };
    let difficulties: Vec<f64> = window.iter().map(|f| f.difficulty as f64).collect();
    let (next_difficulty, next_home) = match window.first() {
        Some(f) => (f.difficulty as f64, if f.is_home { 1.0 } else { 0.0 }),
        None => (NEUTRAL_DIFFICULTY, 0.5),
    };
    let avg_difficulty = if difficulties.is_empty() {
        NEUTRAL_DIFFICULTY
    } else {
        mean(&difficulties)
    };
    let home_share = if window.is_empty() {
        0.5
    } else {
        window.iter().filter(|f| f.is_home).count() as f64 / window.len() as f64
    };

    // --- History ---
    let venue_points = |home: bool| -> Vec<f64> {
        recent
            .iter()
            .filter(|r| r.was_home == Some(home))
            .map(|r| r.points)
            .collect()
    };
    let home_ppg = mean(&venue_points(true));
    let away_ppg = mean(&venue_points(false));
    let share = |pred: &dyn Fn(f64) -> bool| -> f64 {
        if n == 0 {
            0.0
        } else {
            recent_points.iter().filter(|p| pred(**p)).count() as f64 / n as f64
        }
    };
    let big_haul_rate = share(&|p| p >= BIG_HAUL_POINTS);
    let blank_rate = (n > 0).then(|| share(&|p| p <= BLANK_POINTS));

    // --- Fitness ---
    let chance_playing = candidate
        .fitness
        .chance_this
        .map(|c| c.min(100) as f64 / 100.0)
        .unwrap_or(1.0);
    let minutes3: Vec<f64> = recent.iter().take(3).map(|r| r.minutes as f64).collect();
    let recent_minutes = if minutes3.is_empty() {
        90.0
    } else {
        mean(&minutes3)
    };
    let started_share = if recent5.is_empty() {
        1.0
    } else {
        recent5.iter().filter(|r| r.minutes >= START_MINUTES).count() as f64
            / recent5.len() as f64
    };

    PlayerFeatures {
        games,
        season_total,
        ppg: per_game(season_total),
        official_form: season.form.filter(|f| f.is_finite()).unwrap_or(0.0).max(0.0),
        goals_per_game: per_game(goals),
        assists_per_game: per_game(assists),
        clean_sheet_rate: per_game(season.clean_sheets as f64),
        bonus_rate: per_game(season.bonus as f64),
        xg_per_game: observed(total_xg),
        xg_overperformance: observed_goals - total_xg,

        form_3,
        form_5,
        weighted_form,
        trend,
        recent_xg,
        recent_xa,
        consistency,
        ceiling: if ceiling.is_finite() { ceiling } else { 0.0 },

        next_difficulty,
        next_home,
        avg_difficulty,
        home_share,

        home_ppg,
        away_ppg,
        big_haul_rate,
        blank_rate,

        chance_playing,
        injury_risk: candidate.status.injury_risk(),
        recent_minutes,
        started_share,

        has_history: candidate.has_history(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
