// Player identity, position, availability and raw signal bundle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable player identifier from the signal store.
pub type PlayerId = u32;
/// Club (real-world team) identifier.
pub type ClubId = u32;
/// Scoring round (gameweek) identifier.
pub type PeriodId = u32;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// The four mutually exclusive playing roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// All positions in squad display order.
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Accepts the common abbreviations ("GK"/"GKP", "DEF", "MID", "FWD")
    /// as well as the numeric element types 1-4.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "GKP" | "1" => Some(Position::Goalkeeper),
            "DEF" | "D" | "2" => Some(Position::Defender),
            "MID" | "M" | "3" => Some(Position::Midfielder),
            "FWD" | "F" | "FW" | "4" => Some(Position::Forward),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// Dense index into per-position arrays.
    pub fn index(&self) -> usize {
        match self {
            Position::Goalkeeper => 0,
            Position::Defender => 1,
            Position::Midfielder => 2,
            Position::Forward => 3,
        }
    }

    /// Baseline expected points per period for a player with no history.
    pub fn baseline_points(&self) -> f64 {
        match self {
            Position::Goalkeeper => 3.5,
            Position::Defender => 4.0,
            Position::Midfielder => 4.5,
            Position::Forward => 4.5,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Availability status as published by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Doubtful,
    Injured,
    Suspended,
    Unavailable,
}

impl AvailabilityStatus {
    /// Parse the single-letter status code. Unknown or empty codes are
    /// treated as available.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "d" | "doubtful" => AvailabilityStatus::Doubtful,
            "i" | "injured" => AvailabilityStatus::Injured,
            "s" | "suspended" => AvailabilityStatus::Suspended,
            "u" | "n" | "unavailable" => AvailabilityStatus::Unavailable,
            _ => AvailabilityStatus::Available,
        }
    }

    /// Whether a player with this status may enter the candidate pool
    /// without being explicitly locked.
    pub fn is_selectable(&self) -> bool {
        matches!(
            self,
            AvailabilityStatus::Available | AvailabilityStatus::Doubtful
        )
    }

    /// Probability-like risk that the player misses the next period.
    pub fn injury_risk(&self) -> f64 {
        match self {
            AvailabilityStatus::Available => 0.0,
            AvailabilityStatus::Doubtful => 0.3,
            AvailabilityStatus::Injured => 0.8,
            AvailabilityStatus::Suspended => 0.9,
            AvailabilityStatus::Unavailable => 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw signals
// ---------------------------------------------------------------------------

/// Season-to-date aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonTotals {
    pub total_points: f64,
    pub goals: u32,
    pub assists: u32,
    pub clean_sheets: u32,
    pub bonus: u32,
    /// Official rolling form (points per game over recent periods), if published.
    pub form: Option<f64>,
}

impl SeasonTotals {
    /// Whether any season aggregate has been recorded.
    pub fn is_empty(&self) -> bool {
        self.total_points == 0.0
            && self.goals == 0
            && self.assists == 0
            && self.clean_sheets == 0
            && self.bonus == 0
            && self.form.is_none()
    }
}

/// One completed period for a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodResult {
    pub period: PeriodId,
    pub points: f64,
    pub minutes: u32,
    pub goals: u32,
    pub assists: u32,
    pub expected_goals: f64,
    pub expected_assists: f64,
    pub was_home: Option<bool>,
}

/// One upcoming fixture from the player's club perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureOutlook {
    pub period: PeriodId,
    pub opponent: ClubId,
    pub is_home: bool,
    /// Opponent strength rating, 1 (easiest) to 5 (hardest).
    pub difficulty: u8,
}

/// Fitness indicators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fitness {
    /// Chance of playing this period, 0-100. `None` means no doubt published.
    pub chance_this: Option<u8>,
    pub chance_next: Option<u8>,
    pub has_news: bool,
}

// ---------------------------------------------------------------------------
// PlayerCandidate
// ---------------------------------------------------------------------------

/// Immutable snapshot of one player for the duration of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCandidate {
    pub id: PlayerId,
    pub name: String,
    pub club: ClubId,
    #[serde(default)]
    pub club_name: String,
    pub position: Position,
    /// Price in millions.
    pub price: f64,
    #[serde(default)]
    pub status: AvailabilityStatus,
    #[serde(default)]
    pub season: SeasonTotals,
    /// Completed periods, most recent first.
    #[serde(default)]
    pub recent: Vec<PeriodResult>,
    /// Upcoming fixtures in period order. Attached by the pool builder.
    #[serde(default)]
    pub fixtures: Vec<FixtureOutlook>,
    #[serde(default)]
    pub fitness: Fitness,
}

impl PlayerCandidate {
    /// Minimal candidate with no signals. Mostly useful for tests and for
    /// players new to the game.
    pub fn new(id: PlayerId, name: &str, club: ClubId, position: Position, price: f64) -> Self {
        PlayerCandidate {
            id,
            name: name.to_string(),
            club,
            club_name: String::new(),
            position,
            price,
            status: AvailabilityStatus::Available,
            season: SeasonTotals::default(),
            recent: Vec::new(),
            fixtures: Vec::new(),
            fitness: Fitness::default(),
        }
    }

    /// Whether the player has any history the model can use.
    pub fn has_history(&self) -> bool {
        !self.recent.is_empty() || !self.season.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
