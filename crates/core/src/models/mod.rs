#![allow(missing_docs)]

//! Shared domain models and the persisted data aggregate.
//!
//! Field names and enum values are the on-disk schema: structs serialise
//! with camelCase keys and enums with the literal values listed on each type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of holes in every round.
pub const HOLES_PER_ROUND: u8 = 18;

/// Highest handicap accepted by [`Settings::set_handicap`].
pub const MAX_HANDICAP: u8 = 54;

/// Generate a fresh identifier for courses, rounds and shots.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A single hole on a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hole {
    /// Hole number, 1 through 18.
    pub number: u8,
    /// Par for the hole (3, 4 or 5).
    pub par: u8,
    /// Relative difficulty, 1 (hardest) through 18. Unique per course.
    pub stroke_index: u8,
    /// Card distance in yards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_yards: Option<u32>,
    /// Distance for today's pin/tee placement, overriding the card distance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todays_distance: Option<u32>,
}

impl Hole {
    /// Distance to show for the hole, preferring today's placement.
    pub fn playing_distance(&self) -> Option<u32> {
        self.todays_distance.or(self.distance_yards)
    }
}

/// Course definition with its 18 holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    /// Exactly 18 holes, numbered 1 through 18.
    pub holes: Vec<Hole>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Look up a hole by its number.
    pub fn hole(&self, number: u8) -> Option<&Hole> {
        self.holes.iter().find(|hole| hole.number == number)
    }

    /// Mutable lookup, used for today's distance edits.
    pub fn hole_mut(&mut self, number: u8) -> Option<&mut Hole> {
        self.holes.iter_mut().find(|hole| hole.number == number)
    }

    /// Sum of par over all holes.
    pub fn total_par(&self) -> u32 {
        self.holes.iter().map(|hole| u32::from(hole.par)).sum()
    }
}

/// Whether a shot is a full swing or a putt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotKind {
    Stroke,
    Putt,
}

impl ShotKind {
    /// Prefix used in position labels (`stroke-1`, `putt-2`).
    pub fn label(self) -> &'static str {
        match self {
            ShotKind::Stroke => "stroke",
            ShotKind::Putt => "putt",
        }
    }
}

/// Qualitative result of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Good,
    Fire,
    Left,
    Right,
    Long,
    Short,
    LeftAndShort,
    LeftAndLong,
    RightAndShort,
    RightAndLong,
    Penalty,
}

impl Outcome {
    /// Outcomes that count as a shot finding its target.
    pub fn is_on_target(self) -> bool {
        matches!(self, Outcome::Good | Outcome::Fire)
    }
}

/// Terrain recorded for a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lie {
    Fairway,
    Rough,
    Sand,
    Green,
    Ob,
    Water,
}

impl Lie {
    /// Out of bounds and water both force a penalty on the following shot.
    pub fn is_hazard(self) -> bool {
        matches!(self, Lie::Ob | Lie::Water)
    }
}

/// Distance bucket for a putt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PuttDistance {
    #[serde(rename = "<4ft")]
    UnderFour,
    #[serde(rename = "5-10ft")]
    FiveToTen,
    #[serde(rename = "10+ft")]
    OverTen,
}

/// One recorded stroke or putt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shot {
    pub id: String,
    pub kind: ShotKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_direction: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lie: Option<Lie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub putt_distance: Option<PuttDistance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub poor_shot_flag: bool,
}

impl Shot {
    /// New stroke with no outcome chosen yet.
    pub fn stroke(club: Option<String>, lie: Option<Lie>) -> Self {
        Self {
            id: new_id(),
            kind: ShotKind::Stroke,
            outcome_direction: None,
            lie,
            putt_distance: None,
            club,
            timestamp: Utc::now(),
            poor_shot_flag: false,
        }
    }

    /// New putt with no outcome chosen yet.
    pub fn putt(distance: Option<PuttDistance>) -> Self {
        Self {
            id: new_id(),
            kind: ShotKind::Putt,
            outcome_direction: None,
            lie: None,
            putt_distance: distance,
            club: None,
            timestamp: Utc::now(),
            poor_shot_flag: false,
        }
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome_direction = Some(outcome);
        self
    }

    pub fn is_putt(&self) -> bool {
        self.kind == ShotKind::Putt
    }

    /// A shot is described once a direction was chosen. The poor flag does
    /// not count.
    pub fn is_described(&self) -> bool {
        self.outcome_direction.is_some()
    }
}

/// Committed result for one hole of a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoleScore {
    pub hole_number: u8,
    pub course_id: String,
    pub shots: Vec<Shot>,
    pub total_score: u32,
    pub par: u8,
    /// Gross strokes relative to par; handicap bumps are never folded in.
    pub net_score: i32,
    pub completed_at: DateTime<Utc>,
}

impl HoleScore {
    /// Build a score from the full shot list, deriving the totals.
    pub fn new(hole_number: u8, course_id: impl Into<String>, par: u8, shots: Vec<Shot>) -> Self {
        let total_score = shots.len() as u32;
        Self {
            hole_number,
            course_id: course_id.into(),
            shots,
            total_score,
            par,
            net_score: total_score as i32 - i32::from(par),
            completed_at: Utc::now(),
        }
    }

    pub fn strokes(&self) -> impl Iterator<Item = &Shot> {
        self.shots.iter().filter(|shot| !shot.is_putt())
    }

    pub fn putts(&self) -> impl Iterator<Item = &Shot> {
        self.shots.iter().filter(|shot| shot.is_putt())
    }
}

/// An 18-hole scoring session tied to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: String,
    /// Course the round is played on.
    pub course_id: String,
    /// Course name at the time the round was started or last synced.
    pub course_name: String,
    /// At most one score per hole, ordered by hole number.
    #[serde(default)]
    pub hole_scores: Vec<HoleScore>,
    /// Sum of `total_score` over `hole_scores`.
    pub total_score: u32,
    /// Par of the whole course, played holes or not.
    pub total_par: u32,
    pub started_at: DateTime<Utc>,
    /// Set when the round is finalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// True once finalized; stays true while a past round is being edited.
    #[serde(default)]
    pub is_complete: bool,
}

impl Round {
    /// Start an empty round on `course`.
    pub fn new(course: &Course) -> Self {
        Self {
            id: new_id(),
            course_id: course.id.clone(),
            course_name: course.name.clone(),
            hole_scores: Vec::new(),
            total_score: 0,
            total_par: course.total_par(),
            started_at: Utc::now(),
            completed_at: None,
            is_complete: false,
        }
    }

    pub fn hole_score(&self, hole_number: u8) -> Option<&HoleScore> {
        self.hole_scores
            .iter()
            .find(|score| score.hole_number == hole_number)
    }

    /// Replace (never merge) the score for the hole and refresh the total.
    pub fn upsert_hole_score(&mut self, score: HoleScore) {
        self.hole_scores
            .retain(|existing| existing.hole_number != score.hole_number);
        self.hole_scores.push(score);
        self.hole_scores.sort_by_key(|score| score.hole_number);
        self.recompute_total();
    }

    /// Drop the score for the hole, returning whether one existed.
    pub fn remove_hole_score(&mut self, hole_number: u8) -> bool {
        let before = self.hole_scores.len();
        self.hole_scores
            .retain(|existing| existing.hole_number != hole_number);
        let removed = self.hole_scores.len() != before;
        if removed {
            self.recompute_total();
        }
        removed
    }

    pub fn recompute_total(&mut self) {
        self.total_score = self.hole_scores.iter().map(|score| score.total_score).sum();
    }

    /// First hole without a committed score, if any.
    pub fn first_unplayed_hole(&self) -> Option<u8> {
        (1..=HOLES_PER_ROUND).find(|number| self.hole_score(*number).is_none())
    }
}

/// Club for the first shot of a par 3.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Par3Clubs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot1: Option<String>,
}

/// Clubs for the first two shots of a par 4.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Par4Clubs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot2: Option<String>,
}

/// Clubs for the first three shots of a par 5.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Par5Clubs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot3: Option<String>,
}

/// Per-par default club selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultClubs {
    #[serde(default)]
    pub par5: Par5Clubs,
    #[serde(default)]
    pub par4: Par4Clubs,
    #[serde(default)]
    pub par3: Par3Clubs,
}

/// Clubs offered when no bag was configured.
pub const DEFAULT_BAG: &[&str] = &[
    "Driver",
    "3-Wood",
    "5-Wood",
    "4-Iron",
    "5-Iron",
    "6-Iron",
    "7-Iron",
    "8-Iron",
    "9-Iron",
    "Pitching Wedge",
    "Gap Wedge",
    "Sand Wedge",
    "Putter",
];

/// Player settings persisted alongside courses and rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handicap: Option<u8>,
    #[serde(default)]
    pub default_clubs_by_par: DefaultClubs,
    #[serde(default = "default_bag")]
    pub clubs: Vec<String>,
}

fn default_bag() -> Vec<String> {
    DEFAULT_BAG.iter().map(|club| club.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            handicap: None,
            default_clubs_by_par: DefaultClubs::default(),
            clubs: default_bag(),
        }
    }
}

impl Settings {
    /// Store the handicap, clamped to `0..=54`.
    pub fn set_handicap(&mut self, handicap: Option<u8>) {
        self.handicap = handicap.map(|value| value.min(MAX_HANDICAP));
    }

    /// Configure the default club for `shot` (1-based) on holes of `par`.
    ///
    /// Returns `false` when the par/shot slot does not exist.
    pub fn set_default_club(&mut self, par: u8, shot: u8, club: Option<String>) -> bool {
        let clubs = &mut self.default_clubs_by_par;
        let slot = match (par, shot) {
            (5, 1) => &mut clubs.par5.shot1,
            (5, 2) => &mut clubs.par5.shot2,
            (5, 3) => &mut clubs.par5.shot3,
            (4, 1) => &mut clubs.par4.shot1,
            (4, 2) => &mut clubs.par4.shot2,
            (3, 1) => &mut clubs.par3.shot1,
            _ => return false,
        };
        *slot = club.map(|value| value.trim().to_string()).filter(|value| !value.is_empty());
        true
    }

    /// Add a club to the bag unless it is already present.
    pub fn add_club(&mut self, club: &str) -> bool {
        let club = club.trim();
        if club.is_empty() || self.clubs.iter().any(|existing| existing == club) {
            return false;
        }
        self.clubs.push(club.to_string());
        true
    }

    pub fn remove_club(&mut self, club: &str) -> bool {
        let before = self.clubs.len();
        self.clubs.retain(|existing| existing != club);
        self.clubs.len() != before
    }
}

/// Everything the store persists under a single key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAggregate {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub rounds: Vec<Round>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_round: Option<Round>,
    #[serde(default)]
    pub settings: Settings,
}

impl DataAggregate {
    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|course| course.id == id)
    }

    pub fn course_mut(&mut self, id: &str) -> Option<&mut Course> {
        self.courses.iter_mut().find(|course| course.id == id)
    }

    pub fn round(&self, id: &str) -> Option<&Round> {
        self.rounds.iter().find(|round| round.id == id)
    }
}
