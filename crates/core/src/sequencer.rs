//! Working buffer for the hole being played.
//!
//! A [`ShotSequencer`] owns the strokes and putts of one hole as a single
//! navigable sequence (strokes first, then putts) with one cursor into it.
//! Decisions that a front end would ask the player about (another shot after
//! a penalty or a poor shot) are passed in as [`FollowUp`] values.

use tracing::debug;

use crate::{
    error::{GolfError, GolfResult},
    models::{Hole, HoleScore, Lie, Outcome, PuttDistance, Settings, Shot, ShotKind},
};

/// Putts seeded for a hole with no recorded shots.
pub const EXPECTED_PUTTS: usize = 2;

/// Club suggested for the extra shot after a poor shot.
pub const POOR_SHOT_CLUB: &str = "Gap Wedge";

/// Club suggested when replaying from a water drop.
pub const WATER_DROP_CLUB: &str = "7-Iron";

/// Strokes seeded before the putts: regulation minus the two putts.
pub fn expected_stroke_count(par: u8) -> usize {
    usize::from(par.saturating_sub(2))
}

/// Default club for the `stroke_number`-th (1-based) stroke on a hole of `par`.
pub fn default_club(par: u8, stroke_number: usize, settings: &Settings) -> String {
    let clubs = &settings.default_clubs_by_par;
    let (configured, fallback) = match (par, stroke_number) {
        (5, 0 | 1) => (&clubs.par5.shot1, "Driver"),
        (5, 2) => (&clubs.par5.shot2, "7-Iron"),
        (5, _) => (&clubs.par5.shot3, "9-Iron"),
        (3, _) => (&clubs.par3.shot1, "7-Iron"),
        (_, 0 | 1) => (&clubs.par4.shot1, "Driver"),
        (_, _) => (&clubs.par4.shot2, "7-Iron"),
    };
    configured.clone().unwrap_or_else(|| fallback.to_string())
}

/// Caller's answer to "add another shot?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Append the extra shot.
    Add,
    /// Leave the hole as it is.
    Skip,
}

/// What the player picked for a shot's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeChoice {
    /// A direction (good, fire, left, ...), clearing any poor flag.
    Direction(Outcome),
    /// Flag the shot as poor, keeping its direction.
    Poor,
}

/// Effect of [`ShotSequencer::set_lie`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LieChange {
    /// Shot forced to a penalty outcome.
    pub penalized: Option<String>,
    /// Stroke appended because the caller chose [`FollowUp::Add`].
    pub added: Option<String>,
}

/// Whether the hole still has shots after a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Other shots are left on the hole.
    Remaining,
    /// The last shot was removed.
    Emptied,
}

/// Strokes then putts of one hole, with a cursor on the shot being edited.
///
/// The cursor is `None` only when the hole has no shots.
#[derive(Debug, Clone)]
pub struct ShotSequencer {
    hole_number: u8,
    par: u8,
    strokes: Vec<Shot>,
    putts: Vec<Shot>,
    cursor: Option<usize>,
}

impl ShotSequencer {
    /// Open a hole from its stored score, or seed defaults when none exists.
    pub fn open(hole: &Hole, stored: Option<&HoleScore>, settings: &Settings) -> Self {
        match stored {
            Some(score) if !score.shots.is_empty() => Self::from_shots(hole, score.shots.clone()),
            _ => Self::seeded(hole, settings),
        }
    }

    /// Regulation defaults: fairway strokes ending on the green, then two putts.
    pub fn seeded(hole: &Hole, settings: &Settings) -> Self {
        let stroke_count = expected_stroke_count(hole.par);
        let strokes = (0..stroke_count)
            .map(|offset| {
                let lie = if offset + 1 == stroke_count {
                    Lie::Green
                } else {
                    Lie::Fairway
                };
                Shot::stroke(Some(default_club(hole.par, offset + 1, settings)), Some(lie))
                    .with_outcome(Outcome::Good)
            })
            .collect();
        let putts = [PuttDistance::FiveToTen, PuttDistance::UnderFour]
            .into_iter()
            .take(EXPECTED_PUTTS)
            .map(|distance| Shot::putt(Some(distance)).with_outcome(Outcome::Good))
            .collect();
        Self::build(hole, strokes, putts)
    }

    /// Rebuild a buffer from persisted shots, ordering each kind by timestamp.
    pub fn from_shots(hole: &Hole, shots: Vec<Shot>) -> Self {
        let (mut putts, mut strokes): (Vec<Shot>, Vec<Shot>) =
            shots.into_iter().partition(Shot::is_putt);
        strokes.sort_by_key(|shot| shot.timestamp);
        putts.sort_by_key(|shot| shot.timestamp);
        Self::build(hole, strokes, putts)
    }

    fn build(hole: &Hole, strokes: Vec<Shot>, putts: Vec<Shot>) -> Self {
        let cursor = (!strokes.is_empty() || !putts.is_empty()).then_some(0);
        Self {
            hole_number: hole.number,
            par: hole.par,
            strokes,
            putts,
            cursor,
        }
    }

    /// Hole this buffer belongs to.
    pub fn hole_number(&self) -> u8 {
        self.hole_number
    }

    /// Par of the hole.
    pub fn par(&self) -> u8 {
        self.par
    }

    /// Strokes in play order.
    pub fn strokes(&self) -> &[Shot] {
        &self.strokes
    }

    /// Putts in play order.
    pub fn putts(&self) -> &[Shot] {
        &self.putts
    }

    /// Strokes plus putts.
    pub fn len(&self) -> usize {
        self.strokes.len() + self.putts.len()
    }

    /// True once every shot was removed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cursor into the strokes-then-putts sequence; `None` only when empty.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Shot under the cursor.
    pub fn current(&self) -> Option<&Shot> {
        self.cursor.and_then(|index| self.get(index))
    }

    /// Shot at a sequence index (putts follow the strokes).
    pub fn get(&self, index: usize) -> Option<&Shot> {
        match index.checked_sub(self.strokes.len()) {
            None => self.strokes.get(index),
            Some(putt_index) => self.putts.get(putt_index),
        }
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut Shot> {
        match index.checked_sub(self.strokes.len()) {
            None => self.strokes.get_mut(index),
            Some(putt_index) => self.putts.get_mut(putt_index),
        }
    }

    /// All shots in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &Shot> {
        self.strokes.iter().chain(self.putts.iter())
    }

    /// Sequence index of the shot with `shot_id`.
    pub fn index_of(&self, shot_id: &str) -> Option<usize> {
        self.iter().position(|shot| shot.id == shot_id)
    }

    fn require(&self, shot_id: &str) -> GolfResult<usize> {
        self.index_of(shot_id)
            .ok_or_else(|| GolfError::UnknownShot(shot_id.to_string()))
    }

    /// Position label such as `stroke-2` or `putt-1`.
    pub fn position_label(&self, index: usize) -> Option<String> {
        let shot = self.get(index)?;
        let position = match shot.kind {
            ShotKind::Stroke => index + 1,
            ShotKind::Putt => index - self.strokes.len() + 1,
        };
        Some(format!("{}-{}", shot.kind.label(), position))
    }

    /// Labels of every shot still waiting for an outcome.
    pub fn missing_outcomes(&self) -> Vec<String> {
        self.iter()
            .enumerate()
            .filter(|(_, shot)| !shot.is_described())
            .filter_map(|(index, _)| self.position_label(index))
            .collect()
    }

    /// Move the cursor to `index`; out-of-range targets are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.len() {
            self.cursor = Some(index);
            true
        } else {
            false
        }
    }

    /// Step the cursor forward.
    pub fn next(&mut self) -> bool {
        match self.cursor {
            Some(index) => self.select(index + 1),
            None => false,
        }
    }

    /// Step the cursor back.
    pub fn previous(&mut self) -> bool {
        match self.cursor {
            Some(index) if index > 0 => self.select(index - 1),
            _ => false,
        }
    }

    fn push_stroke(&mut self, club: Option<String>) -> String {
        let mut lie = Lie::Fairway;
        if let Some(last) = self.strokes.last_mut() {
            if last.lie == Some(Lie::Green) {
                last.lie = Some(Lie::Fairway);
                lie = Lie::Green;
            }
        }
        let shot = Shot::stroke(club, Some(lie));
        let id = shot.id.clone();
        self.strokes.push(shot);
        self.cursor = Some(self.strokes.len() - 1);
        debug!(hole = self.hole_number, shot = %id, "added stroke");
        id
    }

    /// Append a stroke with the default club for its position.
    pub fn add_stroke(&mut self, settings: &Settings) -> String {
        let club = default_club(self.par, self.strokes.len() + 1, settings);
        self.push_stroke(Some(club))
    }

    /// Append a putt.
    pub fn add_putt(&mut self) -> String {
        let shot = Shot::putt(Some(PuttDistance::UnderFour));
        let id = shot.id.clone();
        self.putts.push(shot);
        self.cursor = Some(self.len() - 1);
        debug!(hole = self.hole_number, shot = %id, "added putt");
        id
    }

    /// Delete a shot, keeping the cursor on a valid position.
    pub fn remove_shot(&mut self, shot_id: &str) -> GolfResult<Removal> {
        let index = self.require(shot_id)?;
        if index < self.strokes.len() {
            self.strokes.remove(index);
        } else {
            self.putts.remove(index - self.strokes.len());
        }
        debug!(hole = self.hole_number, shot = shot_id, "removed shot");

        if self.is_empty() {
            self.cursor = None;
            return Ok(Removal::Emptied);
        }
        let cursor = match self.cursor {
            Some(current) if current >= index => current.saturating_sub(1),
            Some(current) => current,
            None => 0,
        };
        self.cursor = Some(cursor.min(self.len() - 1));
        Ok(Removal::Remaining)
    }

    /// Record a stroke's lie.
    ///
    /// Out of bounds or water forces the following shot to a penalty. The
    /// caller's `follow_up` then either skips the cursor past that penalty or
    /// appends one more stroke and moves the cursor onto it.
    pub fn set_lie(&mut self, shot_id: &str, lie: Lie, follow_up: FollowUp) -> GolfResult<LieChange> {
        let index = self.require(shot_id)?;
        if index >= self.strokes.len() {
            return Err(GolfError::NotAStroke(shot_id.to_string()));
        }
        self.strokes[index].lie = Some(lie);
        if !lie.is_hazard() {
            return Ok(LieChange::default());
        }

        let pre_penalty_club = self.strokes[index].club.clone();
        let penalized = self.get_mut(index + 1).map(|shot| {
            shot.outcome_direction = Some(Outcome::Penalty);
            shot.poor_shot_flag = false;
            shot.id.clone()
        });
        debug!(hole = self.hole_number, ?lie, ?penalized, ?follow_up, "hazard recorded");

        let added = match follow_up {
            FollowUp::Skip => {
                let skip_to = if penalized.is_some() { index + 2 } else { index + 1 };
                self.cursor = Some(skip_to.min(self.len() - 1));
                None
            }
            FollowUp::Add => {
                let club = match lie {
                    Lie::Water => WATER_DROP_CLUB.to_string(),
                    _ => pre_penalty_club.unwrap_or_else(|| WATER_DROP_CLUB.to_string()),
                };
                Some(self.push_stroke(Some(club)))
            }
        };
        Ok(LieChange { penalized, added })
    }

    /// Record the result of a shot.
    ///
    /// Picking a direction (including fire) clears the poor-shot flag.
    /// Picking [`OutcomeChoice::Poor`] sets it and, on [`FollowUp::Add`],
    /// appends another shot of the same kind. Returns the appended shot id.
    pub fn select_outcome(
        &mut self,
        shot_id: &str,
        choice: OutcomeChoice,
        follow_up: FollowUp,
    ) -> GolfResult<Option<String>> {
        let index = self.require(shot_id)?;
        self.cursor = Some(index);
        let hole_number = self.hole_number;
        let Some(shot) = self.get_mut(index) else {
            return Err(GolfError::UnknownShot(shot_id.to_string()));
        };
        match choice {
            OutcomeChoice::Direction(outcome) => {
                shot.outcome_direction = Some(outcome);
                shot.poor_shot_flag = false;
                debug!(hole = hole_number, shot = shot_id, ?outcome, "outcome selected");
                Ok(None)
            }
            OutcomeChoice::Poor => {
                shot.poor_shot_flag = true;
                let kind = shot.kind;
                debug!(hole = hole_number, shot = shot_id, "poor shot marked");
                let added = match (follow_up, kind) {
                    (FollowUp::Skip, _) => None,
                    (FollowUp::Add, ShotKind::Stroke) => {
                        Some(self.push_stroke(Some(POOR_SHOT_CLUB.to_string())))
                    }
                    (FollowUp::Add, ShotKind::Putt) => Some(self.add_putt()),
                };
                Ok(added)
            }
        }
    }

    /// Set or clear the club of a stroke.
    pub fn set_club(&mut self, shot_id: &str, club: Option<String>) -> GolfResult<()> {
        let index = self.require(shot_id)?;
        match self.strokes.get_mut(index) {
            Some(shot) => {
                shot.club = club;
                Ok(())
            }
            None => Err(GolfError::NotAStroke(shot_id.to_string())),
        }
    }

    /// Set the starting distance of a putt.
    pub fn set_putt_distance(&mut self, shot_id: &str, distance: PuttDistance) -> GolfResult<()> {
        let index = self.require(shot_id)?;
        match index
            .checked_sub(self.strokes.len())
            .and_then(|putt_index| self.putts.get_mut(putt_index))
        {
            Some(shot) => {
                shot.putt_distance = Some(distance);
                Ok(())
            }
            None => Err(GolfError::NotAPutt(shot_id.to_string())),
        }
    }

    /// Copy of every shot in sequence order, ready to commit.
    pub fn shots(&self) -> Vec<Shot> {
        self.iter().cloned().collect()
    }
}
