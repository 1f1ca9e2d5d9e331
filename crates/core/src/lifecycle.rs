//! Round lifecycle: the single active-round slot and every operation a
//! front end calls.
//!
//! ```text
//! NoActiveRound --select_course--> InProgress(1)
//! InProgress(n) --complete_hole--> InProgress(n + 1)   (stays at 18)
//! InProgress(n) --review_round--> ReviewingSummary(n)
//! ReviewingSummary(n) --return_to_round--> InProgress(n)
//! ReviewingSummary(n) --finalize_round--> NoActiveRound
//! NoActiveRound --edit_past_round--> ReviewingSummary
//! ```
//!
//! Every successful mutation saves the whole [`DataAggregate`]. Save
//! failures are logged and never reported as scoring errors.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    catalog::{course_from_input, validate_course, CourseInput},
    config::AppConfig,
    error::{GolfError, GolfResult},
    feedback::{Feedback, FeedbackKind},
    history::{hole_history_with_window, HoleHistory},
    models::{
        Course, DataAggregate, Hole, HoleScore, Lie, PuttDistance, Round, Settings, Shot,
        HOLES_PER_ROUND,
    },
    scoring::{cumulative_over_par, OverPar, RoundSummary},
    sequencer::{FollowUp, LieChange, OutcomeChoice, Removal, ShotSequencer},
    store::KeyValueStore,
};

/// Where the player is in the round flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    /// The active-round slot is empty.
    NoActiveRound,
    /// Playing `hole`.
    InProgress { hole: u8 },
    /// Summary shown; `return_hole` is where [`RoundManager::return_to_round`] resumes.
    ReviewingSummary { return_hole: u8 },
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundState::NoActiveRound => write!(f, "no round is active"),
            RoundState::InProgress { hole } => write!(f, "playing hole {hole}"),
            RoundState::ReviewingSummary { .. } => write!(f, "reviewing the round summary"),
        }
    }
}

/// Where a front end should go after a shot removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Keep editing the current hole.
    Stay,
    /// The hole was emptied; continue on this one.
    PreviousHole(u8),
    /// Hole 1 was emptied; leave the round view.
    CloseRoundView,
}

/// Stored shots of a hole split by kind.
#[derive(Debug, Clone, PartialEq)]
pub struct HoleData {
    /// Strokes in play order.
    pub strokes: Vec<Shot>,
    /// Putts in play order.
    pub putts: Vec<Shot>,
}

fn check_hole(hole_number: u8) -> GolfResult<()> {
    if (1..=HOLES_PER_ROUND).contains(&hole_number) {
        Ok(())
    } else {
        Err(GolfError::HoleOutOfRange(hole_number))
    }
}

/// Owner of the data aggregate and the round state machine.
pub struct RoundManager {
    store: Box<dyn KeyValueStore>,
    feedback: Box<dyn Feedback>,
    store_key: String,
    recent_rounds: usize,
    data: DataAggregate,
    state: RoundState,
}

impl RoundManager {
    /// Load the aggregate from `store` and resume any round left in the slot.
    pub fn open(
        store: Box<dyn KeyValueStore>,
        feedback: Box<dyn Feedback>,
        config: &AppConfig,
    ) -> anyhow::Result<Self> {
        let data = store.load(&config.store_key)?.unwrap_or_default();
        let state = match &data.current_round {
            None => RoundState::NoActiveRound,
            Some(round) => {
                let hole = round.first_unplayed_hole().unwrap_or(HOLES_PER_ROUND);
                if round.is_complete {
                    RoundState::ReviewingSummary { return_hole: hole }
                } else {
                    RoundState::InProgress { hole }
                }
            }
        };
        info!(
            courses = data.courses.len(),
            rounds = data.rounds.len(),
            %state,
            "opened golf data"
        );
        Ok(Self {
            store,
            feedback,
            store_key: config.store_key.clone(),
            recent_rounds: config.recent_rounds,
            data,
            state,
        })
    }

    /// Current position in the round flow.
    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Everything that gets persisted.
    pub fn data(&self) -> &DataAggregate {
        &self.data
    }

    /// Known courses.
    pub fn courses(&self) -> &[Course] {
        &self.data.courses
    }

    /// Completed rounds.
    pub fn rounds(&self) -> &[Round] {
        &self.data.rounds
    }

    /// Round occupying the active slot.
    pub fn current_round(&self) -> Option<&Round> {
        self.data.current_round.as_ref()
    }

    /// Player settings.
    pub fn settings(&self) -> &Settings {
        &self.data.settings
    }

    /// True while a completed round has been reopened for edits.
    pub fn is_editing_past_round(&self) -> bool {
        self.data
            .current_round
            .as_ref()
            .map(|round| round.is_complete)
            .unwrap_or(false)
    }

    /// Course of the active round.
    pub fn current_course(&self) -> GolfResult<&Course> {
        let round = self.current_round().ok_or(GolfError::NoActiveRound)?;
        self.data
            .course(&round.course_id)
            .ok_or_else(|| GolfError::UnknownCourse(round.course_id.clone()))
    }

    fn current_hole(&self, hole_number: u8) -> GolfResult<&Hole> {
        check_hole(hole_number)?;
        self.current_course()?
            .hole(hole_number)
            .ok_or(GolfError::HoleOutOfRange(hole_number))
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.store_key, &self.data) {
            warn!("failed to save golf data: {err:#}");
        }
    }

    fn invalid(&self, action: &'static str) -> GolfError {
        GolfError::InvalidTransition {
            action,
            state: self.state,
        }
    }

    // Courses

    /// Create a course from raw input; malformed numbers fall back to defaults.
    pub fn create_course(&mut self, input: &CourseInput) -> GolfResult<Course> {
        let course = course_from_input(input)?;
        self.add_course(course.clone())?;
        Ok(course)
    }

    /// Add an already built course after validating it.
    pub fn add_course(&mut self, course: Course) -> GolfResult<()> {
        validate_course(&course)?;
        info!(course = %course.id, name = %course.name, "course created");
        self.data.courses.push(course);
        self.persist();
        Ok(())
    }

    /// Replace a course, keeping the active round's name and par in step.
    pub fn update_course(&mut self, course: Course) -> GolfResult<()> {
        validate_course(&course)?;
        let slot = self
            .data
            .course_mut(&course.id)
            .ok_or_else(|| GolfError::UnknownCourse(course.id.clone()))?;
        *slot = course.clone();
        if let Some(round) = self
            .data
            .current_round
            .as_mut()
            .filter(|round| round.course_id == course.id)
        {
            round.course_name = course.name.clone();
            round.total_par = course.total_par();
        }
        debug!(course = %course.id, "course updated");
        self.persist();
        Ok(())
    }

    /// Delete a course and every round played on it. Unknown ids are a no-op.
    pub fn delete_course(&mut self, course_id: &str) -> bool {
        let before = self.data.courses.len();
        self.data.courses.retain(|course| course.id != course_id);
        if self.data.courses.len() == before {
            return false;
        }
        let rounds_before = self.data.rounds.len();
        self.data.rounds.retain(|round| round.course_id != course_id);
        let cleared_active = self
            .data
            .current_round
            .as_ref()
            .map(|round| round.course_id == course_id)
            .unwrap_or(false);
        if cleared_active {
            self.data.current_round = None;
            self.state = RoundState::NoActiveRound;
        }
        info!(
            course = course_id,
            rounds = rounds_before - self.data.rounds.len(),
            cleared_active,
            "course deleted"
        );
        self.persist();
        true
    }

    /// Set the distance for today's pin or tee on a hole of the active course.
    pub fn update_todays_distance(&mut self, hole_number: u8, distance: Option<u32>) -> GolfResult<()> {
        check_hole(hole_number)?;
        let course_id = self
            .current_round()
            .ok_or(GolfError::NoActiveRound)?
            .course_id
            .clone();
        let hole = self
            .data
            .course_mut(&course_id)
            .ok_or_else(|| GolfError::UnknownCourse(course_id.clone()))?
            .hole_mut(hole_number)
            .ok_or(GolfError::HoleOutOfRange(hole_number))?;
        hole.todays_distance = distance.filter(|yards| *yards > 0);
        self.persist();
        Ok(())
    }

    // Round flow

    /// Start a round on `course_id`. Only valid when the slot is empty.
    pub fn select_course(&mut self, course_id: &str) -> GolfResult<&Round> {
        if let Some(active) = &self.data.current_round {
            return Err(GolfError::RoundInProgress {
                active: active.id.clone(),
            });
        }
        if self.state != RoundState::NoActiveRound {
            return Err(self.invalid("start a round"));
        }
        let course = self
            .data
            .course(course_id)
            .ok_or_else(|| GolfError::UnknownCourse(course_id.to_string()))?;
        let round = Round::new(course);
        info!(round = %round.id, course = %course.name, "round started");
        self.state = RoundState::InProgress { hole: 1 };
        self.feedback.notify(FeedbackKind::Medium);
        self.data.current_round = Some(round);
        self.persist();
        self.data
            .current_round
            .as_ref()
            .ok_or(GolfError::NoActiveRound)
    }

    /// Working buffer for a hole: its stored shots, or seeded defaults.
    ///
    /// While playing, the round moves to that hole. From the summary the
    /// state is left alone; only [`RoundManager::return_to_round`] leaves it.
    pub fn open_hole(&mut self, hole_number: u8) -> GolfResult<ShotSequencer> {
        let hole = self.current_hole(hole_number)?.clone();
        let round = self.current_round().ok_or(GolfError::NoActiveRound)?;
        let working = ShotSequencer::open(
            &hole,
            round.hole_score(hole_number),
            &self.data.settings,
        );
        if let RoundState::InProgress { .. } = self.state {
            self.state = RoundState::InProgress { hole: hole_number };
        }
        debug!(hole = hole_number, shots = working.len(), "hole opened");
        Ok(working)
    }

    /// Commit a fully described hole and move to the next one.
    pub fn complete_hole(&mut self, working: &ShotSequencer) -> GolfResult<RoundState> {
        if !matches!(self.state, RoundState::InProgress { .. }) {
            return Err(self.invalid("complete a hole"));
        }
        let hole_number = working.hole_number();
        let par = self.current_hole(hole_number)?.par;
        if working.is_empty() {
            return Err(GolfError::EmptyHole(hole_number));
        }
        let missing = working.missing_outcomes();
        if !missing.is_empty() {
            debug!(hole = hole_number, ?missing, "hole rejected");
            return Err(GolfError::IncompleteHole {
                hole: hole_number,
                missing,
            });
        }

        let round = self
            .data
            .current_round
            .as_mut()
            .ok_or(GolfError::NoActiveRound)?;
        let score = HoleScore::new(hole_number, round.course_id.clone(), par, working.shots());
        round.upsert_hole_score(score);
        debug!(hole = hole_number, total = round.total_score, "hole completed");

        self.state = RoundState::InProgress {
            hole: (hole_number + 1).min(HOLES_PER_ROUND),
        };
        self.feedback.notify(FeedbackKind::Medium);
        self.persist();
        Ok(self.state)
    }

    /// Store in-flight shots for a hole without validation.
    ///
    /// Empty shot lists delete the hole's score.
    pub fn save_hole_data(&mut self, hole_number: u8, strokes: &[Shot], putts: &[Shot]) -> GolfResult<()> {
        let par = self.current_hole(hole_number)?.par;
        let round = self
            .data
            .current_round
            .as_mut()
            .ok_or(GolfError::NoActiveRound)?;
        if strokes.is_empty() && putts.is_empty() {
            round.remove_hole_score(hole_number);
        } else {
            let shots = strokes.iter().chain(putts).cloned().collect();
            let score = HoleScore::new(hole_number, round.course_id.clone(), par, shots);
            round.upsert_hole_score(score);
        }
        debug!(hole = hole_number, total = round.total_score, "hole data saved");
        self.persist();
        Ok(())
    }

    /// Stored shots for a hole of the active round.
    pub fn load_hole_data(&self, hole_number: u8) -> Option<HoleData> {
        let score = self.current_round()?.hole_score(hole_number)?;
        Some(HoleData {
            strokes: score.strokes().cloned().collect(),
            putts: score.putts().cloned().collect(),
        })
    }

    /// Remove a shot from the working buffer.
    ///
    /// When the hole runs out of shots its score is deleted and the caller is
    /// sent to the previous hole, or out of the round view from hole 1.
    pub fn remove_shot(&mut self, working: &mut ShotSequencer, shot_id: &str) -> GolfResult<Navigation> {
        let removal = working.remove_shot(shot_id)?;
        self.feedback.notify(FeedbackKind::Light);
        if removal == Removal::Remaining {
            return Ok(Navigation::Stay);
        }

        let hole_number = working.hole_number();
        let round = self
            .data
            .current_round
            .as_mut()
            .ok_or(GolfError::NoActiveRound)?;
        if round.remove_hole_score(hole_number) {
            self.persist();
        }
        if hole_number > 1 {
            self.state = RoundState::InProgress {
                hole: hole_number - 1,
            };
            Ok(Navigation::PreviousHole(hole_number - 1))
        } else {
            Ok(Navigation::CloseRoundView)
        }
    }

    // Shot edits on a working buffer

    /// Append a stroke with the default club for its position.
    pub fn add_stroke(&mut self, working: &mut ShotSequencer) -> String {
        let id = working.add_stroke(&self.data.settings);
        self.feedback.notify(FeedbackKind::Light);
        id
    }

    /// Append a putt.
    pub fn add_putt(&mut self, working: &mut ShotSequencer) -> String {
        let id = working.add_putt();
        self.feedback.notify(FeedbackKind::Light);
        id
    }

    /// Record a stroke's lie; see [`ShotSequencer::set_lie`].
    pub fn set_lie(
        &mut self,
        working: &mut ShotSequencer,
        shot_id: &str,
        lie: Lie,
        follow_up: FollowUp,
    ) -> GolfResult<LieChange> {
        let change = working.set_lie(shot_id, lie, follow_up)?;
        self.feedback.notify(FeedbackKind::Light);
        Ok(change)
    }

    /// Record a shot's result; see [`ShotSequencer::select_outcome`].
    pub fn select_outcome(
        &mut self,
        working: &mut ShotSequencer,
        shot_id: &str,
        choice: OutcomeChoice,
        follow_up: FollowUp,
    ) -> GolfResult<Option<String>> {
        let added = working.select_outcome(shot_id, choice, follow_up)?;
        self.feedback.notify(FeedbackKind::Light);
        Ok(added)
    }

    /// Set or clear the club of a stroke.
    pub fn set_club(
        &mut self,
        working: &mut ShotSequencer,
        shot_id: &str,
        club: Option<String>,
    ) -> GolfResult<()> {
        working.set_club(shot_id, club)?;
        self.feedback.notify(FeedbackKind::Light);
        Ok(())
    }

    /// Set the starting distance of a putt.
    pub fn set_putt_distance(
        &mut self,
        working: &mut ShotSequencer,
        shot_id: &str,
        distance: PuttDistance,
    ) -> GolfResult<()> {
        working.set_putt_distance(shot_id, distance)?;
        self.feedback.notify(FeedbackKind::Light);
        Ok(())
    }

    /// Show the summary, saving any in-flight hole. The round stays open.
    pub fn review_round(&mut self, in_flight: Option<&ShotSequencer>) -> GolfResult<()> {
        let RoundState::InProgress { hole } = self.state else {
            return Err(self.invalid("review the round"));
        };
        if let Some(working) = in_flight.filter(|working| !working.is_empty()) {
            self.save_hole_data(working.hole_number(), working.strokes(), working.putts())?;
        }
        self.state = RoundState::ReviewingSummary { return_hole: hole };
        debug!(return_hole = hole, "reviewing round");
        Ok(())
    }

    /// Leave the summary and resume the hole that was being edited.
    pub fn return_to_round(&mut self) -> GolfResult<u8> {
        let RoundState::ReviewingSummary { return_hole } = self.state else {
            return Err(self.invalid("return to the round"));
        };
        self.state = RoundState::InProgress { hole: return_hole };
        Ok(return_hole)
    }

    /// Mark the active round complete and move it into history.
    pub fn finalize_round(&mut self) -> GolfResult<Round> {
        if !matches!(self.state, RoundState::ReviewingSummary { .. }) {
            return Err(self.invalid("finalize the round"));
        }
        let mut round = self
            .data
            .current_round
            .take()
            .ok_or(GolfError::NoActiveRound)?;
        round.recompute_total();
        round.is_complete = true;
        round.completed_at = Some(Utc::now());

        match self.data.rounds.iter_mut().find(|past| past.id == round.id) {
            Some(past) => *past = round.clone(),
            None => self.data.rounds.push(round.clone()),
        }
        self.state = RoundState::NoActiveRound;
        info!(round = %round.id, total = round.total_score, "round finalized");
        self.feedback.notify(FeedbackKind::Success);
        self.persist();
        Ok(round)
    }

    /// Reopen a completed round in the active slot, showing its summary.
    ///
    /// Reopening the round that already holds the slot keeps its edits.
    pub fn edit_past_round(&mut self, round_id: &str) -> GolfResult<()> {
        if let Some(active) = &self.data.current_round {
            if active.id != round_id {
                return Err(GolfError::RoundInProgress {
                    active: active.id.clone(),
                });
            }
            debug!(round = round_id, "round is already open for editing");
            return Ok(());
        }
        let round = self
            .data
            .round(round_id)
            .cloned()
            .ok_or_else(|| GolfError::UnknownRound(round_id.to_string()))?;
        let return_hole = round.first_unplayed_hole().unwrap_or(HOLES_PER_ROUND);
        self.data.current_round = Some(round);
        self.state = RoundState::ReviewingSummary { return_hole };
        info!(round = round_id, "editing past round");
        self.persist();
        Ok(())
    }

    /// Drop edits to a reopened past round, leaving history untouched.
    pub fn discard_edits(&mut self) -> GolfResult<()> {
        if !self.is_editing_past_round() {
            return Err(self.invalid("discard edits"));
        }
        self.data.current_round = None;
        self.state = RoundState::NoActiveRound;
        self.persist();
        Ok(())
    }

    /// Delete exactly the round with `round_id`, clearing the slot if it held it.
    pub fn delete_round(&mut self, round_id: &str) -> bool {
        let before = self.data.rounds.len();
        self.data.rounds.retain(|round| round.id != round_id);
        let mut removed = self.data.rounds.len() != before;
        if self
            .data
            .current_round
            .as_ref()
            .map(|round| round.id == round_id)
            .unwrap_or(false)
        {
            self.data.current_round = None;
            self.state = RoundState::NoActiveRound;
            removed = true;
        }
        if removed {
            info!(round = round_id, "round deleted");
            self.persist();
        }
        removed
    }

    // Settings

    /// Set the handicap, clamped to `0..=54`.
    pub fn set_handicap(&mut self, handicap: Option<u8>) {
        self.data.settings.set_handicap(handicap);
        self.persist();
    }

    /// Apply an edit to the settings and save.
    pub fn update_settings(&mut self, edit: impl FnOnce(&mut Settings)) {
        edit(&mut self.data.settings);
        self.persist();
    }

    // Derived views

    /// History of `hole_number` on the active round's course.
    pub fn hole_history(&self, hole_number: u8) -> GolfResult<HoleHistory> {
        check_hole(hole_number)?;
        let course = self.current_course()?;
        Ok(self.hole_history_for(&course.id, hole_number))
    }

    /// History of a hole on any course.
    pub fn hole_history_for(&self, course_id: &str, hole_number: u8) -> HoleHistory {
        hole_history_with_window(course_id, hole_number, &self.data.rounds, self.recent_rounds)
    }

    /// Cumulative over par through `upto`, counting `working` for that hole.
    pub fn over_par(&self, upto: u8, working: Option<&ShotSequencer>) -> GolfResult<OverPar> {
        let round = self.current_round().ok_or(GolfError::NoActiveRound)?;
        let course = self.current_course()?;
        Ok(cumulative_over_par(
            round,
            course,
            upto,
            working.map(Into::into),
            self.data.settings.handicap,
        ))
    }

    /// Totals for the active round.
    pub fn summary(&self) -> GolfResult<RoundSummary> {
        let round = self.current_round().ok_or(GolfError::NoActiveRound)?;
        let course = self.current_course()?;
        Ok(RoundSummary::new(round, course, self.data.settings.handicap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::sample_course,
        feedback::RecordingFeedback,
        models::Outcome,
        store::MemoryStore,
    };

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn load(&self, _key: &str) -> anyhow::Result<Option<DataAggregate>> {
            Ok(None)
        }

        fn save(&self, _key: &str, _data: &DataAggregate) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn manager() -> (RoundManager, MemoryStore, RecordingFeedback, String) {
        let course = sample_course();
        let course_id = course.id.clone();
        let store = MemoryStore::new().with_entry(
            "golfData",
            DataAggregate {
                courses: vec![course],
                ..DataAggregate::default()
            },
        );
        let feedback = RecordingFeedback::default();
        let manager = RoundManager::open(
            Box::new(store.clone()),
            Box::new(feedback.clone()),
            &AppConfig::default(),
        )
        .expect("memory store opens");
        (manager, store, feedback, course_id)
    }

    fn play_par(manager: &mut RoundManager, hole: u8) {
        let working = manager.open_hole(hole).expect("hole opens");
        manager.complete_hole(&working).expect("seeded hole completes");
    }

    fn assert_total_consistent(manager: &RoundManager) {
        let round = manager.current_round().expect("active round");
        let sum: u32 = round.hole_scores.iter().map(|score| score.total_score).sum();
        assert_eq!(round.total_score, sum);
    }

    #[test]
    fn full_round_flow() {
        let (mut manager, store, feedback, course_id) = manager();
        assert_eq!(manager.state(), RoundState::NoActiveRound);

        manager.select_course(&course_id).expect("round starts");
        assert_eq!(manager.state(), RoundState::InProgress { hole: 1 });
        assert!(matches!(
            manager.select_course(&course_id),
            Err(GolfError::RoundInProgress { .. })
        ));

        for hole in 1..=18 {
            play_par(&mut manager, hole);
            assert_total_consistent(&manager);
        }
        assert_eq!(manager.state(), RoundState::InProgress { hole: 18 });

        manager.review_round(None).expect("review");
        assert_eq!(
            manager.state(),
            RoundState::ReviewingSummary { return_hole: 18 }
        );
        assert!(!manager.current_round().map(|r| r.is_complete).unwrap_or(true));
        assert_eq!(manager.return_to_round(), Ok(18));
        manager.review_round(None).expect("review again");

        let summary = manager.summary().expect("summary");
        assert_eq!(summary.total_score, 72);
        assert_eq!(summary.over_par.gross, 0);

        let round = manager.finalize_round().expect("finalize");
        assert!(round.is_complete);
        assert!(round.completed_at.is_some());
        assert_eq!(manager.state(), RoundState::NoActiveRound);
        assert!(manager.current_round().is_none());
        assert_eq!(manager.rounds().len(), 1);
        assert_eq!(feedback.signals().last(), Some(&FeedbackKind::Success));

        let saved = store.snapshot("golfData").expect("saved");
        assert_eq!(saved.rounds.len(), 1);
        assert!(saved.current_round.is_none());
    }

    #[test]
    fn undescribed_shot_blocks_completion() {
        let (mut manager, store, _, course_id) = manager();
        manager.select_course(&course_id).expect("round starts");
        let mut working = manager.open_hole(1).expect("hole opens");
        let settings = manager.settings().clone();
        working.add_stroke(&settings);
        let saves = store.save_count();

        let err = manager.complete_hole(&working).unwrap_err();
        assert_eq!(
            err,
            GolfError::IncompleteHole {
                hole: 1,
                missing: vec!["stroke-3".to_string()]
            }
        );
        assert_eq!(manager.state(), RoundState::InProgress { hole: 1 });
        assert!(manager.current_round().map(|r| r.hole_scores.is_empty()).unwrap_or(false));
        assert_eq!(store.save_count(), saves);
    }

    #[test]
    fn transitions_are_checked() {
        let (mut manager, _, _, course_id) = manager();
        assert!(matches!(
            manager.review_round(None),
            Err(GolfError::InvalidTransition { .. })
        ));
        assert!(matches!(
            manager.finalize_round(),
            Err(GolfError::InvalidTransition { .. })
        ));
        manager.select_course(&course_id).expect("round starts");
        assert!(matches!(
            manager.return_to_round(),
            Err(GolfError::InvalidTransition { .. })
        ));
        assert!(matches!(
            manager.finalize_round(),
            Err(GolfError::InvalidTransition { .. })
        ));
        assert_eq!(manager.open_hole(19).unwrap_err(), GolfError::HoleOutOfRange(19));
    }

    #[test]
    fn editing_past_round_requires_an_empty_slot() {
        let (mut manager, _, _, course_id) = manager();
        manager.select_course(&course_id).expect("first round");
        play_par(&mut manager, 1);
        manager.review_round(None).expect("review");
        let first = manager.finalize_round().expect("finalize");

        manager.select_course(&course_id).expect("second round");
        let before = manager.data().clone();
        let state = manager.state();
        assert!(matches!(
            manager.edit_past_round(&first.id),
            Err(GolfError::RoundInProgress { .. })
        ));
        assert_eq!(manager.data(), &before);
        assert_eq!(manager.state(), state);

        let second = manager.current_round().map(|r| r.id.clone()).expect("active");
        assert!(manager.delete_round(&second));

        manager.edit_past_round(&first.id).expect("edit");
        assert!(manager.is_editing_past_round());
        assert_eq!(
            manager.state(),
            RoundState::ReviewingSummary { return_hole: 2 }
        );
        manager.return_to_round().expect("resume");
        let mut working = manager.open_hole(1).expect("hole 1");
        let extra = working.add_putt();
        working
            .select_outcome(&extra, OutcomeChoice::Direction(Outcome::Short), FollowUp::Skip)
            .expect("outcome");
        manager.complete_hole(&working).expect("hole 1 again");
        manager.review_round(None).expect("review");
        let edited = manager.finalize_round().expect("finalize edit");

        assert_eq!(edited.id, first.id);
        assert_eq!(manager.rounds().len(), 1);
        assert_eq!(manager.rounds()[0].total_score, first.total_score + 1);
    }

    #[test]
    fn discarding_edits_keeps_history() {
        let (mut manager, _, _, course_id) = manager();
        manager.select_course(&course_id).expect("round");
        play_par(&mut manager, 1);
        manager.review_round(None).expect("review");
        let round = manager.finalize_round().expect("finalize");

        assert!(manager.discard_edits().is_err());
        manager.edit_past_round(&round.id).expect("edit");
        manager.discard_edits().expect("discard");
        assert_eq!(manager.state(), RoundState::NoActiveRound);
        assert_eq!(manager.rounds(), &[round]);
    }

    #[test]
    fn delete_round_removes_only_the_match() {
        let (mut manager, _, _, course_id) = manager();
        let mut ids = Vec::new();
        for _ in 0..3 {
            manager.select_course(&course_id).expect("round");
            play_par(&mut manager, 1);
            manager.review_round(None).expect("review");
            ids.push(manager.finalize_round().expect("finalize").id);
        }
        assert!(!manager.delete_round("missing"));
        assert!(manager.delete_round(&ids[1]));
        let left: Vec<_> = manager.rounds().iter().map(|r| r.id.clone()).collect();
        assert_eq!(left, vec![ids[0].clone(), ids[2].clone()]);

        manager.select_course(&course_id).expect("active");
        let active = manager.current_round().map(|r| r.id.clone()).expect("active");
        assert!(manager.delete_round(&active));
        assert!(manager.current_round().is_none());
        assert_eq!(manager.state(), RoundState::NoActiveRound);
        assert_eq!(manager.rounds().len(), 2);
    }

    #[test]
    fn deleting_a_course_cascades() {
        let (mut manager, _, _, course_id) = manager();
        let other = manager
            .create_course(&CourseInput {
                name: "Parkland".to_string(),
                pars: "3 3 3".to_string(),
                ..CourseInput::default()
            })
            .expect("course");
        assert_eq!(other.total_par(), 72);

        manager.select_course(&other.id).expect("round");
        play_par(&mut manager, 1);
        manager.review_round(None).expect("review");
        manager.finalize_round().expect("finalize");
        manager.select_course(&course_id).expect("round");
        manager.review_round(None).expect("review");
        manager.finalize_round().expect("finalize");
        manager.select_course(&other.id).expect("active round");

        assert!(!manager.delete_course("missing"));
        assert!(manager.delete_course(&other.id));
        assert_eq!(manager.courses().len(), 1);
        assert_eq!(manager.rounds().len(), 1);
        assert!(manager.current_round().is_none());
        assert_eq!(manager.state(), RoundState::NoActiveRound);
    }

    #[test]
    fn emptying_a_hole_deletes_it_and_steps_back() {
        let (mut manager, _, _, course_id) = manager();
        manager.select_course(&course_id).expect("round");
        play_par(&mut manager, 1);
        let mut working = manager.open_hole(2).expect("hole 2");
        manager
            .save_hole_data(2, working.strokes(), working.putts())
            .expect("save");
        assert!(manager.load_hole_data(2).is_some());

        let ids: Vec<String> = working.iter().map(|s| s.id.clone()).collect();
        let (last, rest) = ids.split_last().expect("shots");
        for id in rest {
            assert_eq!(manager.remove_shot(&mut working, id), Ok(Navigation::Stay));
        }
        assert_eq!(
            manager.remove_shot(&mut working, last),
            Ok(Navigation::PreviousHole(1))
        );
        assert!(manager.load_hole_data(2).is_none());
        assert_eq!(manager.state(), RoundState::InProgress { hole: 1 });
        assert_total_consistent(&manager);

        let mut first = manager.open_hole(1).expect("hole 1");
        let ids: Vec<String> = first.iter().map(|s| s.id.clone()).collect();
        let mut navigation = Navigation::Stay;
        for id in &ids {
            navigation = manager.remove_shot(&mut first, id).expect("removed");
        }
        assert_eq!(navigation, Navigation::CloseRoundView);
        assert!(manager.current_round().map(|r| r.hole_scores.is_empty()).unwrap_or(false));
    }

    #[test]
    fn hole_data_round_trips_by_kind() {
        let (mut manager, _, _, course_id) = manager();
        manager.select_course(&course_id).expect("round");
        let mut working = manager.open_hole(5).expect("hole 5");
        let first = working.strokes()[0].id.clone();
        working
            .set_lie(&first, Lie::Water, FollowUp::Add)
            .expect("water");
        manager
            .save_hole_data(5, working.strokes(), working.putts())
            .expect("save");
        assert_total_consistent(&manager);

        let data = manager.load_hole_data(5).expect("stored");
        assert_eq!(data.strokes.len(), working.strokes().len());
        assert_eq!(data.putts.len(), 2);
        assert!(data.strokes.iter().all(|s| !s.is_putt()));

        let reopened = manager.open_hole(5).expect("reopen");
        assert_eq!(reopened.shots(), working.shots());

        manager.save_hole_data(5, &[], &[]).expect("clear");
        assert!(manager.load_hole_data(5).is_none());
        assert_total_consistent(&manager);
    }

    #[test]
    fn resumes_the_active_round_on_open() -> anyhow::Result<()> {
        let (mut manager, store, _, course_id) = manager();
        manager.select_course(&course_id)?;
        play_par(&mut manager, 1);
        play_par(&mut manager, 2);
        manager.update_todays_distance(3, Some(155))?;
        manager.set_handicap(Some(60));

        let reopened = RoundManager::open(
            Box::new(store.clone()),
            Box::new(RecordingFeedback::default()),
            &AppConfig::default(),
        )?;
        assert_eq!(reopened.state(), RoundState::InProgress { hole: 3 });
        assert_eq!(reopened.settings().handicap, Some(54));
        let hole = reopened.current_course()?.hole(3).cloned().expect("hole 3");
        assert_eq!(hole.todays_distance, Some(155));
        assert_eq!(hole.playing_distance(), Some(155));
        Ok(())
    }

    #[test]
    fn save_failures_do_not_surface() -> anyhow::Result<()> {
        let mut manager = RoundManager::open(
            Box::new(FailingStore),
            Box::new(RecordingFeedback::default()),
            &AppConfig::default(),
        )?;
        let course = manager.create_course(&CourseInput {
            name: "Heath".to_string(),
            ..CourseInput::default()
        })?;
        manager.select_course(&course.id)?;
        play_par(&mut manager, 1);
        assert_eq!(manager.state(), RoundState::InProgress { hole: 2 });
        Ok(())
    }

    #[test]
    fn history_and_over_par_use_the_active_course() {
        let (mut manager, _, _, course_id) = manager();
        manager.set_handicap(Some(10));
        for _ in 0..2 {
            manager.select_course(&course_id).expect("round");
            play_par(&mut manager, 1);
            manager.review_round(None).expect("review");
            manager.finalize_round().expect("finalize");
        }
        assert!(matches!(manager.hole_history(1), Err(GolfError::NoActiveRound)));

        manager.select_course(&course_id).expect("round");
        let history = manager.hole_history(1).expect("history");
        assert_eq!(history.total_rounds, 2);
        assert_eq!(history.average_score, 4.0);
        assert_eq!(history.position_outcomes()["putt-1"][&Outcome::Good], 2);

        let empty = manager.hole_history(7).expect("history");
        assert_eq!(empty.total_rounds, 0);
        assert!(empty.position_outcomes().is_empty());

        // hole 2 is a par 5 with stroke index 1
        let working = manager.open_hole(2).expect("hole 2");
        let totals = manager.over_par(2, Some(&working)).expect("over par");
        assert_eq!(totals, OverPar { gross: 0, net: -1 });
    }

    #[test]
    fn updating_a_course_refreshes_the_active_round() {
        let (mut manager, _, _, course_id) = manager();
        manager.select_course(&course_id).expect("round");
        let mut course = manager.current_course().expect("course").clone();
        course.name = "Renamed Links".to_string();
        course.holes[0].par = 5;
        manager.update_course(course).expect("update");
        let round = manager.current_round().expect("active");
        assert_eq!(round.course_name, "Renamed Links");
        assert_eq!(round.total_par, 73);

        let mut stray = sample_course();
        stray.id = "missing".to_string();
        assert_eq!(
            manager.update_course(stray),
            Err(GolfError::UnknownCourse("missing".to_string()))
        );
    }

    #[test]
    fn poor_flag_alone_blocks_completion() {
        let (mut manager, store, _, course_id) = manager();
        manager.select_course(&course_id).expect("round starts");
        let mut working = manager.open_hole(1).expect("hole opens");
        let extra = manager.add_stroke(&mut working);
        manager
            .select_outcome(&mut working, &extra, OutcomeChoice::Poor, FollowUp::Skip)
            .expect("poor");
        let saves = store.save_count();

        assert_eq!(
            manager.complete_hole(&working),
            Err(GolfError::IncompleteHole {
                hole: 1,
                missing: vec!["stroke-3".to_string()]
            })
        );
        assert!(manager.load_hole_data(1).is_none());
        assert_eq!(store.save_count(), saves);

        manager
            .select_outcome(
                &mut working,
                &extra,
                OutcomeChoice::Direction(Outcome::Short),
                FollowUp::Skip,
            )
            .expect("direction");
        manager
            .select_outcome(&mut working, &extra, OutcomeChoice::Poor, FollowUp::Skip)
            .expect("poor again");
        assert_eq!(
            manager.complete_hole(&working),
            Ok(RoundState::InProgress { hole: 2 })
        );
        let stored = manager.load_hole_data(1).expect("stored");
        assert!(stored.strokes[2].poor_shot_flag);
        assert_eq!(stored.strokes[2].outcome_direction, Some(Outcome::Short));
    }

    #[test]
    fn empty_hole_cannot_be_completed() {
        let (mut manager, store, _, course_id) = manager();
        manager.select_course(&course_id).expect("round starts");
        let mut working = manager.open_hole(1).expect("hole opens");
        let ids: Vec<String> = working.iter().map(|s| s.id.clone()).collect();
        for id in &ids {
            working.remove_shot(id).expect("removed");
        }
        let saves = store.save_count();

        assert_eq!(manager.complete_hole(&working), Err(GolfError::EmptyHole(1)));
        assert_eq!(manager.state(), RoundState::InProgress { hole: 1 });
        assert!(manager.load_hole_data(1).is_none());
        assert_eq!(manager.current_round().map(|r| r.total_score), Some(0));
        assert_eq!(store.save_count(), saves);
    }

    #[test]
    fn opening_a_hole_from_the_summary_keeps_reviewing() {
        let (mut manager, _, _, course_id) = manager();
        manager.select_course(&course_id).expect("round starts");
        play_par(&mut manager, 1);
        manager.review_round(None).expect("review");
        let reviewing = RoundState::ReviewingSummary { return_hole: 2 };

        let working = manager.open_hole(4).expect("hole 4 is viewable");
        assert_eq!(working.hole_number(), 4);
        assert_eq!(manager.state(), reviewing);
        assert!(matches!(
            manager.complete_hole(&working),
            Err(GolfError::InvalidTransition { .. })
        ));
        assert!(manager.load_hole_data(4).is_none());

        assert_eq!(manager.return_to_round(), Ok(2));
        let working = manager.open_hole(4).expect("hole 4");
        assert_eq!(manager.state(), RoundState::InProgress { hole: 4 });
        assert_eq!(
            manager.complete_hole(&working),
            Ok(RoundState::InProgress { hole: 5 })
        );
    }

    #[test]
    fn reopening_the_round_being_edited_keeps_its_edits() {
        let (mut manager, _, _, course_id) = manager();
        manager.select_course(&course_id).expect("round starts");
        play_par(&mut manager, 1);
        manager.review_round(None).expect("review");
        let round = manager.finalize_round().expect("finalize");
        assert_eq!(round.total_score, 4);

        manager.edit_past_round(&round.id).expect("edit");
        manager.return_to_round().expect("resume");
        let mut working = manager.open_hole(1).expect("hole 1");
        let putt = manager.add_putt(&mut working);
        manager
            .select_outcome(
                &mut working,
                &putt,
                OutcomeChoice::Direction(Outcome::Good),
                FollowUp::Skip,
            )
            .expect("outcome");
        manager.complete_hole(&working).expect("hole 1 again");
        let state = manager.state();

        assert_eq!(manager.edit_past_round(&round.id), Ok(()));
        assert_eq!(manager.current_round().map(|r| r.total_score), Some(5));
        assert_eq!(manager.state(), state);
        assert_eq!(manager.rounds()[0].total_score, 4);
    }

    #[test]
    fn shot_edits_signal_light_feedback() {
        let (mut manager, _, feedback, course_id) = manager();
        manager.select_course(&course_id).expect("round starts");
        let mut working = manager.open_hole(2).expect("hole 2");
        let before = feedback.signals().len();

        let stroke = manager.add_stroke(&mut working);
        manager
            .select_outcome(
                &mut working,
                &stroke,
                OutcomeChoice::Direction(Outcome::Left),
                FollowUp::Skip,
            )
            .expect("outcome");
        manager
            .set_lie(&mut working, &stroke, Lie::Rough, FollowUp::Skip)
            .expect("lie");
        manager
            .set_club(&mut working, &stroke, Some("5-Iron".to_string()))
            .expect("club");
        let putt = manager.add_putt(&mut working);
        manager
            .set_putt_distance(&mut working, &putt, PuttDistance::OverTen)
            .expect("distance");

        let signals = feedback.signals();
        assert_eq!(signals.len() - before, 6);
        assert!(signals[before..].iter().all(|kind| *kind == FeedbackKind::Light));

        assert!(manager.set_club(&mut working, &putt, None).is_err());
        assert_eq!(feedback.signals().len(), signals.len());
    }
}
