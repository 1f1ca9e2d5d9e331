//! Per-hole statistics across completed rounds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{HoleScore, Outcome, Round, Shot, ShotKind};

/// Number of most recent hole scores kept for trends.
pub const RECENT_ROUNDS: usize = 5;

/// How often each outcome was recorded at a shot position.
pub type OutcomeCounts = BTreeMap<Outcome, u32>;

/// Outcome tallies keyed by position label (`stroke-1`, `putt-2`, ...).
pub type ShotPositionOutcomes = BTreeMap<String, OutcomeCounts>;

/// Aggregated results for one hole of one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoleHistory {
    /// Course the statistics cover.
    pub course_id: String,
    /// Hole the statistics cover.
    pub hole_number: u8,
    /// Completed rounds that scored this hole.
    pub total_rounds: usize,
    /// Mean strokes, rounded to one decimal.
    pub average_score: f64,
    /// Fewest strokes recorded.
    pub best_score: u32,
    /// Most strokes recorded.
    pub worst_score: u32,
    /// Most recent hole scores first.
    pub recent_rounds: Vec<HoleScore>,
}

impl HoleHistory {
    fn empty(course_id: &str, hole_number: u8) -> Self {
        Self {
            course_id: course_id.to_string(),
            hole_number,
            total_rounds: 0,
            average_score: 0.0,
            best_score: 0,
            worst_score: 0,
            recent_rounds: Vec::new(),
        }
    }

    /// Outcome tallies over [`HoleHistory::recent_rounds`].
    pub fn position_outcomes(&self) -> ShotPositionOutcomes {
        shot_position_outcomes(self)
    }
}

/// Collect statistics for `hole_number` over the completed rounds of a course.
pub fn hole_history(course_id: &str, hole_number: u8, rounds: &[Round]) -> HoleHistory {
    hole_history_with_window(course_id, hole_number, rounds, RECENT_ROUNDS)
}

/// Same as [`hole_history`] with a custom recent-round window.
pub fn hole_history_with_window(
    course_id: &str,
    hole_number: u8,
    rounds: &[Round],
    window: usize,
) -> HoleHistory {
    let mut scores: Vec<&HoleScore> = rounds
        .iter()
        .filter(|round| round.is_complete && round.course_id == course_id)
        .filter_map(|round| round.hole_score(hole_number))
        .collect();
    if scores.is_empty() {
        return HoleHistory::empty(course_id, hole_number);
    }

    let totals: Vec<u32> = scores.iter().map(|score| score.total_score).collect();
    let mean = f64::from(totals.iter().sum::<u32>()) / totals.len() as f64;
    let best_score = totals.iter().copied().min().unwrap_or(0);
    let worst_score = totals.iter().copied().max().unwrap_or(0);

    scores.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    let recent_rounds = scores.into_iter().take(window).cloned().collect();

    HoleHistory {
        course_id: course_id.to_string(),
        hole_number,
        total_rounds: totals.len(),
        average_score: (mean * 10.0).round() / 10.0,
        best_score,
        worst_score,
        recent_rounds,
    }
}

/// Tally outcomes by shot position across the recent hole scores.
///
/// Every position reached by any recent score gets a key, even when none of
/// the shots there had an outcome recorded.
pub fn shot_position_outcomes(history: &HoleHistory) -> ShotPositionOutcomes {
    let mut table = ShotPositionOutcomes::new();
    for score in history.recent_rounds.iter().take(RECENT_ROUNDS) {
        for kind in [ShotKind::Stroke, ShotKind::Putt] {
            let mut shots: Vec<&Shot> = score.shots.iter().filter(|s| s.kind == kind).collect();
            shots.sort_by_key(|shot| shot.timestamp);
            for (offset, shot) in shots.into_iter().enumerate() {
                let counts = table
                    .entry(format!("{}-{}", kind.label(), offset + 1))
                    .or_default();
                if let Some(outcome) = shot.outcome_direction {
                    *counts.entry(outcome).or_insert(0) += 1;
                }
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::sample_course,
        models::{Course, PuttDistance},
    };
    use chrono::{Duration, Utc};

    fn finished_round(course: &Course, hole: u8, shots: Vec<Shot>, age_days: i64) -> Round {
        let mut round = Round::new(course);
        let par = course.hole(hole).map(|h| h.par).unwrap_or(4);
        let mut score = HoleScore::new(hole, &course.id, par, shots);
        score.completed_at = Utc::now() - Duration::days(age_days);
        round.upsert_hole_score(score);
        round.is_complete = true;
        round.completed_at = Some(Utc::now());
        round
    }

    fn shots(outcomes: &[Option<Outcome>], putts: usize) -> Vec<Shot> {
        let mut shots: Vec<Shot> = outcomes
            .iter()
            .map(|outcome| {
                let mut shot = Shot::stroke(None, None);
                shot.outcome_direction = *outcome;
                shot
            })
            .collect();
        shots.extend(
            (0..putts).map(|_| Shot::putt(Some(PuttDistance::UnderFour)).with_outcome(Outcome::Good)),
        );
        shots
    }

    #[test]
    fn no_rounds_yield_zeroed_history() {
        let course = sample_course();
        let history = hole_history(&course.id, 4, &[]);
        assert_eq!(history.total_rounds, 0);
        assert_eq!(history.average_score, 0.0);
        assert!(history.recent_rounds.is_empty());
        assert!(history.position_outcomes().is_empty());
    }

    #[test]
    fn skips_incomplete_rounds_and_other_courses() {
        let course = sample_course();
        let other = sample_course();
        let mut open = finished_round(&course, 1, shots(&[Some(Outcome::Good)], 2), 0);
        open.is_complete = false;
        let elsewhere = finished_round(&other, 1, shots(&[Some(Outcome::Good)], 2), 0);
        let history = hole_history(&course.id, 1, &[open, elsewhere]);
        assert_eq!(history.total_rounds, 0);
    }

    #[test]
    fn averages_and_keeps_the_five_most_recent() {
        let course = sample_course();
        let rounds: Vec<Round> = [(4, 6), (5, 5), (6, 4), (4, 3), (5, 2), (7, 1), (4, 0)]
            .into_iter()
            .map(|(strokes, age)| {
                let outcomes = vec![Some(Outcome::Good); strokes - 2];
                finished_round(&course, 1, shots(&outcomes, 2), age)
            })
            .collect();

        let history = hole_history(&course.id, 1, &rounds);
        assert_eq!(history.total_rounds, 7);
        assert_eq!(history.average_score, 5.0);
        assert_eq!(history.best_score, 4);
        assert_eq!(history.worst_score, 7);
        let recent: Vec<u32> = history.recent_rounds.iter().map(|s| s.total_score).collect();
        assert_eq!(recent, vec![4, 7, 5, 4, 6]);

        let uneven = hole_history(&course.id, 1, &rounds[..3]);
        assert_eq!(uneven.average_score, 5.0);
        let two = hole_history(&course.id, 1, &rounds[..2]);
        assert_eq!(two.average_score, 4.5);
    }

    #[test]
    fn tallies_outcomes_per_position() {
        let course = sample_course();
        let rounds = vec![
            finished_round(&course, 2, shots(&[Some(Outcome::Left), Some(Outcome::Good)], 2), 2),
            finished_round(&course, 2, shots(&[Some(Outcome::Left), None, None], 1), 1),
            finished_round(&course, 2, shots(&[Some(Outcome::Fire), Some(Outcome::Good)], 2), 0),
        ];
        let history = hole_history(&course.id, 2, &rounds);
        let table = shot_position_outcomes(&history);

        assert_eq!(table["stroke-1"].get(&Outcome::Left), Some(&2));
        assert_eq!(table["stroke-1"].get(&Outcome::Fire), Some(&1));
        assert_eq!(table["stroke-2"].get(&Outcome::Good), Some(&2));
        assert!(table["stroke-3"].is_empty());
        assert_eq!(table["putt-1"].get(&Outcome::Good), Some(&3));
        assert_eq!(table["putt-2"].get(&Outcome::Good), Some(&2));
    }
}
