#![allow(missing_docs)]

//! Hole totals, handicap bumps and round-level aggregates.

use serde::{Deserialize, Serialize};

use crate::{
    models::{Course, HoleScore, Outcome, Round, Shot, HOLES_PER_ROUND},
    sequencer::ShotSequencer,
};

/// Strokes and putts combined.
pub fn hole_stroke_count(score: &HoleScore) -> u32 {
    score.shots.len() as u32
}

/// Handicap strokes received on a hole.
///
/// Up to 18 the hardest `handicap` holes get one stroke; above 18 every hole
/// gets one and the hardest `handicap - 18` get a second.
pub fn bumps(stroke_index: u8, handicap: Option<u8>) -> u8 {
    match handicap {
        None | Some(0) => 0,
        Some(handicap) if handicap <= HOLES_PER_ROUND => u8::from(stroke_index <= handicap),
        Some(handicap) => 1 + u8::from(stroke_index <= handicap - HOLES_PER_ROUND),
    }
}

/// Running totals relative to par.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverPar {
    pub gross: i32,
    pub net: i32,
}

/// Uncommitted shots for the hole being played.
#[derive(Debug, Clone, Copy)]
pub struct Provisional<'a> {
    pub strokes: &'a [Shot],
    pub putts: &'a [Shot],
}

impl Provisional<'_> {
    fn stroke_count(&self) -> Option<u32> {
        let count = self.strokes.len() + self.putts.len();
        (count > 0).then_some(count as u32)
    }
}

impl<'a> From<&'a ShotSequencer> for Provisional<'a> {
    fn from(sequencer: &'a ShotSequencer) -> Self {
        Self {
            strokes: sequencer.strokes(),
            putts: sequencer.putts(),
        }
    }
}

/// Gross and net over par for holes `1..=upto`.
///
/// The target hole falls back to `provisional` when it has no committed
/// score. Holes with neither contribute nothing, so the series has gaps when
/// holes are skipped.
pub fn cumulative_over_par(
    round: &Round,
    course: &Course,
    upto: u8,
    provisional: Option<Provisional<'_>>,
    handicap: Option<u8>,
) -> OverPar {
    let mut total = OverPar::default();
    for number in 1..=upto.min(HOLES_PER_ROUND) {
        let Some(hole) = course.hole(number) else {
            continue;
        };
        let count = match round.hole_score(number) {
            Some(score) => Some(hole_stroke_count(score)),
            None if number == upto => provisional.and_then(|shots| shots.stroke_count()),
            None => None,
        };
        if let Some(count) = count {
            let gross = count as i32 - i32::from(hole.par);
            total.gross += gross;
            total.net += gross - i32::from(bumps(hole.stroke_index, handicap));
        }
    }
    total
}

/// Cumulative totals after each of the 18 holes.
pub fn over_par_series(round: &Round, course: &Course, handicap: Option<u8>) -> Vec<OverPar> {
    (1..=HOLES_PER_ROUND)
        .map(|number| cumulative_over_par(round, course, number, None, handicap))
        .collect()
}

/// Name for a hole score relative to par.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ScoreLabel {
    Albatross,
    Eagle,
    Birdie,
    Par,
    Bogey,
    DoubleBogey,
    TripleBogey,
    Worse,
}

impl ScoreLabel {
    pub fn from_relative(relative: i32) -> Self {
        match relative {
            i32::MIN..=-3 => ScoreLabel::Albatross,
            -2 => ScoreLabel::Eagle,
            -1 => ScoreLabel::Birdie,
            0 => ScoreLabel::Par,
            1 => ScoreLabel::Bogey,
            2 => ScoreLabel::DoubleBogey,
            3 => ScoreLabel::TripleBogey,
            _ => ScoreLabel::Worse,
        }
    }
}

impl From<&HoleScore> for ScoreLabel {
    fn from(score: &HoleScore) -> Self {
        Self::from_relative(score.net_score)
    }
}

/// Derived view of a round; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub holes_played: usize,
    pub total_score: u32,
    pub total_par: u32,
    /// `total_score - total_par`.
    pub net_score: i32,
    /// Cumulative over par through hole 18, gross and handicap-adjusted.
    pub over_par: OverPar,
    pub under_par_holes: usize,
    pub at_par_holes: usize,
    pub over_par_holes: usize,
    pub front_nine: u32,
    pub back_nine: u32,
    pub total_putts: usize,
    pub fire_shots: usize,
    pub poor_shots: usize,
    pub penalties: usize,
}

impl RoundSummary {
    pub fn new(round: &Round, course: &Course, handicap: Option<u8>) -> Self {
        let total_score: u32 = round.hole_scores.iter().map(hole_stroke_count).sum();
        let nine = |range: std::ops::RangeInclusive<u8>| {
            round
                .hole_scores
                .iter()
                .filter(|score| range.contains(&score.hole_number))
                .map(hole_stroke_count)
                .sum::<u32>()
        };
        let relative = |score: &&HoleScore| score.net_score;
        let shots = || round.hole_scores.iter().flat_map(|score| score.shots.iter());

        Self {
            holes_played: round.hole_scores.len(),
            total_score,
            total_par: round.total_par,
            net_score: total_score as i32 - round.total_par as i32,
            over_par: cumulative_over_par(round, course, HOLES_PER_ROUND, None, handicap),
            under_par_holes: round.hole_scores.iter().filter(|s| relative(s) < 0).count(),
            at_par_holes: round.hole_scores.iter().filter(|s| relative(s) == 0).count(),
            over_par_holes: round.hole_scores.iter().filter(|s| relative(s) > 0).count(),
            front_nine: nine(1..=9),
            back_nine: nine(10..=18),
            total_putts: shots().filter(|shot| shot.is_putt()).count(),
            fire_shots: shots()
                .filter(|shot| shot.outcome_direction == Some(Outcome::Fire))
                .count(),
            poor_shots: shots().filter(|shot| shot.poor_shot_flag).count(),
            penalties: shots()
                .filter(|shot| shot.outcome_direction == Some(Outcome::Penalty))
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{holes_from_input, CourseInput},
        models::{Hole, PuttDistance, Settings},
    };
    use chrono::Utc;

    fn course() -> Course {
        Course {
            id: "c1".to_string(),
            name: "Links".to_string(),
            holes: holes_from_input(&CourseInput {
                name: "Links".to_string(),
                pars: "4 5 3 4 4 3 4 5 4 4 3 5 4 4 3 4 5 4".to_string(),
                stroke_indexes: "5 1 17 11 3 15 9 7 13 8 18 2 12 4 16 10 6 14".to_string(),
                distances: String::new(),
            }),
            created_at: Utc::now(),
        }
    }

    fn score(hole: &Hole, strokes: usize, putts: usize) -> HoleScore {
        let mut shots: Vec<Shot> = (0..strokes).map(|_| Shot::stroke(None, None)).collect();
        shots.extend((0..putts).map(|_| Shot::putt(Some(PuttDistance::UnderFour))));
        HoleScore::new(hole.number, "c1", hole.par, shots)
    }

    #[test]
    fn bumps_follow_the_two_branch_rule() {
        assert_eq!(bumps(5, Some(10)), 1);
        assert_eq!(bumps(11, Some(10)), 0);
        assert_eq!(bumps(18, Some(25)), 1);
        assert_eq!(bumps(7, Some(25)), 2);
        assert_eq!(bumps(1, None), 0);
        assert_eq!(bumps(1, Some(0)), 0);

        for handicap in 0..=54u8 {
            for stroke_index in 1..=18u8 {
                let expected = if handicap == 0 {
                    0
                } else if handicap <= 18 {
                    u8::from(stroke_index <= handicap)
                } else {
                    1 + u8::from(stroke_index <= handicap - 18)
                };
                let got = bumps(stroke_index, Some(handicap));
                assert!(got <= 2);
                assert_eq!(got, expected, "handicap {handicap}, index {stroke_index}");
            }
        }
    }

    #[test]
    fn bogey_free_par_round_is_level() {
        let course = course();
        let mut round = Round::new(&course);
        for hole in &course.holes {
            let strokes = usize::from(hole.par) - 2;
            round.upsert_hole_score(score(hole, strokes, 2));
        }
        let totals = cumulative_over_par(&round, &course, 18, None, Some(18));
        assert_eq!(totals.gross, 0);
        assert_eq!(totals.net, -18);

        let summary = RoundSummary::new(&round, &course, None);
        assert_eq!(summary.total_score, 72);
        assert_eq!(summary.net_score, 0);
        assert_eq!(summary.at_par_holes, 18);
        assert_eq!(summary.total_putts, 36);
        assert_eq!(summary.front_nine + summary.back_nine, 72);
    }

    #[test]
    fn handicap_hole_scenario() {
        let course = course();
        let hole = course.hole(1).expect("hole 1").clone();
        assert_eq!((hole.par, hole.stroke_index), (4, 5));
        let mut round = Round::new(&course);
        round.upsert_hole_score(score(&hole, 2, 2));
        let totals = cumulative_over_par(&round, &course, 1, None, Some(10));
        assert_eq!(totals, OverPar { gross: 0, net: -1 });
    }

    #[test]
    fn provisional_only_counts_for_the_target_hole() {
        let course = course();
        let settings = Settings::default();
        let mut round = Round::new(&course);
        round.upsert_hole_score(score(&course.holes[0], 3, 2));

        let hole3 = course.hole(3).expect("hole 3");
        let mut working = ShotSequencer::seeded(hole3, &settings);
        working.add_putt();

        let totals = cumulative_over_par(&round, &course, 3, Some((&working).into()), None);
        assert_eq!(totals.gross, 1 + 1);

        let skipped = cumulative_over_par(&round, &course, 4, Some((&working).into()), None);
        assert_eq!(skipped.gross, 1);

        let empty = Provisional {
            strokes: &[],
            putts: &[],
        };
        let totals = cumulative_over_par(&round, &course, 3, Some(empty), None);
        assert_eq!(totals.gross, 1);
    }

    #[test]
    fn series_and_labels() {
        let course = course();
        let mut round = Round::new(&course);
        round.upsert_hole_score(score(&course.holes[0], 1, 1));
        round.upsert_hole_score(score(&course.holes[2], 3, 3));
        let series = over_par_series(&round, &course, None);
        assert_eq!(series.len(), 18);
        assert_eq!(series[0].gross, -2);
        assert_eq!(series[1].gross, -2);
        assert_eq!(series[2].gross, 1);
        assert_eq!(series[17].gross, 1);

        assert_eq!(ScoreLabel::from(&round.hole_scores[0]), ScoreLabel::Eagle);
        assert_eq!(ScoreLabel::from(&round.hole_scores[1]), ScoreLabel::TripleBogey);
        assert_eq!(ScoreLabel::from_relative(-4), ScoreLabel::Albatross);
        assert_eq!(ScoreLabel::from_relative(6), ScoreLabel::Worse);
    }
}
