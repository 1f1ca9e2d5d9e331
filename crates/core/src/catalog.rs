//! Course definitions built from free-form user input.
//!
//! Numeric lists are forgiving: anything that does not describe a full,
//! valid 18-hole layout is replaced by a default instead of rejected.

use std::num::IntErrorKind;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::{
    error::{GolfError, GolfResult},
    models::{new_id, Course, Hole, HOLES_PER_ROUND, MAX_HANDICAP},
};

/// Par used for every hole when the par list is unusable.
pub const DEFAULT_PAR: u8 = 4;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("failed to compile course number regex"));

/// Raw text entered for a new or edited course.
#[derive(Debug, Clone, Default)]
pub struct CourseInput {
    /// Course name; must not be blank.
    pub name: String,
    /// Pars separated by spaces, commas or anything non-numeric.
    pub pars: String,
    /// Stroke indices in hole order.
    pub stroke_indexes: String,
    /// Card distances in yards; 0 leaves a hole without one.
    pub distances: String,
}

fn parse_numbers(input: &str) -> Option<Vec<u32>> {
    NUMBER_RE
        .find_iter(input)
        .map(|found| found.as_str().parse::<u32>().ok())
        .collect()
}

/// Parse 18 pars of 3, 4 or 5, falling back to 18 par-4 holes.
pub fn parse_pars(input: &str) -> Vec<u8> {
    let parsed = parse_numbers(input).filter(|values| {
        values.len() == usize::from(HOLES_PER_ROUND)
            && values.iter().all(|value| (3..=5).contains(value))
    });
    match parsed {
        Some(values) => values.into_iter().map(|value| value as u8).collect(),
        None => {
            if !input.trim().is_empty() {
                warn!("par list {input:?} is not 18 values of 3-5; using par 4 throughout");
            }
            vec![DEFAULT_PAR; usize::from(HOLES_PER_ROUND)]
        }
    }
}

/// Parse a permutation of 1..=18, falling back to sequential indexes.
pub fn parse_stroke_indexes(input: &str) -> Vec<u8> {
    let parsed = parse_numbers(input).filter(|values| {
        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted == (1..=u32::from(HOLES_PER_ROUND)).collect::<Vec<_>>()
    });
    match parsed {
        Some(values) => values.into_iter().map(|value| value as u8).collect(),
        None => {
            if !input.trim().is_empty() {
                warn!("stroke index list {input:?} is not a permutation of 1-18; using 1-18");
            }
            (1..=HOLES_PER_ROUND).collect()
        }
    }
}

/// Parse 18 distances in yards. Zeros and malformed lists become `None`.
pub fn parse_distances(input: &str) -> Vec<Option<u32>> {
    match parse_numbers(input).filter(|values| values.len() == usize::from(HOLES_PER_ROUND)) {
        Some(values) => values
            .into_iter()
            .map(|value| (value > 0).then_some(value))
            .collect(),
        None => {
            if !input.trim().is_empty() {
                warn!("distance list {input:?} is not 18 values; omitting distances");
            }
            vec![None; usize::from(HOLES_PER_ROUND)]
        }
    }
}

/// Parse a handicap, clamping to `0..=54`. Anything non-numeric is unset.
pub fn parse_handicap(input: &str) -> Option<u8> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<u64>() {
        Ok(value) => Some(value.min(u64::from(MAX_HANDICAP)) as u8),
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => Some(MAX_HANDICAP),
        Err(_) => {
            warn!("handicap {trimmed:?} is not a whole number; leaving it unset");
            None
        }
    }
}

/// Build the 18 holes described by `input`.
pub fn holes_from_input(input: &CourseInput) -> Vec<Hole> {
    let pars = parse_pars(&input.pars);
    let indexes = parse_stroke_indexes(&input.stroke_indexes);
    let distances = parse_distances(&input.distances);
    pars.into_iter()
        .zip(indexes)
        .zip(distances)
        .enumerate()
        .map(|(offset, ((par, stroke_index), distance_yards))| Hole {
            number: offset as u8 + 1,
            par,
            stroke_index,
            distance_yards,
            todays_distance: None,
        })
        .collect()
}

/// Create a new course from user input.
pub fn course_from_input(input: &CourseInput) -> GolfResult<Course> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(GolfError::InvalidCourse("course name is empty".to_string()));
    }
    Ok(Course {
        id: new_id(),
        name: name.to_string(),
        holes: holes_from_input(input),
        created_at: Utc::now(),
    })
}

/// Check that a course has exactly holes 1..=18 with valid pars and unique stroke indexes.
pub fn validate_course(course: &Course) -> GolfResult<()> {
    if course.name.trim().is_empty() {
        return Err(GolfError::InvalidCourse("course name is empty".to_string()));
    }
    if course.holes.len() != usize::from(HOLES_PER_ROUND) {
        return Err(GolfError::InvalidCourse(format!(
            "expected 18 holes, found {}",
            course.holes.len()
        )));
    }
    let mut seen_numbers = [false; 18];
    let mut seen_indexes = [false; 18];
    for hole in &course.holes {
        if !(1..=HOLES_PER_ROUND).contains(&hole.number) {
            return Err(GolfError::HoleOutOfRange(hole.number));
        }
        if !(3..=5).contains(&hole.par) {
            return Err(GolfError::InvalidCourse(format!(
                "hole {} has par {}",
                hole.number, hole.par
            )));
        }
        if !(1..=HOLES_PER_ROUND).contains(&hole.stroke_index) {
            return Err(GolfError::InvalidCourse(format!(
                "hole {} has stroke index {}",
                hole.number, hole.stroke_index
            )));
        }
        let number_slot = &mut seen_numbers[usize::from(hole.number - 1)];
        let index_slot = &mut seen_indexes[usize::from(hole.stroke_index - 1)];
        if *number_slot || *index_slot {
            return Err(GolfError::InvalidCourse(format!(
                "hole {} repeats a hole number or stroke index",
                hole.number
            )));
        }
        *number_slot = true;
        *index_slot = true;
    }
    Ok(())
}

/// A ready-made par-72 course for first runs.
pub fn sample_course() -> Course {
    let input = CourseInput {
        name: "Sample Links".to_string(),
        pars: "4 5 3 4 4 3 4 5 4 4 3 5 4 4 3 4 5 4".to_string(),
        stroke_indexes: "7 1 17 11 3 15 9 5 13 8 18 2 12 4 16 10 6 14".to_string(),
        distances: "380 520 165 400 430 150 370 545 410 395 175 510 360 440 140 385 530 420"
            .to_string(),
    };
    Course {
        id: new_id(),
        name: input.name.clone(),
        holes: holes_from_input(&input),
        created_at: Utc::now(),
    }
}
