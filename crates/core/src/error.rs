#![allow(missing_docs)]

//! Recoverable error states surfaced by the scoring engine.

use thiserror::Error;

use crate::lifecycle::RoundState;

/// Errors returned by round, hole and course operations.
///
/// None of these are fatal: each one leaves the data aggregate untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GolfError {
    #[error("hole {0} has no shots")]
    EmptyHole(u8),
    #[error("hole {hole} has shots without an outcome: {}", missing.join(", "))]
    IncompleteHole { hole: u8, missing: Vec<String> },
    #[error("round {active} is still in progress; finish or delete it first")]
    RoundInProgress { active: String },
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: RoundState,
    },
    #[error("no round is in progress")]
    NoActiveRound,
    #[error("unknown course: {0}")]
    UnknownCourse(String),
    #[error("unknown round: {0}")]
    UnknownRound(String),
    #[error("unknown shot: {0}")]
    UnknownShot(String),
    #[error("shot {0} is a putt and has no lie or club")]
    NotAStroke(String),
    #[error("shot {0} is a stroke and has no putt distance")]
    NotAPutt(String),
    #[error("hole {0} is outside 1..=18")]
    HoleOutOfRange(u8),
    #[error("invalid course: {0}")]
    InvalidCourse(String),
}

/// Convenience alias used throughout the engine.
pub type GolfResult<T> = Result<T, GolfError>;
