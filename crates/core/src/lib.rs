#![warn(clippy::all, missing_docs)]

//! Golf round scoring and shot-tracking engine.
//!
//! This crate hosts the course catalog, the per-hole shot sequencer,
//! handicap scoring, the round lifecycle and cross-round statistics,
//! plus the persistence and configuration layers used by front ends.

pub mod catalog;
pub mod config;
pub mod error;
pub mod feedback;
pub mod history;
pub mod lifecycle;
pub mod models;
pub mod scoring;
pub mod sequencer;
pub mod store;

pub use crate::config::AppConfig;
pub use error::{GolfError, GolfResult};
pub use history::{HoleHistory, ShotPositionOutcomes};
pub use lifecycle::{HoleData, Navigation, RoundManager, RoundState};
pub use models::{
    Course, DataAggregate, Hole, HoleScore, Lie, Outcome, PuttDistance, Round, Settings, Shot,
    ShotKind,
};
pub use scoring::{OverPar, RoundSummary, ScoreLabel};
pub use sequencer::{FollowUp, LieChange, OutcomeChoice, ShotSequencer};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
