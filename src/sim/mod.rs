//! Deterministic simulation module
//!
//! All gameplay rules live here. This module must be pure and deterministic:
//! - Fixed timestep only, driven by `tick(delta_ms)`
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, storage or network dependencies

pub mod difficulty;
pub mod physics;
pub mod scoring;
pub mod spawn;
pub mod state;
pub mod tick;

pub use difficulty::{difficulty, difficulty_for_spend, speed_scale};
pub use physics::{Bounds, advance};
pub use scoring::{ScoringRules, register_hit};
pub use spawn::{SpawnArea, remove_ball, spawn_balls};
pub use state::{
    Ball, ComboState, EndReason, GameEvent, GameState, RoundMode, RoundRules, RoundState,
    RoundStatus, RoundSummary,
};
pub use tick::{HitOutcome, TickInput, end, hit, set_difficulty, start, tick};
