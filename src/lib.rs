//! Brand Crusher - sponsor-funded arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ball physics, scoring, round lifecycle)
//! - `ads`: Advertisement intake and prize pool accounting
//! - `identity`: Player verification service boundary
//! - `leaderboard`: Per-player totals, sorted by time played
//! - `settings`: Data-driven game rules
//! - `game`: Session that wires the above together for a host

pub mod ads;
pub mod error;
pub mod game;
pub mod identity;
pub mod leaderboard;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use ads::{AdBook, Advertisement, AdRegistration};
pub use error::{ExternalServiceError, GameError, SettingsError};
pub use game::{Game, Notice, ScoreSink, ScoreSubmission};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use settings::{RulesPreset, Settings};

/// Reference constants for the default rule set
pub mod consts {
    /// Physics timestep in milliseconds (20 Hz)
    pub const PHYSICS_TICK_MS: u64 = 50;
    /// Countdown timestep in milliseconds (1 Hz)
    pub const COUNTDOWN_TICK_MS: u64 = 1000;
    /// Maximum physics substeps per `tick` call to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Round length
    pub const ROUND_DURATION_SECS: u32 = 60;

    /// Normalized arena coordinate space is 0..100 on both axes
    pub const ARENA_SIZE: f32 = 100.0;
    /// Velocity reflects once a ball reaches these bounds
    pub const BOUNDARY_MIN: f32 = 5.0;
    pub const BOUNDARY_MAX: f32 = 95.0;
    /// Balls spawn inside this interior band, away from the walls
    pub const SPAWN_MIN: f32 = 10.0;
    pub const SPAWN_MAX: f32 = 90.0;

    /// Maximum number of live balls
    pub const ARENA_CAPACITY: usize = 16;

    /// Minimum accepted bid (USD)
    pub const MIN_BID: f64 = 1.0;
    /// Share of every bid that goes to the prize pool; the rest is platform fee
    pub const PRIZE_POOL_SHARE: f64 = 0.7;

    /// Points for crushing an advertised ball
    pub const BASE_POINTS: u32 = 10;
    /// Consecutive hits closer than this keep the combo alive
    pub const COMBO_WINDOW_MS: u64 = 2000;
    /// Combo counter contributes at most this many steps
    pub const COMBO_CAP: u32 = 5;
    /// Each combo step adds this fraction of base points
    pub const COMBO_STEP: f64 = 0.5;
    /// Base point multiplier for verified players
    pub const VERIFIED_MULTIPLIER: f64 = 2.0;

    /// Speed scale at difficulty 1
    pub const BASE_SPEED: f32 = 0.8;

    /// Score that earns the whole prize pool; rewards scale linearly below it
    pub const REWARD_SCORE_SCALE: f64 = 1000.0;
    /// Host answer deadline for a taken score submission
    pub const SUBMISSION_TIMEOUT_MS: u64 = 30_000;
}

/// Milliseconds to whole seconds, rounded down
#[inline]
pub fn whole_seconds(ms: u64) -> u64 {
    ms / 1000
}
