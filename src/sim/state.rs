//! Round state and core simulation types
//!
//! Everything the lifecycle mutates lives here so a round can be replayed
//! from its seed.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::physics::Bounds;
use super::scoring::ScoringRules;
use super::spawn::SpawnArea;
use crate::ads::Advertisement;
use crate::settings::Settings;

/// Round lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundStatus {
    /// No timers running, no balls
    #[default]
    Idle,
    /// Countdown and physics active
    Running,
    /// Settled; a new start goes back through Idle
    Ended,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Countdown reached zero
    Timeout,
    /// Every ball was crushed
    PerfectClear,
    /// Player or host stopped the round
    Stopped,
}

/// Whether the round pays out from the prize pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundMode {
    #[default]
    Practice,
    Prize,
}

/// A live brand logo drifting around the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    /// Position in the normalized 0..100 arena
    pub pos: Vec2,
    /// Displacement per physics tick at speed scale 1
    pub vel: Vec2,
    /// On-screen size in pixels
    pub size: f32,
    /// Advertisement this ball was spawned from (stable for its lifetime)
    pub ad_id: u64,
    pub brand: String,
    pub logo: String,
    /// Bid behind the ball, for display
    pub bid: f64,
    /// Points override (catalog brands carry their own)
    pub points: Option<u32>,
}

impl Ball {
    pub fn from_ad(id: u32, ad: &Advertisement, pos: Vec2, vel: Vec2, size: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            size,
            ad_id: ad.id,
            brand: ad.brand_name.clone(),
            logo: ad.logo.clone(),
            bid: ad.bid,
            points: ad.points,
        }
    }
}

/// Consecutive-hit tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComboState {
    /// 0 before the first hit of a round, then >= 1
    pub combo: u32,
    /// Round clock (ms) of the previous hit
    pub last_hit_at: Option<u64>,
}

/// Per-round score and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub status: RoundStatus,
    pub mode: RoundMode,
    /// Rounds started so far (1-based once running)
    pub round: u32,
    pub score: u64,
    pub time_remaining: u32,
    /// Clock (ms) when the round started
    pub started_at: u64,
    pub combo: ComboState,
    pub difficulty: f64,
    /// Position step multiplier derived from difficulty
    pub speed_scale: f32,
    pub crushed: u32,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            status: RoundStatus::Idle,
            mode: RoundMode::Practice,
            round: 0,
            score: 0,
            time_remaining: 0,
            started_at: 0,
            combo: ComboState::default(),
            difficulty: 1.0,
            speed_scale: 0.0,
            crushed: 0,
        }
    }
}

/// Settlement record emitted exactly once per round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub mode: RoundMode,
    pub score: u64,
    pub time_played_secs: u64,
    pub reason: EndReason,
    pub balls_left: usize,
    pub crushed: u32,
}

/// Things the host may want to react to (effects, sounds, settlement)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RoundStarted {
        round: u32,
        balls: usize,
    },
    BallCrushed {
        ball_id: u32,
        ad_id: u64,
        pos: Vec2,
        points: u32,
        combo: u32,
    },
    BallSpawned {
        ball_id: u32,
    },
    CountdownTick {
        remaining: u32,
    },
    RoundEnded(RoundSummary),
}

/// A periodic timer scoped to the Running state
///
/// Cancelling drops any partially accumulated time so a stale interval can
/// never fire into the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timer {
    pub period_ms: u64,
    accumulated_ms: u64,
    armed: bool,
}

impl Timer {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            accumulated_ms: 0,
            armed: false,
        }
    }

    pub fn arm(&mut self) {
        self.accumulated_ms = 0;
        self.armed = true;
    }

    pub fn cancel(&mut self) {
        self.accumulated_ms = 0;
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Accumulate elapsed time; returns how many periods are now due
    pub fn advance(&mut self, delta_ms: u64) -> u64 {
        if !self.armed || self.period_ms == 0 {
            return 0;
        }
        self.accumulated_ms = self.accumulated_ms.saturating_add(delta_ms);
        let due = self.accumulated_ms / self.period_ms;
        self.accumulated_ms %= self.period_ms;
        due
    }
}

/// All timers tied to a running round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundTimers {
    pub countdown: Timer,
    pub physics: Timer,
    /// Demo autoplayer cadence
    pub idle: Timer,
}

impl RoundTimers {
    pub fn arm_all(&mut self) {
        self.countdown.arm();
        self.physics.arm();
        self.idle.arm();
    }

    pub fn cancel_all(&mut self) {
        self.countdown.cancel();
        self.physics.cancel();
        self.idle.cancel();
    }

    pub fn any_armed(&self) -> bool {
        self.countdown.is_armed() || self.physics.is_armed() || self.idle.is_armed()
    }
}

/// Rules captured when a round starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundRules {
    pub duration_secs: u32,
    pub capacity: usize,
    pub respawn_on_hit: bool,
    pub physics_tick_ms: u64,
    pub countdown_tick_ms: u64,
    pub max_substeps: u32,
    pub idle_hit_interval_ms: u64,
    pub bounds: Bounds,
    pub spawn: SpawnArea,
    pub base_speed: f32,
    pub scale_speed_by_difficulty: bool,
    pub scoring: ScoringRules,
}

impl Default for RoundRules {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for RoundRules {
    fn from(settings: &Settings) -> Self {
        Self {
            duration_secs: settings.round_duration_secs,
            capacity: settings.arena_capacity,
            respawn_on_hit: settings.respawn_on_hit,
            physics_tick_ms: settings.physics_tick_ms,
            countdown_tick_ms: settings.countdown_tick_ms,
            max_substeps: settings.max_substeps,
            idle_hit_interval_ms: settings.idle_hit_interval_ms,
            bounds: Bounds::from(settings),
            spawn: SpawnArea::from(settings),
            base_speed: settings.base_speed,
            scale_speed_by_difficulty: settings.scale_speed_by_difficulty,
            scoring: ScoringRules::from(settings),
        }
    }
}

impl RoundRules {
    /// Speed scale for a difficulty under these rules
    pub fn speed_scale(&self, difficulty: f64) -> f32 {
        if self.scale_speed_by_difficulty {
            super::difficulty::speed_scale(self.base_speed, difficulty)
        } else {
            self.base_speed
        }
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Complete simulation state (deterministic given seed and inputs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub round: RoundState,
    /// Rules of the current (or last) round
    pub rules: RoundRules,
    /// Live balls (sorted by id for determinism)
    pub balls: Vec<Ball>,
    /// Advertisements replacement balls are drawn from
    pub respawn_pool: Vec<Advertisement>,
    pub timers: RoundTimers,
    /// Simulation clock in ms since the state was created
    pub clock_ms: u64,
    /// Events since the host last drained them
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    #[serde(skip, default = "default_rng")]
    rng: Pcg32,
    next_id: u32,
}

fn default_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

impl GameState {
    /// Create an idle state with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            round: RoundState::default(),
            rules: RoundRules::default(),
            balls: Vec::new(),
            respawn_pool: Vec::new(),
            timers: RoundTimers::default(),
            clock_ms: 0,
            events: Vec::new(),
            rng: RngState::new(seed).to_rng(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Split borrow of the rng and the id counter for spawning
    pub fn spawn_context(&mut self) -> (&mut Pcg32, &mut u32) {
        (&mut self.rng, &mut self.next_id)
    }

    pub fn status(&self) -> RoundStatus {
        self.round.status
    }

    pub fn is_running(&self) -> bool {
        self.round.status == RoundStatus::Running
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ensure balls are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_accumulates_partial_periods() {
        let mut timer = Timer::new(50);
        assert_eq!(timer.advance(120), 0, "unarmed timer never fires");
        timer.arm();
        assert_eq!(timer.advance(30), 0);
        assert_eq!(timer.advance(30), 1);
        assert_eq!(timer.advance(100), 2);
    }

    #[test]
    fn test_timer_cancel_discards_partial_time() {
        let mut timer = Timer::new(1000);
        timer.arm();
        timer.advance(900);
        timer.cancel();
        timer.arm();
        assert_eq!(
            timer.advance(200),
            0,
            "leftover time from the old round must not count"
        );
    }

    #[test]
    fn test_entity_ids_increase() {
        let mut state = GameState::new(1);
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert!(b > a);
    }
}
