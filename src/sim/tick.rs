//! Round lifecycle and fixed timestep driver
//!
//! `Idle -> Running -> Ended`. All periodic work (countdown, physics, demo
//! autoplayer) runs from `tick(delta_ms)` so any scheduler can drive it: a
//! browser animation frame, a test loop or a headless simulation. Hits are
//! applied before physics inside a tick, so a crushed ball is never moved.

use glam::Vec2;
use rand::Rng;

use super::physics::advance;
use super::scoring::register_hit;
use super::spawn::{remove_ball, spawn_ball, spawn_balls};
use super::state::{
    EndReason, GameEvent, GameState, RoundMode, RoundRules, RoundStatus, RoundSummary,
    RoundTimers, Timer,
};
use crate::ads::Advertisement;
use crate::consts::ARENA_SIZE;
use crate::error::GameError;
use crate::whole_seconds;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Ball ids clicked since the last tick, in click order
    pub hits: Vec<u32>,
    /// Player currently holds a verified identity
    pub verified: bool,
    /// End the running round now
    pub stop: bool,
    /// Idle/demo mode - autoplayer crushes balls
    pub idle_mode: bool,
}

/// Result of trying to crush a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Crushed {
        points: u32,
        combo: u32,
    },
    /// Unknown id, or no round running
    Missed,
}

/// Start a round from `ads` (registered or catalog)
///
/// Fails without touching state when there is nothing to spawn. Starting over
/// a running round settles that round first.
pub fn start(
    state: &mut GameState,
    ads: &[Advertisement],
    difficulty: f64,
    rules: RoundRules,
    mode: RoundMode,
) -> Result<(), GameError> {
    if !ads.iter().any(|a| a.active) {
        return Err(GameError::NoAdvertisements);
    }

    if state.is_running() {
        end(state, EndReason::Stopped);
    }
    reset(state);

    state.rules = rules;
    let difficulty = difficulty.max(1.0);
    let (rng, next_id) = state.spawn_context();
    let balls = spawn_balls(ads, rules.capacity, &rules.spawn, rng, next_id);

    let round = &mut state.round;
    round.round += 1;
    round.mode = mode;
    round.score = 0;
    round.crushed = 0;
    round.combo = Default::default();
    round.time_remaining = rules.duration_secs;
    round.difficulty = difficulty;
    round.speed_scale = rules.speed_scale(difficulty);
    round.started_at = state.clock_ms;
    round.status = RoundStatus::Running;

    state.balls = balls;
    state.respawn_pool = ads.iter().filter(|a| a.active).cloned().collect();
    state.timers = RoundTimers {
        countdown: Timer::new(rules.countdown_tick_ms),
        physics: Timer::new(rules.physics_tick_ms),
        idle: Timer::new(rules.idle_hit_interval_ms),
    };
    state.timers.arm_all();
    state.normalize_order();

    log::info!(
        "Round {} started: {} balls, difficulty {:.2}, speed {:.2}, {}s",
        state.round.round,
        state.balls.len(),
        state.round.difficulty,
        state.round.speed_scale,
        state.round.time_remaining
    );
    state.events.push(GameEvent::RoundStarted {
        round: state.round.round,
        balls: state.balls.len(),
    });
    Ok(())
}

/// Back to Idle: no balls, no timers
fn reset(state: &mut GameState) {
    state.timers.cancel_all();
    state.balls.clear();
    state.respawn_pool.clear();
    state.round.status = RoundStatus::Idle;
}

/// Settle the running round
///
/// The only settlement point: returns `None` (and does nothing) unless a
/// round is running, so it fires once whichever ending wins.
pub fn end(state: &mut GameState, reason: EndReason) -> Option<RoundSummary> {
    if !state.is_running() {
        return None;
    }

    state.timers.cancel_all();
    state.round.status = RoundStatus::Ended;

    let summary = RoundSummary {
        round: state.round.round,
        mode: state.round.mode,
        score: state.round.score,
        time_played_secs: whole_seconds(state.clock_ms.saturating_sub(state.round.started_at))
            .min(u64::from(state.rules.duration_secs)),
        reason,
        balls_left: state.balls.len(),
        crushed: state.round.crushed,
    };
    log::info!(
        "Round {} ended ({:?}): score {}, {}s played",
        summary.round,
        reason,
        summary.score,
        summary.time_played_secs
    );
    state.events.push(GameEvent::RoundEnded(summary.clone()));
    Some(summary)
}

/// Crush a ball at the current clock
pub fn hit(state: &mut GameState, ball_id: u32, verified: bool) -> HitOutcome {
    if !state.is_running() {
        return HitOutcome::Missed;
    }
    let Some(ball) = remove_ball(&mut state.balls, ball_id) else {
        log::debug!("Hit on unknown ball {}", ball_id);
        return HitOutcome::Missed;
    };

    let now = state.clock_ms;
    let (points, combo) = register_hit(
        &ball,
        verified,
        state.round.combo,
        now,
        &state.rules.scoring,
    );
    state.round.combo = combo;
    state.round.score += u64::from(points);
    state.round.crushed += 1;
    log::debug!(
        "Crushed {} (ball {}) for {} points, combo {}",
        ball.brand,
        ball.id,
        points,
        combo.combo
    );
    state.events.push(GameEvent::BallCrushed {
        ball_id: ball.id,
        ad_id: ball.ad_id,
        pos: ball.pos,
        points,
        combo: combo.combo,
    });

    if state.rules.respawn_on_hit {
        respawn(state);
    }
    if state.balls.is_empty() {
        end(state, EndReason::PerfectClear);
    }

    HitOutcome::Crushed {
        points,
        combo: combo.combo,
    }
}

/// Replace a crushed ball with a random one from the round's pool
fn respawn(state: &mut GameState) {
    let pool = state.respawn_pool.len();
    if pool == 0 {
        return;
    }
    let spawn = state.rules.spawn;
    let id = state.next_entity_id();
    let (rng, _) = state.spawn_context();
    let index = rng.random_range(0..pool);
    let ad = state.respawn_pool[index].clone();
    let (rng, _) = state.spawn_context();
    let ball = spawn_ball(&ad, id, &spawn, rng);
    state.events.push(GameEvent::BallSpawned { ball_id: ball.id });
    state.balls.push(ball);
}

/// Recompute speed after the sponsor set changed mid-round
pub fn set_difficulty(state: &mut GameState, difficulty: f64) {
    let difficulty = difficulty.max(1.0);
    state.round.difficulty = difficulty;
    if state.is_running() {
        state.round.speed_scale = state.rules.speed_scale(difficulty);
        log::debug!(
            "Difficulty now {:.2}, speed {:.2}",
            difficulty,
            state.round.speed_scale
        );
    }
}

/// Ball the autoplayer goes for: nearest the arena centre
fn idle_target(state: &GameState) -> Option<u32> {
    let center = Vec2::splat(ARENA_SIZE / 2.0);
    state
        .balls
        .iter()
        .min_by(|a, b| {
            a.pos
                .distance_squared(center)
                .partial_cmp(&b.pos.distance_squared(center))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|b| b.id)
}

/// Advance the simulation by `delta_ms` of wall time
pub fn tick(state: &mut GameState, input: &TickInput, delta_ms: u64) {
    state.clock_ms = state.clock_ms.saturating_add(delta_ms);

    if !state.is_running() {
        return;
    }

    if input.stop {
        end(state, EndReason::Stopped);
        return;
    }

    for &id in &input.hits {
        hit(state, id, input.verified);
        if !state.is_running() {
            return;
        }
    }

    let idle_due = state
        .timers
        .idle
        .advance(delta_ms)
        .min(u64::from(state.rules.max_substeps));
    if input.idle_mode {
        for _ in 0..idle_due {
            let Some(id) = idle_target(state) else {
                break;
            };
            hit(state, id, input.verified);
            if !state.is_running() {
                return;
            }
        }
    }

    let steps = state
        .timers
        .physics
        .advance(delta_ms)
        .min(u64::from(state.rules.max_substeps));
    for _ in 0..steps {
        advance(
            &mut state.balls,
            state.round.speed_scale,
            &state.rules.bounds,
        );
    }

    let seconds = state.timers.countdown.advance(delta_ms);
    for _ in 0..seconds {
        state.round.time_remaining = state.round.time_remaining.saturating_sub(1);
        state.events.push(GameEvent::CountdownTick {
            remaining: state.round.time_remaining,
        });
        if state.round.time_remaining == 0 {
            end(state, EndReason::Timeout);
            break;
        }
    }

    // Ensure deterministic ordering
    state.normalize_order();
}
