//! Fixed-step ball motion with wall reflection
//!
//! Positions are never clamped. A step that lands on or past a wall moves
//! the ball there anyway and only flips the velocity component, so the
//! reflection takes effect from the next tick. A ball can therefore sit up
//! to one step outside the bounds.

use serde::{Deserialize, Serialize};

use super::state::Ball;
use crate::settings::Settings;

/// Reflecting walls on both axes of the normalized arena
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Bounds {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn crossed(&self, value: f32) -> bool {
        value <= self.min || value >= self.max
    }
}

impl From<&Settings> for Bounds {
    fn from(settings: &Settings) -> Self {
        Self::new(settings.boundary_min, settings.boundary_max)
    }
}

/// Move one ball by one tick
#[inline]
pub fn step_ball(ball: &mut Ball, speed_scale: f32, bounds: &Bounds) {
    let next = ball.pos + ball.vel * speed_scale;
    if bounds.crossed(next.x) {
        ball.vel.x = -ball.vel.x;
    }
    if bounds.crossed(next.y) {
        ball.vel.y = -ball.vel.y;
    }
    ball.pos = next;
}

/// Advance every ball by one physics tick
pub fn advance(balls: &mut [Ball], speed_scale: f32, bounds: &Bounds) {
    for ball in balls.iter_mut() {
        step_ball(ball, speed_scale, bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;

    fn ball(pos: Vec2, vel: Vec2) -> Ball {
        Ball {
            id: 1,
            pos,
            vel,
            size: 60.0,
            ad_id: 1,
            brand: "Acme".to_string(),
            logo: "acme.png".to_string(),
            bid: 1.0,
            points: None,
        }
    }

    const BOUNDS: Bounds = Bounds { min: 5.0, max: 95.0 };

    #[test]
    fn test_free_flight() {
        let mut balls = vec![ball(Vec2::new(50.0, 50.0), Vec2::new(0.5, -0.25))];
        advance(&mut balls, 2.0, &BOUNDS);
        assert_eq!(balls[0].pos, Vec2::new(51.0, 49.5));
        assert_eq!(balls[0].vel, Vec2::new(0.5, -0.25));
    }

    #[test]
    fn test_reflection_applies_next_tick() {
        let mut balls = vec![ball(Vec2::new(94.5, 50.0), Vec2::new(1.0, 0.0))];
        advance(&mut balls, 1.0, &BOUNDS);
        // Moved with the old velocity, past the wall, not clamped
        assert_eq!(balls[0].pos.x, 95.5);
        assert_eq!(balls[0].vel.x, -1.0);

        advance(&mut balls, 1.0, &BOUNDS);
        assert_eq!(balls[0].pos.x, 94.5);
        assert_eq!(balls[0].vel.x, -1.0);
    }

    #[test]
    fn test_landing_exactly_on_wall_reflects() {
        let mut balls = vec![ball(Vec2::new(50.0, 6.0), Vec2::new(0.0, -1.0))];
        advance(&mut balls, 1.0, &BOUNDS);
        assert_eq!(balls[0].pos.y, 5.0);
        assert_eq!(balls[0].vel.y, 1.0);
    }

    #[test]
    fn test_corner_flips_both_axes() {
        let mut balls = vec![ball(Vec2::new(94.0, 94.0), Vec2::new(0.8, 0.8))];
        advance(&mut balls, 2.0, &BOUNDS);
        assert_eq!(balls[0].vel, Vec2::new(-0.8, -0.8));
    }

    proptest! {
        #[test]
        fn prop_speed_magnitude_preserved(
            x in 10.0f32..90.0,
            y in 10.0f32..90.0,
            vx in -1.0f32..1.0,
            vy in -1.0f32..1.0,
            scale in 0.1f32..5.0,
            ticks in 1usize..400,
        ) {
            let mut balls = vec![ball(Vec2::new(x, y), Vec2::new(vx, vy))];
            for _ in 0..ticks {
                advance(&mut balls, scale, &BOUNDS);
                prop_assert_eq!(balls[0].vel.x.abs(), vx.abs());
                prop_assert_eq!(balls[0].vel.y.abs(), vy.abs());
            }
        }

        #[test]
        fn prop_overshoot_is_at_most_one_step(
            x in 10.0f32..90.0,
            y in 10.0f32..90.0,
            vx in -1.0f32..1.0,
            vy in -1.0f32..1.0,
            scale in 0.1f32..5.0,
            ticks in 1usize..400,
        ) {
            let mut balls = vec![ball(Vec2::new(x, y), Vec2::new(vx, vy))];
            let slack_x = vx.abs() * scale + 1e-3;
            let slack_y = vy.abs() * scale + 1e-3;
            for _ in 0..ticks {
                advance(&mut balls, scale, &BOUNDS);
                let pos = balls[0].pos;
                prop_assert!(pos.x >= BOUNDS.min - slack_x && pos.x <= BOUNDS.max + slack_x);
                prop_assert!(pos.y >= BOUNDS.min - slack_y && pos.y <= BOUNDS.max + slack_y);
            }
        }
    }
}
