//! Ball spawning and removal
//!
//! Spawning never invents advertisements: callers pass either the registered
//! set or the placeholder catalog.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::Ball;
use crate::ads::Advertisement;
use crate::settings::Settings;

/// Where and how fast new balls appear
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnArea {
    pub min: f32,
    pub max: f32,
    pub max_velocity: f32,
    pub size_min: f32,
    pub size_max: f32,
}

impl From<&Settings> for SpawnArea {
    fn from(settings: &Settings) -> Self {
        Self {
            min: settings.spawn_min,
            max: settings.spawn_max,
            max_velocity: settings.max_velocity,
            size_min: settings.ball_size_min,
            size_max: settings.ball_size_max,
        }
    }
}

/// Active advertisements ordered by bid, highest first (ties keep insertion order)
pub fn rank_by_bid(ads: &[Advertisement]) -> Vec<&Advertisement> {
    let mut ranked: Vec<&Advertisement> = ads.iter().filter(|a| a.active).collect();
    ranked.sort_by(|a, b| b.bid.total_cmp(&a.bid));
    ranked
}

/// Create one ball for `ad` at a random interior position and velocity
pub fn spawn_ball<R: Rng>(ad: &Advertisement, id: u32, area: &SpawnArea, rng: &mut R) -> Ball {
    let pos = Vec2::new(
        rng.random_range(area.min..area.max),
        rng.random_range(area.min..area.max),
    );
    let vel = Vec2::new(
        rng.random_range(-area.max_velocity..area.max_velocity),
        rng.random_range(-area.max_velocity..area.max_velocity),
    );
    let size = rng.random_range(area.size_min..area.size_max);
    Ball::from_ad(id, ad, pos, vel, size)
}

/// Spawn up to `capacity` balls from the highest bids
pub fn spawn_balls<R: Rng>(
    ads: &[Advertisement],
    capacity: usize,
    area: &SpawnArea,
    rng: &mut R,
    next_id: &mut u32,
) -> Vec<Ball> {
    rank_by_bid(ads)
        .into_iter()
        .take(capacity)
        .map(|ad| {
            let id = *next_id;
            *next_id += 1;
            let ball = spawn_ball(ad, id, area, rng);
            log::debug!(
                "Spawned ball {} for {} at ({:.1}, {:.1})",
                ball.id,
                ball.brand,
                ball.pos.x,
                ball.pos.y
            );
            ball
        })
        .collect()
}

/// Remove the ball with `id`; absent ids are a no-op
pub fn remove_ball(balls: &mut Vec<Ball>, id: u32) -> Option<Ball> {
    let index = balls.iter().position(|b| b.id == id)?;
    Some(balls.remove(index))
}
