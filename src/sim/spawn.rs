//! Obstacle generation, split policy and wave spawning
//!
//! Every function here draws from the frame generator in a fixed order. The
//! order is documented per function because replays depend on it.

use glam::DVec2;

use super::state::{Obstacle, SizeTier};
use crate::consts::*;
use crate::math::{add, distance, from_angle, random_in_range, scale, wrap_position};
use crate::rng::Mulberry32;
use std::f64::consts::TAU;

/// Number of large obstacles in the wave for `level`
pub fn wave_size(level: u32) -> u32 {
    let growth = (level as f64 * WAVE_GROWTH_PER_LEVEL).floor() as u32;
    (WAVE_BASE_COUNT + growth).min(WAVE_MAX_COUNT)
}

/// Build one obstacle at `pos`
///
/// Draws: id, heading, speed, rotation, spin, then one per silhouette vertex.
pub fn create_obstacle(rng: &mut Mulberry32, size: SizeTier, pos: DVec2) -> Obstacle {
    let id = rng.next_id();
    let heading = rng.next_f64() * TAU;
    let (speed_min, speed_max) = size.speed_range();
    let speed = random_in_range(rng, speed_min, speed_max);
    let rotation = rng.next_f64() * TAU;
    let spin = random_in_range(rng, -OBSTACLE_MAX_SPIN, OBSTACLE_MAX_SPIN);

    let mut shape = [0.0; OBSTACLE_VERTICES];
    for vertex in shape.iter_mut() {
        *vertex = random_in_range(rng, OBSTACLE_SHAPE_MIN, OBSTACLE_SHAPE_MAX);
    }

    Obstacle {
        id,
        pos,
        vel: scale(from_angle(heading), speed),
        rotation,
        spin,
        radius: size.radius(),
        size,
        shape,
    }
}

/// Offspring of a destroyed obstacle (empty for the smallest tier)
///
/// Per child draws: jitter angle, jitter distance, `create_obstacle`, kick
/// angle, kick magnitude.
pub fn split_obstacle(
    rng: &mut Mulberry32,
    parent: &Obstacle,
    width: f64,
    height: f64,
) -> Vec<Obstacle> {
    let Some(child_size) = parent.size.split() else {
        return Vec::new();
    };

    let jitter_max = parent.size.split_jitter();
    let mut children = Vec::with_capacity(2);
    for _ in 0..2 {
        let jitter_angle = rng.next_f64() * TAU;
        let jitter = rng.next_f64() * jitter_max;
        let pos = wrap_position(add(parent.pos, scale(from_angle(jitter_angle), jitter)), width, height);

        let mut child = create_obstacle(rng, child_size, pos);

        let kick_angle = rng.next_f64() * TAU;
        let kick = random_in_range(rng, SPLIT_KICK_MIN, SPLIT_KICK_MAX);
        child.vel = add(add(parent.vel, child.vel), scale(from_angle(kick_angle), kick));

        children.push(child);
    }
    children
}

/// Sample a spawn point away from the craft
///
/// Draws x then y per attempt. Gives up after `SPAWN_MAX_ATTEMPTS` and keeps
/// the last sample, so a viewport smaller than the exclusion zone still fills.
fn sample_spawn_point(rng: &mut Mulberry32, width: f64, height: f64, avoid: DVec2) -> DVec2 {
    let mut pos = DVec2::ZERO;
    for _ in 0..SPAWN_MAX_ATTEMPTS {
        pos = DVec2::new(rng.next_f64() * width, rng.next_f64() * height);
        if distance(pos, avoid) >= SPAWN_EXCLUSION_RADIUS {
            break;
        }
    }
    pos
}

/// Spawn the large-obstacle wave for `level`
pub fn spawn_wave(
    rng: &mut Mulberry32,
    level: u32,
    width: f64,
    height: f64,
    avoid: DVec2,
) -> Vec<Obstacle> {
    let count = wave_size(level);
    log::debug!("Spawning wave for level {} ({} obstacles)", level, count);

    (0..count)
        .map(|_| {
            let pos = sample_spawn_point(rng, width, height, avoid);
            create_obstacle(rng, SizeTier::Large, pos)
        })
        .collect()
}
