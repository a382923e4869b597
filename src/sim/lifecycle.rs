//! Run lifecycle: build, start, pause, resize, reset
//!
//! Pure snapshot transformations applied outside the per-frame step.

use std::f64::consts::FRAC_PI_2;

use super::spawn::spawn_wave;
use super::state::{Craft, Status, World};
use crate::consts::STARTING_LIVES;
use crate::math::wrap_position_euclid;
use crate::rng::Mulberry32;
use crate::wrap_angle;

/// Seed used when the caller doesn't supply one
pub fn derive_seed(now_ms: f64, width: f64, height: f64) -> u32 {
    let t = now_ms as u64;
    let mixed = (t as u32)
        ^ ((t >> 32) as u32)
        ^ (width as u32).wrapping_mul(73_856_093)
        ^ (height as u32).wrapping_mul(19_349_663);
    mixed.wrapping_mul(0x9E37_79B1)
}

fn valid_extents(width: f64, height: f64) -> bool {
    width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
}

/// Build a fresh run in the `Ready` state
///
/// Extents must be positive and finite.
pub fn initialize(width: f64, height: f64, now_ms: f64, seed: Option<u32>) -> World {
    debug_assert!(valid_extents(width, height), "bad extents {width}x{height}");
    let seed = seed.unwrap_or_else(|| derive_seed(now_ms, width, height));
    let mut rng = Mulberry32::new(seed);

    // Nose up in screen space (y grows downward)
    let craft = Craft::centered(width, height, wrap_angle(-FRAC_PI_2));
    let level = 1;
    let obstacles = spawn_wave(&mut rng, level, width, height, craft.pos);

    log::info!(
        "Initialized {}x{} world with seed {} ({} obstacles)",
        width,
        height,
        seed,
        obstacles.len()
    );

    World {
        status: Status::Ready,
        width,
        height,
        seed,
        started_at_ms: now_ms,
        now_ms,
        last_frame_ms: now_ms,
        lives: STARTING_LIVES,
        score: 0,
        level,
        craft,
        projectiles: Vec::new(),
        obstacles,
        effects: Vec::new(),
    }
}

/// Adopt new viewport extents, re-wrapping only the craft
///
/// Other entities wrap on their next integration step. Extents must be
/// positive and finite.
pub fn resize(world: &World, width: f64, height: f64) -> World {
    debug_assert!(valid_extents(width, height), "bad extents {width}x{height}");
    let mut next = world.clone();
    if world.width == width && world.height == height {
        return next;
    }
    next.width = width;
    next.height = height;
    next.craft.pos = wrap_position_euclid(next.craft.pos, width, height);
    log::debug!("Resized to {}x{}", width, height);
    next
}

/// Begin (or resume) simulation, resynchronizing the clock
pub fn start(world: &World, now_ms: f64) -> World {
    let mut next = world.clone();
    if world.status == Status::Running {
        return next;
    }
    next.status = Status::Running;
    next.started_at_ms = now_ms;
    next.now_ms = now_ms;
    next.last_frame_ms = now_ms;
    log::info!("Run started (from {:?})", world.status);
    next
}

/// Running ⇄ Paused; other states are left alone
pub fn toggle_pause(world: &World) -> World {
    let mut next = world.clone();
    next.status = match world.status {
        Status::Running => Status::Paused,
        Status::Paused => Status::Running,
        other => other,
    };
    if next.status != world.status {
        log::info!("{:?} -> {:?}", world.status, next.status);
    }
    next
}

/// Discard the run and rebuild it in the same viewport
pub fn reset(world: &World, now_ms: f64, seed: Option<u32>) -> World {
    log::info!("Resetting run (score was {})", world.score);
    initialize(world.width, world.height, now_ms, seed)
}
