//! Rock Drift - A wrap-around arcade combat simulation core
//!
//! Core modules:
//! - `math`: 2D vector helpers and toroidal wrap
//! - `rng`: Seeded Mulberry32 generator and entity ids
//! - `sim`: Deterministic simulation (entities, per-frame step, lifecycle)
//! - `driver`: Headless frame driver (clock, frame seeds, input latch)
//! - `settings`: Runner configuration

pub mod driver;
pub mod math;
pub mod rng;
pub mod settings;
pub mod sim;

pub use driver::{Autopilot, Driver, FrameReport};
pub use settings::{Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    /// Longest frame the integrator will accept (stalls are clamped to this)
    pub const MAX_FRAME_MS: f64 = 50.0;

    /// Lives at the start of a run
    pub const STARTING_LIVES: u32 = 3;

    /// Craft defaults
    pub const CRAFT_RADIUS: f64 = 14.0;
    /// Turn rate (radians/s)
    pub const CRAFT_TURN_RATE: f64 = 3.6;
    /// Thrust acceleration along heading (pixels/s²)
    pub const CRAFT_THRUST: f64 = 280.0;
    /// Multiplicative velocity decay applied once per frame
    pub const CRAFT_FRICTION: f64 = 0.992;
    pub const CRAFT_MAX_SPEED: f64 = 420.0;

    /// Invincibility after losing a life
    pub const RESPAWN_INVINCIBLE_MS: f64 = 2_000.0;
    /// Invincibility after a hyperspace jump
    pub const HYPERSPACE_INVINCIBLE_MS: f64 = 600.0;
    /// Invincibility granted when a new wave spawns
    pub const LEVEL_INVINCIBLE_MS: f64 = 1_500.0;

    /// Projectile defaults
    pub const PROJECTILE_RADIUS: f64 = 2.0;
    pub const PROJECTILE_SPEED: f64 = 560.0;
    pub const PROJECTILE_LIFETIME_MS: f64 = 1_100.0;
    /// Gap between the craft hull and a fresh projectile
    pub const MUZZLE_OFFSET: f64 = 4.0;
    pub const FIRE_COOLDOWN_MS: f64 = 180.0;

    /// Obstacle silhouette
    pub const OBSTACLE_VERTICES: usize = 12;
    pub const OBSTACLE_SHAPE_MIN: f64 = 0.72;
    pub const OBSTACLE_SHAPE_MAX: f64 = 1.18;
    /// Spin band (radians/s, either direction)
    pub const OBSTACLE_MAX_SPIN: f64 = 1.2;
    /// Split kick magnitude band (pixels/s)
    pub const SPLIT_KICK_MIN: f64 = 20.0;
    pub const SPLIT_KICK_MAX: f64 = 60.0;

    /// Wave sizing
    pub const WAVE_BASE_COUNT: u32 = 4;
    pub const WAVE_GROWTH_PER_LEVEL: f64 = 0.75;
    pub const WAVE_MAX_COUNT: u32 = 12;
    /// No wave obstacle spawns closer than this to the craft
    pub const SPAWN_EXCLUSION_RADIUS: f64 = 150.0;
    /// Resample budget before a spawn position is accepted regardless
    pub const SPAWN_MAX_ATTEMPTS: u32 = 32;

    /// Effect lifetimes
    pub const OBSTACLE_EFFECT_MS: f64 = 500.0;
    pub const CRAFT_EFFECT_MS: f64 = 1_000.0;
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(std::f64::consts::TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= std::f64::consts::TAU {
        0.0
    } else {
        wrapped
    }
}
