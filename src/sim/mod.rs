//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time and per-frame seeds come in as arguments, never from the platform
//! - Seeded RNG only, drawn in a fixed order
//! - Snapshots are replaced, never mutated in place
//! - No rendering or platform dependencies

pub mod lifecycle;
pub mod spawn;
pub mod state;
pub mod tick;

pub use lifecycle::{derive_seed, initialize, reset, resize, start, toggle_pause};
pub use spawn::{create_obstacle, spawn_wave, split_obstacle, wave_size};
pub use state::{
    Craft, Effect, Input, Obstacle, Projectile, SizeTier, Status, Turn, World,
};
pub use tick::{StepOutcome, step};
