//! World snapshot and entity types
//!
//! Everything a renderer or HUD reads lives here. Snapshots are values: the
//! engine and lifecycle functions return new ones and never touch the input.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::rng::EntityId;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Built but not started; frames only refresh timestamps
    Ready,
    /// Active gameplay
    Running,
    /// Frozen; timestamps keep tracking the clock
    Paused,
    /// Run ended (terminal)
    GameOver,
}

/// Obstacle size tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    Large,
    Medium,
    Small,
}

impl SizeTier {
    /// Collision radius; only these three radii exist
    pub fn radius(self) -> f64 {
        match self {
            SizeTier::Large => 56.0,
            SizeTier::Medium => 32.0,
            SizeTier::Small => 18.0,
        }
    }

    /// Points for destroying an obstacle of this tier
    pub fn score(self) -> u64 {
        match self {
            SizeTier::Large => 20,
            SizeTier::Medium => 50,
            SizeTier::Small => 100,
        }
    }

    /// Speed band (pixels/s); smaller tiers move faster
    pub fn speed_range(self) -> (f64, f64) {
        match self {
            SizeTier::Large => (28.0, 70.0),
            SizeTier::Medium => (55.0, 110.0),
            SizeTier::Small => (90.0, 160.0),
        }
    }

    /// Offspring tier on split (None = destroyed outright)
    pub fn split(self) -> Option<SizeTier> {
        match self {
            SizeTier::Large => Some(SizeTier::Medium),
            SizeTier::Medium => Some(SizeTier::Small),
            SizeTier::Small => None,
        }
    }

    /// Max positional jitter for offspring spawned from this tier
    pub fn split_jitter(self) -> f64 {
        match self {
            SizeTier::Large => 14.0,
            SizeTier::Medium => 8.0,
            SizeTier::Small => 0.0,
        }
    }
}

/// The player's craft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Craft {
    pub pos: DVec2,
    pub vel: DVec2,
    /// Heading (radians, 0 = +x), kept in [0, 2π)
    pub heading: f64,
    pub radius: f64,
    /// Obstacle collisions are ignored while now < this
    pub invincible_until_ms: f64,
    /// Firing is allowed once now >= this
    pub fire_ready_at_ms: f64,
}

impl Craft {
    /// Fresh craft at rest in the viewport center
    pub fn centered(width: f64, height: f64, heading: f64) -> Self {
        Self {
            pos: DVec2::new(width / 2.0, height / 2.0),
            vel: DVec2::ZERO,
            heading,
            radius: CRAFT_RADIUS,
            invincible_until_ms: 0.0,
            fire_ready_at_ms: 0.0,
        }
    }

    #[inline]
    pub fn is_invincible(&self, now_ms: f64) -> bool {
        now_ms < self.invincible_until_ms
    }

    #[inline]
    pub fn can_fire(&self, now_ms: f64) -> bool {
        now_ms >= self.fire_ready_at_ms
    }
}

/// A projectile fired by the craft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    pub spawned_at_ms: f64,
}

impl Projectile {
    #[inline]
    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms - self.spawned_at_ms >= PROJECTILE_LIFETIME_MS
    }
}

/// A fragmenting obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub pos: DVec2,
    pub vel: DVec2,
    /// Rotation (radians, [0, 2π))
    pub rotation: f64,
    /// Angular velocity (radians/s)
    pub spin: f64,
    pub radius: f64,
    pub size: SizeTier,
    /// Per-vertex radial scale factors, fixed at creation
    pub shape: [f64; OBSTACLE_VERTICES],
}

/// Cosmetic explosion marker (never collides)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: EntityId,
    pub pos: DVec2,
    pub spawned_at_ms: f64,
    pub duration_ms: f64,
}

impl Effect {
    #[inline]
    pub fn is_finished(&self, now_ms: f64) -> bool {
        now_ms - self.spawned_at_ms >= self.duration_ms
    }

    /// Progress through the effect, 0 at spawn and 1 when finished
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.spawned_at_ms) / self.duration_ms).clamp(0.0, 1.0)
    }
}

/// Rotation request for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Turn {
    /// Counter-clockwise in screen space (-1)
    Left,
    #[default]
    None,
    /// Clockwise in screen space (+1)
    Right,
}

impl Turn {
    /// Map a raw axis value by sign
    pub fn from_axis(axis: i32) -> Self {
        match axis.signum() {
            -1 => Turn::Left,
            1 => Turn::Right,
            _ => Turn::None,
        }
    }

    #[inline]
    pub fn direction(self) -> f64 {
        match self {
            Turn::Left => -1.0,
            Turn::None => 0.0,
            Turn::Right => 1.0,
        }
    }
}

/// Input flags for a single frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub thrust: bool,
    pub turn: Turn,
    /// Held fire; spawn rate is bounded by the cooldown
    pub fire: bool,
    /// One-shot request; the caller clears it after each frame it was set
    pub hyperspace: bool,
}

/// Complete world snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub status: Status,
    pub width: f64,
    pub height: f64,
    /// Seed the run was built from
    pub seed: u32,
    /// Set at initialization, resynchronized on start
    pub started_at_ms: f64,
    pub now_ms: f64,
    pub last_frame_ms: f64,
    pub lives: u32,
    pub score: u64,
    pub level: u32,
    pub craft: Craft,
    pub projectiles: Vec<Projectile>,
    pub obstacles: Vec<Obstacle>,
    pub effects: Vec<Effect>,
}

impl World {
    #[inline]
    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    /// Milliseconds of the current run since the last start
    pub fn elapsed_ms(&self) -> f64 {
        (self.now_ms - self.started_at_ms).max(0.0)
    }
}
