//! Headless frame driver
//!
//! Owns what the simulation refuses to: the clock, the per-frame seed, and the
//! latched input. Rendering front ends drive the same way, one `advance` per
//! displayed frame.

use std::f64::consts::{PI, TAU};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::math::distance;
use crate::rng::frame_seed;
use crate::sim::{self, Input, Status, Turn, World};
use crate::wrap_angle;

/// What happened during one driven frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub status: Status,
    pub did_craft_explode: bool,
    pub did_level_advance: bool,
}

/// Frame loop state around a `World`
#[derive(Debug, Clone)]
pub struct Driver {
    world: World,
    input: Input,
    clock_ms: f64,
    frame: u64,
    explosions: u32,
    level_advances: u32,
}

impl Driver {
    pub fn new(width: f64, height: f64, now_ms: f64, seed: Option<u32>) -> Self {
        Self {
            world: sim::initialize(width, height, now_ms, seed),
            input: Input::default(),
            clock_ms: now_ms,
            frame: 0,
            explosions: 0,
            level_advances: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn explosions(&self) -> u32 {
        self.explosions
    }

    pub fn level_advances(&self) -> u32 {
        self.level_advances
    }

    /// Replace the held input (hyperspace stays latched until consumed)
    pub fn set_input(&mut self, input: Input) {
        let hyperspace = self.input.hyperspace || input.hyperspace;
        self.input = Input { hyperspace, ..input };
    }

    pub fn request_hyperspace(&mut self) {
        self.input.hyperspace = true;
    }

    pub fn start(&mut self) {
        self.world = sim::start(&self.world, self.clock_ms);
    }

    pub fn toggle_pause(&mut self) {
        self.world = sim::toggle_pause(&self.world);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.world = sim::resize(&self.world, width, height);
    }

    /// Throw the run away and rebuild it (frame counter keeps counting)
    pub fn reset(&mut self, seed: Option<u32>) {
        self.world = sim::reset(&self.world, self.clock_ms, seed);
        self.input = Input::default();
    }

    /// Move the clock forward and run one frame
    pub fn advance(&mut self, elapsed_ms: f64) -> FrameReport {
        self.clock_ms += elapsed_ms.max(0.0);
        let seed = frame_seed(self.world.seed, self.frame);

        let outcome = sim::step(&self.world, &self.input, self.clock_ms, seed);
        // One-shot request: consumed by the frame whether or not it fired
        self.input.hyperspace = false;

        if outcome.did_craft_explode {
            self.explosions += 1;
        }
        if outcome.did_level_advance {
            self.level_advances += 1;
        }

        let report = FrameReport {
            frame: self.frame,
            status: outcome.world.status,
            did_craft_explode: outcome.did_craft_explode,
            did_level_advance: outcome.did_level_advance,
        };
        self.world = outcome.world;
        self.frame += 1;
        report
    }
}

/// Scripted pilot for demo runs
///
/// Turns toward the nearest obstacle, fires when roughly lined up, and mixes
/// in seeded noise so runs differ per seed but replay exactly.
#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: Pcg32,
}

impl Autopilot {
    /// Heading error (radians) under which the pilot opens fire
    const AIM_TOLERANCE: f64 = 0.25;
    /// Jump away when an obstacle edge is this close to the hull
    const PANIC_DISTANCE: f64 = 24.0;

    pub fn new(seed: u32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed as u64),
        }
    }

    pub fn next_input(&mut self, world: &World) -> Input {
        let craft = &world.craft;
        let Some(target) = world.obstacles.iter().min_by(|a, b| {
            distance(a.pos, craft.pos).total_cmp(&distance(b.pos, craft.pos))
        }) else {
            return Input::default();
        };

        let to_target = target.pos - craft.pos;
        let bearing = wrap_angle(to_target.y.atan2(to_target.x));
        let error = wrap_angle(bearing - craft.heading);
        let on_target = |tolerance: f64| error < tolerance || error > TAU - tolerance;
        let turn = if on_target(Self::AIM_TOLERANCE / 2.0) {
            Turn::None
        } else if error < PI {
            Turn::Right
        } else {
            Turn::Left
        };
        let aligned = on_target(Self::AIM_TOLERANCE);

        let gap = to_target.length() - target.radius - craft.radius;
        let hyperspace = gap < Self::PANIC_DISTANCE && self.rng.random_bool(0.5);

        Input {
            thrust: gap > 200.0 && self.rng.random_bool(0.15),
            turn,
            fire: aligned,
            hyperspace,
        }
    }
}
