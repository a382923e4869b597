//! Per-frame simulation step
//!
//! Core game loop that advances a snapshot deterministically. The caller owns
//! time and randomness: the same (world, input, now, seed) always yields the
//! same outcome.

use super::spawn::{spawn_wave, split_obstacle};
use super::state::{Craft, Effect, Input, Obstacle, Projectile, Status, World};
use crate::consts::*;
use crate::math::{add, distance, from_angle, magnitude, normalize, scale, wrap_position};
use crate::rng::Mulberry32;
use crate::wrap_angle;

/// Result of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub world: World,
    pub did_craft_explode: bool,
    pub did_level_advance: bool,
}

impl StepOutcome {
    fn quiet(world: World) -> Self {
        Self {
            world,
            did_craft_explode: false,
            did_level_advance: false,
        }
    }
}

/// Advance the world by one rendered frame
///
/// Only `Running` worlds simulate; every other status just tracks the clock
/// so the first frame after a resume doesn't see a huge delta.
pub fn step(prev: &World, input: &Input, now_ms: f64, frame_seed: u32) -> StepOutcome {
    let mut world = prev.clone();

    if !world.is_running() {
        world.now_ms = now_ms;
        world.last_frame_ms = now_ms;
        return StepOutcome::quiet(world);
    }

    let dt = (now_ms - world.last_frame_ms).clamp(0.0, MAX_FRAME_MS) / 1000.0;
    world.now_ms = now_ms;
    world.last_frame_ms = now_ms;

    let mut rng = Mulberry32::new(frame_seed);
    let (width, height) = (world.width, world.height);

    integrate_craft(&mut world.craft, input, dt, width, height);

    world.projectiles.retain(|p| !p.is_expired(now_ms));
    for projectile in &mut world.projectiles {
        projectile.pos = wrap_position(add(projectile.pos, scale(projectile.vel, dt)), width, height);
    }

    for obstacle in &mut world.obstacles {
        obstacle.pos = wrap_position(add(obstacle.pos, scale(obstacle.vel, dt)), width, height);
        obstacle.rotation = wrap_angle(obstacle.rotation + obstacle.spin * dt);
    }

    world.effects.retain(|e| !e.is_finished(now_ms));

    if input.hyperspace && !world.craft.is_invincible(now_ms) {
        let x = rng.next_f64() * width;
        let y = rng.next_f64() * height;
        world.craft.pos = glam::DVec2::new(x, y);
        world.craft.invincible_until_ms = now_ms + HYPERSPACE_INVINCIBLE_MS;
        log::debug!("Hyperspace to ({:.1}, {:.1})", x, y);
    }

    if input.fire && world.craft.can_fire(now_ms) {
        let projectile = fire_projectile(&mut rng, &world.craft, now_ms, width, height);
        world.projectiles.push(projectile);
        world.craft.fire_ready_at_ms = now_ms + FIRE_COOLDOWN_MS;
    }

    resolve_projectile_hits(&mut world, &mut rng);

    if !world.craft.is_invincible(now_ms) {
        let craft = &world.craft;
        let struck = world
            .obstacles
            .iter()
            .any(|o| distance(o.pos, craft.pos) <= o.radius + craft.radius);
        if struck {
            lose_life(&mut world, &mut rng);
            return StepOutcome {
                world,
                did_craft_explode: true,
                did_level_advance: false,
            };
        }
    }

    if world.obstacles.is_empty() {
        world.level += 1;
        world.obstacles = spawn_wave(&mut rng, world.level, width, height, world.craft.pos);
        world.craft.invincible_until_ms = now_ms + LEVEL_INVINCIBLE_MS;
        log::info!(
            "Level {} ({} obstacles, score {})",
            world.level,
            world.obstacles.len(),
            world.score
        );
        return StepOutcome {
            world,
            did_craft_explode: false,
            did_level_advance: true,
        };
    }

    StepOutcome::quiet(world)
}

fn integrate_craft(craft: &mut Craft, input: &Input, dt: f64, width: f64, height: f64) {
    craft.heading = wrap_angle(craft.heading + input.turn.direction() * CRAFT_TURN_RATE * dt);

    if input.thrust {
        craft.vel = add(craft.vel, scale(scale(from_angle(craft.heading), CRAFT_THRUST), dt));
    }
    craft.vel = scale(craft.vel, CRAFT_FRICTION);

    if magnitude(craft.vel) > CRAFT_MAX_SPEED {
        craft.vel = scale(normalize(craft.vel), CRAFT_MAX_SPEED);
    }

    craft.pos = wrap_position(add(craft.pos, scale(craft.vel, dt)), width, height);
}

/// Draws: id
fn fire_projectile(
    rng: &mut Mulberry32,
    craft: &Craft,
    now_ms: f64,
    width: f64,
    height: f64,
) -> Projectile {
    let dir = from_angle(craft.heading);
    let nose = add(craft.pos, scale(dir, craft.radius + MUZZLE_OFFSET));
    Projectile {
        id: rng.next_id(),
        pos: wrap_position(nose, width, height),
        vel: add(craft.vel, scale(dir, PROJECTILE_SPEED)),
        radius: PROJECTILE_RADIUS,
        spawned_at_ms: now_ms,
    }
}

/// Projectile vs obstacle pass
///
/// First overlap in iteration order wins; there is no closest-hit selection.
/// An obstacle takes at most one projectile per frame and a projectile
/// destroys at most one obstacle.
fn resolve_projectile_hits(world: &mut World, rng: &mut Mulberry32) {
    let mut obstacle_hit = vec![false; world.obstacles.len()];
    let mut projectile_spent = vec![false; world.projectiles.len()];
    let mut spawned: Vec<Obstacle> = Vec::new();

    for (p_idx, projectile) in world.projectiles.iter().enumerate() {
        for (o_idx, obstacle) in world.obstacles.iter().enumerate() {
            if obstacle_hit[o_idx] {
                continue;
            }
            if distance(projectile.pos, obstacle.pos) > projectile.radius + obstacle.radius {
                continue;
            }

            obstacle_hit[o_idx] = true;
            projectile_spent[p_idx] = true;

            spawned.extend(split_obstacle(rng, obstacle, world.width, world.height));
            world.score += obstacle.size.score();
            world.effects.push(Effect {
                id: rng.next_id(),
                pos: obstacle.pos,
                spawned_at_ms: world.now_ms,
                duration_ms: OBSTACLE_EFFECT_MS,
            });
            log::debug!(
                "Projectile {} destroyed {:?} obstacle {}",
                projectile.id,
                obstacle.size,
                obstacle.id
            );
            break;
        }
    }

    if !obstacle_hit.contains(&true) {
        return;
    }

    let mut spent = projectile_spent.into_iter();
    world.projectiles.retain(|_| !spent.next().unwrap_or(false));
    let mut hit = obstacle_hit.into_iter();
    world.obstacles.retain(|_| !hit.next().unwrap_or(false));
    world.obstacles.extend(spawned);
}

/// Craft struck: explosion, then respawn or game over
///
/// Draws: effect id
fn lose_life(world: &mut World, rng: &mut Mulberry32) {
    let now_ms = world.now_ms;
    world.effects.push(Effect {
        id: rng.next_id(),
        pos: world.craft.pos,
        spawned_at_ms: now_ms,
        duration_ms: CRAFT_EFFECT_MS,
    });
    world.projectiles.clear();

    if world.lives <= 1 {
        world.lives = 0;
        world.status = Status::GameOver;
        log::info!("Game over (score {}, level {})", world.score, world.level);
        return;
    }

    world.lives -= 1;
    let heading = world.craft.heading;
    world.craft = Craft::centered(world.width, world.height, heading);
    world.craft.invincible_until_ms = now_ms + RESPAWN_INVINCIBLE_MS;
    world.craft.fire_ready_at_ms = now_ms;
    log::info!("Craft destroyed, {} lives left", world.lives);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::EntityId;
    use crate::sim::lifecycle::{initialize, start, toggle_pause};
    use crate::sim::spawn::{create_obstacle, wave_size};
    use crate::sim::state::{SizeTier, Turn};
    use glam::DVec2;
    use proptest::prelude::*;

    const FRAME: f64 = 16.0;

    fn running_world(seed: u32) -> World {
        let world = initialize(800.0, 600.0, 1_000.0, Some(seed));
        start(&world, 1_000.0)
    }

    fn obstacle_at(size: SizeTier, pos: DVec2) -> Obstacle {
        let mut rng = Mulberry32::new(99);
        let mut o = create_obstacle(&mut rng, size, pos);
        o.vel = DVec2::ZERO;
        o.spin = 0.0;
        o
    }

    fn projectile_at(pos: DVec2, now_ms: f64) -> Projectile {
        Projectile {
            id: EntityId("shot0000".into()),
            pos,
            vel: DVec2::ZERO,
            radius: PROJECTILE_RADIUS,
            spawned_at_ms: now_ms,
        }
    }

    /// A running world with one stationary obstacle and a projectile on it,
    /// craft parked far away
    fn hit_setup(size: SizeTier) -> World {
        let mut world = running_world(5);
        world.craft.pos = DVec2::new(50.0, 50.0);
        world.obstacles = vec![obstacle_at(size, DVec2::new(600.0, 400.0))];
        world.obstacles.push(obstacle_at(SizeTier::Large, DVec2::new(200.0, 500.0)));
        world.projectiles = vec![projectile_at(DVec2::new(600.0, 400.0), 1_000.0)];
        world
    }

    #[test]
    fn test_end_to_end_first_frame() {
        let world = initialize(800.0, 600.0, 0.0, Some(1));
        let world = start(&world, 0.0);
        let out = step(&world, &Input::default(), FRAME, 1);

        assert_eq!(out.world.status, Status::Running);
        assert_eq!(out.world.elapsed_ms(), FRAME);
        assert_eq!(out.world.craft.pos, world.craft.pos);
        assert!(!out.did_craft_explode);
        assert!(!out.did_level_advance);
        for (before, after) in world.obstacles.iter().zip(&out.world.obstacles) {
            let expected =
                wrap_position(before.pos + before.vel * (FRAME / 1000.0), 800.0, 600.0);
            assert!((after.pos - expected).length() < 1e-9);
        }
    }

    #[test]
    fn test_determinism() {
        let world = running_world(99999);
        let input = Input {
            thrust: true,
            turn: Turn::Left,
            fire: true,
            hyperspace: true,
        };
        let a = step(&world, &input, 1_016.0, 4242);
        let b = step(&world, &input, 1_016.0, 4242);
        assert_eq!(a, b);
    }

    #[test]
    fn test_previous_snapshot_untouched() {
        let world = running_world(3);
        let copy = world.clone();
        let input = Input {
            fire: true,
            thrust: true,
            ..Default::default()
        };
        let _ = step(&world, &input, 1_016.0, 1);
        assert_eq!(world, copy);
    }

    #[test]
    fn test_not_running_only_refreshes_timestamps() {
        let ready = initialize(800.0, 600.0, 0.0, Some(8));
        let input = Input {
            thrust: true,
            fire: true,
            hyperspace: true,
            turn: Turn::Right,
        };
        let out = step(&ready, &input, 500.0, 1);
        assert_eq!(out.world.now_ms, 500.0);
        assert_eq!(out.world.last_frame_ms, 500.0);
        let mut expected = ready.clone();
        expected.now_ms = 500.0;
        expected.last_frame_ms = 500.0;
        assert_eq!(out.world, expected);

        let paused = toggle_pause(&running_world(8));
        let out = step(&paused, &input, 9_000.0, 1);
        assert_eq!(out.world.status, Status::Paused);
        assert_eq!(out.world.obstacles, paused.obstacles);
        assert_eq!(out.world.craft, paused.craft);
        assert_eq!(out.world.last_frame_ms, 9_000.0);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut world = running_world(4);
        world.obstacles = vec![obstacle_at(SizeTier::Large, DVec2::new(100.0, 100.0))];
        world.obstacles[0].vel = DVec2::new(100.0, 0.0);
        let out = step(&world, &Input::default(), 1_000.0 + 10_000.0, 1);
        // 50ms at 100 px/s
        assert!((out.world.obstacles[0].pos.x - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_thrust_and_turn() {
        let world = running_world(6);
        let input = Input {
            thrust: true,
            turn: Turn::Right,
            ..Default::default()
        };
        let out = step(&world, &input, 1_016.0, 1);
        let craft = &out.world.craft;
        let dt = FRAME / 1000.0;
        let expected_heading = wrap_angle(world.craft.heading + CRAFT_TURN_RATE * dt);
        assert!((craft.heading - expected_heading).abs() < 1e-12);
        let expected_speed = CRAFT_THRUST * dt * CRAFT_FRICTION;
        assert!((craft.vel.length() - expected_speed).abs() < 1e-9);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut world = running_world(6);
        world.craft.vel = DVec2::new(10_000.0, 0.0);
        world.craft.invincible_until_ms = f64::MAX;
        let out = step(&world, &Input::default(), 1_016.0, 1);
        assert!((out.world.craft.vel.length() - CRAFT_MAX_SPEED).abs() < 1e-9);
    }

    #[test]
    fn test_heading_stays_wrapped() {
        let mut world = running_world(6);
        world.craft.heading = 0.001;
        let input = Input {
            turn: Turn::Left,
            ..Default::default()
        };
        let out = step(&world, &input, 1_016.0, 1);
        let h = out.world.craft.heading;
        assert!((0.0..std::f64::consts::TAU).contains(&h));
        assert!(h > 6.0);
    }

    /// Running world whose only obstacle sits in a corner, clear of any shot
    fn quiet_world(seed: u32) -> World {
        let mut world = running_world(seed);
        world.obstacles = vec![obstacle_at(SizeTier::Small, DVec2::new(10.0, 10.0))];
        world
    }

    #[test]
    fn test_fire_rate_gate() {
        let world = quiet_world(12);
        let fire = Input {
            fire: true,
            ..Default::default()
        };
        let first = step(&world, &fire, 1_000.0, 1);
        assert_eq!(first.world.projectiles.len(), 1);
        let second = step(&first.world, &fire, 1_100.0, 2);
        assert_eq!(second.world.projectiles.len(), 1);
        let third = step(&second.world, &fire, 1_180.0, 3);
        assert_eq!(third.world.projectiles.len(), 2);
    }

    #[test]
    fn test_projectile_spawns_at_nose() {
        let world = quiet_world(12);
        let fire = Input {
            fire: true,
            ..Default::default()
        };
        let out = step(&world, &fire, 1_000.0, 1);
        let p = &out.world.projectiles[0];
        let craft = &out.world.craft;
        let offset = craft.radius + MUZZLE_OFFSET;
        assert!((distance(p.pos, craft.pos) - offset).abs() < 1e-9);
        assert!(((p.vel - craft.vel).length() - PROJECTILE_SPEED).abs() < 1e-9);
        assert_eq!(out.world.craft.fire_ready_at_ms, 1_000.0 + FIRE_COOLDOWN_MS);
    }

    #[test]
    fn test_projectiles_expire() {
        let mut world = running_world(12);
        world.projectiles = vec![projectile_at(DVec2::new(10.0, 10.0), 0.0)];
        world.last_frame_ms = PROJECTILE_LIFETIME_MS - 10.0;
        let out = step(&world, &Input::default(), PROJECTILE_LIFETIME_MS, 1);
        assert!(out.world.projectiles.is_empty());
    }

    #[test]
    fn test_effects_expire() {
        let mut world = running_world(12);
        world.effects = vec![Effect {
            id: EntityId("fx".into()),
            pos: DVec2::ZERO,
            spawned_at_ms: 900.0,
            duration_ms: 100.0,
        }];
        let out = step(&world, &Input::default(), 1_000.0, 1);
        assert!(out.world.effects.is_empty());
    }

    #[test]
    fn test_split_conservation() {
        for (size, score, children) in [
            (SizeTier::Large, 20, Some(SizeTier::Medium)),
            (SizeTier::Medium, 50, Some(SizeTier::Small)),
            (SizeTier::Small, 100, None),
        ] {
            let world = hit_setup(size);
            let out = step(&world, &Input::default(), 1_000.0, 17);
            assert_eq!(out.world.score, score);
            assert!(out.world.projectiles.is_empty());
            assert_eq!(out.world.effects.len(), 1);

            let offspring: Vec<_> = out.world.obstacles[1..].iter().collect();
            match children {
                Some(tier) => {
                    assert_eq!(offspring.len(), 2);
                    assert!(offspring.iter().all(|o| o.size == tier));
                }
                None => assert!(offspring.is_empty()),
            }
        }
    }

    #[test]
    fn test_obstacle_hit_at_most_once_per_frame() {
        let mut world = hit_setup(SizeTier::Small);
        world.projectiles.push(projectile_at(DVec2::new(601.0, 400.0), 1_000.0));
        let out = step(&world, &Input::default(), 1_000.0, 17);
        assert_eq!(out.world.score, 100);
        // The second projectile had no unhit obstacle left to strike
        assert_eq!(out.world.projectiles.len(), 1);
    }

    #[test]
    fn test_projectile_destroys_at_most_one_obstacle() {
        let mut world = hit_setup(SizeTier::Small);
        world.obstacles[1] = obstacle_at(SizeTier::Small, DVec2::new(605.0, 400.0));
        world.obstacles.push(obstacle_at(SizeTier::Large, DVec2::new(200.0, 100.0)));
        let out = step(&world, &Input::default(), 1_000.0, 17);
        assert_eq!(out.world.score, 100);
        assert_eq!(out.world.obstacles.len(), 2);
    }

    #[test]
    fn test_invincibility_gate() {
        let mut world = running_world(21);
        world.craft.invincible_until_ms = 2_000.0;
        world.obstacles = vec![obstacle_at(SizeTier::Large, world.craft.pos)];
        let out = step(&world, &Input::default(), 1_016.0, 1);
        assert!(!out.did_craft_explode);
        assert_eq!(out.world.lives, world.lives);
    }

    #[test]
    fn test_collision_respawns_craft() {
        let mut world = running_world(21);
        world.craft.invincible_until_ms = 0.0;
        world.craft.heading = 1.25;
        world.craft.pos = DVec2::new(100.0, 100.0);
        world.craft.vel = DVec2::new(30.0, 0.0);
        world.obstacles = vec![obstacle_at(SizeTier::Large, DVec2::new(110.0, 100.0))];
        world.projectiles = vec![projectile_at(DVec2::new(700.0, 500.0), 1_000.0)];

        let out = step(&world, &Input::default(), 1_016.0, 1);
        assert!(out.did_craft_explode);
        assert!(!out.did_level_advance);
        assert_eq!(out.world.lives, STARTING_LIVES - 1);
        assert_eq!(out.world.status, Status::Running);
        assert_eq!(out.world.craft.pos, DVec2::new(400.0, 300.0));
        assert_eq!(out.world.craft.vel, DVec2::ZERO);
        assert_eq!(out.world.craft.heading, 1.25);
        assert_eq!(
            out.world.craft.invincible_until_ms,
            1_016.0 + RESPAWN_INVINCIBLE_MS
        );
        assert!(out.world.projectiles.is_empty());
        assert_eq!(out.world.obstacles.len(), 1);
        assert_eq!(out.world.effects.len(), 1);
    }

    #[test]
    fn test_last_life_is_game_over() {
        let mut world = running_world(21);
        world.lives = 1;
        world.craft.invincible_until_ms = 0.0;
        world.obstacles = vec![obstacle_at(SizeTier::Medium, world.craft.pos)];
        world.projectiles = vec![projectile_at(DVec2::new(10.0, 10.0), 1_000.0)];

        let out = step(&world, &Input::default(), 1_016.0, 1);
        assert!(out.did_craft_explode);
        assert_eq!(out.world.lives, 0);
        assert_eq!(out.world.status, Status::GameOver);
        assert!(out.world.projectiles.is_empty());
        assert_eq!(out.world.obstacles.len(), 1);

        // Terminal: further frames change nothing but time
        let after = step(&out.world, &Input::default(), 2_000.0, 2);
        assert_eq!(after.world.status, Status::GameOver);
        assert_eq!(after.world.obstacles, out.world.obstacles);
    }

    #[test]
    fn test_level_advance() {
        let mut world = running_world(31);
        world.craft.pos = DVec2::new(50.0, 50.0);
        world.obstacles = vec![obstacle_at(SizeTier::Small, DVec2::new(600.0, 400.0))];
        world.projectiles = vec![projectile_at(DVec2::new(600.0, 400.0), 1_000.0)];

        let out = step(&world, &Input::default(), 1_016.0, 1);
        assert!(out.did_level_advance);
        assert!(!out.did_craft_explode);
        assert_eq!(out.world.level, 2);
        assert_eq!(out.world.obstacles.len() as u32, wave_size(2));
        assert!(out.world.obstacles.iter().all(|o| o.size == SizeTier::Large));
        assert_eq!(out.world.score, 100);
        assert_eq!(
            out.world.craft.invincible_until_ms,
            1_016.0 + LEVEL_INVINCIBLE_MS
        );
    }

    #[test]
    fn test_hyperspace_teleports_and_keeps_velocity() {
        let mut world = running_world(41);
        world.craft.invincible_until_ms = 0.0;
        world.obstacles = vec![obstacle_at(SizeTier::Small, DVec2::new(5.0, 5.0))];
        world.craft.vel = DVec2::new(12.0, -3.0);
        let input = Input {
            hyperspace: true,
            ..Default::default()
        };
        let out = step(&world, &input, 1_016.0, 77);
        let mut rng = Mulberry32::new(77);
        let expected = DVec2::new(rng.next_f64() * 800.0, rng.next_f64() * 600.0);
        assert_eq!(out.world.craft.pos, expected);
        assert_eq!(out.world.craft.vel, world.craft.vel * CRAFT_FRICTION);
        assert_eq!(
            out.world.craft.invincible_until_ms,
            1_016.0 + HYPERSPACE_INVINCIBLE_MS
        );
    }

    #[test]
    fn test_hyperspace_ignored_while_invincible() {
        let mut world = running_world(41);
        world.craft.invincible_until_ms = 5_000.0;
        let input = Input {
            hyperspace: true,
            ..Default::default()
        };
        let out = step(&world, &input, 1_016.0, 77);
        assert_eq!(out.world.craft.pos, world.craft.pos);
        assert_eq!(out.world.craft.invincible_until_ms, 5_000.0);
    }

    #[test]
    fn test_score_and_lives_monotonic_over_run() {
        let mut world = running_world(7);
        let mut now = 1_000.0;
        for frame in 0..600u32 {
            now += FRAME;
            let input = Input {
                thrust: frame % 50 < 20,
                turn: Turn::from_axis((frame / 30 % 3) as i32 - 1),
                fire: true,
                hyperspace: frame % 200 == 199,
            };
            let out = step(&world, &input, now, frame);
            assert!(out.world.score >= world.score);
            assert!(out.world.lives <= world.lives);
            if out.world.lives == 0 {
                assert_eq!(out.world.status, Status::GameOver);
            }
            world = out.world;
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_positions_stay_wrapped(
            seed in any::<u32>(),
            frames in 1usize..40,
            thrust in any::<bool>(),
            axis in -1i32..=1,
        ) {
            let mut world = running_world(seed);
            let input = Input {
                thrust,
                turn: Turn::from_axis(axis),
                fire: true,
                hyperspace: false,
            };
            let mut now = 1_000.0;
            for frame in 0..frames {
                now += 33.0;
                world = step(&world, &input, now, seed ^ frame as u32).world;
                let (w, h) = (world.width, world.height);
                let inside = |p: DVec2| p.x >= 0.0 && p.x < w && p.y >= 0.0 && p.y < h;
                prop_assert!(inside(world.craft.pos));
                prop_assert!(world.projectiles.iter().all(|p| inside(p.pos)));
                prop_assert!(world.obstacles.iter().all(|o| inside(o.pos)));
            }
        }

        #[test]
        fn prop_step_is_deterministic(seed in any::<u32>(), frame_seed in any::<u32>()) {
            let world = running_world(seed);
            let input = Input { fire: true, thrust: true, ..Default::default() };
            let a = step(&world, &input, 1_020.0, frame_seed);
            let b = step(&world, &input, 1_020.0, frame_seed);
            prop_assert_eq!(a, b);
        }
    }
}
