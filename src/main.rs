//! Rock Drift headless runner
//!
//! Drives the simulation at a fixed frame interval and reports what happened.
//! Useful for soak-testing determinism and tuning without a renderer.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rock_drift::sim::Status;
use rock_drift::{Autopilot, Driver, Settings};

#[derive(Debug, Parser)]
#[command(name = "rock-drift", about = "Run the Rock Drift simulation headless")]
struct Args {
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Run seed
    #[arg(long)]
    seed: Option<u32>,
    /// Number of frames to simulate
    #[arg(long)]
    frames: Option<u32>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    /// Hold all inputs released instead of flying the scripted pilot
    #[arg(long)]
    no_autopilot: bool,
    /// Start a new run whenever one ends
    #[arg(long)]
    restart: bool,
    /// Print the final snapshot as JSON
    #[arg(long)]
    dump: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    apply_overrides(&mut settings, &args);
    if let Err(err) = settings.validate() {
        log::error!("{err}");
        return ExitCode::FAILURE;
    }

    log::info!("Rock Drift (headless) starting...");
    run(&settings);
    ExitCode::SUCCESS
}

fn apply_overrides(settings: &mut Settings, args: &Args) {
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    if let Some(frames) = args.frames {
        settings.frames = frames;
    }
    if let Some(width) = args.width {
        settings.width = width;
    }
    if let Some(height) = args.height {
        settings.height = height;
    }
    if args.no_autopilot {
        settings.autopilot = false;
    }
    settings.restart_on_game_over |= args.restart;
    settings.dump_final |= args.dump;
}

fn run(settings: &Settings) {
    let mut driver = Driver::new(settings.width, settings.height, 0.0, settings.seed);
    let mut pilot = Autopilot::new(driver.world().seed);
    let mut runs = 1u32;
    driver.start();

    for _ in 0..settings.frames {
        if settings.autopilot {
            let input = pilot.next_input(driver.world());
            driver.set_input(input);
        }

        let report = driver.advance(settings.frame_ms);
        if report.did_level_advance {
            log::info!(
                "Frame {}: level {} reached",
                report.frame,
                driver.world().level
            );
        }

        if report.status == Status::GameOver {
            log::info!(
                "Frame {}: run {} over with score {}",
                report.frame,
                runs,
                driver.world().score
            );
            if !settings.restart_on_game_over {
                break;
            }
            driver.reset(None);
            driver.start();
            runs += 1;
        }
    }

    let world = driver.world();
    println!(
        "frames={} runs={} status={:?} score={} level={} lives={} explosions={} waves={}",
        driver.frame(),
        runs,
        world.status,
        world.score,
        world.level,
        world.lives,
        driver.explosions(),
        driver.level_advances()
    );

    if settings.dump_final {
        match serde_json::to_string_pretty(world) {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("Failed to serialize snapshot: {err}"),
        }
    }
}
