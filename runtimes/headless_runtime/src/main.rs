// Headless Runtime - replays a scripted tracking session through the
// climbing locomotion core and reports what happened.
//
// Useful for tuning locomotion settings and checking behaviour changes
// without a headset: pick a scenario, optionally point at a JSON config,
// and read the summary.

mod scenario;

use std::path::PathBuf;

use anyhow::Context;
use cgmath::InnerSpace;
use clap::Parser;
use climbvr::{
    feedback::ImpactFeedbackConfig, ClimbLocomotion, LocomotionConfig, LocomotionEffect,
};
use engine::profile;
use serde_json::json;
use tracing::info;

use scenario::{Scenario, ScenarioKind, FLOOR_MATERIAL, LEDGE_MATERIAL};

#[derive(Parser)]
#[command(name = "headless_runtime")]
#[command(about = "Replay a scripted climbing session without a headset")]
struct Args {
    /// Scripted session to play
    #[arg(short, long, value_enum, default_value = "climb")]
    scenario: ScenarioKind,

    /// Number of ticks to simulate
    #[arg(short, long, default_value = "600")]
    ticks: u32,

    /// Tick rate in Hz
    #[arg(long, default_value = "72")]
    rate: f32,

    /// JSON locomotion config; unspecified fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective locomotion config and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Default)]
struct Tally {
    touches: u32,
    releases: u32,
    launches: u32,
    tracking_lost: u32,
    turns: u32,
    peak_height: f32,
    top_launch_speed: f32,
    distance: f32,
}

fn main() -> anyhow::Result<()> {
    engine::init_logging(engine::logging::DEFAULT_LOG_ENV);

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => LocomotionConfig::load(path)
            .with_context(|| format!("loading locomotion config from {}", path.display()))?,
        None => LocomotionConfig::default(),
    };

    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    anyhow::ensure!(args.rate > 0.0, "tick rate must be positive, got {}", args.rate);
    let dt = 1.0 / args.rate;

    info!(
        "Running {:?} scenario for {} ticks at {} Hz",
        args.scenario, args.ticks, args.rate
    );

    let Scenario {
        world,
        body,
        mut player,
    } = Scenario::new(args.scenario, config.locomotion_mask());
    let mut locomotion = ClimbLocomotion::new(config, body, &player.initial_input())
        .context("creating climbing locomotion")?;
    let feedback = ImpactFeedbackConfig {
        materials: vec![FLOOR_MATERIAL, LEDGE_MATERIAL],
        ..ImpactFeedbackConfig::default()
    };
    let mut tally = Tally::default();
    let start = locomotion.body().position;

    profile!("simulation", {
        for tick in 0..args.ticks {
            if let Some(degrees) = player.turn_at(tick) {
                locomotion.turn(degrees);
                tally.turns += 1;
            }

            let input = player.next_input(tick, &locomotion, dt);
            let before = locomotion.body().position;
            let outcome = locomotion.tick(&world, &input, dt);
            locomotion.fixed_update(&world, dt);
            tally.distance += (locomotion.body().position - before).magnitude();
            tally.peak_height = tally.peak_height.max(locomotion.body().position.y);

            for effect in &outcome.effects {
                match effect {
                    LocomotionEffect::HandTouched { hand, material, .. } => {
                        tally.touches += 1;
                        if let Some(impact) =
                            feedback.for_device(*hand, input.hand(*hand), *material)
                        {
                            engine::haptics_log!(
                                debug,
                                "tick {}: {:?} pulse {:.2} for {:.2}s, volume {:.2}",
                                tick,
                                impact.haptic.hand,
                                impact.haptic.strength,
                                impact.haptic.duration,
                                impact.volume
                            );
                        }
                    }
                    LocomotionEffect::HandReleased {
                        hand,
                        release_speed,
                    } => {
                        tally.releases += 1;
                        engine::locomotion_log!(
                            debug,
                            "tick {}: {:?} released at {:.2} m/s",
                            tick,
                            hand,
                            release_speed
                        );
                    }
                    LocomotionEffect::Launched { velocity } => {
                        tally.launches += 1;
                        tally.top_launch_speed = tally.top_launch_speed.max(velocity.magnitude());
                        info!("tick {}: launched at {:?}", tick, velocity);
                    }
                    LocomotionEffect::TrackingLost => tally.tracking_lost += 1,
                }
            }
        }
    });

    let end = locomotion.body().position;
    let summary = json!({
        "scenario": format!("{:?}", args.scenario),
        "ticks": args.ticks,
        "finished_script": player.is_finished(),
        "start": [start.x, start.y, start.z],
        "end": [end.x, end.y, end.z],
        "net_displacement": (end - start).magnitude(),
        "distance_travelled": tally.distance,
        "peak_height": tally.peak_height,
        "touches": tally.touches,
        "releases": tally.releases,
        "launches": tally.launches,
        "top_launch_speed": tally.top_launch_speed,
        "turns": tally.turns,
        "tracking_lost_ticks": tally.tracking_lost,
    });
    info!("Summary: {}", summary);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
