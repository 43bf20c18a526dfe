//! Momentum - Main Entry Point
//!
//! Runs a scripted, headless session on the test course: one player walks
//! and crouches, one steps off the tower, one sprints along the run wall and
//! jumps into a wall-run. Set `RUST_LOG=debug` to follow every transition.

use std::process::ExitCode;

use clap::Parser;
use momentum_game::input::{ActionInput, MovementInput};
use momentum_game::{Level, PlayerInput, Simulation, SimulationConfig};

#[derive(Parser, Debug)]
#[command(name = "momentum")]
#[command(version, about = "Headless locomotion session on the test course")]
struct Cli {
    #[arg(long, default_value_t = false)]
    #[arg(help = "Use the arcade locomotion preset")]
    arcade: bool,

    #[arg(default_value_t = 6.0)]
    #[arg(help = "Seconds of simulated time to run")]
    seconds: f32,
}

/// Which scripted behaviour a player follows.
#[derive(Debug, Clone, Copy)]
enum Script {
    Walker,
    Faller,
    WallRunner,
}

impl Script {
    fn input(self, frame: u64) -> PlayerInput {
        let second = frame as f32 / 60.0;
        let mut movement = MovementInput::default();
        let mut actions = ActionInput::default();
        let mut mouse_delta = (0.0, 0.0);

        match self {
            Script::Walker => {
                movement.forward = second < 4.0;
                actions.crouch = (2.0..3.0).contains(&second);
                if (1.0..1.5).contains(&second) {
                    mouse_delta = (40.0, 0.0);
                }
            }
            Script::Faller => {
                movement.forward = second < 1.0;
            }
            Script::WallRunner => {
                movement.forward = second < 3.0;
                actions.sprint = second < 2.0;
                actions.jump = frame == 20;
                actions.crouch = (2.0..2.5).contains(&second);
            }
        }

        PlayerInput {
            movement,
            mouse_delta,
            actions,
            frame: frame as u32,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let config = if cli.arcade {
        SimulationConfig::arcade()
    } else {
        SimulationConfig::default()
    };

    let mut simulation = match Simulation::new(config, Level::test_course()) {
        Ok(simulation) => simulation,
        Err(e) => {
            log::error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let scripts = [Script::Walker, Script::Faller, Script::WallRunner];
    for script in scripts {
        if let Err(e) = simulation.add_player(&format!("{script:?}")) {
            log::error!("failed to add player: {e}");
            return ExitCode::FAILURE;
        }
    }

    let seconds = cli.seconds;
    let total_frames = (seconds * simulation.config.tick_rate as f32) as u64;
    log::info!("running {} for {seconds}s ({total_frames} ticks)", simulation.level.name);

    for _ in 0..total_frames {
        let frame = simulation.frame;
        let inputs: Vec<PlayerInput> = scripts.iter().map(|s| s.input(frame)).collect();
        simulation.tick(&inputs);
    }

    for player in &simulation.players {
        let snapshot = player.snapshot();
        println!(
            "{:<10} pos=({:6.2}, {:5.2}, {:6.2}) health={:5.1} stance={:?} stats={:?}",
            player.name,
            snapshot.position.x,
            snapshot.position.y,
            snapshot.position.z,
            player.health.get().current(),
            snapshot.hud_stance,
            player.stats,
        );
    }

    ExitCode::SUCCESS
}
