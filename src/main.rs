//! Cube Roller headless runner
//!
//! Usage: `cube-roller [LEVEL.json|-] [MOVES] [SEED]`
//!
//! Loads a level (or the built-in demo with `-`/no argument), then replays
//! MOVES (`E`/`W`/`N`/`S` roll, `X` switches cube) or, without MOVES, a
//! seeded random walk. The simulation runs on a fixed timestep behind a
//! frame accumulator and every event is logged. Set `RUST_LOG=debug` for
//! per-move detail and `CUBE_ROLLER_TUNING` to a JSON file to override tuning.

use std::collections::VecDeque;
use std::process::ExitCode;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use cube_roller::consts::{MAX_SUBSTEPS, SIM_DT};
use cube_roller::sim::{Direction, EventSink, GameEvent, LevelPhase, Simulation, TickInput, tick};
use cube_roller::{LevelError, LevelSpec, MoveCounter, Tuning};

/// Button at column 3 opens the bridge at column 6; goal at column 9
const DEMO_LEVEL: &str = r#"{
    "width": 10,
    "depth": 3,
    "cells": [
        2, 2, 2, 2, 2, 2, 0,  2, 2, 2,
        2, 2, 2, 8, 2, 2, 10, 2, 2, 4,
        2, 2, 2, 2, 2, 2, 0,  2, 2, 2
    ],
    "spawn": [0, 1],
    "switches": [{ "cell": [3, 1], "mode": "Toggle", "bridges": [[6, 1]] }]
}"#;

/// Host frame length; the simulation substeps at `SIM_DT`
const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up after two minutes of simulated time
const MAX_FRAMES: u32 = 60 * 120;
const RANDOM_WALK_MOVES: u32 = 200;
const DEFAULT_SEED: u64 = 0x5EED;

#[derive(Debug, Clone, Copy)]
enum Command {
    Roll(Direction),
    SwitchControl,
}

impl Command {
    fn input(self) -> TickInput {
        match self {
            Command::Roll(direction) => TickInput::intent(direction.intent()),
            Command::SwitchControl => TickInput {
                switch_control: true,
                ..Default::default()
            },
        }
    }
}

/// Where the next command comes from
enum Script {
    Fixed(VecDeque<Command>),
    Random { rng: Pcg32, remaining: u32 },
}

impl Script {
    fn parse(moves: &str) -> Self {
        let commands = moves
            .chars()
            .filter_map(|c| match c.to_ascii_uppercase() {
                'E' => Some(Command::Roll(Direction::East)),
                'W' => Some(Command::Roll(Direction::West)),
                'N' => Some(Command::Roll(Direction::North)),
                'S' => Some(Command::Roll(Direction::South)),
                'X' => Some(Command::SwitchControl),
                c if c.is_whitespace() || c == ',' => None,
                other => {
                    log::warn!("Ignoring unknown move '{}'", other);
                    None
                }
            })
            .collect();
        Script::Fixed(commands)
    }

    fn random(seed: u64) -> Self {
        log::info!("Random walk, seed {:#x}", seed);
        Script::Random {
            rng: Pcg32::seed_from_u64(seed),
            remaining: RANDOM_WALK_MOVES,
        }
    }

    fn next(&mut self, split: bool) -> Option<Command> {
        match self {
            Script::Fixed(commands) => commands.pop_front(),
            Script::Random { rng, remaining } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                let pick = rng.random_range(0..if split { 5 } else { 4 });
                Some(match Direction::ALL.get(pick) {
                    Some(&direction) => Command::Roll(direction),
                    None => Command::SwitchControl,
                })
            }
        }
    }
}

/// Logs events and keeps the move count
#[derive(Default)]
struct Recorder {
    moves: MoveCounter,
}

impl EventSink for Recorder {
    fn emit(&mut self, event: GameEvent) {
        match &event {
            GameEvent::Moved { body, direction } => log::debug!("Body {} rolls {:?}", body, direction),
            other => log::info!("Event: {:?}", other),
        }
        self.moves.observe(&event);
    }
}

fn load_tuning() -> Tuning {
    match std::env::var("CUBE_ROLLER_TUNING") {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(json) => Tuning::from_json_or_default(&json),
            Err(e) => {
                log::warn!("Could not read tuning file {}: {}", path, e);
                Tuning::default()
            }
        },
        Err(_) => Tuning::default(),
    }
}

fn load_level(arg: Option<&str>) -> Result<LevelSpec, LevelError> {
    match arg {
        None | Some("-") => {
            log::info!("Using built-in demo level");
            LevelSpec::from_json(DEMO_LEVEL)
        }
        Some(path) => {
            log::info!("Loading level {}", path);
            LevelSpec::load(path)
        }
    }
}

/// Whether the controlled cube can take a new command
fn ready(sim: &Simulation) -> bool {
    let body = sim.controlled_body();
    body.is_idle() && body.move_cooldown == 0.0
}

/// Nothing left in motion except bodies already written off
fn settled(sim: &Simulation) -> bool {
    sim.live_bodies().iter().all(|b| b.is_idle() || b.fell)
}

fn run(args: &[String]) -> Result<(), LevelError> {
    let spec = load_level(args.get(1).map(String::as_str))?;
    let mut sim = spec.simulation(load_tuning())?;

    let mut script = match args.get(2) {
        Some(moves) => Script::parse(moves),
        None => {
            let seed = args
                .get(3)
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SEED);
            Script::random(seed)
        }
    };

    let mut recorder = Recorder::default();
    let mut input = TickInput::default();
    let mut accumulator = 0.0;

    for _ in 0..MAX_FRAMES {
        if sim.phase != LevelPhase::Playing && settled(&sim) {
            break;
        }
        if sim.phase == LevelPhase::Playing && ready(&sim) && settled(&sim) {
            match script.next(sim.is_split()) {
                Some(command) => input = command.input(),
                None => {
                    log::info!("Out of moves");
                    break;
                }
            }
        }

        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut sim, &input, SIM_DT, &mut recorder);
            accumulator -= SIM_DT;
            substeps += 1;

            // Commands are one-shot
            input = TickInput::default();
        }
    }

    log::info!(
        "Finished: {:?} after {} ticks, {} moves",
        sim.phase,
        sim.time_ticks,
        recorder.moves.level_moves
    );
    let moves = recorder.moves.level_moves;
    match sim.phase {
        LevelPhase::Complete => {
            recorder.moves.complete_level();
            println!("Level complete in {} moves", moves);
        }
        LevelPhase::Failed => println!("Cube fell after {} moves", moves),
        LevelPhase::Playing => println!("Stopped after {} moves", moves),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Cube Roller (headless) starting...");

    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
