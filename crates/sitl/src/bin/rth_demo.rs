//! Return-to-home demonstration run.
//!
//! Starts the vehicle hovering away from home, activates the land-at-home
//! goal and steps the closed loop until the FSM requests disarm, printing
//! each state change.
//!
//! Usage:
//!   cargo run -p quadnav-sitl --bin rth_demo -- [OPTIONS]
//!
//! Options:
//!   --seed <N>       RNG seed (default: 1)
//!   --north <M>      Start offset north of home in meters (default: 30)
//!   --east <M>       Start offset east of home in meters (default: 20)
//!   --altitude <M>   Start altitude above home in meters (default: 5)
//!   --max-secs <S>   Give up after this much simulated time (default: 300)

use std::env;
use std::process;

use nalgebra::Vector3;
use quadnav_core::follower::Goal;
use quadnav_sitl::SitlBridge;

struct Args {
    seed: u64,
    north: f32,
    east: f32,
    altitude: f32,
    max_secs: f32,
}

fn parse_args() -> Args {
    let mut args = Args {
        seed: 1,
        north: 30.0,
        east: 20.0,
        altitude: 5.0,
        max_secs: 300.0,
    };

    let raw: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < raw.len() {
        match raw[i].as_str() {
            "--seed" => {
                i += 1;
                args.seed = parse_arg(&raw, i, "seed");
            }
            "--north" => {
                i += 1;
                args.north = parse_arg(&raw, i, "north");
            }
            "--east" => {
                i += 1;
                args.east = parse_arg(&raw, i, "east");
            }
            "--altitude" => {
                i += 1;
                args.altitude = parse_arg(&raw, i, "altitude");
            }
            "--max-secs" => {
                i += 1;
                args.max_secs = parse_arg(&raw, i, "max-secs");
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    args
}

fn parse_arg<T: std::str::FromStr>(raw: &[String], i: usize, name: &str) -> T {
    raw.get(i)
        .unwrap_or_else(|| {
            eprintln!("Error: --{name} requires a value");
            process::exit(1);
        })
        .parse()
        .unwrap_or_else(|_| {
            eprintln!("Error: invalid value for --{name}");
            process::exit(1);
        })
}

fn print_usage() {
    println!("Usage: rth_demo [--seed N] [--north M] [--east M] [--altitude M] [--max-secs S]");
}

fn main() {
    let args = parse_args();

    let start = Vector3::new(args.north, args.east, -args.altitude);
    let mut bridge = match SitlBridge::new(args.seed, start) {
        Ok(bridge) => bridge,
        Err(err) => {
            eprintln!("Failed to set up bridge: {err}");
            process::exit(1);
        }
    };

    println!(
        "Starting at ({:.1} N, {:.1} E, {:.1} m up), seed {}",
        args.north, args.east, args.altitude, args.seed
    );

    if let Err(err) = bridge.activate(Goal::LandHome) {
        eprintln!("Failed to activate goal: {err}");
        process::exit(1);
    }

    let mut last_state = bridge.state();
    println!("[{:8.2}s] -> {}", bridge.sim_time(), last_state.as_str());

    while bridge.sim_time() < args.max_secs {
        if let Err(err) = bridge.step() {
            eprintln!("[{:8.2}s] step failed: {err}", bridge.sim_time());
            process::exit(1);
        }

        let state = bridge.state();
        if state != last_state {
            let position = bridge.truth().position();
            println!(
                "[{:8.2}s] -> {} at ({:.1} N, {:.1} E, {:.1} m up)",
                bridge.sim_time(),
                state.as_str(),
                position.x,
                position.y,
                -position.z
            );
            last_state = state;
        }

        if bridge.fsm().is_faulted() {
            eprintln!("Guidance faulted; aborting");
            process::exit(1);
        }

        if bridge.disarm_requested() {
            println!("[{:8.2}s] disarm requested, done", bridge.sim_time());
            return;
        }
    }

    eprintln!("Gave up after {:.0} s without disarm", args.max_secs);
    process::exit(1);
}
