//! FSM generator demos on the simulated PYNQ-Z1 board.
//!
//! # Usage
//!
//! ```bash
//! # Replay the reference scenarios and print their verdicts
//! fsmflow-examples run --seed 7
//!
//! # Compile a specification file and print its transition table
//! fsmflow-examples check counter.json --state-bits
//! ```

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]

use std::path::{Path, PathBuf};
use std::{fs, io, process};

use clap::{Parser, Subcommand};
use fsmflow::{compile_with, CompileOptions, FsmSpec, HardwareLimits, ValidationError};
use fsmflow_sim::scenarios::{self, ScenarioError};
use log::info;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "fsmflow-examples")]
#[command(about = "Compile FSM specifications and run them on a simulated FSM generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay the reference scenarios on a simulated board.
    Run {
        /// Seed of the board's start-up phase and of the random output patterns.
        #[arg(short, long, default_value = "0")]
        seed: u64,
    },

    /// Compile a JSON specification and print the transition table.
    Check {
        /// Path to the specification (JSON).
        spec: PathBuf,

        /// Path to hardware limits (JSON); PYNQ-Z1 when omitted.
        #[arg(short, long)]
        limits: Option<PathBuf>,

        /// Expose the state register as extra output lanes.
        #[arg(long)]
        state_bits: bool,
    },
}

#[derive(Debug, Error)]
enum Error {
    #[error("cannot read {path}: {error}")]
    Io { path: PathBuf, error: io::Error },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid specification: {0}")]
    Validation(#[from] ValidationError),

    #[error("scenario aborted: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("{failed} of {total} scenarios failed")]
    Failed { failed: usize, total: usize },
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|error| Error::Io { path: path.to_path_buf(), error })
}

fn cmd_check(spec: &Path, limits: Option<&Path>, state_bits: bool) -> Result<(), Error> {
    let spec = FsmSpec::from_json(&read(spec)?)?;
    let limits = match limits {
        Some(path) => serde_json::from_str::<HardwareLimits>(&read(path)?)?,
        None => HardwareLimits::PYNQZ1,
    };
    let fsm = compile_with(&spec, &limits, CompileOptions { use_state_bits: state_bits })?;
    println!("{}", fsm);
    Ok(())
}

fn cmd_run(seed: u64) -> Result<(), Error> {
    let outcomes = scenarios::replay_all(seed)?;
    let failed = outcomes.iter().filter(|outcome| !outcome.passed).count();
    for outcome in &outcomes {
        println!("{:<5} {:<40} {}", if outcome.passed { "ok" } else { "FAIL" }, outcome.name, outcome.detail);
    }
    info!("{} scenarios replayed with seed {}", outcomes.len(), seed);

    if failed == 0 {
        Ok(())
    } else {
        Err(Error::Failed { failed, total: outcomes.len() })
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { seed } => cmd_run(seed),
        Commands::Check { spec, limits, state_bits } => cmd_check(&spec, limits.as_deref(), state_bits),
    };

    if let Err(error) = result {
        eprintln!("error: {}", error);
        process::exit(1);
    }
}
