// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use legv8_sim::core::driver::StepOutcome;
use legv8_sim::core::engine::Engine;
use legv8_sim::core::error::Result;
use log::{error, info, warn};

/// A micro-step-accurate simulator for a pedagogical LEGv8 instruction subset
#[derive(Parser)]
#[command(name = "legv8-sim")]
#[command(about = "LEGv8 micro-step simulator", long_about = None)]
struct Args {
    /// Path to a LEGv8 assembly source file
    source: PathBuf,

    /// Maximum number of instructions to execute before giving up
    #[arg(long, default_value = "100000")]
    max_steps: usize,

    /// Raise the log level to debug
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Write the final CPU state as JSON to this path
    #[arg(long)]
    dump_state: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    info!("legv8-sim v{}", env!("CARGO_PKG_VERSION"));

    let source = fs::read_to_string(&args.source)?;

    let mut engine = Engine::new();
    engine.load(&source)?;
    info!("loaded program from {}", args.source.display());

    let mut instructions_completed = 0usize;
    loop {
        if instructions_completed >= args.max_steps {
            warn!(
                "stopping after reaching --max-steps={}",
                args.max_steps
            );
            break;
        }

        match engine.step()? {
            StepOutcome::MicroStep { .. } => continue,
            StepOutcome::InstructionComplete { next_pc, .. } => {
                instructions_completed += 1;
                log::debug!("instruction {} complete, pc=0x{:016X}", instructions_completed, next_pc);
            }
            StepOutcome::ProgramFinished { reason } => {
                info!("program finished: {}", reason);
                break;
            }
            StepOutcome::Error { kind, message } => {
                error!("{} at pc=0x{:016X}: {}", kind, engine.pc(), message);
                break;
            }
        }
    }

    info!(
        "executed {} instruction(s), final pc=0x{:016X}",
        instructions_completed,
        engine.pc()
    );

    if let Some(path) = &args.dump_state {
        let state = engine.inspect();
        let json = serde_json::to_string_pretty(&state).map_err(|e| {
            legv8_sim::core::error::EmulatorError::IoError {
                message: e.to_string(),
            }
        })?;
        fs::write(path, json)?;
        info!("wrote state dump to {}", path.display());
    }

    Ok(())
}
