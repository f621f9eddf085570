//! Acelerar CLI
//!
//! # Usage
//!
//! ```bash
//! # Quantize a float model to an int8 checkpoint
//! acelerar quantize model.safetensors --output model.q
//!
//! # 4-bit, per-group, keep the last layer in f32
//! acelerar quantize model.safetensors -o model.q -b 4 -g group --skip layers.2
//!
//! # Show the checkpoint manifest
//! acelerar inspect model.q
//!
//! # Load onto the reference model and compare outputs
//! acelerar verify model.q --reference model.safetensors --tolerance 0.05
//! ```

use acelerar::cli::{init_logging, run_command, Cli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
