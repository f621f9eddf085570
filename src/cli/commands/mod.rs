//! CLI command implementations

mod inspect;
mod quantize;
mod verify;


use super::args::{Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Quantize(args) => quantize::run_quantize(args),
        Command::Inspect(args) => inspect::run_inspect(args),
        Command::Verify(args) => verify::run_verify(args),
    }
}
