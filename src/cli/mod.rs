//! CLI module for acelerar
//!
//! Argument types, logging setup and command handlers.

mod args;
mod commands;
mod logging;

pub use args::{Cli, Command, GranularityArg, InspectArgs, QuantMethod, QuantizeArgs, VerifyArgs};
pub use commands::run_command;
pub use logging::init_logging;
