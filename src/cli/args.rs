//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Acelerar: quantize, inspect and verify accelerated models
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "acelerar")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Post-training quantization with a drop-in accelerated model adapter")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Quantize a float SafeTensors model into a checkpoint directory
    Quantize(QuantizeArgs),

    /// Show the manifest of a quantized checkpoint
    Inspect(InspectArgs),

    /// Load a checkpoint onto its reference model and compare outputs
    Verify(VerifyArgs),
}

/// Quantization method
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantMethod {
    Symmetric,
    Asymmetric,
}

/// Scale granularity
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GranularityArg {
    Tensor,
    Channel,
    Group,
}

/// Arguments for the quantize command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct QuantizeArgs {
    /// Float model (SafeTensors)
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Checkpoint directory to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// YAML quantization config; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bit width (2-8)
    #[arg(short, long)]
    pub bits: Option<u8>,

    /// Quantization method
    #[arg(short, long)]
    pub method: Option<QuantMethod>,

    /// Scale granularity
    #[arg(short, long)]
    pub granularity: Option<GranularityArg>,

    /// Group size for `--granularity group`
    #[arg(long, default_value = "32")]
    pub group_size: usize,

    /// Layer to keep in f32 (repeatable)
    #[arg(long = "skip", value_name = "LAYER")]
    pub skip: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the inspect command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InspectArgs {
    /// Checkpoint directory
    #[arg(value_name = "CHECKPOINT")]
    pub checkpoint: PathBuf,

    /// Print the manifest as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the verify command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct VerifyArgs {
    /// Checkpoint directory
    #[arg(value_name = "CHECKPOINT")]
    pub checkpoint: PathBuf,

    /// Float reference model (SafeTensors)
    #[arg(short, long)]
    pub reference: PathBuf,

    /// Rows in the probe batch
    #[arg(long, default_value = "8")]
    pub batch: usize,

    /// Fail when the max absolute output difference exceeds this
    #[arg(short, long)]
    pub tolerance: Option<f32>,
}
