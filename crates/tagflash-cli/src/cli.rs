use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tagflash",
    about = "Write and read building type tags",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override value file (takes precedence over the configuration file)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every building type with its effective value
    List,
    /// Show one building type
    Show(TypeArgs),
    /// Override the value of a building type
    Set(SetArgs),
    /// Reset a building type to its default value
    Reset(TypeArgs),
    /// Reset every building type to its default value
    ResetAll,
    /// Print the tag bytes for a building type
    Encode(TypeArgs),
    /// Decode tag bytes given as hex and resolve the building type
    Decode(DecodeArgs),
    /// Write a building type to in-memory tags and read them back
    Simulate(SimulateArgs),
}

#[derive(Args)]
pub struct TypeArgs {
    /// Symbolic name, e.g. FARM
    pub building: String,
}

#[derive(Args)]
pub struct SetArgs {
    /// Symbolic name, e.g. FARM
    pub building: String,
    /// 0-255, decimal or 0x-prefixed hex
    pub value: String,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Message bytes as hex; spaces and colons are ignored
    pub hex: String,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Symbolic name, e.g. FARM
    pub building: String,
    /// Number of tags presented
    #[arg(short = 'n', long, default_value = "2")]
    pub tags: usize,
    /// Disarm after the first tag
    #[arg(long)]
    pub single: bool,
}
