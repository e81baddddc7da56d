//! CLI argument parsing for the config generators.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_OUT: &str = "default_config.json";
pub const CONFIG_OUT: &str = "config.json";

/// One-line usage printed when the binary runs without arguments.
pub const USAGE: &str =
    "usage: emodcfg <defaults|config|groups> --schema <PATH> [--overrides <PATH>] [--out <PATH>]";

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "emodcfg",
    version,
    about = "Generate EMOD config files from an engine schema",
    after_help = "Examples:\n  emodcfg defaults --schema schema.json\n  emodcfg config --schema schema.json --overrides overrides.json --out config.json\n  emodcfg groups --schema schema.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log schema resolution and finalize decisions
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Defaults(DefaultsArgs),
    Config(ConfigArgs),
    Groups(GroupsArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Write the default configuration resolved from a schema")]
pub struct DefaultsArgs {
    /// Schema document published by the engine
    #[arg(long, value_name = "PATH")]
    pub schema: PathBuf,

    /// Output path for the default configuration
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_OUT)]
    pub out: PathBuf,

    /// Leave out the embedded schema sub-map
    #[arg(long)]
    pub no_schema_node: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Write a finalized configuration, optionally with overrides")]
pub struct ConfigArgs {
    /// Schema document published by the engine
    #[arg(long, value_name = "PATH")]
    pub schema: PathBuf,

    /// Overrides document of the form {"parameters": {...}}
    #[arg(long, value_name = "PATH")]
    pub overrides: Option<PathBuf>,

    /// Output path for the finalized configuration
    #[arg(long, value_name = "PATH", default_value = CONFIG_OUT)]
    pub out: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "List schema groups and their parameter counts")]
pub struct GroupsArgs {
    /// Schema document published by the engine
    #[arg(long, value_name = "PATH")]
    pub schema: PathBuf,
}
