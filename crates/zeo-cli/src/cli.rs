use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The ZeoForge Developers",
    version,
    about = "zeo - inspect, convert and script edits of molecular scene graphs.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Session configuration file in TOML format
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a session configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S max-undo=20
    #[arg(short = 'S', long = "set", global = true, value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the node tree of a model file.
    Show(ShowArgs),
    /// Load a model with one filter and save it with another.
    Convert(ConvertArgs),
    /// Replay a scripted sequence of edits on a model and save the result.
    Edit(EditArgs),
}

/// Arguments for the `show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Model file to print (e.g., water.xyz or water.xyz.gz).
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Also list every property value of every node.
    #[arg(short, long)]
    pub properties: bool,
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Model file to read.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// File to write; its extension selects the dump filter.
    #[arg(required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Only write the subtrees at these node paths (e.g., /universe/0).
    #[arg(long = "only", value_name = "NODE_PATH")]
    pub only: Vec<String>,

    /// Override the gzip level used for `.gz` output.
    #[arg(long, value_name = "0-9")]
    pub gzip_level: Option<u32>,
}

/// Arguments for the `edit` subcommand.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Model file to edit.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Edit script in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub script: PathBuf,

    /// Where to save the edited model. Defaults to overwriting the input.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the maximum undo depth.
    #[arg(long, value_name = "INT")]
    pub max_undo: Option<usize>,

    /// Override the gzip level used for `.gz` output.
    #[arg(long, value_name = "0-9")]
    pub gzip_level: Option<u32>,

    /// Stop at the first step that does not apply instead of skipping it.
    #[arg(long)]
    pub strict: bool,
}
