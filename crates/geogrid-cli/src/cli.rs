use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "geogrid", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read an urban GeoJSON network into a distribution model and summarize it
    Import(ImportArgs),
    /// Graph utilities over the imported model
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },
}

/// The three reader inputs, given directly or through a TOML config
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// GeoJSON FeatureCollection with the network geometry
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub geojson: Option<PathBuf>,
    /// Equipment catalog (JSON)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub equipment: Option<PathBuf>,
    /// Load assignments (JSON)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub loads: Option<PathBuf>,
    /// Reader config (TOML); explicit paths above take precedence
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Fail when model validation reports any warning
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    /// Output format for the summary
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,
    /// Also list every warning and defaulted value
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Graph stats summary
    Stats {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Find electrical islands
    Islands {
        #[command(flatten)]
        inputs: InputArgs,
        /// Emit the island of every bus
        #[arg(long)]
        emit: bool,
    },
    /// Export the bus topology
    Export {
        #[command(flatten)]
        inputs: InputArgs,
        /// Export format
        #[arg(long, default_value = "graphviz")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
}
