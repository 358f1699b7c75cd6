pub mod cli;

pub use cli::{Cli, Commands, GraphCommands, ImportArgs, InputArgs, OutputFormat};
