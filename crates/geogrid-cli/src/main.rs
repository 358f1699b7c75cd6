use clap::Parser;
use geogrid_cli::{Cli, Commands};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let result = match &cli.command {
        Commands::Import(args) => commands::import::handle(args),
        Commands::Graph { command } => commands::graph::handle(command),
    };

    match &result {
        Ok(()) => info!("done"),
        Err(e) => error!("{e:#}"),
    }
    result
}
