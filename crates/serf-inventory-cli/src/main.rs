//! `serf-inventory` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use serf_inventory::InventoryService;
use serf_inventory_cli::cli::Cli;
use serf_inventory_cli::commands::InventoryCommand;
use serf_inventory_cli::output::OutputFormat;

fn main() -> ExitCode {
    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), serf_inventory_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let service = InventoryService::from_config(&cli.config())?;
    let cmd = InventoryCommand::new(service);

    let mut stdout = io::stdout().lock();
    cmd.execute(&mut stdout, &format, &cli.command).await
}
