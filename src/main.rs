use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use flow_rewards_cli::cli::{Cli, Command};
use flow_rewards_cli::commands;

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match &cli.command {
		Command::Signer { command } => commands::signer::run(&cli, command).await,
		Command::Address { command } => commands::address::run(&cli, command).await,
		Command::Deploy {
			contract,
			template,
			wait,
		} => commands::deploy::run(&cli, contract, template, wait).await,
		Command::Tx { command } => commands::tx::run(&cli, command).await,
		Command::Script { command } => commands::script::run(&cli, command).await,
		Command::Catalog => commands::catalog::run(),
	}
}

/// Logs go to stderr so command output stays pipeable.
fn init_tracing(verbose: bool) {
	let fallback = if verbose {
		"flow_rewards_cli=debug"
	} else {
		"flow_rewards_cli=warn"
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
