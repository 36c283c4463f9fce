use std::time::Duration;

use anyhow::{anyhow, Result};
use futures::StreamExt;

use crate::cadence::Argument;
use crate::catalog::Kind;
use crate::cli::{Cli, TxCommand};
use crate::commands::{
	await_execution, build_pipeline, load_config, print_result, resolve_session, resolve_template,
};
use crate::rpc::AccessClient;
use crate::status;

pub async fn run(cli: &Cli, cmd: &TxCommand) -> Result<()> {
	let config = load_config(cli)?;
	let pipeline = build_pipeline(cli, &config);

	match cmd {
		TxCommand::Run {
			name,
			template,
			args,
			wait,
		} => {
			let session = resolve_session(cli, &config)?;
			let (source, substitution) =
				resolve_template(cli, &config, Kind::Transaction, name, template)?;
			let arguments = parse_arguments(args)?;

			println!("Running {name} as {}", session.current_user().address);
			let tx_id = pipeline
				.run_transaction(&session, &source, substitution.as_ref(), &arguments)
				.await?;

			if await_execution(pipeline.access(), &tx_id, wait).await?.is_some() {
				println!("{name} was executed.");
			}
			Ok(())
		}
		TxCommand::Status { tx_id } => {
			let result = pipeline.access().transaction_result(tx_id).await?;
			println!("Transaction: {tx_id}");
			print_result(&result);
			Ok(())
		}
		TxCommand::Watch { tx_id, timeout } => watch(pipeline.access(), tx_id, *timeout).await,
	}
}

pub fn parse_arguments(raw: &[String]) -> Result<Vec<Argument>> {
	raw.iter()
		.map(|a| a.parse::<Argument>().map_err(Into::into))
		.collect()
}

/// Print every status change until the transaction is sealed, expires,
/// or fails.
async fn watch(access: &AccessClient, tx_id: &str, timeout_secs: u64) -> Result<()> {
	println!("Transaction: {tx_id}");
	let updates = status::subscribe(access.clone(), tx_id.to_owned(), status::POLL_INTERVAL);

	let follow = async {
		futures::pin_mut!(updates);
		let mut last = None;
		while let Some(update) = updates.next().await {
			let result = update?;
			println!("  -> {}", result.status);
			last = Some(result);
		}
		Ok::<_, anyhow::Error>(last)
	};

	let last = tokio::time::timeout(Duration::from_secs(timeout_secs), follow)
		.await
		.map_err(|_| anyhow!("Stopped watching after {timeout_secs}s."))??;

	if let Some(result) = last {
		print_result(&result);
	}
	Ok(())
}
