pub mod address;
pub mod catalog;
pub mod deploy;
pub mod script;
pub mod signer;
pub mod tx;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

use crate::catalog::{self as templates, Kind};
use crate::cli::{Cli, TemplateArgs, WaitArgs};
use crate::config::Config;
use crate::loader::{CodeLoader, Source, Substitution};
use crate::pipeline::Pipeline;
use crate::rpc::AccessClient;
use crate::session::Session;
use crate::signer::LocalKeySigner;
use crate::status::{self, TxResult, TxStatus};
use crate::transaction::Address;

/// Config file location from CLI flag / env, or the default.
pub fn config_path(cli: &Cli) -> Result<PathBuf> {
	match &cli.config {
		Some(p) => Ok(p.clone()),
		None => Config::path(),
	}
}

pub fn load_config(cli: &Cli) -> Result<Config> {
	Config::load_from(&config_path(cli)?)
}

/// Resolve the network name from CLI flag or config.
pub fn resolve_network(cli: &Cli, config: &Config) -> String {
	cli.network
		.map(|n| n.as_str().to_owned())
		.unwrap_or_else(|| config.network.default.clone())
}

/// Resolve the access node URL from CLI flag or config.
pub fn resolve_access_node(cli: &Cli, config: &Config) -> String {
	cli.access_node
		.clone()
		.unwrap_or_else(|| config.access_node(&resolve_network(cli, config)).to_owned())
}

pub fn build_pipeline(cli: &Cli, config: &Config) -> Pipeline {
	let access = AccessClient::new(&resolve_access_node(cli, config));
	Pipeline::new(CodeLoader::new(), access)
}

/// Build a signing session from CLI flags + config, failing if the
/// account or key is missing.
pub fn resolve_session(cli: &Cli, config: &Config) -> Result<Session> {
	let address: Address = match cli.address.as_deref() {
		Some(a) => a.parse()?,
		None => config.signer.address.ok_or_else(|| {
			anyhow!("No signer address configured. Run: rewards signer set --address <addr>")
		})?,
	};
	let key_index = cli.key_index.unwrap_or(config.signer.key_index);
	let private_key = cli
		.private_key
		.as_deref()
		.or(config.signer.private_key.as_deref())
		.ok_or_else(|| {
			anyhow!("No private key configured. Pass --private-key or set FLOW_PRIVATE_KEY")
		})?;

	let signer = LocalKeySigner::from_hex(
		address,
		key_index,
		private_key,
		config.signer.algorithm,
		config.signer.hash,
	)?;
	Ok(Session::new(resolve_network(cli, config), Arc::new(signer)))
}

/// Work out where a template comes from and which placeholders to
/// rewrite: catalog entry first, then `--source` / `--replace` overrides.
pub fn resolve_template(
	cli: &Cli,
	config: &Config,
	kind: Kind,
	name: &str,
	args: &TemplateArgs,
) -> Result<(Source, Option<Substitution>)> {
	let entry = templates::find(name, kind);

	let source = match (&args.source, entry) {
		(Some(location), _) => Source::parse(location),
		(None, Some(t)) => {
			let base = cli.templates.as_deref().unwrap_or(&config.templates.base);
			t.source(base)?
		}
		(None, None) => {
			bail!("Unknown {kind} `{name}`. Pass --source or see `rewards catalog`.")
		}
	};

	let mut pairs: Vec<(String, String)> = match entry {
		Some(t) => t
			.substitution(&config.addresses)?
			.map(|s| s.replacements().clone().into_iter().collect())
			.unwrap_or_default(),
		None => Vec::new(),
	};
	for r in &args.replacements {
		pairs.push(parse_replacement(r)?);
	}

	Ok((source, Substitution::from_tokens(pairs)?))
}

/// Split a `--replace TOKEN=VALUE` flag.  The token must be non-empty.
fn parse_replacement(raw: &str) -> Result<(String, String)> {
	match raw.split_once('=') {
		Some((token, value)) if !token.is_empty() => Ok((token.to_owned(), value.to_owned())),
		Some(_) => bail!("--replace needs a non-empty TOKEN, got `{raw}`"),
		None => bail!("--replace expects TOKEN=VALUE, got `{raw}`"),
	}
}

/// Print the transaction ID and, unless told not to, wait until it has
/// executed.
pub async fn await_execution(
	access: &AccessClient,
	tx_id: &str,
	wait: &WaitArgs,
) -> Result<Option<TxResult>> {
	println!("Transaction: {tx_id}");
	if wait.no_wait {
		println!("Follow it with: rewards tx watch {tx_id}");
		return Ok(None);
	}

	println!("Waiting for execution...");
	let result = tokio::time::timeout(
		Duration::from_secs(wait.timeout),
		status::wait_for(access, tx_id, TxStatus::Executed, status::POLL_INTERVAL),
	)
	.await
	.map_err(|_| {
		anyhow!(
			"Timed out after {}s. Check later with: rewards tx status {tx_id}",
			wait.timeout
		)
	})??;

	print_result(&result);
	Ok(Some(result))
}

pub fn print_result(result: &TxResult) {
	println!("Status:      {}", result.status);
	if result.failed() {
		println!("Error:       {}", result.error_message);
	}
	if !result.events.is_empty() {
		println!("Events:");
		for event in &result.events {
			match event.decode_payload() {
				Ok(value) => println!("  {}  {value}", event.kind),
				Err(_) => println!("  {}", event.kind),
			}
		}
	}
}
