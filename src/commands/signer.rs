use anyhow::{Context, Result};

use crate::cli::{Cli, SignerCommand};
use crate::commands::{config_path, load_config, resolve_access_node, resolve_network};
use crate::signer::{HashAlgorithm, LocalKeySigner, SecretKey, SignatureAlgorithm};
use crate::transaction::Address;

pub async fn run(cli: &Cli, cmd: &SignerCommand) -> Result<()> {
	match cmd {
		SignerCommand::Generate { algorithm } => generate(*algorithm),
		SignerCommand::Set { algorithm, hash } => set_signer(cli, *algorithm, *hash),
		SignerCommand::Status => show_status(cli),
	}
}

fn generate(algorithm: SignatureAlgorithm) -> Result<()> {
	let key = SecretKey::generate(algorithm);
	println!("Private key: {}", key.to_hex());
	println!("Public key:  {}", key.public_key_hex());
	println!();
	println!(
		"Register the public key on an account ({}), then run:",
		algorithm.flow_name()
	);
	println!("  rewards signer set --address <addr> --private-key <private key>");
	Ok(())
}

fn set_signer(cli: &Cli, algorithm: SignatureAlgorithm, hash: HashAlgorithm) -> Result<()> {
	let address: Address = cli
		.address
		.as_deref()
		.context("Pass the account with --address <addr>")?
		.parse()?;
	let key_index = cli.key_index.unwrap_or_default();
	let private_key = cli.private_key.as_deref();
	if let Some(pk) = private_key {
		// Fail now rather than at the first submission.
		LocalKeySigner::from_hex(address, key_index, pk, algorithm, hash)?;
	}

	let path = config_path(cli)?;
	let mut config = load_config(cli)?;
	config.signer.address = Some(address);
	config.signer.key_index = key_index;
	config.signer.algorithm = algorithm;
	config.signer.hash = hash;
	if let Some(pk) = private_key {
		config.signer.private_key = Some(pk.to_owned());
	}
	config.save_to(&path)?;

	println!(
		"Signer set to {address} (key {key_index}, {}/{}).",
		algorithm.flow_name(),
		hash.flow_name()
	);
	Ok(())
}

fn show_status(cli: &Cli) -> Result<()> {
	let config = load_config(cli)?;

	let address = config
		.signer
		.address
		.map(|a| a.to_string())
		.unwrap_or_else(|| "not set".into());
	let key = if cli.private_key.is_some() || config.signer.private_key.is_some() {
		"configured"
	} else {
		"missing"
	};

	println!("Signer");
	println!("  Address:     {address}");
	println!("  Key index:   {}", config.signer.key_index);
	println!("  Private key: {key}");
	println!("  Signature:   {}", config.signer.algorithm.flow_name());
	println!("  Hash:        {}", config.signer.hash.flow_name());
	println!("  Network:     {}", resolve_network(cli, &config));
	println!("  Access node: {}", resolve_access_node(cli, &config));
	Ok(())
}
