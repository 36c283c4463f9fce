use anyhow::Result;

use crate::catalog::Kind;
use crate::cli::{Cli, TemplateArgs, WaitArgs};
use crate::commands::{
	await_execution, build_pipeline, config_path, load_config, resolve_network, resolve_session,
	resolve_template,
};
use crate::config::Deployment;

/// Deploy a contract, wait for it to execute, and record where it went.
pub async fn run(cli: &Cli, contract: &str, template: &TemplateArgs, wait: &WaitArgs) -> Result<()> {
	let mut config = load_config(cli)?;
	let network = resolve_network(cli, &config);
	let session = resolve_session(cli, &config)?;
	let pipeline = build_pipeline(cli, &config);
	let (source, substitution) = resolve_template(cli, &config, Kind::Contract, contract, template)?;

	println!("Deploying {contract} from {source} to {}", session.current_user().address);
	let tx_id = pipeline
		.deploy_contract(&session, &source, substitution.as_ref())
		.await?;

	if await_execution(pipeline.access(), &tx_id, wait).await?.is_some() {
		println!("{contract} was deployed.");
		config.record_deployment(
			&network,
			contract,
			Deployment {
				address: session.current_user().address,
				tx_id,
				deployed_at: chrono::Utc::now(),
			},
		);
		config.save_to(&config_path(cli)?)?;
	}

	Ok(())
}
