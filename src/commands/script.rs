use anyhow::Result;

use crate::cadence::Argument;
use crate::catalog::Kind;
use crate::cli::{Cli, ScriptCommand};
use crate::commands::tx::parse_arguments;
use crate::commands::{build_pipeline, load_config, resolve_template};
use crate::pipeline::SUM_SCRIPT;

pub async fn run(cli: &Cli, cmd: &ScriptCommand) -> Result<()> {
	let config = load_config(cli)?;
	let pipeline = build_pipeline(cli, &config);

	match cmd {
		ScriptCommand::Run {
			name,
			template,
			args,
		} => {
			let (source, substitution) =
				resolve_template(cli, &config, Kind::Script, name, template)?;
			let arguments = parse_arguments(args)?;

			let value = pipeline
				.execute_script(&source, substitution.as_ref(), &arguments)
				.await?;
			println!("{value}");
			Ok(())
		}
		ScriptCommand::Sum { a, b } => {
			let args = [Argument::Int(a.to_string()), Argument::Int(b.to_string())];
			let value = pipeline.access().execute_script(SUM_SCRIPT, &args).await?;
			println!("Computation result: {value}");
			Ok(())
		}
	}
}
