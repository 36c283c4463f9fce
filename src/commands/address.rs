use anyhow::Result;

use crate::catalog::Role;
use crate::cli::{AddressCommand, Cli};
use crate::commands::{config_path, load_config};
use crate::transaction::Address;

pub async fn run(cli: &Cli, cmd: &AddressCommand) -> Result<()> {
	match cmd {
		AddressCommand::Set { role, account } => {
			let address: Address = account.parse()?;
			let path = config_path(cli)?;
			let mut config = load_config(cli)?;
			config.addresses.set(*role, address);
			config.save_to(&path)?;
			println!("{role} -> {address}");
			Ok(())
		}
		AddressCommand::List => {
			let config = load_config(cli)?;
			for role in Role::ALL {
				let addr = config
					.addresses
					.get(role)
					.map(|a| a.to_string())
					.unwrap_or_else(|| "not set".into());
				println!("{:<10} {addr}", role.as_str());
			}
			Ok(())
		}
	}
}
