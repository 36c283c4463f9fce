use anyhow::Result;

use crate::catalog::{of_kind, Kind};

pub fn run() -> Result<()> {
	for (kind, heading) in [
		(Kind::Contract, "Contracts (rewards deploy <name>)"),
		(Kind::Transaction, "Transactions (rewards tx run <name>)"),
		(Kind::Script, "Scripts (rewards script run <name>)"),
	] {
		println!("{heading}");
		for t in of_kind(kind) {
			let roles: Vec<&str> = t.placeholders.iter().map(|p| p.role.as_str()).collect();
			if roles.is_empty() {
				println!("  {:<16} {}", t.name, t.description);
			} else {
				println!("  {:<16} {} [{}]", t.name, t.description, roles.join(", "));
			}
		}
		println!();
	}
	Ok(())
}
