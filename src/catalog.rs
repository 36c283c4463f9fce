use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::loader::{Source, Substitution};
use crate::transaction::Address;

/// Accounts a template can refer to through a placeholder address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Account holding the fungible points token contract.
	#[value(name = "ft")]
	FungibleToken,
	/// Account holding the NFT contract.
	#[value(name = "nft")]
	NonFungibleToken,
	Rewards,
	Customer,
	Retailer,
}

impl Role {
	pub const ALL: [Role; 5] = [
		Role::FungibleToken,
		Role::NonFungibleToken,
		Role::Rewards,
		Role::Customer,
		Role::Retailer,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::FungibleToken => "ft",
			Self::NonFungibleToken => "nft",
			Self::Rewards => "rewards",
			Self::Customer => "customer",
			Self::Retailer => "retailer",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Address book mapping each role to a deployed account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Addresses {
	pub ft: Option<Address>,
	pub nft: Option<Address>,
	pub rewards: Option<Address>,
	pub customer: Option<Address>,
	pub retailer: Option<Address>,
}

impl Addresses {
	pub fn get(&self, role: Role) -> Option<Address> {
		match role {
			Role::FungibleToken => self.ft,
			Role::NonFungibleToken => self.nft,
			Role::Rewards => self.rewards,
			Role::Customer => self.customer,
			Role::Retailer => self.retailer,
		}
	}

	pub fn set(&mut self, role: Role, address: Address) {
		let slot = match role {
			Role::FungibleToken => &mut self.ft,
			Role::NonFungibleToken => &mut self.nft,
			Role::Rewards => &mut self.rewards,
			Role::Customer => &mut self.customer,
			Role::Retailer => &mut self.retailer,
		};
		*slot = Some(address);
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
	Contract,
	Transaction,
	Script,
}

impl fmt::Display for Kind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Contract => "contract",
			Self::Transaction => "transaction",
			Self::Script => "script",
		})
	}
}

/// A literal address in a template that stands in for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
	pub token: &'static str,
	pub role: Role,
}

const FT: Placeholder = Placeholder {
	token: "0x01",
	role: Role::FungibleToken,
};
const NFT: Placeholder = Placeholder {
	token: "0x02",
	role: Role::NonFungibleToken,
};
const REWARDS: Placeholder = Placeholder {
	token: "0x03",
	role: Role::Rewards,
};
const CUSTOMER: Placeholder = Placeholder {
	token: "0x04",
	role: Role::Customer,
};
const RETAILER: Placeholder = Placeholder {
	token: "0x05",
	role: Role::Retailer,
};

/// A Cadence template shipped with the rewards app.
#[derive(Debug)]
pub struct Template {
	pub name: &'static str,
	pub kind: Kind,
	/// Path relative to the templates base.
	pub path: &'static str,
	pub placeholders: &'static [Placeholder],
	pub description: &'static str,
}

impl Template {
	/// Build the substitution for this template from the address book.
	/// Templates without placeholders need none.
	pub fn substitution(&self, addresses: &Addresses) -> Result<Option<Substitution>> {
		let pairs = self
			.placeholders
			.iter()
			.map(|p| {
				addresses
					.get(p.role)
					.map(|a| (p.token, a.to_string()))
					.ok_or_else(|| Error::UnconfiguredRole(p.role.to_string()))
			})
			.collect::<Result<Vec<_>>>()?;
		Substitution::from_tokens(pairs)
	}

	/// Resolve the template against `base`, which is either an HTTP(S)
	/// URL or a local directory.
	pub fn source(&self, base: &str) -> Result<Source> {
		match Source::parse(base) {
			Source::Url(mut url) => {
				if !url.path().ends_with('/') {
					let dir = format!("{}/", url.path());
					url.set_path(&dir);
				}
				let joined: Url = url.join(self.path).map_err(|e| Error::Fetch {
					location: format!("{base} + {}", self.path),
					reason: e.to_string(),
				})?;
				Ok(Source::Url(joined))
			}
			Source::Path(dir) => Ok(Source::Path(dir.join(self.path))),
		}
	}
}

/// Every template the rewards app wires up.
pub static CATALOG: &[Template] = &[
	// -- Contracts --
	Template {
		name: "FTContract",
		kind: Kind::Contract,
		path: "contracts/FTContract.cdc",
		placeholders: &[],
		description: "Fungible loyalty-points token",
	},
	Template {
		name: "NFTContract",
		kind: Kind::Contract,
		path: "contracts/NFTContract.cdc",
		placeholders: &[],
		description: "NFT-based rewards",
	},
	Template {
		name: "RewardsContract",
		kind: Kind::Contract,
		path: "contracts/RewardsContract.cdc",
		placeholders: &[],
		description: "Retailer reward listings",
	},
	// -- Transactions --
	Template {
		name: "test",
		kind: Kind::Transaction,
		path: "transactions/test_transaction.cdc",
		placeholders: &[],
		description: "Smoke-test transaction",
	},
	Template {
		name: "setup-customer",
		kind: Kind::Transaction,
		path: "transactions/setup_for_customer.cdc",
		placeholders: &[FT, NFT],
		description: "Create the customer's vault and NFT collection",
	},
	Template {
		name: "setup-retailer",
		kind: Kind::Transaction,
		path: "transactions/setup_for_retailer.cdc",
		placeholders: &[FT, NFT, REWARDS],
		description: "Create the retailer's vault, collection and reward store",
	},
	Template {
		name: "earn-points",
		kind: Kind::Transaction,
		path: "transactions/earning_points.cdc",
		placeholders: &[FT, NFT, CUSTOMER],
		description: "Credit points to the customer",
	},
	Template {
		name: "create-reward",
		kind: Kind::Transaction,
		path: "transactions/create_reward.cdc",
		placeholders: &[REWARDS],
		description: "List a new reward",
	},
	Template {
		name: "spend-points",
		kind: Kind::Transaction,
		path: "transactions/spend_points.cdc",
		placeholders: &[FT, NFT, REWARDS, RETAILER],
		description: "Redeem points for a retailer's reward",
	},
	Template {
		name: "remove-reward",
		kind: Kind::Transaction,
		path: "transactions/remove_reward.cdc",
		placeholders: &[REWARDS],
		description: "Withdraw a reward listing",
	},
	Template {
		name: "trade",
		kind: Kind::Transaction,
		path: "transactions/trade.cdc",
		placeholders: &[FT, NFT, REWARDS],
		description: "Trade a reward NFT",
	},
	Template {
		name: "instagram-ad",
		kind: Kind::Transaction,
		path: "transactions/instagram_ad.cdc",
		placeholders: &[FT, NFT, CUSTOMER],
		description: "Credit points for a promoted post",
	},
	// -- Scripts --
	Template {
		name: "read-tokens",
		kind: Kind::Script,
		path: "scripts/readTokens.cdc",
		placeholders: &[FT, NFT, CUSTOMER],
		description: "Read the customer's point balance and reward NFTs",
	},
];

/// Look up a template by name and kind.
pub fn find(name: &str, kind: Kind) -> Option<&'static Template> {
	CATALOG.iter().find(|t| t.kind == kind && t.name == name)
}

/// Templates of one kind, in catalog order.
pub fn of_kind(kind: Kind) -> impl Iterator<Item = &'static Template> {
	CATALOG.iter().filter(move |t| t.kind == kind)
}
