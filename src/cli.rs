use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::catalog::Role;
use crate::signer::{HashAlgorithm, SignatureAlgorithm};

#[derive(Parser)]
#[command(
	name = "rewards",
	about = "Deploy and drive the loyalty-points rewards contracts on Flow.",
	version
)]
pub struct Cli {
	/// Network to connect to.
	#[arg(long, global = true)]
	pub network: Option<Network>,

	/// Override access node URL.
	#[arg(long, global = true)]
	pub access_node: Option<String>,

	/// Override the signing account address.
	#[arg(long, global = true)]
	pub address: Option<String>,

	/// Override the signing key index.
	#[arg(long, global = true)]
	pub key_index: Option<u32>,

	/// Hex-encoded private key for the signing account.
	#[arg(long, env = "FLOW_PRIVATE_KEY", global = true, hide_env_values = true)]
	pub private_key: Option<String>,

	/// Directory or URL the template catalog is resolved against.
	#[arg(long, global = true)]
	pub templates: Option<String>,

	/// Use a config file other than ~/.flow-rewards/config.toml.
	#[arg(long, env = "FLOW_REWARDS_CONFIG", global = true)]
	pub config: Option<PathBuf>,

	/// Log debug output (RUST_LOG takes precedence).
	#[arg(short, long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Network {
	Emulator,
	Testnet,
	Mainnet,
}

impl Network {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Emulator => "emulator",
			Self::Testnet => "testnet",
			Self::Mainnet => "mainnet",
		}
	}
}

#[derive(Subcommand)]
pub enum Command {
	/// Manage the signing account.
	Signer {
		#[command(subcommand)]
		command: SignerCommand,
	},

	/// Manage the role address book used for placeholder substitution.
	Address {
		#[command(subcommand)]
		command: AddressCommand,
	},

	/// Deploy a contract into the signing account.
	Deploy {
		/// Contract name from the catalog (FTContract, NFTContract, RewardsContract).
		contract: String,

		#[command(flatten)]
		template: TemplateArgs,

		#[command(flatten)]
		wait: WaitArgs,
	},

	/// Run and inspect transactions.
	Tx {
		#[command(subcommand)]
		command: TxCommand,
	},

	/// Run read-only scripts.
	Script {
		#[command(subcommand)]
		command: ScriptCommand,
	},

	/// List the templates in the catalog.
	Catalog,
}

/// Where a template comes from and how it is rewritten.
#[derive(clap::Args, Clone, Default)]
pub struct TemplateArgs {
	/// Load from this URL or path instead of the catalog location.
	#[arg(long)]
	pub source: Option<String>,

	/// Extra literal replacement, TOKEN=VALUE. May be repeated.
	#[arg(long = "replace", value_name = "TOKEN=VALUE")]
	pub replacements: Vec<String>,
}

#[derive(clap::Args, Clone)]
pub struct WaitArgs {
	/// Return as soon as the node accepts the transaction.
	#[arg(long)]
	pub no_wait: bool,

	/// Give up waiting after this many seconds.
	#[arg(long, default_value = "60")]
	pub timeout: u64,
}

// -- Signer subcommands --

#[derive(Subcommand)]
pub enum SignerCommand {
	/// Generate a new key pair.
	Generate {
		/// Curve for the new key.
		#[arg(long = "sig-algo", value_enum, default_value = "ecdsa_p256")]
		algorithm: SignatureAlgorithm,
	},

	/// Store the signing account given by --address, --key-index and
	/// --private-key in config.
	Set {
		/// Signature algorithm registered for the key.
		#[arg(long = "sig-algo", value_enum, default_value = "ecdsa_p256")]
		algorithm: SignatureAlgorithm,

		/// Hash algorithm registered for the key.
		#[arg(long, value_enum, default_value = "sha3_256")]
		hash: HashAlgorithm,
	},

	/// Show current signer configuration.
	Status,
}

// -- Address subcommands --

#[derive(Subcommand)]
pub enum AddressCommand {
	/// Assign an account to a role.
	Set {
		role: Role,

		/// Account address (0x-prefixed).
		account: String,
	},

	/// Show the address book.
	List,
}

// -- Tx subcommands --

#[derive(Subcommand)]
pub enum TxCommand {
	/// Run a catalog transaction.
	Run {
		/// Transaction name (see `rewards catalog`).
		name: String,

		#[command(flatten)]
		template: TemplateArgs,

		/// Transaction argument as Type:value. May be repeated.
		#[arg(long = "arg", value_name = "TYPE:VALUE")]
		args: Vec<String>,

		#[command(flatten)]
		wait: WaitArgs,
	},

	/// Check the current status of a transaction.
	Status {
		/// Transaction ID.
		tx_id: String,
	},

	/// Follow a transaction until it is sealed.
	Watch {
		/// Transaction ID.
		tx_id: String,

		/// Give up after this many seconds.
		#[arg(long, default_value = "120")]
		timeout: u64,
	},
}

// -- Script subcommands --

#[derive(Subcommand)]
pub enum ScriptCommand {
	/// Run a catalog script.
	Run {
		/// Script name (see `rewards catalog`).
		name: String,

		#[command(flatten)]
		template: TemplateArgs,

		/// Script argument as Type:value. May be repeated.
		#[arg(long = "arg", value_name = "TYPE:VALUE")]
		args: Vec<String>,
	},

	/// Add two integers on chain.
	Sum {
		#[arg(allow_negative_numbers = true)]
		a: i64,
		#[arg(allow_negative_numbers = true)]
		b: i64,
	},
}
