use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Addresses;
use crate::signer::{HashAlgorithm, SignatureAlgorithm};
use crate::transaction::Address;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub network: NetworkConfig,
	pub signer: SignerConfig,
	#[serde(default)]
	pub addresses: Addresses,
	#[serde(default)]
	pub templates: TemplatesConfig,
	/// Deployed contracts, keyed by network then contract name.
	#[serde(default)]
	pub deployments: BTreeMap<String, BTreeMap<String, Deployment>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
	pub default: String,
	pub emulator: String,
	pub testnet: String,
	pub mainnet: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignerConfig {
	pub address: Option<Address>,
	#[serde(default)]
	pub key_index: u32,
	/// Hex-encoded private key.
	pub private_key: Option<String>,
	#[serde(default)]
	pub algorithm: SignatureAlgorithm,
	#[serde(default)]
	pub hash: HashAlgorithm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
	/// Directory or HTTP(S) URL the catalog paths are resolved against.
	pub base: String,
}

impl Default for TemplatesConfig {
	fn default() -> Self {
		Self {
			base: "cadence".into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
	pub address: Address,
	pub tx_id: String,
	pub deployed_at: DateTime<Utc>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			network: NetworkConfig {
				default: "emulator".into(),
				emulator: "http://127.0.0.1:8888".into(),
				testnet: "https://rest-testnet.onflow.org".into(),
				mainnet: "https://rest-mainnet.onflow.org".into(),
			},
			signer: SignerConfig::default(),
			addresses: Addresses::default(),
			templates: TemplatesConfig::default(),
			deployments: BTreeMap::new(),
		}
	}
}

impl Config {
	/// Directory where CLI state is stored (~/.flow-rewards/).
	pub fn dir() -> anyhow::Result<PathBuf> {
		dirs::home_dir()
			.map(|h| h.join(".flow-rewards"))
			.context("could not determine home directory")
	}

	/// Path to the config file.
	pub fn path() -> anyhow::Result<PathBuf> {
		Ok(Self::dir()?.join("config.toml"))
	}

	/// Load config from `path`, falling back to defaults if no file exists.
	pub fn load_from(path: &Path) -> anyhow::Result<Self> {
		if path.exists() {
			let content = std::fs::read_to_string(path)
				.with_context(|| format!("reading {}", path.display()))?;
			toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
		} else {
			Ok(Self::default())
		}
	}

	/// Persist to `path`, creating the directory if needed.
	pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, toml::to_string_pretty(self)?)
			.with_context(|| format!("writing {}", path.display()))?;
		Ok(())
	}

	/// Return the access node URL for the given network name.
	pub fn access_node(&self, network: &str) -> &str {
		match network {
			"testnet" => &self.network.testnet,
			"mainnet" => &self.network.mainnet,
			_ => &self.network.emulator,
		}
	}

	pub fn record_deployment(&mut self, network: &str, contract: &str, deployment: Deployment) {
		self.deployments
			.entry(network.to_owned())
			.or_default()
			.insert(contract.to_owned(), deployment);
	}
}
