pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transaction::Address;

pub use local::{LocalKeySigner, SecretKey};

/// An authorization: the account a transaction acts for, plus the
/// ability to sign on that account's behalf.  Implementations may hold
/// a key locally or delegate to an external wallet.
#[async_trait]
pub trait Signer: Send + Sync {
	/// The account this signer controls.
	fn address(&self) -> Address;

	/// Index of the account key used for signing.
	fn key_index(&self) -> u32;

	/// Sign a domain-tagged message and return the raw signature bytes.
	async fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Curve of the account key.  Must match the signature algorithm
/// registered with the key on chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum SignatureAlgorithm {
	/// ECDSA over NIST P-256, the emulator and `flow init` default.
	#[default]
	#[serde(rename = "ecdsa_p256")]
	#[value(name = "ecdsa_p256")]
	EcdsaP256,
	#[serde(rename = "ecdsa_secp256k1")]
	#[value(name = "ecdsa_secp256k1")]
	EcdsaSecp256k1,
}

impl SignatureAlgorithm {
	/// Name used by Flow tooling and the access API.
	pub fn flow_name(&self) -> &'static str {
		match self {
			Self::EcdsaP256 => "ECDSA_P256",
			Self::EcdsaSecp256k1 => "ECDSA_secp256k1",
		}
	}
}

/// Hash applied to a message before ECDSA signing.  Must match the
/// hash algorithm registered with the account key on chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum HashAlgorithm {
	#[serde(rename = "sha2_256")]
	#[value(name = "sha2_256")]
	Sha2_256,
	#[default]
	#[serde(rename = "sha3_256")]
	#[value(name = "sha3_256")]
	Sha3_256,
}

impl HashAlgorithm {
	pub fn flow_name(&self) -> &'static str {
		match self {
			Self::Sha2_256 => "SHA2_256",
			Self::Sha3_256 => "SHA3_256",
		}
	}
}
