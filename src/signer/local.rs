use async_trait::async_trait;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::Error as EcdsaError;
use sha2::{Digest, Sha256};
use sha3::Sha3_256;

use super::{HashAlgorithm, SignatureAlgorithm, Signer};
use crate::error::{Error, Result};
use crate::transaction::Address;

/// An ECDSA private key on one of the curves Flow accounts use.
#[derive(Clone)]
pub enum SecretKey {
	P256(p256::ecdsa::SigningKey),
	Secp256k1(k256::ecdsa::SigningKey),
}

impl SecretKey {
	/// Fresh random key.
	pub fn generate(algorithm: SignatureAlgorithm) -> Self {
		let mut rng = rand::rngs::OsRng;
		match algorithm {
			SignatureAlgorithm::EcdsaP256 => Self::P256(p256::ecdsa::SigningKey::random(&mut rng)),
			SignatureAlgorithm::EcdsaSecp256k1 => {
				Self::Secp256k1(k256::ecdsa::SigningKey::random(&mut rng))
			}
		}
	}

	/// Parse a hex-encoded 32-byte scalar (optional `0x`).
	pub fn from_hex(algorithm: SignatureAlgorithm, private_key: &str) -> Result<Self> {
		let clean = private_key.trim();
		let clean = clean.strip_prefix("0x").unwrap_or(clean);
		let bytes = hex::decode(clean).map_err(|e| Error::Signing(format!("private key is not hex: {e}")))?;
		let invalid = |e: EcdsaError| Error::Signing(format!("invalid private key: {e}"));

		Ok(match algorithm {
			SignatureAlgorithm::EcdsaP256 => {
				Self::P256(p256::ecdsa::SigningKey::from_slice(&bytes).map_err(invalid)?)
			}
			SignatureAlgorithm::EcdsaSecp256k1 => {
				Self::Secp256k1(k256::ecdsa::SigningKey::from_slice(&bytes).map_err(invalid)?)
			}
		})
	}

	pub fn algorithm(&self) -> SignatureAlgorithm {
		match self {
			Self::P256(_) => SignatureAlgorithm::EcdsaP256,
			Self::Secp256k1(_) => SignatureAlgorithm::EcdsaSecp256k1,
		}
	}

	pub fn to_hex(&self) -> String {
		match self {
			Self::P256(k) => hex::encode(k.to_bytes()),
			Self::Secp256k1(k) => hex::encode(k.to_bytes()),
		}
	}

	/// Uncompressed public key without the SEC1 tag byte: the 64-byte
	/// form used when adding a key to a Flow account.
	pub fn public_key_hex(&self) -> String {
		match self {
			Self::P256(k) => hex::encode(&k.verifying_key().to_encoded_point(false).as_bytes()[1..]),
			Self::Secp256k1(k) => {
				hex::encode(&k.verifying_key().to_encoded_point(false).as_bytes()[1..])
			}
		}
	}

	/// Sign a 32-byte digest; the result is `r || s`.
	pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<Vec<u8>> {
		let signing = |e: EcdsaError| Error::Signing(e.to_string());
		match self {
			Self::P256(k) => {
				let sig: p256::ecdsa::Signature = k.sign_prehash(digest).map_err(signing)?;
				Ok(sig.to_bytes().to_vec())
			}
			Self::Secp256k1(k) => {
				let sig: k256::ecdsa::Signature = k.sign_prehash(digest).map_err(signing)?;
				Ok(sig.to_bytes().to_vec())
			}
		}
	}
}

/// Signs with an ECDSA key held in memory.
///
/// Intended for the emulator service account (P-256 with SHA3-256 by
/// default) and test accounts, where the key lives in the local config
/// rather than in a wallet.
pub struct LocalKeySigner {
	address: Address,
	key_index: u32,
	key: SecretKey,
	hash: HashAlgorithm,
}

impl LocalKeySigner {
	pub fn new(address: Address, key_index: u32, key: SecretKey, hash: HashAlgorithm) -> Self {
		Self {
			address,
			key_index,
			key,
			hash,
		}
	}

	/// Build from a hex-encoded 32-byte private key (optional `0x`).
	pub fn from_hex(
		address: Address,
		key_index: u32,
		private_key: &str,
		algorithm: SignatureAlgorithm,
		hash: HashAlgorithm,
	) -> Result<Self> {
		let key = SecretKey::from_hex(algorithm, private_key)?;
		Ok(Self::new(address, key_index, key, hash))
	}

	pub fn public_key_hex(&self) -> String {
		self.key.public_key_hex()
	}

	fn digest(&self, message: &[u8]) -> [u8; 32] {
		match self.hash {
			HashAlgorithm::Sha2_256 => Sha256::digest(message).into(),
			HashAlgorithm::Sha3_256 => Sha3_256::digest(message).into(),
		}
	}
}

#[async_trait]
impl Signer for LocalKeySigner {
	fn address(&self) -> Address {
		self.address
	}

	fn key_index(&self) -> u32 {
		self.key_index
	}

	async fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
		self.key.sign_prehash(&self.digest(message))
	}
}
