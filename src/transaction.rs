use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rlp::RlpStream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Computation limit attached to every transaction this client sends.
pub const GAS_LIMIT: u64 = 100;

/// Domain separation tag prepended to every signed transaction message,
/// right-padded with zeros to 32 bytes.
const TRANSACTION_DOMAIN_TAG: &[u8] = b"FLOW-V0.0-transaction";

/// An 8-byte Flow account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 8]);

impl Address {
	pub const fn new(bytes: [u8; 8]) -> Self {
		Self(bytes)
	}

	pub fn as_bytes(&self) -> &[u8; 8] {
		&self.0
	}

	/// Bare 16-digit hex, the form the REST API expects.
	pub fn hex(&self) -> String {
		hex::encode(self.0)
	}
}

impl FromStr for Address {
	type Err = Error;

	/// Accepts an optional `0x` prefix; short input is left-padded, so
	/// `0x01` is the same account as `0x0000000000000001`.
	fn from_str(s: &str) -> Result<Self> {
		let clean = s.strip_prefix("0x").unwrap_or(s);
		if clean.is_empty() || clean.len() > 16 {
			return Err(Error::InvalidAddress(s.to_owned()));
		}
		let padded = format!("{clean:0>16}");
		let mut out = [0u8; 8];
		hex::decode_to_slice(&padded, &mut out).map_err(|_| Error::InvalidAddress(s.to_owned()))?;
		Ok(Self(out))
	}
}

impl TryFrom<String> for Address {
	type Error = Error;

	fn try_from(s: String) -> Result<Self> {
		s.parse()
	}
}

impl From<Address> for String {
	fn from(a: Address) -> Self {
		a.to_string()
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", self.hex())
	}
}

/// The account key whose sequence number orders this transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalKey {
	pub address: Address,
	pub key_index: u32,
	pub sequence_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature {
	pub address: Address,
	pub key_index: u32,
	pub signature: Vec<u8>,
}

/// Everything handed to the access node for one transaction.
///
/// Built fresh for each submission and dropped once the node has
/// accepted (or rejected) it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBody {
	pub script: String,
	/// JSON-Cadence encoded arguments.
	pub arguments: Vec<Vec<u8>>,
	pub reference_block_id: [u8; 32],
	pub gas_limit: u64,
	pub proposal_key: ProposalKey,
	pub payer: Address,
	pub authorizers: Vec<Address>,
	pub payload_signatures: Vec<TransactionSignature>,
	pub envelope_signatures: Vec<TransactionSignature>,
}

impl TransactionBody {
	/// A transaction where one account proposes, pays and is the sole
	/// authorizer, with the fixed [`GAS_LIMIT`].
	pub fn single_signer(
		script: String,
		arguments: Vec<Vec<u8>>,
		reference_block_id: [u8; 32],
		proposal_key: ProposalKey,
	) -> Self {
		let account = proposal_key.address;
		Self {
			script,
			arguments,
			reference_block_id,
			gas_limit: GAS_LIMIT,
			proposal_key,
			payer: account,
			authorizers: vec![account],
			payload_signatures: Vec::new(),
			envelope_signatures: Vec::new(),
		}
	}

	/// Message the payer signs: domain tag followed by the RLP envelope
	/// (payload plus any payload signatures).
	pub fn envelope_message(&self) -> Vec<u8> {
		let mut s = RlpStream::new_list(2);
		self.append_payload(&mut s);

		let signers = self.signers();
		s.begin_list(self.payload_signatures.len());
		for sig in &self.payload_signatures {
			let signer_index = signers
				.iter()
				.position(|a| *a == sig.address)
				.unwrap_or_default() as u64;
			s.begin_list(3);
			s.append(&signer_index);
			s.append(&u64::from(sig.key_index));
			s.append(&sig.signature);
		}

		with_domain_tag(&s.out())
	}

	/// Message signed by proposers/authorizers that are not the payer.
	pub fn payload_message(&self) -> Vec<u8> {
		let mut s = RlpStream::new();
		self.append_payload(&mut s);
		with_domain_tag(&s.out())
	}

	pub fn add_envelope_signature(&mut self, address: Address, key_index: u32, signature: Vec<u8>) {
		self.envelope_signatures.push(TransactionSignature {
			address,
			key_index,
			signature,
		});
	}

	/// Distinct signing accounts in canonical order: proposer, payer,
	/// then authorizers.
	fn signers(&self) -> Vec<Address> {
		let mut out = Vec::with_capacity(2 + self.authorizers.len());
		for addr in [self.proposal_key.address, self.payer]
			.into_iter()
			.chain(self.authorizers.iter().copied())
		{
			if !out.contains(&addr) {
				out.push(addr);
			}
		}
		out
	}

	fn append_payload(&self, s: &mut RlpStream) {
		s.begin_list(9);
		s.append(&self.script.as_bytes().to_vec());
		s.begin_list(self.arguments.len());
		for arg in &self.arguments {
			s.append(arg);
		}
		s.append(&self.reference_block_id.to_vec());
		s.append(&self.gas_limit);
		s.append(&self.proposal_key.address.as_bytes().to_vec());
		s.append(&u64::from(self.proposal_key.key_index));
		s.append(&self.proposal_key.sequence_number);
		s.append(&self.payer.as_bytes().to_vec());
		s.begin_list(self.authorizers.len());
		for auth in &self.authorizers {
			s.append(&auth.as_bytes().to_vec());
		}
	}

	/// JSON body for `POST /v1/transactions`.
	pub fn to_request(&self) -> Value {
		json!({
			"script": STANDARD.encode(self.script.as_bytes()),
			"arguments": self.arguments.iter().map(|a| STANDARD.encode(a)).collect::<Vec<_>>(),
			"reference_block_id": hex::encode(self.reference_block_id),
			"gas_limit": self.gas_limit.to_string(),
			"payer": self.payer.hex(),
			"proposal_key": {
				"address": self.proposal_key.address.hex(),
				"key_index": self.proposal_key.key_index.to_string(),
				"sequence_number": self.proposal_key.sequence_number.to_string(),
			},
			"authorizers": self.authorizers.iter().map(Address::hex).collect::<Vec<_>>(),
			"payload_signatures": signatures_json(&self.payload_signatures),
			"envelope_signatures": signatures_json(&self.envelope_signatures),
		})
	}
}

fn signatures_json(sigs: &[TransactionSignature]) -> Vec<Value> {
	sigs.iter()
		.map(|s| {
			json!({
				"address": s.address.hex(),
				"key_index": s.key_index.to_string(),
				"signature": STANDARD.encode(&s.signature),
			})
		})
		.collect()
}

fn with_domain_tag(encoded: &[u8]) -> Vec<u8> {
	let mut out = vec![0u8; 32];
	out[..TRANSACTION_DOMAIN_TAG.len()].copy_from_slice(TRANSACTION_DOMAIN_TAG);
	out.extend_from_slice(encoded);
	out
}
