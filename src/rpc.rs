use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::cadence::{self, Argument};
use crate::error::{Error, Result};
use crate::status::TxResult;
use crate::transaction::{Address, TransactionBody};

/// Identifier the access node assigns to an accepted transaction.
pub type TransactionId = String;

/// Thin client for the Flow Access Node REST API.
///
/// Every call is a single request; retries and timeouts beyond
/// reqwest's defaults belong to the caller.
#[derive(Clone)]
pub struct AccessClient {
	base: String,
	http: reqwest::Client,
}

/// The fields of an account key this client cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKey {
	pub index: u32,
	pub sequence_number: u64,
	pub revoked: bool,
}

impl AccessClient {
	pub fn new(url: &str) -> Self {
		Self::with_client(url, reqwest::Client::new())
	}

	pub fn with_client(url: &str, http: reqwest::Client) -> Self {
		Self {
			base: url.trim_end_matches('/').to_owned(),
			http,
		}
	}

	pub fn url(&self) -> &str {
		&self.base
	}

	// -- Chain state --

	/// ID of the latest sealed block, used as a transaction's reference
	/// block.
	pub async fn latest_sealed_block_id(&self) -> Result<[u8; 32]> {
		let resp = self
			.http
			.get(format!("{}/v1/blocks", self.base))
			.query(&[("height", "sealed")])
			.send()
			.await
			.map_err(unreachable_node)?;
		let blocks: Vec<Value> = parse_json(resp).await?;

		let id = blocks
			.first()
			.and_then(|b| b.pointer("/header/id"))
			.and_then(Value::as_str)
			.ok_or_else(|| Error::Decode("block response has no header id".into()))?;

		let mut out = [0u8; 32];
		hex::decode_to_slice(id, &mut out).map_err(|e| Error::Decode(format!("block id: {e}")))?;
		Ok(out)
	}

	/// Look up one key of an account, including its current sequence
	/// number.
	pub async fn account_key(&self, address: Address, key_index: u32) -> Result<AccountKey> {
		let resp = self
			.http
			.get(format!("{}/v1/accounts/{}", self.base, address.hex()))
			.query(&[("expand", "keys")])
			.send()
			.await
			.map_err(unreachable_node)?;
		let account: AccountResponse = parse_json(resp).await?;

		account
			.keys
			.into_iter()
			.map(AccountKey::try_from)
			.collect::<Result<Vec<_>>>()?
			.into_iter()
			.find(|k| k.index == key_index)
			.ok_or_else(|| {
				Error::Submission(format!("account {address} has no key with index {key_index}"))
			})
	}

	// -- Transactions --

	pub async fn send_transaction(&self, body: &TransactionBody) -> Result<TransactionId> {
		let resp = self
			.http
			.post(format!("{}/v1/transactions", self.base))
			.json(&body.to_request())
			.send()
			.await
			.map_err(unreachable_node)?;
		let sent: Value = parse_json(resp).await?;

		let id = sent
			.get("id")
			.and_then(Value::as_str)
			.ok_or_else(|| Error::Decode("transaction response has no id".into()))?;
		debug!(id, "transaction accepted by access node");
		Ok(id.to_owned())
	}

	pub async fn transaction_result(&self, id: &str) -> Result<TxResult> {
		let resp = self
			.http
			.get(format!("{}/v1/transaction_results/{id}", self.base))
			.send()
			.await
			.map_err(unreachable_node)?;
		parse_json(resp).await
	}

	// -- Scripts --

	/// Run a read-only script against the latest sealed state.
	pub async fn execute_script(&self, code: &str, args: &[Argument]) -> Result<cadence::Value> {
		let body = json!({
			"script": STANDARD.encode(code.as_bytes()),
			"arguments": args.iter().map(|a| STANDARD.encode(a.encode())).collect::<Vec<_>>(),
		});
		let resp = self
			.http
			.post(format!("{}/v1/scripts", self.base))
			.query(&[("block_height", "sealed")])
			.json(&body)
			.send()
			.await
			.map_err(unreachable_node)?;

		// The result is a JSON string holding base64 JSON-Cadence.
		let encoded: String = parse_json(resp).await?;
		let raw = STANDARD
			.decode(encoded.trim())
			.map_err(|e| Error::Decode(format!("script result: {e}")))?;
		cadence::Value::decode(&raw)
	}
}

// -- Wire types --

#[derive(Deserialize)]
struct AccountResponse {
	#[serde(default)]
	keys: Vec<KeyResponse>,
}

/// Numbers arrive as decimal strings.
#[derive(Deserialize)]
struct KeyResponse {
	index: String,
	sequence_number: String,
	#[serde(default)]
	revoked: bool,
}

impl TryFrom<KeyResponse> for AccountKey {
	type Error = Error;

	fn try_from(k: KeyResponse) -> Result<Self> {
		let num = |field: &str, v: &str| {
			v.parse::<u64>()
				.map_err(|e| Error::Decode(format!("account key {field}: {e}")))
		};
		let index = num("index", &k.index)?;
		Ok(Self {
			index: u32::try_from(index)
				.map_err(|_| Error::Decode(format!("account key index {index} out of range")))?,
			sequence_number: num("sequence_number", &k.sequence_number)?,
			revoked: k.revoked,
		})
	}
}

// -- Private helpers --

fn unreachable_node(e: reqwest::Error) -> Error {
	Error::Submission(format!("access node unreachable: {e}"))
}

/// Decode a successful response, or turn an error response into a
/// `Submission` error carrying the node's own message.
async fn parse_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
	let status = resp.status();
	let text = resp
		.text()
		.await
		.map_err(|e| Error::Submission(format!("reading response: {e}")))?;

	if !status.is_success() {
		return Err(Error::Submission(node_message(status, &text)));
	}

	serde_json::from_str(&text).map_err(|e| Error::Decode(e.to_string()))
}

fn node_message(status: StatusCode, body: &str) -> String {
	let message = serde_json::from_str::<Value>(body)
		.ok()
		.and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
		.unwrap_or_else(|| body.trim().to_owned());
	format!("HTTP {status}: {message}")
}
