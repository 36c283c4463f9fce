use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tracing::info;

use crate::cadence;
use crate::error::{Error, Result};
use crate::rpc::{AccessClient, TransactionId};

/// Default gap between two status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of a submitted transaction, in the order the node reports
/// them.  `Expired` is terminal and sits outside the happy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub enum TxStatus {
	Unknown,
	Pending,
	Finalized,
	Executed,
	Sealed,
	Expired,
}

impl TxStatus {
	/// Whether this status is at or past `target` on the happy path.
	pub fn reached(self, target: TxStatus) -> bool {
		self != TxStatus::Expired && self >= target
	}
}

impl fmt::Display for TxStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

/// One emitted event; `payload` is base64 JSON-Cadence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub payload: String,
}

impl Event {
	pub fn decode_payload(&self) -> Result<cadence::Value> {
		let raw = STANDARD
			.decode(&self.payload)
			.map_err(|e| Error::Decode(format!("event payload: {e}")))?;
		cadence::Value::decode(&raw)
	}
}

/// Snapshot of a transaction as reported by the access node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TxResult {
	pub status: TxStatus,
	#[serde(default)]
	pub status_code: u32,
	#[serde(default)]
	pub error_message: String,
	#[serde(default)]
	pub events: Vec<Event>,
}

impl TxResult {
	/// Execution reported an error.
	pub fn failed(&self) -> bool {
		self.status_code != 0 || !self.error_message.is_empty()
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self.status, TxStatus::Sealed | TxStatus::Expired) || self.failed()
	}
}

struct Poll {
	last: Option<TxStatus>,
	first: bool,
	done: bool,
}

/// Follow a transaction until it reaches a terminal state.
///
/// Yields each distinct status once, then ends after `Sealed`,
/// `Expired` or an execution error.  A failed poll is yielded as an
/// error and also ends the stream.  Dropping the stream stops polling.
pub fn subscribe(
	access: AccessClient,
	id: TransactionId,
	interval: Duration,
) -> impl Stream<Item = Result<TxResult>> + Send + 'static {
	let start = Poll {
		last: None,
		first: true,
		done: false,
	};

	stream::unfold(start, move |mut st| {
		let access = access.clone();
		let id = id.clone();
		async move {
			if st.done {
				return None;
			}
			loop {
				if !st.first {
					tokio::time::sleep(interval).await;
				}
				st.first = false;

				let result = match access.transaction_result(&id).await {
					Ok(r) => r,
					Err(e) => {
						st.done = true;
						return Some((Err(e), st));
					}
				};

				if result.is_terminal() {
					st.done = true;
					info!(%id, status = %result.status, "transaction reached terminal state");
					return Some((Ok(result), st));
				}
				if st.last != Some(result.status) {
					st.last = Some(result.status);
					info!(%id, status = %result.status, "transaction status changed");
					return Some((Ok(result), st));
				}
			}
		}
	})
}

/// Wait until the transaction is at least `target`.
///
/// Fails with `TransactionFailed` if execution reports an error and with
/// `Expired` if the node drops it.
pub async fn wait_for(
	access: &AccessClient,
	id: &str,
	target: TxStatus,
	interval: Duration,
) -> Result<TxResult> {
	let updates = subscribe(access.clone(), id.to_owned(), interval);
	futures::pin_mut!(updates);

	while let Some(update) = updates.next().await {
		let result = update?;
		if result.failed() {
			return Err(Error::TransactionFailed {
				id: id.to_owned(),
				message: result.error_message,
			});
		}
		if result.status == TxStatus::Expired {
			return Err(Error::Expired { id: id.to_owned() });
		}
		if result.status.reached(target) {
			return Ok(result);
		}
	}

	Err(Error::Submission(format!(
		"status updates for {id} ended before {target}"
	)))
}
