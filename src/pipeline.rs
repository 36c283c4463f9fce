use tracing::{debug, info};

use crate::cadence::{self, Argument};
use crate::error::{Error, Result};
use crate::loader::{CodeLoader, Source, Substitution};
use crate::rpc::{AccessClient, TransactionId};
use crate::session::Session;
use crate::transaction::{ProposalKey, TransactionBody};

/// Installs hex-encoded contract code into the signing account.
pub const DEPLOY_TRANSACTION: &str = r#"transaction(code: String) {
	prepare(acct: AuthAccount) {
		acct.setCode(code.decodeHex())
	}
}
"#;

/// Adds two integers; handy for checking the node is answering scripts.
pub const SUM_SCRIPT: &str = r#"pub fun main(a: Int, b: Int): Int {
	return a + b
}
"#;

/// Load → substitute → sign → submit.
///
/// Holds no per-call state: concurrent calls each fetch their own code
/// and build their own transaction.
#[derive(Clone)]
pub struct Pipeline {
	loader: CodeLoader,
	access: AccessClient,
}

impl Pipeline {
	pub fn new(loader: CodeLoader, access: AccessClient) -> Self {
		Self { loader, access }
	}

	pub fn access(&self) -> &AccessClient {
		&self.access
	}

	/// Load a transaction template and submit it with the session's
	/// authorization as proposer, payer and sole authorizer.
	pub async fn run_transaction(
		&self,
		session: &Session,
		source: &Source,
		substitution: Option<&Substitution>,
		arguments: &[Argument],
	) -> Result<TransactionId> {
		let code = self.loader.load(source, substitution).await?;
		let args = arguments.iter().map(Argument::encode).collect();
		self.submit(session, code, args).await
	}

	/// Load contract code and install it into the session's account.
	pub async fn deploy_contract(
		&self,
		session: &Session,
		source: &Source,
		substitution: Option<&Substitution>,
	) -> Result<TransactionId> {
		let code = self.loader.load(source, substitution).await?;
		debug!(%source, bytes = code.len(), "encoding contract for deployment");
		let encoded = Argument::String(hex::encode(code.as_bytes()));
		self.submit(session, DEPLOY_TRANSACTION.to_owned(), vec![encoded.encode()])
			.await
	}

	/// Load a script template and run it against sealed state.
	pub async fn execute_script(
		&self,
		source: &Source,
		substitution: Option<&Substitution>,
		arguments: &[Argument],
	) -> Result<cadence::Value> {
		let code = self.loader.load(source, substitution).await?;
		self.access.execute_script(&code, arguments).await
	}

	/// Sign and send `script` as a single-signer transaction.
	pub async fn submit(
		&self,
		session: &Session,
		script: String,
		arguments: Vec<Vec<u8>>,
	) -> Result<TransactionId> {
		let auth = session.authorization();
		let (address, key_index) = (auth.address(), auth.key_index());

		let reference_block_id = self.access.latest_sealed_block_id().await?;
		let key = self.access.account_key(address, key_index).await?;
		if key.revoked {
			return Err(Error::Submission(format!(
				"key {key_index} of {address} is revoked"
			)));
		}

		let mut body = TransactionBody::single_signer(
			script,
			arguments,
			reference_block_id,
			ProposalKey {
				address,
				key_index,
				sequence_number: key.sequence_number,
			},
		);

		let signature = auth.sign(&body.envelope_message()).await?;
		body.add_envelope_signature(address, key_index, signature);

		let id = self.access.send_transaction(&body).await?;
		info!(%id, %address, sequence = key.sequence_number, "transaction submitted");
		Ok(id)
	}
}
