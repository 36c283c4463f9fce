use std::sync::Arc;

use crate::signer::Signer;
use crate::transaction::Address;

/// The user the client is acting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
	pub address: Address,
	pub network: String,
}

/// An authenticated wallet session.
///
/// Passed explicitly into every operation that needs to sign; the
/// authorization is shared read-only between concurrent submissions.
#[derive(Clone)]
pub struct Session {
	user: CurrentUser,
	authorization: Arc<dyn Signer>,
}

impl Session {
	pub fn new(network: impl Into<String>, authorization: Arc<dyn Signer>) -> Self {
		Self {
			user: CurrentUser {
				address: authorization.address(),
				network: network.into(),
			},
			authorization,
		}
	}

	pub fn current_user(&self) -> &CurrentUser {
		&self.user
	}

	pub fn authorization(&self) -> &dyn Signer {
		self.authorization.as_ref()
	}
}
