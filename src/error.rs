use thiserror::Error;

/// Failures surfaced by the load / sign / submit pipeline.
///
/// Nothing here is retried internally; every variant reaches the caller
/// as a failed result and nothing is submitted after a failure.
#[derive(Debug, Error)]
pub enum Error {
	/// The template source could not be retrieved (network error, non-2xx
	/// response, missing file).
	#[error("failed to fetch {location}: {reason}")]
	Fetch { location: String, reason: String },

	/// The template bytes are not valid UTF-8 text.
	#[error("template is not valid text: {0}")]
	Encoding(String),

	/// A pattern match had no entry in the replacement map.
	#[error("no replacement configured for placeholder `{token}`")]
	MissingSubstitution { token: String },

	#[error("invalid Flow address `{0}`")]
	InvalidAddress(String),

	/// A template needs an address for a role the address book lacks.
	#[error("no address configured for role `{0}`")]
	UnconfiguredRole(String),

	#[error("invalid argument `{0}`")]
	InvalidArgument(String),

	#[error("invalid substitution pattern: {0}")]
	InvalidPattern(#[from] regex::Error),

	/// The access node rejected a request or could not be reached.
	#[error("submission rejected: {0}")]
	Submission(String),

	#[error("signing failed: {0}")]
	Signing(String),

	/// The transaction executed but reported an error.
	#[error("transaction {id} failed: {message}")]
	TransactionFailed { id: String, message: String },

	#[error("transaction {id} expired before it was sealed")]
	Expired { id: String },

	/// A node response could not be decoded.
	#[error("could not decode response: {0}")]
	Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
