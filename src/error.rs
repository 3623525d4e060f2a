//! Crate-level error types shared by the limiter, the gated transport, and the client.

// self
use crate::{_prelude::*, auth::OAuthKind};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Rate limiter refused or abandoned a credit acquisition.
	#[error(transparent)]
	RateLimit(#[from] RateLimitError),
	/// Credential state does not allow the requested operation.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint answered with a non-success status.
	#[error("Authorization failed with status {status} (are all your details correct?).")]
	Authorization {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// Raw response body, kept for diagnostics.
		body: String,
	},
	/// Token endpoint responded with JSON that does not match the token response shape.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Rate limit must allow at least one call per period.
	#[error("Rate must be a positive number of calls.")]
	InvalidRate,
	/// Rate limit period must be a positive, finite duration.
	#[error("Rate limit period must be positive and finite.")]
	InvalidPeriod,
	/// The API requires a descriptive user agent.
	#[error("User agent must not be empty.")]
	MissingUserAgent,
	/// A domain or endpoint URL could not be built.
	#[error("URL is invalid.")]
	InvalidUrl(#[from] url::ParseError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Failures raised while acquiring rate limit credits.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RateLimitError {
	/// Credit count was negative or otherwise unusable.
	#[error("Credit count {value} is invalid.")]
	InvalidArgument {
		/// Rejected input.
		value: i64,
	},
	/// Credits could not be acquired before the caller's deadline.
	#[error("Timed out waiting for {credits} rate limit credit(s).")]
	TimedOut {
		/// Credits still missing when the deadline passed.
		credits: u32,
	},
}

/// Credential and authorization state failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthError {
	/// No credentials have been configured on the client.
	#[error("No OAuth credentials are configured.")]
	MissingCredentials,
	/// Credential kind does not use an authorization URL.
	#[error("OAuth kind `{kind}` does not use an authorization URL.")]
	NoAuthorizationUrl {
		/// Configured credential kind.
		kind: OAuthKind,
	},
	/// Authorization requires a code (or implicit token) that was not supplied.
	#[error("OAuth kind `{kind}` requires an authorization code.")]
	MissingCode {
		/// Configured credential kind.
		kind: OAuthKind,
	},
	/// Request was attempted before a valid authorization was obtained.
	#[error("Client must be authorized before making requests.")]
	NotAuthorized,
	/// Credential kind label is unknown.
	#[error("Invalid OAuth kind `{0}`.")]
	InvalidKind(String),
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn messages_render_context() {
		let err = Error::from(RateLimitError::TimedOut { credits: 2 });

		assert_eq!(err.to_string(), "Timed out waiting for 2 rate limit credit(s).");

		let err = Error::from(AuthError::NoAuthorizationUrl { kind: OAuthKind::Script });

		assert_eq!(err.to_string(), "OAuth kind `script` does not use an authorization URL.");
	}
}
