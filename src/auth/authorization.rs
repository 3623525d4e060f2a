//! Access tokens issued by the token endpoint and their lifetimes.

// self
use crate::{_prelude::*, auth::Secret};

/// Access token plus the metadata needed to judge its freshness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
	/// Token type reported by the provider (usually `bearer`).
	pub token_type: String,
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Instant the token was received.
	pub received_at: OffsetDateTime,
	/// Lifetime granted by the provider.
	pub expires_in: Duration,
}
impl Authorization {
	/// Creates an authorization received at `received_at`.
	pub fn new(
		token_type: impl Into<String>,
		access_token: impl Into<Secret>,
		received_at: OffsetDateTime,
		expires_in: Duration,
	) -> Self {
		Self {
			token_type: token_type.into(),
			access_token: access_token.into(),
			received_at,
			expires_in,
		}
	}

	/// Creates a bearer authorization, as delivered by the implicit flow.
	pub fn bearer(
		access_token: impl Into<Secret>,
		received_at: OffsetDateTime,
		expires_in: Duration,
	) -> Self {
		Self::new("bearer", access_token, received_at, expires_in)
	}

	/// Instant after which the token must not be used.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.received_at + self.expires_in
	}

	/// Returns `true` once `instant` reaches the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at()
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}

/// Token endpoint success payload.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
	pub(crate) token_type: String,
	pub(crate) access_token: String,
	pub(crate) expires_in: i64,
}
impl TokenResponse {
	pub(crate) fn into_authorization(self, received_at: OffsetDateTime) -> Authorization {
		Authorization::new(
			self.token_type,
			self.access_token,
			received_at,
			Duration::seconds(self.expires_in),
		)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn expiry_is_relative_to_receipt() {
		let received_at = datetime!(2025-01-01 00:00 UTC);
		let auth = Authorization::bearer("token", received_at, Duration::hours(1));

		assert_eq!(auth.expires_at(), datetime!(2025-01-01 01:00 UTC));
		assert!(!auth.is_expired_at(datetime!(2025-01-01 00:59:59 UTC)));
		assert!(auth.is_expired_at(datetime!(2025-01-01 01:00 UTC)));
		assert_eq!(auth.token_type, "bearer");
	}

	#[test]
	fn token_response_maps_fields() {
		let response: TokenResponse = serde_json::from_str(
			r#"{"access_token":"abc","token_type":"bearer","expires_in":3600,"scope":"*"}"#,
		)
		.expect("Token response should deserialize.");
		let received_at = datetime!(2025-03-01 12:00 UTC);
		let auth = response.into_authorization(received_at);

		assert_eq!(auth.access_token.expose(), "abc");
		assert_eq!(auth.expires_in, Duration::hours(1));
	}
}
