//! Grant types sent to the token endpoint.

// self
use crate::{_prelude::*, auth::OAuthKind};

/// Token endpoint grants issued for each credential kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantType {
	/// Resource owner password grant used by script apps.
	Password,
	/// Authorization code exchange used by explicit web apps.
	AuthorizationCode,
	/// Token delivered in the redirect fragment; no token request is made.
	Implicit,
	/// App-only grant for confidential clients.
	ClientCredentials,
	/// App-only grant for installed clients identified by a device id.
	InstalledClient,
}
impl GrantType {
	/// Value sent as `grant_type` to the token endpoint.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::Password => "password",
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::Implicit => "implicit",
			GrantType::ClientCredentials => "client_credentials",
			GrantType::InstalledClient => "https://oauth.reddit.com/grants/installed_client",
		}
	}

	/// Short label suitable for span or metric fields.
	pub const fn label(self) -> &'static str {
		match self {
			GrantType::InstalledClient => "installed_client",
			other => other.as_str(),
		}
	}

	/// Grant used to authorize the given credential kind.
	pub const fn for_kind(kind: OAuthKind) -> Self {
		match kind {
			OAuthKind::Script => GrantType::Password,
			OAuthKind::Explicit => GrantType::AuthorizationCode,
			OAuthKind::Implicit => GrantType::Implicit,
			OAuthKind::ApplicationExplicit => GrantType::ClientCredentials,
			OAuthKind::ApplicationInstalled => GrantType::InstalledClient,
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
