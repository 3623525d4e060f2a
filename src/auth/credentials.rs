//! OAuth application credentials, one shape per application kind.

// self
use crate::{
	_prelude::*,
	auth::{Authorization, Secret},
	error::AuthError,
};

/// Application kinds the API distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OAuthKind {
	/// Personal script authenticating with the owner's username and password.
	#[serde(rename = "script")]
	Script,
	/// Web app using the authorization code flow.
	#[serde(rename = "explicit")]
	Explicit,
	/// Browser or mobile app receiving the token directly in the redirect.
	#[serde(rename = "implicit")]
	Implicit,
	/// Confidential app acting on its own behalf.
	#[serde(rename = "application/explicit")]
	ApplicationExplicit,
	/// Installed app acting on its own behalf, identified by a device id.
	#[serde(rename = "application/installed")]
	ApplicationInstalled,
}
impl OAuthKind {
	/// Returns the label used by the API documentation and in configuration files.
	pub const fn as_str(self) -> &'static str {
		match self {
			OAuthKind::Script => "script",
			OAuthKind::Explicit => "explicit",
			OAuthKind::Implicit => "implicit",
			OAuthKind::ApplicationExplicit => "application/explicit",
			OAuthKind::ApplicationInstalled => "application/installed",
		}
	}
}
impl Display for OAuthKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for OAuthKind {
	type Err = AuthError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		[
			OAuthKind::Script,
			OAuthKind::Explicit,
			OAuthKind::Implicit,
			OAuthKind::ApplicationExplicit,
			OAuthKind::ApplicationInstalled,
		]
		.into_iter()
		.find(|kind| kind.as_str() == s)
		.ok_or_else(|| AuthError::InvalidKind(s.to_owned()))
	}
}

/// How long an explicit grant should remain usable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDuration {
	/// Access token only.
	#[default]
	Temporary,
	/// Access token plus a refresh token.
	Permanent,
}
impl AccessDuration {
	/// Value sent as the `duration` authorization parameter.
	pub const fn as_str(self) -> &'static str {
		match self {
			AccessDuration::Temporary => "temporary",
			AccessDuration::Permanent => "permanent",
		}
	}
}

/// Credentials required by each [`OAuthKind`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Credentials {
	/// Script app credentials.
	#[serde(rename = "script")]
	Script {
		/// Application identifier.
		client_id: String,
		/// Application secret.
		client_secret: Secret,
		/// Account the script runs as.
		username: String,
		/// Password of that account.
		password: Secret,
	},
	/// Web app credentials.
	#[serde(rename = "explicit")]
	Explicit {
		/// Application identifier.
		client_id: String,
		/// Application secret.
		client_secret: Secret,
		/// Registered redirect URI.
		redirect_uri: Url,
		/// Requests the compact (mobile) authorization page.
		#[serde(default)]
		mobile: bool,
		/// Requested grant lifetime.
		#[serde(default)]
		duration: AccessDuration,
	},
	/// Implicit grant credentials.
	#[serde(rename = "implicit")]
	Implicit {
		/// Application identifier.
		client_id: String,
		/// Registered redirect URI.
		redirect_uri: Url,
		/// Requests the compact (mobile) authorization page.
		#[serde(default)]
		mobile: bool,
	},
	/// Confidential app-only credentials.
	#[serde(rename = "application/explicit")]
	ApplicationExplicit {
		/// Application identifier.
		client_id: String,
		/// Application secret.
		client_secret: Secret,
	},
	/// Installed app-only credentials.
	#[serde(rename = "application/installed")]
	ApplicationInstalled {
		/// Application identifier.
		client_id: String,
		/// Unique, per-device identifier (20-30 characters).
		device_id: String,
	},
}
impl Credentials {
	/// Application kind these credentials belong to.
	pub const fn kind(&self) -> OAuthKind {
		match self {
			Credentials::Script { .. } => OAuthKind::Script,
			Credentials::Explicit { .. } => OAuthKind::Explicit,
			Credentials::Implicit { .. } => OAuthKind::Implicit,
			Credentials::ApplicationExplicit { .. } => OAuthKind::ApplicationExplicit,
			Credentials::ApplicationInstalled { .. } => OAuthKind::ApplicationInstalled,
		}
	}

	/// Application identifier.
	pub fn client_id(&self) -> &str {
		match self {
			Credentials::Script { client_id, .. }
			| Credentials::Explicit { client_id, .. }
			| Credentials::Implicit { client_id, .. }
			| Credentials::ApplicationExplicit { client_id, .. }
			| Credentials::ApplicationInstalled { client_id, .. } => client_id,
		}
	}
}

/// Credentials, requested scopes, and the authorization obtained with them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth {
	/// Application credentials.
	pub credentials: Credentials,
	/// Scopes requested during authorization.
	pub scopes: Vec<String>,
	/// Authorization issued for these credentials, if any.
	#[serde(default)]
	pub authorization: Option<Authorization>,
}
impl OAuth {
	/// Pairs credentials with the scopes to request.
	pub fn new<I>(credentials: Credentials, scopes: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		Self { credentials, scopes: scopes.into_iter().map(Into::into).collect(), authorization: None }
	}

	/// Application kind of the credentials.
	pub const fn kind(&self) -> OAuthKind {
		self.credentials.kind()
	}

	/// Scopes joined the way the API expects them.
	pub fn scope_param(&self) -> String {
		self.scopes.join(",")
	}

	/// Returns `true` when an unexpired authorization is present at `now`.
	pub fn is_authorized_at(&self, now: OffsetDateTime) -> bool {
		self.authorization.as_ref().is_some_and(|auth| !auth.is_expired_at(now))
	}

	/// Returns `true` when an unexpired authorization is present.
	pub fn is_authorized(&self) -> bool {
		self.is_authorized_at(OffsetDateTime::now_utc())
	}
}
