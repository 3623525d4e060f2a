//! Rate-limited API client.
//!
//! [`Client`] owns the configured hosts, the current OAuth credentials, and a [`Session`]
//! wrapped in a [`Gate`] whose `get` and `post` members draw from a shared [`TokenBucket`].
//! Every request the client sends, token requests included, therefore respects the
//! configured budget.

pub mod authorize;
pub mod config;

pub use authorize::*;
pub use config::*;

// self
use crate::{
	_prelude::*,
	auth::{Credentials, OAuth},
	error::{AuthError, ConfigError},
	http::{self, ApiRequest, ApiResponse, Session},
	limit::{Gate, Throttle, TokenBucket},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestSession;

const AUTHORIZE_PATH: &str = "api/v1/authorize";

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = Client<ReqwestSession>;

/// API client gating every request through a shared rate limiter.
pub struct Client<S, L = TokenBucket>
where
	S: ?Sized + Session,
	L: ?Sized + Throttle,
{
	user_agent: String,
	domain: Domain,
	session: Gate<Arc<S>, L>,
	auth: Mutex<Option<OAuth>>,
	authorize_guard: AsyncMutex<()>,
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestSession> {
	/// Creates a client with a reqwest transport sending the configured user agent.
	pub fn new(config: ClientConfig) -> Result<Self> {
		let session = ReqwestSession::new(&config.user_agent)?;

		Self::with_session(config, session)
	}
}
impl<S> Client<S>
where
	S: ?Sized + Session,
{
	/// Creates a client over a caller-provided transport, with a bucket built from
	/// `config.rate_limit`.
	pub fn with_session(config: ClientConfig, session: impl Into<Arc<S>>) -> Result<Self> {
		config.validate()?;

		let limiter = Arc::new(TokenBucket::from_config(&config.rate_limit)?);

		Ok(Self::with_limiter(config, session, limiter))
	}
}
impl<S, L> Client<S, L>
where
	S: ?Sized + Session,
	L: ?Sized + Throttle,
{
	/// Creates a client drawing from an existing limiter; `config.rate_limit` is ignored.
	pub fn with_limiter(
		config: ClientConfig,
		session: impl Into<Arc<S>>,
		limiter: Arc<L>,
	) -> Self {
		Self {
			user_agent: config.user_agent,
			domain: config.domain,
			session: Gate::new(session.into(), limiter, [http::GET, http::POST]),
			auth: Mutex::new(None),
			authorize_guard: AsyncMutex::new(()),
		}
	}

	/// User agent the client was configured with.
	pub fn user_agent(&self) -> &str {
		&self.user_agent
	}

	/// Hosts used for authorization and API calls.
	pub fn domain(&self) -> &Domain {
		&self.domain
	}

	/// Replaces the hosts used for authorization and API calls.
	pub fn set_domain(&mut self, domain: Domain) {
		self.domain = domain;
	}

	/// Shared limiter every request draws from.
	pub fn limiter(&self) -> &Arc<L> {
		self.session.limiter()
	}

	/// Gated transport.
	pub fn session(&self) -> &Gate<Arc<S>, L> {
		&self.session
	}

	/// Replaces the configured credentials and returns the previous ones.
	pub fn oauth(&self, oauth: Option<OAuth>) -> Option<OAuth> {
		std::mem::replace(&mut *self.auth.lock(), oauth)
	}

	/// Current credentials and authorization, if configured.
	pub fn credentials(&self) -> Option<OAuth> {
		self.auth.lock().clone()
	}

	/// Returns `true` when credentials carry an unexpired authorization.
	pub fn is_authorized(&self) -> bool {
		self.auth.lock().as_ref().is_some_and(OAuth::is_authorized)
	}

	/// Builds the page URL a user visits to grant access to an explicit or implicit app.
	pub fn auth_url(&self, state: &str) -> Result<Url> {
		let auth = self.auth.lock();
		let oauth = auth.as_ref().ok_or(AuthError::MissingCredentials)?;
		let (response_type, redirect_uri, mobile, duration) = match &oauth.credentials {
			Credentials::Explicit { redirect_uri, mobile, duration, .. } =>
				("code", redirect_uri, *mobile, Some(*duration)),
			Credentials::Implicit { redirect_uri, mobile, .. } =>
				("token", redirect_uri, *mobile, None),
			credentials =>
				return Err(AuthError::NoAuthorizationUrl { kind: credentials.kind() }.into()),
		};
		let path = if mobile { format!("{AUTHORIZE_PATH}.compact") } else { AUTHORIZE_PATH.into() };
		let mut url = self.domain.www.join(&path).map_err(ConfigError::from)?;

		{
			let mut query = url.query_pairs_mut();

			query
				.append_pair("client_id", oauth.credentials.client_id())
				.append_pair("response_type", response_type)
				.append_pair("state", state)
				.append_pair("redirect_uri", redirect_uri.as_str())
				.append_pair("scope", &oauth.scope_param());

			if let Some(duration) = duration {
				query.append_pair("duration", duration.as_str());
			}
		}

		Ok(url)
	}

	/// Sends an authorized GET to `path` on the API host.
	///
	/// The raw response is returned whatever its status.
	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		let token = {
			let auth = self.auth.lock();

			auth.as_ref()
				.filter(|oauth| oauth.is_authorized())
				.and_then(|oauth| oauth.authorization.as_ref())
				.map(|authorization| authorization.access_token.clone())
				.ok_or(AuthError::NotAuthorized)?
		};
		let url = self.domain.auth.join(path).map_err(ConfigError::from)?;
		let response = self.session.get(ApiRequest::new(url).with_bearer(token)).await?;

		Ok(response)
	}
}
impl<S, L> Debug for Client<S, L>
where
	S: ?Sized + Session,
	L: ?Sized + Throttle,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let auth = self.auth.lock();

		f.debug_struct("Client")
			.field("user_agent", &self.user_agent)
			.field("domain", &self.domain)
			.field("kind", &auth.as_ref().map(OAuth::kind))
			.field("authorized", &auth.as_ref().is_some_and(OAuth::is_authorized))
			.finish()
	}
}
