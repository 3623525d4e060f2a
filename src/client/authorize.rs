//! Token negotiation for every credential kind.
//!
//! [`Client::authorize`] turns the configured [`Credentials`] into an [`Authorization`]:
//! implicit apps already hold their token, every other kind posts its grant to the token
//! endpoint through the gated session. Calls on one client are serialized so concurrent
//! callers never race each other for the credentials slot.

// self
use crate::{
	_prelude::*,
	auth::{Authorization, Credentials, GrantType, OAuth, Secret, TokenResponse},
	client::Client,
	error::{AuthError, ConfigError},
	http::{ApiRequest, ApiResponse, BasicAuth, Session},
	limit::Throttle,
	obs::{self, FlowOutcome, FlowSpan},
};

const ACCESS_TOKEN_PATH: &str = "api/v1/access_token";

/// Inputs collected from the authorization redirect.
#[derive(Clone, Debug)]
pub struct AuthorizeParams {
	/// Authorization code (explicit apps) or access token (implicit apps).
	pub code: Option<String>,
	/// Lifetime of an implicit token, as reported in the redirect.
	pub expires_in: Duration,
}
impl AuthorizeParams {
	const DEFAULT_EXPIRES_IN: Duration = Duration::seconds(3_600);

	/// Parameters for kinds that need no redirect input (script and app-only kinds).
	pub fn new() -> Self {
		Self { code: None, expires_in: Self::DEFAULT_EXPIRES_IN }
	}

	/// Supplies the code (or implicit token) returned in the redirect.
	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = Some(code.into());

		self
	}

	/// Overrides the implicit token lifetime (defaults to one hour).
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_in = expires_in;

		self
	}
}
impl Default for AuthorizeParams {
	fn default() -> Self {
		Self::new()
	}
}

impl<S, L> Client<S, L>
where
	S: ?Sized + Session,
	L: ?Sized + Throttle,
{
	/// Obtains an authorization for the configured credentials and stores it alongside them.
	///
	/// If the credentials are replaced while the request is in flight, the new authorization
	/// is dropped instead of being attached to the wrong credentials.
	pub async fn authorize(&self, params: AuthorizeParams) -> Result<()> {
		let _serialized = self.authorize_guard.lock().await;
		let oauth = self.credentials().ok_or(AuthError::MissingCredentials)?;
		let grant = GrantType::for_kind(oauth.kind());
		let span = FlowSpan::new(grant, "authorize");

		obs::record_flow_outcome(grant, FlowOutcome::Attempt);

		let result = span.instrument(self.negotiate(&oauth, grant, &params)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(grant, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(grant, FlowOutcome::Failure),
		}

		let authorization = result?;

		if let Some(current) =
			self.auth.lock().as_mut().filter(|current| current.credentials == oauth.credentials)
		{
			current.authorization = Some(authorization);
		}

		Ok(())
	}

	async fn negotiate(
		&self,
		oauth: &OAuth,
		grant: GrantType,
		params: &AuthorizeParams,
	) -> Result<Authorization> {
		let kind = oauth.kind();
		let code = || params.code.clone().ok_or(AuthError::MissingCode { kind });
		let mut form = BTreeMap::from([("grant_type".to_owned(), grant.as_str().to_owned())]);
		let client_auth = match &oauth.credentials {
			Credentials::Implicit { .. } =>
				return Ok(Authorization::bearer(
					code()?,
					OffsetDateTime::now_utc(),
					params.expires_in,
				)),
			Credentials::Script { client_id, client_secret, username, password } => {
				form.insert("scope".into(), oauth.scope_param());
				form.insert("username".into(), username.clone());
				form.insert("password".into(), password.expose().to_owned());

				BasicAuth::new(client_id.as_str(), client_secret.clone())
			},
			Credentials::Explicit { client_id, client_secret, redirect_uri, .. } => {
				form.insert("code".into(), code()?);
				form.insert("redirect_uri".into(), redirect_uri.to_string());

				BasicAuth::new(client_id.as_str(), client_secret.clone())
			},
			Credentials::ApplicationExplicit { client_id, client_secret } =>
				BasicAuth::new(client_id.as_str(), client_secret.clone()),
			Credentials::ApplicationInstalled { client_id, device_id } => {
				form.insert("device_id".into(), device_id.clone());

				BasicAuth::new(client_id.as_str(), Secret::default())
			},
		};
		let url = self.domain.www.join(ACCESS_TOKEN_PATH).map_err(ConfigError::from)?;
		let mut request = ApiRequest::new(url).with_basic_auth(client_auth);

		request.form = form;

		let response = self.session.post(request).await?;

		parse_token_response(&response, OffsetDateTime::now_utc())
	}
}

/// Decodes a token endpoint response received at `received_at`.
fn parse_token_response(
	response: &ApiResponse,
	received_at: OffsetDateTime,
) -> Result<Authorization> {
	if !response.is_ok() {
		return Err(Error::Authorization { status: response.status, body: response.text() });
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
	let token: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::TokenResponseParse { source, status: response.status })?;

	Ok(token.into_authorization(received_at))
}
