//! Transport seam for outbound API calls.
//!
//! The crate never speaks HTTP itself. Callers provide a [`Session`] (the crate ships
//! [`ReqwestSession`] behind the default `reqwest` feature) and the client wraps it in a
//! [`Gate`] so both [`GET`] and [`POST`] draw a credit from the shared rate limiter before
//! the request leaves the process.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::TransportError,
	limit::{Gate, Throttle},
};

/// Member name of [`Session::get`], as listed in a [`Gate`]'s member set.
pub const GET: &str = "get";
/// Member name of [`Session::post`], as listed in a [`Gate`]'s member set.
pub const POST: &str = "post";

/// Boxed future returned by [`Session`] calls.
pub type SessionFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// HTTP transport used for token requests and authorized API calls.
///
/// Implementations send `form` as an `application/x-www-form-urlencoded` body on `post`, and
/// attach [`ApiRequest::authorization_header`] when it is present. Non-success statuses are
/// returned as responses, not errors.
pub trait Session
where
	Self: Send + Sync,
{
	/// Performs a GET request.
	fn get(&self, request: ApiRequest) -> SessionFuture<'_>;

	/// Performs a POST request.
	fn post(&self, request: ApiRequest) -> SessionFuture<'_>;
}

/// Gates [`Session::get`] and [`Session::post`] when their names are in the member set.
impl<S, L> Session for Gate<Arc<S>, L>
where
	S: ?Sized + Session,
	L: ?Sized + Throttle,
{
	fn get(&self, request: ApiRequest) -> SessionFuture<'_> {
		Box::pin(self.call(GET, move |session| session.get(request)))
	}

	fn post(&self, request: ApiRequest) -> SessionFuture<'_> {
		Box::pin(self.call(POST, move |session| session.post(request)))
	}
}

/// HTTP Basic client authentication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicAuth {
	/// Client identifier.
	pub username: String,
	/// Client secret; empty for installed clients.
	pub password: Secret,
}
impl BasicAuth {
	/// Creates credentials for the `Authorization: Basic` header.
	pub fn new(username: impl Into<String>, password: impl Into<Secret>) -> Self {
		Self { username: username.into(), password: password.into() }
	}

	/// Encoded header value.
	pub fn header_value(&self) -> String {
		let raw = format!("{}:{}", self.username, self.password.expose());

		format!("Basic {}", STANDARD.encode(raw))
	}
}

/// Transport-agnostic request description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// Absolute request URL.
	pub url: Url,
	/// Client authentication for token requests.
	pub basic_auth: Option<BasicAuth>,
	/// Access token for authorized API calls.
	pub bearer: Option<Secret>,
	/// Form fields sent as the request body.
	pub form: BTreeMap<String, String>,
}
impl ApiRequest {
	/// Creates a request for `url` without authentication or body.
	pub fn new(url: Url) -> Self {
		Self { url, basic_auth: None, bearer: None, form: BTreeMap::new() }
	}

	/// Attaches HTTP Basic client authentication.
	pub fn with_basic_auth(mut self, auth: BasicAuth) -> Self {
		self.basic_auth = Some(auth);

		self
	}

	/// Attaches a bearer access token.
	pub fn with_bearer(mut self, token: Secret) -> Self {
		self.bearer = Some(token);

		self
	}

	/// Adds (or replaces) a form field.
	pub fn with_form_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.form.insert(key.into(), value.into());

		self
	}

	/// Value of the `Authorization` header, preferring the bearer token.
	pub fn authorization_header(&self) -> Option<String> {
		if let Some(token) = &self.bearer {
			return Some(format!("bearer {}", token.expose()));
		}

		self.basic_auth.as_ref().map(BasicAuth::header_value)
	}
}

/// Status and raw body of a response; decoding is left to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for `200 OK`, the only status the token endpoint uses for success.
	pub fn is_ok(&self) -> bool {
		self.status == 200
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// [`Session`] backed by a shared [`ReqwestClient`].
///
/// Token endpoints answer directly, so a custom client should not follow redirects.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestSession(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestSession {
	/// Builds a client that sends `user_agent` with every request.
	pub fn new(user_agent: &str) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.user_agent(user_agent)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn send(&self, builder: reqwest::RequestBuilder) -> Result<ApiResponse, TransportError> {
		let response = builder.send().await?;
		let status = response.status().as_u16();
		let body = response.bytes().await?.to_vec();

		Ok(ApiResponse { status, body })
	}

	fn authorize(builder: reqwest::RequestBuilder, request: &ApiRequest) -> reqwest::RequestBuilder {
		match request.authorization_header() {
			Some(value) => builder.header(reqwest::header::AUTHORIZATION, value),
			None => builder,
		}
	}
}
#[cfg(feature = "reqwest")]
impl Session for ReqwestSession {
	fn get(&self, request: ApiRequest) -> SessionFuture<'_> {
		Box::pin(async move {
			let builder = Self::authorize(self.0.get(request.url.clone()), &request);

			self.send(builder).await
		})
	}

	fn post(&self, request: ApiRequest) -> SessionFuture<'_> {
		Box::pin(async move {
			let builder =
				Self::authorize(self.0.post(request.url.clone()), &request).form(&request.form);

			self.send(builder).await
		})
	}
}
