//! Client configuration and its builder.

// self
use crate::{_prelude::*, error::ConfigError, limit::LimitConfig};

/// Default host for authorization pages and token requests.
pub const WWW_DOMAIN: &str = "https://www.reddit.com/";
/// Default host for authorized API calls.
pub const AUTH_DOMAIN: &str = "https://oauth.reddit.com/";

/// Pair of hosts the client talks to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
	/// Host serving authorization pages and the token endpoint.
	pub www: Url,
	/// Host serving authorized API calls.
	pub auth: Url,
}

/// Settings needed to construct a [`Client`](crate::client::Client).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// User agent sent with every request.
	pub user_agent: String,
	/// Hosts used for authorization and API calls.
	pub domain: Domain,
	/// Outbound request budget.
	#[serde(default)]
	pub rate_limit: LimitConfig,
}
impl ClientConfig {
	/// Creates a builder for the provided user agent.
	pub fn builder(user_agent: impl Into<String>) -> ClientConfigBuilder {
		ClientConfigBuilder::new(user_agent)
	}

	/// Checks invariants that deserialized configurations may violate.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.user_agent.trim().is_empty() {
			return Err(ConfigError::MissingUserAgent);
		}

		self.rate_limit.policy().map(|_| ())
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// User agent sent with every request.
	pub user_agent: String,
	/// Optional override of [`WWW_DOMAIN`].
	pub www_domain: Option<Url>,
	/// Optional override of [`AUTH_DOMAIN`].
	pub auth_domain: Option<Url>,
	/// Outbound request budget.
	pub rate_limit: LimitConfig,
}
impl ClientConfigBuilder {
	/// Creates a builder with the default hosts and rate limit.
	pub fn new(user_agent: impl Into<String>) -> Self {
		Self {
			user_agent: user_agent.into(),
			www_domain: None,
			auth_domain: None,
			rate_limit: LimitConfig::default(),
		}
	}

	/// Overrides the authorization host.
	pub fn www_domain(mut self, url: Url) -> Self {
		self.www_domain = Some(url);

		self
	}

	/// Overrides the API host.
	pub fn auth_domain(mut self, url: Url) -> Self {
		self.auth_domain = Some(url);

		self
	}

	/// Overrides the outbound request budget.
	pub fn rate_limit(mut self, rate_limit: LimitConfig) -> Self {
		self.rate_limit = rate_limit;

		self
	}

	/// Validates the inputs and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let www = match self.www_domain {
			Some(url) => url,
			None => Url::parse(WWW_DOMAIN)?,
		};
		let auth = match self.auth_domain {
			Some(url) => url,
			None => Url::parse(AUTH_DOMAIN)?,
		};
		let config = ClientConfig {
			user_agent: self.user_agent,
			domain: Domain { www, auth },
			rate_limit: self.rate_limit,
		};

		config.validate()?;

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builder_applies_defaults() {
		let config = ClientConfig::builder("linux:oauth2-gate:v0.1 (by /u/tester)")
			.build()
			.expect("Default configuration should build.");

		assert_eq!(config.domain.www.as_str(), WWW_DOMAIN);
		assert_eq!(config.domain.auth.as_str(), AUTH_DOMAIN);
		assert_eq!(config.rate_limit, LimitConfig::default());
	}

	#[test]
	fn builder_rejects_invalid_inputs() {
		assert!(matches!(
			ClientConfig::builder("  ").build(),
			Err(ConfigError::MissingUserAgent)
		));
		assert!(matches!(
			ClientConfig::builder("agent")
				.rate_limit(LimitConfig { rate: 0, period: 1., bursty: true })
				.build(),
			Err(ConfigError::InvalidRate)
		));
	}

	#[test]
	fn config_deserializes_with_default_rate_limit() {
		let config: ClientConfig = serde_json::from_str(
			r#"{
				"user_agent": "agent",
				"domain": { "www": "https://www.example.com/", "auth": "https://api.example.com/" }
			}"#,
		)
		.expect("Client config should deserialize.");

		assert_eq!(config.rate_limit, LimitConfig::default());
		config.validate().expect("Deserialized config should be valid.");
	}
}
