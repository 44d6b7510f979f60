//! Immutable credential, auth, and client configuration with up-front validation.
//!
//! [`ClientConfig::builder`] collects every value before validating, so a single
//! [`ConfigError::MissingFields`] names all empty fields at once instead of failing on the first.
//! Endpoints fall back to the [`Product`] defaults when left unset.

// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

/// Default HTTP timeout applied to every call, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
/// Default window before expiry at which auth material is renewed.
pub const DEFAULT_REFRESH_LEAD: Duration = Duration::seconds(10);
/// Default lifetime of a signature authorization value.
pub const DEFAULT_SIGNATURE_LIFETIME: Duration = Duration::minutes(5);

const IDENTITY_TOKEN_ENDPOINT: &str = "https://api.expediagroup.com/identity/oauth2/v3/token/";

/// Platform products served by the runtime core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Product {
	/// Fraud prevention APIs; authenticated with OAuth 2.0 client credentials.
	FraudPrevention,
	/// Rapid lodging APIs; authenticated with a signature header.
	Rapid,
}
impl Product {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Product::FraudPrevention => "fraud_prevention",
			Product::Rapid => "rapid",
		}
	}

	/// API endpoint used when none is configured.
	pub const fn default_endpoint(self) -> &'static str {
		match self {
			Product::FraudPrevention => "https://api.expediagroup.com/",
			Product::Rapid => "https://api.ean.com/v3/",
		}
	}

	/// Token endpoint used when none is configured.
	pub const fn default_auth_endpoint(self) -> &'static str {
		IDENTITY_TOKEN_ENDPOINT
	}

	/// Auth strategy the product expects.
	pub const fn auth_method(self) -> AuthMethod {
		match self {
			Product::FraudPrevention => AuthMethod::OAuth2,
			Product::Rapid => AuthMethod::Signature,
		}
	}
}
impl Display for Product {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Auth strategy variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthMethod {
	/// OAuth 2.0 client-credentials bearer tokens.
	OAuth2,
	/// SHA-512 signature header.
	Signature,
}
impl AuthMethod {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthMethod::OAuth2 => "oauth2",
			AuthMethod::Signature => "signature",
		}
	}
}

/// Key/secret pair identifying a partner account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	key: String,
	secret: Secret,
}
impl Credentials {
	/// Validates and wraps a key/secret pair.
	pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Result<Self, ConfigError> {
		let key = key.into();
		let secret = secret.into();
		let mut fields = Vec::new();

		if key.trim().is_empty() {
			fields.push("key");
		}
		if secret.trim().is_empty() {
			fields.push("secret");
		}
		if !fields.is_empty() {
			return Err(ConfigError::MissingFields { fields });
		}

		Ok(Self { key, secret: Secret::new(secret) })
	}

	/// Public key half of the pair.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Secret half of the pair.
	pub fn secret(&self) -> &Secret {
		&self.secret
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials").field("key", &self.key).field("secret", &self.secret).finish()
	}
}

/// Inputs shared by both auth strategies.
#[derive(Clone, Debug)]
pub struct AuthConfig {
	credentials: Credentials,
	auth_endpoint: Url,
	refresh_lead: Duration,
	signature_lifetime: Duration,
}
impl AuthConfig {
	/// Builds an auth configuration with the default refresh lead and signature lifetime.
	pub fn new(credentials: Credentials, auth_endpoint: Url) -> Self {
		Self {
			credentials,
			auth_endpoint,
			refresh_lead: DEFAULT_REFRESH_LEAD,
			signature_lifetime: DEFAULT_SIGNATURE_LIFETIME,
		}
	}

	/// Overrides the refresh lead.
	pub fn with_refresh_lead(mut self, lead: Duration) -> Self {
		self.refresh_lead = lead;

		self
	}

	/// Overrides the signature lifetime.
	pub fn with_signature_lifetime(mut self, lifetime: Duration) -> Self {
		self.signature_lifetime = lifetime;

		self
	}

	/// Credential pair.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// OAuth 2.0 token endpoint.
	pub fn auth_endpoint(&self) -> &Url {
		&self.auth_endpoint
	}

	/// Window before expiry at which material is renewed.
	pub fn refresh_lead(&self) -> Duration {
		self.refresh_lead
	}

	/// Lifetime of a signature authorization value.
	pub fn signature_lifetime(&self) -> Duration {
		self.signature_lifetime
	}
}

/// Validated client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	product: Product,
	auth_method: AuthMethod,
	auth: AuthConfig,
	endpoint: Url,
	request_timeout: StdDuration,
}
impl ClientConfig {
	/// Starts a builder seeded with the product defaults.
	pub fn builder(product: Product) -> ClientConfigBuilder {
		ClientConfigBuilder::new(product)
	}

	/// Product this configuration targets.
	pub fn product(&self) -> Product {
		self.product
	}

	/// Auth strategy selected for the client.
	pub fn auth_method(&self) -> AuthMethod {
		self.auth_method
	}

	/// Auth inputs.
	pub fn auth(&self) -> &AuthConfig {
		&self.auth
	}

	/// API base endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Per-call HTTP timeout.
	pub fn request_timeout(&self) -> StdDuration {
		self.request_timeout
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	product: Product,
	auth_method: Option<AuthMethod>,
	key: Option<String>,
	secret: Option<String>,
	endpoint: Option<String>,
	auth_endpoint: Option<String>,
	request_timeout_ms: u64,
	refresh_lead: Duration,
	signature_lifetime: Duration,
}
impl ClientConfigBuilder {
	fn new(product: Product) -> Self {
		Self {
			product,
			auth_method: None,
			key: None,
			secret: None,
			endpoint: None,
			auth_endpoint: None,
			request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
			refresh_lead: DEFAULT_REFRESH_LEAD,
			signature_lifetime: DEFAULT_SIGNATURE_LIFETIME,
		}
	}

	/// Sets the partner key.
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());

		self
	}

	/// Sets the partner secret.
	pub fn secret(mut self, secret: impl Into<String>) -> Self {
		self.secret = Some(secret.into());

		self
	}

	/// Overrides the API endpoint.
	pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = Some(endpoint.into());

		self
	}

	/// Overrides the token endpoint.
	pub fn auth_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.auth_endpoint = Some(endpoint.into());

		self
	}

	/// Sets the per-call HTTP timeout in milliseconds.
	pub fn request_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.request_timeout_ms = timeout_ms;

		self
	}

	/// Sets the window before expiry at which material is renewed.
	pub fn refresh_lead(mut self, lead: Duration) -> Self {
		self.refresh_lead = lead;

		self
	}

	/// Sets the lifetime of signature authorization values.
	pub fn signature_lifetime(mut self, lifetime: Duration) -> Self {
		self.signature_lifetime = lifetime;

		self
	}

	/// Overrides the auth strategy implied by the product.
	pub fn auth_method(mut self, method: AuthMethod) -> Self {
		self.auth_method = Some(method);

		self
	}

	/// Validates every field and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let key = self.key.unwrap_or_default();
		let secret = self.secret.unwrap_or_default();
		let endpoint =
			self.endpoint.unwrap_or_else(|| self.product.default_endpoint().to_owned());
		let auth_endpoint =
			self.auth_endpoint.unwrap_or_else(|| self.product.default_auth_endpoint().to_owned());
		let mut fields = Vec::new();

		for (name, value) in [
			("key", &key),
			("secret", &secret),
			("endpoint", &endpoint),
			("auth_endpoint", &auth_endpoint),
		] {
			if value.trim().is_empty() {
				fields.push(name);
			}
		}
		if self.request_timeout_ms == 0 {
			fields.push("request_timeout");
		}
		if !fields.is_empty() {
			return Err(ConfigError::MissingFields { fields });
		}

		let endpoint = parse_endpoint("endpoint", &endpoint)?;
		let auth_endpoint = parse_endpoint("auth_endpoint", &auth_endpoint)?;
		let credentials = Credentials::new(key, secret)?;
		let auth = AuthConfig::new(credentials, auth_endpoint)
			.with_refresh_lead(self.refresh_lead)
			.with_signature_lifetime(self.signature_lifetime);

		Ok(ClientConfig {
			product: self.product,
			auth_method: self.auth_method.unwrap_or(self.product.auth_method()),
			auth,
			endpoint,
			request_timeout: StdDuration::from_millis(self.request_timeout_ms),
		})
	}
}

fn parse_endpoint(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidEndpoint { field, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builder_applies_product_defaults() {
		let config = ClientConfig::builder(Product::Rapid)
			.key("k")
			.secret("s")
			.build()
			.expect("Rapid configuration with credentials should build.");

		assert_eq!(config.endpoint().as_str(), "https://api.ean.com/v3/");
		assert_eq!(config.auth().auth_endpoint().as_str(), IDENTITY_TOKEN_ENDPOINT);
		assert_eq!(config.auth_method(), AuthMethod::Signature);
		assert_eq!(config.request_timeout(), StdDuration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS));
		assert_eq!(config.auth().refresh_lead(), Duration::seconds(10));
		assert_eq!(config.auth().signature_lifetime(), Duration::seconds(300));
	}

	#[test]
	fn builder_reports_every_missing_field() {
		let err = ClientConfig::builder(Product::FraudPrevention)
			.secret("  ")
			.endpoint("")
			.request_timeout_ms(0)
			.build()
			.expect_err("Empty values should be rejected.");

		match err {
			ConfigError::MissingFields { fields } => {
				assert_eq!(fields, ["key", "secret", "endpoint", "request_timeout"]);
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn builder_rejects_relative_endpoints() {
		let err = ClientConfig::builder(Product::FraudPrevention)
			.key("k")
			.secret("s")
			.auth_endpoint("/token")
			.build()
			.expect_err("Relative endpoints should be rejected.");

		assert!(matches!(err, ConfigError::InvalidEndpoint { field: "auth_endpoint", .. }));
	}

	#[test]
	fn auth_method_override_wins() {
		let config = ClientConfig::builder(Product::FraudPrevention)
			.key("k")
			.secret("s")
			.auth_method(AuthMethod::Signature)
			.build()
			.expect("Configuration with an override should build.");

		assert_eq!(config.auth_method(), AuthMethod::Signature);
		assert_eq!(config.product(), Product::FraudPrevention);
	}

	#[test]
	fn credentials_debug_redacts_secret() {
		let credentials =
			Credentials::new("key", "hunter2").expect("Credentials should accept non-empty values.");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("key"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn credentials_require_both_halves() {
		let err = Credentials::new("", "").expect_err("Empty credentials should be rejected.");

		assert_eq!(err.to_string(), "Configuration is missing required values: key, secret.");
	}
}
