//! Authentication strategies and the material they inject into requests.
//!
//! Every outbound call asks the client's [`AuthStrategy`] to [`ensure_fresh`] its material and then
//! reads [`current_header`]. Two sealed implementations exist: [`OAuth2Manager`] (client-credentials
//! bearer tokens) and [`SignatureProvider`] (SHA-512 signature header). Both renew proactively once
//! the configured refresh lead is reached and guarantee at most one renewal in flight.
//!
//! [`ensure_fresh`]: AuthStrategy::ensure_fresh
//! [`current_header`]: AuthStrategy::current_header

pub mod client_credentials;
pub mod metrics;
pub mod secret;
pub mod signature;
pub mod token;

pub use client_credentials::*;
pub use metrics::*;
pub use secret::*;
pub use signature::*;
pub use token::*;

// self
use crate::{
	_prelude::*,
	config::{AuthConfig, AuthMethod},
	http::Transport,
};

/// Header carrying auth material.
pub const AUTHORIZATION: &str = "Authorization";

/// Boxed future returned by [`AuthStrategy`] methods.
pub type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Capability set shared by every auth variant.
pub trait AuthStrategy
where
	Self: sealed::Sealed + Send + Sync,
{
	/// Renews the material if it is near expiration. Idempotent and safe under concurrent callers.
	fn ensure_fresh(&self) -> AuthFuture<'_, ()>;

	/// Authorization header for the current material.
	fn current_header(&self) -> AuthHeader;

	/// Returns `true` once the material is past its expiry instant.
	fn is_expired(&self) -> bool;

	/// Returns `true` once the refresh lead has been reached.
	fn is_near_expiration(&self) -> bool;

	/// Variant label.
	fn method(&self) -> AuthMethod;

	/// Renewal counters.
	fn refresh_metrics(&self) -> &RefreshMetrics;
}

/// Authorization header name/value pair; the value is redacted when formatted.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeader {
	value: Secret,
}
impl AuthHeader {
	/// `Bearer <token>` value.
	pub fn bearer(access_token: &str) -> Self {
		Self { value: Secret::new(format!("Bearer {access_token}")) }
	}

	/// `EAN APIKey=<key>,Signature=<signature>,timestamp=<timestamp>` value.
	pub fn signature(api_key: &str, signature: &str, timestamp: i64) -> Self {
		Self {
			value: Secret::new(format!(
				"EAN APIKey={api_key},Signature={signature},timestamp={timestamp}"
			)),
		}
	}

	/// Header name.
	pub fn name(&self) -> &'static str {
		AUTHORIZATION
	}

	/// Header value. Callers must avoid logging this string.
	pub fn value(&self) -> &str {
		self.value.expose()
	}
}
impl Debug for AuthHeader {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthHeader").field("name", &AUTHORIZATION).field("value", &self.value).finish()
	}
}

/// Builds the strategy matching `method`.
///
/// OAuth 2.0 performs its first grant before returning; signatures are computed locally.
pub async fn connect(
	config: &AuthConfig,
	method: AuthMethod,
	transport: &Transport,
) -> Result<Arc<dyn AuthStrategy>> {
	match method {
		AuthMethod::OAuth2 =>
			Ok(Arc::new(OAuth2Manager::connect(config, transport.clone()).await?)),
		AuthMethod::Signature => Ok(Arc::new(SignatureProvider::new(config))),
	}
}

mod sealed {
	pub trait Sealed {}

	impl Sealed for super::OAuth2Manager {}
	impl Sealed for super::SignatureProvider {}
}
