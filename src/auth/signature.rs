//! Signature authorization for products that authenticate every request with a hashed header.
//!
//! The signature is `hex(SHA-512(key || secret || timestamp))` where `timestamp` is the issuing
//! instant in Unix seconds. A value is reused until the refresh lead before its lifetime ends.

// crates.io
use sha2::{Digest, Sha512};
// self
use crate::{
	_prelude::*,
	auth::{AuthFuture, AuthHeader, AuthStrategy, RefreshMetrics, Secret},
	config::{AuthConfig, AuthMethod, Credentials},
};

/// Signature material valid until `expires_at`.
#[derive(Clone, Debug)]
pub struct SignatureMaterial {
	/// Partner key echoed in the header.
	pub api_key: String,
	/// Lowercase hex SHA-512 digest.
	pub signature: Secret,
	/// Unix seconds used in the digest.
	pub timestamp: i64,
	/// Instant after which the material must not be sent.
	pub expires_at: OffsetDateTime,
}
impl SignatureMaterial {
	/// Computes material for `timestamp`; a pure function of its inputs.
	///
	/// A lifetime that overflows the calendar saturates at the latest representable instant.
	pub fn issue(credentials: &Credentials, timestamp: i64, lifetime: Duration) -> Self {
		let signature = compute_signature(credentials.key(), credentials.secret().expose(), timestamp);
		let issued_at =
			OffsetDateTime::from_unix_timestamp(timestamp).unwrap_or(OffsetDateTime::UNIX_EPOCH);

		Self {
			api_key: credentials.key().to_owned(),
			signature: Secret::new(signature),
			timestamp,
			expires_at: issued_at.saturating_add(lifetime),
		}
	}

	/// Computes material stamped with the current clock.
	pub fn issue_now(credentials: &Credentials, lifetime: Duration) -> Self {
		Self::issue(credentials, OffsetDateTime::now_utc().unix_timestamp(), lifetime)
	}

	/// Returns `true` if the material has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` once `instant + lead` reaches the expiry instant.
	pub fn is_near_expiration_at(&self, instant: OffsetDateTime, lead: Duration) -> bool {
		instant.checked_add(lead).is_none_or(|at| at >= self.expires_at)
	}

	/// `EAN APIKey=..,Signature=..,timestamp=..` header.
	pub fn auth_header(&self) -> AuthHeader {
		AuthHeader::signature(&self.api_key, self.signature.expose(), self.timestamp)
	}
}

/// Lowercase hex SHA-512 over `key || secret || timestamp`.
pub fn compute_signature(key: &str, secret: &str, timestamp: i64) -> String {
	let mut hasher = Sha512::new();

	hasher.update(key.as_bytes());
	hasher.update(secret.as_bytes());
	hasher.update(timestamp.to_string().as_bytes());

	format!("{:x}", hasher.finalize())
}

/// [`AuthStrategy`] that regenerates signature material on demand.
#[derive(Debug)]
pub struct SignatureProvider {
	credentials: Credentials,
	lifetime: Duration,
	refresh_lead: Duration,
	material: RwLock<SignatureMaterial>,
	refresh_guard: Mutex<()>,
	metrics: RefreshMetrics,
}
impl SignatureProvider {
	/// Builds a provider and issues the first signature.
	pub fn new(config: &AuthConfig) -> Self {
		let credentials = config.credentials().clone();
		let lifetime = config.signature_lifetime();
		let metrics = RefreshMetrics::default();

		metrics.record_attempt();

		let material = SignatureMaterial::issue_now(&credentials, lifetime);

		metrics.record_success();

		Self {
			credentials,
			lifetime,
			refresh_lead: config.refresh_lead(),
			material: RwLock::new(material),
			refresh_guard: Mutex::new(()),
			metrics,
		}
	}

	/// Snapshot of the material currently in use.
	pub fn material(&self) -> SignatureMaterial {
		self.material.read().clone()
	}

	fn refresh_if_near_expiration(&self) {
		if !self.is_near_expiration() {
			return;
		}

		let _guard = self.refresh_guard.lock();

		if !self.is_near_expiration() {
			return;
		}

		self.metrics.record_attempt();

		let material = SignatureMaterial::issue_now(&self.credentials, self.lifetime);

		#[cfg(feature = "tracing")]
		tracing::debug!(timestamp = material.timestamp, "Signature renewed.");

		*self.material.write() = material;

		self.metrics.record_success();
	}
}
impl AuthStrategy for SignatureProvider {
	fn ensure_fresh(&self) -> AuthFuture<'_, ()> {
		self.refresh_if_near_expiration();

		Box::pin(async { Ok(()) })
	}

	fn current_header(&self) -> AuthHeader {
		self.material.read().auth_header()
	}

	fn is_expired(&self) -> bool {
		self.material.read().is_expired_at(OffsetDateTime::now_utc())
	}

	fn is_near_expiration(&self) -> bool {
		self.material.read().is_near_expiration_at(OffsetDateTime::now_utc(), self.refresh_lead)
	}

	fn method(&self) -> AuthMethod {
		AuthMethod::Signature
	}

	fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}
}
