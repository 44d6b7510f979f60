//! OAuth 2.0 access token model, expiration arithmetic, and builder.

// self
use crate::{_prelude::*, auth::{AuthHeader, Secret}};

/// Errors produced by [`TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no `expires_in` was configured.
	#[error("The expires_in value is required.")]
	MissingExpiry,
	/// Issued when `expires_in` is zero or negative.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Issued when `issued_at + expires_in` falls outside the representable calendar.
	#[error("The expires_in value of {seconds} seconds overflows the expiry instant.")]
	ExpiryOutOfRange {
		/// Offending lifetime in seconds.
		seconds: i64,
	},
}

/// Access token issued by the client-credentials grant.
#[derive(Clone)]
pub struct Token {
	/// Bearer value; callers must avoid logging it.
	pub access_token: Secret,
	/// Token type reported by the server, usually `bearer`.
	pub token_type: String,
	/// Space-delimited scopes granted, if reported.
	pub scope: Option<String>,
	/// Lifetime reported by the server.
	pub expires_in: Duration,
	/// OpenID id token, if issued.
	pub id_token: Option<Secret>,
	/// Refresh token, if issued.
	pub refresh_token: Option<Secret>,
	/// Instant the grant response was received.
	pub issued_at: OffsetDateTime,
	/// `issued_at + expires_in`.
	pub expires_at: OffsetDateTime,
}
impl Token {
	/// Returns a builder for constructing validated tokens.
	pub fn builder() -> TokenBuilder {
		TokenBuilder::default()
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` once `instant + lead` reaches the expiry instant.
	///
	/// A lead too large to add to `instant` always counts as near expiration.
	pub fn is_near_expiration_at(&self, instant: OffsetDateTime, lead: Duration) -> bool {
		instant.checked_add(lead).is_none_or(|at| at >= self.expires_at)
	}

	/// Returns `true` if the refresh lead has been reached relative to the current clock.
	pub fn is_near_expiration(&self, lead: Duration) -> bool {
		self.is_near_expiration_at(OffsetDateTime::now_utc(), lead)
	}

	/// Replaces every field with the freshly granted token.
	pub fn update(&mut self, next: Token) {
		*self = next;
	}

	/// `Bearer <access_token>` header.
	pub fn auth_header(&self) -> AuthHeader {
		AuthHeader::bearer(self.access_token.expose())
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("expires_in", &self.expires_in)
			.field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Token`].
#[derive(Clone, Debug, Default)]
pub struct TokenBuilder {
	access_token: Option<Secret>,
	token_type: Option<String>,
	scope: Option<String>,
	expires_in: Option<Duration>,
	id_token: Option<Secret>,
	refresh_token: Option<Secret>,
	issued_at: Option<OffsetDateTime>,
}
impl TokenBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(Secret::new(token));

		self
	}

	/// Sets the token type; defaults to `bearer`.
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the granted scope string.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the server-reported lifetime.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the id token value.
	pub fn id_token(mut self, token: impl Into<String>) -> Self {
		self.id_token = Some(Secret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(Secret::new(token));

		self
	}

	/// Sets the issued-at instant; defaults to the current clock.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Consumes the builder and produces a [`Token`].
	pub fn build(self) -> Result<Token, TokenBuilderError> {
		let access_token = self
			.access_token
			.filter(|token| !token.is_empty())
			.ok_or(TokenBuilderError::MissingAccessToken)?;
		let expires_in = self.expires_in.ok_or(TokenBuilderError::MissingExpiry)?;

		if !expires_in.is_positive() {
			return Err(TokenBuilderError::NonPositiveExpiresIn);
		}

		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = issued_at
			.checked_add(expires_in)
			.ok_or(TokenBuilderError::ExpiryOutOfRange { seconds: expires_in.whole_seconds() })?;

		Ok(Token {
			access_token,
			token_type: self.token_type.unwrap_or_else(|| "bearer".into()),
			scope: self.scope,
			expires_in,
			id_token: self.id_token,
			refresh_token: self.refresh_token,
			issued_at,
			expires_at,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn token_at(issued_at: OffsetDateTime, expires_in: i64) -> Token {
		Token::builder()
			.access_token("AT")
			.expires_in(Duration::seconds(expires_in))
			.issued_at(issued_at)
			.build()
			.expect("Token should build with valid inputs.")
	}

	#[test]
	fn expiration_boundaries_are_inclusive() {
		let issued = datetime!(2025-01-01 00:00 UTC);
		let token = token_at(issued, 60);
		let lead = Duration::seconds(10);

		assert_eq!(token.expires_at, datetime!(2025-01-01 00:01 UTC));
		assert!(!token.is_near_expiration_at(datetime!(2025-01-01 00:00:49 UTC), lead));
		assert!(token.is_near_expiration_at(datetime!(2025-01-01 00:00:50 UTC), lead));
		assert!(!token.is_expired_at(datetime!(2025-01-01 00:00:59 UTC)));
		assert!(token.is_expired_at(datetime!(2025-01-01 00:01 UTC)));
	}

	#[test]
	fn lead_longer_than_lifetime_is_always_near() {
		let issued = datetime!(2025-01-01 00:00 UTC);
		let token = token_at(issued, 5);

		assert!(token.is_near_expiration_at(issued, Duration::seconds(10)));
	}

	#[test]
	fn update_advances_expiry() {
		let mut token = token_at(datetime!(2025-01-01 00:00 UTC), 60);
		let next = token_at(datetime!(2025-01-01 00:00:55 UTC), 60);

		token.update(next);

		assert_eq!(token.expires_at, datetime!(2025-01-01 00:01:55 UTC));
	}

	#[test]
	fn builder_validates_inputs() {
		assert_eq!(
			Token::builder().expires_in(Duration::seconds(1)).build().unwrap_err(),
			TokenBuilderError::MissingAccessToken
		);
		assert_eq!(
			Token::builder().access_token("AT").build().unwrap_err(),
			TokenBuilderError::MissingExpiry
		);
		assert_eq!(
			Token::builder().access_token("AT").expires_in(Duration::ZERO).build().unwrap_err(),
			TokenBuilderError::NonPositiveExpiresIn
		);
		assert_eq!(
			Token::builder()
				.access_token("AT")
				.expires_in(Duration::seconds(9_000_000_000_000_000))
				.build()
				.unwrap_err(),
			TokenBuilderError::ExpiryOutOfRange { seconds: 9_000_000_000_000_000 }
		);
	}

	#[test]
	fn oversized_lead_counts_as_near_expiration() {
		let issued = datetime!(2025-01-01 00:00 UTC);
		let token = token_at(issued, 60);

		assert!(token.is_near_expiration_at(issued, Duration::MAX));
	}

	#[test]
	fn debug_redacts_secrets() {
		let token = Token::builder()
			.access_token("AT-secret")
			.id_token("ID-secret")
			.expires_in(Duration::seconds(60))
			.build()
			.expect("Token should build with valid inputs.");
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("AT-secret"));
		assert!(!rendered.contains("ID-secret"));
		assert_eq!(token.auth_header().value(), "Bearer AT-secret");
	}
}
