//! OAuth 2.0 client-credentials token manager.
//!
//! [`OAuth2Manager`] holds the single bearer token shared by every clone of an API client. The
//! first grant happens in [`OAuth2Manager::connect`]; afterwards [`AuthStrategy::ensure_fresh`]
//! renews the token once the refresh lead is reached. Renewal is double-checked: callers that
//! observe a stale token queue on an async guard, and only the first one to acquire it talks to the
//! token endpoint while the rest re-check and reuse the new token.

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, ExtraTokenFields, HttpClientError,
	RequestTokenError, StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::{AuthFuture, AuthHeader, AuthStrategy, RefreshMetrics, Token},
	config::{AuthConfig, AuthMethod},
	error::{AuthError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, Transport},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};

type GrantTokenResponse = StandardTokenResponse<GrantExtraFields, BasicTokenType>;
type GrantClient = oauth2::Client<
	BasicErrorResponse,
	GrantTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type GrantError = RequestTokenError<HttpClientError<ReqwestError>, BasicErrorResponse>;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
struct GrantExtraFields {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id_token: Option<String>,
}
impl ExtraTokenFields for GrantExtraFields {}

/// [`AuthStrategy`] backed by the client-credentials grant.
pub struct OAuth2Manager {
	grant_client: GrantClient,
	transport: Transport,
	refresh_lead: Duration,
	token: RwLock<Token>,
	refresh_guard: AsyncMutex<()>,
	metrics: RefreshMetrics,
}
impl OAuth2Manager {
	/// Performs the initial grant against the configured token endpoint.
	pub async fn connect(config: &AuthConfig, transport: Transport) -> Result<Self> {
		let credentials = config.credentials();
		let grant_client: GrantClient =
			oauth2::Client::new(ClientId::new(credentials.key().to_owned()))
				.set_client_secret(ClientSecret::new(credentials.secret().expose().to_owned()))
				.set_token_uri(TokenUrl::from_url(config.auth_endpoint().clone()));
		let metrics = RefreshMetrics::default();

		metrics.record_attempt();

		let token = grant(&grant_client, &transport).await;

		metrics.record_outcome(&token);

		let token = token?;

		#[cfg(feature = "tracing")]
		tracing::info!(expires_in = token.expires_in.whole_seconds(), "Initial token granted.");

		Ok(Self {
			grant_client,
			transport,
			refresh_lead: config.refresh_lead(),
			token: RwLock::new(token),
			refresh_guard: AsyncMutex::new(()),
			metrics,
		})
	}

	/// Snapshot of the token currently in use.
	pub fn token(&self) -> Token {
		self.token.read().clone()
	}

	/// Renews the token regardless of its remaining lifetime.
	///
	/// Shares the renewal guard with [`AuthStrategy::ensure_fresh`], so a forced refresh never
	/// overlaps a proactive one.
	pub async fn refresh(&self) -> Result<()> {
		let _guard = self.refresh_guard.lock().await;

		self.renew().await
	}

	async fn renew(&self) -> Result<()> {
		#[cfg(feature = "tracing")]
		tracing::info!("Renewing token.");

		self.metrics.record_attempt();

		let next = grant(&self.grant_client, &self.transport).await;

		self.metrics.record_outcome(&next);

		let next = next?;

		#[cfg(feature = "tracing")]
		{
			tracing::info!("Token renewal successful.");
			tracing::debug!("New token expires in {} seconds.", next.expires_in.whole_seconds());
		}

		self.token.write().update(next);

		Ok(())
	}
}
impl AuthStrategy for OAuth2Manager {
	fn ensure_fresh(&self) -> AuthFuture<'_, ()> {
		Box::pin(async move {
			if !self.is_near_expiration() {
				return Ok(());
			}

			#[cfg(feature = "tracing")]
			tracing::info!(
				"Token expired or is about to expire, request will wait until token is renewed."
			);

			let _guard = self.refresh_guard.lock().await;

			// Another caller may have renewed while this one waited.
			if !self.is_near_expiration() {
				return Ok(());
			}

			self.renew().await
		})
	}

	fn current_header(&self) -> AuthHeader {
		self.token.read().auth_header()
	}

	fn is_expired(&self) -> bool {
		self.token.read().is_expired()
	}

	fn is_near_expiration(&self) -> bool {
		self.token.read().is_near_expiration(self.refresh_lead)
	}

	fn method(&self) -> AuthMethod {
		AuthMethod::OAuth2
	}

	fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}
}
impl Debug for OAuth2Manager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Manager")
			.field("transport", &self.transport)
			.field("refresh_lead", &self.refresh_lead)
			.field("token", &*self.token.read())
			.field("metrics", &self.metrics.snapshot())
			.finish()
	}
}

async fn grant(grant_client: &GrantClient, transport: &Transport) -> Result<Token> {
	const KIND: OperationKind = OperationKind::Grant;

	let span = OperationSpan::new(KIND, "client_credentials");

	obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

	let result = span
		.instrument(async move {
			let meta = ResponseMetadataSlot::default();
			let handle = transport.instrumented(meta.clone());
			let response = grant_client
				.exchange_client_credentials()
				.request_async(&handle)
				.await
				.map_err(|e| map_grant_error(meta.take(), e))?;

			map_token_response(response)
		})
		.await;

	obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

	result
}

fn map_token_response(response: GrantTokenResponse) -> Result<Token> {
	let expires_in = response.expires_in().ok_or_else(|| AuthError::InvalidGrant {
		reason: "token response is missing expires_in".into(),
	})?;
	let expires_in = i64::try_from(expires_in.as_secs()).map_err(|_| AuthError::InvalidGrant {
		reason: "expires_in is out of range".into(),
	})?;
	let mut builder = Token::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(response.token_type().as_ref())
		.expires_in(Duration::seconds(expires_in));

	if let Some(scopes) = response.scopes() {
		builder = builder
			.scope(scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" "));
	}
	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}
	if let Some(id_token) = &response.extra_fields().id_token {
		builder = builder.id_token(id_token.to_owned());
	}

	builder.build().map_err(|e| AuthError::InvalidGrant { reason: e.to_string() }.into())
}

fn map_grant_error(meta: Option<ResponseMetadata>, err: GrantError) -> Error {
	let status = meta.as_ref().and_then(|meta| meta.status);

	if let Some(status) = status.filter(|status| !(200..300).contains(status)) {
		let message = match &err {
			RequestTokenError::ServerResponse(response) => response
				.error_description()
				.cloned()
				.unwrap_or_else(|| response.error().as_ref().to_owned()),
			_ => meta
				.and_then(|meta| meta.body)
				.map(|body| body.trim().to_owned())
				.filter(|body| !body.is_empty())
				.unwrap_or_else(|| err.to_string()),
		};

		return AuthError::Rejected { status, message }.into();
	}

	match err {
		RequestTokenError::Request(e) => AuthError::Network { source: map_transport_error(e) }.into(),
		RequestTokenError::Parse(source, _) => AuthError::MalformedGrant { status, source }.into(),
		RequestTokenError::ServerResponse(response) => AuthError::InvalidGrant {
			reason: format!("token endpoint returned OAuth error `{}`", response.error().as_ref()),
		}
		.into(),
		RequestTokenError::Other(message) => AuthError::InvalidGrant { reason: message }.into(),
	}
}

fn map_transport_error(err: HttpClientError<ReqwestError>) -> TransportError {
	match err {
		HttpClientError::Reqwest(inner) => TransportError::from(*inner),
		HttpClientError::Io(inner) => TransportError::Io(inner),
		HttpClientError::Http(inner) => TransportError::network(inner),
		HttpClientError::Other(message) => TransportError::Network { source: message.into() },
		_ => TransportError::Network { source: "unknown HTTP client failure".into() },
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn token_response(body: &str) -> GrantTokenResponse {
		serde_json::from_str(body).expect("Token response fixture should deserialize.")
	}

	#[test]
	fn token_response_maps_every_field() {
		let token = map_token_response(token_response(
			r#"{"access_token":"AT","token_type":"Bearer","expires_in":1800,"scope":"a b","id_token":"ID","refresh_token":"RT"}"#,
		))
		.expect("Complete response should map.");

		assert_eq!(token.access_token.expose(), "AT");
		assert_eq!(token.token_type, "bearer");
		assert_eq!(token.scope.as_deref(), Some("a b"));
		assert_eq!(token.expires_in, Duration::seconds(1800));
		assert_eq!(token.id_token.as_ref().map(|id| id.expose()), Some("ID"));
		assert_eq!(token.refresh_token.as_ref().map(|rt| rt.expose()), Some("RT"));
		assert_eq!(token.expires_at, token.issued_at + Duration::seconds(1800));
	}

	#[test]
	fn missing_or_zero_expiry_is_invalid() {
		let missing =
			map_token_response(token_response(r#"{"access_token":"AT","token_type":"bearer"}"#))
				.expect_err("Missing expires_in should be rejected.");

		assert!(matches!(missing, Error::Auth(AuthError::InvalidGrant { .. })));

		let zero = map_token_response(token_response(
			r#"{"access_token":"AT","token_type":"bearer","expires_in":0}"#,
		))
		.expect_err("Zero expires_in should be rejected.");

		assert!(matches!(zero, Error::Auth(AuthError::InvalidGrant { .. })));
	}

	#[test]
	fn unrepresentable_expiry_is_invalid() {
		let err = map_token_response(token_response(
			r#"{"access_token":"AT","token_type":"bearer","expires_in":9000000000000000}"#,
		))
		.expect_err("An expiry past the calendar should be rejected.");

		assert!(matches!(
			err,
			Error::Auth(AuthError::InvalidGrant { reason }) if reason.contains("overflows")
		));
	}

	#[test]
	fn non_2xx_other_uses_body_text() {
		let meta = ResponseMetadata { status: Some(503), body: Some(" upstream down \n".into()) };
		let err = map_grant_error(Some(meta), RequestTokenError::Other("ignored".into()));

		assert!(matches!(
			err,
			Error::Auth(AuthError::Rejected { status: 503, message }) if message == "upstream down"
		));
	}

	#[test]
	fn success_status_with_other_error_is_invalid_grant() {
		let meta = ResponseMetadata { status: Some(200), body: Some(String::new()) };
		let err = map_grant_error(Some(meta), RequestTokenError::Other("empty body".into()));

		assert!(matches!(err, Error::Auth(AuthError::InvalidGrant { reason }) if reason == "empty body"));
	}

	#[test]
	fn io_failures_map_to_network() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
		let err = map_grant_error(None, RequestTokenError::Request(HttpClientError::Io(io)));

		assert!(matches!(
			err,
			Error::Auth(AuthError::Network { source: TransportError::Io(_) })
		));
	}
}
