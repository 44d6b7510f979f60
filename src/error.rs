//! SDK-wide error taxonomy shared by configuration, auth strategies, and the request pipeline.

// self
use crate::{_prelude::*, decode::ApiError};

/// SDK-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical SDK error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint or credential failure.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Request could not be assembled locally.
	#[error(transparent)]
	Client(#[from] ClientError),
	/// Upstream service answered with a non-2xx status.
	#[error(transparent)]
	Service(#[from] ServiceError),
}
impl Error {
	/// Returns the HTTP status attached to auth or service failures.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Auth(AuthError::Rejected { status, .. }) => Some(*status),
			Self::Auth(AuthError::MalformedGrant { status, .. }) => *status,
			Self::Service(err) => Some(err.status),
			_ => None,
		}
	}

	/// Returns the service error if the upstream rejected the call.
	pub fn as_service(&self) -> Option<&ServiceError> {
		match self {
			Self::Service(err) => Some(err),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised while building clients.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// One or more required values are empty.
	#[error("Configuration is missing required values: {}.", .fields.join(", "))]
	MissingFields {
		/// Every offending field name, in declaration order.
		fields: Vec<&'static str>,
	},
	/// An endpoint could not be parsed as an absolute URL.
	#[error("Configured `{field}` is not a valid URL.")]
	InvalidEndpoint {
		/// Offending field name.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while obtaining or refreshing auth material.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Token endpoint answered with a non-2xx status.
	#[error("Unable to authenticate [{status}]: {message}.")]
	Rejected {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// OAuth error description or response text.
		message: String,
	},
	/// Token endpoint could not be reached.
	#[error("Token request failed before a response was received.")]
	Network {
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// Token endpoint returned a 2xx response that is not a valid grant payload.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedGrant {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Grant payload parsed but violates the token contract.
	#[error("Token endpoint returned an unusable grant: {reason}.")]
	InvalidGrant {
		/// Human-readable reason.
		reason: String,
	},
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the configured timeout.
	#[error("Request timed out while calling the remote endpoint.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns `true` when the failure was a timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout { source: Box::new(e) } } else { Self::network(e) }
	}
}

/// Local failures while assembling a request.
#[derive(Debug, ThisError)]
pub enum ClientError {
	/// Request body or header value could not be serialized to JSON.
	#[error("Request payload could not be serialized.")]
	Serialization(#[source] serde_json::Error),
	/// URL could not be parsed or joined.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP method is not one of GET, POST, PUT, DELETE, PATCH.
	#[error("HTTP method `{method}` is not supported.")]
	UnsupportedMethod {
		/// Method as supplied by the caller.
		method: String,
	},
	/// Header name or rendered value is not valid on the wire.
	#[error("Header `{name}` cannot be sent.")]
	InvalidHeader {
		/// Header name as supplied by the caller.
		name: String,
	},
	/// HTTP client rejected the request before dispatch.
	#[error("Request could not be built.")]
	Request {
		/// Underlying builder failure.
		#[source]
		source: BoxError,
	},
	/// A 2xx body matched none of the candidate models and the caller required a value.
	#[error("Response body with status {status} matched no candidate model.")]
	NoMatchingModel {
		/// HTTP status of the undecodable response.
		status: u16,
	},
}

/// Non-2xx response from the service, with the decoded error shape when available.
#[derive(Clone, Debug)]
pub struct ServiceError {
	/// HTTP status code.
	pub status: u16,
	/// Decoded `{ type, detail, causes? }` payload, if the body matched.
	pub error: Option<ApiError>,
	/// Raw response text.
	pub body: String,
}
impl ServiceError {
	/// Builds a service error, decoding the shared error shape when possible.
	pub fn from_response(status: u16, body: String) -> Self {
		let error = ApiError::decode(body.as_bytes());

		Self { status, error, body }
	}

	/// Returns the server-supplied detail, falling back to the raw body.
	pub fn detail(&self) -> &str {
		self.error.as_ref().map(|error| error.detail.as_str()).unwrap_or(&self.body)
	}

	/// Decodes the raw body into a status-specific error model.
	pub fn body_as<M>(&self) -> Option<M>
	where
		M: DeserializeOwned,
	{
		serde_json::from_str(&self.body).ok()
	}

	/// Returns `true` for 4xx statuses.
	pub fn is_client_error(&self) -> bool {
		(400..500).contains(&self.status)
	}

	/// Returns `true` for 5xx statuses.
	pub fn is_server_error(&self) -> bool {
		(500..600).contains(&self.status)
	}
}
impl Display for ServiceError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.error {
			Some(error) => write!(f, "[{}] {}: {}", self.status, error.r#type, error.detail),
			None => write!(f, "[{}] {}", self.status, self.body),
		}
	}
}
impl StdError for ServiceError {}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn missing_fields_lists_every_offender() {
		let err = ConfigError::MissingFields { fields: vec!["key", "secret"] };

		assert_eq!(err.to_string(), "Configuration is missing required values: key, secret.");
	}

	#[test]
	fn service_error_decodes_shared_shape() {
		let err = ServiceError::from_response(
			400,
			r#"{"type":"bad.request","detail":"bad"}"#.to_owned(),
		);

		assert_eq!(err.detail(), "bad");
		assert!(err.is_client_error());
		assert_eq!(err.to_string(), "[400] bad.request: bad");
		assert_eq!(Error::from(err).status(), Some(400));
	}

	#[test]
	fn service_error_keeps_unparseable_body() {
		let err = ServiceError::from_response(502, "upstream down".to_owned());

		assert!(err.error.is_none());
		assert!(err.is_server_error());
		assert_eq!(err.detail(), "upstream down");
		assert_eq!(err.to_string(), "[502] upstream down");
	}

	#[test]
	fn service_error_decodes_custom_models() {
		#[derive(Deserialize)]
		struct Conflict {
			conflicting_id: String,
		}

		let err = ServiceError::from_response(409, r#"{"conflicting_id":"abc"}"#.to_owned());
		let conflict = err.body_as::<Conflict>().expect("Body should decode into the conflict model.");

		assert_eq!(conflict.conflicting_id, "abc");
	}
}
