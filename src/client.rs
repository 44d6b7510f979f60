//! Authenticated request pipeline shared by every generated operation.
//!
//! [`ApiClient::call`] is the single entry point operations reduce to. One call runs, in order:
//! auth freshness check, header assembly, body serialization, dispatch under the configured
//! timeout, decoding (2xx) or [`ServiceError`] construction (non-2xx), and a scrubbed trace to the
//! telemetry sink. Nothing is retried; the trace is emitted on failure paths as well.

pub mod headers;

pub use headers::*;

// self
use crate::{
	_prelude::*,
	auth::{self, AuthStrategy},
	config::ClientConfig,
	decode::ResponseModels,
	error::{ClientError, ServiceError, TransportError},
	http::{ReqwestHttpClient, Transport},
	obs::{self, CallTrace, OperationKind, OperationOutcome, OperationSpan, TelemetrySink},
};

/// Body argument for calls that send no payload.
pub const NO_BODY: Option<&()> = None;

/// HTTP methods accepted by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
	/// `PATCH`
	Patch,
}
impl HttpMethod {
	/// Upper-case wire form.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Delete => "DELETE",
			HttpMethod::Patch => "PATCH",
		}
	}
}
impl FromStr for HttpMethod {
	type Err = ClientError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(Self::Get),
			"POST" => Ok(Self::Post),
			"PUT" => Ok(Self::Put),
			"DELETE" => Ok(Self::Delete),
			"PATCH" => Ok(Self::Patch),
			_ => Err(ClientError::UnsupportedMethod { method: s.to_owned() }),
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<HttpMethod> for reqwest::Method {
	fn from(method: HttpMethod) -> Self {
		match method {
			HttpMethod::Get => reqwest::Method::GET,
			HttpMethod::Post => reqwest::Method::POST,
			HttpMethod::Put => reqwest::Method::PUT,
			HttpMethod::Delete => reqwest::Method::DELETE,
			HttpMethod::Patch => reqwest::Method::PATCH,
		}
	}
}

/// Raw response alongside its decoded value.
#[derive(Clone, Debug)]
pub struct ApiResponse<T> {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body text.
	pub body: String,
	/// First candidate model the body matched.
	pub value: Option<T>,
}
impl<T> ApiResponse<T> {
	/// Returns the decoded value, failing when no candidate matched.
	pub fn into_value(self) -> Result<T, ClientError> {
		self.value.ok_or(ClientError::NoMatchingModel { status: self.status })
	}
}

/// Cloneable handle to the pipeline; clones share the auth strategy and HTTP client.
#[derive(Clone)]
pub struct ApiClient {
	endpoint: Url,
	auth: Arc<dyn AuthStrategy>,
	transport: Transport,
}
impl ApiClient {
	/// Builds a client with the default HTTP client and [`TracingTelemetry`] sink.
	///
	/// OAuth 2.0 clients perform their first grant before returning.
	///
	/// [`TracingTelemetry`]: crate::obs::TracingTelemetry
	pub async fn new(config: &ClientConfig) -> Result<Self> {
		let transport = Transport::with_timeout(config.request_timeout());

		Self::with_transport(config, transport).await
	}

	/// Builds a client that sends requests through `http_client` and traces to `telemetry`.
	pub async fn with_telemetry(
		config: &ClientConfig,
		http_client: ReqwestHttpClient,
		telemetry: Arc<dyn TelemetrySink>,
	) -> Result<Self> {
		let transport = Transport::new(http_client, telemetry, config.request_timeout());

		Self::with_transport(config, transport).await
	}

	async fn with_transport(config: &ClientConfig, transport: Transport) -> Result<Self> {
		let auth = auth::connect(config.auth(), config.auth_method(), &transport).await?;

		Ok(Self::from_parts(config.endpoint().clone(), auth, transport))
	}

	/// Assembles a client from an existing strategy.
	pub fn from_parts(endpoint: Url, auth: Arc<dyn AuthStrategy>, transport: Transport) -> Self {
		Self { endpoint, auth, transport }
	}

	/// Configured API endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Shared auth strategy.
	pub fn auth(&self) -> &Arc<dyn AuthStrategy> {
		&self.auth
	}

	/// Shared transport.
	pub fn transport(&self) -> &Transport {
		&self.transport
	}

	/// Performs one authenticated call and returns the decoded body.
	///
	/// `models` lists the candidate response models in priority order; `None` means the body
	/// matched none of them.
	pub async fn call<B, T>(
		&self,
		method: &str,
		url: &Url,
		body: Option<&B>,
		headers: &RequestHeaders,
		models: &ResponseModels<T>,
	) -> Result<Option<T>>
	where
		B: ?Sized + Serialize,
	{
		self.call_with_response(method, url, body, headers, models).await.map(|response| response.value)
	}

	/// Performs one authenticated call and returns the raw response with its decoded body.
	pub async fn call_with_response<B, T>(
		&self,
		method: &str,
		url: &Url,
		body: Option<&B>,
		headers: &RequestHeaders,
		models: &ResponseModels<T>,
	) -> Result<ApiResponse<T>>
	where
		B: ?Sized + Serialize,
	{
		self.execute(OperationKind::Call, method, url, body, headers, models).await
	}

	pub(crate) async fn execute<B, T>(
		&self,
		kind: OperationKind,
		method: &str,
		url: &Url,
		body: Option<&B>,
		headers: &RequestHeaders,
		models: &ResponseModels<T>,
	) -> Result<ApiResponse<T>>
	where
		B: ?Sized + Serialize,
	{
		let span = OperationSpan::new(kind, "execute");

		obs::record_operation_outcome(kind, OperationOutcome::Attempt);

		let result = span.instrument(self.dispatch(method, url, body, headers, models)).await;

		obs::record_operation_outcome(kind, OperationOutcome::of(&result));

		result
	}

	async fn dispatch<B, T>(
		&self,
		method: &str,
		url: &Url,
		body: Option<&B>,
		headers: &RequestHeaders,
		models: &ResponseModels<T>,
	) -> Result<ApiResponse<T>>
	where
		B: ?Sized + Serialize,
	{
		let (method, header_map, payload) = match self.prepare(method, headers, body).await {
			Ok(prepared) => prepared,
			Err(e) => {
				// Request-only trace; nothing reached the wire.
				let trace = CallTrace::request(
					method.to_ascii_uppercase(),
					url.as_str(),
					&headers.to_header_map().unwrap_or_default(),
					None,
				);

				self.transport.telemetry.emit(&trace);

				return Err(e);
			},
		};
		let trace = CallTrace::request(method.as_str(), url.as_str(), &header_map, payload.as_deref());
		let mut request = self
			.transport
			.client
			.request(method.into(), url.clone())
			.headers(header_map)
			.timeout(self.transport.request_timeout);

		if let Some(payload) = payload {
			request = request.body(payload);
		}

		let response = match request.send().await {
			Ok(response) => response,
			Err(e) => return Err(self.transport_failure(&trace, e)),
		};
		let status = response.status().as_u16();
		let response_headers = response.headers().to_owned();
		let text = match response.text().await {
			Ok(text) => text,
			Err(e) => return Err(self.transport_failure(&trace, e)),
		};
		let trace = trace.with_response(status, &response_headers, &text);

		if !response_is_ok(status) {
			let error = ServiceError::from_response(status, text);

			self.transport.telemetry.emit(&trace);

			return Err(error.into());
		}

		let value = models.decode(text.as_bytes());

		self.transport.telemetry.emit(&trace);

		Ok(ApiResponse { status, headers: response_headers, body: text, value })
	}

	async fn prepare<B>(
		&self,
		method: &str,
		headers: &RequestHeaders,
		body: Option<&B>,
	) -> Result<(HttpMethod, HeaderMap, Option<Vec<u8>>)>
	where
		B: ?Sized + Serialize,
	{
		let method = method.parse::<HttpMethod>()?;
		let mut header_map = headers.to_header_map()?;

		self.auth.ensure_fresh().await?;

		let auth_header = self.auth.current_header();
		let auth_value = HeaderValue::from_str(auth_header.value())
			.map_err(|_| ClientError::InvalidHeader { name: auth_header.name().to_owned() })?;

		header_map.insert(reqwest::header::AUTHORIZATION, auth_value);

		let payload = body.map(encode_body).transpose()?;

		Ok((method, header_map, payload))
	}

	fn transport_failure(&self, trace: &CallTrace, e: ReqwestError) -> Error {
		self.transport.telemetry.emit(trace);

		if e.is_builder() {
			ClientError::Request { source: Box::new(e) }.into()
		} else {
			TransportError::from(e).into()
		}
	}
}
impl Debug for ApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("endpoint", &self.endpoint.as_str())
			.field("auth", &self.auth.method())
			.field("transport", &self.transport)
			.finish()
	}
}

/// Serializes `body` as JSON with null-valued object fields removed at every depth.
pub fn encode_body<B>(body: &B) -> Result<Vec<u8>, ClientError>
where
	B: ?Sized + Serialize,
{
	let mut value = serde_json::to_value(body).map_err(ClientError::Serialization)?;

	prune_nulls(&mut value);

	serde_json::to_vec(&value).map_err(ClientError::Serialization)
}

fn prune_nulls(value: &mut Value) {
	match value {
		Value::Object(fields) => {
			fields.retain(|_, field| !field.is_null());
			fields.values_mut().for_each(prune_nulls);
		},
		Value::Array(items) => items.iter_mut().for_each(prune_nulls),
		_ => {},
	}
}

fn response_is_ok(status: u16) -> bool {
	(200..300).contains(&status)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Serialize)]
	struct Order {
		id: &'static str,
		note: Option<&'static str>,
		items: Vec<Item>,
	}

	#[derive(Serialize)]
	struct Item {
		sku: &'static str,
		coupon: Option<&'static str>,
	}

	#[test]
	fn methods_parse_case_insensitively() {
		assert_eq!("get".parse::<HttpMethod>().expect("GET should parse."), HttpMethod::Get);
		assert_eq!("Patch".parse::<HttpMethod>().expect("PATCH should parse."), HttpMethod::Patch);
		assert!(matches!(
			"TRACE".parse::<HttpMethod>(),
			Err(ClientError::UnsupportedMethod { method }) if method == "TRACE"
		));
	}

	#[test]
	fn body_nulls_are_pruned_recursively() {
		let order = Order {
			id: "o-1",
			note: None,
			items: vec![Item { sku: "s-1", coupon: None }, Item { sku: "s-2", coupon: Some("c") }],
		};
		let encoded = encode_body(&order).expect("Order should serialize.");
		let value: Value = serde_json::from_slice(&encoded).expect("Encoded body should be JSON.");

		assert_eq!(
			value,
			serde_json::json!({
				"id": "o-1",
				"items": [{ "sku": "s-1" }, { "sku": "s-2", "coupon": "c" }]
			})
		);
	}

	#[test]
	fn required_value_reports_unmatched_body() {
		let response = ApiResponse::<u32> {
			status: 200,
			headers: HeaderMap::new(),
			body: "{}".into(),
			value: None,
		};

		assert!(matches!(
			response.into_value(),
			Err(ClientError::NoMatchingModel { status: 200 })
		));
	}

	#[test]
	fn ok_range_is_2xx() {
		assert!(response_is_ok(200));
		assert!(response_is_ok(204));
		assert!(!response_is_ok(199));
		assert!(!response_is_ok(300));
	}
}
