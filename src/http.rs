//! Transport primitives shared by the request pipeline and the OAuth 2.0 grant.
//!
//! [`Transport`] bundles the reqwest client, the telemetry sink, and the per-call timeout so every
//! outbound request (API calls and token grants alike) is bounded and traced the same way. Grants
//! run through [`InstrumentedHandle`], an [`AsyncHttpClient`] that records the response status in a
//! [`ResponseMetadataSlot`] before `oauth2` classifies the outcome.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{
	_prelude::*,
	obs::{CallTrace, TelemetrySink, TracingTelemetry},
};

/// Captures metadata from the most recent grant response for error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
	/// Response body text, used as the rejection message when the body is not an OAuth error.
	pub body: Option<String>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between the handle and the error mapper.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// HTTP client, telemetry sink, and timeout shared by one API client and its auth strategy.
#[derive(Clone)]
pub struct Transport {
	/// Underlying HTTP client.
	pub client: ReqwestHttpClient,
	/// Destination for call traces.
	pub telemetry: Arc<dyn TelemetrySink>,
	/// Upper bound applied to every request.
	pub request_timeout: StdDuration,
}
impl Transport {
	/// Bundles the transport parts.
	pub fn new(
		client: ReqwestHttpClient,
		telemetry: Arc<dyn TelemetrySink>,
		request_timeout: StdDuration,
	) -> Self {
		Self { client, telemetry, request_timeout }
	}

	/// Default reqwest client and [`TracingTelemetry`].
	pub fn with_timeout(request_timeout: StdDuration) -> Self {
		Self::new(ReqwestHttpClient::default(), Arc::new(TracingTelemetry), request_timeout)
	}

	/// Builds an instrumented grant handle that records outcomes in `slot`.
	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle(Arc::new(InstrumentedHttpClient { transport: self.clone(), slot }))
	}
}
impl Debug for Transport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Transport").field("request_timeout", &self.request_timeout).finish()
	}
}

struct InstrumentedHttpClient {
	transport: Transport,
	slot: ResponseMetadataSlot,
}

/// [`AsyncHttpClient`] handle used for token grants.
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let inner = Arc::clone(&self.0);

		Box::pin(async move {
			inner.slot.take();

			let trace = CallTrace::request(
				request.method().as_str(),
				request.uri().to_string(),
				request.headers(),
				Some(request.body().as_slice()),
			);
			let telemetry = &inner.transport.telemetry;
			let mut outbound: reqwest::Request = request.try_into().map_err(Box::new)?;

			*outbound.timeout_mut() = Some(inner.transport.request_timeout);

			let response = match inner.transport.client.execute(outbound).await {
				Ok(response) => response,
				Err(e) => {
					telemetry.emit(&trace);

					return Err(HttpClientError::Reqwest(Box::new(e)));
				},
			};
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = match response.bytes().await {
				Ok(body) => body,
				Err(e) => {
					telemetry.emit(&trace);

					return Err(HttpClientError::Reqwest(Box::new(e)));
				},
			};
			let text = String::from_utf8_lossy(&body).into_owned();

			telemetry.emit(&trace.with_response(status.as_u16(), &headers, &text));
			inner.slot.store(ResponseMetadata { status: Some(status.as_u16()), body: Some(text) });

			let mut response_new = HttpResponse::new(body.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn metadata_slot_take_consumes() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(401), body: None });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(401));
		assert!(slot.take().is_none());
	}
}
