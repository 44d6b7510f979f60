//! Call traces, credential scrubbing, and the sinks that receive them.

// self
use crate::_prelude::*;

/// Replacement written in place of scrubbed header values.
pub const REDACTED: &str = "<redacted>";
/// Upper bound on the request body text kept in a trace.
pub const BODY_PREVIEW_LIMIT: usize = 2_048;

const SENSITIVE_MARKERS: [&str; 5] = ["key", "secret", "password", "username", "authorization"];

/// Returns `true` when a header name carries credentials and must be scrubbed.
pub fn is_sensitive_header(name: &str) -> bool {
	let name = name.to_ascii_lowercase();

	SENSITIVE_MARKERS.iter().any(|marker| name.contains(marker))
}

/// Renders headers as name/value pairs, replacing sensitive values with [`REDACTED`].
pub fn scrub_headers<'a, I>(headers: I) -> Vec<(String, String)>
where
	I: IntoIterator<Item = (&'a str, &'a str)>,
{
	headers
		.into_iter()
		.map(|(name, value)| {
			let value = if is_sensitive_header(name) { REDACTED } else { value };

			(name.to_owned(), value.to_owned())
		})
		.collect()
}

/// [`scrub_headers`] over a wire header map; non-UTF-8 values render lossily.
pub fn scrub_header_map(headers: &HeaderMap) -> Vec<(String, String)> {
	let rendered = headers
		.iter()
		.map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes())))
		.collect::<Vec<_>>();

	scrub_headers(rendered.iter().map(|(name, value)| (*name, value.as_ref())))
}

/// Structured record of one HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallTrace {
	/// Upper-case HTTP method.
	pub method: String,
	/// Absolute request URL.
	pub url: String,
	/// Scrubbed request headers.
	pub request_headers: Vec<(String, String)>,
	/// Request body text, truncated to [`BODY_PREVIEW_LIMIT`].
	pub request_body: Option<String>,
	/// Response half; absent when the exchange failed before a response arrived.
	pub response: Option<ResponseTrace>,
}
impl CallTrace {
	/// Starts a trace for an outbound request.
	pub fn request(
		method: impl Into<String>,
		url: impl Into<String>,
		headers: &HeaderMap,
		body: Option<&[u8]>,
	) -> Self {
		Self {
			method: method.into(),
			url: url.into(),
			request_headers: scrub_header_map(headers),
			request_body: body.map(|bytes| preview(&String::from_utf8_lossy(bytes))),
			response: None,
		}
	}

	/// Attaches the response half.
	pub fn with_response(mut self, status: u16, headers: &HeaderMap, body: &str) -> Self {
		self.response = Some(ResponseTrace {
			status,
			headers: scrub_header_map(headers),
			body: body.to_owned(),
		});

		self
	}

	/// Looks up a request header value (case-insensitive).
	pub fn request_header(&self, name: &str) -> Option<&str> {
		self.request_headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Response status, if a response arrived.
	pub fn status(&self) -> Option<u16> {
		self.response.as_ref().map(|response| response.status)
	}
}
impl Display for CallTrace {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		writeln!(f, "Request: {}", self.url)?;
		writeln!(f, "Method: {}", self.method)?;
		write_headers(f, &self.request_headers)?;
		writeln!(f, "Body:")?;
		writeln!(f, "{}", self.request_body.as_deref().unwrap_or_default())?;

		match &self.response {
			Some(response) => {
				writeln!(f, "Response:")?;
				writeln!(f, "Status: {}", response.status)?;
				write_headers(f, &response.headers)?;
				writeln!(f, "Body:")?;
				write!(f, "{}", response.body)
			},
			None => write!(f, "Response: <none>"),
		}
	}
}

/// Response half of a [`CallTrace`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseTrace {
	/// HTTP status code.
	pub status: u16,
	/// Scrubbed response headers.
	pub headers: Vec<(String, String)>,
	/// Response body text.
	pub body: String,
}

/// Receives one [`CallTrace`] per HTTP exchange, including failed ones.
pub trait TelemetrySink
where
	Self: Send + Sync,
{
	/// Publishes a trace.
	fn emit(&self, trace: &CallTrace);
}

/// Default sink writing each trace as an `info` event on the `openworld_sdk` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTelemetry;
impl TelemetrySink for TracingTelemetry {
	fn emit(&self, trace: &CallTrace) {
		#[cfg(feature = "tracing")]
		tracing::info!(
			target: "openworld_sdk",
			method = %trace.method,
			url = %trace.url,
			status = trace.status(),
			"{trace}"
		);
		#[cfg(not(feature = "tracing"))]
		let _ = trace;
	}
}

/// Sink that keeps every trace in memory.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
	traces: Mutex<Vec<CallTrace>>,
}
impl MemoryTelemetry {
	/// Copies of every trace received so far.
	pub fn traces(&self) -> Vec<CallTrace> {
		self.traces.lock().clone()
	}

	/// Traces whose method matches `method`.
	pub fn traces_for(&self, method: &str) -> Vec<CallTrace> {
		self.traces.lock().iter().filter(|trace| trace.method == method).cloned().collect()
	}
}
impl TelemetrySink for MemoryTelemetry {
	fn emit(&self, trace: &CallTrace) {
		self.traces.lock().push(trace.clone());
	}
}

fn write_headers(f: &mut Formatter, headers: &[(String, String)]) -> FmtResult {
	writeln!(f, "Headers:")?;
	writeln!(f, "\t--- BEGIN ---")?;

	for (name, value) in headers {
		writeln!(f, "\t{name}: {value}")?;
	}

	writeln!(f, "\t--- END ---")
}

fn preview(text: &str) -> String {
	match text.char_indices().nth(BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scrubber_masks_credential_headers() {
		let scrubbed = scrub_headers([
			("Authorization", "Bearer AT"),
			("X-Api-Key", "k"),
			("Content-Type", "application/json"),
		]);

		assert_eq!(
			scrubbed,
			[
				("Authorization".to_owned(), REDACTED.to_owned()),
				("X-Api-Key".to_owned(), REDACTED.to_owned()),
				("Content-Type".to_owned(), "application/json".to_owned()),
			]
		);
	}

	#[test]
	fn sensitivity_is_case_insensitive_substring() {
		assert!(is_sensitive_header("CLIENT_SECRET"));
		assert!(is_sensitive_header("x-username"));
		assert!(is_sensitive_header("Proxy-Password"));
		assert!(is_sensitive_header("apikey"));
		assert!(!is_sensitive_header("transaction-id"));
		assert!(!is_sensitive_header("Accept"));
	}

	#[test]
	fn trace_renders_request_and_response_sections() {
		let mut headers = HeaderMap::new();

		headers.insert("authorization", HeaderValue::from_static("Bearer AT"));
		headers.insert("accept", HeaderValue::from_static("application/json"));

		let trace =
			CallTrace::request("POST", "https://api.test/hello", &headers, Some(b"{}".as_slice()))
				.with_response(200, &HeaderMap::new(), "{\"message\":\"hi\"}");
		let rendered = trace.to_string();

		assert_eq!(trace.request_header("Authorization"), Some(REDACTED));
		assert!(rendered.starts_with("Request: https://api.test/hello\nMethod: POST\n"));
		assert!(rendered.contains("\tauthorization: <redacted>\n"));
		assert!(rendered.contains("\taccept: application/json\n"));
		assert!(rendered.contains("Status: 200"));
		assert!(!rendered.contains("Bearer AT"));
	}

	#[test]
	fn request_preview_is_truncated() {
		let body = "x".repeat(BODY_PREVIEW_LIMIT + 10);
		let trace =
			CallTrace::request("POST", "https://api.test", &HeaderMap::new(), Some(body.as_bytes()));
		let kept = trace.request_body.expect("Request body should be recorded.");

		assert_eq!(kept.len(), BODY_PREVIEW_LIMIT + 3);
		assert!(kept.ends_with("..."));
	}

	#[test]
	fn memory_sink_filters_by_method() {
		let sink = MemoryTelemetry::default();

		sink.emit(&CallTrace::request("GET", "https://api.test/a", &HeaderMap::new(), None));
		sink.emit(&CallTrace::request("POST", "https://api.test/b", &HeaderMap::new(), None));

		assert_eq!(sink.traces().len(), 2);
		assert_eq!(sink.traces_for("GET")[0].url, "https://api.test/a");
	}
}
