//! Helpers generated operations reduce to: URL assembly, header names, transaction ids, and the
//! user-agent string.

// crates.io
use sysinfo::System;
use uuid::Uuid;
// self
use crate::{_prelude::*, client::headers::render_value, error::ClientError};

/// Correlation header propagated on every request.
pub const TRANSACTION_ID: &str = "transaction-id";
/// User agent header.
pub const USER_AGENT: &str = "user-agent";
/// Pagination link header.
pub const LINK: &str = "link";
/// Advisory total count header on paginated responses.
pub const PAGINATION_TOTAL_RESULTS: &str = "pagination-total-results";

/// Fresh correlation id; generate one per call.
pub fn new_transaction_id() -> Uuid {
	Uuid::new_v4()
}

/// Ordered query parameters sharing the header value rendering rules.
///
/// Null and empty values are dropped, arrays expand into repeated pairs, and objects render as
/// compact JSON.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryParams {
	entries: Vec<(String, Value)>,
}
impl QueryParams {
	/// Empty parameter list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `name` with `value`.
	pub fn with<V>(mut self, name: impl Into<String>, value: &V) -> Result<Self, ClientError>
	where
		V: ?Sized + Serialize,
	{
		let value = serde_json::to_value(value).map_err(ClientError::Serialization)?;

		self.entries.push((name.into(), value));

		Ok(self)
	}

	/// Name/value pairs that survive rendering, in insertion order.
	pub fn pairs(&self) -> Vec<(&str, String)> {
		let mut pairs = Vec::new();

		for (name, value) in &self.entries {
			match value {
				Value::Array(items) => pairs.extend(
					items.iter().filter_map(render_value).map(|text| (name.as_str(), text)),
				),
				value =>
					if let Some(text) = render_value(value) {
						pairs.push((name.as_str(), text));
					},
			}
		}

		pairs
	}
}

/// Joins `path` onto `endpoint` with exactly one `/` and appends the rendered `query`.
///
/// Query pairs already present on `endpoint` are kept.
pub fn operation_url(endpoint: &Url, path: &str, query: &QueryParams) -> Result<Url, ClientError> {
	if endpoint.cannot_be_a_base() {
		return Err(ClientError::InvalidUrl {
			url: endpoint.to_string(),
			source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
		});
	}

	let mut url = endpoint.clone();

	url.set_path(&format!(
		"{}/{}",
		endpoint.path().trim_end_matches('/'),
		path.trim_start_matches('/')
	));

	let pairs = query.pairs();

	if !pairs.is_empty() {
		url.query_pairs_mut().extend_pairs(pairs);
	}

	Ok(url)
}

/// `User-Agent` value identifying the SDK build and host platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAgent {
	sdk_name: String,
	sdk_version: String,
	os_name: String,
	os_version: String,
}
impl UserAgent {
	/// Describes the SDK package calling the runtime core on the current host.
	pub fn new(sdk_name: impl Into<String>, sdk_version: impl Into<String>) -> Self {
		let os_name = System::name().unwrap_or_else(|| std::env::consts::OS.to_owned());
		let os_version = System::os_version().unwrap_or_else(|| "unknown".to_owned());

		Self { sdk_name: sdk_name.into(), sdk_version: sdk_version.into(), os_name, os_version }
	}

	/// User agent of this crate.
	pub fn runtime() -> Self {
		Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
	}

	/// Overrides the detected operating system name and version.
	pub fn with_platform(mut self, os_name: impl Into<String>, os_version: impl Into<String>) -> Self {
		self.os_name = os_name.into();
		self.os_version = os_version.into();

		self
	}
}
impl Display for UserAgent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(
			f,
			"{}/{} (Rust {}; {} {}; {})",
			self.sdk_name,
			self.sdk_version,
			env!("CARGO_PKG_RUST_VERSION"),
			self.os_name,
			self.os_version,
			std::env::consts::ARCH
		)
	}
}
impl Serialize for UserAgent {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.collect_str(self)
	}
}
