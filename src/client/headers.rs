//! Caller header maps and their rendering onto the wire.

// self
use crate::{_prelude::*, error::ClientError};

/// Headers every call starts from; caller entries with the same name replace them.
pub const DEFAULT_HEADERS: [(&str, &str); 3] = [
	("content-type", "application/json"),
	("accept", "application/json"),
	("accept-encoding", "gzip"),
];

/// Ordered header map whose values may be any serializable value.
///
/// Null and empty values are dropped when rendered; strings, numbers, and booleans render as
/// text; arrays and objects render as compact JSON. Names compare case-insensitively, and setting
/// a name twice keeps the later value in the original position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestHeaders {
	entries: Vec<(String, Value)>,
}
impl RequestHeaders {
	/// Empty header map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets `name` to `value`, replacing any entry with the same name.
	pub fn insert<V>(&mut self, name: impl Into<String>, value: &V) -> Result<&mut Self, ClientError>
	where
		V: ?Sized + Serialize,
	{
		let name = name.into();
		let value = serde_json::to_value(value).map_err(ClientError::Serialization)?;

		match self.entries.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(&name)) {
			Some(entry) => entry.1 = value,
			None => self.entries.push((name, value)),
		}

		Ok(self)
	}

	/// Builder form of [`insert`](Self::insert).
	pub fn with<V>(mut self, name: impl Into<String>, value: &V) -> Result<Self, ClientError>
	where
		V: ?Sized + Serialize,
	{
		self.insert(name, value)?;

		Ok(self)
	}

	/// Raw value stored under `name`.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.entries.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value)
	}

	/// Returns `true` when `name` is present, even if its value renders empty.
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` when no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Name/value pairs that survive rendering, in insertion order.
	pub fn rendered(&self) -> Vec<(&str, String)> {
		self.entries
			.iter()
			.filter_map(|(name, value)| render_value(value).map(|text| (name.as_str(), text)))
			.collect()
	}

	/// Defaults merged with the rendered caller entries.
	pub fn to_header_map(&self) -> Result<HeaderMap, ClientError> {
		let mut map = HeaderMap::new();

		for (name, value) in DEFAULT_HEADERS {
			map.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
		}
		for (name, value) in self.rendered() {
			let invalid = || ClientError::InvalidHeader { name: name.to_owned() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(&value).map_err(|_| invalid())?;

			map.insert(header_name, header_value);
		}

		Ok(map)
	}
}

/// Text form of a header or query value; `None` when the value must be omitted.
pub(crate) fn render_value(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(text) if text.is_empty() => None,
		Value::String(text) => Some(text.clone()),
		Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
		Value::Array(items) if items.is_empty() => None,
		Value::Object(fields) if fields.is_empty() => None,
		Value::Array(_) | Value::Object(_) => Some(value.to_string()),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Serialize)]
	struct Device {
		id: u32,
		kind: &'static str,
	}

	#[test]
	fn rendering_drops_empty_and_encodes_nested() {
		let headers = RequestHeaders::new()
			.with("transaction-id", "abc")
			.and_then(|h| h.with("X-Empty", ""))
			.and_then(|h| h.with("X-None", &Option::<String>::None))
			.and_then(|h| h.with("X-List", &Vec::<String>::new()))
			.and_then(|h| h.with("X-Count", &3))
			.and_then(|h| h.with("X-Flag", &true))
			.and_then(|h| h.with("X-Device", &Device { id: 7, kind: "mobile" }))
			.expect("Headers should serialize.");

		assert_eq!(headers.len(), 7);
		assert_eq!(
			headers.rendered(),
			[
				("transaction-id", "abc".to_owned()),
				("X-Count", "3".to_owned()),
				("X-Flag", "true".to_owned()),
				("X-Device", r#"{"id":7,"kind":"mobile"}"#.to_owned()),
			]
		);
	}

	#[test]
	fn caller_values_override_defaults() {
		let map = RequestHeaders::new()
			.with("content-type", "application/merge-patch+json")
			.expect("Headers should serialize.")
			.to_header_map()
			.expect("Headers should render.");

		assert_eq!(map["content-type"], "application/merge-patch+json");
		assert_eq!(map["accept"], "application/json");
		assert_eq!(map["accept-encoding"], "gzip");
		assert_eq!(map.len(), 3);
	}

	#[test]
	fn insert_replaces_case_insensitively() {
		let mut headers = RequestHeaders::new();

		headers.insert("Transaction-Id", "a").expect("Header should serialize.");
		headers.insert("transaction-id", "b").expect("Header should serialize.");

		assert_eq!(headers.len(), 1);
		assert_eq!(headers.get("TRANSACTION-ID"), Some(&Value::from("b")));
	}

	#[test]
	fn invalid_header_names_are_rejected() {
		let err = RequestHeaders::new()
			.with("bad header", "x")
			.expect("Header should serialize.")
			.to_header_map()
			.expect_err("Whitespace in names should be rejected.");

		assert!(matches!(err, ClientError::InvalidHeader { name } if name == "bad header"));
	}
}
