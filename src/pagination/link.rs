//! `Link` header parsing.
//!
//! Accepts one or more comma-separated values of the form `<target>; name=value; name="value"`.
//! Commas inside `<...>` or quoted parameter values do not split links. Malformed segments are
//! skipped rather than failing the whole header.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::_prelude::*;

/// One parsed link value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkValue {
	/// Raw target between the angle brackets.
	pub target: String,
	/// Parameters in header order; names are lower-cased.
	pub params: Vec<(String, String)>,
}
impl LinkValue {
	/// Value of the first parameter named `name` (case-insensitive).
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Raw `rel` parameter.
	pub fn rel(&self) -> Option<&str> {
		self.param("rel")
	}

	/// Returns `true` when the space-separated `rel` list contains `relation`.
	pub fn has_rel(&self, relation: &str) -> bool {
		self.rel()
			.map(|rel| rel.split_ascii_whitespace().any(|token| token.eq_ignore_ascii_case(relation)))
			.unwrap_or(false)
	}

	/// Instant carried by the `expires` parameter, when present and RFC 3339.
	pub fn expires(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::parse(self.param("expires")?, &Rfc3339).ok()
	}

	/// Returns `true` when `expires` lies before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires().map(|expires| expires < instant).unwrap_or(false)
	}
}

/// Parses every link value in one header value.
pub fn parse_link_header(value: &str) -> Vec<LinkValue> {
	let mut cursor = Cursor { rest: value };
	let mut links = Vec::new();

	loop {
		cursor.skip_while(|c| c == ',' || c.is_whitespace());

		if cursor.is_empty() {
			break;
		}
		if let Some(link) = cursor.link() {
			links.push(link);
		} else {
			cursor.skip_segment();
		}
	}

	links
}

/// Selects the next-page link across header values.
///
/// Prefers a link whose `rel` contains `next`; when no link carries a `rel` parameter at all, the
/// first link is taken.
pub fn next_link<'a, I>(values: I) -> Option<LinkValue>
where
	I: IntoIterator<Item = &'a str>,
{
	let links = values.into_iter().flat_map(parse_link_header).collect::<Vec<_>>();

	if let Some(link) = links.iter().find(|link| link.has_rel("next")) {
		return Some(link.clone());
	}
	if links.iter().all(|link| link.rel().is_none()) {
		return links.into_iter().next();
	}

	None
}

struct Cursor<'a> {
	rest: &'a str,
}
impl<'a> Cursor<'a> {
	fn is_empty(&self) -> bool {
		self.rest.is_empty()
	}

	fn peek(&self) -> Option<char> {
		self.rest.chars().next()
	}

	fn bump(&mut self) {
		if let Some(c) = self.peek() {
			self.rest = &self.rest[c.len_utf8()..];
		}
	}

	fn skip_while(&mut self, predicate: impl Fn(char) -> bool) {
		let end = self.rest.find(|c: char| !predicate(c)).unwrap_or(self.rest.len());

		self.rest = &self.rest[end..];
	}

	fn take_until(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
		let end = self.rest.find(predicate).unwrap_or(self.rest.len());
		let (taken, rest) = self.rest.split_at(end);

		self.rest = rest;

		taken
	}

	/// Skips to the next top-level comma, honoring quotes and angle brackets.
	fn skip_segment(&mut self) {
		let mut quoted = false;
		let mut bracketed = false;

		while let Some(c) = self.peek() {
			match c {
				'"' if !bracketed => quoted = !quoted,
				'\\' if quoted => self.bump(),
				'<' if !quoted => bracketed = true,
				'>' if !quoted => bracketed = false,
				',' if !quoted && !bracketed => return,
				_ => {},
			}

			self.bump();
		}
	}

	fn link(&mut self) -> Option<LinkValue> {
		if self.peek()? != '<' {
			return None;
		}

		self.bump();

		let target = self.take_until(|c| c == '>').trim().to_owned();

		if self.peek() != Some('>') {
			return None;
		}

		self.bump();

		let mut params = Vec::new();

		loop {
			self.skip_while(char::is_whitespace);

			match self.peek() {
				Some(';') => self.bump(),
				Some(',') | None => break,
				Some(_) => {
					self.skip_segment();

					break;
				},
			}

			self.skip_while(char::is_whitespace);

			let name = self.take_until(|c| c == '=' || c == ';' || c == ',').trim();

			if name.is_empty() {
				continue;
			}

			let value = if self.peek() == Some('=') {
				self.bump();
				self.skip_while(char::is_whitespace);
				self.value()
			} else {
				String::new()
			};

			params.push((name.to_ascii_lowercase(), value));
		}

		Some(LinkValue { target, params })
	}

	fn value(&mut self) -> String {
		if self.peek() != Some('"') {
			return self.take_until(|c| c == ';' || c == ',').trim().to_owned();
		}

		self.bump();

		let mut value = String::new();

		while let Some(c) = self.peek() {
			self.bump();

			match c {
				'"' => break,
				'\\' =>
					if let Some(escaped) = self.peek() {
						value.push(escaped);
						self.bump();
					},
				_ => value.push(c),
			}
		}

		value
	}
}
