//! Typed response decoding and the platform's shared error shape.
//!
//! Operations declare the models a response body may match as an ordered [`ResponseModels`] list.
//! Decoding walks the list, skips placeholder entries, and keeps the first model that parses.
//! No match yields `None`, never an error.

// self
use crate::_prelude::*;

type Candidate<T> = Box<dyn Fn(&[u8]) -> Result<T, DecodeMismatch> + Send + Sync>;

/// Reason a body did not match a candidate model.
#[derive(Debug, ThisError)]
enum DecodeMismatch {
	#[error("{}: {}", .0.path(), .0.inner())]
	Shape(serde_path_to_error::Error<serde_json::Error>),
	#[error("trailing input: {0}")]
	TrailingInput(serde_json::Error),
}

/// Ordered candidate models a response body may decode into.
pub struct ResponseModels<T> {
	candidates: Vec<Option<Candidate<T>>>,
}
impl<T> ResponseModels<T> {
	/// Empty list; every body decodes to `None`.
	pub fn new() -> Self {
		Self { candidates: Vec::new() }
	}

	/// List holding a single placeholder entry.
	pub fn discarding() -> Self {
		Self::new().discard()
	}

	/// Appends a model `M`, mapped into `T` by `wrap` on success.
	pub fn candidate<M, F>(mut self, wrap: F) -> Self
	where
		M: 'static + DeserializeOwned,
		F: 'static + Send + Sync + Fn(M) -> T,
	{
		self.candidates.push(Some(Box::new(move |body: &[u8]| {
			let mut deserializer = serde_json::Deserializer::from_slice(body);
			let value = serde_path_to_error::deserialize::<_, M>(&mut deserializer)
				.map_err(DecodeMismatch::Shape)?;

			deserializer.end().map_err(DecodeMismatch::TrailingInput)?;

			Ok(wrap(value))
		})));

		self
	}

	/// Appends a placeholder entry that never matches.
	pub fn discard(mut self) -> Self {
		self.candidates.push(None);

		self
	}

	/// Number of entries, placeholders included.
	pub fn len(&self) -> usize {
		self.candidates.len()
	}

	/// Returns `true` when the list has no entries.
	pub fn is_empty(&self) -> bool {
		self.candidates.is_empty()
	}

	/// Returns the first successful decode of `body`, in declaration order.
	pub fn decode(&self, body: &[u8]) -> Option<T> {
		for (index, candidate) in self.candidates.iter().enumerate() {
			let Some(candidate) = candidate else { continue };

			match candidate(body) {
				Ok(value) => return Some(value),
				Err(e) => {
					#[cfg(feature = "tracing")]
					tracing::debug!(
						candidate = index,
						error = %e,
						"Response body does not match candidate model."
					);
					#[cfg(not(feature = "tracing"))]
					let _ = (index, e);
				},
			}
		}

		None
	}
}
impl<M> ResponseModels<M>
where
	M: 'static + DeserializeOwned,
{
	/// List holding `M` as its only model.
	pub fn of() -> Self {
		Self::new().model()
	}

	/// Appends `M` itself as a candidate.
	pub fn model(self) -> Self {
		self.candidate::<M, _>(|value| value)
	}
}
impl<T> Default for ResponseModels<T> {
	fn default() -> Self {
		Self::new()
	}
}
impl<T> Debug for ResponseModels<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResponseModels")
			.field("candidates", &self.candidates.len())
			.field("placeholders", &self.candidates.iter().filter(|c| c.is_none()).count())
			.finish()
	}
}

/// Error body shared by every product: `{ type, detail, causes? }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
	/// URI identifying the error category.
	#[serde(rename = "type")]
	pub r#type: String,
	/// Human-readable description.
	pub detail: String,
	/// Individual causes, when the server reports them.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub causes: Option<Vec<ErrorCause>>,
}
impl ApiError {
	/// Decodes the shared error shape, returning `None` when the body does not match.
	pub fn decode(body: &[u8]) -> Option<Self> {
		serde_json::from_slice(body).ok()
	}
}

/// One cause inside an [`ApiError`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCause {
	/// URI identifying the cause category.
	#[serde(rename = "type")]
	pub r#type: String,
	/// Human-readable description.
	pub detail: String,
	/// Part of the request the cause refers to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub location: Option<ErrorLocation>,
	/// Name of the offending element.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Offending value rendered as text.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<String>,
}

/// Request part an [`ErrorCause`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorLocation {
	/// Request header.
	Header,
	/// Path segment.
	Path,
	/// Query parameter.
	Query,
	/// Request body.
	Body,
}
