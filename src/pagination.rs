//! Link-header pagination over the request pipeline.
//!
//! [`Paginator::new`] performs the initial GET eagerly so the first page and the advisory
//! `Pagination-Total-Results` count are available immediately. Each [`Paginator::next_page`] after
//! that follows the `rel="next"` link of the previous response; a response without one ends the
//! sequence. When the caller supplied a `transaction-id` header, every follow-up request carries a
//! freshly generated id.

pub mod link;

pub use link::*;

// self
use crate::{
	_prelude::*,
	client::{ApiClient, ApiResponse, NO_BODY, RequestHeaders},
	decode::ResponseModels,
	obs::OperationKind,
	operation::{self, LINK, PAGINATION_TOTAL_RESULTS, TRANSACTION_ID},
};

/// One decoded page.
#[derive(Clone, Debug)]
pub struct Page<T> {
	/// First candidate model the body matched.
	pub body: Option<T>,
	/// Raw response headers.
	pub headers: HeaderMap,
	/// Link the next page will be fetched from.
	pub next_link: Option<Url>,
}

/// Lazy cursor over a paginated resource.
pub struct Paginator<T> {
	client: ApiClient,
	headers: RequestHeaders,
	models: ResponseModels<T>,
	first: Option<Page<T>>,
	next_url: Option<Url>,
	last_response_headers: HeaderMap,
	total_results: Option<u64>,
	requests: usize,
}
impl<T> Paginator<T> {
	/// Issues the initial GET against `initial_url`.
	pub async fn new(
		client: ApiClient,
		initial_url: Url,
		headers: RequestHeaders,
		models: ResponseModels<T>,
	) -> Result<Self> {
		let response = client
			.execute(OperationKind::Call, "GET", &initial_url, NO_BODY, &headers, &models)
			.await?;
		let total_results = parse_total_results(&response.headers);
		let page = into_page(&initial_url, response);

		Ok(Self {
			client,
			headers,
			models,
			next_url: page.next_link.clone(),
			last_response_headers: page.headers.clone(),
			first: Some(page),
			total_results,
			requests: 1,
		})
	}

	/// Returns the next page, or `None` once the server stops supplying a next link.
	///
	/// A failed request ends the sequence; later calls return `None`.
	pub async fn next_page(&mut self) -> Result<Option<Page<T>>> {
		if let Some(first) = self.first.take() {
			return Ok(Some(first));
		}

		let Some(url) = self.next_url.take() else { return Ok(None) };

		if self.headers.contains(TRANSACTION_ID) {
			self.headers.insert(TRANSACTION_ID, &operation::new_transaction_id())?;
		}

		let response = self
			.client
			.execute(OperationKind::Page, "GET", &url, NO_BODY, &self.headers, &self.models)
			.await?;

		self.requests += 1;

		let page = into_page(&url, response);

		self.next_url = page.next_link.clone();
		self.last_response_headers = page.headers.clone();

		Ok(Some(page))
	}

	/// Advisory total reported by the first response.
	pub fn total_results(&self) -> Option<u64> {
		self.total_results
	}

	/// Headers of the most recent response.
	pub fn last_response_headers(&self) -> &HeaderMap {
		&self.last_response_headers
	}

	/// Link the next request will follow.
	pub fn next_link(&self) -> Option<&Url> {
		self.next_url.as_ref()
	}

	/// Headers sent with the most recent request.
	pub fn request_headers(&self) -> &RequestHeaders {
		&self.headers
	}

	/// Number of HTTP requests issued so far.
	pub fn requests(&self) -> usize {
		self.requests
	}

	/// Returns `true` once no further page can be produced.
	pub fn is_exhausted(&self) -> bool {
		self.first.is_none() && self.next_url.is_none()
	}
}
impl<T> Debug for Paginator<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Paginator")
			.field("next_url", &self.next_url.as_ref().map(Url::as_str))
			.field("total_results", &self.total_results)
			.field("requests", &self.requests)
			.finish()
	}
}

fn into_page<T>(request_url: &Url, response: ApiResponse<T>) -> Page<T> {
	let next_link = extract_next_link(request_url, &response.headers);

	Page { body: response.value, headers: response.headers, next_link }
}

/// Resolves the next-page URL carried by `headers`, relative to `request_url`.
pub fn extract_next_link(request_url: &Url, headers: &HeaderMap) -> Option<Url> {
	let link = next_link(headers.get_all(LINK).iter().filter_map(|value| value.to_str().ok()))?;

	if link.is_expired_at(OffsetDateTime::now_utc()) {
		#[cfg(feature = "tracing")]
		tracing::warn!(link = %link.target, "Next-page link has already expired.");
	}

	match request_url.join(&link.target) {
		Ok(url) => Some(url),
		Err(e) => {
			#[cfg(feature = "tracing")]
			tracing::warn!(link = %link.target, error = %e, "Ignoring unparseable next-page link.");
			#[cfg(not(feature = "tracing"))]
			let _ = e;

			None
		},
	}
}

fn parse_total_results(headers: &HeaderMap) -> Option<u64> {
	headers.get(PAGINATION_TOTAL_RESULTS)?.to_str().ok()?.trim().parse().ok()
}
