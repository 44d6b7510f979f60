// std
use std::collections::HashSet;
// crates.io
use httpmock::prelude::*;
// self
use openworld_sdk::{
	_preludet::*,
	client::{ApiClient, RequestHeaders},
	decode::ResponseModels,
	obs::{MemoryTelemetry, REDACTED},
	operation::{self, TRANSACTION_ID},
	pagination::Paginator,
};

#[derive(Debug, PartialEq, Deserialize)]
struct Region {
	page: u32,
}

async fn signature_client(server: &MockServer) -> (ApiClient, Arc<MemoryTelemetry>) {
	let config = signature_test_config(&server.base_url());
	let telemetry = recording_telemetry();
	let client = ApiClient::with_telemetry(&config, test_reqwest_http_client(), telemetry.clone())
		.await
		.expect("Signature clients should build without network access.");

	(client, telemetry)
}

fn transaction_headers() -> RequestHeaders {
	RequestHeaders::new()
		.with(TRANSACTION_ID, &operation::new_transaction_id())
		.expect("Transaction id should serialize.")
}

#[tokio::test]
async fn follows_next_links_with_fresh_transaction_ids() {
	let server = MockServer::start_async().await;
	let link_p2 = format!("<{}>; rel=\"next\"", server.url("/regions/p2"));
	let link_p3 = format!("<{}>; rel=\"next\"", server.url("/regions/p3"));
	let p1 = server
		.mock_async(|when, then| {
			when.method(GET).path("/regions").header_exists("authorization");
			then.status(200)
				.header("content-type", "application/json")
				.header("link", link_p2.as_str())
				.header("pagination-total-results", "3")
				.body("{\"page\":1}");
		})
		.await;
	let p2 = server
		.mock_async(|when, then| {
			when.method(GET).path("/regions/p2").header_exists("transaction-id");
			then.status(200)
				.header("content-type", "application/json")
				.header("link", link_p3.as_str())
				.body("{\"page\":2}");
		})
		.await;
	let p3 = server
		.mock_async(|when, then| {
			when.method(GET).path("/regions/p3").header_exists("transaction-id");
			then.status(200).header("content-type", "application/json").body("{\"page\":3}");
		})
		.await;
	let (client, telemetry) = signature_client(&server).await;
	let url = Url::parse(&server.url("/regions")).expect("Mock URL should parse.");
	let mut paginator =
		Paginator::new(client, url, transaction_headers(), ResponseModels::<Region>::of())
			.await
			.expect("First page should load.");

	assert_eq!(paginator.total_results(), Some(3));
	assert_eq!(paginator.requests(), 1);

	let mut pages = Vec::new();

	while let Some(page) = paginator.next_page().await.expect("Every page should load.") {
		pages.push(page.body.expect("Every page should decode.").page);
	}

	assert_eq!(pages, [1, 2, 3]);
	assert_eq!(paginator.requests(), 3);
	assert!(paginator.is_exhausted());
	assert!(paginator.next_page().await.expect("Exhausted paginator should not fail.").is_none());

	p1.assert_async().await;
	p2.assert_async().await;
	p3.assert_async().await;

	let traces = telemetry.traces_for("GET");
	let ids = traces
		.iter()
		.map(|trace| trace.request_header(TRANSACTION_ID).expect("Every page sends an id."))
		.collect::<HashSet<_>>();

	assert_eq!(traces.len(), 3);
	assert_eq!(ids.len(), 3);
	assert!(traces.iter().all(|trace| trace.request_header("authorization") == Some(REDACTED)));
}

#[tokio::test]
async fn relative_links_resolve_against_the_request() {
	let server = MockServer::start_async().await;
	let _first = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/items");
			then.status(200)
				.header("content-type", "application/json")
				.header("link", "</v3/items/next>; rel=\"next\"")
				.body("{\"page\":1}");
		})
		.await;
	let last = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/items/next");
			then.status(200).header("content-type", "application/json").body("{\"page\":2}");
		})
		.await;
	let (client, _telemetry) = signature_client(&server).await;
	let url = Url::parse(&server.url("/v3/items")).expect("Mock URL should parse.");
	let mut paginator =
		Paginator::new(client, url, RequestHeaders::new(), ResponseModels::<Region>::of())
			.await
			.expect("First page should load.");

	assert_eq!(paginator.total_results(), None);
	assert_eq!(
		paginator.next_link().map(Url::as_str),
		Some(server.url("/v3/items/next").as_str())
	);

	let first = paginator.next_page().await.expect("First page should be returned.");
	let second = paginator.next_page().await.expect("Second page should load.");

	assert_eq!(first.and_then(|page| page.body), Some(Region { page: 1 }));
	assert_eq!(second.and_then(|page| page.body), Some(Region { page: 2 }));
	assert!(paginator.request_headers().get(TRANSACTION_ID).is_none());

	last.assert_async().await;
}

#[tokio::test]
async fn failed_page_surfaces_service_error() {
	let server = MockServer::start_async().await;
	let next = format!("<{}>; rel=\"next\"", server.url("/broken"));
	let _first = server
		.mock_async(|when, then| {
			when.method(GET).path("/start");
			then.status(200)
				.header("content-type", "application/json")
				.header("link", next.as_str())
				.body("{\"page\":1}");
		})
		.await;
	let _broken = server
		.mock_async(|when, then| {
			when.method(GET).path("/broken");
			then.status(500)
				.header("content-type", "application/json")
				.body("{\"type\":\"server.error\",\"detail\":\"boom\"}");
		})
		.await;
	let (client, _telemetry) = signature_client(&server).await;
	let url = Url::parse(&server.url("/start")).expect("Mock URL should parse.");
	let mut paginator =
		Paginator::new(client, url, transaction_headers(), ResponseModels::<Region>::of())
			.await
			.expect("First page should load.");

	paginator.next_page().await.expect("First page should be returned.");

	let err = paginator.next_page().await.expect_err("The broken page should fail.");

	assert_eq!(err.status(), Some(500));
	assert_eq!(err.as_service().map(|service| service.detail()), Some("boom"));
	assert!(paginator.next_page().await.expect("Sequence should end after a failure.").is_none());
}
