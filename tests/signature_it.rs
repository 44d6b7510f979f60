// crates.io
use httpmock::prelude::*;
// self
use openworld_sdk::{
	_preludet::*,
	auth::{AuthStrategy, compute_signature},
	client::{ApiClient, NO_BODY, RequestHeaders},
	config::AuthMethod,
	decode::ResponseModels,
};

#[derive(Debug, Deserialize)]
struct Availability {
	available: bool,
}

fn split_header(value: &str) -> (String, String, i64) {
	let fields = value.strip_prefix("EAN ").expect("Header should use the EAN scheme.");
	let mut key = None;
	let mut signature = None;
	let mut timestamp = None;

	for field in fields.split(',') {
		match field.split_once('=') {
			Some(("APIKey", value)) => key = Some(value.to_owned()),
			Some(("Signature", value)) => signature = Some(value.to_owned()),
			Some(("timestamp", value)) =>
				timestamp = Some(value.parse().expect("Timestamp should be an integer.")),
			_ => panic!("Unexpected header field: {field}"),
		}
	}

	(
		key.expect("APIKey should be present."),
		signature.expect("Signature should be present."),
		timestamp.expect("timestamp should be present."),
	)
}

#[tokio::test]
async fn signature_header_reaches_the_wire() {
	let server = MockServer::start_async().await;
	let config = signature_test_config(&server.base_url());
	let client = ApiClient::with_telemetry(&config, test_reqwest_http_client(), recording_telemetry())
		.await
		.expect("Signature clients should build without network access.");

	assert_eq!(client.auth().method(), AuthMethod::Signature);

	let header = client.auth().current_header();
	let (key, signature, timestamp) = split_header(header.value());

	assert_eq!(key, TEST_KEY);
	assert_eq!(signature, compute_signature(TEST_KEY, TEST_SECRET, timestamp));
	assert_eq!(signature.len(), 128);

	let availability_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/properties/availability").header("authorization", header.value());
			then.status(200).header("content-type", "application/json").body("{\"available\":true}");
		})
		.await;
	let url = Url::parse(&server.url("/properties/availability")).expect("Mock URL should parse.");
	let availability = client
		.call(
			"GET",
			&url,
			NO_BODY,
			&RequestHeaders::new(),
			&ResponseModels::<Availability>::of(),
		)
		.await
		.expect("Signed call should succeed.")
		.expect("Body should decode.");

	assert!(availability.available);

	availability_mock.assert_async().await;

	assert_eq!(client.auth().refresh_metrics().attempts(), 1);
}

#[tokio::test]
async fn signature_is_stable_within_its_lifetime() {
	let server = MockServer::start_async().await;
	let config = signature_test_config(&server.base_url());
	let client = ApiClient::with_telemetry(&config, test_reqwest_http_client(), recording_telemetry())
		.await
		.expect("Signature clients should build without network access.");
	let before = client.auth().current_header();

	client.auth().ensure_fresh().await.expect("Fresh signatures need no renewal.");

	assert_eq!(client.auth().current_header(), before);
	assert!(!client.auth().is_expired());
}
