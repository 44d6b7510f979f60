//! Walks a mocked Rapid region listing with signature auth and `Link` header pagination.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
// self
use openworld_sdk::{
	client::{ApiClient, RequestHeaders},
	config::{ClientConfig, Product},
	decode::ResponseModels,
	operation::{self, QueryParams, TRANSACTION_ID},
	pagination::Paginator,
};

#[derive(Debug, Deserialize)]
struct Region {
	id: String,
	name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let next = format!("<{}>; rel=\"next\"", server.url("/v3/regions?token=page-2"));
	let first_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/regions").query_param("language", "en-US");
			then.status(200)
				.header("content-type", "application/json")
				.header("link", next.as_str())
				.header("pagination-total-results", "2")
				.body("[{\"id\":\"178248\",\"name\":\"Paris\"}]");
		})
		.await;
	let second_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/regions").query_param("token", "page-2");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":\"6049718\",\"name\":\"Lyon\"}]");
		})
		.await;
	let config = ClientConfig::builder(Product::Rapid)
		.key("demo-key")
		.secret("demo-secret")
		.endpoint(server.url("/v3/"))
		.build()?;
	let client = ApiClient::new(&config).await?;
	let url = operation::operation_url(
		client.endpoint(),
		"regions",
		&QueryParams::new().with("language", "en-US")?.with("include", &["standard"])?,
	)?;
	let headers = RequestHeaders::new().with(TRANSACTION_ID, &operation::new_transaction_id())?;
	let mut paginator =
		Paginator::new(client, url, headers, ResponseModels::<Vec<Region>>::of()).await?;

	println!("Server reports {:?} regions.", paginator.total_results());

	while let Some(page) = paginator.next_page().await? {
		for region in page.body.unwrap_or_default() {
			println!("{} {}", region.id, region.name);
		}
	}

	first_mock.assert_async().await;
	second_mock.assert_async().await;

	Ok(())
}
