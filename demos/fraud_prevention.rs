//! Screens a purchase against a mocked Fraud Prevention endpoint using the OAuth 2.0 strategy.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::{Deserialize, Serialize};
// self
use openworld_sdk::{
	client::{ApiClient, RequestHeaders},
	config::{ClientConfig, Product},
	decode::ResponseModels,
	operation::{self, QueryParams, TRANSACTION_ID, USER_AGENT, UserAgent},
};

#[derive(Serialize)]
struct ScreenRequest {
	transaction: Transaction,
	device_fingerprint: Option<String>,
}

#[derive(Serialize)]
struct Transaction {
	order_id: String,
	total_price: f64,
	currency_code: &'static str,
}

#[derive(Debug, Deserialize)]
struct ScreenResponse {
	risk_id: String,
	decision: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/identity/oauth2/v3/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":1800}",
			);
		})
		.await;
	let screen_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/fraud-prevention/v2/order/purchase/screen")
				.header("authorization", "Bearer demo-access")
				.header_exists("transaction-id");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"risk_id\":\"1-2-3\",\"decision\":\"ACCEPT\"}");
		})
		.await;
	let config = ClientConfig::builder(Product::FraudPrevention)
		.key("demo-key")
		.secret("demo-secret")
		.endpoint(server.url("/"))
		.auth_endpoint(server.url("/identity/oauth2/v3/token"))
		.build()?;
	let client = ApiClient::new(&config).await?;
	let url = operation::operation_url(
		client.endpoint(),
		"fraud-prevention/v2/order/purchase/screen",
		&QueryParams::new(),
	)?;
	let headers = RequestHeaders::new()
		.with(TRANSACTION_ID, &operation::new_transaction_id())?
		.with(USER_AGENT, &UserAgent::runtime())?;
	let request = ScreenRequest {
		transaction: Transaction {
			order_id: "order-42".into(),
			total_price: 199.99,
			currency_code: "USD",
		},
		device_fingerprint: None,
	};
	let decision = client
		.call("POST", &url, Some(&request), &headers, &ResponseModels::<ScreenResponse>::of())
		.await?;

	match decision {
		Some(decision) => println!("Risk {} decided as {}.", decision.risk_id, decision.decision),
		None => println!("Screening response did not match the expected model."),
	}

	token_mock.assert_async().await;
	screen_mock.assert_async().await;

	Ok(())
}
