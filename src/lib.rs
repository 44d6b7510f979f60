//! Runtime core for the Open World partner SDKs: an authenticated request pipeline with OAuth 2.0
//! and signature strategies, typed response decoding, and link-header pagination.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod obs;
pub mod operation;
pub mod pagination;
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and fixtures shared by integration tests and demos.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{ClientConfig, Product},
		http::ReqwestHttpClient,
		obs::MemoryTelemetry,
	};

	/// Key used by test configurations.
	pub const TEST_KEY: &str = "test-key";
	/// Secret used by test configurations.
	pub const TEST_SECRET: &str = "test-secret";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Returns a telemetry sink that records every emitted trace.
	pub fn recording_telemetry() -> Arc<MemoryTelemetry> {
		Arc::new(MemoryTelemetry::default())
	}

	/// OAuth 2.0 configuration pointing both the API and the token endpoint at a mock server.
	pub fn oauth2_test_config(endpoint: &str, auth_endpoint: &str) -> ClientConfig {
		ClientConfig::builder(Product::FraudPrevention)
			.key(TEST_KEY)
			.secret(TEST_SECRET)
			.endpoint(endpoint)
			.auth_endpoint(auth_endpoint)
			.build()
			.expect("OAuth 2.0 test configuration should be valid.")
	}

	/// Signature configuration pointing the API at a mock server.
	pub fn signature_test_config(endpoint: &str) -> ClientConfig {
		ClientConfig::builder(Product::Rapid)
			.key(TEST_KEY)
			.secret(TEST_SECRET)
			.endpoint(endpoint)
			.build()
			.expect("Signature test configuration should be valid.")
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{
		Client as ReqwestClient, Error as ReqwestError,
		header::{HeaderMap, HeaderName, HeaderValue},
	};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
