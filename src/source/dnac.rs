//! DNA Center network-device inventory fetcher.
//!
//! Queries `GET {endpoint}/dna/intent/api/v1/network-device` and turns every
//! element of the `response` array into a device record.
//!
//! ## Example
//!
//! ```rust,no_run
//! use netwatch::source::{DnacFetcher, Fetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = DnacFetcher::builder()
//!         .endpoint("https://10.10.20.85")
//!         .token("eyJhbGciOi...")
//!         .accept_invalid_certs(true)
//!         .build()?;
//!
//!     let records = fetcher.fetch().await?;
//!     println!("{} devices", records.len());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{Fetcher, RawRecord};
use crate::error::FetchError;

const DEVICE_PATH: &str = "/dna/intent/api/v1/network-device";

/// Fetcher for the DNA Center device inventory.
#[derive(Debug, Clone)]
pub struct DnacFetcher {
    client: Client,
    endpoint: String,
    token: Option<String>,
    description: String,
}

impl DnacFetcher {
    pub fn builder() -> DnacFetcherBuilder {
        DnacFetcherBuilder::default()
    }

    fn url(&self) -> String {
        format!("{}{}", self.endpoint, DEVICE_PATH)
    }
}

#[async_trait]
impl Fetcher for DnacFetcher {
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let mut request = self
            .client
            .get(self.url())
            .header("Content-Type", "application/json");
        if let Some(token) = &self.token {
            request = request.header("X-Auth-Token", token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body: DeviceList = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(body.into_records())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for DnacFetcher.
#[derive(Debug, Default)]
pub struct DnacFetcherBuilder {
    endpoint: Option<String>,
    token: Option<String>,
    accept_invalid_certs: bool,
    timeout: Option<Duration>,
}

impl DnacFetcherBuilder {
    /// Set the controller base URL (e.g., "https://10.10.20.85").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Token sent as `X-Auth-Token`.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Accept self-signed certificates (lab controllers).
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<DnacFetcher, FetchError> {
        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "https://localhost".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(DnacFetcher {
            client,
            description: format!("dnac: {}", endpoint),
            endpoint,
            token: self.token,
        })
    }
}

/// Envelope returned by the inventory endpoint.
#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(default)]
    response: Vec<Value>,
}

impl DeviceList {
    fn into_records(self) -> Vec<RawRecord> {
        self.response.into_iter().map(RawRecord::device).collect()
    }
}
