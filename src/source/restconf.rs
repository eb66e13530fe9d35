//! RESTCONF interface fetcher.
//!
//! Reads the interface list from `{base}/ietf-interfaces:interfaces`, then the
//! counters of each interface from
//! `{base}/ietf-interfaces:interfaces-state/interface={name}`. The counters
//! are merged into the interface object under `statistics`, which is where
//! the normalizer looks for them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use super::{urlencoded, Fetcher, RawRecord};
use crate::error::FetchError;

const YANG_JSON: &str = "application/yang-data+json";

/// Fetcher for `ietf-interfaces` over RESTCONF.
#[derive(Debug, Clone)]
pub struct RestconfFetcher {
    client: Client,
    base_url: String,
    token: Option<String>,
    credentials: Option<(String, String)>,
    description: String,
}

impl RestconfFetcher {
    pub fn builder() -> RestconfFetcherBuilder {
        RestconfFetcherBuilder::default()
    }

    fn interfaces_url(&self) -> String {
        format!("{}/ietf-interfaces:interfaces", self.base_url)
    }

    fn state_url(&self, name: &str) -> String {
        format!(
            "{}/ietf-interfaces:interfaces-state/interface={}",
            self.base_url,
            urlencoded(name)
        )
    }

    async fn get_json(&self, url: String) -> Result<Value, FetchError> {
        let mut request = self.client.get(url).header("Accept", YANG_JSON);
        if let Some(token) = &self.token {
            request = request.header("X-Auth-Token", token);
        }
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, Some(pass));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Fetcher for RestconfFetcher {
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let body = self.get_json(self.interfaces_url()).await?;
        let mut interfaces = interface_list(body);

        for iface in interfaces.iter_mut() {
            let Some(name) = iface.get("name").and_then(Value::as_str).map(str::to_string) else {
                continue;
            };

            // A missing counter read leaves the interface without statistics
            match self.get_json(self.state_url(&name)).await {
                Ok(state) => {
                    if let Some(stats) = statistics(state) {
                        iface.insert("statistics".to_string(), stats);
                    }
                }
                Err(e) => tracing::warn!(interface = %name, error = %e, "failed to read interface counters"),
            }
        }

        Ok(interfaces
            .into_iter()
            .map(|obj| RawRecord::interface(Value::Object(obj)))
            .collect())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Extract `ietf-interfaces:interfaces.interface[]`. Non-object entries are
/// wrapped as `{"invalid": <entry>}`; having no `name`, they are rejected and
/// counted by the normalizer.
fn interface_list(body: Value) -> Vec<Map<String, Value>> {
    let Value::Object(mut root) = body else {
        return Vec::new();
    };
    let Some(Value::Object(mut container)) = root.remove("ietf-interfaces:interfaces") else {
        return Vec::new();
    };
    let Some(Value::Array(items)) = container.remove("interface") else {
        return Vec::new();
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(obj) => obj,
            other => {
                let mut wrapper = Map::new();
                wrapper.insert("invalid".to_string(), other);
                wrapper
            }
        })
        .collect()
}

/// Extract `ietf-interfaces:interface.statistics` from a state response.
fn statistics(state: Value) -> Option<Value> {
    let Value::Object(mut root) = state else {
        return None;
    };
    match root.remove("ietf-interfaces:interface") {
        Some(Value::Object(mut iface)) => iface.remove("statistics"),
        _ => None,
    }
}

/// Builder for RestconfFetcher.
#[derive(Debug, Default)]
pub struct RestconfFetcherBuilder {
    base_url: Option<String>,
    token: Option<String>,
    credentials: Option<(String, String)>,
    accept_invalid_certs: bool,
    timeout: Option<Duration>,
}

impl RestconfFetcherBuilder {
    /// Set the RESTCONF data root (e.g., "https://10.10.20.48/restconf/data").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Token sent as `X-Auth-Token`.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set basic auth credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<RestconfFetcher, FetchError> {
        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| "https://localhost/restconf/data".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(RestconfFetcher {
            client,
            description: format!("restconf: {}", base_url),
            base_url,
            token: self.token,
            credentials: self.credentials,
        })
    }
}
