//! HTTP client for the Beaconpost API
//!
//! Owns the base URL and the JSON (de)serialization of request bodies. All
//! failure modes — connectivity, timeout, non-2xx status, undecodable body —
//! fold into [`Error::Api`] with a human-readable description; callers never
//! branch on error subtypes.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;

use crate::error::{Error, Result};

/// Default API host; replaceable via [`ApiClient::set_base_url`]
pub const DEFAULT_BASE_URL: &str = "https://api.beaconpost.io";

/// Endpoint for event tracking
pub const TRACK_ENDPOINT: &str = "/v2/analytics/track";
/// Endpoint for device registration
pub const REGISTER_ENDPOINT: &str = "/v2/devices/register";
/// Endpoint for connectivity checks
pub const HEARTBEAT_ENDPOINT: &str = "/v2/heartbeat";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Beaconpost API
pub struct ApiClient {
    http: reqwest::Client,
    base_url: RwLock<String>,
}

impl ApiClient {
    /// Create a client pointed at [`DEFAULT_BASE_URL`]
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: RwLock::new(DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Replace the base URL for all subsequent requests
    pub fn set_base_url(&self, url: &str) {
        let mut base_url = self.base_url.write().unwrap_or_else(|p| p.into_inner());
        *base_url = url.trim_end_matches('/').to_string();
    }

    /// Current base URL; used for diagnostic logging only
    pub fn base_url(&self) -> String {
        self.base_url
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// POST a JSON body to an endpoint. 2xx means success; the response body
    /// is ignored.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        api_key: &str,
        body: &T,
    ) -> Result<()> {
        let url = format!("{}{}", self.base_url(), endpoint);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Api(format!("HTTP request failed ({}): {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Api(format!(
                "API error ({}) from {}: {}",
                status, url, error_text
            )))
        }
    }

    /// GET an endpoint, returning the raw response body on 2xx
    pub async fn get(&self, endpoint: &str, api_key: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url(), endpoint);

        let response = self
            .http
            .get(&url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| Error::Api(format!("HTTP request failed ({}): {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            response
                .text()
                .await
                .map_err(|e| Error::Api(format!("failed to read response body: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Api(format!(
                "API error ({}) from {}: {}",
                status, url, error_text
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let client = ApiClient::new().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_set_base_url_trims_trailing_slash() {
        let client = ApiClient::new().unwrap();
        client.set_base_url("https://staging.example.com/");
        assert_eq!(client.base_url(), "https://staging.example.com");

        client.set_base_url("https://staging.example.com");
        assert_eq!(client.base_url(), "https://staging.example.com");
    }
}
