// Copyright 2026 The geonear-desktop Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Client library for nearby-entity geo search endpoints.
//!
//! Wraps the two calls the backend exposes: a nearby-search query (POST a
//! coordinate, receive a bounded list of entities around it) and a health
//! check. The layers are small and independent:
//!
//! - **Protocol layer**: wire types for the request/response contract
//! - **Client**: async HTTP transport over the protocol types
//!
//! # Quick Start
//!
//! ```no_run
//! use nearby_client::{Coordinate, NearbyClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = NearbyClient::new("http://localhost:8080");
//!
//!     match client.query(Coordinate::new(23.685, 90.3563)).await {
//!         Ok(response) => {
//!             for entity in &response.entities {
//!                 println!("{}: {}", entity.id, entity.display_name);
//!             }
//!         }
//!         Err(err) => eprintln!("query failed: {err}"),
//!     }
//! }
//! ```
//!
//! # Cancellation
//!
//! The client carries no cancellation primitive. A query is idempotent and
//! side-effect-free on the client, so abandoning one is done entirely by the
//! caller: drop the future (or discard the result of the task driving it)
//! and the eventual resolution has no observable effect.

pub mod protocol;

pub use protocol::{Coordinate, Entity, HealthStatus, NearbyResponse};

use log::debug;
use thiserror::Error;

/// Errors surfaced by the backend boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint could not be reached or the connection failed mid-call.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The endpoint answered with a non-success HTTP status.
    #[error("server returned {status}")]
    Status {
        /// The HTTP status code of the response.
        status: reqwest::StatusCode,
    },

    /// The response body could not be decoded against the wire contract.
    #[error("malformed response payload: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Async HTTP client for a nearby-search backend.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct NearbyClient {
    http: reqwest::Client,
    base_url: String,
}

impl NearbyClient {
    /// Create a client for the given base URL (scheme + host + optional port).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http, base_url }
    }

    /// The configured base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Query for entities near a coordinate.
    ///
    /// Idempotent and side-effect-free on the client; callers that no longer
    /// care about the outcome can simply drop the future.
    pub async fn query(&self, at: Coordinate) -> Result<NearbyResponse, TransportError> {
        debug!(
            "querying nearby entities at ({:.4}, {:.4})",
            at.latitude, at.longitude
        );

        let response = self
            .http
            .post(self.endpoint("/api/nearby"))
            .json(&at)
            .send()
            .await
            .map_err(TransportError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status });
        }

        let body = response.text().await.map_err(TransportError::Network)?;
        serde_json::from_str(&body).map_err(TransportError::Payload)
    }

    /// Ask the backend whether it considers itself healthy.
    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        let response = self
            .http
            .get(self.endpoint("/api/health"))
            .send()
            .await
            .map_err(TransportError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status });
        }

        let body = response.text().await.map_err(TransportError::Network)?;
        serde_json::from_str(&body).map_err(TransportError::Payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining_strips_trailing_slash() {
        let client = NearbyClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.endpoint("/api/nearby"),
            "http://localhost:8080/api/nearby"
        );
    }

    #[test]
    fn test_endpoint_joining_without_trailing_slash() {
        let client = NearbyClient::new("https://geo.example.com");
        assert_eq!(
            client.endpoint("/api/health"),
            "https://geo.example.com/api/health"
        );
    }

    #[test]
    fn test_status_error_display() {
        let err = TransportError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
        };
        assert_eq!(err.to_string(), "server returned 502 Bad Gateway");
    }

    #[test]
    fn test_payload_error_display() {
        let cause = serde_json::from_str::<NearbyResponse>("not json").unwrap_err();
        let err = TransportError::Payload(cause);
        assert!(err.to_string().starts_with("malformed response payload"));
    }
}
