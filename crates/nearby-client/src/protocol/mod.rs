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

//! Wire contract for the nearby-search endpoint.
//!
//! The endpoint speaks JSON with camelCase field names. The request body is
//! a bare coordinate; the response carries a bounded list of entity records
//! plus the backend's total count.

use serde::{Deserialize, Serialize};

/// A point on the map in WGS84 degrees.
///
/// Doubles as the JSON request body of the nearby-search call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A point-located record returned by the nearby-search endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Unique identifier, stable across queries.
    pub id: String,
    /// Human-readable name shown on marker labels.
    pub display_name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Opaque spatial-index key assigned by the backend.
    pub cell_id: String,
}

impl Entity {
    /// The entity's location as a coordinate.
    #[must_use]
    pub fn location(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Response of one completed nearby-search query.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyResponse {
    /// Entities near the queried point, in backend order.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Total number of matches known to the backend.
    #[serde(default)]
    pub total_count: u64,
}

/// Response of the health-check endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    /// Backend-reported status string.
    pub status: String,
}

impl HealthStatus {
    /// Whether the backend reported itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_field_names() {
        let body = serde_json::to_value(Coordinate::new(23.685, 90.3563)).unwrap();
        assert_eq!(body["latitude"], 23.685);
        assert_eq!(body["longitude"], 90.3563);
    }

    #[test]
    fn test_deserialize_nearby_response() {
        let json = r#"{
            "entities": [
                {
                    "id": "u-101",
                    "displayName": "Alice",
                    "latitude": 23.7,
                    "longitude": 90.4,
                    "cellId": "8844c0a32dfffff"
                }
            ],
            "totalCount": 1
        }"#;

        let response: NearbyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total_count, 1);
        assert_eq!(response.entities.len(), 1);

        let entity = &response.entities[0];
        assert_eq!(entity.id, "u-101");
        assert_eq!(entity.display_name, "Alice");
        assert_eq!(entity.cell_id, "8844c0a32dfffff");
        assert_eq!(entity.location(), Coordinate::new(23.7, 90.4));
    }

    #[test]
    fn test_deserialize_empty_response() {
        let response: NearbyResponse = serde_json::from_str("{}").unwrap();
        assert!(response.entities.is_empty());
        assert_eq!(response.total_count, 0);
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(serde_json::from_str::<NearbyResponse>("<html>bad gateway</html>").is_err());
    }

    #[test]
    fn test_health_status() {
        let status: HealthStatus = serde_json::from_str(r#"{"status": "healthy"}"#).unwrap();
        assert!(status.is_healthy());

        let status: HealthStatus = serde_json::from_str(r#"{"status": "degraded"}"#).unwrap();
        assert!(!status.is_healthy());
    }
}
