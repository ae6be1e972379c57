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

//! Application configuration management.
//!
//! Persistent configuration in TOML format: the nearby-search base URL and
//! the map view defaults. The base URL can be overridden per-deployment via
//! the `GEONEAR_API_BASE_URL` environment variable, which takes precedence
//! over the config file.

use serde::{Deserialize, Serialize};

/// Default base URL of the nearby-search backend.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Environment variable overriding the configured base URL.
pub const API_BASE_URL_ENV: &str = "GEONEAR_API_BASE_URL";

/// Application configuration stored in TOML format.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Base URL of the nearby-search backend.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Initial map center latitude.
    #[serde(default = "default_initial_latitude")]
    pub initial_latitude: f64,

    /// Initial map center longitude.
    #[serde(default = "default_initial_longitude")]
    pub initial_longitude: f64,

    /// Initial (world overview) zoom level.
    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: f64,

    /// Zoom level the view recenters to after a click.
    #[serde(default = "default_click_zoom")]
    pub click_zoom: f64,

    /// Radius of the click circle in meters.
    #[serde(default = "default_click_radius_meters")]
    pub click_radius_meters: f64,
}

// Default value functions for serde
fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_owned()
}

fn default_initial_latitude() -> f64 {
    23.685
}

fn default_initial_longitude() -> f64 {
    90.3563
}

fn default_initial_zoom() -> f64 {
    2.0
}

fn default_click_zoom() -> f64 {
    12.0
}

fn default_click_radius_meters() -> f64 {
    5500.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            initial_latitude: default_initial_latitude(),
            initial_longitude: default_initial_longitude(),
            initial_zoom: default_initial_zoom(),
            click_zoom: default_click_zoom(),
            click_radius_meters: default_click_radius_meters(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating the file with defaults on
    /// first run.
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load("geonear-desktop", "config")
    }

    /// Save configuration to disk.
    #[allow(dead_code)]
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store("geonear-desktop", "config", self)
    }

    /// Get the config file path for display to the user.
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path("geonear-desktop", "config")
    }

    /// Resolve the backend base URL, environment variable first.
    #[must_use]
    pub fn resolve_api_base_url(&self) -> String {
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            if !url.is_empty() {
                return url;
            }
        }

        self.api_base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_backend_contract() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.initial_latitude, 23.685);
        assert_eq!(config.initial_longitude, 90.3563);
        assert_eq!(config.click_zoom, 12.0);
        assert_eq!(config.click_radius_meters, 5500.0);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"api_base_url": "https://geo.example.com"}"#).unwrap();
        assert_eq!(config.api_base_url, "https://geo.example.com");
        assert_eq!(config.initial_zoom, 2.0);
        assert_eq!(config.click_radius_meters, 5500.0);
    }
}
