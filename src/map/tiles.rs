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

//! Street map tile source.

use walkers::sources::OpenStreetMap;
use walkers::{HttpOptions, HttpTiles};

/// Attribution line drawn over the map.
pub const ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Create the OpenStreetMap tile fetcher with an on-disk cache.
pub fn street_tiles(ctx: &egui::Context) -> HttpTiles {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from(".cache"))
        .join("geonear-desktop")
        .join("tiles");

    let http_options = HttpOptions {
        cache: Some(cache_dir),
        ..Default::default()
    };

    HttpTiles::with_options(OpenStreetMap, http_options, ctx.clone())
}
