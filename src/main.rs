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

mod config;
mod interaction;
mod map;

use std::sync::{Arc, Mutex};

use eframe::egui;
use log::{info, warn};
use nearby_client::{Coordinate, NearbyClient};
use walkers::{HttpTiles, Map, MapMemory};

use config::AppConfig;
use interaction::{
    BackendHealth, ControllerConfig, MapInteractionController, QueryService, QueryStatus,
};
use map::{position, ClickedAt, InteractionOverlays};

fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    info!("Starting GeoNear Desktop...");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("GeoNear Desktop"),
        ..Default::default()
    };

    eframe::run_native(
        "GeoNear Desktop",
        options,
        Box::new(|cc| Ok(Box::new(GeoNearApp::new(&cc.egui_ctx)))),
    )
}

struct GeoNearApp {
    config: AppConfig,
    controller: MapInteractionController,
    queries: QueryService,
    tiles: Option<HttpTiles>,
    map_memory: MapMemory,
    clicked: ClickedAt,
    health: Arc<Mutex<BackendHealth>>,
}

impl GeoNearApp {
    fn new(ctx: &egui::Context) -> Self {
        let config = AppConfig::load().unwrap_or_else(|e| {
            warn!("failed to load config, using defaults: {e}");
            AppConfig::default()
        });
        if let Ok(path) = AppConfig::get_config_path() {
            info!("config file: {}", path.display());
        }

        let base_url = config.resolve_api_base_url();
        info!("nearby-search endpoint: {base_url}");

        let queries = QueryService::new(NearbyClient::new(base_url))
            .expect("Failed to start query runtime");

        let health = Arc::new(Mutex::new(BackendHealth::Unknown));
        queries.probe_health(Arc::clone(&health), ctx);

        let controller = MapInteractionController::new(ControllerConfig {
            click_zoom: config.click_zoom,
            overlay_radius_meters: config.click_radius_meters,
        });

        let mut map_memory = MapMemory::default();
        map_memory.center_at(position(Coordinate::new(
            config.initial_latitude,
            config.initial_longitude,
        )));
        if map_memory.set_zoom(config.initial_zoom).is_err() {
            warn!("initial zoom {} out of range", config.initial_zoom);
        }

        Self {
            config,
            controller,
            queries,
            tiles: None,
            map_memory,
            clicked: ClickedAt::default(),
            health,
        }
    }

    fn draw_entity_list(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("◈ NEARBY ENTITIES")
                        .color(egui::Color32::from_rgb(100, 200, 100))
                        .size(14.0)
                        .strong(),
                );
            });

            self.draw_status_line(ui);
        });

        ui.add_space(4.0);

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.push_id("entity_list", |ui| {
                for entity in self.controller.entities() {
                    let response = egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(&entity.display_name)
                                .color(egui::Color32::from_rgb(200, 220, 255))
                                .size(12.0)
                                .strong(),
                        );
                        ui.label(
                            egui::RichText::new(format!(
                                "{:>8.4}° {:>9.4}°",
                                entity.latitude, entity.longitude
                            ))
                            .color(egui::Color32::from_rgb(150, 150, 150))
                            .size(9.0)
                            .monospace(),
                        );
                        ui.label(
                            egui::RichText::new(format!("cell {}", entity.cell_id))
                                .color(egui::Color32::from_rgb(110, 110, 110))
                                .size(8.5)
                                .monospace(),
                        );
                    });

                    if response.response.interact(egui::Sense::click()).clicked() {
                        self.map_memory.center_at(position(entity.location()));
                    }

                    ui.add_space(3.0);
                }
            });
        });
    }

    fn draw_status_line(&self, ui: &mut egui::Ui) {
        let (color, text) = match self.controller.status() {
            QueryStatus::Idle => (
                egui::Color32::from_rgb(150, 150, 150),
                "Click the map to search nearby".to_owned(),
            ),
            QueryStatus::InFlight => (
                egui::Color32::from_rgb(255, 200, 50),
                "Searching...".to_owned(),
            ),
            QueryStatus::Resolved { total_count, at } => (
                egui::Color32::from_rgb(100, 255, 100),
                format!(
                    "{} shown / {} total · {}",
                    self.controller.markers().len(),
                    total_count,
                    at.format("%H:%M:%S")
                ),
            ),
            QueryStatus::Failed { message } => {
                (egui::Color32::from_rgb(255, 80, 80), message.clone())
            }
        };
        ui.label(egui::RichText::new(text).color(color).size(10.0).monospace());

        let health = self.health.lock().unwrap().clone();
        let (color, text) = match health {
            BackendHealth::Unknown => {
                (egui::Color32::from_rgb(150, 150, 150), "backend: checking...".to_owned())
            }
            BackendHealth::Healthy => {
                (egui::Color32::from_rgb(100, 255, 100), "backend: healthy".to_owned())
            }
            BackendHealth::Unreachable(reason) => (
                egui::Color32::from_rgb(255, 80, 80),
                format!("backend: {reason}"),
            ),
        };
        ui.label(egui::RichText::new(text).color(color).size(9.0).monospace());
    }

    fn draw_map(&mut self, ui: &mut egui::Ui) {
        let initial = position(Coordinate::new(
            self.config.initial_latitude,
            self.config.initial_longitude,
        ));
        let plugin = InteractionOverlays {
            overlay: self.controller.overlay().copied(),
            markers: self.controller.markers().to_vec(),
            clicked: Arc::clone(&self.clicked),
        };
        let map_rect = ui.available_rect_before_wrap();

        if let Some(tiles) = self.tiles.as_mut() {
            ui.add(Map::new(Some(tiles), &mut self.map_memory, initial).with_plugin(plugin));

            ui.painter().text(
                map_rect.max - egui::vec2(5.0, 5.0),
                egui::Align2::RIGHT_BOTTOM,
                map::tiles::ATTRIBUTION,
                egui::FontId::proportional(10.0),
                egui::Color32::from_black_alpha(150),
            );
        }
    }
}

impl eframe::App for GeoNearApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.tiles.is_none() {
            self.tiles = Some(map::tiles::street_tiles(ctx));
        }

        // Resolutions from the query runtime; the controller decides whether
        // each one is still relevant.
        for resolution in self.queries.poll() {
            self.controller.resolve(resolution.generation, resolution.outcome);
        }

        egui::SidePanel::left("entity_panel")
            .default_width(280.0)
            .show(ctx, |ui| self.draw_entity_list(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_map(ui));

        // A click recorded by the overlay plugin this frame starts the next
        // query generation.
        if let Some(at) = self.clicked.lock().unwrap().take() {
            let generation = self.controller.click(at);
            self.queries.dispatch(generation, at, ctx);
        }

        if let Some(view) = self.controller.take_view_request() {
            self.map_memory.center_at(position(view.center));
            if self.map_memory.set_zoom(view.zoom).is_err() {
                warn!("click zoom {} out of range", view.zoom);
            }
        }
    }
}
