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

//! Click overlay and result marker rendering.
//!
//! A walkers plugin that draws the controller's state on top of the tile
//! layer each frame: the click circle at its real radius in meters, and one
//! labeled marker per entity of the current result set. It also reports map
//! clicks back to the app as coordinates via a shared cell.

use std::sync::{Arc, Mutex};

use nearby_client::Coordinate;
use walkers::{MapMemory, Plugin, Position, Projector};

use crate::interaction::{ClickOverlay, ResultMarker};

const CIRCLE_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(47, 11, 11, 50);
const CIRCLE_STROKE: egui::Color32 = egui::Color32::from_rgb(240, 51, 51);
const MARKER_FILL: egui::Color32 = egui::Color32::from_rgb(42, 110, 187);
const LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(25, 35, 55);
const MARKER_RADIUS_PX: f32 = 6.0;
// Meters per degree of longitude at the equator
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Convert a coordinate to a walkers map position.
#[must_use]
pub fn position(at: Coordinate) -> Position {
    walkers::lat_lon(at.latitude, at.longitude)
}

/// Shared cell the plugin writes a map click into.
///
/// Drained by the app after the map widget has run for the frame.
pub type ClickedAt = Arc<Mutex<Option<Coordinate>>>;

/// Plugin drawing the click circle and the result markers.
pub struct InteractionOverlays {
    /// Click circle to draw, if a click has happened.
    pub overlay: Option<ClickOverlay>,
    /// Markers of the current result set.
    pub markers: Vec<ResultMarker>,
    /// Cell receiving the coordinate of a click on the map background.
    pub clicked: ClickedAt,
}

impl Plugin for InteractionOverlays {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _memory: &MapMemory,
    ) {
        let painter = ui.painter().with_clip_rect(response.rect);

        if let Some(overlay) = self.overlay {
            let center_vec = projector.project(position(overlay.at));
            let center = egui::pos2(center_vec.x, center_vec.y);
            let radius = pixel_radius(projector, overlay.at, overlay.radius_meters);

            painter.circle_filled(center, radius, CIRCLE_FILL);
            painter.circle_stroke(center, radius, egui::Stroke::new(2.0, CIRCLE_STROKE));
        }

        for marker in &self.markers {
            let marker_vec = projector.project(position(marker.at));
            let marker_pos = egui::pos2(marker_vec.x, marker_vec.y);

            painter.circle_filled(marker_pos, MARKER_RADIUS_PX, MARKER_FILL);
            painter.circle_stroke(
                marker_pos,
                MARKER_RADIUS_PX,
                egui::Stroke::new(1.5, egui::Color32::WHITE),
            );
            painter.text(
                marker_pos - egui::vec2(0.0, MARKER_RADIUS_PX + 3.0),
                egui::Align2::CENTER_BOTTOM,
                &marker.label,
                egui::FontId::proportional(12.0),
                LABEL_COLOR,
            );
        }

        // The map widget owns drag-pan; clicked() only fires for plain clicks.
        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let at = projector.unproject(pointer.to_vec2());
                *self.clicked.lock().unwrap() = Some(Coordinate::new(at.y(), at.x()));
            }
        }
    }
}

/// Screen radius of a circle of `radius_meters` centered at `at`.
///
/// Projects a second point `radius_meters` east of the center and measures
/// the pixel distance, which folds in both zoom and Mercator distortion.
fn pixel_radius(projector: &Projector, at: Coordinate, radius_meters: f64) -> f32 {
    let cos_lat = at.latitude.to_radians().cos().max(0.01);
    let east = Coordinate::new(
        at.latitude,
        at.longitude + radius_meters / (METERS_PER_DEGREE * cos_lat),
    );

    let center = projector.project(position(at));
    let edge = projector.project(position(east));
    (edge.x - center.x).abs()
}
