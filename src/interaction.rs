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

//! Click-to-query interaction state machine.
//!
//! [`MapInteractionController`] owns the transient click overlay, the current
//! result marker set, and the generation bookkeeping that keeps superseded
//! query resolutions from ever rendering. Every click replaces the overlay,
//! clears the markers, and mints a new generation; a resolution only takes
//! effect if its generation is still the current one. The network call itself
//! is never aborted — a superseded resolution is simply dropped here.
//!
//! [`QueryService`] is the asynchronous seam: it runs queries on a background
//! tokio runtime and funnels resolutions back to the UI thread over a channel,
//! so controller state is only ever touched on the UI thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use eframe::egui;
use log::{debug, error};
use nearby_client::{Coordinate, Entity, NearbyClient, NearbyResponse, TransportError};

/// Token identifying the query issued by the most recent click.
///
/// Minted monotonically; exactly one generation is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Circle placed at the last clicked point. At most one exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickOverlay {
    /// The clicked coordinate.
    pub at: Coordinate,
    /// Circle radius in meters.
    pub radius_meters: f64,
}

/// A rendered marker for one entity of the current result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMarker {
    /// Entity id the marker is addressable by.
    pub entity_id: String,
    /// Label drawn next to the marker.
    pub label: String,
    /// Marker position.
    pub at: Coordinate,
}

/// One-shot recenter request produced by a click, consumed by the render layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRequest {
    /// New view center.
    pub center: Coordinate,
    /// New zoom level.
    pub zoom: f64,
}

/// Where the current generation's query stands.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus {
    /// No click has happened yet.
    Idle,
    /// A query is in flight for the current generation.
    InFlight,
    /// The current generation's result has been delivered and rendered.
    Resolved {
        /// Total matches known to the backend (may exceed the rendered set).
        total_count: u64,
        /// Delivery time.
        at: DateTime<Utc>,
    },
    /// The current generation's query failed; the marker set stays empty.
    Failed {
        /// Human-readable failure description for the status line.
        message: String,
    },
}

/// Tunables for the controller, taken from app configuration.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// Zoom level the view recenters to on click.
    pub click_zoom: f64,
    /// Radius of the click overlay circle in meters.
    pub overlay_radius_meters: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            click_zoom: 12.0,
            overlay_radius_meters: 5500.0,
        }
    }
}

/// State machine tying map clicks to query dispatch and overlay updates.
///
/// All methods are synchronous and must be called from a single thread; the
/// async boundary lives in [`QueryService`].
#[derive(Debug)]
pub struct MapInteractionController {
    config: ControllerConfig,
    current: Generation,
    overlay: Option<ClickOverlay>,
    markers: Vec<ResultMarker>,
    entities: Vec<Entity>,
    view_request: Option<ViewRequest>,
    status: QueryStatus,
}

impl MapInteractionController {
    /// Create an idle controller.
    #[must_use]
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            current: Generation(0),
            overlay: None,
            markers: Vec::new(),
            entities: Vec::new(),
            view_request: None,
            status: QueryStatus::Idle,
        }
    }

    /// Handle a map click.
    ///
    /// Replaces the click overlay, requests a view recenter, clears the
    /// result markers, and mints the generation for the query the caller is
    /// about to dispatch. Completes synchronously regardless of what the
    /// network later does.
    pub fn click(&mut self, at: Coordinate) -> Generation {
        self.overlay = Some(ClickOverlay {
            at,
            radius_meters: self.config.overlay_radius_meters,
        });
        self.view_request = Some(ViewRequest {
            center: at,
            zoom: self.config.click_zoom,
        });
        // Stale markers must not linger past the click, even while the new
        // query is still in flight.
        self.markers.clear();
        self.entities.clear();
        self.current = self.current.next();
        self.status = QueryStatus::InFlight;
        self.current
    }

    /// Deliver a query resolution.
    ///
    /// A resolution for anything but the current generation is discarded
    /// without touching state — the most recent click always wins, no matter
    /// in which order the queries resolve.
    pub fn resolve(
        &mut self,
        generation: Generation,
        outcome: Result<NearbyResponse, TransportError>,
    ) {
        if generation != self.current {
            debug!(
                "discarding superseded query resolution (generation {} < {})",
                generation.0, self.current.0
            );
            return;
        }

        match outcome {
            Ok(response) => {
                self.markers = response
                    .entities
                    .iter()
                    .map(|entity| ResultMarker {
                        entity_id: entity.id.clone(),
                        label: entity.display_name.clone(),
                        at: entity.location(),
                    })
                    .collect();
                self.status = QueryStatus::Resolved {
                    total_count: response.total_count,
                    at: Utc::now(),
                };
                self.entities = response.entities;
            }
            Err(err) => {
                error!("nearby query failed: {err}");
                self.markers.clear();
                self.entities.clear();
                self.status = QueryStatus::Failed {
                    message: err.to_string(),
                };
            }
        }
    }

    /// The current click overlay, if any.
    #[must_use]
    pub fn overlay(&self) -> Option<&ClickOverlay> {
        self.overlay.as_ref()
    }

    /// Markers of the latest delivered result whose generation is current.
    #[must_use]
    pub fn markers(&self) -> &[ResultMarker] {
        &self.markers
    }

    /// Entities behind the current marker set, for the list panel.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Look up a rendered marker by entity id.
    #[must_use]
    pub fn marker_by_id(&self, entity_id: &str) -> Option<&ResultMarker> {
        self.markers.iter().find(|m| m.entity_id == entity_id)
    }

    /// Query status for the status line.
    #[must_use]
    pub fn status(&self) -> &QueryStatus {
        &self.status
    }

    /// Take the pending view recenter request, if any.
    ///
    /// Returns it at most once per click.
    pub fn take_view_request(&mut self) -> Option<ViewRequest> {
        self.view_request.take()
    }
}

/// Resolution of one dispatched query, sent back from the query task.
#[derive(Debug)]
pub struct QueryResolution {
    /// Generation the query was dispatched under.
    pub generation: Generation,
    /// The query outcome.
    pub outcome: Result<NearbyResponse, TransportError>,
}

/// Backend reachability as reported by the health endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendHealth {
    /// No probe has completed yet.
    Unknown,
    /// The backend answered the health check.
    Healthy,
    /// The health check failed.
    Unreachable(String),
}

/// Runs nearby queries on a background tokio runtime.
///
/// Each dispatched task sends its resolution back over an mpsc channel and
/// requests a repaint; the UI thread drains the channel once per frame and
/// feeds [`MapInteractionController::resolve`].
pub struct QueryService {
    client: Arc<NearbyClient>,
    runtime: tokio::runtime::Runtime,
    tx: mpsc::Sender<QueryResolution>,
    rx: mpsc::Receiver<QueryResolution>,
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("base_url", &self.client.base_url())
            .finish_non_exhaustive()
    }
}

impl QueryService {
    /// Create a service with its own two-worker runtime.
    pub fn new(client: NearbyClient) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::channel();

        Ok(Self {
            client: Arc::new(client),
            runtime,
            tx,
            rx,
        })
    }

    /// Dispatch a nearby query for the given generation.
    ///
    /// The task always runs to completion; whether its resolution still
    /// matters is decided by the controller when the channel is drained.
    pub fn dispatch(&self, generation: Generation, at: Coordinate, ctx: &egui::Context) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        let ctx = ctx.clone();

        self.runtime.spawn(async move {
            let outcome = client.query(at).await;
            if tx.send(QueryResolution { generation, outcome }).is_ok() {
                ctx.request_repaint();
            }
        });
    }

    /// Probe the health endpoint once, writing the result into `slot`.
    pub fn probe_health(&self, slot: Arc<Mutex<BackendHealth>>, ctx: &egui::Context) {
        let client = Arc::clone(&self.client);
        let ctx = ctx.clone();

        self.runtime.spawn(async move {
            let next = match client.health().await {
                Ok(status) if status.is_healthy() => BackendHealth::Healthy,
                Ok(status) => BackendHealth::Unreachable(format!("status: {}", status.status)),
                Err(err) => BackendHealth::Unreachable(err.to_string()),
            };
            *slot.lock().unwrap() = next;
            ctx.request_repaint();
        });
    }

    /// Drain all resolutions that have arrived since the last call.
    pub fn poll(&self) -> impl Iterator<Item = QueryResolution> + '_ {
        self.rx.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, name: &str, latitude: f64, longitude: f64) -> Entity {
        Entity {
            id: id.to_owned(),
            display_name: name.to_owned(),
            latitude,
            longitude,
            cell_id: "8844c0a32dfffff".to_owned(),
        }
    }

    fn response(entities: Vec<Entity>) -> NearbyResponse {
        let total_count = entities.len() as u64;
        NearbyResponse {
            entities,
            total_count,
        }
    }

    fn transport_error() -> TransportError {
        TransportError::Payload(serde_json::from_str::<NearbyResponse>("not json").unwrap_err())
    }

    #[test]
    fn test_click_places_overlay_and_clears_markers() {
        let mut controller = MapInteractionController::new(ControllerConfig::default());
        let at = Coordinate::new(23.685, 90.3563);

        let generation = controller.click(at);
        controller.resolve(generation, Ok(response(vec![entity("1", "Alice", 23.7, 90.4)])));
        assert_eq!(controller.markers().len(), 1);

        // The next click clears the markers before any resolution arrives.
        controller.click(Coordinate::new(24.0, 91.0));
        assert!(controller.markers().is_empty());
        assert_eq!(controller.status(), &QueryStatus::InFlight);

        let overlay = controller.overlay().unwrap();
        assert_eq!(overlay.at, Coordinate::new(24.0, 91.0));
    }

    #[test]
    fn test_rapid_clicks_leave_exactly_one_overlay() {
        let mut controller = MapInteractionController::new(ControllerConfig::default());

        controller.click(Coordinate::new(10.0, 10.0));
        controller.click(Coordinate::new(20.0, 20.0));

        let overlay = controller.overlay().unwrap();
        assert_eq!(overlay.at, Coordinate::new(20.0, 20.0));
        assert_eq!(overlay.radius_meters, 5500.0);
    }

    #[test]
    fn test_current_generation_renders_labeled_markers() {
        let mut controller = MapInteractionController::new(ControllerConfig::default());

        let generation = controller.click(Coordinate::new(23.685, 90.3563));
        controller.resolve(generation, Ok(response(vec![entity("1", "Alice", 23.7, 90.4)])));

        assert_eq!(controller.markers().len(), 1);
        assert_eq!(controller.markers()[0].label, "Alice");
        assert_eq!(controller.marker_by_id("1").unwrap().at, Coordinate::new(23.7, 90.4));
        assert_eq!(controller.entities().len(), 1);
    }

    #[test]
    fn test_superseded_resolution_is_discarded() {
        let mut controller = MapInteractionController::new(ControllerConfig::default());

        let first = controller.click(Coordinate::new(23.685, 90.3563));
        controller.click(Coordinate::new(24.0, 91.0));

        // Same payload that would have rendered a marker for the current
        // generation renders nothing for a superseded one.
        controller.resolve(first, Ok(response(vec![entity("1", "Alice", 23.7, 90.4)])));
        assert!(controller.markers().is_empty());
        assert_eq!(controller.status(), &QueryStatus::InFlight);
    }

    #[test]
    fn test_out_of_order_resolutions_render_only_latest_click() {
        let mut controller = MapInteractionController::new(ControllerConfig::default());

        let g1 = controller.click(Coordinate::new(1.0, 1.0));
        let g2 = controller.click(Coordinate::new(2.0, 2.0));
        let g3 = controller.click(Coordinate::new(3.0, 3.0));

        // Network latency does not correlate with click order.
        controller.resolve(g2, Ok(response(vec![entity("b", "Bob", 2.1, 2.1)])));
        assert!(controller.markers().is_empty());

        controller.resolve(g3, Ok(response(vec![entity("c", "Carol", 3.1, 3.1)])));
        assert_eq!(controller.markers().len(), 1);
        assert_eq!(controller.markers()[0].label, "Carol");

        // A straggler from the first click must not clobber the result.
        controller.resolve(g1, Ok(response(vec![entity("a", "Aziz", 1.1, 1.1)])));
        assert_eq!(controller.markers().len(), 1);
        assert_eq!(controller.markers()[0].label, "Carol");
    }

    #[test]
    fn test_failure_leaves_markers_empty_and_overlay_intact() {
        let mut controller = MapInteractionController::new(ControllerConfig::default());

        let at = Coordinate::new(23.685, 90.3563);
        let generation = controller.click(at);
        controller.resolve(generation, Err(transport_error()));

        assert!(controller.markers().is_empty());
        assert_eq!(controller.overlay().unwrap().at, at);
        assert!(matches!(controller.status(), QueryStatus::Failed { .. }));
    }

    #[test]
    fn test_failure_of_superseded_generation_changes_nothing() {
        let mut controller = MapInteractionController::new(ControllerConfig::default());

        let first = controller.click(Coordinate::new(1.0, 1.0));
        let second = controller.click(Coordinate::new(2.0, 2.0));
        controller.resolve(second, Ok(response(vec![entity("b", "Bob", 2.1, 2.1)])));

        controller.resolve(first, Err(transport_error()));
        assert_eq!(controller.markers().len(), 1);
        assert!(matches!(controller.status(), QueryStatus::Resolved { .. }));
    }

    #[test]
    fn test_supersession_scenario() {
        let mut controller = MapInteractionController::new(ControllerConfig::default());

        let g1 = controller.click(Coordinate::new(23.685, 90.3563));
        assert_eq!(controller.overlay().unwrap().at, Coordinate::new(23.685, 90.3563));
        assert_eq!(
            controller.take_view_request().unwrap().center,
            Coordinate::new(23.685, 90.3563)
        );

        // Second click lands before the first query resolves.
        let g2 = controller.click(Coordinate::new(24.0, 91.0));
        assert_eq!(controller.overlay().unwrap().at, Coordinate::new(24.0, 91.0));

        controller.resolve(g2, Ok(response(vec![
            entity("1", "Alice", 24.01, 91.01),
            entity("2", "Badal", 23.99, 90.99),
        ])));
        assert_eq!(controller.markers().len(), 2);

        // The first click's result arrives late and is never rendered.
        controller.resolve(g1, Ok(response(vec![entity("9", "Stale", 23.7, 90.4)])));
        assert_eq!(controller.markers().len(), 2);
        assert!(controller.marker_by_id("9").is_none());
        assert_eq!(controller.marker_by_id("1").unwrap().at, Coordinate::new(24.01, 91.01));
        assert_eq!(controller.marker_by_id("2").unwrap().at, Coordinate::new(23.99, 90.99));
    }

    #[test]
    fn test_view_request_is_taken_once() {
        let mut controller = MapInteractionController::new(ControllerConfig {
            click_zoom: 11.0,
            overlay_radius_meters: 1000.0,
        });

        controller.click(Coordinate::new(5.0, 6.0));
        let request = controller.take_view_request().unwrap();
        assert_eq!(request.center, Coordinate::new(5.0, 6.0));
        assert_eq!(request.zoom, 11.0);
        assert!(controller.take_view_request().is_none());
    }

    #[test]
    fn test_empty_result_resolves_to_no_markers() {
        let mut controller = MapInteractionController::new(ControllerConfig::default());

        let generation = controller.click(Coordinate::new(0.0, 0.0));
        controller.resolve(generation, Ok(response(Vec::new())));

        assert!(controller.markers().is_empty());
        assert!(matches!(
            controller.status(),
            QueryStatus::Resolved { total_count: 0, .. }
        ));
    }
}
