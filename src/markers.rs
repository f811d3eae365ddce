//! Which events show up on the map, in what color, and the radius overlay
//! drawn around the viewer.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Coordinates, Event};
use crate::taxonomy::{self, NEUTRAL_COLOR};

pub const BOUNDARY_SAMPLES: usize = 64;
pub const KM_PER_DEGREE_LAT: f64 = 110.574;
pub const KM_PER_DEGREE_LNG_AT_EQUATOR: f64 = 111.320;

/// Selected UI filter keys. Empty means "show everything".
pub type CategoryFilter = BTreeSet<String>;

/// The slice of an event the map needs. Tags keep the storage spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEvent {
    pub id: String,
    pub title: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&Event> for MapEvent {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            latitude: event.latitude,
            longitude: event.longitude,
            tags: event
                .categories
                .iter()
                .map(|category| category.storage_label().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub event_id: String,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub color: &'static str,
}

/// Closed ring of `[lng, lat]` pairs approximating a circle of `radius_km`.
pub fn boundary_polygon(center: Coordinates, radius_km: f64) -> Vec<[f64; 2]> {
    let dy = radius_km / KM_PER_DEGREE_LAT;
    let dx = radius_km / (KM_PER_DEGREE_LNG_AT_EQUATOR * center.latitude.to_radians().cos());

    let mut ring: Vec<[f64; 2]> = (0..BOUNDARY_SAMPLES)
        .map(|i| {
            let theta = (i as f64 / BOUNDARY_SAMPLES as f64) * (2.0 * PI);
            [
                center.longitude + dx * theta.cos(),
                center.latitude + dy * theta.sin(),
            ]
        })
        .collect();
    ring.push(ring[0]);
    ring
}

pub fn is_visible(event: &MapEvent, filters: &CategoryFilter) -> bool {
    if event.latitude.is_none() || event.longitude.is_none() {
        return false;
    }
    if filters.is_empty() {
        return true;
    }
    event
        .tags
        .iter()
        .filter_map(|tag| taxonomy::storage_to_ui(tag))
        .any(|key| filters.contains(key))
}

/// Color of the first tag, neutral when the event has none or it is unknown.
pub fn marker_color(event: &MapEvent) -> &'static str {
    event
        .tags
        .first()
        .map(|tag| taxonomy::color_for_storage_tag(tag))
        .unwrap_or(NEUTRAL_COLOR)
}

pub fn visible_markers(events: &[MapEvent], filters: &CategoryFilter) -> Vec<Marker> {
    events
        .iter()
        .filter(|event| is_visible(event, filters))
        .filter_map(|event| {
            Some(Marker {
                event_id: event.id.clone(),
                title: event.title.clone(),
                latitude: event.latitude?,
                longitude: event.longitude?,
                color: marker_color(event),
            })
        })
        .collect()
}

/// Marker set plus overlay for one mounted map view.
///
/// Any input change clears and rebuilds the whole set.
#[derive(Debug, Clone)]
pub struct MarkerLayer {
    center: Coordinates,
    radius_km: f64,
    filters: CategoryFilter,
    events: Vec<MapEvent>,
    markers: Vec<Marker>,
    boundary: Vec<[f64; 2]>,
}

impl MarkerLayer {
    pub fn new(center: Coordinates, radius_km: f64) -> Self {
        let mut layer = Self {
            center,
            radius_km: sanitize_radius(radius_km, 0.0),
            filters: CategoryFilter::new(),
            events: Vec::new(),
            markers: Vec::new(),
            boundary: Vec::new(),
        };
        layer.rebuild();
        layer
    }

    pub fn set_events(&mut self, events: Vec<MapEvent>) {
        self.events = events;
        self.rebuild();
    }

    pub fn set_filters(&mut self, filters: CategoryFilter) {
        self.filters = filters;
        self.rebuild();
    }

    /// Flip one UI key on or off.
    pub fn toggle_filter(&mut self, key: &str) {
        if !self.filters.remove(key) {
            self.filters.insert(key.to_string());
        }
        self.rebuild();
    }

    pub fn set_radius(&mut self, radius_km: f64) {
        self.radius_km = sanitize_radius(radius_km, self.radius_km);
        self.rebuild();
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn boundary(&self) -> &[[f64; 2]] {
        &self.boundary
    }

    pub fn filters(&self) -> &CategoryFilter {
        &self.filters
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn visible_ids(&self) -> Vec<&str> {
        self.markers.iter().map(|m| m.event_id.as_str()).collect()
    }

    fn rebuild(&mut self) {
        self.markers = visible_markers(&self.events, &self.filters);
        self.boundary = boundary_polygon(self.center, self.radius_km);
        debug!(
            events = self.events.len(),
            visible = self.markers.len(),
            radius_km = self.radius_km,
            "marker layer rebuilt"
        );
    }
}

fn sanitize_radius(radius_km: f64, fallback: f64) -> f64 {
    if radius_km.is_finite() && radius_km >= 0.0 {
        radius_km
    } else {
        warn!(radius_km, "ignoring invalid map radius");
        fallback
    }
}
