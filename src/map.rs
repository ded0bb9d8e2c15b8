//! Map view state: viewport, trial markers, and the radius overlay.
//!
//! `MapState` is a plain value owned by the results view. It models what a
//! slippy-map widget would display (center, zoom, markers with popups, a
//! search radius circle) so the synchronization rules can be exercised
//! without a real map library behind it.

use serde::Serialize;

use crate::coords::{locations_of, LatLng};
use crate::models::TrialRecord;

/// Continental US view used before any result is shown.
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 39.8283,
    lng: -98.5795,
};
pub const DEFAULT_ZOOM: u8 = 4;
/// Upper bound when fitting to markers, so a single site doesn't zoom to street level.
pub const MAX_FIT_ZOOM: u8 = 12;
/// Zoom used when centering on a single trial site.
pub const FOCUS_ZOOM: u8 = 10;
const MIN_ZOOM: u8 = 1;
const TILE_SIZE: f64 = 256.0;
const FIT_PADDING_PX: f64 = 40.0;
const METERS_PER_MILE: f64 = 1609.344;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub title: String,
    pub link: String,
}

/// One map pin. A trial with several sites owns several markers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub trial_id: String,
    pub position: LatLng,
    pub popup: Popup,
    pub active: bool,
    pub popup_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusCircle {
    pub center: LatLng,
    pub radius_meters: f64,
}

/// Axis-aligned lat/lng bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        for p in iter {
            bounds.south = bounds.south.min(p.lat);
            bounds.north = bounds.north.max(p.lat);
            bounds.west = bounds.west.min(p.lng);
            bounds.east = bounds.east.max(p.lng);
        }
        Some(bounds)
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

/// Monotonic step function from search radius to zoom level.
pub fn zoom_for_radius(miles: f64) -> u8 {
    match miles {
        m if m <= 1.0 => 14,
        m if m <= 5.0 => 12,
        m if m <= 10.0 => 11,
        m if m <= 25.0 => 10,
        m if m <= 50.0 => 9,
        m if m <= 100.0 => 8,
        m if m <= 250.0 => 7,
        m if m <= 500.0 => 6,
        m if m <= 750.0 => 5,
        _ => 4,
    }
}

fn mercator_y(lat: f64) -> f64 {
    let rad = lat.clamp(-85.0511, 85.0511).to_radians();
    (std::f64::consts::FRAC_PI_4 + rad / 2.0).tan().ln()
}

#[derive(Debug, Clone, Serialize)]
pub struct MapState {
    initialized: bool,
    viewport: Viewport,
    width_px: u32,
    height_px: u32,
    markers: Vec<Marker>,
    circle: Option<RadiusCircle>,
    search_center: Option<LatLng>,
}

impl Default for MapState {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl MapState {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            initialized: false,
            viewport: Viewport::default(),
            width_px,
            height_px,
            markers: Vec::new(),
            circle: None,
            search_center: None,
        }
    }

    /// Create the map on first use. Returns true only on the call that initialized it.
    pub fn ensure_initialized(&mut self) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        self.viewport = Viewport::default();
        tracing::debug!(
            "Map initialized at ({}, {}) zoom {}",
            DEFAULT_CENTER.lat,
            DEFAULT_CENTER.lng,
            DEFAULT_ZOOM
        );
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn circle(&self) -> Option<RadiusCircle> {
        self.circle
    }

    pub fn search_center(&self) -> Option<LatLng> {
        self.search_center
    }

    pub fn markers_for<'a>(&'a self, trial_id: &'a str) -> impl Iterator<Item = &'a Marker> + 'a {
        self.markers.iter().filter(move |m| m.trial_id == trial_id)
    }

    /// Remove every marker and overlay; the viewport is left where it is.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.circle = None;
        self.search_center = None;
    }

    /// Add one marker per site of `trial`. Returns the number of markers added.
    pub fn add_trial_markers(&mut self, trial: &TrialRecord, link: &str) -> usize {
        let title = trial.title.clone().unwrap_or_else(|| trial.id.clone());
        let sites = locations_of(trial.locations.as_deref());
        let added = sites.len();
        for position in sites {
            self.markers.push(Marker {
                trial_id: trial.id.clone(),
                position,
                popup: Popup {
                    title: title.clone(),
                    link: link.to_string(),
                },
                active: false,
                popup_open: false,
            });
        }
        added
    }

    /// Set the active flag on every marker of a trial. Returns the number of markers touched.
    pub fn set_active(&mut self, trial_id: &str, active: bool) -> usize {
        let mut touched = 0;
        for marker in self.markers.iter_mut().filter(|m| m.trial_id == trial_id) {
            marker.active = active;
            touched += 1;
        }
        touched
    }

    /// Open the popup of the trial's first marker; only one popup is open at a time.
    pub fn open_popup(&mut self, trial_id: &str) -> bool {
        let mut opened = false;
        for marker in &mut self.markers {
            marker.popup_open = !opened && marker.trial_id == trial_id;
            opened |= marker.popup_open;
        }
        opened
    }

    pub fn close_popups(&mut self) {
        for marker in &mut self.markers {
            marker.popup_open = false;
        }
    }

    pub fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.viewport = Viewport { center, zoom };
    }

    /// Center on a geocoded search location and draw the radius overlay.
    pub fn show_search_radius(&mut self, center: LatLng, radius_miles: f64) {
        self.set_view(center, zoom_for_radius(radius_miles));
        self.circle = Some(RadiusCircle {
            center,
            radius_meters: radius_miles * METERS_PER_MILE,
        });
        self.search_center = Some(center);
    }

    /// Fit the viewport to all markers, or reset to the default view when
    /// there is nothing to fit. Returns whether a fit happened.
    pub fn fit_to_markers(&mut self) -> bool {
        let bounds = Bounds::from_points(self.markers.iter().map(|m| &m.position));
        match bounds {
            Some(bounds) => {
                self.fit_bounds(bounds);
                true
            }
            None => {
                self.viewport = Viewport::default();
                false
            }
        }
    }

    pub fn fit_bounds(&mut self, bounds: Bounds) {
        let zoom = self.bounds_zoom(&bounds);
        self.set_view(bounds.center(), zoom);
    }

    /// Pan/zoom onto one trial: center on a single site, fit several.
    pub fn focus_trial(&mut self, trial_id: &str) -> bool {
        let sites: Vec<LatLng> = self.markers_for(trial_id).map(|m| m.position).collect();
        match sites.as_slice() {
            [] => false,
            [only] => {
                self.set_view(*only, FOCUS_ZOOM);
                true
            }
            many => {
                if let Some(bounds) = Bounds::from_points(many) {
                    self.fit_bounds(bounds);
                }
                true
            }
        }
    }

    /// Largest zoom at which `bounds` fits inside the padded map size.
    fn bounds_zoom(&self, bounds: &Bounds) -> u8 {
        let usable_w = (self.width_px as f64 - 2.0 * FIT_PADDING_PX).max(1.0);
        let usable_h = (self.height_px as f64 - 2.0 * FIT_PADDING_PX).max(1.0);

        let x_fraction = (bounds.east - bounds.west) / 360.0;
        let y_fraction =
            (mercator_y(bounds.north) - mercator_y(bounds.south)) / (2.0 * std::f64::consts::PI);

        let axis_zoom = |usable: f64, fraction: f64| {
            if fraction <= 0.0 {
                f64::INFINITY
            } else {
                (usable / (TILE_SIZE * fraction)).log2()
            }
        };

        let zoom = axis_zoom(usable_w, x_fraction).min(axis_zoom(usable_h, y_fraction));
        if zoom.is_infinite() {
            return MAX_FIT_ZOOM;
        }
        (zoom.floor().max(MIN_ZOOM as f64) as u8).min(MAX_FIT_ZOOM)
    }
}
