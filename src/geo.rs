//! Geographic primitives shared by the store and the client core
//!
//! Distances between nearby points are compared in raw degrees with a planar
//! approximation (`hypot` over the lat/lng deltas), matching the thresholds the
//! map client works in. At street scale 1e-5 degrees is roughly one meter.

use serde::{Deserialize, Serialize};

/// Minimum movement before a fix is appended to the traveled trail (~1 m)
pub const TRAIL_EPSILON_DEG: f64 = 1e-5;

/// Minimum movement before an automatic re-route is issued (~5 m)
pub const REROUTE_EPSILON_DEG: f64 = 4e-5;

/// Proximity to a maneuver location that activates its step (~50 m)
pub const STEP_PROXIMITY_DEG: f64 = 5e-4;

/// A geographic point, longitude/latitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lng: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Planar degree distance to another point
    pub fn distance_deg(&self, other: &Point) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }
}

/// Check that a coordinate pair is a real position on the globe.
///
/// Reports failing this check are rejected with a client error and never
/// stored; NaN fails every comparison and is rejected too.
pub fn validate_coordinates(lat: f64, lng: f64) -> bool {
    lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// Normalize a compass heading into `[0, 360)` degrees
pub fn normalize_heading(heading: f64) -> f64 {
    heading.rem_euclid(360.0)
}

/// Derive a compass heading from a device-orientation alpha angle.
///
/// Alpha is the device's rotation around its z-axis; zero when the device
/// faces north, increasing counter-clockwise, so the compass heading is the
/// inversion.
pub fn heading_from_alpha(alpha: f64) -> f64 {
    (360.0 - alpha).rem_euclid(360.0)
}

/// Axis-aligned bounding box over a set of points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Compute the bounding box of a non-empty point sequence
    pub fn of(points: &[Point]) -> Option<Bounds> {
        let first = points.first()?;
        let mut bounds = Bounds { min: *first, max: *first };
        for p in &points[1..] {
            bounds.min.lng = bounds.min.lng.min(p.lng);
            bounds.min.lat = bounds.min.lat.min(p.lat);
            bounds.max.lng = bounds.max.lng.max(p.lng);
            bounds.max.lat = bounds.max.lat.max(p.lat);
        }
        Some(bounds)
    }
}
