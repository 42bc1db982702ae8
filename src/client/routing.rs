//! Route planner
//!
//! Requests driving routes from an OSRM-compatible service and converts the
//! typed response into a `PlannedRoute`. A failed or empty response leaves the
//! prior route in place; the caller logs and moves on. Camera behavior after a
//! successful plan depends on route length: short hops fly to the midpoint,
//! longer routes fit the whole geometry.

use serde::Deserialize;
use tracing::debug;

use crate::client::map_view::CameraCommand;
use crate::geo::{Bounds, Point};
use crate::types::{EventOpsError, Result};

/// Routes shorter than this fly to the midpoint instead of fitting bounds
pub const SHORT_ROUTE_METERS: f64 = 200.0;

// =============================================================================
// OSRM wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OsrmResponse {
    pub code: String,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    pub geometry: OsrmGeometry,
    pub legs: Vec<OsrmLeg>,
    pub distance: f64,
    pub duration: f64,
}

/// GeoJSON LineString geometry, coordinates `[lng, lat]`
#[derive(Debug, Deserialize)]
pub struct OsrmGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmLeg {
    pub steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmStep {
    pub maneuver: OsrmManeuver,
    #[serde(default)]
    pub name: String,
    pub distance: f64,
}

#[derive(Debug, Deserialize)]
pub struct OsrmManeuver {
    /// `[lng, lat]`
    pub location: [f64; 2],
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub modifier: Option<String>,
}

// =============================================================================
// Planned route
// =============================================================================

/// A maneuver along a planned route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    pub location: Point,
    pub kind: String,
    pub modifier: Option<String>,
    pub name: String,
    pub distance_m: f64,
}

/// A planned route; fully replaced by each new planner response
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    /// Route geometry vertices in travel order
    pub line: Vec<Point>,
    /// Maneuver steps across all legs
    pub steps: Vec<RouteStep>,
    pub distance_m: f64,
    pub duration_secs: f64,
}

impl From<OsrmRoute> for PlannedRoute {
    fn from(route: OsrmRoute) -> Self {
        let line = route
            .geometry
            .coordinates
            .iter()
            .map(|c| Point::new(c[0], c[1]))
            .collect();
        let steps = route
            .legs
            .into_iter()
            .flat_map(|leg| leg.steps)
            .map(|step| RouteStep {
                location: Point::new(step.maneuver.location[0], step.maneuver.location[1]),
                kind: step.maneuver.kind,
                modifier: step.maneuver.modifier,
                name: step.name,
                distance_m: step.distance,
            })
            .collect();
        Self {
            line,
            steps,
            distance_m: route.distance,
            duration_secs: route.duration,
        }
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Route planner against an OSRM-compatible service
pub struct RoutePlanner {
    http: reqwest::Client,
    base_url: String,
}

impl RoutePlanner {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the route request URL for a start/end pair
    pub fn route_url(&self, start: Point, end: Point) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson&steps=true&annotations=distance,duration",
            self.base_url, start.lng, start.lat, end.lng, end.lat
        )
    }

    /// Request a driving route. The first returned route wins; an empty route
    /// list is an error so callers retain the prior route.
    pub async fn request_route(&self, start: Point, end: Point) -> Result<PlannedRoute> {
        let url = self.route_url(start, end);
        debug!("Requesting route: {}", url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| EventOpsError::Routing(format!("Route request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(EventOpsError::Routing(format!(
                "Routing service returned {}",
                resp.status()
            )));
        }

        let body: OsrmResponse = resp
            .json()
            .await
            .map_err(|e| EventOpsError::Routing(format!("Malformed route response: {}", e)))?;

        body.routes
            .into_iter()
            .next()
            .map(PlannedRoute::from)
            .ok_or_else(|| EventOpsError::Routing(format!("No route found (code {})", body.code)))
    }
}

/// Camera command after a non-silent route plan.
///
/// Short routes fly to the route midpoint, zoomed in but never past 21;
/// anything longer fits the route's bounding box.
pub fn camera_for_route(route: &PlannedRoute, current_zoom: f64) -> Option<CameraCommand> {
    if route.distance_m < SHORT_ROUTE_METERS {
        let mid = *route.line.get(route.line.len() / 2)?;
        Some(CameraCommand::FlyTo {
            center: mid,
            zoom: current_zoom.clamp(19.0, 21.0),
            duration_secs: 0.7,
        })
    } else {
        let bounds = Bounds::of(&route.line)?;
        Some(CameraCommand::FitBounds {
            bounds,
            padding_px: 100,
            max_zoom: 20.0,
            duration_secs: 1.2,
        })
    }
}

// =============================================================================
// Display helpers
// =============================================================================

/// Human-readable instruction for a maneuver step
pub fn step_instruction(step: &RouteStep) -> String {
    let name: &str = if step.name.is_empty() {
        "the road"
    } else {
        &step.name
    };
    match step.kind.as_str() {
        "depart" => format!("Head out on {}", name),
        "arrive" => "You have arrived at your destination".to_string(),
        kind => match &step.modifier {
            Some(modifier) => format!("{} {} onto {}", capitalize(kind), modifier, name),
            None => format!("{} onto {}", capitalize(kind), name),
        },
    }
}

/// Display a distance in meters or kilometers
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Display a duration in the largest sensible unit
pub fn format_duration(secs: f64) -> String {
    let secs = secs.max(0.0).round() as u64;
    if secs >= 3600 {
        format!("{} h {} min", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{} min", secs / 60)
    } else {
        format!("{} s", secs)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESPONSE: &str = r#"{
        "code": "Ok",
        "routes": [{
            "geometry": { "type": "LineString", "coordinates": [[77.60, 12.90], [77.605, 12.905], [77.61, 12.91]] },
            "legs": [{
                "steps": [
                    { "maneuver": { "location": [77.60, 12.90], "type": "depart" }, "name": "MG Road", "distance": 700.0 },
                    { "maneuver": { "location": [77.605, 12.905], "type": "turn", "modifier": "left" }, "name": "Church Street", "distance": 800.0 },
                    { "maneuver": { "location": [77.61, 12.91], "type": "arrive" }, "name": "", "distance": 0.0 }
                ]
            }],
            "distance": 1500.0,
            "duration": 420.0
        }]
    }"#;

    fn sample_route() -> PlannedRoute {
        let resp: OsrmResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        resp.routes.into_iter().next().unwrap().into()
    }

    #[test]
    fn route_url_matches_service_contract() {
        let planner = RoutePlanner::new(reqwest::Client::new(), "https://router.example.org/");
        let url = planner.route_url(Point::new(77.6, 12.9), Point::new(77.61, 12.91));
        assert_eq!(
            url,
            "https://router.example.org/route/v1/driving/77.6,12.9;77.61,12.91?overview=full&geometries=geojson&steps=true&annotations=distance,duration"
        );
    }

    #[test]
    fn response_converts_to_planned_route() {
        let route = sample_route();
        assert_eq!(route.line.len(), 3);
        assert_eq!(route.steps.len(), 3);
        assert_eq!(route.steps[1].modifier.as_deref(), Some("left"));
        assert_eq!(route.steps[1].location, Point::new(77.605, 12.905));
        assert_eq!(route.distance_m, 1500.0);
        assert_eq!(route.duration_secs, 420.0);
    }

    #[test]
    fn empty_route_list_is_an_error_shape() {
        let resp: OsrmResponse =
            serde_json::from_str(r#"{"code":"NoRoute","routes":[]}"#).unwrap();
        assert!(resp.routes.is_empty());
        assert_eq!(resp.code, "NoRoute");
    }

    #[test]
    fn short_route_flies_to_midpoint() {
        let mut route = sample_route();
        route.distance_m = 150.0;
        match camera_for_route(&route, 17.0) {
            Some(CameraCommand::FlyTo { center, zoom, .. }) => {
                assert_eq!(center, Point::new(77.605, 12.905));
                assert_eq!(zoom, 19.0);
            }
            other => panic!("expected FlyTo, got {:?}", other),
        }
        // Already zoomed past the floor: keep the current zoom, capped at 21
        match camera_for_route(&route, 21.5) {
            Some(CameraCommand::FlyTo { zoom, .. }) => assert_eq!(zoom, 21.0),
            other => panic!("expected FlyTo, got {:?}", other),
        }
    }

    #[test]
    fn long_route_fits_bounds() {
        let mut route = sample_route();
        route.distance_m = 5000.0;
        match camera_for_route(&route, 17.0) {
            Some(CameraCommand::FitBounds {
                bounds,
                padding_px,
                max_zoom,
                ..
            }) => {
                assert_eq!(bounds.min, Point::new(77.60, 12.90));
                assert_eq!(bounds.max, Point::new(77.61, 12.91));
                assert_eq!(padding_px, 100);
                assert_eq!(max_zoom, 20.0);
            }
            other => panic!("expected FitBounds, got {:?}", other),
        }
    }

    #[test]
    fn instructions_read_naturally() {
        let route = sample_route();
        assert_eq!(step_instruction(&route.steps[0]), "Head out on MG Road");
        assert_eq!(
            step_instruction(&route.steps[1]),
            "Turn left onto Church Street"
        );
        assert_eq!(
            step_instruction(&route.steps[2]),
            "You have arrived at your destination"
        );
    }

    #[test]
    fn distance_and_duration_formatting() {
        assert_eq!(format_distance(420.0), "420 m");
        assert_eq!(format_distance(1500.0), "1.5 km");
        assert_eq!(format_duration(42.0), "42 s");
        assert_eq!(format_duration(420.0), "7 min");
        assert_eq!(format_duration(4500.0), "1 h 15 min");
    }
}
