//! Map renderer logic
//!
//! Pure computation backing the map UI: camera commands, marker and polyline
//! styling, tile catalog selection, roster filtering. Nothing here touches a
//! display; hosts apply the returned values to whatever map widget they embed.

use crate::client::reporter::LivePosition;
use crate::client::routing::PlannedRoute;
use crate::db::schemas::{PublicUser, UserStatus};
use crate::geo::{normalize_heading, Bounds, Point};

/// Camera movement requested by the tracking core
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraCommand {
    FlyTo {
        center: Point,
        zoom: f64,
        duration_secs: f64,
    },
    FitBounds {
        bounds: Bounds,
        padding_px: u32,
        max_zoom: f64,
        duration_secs: f64,
    },
}

/// What the map shows for the viewer's own position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// No fix yet; show the locating placeholder
    Locating,
    Live,
}

pub fn view_state(position: &LivePosition) -> ViewState {
    if position.is_locating() {
        ViewState::Locating
    } else {
        ViewState::Live
    }
}

// =============================================================================
// Marker and polyline styling
// =============================================================================

/// Status color for a user marker
pub fn status_color(status: UserStatus) -> &'static str {
    match status {
        UserStatus::Available => "#4CAF50",
        UserStatus::Busy => "#F44336",
        UserStatus::OnTask => "#2196F3",
        UserStatus::Break => "#FF9800",
    }
}

/// Marker size in pixels, scaled with zoom and clamped to [48, 96]
pub fn marker_size(zoom: f64) -> f64 {
    ((zoom - 12.0) * 6.0 + 48.0).clamp(48.0, 96.0)
}

/// Route polyline weight, scaled with zoom and clamped to [3, 10]
pub fn polyline_weight(zoom: f64) -> f64 {
    ((zoom - 10.0) / 2.0 + 4.0).clamp(3.0, 10.0)
}

/// Dash pattern for the traveled trail
pub const TRAIL_DASH: &str = "4 8";
pub const TRAIL_WEIGHT: f64 = 3.0;
pub const TRAIL_COLOR: &str = "#9C27B0";

/// Rotation pair for the viewer's own marker: the arrow turns to the compass
/// heading while the marker content counter-rotates against the map so labels
/// stay upright.
pub fn navigator_rotation(heading: f64, map_rotation: f64) -> (f64, f64) {
    (normalize_heading(heading), -map_rotation)
}

/// A turn marker along the active route
#[derive(Debug, Clone, PartialEq)]
pub struct TurnMarker {
    pub location: Point,
    pub index: usize,
    /// The active step is visually distinguished
    pub active: bool,
}

/// Turn markers for every maneuver on the route
pub fn turn_markers(route: &PlannedRoute, active_step: usize) -> Vec<TurnMarker> {
    route
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| TurnMarker {
            location: step.location,
            index,
            active: index == active_step,
        })
        .collect()
}

// =============================================================================
// Tile catalog
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStyle {
    Hybrid,
    Street,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreetVariant {
    Light,
    Dark,
}

/// Street tiles go dark outside daytime hours
pub fn street_variant(local_hour: u32) -> StreetVariant {
    if (6..=18).contains(&local_hour) {
        StreetVariant::Light
    } else {
        StreetVariant::Dark
    }
}

/// Tile URL template for a style at a local hour
pub fn tile_url(style: TileStyle, local_hour: u32) -> &'static str {
    match style {
        TileStyle::Hybrid => {
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
        }
        TileStyle::Street => match street_variant(local_hour) {
            StreetVariant::Light => {
                "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png"
            }
            StreetVariant::Dark => {
                "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png"
            }
        },
    }
}

// =============================================================================
// Roster filtering
// =============================================================================

/// Case-insensitive roster filter over name and role substrings
pub fn filter_roster<'a>(users: &'a [PublicUser], query: &str) -> Vec<&'a PublicUser> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return users.iter().collect();
    }
    users
        .iter()
        .filter(|u| {
            u.name.to_lowercase().contains(&query) || u.role.as_str().contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::routing::RouteStep;
    use crate::db::schemas::UserRole;

    fn user(name: &str, role: UserRole) -> PublicUser {
        PublicUser {
            id: "65a1b2c3d4e5f6a7b8c9d0e1".to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role,
            current_status: UserStatus::Available,
            avatar_url: None,
            is_active: true,
            last_seen_at: None,
            location: None,
        }
    }

    #[test]
    fn marker_size_interpolates_and_clamps() {
        assert_eq!(marker_size(12.0), 48.0);
        assert_eq!(marker_size(14.0), 60.0);
        assert_eq!(marker_size(20.0), 96.0);
        assert_eq!(marker_size(22.0), 96.0);
        assert_eq!(marker_size(10.0), 48.0);
    }

    #[test]
    fn polyline_weight_clamps() {
        assert_eq!(polyline_weight(10.0), 4.0);
        assert_eq!(polyline_weight(22.0), 10.0);
        assert_eq!(polyline_weight(4.0), 3.0);
    }

    #[test]
    fn each_status_gets_a_distinct_color() {
        let colors = [
            status_color(UserStatus::Available),
            status_color(UserStatus::Busy),
            status_color(UserStatus::OnTask),
            status_color(UserStatus::Break),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn street_tiles_go_dark_at_night() {
        assert_eq!(street_variant(6), StreetVariant::Light);
        assert_eq!(street_variant(12), StreetVariant::Light);
        assert_eq!(street_variant(18), StreetVariant::Light);
        assert_eq!(street_variant(5), StreetVariant::Dark);
        assert_eq!(street_variant(19), StreetVariant::Dark);
        assert_eq!(street_variant(0), StreetVariant::Dark);

        assert!(tile_url(TileStyle::Street, 12).contains("light_all"));
        assert!(tile_url(TileStyle::Street, 22).contains("dark_all"));
        assert!(tile_url(TileStyle::Hybrid, 22).contains("World_Imagery"));
    }

    #[test]
    fn navigator_arrow_follows_heading_content_counter_rotates() {
        let (arrow, content) = navigator_rotation(370.0, 45.0);
        assert_eq!(arrow, 10.0);
        assert_eq!(content, -45.0);
    }

    #[test]
    fn roster_filter_is_case_insensitive_over_name_and_role() {
        let users = vec![
            user("Ava", UserRole::Volunteer),
            user("Ben", UserRole::Manager),
            user("Avery", UserRole::Organizer),
        ];

        let hits = filter_roster(&users, "AV");
        assert_eq!(hits.len(), 2);

        let hits = filter_roster(&users, "manager");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ben");

        assert_eq!(filter_roster(&users, "  ").len(), 3);
        assert!(filter_roster(&users, "zzz").is_empty());
    }

    #[test]
    fn active_turn_marker_is_distinguished() {
        let route = PlannedRoute {
            line: vec![Point::new(77.60, 12.90), Point::new(77.61, 12.91)],
            steps: vec![
                RouteStep {
                    location: Point::new(77.60, 12.90),
                    kind: "depart".to_string(),
                    modifier: None,
                    name: "MG Road".to_string(),
                    distance_m: 500.0,
                },
                RouteStep {
                    location: Point::new(77.61, 12.91),
                    kind: "arrive".to_string(),
                    modifier: None,
                    name: String::new(),
                    distance_m: 0.0,
                },
            ],
            distance_m: 500.0,
            duration_secs: 120.0,
        };

        let markers = turn_markers(&route, 1);
        assert_eq!(markers.len(), 2);
        assert!(!markers[0].active);
        assert!(markers[1].active);
    }

    #[test]
    fn view_state_tracks_first_fix() {
        let mut pos = LivePosition::default();
        assert_eq!(view_state(&pos), ViewState::Locating);
        pos.point = Some(Point::new(77.60, 12.90));
        assert_eq!(view_state(&pos), ViewState::Live);
    }
}
