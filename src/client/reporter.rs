//! Position reporter
//!
//! Consumes fixes from a fix source, maintains the live position and traveled
//! trail, and submits accepted fixes to the gateway. Submission is
//! fire-and-forget: a failed POST is logged and dropped, the next fix is the
//! retry.

use reqwest::header::COOKIE;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::map_view::CameraCommand;
use crate::geo::{heading_from_alpha, normalize_heading, Point, TRAIL_EPSILON_DEG};

/// Zoom the camera recenters to when the viewer is below it
pub const RECENTER_MIN_ZOOM: f64 = 18.0;

/// Fix-source watch configuration
#[derive(Debug, Clone, Copy)]
pub struct WatchConfig {
    /// Request the platform's high-accuracy mode
    pub high_accuracy: bool,
    /// Per-fix timeout in seconds
    pub timeout_secs: u64,
    /// Maximum acceptable cached-fix age in seconds (0 = live fixes only)
    pub max_age_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_secs: 15,
            max_age_secs: 0,
        }
    }
}

/// A single fix from the fix source
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct Fix {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    /// Device-orientation alpha angle, the compass fallback when the fix
    /// source supplies no heading
    #[serde(default)]
    pub alpha: Option<f64>,
}

/// Report payload POSTed to the gateway
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportPayload {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// The viewer's own live position
#[derive(Debug, Clone, Default)]
pub struct LivePosition {
    /// Latest fix; None until the first one arrives
    pub point: Option<Point>,
    /// Compass heading in `[0, 360)`, when the source supplies one
    pub heading: Option<f64>,
    /// Traveled trail, appended only on real movement
    pub trail: Vec<Point>,
}

impl LivePosition {
    /// Apply a fix: update the point and heading, extend the trail only when
    /// the fix moved beyond the trail epsilon. Returns the report payload for
    /// submission.
    pub fn apply_fix(&mut self, fix: &Fix) -> ReportPayload {
        let point = Point::new(fix.lng, fix.lat);
        self.point = Some(point);

        if let Some(h) = fix.heading {
            self.heading = Some(normalize_heading(h));
        } else if let Some(alpha) = fix.alpha {
            self.heading = Some(heading_from_alpha(alpha));
        }

        let moved = self
            .trail
            .last()
            .map(|last| last.distance_deg(&point) > TRAIL_EPSILON_DEG)
            .unwrap_or(true);
        if moved {
            self.trail.push(point);
        }

        ReportPayload {
            lat: fix.lat,
            lng: fix.lng,
            accuracy: fix.accuracy,
        }
    }

    /// No fix yet; the renderer shows the locating placeholder
    pub fn is_locating(&self) -> bool {
        self.point.is_none()
    }
}

/// Camera recenter after a fix.
///
/// The camera follows the viewer while navigating or while no target is
/// selected; it never zooms out below the recenter floor.
pub fn recenter_command(
    position: &LivePosition,
    navigating: bool,
    has_target: bool,
    current_zoom: f64,
) -> Option<CameraCommand> {
    if has_target && !navigating {
        return None;
    }
    let center = position.point?;
    Some(CameraCommand::FlyTo {
        center,
        zoom: current_zoom.max(RECENTER_MIN_ZOOM),
        duration_secs: 0.5,
    })
}

/// Submits position reports to the gateway
pub struct PositionReporter {
    http: reqwest::Client,
    base_url: String,
    session_token: String,
}

impl PositionReporter {
    pub fn new(http: reqwest::Client, base_url: &str, session_token: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: session_token.to_string(),
        }
    }

    /// Fire-and-forget report submission
    pub async fn submit(&self, payload: &ReportPayload) {
        let url = format!("{}/api/map/update-location", self.base_url);
        let result = self
            .http
            .post(&url)
            .header(COOKIE, format!("token={}", self.session_token))
            .json(payload)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                debug!("Reported position lat={} lng={}", payload.lat, payload.lng);
            }
            Ok(resp) => {
                warn!("Position report rejected: {}", resp.status());
            }
            Err(e) => {
                warn!("Position report failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64, lng: f64) -> Fix {
        Fix {
            lat,
            lng,
            accuracy: None,
            heading: None,
            alpha: None,
        }
    }

    #[test]
    fn trail_ignores_sub_epsilon_jitter() {
        let mut pos = LivePosition::default();
        pos.apply_fix(&fix(12.90, 77.60));
        pos.apply_fix(&fix(12.90, 77.60));
        pos.apply_fix(&fix(12.900_000_1, 77.600_000_1));
        assert_eq!(pos.trail.len(), 1);

        pos.apply_fix(&fix(12.901, 77.60));
        assert_eq!(pos.trail.len(), 2);
    }

    #[test]
    fn heading_is_normalized_on_apply() {
        let mut pos = LivePosition::default();
        pos.apply_fix(&Fix {
            heading: Some(-30.0),
            ..fix(12.90, 77.60)
        });
        assert_eq!(pos.heading, Some(330.0));

        // A fix without a heading keeps the previous one
        pos.apply_fix(&fix(12.91, 77.60));
        assert_eq!(pos.heading, Some(330.0));
    }

    #[test]
    fn alpha_fallback_when_heading_missing() {
        let mut pos = LivePosition::default();
        pos.apply_fix(&Fix {
            alpha: Some(90.0),
            ..fix(12.90, 77.60)
        });
        assert_eq!(pos.heading, Some(270.0));

        // An explicit heading wins over alpha
        pos.apply_fix(&Fix {
            heading: Some(45.0),
            alpha: Some(90.0),
            ..fix(12.90, 77.60)
        });
        assert_eq!(pos.heading, Some(45.0));
    }

    #[test]
    fn recenter_never_zooms_out() {
        let mut pos = LivePosition::default();
        pos.apply_fix(&fix(12.90, 77.60));

        match recenter_command(&pos, true, true, 16.0) {
            Some(CameraCommand::FlyTo { zoom, .. }) => assert_eq!(zoom, 18.0),
            other => panic!("expected FlyTo, got {:?}", other),
        }
        match recenter_command(&pos, true, true, 19.5) {
            Some(CameraCommand::FlyTo { zoom, .. }) => assert_eq!(zoom, 19.5),
            other => panic!("expected FlyTo, got {:?}", other),
        }
    }

    #[test]
    fn no_recenter_while_following_a_target_without_navigating() {
        let mut pos = LivePosition::default();
        pos.apply_fix(&fix(12.90, 77.60));
        assert!(recenter_command(&pos, false, true, 18.0).is_none());
        assert!(recenter_command(&pos, false, false, 18.0).is_some());
    }

    #[test]
    fn locating_until_first_fix() {
        let mut pos = LivePosition::default();
        assert!(pos.is_locating());
        assert!(recenter_command(&pos, true, false, 18.0).is_none());
        pos.apply_fix(&fix(12.90, 77.60));
        assert!(!pos.is_locating());
    }

    #[test]
    fn payload_omits_missing_accuracy() {
        let json = serde_json::to_string(&ReportPayload {
            lat: 12.9,
            lng: 77.6,
            accuracy: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"lat":12.9,"lng":77.6}"#);

        let json = serde_json::to_string(&ReportPayload {
            lat: 12.9,
            lng: 77.6,
            accuracy: Some(8.0),
        })
        .unwrap();
        assert!(json.contains("\"accuracy\":8.0"));
    }

    #[test]
    fn default_watch_config_matches_platform_settings() {
        let cfg = WatchConfig::default();
        assert!(cfg.high_accuracy);
        assert_eq!(cfg.timeout_secs, 15);
        assert_eq!(cfg.max_age_secs, 0);
    }
}
