//! Navigation state machine
//!
//! Two states: idle and navigating. Selecting a target resets the session and
//! starts navigating; stopping (or selecting a new target) fully resets it.
//! While navigating, the active step only moves forward and the session asks
//! for a silent re-route once the live position drifts far enough from the
//! origin of the last planned route.

use crate::client::map_view::CameraCommand;
use crate::client::routing::PlannedRoute;
use crate::geo::{Point, REROUTE_EPSILON_DEG, STEP_PROXIMITY_DEG};

/// The user being navigated to, pinned at their last-known position.
///
/// The point is refreshed from the directory poller, so its staleness is
/// bounded by the poll interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub user_id: String,
    pub point: Point,
}

/// Transient per-viewer navigation session
#[derive(Debug, Default)]
pub struct NavigationSession {
    target: Option<Target>,
    route: Option<PlannedRoute>,
    active_step: usize,
    navigating: bool,
    panel_visible: bool,
    /// Live position at the time of the last route request
    last_route_origin: Option<Point>,
}

impl NavigationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a target and start navigating. Selecting while already
    /// navigating behaves exactly like stop-then-select.
    pub fn start(&mut self, target: Target) {
        self.stop();
        self.target = Some(target);
        self.navigating = true;
        self.panel_visible = true;
    }

    /// Stop navigating: clear route, steps, metadata, and target
    pub fn stop(&mut self) {
        *self = Self::default();
    }

    /// Install a planner response. The active step restarts at zero and the
    /// request origin is remembered for drift detection. A response landing
    /// after stop is still installed; the cleared navigating flag keeps it
    /// inert.
    pub fn apply_route(&mut self, route: PlannedRoute, origin: Point) {
        self.route = Some(route);
        self.active_step = 0;
        self.last_route_origin = Some(origin);
    }

    /// Advance the active step against the live position.
    ///
    /// Scans maneuver locations from the active index forward only; the
    /// closest one within the proximity threshold becomes active. Returns the
    /// (possibly unchanged) active index.
    pub fn advance_step(&mut self, position: Point) -> Option<usize> {
        if !self.navigating {
            return None;
        }
        let route = self.route.as_ref()?;

        let mut best: Option<(usize, f64)> = None;
        for (i, step) in route.steps.iter().enumerate().skip(self.active_step) {
            let d = step.location.distance_deg(&position);
            if d <= STEP_PROXIMITY_DEG && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        if let Some((i, _)) = best {
            self.active_step = i;
        }
        Some(self.active_step)
    }

    /// Whether the live position has drifted far enough from the last route
    /// origin to warrant a silent re-route. Returns the target point to route
    /// to.
    pub fn needs_reroute(&self, position: Point) -> Option<Point> {
        if !self.navigating {
            return None;
        }
        let target = self.target.as_ref()?;
        let origin = self.last_route_origin?;
        if position.distance_deg(&origin) > REROUTE_EPSILON_DEG {
            Some(target.point)
        } else {
            None
        }
    }

    /// Refresh the target's last-known position from the roster
    pub fn update_target_point(&mut self, point: Point) {
        if let Some(target) = self.target.as_mut() {
            target.point = point;
        }
    }

    /// Camera focus on a maneuver step from the directions panel
    pub fn focus_step(&self, index: usize) -> Option<CameraCommand> {
        let step = self.route.as_ref()?.steps.get(index)?;
        Some(CameraCommand::FlyTo {
            center: step.location,
            zoom: 19.0,
            duration_secs: 0.5,
        })
    }

    /// Camera focus on the target's last-known position
    pub fn focus_target(&self) -> Option<CameraCommand> {
        let target = self.target.as_ref()?;
        Some(CameraCommand::FlyTo {
            center: target.point,
            zoom: 18.0,
            duration_secs: 0.5,
        })
    }

    pub fn is_navigating(&self) -> bool {
        self.navigating
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn route(&self) -> Option<&PlannedRoute> {
        self.route.as_ref()
    }

    pub fn active_step(&self) -> usize {
        self.active_step
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::routing::RouteStep;

    fn step(lng: f64, lat: f64) -> RouteStep {
        RouteStep {
            location: Point::new(lng, lat),
            kind: "turn".to_string(),
            modifier: Some("left".to_string()),
            name: "Test Street".to_string(),
            distance_m: 100.0,
        }
    }

    fn route() -> PlannedRoute {
        PlannedRoute {
            line: vec![
                Point::new(77.600, 12.900),
                Point::new(77.610, 12.910),
                Point::new(77.620, 12.920),
            ],
            steps: vec![
                step(77.600, 12.900),
                step(77.610, 12.910),
                step(77.620, 12.920),
            ],
            distance_m: 3000.0,
            duration_secs: 600.0,
        }
    }

    fn target() -> Target {
        Target {
            user_id: "65a1b2c3d4e5f6a7b8c9d0e1".to_string(),
            point: Point::new(77.620, 12.920),
        }
    }

    fn navigating_session() -> NavigationSession {
        let mut nav = NavigationSession::new();
        nav.start(target());
        nav.apply_route(route(), Point::new(77.600, 12.900));
        nav
    }

    #[test]
    fn start_shows_panel_and_marks_navigating() {
        let mut nav = NavigationSession::new();
        nav.start(target());
        assert!(nav.is_navigating());
        assert!(nav.panel_visible());
        assert_eq!(nav.active_step(), 0);
        assert!(nav.route().is_none());
    }

    #[test]
    fn step_index_only_moves_forward() {
        let mut nav = navigating_session();

        // Near the second maneuver
        nav.advance_step(Point::new(77.610, 12.910));
        assert_eq!(nav.active_step(), 1);

        // Back near the first: the scan never looks behind the active index
        nav.advance_step(Point::new(77.600, 12.900));
        assert_eq!(nav.active_step(), 1);

        // Near the last
        nav.advance_step(Point::new(77.620, 12.920));
        assert_eq!(nav.active_step(), 2);
    }

    #[test]
    fn far_position_leaves_step_unchanged() {
        let mut nav = navigating_session();
        nav.advance_step(Point::new(78.0, 13.0));
        assert_eq!(nav.active_step(), 0);
    }

    #[test]
    fn closest_forward_candidate_wins() {
        let mut nav = NavigationSession::new();
        nav.start(target());
        // Two maneuvers close enough that one position is within proximity
        // of both
        let close_route = PlannedRoute {
            line: vec![Point::new(77.600, 12.900), Point::new(77.6103, 12.9103)],
            steps: vec![
                step(77.600, 12.900),
                step(77.6100, 12.9100),
                step(77.6103, 12.9103),
            ],
            distance_m: 2000.0,
            duration_secs: 400.0,
        };
        nav.apply_route(close_route, Point::new(77.600, 12.900));

        nav.advance_step(Point::new(77.61025, 12.91025));
        assert_eq!(nav.active_step(), 2);
    }

    #[test]
    fn stop_resets_everything() {
        let mut nav = navigating_session();
        nav.advance_step(Point::new(77.610, 12.910));
        nav.stop();

        assert!(!nav.is_navigating());
        assert!(!nav.panel_visible());
        assert!(nav.route().is_none());
        assert!(nav.target().is_none());
        assert_eq!(nav.active_step(), 0);
        assert!(nav.needs_reroute(Point::new(78.0, 13.0)).is_none());
    }

    #[test]
    fn new_target_equals_stop_then_select() {
        let mut nav = navigating_session();
        nav.advance_step(Point::new(77.610, 12.910));

        let other = Target {
            user_id: "65a1b2c3d4e5f6a7b8c9d0e2".to_string(),
            point: Point::new(77.630, 12.930),
        };
        nav.start(other.clone());

        assert!(nav.is_navigating());
        assert_eq!(nav.active_step(), 0);
        assert!(nav.route().is_none());
        assert_eq!(nav.target(), Some(&other));
    }

    #[test]
    fn reroute_fires_only_past_the_drift_threshold() {
        let nav = navigating_session();
        let origin = Point::new(77.600, 12.900);

        // Just inside the threshold: no re-route
        let near = Point::new(origin.lng + 3.0e-5, origin.lat);
        assert!(nav.needs_reroute(near).is_none());

        // Past it: silent re-route to the target's last-known point
        let far = Point::new(origin.lng + 5.0e-5, origin.lat);
        assert_eq!(nav.needs_reroute(far), Some(Point::new(77.620, 12.920)));
    }

    #[test]
    fn reroute_targets_refreshed_roster_position() {
        let mut nav = navigating_session();
        nav.update_target_point(Point::new(77.640, 12.940));
        let far = Point::new(77.601, 12.900);
        assert_eq!(nav.needs_reroute(far), Some(Point::new(77.640, 12.940)));
    }

    #[test]
    fn late_route_after_stop_stays_inert() {
        let mut nav = navigating_session();
        nav.stop();
        nav.apply_route(route(), Point::new(77.600, 12.900));

        assert!(nav.route().is_some());
        assert!(!nav.is_navigating());
        assert!(nav.advance_step(Point::new(77.610, 12.910)).is_none());
    }

    #[test]
    fn step_focus_flies_to_the_maneuver() {
        let nav = navigating_session();
        match nav.focus_step(1) {
            Some(CameraCommand::FlyTo { center, .. }) => {
                assert_eq!(center, Point::new(77.610, 12.910));
            }
            other => panic!("expected FlyTo, got {:?}", other),
        }
        assert!(nav.focus_step(99).is_none());
    }
}
