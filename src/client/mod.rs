//! Client-side tracking core
//!
//! The pieces a tracker client runs: the position reporter fed by a fix
//! source, the periodic directory poller, the route planner against an
//! OSRM-compatible service, the navigation state machine, and the pure
//! map-presentation logic. All shared wire shapes come from `db::schemas`.

pub mod map_view;
pub mod navigation;
pub mod poller;
pub mod reporter;
pub mod routing;

pub use map_view::CameraCommand;
pub use navigation::{NavigationSession, Target};
pub use poller::DirectoryPoller;
pub use reporter::{Fix, LivePosition, PositionReporter, ReportPayload};
pub use routing::{PlannedRoute, RoutePlanner, RouteStep};
