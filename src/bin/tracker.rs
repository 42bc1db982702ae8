//! EventOps Tracker - headless tracker client
//!
//! Drives the client-side tracking core from a fix feed: reads NDJSON fixes
//! from stdin, reports them to the gateway, keeps the roster fresh via the
//! directory poller, and (when a target is given) runs turn-by-turn
//! navigation against the routing service.
//!
//! Usage:
//!   eventops-tracker --server-url http://localhost:8080 --session-token <jwt>
//!
//! Fix feed format, one JSON object per line:
//!   {"lat":12.90,"lng":77.60,"accuracy":8.0,"heading":45.0}

use clap::Parser;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use eventops::client::{
    navigation::Target,
    reporter::recenter_command,
    routing::{camera_for_route, format_distance, format_duration, step_instruction},
    DirectoryPoller, Fix, LivePosition, NavigationSession, PositionReporter, RoutePlanner,
};
use eventops::geo::Point;

#[derive(Parser, Debug)]
#[command(name = "eventops-tracker")]
#[command(about = "Headless tracker client for the EventOps gateway")]
#[command(version)]
struct Args {
    /// EventOps gateway base URL
    #[arg(long, env = "SERVER_URL", default_value = "http://localhost:8080")]
    server_url: String,

    /// Session token (JWT, sent as the token cookie)
    #[arg(long, env = "SESSION_TOKEN")]
    session_token: String,

    /// Routing service base URL (OSRM-compatible)
    #[arg(
        long,
        env = "ROUTING_URL",
        default_value = "https://router.project-osrm.org"
    )]
    routing_url: String,

    /// Roster poll interval in seconds
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "3")]
    poll_interval_secs: u64,

    /// User id to navigate to (starts navigation once they appear in the roster)
    #[arg(long, env = "TARGET_USER_ID")]
    target_user_id: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,eventops=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let _ = dotenvy::dotenv();
    let args = Args::parse();

    info!("EventOps tracker starting");
    info!("Gateway: {}", args.server_url);
    info!("Routing: {}", args.routing_url);

    let http = reqwest::Client::new();
    let reporter = PositionReporter::new(http.clone(), &args.server_url, &args.session_token);
    let planner = RoutePlanner::new(http.clone(), &args.routing_url);
    let mut poller = DirectoryPoller::new(
        http,
        &args.server_url,
        &args.session_token,
        Duration::from_secs(args.poll_interval_secs),
    );

    let mut position = LivePosition::default();
    let mut nav = NavigationSession::new();
    let current_zoom = 18.0;

    let mut ticker = tokio::time::interval(poller.interval());
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match poller.poll_once().await {
                    Ok(count) => {
                        info!("Roster: {} users", count);
                        refresh_target(&args, &poller, &mut nav);
                    }
                    Err(e) => warn!("Directory poll failed, keeping previous roster: {}", e),
                }
            }

            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Fix feed closed, stopping");
                        break;
                    }
                    Err(e) => {
                        error!("Fix feed read error: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let fix: Fix = match serde_json::from_str(&line) {
                    Ok(fix) => fix,
                    Err(e) => {
                        warn!("Skipping malformed fix: {}", e);
                        continue;
                    }
                };

                let payload = position.apply_fix(&fix);
                reporter.submit(&payload).await;

                if let Some(camera) = recenter_command(
                    &position,
                    nav.is_navigating(),
                    nav.has_target(),
                    current_zoom,
                ) {
                    info!("Camera: {:?}", camera);
                }

                if let Some(here) = position.point {
                    drive_navigation(&planner, &mut nav, here, current_zoom).await;
                }
            }
        }
    }
}

/// Start or refresh navigation from the roster
fn refresh_target(args: &Args, poller: &DirectoryPoller, nav: &mut NavigationSession) {
    let Some(target_id) = &args.target_user_id else {
        return;
    };
    let Some(user) = poller.find(target_id) else {
        return;
    };
    let Some(loc) = &user.location else {
        warn!("Target {} has no known position yet", user.name);
        return;
    };
    let point = Point::new(loc.lng(), loc.lat());

    if nav.has_target() {
        nav.update_target_point(point);
    } else {
        info!("Navigating to {} ({})", user.name, user.current_status.as_str());
        nav.start(Target {
            user_id: target_id.clone(),
            point,
        });
    }
}

/// Plan, re-plan, and advance navigation against the live position
async fn drive_navigation(
    planner: &RoutePlanner,
    nav: &mut NavigationSession,
    here: Point,
    current_zoom: f64,
) {
    if !nav.is_navigating() {
        return;
    }

    // Initial plan, then silent re-plans once we drift off the last origin
    let destination = if nav.route().is_none() {
        nav.target().map(|t| t.point)
    } else {
        nav.needs_reroute(here)
    };

    if let Some(dest) = destination {
        let initial = nav.route().is_none();
        match planner.request_route(here, dest).await {
            Ok(route) => {
                if initial {
                    if let Some(camera) = camera_for_route(&route, current_zoom) {
                        info!("Camera: {:?}", camera);
                    }
                    info!(
                        "Route: {} / {}",
                        format_distance(route.distance_m),
                        format_duration(route.duration_secs)
                    );
                }
                nav.apply_route(route, here);
            }
            Err(e) => warn!("Route request failed, keeping previous route: {}", e),
        }
    }

    if let Some(index) = nav.advance_step(here) {
        if let Some(step) = nav.route().and_then(|r| r.steps.get(index)) {
            info!("Step {}: {}", index, step_instruction(step));
        }
    }
}
