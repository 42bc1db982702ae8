//! Configuration for EventOps
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// EventOps gateway - live volunteer tracking and presence fan-out
#[derive(Parser, Debug, Clone)]
#[command(name = "eventopsd")]
#[command(about = "Location tracking gateway for the EventOps coordination app")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "eventops")]
    pub mongodb_db: String,

    /// JWT secret for session token verification (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Base URL of the external routing service (OSRM-compatible)
    #[arg(
        long,
        env = "ROUTING_URL",
        default_value = "https://router.project-osrm.org"
    )]
    pub routing_url: String,

    /// Roster poll interval in seconds (client-side directory refresh)
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "3")]
    pub poll_interval_secs: u64,

    /// Enable development mode (Mongo optional, insecure default JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Effective JWT secret. Dev mode falls back to an insecure default;
    /// production without a configured secret is an error, never a panic.
    pub fn jwt_secret(&self) -> Result<String, String> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => Ok(secret.clone()),
            (None, true) => Ok("dev-only-insecure-secret".to_string()),
            (None, false) => Err("JWT_SECRET is required in production mode".to_string()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.jwt_secret()?;

        if self.poll_interval_secs == 0 {
            return Err("POLL_INTERVAL_SECS must be at least 1".to_string());
        }

        Ok(())
    }
}
