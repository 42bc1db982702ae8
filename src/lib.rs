//! EventOps live-location core
//!
//! The tracking and navigation subsystem of the EventOps coordination app:
//!
//! - **Location store**: authenticated position ingestion into MongoDB with an
//!   append-only sample log and a last-write-wins user record.
//! - **Presence fan-out**: server-sent-events push of updated user records to
//!   every subscribed viewer, via an explicit subscriber registry.
//! - **Directory**: full-roster reads for the client's periodic poller.
//! - **Client core**: position reporting with trail accumulation, roster
//!   polling, OSRM route planning, and turn-by-turn navigation tracking.
//! - **Map view logic**: marker styling, rotation, tile selection, and roster
//!   filtering as pure computation (rendering itself lives in the web client).

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod geo;
pub mod presence;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{EventOpsError, Result};
