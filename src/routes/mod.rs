//! HTTP routes for EventOps

pub mod health;
pub mod map;
pub mod stream;

pub use health::{health_check, version_info};
pub use map::{handle_map_users, handle_update_location};
pub use stream::handle_presence_stream;
