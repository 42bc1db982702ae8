//! Database schemas for EventOps
//!
//! Defines MongoDB document structures for users and location samples.

mod location;
mod metadata;
mod user;

pub use location::{GeoPoint, LocationSampleDoc, LOCATION_COLLECTION};
pub use metadata::Metadata;
pub use user::{PublicUser, UserDoc, UserRole, UserStatus, USER_COLLECTION};
