//! User document schema
//!
//! The user directory record read by the tracking core and mutated by the
//! location store on each accepted position report. The `PublicUser` view is
//! the wire shape shared by the roster query, the presence push, and the
//! client poller; it never carries secrets.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{GeoPoint, Metadata};

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User role within an event
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Organizer,
    Manager,
    #[default]
    Volunteer,
    Public,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Organizer => "organizer",
            UserRole::Manager => "manager",
            UserRole::Volunteer => "volunteer",
            UserRole::Public => "public",
        }
    }
}

/// Current activity status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Available,
    Busy,
    OnTask,
    Break,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Available => "available",
            UserStatus::Busy => "busy",
            UserStatus::OnTask => "on_task",
            UserStatus::Break => "break",
        }
    }
}

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Display name
    pub name: String,

    /// User identifier (email)
    pub email: String,

    /// Password hash; owned by the auth service, never exposed on the wire
    #[serde(default)]
    pub password_hash: String,

    /// Role within the event
    #[serde(default)]
    pub role: UserRole,

    /// Current activity status
    #[serde(default)]
    pub current_status: UserStatus,

    /// Avatar image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Whether the user is currently reporting positions
    #[serde(default)]
    pub is_active: bool,

    /// Last accepted position report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime>,

    /// Latest accepted position, `[lng, lat]`; None until the first report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on email
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            // Geospatial index on latest position
            (
                doc! { "location": "2dsphere" },
                Some(
                    IndexOptions::builder()
                        .name("location_2dsphere".to_string())
                        .sparse(true)
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// Wire view of a user record, secrets excluded.
///
/// Serialized camelCase for the web client; the same shape is deserialized by
/// the directory poller, so malformed roster payloads fail at this boundary.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub current_status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl From<UserDoc> for PublicUser {
    fn from(doc: UserDoc) -> Self {
        Self {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: doc.name,
            email: doc.email,
            role: doc.role,
            current_status: doc.current_status,
            avatar_url: doc.avatar_url,
            is_active: doc.is_active,
            last_seen_at: doc.last_seen_at.map(|dt| dt.to_chrono()),
            location: doc.location,
        }
    }
}
