//! Location sample document schema
//!
//! Append-only log of accepted position reports. Samples are created exactly
//! once per accepted report and never mutated or deleted by the tracking core.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for location samples
pub const LOCATION_COLLECTION: &str = "locations";

/// GeoJSON point, stored `[lng, lat]`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [lng, lat],
        }
    }

    pub fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Location sample stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LocationSampleDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning user
    pub user: ObjectId,

    /// Reported point
    pub loc: GeoPoint,

    /// Accuracy radius in meters, if the platform supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    /// Server-side arrival timestamp
    pub recorded_at: DateTime,
}

impl LocationSampleDoc {
    /// Create a new sample for an accepted report
    pub fn new(user: ObjectId, lng: f64, lat: f64, accuracy: Option<f64>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user,
            loc: GeoPoint::new(lng, lat),
            accuracy,
            recorded_at: DateTime::now(),
        }
    }
}

impl IntoIndexes for LocationSampleDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Geospatial queries over the sample log
            (
                doc! { "loc": "2dsphere" },
                Some(
                    IndexOptions::builder()
                        .name("loc_2dsphere".to_string())
                        .build(),
                ),
            ),
            // Per-user history in arrival order
            (
                doc! { "user": 1, "recorded_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("user_recorded_at".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for LocationSampleDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
