//! Shared document metadata
//!
//! Users can be retired by the wider EventOps app, so their documents carry a
//! soft-delete flag that every roster read honors. The location sample log is
//! append-only; its samples keep the flag at its false default and are never
//! flipped. Only the flag itself is stored: the tracking core never deletes,
//! so it has no use for a deletion timestamp.

use bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// Soft-delete flag; reads filter on it, the tracking core never sets it
    #[serde(default)]
    pub is_deleted: bool,

    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Metadata for a document being created now
    pub fn new() -> Self {
        let now = DateTime::now();
        Self {
            is_deleted: false,
            updated_at: Some(now),
            created_at: Some(now),
        }
    }

    /// Stamp both timestamps at insert time, keeping the live flag
    pub fn stamp_created(&mut self) {
        let now = DateTime::now();
        self.is_deleted = false;
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_metadata_is_live_and_stamped() {
        let m = Metadata::new();
        assert!(!m.is_deleted);
        assert!(m.created_at.is_some());
        assert_eq!(m.created_at, m.updated_at);
    }

    #[test]
    fn stamp_created_resets_a_default_document() {
        let mut m = Metadata::default();
        assert!(m.created_at.is_none());
        m.stamp_created();
        assert!(!m.is_deleted);
        assert!(m.created_at.is_some());
        assert!(m.updated_at.is_some());
    }

    #[test]
    fn wire_shape_omits_absent_timestamps() {
        let json = serde_json::to_string(&Metadata::default()).unwrap();
        assert_eq!(json, r#"{"is_deleted":false}"#);
    }
}
