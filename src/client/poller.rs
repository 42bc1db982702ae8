//! Directory poller
//!
//! Periodically pulls the full roster from the gateway and replaces the
//! in-memory copy wholesale. A failed poll keeps the previous roster; the next
//! tick retries. This is the catch-up path for presence events missed while
//! disconnected.

use reqwest::header::COOKIE;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::db::schemas::PublicUser;
use crate::types::{EventOpsError, Result};

/// Roster payload returned by the gateway
#[derive(Debug, Deserialize)]
pub struct RosterPayload {
    pub users: Vec<PublicUser>,
}

/// Periodic roster poller
pub struct DirectoryPoller {
    http: reqwest::Client,
    base_url: String,
    session_token: String,
    interval: Duration,
    roster: Vec<PublicUser>,
}

impl DirectoryPoller {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        session_token: &str,
        interval: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: session_token.to_string(),
            interval,
            roster: Vec::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current roster copy
    pub fn roster(&self) -> &[PublicUser] {
        &self.roster
    }

    /// Look up a roster entry by user id
    pub fn find(&self, user_id: &str) -> Option<&PublicUser> {
        self.roster.iter().find(|u| u.id == user_id)
    }

    /// Fetch the roster once and replace the in-memory copy.
    ///
    /// On any failure the previous roster is retained and the error returned
    /// for logging by the caller's loop.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let url = format!("{}/api/map/users", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header(COOKIE, format!("token={}", self.session_token))
            .send()
            .await
            .map_err(|e| EventOpsError::Http(format!("Roster fetch failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(EventOpsError::Http(format!(
                "Roster fetch returned {}",
                resp.status()
            )));
        }

        let payload: RosterPayload = resp
            .json()
            .await
            .map_err(|e| EventOpsError::Http(format!("Malformed roster payload: {}", e)))?;

        self.replace_roster(payload);
        debug!("Roster refreshed: {} users", self.roster.len());
        Ok(self.roster.len())
    }

    /// Wholesale replacement; no merging with the previous copy
    pub fn replace_roster(&mut self, payload: RosterPayload) {
        self.roster = payload.users;
    }

    /// Poll on a fixed interval until the task is dropped
    pub async fn run(mut self, mut on_roster: impl FnMut(&[PublicUser])) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            match self.poll_once().await {
                Ok(count) => {
                    debug!("Directory poll ok ({} users)", count);
                    on_roster(&self.roster);
                }
                Err(e) => warn!("Directory poll failed, keeping previous roster: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poller() -> DirectoryPoller {
        DirectoryPoller::new(
            reqwest::Client::new(),
            "http://localhost:8080/",
            "tok",
            Duration::from_secs(3),
        )
    }

    fn roster_json(names: &[&str]) -> RosterPayload {
        let users = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                serde_json::json!({
                    "_id": format!("65a1b2c3d4e5f6a7b8c9d0e{}", i),
                    "name": name,
                    "email": format!("{}@example.com", name.to_lowercase()),
                    "role": "volunteer",
                    "currentStatus": "available",
                    "isActive": true,
                })
            })
            .collect::<Vec<_>>();
        serde_json::from_value(serde_json::json!({ "users": users })).unwrap()
    }

    #[test]
    fn replacement_is_wholesale() {
        let mut p = poller();
        p.replace_roster(roster_json(&["Ava", "Ben"]));
        assert_eq!(p.roster().len(), 2);

        p.replace_roster(roster_json(&["Cara"]));
        assert_eq!(p.roster().len(), 1);
        assert_eq!(p.roster()[0].name, "Cara");
        assert!(p.find("65a1b2c3d4e5f6a7b8c9d0e0").is_some());
    }

    #[test]
    fn malformed_roster_fails_typed_deserialization() {
        let bad = serde_json::from_str::<RosterPayload>(r#"{"users":[{"name":42}]}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn trailing_slash_in_base_url_is_trimmed() {
        let p = poller();
        assert_eq!(p.base_url, "http://localhost:8080");
        assert_eq!(p.interval(), Duration::from_secs(3));
    }
}
