//! Map API routes
//!
//! - POST /api/map/update-location - accept a position report from a tracker
//! - GET  /api/map/users           - full roster with latest known positions
//!
//! Both routes require a valid session token in the `token` cookie. Position
//! reports are applied last-write-wins by arrival order; each accepted report
//! appends a sample to the location log, updates the user's latest position,
//! and is pushed to every presence subscriber.

use bson::{doc, oid::ObjectId};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{extract_token_from_cookie, Claims};
use crate::db::schemas::{
    LocationSampleDoc, PublicUser, UserDoc, LOCATION_COLLECTION, USER_COLLECTION,
};
use crate::geo::validate_coordinates;
use crate::presence::LOCATION_UPDATE_EVENT;
use crate::server::AppState;
use crate::types::EventOpsError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Position report from a tracker client
#[derive(Debug, Deserialize)]
pub struct LocationReport {
    pub lat: f64,
    pub lng: f64,
    /// Accuracy radius in meters, if the platform supplied one
    #[serde(default)]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct UpdateLocationResponse {
    pub ok: bool,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /api/map/update-location
pub async fn handle_update_location(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authenticate(&req, &state) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    let report: LocationReport = match parse_json_body(req).await {
        Ok(r) => r,
        Err(e) => {
            debug!("Rejected malformed location report: {}", e);
            return error_response(StatusCode::BAD_REQUEST, &format!("{}", e), "INVALID_BODY");
        }
    };

    // Non-numeric payloads already failed to deserialize; this rejects
    // out-of-range and non-finite values.
    if !validate_coordinates(report.lat, report.lng) {
        debug!(
            "Rejected out-of-range report from {}: lat={} lng={}",
            claims.id, report.lat, report.lng
        );
        return error_response(
            StatusCode::BAD_REQUEST,
            "lat/lng outside valid range",
            "INVALID_COORDINATES",
        );
    }

    let user_id = match ObjectId::parse_str(&claims.id) {
        Ok(id) => id,
        Err(_) => {
            return error_response(StatusCode::UNAUTHORIZED, "Invalid session", "UNAUTHORIZED")
        }
    };

    let mongo = match &state.mongo {
        Some(m) => m,
        None => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Database not available",
                "DB_UNAVAILABLE",
            )
        }
    };

    // Append-only sample log; one insert per accepted report.
    let sample = LocationSampleDoc::new(user_id, report.lng, report.lat, report.accuracy);
    let samples = match mongo.collection::<LocationSampleDoc>(LOCATION_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return db_error_response(e),
    };
    if let Err(e) = samples.insert_one(sample).await {
        return db_error_response(e);
    }

    // Update the user's latest position. Last write wins by arrival order.
    let users = match mongo.collection::<UserDoc>(USER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return db_error_response(e),
    };
    let now = bson::DateTime::now();
    let updated = users
        .find_one_and_update(
            doc! { "_id": user_id },
            doc! {
                "$set": {
                    "location": { "type": "Point", "coordinates": [report.lng, report.lat] },
                    "last_seen_at": now,
                    "is_active": true,
                    "metadata.updated_at": now,
                }
            },
        )
        .await;

    let user = match updated {
        Ok(Some(user)) => PublicUser::from(user),
        Ok(None) => {
            warn!("Accepted report for unknown user {}", claims.id);
            return error_response(StatusCode::NOT_FOUND, "User not found", "USER_NOT_FOUND");
        }
        Err(e) => return db_error_response(e),
    };

    // Push the fresh record to every open presence stream. Best-effort: a
    // viewer that misses it catches up on the next roster poll.
    state.presence.broadcast(LOCATION_UPDATE_EVENT, &user);

    json_response(StatusCode::OK, &UpdateLocationResponse { ok: true, user })
}

/// GET /api/map/users
pub async fn handle_map_users(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    if let Err(resp) = authenticate(&req, &state) {
        return resp;
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Database not available",
                "DB_UNAVAILABLE",
            )
        }
    };

    let users = match mongo.collection::<UserDoc>(USER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return db_error_response(e),
    };

    match users.find_many(doc! {}).await {
        Ok(docs) => {
            let users: Vec<PublicUser> = docs.into_iter().map(PublicUser::from).collect();
            info!("Roster query returned {} users", users.len());
            json_response(StatusCode::OK, &UsersResponse { users })
        }
        Err(e) => db_error_response(e),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Verify the session token carried in the `token` cookie.
pub(crate) fn authenticate(
    req: &Request<Incoming>,
    state: &AppState,
) -> Result<Claims, Response<BoxBody>> {
    let token = req
        .headers()
        .get(hyper::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_token_from_cookie);

    let token = match token {
        Some(t) => t,
        None => {
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "Missing session token",
                "UNAUTHORIZED",
            ))
        }
    };

    state.jwt.validate(token).map_err(|e| {
        debug!("Session token rejected: {}", e);
        error_response(StatusCode::UNAUTHORIZED, "Invalid session", "UNAUTHORIZED")
    })
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

pub(crate) fn error_response(status: StatusCode, message: &str, code: &str) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: message.to_string(),
            code: Some(code.to_string()),
        },
    )
}

fn db_error_response(e: EventOpsError) -> Response<BoxBody> {
    warn!("Database error: {}", e);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Database operation failed",
        "DB_ERROR",
    )
}

pub(crate) fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<Incoming>,
) -> Result<T, EventOpsError> {
    let body = req
        .collect()
        .await
        .map_err(|e| EventOpsError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 10240 {
        return Err(EventOpsError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| EventOpsError::Http(format!("Invalid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_rejects_non_numeric_coordinates() {
        let err = serde_json::from_str::<LocationReport>(r#"{"lat":"12.9","lng":77.6}"#);
        assert!(err.is_err());
        let err = serde_json::from_str::<LocationReport>(r#"{"lat":null,"lng":77.6}"#);
        assert!(err.is_err());
    }

    #[test]
    fn report_accepts_missing_accuracy() {
        let r: LocationReport = serde_json::from_str(r#"{"lat":12.9,"lng":77.6}"#).unwrap();
        assert_eq!(r.lat, 12.9);
        assert_eq!(r.lng, 77.6);
        assert!(r.accuracy.is_none());

        let r: LocationReport =
            serde_json::from_str(r#"{"lat":12.9,"lng":77.6,"accuracy":8.5}"#).unwrap();
        assert_eq!(r.accuracy, Some(8.5));
    }

    #[test]
    fn error_body_carries_code() {
        let json = serde_json::to_string(&ErrorResponse {
            error: "lat/lng outside valid range".into(),
            code: Some("INVALID_COORDINATES".into()),
        })
        .unwrap();
        assert!(json.contains("\"code\":\"INVALID_COORDINATES\""));
    }
}
