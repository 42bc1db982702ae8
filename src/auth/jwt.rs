//! JWT session token verification

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::{EventOpsError, Result};

/// Claims carried in an EventOps session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User document id (hex ObjectId)
    pub id: String,
    /// User identifier (email)
    pub email: String,
    /// Expiry (unix seconds)
    pub exp: u64,
}

/// Validates and (for tests and tooling) issues session tokens
#[derive(Clone)]
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Verify a token and return its claims
    pub fn validate(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| EventOpsError::Auth(format!("invalid token: {}", e)))
    }

    /// Issue a token for the given user
    pub fn issue(&self, id: &str, email: &str, ttl_secs: u64) -> Result<String> {
        let exp = chrono::Utc::now().timestamp() as u64 + ttl_secs;
        let claims = Claims {
            id: id.to_string(),
            email: email.to_string(),
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| EventOpsError::Auth(format!("token encoding failed: {}", e)))
    }
}

/// Extract the session token from a `Cookie` header value.
///
/// The EventOps web app stores the session JWT in a cookie named `token`.
pub fn extract_token_from_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|pair| {
        let pair = pair.trim();
        pair.strip_prefix("token=")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_valid_token() {
        let jwt = JwtValidator::new("test-secret");
        let token = jwt.issue("65a1b2c3d4e5f6a7b8c9d0e1", "ava@example.com", 3600).unwrap();
        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.id, "65a1b2c3d4e5f6a7b8c9d0e1");
        assert_eq!(claims.email, "ava@example.com");
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let issuer = JwtValidator::new("secret-a");
        let verifier = JwtValidator::new("secret-b");
        let token = issuer.issue("id", "x@example.com", 3600).unwrap();
        assert!(verifier.validate(&token).is_err());
    }

    #[test]
    fn extracts_token_cookie_among_others() {
        assert_eq!(
            extract_token_from_cookie("theme=dark; token=abc.def.ghi; lang=en"),
            Some("abc.def.ghi")
        );
        assert_eq!(extract_token_from_cookie("token=solo"), Some("solo"));
        assert_eq!(extract_token_from_cookie("session=other"), None);
    }
}
