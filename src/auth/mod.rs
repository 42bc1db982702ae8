//! Authentication for EventOps
//!
//! The gateway is a session *verifier*: credentials are issued elsewhere in the
//! EventOps app and presented here as a JWT in the `token` cookie. Every
//! tracking endpoint rejects requests lacking a valid token before touching
//! any data.

pub mod jwt;

pub use jwt::{extract_token_from_cookie, Claims, JwtValidator};
