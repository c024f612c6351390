use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// JWT payload.
///
/// `username` is the only claim the auth check relies on; it is matched
/// (lowercased) against the users store on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub username: String,

    /// Store id of the user at issue time (informational).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiration (unix seconds).
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(username: impl Into<String>, id: Option<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            username: username.into(),
            id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}
