//! Access token claims.

use serde::{Deserialize, Serialize};

/// Claims carried by access tokens issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id in the identity service
    pub uid: i64,
    /// User email
    pub email: String,
    /// Application the token was issued for
    pub app_id: i32,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
}

impl Claims {
    /// True once `exp` is in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }
}
