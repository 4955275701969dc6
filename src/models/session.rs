//! Admin session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Admin session entity backing bearer-token authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    /// Opaque session token
    pub token: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    /// Mint a new session with a random token, valid for `ttl_hours`
    pub fn mint(ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            token: Uuid::new_v4().to_string(),
            created_at: now,
            expires_at: now + Duration::hours(ttl_hours),
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_session_not_expired() {
        let session = AdminSession::mint(24);
        assert!(!session.is_expired());
        assert!(!session.token.is_empty());
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let now = Utc::now();
        let session = AdminSession {
            token: "stale".to_string(),
            created_at: now - Duration::hours(25),
            expires_at: now - Duration::hours(1),
        };
        assert!(session.is_expired());
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = AdminSession::mint(24);
        let b = AdminSession::mint(24);
        assert_ne!(a.token, b.token);
    }
}
