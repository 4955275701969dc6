use std::sync::Arc;

use thiserror::Error;

use crate::db::repositories::SessionRepository;
use crate::models::AdminSession;

/// Password accepted when no admin secret is configured. Meant for local
/// development only; deployments must set `admin.secret`.
const DEV_PASSWORD: &str = "geobit-dev";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No admin secret is configured")]
    NotConfigured,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Admin authentication: exchanges the shared admin password for a session
/// token and verifies bearer tokens on protected routes.
pub struct AuthService {
    sessions: Arc<dyn SessionRepository>,
    secret: Option<String>,
    session_ttl_hours: i64,
}

impl AuthService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        secret: Option<String>,
        session_ttl_hours: i64,
    ) -> Self {
        Self {
            sessions,
            secret,
            session_ttl_hours,
        }
    }

    /// Validate the admin password and mint a new session token.
    ///
    /// With a configured secret, a mismatch is `InvalidCredentials`. Without
    /// one, only the development bypass is accepted; anything else reports
    /// the missing configuration rather than a bad password.
    pub async fn login(&self, password: &str) -> Result<AdminSession, AuthError> {
        match self.secret.as_deref() {
            Some(secret) => {
                if password != secret {
                    return Err(AuthError::InvalidCredentials);
                }
            }
            None => {
                if password != DEV_PASSWORD {
                    return Err(AuthError::NotConfigured);
                }
            }
        }

        let session = AdminSession::mint(self.session_ttl_hours);
        self.sessions.create(&session).await?;
        Ok(session)
    }

    /// Check whether a bearer token names a live session. Fails closed:
    /// unknown tokens, expired sessions, and store errors all read as false.
    pub async fn verify_token(&self, token: &str) -> bool {
        match self.sessions.get_by_token(token).await {
            Ok(Some(session)) => !session.is_expired(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Session lookup failed: {}", e);
                false
            }
        }
    }
}
