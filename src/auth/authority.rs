//! Session lifecycle: login, per-request token resolution, logout.
//!
//! Validation is store-checked. A token is only accepted while its session
//! record exists and still matches the token, so logging out revokes the token
//! immediately at the cost of one store read per request.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::errors::AuthError;
use super::password;
use super::store::{AccountDirectory, PrincipalResolver, SessionRepository};
use super::types::{CreatedSession, Principal, Session};
use crate::db::{Account, StoreError};
use crate::jwt::{TokenCodec, TokenError, unix_now};

/// Default Redfish session timeout: 30 minutes.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 30 * 60;

/// Tunables for session issuance and login throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub session_timeout_secs: u64,
    /// Failed logins tolerated before locking; 0 disables lockout
    pub lockout_threshold: u32,
    pub lockout_duration_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            lockout_threshold: 5,
            lockout_duration_secs: 60,
        }
    }
}

pub struct SessionAuthority {
    codec: Arc<TokenCodec>,
    sessions: Arc<dyn SessionRepository>,
    accounts: Arc<dyn AccountDirectory>,
    settings: SessionSettings,
}

impl SessionAuthority {
    pub fn new(
        codec: Arc<TokenCodec>,
        sessions: Arc<dyn SessionRepository>,
        accounts: Arc<dyn AccountDirectory>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            codec,
            sessions,
            accounts,
            settings,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Log in: check the password and open a new session.
    pub async fn create_session(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CreatedSession, AuthError> {
        let now = now()?;
        let account = self.check_credentials(username, password, now).await?;

        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            username: account.username,
            role: account.role,
            created_at: now,
            expires_at: now + self.settings.session_timeout_secs.max(1),
        };

        self.sessions
            .put(&session)
            .await
            .map_err(|e| store_failure("Failed to store session", e))?;

        let token = self.token_for(&session)?;

        info!(
            session_id = %session.session_id,
            user = %session.username,
            expires_at = session.expires_at,
            "Session created"
        );

        Ok(CreatedSession { session, token })
    }

    /// Resolve a bearer token to the principal of its live session.
    pub async fn load_principal_by_token(&self, token: &str) -> Result<Principal, AuthError> {
        let verified = self.codec.verify(token).map_err(|e| match e {
            TokenError::Clock => AuthError::Internal(e.to_string()),
            _ => {
                debug!(error = %e, "Token rejected");
                AuthError::InvalidToken
            }
        })?;

        let session = self
            .sessions
            .get(&verified.session_id)
            .await
            .map_err(|e| store_failure("Failed to load session", e))?
            .ok_or(AuthError::Unauthenticated)?;

        // The record is the ground truth; a token that disagrees with it was not issued for it.
        if session.username != verified.principal || session.expires_at != verified.expiry {
            warn!(session_id = %session.session_id, "Token does not match its session record");
            return Err(AuthError::InvalidToken);
        }

        Ok(Principal {
            username: session.username,
            role: session.role,
            session_id: Some(session.session_id),
        })
    }

    /// Log out. Unknown ids are a successful no-op.
    pub async fn invalidate_session(&self, session_id: &str) -> Result<(), AuthError> {
        let removed = self
            .sessions
            .delete(session_id)
            .await
            .map_err(|e| store_failure("Failed to delete session", e))?;

        if removed {
            info!(session_id = %session_id, "Session invalidated");
        } else {
            debug!(session_id = %session_id, "Invalidate on unknown session ignored");
        }
        Ok(())
    }

    /// Fetch a live session record.
    pub async fn get_session(&self, session_id: &str) -> Result<Session, AuthError> {
        let now = now()?;
        self.lookup_session(session_id)
            .await?
            .filter(|s| !s.is_expired(now))
            .ok_or(AuthError::SessionNotFound)
    }

    /// Fetch a stored session record, expired or not.
    pub async fn lookup_session(&self, session_id: &str) -> Result<Option<Session>, AuthError> {
        self.sessions
            .get(session_id)
            .await
            .map_err(|e| store_failure("Failed to load session", e))
    }

    /// Live sessions the principal may see: all of them for administrators, otherwise its own.
    pub async fn list_sessions(&self, principal: &Principal) -> Result<Vec<Session>, AuthError> {
        let now = now()?;
        let sessions = self
            .sessions
            .list_active(now)
            .await
            .map_err(|e| store_failure("Failed to list sessions", e))?;

        Ok(sessions
            .into_iter()
            .filter(|s| principal.can_manage(s))
            .collect())
    }

    /// Regenerate the token for a stored session.
    pub fn token_for(&self, session: &Session) -> Result<String, AuthError> {
        self.codec
            .issue(&session.session_id, &session.username, session.expires_at)
            .map_err(|e| {
                error!(error = %e, "Failed to issue token");
                AuthError::Internal("Failed to issue token".into())
            })
    }

    /// Delete sessions whose expiry has passed.
    pub async fn sweep_expired(&self) -> Result<u64, AuthError> {
        let now = now()?;
        self.sessions
            .delete_expired(now)
            .await
            .map_err(|e| store_failure("Failed to sweep expired sessions", e))
    }

    /// Check a username/password pair. Every rejection looks the same to the caller.
    async fn check_credentials(
        &self,
        username: &str,
        password: &str,
        now: u64,
    ) -> Result<Account, AuthError> {
        let account = self
            .accounts
            .find(username)
            .await
            .map_err(|e| store_failure("Failed to load account", e))?;

        let Some(account) = account else {
            password::verify_against_dummy(password);
            warn!(user = %username, "Authentication failed");
            return Err(AuthError::AuthenticationFailed);
        };

        if !account.enabled || account.is_locked(now) {
            password::verify_against_dummy(password);
            warn!(user = %username, "Authentication failed");
            debug!(user = %username, enabled = account.enabled, "Account disabled or locked");
            return Err(AuthError::AuthenticationFailed);
        }

        let matches = match password::verify_password(password, &account.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                error!(user = %username, error = %e, "Stored password hash is unusable");
                false
            }
        };

        if !matches {
            let lock_until = now + self.settings.lockout_duration_secs;
            let locked = self
                .accounts
                .record_failure(username, self.settings.lockout_threshold, lock_until)
                .await
                .map_err(|e| store_failure("Failed to record login failure", e))?;
            if locked {
                warn!(user = %username, until = lock_until, "Account locked after repeated failed logins");
            }
            warn!(user = %username, "Authentication failed");
            return Err(AuthError::AuthenticationFailed);
        }

        if account.failed_logins > 0 || account.locked_until.is_some() {
            self.accounts
                .clear_failures(username)
                .await
                .map_err(|e| store_failure("Failed to reset login failures", e))?;
        }

        Ok(account)
    }
}

#[async_trait]
impl PrincipalResolver for SessionAuthority {
    async fn load_principal_by_token(&self, token: &str) -> Result<Principal, AuthError> {
        SessionAuthority::load_principal_by_token(self, token).await
    }

    async fn load_principal_by_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Principal, AuthError> {
        let account = self.check_credentials(username, password, now()?).await?;
        Ok(Principal {
            username: account.username,
            role: account.role,
            session_id: None,
        })
    }
}

fn now() -> Result<u64, AuthError> {
    unix_now().map_err(|e| AuthError::Internal(e.to_string()))
}

fn store_failure(context: &str, e: StoreError) -> AuthError {
    error!(error = %e, "{}", context);
    AuthError::StoreUnavailable(e)
}
