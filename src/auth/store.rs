//! Seams between the session authority and its collaborators.
//!
//! The sqlite stores in [`crate::db`] implement these, but anything with the
//! same contract can stand in (tests use in-process fakes).

use async_trait::async_trait;

use super::errors::AuthError;
use super::types::{Principal, Session};
use crate::db::{Account, StoreError};

/// Credential store: session records keyed by session id.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a session. The caller guarantees a fresh, unique id.
    async fn put(&self, session: &Session) -> Result<(), StoreError>;

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StoreError>;

    /// Sessions that have not expired as of `now`, newest first.
    async fn list_active(&self, now: u64) -> Result<Vec<Session>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, session_id: &str) -> Result<bool, StoreError>;

    /// Remove every session with `expires_at <= now`.
    async fn delete_expired(&self, now: u64) -> Result<u64, StoreError>;
}

/// Account lookup used to check login credentials.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Count a failed login. Once the count reaches `threshold` (when non-zero)
    /// the account is locked until `lock_until` and the counter restarts.
    /// Returns whether this failure locked the account.
    async fn record_failure(
        &self,
        username: &str,
        threshold: u32,
        lock_until: u64,
    ) -> Result<bool, StoreError>;

    async fn clear_failures(&self, username: &str) -> Result<(), StoreError>;
}

/// Resolves request credentials to a principal. This is what the request gate
/// consults; [`super::SessionAuthority`] is the production implementation.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn load_principal_by_token(&self, token: &str) -> Result<Principal, AuthError>;

    async fn load_principal_by_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Principal, AuthError>;
}
