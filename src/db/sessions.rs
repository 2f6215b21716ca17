//! Session records for revocation-aware token validation.
//!
//! Only the session identity is stored. Tokens are re-derivable from a record
//! and are never written to the database.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use super::{AccountRole, StoreError};
use crate::auth::{Session, SessionRepository};

/// Store for managing active sessions.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: String,
    username: String,
    role: String,
    created_at: i64,
    expires_at: i64,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            session_id: row.session_id,
            username: row.username,
            role: AccountRole::from_str(&row.role),
            created_at: row.created_at.max(0) as u64,
            expires_at: row.expires_at.max(0) as u64,
        }
    }
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SessionStore {
    async fn put(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (session_id, username, role, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session.session_id)
        .bind(&session.username)
        .bind(session.role.as_str())
        .bind(session.created_at as i64)
        .bind(session.expires_at as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT session_id, username, role, created_at, expires_at FROM sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Session::from))
    }

    async fn list_active(&self, now: u64) -> Result<Vec<Session>, StoreError> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT session_id, username, role, created_at, expires_at FROM sessions WHERE expires_at > ? ORDER BY created_at DESC",
        )
        .bind(now as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    async fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: u64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn session(id: &str, username: &str, expires_at: u64) -> Session {
        Session {
            session_id: id.to_string(),
            username: username.to_string(),
            role: AccountRole::Operator,
            created_at: 100,
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let db = Database::open(":memory:").await.unwrap();
        let store = db.sessions();

        let s = session("s-1", "alice", 2_000);
        store.put(&s).await.unwrap();
        assert_eq!(store.get("s-1").await.unwrap(), Some(s));

        assert!(store.delete("s-1").await.unwrap());
        assert_eq!(store.get("s-1").await.unwrap(), None);
        assert!(!store.delete("s-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_session_id_rejected() {
        let db = Database::open(":memory:").await.unwrap();
        let store = db.sessions();

        store.put(&session("s-1", "alice", 2_000)).await.unwrap();
        assert!(store.put(&session("s-1", "bob", 2_000)).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let db = Database::open(":memory:").await.unwrap();
        let store = db.sessions();

        store.put(&session("old", "alice", 1_000)).await.unwrap();
        store.put(&session("edge", "alice", 1_500)).await.unwrap();
        store.put(&session("new", "alice", 3_000)).await.unwrap();

        assert_eq!(store.delete_expired(1_500).await.unwrap(), 2);
        assert!(store.get("old").await.unwrap().is_none());
        assert!(store.get("edge").await.unwrap().is_none());
        assert!(store.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_active_skips_expired() {
        let db = Database::open(":memory:").await.unwrap();
        let store = db.sessions();

        store.put(&session("a-1", "alice", 3_000)).await.unwrap();
        store.put(&session("a-2", "alice", 3_000)).await.unwrap();
        store.put(&session("b-1", "bob", 3_000)).await.unwrap();
        store.put(&session("b-old", "bob", 1_000)).await.unwrap();

        let active = store.list_active(2_000).await.unwrap();
        assert_eq!(active.len(), 3);
        assert!(active.iter().all(|s| s.session_id != "b-old"));
    }
}
