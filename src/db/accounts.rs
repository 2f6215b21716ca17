use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use super::StoreError;
use crate::auth::AccountDirectory;

#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

/// Redfish predefined roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AccountRole {
    Administrator,
    Operator,
    ReadOnly,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Administrator => "Administrator",
            AccountRole::Operator => "Operator",
            AccountRole::ReadOnly => "ReadOnly",
        }
    }

    /// Unknown strings fall back to the least privileged role.
    pub fn from_str(s: &str) -> Self {
        match s {
            "Administrator" => AccountRole::Administrator,
            "Operator" => AccountRole::Operator,
            _ => AccountRole::ReadOnly,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub role: AccountRole,
    pub enabled: bool,
    pub failed_logins: u32,
    pub locked_until: Option<u64>,
}

impl Account {
    pub fn is_locked(&self, now: u64) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
    enabled: i32,
    failed_logins: i64,
    locked_until: Option<i64>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role: AccountRole::from_str(&row.role),
            enabled: row.enabled != 0,
            failed_logins: row.failed_logins.max(0) as u32,
            locked_until: row.locked_until.map(|t| t.max(0) as u64),
        }
    }
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an account with an already hashed password. Returns the account ID.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: AccountRole,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO accounts (username, password_hash, role) VALUES (?, ?, ?)")
                .bind(username)
                .bind(password_hash)
                .bind(role.as_str())
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, username, password_hash, role, enabled, failed_logins, locked_until FROM accounts WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    pub async fn set_enabled(&self, username: &str, enabled: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE accounts SET enabled = ? WHERE username = ?")
            .bind(enabled as i32)
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountDirectory for AccountStore {
    async fn find(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.get_by_username(username).await?)
    }

    async fn record_failure(
        &self,
        username: &str,
        threshold: u32,
        lock_until: u64,
    ) -> Result<bool, StoreError> {
        // Single statement so concurrent failures cannot lose an increment.
        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE accounts SET
                locked_until = CASE WHEN ?1 > 0 AND failed_logins + 1 >= ?1 THEN ?2 ELSE locked_until END,
                failed_logins = CASE WHEN ?1 > 0 AND failed_logins + 1 >= ?1 THEN 0 ELSE failed_logins + 1 END
             WHERE username = ?3
             RETURNING failed_logins",
        )
        .bind(threshold as i64)
        .bind(lock_until as i64)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        // The counter only drops back to zero when this failure locked the account.
        Ok(threshold > 0 && matches!(row, Some((0,))))
    }

    async fn clear_failures(&self, username: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE accounts SET failed_logins = 0, locked_until = NULL WHERE username = ?",
        )
        .bind(username)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
