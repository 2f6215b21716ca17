//! Redfish resource documents keyed by `@odata.id`.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ResourceStore {
    pool: SqlitePool,
}

impl ResourceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the document at `odata_id`.
    pub async fn put(&self, odata_id: &str, document: &serde_json::Value) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO resources (odata_id, document) VALUES (?, ?)
             ON CONFLICT(odata_id) DO UPDATE SET document = excluded.document, updated_at = unixepoch()",
        )
        .bind(odata_id)
        .bind(document.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a document. Rows that no longer parse as JSON are reported as decode errors.
    pub async fn get(&self, odata_id: &str) -> Result<Option<serde_json::Value>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT document FROM resources WHERE odata_id = ?")
                .bind(odata_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(text,)| serde_json::from_str(&text).map_err(|e| sqlx::Error::Decode(Box::new(e))))
            .transpose()
    }
}
