//! PostgreSQL implementation of ProgressLogReader.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::domain::foundation::{AccountId, DomainError};
use crate::ports::ProgressLogReader;

/// Existence queries over the progress_entries table.
pub struct PostgresProgressLogReader {
    pool: PgPool,
}

impl PostgresProgressLogReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressLogReader for PostgresProgressLogReader {
    async fn has_entry_on(
        &self,
        account_id: &AccountId,
        day: NaiveDate,
    ) -> Result<bool, DomainError> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM progress_entries
                WHERE account_id = $1 AND entry_date = $2
            )
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(day)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to check progress entry: {}", e)))?;

        Ok(exists.0)
    }
}
