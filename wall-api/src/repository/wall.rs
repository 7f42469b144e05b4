//! PostgreSQL wall store
//!
//! Table and key column names come from configuration, so statements are
//! assembled per store instead of being static strings. Both names are
//! validated identifiers and always appear double-quoted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use wall_core::domain::wall::{Wall, WallId, count_objects};

use super::{StoreError, StoreResult, WallStore};

#[derive(Debug, Clone)]
pub struct PgWallStore {
    pool: PgPool,
    table: String,
    key: String,
}

impl PgWallStore {
    /// `table` and `key` must already satisfy [`crate::config::is_identifier`]
    pub fn new(pool: PgPool, table: &str, key: &str) -> Self {
        Self {
            pool,
            table: format!("\"{table}\""),
            key: format!("\"{key}\""),
        }
    }

    fn columns(&self) -> String {
        format!(
            "{key} AS wall_id, content, item_count, created_at, updated_at",
            key = self.key
        )
    }
}

#[async_trait]
impl WallStore for PgWallStore {
    async fn find(&self, id: &WallId) -> StoreResult<Option<Wall>> {
        let sql = format!(
            "SELECT {columns} FROM {table} WHERE {key} = $1",
            columns = self.columns(),
            table = self.table,
            key = self.key,
        );

        let row = sqlx::query_as::<_, WallRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Wall::try_from).transpose()
    }

    async fn insert(&self, wall: &Wall) -> StoreResult<bool> {
        let sql = format!(
            r#"
            INSERT INTO {table} ({key}, content, item_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ({key}) DO NOTHING
            "#,
            table = self.table,
            key = self.key,
        );

        let result = sqlx::query(&sql)
            .bind(wall.wall_id.as_str())
            .bind(&wall.content)
            .bind(count_as_i64(wall.count))
            .bind(wall.created_at)
            .bind(wall.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_content(
        &self,
        id: &WallId,
        content: Value,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Wall>> {
        let sql = format!(
            r#"
            UPDATE {table}
            SET content = $1, item_count = $2, updated_at = $3
            WHERE {key} = $4
            RETURNING {columns}
            "#,
            table = self.table,
            key = self.key,
            columns = self.columns(),
        );

        let count = count_as_i64(count_objects(&content));
        let row = sqlx::query_as::<_, WallRow>(&sql)
            .bind(&content)
            .bind(count)
            .bind(updated_at)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Wall::try_from).transpose()
    }
}

fn count_as_i64(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct WallRow {
    wall_id: String,
    content: Value,
    item_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WallRow> for Wall {
    type Error = StoreError;

    fn try_from(row: WallRow) -> Result<Self, Self::Error> {
        let wall_id = WallId::parse(row.wall_id.clone())
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", row.wall_id)))?;
        let count = u64::try_from(row.item_count)
            .map_err(|_| StoreError::Corrupt(format!("{wall_id}: negative item_count")))?;

        Ok(Wall {
            wall_id,
            content: row.content,
            count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
