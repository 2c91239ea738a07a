use super::util::store_error;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

pub struct MySqlItemRepo {
    pool: MySqlPool,
}

impl MySqlItemRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlItemRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<ItemRecord, StoreError> {
        let id: i64 = row.try_get("id").map_err(store_error)?;
        let title: String = row.try_get("title").map_err(store_error)?;
        let price: i32 = row.try_get("price").map_err(store_error)?;
        let view_count: i64 = row.try_get("view_count").map_err(store_error)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_error)?;

        Ok(ItemRecord {
            id: ItemId(id),
            title,
            price,
            view_count: u64::try_from(view_count).unwrap_or(0),
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl ItemRepo for MySqlItemRepo {
    async fn find_by_id(&self, id: ItemId) -> Result<Option<ItemRecord>, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, title, price, view_count, created_at
FROM post
WHERE id = ?
"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn find_all_by_ids(&self, ids: &[ItemId]) -> Result<Vec<ItemRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT id, title, price, view_count, created_at FROM post WHERE id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn list_recent(&self, offset: u64, limit: usize) -> Result<Vec<ItemRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
SELECT id, title, price, view_count, created_at
FROM post
ORDER BY created_at DESC, id DESC
LIMIT ? OFFSET ?
"#,
        )
        .bind(limit as u64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn update_view_count(&self, id: ItemId, count: u64) -> Result<CountUpdate, StoreError> {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        let result = sqlx::query(
            r#"
UPDATE post
SET view_count = GREATEST(view_count, ?)
WHERE id = ?
"#,
        )
        .bind(count)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() > 0 {
            return Ok(CountUpdate::Applied);
        }

        // Zero affected rows is also what an unchanged count reports.
        let present: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM post WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(if present > 0 {
            CountUpdate::Applied
        } else {
            CountUpdate::Missing
        })
    }
}
