use async_trait::async_trait;
use sqlx::PgPool;

use osm_changeset::{Change, Tag};

use crate::error::Result;

/// Relational sink for edit records and their tags.
#[async_trait]
pub trait PersistenceGateway {
    /// Whether any change row for the changeset is already stored.
    async fn exists(&self, changeset_id: i32) -> Result<bool>;

    /// Insert one row into `changes`.
    async fn insert_change(&self, change: &Change<'_>) -> Result<()>;

    /// Insert one row into `tags`.
    async fn insert_tag(&self, tag: &Tag) -> Result<()>;
}

/// [`PersistenceGateway`] over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the pool, waiting for connections to be released.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn exists(&self, changeset_id: i32) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM changes WHERE changeset_id = $1)"#,
        )
        .bind(changeset_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_change(&self, change: &Change<'_>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO changes (osm_id, type, edit_type, version, changeset_id, username, uid, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(change.osm_id)
        .bind(change.object_type.as_str())
        .bind(change.edit_type.map(|e| e.as_str()))
        .bind(change.version)
        .bind(change.changeset_id)
        .bind(change.username)
        .bind(change.uid)
        .bind(change.created_at.map(|ts| ts.naive_utc()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_tag(&self, tag: &Tag) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tags (changeset_id, key, value, edit_type)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(tag.changeset_id)
        .bind(&tag.key)
        .bind(&tag.value)
        .bind(tag.edit_type.map(|e| e.as_str()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
