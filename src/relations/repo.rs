use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::{RelationKind, RelationStore};

/// Relation pairs stored in their Postgres join tables.
#[derive(Clone)]
pub struct PgRelationStore {
    db: PgPool,
}

impl PgRelationStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RelationStore for PgRelationStore {
    async fn target_exists(&self, kind: RelationKind, target: i64) -> anyhow::Result<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            kind.target_table()
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(target)
            .fetch_one(&self.db)
            .await
            .with_context(|| format!("check {} target", kind.table()))?;
        Ok(exists)
    }

    async fn contains(&self, kind: RelationKind, actor: i64, target: i64) -> anyhow::Result<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND {} = $2)",
            kind.table(),
            kind.object_column()
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(actor)
            .bind(target)
            .fetch_one(&self.db)
            .await
            .with_context(|| format!("lookup {}", kind.table()))?;
        Ok(exists)
    }

    async fn insert(&self, kind: RelationKind, actor: i64, target: i64) -> anyhow::Result<bool> {
        let sql = format!(
            "INSERT INTO {} (user_id, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            kind.table(),
            kind.object_column()
        );
        let res = sqlx::query(&sql)
            .bind(actor)
            .bind(target)
            .execute(&self.db)
            .await
            .with_context(|| format!("insert into {}", kind.table()))?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete(&self, kind: RelationKind, actor: i64, target: i64) -> anyhow::Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
            kind.table(),
            kind.object_column()
        );
        let res = sqlx::query(&sql)
            .bind(actor)
            .bind(target)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete from {}", kind.table()))?;
        Ok(res.rows_affected() > 0)
    }
}
