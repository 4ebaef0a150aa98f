use sqlx::PgPool;
use tracing::debug;

use super::{
    parse::{IngredientRecord, TagRecord},
    ImportSummary,
};

/// Inserts ingredients in one transaction; existing (name, unit) pairs are skipped.
pub async fn upsert_ingredients(
    db: &PgPool,
    records: &[IngredientRecord],
) -> anyhow::Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let mut tx = db.begin().await?;
    for r in records {
        let done = sqlx::query(
            r#"
            INSERT INTO ingredients (name, measurement_unit)
            VALUES ($1, $2)
            ON CONFLICT (name, measurement_unit) DO NOTHING
            "#,
        )
        .bind(&r.name)
        .bind(&r.measurement_unit)
        .execute(&mut *tx)
        .await?;
        if done.rows_affected() == 1 {
            summary.inserted += 1;
        } else {
            debug!(name = %r.name, unit = %r.measurement_unit, "ingredient already present");
            summary.skipped += 1;
        }
    }
    tx.commit().await?;
    Ok(summary)
}

/// Inserts tags in one transaction; an existing slug gets its name and color refreshed.
pub async fn upsert_tags(db: &PgPool, records: &[TagRecord]) -> anyhow::Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let mut tx = db.begin().await?;
    for r in records {
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO tags (name, slug, color)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, color = EXCLUDED.color
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&r.name)
        .bind(&r.slug)
        .bind(&r.color)
        .fetch_one(&mut *tx)
        .await?;
        if inserted {
            summary.inserted += 1;
        } else {
            debug!(slug = %r.slug, "tag updated");
            summary.skipped += 1;
        }
    }
    tx.commit().await?;
    Ok(summary)
}
