use sqlx::PgPool;

use super::Ingredient;

/// `LIKE` pattern matching names that start with `prefix` literally.
pub fn prefix_pattern(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + 1);
    for c in prefix.trim().to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// All ingredients, or those whose name starts with `prefix` (case-insensitive).
pub async fn search(db: &PgPool, prefix: Option<&str>) -> anyhow::Result<Vec<Ingredient>> {
    let rows = match prefix.filter(|p| !p.trim().is_empty()) {
        Some(p) => {
            sqlx::query_as::<_, Ingredient>(
                r#"
                SELECT id, name, measurement_unit
                FROM ingredients
                WHERE lower(name) LIKE $1
                ORDER BY name, measurement_unit
                "#,
            )
            .bind(prefix_pattern(p))
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, Ingredient>(
                "SELECT id, name, measurement_unit FROM ingredients ORDER BY name, measurement_unit",
            )
            .fetch_all(db)
            .await?
        }
    };
    Ok(rows)
}

pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<Ingredient>> {
    let row = sqlx::query_as::<_, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyrillic_prefix_is_lowercased() {
        assert_eq!(prefix_pattern("Тома"), "тома%");
        assert_eq!(prefix_pattern("  тома "), "тома%");
    }

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(prefix_pattern("50%_off"), "50\\%\\_off%");
        assert_eq!(prefix_pattern("a\\b"), "a\\\\b%");
    }
}
