use anyhow::Context;
use sqlx::{FromRow, PgPool};

/// One ingredient line of one recipe in the cart.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Rows are sorted by name then unit, so grouped output follows the database collation.
pub async fn cart_ingredients(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<CartIngredientRow>> {
    let rows = sqlx::query_as::<_, CartIngredientRow>(
        r#"
        SELECT i.name, i.measurement_unit, ri.amount
          FROM shopping_cart sc
          JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
          JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE sc.user_id = $1
         ORDER BY i.name, i.measurement_unit
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("load cart ingredients")?;
    Ok(rows)
}
