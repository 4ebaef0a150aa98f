use std::collections::HashSet;

use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::recipes::repo_types::{
    NewRecipe, RecipeChanges, RecipeFilter, RecipeIngredientRow, RecipeRow, RecipeTagRow,
    ShortRecipeRow,
};
use crate::relations::RelationKind;

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a RecipeFilter) {
    qb.push(" WHERE TRUE");
    if let Some(author) = filter.author {
        qb.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
             WHERE rt.recipe_id = r.id AND t.slug = ANY(",
        )
        .push_bind(&filter.tags)
        .push("))");
    }
    if let Some(user) = filter.favorited_by {
        qb.push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
            .push_bind(user)
            .push(")");
    }
    if let Some(user) = filter.in_cart_of {
        qb.push(
            " AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ",
        )
        .push_bind(user)
        .push(")");
    }
}

/// Filtered page of recipes, newest first, plus the total match count.
pub async fn list(
    db: &PgPool,
    filter: &RecipeFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<(i64, Vec<RecipeRow>)> {
    let mut count_q = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recipes r");
    push_filters(&mut count_q, filter);
    let count: i64 = count_q.build_query_scalar::<i64>().fetch_one(db).await?;

    let mut q = QueryBuilder::<Postgres>::new(
        "SELECT r.id, r.author_id, r.name, r.text, r.image_key, r.cooking_time, r.pub_date \
         FROM recipes r",
    );
    push_filters(&mut q, filter);
    q.push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = q.build_query_as::<RecipeRow>().fetch_all(db).await?;

    Ok((count, rows))
}

pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<RecipeRow>> {
    let row = sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT id, author_id, name, text, image_key, cooking_time, pub_date
        FROM recipes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_short(db: &PgPool, id: i64) -> anyhow::Result<Option<ShortRecipeRow>> {
    let row = sqlx::query_as::<_, ShortRecipeRow>(
        "SELECT id, name, image_key, cooking_time FROM recipes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Tags of every recipe in `recipe_ids`, ordered by tag id.
pub async fn tags_for(db: &PgPool, recipe_ids: &[i64]) -> anyhow::Result<Vec<RecipeTagRow>> {
    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, RecipeTagRow>(
        r#"
        SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
        FROM recipe_tags rt
        JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY rt.recipe_id, t.id
        "#,
    )
    .bind(recipe_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Ingredient lines of every recipe in `recipe_ids`, in insertion order.
pub async fn ingredients_for(
    db: &PgPool,
    recipe_ids: &[i64],
) -> anyhow::Result<Vec<RecipeIngredientRow>> {
    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, RecipeIngredientRow>(
        r#"
        SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.recipe_id, ri.id
        "#,
    )
    .bind(recipe_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Subset of `recipe_ids` that `viewer` has in the favorites or cart table.
pub async fn marked_among(
    db: &PgPool,
    kind: RelationKind,
    viewer: i64,
    recipe_ids: &[i64],
) -> anyhow::Result<HashSet<i64>> {
    if recipe_ids.is_empty() || kind == RelationKind::Follow {
        return Ok(HashSet::new());
    }
    let sql = format!(
        "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = ANY($2)",
        kind.table()
    );
    let ids: Vec<i64> = sqlx::query_scalar(&sql)
        .bind(viewer)
        .bind(recipe_ids)
        .fetch_all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Author's recipes, newest first; `None` returns all of them.
pub async fn short_by_author(
    db: &PgPool,
    author_id: i64,
    limit: Option<i64>,
) -> anyhow::Result<Vec<ShortRecipeRow>> {
    let rows = sqlx::query_as::<_, ShortRecipeRow>(
        r#"
        SELECT id, name, image_key, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_by_author(db: &PgPool, author_id: i64) -> anyhow::Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(db)
        .await?;
    Ok(n)
}

pub async fn existing_tag_ids(db: &PgPool, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
    let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(db)
        .await?;
    Ok(found)
}

pub async fn existing_ingredient_ids(db: &PgPool, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
    let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(db)
        .await?;
    Ok(found)
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    author_id: i64,
    recipe: &NewRecipe,
    image_key: &str,
) -> anyhow::Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO recipes (author_id, name, text, image_key, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(&recipe.name)
    .bind(&recipe.text)
    .bind(image_key)
    .bind(recipe.cooking_time)
    .fetch_one(&mut **tx)
    .await?;

    replace_links_tx(tx, id, &recipe.tags, &recipe.ingredients).await?;
    Ok(id)
}

/// Applies scalar changes and replaces tag and ingredient links.
pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    changes: &RecipeChanges,
    image_key: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE recipes
        SET name = COALESCE($2, name),
            text = COALESCE($3, text),
            cooking_time = COALESCE($4, cooking_time),
            image_key = COALESCE($5, image_key)
        WHERE id = $1
        "#,
    )
    .bind(recipe_id)
    .bind(changes.name.as_deref())
    .bind(changes.text.as_deref())
    .bind(changes.cooking_time)
    .bind(image_key)
    .execute(&mut **tx)
    .await?;

    replace_links_tx(tx, recipe_id, &changes.tags, &changes.ingredients).await
}

async fn replace_links_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    tags: &[i64],
    ingredients: &[(i64, i32)],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        "INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, t FROM UNNEST($2::BIGINT[]) AS t",
    )
    .bind(recipe_id)
    .bind(tags)
    .execute(&mut **tx)
    .await?;

    let (ids, amounts): (Vec<i64>, Vec<i32>) = ingredients.iter().copied().unzip();
    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
        SELECT $1, i, a FROM UNNEST($2::BIGINT[], $3::INT[]) AS x(i, a)
        "#,
    )
    .bind(recipe_id)
    .bind(&ids)
    .bind(&amounts)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Deletes the recipe and returns its image key; links cascade.
pub async fn delete(db: &PgPool, recipe_id: i64) -> anyhow::Result<Option<String>> {
    let key: Option<String> =
        sqlx::query_scalar("DELETE FROM recipes WHERE id = $1 RETURNING image_key")
            .bind(recipe_id)
            .fetch_optional(db)
            .await?;
    Ok(key)
}
