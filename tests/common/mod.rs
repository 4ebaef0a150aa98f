//! Seed helpers for database-backed tests.
//!
//! Each `#[sqlx::test]` gets a fresh database with `migrations/` applied, so
//! helpers only insert rows.

#![allow(dead_code)]

use foodgram::importer::{
    parse::{IngredientRecord, TagRecord},
    repo::{upsert_ingredients, upsert_tags},
};
use foodgram::recipes::{repo, repo_types::NewRecipe};
use foodgram::users::repo_types::{NewUser, User};
use sqlx::PgPool;

pub async fn user(pool: &PgPool, username: &str) -> User {
    User::create(
        pool,
        &NewUser {
            email: format!("{username}@example.com"),
            username: username.into(),
            first_name: "Test".into(),
            last_name: "Cook".into(),
            password_hash: "not-a-real-hash".into(),
        },
    )
    .await
    .expect("create user")
}

pub async fn ingredient(pool: &PgPool, name: &str, unit: &str) -> i64 {
    upsert_ingredients(
        pool,
        &[IngredientRecord {
            name: name.into(),
            measurement_unit: unit.into(),
        }],
    )
    .await
    .expect("insert ingredient");
    sqlx::query_scalar("SELECT id FROM ingredients WHERE name = $1 AND measurement_unit = $2")
        .bind(name)
        .bind(unit)
        .fetch_one(pool)
        .await
        .expect("ingredient id")
}

pub async fn tag(pool: &PgPool, name: &str, slug: &str, color: &str) -> i64 {
    upsert_tags(
        pool,
        &[TagRecord {
            name: name.into(),
            slug: slug.into(),
            color: color.into(),
        }],
    )
    .await
    .expect("insert tag");
    sqlx::query_scalar("SELECT id FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_one(pool)
        .await
        .expect("tag id")
}

pub async fn recipe(
    pool: &PgPool,
    author_id: i64,
    name: &str,
    tags: Vec<i64>,
    ingredients: Vec<(i64, i32)>,
) -> i64 {
    let mut tx = pool.begin().await.expect("begin");
    let id = repo::insert_tx(
        &mut tx,
        author_id,
        &NewRecipe {
            name: name.into(),
            text: "Mix and serve.".into(),
            cooking_time: 10,
            tags,
            ingredients,
        },
        &format!("recipes/{author_id}/{name}.png"),
    )
    .await
    .expect("insert recipe");
    tx.commit().await.expect("commit");
    id
}
