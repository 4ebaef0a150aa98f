use std::collections::{HashMap, HashSet};

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    recipes::{
        dto::{IngredientInRecipe, RecipeResponse, RecipeWriteRequest, ShortRecipe},
        images::{discard_image, image_url, store_image},
        repo,
        repo_types::{RecipeIngredientRow, RecipeRow, RecipeTagRow, ShortRecipeRow},
        validation::{unknown_ids, validate_changes, validate_new},
    },
    relations::RelationKind,
    state::AppState,
    tags::Tag,
    users::{dto::UserResponse, repo_types::User},
};

/// Splits joined link rows into per-recipe lists, preserving row order.
pub(crate) fn group_by_recipe<R, T>(
    rows: Vec<R>,
    split: impl Fn(R) -> (i64, T),
) -> HashMap<i64, Vec<T>> {
    let mut out: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        let (recipe_id, item) = split(row);
        out.entry(recipe_id).or_default().push(item);
    }
    out
}

fn split_tag(row: RecipeTagRow) -> (i64, Tag) {
    (
        row.recipe_id,
        Tag {
            id: row.id,
            name: row.name,
            color: row.color,
            slug: row.slug,
        },
    )
}

fn split_ingredient(row: RecipeIngredientRow) -> (i64, IngredientInRecipe) {
    (
        row.recipe_id,
        IngredientInRecipe {
            id: row.id,
            name: row.name,
            measurement_unit: row.measurement_unit,
            amount: row.amount,
        },
    )
}

/// Only the author or an admin may change a recipe.
pub fn ensure_can_modify(recipe_author: i64, actor: &User) -> AppResult<()> {
    if actor.id == recipe_author || actor.is_admin {
        return Ok(());
    }
    warn!(user_id = actor.id, recipe_author, "recipe change denied");
    Err(AppError::PermissionDenied)
}

/// Full views for `rows`, in the same order, as seen by `viewer`.
pub async fn assemble(
    state: &AppState,
    viewer: Option<i64>,
    rows: Vec<RecipeRow>,
) -> AppResult<Vec<RecipeResponse>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let author_ids: Vec<i64> = rows
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut tags = group_by_recipe(repo::tags_for(&state.db, &ids).await?, split_tag);
    let mut ingredients =
        group_by_recipe(repo::ingredients_for(&state.db, &ids).await?, split_ingredient);
    let authors: HashMap<i64, User> = User::find_many(&state.db, &author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let (favorited, in_cart, followed) = match viewer {
        Some(v) => (
            repo::marked_among(&state.db, RelationKind::Favorite, v, &ids).await?,
            repo::marked_among(&state.db, RelationKind::ShoppingCart, v, &ids).await?,
            User::followed_among(&state.db, v, &author_ids).await?,
        ),
        None => Default::default(),
    };

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let author = authors
            .get(&row.author_id)
            .cloned()
            .with_context(|| format!("author {} of recipe {} missing", row.author_id, row.id))?;
        let is_subscribed = viewer != Some(author.id) && followed.contains(&author.id);
        out.push(RecipeResponse {
            id: row.id,
            tags: tags.remove(&row.id).unwrap_or_default(),
            author: UserResponse::new(author, is_subscribed),
            ingredients: ingredients.remove(&row.id).unwrap_or_default(),
            is_favorited: favorited.contains(&row.id),
            is_in_shopping_cart: in_cart.contains(&row.id),
            name: row.name,
            image: image_url(state, &row.image_key).await?,
            text: row.text,
            cooking_time: row.cooking_time,
        });
    }
    Ok(out)
}

pub async fn recipe_view(
    state: &AppState,
    viewer: Option<i64>,
    recipe_id: i64,
) -> AppResult<RecipeResponse> {
    let row = load(state, recipe_id).await?;
    assemble(state, viewer, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Recipe not found.".into()))
}

pub async fn short_views(state: &AppState, rows: Vec<ShortRecipeRow>) -> AppResult<Vec<ShortRecipe>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(ShortRecipe {
            id: row.id,
            name: row.name,
            image: image_url(state, &row.image_key).await?,
            cooking_time: row.cooking_time,
        });
    }
    Ok(out)
}

pub async fn short_view(state: &AppState, recipe_id: i64) -> AppResult<ShortRecipe> {
    let row = repo::find_short(&state.db, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found.".into()))?;
    short_views(state, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Recipe not found.".into()))
}

async fn load(state: &AppState, recipe_id: i64) -> AppResult<RecipeRow> {
    repo::find(&state.db, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found.".into()))
}

async fn load_actor(state: &AppState, user_id: i64) -> AppResult<User> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("User not found.".into()))
}

async fn check_references(state: &AppState, tags: &[i64], ingredients: &[(i64, i32)]) -> AppResult<()> {
    let found = repo::existing_tag_ids(&state.db, tags).await?;
    unknown_ids("tags", tags, &found)?;

    let ids: Vec<i64> = ingredients.iter().map(|(id, _)| *id).collect();
    let found = repo::existing_ingredient_ids(&state.db, &ids).await?;
    unknown_ids("ingredients", &ids, &found)
}

pub async fn create(
    state: &AppState,
    author_id: i64,
    req: RecipeWriteRequest,
) -> AppResult<RecipeResponse> {
    let (recipe, image) = validate_new(req, &state.config.limits)?;
    check_references(state, &recipe.tags, &recipe.ingredients).await?;

    let key = store_image(state, author_id, image).await?;
    let inserted = async {
        let mut tx = state.db.begin().await?;
        let id = repo::insert_tx(&mut tx, author_id, &recipe, &key).await?;
        tx.commit().await?;
        anyhow::Ok(id)
    }
    .await;
    let id = match inserted {
        Ok(id) => id,
        Err(e) => {
            discard_image(state, &key).await;
            return Err(e.into());
        }
    };

    info!(recipe_id = id, author_id, "recipe created");
    recipe_view(state, Some(author_id), id).await
}

pub async fn update(
    state: &AppState,
    actor_id: i64,
    recipe_id: i64,
    req: RecipeWriteRequest,
) -> AppResult<RecipeResponse> {
    let current = load(state, recipe_id).await?;
    let actor = load_actor(state, actor_id).await?;
    ensure_can_modify(current.author_id, &actor)?;

    let (changes, image) = validate_changes(req, &state.config.limits)?;
    check_references(state, &changes.tags, &changes.ingredients).await?;

    let new_key = match image {
        Some(img) => Some(store_image(state, current.author_id, img).await?),
        None => None,
    };
    let updated = async {
        let mut tx = state.db.begin().await?;
        repo::update_tx(&mut tx, recipe_id, &changes, new_key.as_deref()).await?;
        tx.commit().await?;
        anyhow::Ok(())
    }
    .await;
    if let Err(e) = updated {
        if let Some(key) = &new_key {
            discard_image(state, key).await;
        }
        return Err(e.into());
    }
    if new_key.is_some() {
        discard_image(state, &current.image_key).await;
    }

    info!(recipe_id, user_id = actor_id, "recipe updated");
    recipe_view(state, Some(actor_id), recipe_id).await
}

pub async fn delete(state: &AppState, actor_id: i64, recipe_id: i64) -> AppResult<()> {
    let current = load(state, recipe_id).await?;
    let actor = load_actor(state, actor_id).await?;
    ensure_can_modify(current.author_id, &actor)?;

    if let Some(key) = repo::delete(&state.db, recipe_id).await? {
        discard_image(state, &key).await;
    }
    info!(recipe_id, user_id = actor_id, "recipe deleted");
    Ok(())
}
