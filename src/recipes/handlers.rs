use axum::{
    extract::{OriginalUri, Path, RawQuery, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::AuthUser,
    error::AppResult,
    pagination::{Page, PageParams},
    query::parse_query,
    recipes::{
        dto::{RecipeListQuery, RecipeResponse, RecipeWriteRequest, ShortRecipe},
        repo,
        repo_types::RecipeFilter,
        services,
    },
    relations::{self, PgRelationStore, RelationKind},
    shopping_list::{self, REPORT_FILENAME},
    state::AppState,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/download_shopping_cart", get(download_shopping_cart))
        .route(
            "/recipes/:id",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route(
            "/recipes/:id/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart",
            post(add_to_cart).delete(remove_from_cart),
        )
}

/// User-scoped flags only count as `1` and only for an authenticated viewer.
fn list_filter(q: RecipeListQuery, viewer: Option<i64>) -> RecipeFilter {
    let flagged = |flag: Option<i64>| viewer.filter(|_| flag == Some(1));
    RecipeFilter {
        author: q.author,
        favorited_by: flagged(q.is_favorited),
        in_cart_of: flagged(q.is_in_shopping_cart),
        tags: q.tags,
    }
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    OriginalUri(uri): OriginalUri,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<Page<RecipeResponse>>> {
    let q: RecipeListQuery = parse_query(raw.as_deref())?;
    let window = PageParams {
        page: q.page,
        limit: q.limit,
    }
    .resolve(state.config.page_size);
    let viewer = viewer.map(|AuthUser(id)| id);
    let filter = list_filter(q, viewer);

    let (count, rows) = repo::list(&state.db, &filter, window.limit, window.offset()).await?;
    let results = services::assemble(&state, viewer, rows).await?;
    Ok(Json(Page::new(results, count, window, &uri)))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<RecipeResponse>> {
    let view = services::recipe_view(&state, viewer.map(|AuthUser(v)| v), id).await?;
    Ok(Json(view))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RecipeWriteRequest>,
) -> AppResult<(StatusCode, Json<RecipeResponse>)> {
    let view = services::create(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RecipeWriteRequest>,
) -> AppResult<Json<RecipeResponse>> {
    Ok(Json(services::update(&state, user_id, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    services::delete(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark(
    state: &AppState,
    kind: RelationKind,
    user_id: i64,
    recipe_id: i64,
) -> AppResult<(StatusCode, Json<ShortRecipe>)> {
    let store = PgRelationStore::new(state.db.clone());
    relations::services::add(&store, kind, user_id, recipe_id).await?;
    let view = services::short_view(state, recipe_id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn unmark(
    state: &AppState,
    kind: RelationKind,
    user_id: i64,
    recipe_id: i64,
) -> AppResult<StatusCode> {
    let store = PgRelationStore::new(state.db.clone());
    relations::services::remove(&store, kind, user_id, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<ShortRecipe>)> {
    mark(&state, RelationKind::Favorite, user_id, id).await
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    unmark(&state, RelationKind::Favorite, user_id, id).await
}

#[instrument(skip(state))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<ShortRecipe>)> {
    mark(&state, RelationKind::ShoppingCart, user_id, id).await
}

#[instrument(skip(state))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    unmark(&state, RelationKind::ShoppingCart, user_id, id).await
}

#[instrument(skip(state))]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let rows = shopping_list::repo::cart_ingredients(&state.db, user_id).await?;
    let items = shopping_list::aggregate(rows);
    info!(user_id, items = items.len(), "shopping list rendered");

    let body = shopping_list::render_report(&items);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILENAME}\""),
            ),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::recipes::dto::IngredientAmount;

    fn query(raw: &str) -> RecipeListQuery {
        parse_query(Some(raw)).unwrap()
    }

    #[test]
    fn flags_apply_only_for_authenticated_viewers() {
        let q = || query("is_favorited=1&is_in_shopping_cart=1&author=3");
        let anon = list_filter(q(), None);
        assert_eq!(anon.author, Some(3));
        assert_eq!(anon.favorited_by, None);
        assert_eq!(anon.in_cart_of, None);

        let authed = list_filter(q(), Some(9));
        assert_eq!(authed.favorited_by, Some(9));
        assert_eq!(authed.in_cart_of, Some(9));
    }

    #[test]
    fn zero_flags_and_repeated_tags() {
        let f = list_filter(
            query("is_favorited=0&tags=breakfast&tags=lunch"),
            Some(9),
        );
        assert_eq!(f.favorited_by, None);
        assert_eq!(f.tags, vec!["breakfast".to_string(), "lunch".to_string()]);
    }

    #[tokio::test]
    async fn create_with_empty_tags_is_rejected_before_touching_db() {
        let state = AppState::fake();
        let payload = RecipeWriteRequest {
            tags: Some(vec![]),
            ingredients: Some(vec![IngredientAmount { id: 1, amount: 2 }]),
            name: Some("Омлет".into()),
            text: Some("Взбить яйца.".into()),
            cooking_time: Some(10),
            image: None,
        };
        let err = create_recipe(State(state), AuthUser(1), Json(payload))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert!(fields.contains("tags"));
                assert!(fields.contains("image"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_filter_value_is_a_bad_request() {
        let state = AppState::fake();
        let err = list_recipes(
            State(state),
            None,
            OriginalUri("/api/recipes?author=abc".parse().unwrap()),
            RawQuery(Some("author=abc".into())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
