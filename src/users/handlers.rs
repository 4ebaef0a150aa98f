use axum::{
    extract::{OriginalUri, Path, RawQuery, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{
        services::{hash_password, normalize_email, verify_password},
        AuthUser,
    },
    error::{AppError, AppResult, FieldErrors},
    pagination::{Page, PageParams},
    query::parse_query,
    relations::{self, PgRelationStore, RelationKind},
    state::AppState,
    users::{
        dto::{
            CreatedUserResponse, RegisterRequest, SetPasswordRequest, SubscriptionQuery,
            SubscriptionResponse, UserListQuery, UserResponse,
        },
        repo_types::{NewUser, User},
        services::{check_recipes_limit, is_subscribed, subscription_view, user_views},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register))
        .route("/users/me", get(me))
        .route("/users/set_password", post(set_password))
        .route("/users/subscriptions", get(subscriptions))
        .route("/users/:id", get(get_user))
        .route("/users/:id/subscribe", post(subscribe).delete(unsubscribe))
}

async fn load_user(state: &AppState, id: i64) -> AppResult<User> {
    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<CreatedUserResponse>)> {
    payload.email = normalize_email(&payload.email);
    payload.username = payload.username.trim().to_string();
    payload.validate()?;

    let (email_taken, username_taken) =
        User::taken(&state.db, &payload.email, &payload.username).await?;
    if email_taken || username_taken {
        warn!(email = %payload.email, username = %payload.username, "registration conflict");
        let what = if email_taken { "email" } else { "username" };
        return Err(AppError::Conflict(format!("A user with that {what} already exists.")));
    }

    let new = NewUser {
        email: payload.email,
        username: payload.username,
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        password_hash: hash_password(&payload.password)?,
    };
    let user = User::create(&state.db, &new).await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    OriginalUri(uri): OriginalUri,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<Page<UserResponse>>> {
    let q: UserListQuery = parse_query(raw.as_deref())?;
    let window = PageParams {
        page: q.page,
        limit: q.limit,
    }
    .resolve(state.config.page_size);

    let (count, users) = User::list(&state.db, window.limit, window.offset()).await?;
    let viewer = viewer.map(|AuthUser(id)| id);
    let results = user_views(&state, viewer, users).await?;
    Ok(Json(Page::new(results, count, window, &uri)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = load_user(&state, id).await?;
    let subscribed = is_subscribed(&state, viewer.map(|AuthUser(v)| v), user.id).await?;
    Ok(Json(UserResponse::new(user, subscribed)))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("User not found.".into()))?;
    Ok(Json(UserResponse::new(user, false)))
}

#[instrument(skip(state, payload))]
pub async fn set_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SetPasswordRequest>,
) -> AppResult<StatusCode> {
    payload.validate()?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("User not found.".into()))?;
    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(user_id, "set_password with wrong current password");
        return Err(AppError::Validation(FieldErrors::single(
            "current_password",
            "Invalid password.",
        )));
    }

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user_id, &hash).await?;
    info!(user_id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn subscriptions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    OriginalUri(uri): OriginalUri,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<Page<SubscriptionResponse>>> {
    let q: SubscriptionQuery = parse_query(raw.as_deref())?;
    let recipes_limit = check_recipes_limit(q.recipes_limit)?;
    let window = PageParams {
        page: q.page,
        limit: q.limit,
    }
    .resolve(state.config.page_size);

    let (count, authors) =
        User::list_followed(&state.db, user_id, window.limit, window.offset()).await?;
    let mut results = Vec::with_capacity(authors.len());
    for author in authors {
        results.push(subscription_view(&state, author, recipes_limit).await?);
    }
    Ok(Json(Page::new(results, count, window, &uri)))
}

#[instrument(skip(state))]
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(author_id): Path<i64>,
    RawQuery(raw): RawQuery,
) -> AppResult<(StatusCode, Json<SubscriptionResponse>)> {
    let q: SubscriptionQuery = parse_query(raw.as_deref())?;
    let recipes_limit = check_recipes_limit(q.recipes_limit)?;

    let store = PgRelationStore::new(state.db.clone());
    relations::services::add(&store, RelationKind::Follow, user_id, author_id).await?;

    let author = load_user(&state, author_id).await?;
    let view = subscription_view(&state, author, recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(author_id): Path<i64>,
) -> AppResult<StatusCode> {
    let store = PgRelationStore::new(state.db.clone());
    relations::services::remove(&store, RelationKind::Follow, user_id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
