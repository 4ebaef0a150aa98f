use crate::{
    error::{AppError, AppResult, FieldErrors},
    recipes,
    state::AppState,
    users::{
        dto::{SubscriptionResponse, UserResponse},
        repo_types::User,
    },
};

/// Rejects negative `recipes_limit` values; `None` means no cap.
pub fn check_recipes_limit(limit: Option<i64>) -> AppResult<Option<i64>> {
    match limit {
        Some(n) if n < 0 => Err(AppError::Validation(FieldErrors::single(
            "recipes_limit",
            "Ensure this value is greater than or equal to 0.",
        ))),
        other => Ok(other),
    }
}

/// Whether `viewer` follows `author`; anonymous viewers and self-views are never subscribed.
pub async fn is_subscribed(state: &AppState, viewer: Option<i64>, author: i64) -> AppResult<bool> {
    match viewer {
        Some(v) if v != author => Ok(User::followed_among(&state.db, v, &[author])
            .await?
            .contains(&author)),
        _ => Ok(false),
    }
}

pub async fn user_views(
    state: &AppState,
    viewer: Option<i64>,
    users: Vec<User>,
) -> AppResult<Vec<UserResponse>> {
    let followed = match viewer {
        Some(v) => {
            let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
            User::followed_among(&state.db, v, &ids).await?
        }
        None => Default::default(),
    };
    Ok(users
        .into_iter()
        .map(|u| {
            let subscribed = followed.contains(&u.id);
            UserResponse::new(u, subscribed)
        })
        .collect())
}

pub async fn subscription_view(
    state: &AppState,
    author: User,
    recipes_limit: Option<i64>,
) -> AppResult<SubscriptionResponse> {
    let rows = recipes::repo::short_by_author(&state.db, author.id, recipes_limit).await?;
    let recipes_count = recipes::repo::count_by_author(&state.db, author.id).await?;
    let recipes = recipes::services::short_views(state, rows).await?;
    Ok(SubscriptionResponse {
        user: UserResponse::new(author, true),
        recipes,
        recipes_count,
    })
}
