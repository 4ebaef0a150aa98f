use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RefreshRequest, TokenResponse},
        services::{is_valid_email, normalize_email, verify_password, JwtKeys},
    },
    error::{AppError, AppResult},
    state::AppState,
    users::repo_types::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token/login", post(login))
        .route("/auth/token/refresh", post(refresh))
}

fn issue_pair(keys: &JwtKeys, user_id: i64) -> AppResult<TokenResponse> {
    Ok(TokenResponse {
        auth_token: keys.sign_access(user_id)?,
        refresh_token: keys.sign_refresh(user_id)?,
    })
}

fn invalid_credentials() -> AppError {
    AppError::BadRequest("Unable to log in with provided credentials.".into())
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let email = normalize_email(&payload.email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(invalid_credentials());
    }

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid_credentials());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    let pair = issue_pair(&JwtKeys::from_ref(&state), user.id)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(pair))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

    if User::find_by_id(&state.db, claims.sub).await?.is_none() {
        warn!(user_id = claims.sub, "refresh for deleted user");
        return Err(AppError::Unauthenticated("User not found.".into()));
    }

    Ok(Json(issue_pair(&keys, claims.sub)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn refresh_rejects_access_token_before_touching_db() {
        let state = AppState::fake();
        let access = JwtKeys::from_ref(&state).sign_access(3).unwrap();
        let err = refresh(
            State(state),
            Json(RefreshRequest {
                refresh_token: access,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_rejects_malformed_email_before_touching_db() {
        let state = AppState::fake();
        let err = login(
            State(state),
            Json(LoginRequest {
                email: "not-an-email".into(),
                password: "whatever1".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn token_response_serialization() {
        let json = serde_json::to_value(TokenResponse {
            auth_token: "a".into(),
            refresh_token: "r".into(),
        })
        .unwrap();
        assert_eq!(json["auth_token"], "a");
        assert_eq!(json["refresh_token"], "r");
    }
}
