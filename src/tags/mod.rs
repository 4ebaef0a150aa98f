pub mod handlers;
pub mod repo;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::state::AppState;
use axum::Router;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::tag_routes())
}
