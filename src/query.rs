use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// Parses a raw query string, allowing repeated keys (`tags=a&tags=b`).
pub fn parse_query<T: DeserializeOwned>(raw: Option<&str>) -> AppResult<T> {
    serde_html_form::from_str(raw.unwrap_or_default())
        .map_err(|e| AppError::BadRequest(format!("Invalid query parameters: {e}")))
}
