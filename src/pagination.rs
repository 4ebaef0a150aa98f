use axum::http::Uri;
use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: i64 = 100;

/// `page` is 1-based; `limit` falls back to the configured page size.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn resolve(&self, default_limit: i64) -> PageWindow {
        let limit = self
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(default_limit)
            .min(MAX_PAGE_SIZE);
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        PageWindow { page, limit }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl PageWindow {
    /// Saturates for absurd page numbers; such pages are simply empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Builds the envelope; links keep every other query parameter of `uri`.
    pub fn new(results: Vec<T>, count: i64, window: PageWindow, uri: &Uri) -> Self {
        let next = (window.page.saturating_mul(window.limit) < count)
            .then(|| page_link(uri, window.page + 1));
        let previous = (window.page > 1).then(|| page_link(uri, window.page - 1));
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

fn page_link(uri: &Uri, page: i64) -> String {
    let mut pairs: Vec<(String, String)> = uri
        .query()
        .and_then(|q| serde_html_form::from_str(q).ok())
        .unwrap_or_default();
    pairs.retain(|(k, _)| k != "page");
    pairs.push(("page".into(), page.to_string()));
    let query = serde_html_form::to_string(&pairs).unwrap_or_default();
    format!("{}?{}", uri.path(), query)
}
