//! Article handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use portal_core::models::content::ArticleRecord;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::ArticleQuery;

/// `GET /api/articles/{slug}?lang=en|ar`: fetch an article from the content source.
pub async fn get_article_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ArticleQuery>,
) -> AppResult<Json<ArticleRecord>> {
    let language = query.language();
    state
        .articles
        .fetch_article(&slug, language)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("article '{slug}' ({language})")))
}
