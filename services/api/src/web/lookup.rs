//! services/api/src/web/lookup.rs
//!
//! Handlers for the reference-lookup pages: dictionary, encyclopedia, and
//! book search. These are thin passthroughs; a failing upstream surfaces
//! as a retryable error, never a crash.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use studyhub_core::domain::{BookResult, DictionaryEntry, EncyclopediaPage};

use crate::error::HttpError;
use crate::web::middleware::CurrentAccount;
use crate::web::state::AppState;

#[derive(Deserialize)]
pub struct WordQuery {
    pub word: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /dictionary?word=...
pub async fn dictionary_handler(
    State(state): State<Arc<AppState>>,
    Extension(_account): Extension<CurrentAccount>,
    Query(query): Query<WordQuery>,
) -> Result<Json<DictionaryEntry>, HttpError> {
    let entry = state.dictionary.define(&query.word).await?;
    Ok(Json(entry))
}

/// GET /wiki?q=...
pub async fn wiki_handler(
    State(state): State<Arc<AppState>>,
    Extension(_account): Extension<CurrentAccount>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<EncyclopediaPage>, HttpError> {
    let page = state.encyclopedia.summarize(&query.q).await?;
    Ok(Json(page))
}

/// GET /books?q=...
pub async fn books_handler(
    State(state): State<Arc<AppState>>,
    Extension(_account): Extension<CurrentAccount>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<BookResult>>, HttpError> {
    let results = state.books.search(&query.q).await?;
    Ok(Json(results))
}
