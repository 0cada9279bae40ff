//! services/api/src/web/notes.rs
//!
//! Handlers for notes: CRUD, download, and the sharing endpoints.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studyhub_core::domain::{NewNote, ShareAction, SharedNote, SharedNoteView};
use studyhub_core::ports::PortError;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::middleware::CurrentAccount;
use crate::web::state::AppState;

pub async fn list_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
) -> Result<impl IntoResponse, HttpError> {
    let notes = state.store.list_notes(owner).await?;
    Ok(Json(notes))
}

pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Json(req): Json<NewNote>,
) -> Result<impl IntoResponse, HttpError> {
    let note = state.store.create_note(owner, req).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Note detail admits the owner, grantees, and anyone for public notes;
/// everything else is a plain 404.
pub async fn get_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(requester)): Extension<CurrentAccount>,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let note = state.store.get_note(requester, note_id).await?;
    Ok(Json(note))
}

pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    state.store.delete_note(owner, note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /note/{id}/download - Export a visible note as a document attachment.
pub async fn download_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(requester)): Extension<CurrentAccount>,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    // Same visibility rule as note detail.
    let note = state.store.get_note(requester, note_id).await?;
    let body = state.exporter.render(&note)?;
    let disposition = format!(
        "attachment; filename=\"note-{}.{}\"",
        note.id,
        state.exporter.file_extension()
    );
    Ok((
        [
            (header::CONTENT_TYPE, state.exporter.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

//=========================================================================================
// Sharing
//=========================================================================================

#[derive(Deserialize)]
pub struct ShareRequest {
    pub username: Option<String>,
    #[serde(default)]
    pub make_public: bool,
}

#[derive(Serialize)]
pub struct SharedNotesResponse {
    pub shared_with_me: Vec<SharedNoteView>,
    pub my_shared_notes: Vec<SharedNoteView>,
}

/// POST /share-note/{id} - Share one of your notes.
///
/// `make_public` wins over `username` when both are set. Publishing is
/// monotonic: there is no unpublish endpoint.
pub async fn share_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(sharer)): Extension<CurrentAccount>,
    Path(note_id): Path<Uuid>,
    Json(req): Json<ShareRequest>,
) -> Result<Json<SharedNote>, HttpError> {
    let action = if req.make_public {
        ShareAction::MakePublic
    } else if let Some(username) = req.username {
        ShareAction::GrantTo(username)
    } else {
        return Err(PortError::validation(
            "username",
            "either a username or make_public is required",
        )
        .into());
    };

    let share = state.store.share_note(sharer, note_id, action).await?;
    Ok(Json(share))
}

/// GET /shared-notes - Notes shared with you and your own shares.
pub async fn shared_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<SharedNotesResponse>, HttpError> {
    let shared_with_me = state.store.shared_with_me(account).await?;
    let my_shared_notes = state.store.my_shared_notes(account).await?;
    Ok(Json(SharedNotesResponse {
        shared_with_me,
        my_shared_notes,
    }))
}
