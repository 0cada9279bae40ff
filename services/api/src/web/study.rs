//! services/api/src/web/study.rs
//!
//! Handlers for the study timer and the progress dashboard. The dashboard
//! is recomputed per request by the pure aggregation functions in the core
//! crate; nothing is materialized.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use studyhub_core::domain::{Homework, NewStudySession, StudySession};
use studyhub_core::stats::{self, ProgressReport};
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::middleware::CurrentAccount;
use crate::web::state::AppState;

/// How many sessions the timer page lists.
const RECENT_SESSIONS: usize = 10;
/// How many recent items the dashboard shows.
const DASHBOARD_RECENTS: usize = 5;

#[derive(Serialize)]
pub struct StudyTimerResponse {
    pub sessions: Vec<StudySession>,
    pub total_today_minutes: i64,
}

#[derive(Serialize)]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub report: ProgressReport,
    pub recent_sessions: Vec<StudySession>,
    pub recent_homework: Vec<Homework>,
}

/// GET /study-timer - Recent sessions plus today's completed minutes.
pub async fn study_timer_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
) -> Result<Json<StudyTimerResponse>, HttpError> {
    let sessions = state.store.list_study_sessions(owner).await?;
    let total_today_minutes = stats::minutes_on(&sessions, Utc::now().date_naive());
    Ok(Json(StudyTimerResponse {
        sessions: sessions.into_iter().take(RECENT_SESSIONS).collect(),
        total_today_minutes,
    }))
}

/// POST /study-timer - Start a session (in progress until completed).
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Json(req): Json<NewStudySession>,
) -> Result<impl IntoResponse, HttpError> {
    let session = state.store.create_study_session(owner, req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /complete-session/{id} - One-way completion; repeats are no-ops.
pub async fn complete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let session = state.store.complete_study_session(owner, session_id).await?;
    Ok(Json(session))
}

/// DELETE /delete-session/{id}
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    state.store.delete_study_session(owner, session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /progress - The aggregation dashboard, scoped to the caller.
pub async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
) -> Result<Json<ProgressResponse>, HttpError> {
    let homework = state.store.list_homework(owner).await?;
    let todos = state.store.list_todos(owner).await?;
    let sessions = state.store.list_study_sessions(owner).await?;
    let notes = state.store.list_notes(owner).await?;

    let report = stats::progress_report(
        &homework,
        &todos,
        &sessions,
        notes.len(),
        Utc::now().date_naive(),
    );

    // Most recent homework by due date, latest first.
    let mut recent_homework = homework;
    recent_homework.sort_by(|a, b| b.due_at.cmp(&a.due_at));
    recent_homework.truncate(DASHBOARD_RECENTS);

    Ok(Json(ProgressResponse {
        report,
        recent_sessions: sessions.into_iter().take(DASHBOARD_RECENTS).collect(),
        recent_homework,
    }))
}
