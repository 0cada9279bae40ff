//! services/api/src/web/wallet.rs
//!
//! Handlers for the expense ledger and the derived wallet profile.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Serialize;
use std::sync::Arc;
use studyhub_core::domain::{Expense, NewExpense, WalletProfile};

use crate::error::HttpError;
use crate::web::middleware::CurrentAccount;
use crate::web::state::AppState;

#[derive(Serialize)]
pub struct WalletResponse {
    pub profile: WalletProfile,
    pub expenses: Vec<Expense>,
}

#[derive(Serialize)]
pub struct RecordExpenseResponse {
    pub expense: Expense,
    pub profile: WalletProfile,
}

/// GET /expense - The wallet profile (created lazily at zero) and the
/// ledger, newest entries first.
pub async fn wallet_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
) -> Result<Json<WalletResponse>, HttpError> {
    let profile = state.store.get_or_create_wallet(owner).await?;
    let expenses = state.store.list_expenses(owner).await?;
    Ok(Json(WalletResponse { profile, expenses }))
}

/// POST /expense - Append a ledger entry and fold it into the wallet.
///
/// The two writes commit or roll back together, so `balance` always equals
/// `income - expenses` afterwards.
pub async fn record_expense_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Json(req): Json<NewExpense>,
) -> Result<impl IntoResponse, HttpError> {
    let (expense, profile) = state.store.record_expense(owner, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(RecordExpenseResponse { expense, profile }),
    ))
}
