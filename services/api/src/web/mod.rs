pub mod auth;
pub mod chatbot;
pub mod health;
pub mod lookup;
pub mod middleware;
pub mod notes;
pub mod rest;
pub mod state;
pub mod study;
pub mod tasks;
pub mod wallet;

pub use middleware::require_auth;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use state::AppState;

/// Builds the application router. Every route is mounted twice: at the
/// root and under `/api/v1`, so older clients keep working while new ones
/// use the versioned prefix.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/health", get(health::health_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/notes",
            get(notes::list_notes_handler).post(notes::create_note_handler),
        )
        .route(
            "/notes/{id}",
            get(notes::get_note_handler).delete(notes::delete_note_handler),
        )
        .route("/note/{id}/download", get(notes::download_note_handler))
        .route("/share-note/{id}", post(notes::share_note_handler))
        .route("/shared-notes", get(notes::shared_notes_handler))
        .route(
            "/homework",
            get(tasks::list_homework_handler).post(tasks::create_homework_handler),
        )
        .route("/homework/{id}/toggle", post(tasks::toggle_homework_handler))
        .route("/homework/{id}", delete(tasks::delete_homework_handler))
        .route(
            "/todo",
            get(tasks::list_todos_handler).post(tasks::create_todo_handler),
        )
        .route("/todo/{id}/toggle", post(tasks::toggle_todo_handler))
        .route("/todo/{id}", delete(tasks::delete_todo_handler))
        .route(
            "/expense",
            get(wallet::wallet_handler).post(wallet::record_expense_handler),
        )
        .route(
            "/study-timer",
            get(study::study_timer_handler).post(study::create_session_handler),
        )
        .route(
            "/complete-session/{id}",
            post(study::complete_session_handler),
        )
        .route("/delete-session/{id}", delete(study::delete_session_handler))
        .route("/progress", get(study::progress_handler))
        .route(
            "/chatbot",
            get(chatbot::chat_history_handler).post(chatbot::chatbot_handler),
        )
        .route("/chatbot/clear", get(chatbot::clear_chat_handler))
        .route("/dictionary", get(lookup::dictionary_handler))
        .route("/wiki", get(lookup::wiki_handler))
        .route("/books", get(lookup::books_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let routes = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .merge(routes.clone())
        .nest("/api/v1", routes)
        .with_state(state)
}
