//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DictionaryApiAdapter, DisabledChatAdapter, GeminiChatAdapter, GoogleBooksAdapter,
        PgStore, TextExporter, WikipediaAdapter,
    },
    config::Config,
    error::ApiError,
    web::{build_router, rest::ApiDoc, state::AppState},
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use studyhub_core::ports::ChatService;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    // One HTTP client is shared across every outbound adapter so they all
    // inherit the configured timeout and connection pool.
    let http = reqwest::Client::builder()
        .timeout(config.external_timeout)
        .build()
        .map_err(|e| ApiError::Internal(format!("failed to build HTTP client: {e}")))?;

    let chat: Arc<dyn ChatService> = match config.gemini_api_key.clone() {
        Some(api_key) => Arc::new(GeminiChatAdapter::new(
            http.clone(),
            api_key,
            config.chat_model.clone(),
        )),
        None => {
            warn!("GEMINI_API_KEY not set; the chatbot endpoint will report unavailable");
            Arc::new(DisabledChatAdapter)
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        config: config.clone(),
        chat,
        dictionary: Arc::new(DictionaryApiAdapter::new(http.clone())),
        encyclopedia: Arc::new(WikipediaAdapter::new(http.clone())),
        books: Arc::new(GoogleBooksAdapter::new(http)),
        exporter: Arc::new(TextExporter),
    });

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().map_err(|e| {
            ApiError::Internal(format!("invalid CORS origin: {e}"))
        })?)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = build_router(app_state).layer(cors);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
