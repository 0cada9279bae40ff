//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification. Individual handler
//! modules own their route documentation; this ties the documented subset
//! together for Swagger UI and the `openapi` binary.

use utoipa::OpenApi;

use crate::web::auth::{AuthResponse, LoginRequest, SignupRequest};
use crate::web::health::{HealthChecks, HealthResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::health::health_handler,
    ),
    components(
        schemas(SignupRequest, LoginRequest, AuthResponse, HealthResponse, HealthChecks)
    ),
    tags(
        (name = "StudyHub API", description = "API endpoints for the student productivity service.")
    )
)]
pub struct ApiDoc;
