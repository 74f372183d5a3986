use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;

// Routing segregated by gate (public, admin, alumni).
pub mod routes;
use routes::{admin, alumni, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, RepoError};
pub use repository::{RepositoryState, SqliteRepository};

/// ApiDoc
///
/// OpenAPI document for every endpoint, served at `/api-docs/openapi.json` and browsable
/// through Swagger UI at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index, handlers::view_jobs, handlers::admin_login_page, handlers::admin_login,
        handlers::admin_dashboard, handlers::add_alumni_page, handlers::add_alumni,
        handlers::edit_alumni_page, handlers::edit_alumni, handlers::delete_alumni,
        handlers::user_login_page, handlers::user_login, handlers::alumni_dashboard,
        handlers::post_job, handlers::logout
    ),
    components(
        schemas(
            models::AlumniRecord, models::JobPosting, models::AlumniForm, models::JobForm,
            models::AdminLoginForm, models::UserLoginForm, models::Flash, models::FlashLevel,
            models::LandingPage, models::JobsPage, models::LoginPage, models::AdminDashboardPage,
            models::AlumniFormPage, models::AlumniDashboardPage,
        )
    ),
    tags(
        (name = "alumni-portal", description = "Alumni records and job board")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared, immutable per-process state. Everything request-scoped (the session, the
/// submitted form) is passed to handlers explicitly as extractors.
#[derive(Clone)]
pub struct AppState {
    /// Store access through the `Repository` trait object.
    pub repo: RepositoryState,
    /// The loaded configuration (session secret, cookie flags, hash cost).
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, wraps the admin and alumni routers in their gate
/// middleware, and applies the request-id and tracing layers.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Admin Routes: every request must pass the admin gate first.
        .merge(
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_admin,
            )),
        )
        // Alumni Routes: every request must pass the alumni gate first.
        .merge(
            alumni::alumni_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_alumni,
            )),
        )
        .with_state(state);

    base_router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by `SetRequestIdLayer`
/// so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
