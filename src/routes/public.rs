use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session. Both login forms live here; everything they
/// unlock lives in the gated routers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers and container orchestration.
        .route("/health", get(|| async { "ok" }))
        // GET /
        .route("/", get(handlers::index))
        // GET /view-jobs
        // The public job board, newest posting first.
        .route("/view-jobs", get(handlers::view_jobs))
        // GET,POST /admin-login
        .route(
            "/admin-login",
            get(handlers::admin_login_page).post(handlers::admin_login),
        )
        // GET,POST /user-login
        // Alumni sign in with registration number + date of birth.
        .route(
            "/user-login",
            get(handlers::user_login_page).post(handlers::user_login),
        )
        // GET /logout
        // Clears both roles. Safe to call when not signed in.
        .route("/logout", get(handlers::logout))
}
