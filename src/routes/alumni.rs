use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Alumni Router Module
///
/// The signed-in alumni's dashboard. Guarded by `require_alumni`; `posted_by` for new
/// postings is derived from the session identity the gate resolved.
pub fn alumni_routes() -> Router<AppState> {
    Router::new()
        // GET,POST /alumni-dashboard
        // GET lists postings, POST publishes a new one.
        .route(
            "/alumni-dashboard",
            get(handlers::alumni_dashboard).post(handlers::post_job),
        )
}
