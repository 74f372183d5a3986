use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Alumni record management. `create_router` layers `require_admin` over this router, so
/// a visitor without `admin_logged_in` is redirected to `/admin-login` before any handler runs.
/// The handlers additionally take the `AdminUser` extractor to learn who is acting.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin-dashboard
        // All alumni records and all job postings.
        .route("/admin-dashboard", get(handlers::admin_dashboard))
        // GET,POST /add-alumni
        .route(
            "/add-alumni",
            get(handlers::add_alumni_page).post(handlers::add_alumni),
        )
        // GET,POST /edit-alumni/{id}
        // Unknown ids redirect back to the dashboard with "Record not found".
        .route(
            "/edit-alumni/{id}",
            get(handlers::edit_alumni_page).post(handlers::edit_alumni),
        )
        // POST /delete-alumni/{id}
        // Idempotent: deleting an unknown id still succeeds.
        .route("/delete-alumni/{id}", post(handlers::delete_alumni))
}
