use crate::{
    AppState,
    auth::{AdminUser, AlumniUser, Session},
    error::{AppError, RepoError},
    models::{
        AdminDashboardPage, AdminLoginForm, AlumniDashboardPage, AlumniForm, AlumniFormPage,
        FlashLevel, JobForm, JobsPage, LandingPage, LoginPage, UserLoginForm,
    },
    password,
};
use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

pub const ADMIN_DASHBOARD_PATH: &str = "/admin-dashboard";
pub const ALUMNI_DASHBOARD_PATH: &str = "/alumni-dashboard";

/// Current UTC time in the `jobs.date_posted` format.
pub fn timestamp_now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

// --- Public Pages ---

/// index
///
/// [Public Route] Landing page. Reports which roles are signed in.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Landing page", body = LandingPage))
)]
pub async fn index(mut session: Session) -> impl IntoResponse {
    let flashes = session.take_flashes();
    let page = LandingPage {
        admin_username: session.data().admin_username.clone(),
        user_name: session.data().user_name.clone(),
        flashes,
    };
    (session, Json(page))
}

/// view_jobs
///
/// [Public Route] Every job posting, newest first.
#[utoipa::path(
    get,
    path = "/view-jobs",
    responses((status = 200, description = "All postings", body = JobsPage))
)]
pub async fn view_jobs(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<Response, AppError> {
    let jobs = state.repo.list_jobs().await?;
    let flashes = session.take_flashes();
    Ok((session, Json(JobsPage { jobs, flashes })).into_response())
}

// --- Admin Authentication ---

/// admin_login_page
///
/// [Public Route] The admin login form.
#[utoipa::path(
    get,
    path = "/admin-login",
    responses((status = 200, description = "Login form", body = LoginPage))
)]
pub async fn admin_login_page(mut session: Session) -> impl IntoResponse {
    let flashes = session.take_flashes();
    (session, Json(LoginPage { flashes }))
}

/// admin_login
///
/// [Public Route] Checks the username against the `admin` table and the password against the
/// stored salted hash. Success sets `admin_logged_in`/`admin_username` and redirects to the
/// dashboard; failure re-renders the form with 401 and leaves the session identity untouched.
#[utoipa::path(
    post,
    path = "/admin-login",
    request_body(content = AdminLoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in, redirect to /admin-dashboard"),
        (status = 401, description = "Invalid credentials", body = LoginPage)
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<AdminLoginForm>,
) -> Result<Response, AppError> {
    let stored_hash = state
        .repo
        .get_admin(&form.username)
        .await?
        .map(|account| account.password_hash);
    let verified = password::verify_login(
        form.password,
        stored_hash,
        state.config.password_hash_rounds,
    )
    .await?;

    if verified {
        tracing::info!(username = %form.username, "admin signed in");
        session.login_admin(&form.username);
        session.flash(FlashLevel::Success, "Admin logged in");
        return Ok((session, Redirect::to(ADMIN_DASHBOARD_PATH)).into_response());
    }

    tracing::warn!(username = %form.username, "admin sign-in rejected");
    session.flash(FlashLevel::Danger, "Invalid admin credentials");
    let flashes = session.take_flashes();
    Ok((StatusCode::UNAUTHORIZED, session, Json(LoginPage { flashes })).into_response())
}

// --- Admin Pages ---

/// admin_dashboard
///
/// [Admin Route] All alumni (batch_year DESC, name ASC) and all postings (newest first).
#[utoipa::path(
    get,
    path = "/admin-dashboard",
    responses(
        (status = 200, description = "Dashboard", body = AdminDashboardPage),
        (status = 303, description = "Not signed in as admin, redirect to /admin-login")
    )
)]
pub async fn admin_dashboard(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    mut session: Session,
) -> Result<Response, AppError> {
    let alumni = state.repo.list_alumni().await?;
    let jobs = state.repo.list_jobs().await?;
    let flashes = session.take_flashes();
    let page = AdminDashboardPage {
        admin_username: admin.username,
        alumni,
        jobs,
        flashes,
    };
    Ok((session, Json(page)).into_response())
}

/// add_alumni_page
///
/// [Admin Route] Empty add-alumni form.
#[utoipa::path(
    get,
    path = "/add-alumni",
    responses((status = 200, description = "Empty form", body = AlumniFormPage))
)]
pub async fn add_alumni_page(_admin: AdminUser, mut session: Session) -> impl IntoResponse {
    let flashes = session.take_flashes();
    let page = AlumniFormPage {
        flashes,
        ..AlumniFormPage::default()
    };
    (session, Json(page))
}

/// add_alumni
///
/// [Admin Route] Creates an alumni record from the trimmed form. Missing required fields
/// answer 422 and a taken `reg_no` answers 409; both echo the input and write nothing.
#[utoipa::path(
    post,
    path = "/add-alumni",
    request_body(content = AlumniForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created, redirect to /admin-dashboard"),
        (status = 409, description = "Registration number already exists", body = AlumniFormPage),
        (status = 422, description = "Invalid form", body = AlumniFormPage)
    )
)]
pub async fn add_alumni(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AlumniForm>,
) -> Result<Response, AppError> {
    let form = form.trimmed();
    let new = match form.validate() {
        Ok(new) => new,
        Err(message) => {
            return Ok(alumni_form_error(StatusCode::UNPROCESSABLE_ENTITY, session, None, form, message));
        }
    };

    match state.repo.create_alumni(new).await {
        Ok(record) => {
            tracing::info!(admin = %admin.username, id = record.id, reg_no = %record.reg_no, "alumni record created");
            Ok(redirect_with(session, FlashLevel::Success, "Alumni/student added", ADMIN_DASHBOARD_PATH))
        }
        Err(RepoError::Conflict(detail)) => {
            tracing::warn!(reg_no = %form.reg_no, %detail, "alumni insert conflicted");
            Ok(alumni_form_error(
                StatusCode::CONFLICT,
                session,
                None,
                form,
                "Registration number already exists",
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// edit_alumni_page
///
/// [Admin Route] The edit form pre-filled from the stored record.
#[utoipa::path(
    get,
    path = "/edit-alumni/{id}",
    params(("id" = i64, Path, description = "Alumni record ID")),
    responses(
        (status = 200, description = "Pre-filled form", body = AlumniFormPage),
        (status = 303, description = "Record not found, redirect to /admin-dashboard")
    )
)]
pub async fn edit_alumni_page(
    _admin: AdminUser,
    State(state): State<AppState>,
    mut session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(record) = state.repo.get_alumni(id).await? else {
        return Ok(record_not_found(session));
    };
    let flashes = session.take_flashes();
    let page = AlumniFormPage {
        id: Some(id),
        form: AlumniForm::from(&record),
        error: None,
        flashes,
    };
    Ok((session, Json(page)).into_response())
}

/// edit_alumni
///
/// [Admin Route] Replaces every editable column of record `id`. An unknown id redirects with
/// "Record not found" before any write is attempted; validation and conflicts behave as in
/// `add_alumni`.
#[utoipa::path(
    post,
    path = "/edit-alumni/{id}",
    params(("id" = i64, Path, description = "Alumni record ID")),
    request_body(content = AlumniForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated (or not found), redirect to /admin-dashboard"),
        (status = 409, description = "Registration number conflict", body = AlumniFormPage),
        (status = 422, description = "Invalid form", body = AlumniFormPage)
    )
)]
pub async fn edit_alumni(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<AlumniForm>,
) -> Result<Response, AppError> {
    if state.repo.get_alumni(id).await?.is_none() {
        return Ok(record_not_found(session));
    }

    let form = form.trimmed();
    let new = match form.validate() {
        Ok(new) => new,
        Err(message) => {
            return Ok(alumni_form_error(StatusCode::UNPROCESSABLE_ENTITY, session, Some(id), form, message));
        }
    };

    match state.repo.update_alumni(id, new).await {
        Ok(Some(record)) => {
            tracing::info!(admin = %admin.username, id, reg_no = %record.reg_no, "alumni record updated");
            Ok(redirect_with(session, FlashLevel::Success, "Record updated", ADMIN_DASHBOARD_PATH))
        }
        // Deleted between the lookup and the update.
        Ok(None) => Ok(record_not_found(session)),
        Err(RepoError::Conflict(detail)) => {
            tracing::warn!(id, reg_no = %form.reg_no, %detail, "alumni update conflicted");
            Ok(alumni_form_error(
                StatusCode::CONFLICT,
                session,
                Some(id),
                form,
                "Registration number conflict",
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// delete_alumni
///
/// [Admin Route] Deletes record `id`. No existence check: an unknown id is a silent no-op.
#[utoipa::path(
    post,
    path = "/delete-alumni/{id}",
    params(("id" = i64, Path, description = "Alumni record ID")),
    responses((status = 303, description = "Deleted, redirect to /admin-dashboard"))
)]
pub async fn delete_alumni(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.repo.delete_alumni(id).await?;
    tracing::info!(admin = %admin.username, id, "alumni record deleted");
    Ok(redirect_with(session, FlashLevel::Info, "Record deleted", ADMIN_DASHBOARD_PATH))
}

// --- Alumni Authentication ---

/// user_login_page
///
/// [Public Route] The alumni login form.
#[utoipa::path(
    get,
    path = "/user-login",
    responses((status = 200, description = "Login form", body = LoginPage))
)]
pub async fn user_login_page(mut session: Session) -> impl IntoResponse {
    let flashes = session.take_flashes();
    (session, Json(LoginPage { flashes }))
}

/// user_login
///
/// [Public Route] Signs an alumni in when the trimmed registration number and date of birth
/// both equal a stored record's. These are plain column comparisons: the pair is not a
/// secret-grade credential, and anyone who knows both values can sign in.
#[utoipa::path(
    post,
    path = "/user-login",
    request_body(content = UserLoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in, redirect to /alumni-dashboard"),
        (status = 401, description = "Invalid register number or DOB", body = LoginPage)
    )
)]
pub async fn user_login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<UserLoginForm>,
) -> Result<Response, AppError> {
    let reg_no = form.reg_no.trim();
    let dob = form.dob.trim();

    match state.repo.find_alumni_by_credentials(reg_no, dob).await? {
        Some(record) => {
            tracing::info!(reg_no = %reg_no, "alumni signed in");
            session.login_user(reg_no, &record.name);
            session.flash(FlashLevel::Success, format!("Logged in as {}", record.name));
            Ok((session, Redirect::to(ALUMNI_DASHBOARD_PATH)).into_response())
        }
        None => {
            tracing::warn!(reg_no = %reg_no, "alumni sign-in rejected");
            session.flash(FlashLevel::Danger, "Invalid register number or DOB");
            let flashes = session.take_flashes();
            Ok((StatusCode::UNAUTHORIZED, session, Json(LoginPage { flashes })).into_response())
        }
    }
}

// --- Alumni Pages ---

/// alumni_dashboard
///
/// [Alumni Route] Every posting plus an empty new-posting form.
#[utoipa::path(
    get,
    path = "/alumni-dashboard",
    responses(
        (status = 200, description = "Dashboard", body = AlumniDashboardPage),
        (status = 303, description = "Not signed in as alumni, redirect to /user-login")
    )
)]
pub async fn alumni_dashboard(
    AlumniUser(user): AlumniUser,
    State(state): State<AppState>,
    mut session: Session,
) -> Result<Response, AppError> {
    let jobs = state.repo.list_jobs().await?;
    let flashes = session.take_flashes();
    let page = AlumniDashboardPage {
        user_name: user.name,
        user_reg_no: user.reg_no,
        jobs,
        form: JobForm::default(),
        error: None,
        flashes,
    };
    Ok((session, Json(page)).into_response())
}

/// post_job
///
/// [Alumni Route] Publishes a posting. `posted_by` is "<name> (<reg_no>)" from the session and
/// `date_posted` is the current UTC time; neither is taken from the form.
#[utoipa::path(
    post,
    path = "/alumni-dashboard",
    request_body(content = JobForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Posted, redirect to /alumni-dashboard"),
        (status = 422, description = "Title missing", body = AlumniDashboardPage)
    )
)]
pub async fn post_job(
    AlumniUser(user): AlumniUser,
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<JobForm>,
) -> Result<Response, AppError> {
    let form = form.trimmed();
    let new = match form.validate(user.posted_by(), timestamp_now()) {
        Ok(new) => new,
        Err(message) => {
            let jobs = state.repo.list_jobs().await?;
            let flashes = session.take_flashes();
            let page = AlumniDashboardPage {
                user_name: user.name,
                user_reg_no: user.reg_no,
                jobs,
                form,
                error: Some(message),
                flashes,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, session, Json(page)).into_response());
        }
    };

    let job = state.repo.create_job(new).await?;
    tracing::info!(id = job.id, reg_no = %user.reg_no, "job posting created");
    Ok(redirect_with(session, FlashLevel::Success, "Job/internship posted", ALUMNI_DASHBOARD_PATH))
}

// --- Logout ---

/// logout
///
/// [Public Route] Clears both roles' session keys. Idempotent when nobody is signed in.
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Signed out, redirect to /"))
)]
pub async fn logout(mut session: Session) -> Response {
    session.logout();
    redirect_with(session, FlashLevel::Info, "Logged out", "/")
}

// --- Response Helpers ---

fn redirect_with(mut session: Session, level: FlashLevel, message: &str, to: &str) -> Response {
    session.flash(level, message);
    (session, Redirect::to(to)).into_response()
}

fn record_not_found(session: Session) -> Response {
    redirect_with(session, FlashLevel::Danger, "Record not found", ADMIN_DASHBOARD_PATH)
}

fn alumni_form_error(
    status: StatusCode,
    mut session: Session,
    id: Option<i64>,
    form: AlumniForm,
    error: impl Into<String>,
) -> Response {
    let flashes = session.take_flashes();
    let page = AlumniFormPage {
        id,
        form,
        error: Some(error.into()),
        flashes,
    };
    (status, session, Json(page)).into_response()
}
