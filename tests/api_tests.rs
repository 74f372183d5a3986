use alumni_portal::{
    AppConfig, AppState,
    auth::MAX_FLASHES,
    create_router,
    models::{AdminDashboardPage, AlumniFormPage, JobsPage, LandingPage, LoginPage, NewJobPosting},
    repository::{self, Repository, RepositoryState, SqliteRepository},
};
use reqwest::{Client, StatusCode, header, redirect::Policy};
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub repo: RepositoryState,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Serves the full router over a private in-memory database, bootstrapped exactly as at
/// process start.
async fn spawn_app() -> TestApp {
    let config = AppConfig::default();
    let sqlite = SqliteRepository::connect(&config.db_url, config.db_max_connections)
        .await
        .expect("Failed to open in-memory SQLite database");
    let repo = Arc::new(sqlite) as RepositoryState;
    repository::bootstrap(repo.as_ref(), &config)
        .await
        .expect("Failed to bootstrap test database");

    let router = create_router(AppState {
        repo: repo.clone(),
        config,
    });

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

/// A browser-like client: keeps the session cookie, does not follow redirects.
fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap()
}

fn location(response: &reqwest::Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn login_admin(app: &TestApp, client: &Client) {
    let response = client
        .post(app.url("/admin-login"))
        .form(&[("username", "admin"), ("password", "admin123")])
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-dashboard");
}

async fn add_jane(app: &TestApp, client: &Client) -> reqwest::Response {
    client
        .post(app.url("/add-alumni"))
        .form(&[
            ("name", "Jane Doe"),
            ("reg_no", "R100"),
            ("dob", "2000-01-01"),
            ("email", ""),
            ("batch_year", "2022"),
            ("department", "CSE"),
        ])
        .send()
        .await
        .expect("req fail")
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = browser()
        .get(app.url("/health"))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_admin_adds_alumni_who_then_signs_in() {
    let app = spawn_app().await;
    let admin = browser();

    login_admin(&app, &admin).await;

    let response = add_jane(&app, &admin).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-dashboard");

    let dashboard: AdminDashboardPage = admin
        .get(app.url("/admin-dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard.admin_username, "admin");
    assert_eq!(dashboard.alumni.len(), 1);
    assert_eq!(dashboard.alumni[0].name, "Jane Doe");
    assert_eq!(dashboard.alumni[0].reg_no, "R100");
    assert_eq!(dashboard.alumni[0].email, None);
    // The flashes queued by login and add are both shown, then drained.
    let messages: Vec<&str> = dashboard.flashes.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(messages, vec!["Admin logged in", "Alumni/student added"]);

    // Wrong date of birth.
    let alumni = browser();
    let rejected = alumni
        .post(app.url("/user-login"))
        .form(&[("reg_no", "R100"), ("dob", "2000-01-02")])
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    let page: LoginPage = rejected.json().await.unwrap();
    assert_eq!(page.flashes[0].message, "Invalid register number or DOB");

    let accepted = alumni
        .post(app.url("/user-login"))
        .form(&[("reg_no", "R100"), ("dob", "2000-01-01")])
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&accepted), "/alumni-dashboard");

    let landing: LandingPage = alumni.get(app.url("/")).send().await.unwrap().json().await.unwrap();
    assert_eq!(landing.user_name.as_deref(), Some("Jane Doe"));
    assert_eq!(landing.admin_username, None);
}

#[tokio::test]
async fn test_posted_job_appears_above_older_postings() {
    let app = spawn_app().await;
    app.repo
        .create_job(NewJobPosting {
            title: "Graduate Engineer".to_string(),
            posted_by: "John Roe (R001)".to_string(),
            date_posted: "2020-01-01T00:00:00.000000".to_string(),
            ..NewJobPosting::default()
        })
        .await
        .unwrap();

    let admin = browser();
    login_admin(&app, &admin).await;
    add_jane(&app, &admin).await;

    let alumni = browser();
    alumni
        .post(app.url("/user-login"))
        .form(&[("reg_no", "R100"), ("dob", "2000-01-01")])
        .send()
        .await
        .unwrap();

    let response = alumni
        .post(app.url("/alumni-dashboard"))
        .form(&[("title", "Intern"), ("company", "Acme"), ("description", ""), ("link", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/alumni-dashboard");

    // The job board is public.
    let board: JobsPage = browser()
        .get(app.url("/view-jobs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<&str> = board.jobs.iter().map(|j| j.title.as_str()).collect();
    assert_eq!(titles, vec!["Intern", "Graduate Engineer"]);
    assert_eq!(board.jobs[0].posted_by.as_deref(), Some("Jane Doe (R100)"));
    assert_eq!(board.jobs[0].company.as_deref(), Some("Acme"));
    assert_eq!(board.jobs[0].description, None);
}

#[tokio::test]
async fn test_anonymous_requests_to_gated_routes_redirect_to_login() {
    let app = spawn_app().await;

    for path in ["/admin-dashboard", "/add-alumni", "/edit-alumni/1"] {
        let response = browser().get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/admin-login", "{path}");
    }

    let client = browser();
    let response = client.get(app.url("/alumni-dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/user-login");

    // The warning travels with the session to the login page.
    let page: LoginPage = client
        .get(app.url("/user-login"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page.flashes.len(), 1);
    assert_eq!(page.flashes[0].message, "Please login as alumni to continue");
}

#[tokio::test]
async fn test_repeated_denials_do_not_grow_the_session_unbounded() {
    let app = spawn_app().await;
    let client = browser();

    // Never following the redirect means the warnings are never drained.
    for _ in 0..20 {
        let response = client.get(app.url("/admin-dashboard")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let page: LoginPage = client
        .get(app.url("/admin-login"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page.flashes.len(), MAX_FLASHES);
    assert!(page.flashes.iter().all(|f| f.message == "Please login as admin"));
}

#[tokio::test]
async fn test_alumni_cannot_reach_admin_routes() {
    let app = spawn_app().await;
    let admin = browser();
    login_admin(&app, &admin).await;
    add_jane(&app, &admin).await;

    let alumni = browser();
    alumni
        .post(app.url("/user-login"))
        .form(&[("reg_no", "R100"), ("dob", "2000-01-01")])
        .send()
        .await
        .unwrap();

    let response = alumni.get(app.url("/admin-dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-login");
}

#[tokio::test]
async fn test_anonymous_delete_changes_nothing() {
    let app = spawn_app().await;
    let admin = browser();
    login_admin(&app, &admin).await;
    add_jane(&app, &admin).await;
    let id = app.repo.list_alumni().await.unwrap()[0].id;

    let response = browser()
        .post(app.url(&format!("/delete-alumni/{id}")))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-login");
    assert!(app.repo.get_alumni(id).await.unwrap().is_some());

    // The signed-in admin can.
    let response = admin
        .post(app.url(&format!("/delete-alumni/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.repo.get_alumni(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_registration_number_is_rejected() {
    let app = spawn_app().await;
    let admin = browser();
    login_admin(&app, &admin).await;
    add_jane(&app, &admin).await;

    let response = add_jane(&app, &admin).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let page: AlumniFormPage = response.json().await.unwrap();
    assert_eq!(page.error.as_deref(), Some("Registration number already exists"));
    assert_eq!(page.form.name, "Jane Doe");
    assert_eq!(app.repo.list_alumni().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_edit_then_logout_relocks_admin_routes() {
    let app = spawn_app().await;
    let admin = browser();
    login_admin(&app, &admin).await;
    add_jane(&app, &admin).await;
    let id = app.repo.list_alumni().await.unwrap()[0].id;

    let response = admin
        .post(app.url(&format!("/edit-alumni/{id}")))
        .form(&[
            ("name", "Jane Smith"),
            ("reg_no", "R100"),
            ("dob", "2000-01-01"),
            ("email", "jane@example.com"),
            ("batch_year", ""),
            ("department", ""),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let stored = app.repo.get_alumni(id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Jane Smith");
    assert_eq!(stored.email.as_deref(), Some("jane@example.com"));
    assert_eq!(stored.batch_year, None);

    let response = admin.get(app.url("/logout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = admin.get(app.url("/admin-dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-login");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let doc: serde_json::Value = browser()
        .get(app.url("/api-docs/openapi.json"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(doc["paths"]["/alumni-dashboard"]["post"].is_object());
    assert!(doc["paths"]["/edit-alumni/{id}"]["get"].is_object());
}
