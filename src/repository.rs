use crate::{
    config::AppConfig,
    error::{AppError, RepoError},
    models::{AdminAccount, AlumniRecord, JobPosting, NewAlumni, NewJobPosting},
    password,
};
use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, sync::Arc, time::Duration};

/// Repository Trait
///
/// The contract for every persistence operation. Handlers only see `Arc<dyn Repository>`,
/// so tests can swap the SQLite store for an in-process mock.
///
/// Every write replaces the full set of editable columns; nothing is partially updated.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Schema & Bootstrap ---
    async fn create_schema(&self) -> Result<(), RepoError>;
    // Inserts the admin unless the username exists. Returns true if a row was inserted.
    async fn seed_admin(&self, username: &str, password_hash: &str) -> Result<bool, RepoError>;

    // --- Admin Accounts ---
    async fn get_admin(&self, username: &str) -> Result<Option<AdminAccount>, RepoError>;

    // --- Alumni Records ---
    // Ordered by batch_year DESC, then name ASC.
    async fn list_alumni(&self) -> Result<Vec<AlumniRecord>, RepoError>;
    async fn get_alumni(&self, id: i64) -> Result<Option<AlumniRecord>, RepoError>;
    // Exact match on both columns; this pair is the alumni login credential.
    async fn find_alumni_by_credentials(
        &self,
        reg_no: &str,
        dob: &str,
    ) -> Result<Option<AlumniRecord>, RepoError>;
    // Fails with RepoError::Conflict when reg_no is taken.
    async fn create_alumni(&self, new: NewAlumni) -> Result<AlumniRecord, RepoError>;
    // None when the id does not exist. Conflict as for create.
    async fn update_alumni(&self, id: i64, new: NewAlumni) -> Result<Option<AlumniRecord>, RepoError>;
    // Idempotent: deleting an absent id is not an error.
    async fn delete_alumni(&self, id: i64) -> Result<(), RepoError>;

    // --- Job Postings ---
    // Newest first (date_posted DESC, id DESC).
    async fn list_jobs(&self) -> Result<Vec<JobPosting>, RepoError>;
    async fn create_job(&self, new: NewJobPosting) -> Result<JobPosting, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// SqliteRepository
///
/// The `Repository` implementation backed by a single embedded SQLite file. Each query
/// checks a connection out of the pool and returns it when the future completes or is dropped.
pub struct SqliteRepository {
    pool: SqlitePool,
}

const ALUMNI_COLUMNS: &str = "id, name, reg_no, dob, email, batch_year, department";
const JOB_COLUMNS: &str = "id, title, company, description, link, posted_by, date_posted";

impl SqliteRepository {
    /// Wraps an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// connect
    ///
    /// Opens (creating if missing) the database at `url`. Connections never expire, which
    /// keeps a `sqlite::memory:` database alive for the pool's lifetime.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RepoError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    /// create_schema
    ///
    /// Creates the three tables when absent. Safe to run on every start.
    async fn create_schema(&self) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admin (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alumni (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                reg_no TEXT UNIQUE NOT NULL,
                dob TEXT NOT NULL,
                email TEXT,
                batch_year INTEGER,
                department TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                company TEXT,
                description TEXT,
                link TEXT,
                posted_by TEXT,
                date_posted TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn seed_admin(&self, username: &str, password_hash: &str) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "INSERT INTO admin (username, password) VALUES (?, ?) ON CONFLICT(username) DO NOTHING",
        )
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_admin(&self, username: &str) -> Result<Option<AdminAccount>, RepoError> {
        let admin = sqlx::query_as::<_, AdminAccount>(
            "SELECT id, username, password FROM admin WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn list_alumni(&self) -> Result<Vec<AlumniRecord>, RepoError> {
        let query = format!("SELECT {ALUMNI_COLUMNS} FROM alumni ORDER BY batch_year DESC, name ASC");
        let alumni = sqlx::query_as::<_, AlumniRecord>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(alumni)
    }

    async fn get_alumni(&self, id: i64) -> Result<Option<AlumniRecord>, RepoError> {
        let query = format!("SELECT {ALUMNI_COLUMNS} FROM alumni WHERE id = ?");
        let record = sqlx::query_as::<_, AlumniRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_alumni_by_credentials(
        &self,
        reg_no: &str,
        dob: &str,
    ) -> Result<Option<AlumniRecord>, RepoError> {
        let query = format!("SELECT {ALUMNI_COLUMNS} FROM alumni WHERE reg_no = ? AND dob = ?");
        let record = sqlx::query_as::<_, AlumniRecord>(&query)
            .bind(reg_no)
            .bind(dob)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn create_alumni(&self, new: NewAlumni) -> Result<AlumniRecord, RepoError> {
        let query = format!(
            "INSERT INTO alumni (name, reg_no, dob, email, batch_year, department) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {ALUMNI_COLUMNS}"
        );
        let record = sqlx::query_as::<_, AlumniRecord>(&query)
            .bind(new.name)
            .bind(new.reg_no)
            .bind(new.dob)
            .bind(new.email)
            .bind(new.batch_year)
            .bind(new.department)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn update_alumni(&self, id: i64, new: NewAlumni) -> Result<Option<AlumniRecord>, RepoError> {
        let query = format!(
            "UPDATE alumni SET name = ?, reg_no = ?, dob = ?, email = ?, batch_year = ?, department = ? \
             WHERE id = ? RETURNING {ALUMNI_COLUMNS}"
        );
        let record = sqlx::query_as::<_, AlumniRecord>(&query)
            .bind(new.name)
            .bind(new.reg_no)
            .bind(new.dob)
            .bind(new.email)
            .bind(new.batch_year)
            .bind(new.department)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn delete_alumni(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM alumni WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(id, rows = result.rows_affected(), "alumni delete executed");
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<JobPosting>, RepoError> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY date_posted DESC, id DESC");
        let jobs = sqlx::query_as::<_, JobPosting>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    async fn create_job(&self, new: NewJobPosting) -> Result<JobPosting, RepoError> {
        let query = format!(
            "INSERT INTO jobs (title, company, description, link, posted_by, date_posted) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {JOB_COLUMNS}"
        );
        let job = sqlx::query_as::<_, JobPosting>(&query)
            .bind(new.title)
            .bind(new.company)
            .bind(new.description)
            .bind(new.link)
            .bind(new.posted_by)
            .bind(new.date_posted)
            .fetch_one(&self.pool)
            .await?;
        Ok(job)
    }
}

/// bootstrap
///
/// Creates the schema and seeds the configured default admin when that username is absent.
/// Runs on every start; an existing admin (and its password) is left untouched.
pub async fn bootstrap(repo: &dyn Repository, config: &AppConfig) -> Result<(), AppError> {
    repo.create_schema().await?;

    if repo.get_admin(&config.default_admin_username).await?.is_some() {
        return Ok(());
    }

    let hash = password::hash_password_blocking(
        config.default_admin_password.clone(),
        config.password_hash_rounds,
    )
    .await?;

    if repo.seed_admin(&config.default_admin_username, &hash).await? {
        tracing::info!(username = %config.default_admin_username, "seeded default admin account");
    }
    Ok(())
}
