use std::{env, fmt};

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and then
/// shared read-only with every request through `AppState` (see the `FromRef` impls in lib.rs).
#[derive(Clone)]
pub struct AppConfig {
    // SQLite connection string, e.g. `sqlite://app.db`.
    pub db_url: String,
    // Upper bound of the store's connection pool. In-memory databases need exactly 1.
    pub db_max_connections: u32,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Runtime environment marker. Controls log format and cookie hardening.
    pub env: Env,
    // HMAC secret signing the session cookie.
    pub session_secret: String,
    // Lifetime of an issued session cookie, in seconds.
    pub session_ttl_secs: i64,
    // Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    // Credential seeded into the `admin` table when the username is absent.
    pub default_admin_username: String,
    pub default_admin_password: String,
    // PBKDF2 iteration count used for newly hashed passwords.
    pub password_hash_rounds: u32,
}

/// Env
///
/// Defines the runtime context: developer conveniences locally, hardened settings in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

// Secrets are printed as a placeholder.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("db_url", &self.db_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("bind_addr", &self.bind_addr)
            .field("env", &self.env)
            .field("session_secret", &REDACTED)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("cookie_secure", &self.cookie_secure)
            .field("default_admin_username", &self.default_admin_username)
            .field("default_admin_password", &REDACTED)
            .field("password_hash_rounds", &self.password_hash_rounds)
            .finish()
    }
}

pub const REDACTED: &str = "[redacted]";
pub const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_PASSWORD_HASH_ROUNDS: u32 = 600_000;
const LOCAL_SESSION_SECRET: &str = "local-development-session-secret-change-me";

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for tests: private in-memory database on a single
    /// connection and a cheap hash cost so logins stay fast.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            bind_addr: "127.0.0.1:0".to_string(),
            env: Env::Local,
            session_secret: "super-secure-test-secret-value-local".to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            cookie_secure: false,
            default_admin_username: "admin".to_string(),
            default_admin_password: "admin123".to_string(),
            password_hash_rounds: 1_000,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` or `SESSION_SECRET` is missing, or when a
    /// numeric variable does not parse. The process must not start with a guessable cookie key.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (db_url, session_secret) = match env {
            Env::Production => (
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                env::var("SESSION_SECRET").expect("FATAL: SESSION_SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://app.db".to_string()),
                env::var("SESSION_SECRET").unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string()),
            ),
        };

        let default_admin_password =
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
        if env == Env::Production && default_admin_password == "admin123" {
            tracing::warn!("ADMIN_PASSWORD not set; seeding the well-known default admin credential");
        }

        Self {
            cookie_secure: env == Env::Production,
            env,
            db_url,
            db_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            session_secret,
            session_ttl_secs: parse_var("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
            default_admin_username: env::var("ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),
            default_admin_password,
            password_hash_rounds: parse_var("PASSWORD_HASH_ROUNDS", DEFAULT_PASSWORD_HASH_ROUNDS),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {name} must be a number, got {raw:?}")),
        Err(_) => default,
    }
}
