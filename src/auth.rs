use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, IntoResponseParts, Redirect, Response, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt};

use crate::{
    config::{AppConfig, REDACTED},
    error::AppError,
    models::{Flash, FlashLevel},
};

/// Name of the cookie carrying the signed session.
pub const SESSION_COOKIE: &str = "alumni_session";

pub const ADMIN_LOGIN_PATH: &str = "/admin-login";
pub const USER_LOGIN_PATH: &str = "/user-login";

/// Pending flashes kept in the cookie; older ones are dropped first.
pub const MAX_FLASHES: usize = 5;

/// SessionData
///
/// Everything the server remembers about a browser between requests. Identity claims only;
/// entity rows are always re-read from the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub admin_logged_in: bool,
    #[serde(default)]
    pub admin_username: Option<String>,
    #[serde(default)]
    pub user_logged_in: bool,
    #[serde(default)]
    pub user_reg_no: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    // Queued messages for the next rendered page.
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

/// Claims
///
/// The signed cookie payload: the session data plus the standard expiry claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub data: SessionData,
    /// Expiration Time (exp). Expired cookies decode as an empty session.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// SessionCodec
///
/// Signs and verifies session cookies. Built from `AppConfig`.
#[derive(Clone)]
pub struct SessionCodec {
    secret: String,
    ttl_secs: i64,
    secure: bool,
}

impl SessionCodec {
    pub fn new(secret: impl Into<String>, ttl_secs: i64, secure: bool) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
            secure,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.session_secret.clone(),
            config.session_ttl_secs,
            config.cookie_secure,
        )
    }

    /// Serializes `data` into a signed token valid for the configured lifetime.
    pub fn encode(&self, data: &SessionData) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            data: data.clone(),
            exp: (now + self.ttl_secs).max(0) as usize,
            iat: now.max(0) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Verifies signature and expiry. Any failure yields `None`.
    pub fn decode(&self, token: &str) -> Option<SessionData> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => Some(data.claims.data),
            Err(e) => {
                tracing::debug!("discarding session cookie: {}", e);
                None
            }
        }
    }

    fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build()
    }
}

impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec")
            .field("secret", &REDACTED)
            .field("ttl_secs", &self.ttl_secs)
            .field("secure", &self.secure)
            .finish()
    }
}

/// AdminIdentity
#[derive(Debug, Clone, PartialEq)]
pub struct AdminIdentity {
    pub username: String,
}

/// AlumniIdentity
#[derive(Debug, Clone, PartialEq)]
pub struct AlumniIdentity {
    pub reg_no: String,
    pub name: String,
}

impl AlumniIdentity {
    /// The text stored in `jobs.posted_by`.
    pub fn posted_by(&self) -> String {
        format!("{} ({})", self.name, self.reg_no)
    }
}

/// Gate
///
/// Outcome of a role check. `Deny` names the login page to send the visitor to and the
/// warning to show there; the guarded action must not run.
#[derive(Debug, Clone, PartialEq)]
pub enum Gate<T> {
    Allow(T),
    Deny {
        login: &'static str,
        warning: &'static str,
    },
}

/// Session
///
/// The per-request view of the signed session cookie.
///
/// As an extractor it never rejects: a missing, tampered or expired cookie yields an empty
/// (anonymous) session. As a response part it re-signs the current data into `Set-Cookie`,
/// so a handler that changes the session returns it alongside its body.
#[derive(Debug, Clone)]
pub struct Session {
    data: SessionData,
    codec: SessionCodec,
}

impl Session {
    pub fn new(data: SessionData, codec: SessionCodec) -> Self {
        Self { data, codec }
    }

    /// Reads the session cookie out of request headers.
    pub fn from_headers(headers: &axum::http::HeaderMap, codec: SessionCodec) -> Self {
        let jar = CookieJar::from_headers(headers);
        let data = jar
            .get(SESSION_COOKIE)
            .filter(|c| !c.value().is_empty())
            .and_then(|c| codec.decode(c.value()))
            .unwrap_or_default();
        Self { data, codec }
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Marks the admin role as signed in. Alumni keys are left as they are.
    pub fn login_admin(&mut self, username: &str) {
        self.data.admin_logged_in = true;
        self.data.admin_username = Some(username.to_string());
    }

    /// Marks the alumni role as signed in. Admin keys are left as they are.
    pub fn login_user(&mut self, reg_no: &str, name: &str) {
        self.data.user_logged_in = true;
        self.data.user_reg_no = Some(reg_no.to_string());
        self.data.user_name = Some(name.to_string());
    }

    /// Clears all five identity keys regardless of which role was active. Pending flashes stay.
    pub fn logout(&mut self) {
        self.data.admin_logged_in = false;
        self.data.admin_username = None;
        self.data.user_logged_in = false;
        self.data.user_reg_no = None;
        self.data.user_name = None;
    }

    /// Queues a message for the next rendered page, keeping at most `MAX_FLASHES`.
    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.data.flashes.push(Flash::new(level, message));
        let excess = self.data.flashes.len().saturating_sub(MAX_FLASHES);
        self.data.flashes.drain(..excess);
    }

    /// Drains the queued flashes for display.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.data.flashes)
    }

    pub fn admin_gate(&self) -> Gate<AdminIdentity> {
        if self.data.admin_logged_in {
            Gate::Allow(AdminIdentity {
                username: self.data.admin_username.clone().unwrap_or_default(),
            })
        } else {
            Gate::Deny {
                login: ADMIN_LOGIN_PATH,
                warning: "Please login as admin",
            }
        }
    }

    pub fn alumni_gate(&self) -> Gate<AlumniIdentity> {
        if self.data.user_logged_in {
            Gate::Allow(AlumniIdentity {
                reg_no: self.data.user_reg_no.clone().unwrap_or_default(),
                name: self.data.user_name.clone().unwrap_or_default(),
            })
        } else {
            Gate::Deny {
                login: USER_LOGIN_PATH,
                warning: "Please login as alumni to continue",
            }
        }
    }

    /// Builds the redirect for a denied gate, queueing the warning on this session.
    fn deny(mut self, login: &'static str, warning: &'static str) -> Response {
        self.flash(FlashLevel::Warning, warning);
        (self, Redirect::to(login)).into_response()
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(Session::from_headers(
            &parts.headers,
            SessionCodec::from_config(&config),
        ))
    }
}

impl IntoResponseParts for Session {
    type Error = AppError;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let token = self.codec.encode(&self.data)?;
        let cookie = self.codec.cookie(token);
        let value = HeaderValue::from_str(&cookie.to_string())
            .map_err(|e| AppError::Internal(e.to_string()))?;
        res.headers_mut().append(header::SET_COOKIE, value);
        Ok(res)
    }
}

/// AdminUser Extractor
///
/// Resolves the signed-in admin or rejects with a redirect to the admin login page
/// (plus a warning flash). Handlers taking `AdminUser` only run for admins.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AdminIdentity);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = match Session::from_request_parts(parts, state).await {
            Ok(session) => session,
            Err(never) => match never {},
        };
        match session.admin_gate() {
            Gate::Allow(identity) => Ok(AdminUser(identity)),
            Gate::Deny { login, warning } => {
                tracing::warn!(uri = %parts.uri, "admin gate denied request");
                Err(session.deny(login, warning))
            }
        }
    }
}

/// AlumniUser Extractor
///
/// The alumni counterpart of [`AdminUser`].
#[derive(Debug, Clone)]
pub struct AlumniUser(pub AlumniIdentity);

impl<S> FromRequestParts<S> for AlumniUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = match Session::from_request_parts(parts, state).await {
            Ok(session) => session,
            Err(never) => match never {},
        };
        match session.alumni_gate() {
            Gate::Allow(identity) => Ok(AlumniUser(identity)),
            Gate::Deny { login, warning } => {
                tracing::warn!(uri = %parts.uri, "alumni gate denied request");
                Err(session.deny(login, warning))
            }
        }
    }
}

/// require_admin
///
/// Router-level guard for the admin routes. Extracting `AdminUser` short-circuits with the
/// login redirect before the inner handler is reached.
pub async fn require_admin(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// require_alumni
///
/// Router-level guard for the alumni routes.
pub async fn require_alumni(_alumni: AlumniUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> SessionCodec {
        SessionCodec::new("unit-test-secret", 3600, false)
    }

    #[test]
    fn token_round_trips_session_data() {
        let mut session = Session::new(SessionData::default(), codec());
        session.login_user("R100", "Jane Doe");
        session.flash(FlashLevel::Success, "Logged in as Jane Doe");

        let token = codec().encode(session.data()).unwrap();
        let decoded = codec().decode(&token).unwrap();
        assert_eq!(&decoded, session.data());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let mut data = SessionData::default();
        data.admin_logged_in = true;
        let token = SessionCodec::new("other-secret", 3600, false)
            .encode(&data)
            .unwrap();
        assert!(codec().decode(&token).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut data = SessionData::default();
        data.admin_logged_in = true;
        // Well past the default 60s leeway.
        let token = SessionCodec::new("unit-test-secret", -600, false)
            .encode(&data)
            .unwrap();
        assert!(codec().decode(&token).is_none());
    }
}
