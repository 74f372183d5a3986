use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// AdminAccount
///
/// A row of the `admin` table. Seeded once at bootstrap; no endpoint mutates it.
/// `password_hash` is a PHC-format PBKDF2 string and never leaves the server.
#[derive(Debug, Clone, FromRow, Default)]
pub struct AdminAccount {
    pub id: i64,
    pub username: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

/// AlumniRecord
///
/// A row of the `alumni` table. Current students are stored with the same shape.
/// `reg_no` is unique and doubles, together with `dob`, as the alumni login credential.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct AlumniRecord {
    pub id: i64,
    pub name: String,
    pub reg_no: String,
    // Calendar date as `YYYY-MM-DD`.
    pub dob: String,
    pub email: Option<String>,
    pub batch_year: Option<i64>,
    pub department: Option<String>,
}

/// JobPosting
///
/// A row of the `jobs` table. `posted_by` is a text snapshot of the poster's identity,
/// not a reference into `alumni`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct JobPosting {
    pub id: i64,
    pub title: String,
    pub company: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub posted_by: Option<String>,
    // UTC timestamp `YYYY-MM-DDTHH:MM:SS.ffffff`; sorts lexicographically.
    pub date_posted: Option<String>,
}

/// NewAlumni
///
/// Validated, normalized column values for an insert or a full-row update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAlumni {
    pub name: String,
    pub reg_no: String,
    pub dob: String,
    pub email: Option<String>,
    pub batch_year: Option<i64>,
    pub department: Option<String>,
}

/// NewJobPosting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewJobPosting {
    pub title: String,
    pub company: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub posted_by: String,
    pub date_posted: String,
}

// --- Form Payloads (application/x-www-form-urlencoded) ---

/// AdminLoginForm
///
/// Submitted to `POST /admin-login`. The username is matched verbatim.
#[derive(Debug, Clone, Deserialize, ToSchema, Default)]
pub struct AdminLoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// UserLoginForm
///
/// Submitted to `POST /user-login`. Both fields are trimmed before matching.
#[derive(Debug, Clone, Deserialize, ToSchema, Default)]
pub struct UserLoginForm {
    #[serde(default)]
    pub reg_no: String,
    #[serde(default)]
    pub dob: String,
}

/// AlumniForm
///
/// The editable fields of an alumni record, as typed by the admin. Every field arrives as
/// text; `batch_year` is parsed during validation. The same struct is echoed back in
/// `AlumniFormPage` so a rejected submission can be corrected instead of retyped.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct AlumniForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reg_no: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub batch_year: String,
    #[serde(default)]
    pub department: String,
}

impl AlumniForm {
    /// Copy with surrounding whitespace stripped from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            reg_no: self.reg_no.trim().to_string(),
            dob: self.dob.trim().to_string(),
            email: self.email.trim().to_string(),
            batch_year: self.batch_year.trim().to_string(),
            department: self.department.trim().to_string(),
        }
    }

    /// validate
    ///
    /// Checks the required fields and converts the (already trimmed) form into column values.
    /// Returns the user-facing error message on rejection.
    pub fn validate(&self) -> Result<NewAlumni, String> {
        if self.name.is_empty() || self.reg_no.is_empty() || self.dob.is_empty() {
            return Err("Name, registration number and date of birth are required".to_string());
        }
        // chrono accepts unpadded fields and a leading sign; the stored string must be the
        // canonical form since alumni login compares it verbatim.
        let canonical = NaiveDate::parse_from_str(&self.dob, "%Y-%m-%d")
            .ok()
            .map(|date| date.format("%Y-%m-%d").to_string());
        if canonical.as_deref() != Some(self.dob.as_str()) {
            return Err("Date of birth must be a date in YYYY-MM-DD format".to_string());
        }
        let batch_year = match self.batch_year.as_str() {
            "" => None,
            raw => Some(
                raw.parse::<i64>()
                    .map_err(|_| "Batch year must be a whole number".to_string())?,
            ),
        };

        Ok(NewAlumni {
            name: self.name.clone(),
            reg_no: self.reg_no.clone(),
            dob: self.dob.clone(),
            email: non_empty(&self.email),
            batch_year,
            department: non_empty(&self.department),
        })
    }
}

impl From<&AlumniRecord> for AlumniForm {
    fn from(rec: &AlumniRecord) -> Self {
        Self {
            name: rec.name.clone(),
            reg_no: rec.reg_no.clone(),
            dob: rec.dob.clone(),
            email: rec.email.clone().unwrap_or_default(),
            batch_year: rec.batch_year.map(|y| y.to_string()).unwrap_or_default(),
            department: rec.department.clone().unwrap_or_default(),
        }
    }
}

/// JobForm
///
/// Submitted to `POST /alumni-dashboard`. Only `title` is required.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct JobForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
}

impl JobForm {
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            company: self.company.trim().to_string(),
            description: self.description.trim().to_string(),
            link: self.link.trim().to_string(),
        }
    }

    /// validate
    ///
    /// `posted_by` and `date_posted` come from the session and the clock, never from the form.
    pub fn validate(&self, posted_by: String, date_posted: String) -> Result<NewJobPosting, String> {
        if self.title.is_empty() {
            return Err("Title is required".to_string());
        }
        Ok(NewJobPosting {
            title: self.title.clone(),
            company: non_empty(&self.company),
            description: non_empty(&self.description),
            link: non_empty(&self.link),
            posted_by,
            date_posted,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// --- Flash Messages ---

/// FlashLevel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// Flash
///
/// A one-shot message queued in the session and shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

// --- Page View Models (Output) ---

/// LandingPage
///
/// `GET /`. Shows who, if anyone, is signed in.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LandingPage {
    pub admin_username: Option<String>,
    pub user_name: Option<String>,
    pub flashes: Vec<Flash>,
}

/// JobsPage
///
/// `GET /view-jobs`. Newest posting first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct JobsPage {
    pub jobs: Vec<JobPosting>,
    pub flashes: Vec<Flash>,
}

/// LoginPage
///
/// Both login forms render the same (field-less) page model.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginPage {
    pub flashes: Vec<Flash>,
}

/// AdminDashboardPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardPage {
    pub admin_username: String,
    pub alumni: Vec<AlumniRecord>,
    pub jobs: Vec<JobPosting>,
    pub flashes: Vec<Flash>,
}

/// AlumniFormPage
///
/// The add/edit alumni form. `id` is set when editing an existing record; `error` carries a
/// rejected submission's message while `form` preserves what was typed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AlumniFormPage {
    pub id: Option<i64>,
    pub form: AlumniForm,
    pub error: Option<String>,
    pub flashes: Vec<Flash>,
}

/// AlumniDashboardPage
///
/// The signed-in alumni's view: every posting plus the new-posting form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AlumniDashboardPage {
    pub user_name: String,
    pub user_reg_no: String,
    pub jobs: Vec<JobPosting>,
    pub form: JobForm,
    pub error: Option<String>,
    pub flashes: Vec<Flash>,
}
