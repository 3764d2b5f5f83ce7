//! Stateless field checks. Each returns the first rule that failed as a
//! human-readable [`ValidationError`]; callers chain them with `?` so the
//! first failure wins.

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 50;
pub const MIN_TITLE_LEN: usize = 3;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const DEFAULT_MAX_PARTICIPANTS: i32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns the normalized address.
pub fn email(raw: Option<&str>) -> Result<String> {
    let email = normalize_email(raw.unwrap_or_default());
    if !is_valid_email(&email) {
        return Err(ValidationError::new("Invalid email"));
    }
    Ok(email)
}

pub fn password(raw: Option<&str>) -> Result<()> {
    match raw {
        Some(p) if p.chars().count() >= MIN_PASSWORD_LEN => Ok(()),
        _ => Err(ValidationError::new(format!(
            "Password must contain at least {MIN_PASSWORD_LEN} characters"
        ))),
    }
}

pub fn name(raw: &str) -> Result<String> {
    let name = raw.trim();
    let len = name.chars().count();
    if len < MIN_NAME_LEN {
        return Err(ValidationError::new(format!(
            "Name must contain at least {MIN_NAME_LEN} characters"
        )));
    }
    if len > MAX_NAME_LEN {
        return Err(ValidationError::new(format!(
            "Name must contain at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn title(raw: Option<&str>) -> Result<String> {
    match raw.map(str::trim) {
        Some(t) if t.chars().count() >= MIN_TITLE_LEN => Ok(t.to_string()),
        _ => Err(ValidationError::new(format!(
            "Title must contain at least {MIN_TITLE_LEN} characters"
        ))),
    }
}

pub fn description(raw: Option<&str>) -> Result<Option<String>> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some(d) if d.chars().count() >= MIN_DESCRIPTION_LEN => Ok(Some(d.to_string())),
        Some(_) => Err(ValidationError::new(format!(
            "Description must contain at least {MIN_DESCRIPTION_LEN} characters"
        ))),
    }
}

pub fn future_date(date: Option<OffsetDateTime>, now: OffsetDateTime) -> Result<OffsetDateTime> {
    match date {
        Some(d) if d > now => Ok(d),
        _ => Err(ValidationError::new("Date must be in the future")),
    }
}

pub fn location(raw: Option<&str>) -> Result<String> {
    match raw.map(str::trim) {
        Some(l) if !l.is_empty() => Ok(l.to_string()),
        _ => Err(ValidationError::new("Location is required")),
    }
}

pub fn max_participants(raw: Option<i32>) -> Result<Option<i32>> {
    match raw {
        Some(n) if n < 1 => Err(ValidationError::new(
            "Maximum number of participants must be positive",
        )),
        other => Ok(other),
    }
}
