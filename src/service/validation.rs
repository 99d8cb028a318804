//! Input checks run before any storage call.

use crate::model::{ListParams, NewUser, Page, DEFAULT_LIMIT, MAX_LIMIT};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub const NAME_MAX_CHARS: usize = 50;
pub const EMAIL_MAX_CHARS: usize = 100;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be a valid email address")]
    InvalidEmail { field: &'static str },
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: &'static str, min: i64 },
    /// Body or query did not match the expected shape (missing field, wrong type).
    #[error("{0}")]
    Malformed(String),
}

impl NewUser {
    /// Check field rules; the database would otherwise reject over-long values with a 500.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Blank { field: "name" });
        }
        if self.name.chars().count() > NAME_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: "name",
                max: NAME_MAX_CHARS,
            });
        }
        if self.email.chars().count() > EMAIL_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: "email",
                max: EMAIL_MAX_CHARS,
            });
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail { field: "email" });
        }
        if let Some(age) = self.age {
            if age < 0 {
                return Err(ValidationError::BelowMinimum { field: "age", min: 0 });
            }
        }
        Ok(())
    }
}

impl ListParams {
    /// Apply defaults and bounds. `limit` above [`MAX_LIMIT`] is clamped, not rejected.
    pub fn into_page(self) -> Result<Page, ValidationError> {
        let skip = self.skip.unwrap_or(0);
        if skip < 0 {
            return Err(ValidationError::BelowMinimum { field: "skip", min: 0 });
        }
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit < 1 {
            return Err(ValidationError::BelowMinimum { field: "limit", min: 1 });
        }
        Ok(Page {
            skip,
            limit: limit.min(MAX_LIMIT),
        })
    }
}

pub fn is_valid_email(s: &str) -> bool {
    let re = EMAIL_RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"));
    if !re.is_match(s) {
        return false;
    }
    // The pattern admits dots anywhere in the local part.
    let local = s.split('@').next().unwrap_or("");
    !(local.starts_with('.') || local.ends_with('.') || local.contains(".."))
}
