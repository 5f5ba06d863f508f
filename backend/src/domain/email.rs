//! Normalised email addresses shared by staff accounts and loan applicants.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Longest address accepted, per the SMTP path limit.
pub const EMAIL_MAX: usize = 254;

/// Reasons an email address is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailValidationError {
    /// The address was blank once trimmed.
    Empty,
    /// The address exceeds [`EMAIL_MAX`] characters.
    TooLong,
    /// The address is not shaped like `local@domain.tld`.
    InvalidFormat,
}

impl EmailValidationError {
    /// Stable code reported in field violations.
    pub fn code(self) -> &'static str {
        match self {
            Self::Empty => "required",
            Self::TooLong => "too_long",
            Self::InvalidFormat => "invalid_format",
        }
    }
}

impl fmt::Display for EmailValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "email is required"),
            Self::TooLong => write!(f, "email must be at most {EMAIL_MAX} characters"),
            Self::InvalidFormat => write!(f, "email must be a valid address"),
        }
    }
}

impl std::error::Error for EmailValidationError {}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Trimmed, lower-cased email address.
///
/// # Examples
/// ```
/// use loan_backend::domain::EmailAddress;
///
/// let email = EmailAddress::new("  Jane@Example.COM ").unwrap();
/// assert_eq!(email.as_ref(), "jane@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmailValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(EmailValidationError::Empty);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(EmailValidationError::TooLong);
        }
        if !email_regex().is_match(&normalised) {
            return Err(EmailValidationError::InvalidFormat);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
