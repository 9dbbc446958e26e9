//! Input validation and normalization for lead fields.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{LeadEdit, NewLead};

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
    /// Status label outside the known set.
    InvalidStatus(String),
    /// Contact attempt counter below zero.
    NegativeAttempts(i64),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::InvalidStatus(value) => write!(f, "Unknown status: {}", value),
            ValidationError::NegativeAttempts(value) => {
                write!(f, "contact attempts cannot be negative ({})", value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for contact names.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum allowed length for notes.
pub const MAX_NOTES_LENGTH: usize = 2000;

static NON_DIGIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\D").expect("Invalid non-digit regex"));

/// Strip every non-digit character from a phone number.
///
/// Any Unicode decimal digit is kept as written, so full-width digits survive.
/// An input without digits normalizes to the empty string, which is still a
/// valid (unique) phone value.
pub fn normalize_phone(phone: &str) -> String {
    NON_DIGIT_REGEX.replace_all(phone, "").into_owned()
}

/// Validate an email address.
///
/// Emails are stored exactly as given, so this only rejects empty and
/// oversized values.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    check_length("email", email, MAX_EMAIL_LENGTH)
}

/// Validate a candidate lead before insertion.
pub fn validate_new_lead(lead: &NewLead) -> Result<(), ValidationError> {
    validate_email(&lead.email)?;
    if let Some(name) = &lead.name {
        check_length("name", name, MAX_NAME_LENGTH)?;
    }
    if let Some(notes) = &lead.notes {
        check_length("notes", notes, MAX_NOTES_LENGTH)?;
    }
    Ok(())
}

/// Validate an edited table row.
pub fn validate_edit(edit: &LeadEdit) -> Result<(), ValidationError> {
    if let Some(attempts) = edit.contact_attempts {
        if attempts < 0 {
            return Err(ValidationError::NegativeAttempts(attempts));
        }
    }
    if let Some(notes) = &edit.notes {
        check_length("notes", notes, MAX_NOTES_LENGTH)?;
    }
    Ok(())
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}
