//! Lead models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::ValidationError;

/// Where a lead stands in the calling workflow.
///
/// Any status can be set from any other; `Closed` is terminal by convention only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
pub enum LeadStatus {
    #[default]
    #[serde(rename = "To call")]
    #[sqlx(rename = "To call")]
    ToCall,
    #[serde(rename = "Pending")]
    #[sqlx(rename = "Pending")]
    Pending,
    #[serde(rename = "Message sent")]
    #[sqlx(rename = "Message sent")]
    MessageSent,
    #[serde(rename = "Closed")]
    #[sqlx(rename = "Closed")]
    Closed,
}

impl LeadStatus {
    /// Every status, in workflow order.
    pub const ALL: [LeadStatus; 4] = [
        LeadStatus::ToCall,
        LeadStatus::Pending,
        LeadStatus::MessageSent,
        LeadStatus::Closed,
    ];

    /// Stored and displayed label.
    pub fn label(&self) -> &'static str {
        match self {
            LeadStatus::ToCall => "To call",
            LeadStatus::Pending => "Pending",
            LeadStatus::MessageSent => "Message sent",
            LeadStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LeadStatus {
    type Err = ValidationError;

    /// Accepts the display label or its snake_case form, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        LeadStatus::ALL
            .into_iter()
            .find(|status| status.label().to_lowercase() == normalized)
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

/// A stored lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Lead {
    /// Auto-incrementing ID, never reused.
    pub id: i64,
    /// Contact name, if known.
    pub name: Option<String>,
    /// Email address, unique across leads.
    pub email: String,
    /// Digits-only phone number, unique across leads.
    pub phone: String,
    /// Current workflow status.
    pub status: LeadStatus,
    /// Free-form operator notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last time the lead was contacted.
    pub last_contact: Option<DateTime<Utc>>,
    /// Number of contact attempts so far.
    pub contact_attempts: i64,
}

/// A candidate lead from the entry form or an import row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    /// Raw phone input; normalized to digits before storage.
    pub phone: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewLead {
    pub fn new(name: Option<&str>, email: &str, phone: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            email: email.to_string(),
            phone: phone.to_string(),
            notes: None,
        }
    }
}

/// One edited row of the operator table. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadEdit {
    pub id: i64,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub contact_attempts: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl LeadEdit {
    /// Edit that only changes the status.
    pub fn status(id: i64, status: LeadStatus) -> Self {
        Self {
            id,
            status: Some(status),
            ..Self::default()
        }
    }

    /// True when the edit changes nothing.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.contact_attempts.is_none() && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("To call".parse::<LeadStatus>().unwrap(), LeadStatus::ToCall);
        assert_eq!("to_call".parse::<LeadStatus>().unwrap(), LeadStatus::ToCall);
        assert_eq!(
            "MESSAGE-SENT".parse::<LeadStatus>().unwrap(),
            LeadStatus::MessageSent
        );
        assert_eq!(" closed ".parse::<LeadStatus>().unwrap(), LeadStatus::Closed);
        assert!(matches!(
            "won".parse::<LeadStatus>(),
            Err(ValidationError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_status_display_round_trips_through_parse() {
        for status in LeadStatus::ALL {
            assert_eq!(status.to_string().parse::<LeadStatus>().unwrap(), status);
        }
        assert_eq!(LeadStatus::MessageSent.to_string(), "Message sent");
        assert_eq!(LeadStatus::default(), LeadStatus::ToCall);
    }

    #[test]
    fn test_edit_is_empty() {
        assert!(LeadEdit { id: 1, ..LeadEdit::default() }.is_empty());
        assert!(!LeadEdit::status(1, LeadStatus::Closed).is_empty());
    }
}
