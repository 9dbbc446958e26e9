//! Duplicate detection by email or phone.
//!
//! Manual entry does a live lookup right before inserting. Imports load every
//! stored key once into [`ExistingKeys`] and classify rows by set membership.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::Result;
use crate::models::Lead;
use crate::validation::normalize_phone;

/// Why a candidate was classified as a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateReason {
    /// Email matches a stored lead.
    Email,
    /// Phone matches a stored lead.
    Phone,
    /// Both email and phone match stored leads.
    EmailAndPhone,
    /// Collides with another row of the same batch.
    WithinBatch,
}

/// How rows that collide with each other inside one import batch are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchDuplicatePolicy {
    /// Accept the first row, report later collisions.
    #[default]
    KeepFirst,
    /// Report every row of a colliding group.
    RejectAll,
    /// Only check against stored leads; the uniqueness constraint then fails the batch.
    Insert,
}

impl fmt::Display for BatchDuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchDuplicatePolicy::KeepFirst => "keep_first",
            BatchDuplicatePolicy::RejectAll => "reject_all",
            BatchDuplicatePolicy::Insert => "insert",
        };
        f.write_str(name)
    }
}

impl FromStr for BatchDuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "keep_first" => Ok(BatchDuplicatePolicy::KeepFirst),
            "reject_all" => Ok(BatchDuplicatePolicy::RejectAll),
            "insert" => Ok(BatchDuplicatePolicy::Insert),
            other => Err(format!("unknown batch duplicate policy: {}", other)),
        }
    }
}

/// Anything carrying the two unique lead keys.
pub trait LeadKeys {
    fn email(&self) -> &str;
    /// Normalized phone.
    fn phone(&self) -> &str;
}

/// Find a stored lead whose email or phone matches.
///
/// `phone` must already be normalized.
pub async fn find_duplicate<'e, E>(executor: E, email: &str, phone: &str) -> Result<Option<Lead>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let lead = sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, name, email, phone, status, notes, created_at, last_contact, contact_attempts
        FROM leads
        WHERE email = ? OR phone = ?
        LIMIT 1
        "#,
    )
    .bind(email)
    .bind(phone)
    .fetch_optional(executor)
    .await?;

    Ok(lead)
}

/// True iff a stored lead has the same email or the same normalized phone.
pub async fn is_duplicate(pool: &SqlitePool, email: &str, phone: &str) -> Result<bool> {
    Ok(find_duplicate(pool, email, &normalize_phone(phone))
        .await?
        .is_some())
}

/// Snapshot of every stored email and phone.
#[derive(Debug, Clone, Default)]
pub struct ExistingKeys {
    emails: HashSet<String>,
    phones: HashSet<String>,
}

impl ExistingKeys {
    /// Load all stored keys in one pass.
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT email, phone
            FROM leads
            "#,
        )
        .fetch_all(pool)
        .await?;

        let mut keys = Self::default();
        for (email, phone) in rows {
            keys.insert(email, phone);
        }

        tracing::debug!(
            emails = keys.emails.len(),
            phones = keys.phones.len(),
            "Loaded existing lead keys"
        );
        Ok(keys)
    }

    pub fn insert(&mut self, email: impl Into<String>, phone: impl Into<String>) {
        self.emails.insert(email.into());
        self.phones.insert(phone.into());
    }

    /// Classify a candidate against the snapshot.
    pub fn classify(&self, email: &str, phone: &str) -> Option<DuplicateReason> {
        match (self.emails.contains(email), self.phones.contains(phone)) {
            (true, true) => Some(DuplicateReason::EmailAndPhone),
            (true, false) => Some(DuplicateReason::Email),
            (false, true) => Some(DuplicateReason::Phone),
            (false, false) => None,
        }
    }
}

/// Candidates split into rows to insert and rows to report.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T> {
    pub fresh: Vec<T>,
    pub duplicates: Vec<(T, DuplicateReason)>,
}

/// Split a batch into new and duplicate candidates.
///
/// Collisions with stored leads always win over within-batch collisions when
/// reporting a reason.
pub fn partition<T: LeadKeys>(
    candidates: Vec<T>,
    existing: &ExistingKeys,
    policy: BatchDuplicatePolicy,
) -> Partition<T> {
    let mut fresh = Vec::new();
    let mut duplicates = Vec::new();

    match policy {
        BatchDuplicatePolicy::Insert => {
            for candidate in candidates {
                match existing.classify(candidate.email(), candidate.phone()) {
                    Some(reason) => duplicates.push((candidate, reason)),
                    None => fresh.push(candidate),
                }
            }
        }
        BatchDuplicatePolicy::KeepFirst => {
            let mut accepted = ExistingKeys::default();
            for candidate in candidates {
                if let Some(reason) = existing.classify(candidate.email(), candidate.phone()) {
                    duplicates.push((candidate, reason));
                } else if accepted.classify(candidate.email(), candidate.phone()).is_some() {
                    duplicates.push((candidate, DuplicateReason::WithinBatch));
                } else {
                    accepted.insert(candidate.email(), candidate.phone());
                    fresh.push(candidate);
                }
            }
        }
        BatchDuplicatePolicy::RejectAll => {
            let mut email_counts: HashMap<String, usize> = HashMap::new();
            let mut phone_counts: HashMap<String, usize> = HashMap::new();
            for candidate in &candidates {
                *email_counts.entry(candidate.email().to_string()).or_default() += 1;
                *phone_counts.entry(candidate.phone().to_string()).or_default() += 1;
            }

            for candidate in candidates {
                let shared = email_counts[candidate.email()] > 1
                    || phone_counts[candidate.phone()] > 1;
                if let Some(reason) = existing.classify(candidate.email(), candidate.phone()) {
                    duplicates.push((candidate, reason));
                } else if shared {
                    duplicates.push((candidate, DuplicateReason::WithinBatch));
                } else {
                    fresh.push(candidate);
                }
            }
        }
    }

    Partition { fresh, duplicates }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::create_lead;
    use crate::models::NewLead;
    use crate::Database;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str, &'static str);

    impl LeadKeys for Row {
        fn email(&self) -> &str {
            self.0
        }

        fn phone(&self) -> &str {
            self.1
        }
    }

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_is_duplicate_matches_email_or_phone() {
        let db = test_db().await;
        create_lead(db.pool(), &NewLead::new(None, "a@example.com", "555-1111"))
            .await
            .unwrap();

        assert!(is_duplicate(db.pool(), "a@example.com", "999").await.unwrap());
        assert!(is_duplicate(db.pool(), "z@example.com", "(555) 1111").await.unwrap());
        assert!(!is_duplicate(db.pool(), "z@example.com", "999").await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_keys_load() {
        let db = test_db().await;
        create_lead(db.pool(), &NewLead::new(None, "a@example.com", "1"))
            .await
            .unwrap();
        create_lead(db.pool(), &NewLead::new(None, "b@example.com", "2"))
            .await
            .unwrap();

        let keys = ExistingKeys::load(db.pool()).await.unwrap();
        assert_eq!(keys.classify("a@example.com", "2"), Some(DuplicateReason::EmailAndPhone));
        assert_eq!(keys.classify("b@example.com", "3"), Some(DuplicateReason::Email));
        assert_eq!(keys.classify("c@example.com", "1"), Some(DuplicateReason::Phone));
        assert_eq!(keys.classify("c@example.com", "3"), None);
    }

    fn batch() -> Vec<Row> {
        vec![
            Row("stored@example.com", "10"),
            Row("new@example.com", "20"),
            Row("new@example.com", "30"),
            Row("other@example.com", "40"),
        ]
    }

    fn stored() -> ExistingKeys {
        let mut keys = ExistingKeys::default();
        keys.insert("stored@example.com", "1");
        keys
    }

    #[test]
    fn test_partition_keep_first() {
        let result = partition(batch(), &stored(), BatchDuplicatePolicy::KeepFirst);

        assert_eq!(
            result.fresh,
            vec![Row("new@example.com", "20"), Row("other@example.com", "40")]
        );
        assert_eq!(
            result.duplicates,
            vec![
                (Row("stored@example.com", "10"), DuplicateReason::Email),
                (Row("new@example.com", "30"), DuplicateReason::WithinBatch),
            ]
        );
    }

    #[test]
    fn test_partition_reject_all() {
        let result = partition(batch(), &stored(), BatchDuplicatePolicy::RejectAll);

        assert_eq!(result.fresh, vec![Row("other@example.com", "40")]);
        assert_eq!(result.duplicates.len(), 3);
        assert!(result.duplicates[1..]
            .iter()
            .all(|(_, reason)| *reason == DuplicateReason::WithinBatch));
    }

    #[test]
    fn test_partition_insert_skips_batch_pass() {
        let result = partition(batch(), &stored(), BatchDuplicatePolicy::Insert);

        assert_eq!(result.fresh.len(), 3);
        assert_eq!(result.duplicates.len(), 1);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "keep-first".parse::<BatchDuplicatePolicy>().unwrap(),
            BatchDuplicatePolicy::KeepFirst
        );
        assert_eq!(
            "REJECT_ALL".parse::<BatchDuplicatePolicy>().unwrap(),
            BatchDuplicatePolicy::RejectAll
        );
        assert!("merge".parse::<BatchDuplicatePolicy>().is_err());
        assert_eq!(BatchDuplicatePolicy::Insert.to_string(), "insert");
    }
}
