//! CSV import of lead batches.
//!
//! Rows are parsed with explicit header mapping, phones normalized to digits,
//! duplicates partitioned out, and the remaining rows bulk-inserted. A file
//! missing any required column is rejected before anything is written.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::duplicate::{self, BatchDuplicatePolicy, DuplicateReason, ExistingKeys, LeadKeys};
use crate::error::Result;
use crate::lead;
use crate::models::NewLead;
use crate::validation::normalize_phone;

/// Errors reading an uploaded import file.
#[derive(Debug, Error)]
pub enum ImportError {
    /// A required header is absent.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Malformed CSV (e.g. a row with the wrong number of fields).
    #[error("malformed CSV{}: {message}", line_suffix(.line))]
    Csv { line: Option<u64>, message: String },

    /// A field is not valid UTF-8.
    #[error("invalid UTF-8{}", line_suffix(.line))]
    Encoding { line: Option<u64> },

    /// A data row has a blank email cell.
    #[error("empty email at line {line}")]
    EmptyEmail { line: u64 },
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" at line {}", l)).unwrap_or_default()
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line());
        match err.kind() {
            csv::ErrorKind::Utf8 { .. } => ImportError::Encoding { line },
            _ => ImportError::Csv {
                line,
                message: err.to_string(),
            },
        }
    }
}

/// Header names mapped onto lead fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportColumns {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Default for ImportColumns {
    fn default() -> Self {
        Self {
            name: "name".to_string(),
            email: "email".to_string(),
            phone: "phone".to_string(),
        }
    }
}

impl ImportColumns {
    /// Headers of the French contact export format.
    pub fn french() -> Self {
        Self {
            name: "Nom".to_string(),
            email: "Adresse e-mail".to_string(),
            phone: "Téléphone".to_string(),
        }
    }
}

/// Import settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub columns: ImportColumns,
    /// Field separator byte.
    pub delimiter: u8,
    pub policy: BatchDuplicatePolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            columns: ImportColumns::default(),
            delimiter: b',',
            policy: BatchDuplicatePolicy::default(),
        }
    }
}

/// A parsed data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRow {
    /// 1-based line in the source file.
    pub line: u64,
    pub name: Option<String>,
    pub email: String,
    /// Digits-only phone.
    pub phone: String,
}

impl LeadKeys for ImportRow {
    fn email(&self) -> &str {
        &self.email
    }

    fn phone(&self) -> &str {
        &self.phone
    }
}

impl From<ImportRow> for NewLead {
    fn from(row: ImportRow) -> Self {
        NewLead {
            name: row.name,
            email: row.email,
            phone: row.phone,
            notes: None,
        }
    }
}

/// A row left out of the import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRow {
    pub line: u64,
    pub name: Option<String>,
    pub email: String,
    pub phone: String,
    pub reason: DuplicateReason,
}

/// Outcome of classifying an import batch, before any write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportPlan {
    pub fresh: Vec<ImportRow>,
    pub duplicates: Vec<DuplicateRow>,
}

/// Outcome of a completed import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Data rows read from the file.
    pub rows: usize,
    pub inserted: usize,
    pub duplicates: Vec<DuplicateRow>,
}

/// Parse an uploaded file into rows with normalized phones.
pub fn parse(data: &[u8], options: &ImportOptions) -> std::result::Result<Vec<ImportRow>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let name_idx = column_index(&headers, &options.columns.name)?;
    let email_idx = column_index(&headers, &options.columns.email)?;
    let phone_idx = column_index(&headers, &options.columns.phone)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        let email = field(email_idx);
        if email.trim().is_empty() {
            return Err(ImportError::EmptyEmail { line });
        }

        let name = field(name_idx).trim();
        rows.push(ImportRow {
            line,
            name: (!name.is_empty()).then(|| name.to_string()),
            email: email.to_string(),
            phone: normalize_phone(field(phone_idx)),
        });
    }

    Ok(rows)
}

fn column_index(headers: &csv::StringRecord, column: &str) -> std::result::Result<usize, ImportError> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
        .ok_or_else(|| ImportError::MissingColumn(column.to_string()))
}

/// Classify parsed rows against stored keys and the batch policy.
pub fn plan(rows: Vec<ImportRow>, existing: &ExistingKeys, policy: BatchDuplicatePolicy) -> ImportPlan {
    let partition = duplicate::partition(rows, existing, policy);

    let duplicates = partition
        .duplicates
        .into_iter()
        .map(|(row, reason)| DuplicateRow {
            line: row.line,
            name: row.name,
            email: row.email,
            phone: row.phone,
            reason,
        })
        .collect();

    ImportPlan {
        fresh: partition.fresh,
        duplicates,
    }
}

/// Parse and classify a file without writing anything.
pub async fn preview(pool: &SqlitePool, data: &[u8], options: &ImportOptions) -> Result<ImportPlan> {
    let rows = parse(data, options)?;
    let existing = ExistingKeys::load(pool).await?;
    Ok(plan(rows, &existing, options.policy))
}

/// Import a file: insert new rows, report duplicates.
pub async fn import_leads(
    pool: &SqlitePool,
    data: &[u8],
    options: &ImportOptions,
) -> Result<ImportReport> {
    let rows = parse(data, options)?;
    let total = rows.len();

    let existing = ExistingKeys::load(pool).await?;
    let plan = plan(rows, &existing, options.policy);

    let candidates: Vec<NewLead> = plan.fresh.into_iter().map(NewLead::from).collect();
    let inserted = if candidates.is_empty() {
        0
    } else {
        lead::create_leads(pool, &candidates).await?.len()
    };

    tracing::info!(
        rows = total,
        inserted,
        duplicates = plan.duplicates.len(),
        policy = %options.policy,
        "Import complete"
    );

    Ok(ImportReport {
        rows: total,
        inserted,
        duplicates: plan.duplicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseError;
    use crate::lead::{count_leads, create_lead, list_all};
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[test]
    fn test_parse_normalizes_phone() {
        let csv = "name,email,phone\nAlice,alice@example.com,(555) 123-4567\n,anon@example.com,n/a\n";
        let rows = parse(csv.as_bytes(), &ImportOptions::default()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].phone, "5551234567");
        assert_eq!(rows[0].name.as_deref(), Some("Alice"));
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].phone, "");
        assert_eq!(rows[1].name, None);
    }

    #[test]
    fn test_parse_custom_columns_and_delimiter() {
        let csv = "\u{feff}Nom;Adresse e-mail;Téléphone;Ville\nZoé;zoe@example.fr;06 12 34 56 78;Lyon\n";
        let options = ImportOptions {
            columns: ImportColumns::french(),
            delimiter: b';',
            ..ImportOptions::default()
        };
        let rows = parse(csv.as_bytes(), &options).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "zoe@example.fr");
        assert_eq!(rows[0].phone, "0612345678");
    }

    #[test]
    fn test_parse_missing_column() {
        let csv = "name,email\nAlice,alice@example.com\n";
        let result = parse(csv.as_bytes(), &ImportOptions::default());
        assert!(matches!(result, Err(ImportError::MissingColumn(ref c)) if c == "phone"));

        let result = parse(b"", &ImportOptions::default());
        assert!(matches!(result, Err(ImportError::MissingColumn(ref c)) if c == "name"));
    }

    #[test]
    fn test_parse_ragged_row_fails() {
        let csv = "name,email,phone\nAlice,alice@example.com\n";
        let result = parse(csv.as_bytes(), &ImportOptions::default());
        assert!(matches!(result, Err(ImportError::Csv { .. })));
    }

    #[test]
    fn test_parse_blank_email_names_line() {
        let csv = "name,email,phone\nA,a@example.com,1\nB,  ,2\n";
        let result = parse(csv.as_bytes(), &ImportOptions::default());
        assert!(matches!(result, Err(ImportError::EmptyEmail { line: 3 })));
    }

    #[tokio::test]
    async fn test_blank_email_rejected_by_preview_and_import() {
        let db = test_db().await;
        let csv = "name,email,phone\nA,a@example.com,1\nB,,2\nC,c@example.com,3\n";

        let previewed = preview(db.pool(), csv.as_bytes(), &ImportOptions::default()).await;
        assert!(matches!(
            previewed,
            Err(DatabaseError::Import(ImportError::EmptyEmail { line: 3 }))
        ));

        let imported = import_leads(db.pool(), csv.as_bytes(), &ImportOptions::default()).await;
        assert!(matches!(
            imported,
            Err(DatabaseError::Import(ImportError::EmptyEmail { line: 3 }))
        ));
        assert_eq!(count_leads(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_skips_existing_duplicates() {
        let db = test_db().await;
        create_lead(db.pool(), &NewLead::new(Some("A"), "a@example.com", "100"))
            .await
            .unwrap();
        create_lead(db.pool(), &NewLead::new(Some("B"), "b@example.com", "200"))
            .await
            .unwrap();

        let csv = "name,email,phone\n\
                   A again,a@example.com,901\n\
                   B again,b@example.com,902\n\
                   C,c@example.com,903\n\
                   D,d@example.com,904\n\
                   E,e@example.com,905\n";
        let report = import_leads(db.pool(), csv.as_bytes(), &ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(report.rows, 5);
        assert_eq!(report.inserted, 3);
        assert_eq!(report.duplicates.len(), 2);
        assert!(report
            .duplicates
            .iter()
            .all(|d| d.reason == DuplicateReason::Email));
        assert_eq!(count_leads(db.pool()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_import_keep_first_within_batch() {
        let db = test_db().await;

        let csv = "name,email,phone\nX,x@example.com,1\nY,x@example.com,2\n";
        let report = import_leads(db.pool(), csv.as_bytes(), &ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.duplicates[0].line, 3);
        assert_eq!(report.duplicates[0].reason, DuplicateReason::WithinBatch);
        assert_eq!(list_all(db.pool()).await.unwrap()[0].name.as_deref(), Some("X"));
    }

    #[tokio::test]
    async fn test_import_reject_all_within_batch() {
        let db = test_db().await;

        let csv = "name,email,phone\nX,x@example.com,1\nY,x@example.com,2\nZ,z@example.com,3\n";
        let options = ImportOptions {
            policy: BatchDuplicatePolicy::RejectAll,
            ..ImportOptions::default()
        };
        let report = import_leads(db.pool(), csv.as_bytes(), &options).await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.duplicates.len(), 2);
    }

    #[tokio::test]
    async fn test_import_insert_policy_fails_whole_batch() {
        let db = test_db().await;

        let csv = "name,email,phone\nX,x@example.com,1\nY,x@example.com,2\nZ,z@example.com,3\n";
        let options = ImportOptions {
            policy: BatchDuplicatePolicy::Insert,
            ..ImportOptions::default()
        };
        let result = import_leads(db.pool(), csv.as_bytes(), &options).await;

        assert!(matches!(result, Err(DatabaseError::Duplicate { .. })));
        assert_eq!(count_leads(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_missing_column_writes_nothing() {
        let db = test_db().await;

        let csv = "name,email\nAlice,alice@example.com\n";
        let result = import_leads(db.pool(), csv.as_bytes(), &ImportOptions::default()).await;

        assert!(matches!(
            result,
            Err(DatabaseError::Import(ImportError::MissingColumn(_)))
        ));
        assert_eq!(count_leads(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_preview_does_not_write() {
        let db = test_db().await;
        create_lead(db.pool(), &NewLead::new(None, "a@example.com", "1"))
            .await
            .unwrap();

        let csv = "name,email,phone\nA,a@example.com,9\nB,b@example.com,8\n";
        let plan = preview(db.pool(), csv.as_bytes(), &ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(plan.fresh.len(), 1);
        assert_eq!(plan.duplicates.len(), 1);
        assert_eq!(count_leads(db.pool()).await.unwrap(), 1);
    }
}
