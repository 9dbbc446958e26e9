//! Lead CRUD operations.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::duplicate;
use crate::error::{DatabaseError, Result};
use crate::models::{Lead, LeadEdit, NewLead};
use crate::validation::{normalize_phone, validate_edit, validate_new_lead};

/// Create a lead from manual entry.
///
/// The duplicate check and the insert share one transaction, so a rejected
/// candidate leaves the table unchanged.
pub async fn create_lead(pool: &SqlitePool, lead: &NewLead) -> Result<Lead> {
    validate_new_lead(lead)?;
    let phone = normalize_phone(&lead.phone);

    let mut tx = pool.begin().await?;

    if let Some(existing) = duplicate::find_duplicate(&mut *tx, &lead.email, &phone).await? {
        tracing::warn!(
            existing_id = existing.id,
            email = %lead.email,
            phone = %phone,
            "Rejected duplicate lead"
        );
        return Err(DatabaseError::Duplicate {
            email: lead.email.clone(),
            phone,
        });
    }

    let created = insert_row(&mut *tx, lead, &phone, Utc::now()).await?;
    tx.commit().await?;

    tracing::info!(id = created.id, "Lead created");
    Ok(created)
}

/// Insert a batch of leads with the current time as creation timestamp.
///
/// See [`create_leads_at`].
pub async fn create_leads(pool: &SqlitePool, leads: &[NewLead]) -> Result<Vec<Lead>> {
    create_leads_at(pool, leads, Utc::now()).await
}

/// Insert a batch of leads sharing one creation timestamp.
///
/// Callers are expected to filter duplicates first. Any uniqueness
/// violation aborts the whole batch and nothing is written.
pub async fn create_leads_at(
    pool: &SqlitePool,
    leads: &[NewLead],
    created_at: DateTime<Utc>,
) -> Result<Vec<Lead>> {
    for lead in leads {
        validate_new_lead(lead)?;
    }

    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(leads.len());

    for lead in leads {
        let phone = normalize_phone(&lead.phone);
        created.push(insert_row(&mut *tx, lead, &phone, created_at).await?);
    }

    tx.commit().await?;

    tracing::info!(count = created.len(), "Bulk insert complete");
    Ok(created)
}

async fn insert_row<'e, E>(
    executor: E,
    lead: &NewLead,
    phone: &str,
    created_at: DateTime<Utc>,
) -> Result<Lead>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Lead>(
        r#"
        INSERT INTO leads (name, email, phone, notes, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, name, email, phone, status, notes, created_at, last_contact, contact_attempts
        "#,
    )
    .bind(&lead.name)
    .bind(&lead.email)
    .bind(phone)
    .bind(&lead.notes)
    .bind(created_at)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::Duplicate {
                    email: lead.email.clone(),
                    phone: phone.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })
}

/// Get a lead by ID.
pub async fn get_lead(pool: &SqlitePool, id: i64) -> Result<Lead> {
    sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, name, email, phone, status, notes, created_at, last_contact, contact_attempts
        FROM leads
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::lead_not_found(id))
}

/// List the most recently created leads, newest first.
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<Lead>> {
    let leads = sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, name, email, phone, status, notes, created_at, last_contact, contact_attempts
        FROM leads
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(leads)
}

/// List every lead.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Lead>> {
    let leads = sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, name, email, phone, status, notes, created_at, last_contact, contact_attempts
        FROM leads
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(leads)
}

/// Count total leads.
pub async fn count_leads(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM leads
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Apply a single row edit and return the updated lead.
pub async fn update_lead(pool: &SqlitePool, edit: &LeadEdit) -> Result<Lead> {
    validate_edit(edit)?;
    apply_edit(pool, edit).await?;
    get_lead(pool, edit.id).await
}

/// Save edited rows of the operator table.
///
/// Each row is updated by ID inside one transaction; leads not named in
/// `edits` are never touched. An unknown ID rolls back the whole save.
pub async fn apply_edits(pool: &SqlitePool, edits: &[LeadEdit]) -> Result<u64> {
    for edit in edits {
        validate_edit(edit)?;
    }

    let mut tx = pool.begin().await?;
    let mut updated = 0;

    for edit in edits {
        apply_edit(&mut *tx, edit).await?;
        updated += 1;
    }

    tx.commit().await?;

    tracing::info!(updated, "Saved lead edits");
    Ok(updated)
}

async fn apply_edit<'e, E>(executor: E, edit: &LeadEdit) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET status = COALESCE(?, status),
            contact_attempts = COALESCE(?, contact_attempts),
            notes = COALESCE(?, notes)
        WHERE id = ?
        "#,
    )
    .bind(edit.status)
    .bind(edit.contact_attempts)
    .bind(&edit.notes)
    .bind(edit.id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::lead_not_found(edit.id));
    }

    Ok(())
}

/// Record a contact attempt: bump the counter and stamp `last_contact`.
pub async fn record_contact(pool: &SqlitePool, id: i64) -> Result<Lead> {
    sqlx::query_as::<_, Lead>(
        r#"
        UPDATE leads
        SET contact_attempts = contact_attempts + 1,
            last_contact = ?
        WHERE id = ?
        RETURNING id, name, email, phone, status, notes, created_at, last_contact, contact_attempts
        "#,
    )
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::lead_not_found(id))
}
