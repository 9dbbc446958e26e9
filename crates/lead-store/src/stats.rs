//! Lead statistics over the most recent window of leads.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::lead;
use crate::models::{Lead, LeadStatus};
use crate::Result;

/// Number of most recent leads the dashboard KPIs are computed over.
pub const DEFAULT_WINDOW: i64 = 50;

/// KPIs and grouped counts for a set of leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadStats {
    pub total: i64,
    pub to_call: i64,
    pub closed: i64,
    /// Percentage of closed leads, one decimal.
    pub conversion_rate: f64,
    /// Mean contact attempts, one decimal.
    pub avg_attempts: f64,
    pub daily_acquisition: Vec<DailyCount>,
    pub status_breakdown: Vec<StatusCount>,
}

/// Leads created on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Leads currently in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: LeadStatus,
    pub count: i64,
}

/// Compute statistics for the given leads.
///
/// Empty input yields zero for every ratio.
pub fn compute(leads: &[Lead]) -> LeadStats {
    let total = leads.len() as i64;

    let mut by_status: BTreeMap<LeadStatus, i64> = BTreeMap::new();
    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut attempts = 0i64;

    for lead in leads {
        *by_status.entry(lead.status).or_default() += 1;
        *by_day.entry(lead.created_at.date_naive()).or_default() += 1;
        attempts += lead.contact_attempts;
    }

    let to_call = by_status.get(&LeadStatus::ToCall).copied().unwrap_or(0);
    let closed = by_status.get(&LeadStatus::Closed).copied().unwrap_or(0);

    LeadStats {
        total,
        to_call,
        closed,
        conversion_rate: ratio(closed as f64 * 100.0, total),
        avg_attempts: ratio(attempts as f64, total),
        daily_acquisition: by_day
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect(),
        status_breakdown: by_status
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
    }
}

/// Load the `window` most recent leads and compute their statistics.
pub async fn load(pool: &SqlitePool, window: i64) -> Result<LeadStats> {
    let leads = lead::list_recent(pool, window).await?;
    Ok(compute(&leads))
}

fn ratio(numerator: f64, denominator: i64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round1(numerator / denominator as f64)
}

/// One decimal, ties to even.
fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{apply_edits, create_leads, create_leads_at};
    use crate::models::{LeadEdit, NewLead};
    use crate::Database;
    use chrono::{TimeZone, Utc};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn batch(prefix: &str, first_phone: usize, n: usize) -> Vec<NewLead> {
        (0..n)
            .map(|i| {
                NewLead::new(
                    None,
                    &format!("{prefix}{i}@example.com"),
                    &(first_phone + i).to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_set() {
        let stats = compute(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.conversion_rate, 0.0);
        assert_eq!(stats.avg_attempts, 0.0);
        assert!(stats.daily_acquisition.is_empty());
        assert!(stats.status_breakdown.is_empty());
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(ratio(1.0, 3), 0.3);
        assert_eq!(ratio(1.0, 4), 0.2);
        assert_eq!(ratio(3.0, 4), 0.8);
        assert_eq!(round1(12.25), 12.2);
    }

    #[tokio::test]
    async fn test_avg_attempts_ties_round_to_even() {
        let db = test_db().await;
        let created = create_leads(db.pool(), &batch("t", 300, 4)).await.unwrap();

        let edit = LeadEdit {
            id: created[0].id,
            status: None,
            contact_attempts: Some(1),
            notes: None,
        };
        apply_edits(db.pool(), &[edit]).await.unwrap();

        let stats = load(db.pool(), DEFAULT_WINDOW).await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.avg_attempts, 0.2);
    }

    #[tokio::test]
    async fn test_kpis() {
        let db = test_db().await;
        let created = create_leads(db.pool(), &batch("k", 100, 3)).await.unwrap();

        let edits = vec![
            LeadEdit {
                id: created[0].id,
                status: Some(LeadStatus::Closed),
                contact_attempts: Some(4),
                notes: None,
            },
            LeadEdit {
                id: created[1].id,
                status: Some(LeadStatus::Pending),
                contact_attempts: Some(1),
                notes: None,
            },
        ];
        apply_edits(db.pool(), &edits).await.unwrap();

        let stats = load(db.pool(), DEFAULT_WINDOW).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.to_call, 1);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.conversion_rate, 33.3);
        assert_eq!(stats.avg_attempts, 1.7);
        assert_eq!(
            stats.status_breakdown,
            vec![
                StatusCount { status: LeadStatus::ToCall, count: 1 },
                StatusCount { status: LeadStatus::Pending, count: 1 },
                StatusCount { status: LeadStatus::Closed, count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_daily_acquisition_same_day() {
        let db = test_db().await;
        let day = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        create_leads_at(db.pool(), &batch("d", 100, 3), day).await.unwrap();

        let stats = load(db.pool(), DEFAULT_WINDOW).await.unwrap();
        assert_eq!(
            stats.daily_acquisition,
            vec![DailyCount {
                date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
                count: 3
            }]
        );
    }

    #[tokio::test]
    async fn test_window_limits_loaded_leads() {
        let db = test_db().await;
        let old = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let new = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        create_leads_at(db.pool(), &batch("old", 100, 2), old).await.unwrap();
        create_leads_at(db.pool(), &batch("new", 200, 3), new).await.unwrap();

        let stats = load(db.pool(), 3).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.daily_acquisition.len(), 1);
        assert_eq!(stats.daily_acquisition[0].date, new.date_naive());

        let stats = load(db.pool(), DEFAULT_WINDOW).await.unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.daily_acquisition[0].count, 2);
    }
}
