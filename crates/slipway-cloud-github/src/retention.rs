//! Backup retention policy
//!
//! Pure evaluation of the backup set: which daily backup gets promoted
//! into the current month's monthly slot, and which backups have
//! outlived their retention window. The caller applies the resulting
//! plan to S3.

use crate::error::{GithubError, Result};
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

/// Tag names carried by every backup object.
pub mod tag {
    pub const MIGRATION_ID: &str = "migration-id";
    pub const TIMESTAMP: &str = "timestamp";
    pub const MIGRATION_CREATED_AT: &str = "migration-created-at";
    pub const ORGANISATION: &str = "organisation";
    pub const TYPE: &str = "type";
}

/// Backup cadence, stored in the `type` tag.
pub const TYPE_DAILY: &str = "daily";
pub const TYPE_MONTHLY: &str = "monthly";

/// An S3 object plus its tags.
#[derive(Debug, Clone)]
pub struct TaggedBackup {
    pub key: String,
    pub tags: BTreeMap<String, String>,
}

/// Retagging of one daily backup as the current month's monthly
/// backup.
#[derive(Debug, Clone)]
pub struct Promotion {
    pub key: String,
    pub tags: BTreeMap<String, String>,
}

/// What cleanup should do: retag at most one object, delete the listed
/// keys and raise the listed alerts.
#[derive(Debug, Clone, Default)]
pub struct RetentionPlan {
    pub promotion: Option<Promotion>,
    pub deletions: Vec<String>,
    pub alerts: Vec<String>,
}

/// Evaluate the backup set against the retention windows.
///
/// Monthly retention is counted in 31-day months so a configuration in
/// months never under-keeps. Backups with missing or unreadable tags
/// are never deleted, only alerted on.
pub fn evaluate(
    backups: &[TaggedBackup],
    today: NaiveDate,
    daily_retention_days: u32,
    monthly_retention_months: u32,
) -> Result<RetentionPlan> {
    let mut plan = RetentionPlan::default();
    let mut daily: BTreeMap<String, TaggedBackup> = BTreeMap::new();
    let mut monthly: BTreeMap<String, TaggedBackup> = BTreeMap::new();

    for backup in backups {
        let (Some(kind), Some(timestamp)) = (
            backup.tags.get(tag::TYPE),
            backup.tags.get(tag::TIMESTAMP),
        ) else {
            plan.alerts.push(format!(
                "Backup '{}' is missing a required tag ('{}' and '{}' must both be set), skipping",
                backup.key,
                tag::TYPE,
                tag::TIMESTAMP
            ));
            continue;
        };

        match kind.as_str() {
            TYPE_DAILY => {
                daily.insert(timestamp.clone(), backup.clone());
            }
            TYPE_MONTHLY => {
                monthly.insert(timestamp.clone(), backup.clone());
            }
            other => plan.alerts.push(format!(
                "Backup '{}' is tagged with an unknown backup type '{}', skipping",
                backup.key, other
            )),
        }
    }

    // An empty set means the first ever backup failed; refusing to
    // plan beats silently reporting a clean run.
    if daily.is_empty() && monthly.is_empty() {
        return Err(GithubError::NoBackupsFound);
    }

    // Keep the monthly slot filled: the newest daily backup from the
    // current month becomes the monthly backup when the month has none
    // yet.
    let current_month = today.format("%Y-%m").to_string();
    if !monthly.contains_key(&current_month) {
        let newest = daily.last_key_value().map(|(timestamp, _)| timestamp.clone());
        match newest {
            Some(timestamp) if timestamp.starts_with(&current_month) => {
                if let Some(mut backup) = daily.remove(&timestamp) {
                    backup
                        .tags
                        .insert(tag::TYPE.to_string(), TYPE_MONTHLY.to_string());
                    backup
                        .tags
                        .insert(tag::TIMESTAMP.to_string(), current_month.clone());
                    plan.promotion = Some(Promotion {
                        key: backup.key.clone(),
                        tags: backup.tags.clone(),
                    });
                    monthly.insert(current_month.clone(), backup);
                }
            }
            Some(timestamp) => plan.alerts.push(format!(
                "Could not find a daily backup to tag as a monthly backup, latest daily backup: {timestamp}"
            )),
            None => plan.alerts.push(
                "Could not find a daily backup to tag as a monthly backup".to_string(),
            ),
        }
    }

    let windows = [
        (TYPE_DAILY, u64::from(daily_retention_days), &daily),
        (
            TYPE_MONTHLY,
            u64::from(monthly_retention_months) * 31,
            &monthly,
        ),
    ];

    for (kind, retention_days, backups) in windows {
        let Some(cutoff) = today.checked_sub_days(Days::new(retention_days)) else {
            continue;
        };

        for (timestamp, backup) in backups {
            let Some(date) = parse_timestamp(timestamp) else {
                plan.alerts
                    .push(format!("Could not parse timestamp: {timestamp}"));
                continue;
            };

            if date < cutoff {
                tracing::debug!(kind, timestamp = %timestamp, "Backup has outlived its retention window");
                plan.deletions.push(backup.key.clone());
            }
        }
    }

    Ok(plan)
}

/// Daily backups carry a full date, monthly backups only a month.
fn parse_timestamp(timestamp: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(timestamp, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{timestamp}-01"), "%Y-%m-%d"))
        .ok()
}
