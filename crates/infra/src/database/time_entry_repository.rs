//! SQLite-backed implementation of the time entry store port.
//!
//! All statements run on the blocking pool via `spawn_blocking`. Status
//! transitions are enforced here, at the write layer: an update outside
//! the lifecycle table is rejected with an `InvalidInput` error instead
//! of being left to caller discipline.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use deelbridge_core::ports::{SyncCandidate, SyncFilter, TimeEntryStore};
use deelbridge_domain::{
    ContractSyncStats, DeelBridgeError, EntryStatus, Result as DomainResult, StatusBreakdown,
    SubmissionStats, TimeEntry,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use tokio::task;
use tracing::warn;

use super::manager::{map_sql_error, DbManager};
use crate::errors::map_join_error;

/// SQLite-backed time entry repository.
pub struct SqliteTimeEntryRepository {
    db: Arc<DbManager>,
}

impl SqliteTimeEntryRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert a time entry row. Entries normally arrive through the
    /// external time-recording flow; this is that flow's write path and
    /// the seeding hook for tests.
    pub async fn insert_entry(&self, entry: &TimeEntry) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let entry = entry.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                ENTRY_INSERT_SQL,
                params![
                    entry.id,
                    entry.user_id,
                    entry.email,
                    entry.hours,
                    entry.minutes,
                    entry.category,
                    entry.notes,
                    entry.count,
                    entry.date.format("%Y-%m-%d").to_string(),
                    entry.status.as_str(),
                    entry.contract_id,
                    entry.deel_timesheet_id,
                    entry.created_at.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    /// Record the profile email of a user account.
    pub async fn set_profile_email(&self, user_id: &str, email: Option<&str>) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let email = email.map(str::to_string);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO user_profiles (user_id, email) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET email = excluded.email",
                params![user_id, email],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    /// Fetch a single entry by id.
    pub async fn get_entry(&self, entry_id: &str) -> DomainResult<TimeEntry> {
        let db = Arc::clone(&self.db);
        let entry_id = entry_id.to_string();

        task::spawn_blocking(move || -> DomainResult<TimeEntry> {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!("{ENTRY_SELECT_COLUMNS} FROM time_entries t WHERE t.id = ?1"),
                params![entry_id],
                map_entry_row,
            )
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    fn current_status(conn: &Connection, entry_id: &str) -> DomainResult<EntryStatus> {
        let raw: String = conn
            .query_row("SELECT status FROM time_entries WHERE id = ?1", params![entry_id], |row| {
                row.get(0)
            })
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => {
                    DeelBridgeError::NotFound(format!("time entry {entry_id} not found"))
                }
                other => map_sql_error(other),
            })?;
        raw.parse()
    }
}

#[async_trait]
impl TimeEntryStore for SqliteTimeEntryRepository {
    async fn find_sync_candidates(&self, filter: &SyncFilter) -> DomainResult<Vec<SyncCandidate>> {
        let db = Arc::clone(&self.db);
        let status = filter.entry_status.map(|s| s.as_str().to_string());
        let include_matched = i64::from(filter.include_matched);

        task::spawn_blocking(move || -> DomainResult<Vec<SyncCandidate>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(CANDIDATES_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![status, include_matched], |row| {
                    let entry = map_entry_row(row)?;
                    let profile_email: Option<String> = row.get(13)?;
                    Ok(SyncCandidate { entry, profile_email })
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_contract_id(&self, entry_id: &str, contract_id: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let entry_id = entry_id.to_string();
        let contract_id = contract_id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(
                    "UPDATE time_entries SET contract_id = ?2 WHERE id = ?1",
                    params![entry_id, contract_id],
                )
                .map_err(map_sql_error)?;

            if updated == 0 {
                return Err(DeelBridgeError::NotFound(format!("time entry {entry_id} not found")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_submittable(
        &self,
        entry_status: Option<EntryStatus>,
    ) -> DomainResult<Vec<TimeEntry>> {
        let db = Arc::clone(&self.db);
        let status = entry_status.map(|s| s.as_str().to_string());

        task::spawn_blocking(move || -> DomainResult<Vec<TimeEntry>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(SUBMITTABLE_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![status], map_entry_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn transition_status(&self, entry_id: &str, next: EntryStatus) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let entry_id = entry_id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let current = Self::current_status(&conn, &entry_id)?;

            if !current.can_transition_to(next) {
                return Err(DeelBridgeError::InvalidInput(format!(
                    "illegal status transition {current} -> {next} for entry {entry_id}"
                )));
            }

            let updated = conn
                .execute(
                    "UPDATE time_entries SET status = ?2 WHERE id = ?1 AND status = ?3",
                    params![entry_id, next.as_str(), current.as_str()],
                )
                .map_err(map_sql_error)?;

            if updated == 0 {
                return Err(DeelBridgeError::Database(format!(
                    "time entry {entry_id} changed status concurrently"
                )));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn record_submission(&self, entry_id: &str, timesheet_id: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let entry_id = entry_id.to_string();
        let timesheet_id = timesheet_id.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let current = Self::current_status(&conn, &entry_id)?;

            if !current.can_transition_to(EntryStatus::Sent) {
                return Err(DeelBridgeError::InvalidInput(format!(
                    "cannot record submission for entry {entry_id} in status {current}"
                )));
            }

            let updated = conn
                .execute(
                    "UPDATE time_entries
                     SET deel_timesheet_id = ?2, status = 'sent'
                     WHERE id = ?1 AND status = ?3 AND deel_timesheet_id IS NULL",
                    params![entry_id, timesheet_id, current.as_str()],
                )
                .map_err(map_sql_error)?;

            if updated == 0 {
                return Err(DeelBridgeError::Database(format!(
                    "time entry {entry_id} changed concurrently while recording submission"
                )));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn contract_sync_stats(&self) -> DomainResult<ContractSyncStats> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<ContractSyncStats> {
            let conn = db.get_connection()?;

            let mut stmt = conn
                .prepare(
                    "SELECT status,
                            COALESCE(SUM(CASE WHEN contract_id IS NOT NULL THEN 1 ELSE 0 END), 0),
                            COALESCE(SUM(CASE WHEN contract_id IS NULL THEN 1 ELSE 0 END), 0)
                     FROM time_entries
                     GROUP BY status",
                )
                .map_err(map_sql_error)?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            let by_status: std::collections::BTreeMap<String, StatusBreakdown> = rows
                .into_iter()
                .map(|(status, with_contract, without_contract)| {
                    (status, StatusBreakdown { with_contract, without_contract })
                })
                .collect();
            let with_contract = by_status.values().map(|b| b.with_contract).sum::<i64>();
            let without_contract = by_status.values().map(|b| b.without_contract).sum::<i64>();

            Ok(ContractSyncStats {
                total: with_contract + without_contract,
                with_contract,
                without_contract,
                by_status,
            })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn submission_stats(&self) -> DomainResult<SubmissionStats> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<SubmissionStats> {
            let conn = db.get_connection()?;

            let total = count(&conn, "SELECT COUNT(*) FROM time_entries")?;
            let ready_to_submit = count(
                &conn,
                "SELECT COUNT(*) FROM time_entries
                 WHERE contract_id IS NOT NULL AND deel_timesheet_id IS NULL AND status = 'pending'",
            )?;
            let needs_contract_id =
                count(&conn, "SELECT COUNT(*) FROM time_entries WHERE contract_id IS NULL")?;
            let submitted = count(
                &conn,
                "SELECT COUNT(*) FROM time_entries WHERE deel_timesheet_id IS NOT NULL",
            )?;

            let mut stmt = conn
                .prepare("SELECT status, COUNT(*) FROM time_entries GROUP BY status")
                .map_err(map_sql_error)?;
            let by_status = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<std::collections::BTreeMap<_, _>>>()
                .map_err(map_sql_error)?;

            Ok(SubmissionStats { total, ready_to_submit, needs_contract_id, submitted, by_status })
        })
        .await
        .map_err(map_join_error)?
    }
}

const ENTRY_SELECT_COLUMNS: &str = "SELECT
        t.id, t.user_id, t.email, t.hours, t.minutes, t.category, t.notes, t.entry_count,
        t.entry_date, t.status, t.contract_id, t.deel_timesheet_id, t.created_at";

const ENTRY_INSERT_SQL: &str = "INSERT INTO time_entries (
        id, user_id, email, hours, minutes, category, notes, entry_count,
        entry_date, status, contract_id, deel_timesheet_id, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

const CANDIDATES_SQL: &str = "SELECT
        t.id, t.user_id, t.email, t.hours, t.minutes, t.category, t.notes, t.entry_count,
        t.entry_date, t.status, t.contract_id, t.deel_timesheet_id, t.created_at,
        p.email AS profile_email
    FROM time_entries t
    LEFT JOIN user_profiles p ON p.user_id = t.user_id
    WHERE (?1 IS NULL OR t.status = ?1)
      AND (?2 = 1 OR t.contract_id IS NULL)
    ORDER BY t.created_at ASC";

const SUBMITTABLE_SQL: &str = "SELECT
        t.id, t.user_id, t.email, t.hours, t.minutes, t.category, t.notes, t.entry_count,
        t.entry_date, t.status, t.contract_id, t.deel_timesheet_id, t.created_at
    FROM time_entries t
    WHERE t.contract_id IS NOT NULL
      AND t.deel_timesheet_id IS NULL
      AND (?1 IS NULL OR t.status = ?1)
    ORDER BY t.entry_date ASC, t.created_at ASC";

fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<TimeEntry> {
    let id: String = row.get(0)?;
    let status_raw: String = row.get(9)?;
    let status = parse_status(&id, &status_raw);

    let date_raw: String = row.get(8)?;
    let date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d")
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(err)))?;

    let created_secs: i64 = row.get(12)?;
    let created_at = DateTime::from_timestamp(created_secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(12, Type::Integer, "invalid timestamp".into())
    })?;

    Ok(TimeEntry {
        id,
        user_id: row.get(1)?,
        email: row.get(2)?,
        hours: row.get(3)?,
        minutes: row.get(4)?,
        category: row.get(5)?,
        notes: row.get(6)?,
        count: row.get(7)?,
        date,
        status,
        contract_id: row.get(10)?,
        deel_timesheet_id: row.get(11)?,
        created_at,
    })
}

fn parse_status(id: &str, raw: &str) -> EntryStatus {
    match raw.parse::<EntryStatus>() {
        Ok(status) => status,
        Err(err) => {
            warn!(
                entry_id = %id,
                raw_status = %raw,
                error = %err,
                "invalid entry status in database - defaulting to pending"
            );
            EntryStatus::Pending
        }
    }
}

fn count(conn: &Connection, sql: &str) -> DomainResult<i64> {
    conn.query_row(sql, [], |row| row.get(0)).map_err(map_sql_error)
}
