use super::{
    EstimateListing, EstimateStore, PersistenceError, PersistenceResult, StoredEstimate,
};
use crate::estimate::ProjectEstimate;
use crate::progress::{ProgressRecord, ProgressUpdate};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::sync::Mutex;

pub struct SqliteEstimateStore {
    connection: Mutex<Connection>,
}

fn parse_timestamp(value: &str) -> PersistenceResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| PersistenceError::InvalidData(format!("invalid timestamp '{value}': {err}")))
}

struct ProgressRow {
    element_id: String,
    allocated_days: f64,
    actual_days: f64,
    deviation_notified: bool,
    started_at: String,
}

impl ProgressRow {
    const COLUMNS: &'static str = "element, allocated_days, actual_days, deviation_notified, started_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            element_id: row.get(0)?,
            allocated_days: row.get(1)?,
            actual_days: row.get(2)?,
            deviation_notified: row.get(3)?,
            started_at: row.get(4)?,
        })
    }

    fn into_record(self) -> PersistenceResult<ProgressRecord> {
        Ok(ProgressRecord {
            element_id: self.element_id,
            allocated_days: self.allocated_days,
            actual_days: self.actual_days,
            deviation_notified: self.deviation_notified,
            started_at: parse_timestamp(&self.started_at)?,
        })
    }
}

impl SqliteEstimateStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS estimates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_name TEXT NOT NULL,
                country TEXT NOT NULL DEFAULT 'UK',
                time_frame_days REAL NOT NULL,
                created_at TEXT NOT NULL,
                estimate_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS installation_progress (
                estimate_id INTEGER NOT NULL REFERENCES estimates(id) ON DELETE CASCADE,
                element TEXT NOT NULL,
                allocated_days REAL NOT NULL,
                actual_days REAL NOT NULL DEFAULT 0,
                deviation_notified INTEGER NOT NULL DEFAULT 0,
                started_at TEXT NOT NULL,
                PRIMARY KEY (estimate_id, element)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn estimate_exists(connection: &Connection, id: i64) -> PersistenceResult<bool> {
        let found = connection
            .query_row("SELECT 1 FROM estimates WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }
}

impl EstimateStore for SqliteEstimateStore {
    fn save_estimate(&self, estimate: &ProjectEstimate) -> PersistenceResult<i64> {
        super::validate_estimate(estimate)?;
        let json = serde_json::to_string(estimate)?;
        let created_at = Utc::now();
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO estimates (project_name, country, time_frame_days, created_at, estimate_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                estimate.project_name,
                estimate.country,
                estimate.time_frame_days,
                created_at.to_rfc3339(),
                json
            ],
        )?;
        let id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO installation_progress
                 (estimate_id, element, allocated_days, actual_days, deviation_notified, started_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in ProgressRecord::for_estimate(estimate) {
                stmt.execute(params![
                    id,
                    record.element_id,
                    record.allocated_days,
                    record.actual_days,
                    record.deviation_notified,
                    record.started_at.to_rfc3339()
                ])?;
            }
        }
        tx.commit()?;
        tracing::info!(id, project = %estimate.project_name, "estimate committed");
        Ok(id)
    }

    fn load_estimate(&self, id: i64) -> PersistenceResult<Option<StoredEstimate>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT created_at, estimate_json FROM estimates WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((created_at, json)) = row else {
            return Ok(None);
        };
        Ok(Some(StoredEstimate {
            id,
            created_at: parse_timestamp(&created_at)?,
            estimate: serde_json::from_str(&json)?,
        }))
    }

    fn list_estimates(&self) -> PersistenceResult<Vec<EstimateListing>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt =
            conn.prepare("SELECT id, created_at, estimate_json FROM estimates ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut listings = Vec::new();
        for row in rows {
            let (id, created_at, json) = row?;
            let estimate: ProjectEstimate = serde_json::from_str(&json)?;
            listings.push(EstimateListing {
                id,
                created_at: parse_timestamp(&created_at)?,
                summary: estimate.summary(),
            });
        }
        Ok(listings)
    }

    fn progress_records(&self, id: i64) -> PersistenceResult<Vec<ProgressRecord>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        if !Self::estimate_exists(&conn, id)? {
            return Err(PersistenceError::NotFound(id));
        }
        let sql = format!(
            "SELECT {} FROM installation_progress WHERE estimate_id = ?1 ORDER BY rowid ASC",
            ProgressRow::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![id], ProgressRow::from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn update_progress(
        &self,
        id: i64,
        element_id: &str,
        actual_days: f64,
    ) -> PersistenceResult<Option<ProgressUpdate>> {
        super::validate_actual_days(element_id, actual_days)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !Self::estimate_exists(&tx, id)? {
            return Err(PersistenceError::NotFound(id));
        }
        let sql = format!(
            "SELECT {} FROM installation_progress WHERE estimate_id = ?1 AND element = ?2",
            ProgressRow::COLUMNS
        );
        let row = tx
            .query_row(&sql, params![id, element_id], ProgressRow::from_row)
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut record = row.into_record()?;
        let event = record.record(actual_days);
        tx.execute(
            "UPDATE installation_progress SET actual_days = ?1, deviation_notified = ?2
             WHERE estimate_id = ?3 AND element = ?4",
            params![record.actual_days, record.deviation_notified, id, element_id],
        )?;
        tx.commit()?;
        Ok(Some(ProgressUpdate { record, event }))
    }
}
