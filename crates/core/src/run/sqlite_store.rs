//! SQLite-backed run store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::{CreateRunRequest, RunError, RunField, RunFilter, RunRecord, RunStatus, RunStore};

const RUN_COLUMNS: &str = "id, topic, tone, duration_secs, platform, use_captions, \
     trend_source_url, status, progress, analysis, draft, voice_url, music_url, video_url, \
     error, created_at, updated_at";

/// Fixed-width RFC 3339 so lexical order matches time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite-backed run store.
pub struct SqliteRunStore {
    conn: Mutex<Connection>,
}

impl SqliteRunStore {
    /// Create a new SQLite run store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, RunError> {
        let conn = Connection::open(path).map_err(RunError::database)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite run store (useful for testing).
    pub fn in_memory() -> Result<Self, RunError> {
        let conn = Connection::open_in_memory().map_err(RunError::database)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RunError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                topic TEXT NOT NULL,
                tone TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                platform TEXT NOT NULL,
                use_captions INTEGER NOT NULL DEFAULT 1,
                trend_source_url TEXT,
                status TEXT NOT NULL,
                progress INTEGER NOT NULL DEFAULT 0,
                analysis TEXT,
                draft TEXT,
                voice_url TEXT,
                music_url TEXT,
                video_url TEXT,
                error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_runs_topic_status ON runs(topic, status);
            CREATE INDEX IF NOT EXISTS idx_runs_created_at ON runs(created_at);
            "#,
        )
        .map_err(RunError::database)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RunError> {
        self.conn
            .lock()
            .map_err(|_| RunError::Database("connection mutex poisoned".to_string()))
    }

    fn build_where_clause(filter: &RunFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(ref topic) = filter.topic {
            conditions.push("topic = ?");
            params.push(Box::new(topic.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn decode_json<T: DeserializeOwned>(id: &str, column: &str, json: Option<String>) -> Option<T> {
        let json = json?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding undecodable {} for run {}: {}", column, id, e);
                None
            }
        }
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_run(row: &rusqlite::Row) -> rusqlite::Result<RunRecord> {
        let id: String = row.get(0)?;
        let status_str: String = row.get(7)?;
        let progress: i64 = row.get(8)?;
        let analysis_json: Option<String> = row.get(9)?;
        let draft_json: Option<String> = row.get(10)?;
        let created_at_str: String = row.get(15)?;
        let updated_at_str: String = row.get(16)?;

        let status = status_str.parse::<RunStatus>().unwrap_or_else(|e| {
            warn!("Run {} has {}; treating as ERROR", id, e);
            RunStatus::Error
        });

        Ok(RunRecord {
            topic: row.get(1)?,
            tone: row.get(2)?,
            duration_secs: row.get(3)?,
            platform: row.get(4)?,
            use_captions: row.get(5)?,
            trend_source_url: row.get(6)?,
            status,
            progress: progress.clamp(0, 100) as u8,
            analysis: Self::decode_json(&id, "analysis", analysis_json),
            draft: Self::decode_json(&id, "draft", draft_json),
            voice_url: row.get(11)?,
            music_url: row.get(12)?,
            video_url: row.get(13)?,
            error: row.get(14)?,
            created_at: Self::parse_timestamp(&created_at_str),
            updated_at: Self::parse_timestamp(&updated_at_str),
            id,
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<RunRecord, RunError> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?", RUN_COLUMNS);
        match conn.query_row(&sql, params![id], Self::row_to_run) {
            Ok(run) => Ok(run),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(RunError::NotFound(id.to_string())),
            Err(e) => Err(RunError::database(e)),
        }
    }

    fn execute_on_existing(
        conn: &Connection,
        id: &str,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<(), RunError> {
        let changed = conn.execute(sql, params).map_err(RunError::database)?;
        if changed == 0 {
            return Err(RunError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl RunStore for SqliteRunStore {
    fn create(&self, request: CreateRunRequest) -> Result<RunRecord, RunError> {
        let conn = self.lock()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let status = RunStatus::Initializing;

        conn.execute(
            "INSERT INTO runs (id, topic, tone, duration_secs, platform, use_captions, status, progress, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
            params![
                id,
                request.topic,
                request.tone,
                request.duration_secs,
                request.platform,
                request.use_captions,
                status.as_str(),
                timestamp(now),
                timestamp(now),
            ],
        )
        .map_err(RunError::database)?;

        Ok(RunRecord {
            id,
            topic: request.topic,
            tone: request.tone,
            duration_secs: request.duration_secs,
            platform: request.platform,
            use_captions: request.use_captions,
            trend_source_url: None,
            status,
            progress: 0,
            analysis: None,
            draft: None,
            voice_url: None,
            music_url: None,
            video_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<RunRecord>, RunError> {
        let conn = self.lock()?;
        match Self::fetch(&conn, id) {
            Ok(run) => Ok(Some(run)),
            Err(RunError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list(&self, filter: &RunFilter) -> Result<Vec<RunRecord>, RunError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM runs {} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            RUN_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql).map_err(RunError::database)?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_run)
            .map_err(RunError::database)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(RunError::database)
    }

    fn count(&self, filter: &RunFilter) -> Result<i64, RunError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM runs {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(RunError::database)
    }

    fn find_latest_failed_by_topic(&self, topic: &str) -> Result<Option<RunRecord>, RunError> {
        let conn = self.lock()?;

        let sql = format!(
            "SELECT {} FROM runs WHERE topic = ? AND status = ? ORDER BY created_at DESC, rowid DESC LIMIT 1",
            RUN_COLUMNS
        );

        match conn.query_row(
            &sql,
            params![topic, RunStatus::Error.as_str()],
            Self::row_to_run,
        ) {
            Ok(run) => Ok(Some(run)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RunError::database(e)),
        }
    }

    fn begin_attempt(&self, id: &str) -> Result<RunRecord, RunError> {
        let conn = self.lock()?;
        let now = timestamp(Utc::now());

        Self::execute_on_existing(
            &conn,
            id,
            "UPDATE runs SET status = ?, progress = 0, error = NULL, updated_at = ? WHERE id = ?",
            params![RunStatus::Initializing.as_str(), now, id],
        )?;

        Self::fetch(&conn, id)
    }

    fn update_progress(
        &self,
        id: &str,
        status: RunStatus,
        progress: u8,
    ) -> Result<RunRecord, RunError> {
        let conn = self.lock()?;
        let now = timestamp(Utc::now());
        let progress = progress.min(100);

        Self::execute_on_existing(
            &conn,
            id,
            "UPDATE runs SET status = ?, progress = MAX(progress, ?), updated_at = ? WHERE id = ?",
            params![status.as_str(), progress, now, id],
        )?;

        Self::fetch(&conn, id)
    }

    fn update_field(&self, id: &str, field: RunField) -> Result<(), RunError> {
        let conn = self.lock()?;
        let now = timestamp(Utc::now());

        let (column, value): (&str, Option<String>) = match field {
            RunField::TrendSourceUrl(url) => ("trend_source_url", url),
            RunField::Analysis(analysis) => (
                "analysis",
                Some(serde_json::to_string(&analysis).map_err(RunError::database)?),
            ),
            RunField::Draft(draft) => (
                "draft",
                Some(serde_json::to_string(&draft).map_err(RunError::database)?),
            ),
            RunField::VoiceUrl(url) => ("voice_url", Some(url)),
            RunField::MusicUrl(url) => ("music_url", Some(url)),
            RunField::VideoUrl(url) => ("video_url", Some(url)),
        };

        let sql = format!("UPDATE runs SET {} = ?, updated_at = ? WHERE id = ?", column);
        Self::execute_on_existing(&conn, id, &sql, params![value, now, id])
    }

    fn fail(&self, id: &str, error: &str) -> Result<RunRecord, RunError> {
        let conn = self.lock()?;
        let now = timestamp(Utc::now());

        Self::execute_on_existing(
            &conn,
            id,
            "UPDATE runs SET status = ?, error = ?, updated_at = ? WHERE id = ?",
            params![RunStatus::Error.as_str(), error, now, id],
        )?;

        Self::fetch(&conn, id)
    }

    fn transition(
        &self,
        id: &str,
        expected: RunStatus,
        next: RunStatus,
        operation: &str,
    ) -> Result<RunRecord, RunError> {
        let conn = self.lock()?;
        let current = Self::fetch(&conn, id)?;

        if current.status != expected {
            return Err(RunError::InvalidState {
                run_id: id.to_string(),
                current_status: current.status,
                operation: operation.to_string(),
            });
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE runs SET status = ?, updated_at = ? WHERE id = ?",
            params![next.as_str(), timestamp(now), id],
        )
        .map_err(RunError::database)?;

        Ok(RunRecord {
            status: next,
            updated_at: now,
            ..current
        })
    }

    fn delete(&self, id: &str) -> Result<RunRecord, RunError> {
        let conn = self.lock()?;
        let run = Self::fetch(&conn, id)?;

        conn.execute("DELETE FROM runs WHERE id = ?", params![id])
            .map_err(RunError::database)?;

        Ok(run)
    }
}
