//! SQLite-backed reference store.
//!
//! One `issues` table plus a `code_sequences` high-water table that
//! guarantees public codes are never reused. Timestamps are stored as
//! microseconds since the Unix epoch; the occurrence date as ISO text.
//!
//! Filtering builds the WHERE clause dynamically and mirrors
//! [`IssueFilter::matches`] exactly, so the in-memory store and this one
//! are interchangeable under the contract tests.

use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::path::Path;

use super::{
    Caller, IssueDraft, IssueEdit, IssueFilter, IssueStore, build_issue, ensure_editable,
    now_us, require_admin, require_authenticated, require_owner,
};
use crate::error::{Error, Result};
use crate::lifecycle::{self, TransitionPolicy};
use crate::model::{Issue, MediaRef, PublicCode, ReporterSnapshot, Status};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS issues (
    id                       TEXT PRIMARY KEY CHECK (id LIKE 'iss-%'),
    public_code              TEXT NOT NULL UNIQUE CHECK (public_code LIKE 'JD-%'),
    title                    TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description              TEXT NOT NULL,
    location                 TEXT NOT NULL,
    occurred_on              TEXT NOT NULL,
    status                   TEXT NOT NULL
        CHECK (status IN ('open', 'pending', 'resolved', 'rejected')),
    reporter_id              TEXT NOT NULL,
    reporter_name            TEXT NOT NULL,
    reporter_contact         TEXT NOT NULL,
    reporter_category        TEXT NOT NULL,
    reporter_category_detail TEXT,
    media                    TEXT NOT NULL DEFAULT '[]',
    created_at_us            INTEGER NOT NULL,
    resolved_at_us           INTEGER,
    CHECK ((status = 'resolved') = (resolved_at_us IS NOT NULL))
);
CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
CREATE INDEX IF NOT EXISTS idx_issues_reporter ON issues(reporter_id);
CREATE TABLE IF NOT EXISTS code_sequences (
    day  TEXT PRIMARY KEY,
    next INTEGER NOT NULL
);
";

const ISSUE_COLUMNS: &str = "id, public_code, title, description, location, occurred_on, \
     status, reporter_id, reporter_name, reporter_contact, reporter_category, \
     reporter_category_detail, media, created_at_us, resolved_at_us";

/// Durable [`IssueStore`] implementation over one SQLite database.
pub struct SqliteStore {
    conn: Connection,
    policy: Box<dyn TransitionPolicy + Send + Sync>,
}

impl SqliteStore {
    /// Open (and initialise) the database at `path` with the permissive
    /// transition policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the database cannot be opened or the
    /// schema cannot be applied.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open issue database at {}", path.display()))?;
        Self::from_connection(conn, lifecycle::configured(false))
    }

    /// Open an in-memory database (tests, throwaway sessions).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if initialisation fails.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory issue database")?;
        Self::from_connection(conn, lifecycle::configured(false))
    }

    /// Swap the transition policy (used when config enables strict mode).
    pub fn set_policy(&mut self, policy: Box<dyn TransitionPolicy + Send + Sync>) {
        self.policy = policy;
    }

    fn from_connection(
        conn: Connection,
        policy: Box<dyn TransitionPolicy + Send + Sync>,
    ) -> Result<Self> {
        conn.execute_batch(SCHEMA).context("apply issue schema")?;
        Ok(Self { conn, policy })
    }

    fn load(&self, id: &str) -> Result<Issue> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1");
        let issue = self
            .conn
            .query_row(&sql, params![id], row_to_issue)
            .optional()
            .with_context(|| format!("load issue '{id}'"))?;
        issue.ok_or_else(|| Error::not_found(id))
    }

    fn persist_status(&self, issue: &Issue) -> Result<()> {
        self.conn
            .execute(
                "UPDATE issues SET status = ?1, resolved_at_us = ?2 WHERE id = ?3",
                params![
                    issue.status.as_str(),
                    issue.resolved_at.map(|t| t.timestamp_micros()),
                    issue.id
                ],
            )
            .with_context(|| format!("persist status for '{}'", issue.id))?;
        Ok(())
    }

    fn next_sequence_for(&mut self, day: NaiveDate) -> Result<u32> {
        let day = day.to_string();
        let tx = self.conn.transaction().context("begin sequence transaction")?;
        let current: Option<u32> = tx
            .query_row(
                "SELECT next FROM code_sequences WHERE day = ?1",
                params![day],
                |row| row.get(0),
            )
            .optional()
            .context("read code sequence")?;
        let sequence = current.unwrap_or(1);
        tx.execute(
            "INSERT INTO code_sequences (day, next) VALUES (?1, ?2) \
             ON CONFLICT(day) DO UPDATE SET next = ?2",
            params![day, sequence + 1],
        )
        .context("advance code sequence")?;
        tx.commit().context("commit sequence transaction")?;
        Ok(sequence)
    }
}

fn conversion_err(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

#[derive(Debug)]
struct BadTimestamp(i64);

impl std::fmt::Display for BadTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timestamp {} out of range", self.0)
    }
}

impl std::error::Error for BadTimestamp {}

fn timestamp_from_us(index: usize, us: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us).ok_or_else(|| conversion_err(index, BadTimestamp(us)))
}

fn row_to_issue(row: &rusqlite::Row<'_>) -> rusqlite::Result<Issue> {
    let public_code: String = row.get(1)?;
    let public_code: PublicCode =
        public_code.parse().map_err(|e| conversion_err(1, e))?;

    let occurred_on: String = row.get(5)?;
    let occurred_on: NaiveDate = occurred_on
        .parse()
        .map_err(|e: chrono::ParseError| conversion_err(5, e))?;

    let status: String = row.get(6)?;
    let status: Status = status.parse().map_err(|e| conversion_err(6, e))?;

    let media: String = row.get(12)?;
    let media: Vec<MediaRef> =
        serde_json::from_str(&media).map_err(|e| conversion_err(12, e))?;

    let created_at = timestamp_from_us(13, row.get(13)?)?;
    let resolved_at = row
        .get::<_, Option<i64>>(14)?
        .map(|us| timestamp_from_us(14, us))
        .transpose()?;

    Ok(Issue {
        id: row.get(0)?,
        public_code,
        title: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        occurred_on,
        status,
        reporter: ReporterSnapshot {
            id: row.get(7)?,
            name: row.get(8)?,
            contact: row.get(9)?,
            category: row.get(10)?,
            category_detail: row.get(11)?,
        },
        media,
        created_at,
        resolved_at,
    })
}

fn insert_issue(conn: &Connection, issue: &Issue) -> Result<()> {
    let media = serde_json::to_string(&issue.media).context("encode media refs")?;
    conn.execute(
        "INSERT INTO issues (id, public_code, title, description, location, occurred_on, \
         status, reporter_id, reporter_name, reporter_contact, reporter_category, \
         reporter_category_detail, media, created_at_us, resolved_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            issue.id,
            issue.public_code.as_str(),
            issue.title,
            issue.description,
            issue.location,
            issue.occurred_on.to_string(),
            issue.status.as_str(),
            issue.reporter.id,
            issue.reporter.name,
            issue.reporter.contact,
            issue.reporter.category,
            issue.reporter.category_detail,
            media,
            issue.created_at.timestamp_micros(),
            issue.resolved_at.map(|t| t.timestamp_micros()),
        ],
    )
    .with_context(|| format!("insert issue '{}'", issue.id))?;
    Ok(())
}

impl IssueStore for SqliteStore {
    fn list(&self, filter: &IssueFilter, caller: &Caller) -> Result<Vec<Issue>> {
        require_admin(caller)?;

        let mut conditions: Vec<String> = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            param_values.push(Box::new(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", param_values.len()));
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            param_values.push(Box::new(pattern));
            let n = param_values.len();
            conditions.push(format!(
                "(LOWER(public_code) LIKE ?{n} OR LOWER(title) LIKE ?{n} \
                 OR LOWER(description) LIKE ?{n})"
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues{where_clause} \
             ORDER BY created_at_us DESC, rowid DESC"
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("prepare list query: {sql}"))?;

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(AsRef::as_ref).collect();

        let rows = stmt
            .query_map(params_from_iter(params_ref), row_to_issue)
            .context("execute list query")?;

        let mut issues = Vec::new();
        for row in rows {
            issues.push(row.context("read issue row")?);
        }
        Ok(issues)
    }

    fn list_for_reporter(&self, reporter_id: &str, caller: &Caller) -> Result<Vec<Issue>> {
        require_authenticated(caller)?;
        if let Some(id) = caller.citizen_id() {
            if id != reporter_id {
                return Err(Error::authorization("citizens may only list their own issues"));
            }
        }

        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE reporter_id = ?1 \
             ORDER BY created_at_us DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare reporter query")?;
        let rows = stmt
            .query_map(params![reporter_id], row_to_issue)
            .context("execute reporter query")?;

        let mut issues = Vec::new();
        for row in rows {
            issues.push(row.context("read issue row")?);
        }
        Ok(issues)
    }

    fn get(&self, id: &str, caller: &Caller) -> Result<Issue> {
        require_authenticated(caller)?;
        self.load(id)
    }

    fn find_by_public_code(&self, code: &str, caller: &Caller) -> Result<Issue> {
        require_authenticated(caller)?;
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE public_code = ?1");
        let issue = self
            .conn
            .query_row(&sql, params![code.trim()], row_to_issue)
            .optional()
            .with_context(|| format!("look up public code '{code}'"))?;
        issue.ok_or_else(|| Error::not_found(code))
    }

    fn create(&mut self, draft: IssueDraft, caller: &Caller) -> Result<Issue> {
        require_authenticated(caller)?;
        let Some(citizen) = caller.citizen_id() else {
            return Err(Error::authorization("only citizens may report issues"));
        };
        if citizen != draft.reporter.id {
            return Err(Error::authorization("reporter snapshot does not match the caller"));
        }
        draft.validate()?;

        let now = now_us();
        let sequence = self.next_sequence_for(now.date_naive())?;
        let issue = build_issue(draft, sequence, now)?;
        insert_issue(&self.conn, &issue)?;
        tracing::info!(code = %issue.public_code, "issue created");
        Ok(issue)
    }

    fn update(&mut self, id: &str, edit: &IssueEdit, caller: &Caller) -> Result<Issue> {
        let mut issue = self.load(id)?;
        ensure_editable(&issue)?;
        require_owner(caller, &issue)?;
        edit.validate()?;

        edit.apply_to(&mut issue);
        let media = serde_json::to_string(&issue.media).context("encode media refs")?;
        self.conn
            .execute(
                "UPDATE issues SET title = ?1, description = ?2, location = ?3, \
                 occurred_on = ?4, media = ?5 WHERE id = ?6",
                params![
                    issue.title,
                    issue.description,
                    issue.location,
                    issue.occurred_on.to_string(),
                    media,
                    issue.id
                ],
            )
            .with_context(|| format!("persist edit for '{id}'"))?;
        Ok(issue)
    }

    fn delete(&mut self, id: &str, caller: &Caller) -> Result<()> {
        let issue = self.load(id)?;
        ensure_editable(&issue)?;
        require_owner(caller, &issue)?;

        self.conn
            .execute("DELETE FROM issues WHERE id = ?1", params![id])
            .with_context(|| format!("delete issue '{id}'"))?;
        tracing::info!(code = %issue.public_code, "issue deleted");
        Ok(())
    }

    fn update_status(&mut self, id: &str, to: Status, caller: &Caller) -> Result<Issue> {
        require_admin(caller)?;
        let mut issue = self.load(id)?;
        lifecycle::apply_transition(&mut issue, to, now_us(), self.policy.as_ref())?;
        self.persist_status(&issue)?;
        Ok(issue)
    }
}
