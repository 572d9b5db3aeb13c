//! SQLite-backed citation store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::judgment::{AccuracyCheck, FlaggedCitation, Verdict};
use crate::store::schema::{initialize_schema, is_initialized};

/// Persistent quote + accuracy row for one `(page, footnote)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationQuoteRecord {
    pub page_id: String,
    pub footnote: u32,
    pub claim: String,
    pub quote: Option<String>,
    pub quote_location: Option<String>,
    pub verification_method: Option<String>,
    pub verification_score: Option<f64>,
    pub verdict: Option<Verdict>,
    pub accuracy_score: Option<f64>,
    pub issues: Vec<String>,
    pub supporting_quotes: Vec<String>,
    pub difficulty: Option<String>,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
    /// When the accuracy check last ran.
    pub checked_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Cached fetched page, keyed by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationContentRecord {
    pub url: String,
    pub html: Option<String>,
    pub text: Option<String>,
    pub title: Option<String>,
    pub status: Option<u16>,
    /// Hex sha-256 of the fetched body.
    pub content_hash: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// One audit-trail entry for an automated edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditLogEntry {
    pub id: Uuid,
    pub page_id: String,
    pub tool: String,
    pub agency: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Fields written by the extraction pass. Accuracy fields are written
/// separately and preserved across re-extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionUpdate {
    pub claim: String,
    pub quote: Option<String>,
    pub quote_location: Option<String>,
    pub verification_method: Option<String>,
    pub verification_score: Option<f64>,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
}

/// SQLite-backed citation store.
#[derive(Clone)]
pub struct CitationStore {
    conn: Arc<Mutex<Connection>>,
}

impl CitationStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| Error::store(e.to_string()))?;
        if !is_initialized(&conn) {
            initialize_schema(&conn).map_err(|e| Error::store(e.to_string()))?;
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::store(e.to_string()))?;
        initialize_schema(&conn).map_err(|e| Error::store(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::Internal(format!("Failed to lock connection: {}", e)))?;
        f(&conn).map_err(|e| Error::store(e.to_string()))
    }

    // ==================== Quote rows ====================

    /// Upsert the extraction fields for one citation, preserving any
    /// previously recorded accuracy fields.
    pub fn upsert_extraction(
        &self,
        page_id: &str,
        footnote: u32,
        update: &ExtractionUpdate,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO citation_quotes (
                    page_id, footnote, claim, quote, quote_location,
                    verification_method, verification_score, source_url,
                    source_title, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(page_id, footnote) DO UPDATE SET
                    claim = excluded.claim,
                    quote = excluded.quote,
                    quote_location = excluded.quote_location,
                    verification_method = excluded.verification_method,
                    verification_score = excluded.verification_score,
                    source_url = excluded.source_url,
                    source_title = excluded.source_title,
                    updated_at = excluded.updated_at",
                params![
                    page_id,
                    footnote,
                    update.claim,
                    update.quote,
                    update.quote_location,
                    update.verification_method,
                    update.verification_score,
                    update.source_url,
                    update.source_title,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Record an accuracy check for one citation.
    pub fn record_accuracy(
        &self,
        page_id: &str,
        footnote: u32,
        check: &AccuracyCheck,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE citation_quotes SET
                    verdict = ?3,
                    accuracy_score = ?4,
                    issues = ?5,
                    supporting_quotes = ?6,
                    difficulty = ?7,
                    checked_at = ?8,
                    updated_at = ?8
                 WHERE page_id = ?1 AND footnote = ?2",
                params![
                    page_id,
                    footnote,
                    check.verdict.as_str(),
                    check.score,
                    serde_json::to_string(&check.issues).unwrap_or_default(),
                    serde_json::to_string(&check.supporting_quotes).unwrap_or_default(),
                    check.difficulty,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Get one quote row.
    pub fn get_quote(&self, page_id: &str, footnote: u32) -> Result<Option<CitationQuoteRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{} WHERE page_id = ?1 AND footnote = ?2", Self::QUOTE_SELECT),
                params![page_id, footnote],
                Self::row_to_quote,
            )
            .optional()
        })
    }

    /// All quote rows for a page, ordered by footnote.
    pub fn page_quotes(&self, page_id: &str) -> Result<Vec<CitationQuoteRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE page_id = ?1 ORDER BY footnote",
                Self::QUOTE_SELECT
            ))?;
            let rows = stmt.query_map(params![page_id], Self::row_to_quote)?;
            rows.collect()
        })
    }

    /// Citations flagged for repair: verdict inaccurate or unsupported.
    pub fn flagged_citations(&self, page_id: &str) -> Result<Vec<FlaggedCitation>> {
        let quotes = self.page_quotes(page_id)?;
        Ok(quotes
            .into_iter()
            .filter(|q| q.verdict.map(|v| v.is_flagged()).unwrap_or(false))
            .map(|q| FlaggedCitation {
                page_id: q.page_id,
                footnote: q.footnote,
                claim: q.claim,
                verdict: q.verdict.unwrap_or(Verdict::NotVerifiable),
                score: q.accuracy_score.unwrap_or(0.0),
                issues: q.issues,
                quote: q.quote,
                supporting_quotes: q.supporting_quotes,
                source_url: q.source_url,
            })
            .collect())
    }

    const QUOTE_SELECT: &'static str = "SELECT page_id, footnote, claim, quote, quote_location,
                verification_method, verification_score, verdict, accuracy_score,
                issues, supporting_quotes, difficulty, source_url, source_title,
                checked_at, updated_at
         FROM citation_quotes";

    fn row_to_quote(row: &Row<'_>) -> rusqlite::Result<CitationQuoteRecord> {
        let verdict: Option<String> = row.get(7)?;
        let issues: Option<String> = row.get(9)?;
        let supporting: Option<String> = row.get(10)?;
        let checked_at: Option<String> = row.get(14)?;
        let updated_at: String = row.get(15)?;

        Ok(CitationQuoteRecord {
            page_id: row.get(0)?,
            footnote: row.get(1)?,
            claim: row.get(2)?,
            quote: row.get(3)?,
            quote_location: row.get(4)?,
            verification_method: row.get(5)?,
            verification_score: row.get(6)?,
            verdict: verdict.map(|v| Verdict::parse(&v)),
            accuracy_score: row.get(8)?,
            issues: issues
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
            supporting_quotes: supporting
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
            difficulty: row.get(11)?,
            source_url: row.get(12)?,
            source_title: row.get(13)?,
            checked_at: checked_at
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            updated_at: DateTime::parse_from_rfc3339(&updated_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    // ==================== Content cache ====================

    /// Upsert a cached fetched page. Last fetch wins.
    pub fn upsert_content(&self, record: &CitationContentRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO content_cache (url, html, text_content, title, status, content_hash, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(url) DO UPDATE SET
                    html = excluded.html,
                    text_content = excluded.text_content,
                    title = excluded.title,
                    status = excluded.status,
                    content_hash = excluded.content_hash,
                    fetched_at = excluded.fetched_at",
                params![
                    record.url,
                    record.html,
                    record.text,
                    record.title,
                    record.status,
                    record.content_hash,
                    record.fetched_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Get a cached page by URL.
    pub fn get_content(&self, url: &str) -> Result<Option<CitationContentRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT url, html, text_content, title, status, content_hash, fetched_at
                 FROM content_cache WHERE url = ?1",
                params![url],
                |row| {
                    let fetched_at: String = row.get(6)?;
                    Ok(CitationContentRecord {
                        url: row.get(0)?,
                        html: row.get(1)?,
                        text: row.get(2)?,
                        title: row.get(3)?,
                        status: row.get(4)?,
                        content_hash: row.get(5)?,
                        fetched_at: DateTime::parse_from_rfc3339(&fetched_at)
                            .map(|dt| dt.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                    })
                },
            )
            .optional()
        })
    }

    // ==================== Edit log ====================

    /// Append one audit-trail entry.
    pub fn log_edit(&self, page_id: &str, tool: &str, agency: &str, note: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO edit_log (id, page_id, tool, agency, note, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    Uuid::new_v4().to_string(),
                    page_id,
                    tool,
                    agency,
                    note,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Audit-trail entries for a page, oldest first.
    pub fn edit_log(&self, page_id: &str) -> Result<Vec<EditLogEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, page_id, tool, agency, note, created_at
                 FROM edit_log WHERE page_id = ?1 ORDER BY created_at, id",
            )?;
            let rows = stmt.query_map(params![page_id], |row| {
                let id: String = row.get(0)?;
                let created_at: String = row.get(5)?;
                Ok(EditLogEntry {
                    id: Uuid::parse_str(&id).unwrap_or_default(),
                    page_id: row.get(1)?,
                    tool: row.get(2)?,
                    agency: row.get(3)?,
                    note: row.get(4)?,
                    created_at: DateTime::parse_from_rfc3339(&created_at)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })?;
            rows.collect()
        })
    }
}
