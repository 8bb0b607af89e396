//! Document archive backed by a directory of text files and a SQLite ledger
//!
//! Each saved document becomes one UTF-8 file: a metadata header, a blank line, then
//! the text. The ledger maps URLs to file names, so the same URL always lands in the
//! same file and a name taken by another URL is disambiguated with a hash suffix.

use crate::crawler::Origin;
use crate::extract::{Document, Metadata};
use crate::output::RunReport;
use crate::state::UrlState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{SavedDocument, Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Stem used when a URL has no usable last path segment
const FALLBACK_STEM: &str = "index";

/// Text-file archive plus run ledger
pub struct ArchiveStorage {
    conn: Connection,
    data_dir: PathBuf,
}

impl ArchiveStorage {
    /// Opens (or creates) the archive
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Directory receiving document files; created if missing
    /// * `database_path` - Path to the SQLite ledger
    ///
    /// # Returns
    ///
    /// * `Ok(ArchiveStorage)` - Ready for a run
    /// * `Err(StorageError)` - The directory or database could not be opened
    pub fn open(data_dir: &Path, database_path: &Path) -> StorageResult<Self> {
        fs::create_dir_all(data_dir)?;
        if let Some(parent) = database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(database_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Opens an archive whose ledger lives in memory
    pub fn open_in_memory(data_dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(data_dir)?;
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Gets the most recent run
    pub fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status, visited, saved, skipped, ignored
             FROM runs ORDER BY id DESC LIMIT 1",
        )?;

        let run = stmt
            .query_row([], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(RunStatus::Running),
                    visited: row.get::<_, i64>(5)? as u64,
                    saved: row.get::<_, i64>(6)? as u64,
                    skipped: row.get::<_, i64>(7)? as u64,
                    ignored: row.get::<_, i64>(8)? as u64,
                })
            })
            .optional()?;

        Ok(run)
    }

    /// Number of visits per terminal state for a run
    pub fn visit_counts(&self, run_id: i64) -> StorageResult<HashMap<UrlState, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT state, COUNT(*) FROM visits WHERE run_id = ?1 GROUP BY state")?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (state, count) = row?;
            match UrlState::from_db_string(&state) {
                Some(state) => {
                    counts.insert(state, count as u64);
                }
                None => tracing::warn!("Unknown visit state in ledger: {}", state),
            }
        }
        Ok(counts)
    }

    /// Total number of archived documents
    pub fn document_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Total number of recorded discovered links
    pub fn discovered_link_count(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM discovered_links", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn filename_for(&self, document: &Document) -> StorageResult<String> {
        let url = document.metadata.url.as_str();

        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT filename FROM documents WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(filename) = existing {
            return Ok(filename);
        }

        let stem = format!("{}{}", document.kind.file_prefix(), file_stem(&document.metadata.url));
        let candidate = format!("{}.txt", stem);

        let owner: Option<String> = self
            .conn
            .query_row(
                "SELECT url FROM documents WHERE filename = ?1",
                params![candidate],
                |row| row.get(0),
            )
            .optional()?;

        match owner {
            Some(other) if other != url => {
                let suffix = url_digest(url);
                tracing::debug!("{} is taken by {}, using suffix {}", candidate, other, suffix);
                Ok(format!("{}-{}.txt", stem, suffix))
            }
            _ => Ok(candidate),
        }
    }
}

impl Storage for ArchiveStorage {
    fn begin_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn record_visit(
        &mut self,
        run_id: i64,
        url: &Url,
        origin: &Origin,
        state: UrlState,
        detail: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO visits (run_id, url, origin, state, detail, visited_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                url.as_str(),
                origin.as_str(),
                state.to_db_string(),
                detail,
                now
            ],
        )?;
        Ok(())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        report: &RunReport,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, visited = ?3, saved = ?4,
                 skipped = ?5, ignored = ?6, links_accepted = ?7
             WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                report.visited as i64,
                report.saved as i64,
                report.skipped() as i64,
                report.ignored() as i64,
                report.links_accepted as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn save(&mut self, run_id: i64, document: &Document) -> StorageResult<SavedDocument> {
        let filename = self.filename_for(document)?;
        let path = self.data_dir.join(&filename);
        let created = !path.exists();

        fs::write(&path, render(document))?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO documents (url, filename, title, kind, saved_at, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(url) DO UPDATE SET
                 title = excluded.title,
                 saved_at = excluded.saved_at,
                 run_id = excluded.run_id",
            params![
                document.metadata.url.as_str(),
                filename,
                document.metadata.title,
                document.kind.as_str(),
                now,
                run_id
            ],
        )?;

        tracing::info!("Saved {} to {}", document.metadata.url, path.display());
        Ok(SavedDocument { path, created })
    }

    fn is_already_saved(&self, url: &Url, metadata: &Metadata) -> StorageResult<bool> {
        let row: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT filename, title FROM documents WHERE url = ?1",
                params![url.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(match row {
            Some((filename, title)) => {
                title == metadata.title && self.data_dir.join(filename).exists()
            }
            None => false,
        })
    }

    fn save_discovered_links(
        &mut self,
        run_id: i64,
        origin: &Origin,
        links: &[Url],
    ) -> StorageResult<Vec<Url>> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut recorded = Vec::new();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO discovered_links (url, origin, discovered_at, run_id)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for link in links {
                if stmt.execute(params![link.as_str(), origin.as_str(), now, run_id])? > 0 {
                    recorded.push(link.clone());
                }
            }
        }
        tx.commit()?;
        Ok(recorded)
    }
}

/// File content: metadata header, blank line, cleaned text
fn render(document: &Document) -> String {
    let metadata = &document.metadata;
    let header = [
        format!("URL: {}", metadata.url),
        format!("Title: {}", metadata.title.as_deref().unwrap_or_default()),
        format!("Date: {}", metadata.date.as_deref().unwrap_or_default()),
        format!("Author: {}", metadata.author.as_deref().unwrap_or_default()),
        format!("Categories: {}", metadata.categories.join(", ")),
        format!("Keywords: {}", metadata.keywords.join(", ")),
        format!("Language: {}", metadata.language),
        format!("Content-Type: {}", metadata.content_type),
    ];

    format!("{}\n\n{}", header.join("\n"), clean_text(&document.text))
}

/// Drops control characters other than newlines and trailing whitespace on each line
fn clean_text(text: &str) -> String {
    let printable: String = text
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect();
    printable
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Percent-decoded, sanitized last path segment, without an `.html` extension
fn file_stem(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default();

    let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
    let name = decoded
        .strip_suffix(".html")
        .or_else(|| decoded.strip_suffix(".htm"))
        .unwrap_or(&*decoded);

    let sanitized = sanitize_file_stem(name);
    if sanitized.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        sanitized
    }
}

/// Keeps letters, digits, `_` and `-`; spaces become `_`
fn sanitize_file_stem(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|&c| c.is_alphanumeric() || c == '_' || c == '-')
        .collect()
}

/// First 8 hex digits of the URL's SHA-256
fn url_digest(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(&digest[..4])
}
