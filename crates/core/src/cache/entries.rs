//! URL cache entry model and store operations.
//!
//! One row per distinct normalized URL, keyed by its SHA-256 hash. Writes
//! use upsert semantics with metadata merging; reads are gated so that only
//! completed, unexpired entries count as hits.

use super::connection::CacheDb;
use super::hash::compute_url_hash;
use super::metadata::PageMetadata;
use crate::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Default TTL applied when the caller does not override it.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProcessingStatus::Pending),
            "processing" => Some(ProcessingStatus::Processing),
            "completed" => Some(ProcessingStatus::Completed),
            "failed" => Some(ProcessingStatus::Failed),
            _ => None,
        }
    }
}

/// A cached URL entry.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheEntry {
    pub url_hash: String,
    pub original_url: String,
    pub domain: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub metadata: PageMetadata,
    pub processing_status: ProcessingStatus,
    pub expires_at: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CacheEntry {
    /// Whether the entry's TTL has elapsed. Unparseable timestamps count
    /// as expired.
    pub fn is_expired(&self) -> bool {
        DateTime::parse_from_rfc3339(&self.expires_at)
            .map(|t| t <= Utc::now())
            .unwrap_or(true)
    }

    /// Whether the entry may be returned as a cache hit.
    pub fn is_servable(&self) -> bool {
        self.processing_status == ProcessingStatus::Completed && !self.is_expired()
    }
}

/// Fields applied by an upsert. Unset fields keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub metadata: Option<PageMetadata>,
    pub processing_status: Option<ProcessingStatus>,
    pub ttl_hours: Option<i64>,
}

/// Column the paginated listing may sort by.
///
/// A closed set: the column name is interpolated into ORDER BY, so caller
/// strings are never used directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    CreatedAt,
    UpdatedAt,
    ExpiresAt,
}

impl SortColumn {
    fn as_sql(&self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
            SortColumn::ExpiresAt => "expires_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query for the paginated listing.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
    pub status: Option<ProcessingStatus>,
    pub domain: Option<String>,
    pub sort_by: SortColumn,
    pub sort_order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 50,
            status: None,
            domain: None,
            sort_by: SortColumn::default(),
            sort_order: SortOrder::default(),
        }
    }
}

/// One page of listed entries plus totals.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryPage {
    pub entries: Vec<CacheEntry>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Options for a cleanup pass.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CleanupOptions {
    /// Remove entries whose TTL has elapsed.
    pub remove_expired: bool,
    /// Remove failed entries older than `older_than_days`.
    pub remove_failed: bool,
    pub older_than_days: i64,
    /// Hard cap on entry count; the oldest entries beyond it are evicted
    /// regardless of status or the flags above.
    pub max_entries: usize,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self { remove_expired: true, remove_failed: true, older_than_days: 7, max_entries: 10_000 }
    }
}

/// Result of a cleanup pass.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CleanupReport {
    pub expired_removed: u64,
    pub failed_removed: u64,
    /// Entries evicted by the size bound, oldest first.
    pub evicted: u64,
    pub total_removed: u64,
    pub remaining_entries: u64,
}

/// Result of a preload pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PreloadReport {
    pub processed: u64,
    pub failed: u64,
    pub already_cached: u64,
}

fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn expiry_ts(ttl_hours: i64) -> String {
    (Utc::now() + chrono::Duration::hours(ttl_hours)).to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_default()
}

const ENTRY_COLUMNS: &str = "url_hash, original_url, domain, title, content, metadata, \
     processing_status, expires_at, created_at, updated_at";

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<CacheEntry> {
    let metadata_json: String = row.get(5)?;
    let status: String = row.get(6)?;
    Ok(CacheEntry {
        url_hash: row.get(0)?,
        original_url: row.get(1)?,
        domain: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
        processing_status: ProcessingStatus::parse(&status).unwrap_or(ProcessingStatus::Pending),
        expires_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn fetch_entry_sync(conn: &rusqlite::Connection, url_hash: &str) -> rusqlite::Result<Option<CacheEntry>> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM url_cache WHERE url_hash = ?1");
    match conn.query_row(&sql, params![url_hash], row_to_entry) {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

impl CacheDb {
    /// Get an entry by hash, counting a hit only for completed, unexpired
    /// entries. Everything else counts as a miss and returns None.
    pub async fn get_entry(&self, url_hash: &str) -> Result<Option<CacheEntry>, Error> {
        let hash = url_hash.to_string();
        let found = self
            .conn
            .call(move |conn| fetch_entry_sync(conn, &hash).map_err(Error::from))
            .await
            .map_err(Error::from)?;

        match found {
            Some(entry) if entry.is_servable() => {
                self.stats.record_hit();
                tracing::debug!(url_hash = %entry.url_hash, "cache hit");
                Ok(Some(entry))
            }
            _ => {
                self.stats.record_miss();
                tracing::debug!(url_hash, "cache miss");
                Ok(None)
            }
        }
    }

    /// Get an entry by URL, hashing it first. Same hit gate as [`get_entry`].
    ///
    /// [`get_entry`]: CacheDb::get_entry
    pub async fn get_entry_by_url(&self, url: &str) -> Result<Option<CacheEntry>, Error> {
        self.get_entry(&compute_url_hash(url)).await
    }

    /// Insert or update the entry for a URL.
    ///
    /// Existing entries keep their creation time; metadata is merged rather
    /// than replaced; `expires_at` is always recomputed from the TTL.
    pub async fn upsert_entry(&self, url: &str, update: EntryUpdate) -> Result<CacheEntry, Error> {
        let url = url.to_string();
        let url_hash = compute_url_hash(&url);
        let domain = domain_of(&url);

        self.conn
            .call(move |conn| -> Result<CacheEntry, Error> {
                let now = now_ts();
                let expires_at = expiry_ts(update.ttl_hours.unwrap_or(DEFAULT_TTL_HOURS));

                let entry = match fetch_entry_sync(conn, &url_hash)? {
                    Some(mut entry) => {
                        if let Some(title) = update.title {
                            entry.title = Some(title);
                        }
                        if let Some(content) = update.content {
                            entry.content = Some(content);
                        }
                        if let Some(metadata) = update.metadata {
                            entry.metadata.merge(metadata);
                        }
                        if let Some(status) = update.processing_status {
                            entry.processing_status = status;
                        }
                        entry.expires_at = expires_at;
                        entry.updated_at = now;

                        conn.execute(
                            "UPDATE url_cache SET
                                title = ?2, content = ?3, metadata = ?4,
                                processing_status = ?5, expires_at = ?6, updated_at = ?7
                             WHERE url_hash = ?1",
                            params![
                                &entry.url_hash,
                                &entry.title,
                                &entry.content,
                                serde_json::to_string(&entry.metadata).unwrap_or_else(|_| "{}".into()),
                                entry.processing_status.as_str(),
                                &entry.expires_at,
                                &entry.updated_at,
                            ],
                        )?;
                        entry
                    }
                    None => {
                        let entry = CacheEntry {
                            url_hash: url_hash.clone(),
                            original_url: url.clone(),
                            domain: domain.clone(),
                            title: update.title,
                            content: update.content,
                            metadata: update.metadata.unwrap_or_default(),
                            processing_status: update.processing_status.unwrap_or(ProcessingStatus::Completed),
                            expires_at,
                            created_at: now.clone(),
                            updated_at: now,
                        };

                        conn.execute(
                            "INSERT INTO url_cache (
                                url_hash, original_url, domain, title, content, metadata,
                                processing_status, expires_at, created_at, updated_at
                            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                            params![
                                &entry.url_hash,
                                &entry.original_url,
                                &entry.domain,
                                &entry.title,
                                &entry.content,
                                serde_json::to_string(&entry.metadata).unwrap_or_else(|_| "{}".into()),
                                entry.processing_status.as_str(),
                                &entry.expires_at,
                                &entry.created_at,
                                &entry.updated_at,
                            ],
                        )?;
                        entry
                    }
                };

                Ok(entry)
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for a URL. Returns whether a row was deleted.
    pub async fn remove_entry(&self, url: &str) -> Result<bool, Error> {
        let url_hash = compute_url_hash(url);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let affected = conn.execute("DELETE FROM url_cache WHERE url_hash = ?1", params![url_hash])?;
                Ok(affected > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Most recent entries for a domain.
    pub async fn entries_by_domain(&self, domain: &str, limit: usize) -> Result<Vec<CacheEntry>, Error> {
        let domain = domain.to_lowercase();
        self.conn
            .call(move |conn| -> Result<Vec<CacheEntry>, Error> {
                let sql = format!(
                    "SELECT {ENTRY_COLUMNS} FROM url_cache
                     WHERE domain = ?1 ORDER BY created_at DESC LIMIT ?2"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![domain, limit as i64], row_to_entry)?;
                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    /// Paginated listing with optional status/domain filters.
    pub async fn list_entries(&self, query: ListQuery) -> Result<EntryPage, Error> {
        let page = query.page.max(1);
        let limit = query.limit.max(1);
        let offset = (page - 1) * limit;

        self.conn
            .call(move |conn| -> Result<EntryPage, Error> {
                let mut clauses: Vec<String> = Vec::new();
                let mut args: Vec<String> = Vec::new();

                if let Some(status) = query.status {
                    args.push(status.as_str().to_string());
                    clauses.push(format!("processing_status = ?{}", args.len()));
                }
                if let Some(domain) = query.domain {
                    args.push(domain.to_lowercase());
                    clauses.push(format!("domain = ?{}", args.len()));
                }

                let where_sql = if clauses.is_empty() { String::new() } else { format!("WHERE {}", clauses.join(" AND ")) };

                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM url_cache {where_sql}"),
                    rusqlite::params_from_iter(args.iter()),
                    |row| row.get(0),
                )?;

                let sql = format!(
                    "SELECT {ENTRY_COLUMNS} FROM url_cache {where_sql}
                     ORDER BY {order} {dir} LIMIT {limit} OFFSET {offset}",
                    order = query.sort_by.as_sql(),
                    dir = query.sort_order.as_sql(),
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), row_to_entry)?;
                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }

                let total = total as u64;
                let limit = limit as u64;
                Ok(EntryPage { entries, total, page: page as u64, limit, total_pages: total.div_ceil(limit) })
            })
            .await
            .map_err(Error::from)
    }

    /// Set the status of several entries at once. Returns the updated count.
    pub async fn bulk_set_status(&self, url_hashes: &[String], status: ProcessingStatus) -> Result<u64, Error> {
        if url_hashes.is_empty() {
            return Ok(0);
        }

        let mut args: Vec<String> = Vec::with_capacity(url_hashes.len() + 2);
        args.push(status.as_str().to_string());
        args.push(now_ts());
        args.extend(url_hashes.iter().cloned());

        let placeholders: Vec<String> = (3..args.len() + 1).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "UPDATE url_cache SET processing_status = ?1, updated_at = ?2
             WHERE url_hash IN ({})",
            placeholders.join(", ")
        );

        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let affected = conn.execute(&sql, rusqlite::params_from_iter(args.iter()))?;
                Ok(affected as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Total number of entries.
    pub async fn count_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM url_cache", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Remove expired entries, stale failed entries, and anything beyond
    /// the size bound.
    ///
    /// The size bound is unconditional: it applies even when both removal
    /// flags are off, evicting the oldest entries by creation time.
    pub async fn cleanup(&self, options: CleanupOptions) -> Result<CleanupReport, Error> {
        self.conn
            .call(move |conn| -> Result<CleanupReport, Error> {
                let now = now_ts();

                let expired_removed = if options.remove_expired {
                    conn.execute("DELETE FROM url_cache WHERE expires_at < ?1", params![now])? as u64
                } else {
                    0
                };

                let failed_removed = if options.remove_failed {
                    let cutoff = (Utc::now() - chrono::Duration::days(options.older_than_days))
                        .to_rfc3339_opts(SecondsFormat::Micros, true);
                    conn.execute(
                        "DELETE FROM url_cache WHERE processing_status = 'failed' AND created_at < ?1",
                        params![cutoff],
                    )? as u64
                } else {
                    0
                };

                let total: i64 = conn.query_row("SELECT COUNT(*) FROM url_cache", [], |row| row.get(0))?;
                let excess = total - options.max_entries as i64;
                let evicted = if excess > 0 {
                    conn.execute(
                        "DELETE FROM url_cache WHERE url_hash IN (
                            SELECT url_hash FROM url_cache ORDER BY created_at ASC LIMIT ?1
                        )",
                        params![excess],
                    )? as u64
                } else {
                    0
                };

                let remaining: i64 = conn.query_row("SELECT COUNT(*) FROM url_cache", [], |row| row.get(0))?;

                Ok(CleanupReport {
                    expired_removed,
                    failed_removed,
                    evicted,
                    total_removed: expired_removed + failed_removed + evicted,
                    remaining_entries: remaining as u64,
                })
            })
            .await
            .map_err(Error::from)
    }

    /// Queue URLs for later processing.
    ///
    /// URLs that are already servable hits are skipped; the rest get a
    /// pending placeholder. Extraction happens on next access, not here.
    /// Per-URL failures are counted without aborting the batch.
    pub async fn preload(&self, urls: &[String], ttl_hours: Option<i64>) -> Result<PreloadReport, Error> {
        let mut report = PreloadReport::default();

        for url in urls {
            match self.get_entry_by_url(url).await {
                Ok(Some(_)) => report.already_cached += 1,
                Ok(None) => {
                    let update = EntryUpdate {
                        processing_status: Some(ProcessingStatus::Pending),
                        ttl_hours,
                        ..Default::default()
                    };
                    match self.upsert_entry(url, update).await {
                        Ok(_) => report.processed += 1,
                        Err(e) => {
                            tracing::error!(url, error = %e, "failed to preload URL");
                            report.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(url, error = %e, "failed to check preload URL");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            already_cached = report.already_cached,
            failed = report.failed,
            "preload completed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_update(title: &str) -> EntryUpdate {
        EntryUpdate {
            title: Some(title.to_string()),
            content: Some("body text".to_string()),
            metadata: Some(PageMetadata { word_count: Some(2), ..Default::default() }),
            processing_status: Some(ProcessingStatus::Completed),
            ttl_hours: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = db
            .upsert_entry("https://example.com/page", completed_update("Test"))
            .await
            .unwrap();

        let fetched = db.get_entry(&entry.url_hash).await.unwrap().unwrap();
        assert_eq!(fetched.original_url, "https://example.com/page");
        assert_eq!(fetched.domain, "example.com");
        assert_eq!(fetched.title.as_deref(), Some("Test"));
    }

    #[tokio::test]
    async fn test_get_missing_counts_miss() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get_entry("nonexistent").await.unwrap();
        assert!(result.is_none());
        assert_eq!(db.stats.snapshot(), (0, 1));
    }

    #[tokio::test]
    async fn test_get_gate_rejects_incomplete() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let update = EntryUpdate { processing_status: Some(ProcessingStatus::Processing), ..Default::default() };
        let entry = db.upsert_entry("https://example.com/", update).await.unwrap();

        assert!(db.get_entry(&entry.url_hash).await.unwrap().is_none());
        assert_eq!(db.stats.snapshot(), (0, 1));
    }

    #[tokio::test]
    async fn test_get_gate_rejects_expired() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let update = EntryUpdate { ttl_hours: Some(-1), ..completed_update("Old") };
        let entry = db.upsert_entry("https://example.com/", update).await.unwrap();

        assert!(db.get_entry(&entry.url_hash).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_merges_metadata_and_keeps_created_at() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db
            .upsert_entry(
                "https://example.com/",
                EntryUpdate {
                    metadata: Some(PageMetadata { robots_allowed: Some(true), ..Default::default() }),
                    processing_status: Some(ProcessingStatus::Processing),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let second = db
            .upsert_entry(
                "https://example.com/",
                EntryUpdate {
                    metadata: Some(PageMetadata { description: Some("desc".into()), ..Default::default() }),
                    processing_status: Some(ProcessingStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.metadata.robots_allowed, Some(true));
        assert_eq!(second.metadata.description.as_deref(), Some("desc"));
        assert_eq!(second.processing_status, ProcessingStatus::Completed);
        assert_eq!(db.count_entries().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry("https://example.com/", completed_update("Test"))
            .await
            .unwrap();

        assert!(db.remove_entry("https://example.com/").await.unwrap());
        assert!(!db.remove_entry("https://example.com/").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_by_domain() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry("https://example.com/a", completed_update("A"))
            .await
            .unwrap();
        db.upsert_entry("https://example.com/b", completed_update("B"))
            .await
            .unwrap();
        db.upsert_entry("https://other.com/c", completed_update("C"))
            .await
            .unwrap();

        let entries = db.entries_by_domain("example.com", 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.domain == "example.com"));
    }

    #[tokio::test]
    async fn test_list_entries_pagination_and_filters() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for i in 0..5 {
            db.upsert_entry(&format!("https://example.com/{i}"), completed_update("Page"))
                .await
                .unwrap();
        }
        db.upsert_entry(
            "https://example.com/failed",
            EntryUpdate { processing_status: Some(ProcessingStatus::Failed), ..Default::default() },
        )
        .await
        .unwrap();

        let page = db
            .list_entries(ListQuery { limit: 2, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.total, 6);
        assert_eq!(page.total_pages, 3);

        let failed = db
            .list_entries(ListQuery { status: Some(ProcessingStatus::Failed), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(failed.total, 1);
        assert_eq!(failed.entries[0].processing_status, ProcessingStatus::Failed);

        let by_domain = db
            .list_entries(ListQuery { domain: Some("other.com".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(by_domain.total, 0);
    }

    #[tokio::test]
    async fn test_list_entries_sort_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db
            .upsert_entry("https://example.com/1", completed_update("First"))
            .await
            .unwrap();
        db.upsert_entry("https://example.com/2", completed_update("Second"))
            .await
            .unwrap();

        let asc = db
            .list_entries(ListQuery { sort_order: SortOrder::Asc, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(asc.entries[0].url_hash, first.url_hash);
    }

    #[tokio::test]
    async fn test_bulk_set_status() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let a = db
            .upsert_entry("https://example.com/a", completed_update("A"))
            .await
            .unwrap();
        let b = db
            .upsert_entry("https://example.com/b", completed_update("B"))
            .await
            .unwrap();

        let updated = db
            .bulk_set_status(&[a.url_hash.clone(), b.url_hash.clone()], ProcessingStatus::Pending)
            .await
            .unwrap();
        assert_eq!(updated, 2);

        assert!(db.get_entry(&a.url_hash).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bulk_set_status_empty() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let updated = db.bulk_set_status(&[], ProcessingStatus::Pending).await.unwrap();
        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry(
            "https://example.com/old",
            EntryUpdate { ttl_hours: Some(-1), ..completed_update("Old") },
        )
        .await
        .unwrap();
        db.upsert_entry("https://example.com/fresh", completed_update("Fresh"))
            .await
            .unwrap();

        let report = db.cleanup(CleanupOptions::default()).await.unwrap();
        assert_eq!(report.expired_removed, 1);
        assert_eq!(report.total_removed, 1);
        assert_eq!(report.remaining_entries, 1);
    }

    #[tokio::test]
    async fn test_cleanup_removes_stale_failed() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let failed = db
            .upsert_entry(
                "https://example.com/broken",
                EntryUpdate { processing_status: Some(ProcessingStatus::Failed), ..Default::default() },
            )
            .await
            .unwrap();

        // Backdate the entry past the retention window.
        let hash = failed.url_hash.clone();
        db.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "UPDATE url_cache SET created_at = '2000-01-01T00:00:00.000000Z' WHERE url_hash = ?1",
                    params![hash],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let report = db
            .cleanup(CleanupOptions { remove_expired: false, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(report.failed_removed, 1);
        assert_eq!(report.remaining_entries, 0);
    }

    #[tokio::test]
    async fn test_cleanup_fresh_failed_is_kept() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry(
            "https://example.com/broken",
            EntryUpdate { processing_status: Some(ProcessingStatus::Failed), ..Default::default() },
        )
        .await
        .unwrap();

        let report = db.cleanup(CleanupOptions::default()).await.unwrap();
        assert_eq!(report.failed_removed, 0);
        assert_eq!(report.remaining_entries, 1);
    }

    #[tokio::test]
    async fn test_cleanup_evicts_oldest_beyond_size_bound() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut hashes = Vec::new();
        for i in 0..5 {
            let entry = db
                .upsert_entry(&format!("https://example.com/{i}"), completed_update("Page"))
                .await
                .unwrap();
            hashes.push(entry.url_hash);
        }

        let report = db
            .cleanup(CleanupOptions { max_entries: 3, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(report.evicted, 2);
        assert_eq!(report.remaining_entries, 3);

        // The two oldest by creation time are gone, the newest three remain.
        for hash in &hashes[..2] {
            assert!(db.get_entry(hash).await.unwrap().is_none());
        }
        for hash in &hashes[2..] {
            assert!(db.get_entry(hash).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_cleanup_size_bound_applies_with_flags_off() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for i in 0..4 {
            db.upsert_entry(&format!("https://example.com/{i}"), completed_update("Page"))
                .await
                .unwrap();
        }

        let report = db
            .cleanup(CleanupOptions { remove_expired: false, remove_failed: false, older_than_days: 7, max_entries: 2 })
            .await
            .unwrap();
        assert_eq!(report.evicted, 2);
        assert_eq!(report.remaining_entries, 2);
    }

    #[tokio::test]
    async fn test_preload() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry("https://example.com/cached", completed_update("Cached"))
            .await
            .unwrap();

        let report = db
            .preload(
                &["https://example.com/cached".to_string(), "https://example.com/new".to_string()],
                None,
            )
            .await
            .unwrap();

        assert_eq!(report.already_cached, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);

        // The placeholder is pending, so it is not a servable hit.
        assert!(db.get_entry_by_url("https://example.com/new").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_default_ttl_is_in_the_future() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = db
            .upsert_entry("https://example.com/", completed_update("Test"))
            .await
            .unwrap();
        assert!(!entry.is_expired());
    }
}
