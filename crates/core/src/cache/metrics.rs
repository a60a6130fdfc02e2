//! Cache metrics: persisted aggregates plus process-local hit/miss rates.

use std::sync::atomic::{AtomicU64, Ordering};

use super::connection::CacheDb;
use crate::Error;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Process-local hit/miss counters.
///
/// Shared between clones of the database handle; reset explicitly, never
/// persisted. In a multi-instance deployment each instance keeps its own
/// counters.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> (u64, u64) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Entry count per domain.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DomainCount {
    pub domain: String,
    pub count: u64,
}

/// Entry counts per processing status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StatusDistribution {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Snapshot of cache health.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheMetrics {
    pub total_entries: u64,
    /// Percentage of gated reads that were hits, 0 when nothing was read yet.
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub expired_entries: u64,
    pub failed_entries: u64,
    /// Average stored content length in bytes, over entries with content.
    pub average_content_size: u64,
    /// Top 10 domains by entry count.
    pub top_domains: Vec<DomainCount>,
    pub status_distribution: StatusDistribution,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl CacheDb {
    /// Compute cache metrics from the store and the hit/miss counters.
    pub async fn metrics(&self) -> Result<CacheMetrics, Error> {
        let (hits, misses) = self.stats.snapshot();

        let mut metrics = self
            .conn
            .call(move |conn| -> Result<CacheMetrics, Error> {
                let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

                let total_entries: i64 = conn.query_row("SELECT COUNT(*) FROM url_cache", [], |row| row.get(0))?;
                let expired_entries: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM url_cache WHERE expires_at < ?1",
                    params![now],
                    |row| row.get(0),
                )?;

                let mut distribution = StatusDistribution::default();
                let mut stmt =
                    conn.prepare("SELECT processing_status, COUNT(*) FROM url_cache GROUP BY processing_status")?;
                let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
                for row in rows {
                    let (status, count) = row?;
                    let count = count as u64;
                    match status.as_str() {
                        "pending" => distribution.pending = count,
                        "processing" => distribution.processing = count,
                        "completed" => distribution.completed = count,
                        "failed" => distribution.failed = count,
                        _ => {}
                    }
                }

                let average_content_size: f64 = conn.query_row(
                    "SELECT COALESCE(AVG(LENGTH(content)), 0) FROM url_cache WHERE content IS NOT NULL",
                    [],
                    |row| row.get(0),
                )?;

                let mut stmt = conn.prepare(
                    "SELECT domain, COUNT(*) AS count FROM url_cache
                     WHERE domain <> '' GROUP BY domain ORDER BY count DESC LIMIT 10",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(DomainCount { domain: row.get(0)?, count: row.get::<_, i64>(1)? as u64 })
                })?;
                let mut top_domains = Vec::new();
                for row in rows {
                    top_domains.push(row?);
                }

                Ok(CacheMetrics {
                    total_entries: total_entries as u64,
                    hit_rate: 0.0,
                    miss_rate: 0.0,
                    expired_entries: expired_entries as u64,
                    failed_entries: distribution.failed,
                    average_content_size: average_content_size.round() as u64,
                    top_domains,
                    status_distribution: distribution,
                })
            })
            .await
            .map_err(Error::from)?;

        let requests = hits + misses;
        if requests > 0 {
            metrics.hit_rate = round2(hits as f64 / requests as f64 * 100.0);
            metrics.miss_rate = round2(misses as f64 / requests as f64 * 100.0);
        }

        Ok(metrics)
    }

    /// Reset the process-local hit/miss counters.
    pub fn reset_metrics(&self) {
        self.stats.reset();
        tracing::info!("cache metrics reset");
    }
}
