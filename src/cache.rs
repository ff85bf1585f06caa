//! Time-bounded cache of fetched worksheets.
//!
//! Entries are shared as `Arc<SheetSnapshot>`, so every caller sees the same
//! immutable rows until the entry expires.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;

use crate::error::{DashboardError, DashboardResult};
use crate::sheets::SheetSource;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetKey {
    pub sheet_key: String,
    pub worksheet: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SheetSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Clone)]
pub struct SheetCache {
    inner: Cache<SheetKey, Arc<SheetSnapshot>>,
}

impl SheetCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(16).time_to_live(ttl).build(),
        }
    }

    /// Returns the cached snapshot, fetching it when absent or expired.
    /// Concurrent callers for the same key share a single fetch.
    pub async fn get_or_fetch(
        &self,
        source: &dyn SheetSource,
        sheet_key: &str,
        worksheet: &str,
    ) -> DashboardResult<Arc<SheetSnapshot>> {
        let key = SheetKey {
            sheet_key: sheet_key.to_string(),
            worksheet: worksheet.to_string(),
        };
        if let Some(snapshot) = self.inner.get(&key).await {
            tracing::debug!(worksheet, fetched_at = %snapshot.fetched_at, "worksheet cache hit");
            return Ok(snapshot);
        }

        self.inner
            .try_get_with(key, async {
                tracing::debug!(worksheet, "worksheet cache miss");
                let rows = source.fetch_rows(sheet_key, worksheet).await?;
                Ok::<_, DashboardError>(Arc::new(SheetSnapshot {
                    fetched_at: Utc::now(),
                    rows,
                }))
            })
            .await
            .map_err(|err| (*err).clone())
    }
}
