//! Local copy of the record list and statistics
//!
//! Events never patch the cache. A refetch signal only marks it stale, and
//! [`RecordCache::refresh`] reloads both from the server.

use crate::api::RecordSource;
use crate::error::ClientError;
use chrono::{DateTime, Utc};
use reviewdesk_domain::api::{RecordPage, StatsResponse};
use reviewdesk_domain::traits::RecordQuery;

/// Last fetched record page and statistics
#[derive(Debug, Clone)]
pub struct RecordCache {
    query: RecordQuery,
    page: Option<RecordPage>,
    stats: Option<StatsResponse>,
    stale: bool,
    refreshed_at: Option<DateTime<Utc>>,
}

impl RecordCache {
    /// Empty cache for `query`; stale until the first refresh
    pub fn new(query: RecordQuery) -> Self {
        Self {
            query,
            page: None,
            stats: None,
            stale: true,
            refreshed_at: None,
        }
    }

    /// The list query this cache mirrors
    pub fn query(&self) -> &RecordQuery {
        &self.query
    }

    /// Switch to another list query; marks the cache stale
    pub fn set_query(&mut self, query: RecordQuery) {
        self.query = query;
        self.stale = true;
    }

    /// Cached page
    pub fn page(&self) -> Option<&RecordPage> {
        self.page.as_ref()
    }

    /// Cached statistics
    pub fn stats(&self) -> Option<&StatsResponse> {
        self.stats.as_ref()
    }

    /// Whether the cache must be reloaded before use
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// When the last successful refresh finished
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Mark the cache stale
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Reload page and statistics
    ///
    /// On failure the previous contents are kept and the cache stays stale.
    pub async fn refresh<S: RecordSource + ?Sized>(&mut self, source: &S) -> Result<(), ClientError> {
        let page = source.fetch_page(&self.query).await?;
        let stats = source.fetch_stats().await?;

        self.page = Some(page);
        self.stats = Some(stats);
        self.stale = false;
        self.refreshed_at = Some(Utc::now());
        tracing::debug!("record cache refreshed");
        Ok(())
    }

    /// Reload only if stale; returns whether a reload happened
    pub async fn refresh_if_stale<S: RecordSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<bool, ClientError> {
        if !self.stale {
            return Ok(false);
        }
        self.refresh(source).await?;
        Ok(true)
    }
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new(RecordQuery::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeSource {
        fetches: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl RecordSource for FakeSource {
        async fn fetch_page(&self, query: &RecordQuery) -> Result<RecordPage, ClientError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Connection("down".into()));
            }
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(RecordPage {
                records: vec![],
                total: 0,
                offset: query.offset,
                limit: query.effective_limit(),
                has_more: false,
            })
        }

        async fn fetch_stats(&self) -> Result<StatsResponse, ClientError> {
            Ok(StatsResponse {
                total: 7,
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_refresh_clears_stale() {
        let source = FakeSource::default();
        let mut cache = RecordCache::new(RecordQuery::default());
        assert!(cache.is_stale());

        assert!(cache.refresh_if_stale(&source).await.unwrap());
        assert!(!cache.is_stale());
        assert_eq!(cache.stats().map(|s| s.total), Some(7));
        assert_eq!(cache.page().map(|p| p.limit), Some(100));

        // Fresh cache is not reloaded
        assert!(!cache.refresh_if_stale(&source).await.unwrap());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        cache.invalidate();
        assert!(cache.refresh_if_stale(&source).await.unwrap());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_contents() {
        let source = FakeSource::default();
        let mut cache = RecordCache::new(RecordQuery::default());
        cache.refresh(&source).await.unwrap();
        let refreshed_at = cache.refreshed_at();

        cache.invalidate();
        source.fail.store(true, Ordering::SeqCst);
        assert!(cache.refresh(&source).await.is_err());

        assert!(cache.is_stale());
        assert!(cache.page().is_some());
        assert_eq!(cache.refreshed_at(), refreshed_at);
    }
}
