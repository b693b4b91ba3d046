//! Session memo for the fetch + clean result.
//!
//! There is exactly one source, so the memo is a single slot keyed by
//! nothing. Entries never expire; only an explicit reload or a new process
//! clears them.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::ObservationSeries;

/// Whether a load may be served from the memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve the memoized series when present; otherwise load and memoize. (Default)
    #[default]
    Use,
    /// Drop the memo, load from the network and memoize the new result.
    Reload,
}

impl CacheMode {
    pub const fn from_reload(reload: bool) -> Self {
        if reload {
            Self::Reload
        } else {
            Self::Use
        }
    }
}

/// Successfully cleaned series plus the warnings produced while cleaning it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSeries {
    pub series: ObservationSeries,
    pub warnings: Vec<String>,
}

/// Single-slot, shareable memo.
#[derive(Debug, Clone, Default)]
pub struct SeriesCache {
    slot: Arc<RwLock<Option<CachedSeries>>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<CachedSeries> {
        self.slot.read().await.clone()
    }

    /// Memoizes `entry`. Empty series are not stored so the next
    /// interaction tries the network again.
    pub async fn put(&self, entry: CachedSeries) {
        if entry.series.is_empty() {
            return;
        }
        *self.slot.write().await = Some(entry);
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    pub async fn is_populated(&self) -> bool {
        self.slot.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CalendarDate, Observation};

    fn entry(len: u8) -> CachedSeries {
        let observations = (1..=len)
            .map(|d| {
                Observation::new(CalendarDate::from_ymd(2020, 1, d).expect("date"), 10.0)
                    .expect("observation")
            })
            .collect();
        CachedSeries {
            series: ObservationSeries::new("USD", observations).expect("series"),
            warnings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn stores_and_invalidates() {
        let cache = SeriesCache::new();
        assert!(cache.get().await.is_none());

        cache.put(entry(3)).await;
        assert_eq!(cache.get().await.map(|e| e.series.len()), Some(3));

        cache.invalidate().await;
        assert!(!cache.is_populated().await);
    }

    #[tokio::test]
    async fn empty_series_is_not_memoized() {
        let cache = SeriesCache::new();
        cache.put(entry(0)).await;
        assert!(!cache.is_populated().await);
    }

    #[tokio::test]
    async fn clones_share_the_slot() {
        let cache = SeriesCache::new();
        let other = cache.clone();
        cache.put(entry(2)).await;
        assert!(other.is_populated().await);
    }

    #[test]
    fn cache_mode_default_uses_memo() {
        assert_eq!(CacheMode::default(), CacheMode::Use);
        assert_eq!(CacheMode::from_reload(true), CacheMode::Reload);
    }
}
