//! Lazy per-municipality dataset cache
//!
//! Per-municipality datasets are too large to preload for every
//! municipality, so locator stages open them on demand and keep the handle
//! for the pipeline's lifetime. Concurrent requests for the same
//! municipality must converge on one open handle: each `lg_code` maps to a
//! `tokio::sync::OnceCell` that runs the opener exactly once while other
//! callers await the same cell. An opener failure leaves the cell empty, so
//! a later request observes the provider error rather than a poisoned
//! cache.

use abrg_common::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

type Slot<T> = Arc<OnceCell<Option<Arc<T>>>>;

/// Concurrent map from municipality code to a lazily-opened dataset handle.
///
/// `None` inside a slot means the provider reported the dataset absent for
/// that municipality; absence is cached like any other answer.
pub struct DatasetCache<T: ?Sized + Send + Sync + 'static> {
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T: ?Sized + Send + Sync + 'static> Default for DatasetCache<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> DatasetCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the handle for `lg_code`, running `open` at most once per key
    /// across all concurrent callers.
    pub async fn get_or_open<F, Fut>(&self, lg_code: &str, open: F) -> Result<Option<Arc<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Arc<T>>>>,
    {
        let slot = {
            let mut slots = self.slots.lock().expect("dataset cache lock");
            slots.entry(lg_code.to_string()).or_default().clone()
        };
        let handle = slot.get_or_try_init(open).await?;
        Ok(handle.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Dummy;

    #[tokio::test]
    async fn opener_runs_once_per_key() {
        let cache: Arc<DatasetCache<Dummy>> = Arc::new(DatasetCache::new());
        let opens = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let opens = opens.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_open("131016", || async move {
                        opens.fetch_add(1, Ordering::SeqCst);
                        Ok(Some(Arc::new(Dummy)))
                    })
                    .await
            }));
        }
        for t in tasks {
            assert!(t.await.unwrap().unwrap().is_some());
        }
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absence_is_cached() {
        let cache: DatasetCache<Dummy> = DatasetCache::new();
        let opens = AtomicUsize::new(0);
        for _ in 0..3 {
            let handle = cache
                .get_or_open("011002", || async {
                    opens.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .await
                .unwrap();
            assert!(handle.is_none());
        }
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_open_independently() {
        let cache: DatasetCache<Dummy> = DatasetCache::new();
        let opens = AtomicUsize::new(0);
        for lg in ["131016", "131024"] {
            cache
                .get_or_open(lg, || async {
                    opens.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(Arc::new(Dummy)))
                })
                .await
                .unwrap();
        }
        assert_eq!(opens.load(Ordering::SeqCst), 2);
    }
}
