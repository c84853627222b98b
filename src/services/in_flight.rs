// src/services/in_flight.rs
use base64::{Engine as _, engine::general_purpose};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::errors::PlatingError;
use crate::models::{EnhancementOptions, ProcessedImageResult};

type SharedResult = Shared<BoxFuture<'static, Result<ProcessedImageResult, PlatingError>>>;

/// Coalesces overlapping identical `process_image` calls.
///
/// Entries are keyed by a digest of the image bytes and the options, so a
/// second caller with the same input awaits the computation already running
/// instead of starting its own. The computation runs on its own task, so it
/// finishes and clears its entry even when every caller has gone away.
#[derive(Default)]
pub struct InFlightRegistry {
    entries: Mutex<HashMap<String, SharedResult>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(image: &[u8], options: &EnhancementOptions) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image);
        hasher.update(serde_json::to_vec(options).unwrap_or_default());
        general_purpose::STANDARD.encode(hasher.finalize())
    }

    /// Await the computation registered under `key`, starting it with `start`
    /// if nothing is in flight for that key.
    pub async fn run<F>(
        self: &Arc<Self>,
        key: String,
        start: F,
    ) -> Result<ProcessedImageResult, PlatingError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<ProcessedImageResult, PlatingError>>,
    {
        let shared = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            match entries.get(&key) {
                Some(existing) => {
                    debug!("Joining in-flight processing for {}", key);
                    existing.clone()
                }
                None => {
                    let registry: Weak<Self> = Arc::downgrade(self);
                    let entry_key = key.clone();
                    let work = start();
                    let handle = tokio::spawn(async move {
                        let result = work.await;
                        if let Some(registry) = registry.upgrade() {
                            registry.remove(&entry_key);
                        }
                        result
                    });
                    let shared = handle
                        .map(|joined| joined.unwrap_or_else(|e| Err(PlatingError::from(e))))
                        .boxed()
                        .shared();
                    entries.insert(key, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn result(tag: &'static [u8]) -> ProcessedImageResult {
        ProcessedImageResult {
            original: Bytes::from_static(tag),
            processed: Bytes::from_static(tag),
            enhancements: Vec::new(),
            processing_time_ms: 0,
        }
    }

    #[test]
    fn key_depends_on_bytes_and_options() {
        let opts = EnhancementOptions::default();
        let bright = EnhancementOptions {
            brightness: Some(10),
            ..Default::default()
        };

        assert_eq!(
            InFlightRegistry::key(b"abc", &opts),
            InFlightRegistry::key(b"abc", &opts)
        );
        assert_ne!(
            InFlightRegistry::key(b"abc", &opts),
            InFlightRegistry::key(b"abd", &opts)
        );
        assert_ne!(
            InFlightRegistry::key(b"abc", &opts),
            InFlightRegistry::key(b"abc", &bright)
        );
    }

    #[tokio::test]
    async fn overlapping_calls_share_one_computation() {
        let registry = Arc::new(InFlightRegistry::new());
        let started = Arc::new(AtomicUsize::new(0));

        let make = |started: Arc<AtomicUsize>| {
            move || {
                started.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, PlatingError>(result(b"done"))
                }
                .boxed()
            }
        };

        let (a, b) = tokio::join!(
            registry.run("same".to_string(), make(started.clone())),
            registry.run("same".to_string(), make(started.clone())),
        );

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap().processed, b.unwrap().processed);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn sequential_calls_recompute() {
        let registry = Arc::new(InFlightRegistry::new());
        let started = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let counter = started.clone();
            registry
                .run("k".to_string(), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, PlatingError>(result(b"x")) }.boxed()
                })
                .await
                .unwrap();
        }

        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn abandoned_computation_still_finishes_and_clears_entry() {
        let registry = Arc::new(InFlightRegistry::new());
        let finished = Arc::new(AtomicUsize::new(0));

        let counter = finished.clone();
        let waited = tokio::time::timeout(
            Duration::from_millis(10),
            registry.run("slow".to_string(), move || {
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, PlatingError>(result(b"late"))
                }
                .boxed()
            }),
        )
        .await;
        assert!(waited.is_err());
        assert_eq!(registry.len(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn errors_are_shared_too() {
        let registry = Arc::new(InFlightRegistry::new());
        let (a, b) = tokio::join!(
            registry.run("bad".to_string(), || {
                async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err::<ProcessedImageResult, _>(PlatingError::ProcessingFailed)
                }
                .boxed()
            }),
            registry.run("bad".to_string(), || {
                async { Ok::<_, PlatingError>(result(b"never")) }.boxed()
            }),
        );

        assert_eq!(a.unwrap_err(), PlatingError::ProcessingFailed);
        assert_eq!(b.unwrap_err(), PlatingError::ProcessingFailed);
    }
}
