use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;

use crate::error::EstimateError;
use crate::models::solar::SolarPotentialResult;

type Flight = Arc<OnceCell<Result<SolarPotentialResult, EstimateError>>>;

#[derive(Debug, Clone)]
struct CachedResult {
    stored_at: Instant,
    result: SolarPotentialResult,
}

/// Time-bounded store of finished results, keyed by building id or rounded
/// coordinate. Concurrent misses on the same key share one computation.
#[derive(Clone, Debug)]
pub struct ResultCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CachedResult>>>,
    /// Computations currently running, by key.
    in_flight: Arc<Mutex<HashMap<String, Flight>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A fresh entry, if any. Expired entries are treated as absent.
    pub fn get(&self, key: &str) -> Option<SolarPotentialResult> {
        if let Ok(map) = self.entries.read() {
            map.get(key)
                .filter(|c| c.stored_at.elapsed() < self.ttl)
                .map(|c| c.result.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: &str, result: SolarPotentialResult) {
        if let Ok(mut map) = self.entries.write() {
            let ttl = self.ttl;
            map.retain(|_, c| c.stored_at.elapsed() < ttl);
            map.insert(
                key.to_string(),
                CachedResult {
                    stored_at: Instant::now(),
                    result,
                },
            );
        }
    }

    /// Return the cached result for `key`, or run `compute` once for all
    /// concurrent callers of the same key. Only successes are stored.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<SolarPotentialResult, EstimateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SolarPotentialResult, EstimateError>>,
    {
        if let Some(hit) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key, "cache hit");
            return Ok(hit);
        }

        let Some(flight) = self.join_flight(key) else {
            // Registry unavailable: compute without deduplication.
            self.misses.fetch_add(1, Ordering::Relaxed);
            let outcome = compute().await;
            if let Ok(result) = &outcome {
                self.insert(key, result.clone());
            }
            return outcome;
        };

        let outcome = flight
            .get_or_init(|| async move {
                // A flight may have landed between the lookup above and joining.
                if let Some(hit) = self.get(key) {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(hit);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                let outcome = compute().await;
                if let Ok(result) = &outcome {
                    self.insert(key, result.clone());
                }
                outcome
            })
            .await
            .clone();

        self.retire_flight(key, &flight);
        outcome
    }

    fn join_flight(&self, key: &str) -> Option<Flight> {
        let mut map = self.in_flight.lock().ok()?;
        Some(
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone(),
        )
    }

    fn retire_flight(&self, key: &str, flight: &Flight) {
        if let Ok(mut map) = self.in_flight.lock() {
            if map.get(key).is_some_and(|f| Arc::ptr_eq(f, flight)) {
                map.remove(key);
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.read().map(|m| m.len()).unwrap_or(0),
        }
    }
}
