//! TTL-based caching of the catalog snapshot and a circuit breaker guarding
//! the collaborator.

use crate::schedule::Board;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// A cached board with metadata.
#[derive(Clone)]
struct CachedBoard {
    board: Arc<Board>,
    cached_at: Instant,
}

/// Holds the most recently built board for a limited time.
///
/// Only successful loads are cached; a failed fetch never replaces the entry
/// with an empty board.
pub struct SnapshotCache {
    entry: RwLock<Option<CachedBoard>>,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    /// Gets the cached board if it hasn't expired.
    pub fn get(&self) -> Option<Arc<Board>> {
        let guard = self.entry.read().ok()?;
        guard
            .as_ref()
            .filter(|cached| cached.cached_at.elapsed() < self.ttl)
            .map(|cached| cached.board.clone())
    }

    pub fn insert(&self, board: Arc<Board>) {
        if let Ok(mut guard) = self.entry.write() {
            *guard = Some(CachedBoard {
                board,
                cached_at: Instant::now(),
            });
        }
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.entry.write() {
            *guard = None;
        }
    }

    /// Age of the cached entry, expired or not.
    pub fn age(&self) -> Option<Duration> {
        let guard = self.entry.read().ok()?;
        guard.as_ref().map(|cached| cached.cached_at.elapsed())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    failures: u32,
    last_failure: Option<Instant>,
}

/// Circuit breaker for protecting the catalog against repeated failures.
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    recovery_time: Duration,
}

impl CircuitBreaker {
    /// - `threshold`: Number of consecutive failures before the breaker opens
    /// - `recovery_time`: How long to reject requests once open
    pub fn new(threshold: u32, recovery_time: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            threshold,
            recovery_time,
        }
    }

    /// Creates a circuit breaker with default settings (5 failures, 30s recovery).
    pub fn with_defaults() -> Self {
        Self::new(5, Duration::from_secs(30))
    }

    /// Returns true if the breaker is open (blocking requests).
    pub fn is_open(&self) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        if state.failures < self.threshold {
            return false;
        }
        match state.last_failure {
            Some(last) if last.elapsed() <= self.recovery_time => true,
            _ => {
                *state = BreakerState::default();
                false
            }
        }
    }

    pub fn record_success(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = BreakerState::default();
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.failures += 1;
            state.last_failure = Some(Instant::now());
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.state.lock().map(|s| s.failures).unwrap_or(0)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Shared state wrapper combining cache, circuit breaker and the refresh lock.
pub struct CatalogState {
    pub cache: SnapshotCache,
    pub circuit_breaker: CircuitBreaker,
    /// Serializes refreshes so concurrent misses trigger a single fetch
    pub refresh_lock: tokio::sync::Mutex<()>,
}

impl CatalogState {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: SnapshotCache::new(ttl),
            circuit_breaker: CircuitBreaker::with_defaults(),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }
}
