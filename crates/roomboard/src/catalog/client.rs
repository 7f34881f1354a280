//! HTTP client for the catalog collaborator.
//!
//! Loads rooms and subjects concurrently, builds the occupancy board from
//! the resulting snapshot and keeps it in a short-lived cache:
//! 1. Serve from cache if the entry is still fresh
//! 2. Reject early while the circuit breaker is open
//! 3. Take the refresh lock and re-check the cache
//! 4. Fetch `/rooms` and `/subjects`, build the board, cache it

use super::cache::CatalogState;
use super::error::CatalogError;
use super::types::{Room, Snapshot, Subject};
use crate::config::CatalogConfig;
use crate::schedule::Board;
use rand::Rng;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

const ROOMS_PATH: &str = "rooms";
const SUBJECTS_PATH: &str = "subjects";

/// Client for the catalog service that owns rooms, subjects and sections.
pub struct CatalogClient {
    client: Client,
    base_url: Url,
    state: Arc<CatalogState>,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut base_url = Url::parse(&config.base_url)?;
        // `Url::join` drops the last segment unless the path ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            state: Arc::new(CatalogState::with_ttl(Duration::from_secs(
                config.snapshot_ttl_secs,
            ))),
        })
    }

    /// Returns the current board, fetching a fresh snapshot when needed.
    ///
    /// # Arguments
    /// * `force_refresh` - If true, bypass the cache and fetch fresh data
    ///
    /// # Returns
    /// * `Ok(Arc<Board>)` - The board built from a successfully loaded snapshot
    /// * `Err(CatalogError)` - If either collaborator call fails; the board is
    ///   never silently replaced by an empty one
    pub async fn load_board(&self, force_refresh: bool) -> Result<Arc<Board>, CatalogError> {
        if !force_refresh {
            if let Some(board) = self.state.cache.get() {
                return Ok(board);
            }
        }

        let correlation_id = generate_correlation_id();

        if self.state.circuit_breaker.is_open() {
            warn!(
                correlation_id = %correlation_id,
                "Circuit breaker is open, rejecting catalog load"
            );
            return Err(CatalogError::CircuitBreakerOpen);
        }

        let _guard = self.state.refresh_lock.lock().await;

        // Another request may have refreshed while we waited
        if !force_refresh {
            if let Some(board) = self.state.cache.get() {
                debug!(
                    correlation_id = %correlation_id,
                    "Returning board refreshed by a concurrent request"
                );
                return Ok(board);
            }
        }

        let start = Instant::now();
        match self.fetch_snapshot(&correlation_id).await {
            Ok(snapshot) => {
                self.state.circuit_breaker.record_success();
                let board = Arc::new(Board::new(snapshot));
                self.state.cache.insert(board.clone());
                info!(
                    correlation_id = %correlation_id,
                    rooms = board.snapshot.rooms.len(),
                    subjects = board.snapshot.subjects.len(),
                    occupied_cells = board.index.len(),
                    fingerprint = %board.fingerprint,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Catalog snapshot loaded"
                );
                if board.index.is_empty() {
                    warn!(correlation_id = %correlation_id, "Catalog snapshot has no scheduled rooms");
                }
                Ok(board)
            }
            Err(e) => {
                if e.is_retryable() {
                    self.state.circuit_breaker.record_failure();
                }
                error!(
                    correlation_id = %correlation_id,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Catalog snapshot load failed"
                );
                Err(e)
            }
        }
    }

    /// Fetches rooms and subjects concurrently. Either failing fails the snapshot.
    pub async fn fetch_snapshot(&self, correlation_id: &str) -> Result<Snapshot, CatalogError> {
        let (rooms, subjects) = futures::try_join!(
            self.get_json::<Vec<Room>>(ROOMS_PATH, correlation_id),
            self.get_json::<Vec<Subject>>(SUBJECTS_PATH, correlation_id),
        )?;

        Ok(Snapshot {
            rooms,
            subjects,
            fetched_at: chrono::Utc::now(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        correlation_id: &str,
    ) -> Result<T, CatalogError> {
        let url = self.base_url.join(endpoint)?;
        debug!(
            correlation_id = %correlation_id,
            url = %url,
            "Fetching from catalog"
        );

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CatalogError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    /// Drops the cached board so the next load hits the catalog.
    pub fn invalidate(&self) {
        self.state.cache.invalidate();
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }
}

/// Generates a unique correlation ID for request tracing.
fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
