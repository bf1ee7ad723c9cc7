//! The server reputation cache: one lock over the record table, the dirty
//! flag and the last-upscore heartbeat.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::config::ServerCacheConfig;
use crate::record::{ServerRecord, Transport};
use crate::selection::rank_servers;
use crate::store::{FileSnapshotStore, ServerCacheError, SnapshotStore};
use crate::timer::ResponseTimer;
use crate::traits::{Clock, ServerListProvider, SystemClock};

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, ServerRecord>,
    dirty: bool,
    /// Unix seconds of the most recent upscore on any server.
    last_positive: Option<u64>,
}

/// Thread-safe, persistent reputation table for backend servers.
///
/// Every operation takes the single internal lock for its whole duration,
/// including snapshot I/O, except [`select`](Self::select) which only holds
/// it while copying candidates out.
pub struct ServerCache {
    config: ServerCacheConfig,
    store: Box<dyn SnapshotStore>,
    provider: Box<dyn ServerListProvider>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for ServerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCache")
            .field("config", &self.config)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl ServerCache {
    /// Cache persisted as JSON at `path`, with default tunables.
    pub fn new(path: impl Into<PathBuf>, provider: impl ServerListProvider + 'static) -> Self {
        Self::with_config(path, provider, ServerCacheConfig::default())
    }

    pub fn with_config(
        path: impl Into<PathBuf>,
        provider: impl ServerListProvider + 'static,
        config: ServerCacheConfig,
    ) -> Self {
        Self::with_store(FileSnapshotStore::new(path), provider, config)
    }

    pub fn with_store(
        store: impl SnapshotStore + 'static,
        provider: impl ServerListProvider + 'static,
        config: ServerCacheConfig,
    ) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "score bounds are inverted, swapping them");
        }
        Self {
            config,
            store: Box::new(store),
            provider: Box::new(provider),
            clock: Arc::new(SystemClock),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Replace the wall clock used for the network-down heuristic.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ServerCacheConfig {
        &self.config
    }

    /// Rebuild the table from the stored snapshot and the authoritative list,
    /// then persist the result. Returns the number of servers now known.
    ///
    /// An unreadable snapshot is logged and treated as empty. Stored servers
    /// missing from the authoritative list are dropped; new ones start at
    /// score 0 with no response time.
    pub fn load(&self) -> Result<usize, ServerCacheError> {
        let mut inner = self.inner.lock();

        let rows = self.store.load().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read server snapshot, starting empty");
            Vec::new()
        });
        let stored = rows.len();

        let mut persisted: HashMap<String, ServerRecord> = HashMap::with_capacity(rows.len());
        let mut normalized = 0usize;
        for row in rows {
            let stored_values = (row.server_score, row.server_response_time);
            let record = ServerRecord::from_row(row, &self.config);
            if let Entry::Vacant(slot) = persisted.entry(record.url.clone()) {
                let row = record.to_row();
                if (row.server_score, row.server_response_time) != stored_values {
                    normalized += 1;
                }
                slot.insert(record);
            }
        }

        let mut records = HashMap::new();
        let mut added = 0usize;
        for url in self.provider.server_urls() {
            if records.contains_key(&url) {
                continue;
            }
            let record = match persisted.remove(&url) {
                Some(record) => record,
                None => {
                    added += 1;
                    ServerRecord::new(url.clone())
                }
            };
            records.insert(url, record);
        }

        let dropped = persisted.len();
        if added > 0 || dropped > 0 || normalized > 0 || records.len() != stored {
            inner.dirty = true;
        }

        for record in records.values() {
            trace!(score = record.score, response_time = ?record.response_time, url = %record.url, "loaded server");
        }
        debug!(count = records.len(), added, dropped, normalized, "loaded server cache");

        inner.records = records;
        self.save_locked(&mut inner)?;
        Ok(inner.records.len())
    }

    /// Persist the table if it changed since the last successful save.
    pub fn save(&self) -> Result<(), ServerCacheError> {
        let mut inner = self.inner.lock();
        self.save_locked(&mut inner)
    }

    fn save_locked(&self, inner: &mut Inner) -> Result<(), ServerCacheError> {
        if !inner.dirty {
            return Ok(());
        }

        let rows: Vec<_> = inner.records.values().map(ServerRecord::to_row).collect();
        self.store.store(&rows)?;
        inner.dirty = false;

        debug!(count = rows.len(), "saved server cache");
        Ok(())
    }

    /// Forget every server. The snapshot on disk is left alone.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        if !inner.records.is_empty() {
            inner.records.clear();
            inner.dirty = true;
        }
    }

    /// Reward a server, and note that the network is reachable.
    ///
    /// The heartbeat is recorded even when `url` is unknown.
    pub fn score_up(&self, url: &str, delta: i32) {
        let mut inner = self.inner.lock();

        if let Some(record) = inner.records.get_mut(url) {
            record.add_score(delta, &self.config);
            debug!(%url, score = record.score, "server score up");
            inner.dirty = true;
        }

        let now = self.clock.now_unix_secs();
        inner.last_positive = Some(inner.last_positive.map_or(now, |t| t.max(now)));
    }

    /// Penalise a server, unless nothing has succeeded recently.
    ///
    /// Without any upscore in the last `network_down_after_secs` the local
    /// network is presumed down and nobody is penalised.
    pub fn score_down(&self, url: &str, delta: i32) {
        let mut inner = self.inner.lock();

        let now = self.clock.now_unix_secs();
        let network_up = inner
            .last_positive
            .is_some_and(|t| now.saturating_sub(t) <= self.config.network_down_after_secs);
        if !network_up {
            trace!(%url, "network looks down, not penalising");
            return;
        }

        if let Some(record) = inner.records.get_mut(url) {
            record.add_score(delta.saturating_neg(), &self.config);
            debug!(%url, score = record.score, "server score down");
            inner.dirty = true;
        }
    }

    /// Fold a measured response time into the server's moving average.
    pub fn record_response_time(&self, url: &str, millis: u64) {
        let mut inner = self.inner.lock();

        if let Some(record) = inner.records.get_mut(url) {
            let old = record.response_time;
            record.record_response_time(millis, &self.config.decay);
            debug!(%url, ?old, new = ?record.response_time, "server response time");
            inner.dirty = true;
        }
    }

    /// Record the time elapsed on `timer` as a response time for `url`.
    pub fn record_elapsed(&self, url: &str, timer: &ResponseTimer) {
        self.record_response_time(url, timer.elapsed_millis());
    }

    /// Up to `count` server urls for `filter` (all transports when `None`),
    /// best first. See [`rank_servers`] for the ordering rules.
    pub fn select(&self, filter: Option<Transport>, count: usize) -> Vec<String> {
        if count == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<ServerRecord> = {
            let inner = self.inner.lock();
            inner
                .records
                .values()
                .filter(|r| filter.is_none_or(|t| t.matches(&r.url)))
                .cloned()
                .collect()
        };
        candidates.sort_by(|a, b| a.url.cmp(&b.url));

        let servers = rank_servers(candidates, count, &self.config.selection);
        trace!(?filter, count, ?servers, "selected servers");
        servers
    }

    pub fn get(&self, url: &str) -> Option<ServerRecord> {
        self.inner.lock().records.get(url).cloned()
    }

    /// Copy of every record, in no particular order.
    pub fn records(&self) -> Vec<ServerRecord> {
        self.inner.lock().records.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.lock().dirty
    }

    /// Unix seconds of the most recent upscore, if any.
    pub fn last_positive(&self) -> Option<u64> {
        self.inner.lock().last_positive
    }
}
