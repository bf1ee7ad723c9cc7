//! Collaborator seams: the authoritative server list and the wall clock.

use auto_impl::auto_impl;

/// Source of truth for which servers exist.
///
/// Consulted only while loading; the cache keeps exactly these urls.
#[auto_impl(&, Box, Arc)]
pub trait ServerListProvider: Send + Sync {
    fn server_urls(&self) -> Vec<String>;
}

impl ServerListProvider for Vec<String> {
    fn server_urls(&self) -> Vec<String> {
        self.clone()
    }
}

/// Fixed server list, typically read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticServerList {
    urls: Vec<String>,
}

impl StaticServerList {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

impl ServerListProvider for StaticServerList {
    fn server_urls(&self) -> Vec<String> {
        self.urls.clone()
    }
}

/// Wall clock in whole unix seconds.
#[auto_impl(&, Box, Arc)]
pub trait Clock: Send + Sync {
    fn now_unix_secs(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_secs(&self) -> u64 {
        use web_time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::sync::atomic::AtomicU64,
}

#[cfg(any(test, feature = "test-utils"))]
impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: std::sync::atomic::AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, std::sync::atomic::Ordering::Relaxed);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for ManualClock {
    fn now_unix_secs(&self) -> u64 {
        self.now.load(std::sync::atomic::Ordering::Relaxed)
    }
}
