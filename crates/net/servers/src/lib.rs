//! Persistent reputation cache for ranking backend servers.
//!
//! Servers are identified by url; the prefix (`tcp://`, `stratum://`) names
//! the transport. Probes report outcomes through [`ServerCache::score_up`],
//! [`ServerCache::score_down`] and [`ServerCache::record_response_time`], and
//! clients ask [`ServerCache::select`] for a shortlist before connecting.

pub mod cache;
pub mod config;
pub mod record;
pub mod score;
pub mod selection;
pub mod store;
pub mod timer;
pub mod traits;

pub use cache::ServerCache;
pub use config::{ConfigError, DecayConfig, SelectionConfig, ServerCacheConfig};
pub use record::{
    LIBBITCOIN_PREFIX, RESPONSE_TIME_MAX, RESPONSE_TIME_UNMEASURED, STRATUM_PREFIX, ServerRecord,
    ServerRow, Transport,
};
pub use selection::rank_servers;
pub use store::{FileSnapshotStore, MemorySnapshotStore, ServerCacheError, SnapshotStore};
pub use timer::ResponseTimer;
#[cfg(any(test, feature = "test-utils"))]
pub use traits::ManualClock;
pub use traits::{Clock, ServerListProvider, StaticServerList, SystemClock};
