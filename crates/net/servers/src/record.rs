//! Server records, transport families, and the persisted row format.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::config::ServerCacheConfig;

/// On-disk marker for a response time that was never measured.
pub const RESPONSE_TIME_UNMEASURED: u64 = 999_999_999;

/// Largest response time a measured server can hold.
pub const RESPONSE_TIME_MAX: u64 = RESPONSE_TIME_UNMEASURED - 1;

/// Url prefix of the raw binary-protocol transport.
pub const LIBBITCOIN_PREFIX: &str = "tcp://";

/// Url prefix of the line-based stratum transport.
pub const STRATUM_PREFIX: &str = "stratum://";

/// Transport family, derived from a server url's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Transport {
    /// `tcp://` servers.
    #[strum(to_string = "tcp", serialize = "libbitcoin")]
    Libbitcoin,
    /// `stratum://` servers.
    Stratum,
}

impl Transport {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Libbitcoin => LIBBITCOIN_PREFIX,
            Self::Stratum => STRATUM_PREFIX,
        }
    }

    /// Transport family of `url`, or `None` for an unrecognised prefix.
    pub fn of(url: &str) -> Option<Self> {
        if url.starts_with(LIBBITCOIN_PREFIX) {
            Some(Self::Libbitcoin)
        } else if url.starts_with(STRATUM_PREFIX) {
            Some(Self::Stratum)
        } else {
            None
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        url.starts_with(self.prefix())
    }
}

/// Reputation of a single server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRecord {
    pub url: String,
    pub score: i32,
    /// Decayed moving average in milliseconds. `None` until the first sample.
    pub response_time: Option<u64>,
    /// Samples recorded since the cache was loaded.
    pub sample_count: u32,
}

impl ServerRecord {
    /// A server nobody has talked to yet.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            score: 0,
            response_time: None,
            sample_count: 0,
        }
    }

    pub fn transport(&self) -> Option<Transport> {
        Transport::of(&self.url)
    }

    /// Never measured and never scored.
    pub fn is_untested(&self) -> bool {
        self.response_time.is_none() && self.score == 0
    }

    pub(crate) fn to_row(&self) -> ServerRow {
        ServerRow {
            server_url: self.url.clone(),
            server_score: self.score,
            server_response_time: self
                .response_time
                .map_or(RESPONSE_TIME_UNMEASURED, |ms| ms.min(RESPONSE_TIME_MAX)),
        }
    }

    /// Build a record from a persisted row, clamping the score into bounds.
    pub(crate) fn from_row(row: ServerRow, config: &ServerCacheConfig) -> Self {
        let response_time = (row.server_response_time < RESPONSE_TIME_UNMEASURED)
            .then_some(row.server_response_time);
        Self {
            url: row.server_url,
            score: config.clamp_score(i64::from(row.server_score)),
            response_time,
            sample_count: 0,
        }
    }
}

/// One element of the persisted snapshot array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRow {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub server_score: i32,
    #[serde(default = "unmeasured")]
    pub server_response_time: u64,
}

fn unmeasured() -> u64 {
    RESPONSE_TIME_UNMEASURED
}
