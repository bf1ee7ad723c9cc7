//! Tunables for scoring and selection (TOML-serializable).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest score a server can reach.
pub const DEFAULT_MIN_SCORE: i32 = -100;
/// Highest score a server can reach.
pub const DEFAULT_MAX_SCORE: i32 = 100;
/// Without an upscore for this long the local network is assumed down.
pub const DEFAULT_NETWORK_DOWN_AFTER_SECS: u64 = 60;

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerCacheConfig {
    pub min_score: i32,
    pub max_score: i32,
    /// Downscores are ignored once this many seconds pass without any upscore.
    pub network_down_after_secs: u64,
    pub selection: SelectionConfig,
    pub decay: DecayConfig,
}

impl Default for ServerCacheConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            max_score: DEFAULT_MAX_SCORE,
            network_down_after_secs: DEFAULT_NETWORK_DOWN_AFTER_SECS,
            selection: SelectionConfig::default(),
            decay: DecayConfig::default(),
        }
    }
}

/// A configuration that cannot be applied as written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("min_score ({min}) is greater than max_score ({max})")]
    InvertedScoreBounds { min: i32, max: i32 },
}

impl ServerCacheConfig {
    /// Reject bounds that would leave no valid score.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_score > self.max_score {
            return Err(ConfigError::InvertedScoreBounds {
                min: self.min_score,
                max: self.max_score,
            });
        }
        Ok(())
    }

    /// Clamp into `[min_score, max_score]`. Inverted bounds are swapped.
    pub fn clamp_score(&self, score: i64) -> i32 {
        let lo = self.min_score.min(self.max_score);
        let hi = self.min_score.max(self.max_score);
        score.clamp(i64::from(lo), i64::from(hi)) as i32
    }
}

/// Front-runner window rules used by [`rank_servers`](crate::rank_servers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Maximum distance below the top score for a server to enter the window.
    pub top_score_window: i32,
    /// Window members must score strictly above this.
    pub min_qualified_score: i32,
    /// An untested server is only promoted if its url is longer than this.
    pub min_url_len: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_score_window: 20,
            min_qualified_score: 5,
            min_url_len: 2,
        }
    }
}

/// Response time moving-average parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Every `sample_period`-th sample re-anchors towards the observation.
    pub sample_period: u32,
    /// Weight of the observation on a re-anchoring sample (old value weighs 1).
    pub recent_weight: u64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            sample_period: 10,
            recent_weight: 4,
        }
    }
}
