//! Configuration surface for `psync-core`'s `SyncEngine`: IBLT sizing,
//! request/reply timing, jitter bounds and per-channel compression.

use serde::Deserialize;
use std::time::Duration;

/// Compression scheme applied to the reply payload (`contentCompression`) or
/// the IBLT name component (`digestCompression`). Both peers must agree.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionScheme {
    #[default]
    Identity,
    Zlib,
}

/// `SyncEngine` configuration. All durations are stored in milliseconds on
/// the wire (`serde`-friendly) and exposed as `std::time::Duration` via
/// accessors.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// IBLT cell-count parameter; shared by all peers.
    pub expected_entries: usize,
    /// How long our outbound digest request remains outstanding, in ms.
    pub request_lifetime_ms: u64,
    /// Staleness bound on standard replies, in ms.
    pub reply_freshness_ms: u64,
    /// Staleness bound for "compromise" replies sent when decoding failed
    /// but we have data the peer seems to lack, in ms.
    pub low_freshness_ms: u64,
    /// Diff-size ceiling above which undecoded diffs are abandoned rather
    /// than retried. Defaults to `expected_entries / 2` when unset (`0`).
    pub threshold: usize,
    /// Inclusive jitter bounds added to scheduled events, in ms.
    pub jitter_range_ms: (u64, u64),
    /// Compression applied to the reply payload.
    pub content_compression: CompressionScheme,
    /// Compression applied to the IBLT name component.
    pub digest_compression: CompressionScheme,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            expected_entries: 80,
            request_lifetime_ms: 1600,
            reply_freshness_ms: 1600,
            low_freshness_ms: 10,
            threshold: 0,
            jitter_range_ms: (100, 500),
            content_compression: CompressionScheme::Identity,
            digest_compression: CompressionScheme::Identity,
        }
    }
}

impl SyncConfig {
    pub fn request_lifetime(&self) -> Duration {
        Duration::from_millis(self.request_lifetime_ms)
    }

    pub fn reply_freshness(&self) -> Duration {
        Duration::from_millis(self.reply_freshness_ms)
    }

    pub fn low_freshness(&self) -> Duration {
        Duration::from_millis(self.low_freshness_ms)
    }

    pub fn jitter_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.jitter_range_ms.0),
            Duration::from_millis(self.jitter_range_ms.1),
        )
    }

    /// Effective peel-abandon threshold: the configured value, or
    /// `expected_entries / 2` when left at its zero default.
    pub fn effective_threshold(&self) -> usize {
        if self.threshold == 0 {
            self.expected_entries / 2
        } else {
            self.threshold
        }
    }
}
