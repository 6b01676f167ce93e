//! Error types and protocol limit constants.

use thiserror::Error;

/// Default capacity of the bounded pending-update buffer carried by an order book.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 10_000;

/// Default maximum sequence gap an order book will buffer through rather than
/// declare unrecoverable.
pub const DEFAULT_MAX_SEQUENCE_GAP: i64 = 1_000;

/// Default anomaly history retained by a `MarketQualityAnalyzer`.
pub const MAX_ANOMALY_HISTORY: usize = 1_000;

/// Default ring buffer size backing `MarketMetrics` latency sampling.
pub const MAX_LATENCY_SAMPLES: usize = 10_000;

#[derive(Debug, Error)]
pub enum Error {
    #[error("sequence gap on {symbol}: expected {expected}, got {received}")]
    ProtocolGap {
        symbol: String,
        expected: i64,
        received: i64,
    },

    #[error("buffer overflow in {buffer}: capacity {capacity} exceeded")]
    BufferOverflow {
        buffer: &'static str,
        capacity: usize,
    },

    #[error("snapshot fetch failed for {symbol}: {message}")]
    SnapshotFetchFailure { symbol: String, message: String },

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited: {subject}")]
    RateLimited { subject: String },

    #[error("already subscribed: {symbol}/{event_type}")]
    AlreadySubscribed { symbol: String, event_type: String },

    #[error("not subscribed: {symbol}/{event_type}")]
    NotSubscribed { symbol: String, event_type: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
