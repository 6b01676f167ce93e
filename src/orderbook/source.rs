//! External interfaces a [`crate::orderbook::ManagedOrderBook`] drives.
//!
//! Transport (WebSocket streams, REST snapshot endpoints) is out of scope for
//! this crate; these traits are the seam a caller's transport layer plugs
//! into. Native `async fn` in traits is used rather than the `async-trait`
//! crate since both `fetch_snapshot` and `next_delta` are plain one-shot
//! calls with no need for boxed futures.

use crate::error::Result;
use crate::models::BookData;

/// Fetches a REST-style order book snapshot for a symbol.
pub trait SnapshotFetcher: Send + Sync {
    /// Fetch the current snapshot. Implementations should surface transport
    /// and deserialization failures as [`crate::error::Error::SnapshotFetchFailure`].
    async fn fetch_snapshot(&self, symbol: &str) -> Result<BookData>;
}

/// Supplies incremental delta batches for a symbol, typically backed by a
/// streaming connection.
pub trait DeltaSource: Send + Sync {
    /// Await the next delta batch for `symbol`.
    async fn next_delta(&self, symbol: &str) -> Result<BookData>;
}
