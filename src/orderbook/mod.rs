//! Order book synchronization: a plain ladder ([`OrderBook`]) and the
//! snapshot + buffered-delta protocol that keeps it caught up with an
//! exchange stream ([`ManagedOrderBook`]).
//!
//! # How it works
//!
//! 1. A [`DeltaSource`] streams incremental updates; a [`SnapshotFetcher`]
//!    serves full-state snapshots on demand.
//! 2. [`ManagedOrderBook::start`] buffers inbound deltas while fetching the
//!    first snapshot, then replays buffered deltas newer than it.
//! 3. Once caught up, deltas are applied straight to the underlying
//!    [`OrderBook`]. A sequence gap triggers a fresh snapshot fetch.
//!
//! Transport is out of scope here; `DeltaSource` and `SnapshotFetcher` are
//! the seam a caller's WebSocket/REST client implements against.

mod book;
mod managed;
mod source;

pub use book::{OrderBook, OrderBookConfig, OrderBookState, UpdateResult};
pub use managed::{ManagedOrderBook, ManagedOrderBookConfig, ManagedOrderBookStats, SyncState};
pub use source::{DeltaSource, SnapshotFetcher};
