//! Binance-style snapshot + buffered-delta synchronization state machine.
//!
//! Modeled on the reconnect/backoff shape of the teacher's
//! `batch::RetryConfig` and the buffer-then-replay protocol in
//! `rmadev01-kalshi-rs`'s `orderbook::manager::OrderbookManager`, generalized
//! from Kalshi's single-shot resubscribe to full snapshot refetch plus
//! buffered-delta replay.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::BookData;
use crate::models::{BookLevel, Side};
use crate::orderbook::book::{OrderBook, OrderBookConfig, UpdateResult};
use crate::orderbook::source::SnapshotFetcher;

/// Sync lifecycle of a [`ManagedOrderBook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// `start` has not been called yet.
    Disconnected,
    /// Deltas are being accepted into the pre-snapshot buffer.
    Buffering,
    /// A snapshot request is in flight (or being retried).
    FetchingSnapshot,
    /// The snapshot has been installed; buffered deltas are being replayed.
    Synchronizing,
    /// Caught up: incoming deltas are applied directly to the book.
    Synchronized,
    /// A gap was detected post-sync; a fresh snapshot is being fetched.
    Resynchronizing,
}

/// Tunables for a [`ManagedOrderBook`].
#[derive(Debug, Clone, Copy)]
pub struct ManagedOrderBookConfig {
    /// Capacity of the pre-snapshot delta buffer.
    pub max_buffer_size: usize,
    /// Largest sequence gap buffered through before declaring it unrecoverable.
    pub max_sequence_gap: i64,
    /// Price levels per side retained in query results (`top_n`, liquidity
    /// profile sampling); `0` means unbounded.
    pub max_depth_levels: usize,
    /// How long to wait for a single snapshot fetch before retrying.
    pub snapshot_timeout_ms: u64,
    /// Base delay for the snapshot-retry exponential backoff.
    pub retry_base_delay_ms: u64,
    /// Ceiling on the snapshot-retry backoff delay.
    pub retry_max_delay_ms: u64,
    /// Snapshot fetch attempts allowed before giving up and surfacing an error.
    pub max_snapshot_retries: u32,
}

impl Default for ManagedOrderBookConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: crate::error::DEFAULT_MAX_BUFFER_SIZE,
            max_sequence_gap: crate::error::DEFAULT_MAX_SEQUENCE_GAP,
            max_depth_levels: 0,
            snapshot_timeout_ms: 5_000,
            retry_base_delay_ms: 250,
            retry_max_delay_ms: 30_000,
            max_snapshot_retries: 5,
        }
    }
}

/// Running counters for a [`ManagedOrderBook`]'s sync history.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagedOrderBookStats {
    pub resync_count: u64,
    pub gap_count: u64,
    pub duplicate_count: u64,
    pub snapshot_fetch_failures: u64,
}

/// Drives an [`OrderBook`] through the snapshot + buffered-delta protocol:
/// buffer incoming deltas while a snapshot is fetched, install the snapshot,
/// replay buffered deltas newer than it, then forward subsequent deltas
/// straight through. A sequence gap detected after synchronization triggers
/// a fresh snapshot fetch and repeats the cycle.
pub struct ManagedOrderBook<F: SnapshotFetcher> {
    symbol: String,
    book: OrderBook,
    state: SyncState,
    buffer: BTreeMap<i64, BookData>,
    config: ManagedOrderBookConfig,
    fetcher: F,
    stats: ManagedOrderBookStats,
}

impl<F: SnapshotFetcher> ManagedOrderBook<F> {
    pub fn new(symbol: impl Into<String>, fetcher: F, config: ManagedOrderBookConfig) -> Self {
        let book = OrderBook::new(OrderBookConfig {
            max_buffer_size: config.max_buffer_size,
            max_sequence_gap: config.max_sequence_gap,
        });
        Self {
            symbol: symbol.into(),
            book,
            state: SyncState::Disconnected,
            buffer: BTreeMap::new(),
            config,
            fetcher,
            stats: ManagedOrderBookStats::default(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_synchronized(&self) -> bool {
        self.state == SyncState::Synchronized
    }

    pub fn stats(&self) -> ManagedOrderBookStats {
        self.stats
    }

    pub fn order_book(&self) -> &OrderBook {
        &self.book
    }

    /// Top levels of `side`, clamped to `max_depth_levels` (unbounded if `0`).
    pub fn top_levels(&self, side: Side) -> Vec<BookLevel> {
        let n = if self.config.max_depth_levels == 0 {
            usize::MAX
        } else {
            self.config.max_depth_levels
        };
        self.book.top_n(side, n)
    }

    /// Begin buffering deltas and fetch the first snapshot.
    pub async fn start(&mut self) -> Result<()> {
        self.state = SyncState::Buffering;
        self.fetch_and_apply_snapshot().await
    }

    /// Force a resync: discard the delta buffer and fetch a fresh snapshot.
    pub async fn request_resync(&mut self) -> Result<()> {
        self.stats.resync_count += 1;
        self.state = SyncState::Resynchronizing;
        self.buffer.clear();
        self.fetch_and_apply_snapshot().await
    }

    /// Feed an inbound delta batch. Buffers it if a snapshot is still
    /// pending, otherwise applies it directly to the underlying book.
    pub fn on_delta(&mut self, delta: BookData) -> UpdateResult {
        match self.state {
            SyncState::Disconnected => UpdateResult::GapDetected,
            SyncState::Buffering | SyncState::FetchingSnapshot => self.buffer_delta(delta),
            SyncState::Synchronizing => {
                // The snapshot is installed but the pre-sync buffer hasn't
                // fully drained yet (its first delta didn't overlap the
                // snapshot). Queue this one alongside it and retry the
                // replay; the report reflects only the queueing, since
                // draining can apply an arbitrary number of buffered deltas.
                let result = self.buffer_delta(delta);
                self.replay_buffer();
                if self.buffer.is_empty() {
                    self.state = SyncState::Synchronized;
                }
                result
            }
            SyncState::Synchronized | SyncState::Resynchronizing => {
                let result = self.book.apply_deltas(
                    delta.bids,
                    delta.asks,
                    delta.first_update_id,
                    delta.sequence,
                );
                self.record(result);
                if result == UpdateResult::GapDetected {
                    warn!(symbol = %self.symbol, "gap detected post-sync, resync required");
                    self.state = SyncState::Resynchronizing;
                }
                result
            }
        }
    }

    fn buffer_delta(&mut self, delta: BookData) -> UpdateResult {
        if self.buffer.len() >= self.config.max_buffer_size {
            return UpdateResult::BufferOverflow;
        }
        self.buffer.insert(delta.first_update_id, delta);
        UpdateResult::Buffered
    }

    async fn fetch_and_apply_snapshot(&mut self) -> Result<()> {
        self.state = SyncState::FetchingSnapshot;
        let mut attempt: u32 = 0;
        loop {
            let fetch = tokio::time::timeout(
                Duration::from_millis(self.config.snapshot_timeout_ms),
                self.fetcher.fetch_snapshot(&self.symbol),
            )
            .await;

            match fetch {
                Ok(Ok(snapshot)) => {
                    info!(symbol = %self.symbol, sequence = snapshot.sequence, "snapshot installed");
                    self.install_snapshot(snapshot);
                    return Ok(());
                }
                Ok(Err(err)) => {
                    self.stats.snapshot_fetch_failures += 1;
                    attempt += 1;
                    if attempt > self.config.max_snapshot_retries {
                        return Err(err);
                    }
                    self.backoff(attempt).await;
                }
                Err(_) => {
                    self.stats.snapshot_fetch_failures += 1;
                    attempt += 1;
                    if attempt > self.config.max_snapshot_retries {
                        return Err(Error::SnapshotFetchFailure {
                            symbol: self.symbol.clone(),
                            message: "timed out".to_string(),
                        });
                    }
                    self.backoff(attempt).await;
                }
            }
        }
    }

    async fn backoff(&self, attempt: u32) {
        let shift = attempt.min(16);
        let delay = self
            .config
            .retry_base_delay_ms
            .saturating_mul(1u64 << shift)
            .min(self.config.retry_max_delay_ms);
        debug!(symbol = %self.symbol, attempt, delay_ms = delay, "backing off before snapshot retry");
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    fn install_snapshot(&mut self, snapshot: BookData) {
        let sequence = snapshot.sequence;
        self.book.apply_snapshot(snapshot.bids, snapshot.asks, sequence);
        self.state = SyncState::Synchronizing;
        self.replay_buffer();
        if self.buffer.is_empty() {
            self.state = SyncState::Synchronized;
        }
    }

    /// Drain the pre-sync buffer (oldest `first_update_id` first, which
    /// `BTreeMap` iteration already guarantees) against the snapshot that
    /// was just installed.
    ///
    /// The first delta accepted only needs to *overlap* the snapshot's
    /// sequence rather than start exactly at it (`U <= expected_sequence`
    /// and `u >= expected_sequence`, the Binance-style resync rule), so it's
    /// applied with `self.book.expected_sequence()` as the batch's declared
    /// start rather than its own `first_update_id` — that's what lets
    /// `OrderBook::apply_deltas`'s strict contiguity check accept it.
    /// Every delta after that is already contiguous by construction and is
    /// replayed with its own sequence numbers.
    ///
    /// A delta that neither overlaps nor has already been fully covered is
    /// a genuine gap: it and everything queued behind it are put back so a
    /// later delta arrival can retry the drain, instead of being discarded.
    fn replay_buffer(&mut self) {
        let mut pending: VecDeque<BookData> =
            std::mem::take(&mut self.buffer).into_values().collect();

        while let Some(delta) = pending.pop_front() {
            let expected = self.book.expected_sequence();
            if delta.sequence < expected {
                // Fully covered by what's already applied; drop it.
                continue;
            }
            if delta.first_update_id > expected {
                self.buffer.insert(delta.first_update_id, delta);
                for leftover in pending {
                    self.buffer.insert(leftover.first_update_id, leftover);
                }
                return;
            }
            let result = self
                .book
                .apply_deltas(delta.bids, delta.asks, expected, delta.sequence);
            self.record(result);
        }
    }

    fn record(&mut self, result: UpdateResult) {
        match result {
            UpdateResult::GapDetected => self.stats.gap_count += 1,
            UpdateResult::Duplicate => self.stats.duplicate_count += 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookLevel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedFetcher {
        calls: Arc<AtomicUsize>,
        sequence: i64,
    }

    impl SnapshotFetcher for FixedFetcher {
        async fn fetch_snapshot(&self, _symbol: &str) -> Result<BookData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(BookData::snapshot(
                vec![BookLevel::new(10.0, 1.0)],
                vec![BookLevel::new(10.1, 1.0)],
                self.sequence,
            ))
        }
    }

    #[tokio::test]
    async fn start_buffers_then_replays_newer_deltas() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = FixedFetcher { calls: calls.clone(), sequence: 100 };
        let mut managed = ManagedOrderBook::new("BTCUSDT", fetcher, ManagedOrderBookConfig::default());

        assert_eq!(managed.state(), SyncState::Disconnected);
        managed.start().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(managed.is_synchronized());
        assert_eq!(managed.order_book().sequence(), 100);
    }

    #[tokio::test]
    async fn top_levels_is_clamped_by_max_depth_levels() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = FixedFetcher { calls, sequence: 1 };
        let mut managed = ManagedOrderBook::new(
            "BTCUSDT",
            fetcher,
            ManagedOrderBookConfig { max_depth_levels: 1, ..Default::default() },
        );
        managed.start().await.unwrap();
        assert_eq!(managed.top_levels(crate::models::Side::Bid).len(), 1);
    }

    #[tokio::test]
    async fn deltas_before_start_are_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = FixedFetcher { calls, sequence: 1 };
        let mut managed = ManagedOrderBook::new("BTCUSDT", fetcher, ManagedOrderBookConfig::default());

        let result = managed.on_delta(BookData::delta(vec![], vec![], 1, 1));
        assert_eq!(result, UpdateResult::GapDetected);
    }

    #[tokio::test]
    async fn stale_buffered_delta_is_discarded_on_replay() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = FixedFetcher { calls, sequence: 200 };
        let mut managed = ManagedOrderBook::new("BTCUSDT", fetcher, ManagedOrderBookConfig::default());

        managed.state = SyncState::Buffering;
        managed.on_delta(BookData::delta(vec![], vec![], 50, 60));

        managed.fetch_and_apply_snapshot().await.unwrap();
        assert!(managed.is_synchronized());
        assert_eq!(managed.order_book().sequence(), 200);
    }

    #[tokio::test]
    async fn overlapping_first_delta_is_accepted_on_replay() {
        // Snapshot lands at sequence 500 (expected_sequence becomes 501).
        // The first buffered delta covers [U=500, u=501], which overlaps
        // the snapshot rather than starting exactly at 501 — the Binance
        // resync rule accepts it anyway.
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = FixedFetcher { calls, sequence: 500 };
        let mut managed = ManagedOrderBook::new("BTCUSDT", fetcher, ManagedOrderBookConfig::default());

        managed.state = SyncState::Buffering;
        managed.on_delta(BookData::delta(vec![BookLevel::new(100.5, 1.0)], vec![], 500, 501));
        managed.on_delta(BookData::delta(vec![BookLevel::new(100.6, 1.0)], vec![], 502, 503));

        managed.fetch_and_apply_snapshot().await.unwrap();

        assert!(managed.is_synchronized());
        assert_eq!(managed.order_book().sequence(), 503);
        assert_eq!(managed.stats().gap_count, 0);
    }

    #[tokio::test]
    async fn gap_in_buffer_is_kept_for_retry_not_discarded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = FixedFetcher { calls, sequence: 500 };
        let mut managed = ManagedOrderBook::new("BTCUSDT", fetcher, ManagedOrderBookConfig::default());

        managed.state = SyncState::Buffering;
        // Doesn't overlap [U=500, u=501]: a real gap between the snapshot
        // and the earliest buffered delta.
        managed.on_delta(BookData::delta(vec![], vec![], 600, 601));

        managed.fetch_and_apply_snapshot().await.unwrap();

        assert_eq!(managed.state(), SyncState::Synchronizing);
        assert_eq!(managed.order_book().sequence(), 500);
        assert_eq!(managed.buffer.len(), 1);

        // A later delta that closes the gap (U <= expected <= u) lets the
        // retained delta and this one both drain.
        let result = managed.on_delta(BookData::delta(vec![], vec![], 501, 601));
        assert_eq!(result, UpdateResult::Buffered);
        assert!(managed.is_synchronized());
        assert_eq!(managed.order_book().sequence(), 601);
        assert!(managed.buffer.is_empty());
    }

    #[tokio::test]
    async fn post_sync_gap_moves_to_resynchronizing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = FixedFetcher { calls, sequence: 100 };
        let mut managed = ManagedOrderBook::new("BTCUSDT", fetcher, ManagedOrderBookConfig::default());
        managed.start().await.unwrap();

        let result = managed.on_delta(BookData::delta(vec![], vec![], 5000, 5001));
        assert_eq!(result, UpdateResult::GapDetected);
        assert_eq!(managed.state(), SyncState::Resynchronizing);
        assert_eq!(managed.stats().gap_count, 1);
    }
}
