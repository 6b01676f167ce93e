//! The price-indexed order book ladder.

use std::collections::BTreeMap;

use crate::error::{DEFAULT_MAX_BUFFER_SIZE, DEFAULT_MAX_SEQUENCE_GAP};
use crate::models::{BookLevel, Side};

/// Lifecycle state of an [`OrderBook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBookState {
    /// No snapshot has ever been installed.
    Empty,
    /// Either never synchronized, or a gap was detected and a snapshot has
    /// been requested but not yet installed.
    Syncing,
    /// Every delta applied since the last snapshot has been in sequence.
    Synchronized,
}

/// Outcome of applying a single update to an [`OrderBook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// The update's sequence matched the book's expectation and was committed.
    Applied,
    /// The update is ahead of the book but within `max_sequence_gap`; it was
    /// stored in the pending buffer to apply once earlier updates arrive.
    Buffered,
    /// The update's sequence was already covered; no-op.
    Duplicate,
    /// The update is too far ahead to buffer through; a resync was requested.
    GapDetected,
    /// The pending buffer is full; the update was dropped.
    BufferOverflow,
}

/// Tunables for an [`OrderBook`].
#[derive(Debug, Clone, Copy)]
pub struct OrderBookConfig {
    /// Capacity of the pending-update buffer.
    pub max_buffer_size: usize,
    /// Largest sequence gap that will be buffered through rather than
    /// treated as unrecoverable.
    pub max_sequence_gap: i64,
}

impl Default for OrderBookConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            max_sequence_gap: DEFAULT_MAX_SEQUENCE_GAP,
        }
    }
}

/// A price key with the same total order as the `f64` price it was built
/// from, usable in a `BTreeMap`.
///
/// Prices are always strictly positive (an [`OrderBook`] invariant), so
/// comparing the IEEE-754 bit patterns as unsigned integers agrees with
/// numeric ordering. This avoids pulling in a decimal crate purely to get an
/// `Ord` price key; see `DESIGN.md` for the tradeoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct PriceKey(u64);

impl PriceKey {
    fn new(price: f64) -> Self {
        Self(price.to_bits())
    }

    fn price(self) -> f64 {
        f64::from_bits(self.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingUpdate {
    level: BookLevel,
    side: Side,
}

/// Price-indexed order book ladder with gap-aware delta application.
///
/// Bids and asks are kept in separate ordered maps keyed by price. After
/// every accepted mutation, flat `Vec<BookLevel>` caches are rebuilt
/// (bids best-first descending, asks best-first ascending) so that the hot
/// read path (`best_bid`, `top_n`, `market_impact`, ...) never walks a
/// `BTreeMap`.
pub struct OrderBook {
    bids: BTreeMap<PriceKey, f64>,
    asks: BTreeMap<PriceKey, f64>,
    bids_cache: Vec<BookLevel>,
    asks_cache: Vec<BookLevel>,

    sequence: i64,
    expected_sequence: i64,
    state: OrderBookState,

    pending: BTreeMap<i64, PendingUpdate>,
    config: OrderBookConfig,

    gap_count: u64,
    duplicate_count: u64,

    on_snapshot_request: Option<Box<dyn FnMut() + Send>>,
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("state", &self.state)
            .field("sequence", &self.sequence)
            .field("expected_sequence", &self.expected_sequence)
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("pending", &self.pending.len())
            .field("gap_count", &self.gap_count)
            .field("duplicate_count", &self.duplicate_count)
            .finish()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new(OrderBookConfig::default())
    }
}

impl OrderBook {
    pub fn new(config: OrderBookConfig) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            bids_cache: Vec::new(),
            asks_cache: Vec::new(),
            sequence: 0,
            expected_sequence: 1,
            state: OrderBookState::Empty,
            pending: BTreeMap::new(),
            config,
            gap_count: 0,
            duplicate_count: 0,
            on_snapshot_request: None,
        }
    }

    /// Register a callback invoked (with no arguments) whenever the book
    /// needs a fresh snapshot: on the first delta received before any
    /// snapshot, and whenever a gap exceeds `max_sequence_gap`.
    pub fn on_snapshot_request(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_snapshot_request = Some(Box::new(callback));
    }

    fn request_snapshot(&mut self) {
        if let Some(cb) = self.on_snapshot_request.as_mut() {
            cb();
        }
    }

    // ---- mutation ----------------------------------------------------

    /// Replace the book wholesale. Drops any buffered updates at or below
    /// `sequence`, then greedily drains the rest of the pending buffer.
    pub fn apply_snapshot(&mut self, bids: Vec<BookLevel>, asks: Vec<BookLevel>, sequence: i64) {
        self.bids.clear();
        self.asks.clear();
        for level in bids {
            self.apply_level(level, Side::Bid);
        }
        for level in asks {
            self.apply_level(level, Side::Ask);
        }

        self.sequence = sequence;
        self.expected_sequence = sequence + 1;
        self.state = OrderBookState::Synchronized;
        self.pending.retain(|&seq, _| seq > sequence);
        self.drain_pending();
        self.rebuild_caches();
    }

    /// Apply a single-level update identified by `sequence`.
    pub fn apply_delta(&mut self, level: BookLevel, side: Side, sequence: i64) -> UpdateResult {
        if self.state == OrderBookState::Empty {
            self.state = OrderBookState::Syncing;
            self.request_snapshot();
            let inserted = self.buffer_update(sequence, level, side);
            return if inserted {
                UpdateResult::GapDetected
            } else {
                UpdateResult::BufferOverflow
            };
        }

        if sequence <= self.sequence {
            self.duplicate_count += 1;
            return UpdateResult::Duplicate;
        }

        if sequence == self.expected_sequence {
            self.apply_level(level, side);
            self.sequence = sequence;
            self.expected_sequence = sequence + 1;
            self.drain_pending();
            self.rebuild_caches();
            return UpdateResult::Applied;
        }

        let gap = sequence - self.expected_sequence;
        if gap > self.config.max_sequence_gap {
            self.gap_count += 1;
            self.state = OrderBookState::Syncing;
            self.request_snapshot();
            return if self.buffer_update(sequence, level, side) {
                UpdateResult::GapDetected
            } else {
                UpdateResult::BufferOverflow
            };
        }

        if self.buffer_update(sequence, level, side) {
            UpdateResult::Buffered
        } else {
            UpdateResult::BufferOverflow
        }
    }

    /// Apply a batch of bid/ask levels covering `[first_sequence, final_sequence]`.
    pub fn apply_deltas(
        &mut self,
        bids: Vec<BookLevel>,
        asks: Vec<BookLevel>,
        first_sequence: i64,
        final_sequence: i64,
    ) -> UpdateResult {
        if self.state == OrderBookState::Empty {
            self.state = OrderBookState::Syncing;
            self.request_snapshot();
            return UpdateResult::GapDetected;
        }

        if final_sequence <= self.sequence {
            self.duplicate_count += 1;
            return UpdateResult::Duplicate;
        }

        if first_sequence != self.expected_sequence {
            self.gap_count += 1;
            self.state = OrderBookState::Syncing;
            self.request_snapshot();
            return UpdateResult::GapDetected;
        }

        for level in bids {
            self.apply_level(level, Side::Bid);
        }
        for level in asks {
            self.apply_level(level, Side::Ask);
        }

        self.sequence = final_sequence;
        self.expected_sequence = final_sequence + 1;
        self.drain_pending();
        self.rebuild_caches();
        UpdateResult::Applied
    }

    fn apply_level(&mut self, level: BookLevel, side: Side) {
        let key = PriceKey::new(level.price);
        let map = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        if level.qty == 0.0 {
            map.remove(&key);
        } else {
            map.insert(key, level.qty);
        }
    }

    fn buffer_update(&mut self, sequence: i64, level: BookLevel, side: Side) -> bool {
        if !self.pending.contains_key(&sequence) && self.pending.len() >= self.config.max_buffer_size
        {
            return false;
        }
        self.pending.insert(sequence, PendingUpdate { level, side });
        true
    }

    fn drain_pending(&mut self) {
        while let Some(update) = self.pending.remove(&self.expected_sequence) {
            self.apply_level(update.level, update.side);
            self.sequence = self.expected_sequence;
            self.expected_sequence += 1;
        }
        let sequence = self.sequence;
        self.pending.retain(|&seq, _| seq > sequence);
        if self.state == OrderBookState::Syncing && self.pending.is_empty() {
            self.state = OrderBookState::Synchronized;
        }
    }

    fn rebuild_caches(&mut self) {
        self.bids_cache = self
            .bids
            .iter()
            .rev()
            .map(|(k, &qty)| BookLevel::new(k.price(), qty))
            .collect();
        self.asks_cache = self
            .asks
            .iter()
            .map(|(k, &qty)| BookLevel::new(k.price(), qty))
            .collect();
    }

    // ---- observers -----------------------------------------------------

    pub fn state(&self) -> OrderBookState {
        self.state
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn expected_sequence(&self) -> i64 {
        self.expected_sequence
    }

    pub fn gap_count(&self) -> u64 {
        self.gap_count
    }

    pub fn duplicate_count(&self) -> u64 {
        self.duplicate_count
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // ---- queries ---------------------------------------------------------

    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids_cache.first().copied()
    }

    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks_cache.first().copied()
    }

    /// `0.0` when either side is empty; callers must tolerate that sentinel.
    pub fn spread(&self) -> f64 {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => ask.price - bid.price,
            _ => 0.0,
        }
    }

    /// `0.0` when either side is empty; callers must tolerate that sentinel.
    pub fn mid_price(&self) -> f64 {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => (bid.price + ask.price) / 2.0,
            _ => 0.0,
        }
    }

    pub fn depth_at_price(&self, price: f64, side: Side) -> f64 {
        let key = PriceKey::new(price);
        match side {
            Side::Bid => self.bids.get(&key).copied().unwrap_or(0.0),
            Side::Ask => self.asks.get(&key).copied().unwrap_or(0.0),
        }
    }

    pub fn total_depth(&self, side: Side) -> f64 {
        match side {
            Side::Bid => self.bids.values().sum(),
            Side::Ask => self.asks.values().sum(),
        }
    }

    /// Cumulative depth from the worst price on `side` inward up to and
    /// including `price`: for bids, the sum of quantity at prices `<= price`;
    /// for asks, the sum of quantity at prices `>= price`. Monotonically
    /// non-increasing as `price` moves toward the worst price on that side.
    pub fn cumulative_depth(&self, price: f64, side: Side) -> f64 {
        match side {
            Side::Bid => self
                .bids
                .iter()
                .filter(|(k, _)| k.price() <= price)
                .map(|(_, &q)| q)
                .sum(),
            Side::Ask => self
                .asks
                .iter()
                .filter(|(k, _)| k.price() >= price)
                .map(|(_, &q)| q)
                .sum(),
        }
    }

    /// The first `n` cached levels on `side`, best-first, clamped to the
    /// number of levels present.
    pub fn top_n(&self, side: Side, n: usize) -> Vec<BookLevel> {
        let cache = match side {
            Side::Bid => &self.bids_cache,
            Side::Ask => &self.asks_cache,
        };
        cache[..n.min(cache.len())].to_vec()
    }

    /// Size-weighted average fill price for an order of `qty`, walking the
    /// book best-first. Returns `0.0` if `qty` exceeds available liquidity.
    pub fn market_impact(&self, qty: f64, side: Side) -> f64 {
        let cache = match side {
            Side::Bid => &self.bids_cache,
            Side::Ask => &self.asks_cache,
        };
        let mut remaining = qty;
        let mut cost = 0.0;
        for level in cache {
            if remaining <= 0.0 {
                break;
            }
            let take = remaining.min(level.qty);
            cost += take * level.price;
            remaining -= take;
        }
        if remaining > 0.0 { 0.0 } else { cost / qty }
    }

    /// Weighted mean price of the first `depth` units of size on `side`.
    pub fn volume_weighted_average_price(&self, side: Side, depth: f64) -> f64 {
        self.market_impact(depth, side)
    }

    /// Samples `cumulative_depth` at fixed price steps spanning `price_range`
    /// outward from the best price on `side`. Empty if that side has no
    /// liquidity.
    pub fn liquidity_profile(&self, side: Side, price_range: f64, step: f64) -> Vec<(f64, f64)> {
        let Some(best) = (match side {
            Side::Bid => self.best_bid(),
            Side::Ask => self.best_ask(),
        }) else {
            return Vec::new();
        };
        if step <= 0.0 || price_range <= 0.0 {
            return Vec::new();
        }

        let steps = (price_range / step).round() as usize;
        let mut out = Vec::with_capacity(steps + 1);
        for i in 0..=steps {
            let offset = i as f64 * step;
            let price = match side {
                Side::Bid => best.price - offset,
                Side::Ask => best.price + offset,
            };
            out.push((price, self.cumulative_depth(price, side)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(pairs: &[(f64, f64)]) -> Vec<BookLevel> {
        pairs.iter().map(|&(p, q)| BookLevel::new(p, q)).collect()
    }

    #[test]
    fn s1_gap_free_happy_path() {
        let mut book = OrderBook::default();
        book.apply_snapshot(
            levels(&[(10.0, 1.0), (9.9, 2.0)]),
            levels(&[(10.1, 1.0)]),
            100,
        );

        let r1 = book.apply_deltas(levels(&[(10.0, 0.0)]), levels(&[]), 101, 105);
        assert_eq!(r1, UpdateResult::Applied);
        assert_eq!(book.best_bid(), Some(BookLevel::new(9.9, 2.0)));

        let r2 = book.apply_deltas(levels(&[]), levels(&[(10.1, 0.5)]), 106, 106);
        assert_eq!(r2, UpdateResult::Applied);
        assert_eq!(book.best_ask(), Some(BookLevel::new(10.1, 0.5)));

        assert_eq!(book.sequence(), 106);
        assert_eq!(book.best_bid(), Some(BookLevel::new(9.9, 2.0)));
        assert_eq!(book.best_ask(), Some(BookLevel::new(10.1, 0.5)));
        assert!((book.spread() - 0.2).abs() < 1e-9);
        assert!((book.mid_price() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn contiguous_batches_apply_in_order() {
        // `apply_deltas` itself requires exact contiguity (`first_sequence ==
        // expected_sequence`); translating Binance's overlapping
        // `[U, u]` resync window into that contract is `ManagedOrderBook`'s
        // job (see `orderbook::managed::replay_buffer`), not this type's.
        let mut book = OrderBook::default();
        book.apply_snapshot(levels(&[(100.0, 1.0)]), levels(&[(101.0, 1.0)]), 500);

        assert_eq!(
            book.apply_deltas(levels(&[]), levels(&[]), 498, 499),
            UpdateResult::Duplicate
        );
        assert_eq!(
            book.apply_deltas(levels(&[(100.5, 1.0)]), levels(&[]), 501, 501),
            UpdateResult::Applied
        );
        assert_eq!(
            book.apply_deltas(levels(&[(100.6, 1.0)]), levels(&[]), 502, 503),
            UpdateResult::Applied
        );

        assert_eq!(book.sequence(), 503);
        assert_eq!(book.state(), OrderBookState::Synchronized);
    }

    #[test]
    fn s3_unrecoverable_gap_triggers_resync() {
        let mut book = OrderBook::new(OrderBookConfig {
            max_buffer_size: 10_000,
            max_sequence_gap: 100,
        });
        book.apply_snapshot(levels(&[(10.0, 1.0)]), levels(&[(10.1, 1.0)]), 999);
        assert_eq!(
            book.apply_deltas(levels(&[]), levels(&[]), 1000, 1000),
            UpdateResult::Applied
        );
        assert_eq!(book.sequence(), 1000);
        assert_eq!(book.expected_sequence(), 1001);

        let requests = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = requests.clone();
        book.on_snapshot_request(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let result = book.apply_delta(BookLevel::new(10.0, 5.0), Side::Bid, 2001);
        assert_eq!(result, UpdateResult::GapDetected);
        assert_eq!(book.state(), OrderBookState::Syncing);
        assert_eq!(requests.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_delta_is_idempotent() {
        let mut book = OrderBook::default();
        book.apply_snapshot(levels(&[(10.0, 1.0)]), levels(&[(10.1, 1.0)]), 1);

        let first = book.apply_delta(BookLevel::new(10.0, 5.0), Side::Bid, 2);
        assert_eq!(first, UpdateResult::Applied);
        let before = book.best_bid();

        let second = book.apply_delta(BookLevel::new(10.0, 5.0), Side::Bid, 2);
        assert_eq!(second, UpdateResult::Duplicate);
        assert_eq!(book.best_bid(), before);
        assert_eq!(book.duplicate_count(), 1);
    }

    #[test]
    fn apply_delta_at_exact_buffer_boundary_is_buffered_not_gap() {
        let mut book = OrderBook::new(OrderBookConfig {
            max_buffer_size: 10_000,
            max_sequence_gap: 50,
        });
        book.apply_snapshot(levels(&[(10.0, 1.0)]), levels(&[(10.1, 1.0)]), 100);
        // expected_sequence = 101; max_sequence_gap = 50 -> boundary is 151
        let result = book.apply_delta(BookLevel::new(10.0, 2.0), Side::Bid, 151);
        assert_eq!(result, UpdateResult::Buffered);
    }

    #[test]
    fn delete_absent_price_is_a_noop_not_an_error() {
        let mut book = OrderBook::default();
        book.apply_snapshot(levels(&[(10.0, 1.0)]), levels(&[(10.1, 1.0)]), 1);
        let result = book.apply_delta(BookLevel::new(9.0, 0.0), Side::Bid, 2);
        assert_eq!(result, UpdateResult::Applied);
        assert_eq!(book.depth_at_price(9.0, Side::Bid), 0.0);
        assert_eq!(book.sequence(), 2);
    }

    #[test]
    fn cumulative_depth_is_monotonic_as_price_decreases_for_bids() {
        let mut book = OrderBook::default();
        book.apply_snapshot(
            levels(&[(10.0, 1.0), (9.5, 2.0), (9.0, 3.0)]),
            levels(&[(10.5, 1.0)]),
            1,
        );
        let high = book.cumulative_depth(10.0, Side::Bid);
        let mid = book.cumulative_depth(9.5, Side::Bid);
        let low = book.cumulative_depth(9.0, Side::Bid);
        assert!(high >= mid);
        assert!(mid >= low);
        assert_eq!(low, 3.0);
        assert_eq!(high, 6.0);
    }

    #[test]
    fn total_depth_matches_sum_of_cached_levels() {
        let mut book = OrderBook::default();
        book.apply_snapshot(
            levels(&[(10.0, 1.0), (9.5, 2.0)]),
            levels(&[(10.5, 3.0), (11.0, 4.0)]),
            1,
        );
        assert_eq!(book.total_depth(Side::Bid), 3.0);
        assert_eq!(book.total_depth(Side::Ask), 7.0);
    }

    #[test]
    fn market_impact_insufficient_liquidity_returns_zero() {
        let mut book = OrderBook::default();
        book.apply_snapshot(levels(&[]), levels(&[(10.0, 1.0)]), 1);
        assert_eq!(book.market_impact(5.0, Side::Ask), 0.0);
    }

    #[test]
    fn market_impact_walks_levels_in_order() {
        let mut book = OrderBook::default();
        book.apply_snapshot(levels(&[]), levels(&[(10.0, 1.0), (11.0, 1.0)]), 1);
        // buy 1.5 units: 1 @ 10.0 + 0.5 @ 11.0 = 15.5, / 1.5 = 10.333..
        let impact = book.market_impact(1.5, Side::Ask);
        assert!((impact - (15.5 / 1.5)).abs() < 1e-9);
    }

    #[test]
    fn empty_book_first_delta_requests_snapshot_and_buffers() {
        let mut book = OrderBook::default();
        let requested = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = requested.clone();
        book.on_snapshot_request(move || flag.store(true, std::sync::atomic::Ordering::SeqCst));

        let result = book.apply_delta(BookLevel::new(10.0, 1.0), Side::Bid, 5);
        assert_eq!(result, UpdateResult::GapDetected);
        assert_eq!(book.state(), OrderBookState::Syncing);
        assert!(requested.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(book.pending_count(), 1);
    }

    #[test]
    fn buffer_overflow_drops_update() {
        let mut book = OrderBook::new(OrderBookConfig {
            max_buffer_size: 1,
            max_sequence_gap: 1_000,
        });
        book.apply_snapshot(levels(&[(10.0, 1.0)]), levels(&[(10.1, 1.0)]), 1);
        assert_eq!(
            book.apply_delta(BookLevel::new(10.0, 2.0), Side::Bid, 3),
            UpdateResult::Buffered
        );
        assert_eq!(
            book.apply_delta(BookLevel::new(10.0, 3.0), Side::Bid, 4),
            UpdateResult::BufferOverflow
        );
    }
}
