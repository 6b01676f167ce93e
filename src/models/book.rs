//! Order book level and update-batch types.

/// Which side of the book a price level or query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Bid,
    Ask,
}

/// A single price level in an order book ladder.
///
/// `qty == 0.0` is a tombstone: it means "delete this price level" when it
/// appears in a [`BookData`] delta, never a resting level in a live book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookLevel {
    pub price: f64,
    pub qty: f64,
}

impl BookLevel {
    pub fn new(price: f64, qty: f64) -> Self {
        Self { price, qty }
    }
}

/// A batch of order book changes: either a full snapshot or an incremental delta.
///
/// `first_update_id` and `sequence` (the exchange's `final_update_id`, `u`)
/// together identify the range of update IDs this batch covers. For a
/// snapshot, `sequence` is the exchange's `lastUpdateId` and `first_update_id`
/// equals `sequence`.
#[derive(Debug, Clone, PartialEq)]
pub struct BookData {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub first_update_id: i64,
    pub sequence: i64,
    pub is_snapshot: bool,
}

impl BookData {
    pub fn snapshot(bids: Vec<BookLevel>, asks: Vec<BookLevel>, last_update_id: i64) -> Self {
        Self {
            bids,
            asks,
            first_update_id: last_update_id,
            sequence: last_update_id,
            is_snapshot: true,
        }
    }

    pub fn delta(
        bids: Vec<BookLevel>,
        asks: Vec<BookLevel>,
        first_update_id: i64,
        sequence: i64,
    ) -> Self {
        Self {
            bids,
            asks,
            first_update_id,
            sequence,
            is_snapshot: false,
        }
    }

    /// A delta is well-formed only if its update-ID range is non-inverted.
    pub fn is_well_formed(&self) -> bool {
        self.first_update_id <= self.sequence
    }
}
