//! Tagged event envelope shared by every consumer of the ingest stream.

use super::{BookData, KlineData, TradeData};

/// Which kind of payload a [`MarketEvent`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketEventKind {
    Trade,
    BookTop,
    BookDelta,
    Kline,
    Ticker,
}

/// Coarse classification of the instrument an event refers to.
///
/// Option/futures-specific contract semantics are out of scope for this
/// crate; the variant exists only so events can be routed or filtered by
/// market kind upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketKind {
    Spot,
    Futures,
    Option,
}

/// The venue (exchange) an event originated from.
///
/// A newtype over `String` rather than a closed enum: the synchronization
/// core is venue-agnostic and must not need a code change to track a new
/// exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Venue(pub String);

impl Venue {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The payload carried by a [`MarketEvent`], tagged by [`MarketEventKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEventPayload {
    Trade(TradeData),
    Book(BookData),
    Kline(KlineData),
    Empty,
}

/// A single ingested market data event, tagged with venue/symbol/timing
/// metadata and a typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketEvent {
    pub kind: MarketEventKind,
    pub venue: Venue,
    pub symbol: String,
    pub market_kind: MarketKind,
    pub ts_exchange_ns: i64,
    pub ts_recv_ns: i64,
    pub payload: MarketEventPayload,
}

impl MarketEvent {
    /// Clock skew between the exchange's reported event time and local
    /// receipt time, in nanoseconds. Positive means the event was received
    /// after the exchange reported it happening, as expected.
    pub fn clock_skew_ns(&self) -> i64 {
        self.ts_recv_ns - self.ts_exchange_ns
    }
}
