//! Value types for ingested market data events.
//!
//! All prices and quantities are `f64`, matching exchange wire formats that
//! encode decimals as strings and get parsed once at the edge (see
//! [`crate::wire`]).

mod book;
mod event;
mod kline;
mod trade;

pub use book::{BookData, BookLevel, Side};
pub use event::{MarketEvent, MarketEventPayload, MarketEventKind, MarketKind, Venue};
pub use kline::{AggregatedKline, KlineData, KlineInterval};
pub use trade::TradeData;
