//! Market data synchronization core for exchange depth/trade streams.
//!
//! This crate keeps an order book caught up with an exchange's snapshot +
//! incremental-delta protocol, aggregates a trade tape into OHLCV candles,
//! watches feed quality for anomalies, and tracks subscription lifecycle and
//! pipeline metrics. Transport (the WebSocket/REST client that actually
//! talks to an exchange) is out of scope: [`orderbook::DeltaSource`] and
//! [`orderbook::SnapshotFetcher`] are the seam a caller's transport plugs
//! into.
//!
//! # Quick Start
//!
//! ```ignore
//! use market_sync_rs::config::MarketDataConfig;
//! use market_sync_rs::orderbook::{ManagedOrderBook, SnapshotFetcher};
//!
//! # async fn example(fetcher: impl SnapshotFetcher) -> market_sync_rs::error::Result<()> {
//! let config = MarketDataConfig::from_env()?;
//! let mut book = ManagedOrderBook::new("BTCUSDT", fetcher, config.managed_order_book);
//! book.start().await?;
//! println!("synchronized: {}", book.is_synchronized());
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variables
//!
//! See [`config::MarketDataConfig::from_env`] for the full list of tunables
//! a deployment can override.

pub mod config;
pub mod error;
pub mod kline;
pub mod metrics;
pub mod models;
pub mod orderbook;
pub mod quality;
pub mod subscription;
pub mod wire;

pub use config::MarketDataConfig;
pub use error::{Error, Result};
pub use kline::{KlineAggregator, KlineAggregatorConfig};
pub use metrics::MarketMetrics;
pub use models::{
    AggregatedKline, BookData, BookLevel, KlineData, KlineInterval, MarketEvent,
    MarketEventKind, MarketEventPayload, MarketKind, Side, TradeData, Venue,
};
pub use orderbook::{
    DeltaSource, ManagedOrderBook, ManagedOrderBookConfig, ManagedOrderBookStats, OrderBook,
    OrderBookConfig, OrderBookState, SnapshotFetcher, SyncState, UpdateResult,
};
pub use quality::{
    Anomaly, AnomalyKind, DataSampler, MarketQualityAnalyzer, MarketQualityConfig, QualityScore,
    SamplingStrategy,
};
pub use subscription::{SubscriptionManager, SubscriptionManagerConfig, SubscriptionState};
