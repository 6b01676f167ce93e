//! Aggregate configuration for the market data synchronization core.
//!
//! Mirrors the teacher's `KalshiConfig::from_env` pattern: every knob has a
//! sane default, and `from_env` only overrides the ones a deployment sets.

use std::env;

use crate::error::{Error, Result};
use crate::kline::KlineAggregatorConfig;
use crate::orderbook::{ManagedOrderBookConfig, OrderBookConfig};
use crate::quality::MarketQualityConfig;
use crate::subscription::SubscriptionManagerConfig;

/// Every component's tunables in one place, loadable from the environment.
#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    pub order_book: OrderBookConfig,
    pub managed_order_book: ManagedOrderBookConfig,
    pub kline: KlineAggregatorConfig,
    pub quality: MarketQualityConfig,
    pub subscription: SubscriptionManagerConfig,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            order_book: OrderBookConfig::default(),
            managed_order_book: ManagedOrderBookConfig::default(),
            kline: KlineAggregatorConfig::default(),
            quality: MarketQualityConfig::default(),
            subscription: SubscriptionManagerConfig::default(),
        }
    }
}

impl MarketDataConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for any variable that isn't set.
    ///
    /// Recognized variables:
    /// - `MARKET_DATA_MAX_BUFFER_SIZE`: pending-update buffer capacity
    /// - `MARKET_DATA_MAX_SEQUENCE_GAP`: largest gap buffered through
    /// - `MARKET_DATA_SNAPSHOT_TIMEOUT_MS`: per-attempt snapshot fetch timeout
    /// - `MARKET_DATA_RETRY_BASE_DELAY_MS`: snapshot retry backoff base delay
    /// - `MARKET_DATA_RETRY_MAX_DELAY_MS`: snapshot retry backoff ceiling
    /// - `MARKET_DATA_MAX_SNAPSHOT_RETRIES`: snapshot fetch attempts before giving up
    /// - `MARKET_DATA_MAX_SUBSCRIPTIONS_PER_SECOND`: subscribe-rate limit
    /// - `MARKET_DATA_MAX_DEPTH_LEVELS`: price levels retained per side in query results
    /// - `MARKET_DATA_PRICE_SPIKE_THRESHOLD`: fractional price deviation that flags a spike
    /// - `MARKET_DATA_STALE_THRESHOLD_MS`: milliseconds without an event before staleness fires
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = parse_env("MARKET_DATA_MAX_BUFFER_SIZE")? {
            config.order_book.max_buffer_size = v;
            config.managed_order_book.max_buffer_size = v;
        }
        if let Some(v) = parse_env("MARKET_DATA_MAX_SEQUENCE_GAP")? {
            config.order_book.max_sequence_gap = v;
            config.managed_order_book.max_sequence_gap = v;
        }
        if let Some(v) = parse_env("MARKET_DATA_MAX_DEPTH_LEVELS")? {
            config.managed_order_book.max_depth_levels = v;
        }
        if let Some(v) = parse_env("MARKET_DATA_SNAPSHOT_TIMEOUT_MS")? {
            config.managed_order_book.snapshot_timeout_ms = v;
        }
        if let Some(v) = parse_env("MARKET_DATA_RETRY_BASE_DELAY_MS")? {
            config.managed_order_book.retry_base_delay_ms = v;
        }
        if let Some(v) = parse_env("MARKET_DATA_RETRY_MAX_DELAY_MS")? {
            config.managed_order_book.retry_max_delay_ms = v;
        }
        if let Some(v) = parse_env("MARKET_DATA_MAX_SNAPSHOT_RETRIES")? {
            config.managed_order_book.max_snapshot_retries = v;
        }
        if let Some(v) = parse_env("MARKET_DATA_MAX_SUBSCRIPTIONS_PER_SECOND")? {
            config.subscription.max_subscriptions_per_second = v;
        }
        if let Some(v) = parse_env("MARKET_DATA_PRICE_SPIKE_THRESHOLD")? {
            config.quality.price_spike_threshold = v;
        }
        if let Some(v) = parse_env("MARKET_DATA_STALE_THRESHOLD_MS")? {
            config.quality.stale_threshold_ms = v;
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{key} is not a valid value: {raw}"))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(Error::InvalidConfig(format!("{key} is not valid unicode")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_component_defaults() {
        let config = MarketDataConfig::default();
        assert_eq!(config.order_book.max_buffer_size, crate::error::DEFAULT_MAX_BUFFER_SIZE);
        assert_eq!(config.subscription.max_subscriptions_per_second, 10.0);
    }

    #[test]
    fn invalid_numeric_env_var_is_rejected() {
        // SAFETY: test-only, single-threaded access to this specific key.
        unsafe { env::set_var("MARKET_DATA_MAX_BUFFER_SIZE", "not-a-number") };
        let result = MarketDataConfig::from_env();
        unsafe { env::remove_var("MARKET_DATA_MAX_BUFFER_SIZE") };
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
