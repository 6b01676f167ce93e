//! OHLCV candle aggregation from a trade tape.
//!
//! One [`KlineAggregator`] tracks several [`KlineInterval`] timeframes in
//! parallel, each with its own in-progress candle and bounded history.

use std::collections::HashMap;

use crate::models::{AggregatedKline, KlineData, KlineInterval, MarketEvent, MarketEventPayload, TradeData};

/// Tunables for a [`KlineAggregator`].
#[derive(Debug, Clone)]
pub struct KlineAggregatorConfig {
    /// Timeframes to aggregate concurrently.
    pub intervals: Vec<KlineInterval>,
    /// Closed candles retained per interval before the oldest is dropped.
    pub max_history_per_interval: usize,
}

impl Default for KlineAggregatorConfig {
    fn default() -> Self {
        Self {
            intervals: KlineInterval::ALL.to_vec(),
            max_history_per_interval: 500,
        }
    }
}

#[derive(Debug, Clone)]
struct BucketAccum {
    kline: KlineData,
    quote_volume: f64,
    trade_count: u64,
    buy_volume: f64,
    sell_volume: f64,
}

impl BucketAccum {
    fn start(trade: &TradeData, bucket_start: i64, close_time: i64) -> Self {
        Self {
            kline: KlineData {
                open: trade.price,
                high: trade.price,
                low: trade.price,
                close: trade.price,
                volume: 0.0,
                start_time_ms: bucket_start,
                close_time_ms: close_time,
            },
            quote_volume: 0.0,
            trade_count: 0,
            buy_volume: 0.0,
            sell_volume: 0.0,
        }
    }

    fn absorb(&mut self, trade: &TradeData) {
        self.kline.high = self.kline.high.max(trade.price);
        self.kline.low = self.kline.low.min(trade.price);
        self.kline.close = trade.price;
        self.kline.volume += trade.qty;
        self.quote_volume += trade.price * trade.qty;
        self.trade_count += 1;
        if trade.is_buyer_maker {
            self.sell_volume += trade.qty;
        } else {
            self.buy_volume += trade.qty;
        }
    }

    fn snapshot(&self, is_closed: bool) -> AggregatedKline {
        let vwap = if self.kline.volume > 0.0 {
            self.quote_volume / self.kline.volume
        } else {
            self.kline.close
        };
        AggregatedKline {
            kline: self.kline,
            vwap,
            trade_count: self.trade_count,
            buy_volume: self.buy_volume,
            sell_volume: self.sell_volume,
            is_closed,
        }
    }
}

#[derive(Debug, Default)]
struct IntervalState {
    current: Option<BucketAccum>,
    history: Vec<AggregatedKline>,
}

type UpdateCallback = Box<dyn FnMut(KlineInterval, &AggregatedKline) + Send>;

/// Aggregates a trade tape into OHLCV candles across several timeframes.
pub struct KlineAggregator {
    config: KlineAggregatorConfig,
    states: HashMap<KlineInterval, IntervalState>,
    on_update: Option<UpdateCallback>,
    on_close: Option<UpdateCallback>,
}

impl KlineAggregator {
    pub fn new(config: KlineAggregatorConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
            on_update: None,
            on_close: None,
        }
    }

    /// Invoked after every trade with the in-progress candle for each interval.
    pub fn emit_on_update(&mut self, callback: impl FnMut(KlineInterval, &AggregatedKline) + Send + 'static) {
        self.on_update = Some(Box::new(callback));
    }

    /// Invoked once a candle's bucket has fully elapsed, with the final candle.
    pub fn emit_on_close(&mut self, callback: impl FnMut(KlineInterval, &AggregatedKline) + Send + 'static) {
        self.on_close = Some(Box::new(callback));
    }

    /// Fold a trade into every tracked interval, rolling over any buckets
    /// the trade's timestamp has moved past.
    pub fn process_trade(&mut self, trade: TradeData, ts_exchange_ms: i64) {
        let intervals = self.config.intervals.clone();
        let max_history = self.config.max_history_per_interval;

        for interval in intervals {
            let bucket_start = interval.bucket_start(ts_exchange_ms);
            let close_time = bucket_start + interval.duration_ms() - 1;
            let state = self.states.entry(interval).or_default();

            let needs_new_bucket = match &state.current {
                Some(accum) => accum.kline.start_time_ms != bucket_start,
                None => true,
            };

            if needs_new_bucket {
                if let Some(prev) = state.current.take() {
                    let closed = prev.snapshot(true);
                    state.history.push(closed.clone());
                    if state.history.len() > max_history {
                        state.history.remove(0);
                    }
                    if let Some(cb) = self.on_close.as_mut() {
                        cb(interval, &closed);
                    }
                }
                state.current = Some(BucketAccum::start(&trade, bucket_start, close_time));
            }

            let accum = state.current.as_mut().expect("just inserted above");
            accum.absorb(&trade);
            let current = accum.snapshot(false);
            if let Some(cb) = self.on_update.as_mut() {
                cb(interval, &current);
            }
        }
    }

    /// Fold a tagged [`MarketEvent`] into every tracked interval, a no-op for
    /// any payload other than [`MarketEventPayload::Trade`].
    pub fn process_event(&mut self, event: &MarketEvent) {
        if let MarketEventPayload::Trade(trade) = &event.payload {
            self.process_trade(trade.clone(), event.ts_exchange_ns / 1_000_000);
        }
    }

    /// The in-progress candle for `interval`, if any trade has landed in it yet.
    pub fn current_kline(&self, interval: KlineInterval) -> Option<AggregatedKline> {
        self.states
            .get(&interval)
            .and_then(|s| s.current.as_ref())
            .map(|a| a.snapshot(false))
    }

    /// The most recent `count` closed candles for `interval`, newest first.
    pub fn history(&self, interval: KlineInterval, count: usize) -> Vec<AggregatedKline> {
        self.history_oldest_first(interval)
            .iter()
            .rev()
            .take(count)
            .copied()
            .collect()
    }

    /// Closed candles for `interval`, oldest first, bounded by
    /// `max_history_per_interval`.
    fn history_oldest_first(&self, interval: KlineInterval) -> &[AggregatedKline] {
        self.states
            .get(&interval)
            .map(|s| s.history.as_slice())
            .unwrap_or(&[])
    }

    /// Closed candles for `interval` whose `start_time_ms` falls within
    /// `[start_ms, end_ms]`.
    pub fn range(&self, interval: KlineInterval, start_ms: i64, end_ms: i64) -> Vec<AggregatedKline> {
        self.history_oldest_first(interval)
            .iter()
            .filter(|k| k.start_time_ms() >= start_ms && k.start_time_ms() <= end_ms)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(price: f64, qty: f64, is_buyer_maker: bool) -> TradeData {
        TradeData::new(price, qty, is_buyer_maker, 1)
    }

    #[test]
    fn s4_trades_aggregate_into_a_single_bucket() {
        let mut agg = KlineAggregator::new(KlineAggregatorConfig {
            intervals: vec![KlineInterval::OneMinute],
            max_history_per_interval: 10,
        });

        agg.process_trade(trade(100.0, 1.0, false), 1_000);
        agg.process_trade(trade(105.0, 2.0, false), 10_000);
        agg.process_trade(trade(95.0, 1.0, true), 30_000);
        agg.process_trade(trade(102.0, 1.0, false), 59_000);

        let candle = agg.current_kline(KlineInterval::OneMinute).unwrap();
        assert_eq!(candle.open(), 100.0);
        assert_eq!(candle.high(), 105.0);
        assert_eq!(candle.low(), 95.0);
        assert_eq!(candle.close(), 102.0);
        assert_eq!(candle.volume(), 5.0);
        assert_eq!(candle.trade_count, 4);
        assert!((candle.buy_volume - 4.0).abs() < 1e-9);
        assert!((candle.sell_volume - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bucket_rollover_closes_previous_candle() {
        let mut agg = KlineAggregator::new(KlineAggregatorConfig {
            intervals: vec![KlineInterval::OneMinute],
            max_history_per_interval: 10,
        });

        agg.process_trade(trade(100.0, 1.0, false), 1_000);
        agg.process_trade(trade(110.0, 1.0, false), 65_000);

        let history = agg.history(KlineInterval::OneMinute, 10);
        assert_eq!(history.len(), 1);
        assert!(history[0].is_closed);
        assert_eq!(history[0].close(), 100.0);

        let current = agg.current_kline(KlineInterval::OneMinute).unwrap();
        assert_eq!(current.open(), 110.0);
        assert!(!current.is_closed);
    }

    #[test]
    fn history_is_bounded_by_max_history_per_interval() {
        let mut agg = KlineAggregator::new(KlineAggregatorConfig {
            intervals: vec![KlineInterval::OneMinute],
            max_history_per_interval: 2,
        });

        for i in 0..5 {
            agg.process_trade(trade(100.0, 1.0, false), i * 60_000);
        }

        assert_eq!(agg.history(KlineInterval::OneMinute, 10).len(), 2);
    }

    #[test]
    fn history_returns_newest_first() {
        let mut agg = KlineAggregator::new(KlineAggregatorConfig {
            intervals: vec![KlineInterval::OneMinute],
            max_history_per_interval: 10,
        });
        for i in 0..4 {
            agg.process_trade(trade(100.0 + i as f64, 1.0, false), i * 60_000);
        }
        let history = agg.history(KlineInterval::OneMinute, 2);
        assert_eq!(history.len(), 2);
        assert!(history[0].start_time_ms() > history[1].start_time_ms());
    }

    #[test]
    fn on_close_callback_fires_exactly_once_per_rollover() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut agg = KlineAggregator::new(KlineAggregatorConfig {
            intervals: vec![KlineInterval::OneMinute],
            max_history_per_interval: 10,
        });
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = closes.clone();
        agg.emit_on_close(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        agg.process_trade(trade(100.0, 1.0, false), 1_000);
        agg.process_trade(trade(100.0, 1.0, false), 2_000);
        agg.process_trade(trade(100.0, 1.0, false), 65_000);
        agg.process_trade(trade(100.0, 1.0, false), 130_000);

        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn process_event_folds_a_trade_payload() {
        use crate::models::{MarketEventKind, MarketKind, Venue};

        let mut agg = KlineAggregator::new(KlineAggregatorConfig {
            intervals: vec![KlineInterval::OneMinute],
            max_history_per_interval: 10,
        });
        let event = MarketEvent {
            kind: MarketEventKind::Trade,
            venue: Venue::new("binance"),
            symbol: "BTCUSDT".to_string(),
            market_kind: MarketKind::Spot,
            ts_exchange_ns: 1_000 * 1_000_000,
            ts_recv_ns: 1_000 * 1_000_000,
            payload: MarketEventPayload::Trade(trade(100.0, 1.0, false)),
        };
        agg.process_event(&event);

        let candle = agg.current_kline(KlineInterval::OneMinute).unwrap();
        assert_eq!(candle.close(), 100.0);
    }

    #[test]
    fn range_filters_by_bucket_start() {
        let mut agg = KlineAggregator::new(KlineAggregatorConfig {
            intervals: vec![KlineInterval::OneMinute],
            max_history_per_interval: 10,
        });
        for i in 0..4 {
            agg.process_trade(trade(100.0, 1.0, false), i * 60_000);
        }
        let closed = agg.range(KlineInterval::OneMinute, 60_000, 120_000);
        assert_eq!(closed.len(), 2);
    }
}
