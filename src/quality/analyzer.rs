//! Rolling-window anomaly detection over trades and book updates.

use std::collections::VecDeque;

use crate::error::MAX_ANOMALY_HISTORY;
use crate::models::{MarketEvent, MarketEventPayload, TradeData};
use crate::orderbook::{OrderBook, OrderBookState};

/// The kind of anomaly a [`MarketQualityAnalyzer`] can flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// A trade price moved more than `price_spike_threshold` from the
    /// rolling mean trade price.
    PriceSpike,
    /// A trade size was more than `volume_spike_multiplier` times the
    /// rolling mean trade size.
    VolumeSpike,
    /// A trade size fell under `volume_drop_threshold` times the rolling
    /// mean trade size, suggesting thinning liquidity.
    VolumeDrop,
    /// The book spread widened beyond `max_spread_bps`.
    SpreadWidening,
    /// No event has been observed for a symbol in over `stale_threshold_ms`.
    StaleData,
    /// An event's exchange timestamp and receipt timestamp diverged by more
    /// than `max_clock_skew_ms`.
    TimestampAnomaly,
}

/// A single flagged anomaly.
#[derive(Debug, Clone)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub symbol: String,
    pub detected_at_ms: i64,
    pub detail: String,
    /// How far outside normal range the triggering value was, clamped to
    /// `[0.0, 1.0]` (`1.0` is the most severe this analyzer records).
    pub severity: f64,
}

/// Tunables for a [`MarketQualityAnalyzer`].
#[derive(Debug, Clone, Copy)]
pub struct MarketQualityConfig {
    /// Fractional deviation from the rolling mean price that flags a spike.
    pub price_spike_threshold: f64,
    /// Rolling window length, in samples, for the price baseline.
    pub price_lookback_count: usize,
    /// Multiplier over the rolling mean trade size that flags a volume spike.
    pub volume_spike_multiplier: f64,
    /// Fraction of the rolling mean trade size under which a trade flags a
    /// volume drop, once the window has at least 10 samples.
    pub volume_drop_threshold: f64,
    /// Rolling window length, in samples, for the volume baseline.
    pub volume_lookback_count: usize,
    /// Spread, in basis points of mid price, above which `SpreadWidening` fires.
    pub max_spread_bps: f64,
    /// Milliseconds without an event before a symbol is flagged stale.
    pub stale_threshold_ms: i64,
    /// Maximum tolerated gap between an event's exchange timestamp and its
    /// receipt timestamp before `TimestampAnomaly` fires.
    pub max_clock_skew_ms: i64,
    /// Weight of the freshness component in `quality_score().overall`.
    pub freshness_weight: f64,
    /// Weight of the completeness component in `quality_score().overall`.
    pub completeness_weight: f64,
    /// Weight of the consistency component in `quality_score().overall`.
    pub consistency_weight: f64,
    /// Weight of the reliability component in `quality_score().overall`.
    pub reliability_weight: f64,
}

impl Default for MarketQualityConfig {
    fn default() -> Self {
        Self {
            price_spike_threshold: 0.05,
            price_lookback_count: 50,
            volume_spike_multiplier: 5.0,
            volume_drop_threshold: 0.1,
            volume_lookback_count: 50,
            max_spread_bps: 100.0,
            stale_threshold_ms: 30_000,
            max_clock_skew_ms: 5_000,
            freshness_weight: 0.25,
            completeness_weight: 0.25,
            consistency_weight: 0.25,
            reliability_weight: 0.25,
        }
    }
}

/// A composite, weighted breakdown of feed quality, each component in
/// `[0.0, 1.0]` where `1.0` is perfect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityScore {
    /// How close to real-time the feed is (inverse of stale-check hit rate).
    pub freshness: f64,
    /// How few timestamp anomalies (likely dropped/reordered events) were seen.
    pub completeness: f64,
    /// How few price/volume/spread anomalies were seen relative to volume.
    pub consistency: f64,
    /// Inverse of the overall anomaly rate across every event observed.
    pub reliability: f64,
    /// Weighted sum of the four components per the configured weights.
    pub overall: f64,
}

/// Detects trade/book anomalies against a rolling baseline and scores
/// overall feed quality.
pub struct MarketQualityAnalyzer {
    config: MarketQualityConfig,
    price_window: VecDeque<f64>,
    volume_window: VecDeque<f64>,
    spread_window: VecDeque<f64>,
    last_event_ts_ms: Option<i64>,
    anomalies: VecDeque<Anomaly>,
    on_anomaly: Option<Box<dyn FnMut(&Anomaly) + Send>>,
    events_total: u64,
    anomalies_total: u64,
    stale_checks: u64,
    stale_hits: u64,
    timestamp_hits: u64,
    consistency_hits: u64,
}

impl MarketQualityAnalyzer {
    pub fn new(config: MarketQualityConfig) -> Self {
        Self {
            price_window: VecDeque::with_capacity(config.price_lookback_count),
            volume_window: VecDeque::with_capacity(config.volume_lookback_count),
            spread_window: VecDeque::with_capacity(config.price_lookback_count),
            config,
            last_event_ts_ms: None,
            anomalies: VecDeque::new(),
            on_anomaly: None,
            events_total: 0,
            anomalies_total: 0,
            stale_checks: 0,
            stale_hits: 0,
            timestamp_hits: 0,
            consistency_hits: 0,
        }
    }

    /// Invoked synchronously for every newly recorded anomaly.
    pub fn on_anomaly(&mut self, callback: impl FnMut(&Anomaly) + Send + 'static) {
        self.on_anomaly = Some(Box::new(callback));
    }

    /// Feed a trade event, returning any anomalies it triggered.
    ///
    /// `ts_recv_ms` is the local receipt time, used to detect clock skew
    /// against `ts_exchange_ms`.
    pub fn on_trade(&mut self, symbol: &str, trade: &TradeData, ts_exchange_ms: i64, ts_recv_ms: i64) -> Vec<Anomaly> {
        let mut found = Vec::new();
        self.events_total += 1;

        if let Some(anomaly) = self.check_timestamp(symbol, ts_exchange_ms, ts_recv_ms) {
            found.push(anomaly);
        }

        if let Some(mean_price) = mean(&self.price_window) {
            if mean_price > 0.0 {
                let deviation = (trade.price - mean_price).abs() / mean_price;
                if deviation > self.config.price_spike_threshold {
                    let severity = (deviation / (self.config.price_spike_threshold * 3.0)).min(1.0);
                    found.push(self.make_anomaly(
                        AnomalyKind::PriceSpike,
                        symbol,
                        ts_exchange_ms,
                        format!("price {} deviated {:.2}% from rolling mean {:.4}", trade.price, deviation * 100.0, mean_price),
                        severity,
                    ));
                }
            }
        }

        if let Some(mean_volume) = mean(&self.volume_window) {
            if mean_volume > 0.0 {
                let ratio = trade.qty / mean_volume;
                if ratio > self.config.volume_spike_multiplier {
                    let severity = (ratio / (self.config.volume_spike_multiplier * 3.0)).min(1.0);
                    found.push(self.make_anomaly(
                        AnomalyKind::VolumeSpike,
                        symbol,
                        ts_exchange_ms,
                        format!("trade size {} is {:.1}x rolling mean {:.4}", trade.qty, ratio, mean_volume),
                        severity,
                    ));
                } else if self.volume_window.len() >= 10 && ratio < self.config.volume_drop_threshold {
                    let severity = (1.0 - ratio / self.config.volume_drop_threshold).clamp(0.0, 1.0);
                    found.push(self.make_anomaly(
                        AnomalyKind::VolumeDrop,
                        symbol,
                        ts_exchange_ms,
                        format!("trade size {} is {:.1}x rolling mean {:.4}, under the {:.2} drop threshold", trade.qty, ratio, mean_volume, self.config.volume_drop_threshold),
                        severity,
                    ));
                }
            }
        }

        push_bounded(&mut self.price_window, trade.price, self.config.price_lookback_count);
        push_bounded(&mut self.volume_window, trade.qty, self.config.volume_lookback_count);
        self.last_event_ts_ms = Some(ts_exchange_ms);

        for anomaly in &found {
            self.record(anomaly.clone());
        }
        found
    }

    /// Feed a book update, returning any anomalies it triggered.
    pub fn on_book_update(&mut self, symbol: &str, book: &OrderBook, ts_exchange_ms: i64, ts_recv_ms: i64) -> Vec<Anomaly> {
        let mut found = Vec::new();
        self.events_total += 1;

        if let Some(anomaly) = self.check_timestamp(symbol, ts_exchange_ms, ts_recv_ms) {
            found.push(anomaly);
        }

        if book.state() == OrderBookState::Synchronized {
            if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
                let mid = (bid.price + ask.price) / 2.0;
                if mid > 0.0 {
                    let bps = (ask.price - bid.price) / mid * 10_000.0;
                    if bps > self.config.max_spread_bps {
                        let severity = (bps / (self.config.max_spread_bps * 3.0)).min(1.0);
                        found.push(self.make_anomaly(
                            AnomalyKind::SpreadWidening,
                            symbol,
                            ts_exchange_ms,
                            format!("spread {:.2}bps exceeds {:.2}bps ceiling", bps, self.config.max_spread_bps),
                            severity,
                        ));
                    }
                    push_bounded(&mut self.spread_window, bps, self.config.price_lookback_count);
                }
            }
        }

        self.last_event_ts_ms = Some(ts_exchange_ms);
        for anomaly in &found {
            self.record(anomaly.clone());
        }
        found
    }

    /// Dispatch a tagged [`MarketEvent`] to [`Self::on_trade`] or
    /// [`Self::on_book_update`] based on its payload, deriving both
    /// timestamps (and the clock skew `check_timestamp` flags against) from
    /// `event.ts_exchange_ns`/`ts_recv_ns` via [`MarketEvent::clock_skew_ns`]
    /// rather than the caller computing them separately.
    ///
    /// A `Book` payload needs the live [`OrderBook`] passed alongside it,
    /// since the event envelope only carries the raw delta/snapshot, not
    /// the synchronized ladder; pass `None` to skip the book-quality checks
    /// for payload kinds that don't need one.
    pub fn on_event(&mut self, event: &MarketEvent, book: Option<&OrderBook>) -> Vec<Anomaly> {
        let ts_exchange_ms = event.ts_exchange_ns / 1_000_000;
        let ts_recv_ms = ts_exchange_ms + event.clock_skew_ns() / 1_000_000;
        match &event.payload {
            MarketEventPayload::Trade(trade) => {
                self.on_trade(&event.symbol, trade, ts_exchange_ms, ts_recv_ms)
            }
            MarketEventPayload::Book(_) => match book {
                Some(book) => self.on_book_update(&event.symbol, book, ts_exchange_ms, ts_recv_ms),
                None => Vec::new(),
            },
            MarketEventPayload::Kline(_) | MarketEventPayload::Empty => Vec::new(),
        }
    }

    /// Check whether `now_ms` has exceeded the staleness timeout since the
    /// last observed event for this symbol, flagging a
    /// [`AnomalyKind::StaleData`] anomaly if so.
    pub fn check_staleness(&mut self, symbol: &str, now_ms: i64) -> Option<Anomaly> {
        self.stale_checks += 1;
        let last = self.last_event_ts_ms?;
        if now_ms - last > self.config.stale_threshold_ms {
            self.stale_hits += 1;
            let severity = ((now_ms - last) as f64 / (self.config.stale_threshold_ms as f64 * 3.0)).min(1.0);
            let anomaly = self.make_anomaly(
                AnomalyKind::StaleData,
                symbol,
                now_ms,
                format!("no events for {}ms (timeout {}ms)", now_ms - last, self.config.stale_threshold_ms),
                severity,
            );
            self.record(anomaly.clone());
            Some(anomaly)
        } else {
            None
        }
    }

    fn check_timestamp(&mut self, symbol: &str, ts_exchange_ms: i64, ts_recv_ms: i64) -> Option<Anomaly> {
        let skew = (ts_recv_ms - ts_exchange_ms).abs();
        if skew > self.config.max_clock_skew_ms {
            self.timestamp_hits += 1;
            let severity = (skew as f64 / (self.config.max_clock_skew_ms as f64 * 3.0)).min(1.0);
            Some(self.make_anomaly(
                AnomalyKind::TimestampAnomaly,
                symbol,
                ts_exchange_ms,
                format!("clock skew {skew}ms exceeds {}ms ceiling", self.config.max_clock_skew_ms),
                severity,
            ))
        } else {
            None
        }
    }

    fn make_anomaly(&mut self, kind: AnomalyKind, symbol: &str, ts_ms: i64, detail: String, severity: f64) -> Anomaly {
        if !matches!(kind, AnomalyKind::TimestampAnomaly | AnomalyKind::StaleData) {
            self.consistency_hits += 1;
        }
        Anomaly {
            kind,
            symbol: symbol.to_string(),
            detected_at_ms: ts_ms,
            detail,
            severity,
        }
    }

    fn record(&mut self, anomaly: Anomaly) {
        self.anomalies_total += 1;
        if let Some(cb) = self.on_anomaly.as_mut() {
            cb(&anomaly);
        }
        if self.anomalies.len() >= MAX_ANOMALY_HISTORY {
            self.anomalies.pop_front();
        }
        self.anomalies.push_back(anomaly);
    }

    pub fn anomaly_history(&self) -> impl Iterator<Item = &Anomaly> {
        self.anomalies.iter()
    }

    /// A composite, weighted quality breakdown computed from this
    /// analyzer's running counters since construction.
    pub fn quality_score(&self) -> QualityScore {
        let freshness = ratio_complement(self.stale_hits, self.stale_checks);
        let completeness = ratio_complement(self.timestamp_hits, self.events_total);
        let consistency = ratio_complement(self.consistency_hits, self.events_total);
        let reliability = ratio_complement(self.anomalies_total, self.events_total);

        let c = &self.config;
        let weight_sum = c.freshness_weight + c.completeness_weight + c.consistency_weight + c.reliability_weight;
        let overall = if weight_sum > 0.0 {
            (freshness * c.freshness_weight
                + completeness * c.completeness_weight
                + consistency * c.consistency_weight
                + reliability * c.reliability_weight)
                / weight_sum
        } else {
            1.0
        };

        QualityScore {
            freshness,
            completeness,
            consistency,
            reliability,
            overall,
        }
    }
}

fn ratio_complement(hits: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        (1.0 - hits as f64 / total as f64).clamp(0.0, 1.0)
    }
}

fn mean(window: &VecDeque<f64>) -> Option<f64> {
    if window.is_empty() {
        None
    } else {
        Some(window.iter().sum::<f64>() / window.len() as f64)
    }
}

fn push_bounded(window: &mut VecDeque<f64>, value: f64, capacity: usize) {
    if window.len() >= capacity {
        window.pop_front();
    }
    window.push_back(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(price: f64, qty: f64) -> TradeData {
        TradeData::new(price, qty, false, 1)
    }

    #[test]
    fn s5_price_spike_severity_matches_spec_formula() {
        let mut analyzer = MarketQualityAnalyzer::new(MarketQualityConfig::default());
        for i in 0..100 {
            analyzer.on_trade("BTCUSDT", &trade(100.0, 1.0), 1_000 * i, 1_000 * i);
        }
        let anomalies = analyzer.on_trade("BTCUSDT", &trade(110.0, 1.0), 101_000, 101_000);
        let spike = anomalies.iter().find(|a| a.kind == AnomalyKind::PriceSpike).unwrap();
        // deviation = 0.10, threshold = 0.05 -> severity = 0.10 / (0.05*3) = 2/3
        assert!((spike.severity - (2.0 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn volume_drop_requires_ten_samples() {
        let mut analyzer = MarketQualityAnalyzer::new(MarketQualityConfig::default());
        for i in 0..5 {
            analyzer.on_trade("BTCUSDT", &trade(100.0, 10.0), i * 1_000, i * 1_000);
        }
        // Window has fewer than 10 samples; a tiny trade must not yet flag a drop.
        let anomalies = analyzer.on_trade("BTCUSDT", &trade(100.0, 0.1), 6_000, 6_000);
        assert!(!anomalies.iter().any(|a| a.kind == AnomalyKind::VolumeDrop));

        for i in 6..15 {
            analyzer.on_trade("BTCUSDT", &trade(100.0, 10.0), i * 1_000, i * 1_000);
        }
        let anomalies = analyzer.on_trade("BTCUSDT", &trade(100.0, 0.1), 16_000, 16_000);
        assert!(anomalies.iter().any(|a| a.kind == AnomalyKind::VolumeDrop));
    }

    #[test]
    fn stale_data_detected_after_timeout() {
        let mut analyzer = MarketQualityAnalyzer::new(MarketQualityConfig {
            stale_threshold_ms: 5_000,
            ..Default::default()
        });
        analyzer.on_trade("BTCUSDT", &trade(100.0, 1.0), 0, 0);
        assert!(analyzer.check_staleness("BTCUSDT", 3_000).is_none());
        let anomaly = analyzer.check_staleness("BTCUSDT", 10_000);
        assert!(matches!(anomaly, Some(a) if a.kind == AnomalyKind::StaleData));
    }

    #[test]
    fn clock_skew_beyond_ceiling_is_flagged() {
        let mut analyzer = MarketQualityAnalyzer::new(MarketQualityConfig {
            max_clock_skew_ms: 1_000,
            ..Default::default()
        });
        let anomalies = analyzer.on_trade("BTCUSDT", &trade(100.0, 1.0), 0, 5_000);
        assert!(anomalies.iter().any(|a| a.kind == AnomalyKind::TimestampAnomaly));
    }

    #[test]
    fn quality_score_is_perfect_with_no_events() {
        let analyzer = MarketQualityAnalyzer::new(MarketQualityConfig::default());
        let score = analyzer.quality_score();
        assert_eq!(score.overall, 1.0);
    }

    #[test]
    fn quality_score_reliability_drops_with_anomalies() {
        let mut analyzer = MarketQualityAnalyzer::new(MarketQualityConfig::default());
        for i in 0..100 {
            analyzer.on_trade("BTCUSDT", &trade(100.0, 1.0), i * 1_000, i * 1_000);
        }
        analyzer.on_trade("BTCUSDT", &trade(150.0, 1.0), 101_000, 101_000);
        let score = analyzer.quality_score();
        assert!(score.reliability < 1.0);
        assert!(score.overall < 1.0);
    }

    #[test]
    fn anomaly_history_is_bounded() {
        let mut analyzer = MarketQualityAnalyzer::new(MarketQualityConfig {
            stale_threshold_ms: 1,
            ..Default::default()
        });
        analyzer.on_trade("BTCUSDT", &trade(100.0, 1.0), 0, 0);
        for i in 0..(MAX_ANOMALY_HISTORY + 10) {
            analyzer.check_staleness("BTCUSDT", 100 + i as i64 * 10);
        }
        assert!(analyzer.anomaly_history().count() <= MAX_ANOMALY_HISTORY);
    }

    #[test]
    fn on_event_dispatches_trade_payload_and_honors_clock_skew() {
        use crate::models::{MarketEventKind, MarketEventPayload, MarketKind, Venue};

        let mut analyzer = MarketQualityAnalyzer::new(MarketQualityConfig {
            max_clock_skew_ms: 1_000,
            ..Default::default()
        });
        let event = MarketEvent {
            kind: MarketEventKind::Trade,
            venue: Venue::new("binance"),
            symbol: "BTCUSDT".to_string(),
            market_kind: MarketKind::Spot,
            ts_exchange_ns: 0,
            ts_recv_ns: 5_000 * 1_000_000,
            payload: MarketEventPayload::Trade(trade(100.0, 1.0)),
        };
        assert_eq!(event.clock_skew_ns(), 5_000_000_000);

        let anomalies = analyzer.on_event(&event, None);
        assert!(anomalies.iter().any(|a| a.kind == AnomalyKind::TimestampAnomaly));
    }

    #[test]
    fn on_event_ignores_book_payload_without_a_book_handle() {
        use crate::models::{MarketEventKind, MarketEventPayload, MarketKind, Venue};
        use crate::models::BookData;

        let mut analyzer = MarketQualityAnalyzer::new(MarketQualityConfig::default());
        let event = MarketEvent {
            kind: MarketEventKind::BookDelta,
            venue: Venue::new("binance"),
            symbol: "BTCUSDT".to_string(),
            market_kind: MarketKind::Spot,
            ts_exchange_ns: 0,
            ts_recv_ns: 0,
            payload: MarketEventPayload::Book(BookData::delta(vec![], vec![], 1, 1)),
        };
        assert!(analyzer.on_event(&event, None).is_empty());
    }

    #[test]
    fn anomaly_callback_fires_for_each_recorded_anomaly() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut analyzer = MarketQualityAnalyzer::new(MarketQualityConfig {
            stale_threshold_ms: 1,
            ..Default::default()
        });
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        analyzer.on_anomaly(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        analyzer.on_trade("BTCUSDT", &trade(100.0, 1.0), 0, 0);
        analyzer.check_staleness("BTCUSDT", 1_000);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
