//! Candlestick (kline) types.

/// Supported candle timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KlineInterval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl KlineInterval {
    /// All intervals a [`crate::kline::KlineAggregator`] tracks by default.
    pub const ALL: [KlineInterval; 7] = [
        KlineInterval::OneMinute,
        KlineInterval::FiveMinutes,
        KlineInterval::FifteenMinutes,
        KlineInterval::ThirtyMinutes,
        KlineInterval::OneHour,
        KlineInterval::FourHours,
        KlineInterval::OneDay,
    ];

    /// Bucket width in milliseconds.
    pub fn duration_ms(self) -> i64 {
        match self {
            KlineInterval::OneMinute => 60_000,
            KlineInterval::FiveMinutes => 5 * 60_000,
            KlineInterval::FifteenMinutes => 15 * 60_000,
            KlineInterval::ThirtyMinutes => 30 * 60_000,
            KlineInterval::OneHour => 60 * 60_000,
            KlineInterval::FourHours => 4 * 60 * 60_000,
            KlineInterval::OneDay => 24 * 60 * 60_000,
        }
    }

    /// The start of the bucket `ts_ms` falls into.
    pub fn bucket_start(self, ts_ms: i64) -> i64 {
        let d = self.duration_ms();
        (ts_ms.div_euclid(d)) * d
    }
}

/// A plain OHLCV candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KlineData {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub start_time_ms: i64,
    pub close_time_ms: i64,
}

/// A candle enriched with trade-stream statistics, as produced by
/// [`crate::kline::KlineAggregator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedKline {
    pub kline: KlineData,
    pub vwap: f64,
    pub trade_count: u64,
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub is_closed: bool,
}

impl AggregatedKline {
    pub fn open(&self) -> f64 {
        self.kline.open
    }
    pub fn high(&self) -> f64 {
        self.kline.high
    }
    pub fn low(&self) -> f64 {
        self.kline.low
    }
    pub fn close(&self) -> f64 {
        self.kline.close
    }
    pub fn volume(&self) -> f64 {
        self.kline.volume
    }
    pub fn start_time_ms(&self) -> i64 {
        self.kline.start_time_ms
    }
}
