//! Event-rate downsampling strategies.

/// How a [`DataSampler`] decides which events to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingStrategy {
    /// Keep every event.
    None,
    /// Keep at most one event per `interval_ms` milliseconds.
    TimeInterval { interval_ms: i64 },
    /// Keep one event out of every `n`.
    CountInterval { n: u64 },
    /// Like `TimeInterval`, but the interval shrinks as recent price moves
    /// get larger, so volatile stretches get sampled more finely.
    Adaptive {
        base_interval_ms: i64,
        min_interval_ms: i64,
        volatility_factor: f64,
    },
}

/// Decides, event by event, whether to keep or drop it for downstream
/// consumers that don't need full tick-by-tick resolution.
pub struct DataSampler {
    strategy: SamplingStrategy,
    last_sampled_ts_ms: Option<i64>,
    last_sampled_price: Option<f64>,
    events_seen: u64,
}

impl DataSampler {
    pub fn new(strategy: SamplingStrategy) -> Self {
        Self {
            strategy,
            last_sampled_ts_ms: None,
            last_sampled_price: None,
            events_seen: 0,
        }
    }

    /// Decide whether to keep the event at `ts_ms` with price `price`, and
    /// record it as sampled if so.
    pub fn should_sample(&mut self, ts_ms: i64, price: f64) -> bool {
        self.events_seen += 1;

        let keep = match self.strategy {
            SamplingStrategy::None => true,
            SamplingStrategy::TimeInterval { interval_ms } => match self.last_sampled_ts_ms {
                None => true,
                Some(last) => ts_ms - last >= interval_ms,
            },
            SamplingStrategy::CountInterval { n } => {
                let n = n.max(1);
                (self.events_seen - 1) % n == 0
            }
            SamplingStrategy::Adaptive {
                base_interval_ms,
                min_interval_ms,
                volatility_factor,
            } => match (self.last_sampled_ts_ms, self.last_sampled_price) {
                (Some(last_ts), Some(last_price)) if last_price > 0.0 => {
                    let change = ((price - last_price) / last_price).abs();
                    let interval = (base_interval_ms as f64 / (1.0 + volatility_factor * change))
                        .max(min_interval_ms as f64) as i64;
                    ts_ms - last_ts >= interval
                }
                _ => true,
            },
        };

        if keep {
            self.last_sampled_ts_ms = Some(ts_ms);
            self.last_sampled_price = Some(price);
        }
        keep
    }

    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_keeps_every_event() {
        let mut sampler = DataSampler::new(SamplingStrategy::None);
        for i in 0..5 {
            assert!(sampler.should_sample(i, 100.0));
        }
    }

    #[test]
    fn count_interval_keeps_every_nth() {
        let mut sampler = DataSampler::new(SamplingStrategy::CountInterval { n: 3 });
        let kept: Vec<bool> = (0..6).map(|i| sampler.should_sample(i, 100.0)).collect();
        assert_eq!(kept, vec![true, false, false, true, false, false]);
    }

    #[test]
    fn time_interval_respects_spacing() {
        let mut sampler = DataSampler::new(SamplingStrategy::TimeInterval { interval_ms: 1_000 });
        assert!(sampler.should_sample(0, 100.0));
        assert!(!sampler.should_sample(500, 100.0));
        assert!(sampler.should_sample(1_000, 100.0));
    }

    #[test]
    fn adaptive_samples_more_often_during_volatility() {
        let mut calm = DataSampler::new(SamplingStrategy::Adaptive {
            base_interval_ms: 1_000,
            min_interval_ms: 50,
            volatility_factor: 10.0,
        });
        let mut volatile = DataSampler::new(SamplingStrategy::Adaptive {
            base_interval_ms: 1_000,
            min_interval_ms: 50,
            volatility_factor: 10.0,
        });

        calm.should_sample(0, 100.0);
        volatile.should_sample(0, 100.0);

        // Same elapsed time, but volatile has a much bigger price move —
        // it should be eligible to sample again sooner.
        assert!(!calm.should_sample(400, 100.01));
        assert!(volatile.should_sample(400, 130.0));
    }
}
