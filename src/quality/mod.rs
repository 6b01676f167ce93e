//! Market data quality: anomaly detection and event downsampling.

mod analyzer;
mod sampler;

pub use analyzer::{Anomaly, AnomalyKind, MarketQualityAnalyzer, MarketQualityConfig, QualityScore};
pub use sampler::{DataSampler, SamplingStrategy};
