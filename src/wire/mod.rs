//! Exchange wire formats and their conversion into domain types.

pub mod binance;
