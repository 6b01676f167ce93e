//! Binance-style wire types and their conversions into domain types.
//!
//! Field names match the exchange's combined-stream JSON payloads exactly
//! (`e`, `E`, `s`, `U`, `u`, `b`, `a`, `p`, `q`, `m`, `t`); prices and
//! quantities arrive as strings and are parsed once here, at the edge.

use serde::Deserialize;

use crate::error::Error;
use crate::models::{BookData, BookLevel, TradeData};

#[derive(Debug, Clone, Deserialize)]
pub struct DepthUpdate {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "U")]
    pub first_update_id: i64,
    #[serde(rename = "u")]
    pub final_update_id: i64,
    #[serde(rename = "b")]
    pub bids: Vec<[String; 2]>,
    #[serde(rename = "a")]
    pub asks: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepthSnapshot {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: i64,
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggTrade {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "t")]
    pub trade_id: i64,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub qty: String,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

fn parse_levels(raw: &[[String; 2]]) -> Result<Vec<BookLevel>, Error> {
    raw.iter()
        .map(|[price, qty]| {
            let price: f64 = price
                .parse()
                .map_err(|_| Error::MalformedEvent(format!("bad price: {price}")))?;
            let qty: f64 = qty
                .parse()
                .map_err(|_| Error::MalformedEvent(format!("bad qty: {qty}")))?;
            Ok(BookLevel::new(price, qty))
        })
        .collect()
}

impl TryFrom<DepthUpdate> for BookData {
    type Error = Error;

    fn try_from(update: DepthUpdate) -> Result<Self, Self::Error> {
        let bids = parse_levels(&update.bids)?;
        let asks = parse_levels(&update.asks)?;
        Ok(BookData::delta(
            bids,
            asks,
            update.first_update_id,
            update.final_update_id,
        ))
    }
}

impl TryFrom<DepthSnapshot> for BookData {
    type Error = Error;

    fn try_from(snapshot: DepthSnapshot) -> Result<Self, Self::Error> {
        let bids = parse_levels(&snapshot.bids)?;
        let asks = parse_levels(&snapshot.asks)?;
        Ok(BookData::snapshot(bids, asks, snapshot.last_update_id))
    }
}

impl TryFrom<AggTrade> for TradeData {
    type Error = Error;

    fn try_from(trade: AggTrade) -> Result<Self, Self::Error> {
        let price: f64 = trade
            .price
            .parse()
            .map_err(|_| Error::MalformedEvent(format!("bad price: {}", trade.price)))?;
        let qty: f64 = trade
            .qty
            .parse()
            .map_err(|_| Error::MalformedEvent(format!("bad qty: {}", trade.qty)))?;
        Ok(TradeData::new(price, qty, trade.is_buyer_maker, trade.trade_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_depth_update_json() {
        let raw = r#"{
            "e": "depthUpdate", "E": 123456789, "s": "BNBBTC",
            "U": 157, "u": 160,
            "b": [["0.0024", "10"]],
            "a": [["0.0026", "100"]]
        }"#;
        let update: DepthUpdate = serde_json::from_str(raw).unwrap();
        let book: BookData = update.try_into().unwrap();
        assert_eq!(book.first_update_id, 157);
        assert_eq!(book.sequence, 160);
        assert_eq!(book.bids[0].price, 0.0024);
        assert_eq!(book.asks[0].qty, 100.0);
    }

    #[test]
    fn malformed_price_surfaces_as_malformed_event() {
        let raw = r#"{
            "e": "depthUpdate", "E": 1, "s": "BNBBTC",
            "U": 1, "u": 1, "b": [["not-a-number", "1"]], "a": []
        }"#;
        let update: DepthUpdate = serde_json::from_str(raw).unwrap();
        let result: Result<BookData, Error> = update.try_into();
        assert!(matches!(result, Err(Error::MalformedEvent(_))));
    }

    #[test]
    fn parses_snapshot_json() {
        let raw = r#"{"lastUpdateId": 1027024, "bids": [["4.0", "431"]], "asks": [["4.1", "9"]]}"#;
        let snapshot: DepthSnapshot = serde_json::from_str(raw).unwrap();
        let book: BookData = snapshot.try_into().unwrap();
        assert!(book.is_snapshot);
        assert_eq!(book.first_update_id, 1_027_024);
    }

    #[test]
    fn parses_agg_trade_json() {
        let raw = r#"{
            "e": "aggTrade", "E": 123456789, "s": "BNBBTC",
            "t": 12345, "p": "0.001", "q": "100", "m": true
        }"#;
        let trade: AggTrade = serde_json::from_str(raw).unwrap();
        let parsed: TradeData = trade.try_into().unwrap();
        assert_eq!(parsed.price, 0.001);
        assert!(parsed.is_buyer_maker);
    }
}
