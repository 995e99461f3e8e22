//! Fill records and top-of-book reports

use serde::{Deserialize, Serialize};

/// A single trade event recording that an incoming order consumed resting
/// volume.
///
/// `other_order_id` is the resting counterparty; `trade_price` is always the
/// resting order's price. The matching loop appends fills in execution
/// order, which equals descending priority on the passive side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub other_order_id: u64,
    pub trade_price: i64,
    pub trade_volume: i64,
}

impl Fill {
    pub fn new(other_order_id: u64, trade_price: i64, trade_volume: i64) -> Self {
        Self {
            other_order_id,
            trade_price,
            trade_volume,
        }
    }
}

/// Best bid and offer for one symbol.
///
/// A side with no resting volume reports `(0, 0)` for its volume and price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestBidOffer {
    pub bid_volume: i64,
    pub bid_price: i64,
    pub ask_volume: i64,
    pub ask_price: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_round_trip() {
        let fill = Fill::new(7, 101, 3);
        let json = serde_json::to_string(&fill).unwrap();
        let deserialized: Fill = serde_json::from_str(&json).unwrap();
        assert_eq!(fill, deserialized);
    }

    #[test]
    fn test_best_bid_offer_default_is_zeroed() {
        let top = BestBidOffer::default();
        assert_eq!(top.bid_volume, 0);
        assert_eq!(top.bid_price, 0);
        assert_eq!(top.ask_volume, 0);
        assert_eq!(top.ask_price, 0);
    }

    #[test]
    fn test_best_bid_offer_wire_shape() {
        let top = BestBidOffer {
            bid_volume: 7,
            bid_price: 100,
            ask_volume: 4,
            ask_price: 105,
        };
        let json = serde_json::to_string(&top).unwrap();
        assert_eq!(
            json,
            "{\"bid_volume\":7,\"bid_price\":100,\"ask_volume\":4,\"ask_price\":105}"
        );
    }
}
