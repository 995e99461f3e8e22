//! Crossing detection logic
//!
//! Determines when an incoming order can trade against resting liquidity
//! based on price compatibility.

use types::order::Side;

/// Check if a bid and ask can match at given prices
///
/// For a buy order to match with a sell order the buy price must be at
/// least the sell price.
pub fn can_match(bid_price: i64, ask_price: i64) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming order crosses a resting order on the opposite side
pub fn incoming_can_match(incoming_side: Side, incoming_price: i64, resting_price: i64) -> bool {
    match incoming_side {
        Side::Buy => incoming_price >= resting_price,
        Side::Sell => incoming_price <= resting_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_match_crossing() {
        assert!(can_match(50_000, 49_000), "bid above ask should match");
    }

    #[test]
    fn test_can_match_exact() {
        assert!(can_match(50_000, 50_000), "equal prices should match");
    }

    #[test]
    fn test_can_match_no_cross() {
        assert!(!can_match(49_000, 50_000), "bid below ask should not match");
    }

    #[test]
    fn test_incoming_buy_can_match() {
        assert!(incoming_can_match(Side::Buy, 50_000, 49_000));
        assert!(incoming_can_match(Side::Buy, 50_000, 50_000));
        assert!(!incoming_can_match(Side::Buy, 48_000, 49_000));
    }

    #[test]
    fn test_incoming_sell_can_match() {
        assert!(incoming_can_match(Side::Sell, 49_000, 50_000));
        assert!(incoming_can_match(Side::Sell, 50_000, 50_000));
        assert!(!incoming_can_match(Side::Sell, 51_000, 50_000));
    }
}
