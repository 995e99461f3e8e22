//! Matching engine core
//!
//! Routes operations to per-symbol books, drives the price-time crossing
//! loop, and maintains the global order-to-book index.

use std::collections::HashMap;

use tracing::{debug, trace};
use types::errors::EngineError;
use types::order::Side;
use types::trade::{BestBidOffer, Fill};

use crate::book::Book;
use crate::matching::crossing;

/// Owns every book, keyed by symbol, plus the order-id index used to route
/// amends and cancels.
///
/// The engine is a plain value: callers needing multi-tenancy instantiate
/// several engines. All operations are synchronous and run to completion.
#[derive(Debug, Default)]
pub struct MatchingEngine {
    books: Vec<Book>,
    symbols: HashMap<String, usize>,
    order_book_map: HashMap<u64, usize>,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine over externally constructed books, indexing every
    /// resting order.
    ///
    /// Books brought in this way may use a price unit other than 1; engine
    /// price arguments must then be exact multiples of that unit.
    pub fn with_books(books: Vec<Book>) -> Self {
        let mut engine = Self::new();
        for book in books {
            let slot = engine.books.len();
            engine.symbols.insert(book.symbol().to_string(), slot);
            for order_id in book.order_ids() {
                engine.order_book_map.insert(order_id, slot);
            }
            engine.books.push(book);
        }
        engine
    }

    /// Borrow the book for `symbol`, if one exists.
    pub fn get_book(&self, symbol: &str) -> Option<&Book> {
        self.symbols.get(symbol).map(|&slot| &self.books[slot])
    }

    /// Cross an incoming limit order against resting liquidity, then rest
    /// any residual volume.
    ///
    /// Fills are appended to `fills` in execution order, which equals
    /// descending priority on the passive side. The trade price is always
    /// the resting order's price.
    pub fn add_order(
        &mut self,
        order_id: u64,
        symbol: &str,
        side: Side,
        price: i64,
        volume: i64,
        fills: &mut Vec<Fill>,
    ) -> Result<(), EngineError> {
        if order_id == 0 {
            return Err(EngineError::InvalidArgument("order id must be non-zero"));
        }
        if self.order_book_map.contains_key(&order_id) {
            return Err(EngineError::DuplicateId { order_id });
        }
        if symbol.is_empty() {
            return Err(EngineError::InvalidArgument("symbol must be non-empty"));
        }
        if price <= 0 {
            return Err(EngineError::InvalidArgument("price must be positive"));
        }
        if volume <= 0 {
            return Err(EngineError::InvalidArgument("volume must be positive"));
        }

        let slot = match self.symbols.get(symbol) {
            Some(&slot) => slot,
            None => {
                // first order for this symbol: nothing to cross against, so
                // insert right away (auto-created books use a unit of 1);
                // the book is only registered once the insert succeeds
                let mut book = Book::new(symbol, 1);
                book.insert(order_id, side, price, volume)?;
                let slot = self.books.len();
                self.books.push(book);
                self.symbols.insert(symbol.to_string(), slot);
                self.order_book_map.insert(order_id, slot);
                debug!(symbol, "created order book");
                return Ok(());
            }
        };

        let book = &mut self.books[slot];
        let mut remaining = volume;
        while remaining > 0 {
            let Some(best) = book.best_offer_id(side).and_then(|id| book.order(id)) else {
                break; // no liquidity on the opposite side
            };
            if !crossing::incoming_can_match(side, price, best.price) {
                break;
            }

            if best.volume > remaining {
                // partial hit: the resting order absorbs the whole incoming
                // volume and stays at the front of its level
                book.amend(best.order_id, best.price, best.volume - remaining)?;
                fills.push(Fill::new(best.order_id, best.price, remaining));
                trace!(
                    order_id,
                    other = best.order_id,
                    price = best.price,
                    volume = remaining,
                    "partial fill"
                );
                remaining = 0;
            } else {
                book.remove(best.order_id)?;
                self.order_book_map.remove(&best.order_id);
                fills.push(Fill::new(best.order_id, best.price, best.volume));
                trace!(
                    order_id,
                    other = best.order_id,
                    price = best.price,
                    volume = best.volume,
                    "full fill"
                );
                remaining -= best.volume;
            }
        }

        if remaining > 0 {
            book.insert(order_id, side, price, remaining)?;
            self.order_book_map.insert(order_id, slot);
            debug!(order_id, symbol, ?side, price, volume = remaining, "order resting");
        }
        Ok(())
    }

    /// Amend an existing order.
    ///
    /// A same-price amend that does not increase volume is applied in the
    /// book and keeps queue priority. Any other amend is a cancel and
    /// resubmit: the order loses priority and may match on the way back in.
    pub fn amend_order(
        &mut self,
        order_id: u64,
        new_price: i64,
        new_volume: i64,
        fills: &mut Vec<Fill>,
    ) -> Result<(), EngineError> {
        let Some(&slot) = self.order_book_map.get(&order_id) else {
            return Err(EngineError::NotFound { order_id });
        };
        if new_price <= 0 {
            return Err(EngineError::InvalidArgument("price must be positive"));
        }
        if new_volume <= 0 {
            return Err(EngineError::InvalidArgument("volume must be positive"));
        }

        let current = self.books[slot]
            .order(order_id)
            .ok_or(EngineError::NotFound { order_id })?;

        if current.price == new_price && current.volume >= new_volume {
            self.books[slot].amend(order_id, new_price, new_volume)?;
            trace!(order_id, volume = new_volume, "passive amend");
        } else {
            let symbol = self.books[slot].symbol().to_string();
            self.pull_order(order_id)?;
            self.add_order(order_id, &symbol, current.side, new_price, new_volume, fills)?;
        }
        Ok(())
    }

    /// Cancel a resting order.
    pub fn pull_order(&mut self, order_id: u64) -> Result<(), EngineError> {
        let Some(slot) = self.order_book_map.remove(&order_id) else {
            return Err(EngineError::NotFound { order_id });
        };
        self.books[slot].remove(order_id)?;
        debug!(order_id, "order pulled");
        Ok(())
    }

    /// Best bid and offer for `symbol`; zeroed fields when a side is empty
    /// or the symbol is unknown.
    pub fn get_top_of_book(&self, symbol: &str) -> BestBidOffer {
        let Some(book) = self.get_book(symbol) else {
            return BestBidOffer::default();
        };
        let mut top = BestBidOffer::default();
        if let Some(bid) = book.highest_bid() {
            top.bid_price = bid;
            top.bid_volume = book.volume_at(Side::Buy, bid);
        }
        if let Some(ask) = book.lowest_ask() {
            top.ask_price = ask;
            top.ask_volume = book.volume_at(Side::Sell, ask);
        }
        top
    }
}

#[cfg(test)]
impl MatchingEngine {
    /// Audit every book plus the engine's order index.
    pub(crate) fn audit(&self) {
        for book in &self.books {
            book.audit();
        }
        for (&order_id, &slot) in &self.order_book_map {
            assert!(
                self.books[slot].order(order_id).is_some(),
                "indexed order {order_id} rests in its book"
            );
        }
        for (slot, book) in self.books.iter().enumerate() {
            for order_id in book.order_ids() {
                assert_eq!(
                    self.order_book_map.get(&order_id),
                    Some(&slot),
                    "resting order {order_id} is indexed to its book"
                );
            }
        }
    }
}
