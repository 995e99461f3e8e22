//! Order book for a single symbol
//!
//! Owns the resting orders and price levels for one instrument. Orders live
//! in an arena and are chained into per-level FIFO queues by handle; each
//! side indexes its levels through a sparse paged store keyed by
//! `price / unit`. Every mutating method keeps the book's metadata (counts,
//! per-side volumes, best levels) consistent.

mod arena;
mod level;
mod side;
mod store;

use std::collections::HashMap;

use types::errors::BookError;
use types::order::{Order, Side};

use self::arena::{OrderArena, OrderKey, OrderNode};
use self::level::LevelKey;
use self::side::SideLadder;

/// Central limit order book for one symbol.
///
/// All prices are integers and must be exact multiples of the book's price
/// unit. Handles to resting orders never leave the book; queries return
/// value snapshots.
#[derive(Debug)]
pub struct Book {
    symbol: String,
    unit: i64,
    orders: HashMap<u64, OrderKey>,
    arena: OrderArena,
    buys: SideLadder,
    sells: SideLadder,
    order_count: u64,
}

impl Book {
    /// Create an empty book. `unit` is the price granularity: every order
    /// price must be a positive multiple of it.
    ///
    /// # Panics
    /// Panics if `unit` is not positive.
    pub fn new(symbol: impl Into<String>, unit: i64) -> Self {
        assert!(unit > 0, "price unit must be positive");
        Self {
            symbol: symbol.into(),
            unit,
            orders: HashMap::new(),
            arena: OrderArena::default(),
            buys: SideLadder::new(Side::Buy),
            sells: SideLadder::new(Side::Sell),
            order_count: 0,
        }
    }

    fn grid_index(&self, price: i64) -> Result<u64, BookError> {
        if price <= 0 || price % self.unit != 0 {
            return Err(BookError::PriceNotOnGrid {
                price,
                unit: self.unit,
            });
        }
        Ok((price / self.unit) as u64)
    }

    fn ladder(&self, side: Side) -> &SideLadder {
        match side {
            Side::Buy => &self.buys,
            Side::Sell => &self.sells,
        }
    }

    /// Insert a new resting order at the tail of its price level, creating
    /// the level on first touch.
    ///
    /// Order ids are unique across both sides of the book.
    pub fn insert(
        &mut self,
        order_id: u64,
        side: Side,
        price: i64,
        volume: i64,
    ) -> Result<(), BookError> {
        debug_assert!(volume > 0, "volume must be positive");
        if self.orders.contains_key(&order_id) {
            return Err(BookError::DuplicateId { order_id });
        }
        let index = self.grid_index(price)?;

        let key = self.arena.alloc(OrderNode {
            id: order_id,
            side,
            price,
            volume,
            level: LevelKey::new(0), // overwritten by attach
            prev: None,
            next: None,
        });
        self.attach(key, index);
        self.orders.insert(order_id, key);
        self.order_count += 1;
        Ok(())
    }

    /// Remove a resting order and return its final snapshot.
    pub fn remove(&mut self, order_id: u64) -> Result<Order, BookError> {
        let key = self
            .orders
            .remove(&order_id)
            .ok_or(BookError::NotFound { order_id })?;
        self.unlink(key);
        let node = &self.arena[key];
        let snapshot = Order::new(node.id, node.side, node.price, node.volume);
        self.arena.free(key);
        self.order_count -= 1;
        Ok(snapshot)
    }

    /// Amend price and/or volume of a resting order.
    ///
    /// A price change re-queues the order at the tail of its new level, so
    /// time priority is lost. A volume-only change mutates in place and
    /// keeps the order's queue position.
    pub fn amend(
        &mut self,
        order_id: u64,
        new_price: i64,
        new_volume: i64,
    ) -> Result<(), BookError> {
        debug_assert!(new_volume > 0, "volume must be positive");
        let key = *self
            .orders
            .get(&order_id)
            .ok_or(BookError::NotFound { order_id })?;
        let new_index = self.grid_index(new_price)?;

        if self.arena[key].price != new_price {
            self.unlink(key);
            {
                let node = &mut self.arena[key];
                node.price = new_price;
                node.volume = new_volume;
            }
            self.attach(key, new_index);
        } else {
            let (side, level_key, delta) = {
                let node = &self.arena[key];
                (node.side, node.level, new_volume - node.volume)
            };
            self.arena[key].volume = new_volume;
            let ladder = match side {
                Side::Buy => &mut self.buys,
                Side::Sell => &mut self.sells,
            };
            ladder.level_mut(level_key).volume += delta;
            ladder.volume += delta;
        }
        Ok(())
    }

    /// Link the order at `key` to the tail of its price level, updating
    /// level metadata, side volume, and the best pointer.
    fn attach(&mut self, key: OrderKey, index: u64) {
        let (side, price, volume) = {
            let node = &self.arena[key];
            (node.side, node.price, node.volume)
        };
        let ladder = match side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        };
        let level_key = ladder.level_or_create(index, price);

        let tail = ladder.level(level_key).tail;
        match tail {
            None => {
                let level = ladder.level_mut(level_key);
                level.front = Some(key);
                level.tail = Some(key);
            }
            Some(tail_key) => {
                self.arena[tail_key].next = Some(key);
                self.arena[key].prev = Some(tail_key);
                ladder.level_mut(level_key).tail = Some(key);
            }
        }

        {
            let level = ladder.level_mut(level_key);
            level.size += 1;
            level.volume += volume;
        }
        self.arena[key].level = level_key;
        ladder.volume += volume;
        ladder.promote(level_key);
    }

    /// Splice the order at `key` out of its level queue, updating level
    /// metadata and side volume, and repairing the best pointer when the
    /// best level empties.
    fn unlink(&mut self, key: OrderKey) {
        let (side, price, volume, level_key, prev, next) = {
            let node = &self.arena[key];
            (node.side, node.price, node.volume, node.level, node.prev, node.next)
        };
        let ladder = match side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        };

        // splice cases: middle, sole occupant, head, tail
        match (prev, next) {
            (Some(p), Some(n)) => {
                self.arena[p].next = Some(n);
                self.arena[n].prev = Some(p);
            }
            (None, None) => {
                let level = ladder.level_mut(level_key);
                level.front = None;
                level.tail = None;
            }
            (None, Some(n)) => {
                self.arena[n].prev = None;
                ladder.level_mut(level_key).front = Some(n);
            }
            (Some(p), None) => {
                self.arena[p].next = None;
                ladder.level_mut(level_key).tail = Some(p);
            }
        }
        self.arena[key].prev = None;
        self.arena[key].next = None;

        {
            let level = ladder.level_mut(level_key);
            level.size -= 1;
            level.volume -= volume;
        }
        ladder.volume -= volume;

        // only the vacated level can have emptied; if it was the best,
        // rescan from one step past it
        if ladder.best.is_some_and(|best| ladder.level(best).is_empty()) {
            ladder.repair_best((price / self.unit) as u64);
        }
    }

    /// Order id at the front of the best opposing level: `Buy` asks "what is
    /// the best ask I could buy from", `Sell` the best bid. The inversion is
    /// part of the contract.
    pub fn best_offer_id(&self, side: Side) -> Option<u64> {
        let ladder = match side {
            Side::Buy => &self.sells,
            Side::Sell => &self.buys,
        };
        ladder.best_front().map(|key| self.arena[key].id)
    }

    /// Value snapshot of a resting order.
    pub fn order(&self, order_id: u64) -> Option<Order> {
        let key = *self.orders.get(&order_id)?;
        let node = &self.arena[key];
        Some(Order::new(node.id, node.side, node.price, node.volume))
    }

    /// Resting volume at `price` on `side`; 0 when the level is absent or
    /// the price is off the grid.
    pub fn volume_at(&self, side: Side, price: i64) -> i64 {
        if price <= 0 || price % self.unit != 0 {
            return 0;
        }
        self.ladder(side).volume_at((price / self.unit) as u64)
    }

    /// Highest resting buy price.
    pub fn highest_bid(&self) -> Option<i64> {
        self.buys.best_price()
    }

    /// Lowest resting sell price.
    pub fn lowest_ask(&self) -> Option<i64> {
        self.sells.best_price()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn unit(&self) -> i64 {
        self.unit
    }

    pub fn order_count(&self) -> u64 {
        self.order_count
    }

    /// Number of resting orders, same as `order_count`.
    pub fn len(&self) -> u64 {
        self.order_count
    }

    pub fn buy_volume(&self) -> i64 {
        self.buys.volume
    }

    pub fn sell_volume(&self) -> i64 {
        self.sells.volume
    }

    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Ids of every resting order, in no particular order.
    pub fn order_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.orders.keys().copied()
    }
}

#[cfg(test)]
impl Book {
    /// Exhaustive consistency audit used by the property tests: walks every
    /// level queue and cross-checks all metadata against it.
    pub(crate) fn audit(&self) {
        let mut seen = 0usize;
        for (side, ladder) in [(Side::Buy, &self.buys), (Side::Sell, &self.sells)] {
            let mut side_volume = 0i64;
            let mut best_expected: Option<i64> = None;

            for level in ladder.all_levels() {
                let mut walked = 0usize;
                let mut walked_volume = 0i64;
                let mut cursor = level.front;
                let mut prev_key = None;
                while let Some(key) = cursor {
                    let node = &self.arena[key];
                    assert_eq!(node.price, level.price, "order price matches its level");
                    assert_eq!(node.side, side, "order side matches its ladder");
                    assert_eq!(node.prev, prev_key, "queue back-link consistent");
                    assert_eq!(
                        self.orders.get(&node.id),
                        Some(&key),
                        "queued order is registered under its id"
                    );
                    walked += 1;
                    walked_volume += node.volume;
                    prev_key = Some(key);
                    cursor = node.next;
                }
                assert_eq!(level.tail, prev_key, "tail is the last walked order");
                assert_eq!(level.size, walked, "level size matches queue length");
                assert_eq!(level.volume, walked_volume, "level volume matches queue");

                side_volume += level.volume;
                seen += level.size;
                if !level.is_empty() {
                    best_expected = Some(match (best_expected, side) {
                        (None, _) => level.price,
                        (Some(b), Side::Buy) => b.max(level.price),
                        (Some(b), Side::Sell) => b.min(level.price),
                    });
                }
            }
            assert_eq!(ladder.volume, side_volume, "side volume conserved");
            assert_eq!(ladder.best_price(), best_expected, "best level correct");
        }
        assert_eq!(self.order_count as usize, seen, "order count conserved");
        assert_eq!(self.orders.len(), seen, "id map size matches queues");
    }
}
