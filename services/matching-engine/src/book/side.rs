//! One side of a book: the paged level index, the level records, and the
//! current best level
//!
//! Best tracking is asymmetric: the buy side ranks levels by descending
//! price, the sell side by ascending price. Insertion only ever ratchets
//! the best level; depletion triggers the rescan in `repair_best`, the one
//! non-O(1) path in the book.

use types::order::Side;

use super::arena::OrderKey;
use super::level::{Level, LevelKey};
use super::store::PagedVec;

#[derive(Debug)]
pub(crate) struct SideLadder {
    side: Side,
    store: PagedVec<LevelKey>,
    levels: Vec<Level>,
    /// Non-empty level with the best price, if any level is non-empty.
    pub best: Option<LevelKey>,
    /// Total resting volume on this side.
    pub volume: i64,
}

impl SideLadder {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            store: PagedVec::default(),
            levels: Vec::new(),
            best: None,
            volume: 0,
        }
    }

    pub fn level(&self, key: LevelKey) -> &Level {
        &self.levels[key.index()]
    }

    pub fn level_mut(&mut self, key: LevelKey) -> &mut Level {
        &mut self.levels[key.index()]
    }

    /// Level at `index`, created empty on first touch.
    pub fn level_or_create(&mut self, index: u64, price: i64) -> LevelKey {
        if let Some(key) = self.store.get(index) {
            return key;
        }
        let key = LevelKey::new(self.levels.len());
        self.levels.push(Level::new(price));
        self.store.set(index, key);
        key
    }

    /// Ratchet the best pointer after an insertion into the level at `key`.
    pub fn promote(&mut self, key: LevelKey) {
        self.best = match self.best {
            None => Some(key),
            Some(current) => {
                let better = match self.side {
                    Side::Buy => self.level(key).price > self.level(current).price,
                    Side::Sell => self.level(key).price < self.level(current).price,
                };
                Some(if better { key } else { current })
            }
        };
    }

    /// Recompute the best pointer after the level at `index` emptied: scan
    /// away from the vacated index (downward for buys, upward for sells)
    /// for the nearest non-empty level.
    pub fn repair_best(&mut self, index: u64) {
        self.best = match self.side {
            Side::Buy => index.checked_sub(1).and_then(|from| self.scan_down(from)),
            Side::Sell => self.scan_up(index + 1),
        };
    }

    fn scan_down(&self, from: u64) -> Option<LevelKey> {
        let mut at = from;
        loop {
            let (index, key) = self.store.prev_set(at)?;
            if !self.level(key).is_empty() {
                return Some(key);
            }
            at = index.checked_sub(1)?;
        }
    }

    fn scan_up(&self, from: u64) -> Option<LevelKey> {
        let mut at = from;
        loop {
            let (index, key) = self.store.next_set(at)?;
            if !self.level(key).is_empty() {
                return Some(key);
            }
            at = index + 1;
        }
    }

    pub fn best_price(&self) -> Option<i64> {
        self.best.map(|key| self.level(key).price)
    }

    /// Front of the best level: the highest-priority order on this side.
    pub fn best_front(&self) -> Option<OrderKey> {
        self.best.and_then(|key| self.level(key).front)
    }

    /// Resting volume of the level at `index`, 0 when absent.
    pub fn volume_at(&self, index: u64) -> i64 {
        self.store.get(index).map_or(0, |key| self.level(key).volume)
    }

    #[cfg(test)]
    pub fn all_levels(&self) -> &[Level] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_or_create_reuses_levels() {
        let mut ladder = SideLadder::new(Side::Buy);
        let a = ladder.level_or_create(100, 100);
        let b = ladder.level_or_create(100, 100);
        assert_eq!(a, b);
        assert_eq!(ladder.all_levels().len(), 1);

        let c = ladder.level_or_create(101, 101);
        assert_ne!(a, c);
        assert_eq!(ladder.all_levels().len(), 2);
    }

    #[test]
    fn test_promote_ratchets_buy_side_upward() {
        let mut ladder = SideLadder::new(Side::Buy);
        let low = ladder.level_or_create(99, 99);
        let high = ladder.level_or_create(101, 101);

        ladder.promote(low);
        assert_eq!(ladder.best_price(), Some(99));
        ladder.promote(high);
        assert_eq!(ladder.best_price(), Some(101));
        // a worse level never displaces the best
        ladder.promote(low);
        assert_eq!(ladder.best_price(), Some(101));
    }

    #[test]
    fn test_promote_ratchets_sell_side_downward() {
        let mut ladder = SideLadder::new(Side::Sell);
        let high = ladder.level_or_create(105, 105);
        let low = ladder.level_or_create(102, 102);

        ladder.promote(high);
        assert_eq!(ladder.best_price(), Some(105));
        ladder.promote(low);
        assert_eq!(ladder.best_price(), Some(102));
        ladder.promote(high);
        assert_eq!(ladder.best_price(), Some(102));
    }

    #[test]
    fn test_repair_best_scans_past_empty_levels() {
        let mut ladder = SideLadder::new(Side::Buy);
        let occupied = ladder.level_or_create(98, 98);
        ladder.level_mut(occupied).size = 1;
        let hollow = ladder.level_or_create(100, 100);
        assert!(ladder.level(hollow).is_empty());
        let best = ladder.level_or_create(101, 101);
        ladder.promote(best);

        // best at 101 empties: the scan must skip the empty level at 100
        ladder.repair_best(101);
        assert_eq!(ladder.best_price(), Some(98));
    }

    #[test]
    fn test_repair_best_empty_side_clears_best() {
        let mut ladder = SideLadder::new(Side::Sell);
        let only = ladder.level_or_create(105, 105);
        ladder.promote(only);

        ladder.repair_best(105);
        assert_eq!(ladder.best, None);
        assert_eq!(ladder.best_price(), None);
    }

    #[test]
    fn test_volume_at_absent_level_is_zero() {
        let ladder = SideLadder::new(Side::Buy);
        assert_eq!(ladder.volume_at(100), 0);
    }
}
