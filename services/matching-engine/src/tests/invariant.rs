//! Invariant fuzzing using `proptest`
//!
//! Drives the engine and the book with random operation streams and audits
//! every invariant (count and volume conservation, queue linkage,
//! best-price correctness, order-index consistency) after each operation.

use proptest::prelude::*;
use types::order::Side;
use types::trade::Fill;

use crate::book::Book;
use crate::engine::MatchingEngine;

#[derive(Debug, Clone)]
enum Op {
    Add {
        id: u64,
        symbol: &'static str,
        side: Side,
        price: i64,
        volume: i64,
    },
    Amend {
        id: u64,
        price: i64,
        volume: i64,
    },
    Pull {
        id: u64,
    },
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop::bool::ANY.prop_map(|buy| if buy { Side::Buy } else { Side::Sell })
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (
            1u64..40,
            prop::sample::select(vec!["AAA", "BBB"]),
            side_strategy(),
            1i64..30,
            1i64..20,
        )
            .prop_map(|(id, symbol, side, price, volume)| Op::Add {
                id,
                symbol,
                side,
                price,
                volume,
            }),
        1 => (1u64..40, 1i64..30, 1i64..20)
            .prop_map(|(id, price, volume)| Op::Amend { id, price, volume }),
        1 => (1u64..40).prop_map(|id| Op::Pull { id }),
    ]
}

fn apply(engine: &mut MatchingEngine, fills: &mut Vec<Fill>, op: &Op) {
    match *op {
        Op::Add {
            id,
            symbol,
            side,
            price,
            volume,
        } => {
            let _ = engine.add_order(id, symbol, side, price, volume, fills);
        }
        Op::Amend { id, price, volume } => {
            let _ = engine.amend_order(id, price, volume, fills);
        }
        Op::Pull { id } => {
            let _ = engine.pull_order(id);
        }
    }
}

proptest! {
    #[test]
    fn invariants_hold_across_random_operations(
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut engine = MatchingEngine::new();
        let mut fills = Vec::new();
        for op in &ops {
            apply(&mut engine, &mut fills, op);
            engine.audit();
        }
        for fill in &fills {
            prop_assert!(fill.trade_volume > 0);
            prop_assert!(fill.trade_price > 0);
            prop_assert!(fill.other_order_id != 0);
        }
    }

    #[test]
    fn matching_is_deterministic(
        ops in prop::collection::vec(op_strategy(), 1..100),
    ) {
        let run = |ops: &[Op]| {
            let mut engine = MatchingEngine::new();
            let mut fills = Vec::new();
            for op in ops {
                apply(&mut engine, &mut fills, op);
            }
            fills
        };
        prop_assert_eq!(run(&ops), run(&ops));
    }

    #[test]
    fn book_invariants_hold_on_a_coarse_grid(
        ops in prop::collection::vec(
            (0u8..3, 1u64..20, side_strategy(), 1i64..15, 1i64..10),
            1..150,
        ),
    ) {
        // direct book use with a unit other than 1
        let mut book = Book::new("COARSE", 5);
        for (kind, id, side, tick, volume) in ops {
            let price = tick * 5;
            match kind {
                0 => {
                    let _ = book.insert(id, side, price, volume);
                }
                1 => {
                    let _ = book.amend(id, price, volume);
                }
                _ => {
                    let _ = book.remove(id);
                }
            }
            book.audit();
        }
    }
}
