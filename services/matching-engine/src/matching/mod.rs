//! Matching logic
//!
//! Price-cross predicates used by the engine's crossing loop.

pub mod crossing;
