//! Property-based test suites
//!
//! Random operation sequences with a full consistency audit after every
//! step, complementing the per-module unit tests.

mod invariant;
