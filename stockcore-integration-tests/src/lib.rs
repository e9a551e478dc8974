//! Integration tests for `StockCore`
//!
//! This crate contains integration tests that verify the interaction between
//! the core orchestrator and the adapter crates.

// This is a test-only crate
#![cfg(test)]
