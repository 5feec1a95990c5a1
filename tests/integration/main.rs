//! Integration tests against a live database or a running server.
//!
//! All tests are ignored by default. Run with: cargo test -- --ignored

mod api_tests;
mod ledger_tests;
