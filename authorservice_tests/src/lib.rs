//! System and load tests for a running authorservice instance.
//!
//! Gated behind the `system_tests` / `load_tests` features so that a plain
//! `cargo test` does not require a server on localhost.
