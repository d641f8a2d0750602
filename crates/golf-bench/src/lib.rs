//! Benchmarks for the golf server.
//!
//! - `benches/dispatch.rs`: registry churn and response fan-out, in process
//! - `src/bin/e2e_games.rs`: create/start round trips against a running server
