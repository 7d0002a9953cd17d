//! Labgate access control gateway.
//!
//! Library half of the gateway service: configuration, observability, the
//! middleware stack, and the router builder. `main.rs` wires them into a
//! process; integration tests drive [`app::build_router`] directly.
pub mod api;
pub mod app;
pub mod config;
pub mod gateway;
pub mod observability;
