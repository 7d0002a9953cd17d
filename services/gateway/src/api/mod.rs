//! Gateway HTTP API module.
//!
//! # Purpose
//! Error shapes, payload types, and the few handlers the gateway serves
//! itself. Business routes are mounted by callers through `app::RouteGroup`.
pub mod error;
pub(crate) mod session;
pub(crate) mod system;
pub mod types;
