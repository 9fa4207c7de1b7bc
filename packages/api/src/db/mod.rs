//! # Database module — PostgreSQL pool and schema
//!
//! Gated behind the `server` feature so the core and its tests build without SQLx.
//! The binary calls [`connect`] once at startup, runs [`run_migrations`], and hands
//! the pool to `store::PgStore` and the session store.

#[cfg(feature = "server")]
mod pool;

#[cfg(feature = "server")]
pub use pool::{connect, run_migrations};
