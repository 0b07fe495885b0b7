//! Typed access to the monitoring backend
//!
//! The console never talks HTTP directly: it goes through the [`ConsoleApi`] trait so that the
//! transport can be swapped (tests use an in-memory implementation).

pub mod client;
pub mod types;

pub use client::{ConsoleApi, HttpApiClient};
pub use types::*;
