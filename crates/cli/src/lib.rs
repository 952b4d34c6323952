//! Trellis CLI Library
//!
//! Exposes the `trl` commands and output formatting so integration tests
//! can drive them against a real database. The binary in `main.rs` is a
//! thin wrapper around this library.

pub mod commands;
mod id;
pub mod output;

pub use commands::*;
