//! Shared utilities for the Hiroba room coordination server.
//!
//! This crate holds the cross-cutting pieces both the server and its tests
//! depend on: logging setup and time utilities with an injectable clock.

pub mod logger;
pub mod time;
