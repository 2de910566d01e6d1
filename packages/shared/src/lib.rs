//! Shared utilities for Hiroba: logging setup and time helpers.

pub mod logger;
pub mod time;
