//! Command handlers
//!
//! Each handler returns the text to print so it can be tested without a
//! terminal.

pub mod config;
pub mod data;
pub mod tokens;
