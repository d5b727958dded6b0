//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! All command output goes through this module so the quiet and debug
//! flags are honored consistently.

pub mod output;
