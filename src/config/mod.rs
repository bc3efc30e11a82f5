//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: the `Config` struct and file loading
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks collecting every problem at once

mod defaults;
mod types;
mod validation;

pub use types::Config;
