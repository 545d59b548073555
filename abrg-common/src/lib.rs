//! # ABRG Common Library
//!
//! Shared code for the address-base-registry geocoder workspace:
//! - Common error type and `Result` alias
//! - Configuration loading (TOML file + environment overrides)
//! - Composite-key derivation for joining address data across levels

pub mod config;
pub mod error;
pub mod keys;

pub use error::{Error, Result};
