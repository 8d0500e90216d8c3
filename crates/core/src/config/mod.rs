//! Configuration loading and management.
//!
//! This module provides functionality to load `.photo-frame/config.toml`
//! and resolve it into paths, compiled role patterns and command specs.

pub mod error;
pub mod loader;
pub mod models;
