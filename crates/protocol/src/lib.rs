//! # pf-protocol
//!
//! Core protocol definitions and data models for photo-frame.
//!
//! This crate defines all shared data structures used for:
//! - Configuration file parsing (`.photo-frame/config.toml`)
//! - Managed process roles and their observed state
//! - Gallery and upload payloads exchanged with the web front end
//! - Communication between the controller screen and the core
//!
//! ## Modules
//!
//! - [`config_models`]: Raw configuration file structures
//! - [`role_models`]: Managed roles, observations and action reports
//! - [`photo_models`]: Gallery entries and upload/delete payloads
//! - [`ipc`]: Operations and Events for Core-Controller communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde and ts-rs
//! - TypeScript generation: web payloads derive `TS` for the gallery front end
//! - Independent compilation: No dependencies on other photo-frame crates

pub mod config_models;
pub mod ipc;
pub mod photo_models;
pub mod role_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use photo_models::*;
pub use role_models::*;
