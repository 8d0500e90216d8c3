//! # pf-core
//!
//! Core photo handling and process supervision for photo-frame.
//!
//! This crate provides:
//! - Configuration loading from the `.photo-frame/` directory
//! - The directory-backed photo store
//! - The upload ingestion pipeline (validation and image normalization)
//! - Liveness probing and supervision of the server and slideshow roles
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and resolution
//! - [`store`]: Listing, resolving and deleting stored photos
//! - [`ingest`]: Turning uploaded bytes into normalized photos
//! - [`supervisor`]: Role liveness, start/stop/toggle and status polling

pub mod config;
pub mod ingest;
pub mod store;
pub mod supervisor;
