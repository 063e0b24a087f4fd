//! Handicraft Core - Shared catalog types.
//!
//! This crate provides the types used across all Handicraft components:
//! - `storefront` - Catalog browsing, filtering, and admin editing library
//! - `cli` - Command-line driver for the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere, including in-memory filtering of already-fetched records.
//!
//! # Modules
//!
//! - [`types`] - Product records, filter criteria, weights, prices, settings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
