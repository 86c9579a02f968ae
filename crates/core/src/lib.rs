//! Rallypoint Core - Shared types library.
//!
//! This crate provides common types used across all Rallypoint components:
//! - `client` - Data-access layer for the hosted Rallypoint backend
//! - `cli` - Command-line tools for exercising the client library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails,
//!   statuses, and partial-update fields

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
