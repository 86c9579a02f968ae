//! Core types for Rallypoint.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod patch;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use patch::Patch;
pub use price::{CurrencyCode, Price};
pub use status::*;
