//! Rallypoint client - data-access layer for the hosted Rallypoint backend.
//!
//! This crate is the thin layer between the Rallypoint mobile/CLI frontends
//! and the hosted backend services: a document database, an identity
//! provider, and a blob store. Every exported operation is a single round
//! trip (or a short sequence of round trips) plus client-side field
//! normalization and sorting; nothing here owns the data.
//!
//! # Components
//!
//! - [`Client`] - explicitly constructed context object holding the
//!   document-store, identity, and blob clients. Built once from [`Config`]
//!   and cloned cheaply; every backend operation hangs off it.
//! - [`cart::CartStore`] - the one purely client-side component: an
//!   in-memory cart list persisted to a local file.
//! - Domain services ([`clubs::Clubs`], [`events::Events`],
//!   [`featured::Featured`], [`shop::Shop`], [`users::Users`],
//!   [`images::Images`]) - stateless async operations over the backend.
//! - [`subscription`] - the live-query subscription that degrades to
//!   polling when the push channel fails.
//!
//! # Error handling
//!
//! Operations never panic; all failures map to [`ClientError`] with a
//! human-readable message. Read-many operations return an empty list as
//! their natural "nothing there" value, so callers can
//! `unwrap_or_default()` to render an empty state.
//!
//! # Example
//!
//! ```rust,ignore
//! use rallypoint_client::{Client, Config};
//!
//! let config = Config::from_env()?;
//! let client = Client::new(config);
//!
//! let session = client.users().sign_in(&email, &password).await?;
//! let clubs = client.clubs().list_joined(&session.uid).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod blobs;
pub mod cart;
pub mod clubs;
mod client;
mod config;
mod error;
pub mod events;
pub mod featured;
pub mod feed;
pub mod images;
pub mod models;
pub mod shop;
pub mod store;
pub mod subscription;
pub mod users;

pub use client::Client;
pub use config::{Config, ConfigError};
pub use error::{ClientError, Result};
