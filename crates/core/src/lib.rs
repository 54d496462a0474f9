//! Auric Core - Shared types library.
//!
//! This crate provides common types used across all Auric components:
//! - `storefront` - Cart, wishlist, pricing, and auth engine
//! - `cli` - Command-line driver for the engine
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, phone
//!   numbers, image references, and operation statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
