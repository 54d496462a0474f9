//! Auric Storefront library.
//!
//! Client-side commerce state for the Auric storefront: local-first
//! cart and wishlist stores reconciled against the commerce API, a
//! pricing calculator, and customer authentication.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pricing;
pub mod services;
pub mod shop;
pub mod storage;
pub mod stores;

pub use error::{Result, StorefrontError};
pub use shop::{LoginOutcome, Shopfront, ShopfrontParts};
