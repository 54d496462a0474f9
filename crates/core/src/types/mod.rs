//! Core types for Auric.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod image;
pub mod money;
pub mod phone;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use image::ImageRef;
pub use money::{CurrencyCode, Money, MoneyError};
pub use phone::{PhoneError, PhoneNumber};
pub use status::*;
