//! Domain models for the storefront engine.

pub mod cart;
pub mod session;
pub mod wishlist;

pub use cart::{Cart, CartLine, LineKey};
pub use session::{AuthMethod, CustomerProfile, ProfileUpdate, Session};
pub use wishlist::{Wishlist, WishlistItem};
