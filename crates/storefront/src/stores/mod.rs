//! Device-local stores.
//!
//! Synchronous wrappers over [`Storage`](crate::storage::Storage) that
//! own one slice of persisted state each: the guest cart, the guest
//! wishlist, and the auth session.

pub mod cart;
pub mod session;
pub mod wishlist;

pub use cart::LocalCartStore;
pub use session::SessionStore;
pub use wishlist::LocalWishlistStore;
