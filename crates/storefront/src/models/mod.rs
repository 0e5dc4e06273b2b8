//! Data models for the storefront.

pub mod session;

pub use session::{CustomerAuth, PendingBuyNow, PendingCartItem, SessionIntentStore};
pub use session::keys as session_keys;
