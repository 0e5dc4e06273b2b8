//! Session-stored records.
//!
//! The session is the storefront's durable client-side storage: it survives
//! full page navigations and the off-site payment redirect. Every record
//! lives under an explicit key with a typed accessor here; raw key strings
//! never appear in handlers.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use mobistore_core::{AddressId, ProductId, VariantId};

use crate::cart::CartMirror;
use crate::checkout::intent::{IntentStore, IntentStoreError, PendingOrderIntent};
use crate::commerce::types::Profile;

/// Session keys.
pub mod keys {
    /// Key for the customer's bearer token and cached profile.
    pub const AUTH: &str = "auth";

    /// Key for the per-session cart mirror.
    pub const CART: &str = "cart";

    /// Key for the address selected for the current checkout session.
    pub const SELECTED_ADDRESS: &str = "selected_address";

    /// Key for the pending-order intent bridging a payment redirect.
    pub const PENDING_ORDER: &str = "pending_order";

    /// Key for an add-to-cart deferred until after login.
    pub const PENDING_CART_ITEM: &str = "pending_cart_item";

    /// Key for a buy-now deferred until after login.
    pub const PENDING_BUY_NOW: &str = "pending_buy_now";
}

/// Session-stored customer identity.
///
/// The bearer token authenticates every remote call; the profile is a cached
/// copy for display and is refreshed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAuth {
    pub token: String,
    pub user: Option<Profile>,
}

/// An add-to-cart the customer attempted before logging in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCartItem {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// A buy-now the customer attempted before logging in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBuyNow {
    pub product_id: ProductId,
}

// =============================================================================
// Typed accessors
// =============================================================================

/// Get the stored cart mirror, or an empty one.
pub async fn cart_mirror(session: &Session) -> CartMirror {
    session
        .get::<CartMirror>(keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Persist the cart mirror.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_cart_mirror(
    session: &Session,
    mirror: &CartMirror,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, mirror).await
}

/// Get the address selected for this checkout session.
pub async fn selected_address(session: &Session) -> Option<AddressId> {
    session
        .get::<AddressId>(keys::SELECTED_ADDRESS)
        .await
        .ok()
        .flatten()
}

/// Select an address for this checkout session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_selected_address(
    session: &Session,
    id: AddressId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::SELECTED_ADDRESS, id).await
}

/// Get and remove the deferred add-to-cart, if one was stored before login.
pub async fn take_pending_cart_item(session: &Session) -> Option<PendingCartItem> {
    session
        .remove::<PendingCartItem>(keys::PENDING_CART_ITEM)
        .await
        .ok()
        .flatten()
}

/// Remember an add-to-cart until the customer has logged in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_pending_cart_item(
    session: &Session,
    item: PendingCartItem,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::PENDING_CART_ITEM, item).await
}

/// Get and remove the deferred buy-now, if one was stored before login.
pub async fn take_pending_buy_now(session: &Session) -> Option<PendingBuyNow> {
    session
        .remove::<PendingBuyNow>(keys::PENDING_BUY_NOW)
        .await
        .ok()
        .flatten()
}

/// Remember a buy-now until the customer has logged in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_pending_buy_now(
    session: &Session,
    item: PendingBuyNow,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::PENDING_BUY_NOW, item).await
}

// =============================================================================
// Pending-order intent store
// =============================================================================

/// [`IntentStore`] backed by the session.
///
/// Not locked across tabs: two tabs checking out concurrently overwrite each
/// other last-write-wins, which is acceptable for a single customer.
pub struct SessionIntentStore<'a> {
    session: &'a Session,
}

impl<'a> SessionIntentStore<'a> {
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }
}

impl IntentStore for SessionIntentStore<'_> {
    async fn load(&self) -> Result<Option<PendingOrderIntent>, IntentStoreError> {
        self.session
            .get::<PendingOrderIntent>(keys::PENDING_ORDER)
            .await
            .map_err(|err| IntentStoreError(err.to_string()))
    }

    async fn save(&self, intent: &PendingOrderIntent) -> Result<(), IntentStoreError> {
        self.session
            .insert(keys::PENDING_ORDER, intent)
            .await
            .map_err(|err| IntentStoreError(err.to_string()))
    }

    async fn clear(&self) -> Result<(), IntentStoreError> {
        self.session
            .remove::<PendingOrderIntent>(keys::PENDING_ORDER)
            .await
            .map(|_| ())
            .map_err(|err| IntentStoreError(err.to_string()))
    }
}
