//! Pending-order intents.
//!
//! A gateway checkout creates an order only after the customer returns from
//! the provider, so the order-to-be is persisted to the session as a
//! [`PendingOrderIntent`] before the browser leaves the site. The intent
//! lives from redirect-out until the payment-result reconciler either
//! consumes it (order created, intent deleted) or the customer abandons the
//! flow, in which case the next gateway checkout overwrites it.
//!
//! The `InFlight` state is written immediately before the order-creation
//! call; a repeated success callback that finds it refuses to create a
//! second order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use mobistore_core::{AddressId, CartLineId, PaymentMethod, ReceiveMethod, Vnd};

use crate::payment::PaymentProvider;

/// Where an intent is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IntentState {
    /// Waiting for the customer to come back from the provider.
    Pending,
    /// Order creation has started for this intent.
    InFlight {
        transaction_id: Option<String>,
    },
}

/// The intent is already being turned into an order.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("order creation already started for this payment")]
pub struct AlreadyInFlight;

/// A client-persisted order-to-be, bridging an off-site payment redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrderIntent {
    pub id: Uuid,
    pub shipping_info_id: Option<AddressId>,
    pub payment_method: PaymentMethod,
    pub receive_method: ReceiveMethod,
    pub note: String,
    pub selected_product_ids: Vec<CartLineId>,
    /// Amount handed to the provider; echoed into transaction metadata.
    pub amount: Vnd,
    pub provider: PaymentProvider,
    /// Provider handle for later status queries (ZaloPay's `zp_trans_token`).
    pub provider_token: Option<String>,
    #[serde(flatten)]
    pub state: IntentState,
    pub created_at: DateTime<Utc>,
}

impl PendingOrderIntent {
    /// Mark the intent in-flight before calling order creation.
    ///
    /// # Errors
    ///
    /// Returns [`AlreadyInFlight`] if order creation has already started;
    /// the caller must not issue another order call.
    pub fn begin_order_creation(
        &mut self,
        transaction_id: Option<String>,
    ) -> Result<(), AlreadyInFlight> {
        match self.state {
            IntentState::Pending => {
                self.state = IntentState::InFlight { transaction_id };
                Ok(())
            }
            IntentState::InFlight { .. } => Err(AlreadyInFlight),
        }
    }

    /// Roll the intent back to `Pending` after a definite order rejection,
    /// so the customer can retry from the result page.
    pub fn reset_to_pending(&mut self) {
        self.state = IntentState::Pending;
    }

    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self.state, IntentState::InFlight { .. })
    }
}

/// Error from a pending-intent store.
#[derive(Debug, Error)]
#[error("pending-order store error: {0}")]
pub struct IntentStoreError(pub String);

/// Durable storage for the session's single pending-order intent.
///
/// Last write wins; a stale intent from an abandoned flow is simply
/// overwritten by the next checkout.
pub trait IntentStore {
    /// Load the stored intent, if any.
    fn load(
        &self,
    ) -> impl Future<Output = Result<Option<PendingOrderIntent>, IntentStoreError>> + Send;

    /// Persist (or overwrite) the intent.
    fn save(
        &self,
        intent: &PendingOrderIntent,
    ) -> impl Future<Output = Result<(), IntentStoreError>> + Send;

    /// Delete the stored intent.
    fn clear(&self) -> impl Future<Output = Result<(), IntentStoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent() -> PendingOrderIntent {
        PendingOrderIntent {
            id: Uuid::nil(),
            shipping_info_id: Some(AddressId::new(5)),
            payment_method: PaymentMethod::BankTransfer,
            receive_method: ReceiveMethod::Delivery,
            note: String::new(),
            selected_product_ids: vec![CartLineId::new(12)],
            amount: Vnd::new(25_000),
            provider: PaymentProvider::Vnpay,
            provider_token: None,
            state: IntentState::Pending,
            created_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    #[test]
    fn test_begin_order_creation_once() {
        let mut intent = intent();
        assert!(
            intent
                .begin_order_creation(Some("14621370".to_string()))
                .is_ok()
        );
        assert!(intent.is_in_flight());

        assert_eq!(
            intent.begin_order_creation(Some("14621370".to_string())),
            Err(AlreadyInFlight)
        );
    }

    #[test]
    fn test_reset_allows_retry_after_rejection() {
        let mut intent = intent();
        intent
            .begin_order_creation(None)
            .expect("first transition succeeds");
        intent.reset_to_pending();
        assert!(!intent.is_in_flight());
        assert!(intent.begin_order_creation(None).is_ok());
    }

    #[test]
    fn test_intent_serde_roundtrip() {
        let mut original = intent();
        original
            .begin_order_creation(Some("14621370".to_string()))
            .expect("transition succeeds");

        let json = serde_json::to_value(&original).expect("serialize");
        assert_eq!(json["state"], "in_flight");
        assert_eq!(json["paymentMethod"], "BANK_TRANSFER");

        let restored: PendingOrderIntent = serde_json::from_value(json).expect("deserialize");
        assert_eq!(restored, original);
    }
}
