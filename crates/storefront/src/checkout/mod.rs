//! Checkout orchestration.
//!
//! A checkout attempt moves through
//! `Idle → Validating → (DirectOrder | AwaitingPaymentRedirect) → Done | Failed`.
//! Validation and branching are pure ([`plan_checkout`]); the route handler
//! performs the IO the plan calls for. Cash orders are created immediately;
//! gateway methods persist a [`intent::PendingOrderIntent`] and hand the
//! browser to the provider, with control resuming in the payment-result
//! reconciler on a fresh page load.

pub mod intent;
pub mod reconcile;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mobistore_core::{AddressId, CartLineId, PaymentMethod, ReceiveMethod, Vnd};

use crate::commerce::types::Order;
use crate::payment::{PaymentError, PaymentProvider};

/// A checkout attempt as submitted by the customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    pub receive_method: ReceiveMethod,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub selected_product_ids: Vec<CartLineId>,
}

/// Why a checkout attempt failed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing was selected for checkout.
    #[error("no items selected for checkout")]
    NoItemsSelected,

    /// Delivery was requested but no shipping address is selected.
    #[error("no shipping address selected")]
    NoAddressSelected,

    /// The payment provider could not start the payment.
    #[error(transparent)]
    Gateway(#[from] PaymentError),

    /// The order endpoint rejected the request; the message is the server's
    /// own when it sent one.
    #[error("{message}")]
    OrderCreation { message: String },

    /// Payment succeeded but no pending-order record exists locally.
    #[error("payment succeeded but no pending order was found; please contact support")]
    MissingIntent,
}

/// The validated next step of a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutPlan {
    /// Create the order synchronously (cash on delivery/pickup).
    DirectOrder {
        shipping_info_id: Option<AddressId>,
        selected_product_ids: Vec<CartLineId>,
    },
    /// Persist an intent and send the browser to a payment provider.
    PaymentRedirect {
        provider: PaymentProvider,
        shipping_info_id: Option<AddressId>,
        selected_product_ids: Vec<CartLineId>,
        amount: Vnd,
    },
}

/// What the customer's browser should do after a successful checkout call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CheckoutOutcome {
    /// Order exists; navigate to the confirmation page.
    #[serde(rename_all = "camelCase")]
    OrderCreated { order_id: i64, order: Order },
    /// Leave the site for the provider's hosted payment page.
    #[serde(rename_all = "camelCase")]
    Redirect { redirect_url: String },
}

/// Validate a checkout attempt and decide its branch.
///
/// Pure: no IO happens here, so a failed validation provably makes no
/// order or gateway call.
///
/// # Errors
///
/// [`CheckoutError::NoItemsSelected`] without selected lines;
/// [`CheckoutError::NoAddressSelected`] for delivery without an address.
pub fn plan_checkout(
    request: &CheckoutRequest,
    selected_address: Option<AddressId>,
    selected_subtotal: Vnd,
) -> Result<CheckoutPlan, CheckoutError> {
    if request.selected_product_ids.is_empty() {
        return Err(CheckoutError::NoItemsSelected);
    }

    let shipping_info_id = match request.receive_method {
        ReceiveMethod::Delivery => Some(selected_address.ok_or(CheckoutError::NoAddressSelected)?),
        ReceiveMethod::Pickup => None,
    };

    match PaymentProvider::for_method(request.payment_method) {
        None => Ok(CheckoutPlan::DirectOrder {
            shipping_info_id,
            selected_product_ids: request.selected_product_ids.clone(),
        }),
        Some(provider) => Ok(CheckoutPlan::PaymentRedirect {
            provider,
            shipping_info_id,
            selected_product_ids: request.selected_product_ids.clone(),
            amount: selected_subtotal,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: PaymentMethod, receive: ReceiveMethod) -> CheckoutRequest {
        CheckoutRequest {
            payment_method: method,
            receive_method: receive,
            note: "Giao giờ hành chính".to_string(),
            selected_product_ids: vec![CartLineId::new(12)],
        }
    }

    #[test]
    fn test_empty_selection_fails() {
        let mut req = request(PaymentMethod::Cash, ReceiveMethod::Pickup);
        req.selected_product_ids.clear();

        let err = plan_checkout(&req, None, Vnd::ZERO).expect_err("must fail");
        assert!(matches!(err, CheckoutError::NoItemsSelected));
    }

    #[test]
    fn test_delivery_without_address_fails() {
        let req = request(PaymentMethod::Cash, ReceiveMethod::Delivery);

        let err = plan_checkout(&req, None, Vnd::new(20_000)).expect_err("must fail");
        assert!(matches!(err, CheckoutError::NoAddressSelected));
    }

    #[test]
    fn test_pickup_needs_no_address() {
        let req = request(PaymentMethod::Cash, ReceiveMethod::Pickup);

        let plan = plan_checkout(&req, None, Vnd::new(20_000)).expect("plan");
        assert_eq!(
            plan,
            CheckoutPlan::DirectOrder {
                shipping_info_id: None,
                selected_product_ids: vec![CartLineId::new(12)],
            }
        );
    }

    #[test]
    fn test_cash_delivery_carries_address() {
        let req = request(PaymentMethod::Cash, ReceiveMethod::Delivery);

        let plan = plan_checkout(&req, Some(AddressId::new(5)), Vnd::new(20_000)).expect("plan");
        assert!(matches!(
            plan,
            CheckoutPlan::DirectOrder {
                shipping_info_id: Some(id),
                ..
            } if id == AddressId::new(5)
        ));
    }

    #[test]
    fn test_bank_transfer_plans_vnpay_redirect() {
        let req = request(PaymentMethod::BankTransfer, ReceiveMethod::Delivery);

        let plan = plan_checkout(&req, Some(AddressId::new(5)), Vnd::new(20_000)).expect("plan");
        assert_eq!(
            plan,
            CheckoutPlan::PaymentRedirect {
                provider: PaymentProvider::Vnpay,
                shipping_info_id: Some(AddressId::new(5)),
                selected_product_ids: vec![CartLineId::new(12)],
                amount: Vnd::new(20_000),
            }
        );
    }

    #[test]
    fn test_outcome_payload_carries_order_id() {
        use crate::commerce::types::Order;
        use mobistore_core::{OrderId, OrderStatus};

        let outcome = CheckoutOutcome::OrderCreated {
            order_id: 901,
            order: Order {
                id: OrderId::new(901),
                status: OrderStatus::Pending,
                receive_name: None,
                phone: None,
                address: None,
                payment_method: PaymentMethod::Cash,
                receive_method: ReceiveMethod::Pickup,
                note: None,
                total_price: Vnd::new(20_000),
                order_items: Vec::new(),
            },
        };

        let value = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(value["kind"], "orderCreated");
        assert_eq!(value["orderId"], 901);
        assert_eq!(value["order"]["id"], 901);

        let redirect = CheckoutOutcome::Redirect {
            redirect_url: "https://pay.example/checkout".to_string(),
        };
        let value = serde_json::to_value(&redirect).expect("serialize");
        assert_eq!(value["kind"], "redirect");
        assert_eq!(value["redirectUrl"], "https://pay.example/checkout");
    }

    #[test]
    fn test_ewallet_plans_zalopay_redirect() {
        let req = request(PaymentMethod::Momo, ReceiveMethod::Pickup);

        let plan = plan_checkout(&req, None, Vnd::new(5_000)).expect("plan");
        assert!(matches!(
            plan,
            CheckoutPlan::PaymentRedirect {
                provider: PaymentProvider::Zalopay,
                shipping_info_id: None,
                ..
            }
        ));
    }
}
