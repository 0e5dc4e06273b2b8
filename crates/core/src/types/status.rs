//! Order, payment, and receive enums shared across the storefront.
//!
//! Serde names match the remote API's wire values exactly; do not rename
//! without a coordinated backend change.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order lifecycle status.
///
/// Transitions are driven entirely by the remote backend; the storefront
/// only displays them and decides which orders are still cancellable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipping,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether a customer may still request cancellation.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

/// How the customer pays.
///
/// `Momo` is the backend's historical name for the e-wallet rail; the
/// actual provider behind it is ZaloPay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Momo,
}

impl PaymentMethod {
    /// Whether this method settles through an off-site payment provider.
    #[must_use]
    pub const fn is_gateway(&self) -> bool {
        matches!(self, Self::BankTransfer | Self::Momo)
    }
}

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiveMethod {
    Delivery,
    Pickup,
}

/// Error parsing a wire value into one of the enums above.
#[derive(Debug, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    /// Which enum failed to parse.
    pub kind: &'static str,
    /// The offending wire value.
    pub value: String,
}

impl std::str::FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(Self::Cash),
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            "MOMO" => Ok(Self::Momo),
            other => Err(ParseEnumError {
                kind: "payment method",
                value: other.to_string(),
            }),
        }
    }
}

impl std::str::FromStr for ReceiveMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELIVERY" => Ok(Self::Delivery),
            "PICKUP" => Ok(Self::Pickup),
            other => Err(ParseEnumError {
                kind: "receive method",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_names() {
        let status: OrderStatus = serde_json::from_str("\"SHIPPING\"").expect("deserialize");
        assert_eq!(status, OrderStatus::Shipping);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).expect("serialize"),
            "\"CANCELLED\""
        );
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).expect("serialize"),
            "\"BANK_TRANSFER\""
        );
        let momo: PaymentMethod = serde_json::from_str("\"MOMO\"").expect("deserialize");
        assert_eq!(momo, PaymentMethod::Momo);
    }

    #[test]
    fn test_gateway_methods() {
        assert!(!PaymentMethod::Cash.is_gateway());
        assert!(PaymentMethod::BankTransfer.is_gateway());
        assert!(PaymentMethod::Momo.is_gateway());
    }

    #[test]
    fn test_cancellable() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::Shipping.is_cancellable());
        assert!(!OrderStatus::Completed.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "BANK_TRANSFER".parse::<PaymentMethod>().expect("parse"),
            PaymentMethod::BankTransfer
        );
        assert_eq!(
            "PICKUP".parse::<ReceiveMethod>().expect("parse"),
            ReceiveMethod::Pickup
        );
        assert!("GOLD".parse::<PaymentMethod>().is_err());
    }
}
