//! Payment provider gateway adapters.
//!
//! Two independent microservices settle off-site payments: a VNPay bridge
//! (bank transfer) and a ZaloPay bridge (e-wallet). Their response envelopes
//! differ completely - VNPay answers a flat `{ paymentUrl }`, ZaloPay nests
//! `{ data: { return_code, ... } }` - so each provider gets its own adapter
//! and the rest of the storefront only sees the normalized types here.
//!
//! Adapters are pure request/response: no retries, and no validation beyond
//! requiring a positive amount.

pub mod vnpay;
pub mod zalopay;

pub use vnpay::VnpayGateway;
pub use zalopay::ZalopayGateway;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mobistore_core::{PaymentMethod, Vnd};

/// Query parameter the return URL uses to name the provider.
pub const PROVIDER_RETURN_PARAM: &str = "paymentMethod";

/// The off-site payment providers the storefront can settle through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Vnpay,
    Zalopay,
}

impl PaymentProvider {
    /// Wire name used in transaction metadata and return URLs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vnpay => "vnpay",
            Self::Zalopay => "zalopay",
        }
    }

    /// Which provider settles a given payment method, if any.
    #[must_use]
    pub const fn for_method(method: PaymentMethod) -> Option<Self> {
        match method {
            PaymentMethod::BankTransfer => Some(Self::Vnpay),
            PaymentMethod::Momo => Some(Self::Zalopay),
            PaymentMethod::Cash => None,
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized result of a redirect-creation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectIntent {
    /// Where to send the customer's browser.
    pub redirect_url: String,
    /// Provider handle needed to query the payment later
    /// (ZaloPay's `zp_trans_token`; VNPay carries state in the callback).
    pub provider_ref: Option<String>,
}

/// Normalized result of a status verification or query call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatus {
    pub success: bool,
    pub message: Option<String>,
    pub transaction_id: Option<String>,
}

/// Errors that can occur when talking to a payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Amount must be strictly positive.
    #[error("invalid payment amount: {0}")]
    InvalidAmount(i64),

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The call exceeded the configured timeout.
    #[error("request to payment provider timed out")]
    Timeout,

    /// The provider did not return a usable redirect URL.
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The provider refused to start the payment.
    #[error("{message}")]
    Declined { message: String },

    /// Response body did not parse.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// A payment provider that can start an off-site redirect flow.
///
/// Implementations normalize their provider's envelope into
/// [`RedirectIntent`]; callers never see provider-specific shapes.
pub trait PaymentGateway {
    /// Which provider this adapter fronts.
    fn provider(&self) -> PaymentProvider;

    /// Request a redirect URL for a payment of `amount`.
    fn create_redirect(
        &self,
        amount: Vnd,
    ) -> impl Future<Output = Result<RedirectIntent, PaymentError>> + Send;
}

/// Reject non-positive amounts before any network call.
pub(crate) fn require_positive(amount: Vnd) -> Result<(), PaymentError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(PaymentError::InvalidAmount(amount.amount()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_for_method() {
        assert_eq!(
            PaymentProvider::for_method(PaymentMethod::BankTransfer),
            Some(PaymentProvider::Vnpay)
        );
        assert_eq!(
            PaymentProvider::for_method(PaymentMethod::Momo),
            Some(PaymentProvider::Zalopay)
        );
        assert_eq!(PaymentProvider::for_method(PaymentMethod::Cash), None);
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive(Vnd::new(1)).is_ok());
        assert!(matches!(
            require_positive(Vnd::ZERO),
            Err(PaymentError::InvalidAmount(0))
        ));
        assert!(require_positive(Vnd::new(-5)).is_err());
    }

    #[test]
    fn test_provider_wire_names() {
        assert_eq!(PaymentProvider::Vnpay.as_str(), "vnpay");
        assert_eq!(
            serde_json::to_string(&PaymentProvider::Zalopay).expect("serialize"),
            "\"zalopay\""
        );
    }
}
