//! VNPay bridge adapter (bank-transfer payments).
//!
//! The bridge exposes `GET /create_payment` returning a flat
//! `{ "paymentUrl": ... }`, and `GET /vnpay/verify-payment` which re-checks a
//! callback's parameters and answers `{ "success", "message" }`. The
//! authoritative success signal for a completed payment is the
//! `vnp_ResponseCode=00` callback parameter; the verify endpoint only
//! corroborates the message shown to the customer.

use serde::Deserialize;
use tracing::instrument;

use mobistore_core::Vnd;

use crate::config::GatewayEndpoint;

use super::{PaymentError, PaymentGateway, PaymentProvider, PaymentStatus, RedirectIntent, require_positive};

/// Adapter for the VNPay payment bridge.
#[derive(Clone)]
pub struct VnpayGateway {
    client: reqwest::Client,
    base_url: String,
    locale: String,
}

/// Response of `GET /create_payment`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentResponse {
    payment_url: Option<String>,
}

/// Response of `GET /vnpay/verify-payment`.
#[derive(Debug, Deserialize)]
struct VerifyPaymentResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
}

impl VnpayGateway {
    /// Create a new VNPay adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(endpoint: &GatewayEndpoint, locale: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            locale: locale.to_string(),
        })
    }

    /// Re-check a callback's parameters with the bridge.
    ///
    /// The result is display-only corroboration; callers must gate success on
    /// the callback's `vnp_ResponseCode` themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if the bridge is unreachable or answers garbage.
    #[instrument(skip(self, params))]
    pub async fn verify_return(
        &self,
        params: &[(String, String)],
    ) -> Result<PaymentStatus, PaymentError> {
        let response = self
            .client
            .get(format!("{}/vnpay/verify-payment", self.base_url))
            .query(params)
            .send()
            .await?;

        let verified: VerifyPaymentResponse = response.json().await?;

        let transaction_id = params
            .iter()
            .find(|(key, _)| key == "vnp_TransactionNo")
            .map(|(_, value)| value.clone());

        Ok(PaymentStatus {
            success: verified.success,
            message: verified.message,
            transaction_id,
        })
    }
}

impl PaymentGateway for VnpayGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Vnpay
    }

    /// Request a hosted-payment redirect URL.
    ///
    /// `bankCode` is sent empty so the hosted page offers every bank.
    async fn create_redirect(&self, amount: Vnd) -> Result<RedirectIntent, PaymentError> {
        require_positive(amount)?;

        let response = self
            .client
            .get(format!("{}/create_payment", self.base_url))
            .query(&[
                ("amount", amount.amount().to_string()),
                ("bankCode", String::new()),
                ("language", self.locale.clone()),
            ])
            .send()
            .await?;

        let created: CreatePaymentResponse = response.json().await?;

        match created.payment_url {
            Some(url) if !url.is_empty() => Ok(RedirectIntent {
                redirect_url: url,
                provider_ref: None,
            }),
            _ => Err(PaymentError::GatewayUnavailable(
                "VNPay bridge returned no payment URL".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_payment_response_shape() {
        let response: CreatePaymentResponse = serde_json::from_value(serde_json::json!({
            "paymentUrl": "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?vnp_Amount=2500000"
        }))
        .expect("decode");
        assert!(response.payment_url.is_some());

        let empty: CreatePaymentResponse =
            serde_json::from_value(serde_json::json!({})).expect("decode");
        assert!(empty.payment_url.is_none());
    }

    #[test]
    fn test_verify_response_defaults_to_failure() {
        let response: VerifyPaymentResponse = serde_json::from_value(serde_json::json!({
            "message": "Giao dịch không hợp lệ"
        }))
        .expect("decode");
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Giao dịch không hợp lệ"));
    }
}
