//! ZaloPay bridge adapter (e-wallet payments).
//!
//! The bridge wraps ZaloPay's own envelope: `POST /zalo/create-order`
//! answers `{ "data": { "return_code", "return_message", "order_url",
//! "zp_trans_token" } }` where `return_code == 1` means success, and
//! `GET /zalo/query?zpTransToken=...` reports the payment's final state with
//! the same `return_code` convention.
//!
//! Upstream order records keep `MOMO` as the payment-method name for this
//! rail; only the settlement traffic goes through ZaloPay.

use serde::Deserialize;
use tracing::instrument;

use mobistore_core::Vnd;

use crate::config::GatewayEndpoint;

use super::{PaymentError, PaymentGateway, PaymentProvider, PaymentStatus, RedirectIntent, require_positive};

/// `return_code` value ZaloPay uses for success.
const RETURN_CODE_OK: i64 = 1;

/// Adapter for the ZaloPay payment bridge.
#[derive(Clone)]
pub struct ZalopayGateway {
    client: reqwest::Client,
    base_url: String,
}

/// Outer envelope of `POST /zalo/create-order`.
#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    data: Option<CreateOrderData>,
}

#[derive(Debug, Deserialize)]
struct CreateOrderData {
    #[serde(default)]
    return_code: i64,
    return_message: Option<String>,
    order_url: Option<String>,
    zp_trans_token: Option<String>,
}

/// Response of `GET /zalo/query`.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    return_code: i64,
    return_message: Option<String>,
    zp_trans_id: Option<i64>,
    app_trans_id: Option<String>,
}

impl ZalopayGateway {
    /// Create a new ZaloPay adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(endpoint: &GatewayEndpoint) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Query the final state of a payment by its `zp_trans_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bridge is unreachable or answers garbage.
    #[instrument(skip(self, token))]
    pub async fn query(&self, token: &str) -> Result<PaymentStatus, PaymentError> {
        let response = self
            .client
            .get(format!("{}/zalo/query", self.base_url))
            .query(&[("zpTransToken", token)])
            .send()
            .await?;

        let queried: QueryResponse = response.json().await?;

        let transaction_id = queried
            .zp_trans_id
            .map(|id| id.to_string())
            .or(queried.app_trans_id);

        Ok(PaymentStatus {
            success: queried.return_code == RETURN_CODE_OK,
            message: queried.return_message,
            transaction_id,
        })
    }
}

impl PaymentGateway for ZalopayGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Zalopay
    }

    async fn create_redirect(&self, amount: Vnd) -> Result<RedirectIntent, PaymentError> {
        require_positive(amount)?;

        let response = self
            .client
            .post(format!("{}/zalo/create-order", self.base_url))
            .json(&serde_json::json!({ "amount": amount.amount() }))
            .send()
            .await?;

        let created: CreateOrderResponse = response.json().await?;

        let Some(data) = created.data else {
            return Err(PaymentError::GatewayUnavailable(
                "ZaloPay bridge returned no data".to_string(),
            ));
        };

        if data.return_code != RETURN_CODE_OK {
            return Err(PaymentError::Declined {
                message: data
                    .return_message
                    .unwrap_or_else(|| "ZaloPay refused to start the payment".to_string()),
            });
        }

        match data.order_url {
            Some(url) if !url.is_empty() => Ok(RedirectIntent {
                redirect_url: url,
                provider_ref: data.zp_trans_token,
            }),
            _ => Err(PaymentError::GatewayUnavailable(
                "ZaloPay bridge returned no order URL".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_success_shape() {
        let response: CreateOrderResponse = serde_json::from_value(serde_json::json!({
            "data": {
                "return_code": 1,
                "return_message": "Giao dịch thành công",
                "order_url": "https://qcgateway.zalopay.vn/openinapp?order=abc",
                "zp_trans_token": "ACrUy98jbRSVzeb4UhoLWA"
            }
        }))
        .expect("decode");

        let data = response.data.expect("data present");
        assert_eq!(data.return_code, 1);
        assert_eq!(
            data.zp_trans_token.as_deref(),
            Some("ACrUy98jbRSVzeb4UhoLWA")
        );
    }

    #[test]
    fn test_create_order_failure_surfaces_message() {
        let response: CreateOrderResponse = serde_json::from_value(serde_json::json!({
            "data": {
                "return_code": 2,
                "return_message": "Số tiền không hợp lệ"
            }
        }))
        .expect("decode");

        let data = response.data.expect("data present");
        assert_ne!(data.return_code, RETURN_CODE_OK);
        assert_eq!(data.return_message.as_deref(), Some("Số tiền không hợp lệ"));
        assert!(data.order_url.is_none());
    }

    #[test]
    fn test_query_response_transaction_id_fallback() {
        let queried: QueryResponse = serde_json::from_value(serde_json::json!({
            "return_code": 1,
            "app_trans_id": "240806_000123"
        }))
        .expect("decode");
        assert_eq!(queried.return_code, RETURN_CODE_OK);
        assert!(queried.zp_trans_id.is_none());
        assert_eq!(queried.app_trans_id.as_deref(), Some("240806_000123"));

        let with_zp: QueryResponse = serde_json::from_value(serde_json::json!({
            "return_code": 1,
            "zp_trans_id": 240_806_000_123_i64
        }))
        .expect("decode");
        assert_eq!(with_zp.zp_trans_id, Some(240_806_000_123));
    }
}
