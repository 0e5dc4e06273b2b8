//! Payment-result route handler.
//!
//! The page the payment provider redirects back to. Runs one reconciliation
//! pass per load: verify the payment with the provider, and on success turn
//! the stored pending-order intent into an order exactly once.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::OrderId;

use crate::checkout::reconcile::{
    CustomerOrders, Gateways, ProviderReturn, ReconcileOutcome, reconcile,
};
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::SessionIntentStore;
use crate::state::AppState;

/// What the result page renders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResultView {
    pub success: bool,
    pub order_created: bool,
    pub message: String,
    pub order_id: Option<OrderId>,
    pub transaction_id: Option<String>,
    /// Where to send the customer next.
    pub back_to: &'static str,
}

impl PaymentResultView {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            order_created: false,
            message,
            order_id: None,
            transaction_id: None,
            back_to: "/cart",
        }
    }
}

/// Reconcile a provider callback.
#[instrument(skip(state, session, auth, params))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<PaymentResultView>> {
    let callback = ProviderReturn::from_query(params);

    // Order creation needs the session's bearer token; without it the
    // payment may have settled but no order can be made.
    let Some(auth) = auth else {
        return Ok(Json(PaymentResultView::failure(
            "Không tìm thấy thông tin đơn hàng hoặc phiên đăng nhập. Vui lòng liên hệ hỗ trợ."
                .to_string(),
        )));
    };

    let verifier = Gateways {
        vnpay: state.vnpay(),
        zalopay: state.zalopay(),
    };
    let store = SessionIntentStore::new(&session);
    let orders = CustomerOrders {
        client: state.commerce(),
        token: &auth.token,
    };

    let outcome = reconcile(&callback, &verifier, &store, &orders)
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?;

    let view = match outcome {
        ReconcileOutcome::OrderCreated {
            order,
            transaction_id,
            message,
        } => PaymentResultView {
            success: true,
            order_created: true,
            message: message.unwrap_or_else(|| "Thanh toán thành công".to_string()),
            order_id: Some(order.id),
            transaction_id,
            back_to: "/",
        },
        ReconcileOutcome::AlreadyProcessed => PaymentResultView {
            success: true,
            order_created: false,
            message: "Thanh toán đã được xử lý. Nếu chưa thấy đơn hàng, vui lòng liên hệ hỗ trợ."
                .to_string(),
            order_id: None,
            transaction_id: None,
            back_to: "/",
        },
        ReconcileOutcome::PaymentFailed { message } => PaymentResultView::failure(message),
        ReconcileOutcome::MissingIntent => PaymentResultView::failure(
            "Thanh toán thành công nhưng không thể tạo đơn hàng. Vui lòng liên hệ hỗ trợ."
                .to_string(),
        ),
        ReconcileOutcome::OrderCreationFailed { message } => PaymentResultView::failure(format!(
            "Thanh toán thành công nhưng không thể tạo đơn hàng: {message}"
        )),
    };

    Ok(Json(view))
}
