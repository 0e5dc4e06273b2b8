//! Checkout route handlers.
//!
//! `POST /checkout` validates the attempt and either creates the order
//! immediately (cash) or persists a pending-order intent and answers with a
//! provider redirect URL. Control for the redirect case resumes in the
//! payment-result route on a fresh page load.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use mobistore_core::{OrderId, PaymentMethod, ProductId, ReceiveMethod, VariantId};

use crate::checkout::intent::{IntentState, IntentStore, PendingOrderIntent};
use crate::checkout::{CheckoutError, CheckoutOutcome, CheckoutPlan, CheckoutRequest, plan_checkout};
use crate::commerce::CommerceError;
use crate::commerce::types::{CreateOrderFromCart, CreateOrderFromProduct, Order};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::session::{cart_mirror, selected_address, set_cart_mirror, set_pending_buy_now};
use crate::models::{CustomerAuth, PendingBuyNow, SessionIntentStore};
use crate::payment::{PaymentGateway, PaymentProvider, RedirectIntent};
use crate::state::AppState;

use super::commerce_result;

/// Buy-now form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyNowForm {
    pub variant_id: VariantId,
    pub quantity: Option<u32>,
    pub payment_method: PaymentMethod,
    pub receive_method: ReceiveMethod,
    #[serde(default)]
    pub note: String,
}

/// Order confirmation payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmationView {
    pub order_id: OrderId,
    pub order: Order,
}

/// Distinguish an order rejection (surfaced verbatim) from transport noise.
fn map_order_creation_err(err: CommerceError) -> AppError {
    match err {
        CommerceError::Rejected { message, .. } => {
            AppError::Checkout(CheckoutError::OrderCreation { message })
        }
        other => other.into(),
    }
}

/// Run a checkout attempt.
#[instrument(skip(state, session, auth, request))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutOutcome>> {
    // A fresh mirror keeps the subtotal and the selection honest.
    let mut mirror = cart_mirror(&session).await;
    if mirror.is_empty() {
        let lines = commerce_result(&session, state.commerce().cart(&auth.token).await).await?;
        mirror = crate::cart::CartMirror::new(lines);
        set_cart_mirror(&session, &mirror).await?;
    }

    let request = CheckoutRequest {
        selected_product_ids: mirror.known_selection(&request.selected_product_ids),
        ..request
    };
    let selection: std::collections::HashSet<_> =
        request.selected_product_ids.iter().copied().collect();
    let subtotal = mirror.selected_subtotal(&selection);

    let plan = plan_checkout(&request, selected_address(&session).await, subtotal)
        .map_err(AppError::Checkout)?;

    match plan {
        CheckoutPlan::DirectOrder {
            shipping_info_id,
            selected_product_ids,
        } => {
            let body = CreateOrderFromCart {
                shipping_info_id,
                payment_method: request.payment_method,
                receive_method: request.receive_method,
                note: request.note.clone(),
                selected_product_ids,
                transaction: None,
            };

            let order = state
                .commerce()
                .create_order_from_cart(&auth.token, &body)
                .await
                .map_err(map_order_creation_err)?;

            Ok(Json(CheckoutOutcome::OrderCreated {
                order_id: order.id.as_i64(),
                order,
            }))
        }
        CheckoutPlan::PaymentRedirect {
            provider,
            shipping_info_id,
            selected_product_ids,
            amount,
        } => {
            // Persist the intent before leaving the site; it must survive
            // the off-site redirect.
            let mut intent = PendingOrderIntent {
                id: Uuid::new_v4(),
                shipping_info_id,
                payment_method: request.payment_method,
                receive_method: request.receive_method,
                note: request.note.clone(),
                selected_product_ids,
                amount,
                provider,
                provider_token: None,
                state: IntentState::Pending,
                created_at: Utc::now(),
            };

            let store = SessionIntentStore::new(&session);
            store
                .save(&intent)
                .await
                .map_err(|err| AppError::Internal(err.to_string()))?;

            let redirect: RedirectIntent = match provider {
                PaymentProvider::Vnpay => state.vnpay().create_redirect(amount).await,
                PaymentProvider::Zalopay => state.zalopay().create_redirect(amount).await,
            }
            .map_err(|err| AppError::Checkout(CheckoutError::Gateway(err)))?;

            // The provider handle is needed to verify the payment later.
            intent.provider_token = redirect.provider_ref;
            store
                .save(&intent)
                .await
                .map_err(|err| AppError::Internal(err.to_string()))?;

            Ok(Json(CheckoutOutcome::Redirect {
                redirect_url: redirect.redirect_url,
            }))
        }
    }
}

/// Create an order directly from a product variant (buy now).
///
/// Only immediate payment methods are accepted here; gateway-settled buy-now
/// would need its own pending-intent flow, which the cart checkout covers.
#[instrument(skip(state, session, auth, form))]
pub async fn buy_now(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Path(product_id): Path<ProductId>,
    Json(form): Json<BuyNowForm>,
) -> Result<Response> {
    let Some(auth) = auth else {
        set_pending_buy_now(&session, PendingBuyNow { product_id }).await?;
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "AUTH_REQUIRED",
                "message": "Vui lòng đăng nhập để đặt hàng",
                "deferred": true,
            })),
        )
            .into_response());
    };

    let quantity = form.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::Validation("Số lượng không hợp lệ".to_string()));
    }
    if form.payment_method.is_gateway() {
        return Err(AppError::Validation(
            "Mua ngay chỉ hỗ trợ thanh toán khi nhận hàng".to_string(),
        ));
    }

    let shipping_info_id = match form.receive_method {
        ReceiveMethod::Delivery => Some(
            selected_address(&session)
                .await
                .ok_or(AppError::Checkout(CheckoutError::NoAddressSelected))?,
        ),
        ReceiveMethod::Pickup => None,
    };

    let body = CreateOrderFromProduct {
        variant_id: form.variant_id,
        quantity,
        shipping_info_id,
        payment_method: form.payment_method,
        receive_method: form.receive_method,
        note: form.note,
    };

    let order = state
        .commerce()
        .create_order_from_product(&auth.token, &body)
        .await
        .map_err(map_order_creation_err)?;

    Ok(Json(CheckoutOutcome::OrderCreated {
        order_id: order.id.as_i64(),
        order,
    })
    .into_response())
}

/// Re-fetch an order for the confirmation page.
#[instrument(skip(state, session, auth))]
pub async fn order_confirmation(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderConfirmationView>> {
    let order = fetch_order(&state, &session, &auth, order_id).await?;
    Ok(Json(OrderConfirmationView { order_id, order }))
}

/// Fetch one order with auth-expiry mapping.
async fn fetch_order(
    state: &AppState,
    session: &Session,
    auth: &CustomerAuth,
    order_id: OrderId,
) -> Result<Order> {
    commerce_result(session, state.commerce().order(&auth.token, order_id).await).await
}
