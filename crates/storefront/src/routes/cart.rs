//! Cart route handlers.
//!
//! The remote cart is authoritative; a session-held mirror supports local
//! edits. Quantity updates are optimistic: the mirror changes first, the new
//! quantity is pushed upstream, and a failed push reverts by re-fetching the
//! authoritative cart.

use axum::{Json, extract::State, http::StatusCode, response::{IntoResponse, Response}};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::{CartLineId, VariantId, Vnd};

use crate::cart::{CartMirror, QuantityPlan};
use crate::commerce::types::CartLine;
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::session::{cart_mirror, set_cart_mirror, set_pending_cart_item};
use crate::models::{CustomerAuth, PendingCartItem};
use crate::state::AppState;

use super::commerce_result;

/// Cart payload for the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub subtotal: Vnd,
    pub subtotal_display: String,
}

impl CartView {
    fn from_mirror(mirror: &CartMirror) -> Self {
        let subtotal = mirror.subtotal();
        Self {
            lines: mirror.lines().to_vec(),
            subtotal,
            subtotal_display: subtotal.display(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartForm {
    pub variant_id: VariantId,
    pub quantity: Option<u32>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartForm {
    pub line_id: CartLineId,
    pub quantity: i64,
}

/// Remove form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartForm {
    pub line_id: CartLineId,
}

/// Fetch the authoritative cart and refresh the session mirror.
async fn fetch_into_mirror(
    state: &AppState,
    session: &Session,
    auth: &CustomerAuth,
) -> Result<CartMirror> {
    let lines = commerce_result(session, state.commerce().cart(&auth.token).await).await?;
    let mirror = CartMirror::new(lines);
    set_cart_mirror(session, &mirror).await?;
    Ok(mirror)
}

/// Display the cart.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<CartView>> {
    let mirror = fetch_into_mirror(&state, &session, &auth).await?;
    Ok(Json(CartView::from_mirror(&mirror)))
}

/// Add an item to the remote cart.
///
/// A guest's attempt is remembered in the session and replayed after login;
/// the response then asks the client to authenticate first.
#[instrument(skip(state, session, auth))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Json(form): Json<AddToCartForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::Validation("Số lượng không hợp lệ".to_string()));
    }

    let Some(auth) = auth else {
        set_pending_cart_item(
            &session,
            PendingCartItem {
                variant_id: form.variant_id,
                quantity,
            },
        )
        .await?;
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "AUTH_REQUIRED",
                "message": "Vui lòng đăng nhập để thêm sản phẩm vào giỏ hàng",
                "deferred": true,
            })),
        )
            .into_response());
    };

    commerce_result(
        &session,
        state
            .commerce()
            .add_cart_item(&auth.token, form.variant_id, quantity)
            .await,
    )
    .await?;

    let mirror = fetch_into_mirror(&state, &session, &auth).await?;
    Ok(Json(CartView::from_mirror(&mirror)).into_response())
}

/// Update a line's quantity.
///
/// Quantities below one are rejected before any network call. Otherwise the
/// mirror is updated optimistically and the quantity pushed upstream; on
/// push failure the authoritative cart is re-fetched and the error surfaced.
#[instrument(skip(state, session, auth))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Json(form): Json<UpdateCartForm>,
) -> Result<Json<CartView>> {
    let mut mirror = cart_mirror(&session).await;
    if mirror.is_empty() {
        mirror = fetch_into_mirror(&state, &session, &auth).await?;
    }

    let plan = mirror.plan_quantity_update(form.line_id, form.quantity);
    let QuantityPlan::Push {
        variant_id,
        quantity,
    } = plan
    else {
        return Err(AppError::Validation("Số lượng không hợp lệ".to_string()));
    };

    // Optimistic local update, then push upstream.
    mirror.set_quantity(form.line_id, quantity);
    set_cart_mirror(&session, &mirror).await?;

    let pushed = state
        .commerce()
        .set_cart_quantity(&auth.token, variant_id, quantity)
        .await;

    if let Err(err) = pushed {
        tracing::warn!("Quantity push failed, reverting to authoritative cart: {err}");
        // Revert: the remote cart wins.
        let _ = fetch_into_mirror(&state, &session, &auth).await;
        return Err(super::map_commerce_err(&session, err).await);
    }

    Ok(Json(CartView::from_mirror(&mirror)))
}

/// Remove a line from the session mirror.
///
/// Local-only: the upstream API exposes no line-delete call, so the line
/// reappears on the next authoritative fetch.
#[instrument(skip(session, _auth))]
pub async fn remove(
    session: Session,
    RequireAuth(_auth): RequireAuth,
    Json(form): Json<RemoveFromCartForm>,
) -> Result<Json<CartView>> {
    let mut mirror = cart_mirror(&session).await;
    mirror.remove(form.line_id);
    set_cart_mirror(&session, &mirror).await?;
    Ok(Json(CartView::from_mirror(&mirror)))
}
