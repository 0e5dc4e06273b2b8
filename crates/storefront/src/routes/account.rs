//! Account route handlers: profile, addresses, orders, review permissions.
//!
//! Address mutations validate required fields before any network call, and
//! keep the session's checkout selection coherent: after any change, if the
//! list is non-empty and nothing valid is selected, the first address is
//! auto-selected.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::{AddressId, OrderId};

use crate::commerce::types::{
    Address, AddressUpsert, ChangePassword, Order, Profile, ReviewPermission,
};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::CustomerAuth;
use crate::models::session::{selected_address, set_selected_address};
use crate::models::session_keys;
use crate::routes::auth::{refresh_profile, validate_password};
use crate::state::AppState;

use super::commerce_result;

/// Address list payload with the session's checkout selection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressesView {
    pub addresses: Vec<Address>,
    pub selected_id: Option<AddressId>,
}

/// Address upsert form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub id: Option<AddressId>,
    pub receive_name: String,
    pub phone: String,
    pub address: String,
}

/// Rename form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameForm {
    pub full_name: String,
}

/// Change-password form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password: String,
}

/// Keep the checkout selection valid: drop a stale id, auto-select the
/// first address when nothing valid is selected.
async fn ensure_selection(
    session: &Session,
    addresses: &[Address],
) -> Result<Option<AddressId>> {
    let current = selected_address(session).await;
    let valid = current.filter(|id| addresses.iter().any(|address| address.id == *id));

    if let Some(id) = valid {
        return Ok(Some(id));
    }

    match addresses.first() {
        Some(first) => {
            set_selected_address(session, first.id).await?;
            Ok(Some(first.id))
        }
        None => {
            session
                .remove::<AddressId>(session_keys::SELECTED_ADDRESS)
                .await?;
            Ok(None)
        }
    }
}

/// Fetch the address list and reconcile the selection.
async fn addresses_view(
    state: &AppState,
    session: &Session,
    auth: &CustomerAuth,
) -> Result<AddressesView> {
    let addresses =
        commerce_result(session, state.commerce().shipping_info(&auth.token).await).await?;
    let selected_id = ensure_selection(session, &addresses).await?;
    Ok(AddressesView {
        addresses,
        selected_id,
    })
}

// =============================================================================
// Profile
// =============================================================================

/// Fetch the customer profile.
#[instrument(skip(state, session, auth))]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Profile>> {
    let profile = refresh_profile(&state, &session, &auth).await?;
    Ok(Json(profile))
}

/// Change the customer's display name.
#[instrument(skip(state, session, auth, form))]
pub async fn rename(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Json(form): Json<RenameForm>,
) -> Result<Json<Profile>> {
    if form.full_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Vui lòng nhập tên đầy đủ".to_string(),
        ));
    }

    let profile = commerce_result(
        &session,
        state
            .commerce()
            .rename(&auth.token, form.full_name.trim())
            .await,
    )
    .await?;

    Ok(Json(profile))
}

/// Change the customer's password.
#[instrument(skip(state, session, auth, form))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Json(form): Json<ChangePasswordForm>,
) -> Result<StatusCode> {
    if !validate_password(&form.new_password) {
        return Err(AppError::Validation(
            "Mật khẩu phải có ít nhất 8 ký tự, bao gồm chữ hoa, chữ thường và số.".to_string(),
        ));
    }

    let request = ChangePassword {
        old_password: form.old_password,
        new_password: form.new_password,
    };
    commerce_result(
        &session,
        state.commerce().change_password(&auth.token, &request).await,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Addresses
// =============================================================================

/// List addresses.
#[instrument(skip(state, session, auth))]
pub async fn addresses(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<AddressesView>> {
    Ok(Json(addresses_view(&state, &session, &auth).await?))
}

/// Create or update an address.
///
/// Required fields are validated here; an incomplete form makes no network
/// call. A newly created address becomes the checkout selection when
/// nothing was selected yet.
#[instrument(skip(state, session, auth, form))]
pub async fn upsert_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Json(form): Json<AddressForm>,
) -> Result<Json<AddressesView>> {
    let upsert = AddressUpsert {
        id: form.id,
        receive_name: form.receive_name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        address: form.address.trim().to_string(),
    };
    if !upsert.is_complete() {
        return Err(AppError::Validation(
            "Vui lòng điền đầy đủ thông tin địa chỉ".to_string(),
        ));
    }

    let saved = commerce_result(
        &session,
        state
            .commerce()
            .upsert_shipping_info(&auth.token, &upsert)
            .await,
    )
    .await?;

    // A first address, or an edit to an existing one, becomes the selection.
    if selected_address(&session).await.is_none() || upsert.id.is_some() {
        set_selected_address(&session, saved.id).await?;
    }

    Ok(Json(addresses_view(&state, &session, &auth).await?))
}

/// Delete an address.
#[instrument(skip(state, session, auth))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<AddressesView>> {
    commerce_result(
        &session,
        state.commerce().delete_shipping_info(&auth.token, id).await,
    )
    .await?;

    Ok(Json(addresses_view(&state, &session, &auth).await?))
}

/// Select an address for the current checkout session.
#[instrument(skip(state, session, auth))]
pub async fn select_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<AddressesView>> {
    let addresses =
        commerce_result(&session, state.commerce().shipping_info(&auth.token).await).await?;

    if !addresses.iter().any(|address| address.id == id) {
        return Err(AppError::NotFound(format!("địa chỉ {id}")));
    }
    set_selected_address(&session, id).await?;

    Ok(Json(AddressesView {
        addresses,
        selected_id: Some(id),
    }))
}

// =============================================================================
// Orders
// =============================================================================

/// Order history.
#[instrument(skip(state, session, auth))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = commerce_result(&session, state.commerce().orders(&auth.token).await).await?;
    Ok(Json(orders))
}

/// Order detail.
#[instrument(skip(state, session, auth))]
pub async fn order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = commerce_result(&session, state.commerce().order(&auth.token, id).await).await?;
    Ok(Json(order))
}

/// Request cancellation of an order; eligibility is the backend's call.
#[instrument(skip(state, session, auth))]
pub async fn cancel_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    commerce_result(
        &session,
        state.commerce().cancel_order(&auth.token, id).await,
    )
    .await?;

    // Return the refreshed order so the client sees the new status.
    let order = commerce_result(&session, state.commerce().order(&auth.token, id).await).await?;
    Ok(Json(order))
}

// =============================================================================
// Review permissions
// =============================================================================

/// Products the customer may still review.
#[instrument(skip(state, session, auth))]
pub async fn review_permissions(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<ReviewPermission>>> {
    let permissions =
        commerce_result(&session, state.commerce().review_permissions(&auth.token).await).await?;
    Ok(Json(permissions))
}
