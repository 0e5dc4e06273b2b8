//! Auth route handlers.
//!
//! Authentication is delegated to the remote API: login exchanges
//! credentials for a bearer token, which then lives in the session. Actions
//! a guest attempted before logging in (add-to-cart, buy-now) are replayed
//! or resumed right after a successful login.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::ProductId;

use crate::commerce::types::{LoginRequest, Profile, RegisterRequest};
use crate::error::{AppError, Result};
use crate::middleware::{clear_customer_auth, set_customer_auth};
use crate::models::CustomerAuth;
use crate::models::session::{take_pending_buy_now, take_pending_cart_item};
use crate::state::AppState;

use super::commerce_result;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Register form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
}

/// Login response payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    pub user: Option<Profile>,
    /// Product to resume a deferred buy-now on, if one was pending.
    pub resume_product_id: Option<ProductId>,
}

/// Validate password strength: at least 8 characters with upper, lower and
/// a digit.
pub(crate) fn validate_password(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Log in against the remote API and store the bearer token in the session.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<LoginView>> {
    if form.email.trim().is_empty() {
        return Err(AppError::Validation("Vui lòng nhập email".to_string()));
    }
    if form.password.is_empty() {
        return Err(AppError::Validation("Vui lòng nhập mật khẩu".to_string()));
    }

    let request = LoginRequest {
        email: form.email.trim().to_string(),
        password: form.password,
    };
    let payload = state.commerce().login(&request).await?;

    let auth = CustomerAuth {
        token: payload.token,
        user: payload.user,
    };
    set_customer_auth(&session, &auth).await?;

    // Replay an add-to-cart the customer attempted as a guest. Losing it is
    // annoying but not fatal, so failures only log.
    if let Some(item) = take_pending_cart_item(&session).await {
        if let Err(err) = state
            .commerce()
            .add_cart_item(&auth.token, item.variant_id, item.quantity)
            .await
        {
            tracing::warn!("Failed to replay deferred add-to-cart: {err}");
        }
    }

    let resume_product_id = take_pending_buy_now(&session).await.map(|p| p.product_id);

    Ok(Json(LoginView {
        user: auth.user,
        resume_product_id,
    }))
}

/// Register a new customer account.
#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse> {
    if form.full_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Vui lòng nhập tên đầy đủ".to_string(),
        ));
    }
    if form.email.trim().is_empty() || !form.email.contains('@') {
        return Err(AppError::Validation("Email không hợp lệ".to_string()));
    }
    if !validate_password(&form.password) {
        return Err(AppError::Validation(
            "Mật khẩu phải có ít nhất 8 ký tự, bao gồm chữ hoa, chữ thường và số.".to_string(),
        ));
    }
    if let Some(confirm) = &form.confirm_password {
        if *confirm != form.password {
            return Err(AppError::Validation(
                "Mật khẩu xác nhận không khớp".to_string(),
            ));
        }
    }

    let request = RegisterRequest {
        email: form.email.trim().to_string(),
        password: form.password,
        full_name: form.full_name.trim().to_string(),
    };
    state.commerce().register(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Đăng ký thành công" })),
    ))
}

/// Clear the session's auth.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_customer_auth(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch the customer profile, refreshing the session's cached copy.
///
/// Shared by the account routes.
pub(crate) async fn refresh_profile(
    state: &AppState,
    session: &Session,
    auth: &CustomerAuth,
) -> Result<Profile> {
    let profile = commerce_result(session, state.commerce().profile(&auth.token).await).await?;

    let refreshed = CustomerAuth {
        token: auth.token.clone(),
        user: Some(profile.clone()),
    };
    if let Err(err) = set_customer_auth(session, &refreshed).await {
        tracing::warn!("Failed to refresh cached profile in session: {err}");
    }

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_accepts_mixed() {
        assert!(validate_password("Matkhau123"));
        assert!(validate_password("Abcdef1x"));
    }

    #[test]
    fn test_validate_password_rejects_weak() {
        assert!(!validate_password("short1A"));
        assert!(!validate_password("alllowercase1"));
        assert!(!validate_password("ALLUPPERCASE1"));
        assert!(!validate_password("NoDigitsHere"));
    }
}
