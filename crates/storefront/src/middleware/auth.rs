//! Authentication middleware and extractors.
//!
//! The storefront holds no credentials of its own; a session is
//! authenticated when it carries a bearer token obtained from the remote
//! API's login endpoint. These extractors surface that token to handlers.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CustomerAuth, session_keys};

/// Extractor that requires an authenticated customer.
///
/// Rejects with 401 when the session has no bearer token; the client is
/// expected to send the customer to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(auth): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("token: {}", auth.token)
/// }
/// ```
pub struct RequireAuth(pub CustomerAuth);

/// Rejection when authentication is required but absent.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "AUTH_REQUIRED",
                "message": "Vui lòng đăng nhập để tiếp tục",
            })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or(AuthRejection)?;

        let auth: CustomerAuth = session
            .get(session_keys::AUTH)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection)?;

        Ok(Self(auth))
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike [`RequireAuth`], this does not reject unauthenticated requests.
pub struct OptionalAuth(pub Option<CustomerAuth>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CustomerAuth>(session_keys::AUTH)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(auth))
    }
}

/// Helper to store the customer's auth in the session after login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_customer_auth(
    session: &Session,
    auth: &CustomerAuth,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::AUTH, auth).await
}

/// Helper to clear the customer's auth (logout, or remote 401).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_customer_auth(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CustomerAuth>(session_keys::AUTH).await?;
    Ok(())
}
