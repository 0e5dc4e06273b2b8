//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding. All route handlers return `Result<T, AppError>`;
//! no remote-call failure is allowed to crash the process.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::commerce::CommerceError;
use crate::payment::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote commerce API call failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Payment provider call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Checkout attempt failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Client input failed validation; no network call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error code carried in every error response body.
impl AppError {
    fn code(&self) -> &'static str {
        match self {
            Self::Commerce(err) => match err {
                CommerceError::AuthRequired => "AUTH_REQUIRED",
                CommerceError::Timeout => "NETWORK_TIMEOUT",
                CommerceError::Http(_) => "NETWORK_ERROR",
                CommerceError::NotFound(_) => "NOT_FOUND",
                _ => "COMMERCE_REJECTED",
            },
            Self::Payment(err) => match err {
                PaymentError::Timeout => "NETWORK_TIMEOUT",
                PaymentError::GatewayUnavailable(_) => "GATEWAY_UNAVAILABLE",
                PaymentError::Declined { .. } => "PAYMENT_DECLINED",
                PaymentError::InvalidAmount(_) => "VALIDATION_ERROR",
                _ => "NETWORK_ERROR",
            },
            Self::Checkout(err) => match err {
                CheckoutError::NoItemsSelected => "NO_ITEMS_SELECTED",
                CheckoutError::NoAddressSelected => "NO_ADDRESS_SELECTED",
                CheckoutError::OrderCreation { .. } => "ORDER_CREATION_FAILED",
                CheckoutError::MissingIntent => "MISSING_INTENT",
                CheckoutError::Gateway(_) => "GATEWAY_UNAVAILABLE",
            },
            Self::Session(_) | Self::Internal(_) => "INTERNAL",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Commerce(err) => match err {
                CommerceError::AuthRequired => StatusCode::UNAUTHORIZED,
                CommerceError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                CommerceError::Http(_) | CommerceError::Api { .. } => StatusCode::BAD_GATEWAY,
                CommerceError::NotFound(_) => StatusCode::NOT_FOUND,
                CommerceError::Rejected { .. } => StatusCode::BAD_REQUEST,
                CommerceError::Parse(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Payment(err) => match err {
                PaymentError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                PaymentError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PaymentError::Declined { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Checkout(err) => match err {
                CheckoutError::NoItemsSelected | CheckoutError::NoAddressSelected => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CheckoutError::OrderCreation { .. } => StatusCode::BAD_REQUEST,
                CheckoutError::MissingIntent => StatusCode::CONFLICT,
                CheckoutError::Gateway(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Customer-visible message.
    ///
    /// Server rejections are surfaced verbatim (the backend localizes its
    /// own messages); infrastructure failures get a generic wording so no
    /// internals leak.
    fn message(&self) -> String {
        match self {
            Self::Commerce(err) => match err {
                CommerceError::AuthRequired => {
                    "Phiên đăng nhập đã hết hạn, vui lòng đăng nhập lại".to_string()
                }
                CommerceError::Timeout => {
                    "Máy chủ phản hồi quá chậm. Vui lòng thử lại sau.".to_string()
                }
                CommerceError::Http(_) | CommerceError::Api { .. } | CommerceError::Parse(_) => {
                    "Không thể kết nối máy chủ. Vui lòng thử lại sau.".to_string()
                }
                CommerceError::Rejected { message, .. } => message.clone(),
                CommerceError::NotFound(what) => format!("Không tìm thấy {what}"),
            },
            Self::Payment(err) => match err {
                PaymentError::Declined { message } => message.clone(),
                PaymentError::InvalidAmount(_) => "Số tiền thanh toán không hợp lệ".to_string(),
                _ => "Không thể khởi tạo thanh toán. Vui lòng thử lại sau.".to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::NoItemsSelected => {
                    "Vui lòng chọn ít nhất một sản phẩm để đặt hàng".to_string()
                }
                CheckoutError::NoAddressSelected => {
                    "Vui lòng chọn địa chỉ giao hàng".to_string()
                }
                CheckoutError::OrderCreation { message } => message.clone(),
                CheckoutError::MissingIntent => {
                    "Thanh toán thành công nhưng không thể tạo đơn hàng. Vui lòng liên hệ hỗ trợ."
                        .to_string()
                }
                CheckoutError::Gateway(gateway) => match gateway {
                    PaymentError::Declined { message } => message.clone(),
                    _ => "Không thể khởi tạo thanh toán. Vui lòng thử lại sau.".to_string(),
                },
            },
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Validation(message) => message.clone(),
            Self::NotFound(what) => format!("Không tìm thấy {what}"),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Internal(_)
                | Self::Session(_)
                | Self::Commerce(CommerceError::Http(_) | CommerceError::Parse(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            error: self.code(),
            message: self.message(),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::Validation("quantity must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: quantity must be at least 1"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Commerce(CommerceError::AuthRequired)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Commerce(CommerceError::Timeout)),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::NoAddressSelected)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::MissingIntent)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::GatewayUnavailable(
                "no url".to_string()
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_rejection_message_is_verbatim() {
        let err = AppError::Commerce(CommerceError::Rejected {
            code: Some(100_030),
            message: "Sản phẩm đã hết hàng".to_string(),
        });
        assert_eq!(err.message(), "Sản phẩm đã hết hàng");
        assert_eq!(err.code(), "COMMERCE_REJECTED");
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        assert_eq!(err.message(), "Internal server error");
    }
}
