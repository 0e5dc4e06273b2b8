//! Wire types for the remote commerce REST API.
//!
//! Every response body uses the envelope `{ "data": ..., "meta": { "code",
//! "message" } }`; paged collections nest a Spring-style page object inside
//! `data`. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use mobistore_core::{
    AddressId, CartLineId, OrderId, OrderStatus, PaymentMethod, ProductId, PromotionId,
    ReceiveMethod, ReviewId, UserId, VariantId, Vnd,
};

// =============================================================================
// Envelope
// =============================================================================

/// Standard response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// Payload; absent when the request was rejected.
    pub data: Option<T>,
    /// Status metadata; carries the server's error message on rejection.
    pub meta: Option<Meta>,
}

/// Envelope metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub code: Option<i64>,
    pub message: Option<String>,
}

/// Spring-style page wrapper used by search and review listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// An empty page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            content: Vec::new(),
            total_pages: 0,
            total_elements: 0,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The product half of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ProductId,
    pub name: String,
    /// Current selling price per unit.
    pub price: Vnd,
    /// Pre-discount price per unit.
    #[serde(default)]
    pub base_price: Vnd,
    pub image: Option<String>,
}

/// The variant half of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSummary {
    pub id: VariantId,
    pub color: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// One line of the authenticated user's remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartLineId,
    pub catalog_item: CatalogItem,
    pub variant: VariantSummary,
    pub quantity: u32,
}

impl CartLine {
    /// Line total: unit price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Vnd {
        self.catalog_item.price.times(self.quantity)
    }
}

/// Body for cart add/update calls (`POST`/`PUT user/cart`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemUpsert {
    pub variant_id: VariantId,
    pub quantity: u32,
}

// =============================================================================
// Addresses
// =============================================================================

/// A saved shipping address ("shipping info" upstream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub receive_name: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Upsert body for `user/shipping-info`; presence of `id` makes it an update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressUpsert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<AddressId>,
    pub receive_name: String,
    pub phone: String,
    pub address: String,
}

impl AddressUpsert {
    /// Whether all required fields are non-empty after trimming.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.receive_name.trim().is_empty()
            && !self.phone.trim().is_empty()
            && !self.address.trim().is_empty()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One line of a created order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Option<i64>,
    pub product_name: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub price: Vnd,
    #[serde(default)]
    pub quantity: u32,
}

/// A created order; status transitions are remote-driven.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub receive_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub payment_method: PaymentMethod,
    pub receive_method: ReceiveMethod,
    pub note: Option<String>,
    #[serde(default)]
    pub total_price: Vnd,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

/// Provider transaction metadata attached to gateway-settled orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    pub provider: String,
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    pub amount: Vnd,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_date: Option<String>,
}

/// Body for `order/customer/create-from-cart`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderFromCart {
    pub shipping_info_id: Option<AddressId>,
    pub payment_method: PaymentMethod,
    pub receive_method: ReceiveMethod,
    pub note: String,
    pub selected_product_ids: Vec<CartLineId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionInfo>,
}

/// Body for `order/customer/create-from-product` (buy now).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderFromProduct {
    pub variant_id: VariantId,
    pub quantity: u32,
    pub shipping_info_id: Option<AddressId>,
    pub payment_method: PaymentMethod,
    pub receive_method: ReceiveMethod,
    pub note: String,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product as returned by search and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub price: Vnd,
    #[serde(default)]
    pub base_price: Vnd,
    pub image: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub promotion_id: Option<PromotionId>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u64>,
}

/// Search parameters for `product/search`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

/// Per-variant inventory snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    #[serde(default)]
    pub available: Option<i64>,
    #[serde(default)]
    pub sold: Option<i64>,
}

/// A purchasable configuration of a product, with its own images and stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub color: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub price: Option<Vnd>,
    #[serde(default)]
    pub inventory: Option<Inventory>,
}

/// A running promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: PromotionId,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub value: Option<i64>,
}

// =============================================================================
// Reviews
// =============================================================================

/// A customer review of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub rating: u8,
    pub content: Option<String>,
    pub customer_name: Option<String>,
    pub created_at: Option<String>,
}

/// A granted permission to review a purchased product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPermission {
    pub id: i64,
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub image: Option<String>,
}

/// Body for `product/review`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    pub review_permission_id: i64,
    pub rating: u8,
    pub content: String,
}

// =============================================================================
// Auth & profile
// =============================================================================

/// The customer profile (`user/personal`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Option<UserId>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Body for `auth/customer-login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload of a successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,
    #[serde(default)]
    pub user: Option<Profile>,
}

/// Body for `auth/customer-register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Body for `user/personal/change-password`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_line_decodes_wire_shape() {
        let line: CartLine = serde_json::from_value(serde_json::json!({
            "id": 12,
            "catalogItem": {
                "id": 3,
                "name": "Galaxy S24",
                "price": 19_990_000,
                "basePrice": 22_990_000,
                "image": "https://cdn.example/s24.jpg"
            },
            "variant": { "id": 7, "color": "Titan Gray", "images": [] },
            "quantity": 2
        }))
        .expect("decode cart line");

        assert_eq!(line.id, CartLineId::new(12));
        assert_eq!(line.variant.id, VariantId::new(7));
        assert_eq!(line.line_total(), Vnd::new(39_980_000));
    }

    #[test]
    fn test_create_order_serializes_camel_case() {
        let body = CreateOrderFromCart {
            shipping_info_id: Some(AddressId::new(5)),
            payment_method: PaymentMethod::Cash,
            receive_method: ReceiveMethod::Delivery,
            note: String::new(),
            selected_product_ids: vec![CartLineId::new(12)],
            transaction: None,
        };

        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["shippingInfoId"], 5);
        assert_eq!(value["paymentMethod"], "CASH");
        assert_eq!(value["receiveMethod"], "DELIVERY");
        assert_eq!(value["selectedProductIds"], serde_json::json!([12]));
        assert!(value.get("transaction").is_none());
    }

    #[test]
    fn test_transaction_info_skips_absent_fields() {
        let txn = TransactionInfo {
            provider: "zalopay".to_string(),
            transaction_id: Some("240806000001".to_string()),
            bank_code: None,
            amount: Vnd::new(25_000),
            pay_date: None,
        };

        let value = serde_json::to_value(&txn).expect("serialize");
        assert_eq!(value["provider"], "zalopay");
        assert!(value.get("bankCode").is_none());
        assert!(value.get("payDate").is_none());
    }

    #[test]
    fn test_page_defaults() {
        let page: Page<Product> = serde_json::from_value(serde_json::json!({
            "content": []
        }))
        .expect("decode page");
        assert_eq!(page.total_pages, 0);
        assert!(page.content.is_empty());
    }

    #[test]
    fn test_address_upsert_completeness() {
        let complete = AddressUpsert {
            id: None,
            receive_name: "Chị Lan".to_string(),
            phone: "0901234567".to_string(),
            address: "12 Nguyễn Huệ, Q1".to_string(),
        };
        assert!(complete.is_complete());

        let missing_phone = AddressUpsert {
            phone: "   ".to_string(),
            ..complete
        };
        assert!(!missing_phone.is_complete());
    }
}
