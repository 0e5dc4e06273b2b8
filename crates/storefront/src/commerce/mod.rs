//! Remote commerce REST API client.
//!
//! # Architecture
//!
//! - The remote API is the source of truth - NO local catalog, direct calls
//! - Bearer-token auth per request; the token lives in the caller's session
//! - Every call carries a bounded timeout; a slow backend surfaces as
//!   [`CommerceError::Timeout`] instead of hanging a handler
//! - In-memory caching via `moka` for read-mostly public data (products,
//!   search pages, promotions, variants; 5 minute TTL). Authenticated data
//!   (cart, orders, addresses, profile) is never cached.
//!
//! # Example
//!
//! ```rust,ignore
//! use mobistore_storefront::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config.commerce)?;
//! let lines = client.cart(&token).await?;
//! client.set_cart_quantity(&token, variant_id, 2).await?;
//! ```

pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use mobistore_core::{AddressId, OrderId, ProductId, PromotionId, VariantId};

use crate::config::CommerceConfig;
use types::{
    Address, AddressUpsert, AuthPayload, CartItemUpsert, CartLine, ChangePassword, CreateOrderFromCart,
    CreateOrderFromProduct, CreateReview, Envelope, LoginRequest, Order, Page, Product,
    ProductSearch, Profile, Promotion, RegisterRequest, Review, ReviewPermission, Variant,
};

/// Cache TTL for public catalog reads.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when calling the remote commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP transport failed (connect, TLS, body).
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The call exceeded the configured timeout.
    #[error("request to commerce API timed out")]
    Timeout,

    /// The bearer token was missing, invalid, or expired (HTTP 401).
    #[error("authentication required")]
    AuthRequired,

    /// Non-success HTTP status without a decodable envelope.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The envelope carried no data; the server rejected the request.
    #[error("{message}")]
    Rejected { code: Option<i64>, message: String },

    /// Response body did not parse.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for CommerceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Values cached between requests.
#[derive(Clone)]
enum CacheValue {
    Product(Box<Product>),
    ProductPage(Page<Product>),
    Variants(Vec<Variant>),
    Variant(Box<Variant>),
    Promotions(Vec<Promotion>),
    Promotion(Box<Promotion>),
}

/// Client for the remote commerce REST API.
///
/// Cheaply cloneable via `Arc`; one instance is shared across all handlers.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl CommerceClient {
    /// Create a new commerce API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CommerceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Decode an envelope response, mapping status codes and rejections.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CommerceError> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CommerceError::AuthRequired);
        }

        // Read the body as text first for better error diagnostics.
        let body = response.text().await?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(err) if status.is_success() => return Err(CommerceError::Parse(err)),
            Err(_) => {
                return Err(CommerceError::Api {
                    status: status.as_u16(),
                    message: body.chars().take(200).collect(),
                });
            }
        };

        if let Some(data) = envelope.data {
            return Ok(data);
        }

        let meta = envelope.meta;
        let message = meta
            .as_ref()
            .and_then(|m| m.message.clone())
            .unwrap_or_else(|| format!("commerce API rejected the request (HTTP {status})"));
        Err(CommerceError::Rejected {
            code: meta.and_then(|m| m.code),
            message,
        })
    }

    /// Decode an envelope whose `data` may legitimately be absent
    /// (mutations that only acknowledge).
    async fn decode_ack(response: reqwest::Response) -> Result<(), CommerceError> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CommerceError::AuthRequired);
        }

        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|e| e.meta)
            .and_then(|m| m.message)
            .unwrap_or_else(|| body.chars().take(200).collect());

        Err(CommerceError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        query: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, CommerceError> {
        let mut request = self.inner.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(query) = query {
            request = request.query(query);
        }
        Self::decode(request.send().await?).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, CommerceError> {
        let response = self
            .inner
            .client
            .request(method, self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    // =========================================================================
    // Auth & profile
    // =========================================================================

    /// Log a customer in and obtain a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Rejected`] with the server's message on bad
    /// credentials, or a transport error.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthPayload, CommerceError> {
        let response = self
            .inner
            .client
            .post(self.url("auth/customer-login"))
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be created (e.g. duplicate
    /// email); the server's message is preserved.
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), CommerceError> {
        let response = self
            .inner
            .client
            .post(self.url("auth/customer-register"))
            .json(request)
            .send()
            .await?;
        Self::decode_ack(response).await
    }

    /// Fetch the customer profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &str) -> Result<Profile, CommerceError> {
        self.get("user/personal", Some(token), None::<&()>).await
    }

    /// Change the customer's display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    #[instrument(skip(self, token))]
    pub async fn rename(&self, token: &str, full_name: &str) -> Result<Profile, CommerceError> {
        self.send_json(
            reqwest::Method::POST,
            "user/personal/rename",
            token,
            &serde_json::json!({ "fullName": full_name }),
        )
        .await
    }

    /// Change the customer's password.
    ///
    /// # Errors
    ///
    /// Returns an error if the current password is wrong or the request fails.
    #[instrument(skip(self, token, request))]
    pub async fn change_password(
        &self,
        token: &str,
        request: &ChangePassword,
    ) -> Result<(), CommerceError> {
        let response = self
            .inner
            .client
            .post(self.url("user/personal/change-password"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        Self::decode_ack(response).await
    }

    // =========================================================================
    // Cart (never cached - mutable state)
    // =========================================================================

    /// Fetch the authenticated user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::AuthRequired`] without a valid token.
    #[instrument(skip(self, token))]
    pub async fn cart(&self, token: &str) -> Result<Vec<CartLine>, CommerceError> {
        self.get("user/cart", Some(token), None::<&()>).await
    }

    /// Add a variant to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the variant is unknown or the request fails.
    #[instrument(skip(self, token))]
    pub async fn add_cart_item(
        &self,
        token: &str,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<(), CommerceError> {
        let body = CartItemUpsert {
            variant_id,
            quantity,
        };
        let response = self
            .inner
            .client
            .post(self.url("user/cart"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::decode_ack(response).await
    }

    /// Push a new quantity for a variant already in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails; callers revert their local state
    /// by re-fetching [`Self::cart`].
    #[instrument(skip(self, token))]
    pub async fn set_cart_quantity(
        &self,
        token: &str,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<(), CommerceError> {
        let body = CartItemUpsert {
            variant_id,
            quantity,
        };
        let response = self
            .inner
            .client
            .put(self.url("user/cart"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::decode_ack(response).await
    }

    // =========================================================================
    // Shipping info
    // =========================================================================

    /// List the user's saved addresses, in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    #[instrument(skip(self, token))]
    pub async fn shipping_info(&self, token: &str) -> Result<Vec<Address>, CommerceError> {
        self.get("user/shipping-info", Some(token), None::<&()>)
            .await
    }

    /// Create or update an address; presence of `id` selects update.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert is rejected or the request fails.
    #[instrument(skip(self, token, upsert))]
    pub async fn upsert_shipping_info(
        &self,
        token: &str,
        upsert: &AddressUpsert,
    ) -> Result<Address, CommerceError> {
        let method = if upsert.id.is_some() {
            reqwest::Method::PUT
        } else {
            reqwest::Method::POST
        };
        self.send_json(method, "user/shipping-info", token, upsert)
            .await
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete is rejected or the request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_shipping_info(
        &self,
        token: &str,
        id: AddressId,
    ) -> Result<(), CommerceError> {
        let response = self
            .inner
            .client
            .delete(self.url(&format!("user/shipping-info/{id}")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::decode_ack(response).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// List the customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    #[instrument(skip(self, token))]
    pub async fn orders(&self, token: &str) -> Result<Vec<Order>, CommerceError> {
        self.get("order/customer", Some(token), None::<&()>).await
    }

    /// Fetch one order by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is unknown or the request fails.
    #[instrument(skip(self, token))]
    pub async fn order(&self, token: &str, id: OrderId) -> Result<Order, CommerceError> {
        self.get(&format!("order/customer/{id}"), Some(token), None::<&()>)
            .await
    }

    /// Request cancellation of an order; the backend decides eligibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the cancellation is rejected or the request fails.
    #[instrument(skip(self, token))]
    pub async fn cancel_order(&self, token: &str, id: OrderId) -> Result<(), CommerceError> {
        let response = self
            .inner
            .client
            .post(self.url(&format!("order/customer/cancel/{id}")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::decode_ack(response).await
    }

    /// Create an order from selected cart lines.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Rejected`] with the server's message when the
    /// order is refused (stock, pricing); callers surface it verbatim.
    #[instrument(skip(self, token, request))]
    pub async fn create_order_from_cart(
        &self,
        token: &str,
        request: &CreateOrderFromCart,
    ) -> Result<Order, CommerceError> {
        self.send_json(
            reqwest::Method::POST,
            "order/customer/create-from-cart",
            token,
            request,
        )
        .await
    }

    /// Create an order directly from a product variant (buy now).
    ///
    /// # Errors
    ///
    /// Returns an error if the order is refused or the request fails.
    #[instrument(skip(self, token, request))]
    pub async fn create_order_from_product(
        &self,
        token: &str,
        request: &CreateOrderFromProduct,
    ) -> Result<Order, CommerceError> {
        self.send_json(
            reqwest::Method::POST,
            "order/customer/create-from-product",
            token,
            request,
        )
        .await
    }

    // =========================================================================
    // Catalog (cached)
    // =========================================================================

    /// Search products with paging and optional keyword/category filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        search: &ProductSearch,
    ) -> Result<Page<Product>, CommerceError> {
        let cache_key = format!(
            "products:{}:{}:{}:{}",
            search.search.as_deref().unwrap_or(""),
            search.category_id.unwrap_or(0),
            search.page.unwrap_or(1),
            search.size.unwrap_or(12),
        );

        if let Some(CacheValue::ProductPage(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product search");
            return Ok(page);
        }

        let page: Page<Product> = self.get("product/search", None, Some(search)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::ProductPage(page.clone()))
            .await;

        Ok(page)
    }

    /// Fetch one product by id.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] for an unknown product.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Product, CommerceError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = match self
            .get(&format!("product/{id}"), None, None::<&()>)
            .await
        {
            Ok(product) => product,
            Err(CommerceError::Rejected { .. }) => {
                return Err(CommerceError::NotFound(format!("product {id}")));
            }
            Err(err) => return Err(err),
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List the variants of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn variants_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Variant>, CommerceError> {
        let cache_key = format!("variants:{product_id}");

        if let Some(CacheValue::Variants(variants)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for variants");
            return Ok(variants);
        }

        let variants: Vec<Variant> = self
            .get(&format!("variant/product/{product_id}"), None, None::<&()>)
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Variants(variants.clone()))
            .await;

        Ok(variants)
    }

    /// Fetch one variant with inventory detail.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn variant(&self, id: VariantId) -> Result<Variant, CommerceError> {
        let cache_key = format!("variant:{id}");

        if let Some(CacheValue::Variant(variant)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for variant");
            return Ok(*variant);
        }

        let variant: Variant = self.get(&format!("variant/{id}"), None, None::<&()>).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Variant(Box::new(variant.clone())))
            .await;

        Ok(variant)
    }

    /// List running promotions.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn promotions(&self) -> Result<Vec<Promotion>, CommerceError> {
        let cache_key = "promotions".to_string();

        if let Some(CacheValue::Promotions(promotions)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for promotions");
            return Ok(promotions);
        }

        let promotions: Vec<Promotion> = self.get("promotion", None, None::<&()>).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Promotions(promotions.clone()))
            .await;

        Ok(promotions)
    }

    /// Fetch one promotion by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn promotion(&self, id: PromotionId) -> Result<Promotion, CommerceError> {
        let cache_key = format!("promotion:{id}");

        if let Some(CacheValue::Promotion(promotion)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for promotion");
            return Ok(*promotion);
        }

        let promotion: Promotion = self
            .get(&format!("promotion/{id}"), None, None::<&()>)
            .await?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Promotion(Box::new(promotion.clone())),
            )
            .await;

        Ok(promotion)
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// List reviews for a product, optionally filtered by star rating.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn product_reviews(
        &self,
        product_id: ProductId,
        page: u32,
        rating: Option<u8>,
    ) -> Result<Page<Review>, CommerceError> {
        let mut query = vec![("page", i64::from(page)), ("size", 10)];
        if let Some(rating) = rating {
            query.push(("rating", i64::from(rating)));
        }
        self.get(&format!("product/{product_id}/review"), None, Some(&query))
            .await
    }

    /// Submit a review against a granted review permission.
    ///
    /// # Errors
    ///
    /// Returns an error if the permission is invalid or the request fails.
    #[instrument(skip(self, token, review))]
    pub async fn create_review(
        &self,
        token: &str,
        review: &CreateReview,
    ) -> Result<(), CommerceError> {
        let response = self
            .inner
            .client
            .post(self.url("product/review"))
            .bearer_auth(token)
            .json(review)
            .send()
            .await?;
        Self::decode_ack(response).await
    }

    /// List products the customer may still review.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    #[instrument(skip(self, token))]
    pub async fn review_permissions(
        &self,
        token: &str,
    ) -> Result<Vec<ReviewPermission>, CommerceError> {
        self.get("review-permission", Some(token), None::<&()>)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::NotFound("product 9".to_string());
        assert_eq!(err.to_string(), "Not found: product 9");

        let err = CommerceError::Rejected {
            code: Some(100_029),
            message: "Không tìm thấy biến thể sản phẩm".to_string(),
        };
        assert_eq!(err.to_string(), "Không tìm thấy biến thể sản phẩm");
    }

    #[test]
    fn test_envelope_rejection_maps_to_message() {
        let body = serde_json::json!({
            "data": null,
            "meta": { "code": 100029, "message": "out of stock" }
        })
        .to_string();

        let envelope: Envelope<Vec<CartLine>> =
            serde_json::from_str(&body).expect("decode envelope");
        assert!(envelope.data.is_none());
        let meta = envelope.meta.expect("meta present");
        assert_eq!(meta.code, Some(100_029));
        assert_eq!(meta.message.as_deref(), Some("out of stock"));
    }
}
