//! Catalog route handlers.
//!
//! The product-detail endpoint aggregates several remote reads (product,
//! variants, first review page, running promotion) into one payload so the
//! client renders in a single round trip. Secondary reads degrade to empty
//! on failure; only a missing product is fatal.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::{ProductId, PromotionId};

use crate::commerce::types::{
    CreateReview, Page, Product, ProductSearch, Promotion, Review, Variant,
};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

use super::commerce_result;

/// Home payload: featured products plus running promotions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub featured: Page<Product>,
    pub promotions: Vec<Promotion>,
}

/// Product-detail aggregation payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailView {
    pub product: Product,
    pub variants: Vec<Variant>,
    /// First variant with inventory detail, pre-fetched for initial render.
    pub selected_variant: Option<Variant>,
    pub promotion: Option<Promotion>,
    pub reviews: Page<Review>,
}

/// Search query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub category_id: Option<i64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// Review listing parameters.
#[derive(Debug, Deserialize)]
pub struct ReviewParams {
    pub page: Option<u32>,
    pub rating: Option<u8>,
}

/// Review form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewForm {
    pub review_permission_id: i64,
    pub rating: u8,
    #[serde(default)]
    pub content: String,
}

/// Home page: featured products and promotions, fetched concurrently.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeView>> {
    let featured_search = ProductSearch {
        page: Some(1),
        size: Some(10),
        ..ProductSearch::default()
    };

    let (featured, promotions) = tokio::join!(
        state.commerce().search_products(&featured_search),
        state.commerce().promotions(),
    );

    let featured = featured?;
    // A missing promotion strip should not blank the home page.
    let promotions = promotions.unwrap_or_else(|err| {
        tracing::warn!("Failed to fetch promotions for home: {err}");
        Vec::new()
    });

    Ok(Json(HomeView {
        featured,
        promotions,
    }))
}

/// Product search.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Page<Product>>> {
    let search = ProductSearch {
        search: params.q,
        category_id: params.category_id,
        page: params.page,
        size: params.size,
    };
    let page = state.commerce().search_products(&search).await?;
    Ok(Json(page))
}

/// Product detail aggregation.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetailView>> {
    let (product, variants, reviews) = tokio::join!(
        state.commerce().product(id),
        state.commerce().variants_for_product(id),
        state.commerce().product_reviews(id, 1, None),
    );

    let product = product?;

    let variants = variants.unwrap_or_else(|err| {
        tracing::warn!("Failed to fetch variants for product {id}: {err}");
        Vec::new()
    });
    let reviews = reviews.unwrap_or_else(|err| {
        tracing::warn!("Failed to fetch reviews for product {id}: {err}");
        Page::empty()
    });

    // Inventory lives on the variant detail; pre-fetch it for the variant
    // the page will select first.
    let selected_variant = match variants.first() {
        Some(first) => state.commerce().variant(first.id).await.ok(),
        None => None,
    };

    let promotion = match product.promotion_id {
        Some(promotion_id) => state.commerce().promotion(promotion_id).await.ok(),
        None => None,
    };

    Ok(Json(ProductDetailView {
        product,
        variants,
        selected_variant,
        promotion,
        reviews,
    }))
}

/// Review listing for a product.
#[instrument(skip(state))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(params): Query<ReviewParams>,
) -> Result<Json<Page<Review>>> {
    let page = state
        .commerce()
        .product_reviews(id, params.page.unwrap_or(1), params.rating)
        .await?;
    Ok(Json(page))
}

/// Submit a review against a granted permission.
#[instrument(skip(state, session, auth, form))]
pub async fn create_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(_id): Path<ProductId>,
    Json(form): Json<ReviewForm>,
) -> Result<impl IntoResponse> {
    if !(1..=5).contains(&form.rating) {
        return Err(AppError::Validation(
            "Đánh giá phải từ 1 đến 5 sao".to_string(),
        ));
    }

    let review = CreateReview {
        review_permission_id: form.review_permission_id,
        rating: form.rating,
        content: form.content,
    };
    commerce_result(
        &session,
        state.commerce().create_review(&auth.token, &review).await,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Đánh giá của bạn đã được ghi nhận" })),
    ))
}

/// Promotion listing.
#[instrument(skip(state))]
pub async fn promotions(State(state): State<AppState>) -> Result<Json<Vec<Promotion>>> {
    Ok(Json(state.commerce().promotions().await?))
}

/// Promotion detail.
#[instrument(skip(state))]
pub async fn promotion(
    State(state): State<AppState>,
    Path(id): Path<PromotionId>,
) -> Result<Json<Promotion>> {
    Ok(Json(state.commerce().promotion(id).await?))
}
