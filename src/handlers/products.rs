//! Catalog browsing, search and management handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use crate::cache::DASHBOARD_REPORT;
use crate::error::ApiError;
use crate::models::{average_rating, Category, Product, ProductSummary, Review, ReviewView};
use crate::pagination::{PageParams, Paginated};
use crate::state::AppState;

/// Whitelisted ORDER BY clauses; anything else falls back to newest-first.
fn order_clause(ordering: Option<&str>) -> &'static str {
    match ordering.unwrap_or("-created_at") {
        "name" => "name ASC",
        "-name" => "name DESC",
        "price" => "price ASC",
        "-price" => "price DESC",
        "created_at" => "created_at ASC",
        _ => "created_at DESC",
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub category: Option<Category>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

const LIST_FILTER: &str = "($1::product_category IS NULL OR category = $1) \
     AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' OR description ILIKE '%' || $2 || '%')";

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Paginated<ProductSummary>>, ApiError> {
    let page = PageParams { page: params.page, limit: params.limit };
    let search = params.search.as_deref().filter(|s| !s.is_empty());

    let sql = format!(
        "SELECT * FROM products WHERE {LIST_FILTER} ORDER BY {} LIMIT $3 OFFSET $4",
        order_clause(params.ordering.as_deref())
    );
    let products = sqlx::query_as::<_, Product>(&sql)
        .bind(params.category)
        .bind(search)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&state.db)
        .await?;
    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {LIST_FILTER}"))
        .bind(params.category)
        .bind(search)
        .fetch_one(&state.db)
        .await?;

    let summaries = products.into_iter().map(ProductSummary::from).collect();
    Ok(Json(Paginated::new(summaries, total.0, &page)))
}

#[derive(Debug, Deserialize)]
pub struct ProductSearchParams {
    pub q: Option<String>,
    pub category: Option<Category>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

const SEARCH_FILTER: &str = "($1::text IS NULL \
     OR name ILIKE '%' || $1 || '%' \
     OR description ILIKE '%' || $1 || '%' \
     OR category::text ILIKE '%' || $1 || '%' \
     OR specifications::text ILIKE '%' || $1 || '%') \
     AND ($2::product_category IS NULL OR category = $2) \
     AND ($3::numeric IS NULL OR price >= $3) \
     AND ($4::numeric IS NULL OR price <= $4)";

pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<ProductSearchParams>,
) -> Result<Json<Paginated<ProductSummary>>, ApiError> {
    let page = PageParams { page: params.page, limit: params.limit };
    let q = params.q.as_deref().filter(|s| !s.is_empty());

    let sql = format!(
        "SELECT * FROM products WHERE {SEARCH_FILTER} ORDER BY created_at DESC LIMIT $5 OFFSET $6"
    );
    let products = sqlx::query_as::<_, Product>(&sql)
        .bind(q)
        .bind(params.category)
        .bind(params.min_price)
        .bind(params.max_price)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&state.db)
        .await?;
    let total: (i64,) =
        sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {SEARCH_FILTER}"))
            .bind(q)
            .bind(params.category)
            .bind(params.min_price)
            .bind(params.max_price)
            .fetch_one(&state.db)
            .await?;

    let summaries = products.into_iter().map(ProductSummary::from).collect();
    Ok(Json(Paginated::new(summaries, total.0, &page)))
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<Category>,
    pub specifications: Value,
    pub images: Vec<String>,
    pub stock_count: i32,
    pub rating: f64,
    pub reviews: Vec<ReviewView>,
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductDetail>, ApiError> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound { resource: "Product" })?;

    let reviews = sqlx::query_as::<_, ReviewView>(
        "SELECT u.username AS \"user\", r.rating, r.comment, r.created_at AS date \
         FROM reviews r LEFT JOIN users u ON u.id = r.user_id \
         WHERE r.product_id = $1 ORDER BY r.created_at DESC",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    let ratings: Vec<i16> = reviews.iter().map(|r| r.rating).collect();
    Ok(Json(ProductDetail {
        id: product.id,
        name: product.name,
        description: product.description,
        price: product.price,
        category: product.category,
        specifications: product.specifications,
        images: product.images,
        stock_count: product.stock_count,
        rating: average_rating(&ratings),
        reviews,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<Category>,
    #[validate(url)]
    pub thumbnail: Option<String>,
    #[validate(range(min = 0))]
    pub stock_count: Option<i32>,
    pub specifications: Option<Map<String, Value>>,
    pub images: Option<Vec<String>>,
}

fn validate_product(req: &CreateProductRequest) -> Result<(), ApiError> {
    req.validate().map_err(|e| ApiError::validation(e.to_string()))?;
    if req.price < Decimal::ZERO {
        return Err(ApiError::validation("price must be non-negative"));
    }
    Ok(())
}

async fn insert_product<'e, E>(db: E, req: &CreateProductRequest) -> Result<Product, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, description, price, category, thumbnail, stock_count, specifications, images, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.category)
    .bind(&req.thumbnail)
    .bind(req.stock_count.unwrap_or(0))
    .bind(
        req.specifications
            .clone()
            .map(Value::Object)
            .unwrap_or_else(|| serde_json::json!({})),
    )
    .bind(req.images.clone().unwrap_or_default())
    .fetch_one(db)
    .await
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    validate_product(&req)?;
    let product = insert_product(&state.db, &req).await?;
    state.reports.invalidate(DASHBOARD_REPORT).await;
    Ok((StatusCode::CREATED, Json(product)))
}

/// All-or-nothing batch creation: a single failed document rolls back
/// every product already inserted in the batch.
pub async fn bulk_create_products(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Vec<ProductSummary>>), ApiError> {
    let items = body
        .as_array()
        .ok_or_else(|| ApiError::validation("Expected a list of products"))?;

    let mut tx = state.db.begin().await?;
    let mut created = Vec::with_capacity(items.len());
    for raw in items {
        let req: CreateProductRequest = serde_json::from_value(raw.clone())
            .map_err(|e| ApiError::validation(e.to_string()))?;
        validate_product(&req)?;
        let product = insert_product(&mut *tx, &req).await?;
        created.push(ProductSummary::from(product));
    }
    tx.commit().await?;

    state.reports.invalidate(DASHBOARD_REPORT).await;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    validate_product(&req)?;
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, description = $3, price = $4, category = $5, thumbnail = $6, stock_count = $7, specifications = $8, images = $9, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.category)
    .bind(&req.thumbnail)
    .bind(req.stock_count.unwrap_or(0))
    .bind(
        req.specifications
            .clone()
            .map(Value::Object)
            .unwrap_or_else(|| serde_json::json!({})),
    )
    .bind(req.images.clone().unwrap_or_default())
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound { resource: "Product" })?;

    state.reports.invalidate(DASHBOARD_REPORT).await;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound { resource: "Product" });
    }
    state.reports.invalidate(DASHBOARD_REPORT).await;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub user_id: Option<Uuid>,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    pub comment: Option<String>,
}

pub async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    req.validate().map_err(|e| ApiError::validation(e.to_string()))?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound { resource: "Product" });
    }
    if let Some(user_id) = req.user_id {
        let user: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await?;
        if user.is_none() {
            return Err(ApiError::validation("Unknown user"));
        }
    }

    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (id, product_id, user_id, rating, comment, created_at) \
         VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(product_id)
    .bind(req.user_id)
    .bind(req.rating)
    .bind(&req.comment)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_whitelist() {
        assert_eq!(order_clause(None), "created_at DESC");
        assert_eq!(order_clause(Some("name")), "name ASC");
        assert_eq!(order_clause(Some("-price")), "price DESC");
        assert_eq!(order_clause(Some("created_at")), "created_at ASC");
        // Unknown fields fall back to the default rather than erroring.
        assert_eq!(order_clause(Some("stock_count")), "created_at DESC");
        assert_eq!(order_clause(Some("price; DROP TABLE products")), "created_at DESC");
    }

    #[test]
    fn negative_price_is_rejected() {
        let req = CreateProductRequest {
            name: "Widget".into(),
            description: None,
            price: Decimal::new(-100, 2),
            category: None,
            thumbnail: None,
            stock_count: None,
            specifications: None,
            images: None,
        };
        assert!(validate_product(&req).is_err());
    }

    #[test]
    fn specifications_must_be_an_object() {
        let err = serde_json::from_value::<CreateProductRequest>(serde_json::json!({
            "name": "Widget",
            "price": "9.99",
            "specifications": [1, 2, 3],
        }));
        assert!(err.is_err());
    }

    #[test]
    fn review_rating_bounds() {
        let ok = CreateReviewRequest { user_id: None, rating: 5, comment: None };
        assert!(ok.validate().is_ok());
        let low = CreateReviewRequest { user_id: None, rating: 0, comment: None };
        assert!(low.validate().is_err());
        let high = CreateReviewRequest { user_id: None, rating: 6, comment: None };
        assert!(high.validate().is_err());
    }
}
