//! Order placement, status lookup and the payment-page flow.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::cache::DASHBOARD_REPORT;
use crate::error::ApiError;
use crate::models::{Order, OrderStatus, Product};
use crate::pagination::{PageParams, Paginated};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub products: Vec<OrderItemRequest>,
    pub shipping_address: Option<Map<String, Value>>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub response: String,
}

fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Places an order. The header insert, per-item stock decrements, item
/// inserts and the final total all run in one transaction: any failure
/// rolls the whole placement back, stock included. The decrement doubles
/// as the stock check (`stock_count >= quantity` in the WHERE clause), so
/// two concurrent orders cannot both take the last unit.
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreated>), ApiError> {
    if req.products.is_empty() {
        return Err(ApiError::validation("At least one product is required"));
    }
    for item in &req.products {
        if item.quantity < 1 {
            return Err(ApiError::validation("Quantity must be at least 1"));
        }
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

    let mut tx = state.db.begin().await?;

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, user_id, shipping_address, created_at, updated_at) \
         VALUES ($1, $2, $3, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(req.user_id)
    .bind(req.shipping_address.clone().map(Value::Object))
    .fetch_one(&mut *tx)
    .await?;

    let mut total = Decimal::ZERO;
    for item in &req.products {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ApiError::ProductMissing(item.product_id))?;

        let decremented = sqlx::query(
            "UPDATE products SET stock_count = stock_count - $2, updated_at = NOW() \
             WHERE id = $1 AND stock_count >= $2",
        )
        .bind(product.id)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?;
        if decremented.rows_affected() == 0 {
            return Err(ApiError::InsufficientStock {
                name: product.name,
                available: product.stock_count,
            });
        }

        let price = line_total(product.price, item.quantity);
        total += price;

        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, quantity, price, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW())",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(product.id)
        .bind(item.quantity)
        .bind(price)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE orders SET total_amount = $2, updated_at = NOW() WHERE id = $1")
        .bind(order.id)
        .bind(total)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    state
        .publish_event(
            "orders.created",
            serde_json::json!({ "order_id": order.id, "total_amount": total }),
        )
        .await;
    state.reports.invalidate(DASHBOARD_REPORT).await;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            order_id: order.id,
            status: order.status,
            response: format!("Make payment at {}", state.payment_link(order.id)),
        }),
    ))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderItemView {
    pub product_id: Option<Uuid>,
    pub name: Option<String>,
    pub quantity: i32,
    pub price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct TrackingInfo {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub current_location: &'static str,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetails {
    pub products: Vec<OrderItemView>,
    pub total_amount: Option<Decimal>,
    pub shipping_address: Option<Value>,
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OrderStatusView {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub tracking_info: TrackingInfo,
    pub order_details: OrderDetails,
}

fn tracking_url(tracking_number: Option<&str>) -> Option<String> {
    tracking_number.map(|t| format!("https://tracking.example.com/{t}"))
}

impl OrderStatusView {
    fn new(order: Order, items: Vec<OrderItemView>) -> Self {
        Self {
            order_id: order.id,
            status: order.status,
            tracking_info: TrackingInfo {
                tracking_url: tracking_url(order.tracking_number.as_deref()),
                carrier: order.carrier,
                tracking_number: order.tracking_number,
                current_location: "In Transit",
                estimated_delivery: order.estimated_delivery,
            },
            order_details: OrderDetails {
                products: items,
                total_amount: order.total_amount,
                shipping_address: order.shipping_address,
                order_date: order.created_at,
            },
        }
    }
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderStatusView>, ApiError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound { resource: "Order" })?;

    let items = sqlx::query_as::<_, OrderItemView>(
        "SELECT oi.product_id, p.name, oi.quantity, oi.price \
         FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id \
         WHERE oi.order_id = $1 ORDER BY oi.created_at",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(OrderStatusView::new(order, items)))
}

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub user_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Paginated<Order>>, ApiError> {
    let page = PageParams { page: params.page, limit: params.limit };
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE ($1::uuid IS NULL OR user_id = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(params.user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.db)
    .await?;
    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::uuid IS NULL OR user_id = $1)")
            .bind(params.user_id)
            .fetch_one(&state.db)
            .await?;
    Ok(Json(Paginated::new(orders, total.0, &page)))
}

#[derive(Debug, Serialize)]
pub struct PaymentPage {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Option<Decimal>,
    pub payment_link: String,
}

pub async fn payment_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentPage>, ApiError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound { resource: "Order" })?;
    Ok(Json(PaymentPage {
        order_id: order.id,
        status: order.status,
        total_amount: order.total_amount,
        payment_link: state.payment_link(order.id),
    }))
}

/// Simulates payment completion: the order moves to `confirmed` and the
/// caller is redirected to the dashboard.
pub async fn complete_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ApiError> {
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = 'confirmed', updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound { resource: "Order" })?;

    state
        .publish_event("orders.paid", serde_json::json!({ "order_id": order.id }))
        .await;
    state.reports.invalidate(DASHBOARD_REPORT).await;
    Ok(Redirect::to("/api/v1/admin/dashboard"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_is_unit_price_times_quantity() {
        // price 10.00, quantity 2 -> captured line price 20.00
        let price = Decimal::new(1000, 2);
        assert_eq!(line_total(price, 2), Decimal::new(2000, 2));
        assert_eq!(line_total(Decimal::new(999, 2), 3), Decimal::new(2997, 2));
    }

    #[test]
    fn totals_accumulate_across_lines() {
        let mut total = Decimal::ZERO;
        total += line_total(Decimal::new(1000, 2), 2);
        total += line_total(Decimal::new(550, 2), 1);
        assert_eq!(total, Decimal::new(2550, 2));
    }

    #[test]
    fn tracking_url_requires_a_tracking_number() {
        assert_eq!(tracking_url(None), None);
        assert_eq!(
            tracking_url(Some("TRK123")).as_deref(),
            Some("https://tracking.example.com/TRK123")
        );
    }

    #[test]
    fn status_view_projects_the_order() {
        let order = Order {
            id: Uuid::new_v4(),
            user_id: None,
            status: OrderStatus::Shipped,
            total_amount: Some(Decimal::new(2000, 2)),
            shipping_address: Some(serde_json::json!({"city": "Lagos"})),
            payment_method_id: None,
            tracking_number: Some("TRK123".into()),
            carrier: Some("DHL".into()),
            estimated_delivery: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = OrderStatusView::new(order, vec![]);
        assert_eq!(view.status, OrderStatus::Shipped);
        assert_eq!(view.tracking_info.current_location, "In Transit");
        assert_eq!(
            view.tracking_info.tracking_url.as_deref(),
            Some("https://tracking.example.com/TRK123")
        );
        assert_eq!(view.order_details.total_amount, Some(Decimal::new(2000, 2)));
    }

    #[test]
    fn missing_products_field_deserializes_empty() {
        let req: CreateOrderRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(req.products.is_empty());
    }

    #[test]
    fn shipping_address_must_be_an_object() {
        let err = serde_json::from_value::<CreateOrderRequest>(serde_json::json!({
            "products": [{"product_id": Uuid::nil(), "quantity": 1}],
            "shipping_address": "221B Baker Street",
        }));
        assert!(err.is_err());
    }
}
