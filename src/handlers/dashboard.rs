//! Operator dashboard: read-only aggregates served through the report cache.

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::cache::DASHBOARD_REPORT;
use crate::error::ApiError;
use crate::models::Order;
use crate::state::AppState;

/// Trailing window for the "recent" counters.
const WINDOW_DAYS: i64 = 30;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub id: Uuid,
    pub name: String,
    pub order_count: i64,
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(cached) = state.reports.get(DASHBOARD_REPORT).await {
        return Ok(Json(cached));
    }

    let window_start = Utc::now() - Duration::days(WINDOW_DAYS);

    let total_orders: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&state.db)
        .await?;
    let recent_orders: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE created_at >= $1")
            .bind(window_start)
            .fetch_one(&state.db)
            .await?;
    let total_products: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&state.db)
        .await?;
    let out_of_stock: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM products WHERE stock_count = 0")
            .fetch_one(&state.db)
            .await?;

    // Revenue counts only orders that completed (reached `delivered`).
    let total_revenue: (Decimal,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status = 'delivered'",
    )
    .fetch_one(&state.db)
    .await?;
    let recent_revenue: (Decimal,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total_amount), 0) FROM orders \
         WHERE status = 'delivered' AND created_at >= $1",
    )
    .bind(window_start)
    .fetch_one(&state.db)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        "SELECT p.id, p.name, COUNT(oi.id) AS order_count \
         FROM products p LEFT JOIN order_items oi ON oi.product_id = p.id \
         GROUP BY p.id, p.name ORDER BY order_count DESC, p.name ASC LIMIT 5",
    )
    .fetch_all(&state.db)
    .await?;

    let recent_orders_list =
        sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC LIMIT 5")
            .fetch_all(&state.db)
            .await?;

    let report = serde_json::json!({
        "total_orders": total_orders.0,
        "recent_orders": recent_orders.0,
        "total_products": total_products.0,
        "out_of_stock": out_of_stock.0,
        "total_revenue": total_revenue.0,
        "recent_revenue": recent_revenue.0,
        "top_products": top_products,
        "recent_orders_list": recent_orders_list,
    });

    state.reports.put(DASHBOARD_REPORT, report.clone()).await;
    Ok(Json(report))
}
