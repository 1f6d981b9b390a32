//! Row types and closed enumerations for the storefront schema.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed product category labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    ArtsCrafts,
    Automotive,
    Baby,
    Beauty,
    Books,
    Computers,
    Electronics,
    Fashion,
    Health,
    HomeKitchen,
    Industrial,
    KidsFashion,
    MoviesTv,
    Music,
    Office,
    PetSupplies,
    SportsOutdoors,
    ToolsHome,
    ToysGames,
    VideoGames,
    Clothing,
    Home,
    Sports,
    Sneakers,
}

/// Order lifecycle states. No transition graph is enforced here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<Category>,
    pub thumbnail: Option<String>,
    pub stock_count: i32,
    pub specifications: serde_json::Value,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock_count > 0
    }
}

/// Compact projection used by list and search responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub category: Option<Category>,
    pub thumbnail: Option<String>,
    pub in_stock: bool,
    pub stock_count: i32,
}

impl From<Product> for ProductSummary {
    fn from(p: Product) -> Self {
        Self {
            in_stock: p.in_stock(),
            id: p.id,
            name: p.name,
            price: p.price,
            category: p.category,
            thumbnail: p.thumbnail,
            stock_count: p.stock_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Option<Uuid>,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Review as rendered inside a product detail, with the reviewer's
/// username resolved (null once the user is removed).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewView {
    pub user: Option<String>,
    pub rating: i16,
    pub comment: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: OrderStatus,
    pub total_amount: Option<Decimal>,
    pub shipping_address: Option<serde_json::Value>,
    pub payment_method_id: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Arithmetic mean of review ratings, 0 when there are none.
pub fn average_rating(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_form_is_snake_case() {
        assert_eq!(
            serde_json::to_value(Category::HomeKitchen).unwrap(),
            serde_json::json!("home_kitchen")
        );
        assert_eq!(
            serde_json::from_value::<Category>(serde_json::json!("electronics")).unwrap(),
            Category::Electronics
        );
        assert!(serde_json::from_value::<Category>(serde_json::json!("gadgets")).is_err());
    }

    #[test]
    fn order_status_defaults_to_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(
            serde_json::to_value(OrderStatus::Delivered).unwrap(),
            serde_json::json!("delivered")
        );
    }

    #[test]
    fn in_stock_tracks_stock_count() {
        let mut p = sample_product();
        p.stock_count = 3;
        assert!(p.in_stock());
        p.stock_count = 0;
        assert!(!p.in_stock());
    }

    #[test]
    fn summary_carries_derived_in_stock() {
        let mut p = sample_product();
        p.stock_count = 1;
        let s = ProductSummary::from(p);
        assert!(s.in_stock);
        assert_eq!(s.stock_count, 1);
    }

    #[test]
    fn rating_mean() {
        assert_eq!(average_rating(&[3, 5, 4]), 4.0);
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[2, 3]), 2.5);
    }

    fn sample_product() -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Widget".into(),
            description: None,
            price: Decimal::new(1000, 2),
            category: Some(Category::Electronics),
            thumbnail: None,
            stock_count: 0,
            specifications: serde_json::json!({}),
            images: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
