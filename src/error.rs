//! Request-boundary error taxonomy.
//!
//! Every failure surfaces as a `{"error": "<message>"}` body with the
//! mapped status code; no request error is fatal to the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Raised from the order placement path, where the offending product
    /// id must be named in the response.
    #[error("Product {0} not found")]
    ProductMissing(Uuid),

    #[error("Insufficient stock for product {name}. Available: {available}")]
    InsufficientStock { name: String, available: i32 },

    #[error("internal error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } | Self::ProductMissing(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Database(err) = &self {
            tracing::error!(%err, "database error");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::validation("bad input").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound { resource: "Product" }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::ProductMissing(Uuid::nil()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InsufficientStock { name: "Widget".into(), available: 2 }.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn messages_name_the_offender() {
        let err = ApiError::InsufficientStock { name: "Widget".into(), available: 2 };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product Widget. Available: 2"
        );
        assert_eq!(
            ApiError::NotFound { resource: "Order" }.to_string(),
            "Order not found"
        );
    }
}
