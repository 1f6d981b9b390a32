use std::sync::Arc;

use crate::cache::ReportCache;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
    /// Externally reachable base URL, used to build payment links.
    pub public_url: String,
    pub reports: Arc<ReportCache>,
}

impl AppState {
    /// Publishes an event payload when NATS is configured; publish
    /// failures are logged and swallowed.
    pub async fn publish_event(&self, subject: &str, payload: serde_json::Value) {
        if let Some(nats) = &self.nats {
            if let Err(err) = nats.publish(subject.to_string(), payload.to_string().into()).await {
                tracing::warn!(%err, subject, "failed to publish event");
            }
        }
    }

    pub fn payment_link(&self, order_id: uuid::Uuid) -> String {
        format!("{}/api/v1/order/{}", self.public_url, order_id)
    }
}
