use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::WebhookConfig;
use crate::errors::QueryError;
use crate::metrics::registry::WEBHOOK_DELIVERIES_TOTAL;
use crate::query::builder::PaginatedResponse;

/// Event name sent with every query notification
pub const QUERY_COMPLETED_EVENT: &str = "query.completed";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebhookOptions {
    /// Send the query options alongside the result
    pub include_query: bool,
}

/// JSON body POSTed to the webhook URL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub event: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
    pub result: PaginatedResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    pub delivery_id: Uuid,
    pub url: String,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

/// Result of a query whose webhook delivery runs in the background.
///
/// Dropping `delivery` does not cancel it; await it to learn the outcome.
pub struct WebhookQuery {
    pub response: PaginatedResponse,
    pub delivery: JoinHandle<WebhookDelivery>,
}

/// Posts query results to webhook URLs. Single attempt, no retry.
#[derive(Clone)]
pub struct WebhookNotifier {
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self, QueryError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { http_client })
    }

    /// POST the payload once and report what happened. Never fails; transport
    /// errors and non-2xx statuses are recorded in the returned delivery.
    pub async fn deliver(&self, url: &str, payload: &WebhookPayload) -> WebhookDelivery {
        let delivery_id = Uuid::new_v4();

        let response = self
            .http_client
            .post(url)
            .header("X-Webhook-Event", payload.event.as_str())
            .header("X-Webhook-Delivery", delivery_id.to_string())
            .json(payload)
            .send()
            .await;

        let (success, status_code, error_message) = match response {
            Ok(resp) => {
                let status = resp.status();
                let error = if status.is_success() {
                    None
                } else {
                    Some(format!("Webhook endpoint responded with {}", status))
                };
                (status.is_success(), Some(status.as_u16()), error)
            }
            Err(e) => (false, None, Some(QueryError::from(e).to_string())),
        };

        if success {
            info!("Webhook {} delivered successfully to {}", delivery_id, url);
            WEBHOOK_DELIVERIES_TOTAL.with_label_values(&["success"]).inc();
        } else {
            warn!(
                "Webhook {} delivery failed to {}: {:?}",
                delivery_id, url, error_message
            );
            WEBHOOK_DELIVERIES_TOTAL.with_label_values(&["failure"]).inc();
        }

        WebhookDelivery {
            delivery_id,
            url: url.to_string(),
            success,
            status_code,
            error_message,
            delivered_at: Utc::now(),
        }
    }

    /// Deliver on a background task
    pub fn spawn_delivery(&self, url: String, payload: WebhookPayload) -> JoinHandle<WebhookDelivery> {
        let notifier = self.clone();
        tokio::spawn(async move { notifier.deliver(&url, &payload).await })
    }
}
