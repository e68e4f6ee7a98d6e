//! Generic webhook delivery
//!
//! Posts every notification as a small JSON document to a configured URL.
//! Useful for self-hosted relays (ntfy, Gotify bridges, home automation)
//! and as the template for adding new services: one descriptor entry,
//! no core changes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::error::{ConfigError, SendError};
use crate::notify::descriptor::{FieldSpec, ServiceDescriptor};
use crate::notify::notifier::{Notification, Notifier};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor {
    name: "webhook",
    summary: "Generic JSON webhook (HTTP POST)",
    fields: FIELDS,
    build,
};

const FIELDS: &[FieldSpec] = &[FieldSpec {
    key: "url",
    label: "Webhook URL",
    required: true,
    default: None,
    secret: false,
    validator: Some(validate_url),
}];

fn validate_url(value: &str) -> Result<(), String> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err("must start with http:// or https://".to_string())
    }
}

fn build(config: &ServiceConfig) -> Result<Arc<dyn Notifier>, ConfigError> {
    Ok(Arc::new(WebhookNotifier::from_config(config)?))
}

/// Webhook notification instance
#[derive(Debug)]
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let fields = DESCRIPTOR.resolve(config)?;
        let url = fields.required("url")?;

        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                service: DESCRIPTOR.name.to_string(),
                field: "client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { url, client })
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    body: &'a str,
    sent_at: DateTime<Utc>,
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, notification: &Notification) -> Result<(), SendError> {
        let payload = WebhookPayload {
            title: &notification.title,
            body: &notification.body,
            sent_at: notification.sent_at,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::transport(self.name(), e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SendError::api(self.name(), format!("HTTP {}", status)))
        }
    }
}
