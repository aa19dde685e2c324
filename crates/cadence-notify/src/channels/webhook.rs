//! Webhook channel for HTTP-POST delivery (Slack, SMS gateways, phone bridges).

use async_trait::async_trait;
use std::collections::HashMap;

use super::super::{DeliveryChannel, Error, Notification, Result};
use super::NotificationChannel;

/// Webhook channel posting notifications as JSON.
///
/// One instance per delivery kind: a Slack incoming webhook, an SMS gateway,
/// or a voice-call bridge all share this transport.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    name: String,
    kind: DeliveryChannel,
    enabled: bool,
    url: String,
    headers: HashMap<String, String>,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(name: impl Into<String>, kind: DeliveryChannel, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
            url: url.into(),
            headers: HashMap::new(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn delivery_kind(&self) -> DeliveryChannel {
        self.kind
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }

        let mut request = self.client.post(&self.url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request
            .json(notification)
            .send()
            .await
            .map_err(|e| Error::SendFailed(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::SendFailed(format!(
                "Webhook returned error: {}",
                response.status()
            )));
        }

        Ok(())
    }
}
