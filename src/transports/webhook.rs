//! src/transports/webhook.rs
//!
//! WebhookSender: reference delivery collaborator that POSTs rendered payloads
//! to an incoming-webhook URL. No retries: a failed delivery is returned to the
//! caller as-is.
use crate::core::error::{BoxError, LogError};
use crate::loggers::builder::{SendFn, SendFuture};
use crate::loggers::core::Payload;
use futures::FutureExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts payloads to a single webhook endpoint.
#[derive(Clone, Debug)]
pub struct WebhookSender {
    client: Client,
    url: String,
}

impl WebhookSender {
    pub fn new(url: impl Into<String>) -> Self {
        Self::new_with_timeout(url, Some(DEFAULT_TIMEOUT))
    }

    pub fn new_with_timeout(url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|_| Client::new());
        Self {
            client,
            url: url.into(),
        }
    }

    /// Uses an existing client (shared connection pool, custom TLS, ...).
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Delivers one payload. Structured payloads go out as JSON, text as
    /// `text/plain`. Resolves to the response body on 2xx.
    pub async fn deliver(&self, payload: Payload) -> Result<Value, LogError> {
        let rb = self.client.post(&self.url);
        let rb = match &payload {
            Payload::Structured(v) => rb.json(v),
            Payload::Text(s) => rb
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(s.clone()),
        };

        let response = rb
            .send()
            .await
            .map_err(|e| LogError::HttpError(format!("Network failure: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LogError::HttpError(format!("Read Error: {}", e)))?;

        if !status.is_success() {
            tracing::warn!(url = %self.url, status = status.as_u16(), "webhook rejected payload");
            return Err(LogError::HttpError(format!(
                "Webhook returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    /// Adapts this sender to the logger's `send` callback.
    pub fn into_send(self) -> SendFn {
        let sender = Arc::new(self);
        Arc::new(move |payload: Payload| -> SendFuture {
            let sender = sender.clone();
            async move { sender.deliver(payload).await.map_err(BoxError::from) }.boxed()
        })
    }
}
