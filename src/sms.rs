//! SMS notifications through an HTTP notification endpoint

use serde::Serialize;
use tracing::{debug, info};

use crate::error::NotifyError;

#[derive(Debug, Serialize, PartialEq)]
pub struct SmsRequest<'a> {
    pub message: &'a str,
    pub sender: &'a str,
    pub receiver: &'a str,
}

pub struct SmsSender {
    client: reqwest::Client,
    endpoint: Option<String>,
    sender_name: String,
}

impl SmsSender {
    pub fn new(client: reqwest::Client, endpoint: Option<String>, sender_name: &str) -> Self {
        Self {
            client,
            endpoint,
            sender_name: sender_name.to_string(),
        }
    }

    /// Posts the text to the configured endpoint. Without an endpoint the send is skipped
    /// and reported as `Ok(false)`.
    pub async fn send(&self, message: &str, receiver: &str) -> Result<bool, NotifyError> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            debug!(receiver, "SMS endpoint not configured, skipping");
            return Ok(false);
        };

        let request = SmsRequest {
            message,
            sender: &self.sender_name,
            receiver,
        };
        let response = self
            .client
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Sms(format!("SMS request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(NotifyError::Sms(format!(
                "SMS endpoint returned {}",
                response.status()
            )));
        }

        info!(receiver, "SMS sent");
        Ok(true)
    }
}
