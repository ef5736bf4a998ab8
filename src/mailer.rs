//! Templated email delivery through AWS SES v2

use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Destination, EmailContent, Template};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::error::NotifyError;
use crate::payloads::TemplatePayload;

/// Result of one accepted send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEmail {
    pub template: String,
    pub destination: String,
    pub message_id: String,
}

/// Sends every email from the configured source, blind-copies the operational list and
/// sets the fixed reply-to address.
pub struct Mailer {
    client: SesClient,
    source: String,
    reply_to: String,
    bcc: Vec<String>,
    configuration_set: String,
}

impl Mailer {
    pub fn new(client: SesClient, config: &Config) -> Self {
        Self {
            client,
            source: config.email_source.clone(),
            reply_to: config.reply_to.clone(),
            bcc: config.bcc_emails.clone(),
            configuration_set: config.configuration_set.clone(),
        }
    }

    /// Send a typed payload with its own template name.
    pub async fn send<P: TemplatePayload>(&self, destination: &str, payload: &P) -> Result<SentEmail, NotifyError> {
        let data = serde_json::to_value(payload)
            .map_err(|e| NotifyError::Mail(format!("Failed to serialize {} data: {}", P::TEMPLATE, e)))?;
        self.send_template(P::TEMPLATE, destination, &data).await
    }

    /// Send raw template data; the provider renders missing fields as empty.
    #[instrument(skip(self, data))]
    pub async fn send_template(
        &self,
        template: &str,
        destination: &str,
        data: &Value,
    ) -> Result<SentEmail, NotifyError> {
        if destination.trim().is_empty() {
            return Err(NotifyError::Mail(format!("No destination address for {}", template)));
        }

        let destination_builder = Destination::builder()
            .to_addresses(destination)
            .set_bcc_addresses((!self.bcc.is_empty()).then(|| self.bcc.clone()));

        let content = EmailContent::builder()
            .template(
                Template::builder()
                    .template_name(template)
                    .template_data(data.to_string())
                    .build(),
            )
            .build();

        let output = self
            .client
            .send_email()
            .from_email_address(&self.source)
            .destination(destination_builder.build())
            .reply_to_addresses(&self.reply_to)
            .configuration_set_name(&self.configuration_set)
            .content(content)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, template, "SES send failed");
                NotifyError::Mail(format!("Failed to send {} to {}: {}", template, destination, e))
            })?;

        let message_id = output.message_id().unwrap_or("unknown").to_string();
        info!(%message_id, template, destination, "email sent");

        Ok(SentEmail {
            template: template.to_string(),
            destination: destination.to_string(),
            message_id,
        })
    }
}
