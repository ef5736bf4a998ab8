//! Error taxonomy for notification handlers

use lambda_http::{Body, Response};

use crate::http::error_response;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Data store error: {0}")]
    DataStore(String),

    #[error("Booking service error: {0}")]
    BookingApi(String),

    #[error("Mail provider error: {0}")]
    Mail(String),

    #[error("SMS send failed: {0}")]
    Sms(String),

    #[error("Missing related data: {0}")]
    DataShape(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NotifyError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        NotifyError::NotFound { entity, id: id.to_string() }
    }

    /// Bad trigger input is the caller's fault; everything else is a failed notification.
    pub fn status(&self) -> u16 {
        match self {
            NotifyError::InvalidRequest(_) => 400,
            _ => 500,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            NotifyError::NotFound { .. } => "Record Not Found",
            NotifyError::DataStore(_) => "DynamoDB Error",
            NotifyError::BookingApi(_) => "Booking Service Error",
            NotifyError::Mail(_) => "Email Send Failed",
            NotifyError::Sms(_) => "SMS Send Failed",
            NotifyError::DataShape(_) => "Incomplete Data",
            NotifyError::InvalidRequest(_) => "Invalid Request",
            NotifyError::Config(_) => "Configuration Error",
        }
    }

    pub fn into_response(self) -> Response<Body> {
        tracing::error!(error = %self, "notification failed");
        error_response(self.status(), self.title(), &self.to_string(), None)
    }
}
