//! Booking service client

use tracing::instrument;

use crate::error::NotifyError;
use crate::models::Booking;

pub struct BookingApi {
    client: reqwest::Client,
    base_url: String,
}

impl BookingApi {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn booking_url(&self, booking_id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(booking_id))
    }

    /// `GET {API_BOOKING}/{id}`; no retry, failures go straight back to the caller.
    #[instrument(skip(self))]
    pub async fn get_booking(&self, booking_id: &str) -> Result<Booking, NotifyError> {
        let url = self.booking_url(booking_id);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| NotifyError::BookingApi(format!("Failed to reach {}: {}", url, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(NotifyError::not_found("Booking", booking_id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::BookingApi(format!(
                "GET {} returned {}: {}",
                url, status, body
            )));
        }

        response
            .json::<Booking>()
            .await
            .map_err(|e| NotifyError::BookingApi(format!("Invalid booking payload for {}: {}", booking_id, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_url() {
        let api = BookingApi::new(reqwest::Client::new(), "https://api.example.com/bookings/");
        assert_eq!(api.booking_url("abc-123"), "https://api.example.com/bookings/abc-123");
        assert_eq!(api.booking_url("a/b"), "https://api.example.com/bookings/a%2Fb");
    }
}
