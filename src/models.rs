use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::PriceType;

// Booking service records (camelCase JSON over HTTP)

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_id: String,
    pub listing_id: i64,
    pub host_id: String,
    pub guest_id: String,
    pub price_type: PriceType,
    pub base_price: Decimal,
    pub period: u32,
    pub total_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_hour: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out_hour: Option<String>,
    #[serde(default)]
    pub confirmation_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Booking {
    /// A blank voucher code counts as no voucher
    pub fn has_voucher(&self) -> bool {
        self.voucher_code
            .as_deref()
            .is_some_and(|code| !code.trim().is_empty())
    }
}

// DynamoDB records

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Listing {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub booking_period: PriceType,
    pub location_id: i64,
    pub list_settings_parent_id: i64,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_ready: bool,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ListingData {
    pub listing_id: i64,
    pub base_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_term: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub is_absorved_fee: bool,
}

impl ListingData {
    pub fn min_term(&self) -> u32 {
        self.min_term.filter(|t| *t >= 1).unwrap_or(1)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity.filter(|c| *c >= 1).unwrap_or(1)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Location {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ListingPhoto {
    pub id: i64,
    pub listing_id: i64,
    pub name: String,
    #[serde(default)]
    pub is_cover: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ListSettings {
    pub id: i64,
    pub item_name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ListSettingsParent {
    pub id: i64,
    pub list_settings_parent_id: i64,
    pub list_settings_child_id: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ListingAccessDays {
    pub id: i64,
    pub listing_id: i64,
}

/// Opening hours for one weekday (0 = Sunday). Open/close are unix seconds; only the
/// time of day in the display timezone matters.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ListingAccessHours {
    pub id: i64,
    pub listing_access_days_id: i64,
    pub weekday: u32,
    pub open_hour: i64,
    pub close_hour: i64,
    #[serde(default)]
    pub allday: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub listing_id: i64,
    pub host_id: String,
    pub guest_id: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MessageItem {
    pub id: String,
    pub message_id: String,
    pub sent_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: i64,
}

/// Category and subcategory names resolved from the settings hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryNames {
    pub category: String,
    pub sub_category: String,
}

/// A user together with their (optional) profile row
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub user: User,
    pub profile: Option<UserProfile>,
}

impl Person {
    pub fn first_name(&self) -> String {
        self.profile
            .as_ref()
            .map(|p| p.first_name.clone())
            .unwrap_or_default()
    }
}

// Request Bodies
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReferralRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub pax: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_booking_from_service_json() {
        let booking: Booking = serde_json::from_value(json!({
            "bookingId": "b-1",
            "listingId": 7,
            "hostId": "host-1",
            "guestId": "guest-1",
            "priceType": "daily",
            "basePrice": 100,
            "period": 3,
            "totalPrice": "310.50",
            "voucherCode": "  ",
            "checkIn": "2024-03-04T00:00:00Z",
            "checkOut": "2024-03-07T00:00:00Z",
            "confirmationCode": "XK2L9"
        }))
        .unwrap();

        assert_eq!(booking.price_type, PriceType::Daily);
        assert_eq!(booking.base_price, dec!(100));
        assert_eq!(booking.total_price, dec!(310.50));
        assert!(!booking.has_voucher());
        assert_eq!(booking.message, None);
    }

    #[test]
    fn test_listing_data_defaults() {
        let data = ListingData {
            listing_id: 1,
            base_price: dec!(50),
            min_term: Some(0),
            capacity: None,
            is_absorved_fee: false,
        };
        assert_eq!(data.min_term(), 1);
        assert_eq!(data.capacity(), 1);
    }
}
