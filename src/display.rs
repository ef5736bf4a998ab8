//! Display helpers shared by every email payload

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::{Location, ListingPhoto, UserProfile};

pub const DEFAULT_PROFILE_PHOTO: &str =
    "https://app.spacenow.com/static/media/defaultPic.1050b195.png";

/// "Monday 4 March, 2024"
pub const CURRENT_DATE_FORMAT: &str = "%A %-d %B, %Y";
/// "Mon 4 Mar, 2024"
pub const BOOKING_DATE_FORMAT: &str = "%a %-d %b, %Y";
/// "09:00 AM"
pub const HOUR_FORMAT: &str = "%I:%M %p";

pub fn format_in_zone(instant: DateTime<Utc>, tz: Tz, pattern: &str) -> String {
    instant.with_timezone(&tz).format(pattern).to_string()
}

pub fn current_date(now: DateTime<Utc>, tz: Tz) -> String {
    format_in_zone(now, tz, CURRENT_DATE_FORMAT)
}

pub fn booking_date(instant: DateTime<Utc>, tz: Tz) -> String {
    format_in_zone(instant, tz, BOOKING_DATE_FORMAT)
}

pub fn profile_picture(profile: Option<&UserProfile>) -> String {
    profile
        .and_then(|p| p.picture.as_deref())
        .filter(|picture| !picture.trim().is_empty())
        .unwrap_or(DEFAULT_PROFILE_PHOTO)
        .to_string()
}

/// Photos are expected in insertion order. The cover-flagged photo wins, then the first
/// photo, then an empty path.
pub fn cover_photo(photos: &[ListingPhoto]) -> String {
    photos
        .iter()
        .find(|p| p.is_cover)
        .or_else(|| photos.first())
        .map(|p| p.name.clone())
        .unwrap_or_default()
}

/// "12 George St, Sydney" or just "Sydney"
pub fn address_line(location: &Location) -> String {
    match location.address1.as_deref().map(str::trim) {
        Some(address) if !address.is_empty() => format!("{}, {}", address, location.city),
        _ => location.city.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn photo(id: i64, name: &str, is_cover: bool) -> ListingPhoto {
        ListingPhoto {
            id,
            listing_id: 1,
            name: name.to_string(),
            is_cover,
        }
    }

    #[test]
    fn test_cover_photo_prefers_flagged() {
        let photos = vec![photo(1, "a.jpg", false), photo(2, "b.jpg", true)];
        assert_eq!(cover_photo(&photos), "b.jpg");
    }

    #[test]
    fn test_cover_photo_falls_back_to_first() {
        let photos = vec![photo(1, "first.jpg", false), photo(2, "second.jpg", false)];
        assert_eq!(cover_photo(&photos), "first.jpg");
        assert_eq!(cover_photo(&[]), "");
    }

    #[test]
    fn test_profile_picture_fallback() {
        let mut profile = UserProfile {
            user_id: "u1".to_string(),
            first_name: "Ana".to_string(),
            picture: None,
            location: None,
            phone_number: None,
        };
        assert_eq!(profile_picture(None), DEFAULT_PROFILE_PHOTO);
        assert_eq!(profile_picture(Some(&profile)), DEFAULT_PROFILE_PHOTO);
        profile.picture = Some("https://cdn.example.com/ana.png".to_string());
        assert_eq!(profile_picture(Some(&profile)), "https://cdn.example.com/ana.png");
    }

    #[test]
    fn test_address_line() {
        let mut location = Location {
            id: 1,
            address1: Some("12 George St".to_string()),
            city: "Sydney".to_string(),
            country: "Australia".to_string(),
        };
        assert_eq!(address_line(&location), "12 George St, Sydney");
        location.address1 = None;
        assert_eq!(address_line(&location), "Sydney");
    }

    #[test]
    fn test_dates_use_display_zone() {
        // 2024-03-03 14:30 UTC is Monday 01:30 in Sydney (AEDT, +11)
        let instant = Utc.with_ymd_and_hms(2024, 3, 3, 14, 30, 0).unwrap();
        let tz: Tz = "Australia/Sydney".parse().unwrap();
        assert_eq!(current_date(instant, tz), "Monday 4 March, 2024");
        assert_eq!(booking_date(instant, tz), "Mon 4 Mar, 2024");
        assert_eq!(format_in_zone(instant, tz, HOUR_FORMAT), "01:30 AM");
    }
}
