//! Check-in / check-out time resolution from a listing's weekly access hours

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

use crate::display::{HOUR_FORMAT, format_in_zone};
use crate::models::{Booking, ListingAccessHours};
use crate::pricing::PriceType;

pub const ALL_DAY: &str = "24 hours";
pub const CLOSED: &str = "Closed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckSide {
    In,
    Out,
}

/// Weekday of `instant` in the display zone, 0 = Sunday
pub fn weekday_in_zone(instant: DateTime<Utc>, tz: Tz) -> u32 {
    instant.with_timezone(&tz).weekday().num_days_from_sunday()
}

/// Display string for a listing's hours on the weekday of `date`: the opening time for
/// check-in, the closing time for check-out.
pub fn listing_hours_on(
    date: DateTime<Utc>,
    side: CheckSide,
    hours: &[ListingAccessHours],
    tz: Tz,
) -> String {
    let weekday = weekday_in_zone(date, tz);
    let Some(day) = hours.iter().find(|h| h.weekday == weekday) else {
        return CLOSED.to_string();
    };
    if day.allday {
        return ALL_DAY.to_string();
    }

    let timestamp = match side {
        CheckSide::In => day.open_hour,
        CheckSide::Out => day.close_hour,
    };
    match DateTime::from_timestamp(timestamp, 0) {
        Some(instant) => format_in_zone(instant, tz, HOUR_FORMAT),
        None => CLOSED.to_string(),
    }
}

/// Hourly bookings carry their own hours and never consult the listing schedule.
pub fn resolve_check_time(
    booking: &Booking,
    side: CheckSide,
    hours: &[ListingAccessHours],
    tz: Tz,
) -> String {
    if booking.price_type == PriceType::Hourly {
        let own = match side {
            CheckSide::In => &booking.check_in_hour,
            CheckSide::Out => &booking.check_out_hour,
        };
        return own.clone().unwrap_or_default();
    }

    let date = match side {
        CheckSide::In => booking.check_in,
        CheckSide::Out => booking.check_out,
    };
    listing_hours_on(date, side, hours, tz)
}
