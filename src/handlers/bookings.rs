//! Booking notification handlers (ready to pay, confirmed, request, declined, expired).
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::context::AppContext;
use crate::error::NotifyError;
use crate::payloads::{
    BookingConfirmedGuestEmail, BookingConfirmedHostEmail, BookingDeclinedGuestEmail,
    BookingExpiredGuestEmail, BookingRecords, BookingRequestHostEmail, ReadyToPayEmail,
    RenderContext, assemble_booking,
};
use crate::pricing::{Party, PriceType};
use crate::store;

/// Fetches a booking and every record its emails display.
///
/// # Collaborators
/// - **Booking service**: `GET` of the booking by id.
/// - **DynamoDB**: listing, fee configuration, location, host and guest, photos, categories.
///   Weekly access hours are only read for non-hourly bookings.
pub async fn load_booking_records(booking_id: &str, ctx: &AppContext) -> Result<BookingRecords, NotifyError> {
    let client = &ctx.dynamodb;
    let booking = ctx.bookings.get_booking(booking_id).await?;

    let listing = store::get_listing(client, booking.listing_id).await?;
    let listing_data = store::get_listing_data(client, listing.id).await?;
    let location = store::get_location(client, listing.location_id).await?;
    let host = store::get_person(client, &booking.host_id).await?;
    let guest = store::get_person(client, &booking.guest_id).await?;
    let photos = store::listing_photos(client, listing.id).await?;
    let categories = store::category_names(client, listing.list_settings_parent_id).await?;
    let access_hours = if booking.price_type == PriceType::Hourly {
        Vec::new()
    } else {
        store::access_hours(client, listing.id).await?
    };

    Ok(BookingRecords {
        booking,
        listing,
        listing_data,
        location,
        host,
        guest,
        photos,
        categories,
        access_hours,
    })
}

/// Tells the guest their accepted booking is waiting for payment.
pub async fn handle_booking_ready_to_pay(booking_id: &str, ctx: &AppContext) -> Result<Value, NotifyError> {
    let records = load_booking_records(booking_id, ctx).await?;
    let render = RenderContext::new(&ctx.config, Utc::now());

    let payload = ReadyToPayEmail {
        summary: assemble_booking(&records, Party::Guest, &render),
    };
    let sent = ctx.mailer.send(&records.guest.user.email, &payload).await?;

    Ok(json!({ "sent": [sent] }))
}

/// Sends the guest confirmation, then the host confirmation. The two sends are
/// independent: a host failure is reported but the guest email stays sent.
pub async fn handle_booking_confirmed(booking_id: &str, ctx: &AppContext) -> Result<Value, NotifyError> {
    let records = load_booking_records(booking_id, ctx).await?;
    let render = RenderContext::new(&ctx.config, Utc::now());

    let guest_payload = BookingConfirmedGuestEmail {
        summary: assemble_booking(&records, Party::Guest, &render),
    };
    let guest_sent = ctx.mailer.send(&records.guest.user.email, &guest_payload).await?;

    let host_payload = BookingConfirmedHostEmail {
        summary: assemble_booking(&records, Party::Host, &render),
    };
    let host_sent = ctx
        .mailer
        .send(&records.host.user.email, &host_payload)
        .await
        .inspect_err(|e| {
            warn!(booking_id, guest_message_id = %guest_sent.message_id, error = %e, "host confirmation failed after guest email was sent");
        })?;

    Ok(json!({ "sent": [guest_sent, host_sent] }))
}

/// Notifies the host of a new request, with a best-effort SMS to the host's phone.
pub async fn handle_booking_request(booking_id: &str, ctx: &AppContext) -> Result<Value, NotifyError> {
    let records = load_booking_records(booking_id, ctx).await?;
    let render = RenderContext::new(&ctx.config, Utc::now());

    let payload = BookingRequestHostEmail::new(&records, &render);
    let sent = ctx.mailer.send(&records.host.user.email, &payload).await?;

    let phone = records
        .host
        .profile
        .as_ref()
        .and_then(|p| p.phone_number.as_deref())
        .filter(|p| !p.trim().is_empty());
    let sms_sent = match phone {
        Some(phone) => {
            let text = request_sms_text(&records.guest.first_name(), &records.listing.title, &payload.summary.period);
            ctx.sms.send(&text, phone).await.unwrap_or_else(|e| {
                warn!(booking_id, error = %e, "booking request SMS failed");
                false
            })
        }
        None => false,
    };

    Ok(json!({ "sent": [sent], "sms": sms_sent }))
}

pub async fn handle_booking_declined(booking_id: &str, ctx: &AppContext) -> Result<Value, NotifyError> {
    let records = load_booking_records(booking_id, ctx).await?;
    let render = RenderContext::new(&ctx.config, Utc::now());

    let payload = BookingDeclinedGuestEmail {
        summary: assemble_booking(&records, Party::Guest, &render),
    };
    let sent = ctx.mailer.send(&records.guest.user.email, &payload).await?;

    Ok(json!({ "sent": [sent] }))
}

/// Tells the guest the request expired and points them at a conversation with the host,
/// creating the conversation if they never wrote to each other.
pub async fn handle_booking_expired(booking_id: &str, ctx: &AppContext) -> Result<Value, NotifyError> {
    let records = load_booking_records(booking_id, ctx).await?;
    let now = Utc::now();
    let render = RenderContext::new(&ctx.config, now);

    let message = store::find_or_create_message(
        &ctx.dynamodb,
        records.listing.id,
        &records.booking.host_id,
        &records.booking.guest_id,
        now,
    )
    .await?;
    info!(booking_id, message_id = %message.id, "using conversation for expiry email");

    let payload = BookingExpiredGuestEmail {
        summary: assemble_booking(&records, Party::Guest, &render),
        message_id: message.id,
    };
    let sent = ctx.mailer.send(&records.guest.user.email, &payload).await?;

    Ok(json!({ "sent": [sent] }))
}

fn request_sms_text(guest_name: &str, listing_title: &str, period: &str) -> String {
    format!(
        "{} has requested to book {} for {}. Open your dashboard to accept or decline.",
        if guest_name.is_empty() { "A guest" } else { guest_name },
        listing_title,
        period
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_sms_text() {
        assert_eq!(
            request_sms_text("Gus", "Harbour Loft", "3 Days"),
            "Gus has requested to book Harbour Loft for 3 Days. Open your dashboard to accept or decline."
        );
        assert!(request_sms_text("", "Loft", "1 Day").starts_with("A guest has requested"));
    }
}
