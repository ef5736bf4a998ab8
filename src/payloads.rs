//! Template data for every notification kind.
//!
//! Each email template has its own record type whose serialized field names must match
//! what the template renders. The provider performs no validation, so a misnamed field
//! silently renders empty; [`TemplatePayload::expected_fields`] is the checked contract.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::Config;
use crate::display::{address_line, booking_date, cover_photo, current_date, profile_picture};
use crate::models::{
    Booking, CategoryNames, Listing, ListingAccessHours, ListingData, ListingPhoto, Location,
    Message, MessageItem, Person, ReferralRequest,
};
use crate::pricing::{FeeInput, FeeSchedule, Party, compute_fees, format_currency, format_term};
use crate::schedule::{CheckSide, resolve_check_time};

pub trait TemplatePayload: Serialize {
    const TEMPLATE: &'static str;

    /// Top-level keys the template reads
    fn expected_fields() -> Vec<&'static str>;
}

/// Per-invocation rendering settings
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub app_link: &'a str,
    pub tz: Tz,
    pub fees: &'a FeeSchedule,
    pub now: DateTime<Utc>,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a Config, now: DateTime<Utc>) -> Self {
        Self {
            app_link: &config.app_link,
            tz: config.display_timezone,
            fees: &config.fees,
            now,
        }
    }

    fn current_date(&self) -> String {
        current_date(self.now, self.tz)
    }
}

// -------------------------
// BOOKINGS
// -------------------------

/// Everything fetched for one booking notification
#[derive(Debug, Clone)]
pub struct BookingRecords {
    pub booking: Booking,
    pub listing: Listing,
    pub listing_data: ListingData,
    pub location: Location,
    pub host: Person,
    pub guest: Person,
    pub photos: Vec<ListingPhoto>,
    pub categories: CategoryNames,
    pub access_hours: Vec<ListingAccessHours>,
}

const BOOKING_SUMMARY_FIELDS: [&str; 28] = [
    "currentDate",
    "appLink",
    "bookingId",
    "confirmationCode",
    "listingId",
    "listTitle",
    "listAddress",
    "listImage",
    "category",
    "subCategory",
    "hostName",
    "hostPhoto",
    "guestName",
    "guestPhoto",
    "checkInDate",
    "checkOutDate",
    "checkInTime",
    "checkOutTime",
    "period",
    "priceType",
    "basePrice",
    "subtotal",
    "serviceFee",
    "discount",
    "totalPrice",
    "minimumTerm",
    "term",
    "capacity",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub current_date: String,
    pub app_link: String,
    pub booking_id: String,
    pub confirmation_code: String,
    pub listing_id: i64,
    pub list_title: String,
    pub list_address: String,
    pub list_image: String,
    pub category: String,
    pub sub_category: String,
    pub host_name: String,
    pub host_photo: String,
    pub guest_name: String,
    pub guest_photo: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub check_in_time: String,
    pub check_out_time: String,
    pub period: String,
    pub price_type: String,
    pub base_price: String,
    pub subtotal: String,
    pub service_fee: String,
    /// `null` unless a voucher produced a positive discount
    pub discount: Option<String>,
    pub total_price: String,
    pub minimum_term: u32,
    pub term: String,
    pub capacity: u32,
}

/// Flatten one booking and its related records into the shared summary, priced for `party`.
pub fn assemble_booking(records: &BookingRecords, party: Party, ctx: &RenderContext) -> BookingSummary {
    let booking = &records.booking;
    let fees = compute_fees(
        &FeeInput {
            base_price: booking.base_price,
            period: booking.period,
            price_type: booking.price_type,
            is_absorved_fee: records.listing_data.is_absorved_fee,
            voucher_applied: booking.has_voucher(),
            total_price: booking.total_price,
        },
        ctx.fees,
        party,
    )
    .formatted();
    let min_term = records.listing_data.min_term();

    BookingSummary {
        current_date: ctx.current_date(),
        app_link: ctx.app_link.to_string(),
        booking_id: booking.booking_id.clone(),
        confirmation_code: booking.confirmation_code.clone(),
        listing_id: records.listing.id,
        list_title: records.listing.title.clone(),
        list_address: address_line(&records.location),
        list_image: cover_photo(&records.photos),
        category: records.categories.category.clone(),
        sub_category: records.categories.sub_category.clone(),
        host_name: records.host.first_name(),
        host_photo: profile_picture(records.host.profile.as_ref()),
        guest_name: records.guest.first_name(),
        guest_photo: profile_picture(records.guest.profile.as_ref()),
        check_in_date: booking_date(booking.check_in, ctx.tz),
        check_out_date: booking_date(booking.check_out, ctx.tz),
        check_in_time: resolve_check_time(booking, CheckSide::In, &records.access_hours, ctx.tz),
        check_out_time: resolve_check_time(booking, CheckSide::Out, &records.access_hours, ctx.tz),
        period: fees.period,
        price_type: booking.price_type.as_str().to_string(),
        base_price: format_currency(booking.base_price),
        subtotal: fees.subtotal,
        service_fee: fees.service_fee,
        discount: fees.discount,
        total_price: fees.total,
        minimum_term: min_term,
        term: format_term(records.listing.booking_period, min_term),
        capacity: records.listing_data.capacity(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyToPayEmail {
    #[serde(flatten)]
    pub summary: BookingSummary,
}

impl TemplatePayload for ReadyToPayEmail {
    const TEMPLATE: &'static str = "booking-ready-to-pay";

    fn expected_fields() -> Vec<&'static str> {
        BOOKING_SUMMARY_FIELDS.to_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingConfirmedGuestEmail {
    #[serde(flatten)]
    pub summary: BookingSummary,
}

impl TemplatePayload for BookingConfirmedGuestEmail {
    const TEMPLATE: &'static str = "booking-confirmed-guest";

    fn expected_fields() -> Vec<&'static str> {
        BOOKING_SUMMARY_FIELDS.to_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingConfirmedHostEmail {
    #[serde(flatten)]
    pub summary: BookingSummary,
}

impl TemplatePayload for BookingConfirmedHostEmail {
    const TEMPLATE: &'static str = "booking-confirmed-host";

    fn expected_fields() -> Vec<&'static str> {
        BOOKING_SUMMARY_FIELDS.to_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDeclinedGuestEmail {
    #[serde(flatten)]
    pub summary: BookingSummary,
}

impl TemplatePayload for BookingDeclinedGuestEmail {
    const TEMPLATE: &'static str = "booking-declined-guest";

    fn expected_fields() -> Vec<&'static str> {
        BOOKING_SUMMARY_FIELDS.to_vec()
    }
}

/// Sent to the host with the guest's note
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRequestHostEmail {
    #[serde(flatten)]
    pub summary: BookingSummary,
    pub message: String,
}

impl BookingRequestHostEmail {
    pub fn new(records: &BookingRecords, ctx: &RenderContext) -> Self {
        Self {
            summary: assemble_booking(records, Party::Host, ctx),
            message: records.booking.message.clone().unwrap_or_default(),
        }
    }
}

impl TemplatePayload for BookingRequestHostEmail {
    const TEMPLATE: &'static str = "booking-request-host";

    fn expected_fields() -> Vec<&'static str> {
        let mut fields = BOOKING_SUMMARY_FIELDS.to_vec();
        fields.push("message");
        fields
    }
}

/// Links the guest to the conversation with the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingExpiredGuestEmail {
    #[serde(flatten)]
    pub summary: BookingSummary,
    pub message_id: String,
}

impl TemplatePayload for BookingExpiredGuestEmail {
    const TEMPLATE: &'static str = "booking-expired-guest";

    fn expected_fields() -> Vec<&'static str> {
        let mut fields = BOOKING_SUMMARY_FIELDS.to_vec();
        fields.push("messageId");
        fields
    }
}

// -------------------------
// LISTINGS
// -------------------------

/// Everything fetched for one listing notification
#[derive(Debug, Clone)]
pub struct ListingRecords {
    pub listing: Listing,
    pub listing_data: ListingData,
    pub location: Location,
    pub host: Person,
    pub photos: Vec<ListingPhoto>,
    pub categories: CategoryNames,
}

const LISTING_DETAILS_FIELDS: [&str; 14] = [
    "currentDate",
    "appLink",
    "hostName",
    "hostPhoto",
    "listTitle",
    "listingId",
    "listImage",
    "listAddress",
    "basePrice",
    "priceType",
    "category",
    "capacity",
    "minimumTerm",
    "term",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetails {
    pub current_date: String,
    pub app_link: String,
    pub host_name: String,
    pub host_photo: String,
    pub list_title: String,
    pub listing_id: i64,
    pub list_image: String,
    pub list_address: String,
    pub base_price: String,
    pub price_type: String,
    pub category: String,
    pub capacity: u32,
    pub minimum_term: u32,
    pub term: String,
}

pub fn listing_details(records: &ListingRecords, ctx: &RenderContext) -> ListingDetails {
    let min_term = records.listing_data.min_term();
    ListingDetails {
        current_date: ctx.current_date(),
        app_link: ctx.app_link.to_string(),
        host_name: records.host.first_name(),
        host_photo: profile_picture(records.host.profile.as_ref()),
        list_title: records.listing.title.clone(),
        listing_id: records.listing.id,
        list_image: cover_photo(&records.photos),
        list_address: address_line(&records.location),
        base_price: format_currency(records.listing_data.base_price),
        price_type: records.listing.booking_period.as_str().to_string(),
        category: records.categories.category.clone(),
        capacity: records.listing_data.capacity(),
        minimum_term: min_term,
        term: format_term(records.listing.booking_period, min_term),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishListingEmail {
    #[serde(flatten)]
    pub details: ListingDetails,
}

impl TemplatePayload for PublishListingEmail {
    const TEMPLATE: &'static str = "publish-listing-confirmation";

    fn expected_fields() -> Vec<&'static str> {
        LISTING_DETAILS_FIELDS.to_vec()
    }
}

/// Enquiry about a listing, forwarded to the team address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferralEmail {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pax: Option<u32>,
    pub message: String,
    pub date: String,
    pub time: String,
    #[serde(flatten)]
    pub details: ListingDetails,
}

impl ReferralEmail {
    pub fn new(request: &ReferralRequest, records: &ListingRecords, ctx: &RenderContext) -> Self {
        Self {
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone().unwrap_or_default(),
            pax: request.pax,
            message: request.notes.clone().unwrap_or_default(),
            date: request.date.clone().unwrap_or_default(),
            time: request.time.clone().unwrap_or_default(),
            details: listing_details(records, ctx),
        }
    }
}

impl TemplatePayload for ReferralEmail {
    const TEMPLATE: &'static str = "referral-team";

    fn expected_fields() -> Vec<&'static str> {
        let mut fields = vec!["name", "email", "phone", "pax", "message", "date", "time"];
        fields.extend(LISTING_DETAILS_FIELDS);
        fields
    }
}

/// One unfinished listing in the reminder digest
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCard {
    pub app_link: String,
    pub host_name: String,
    pub host_photo: String,
    pub listing_title: String,
    pub listing_id: i64,
    pub listing_image: String,
    pub listing_address: String,
    pub base_price: String,
    pub price_type: String,
    pub category: String,
    pub capacity: u32,
    pub minimum_term: u32,
    pub term: String,
}

impl From<ListingDetails> for ListingCard {
    fn from(details: ListingDetails) -> Self {
        Self {
            app_link: details.app_link,
            host_name: details.host_name,
            host_photo: details.host_photo,
            listing_title: details.list_title,
            listing_id: details.listing_id,
            listing_image: details.list_image,
            listing_address: details.list_address,
            base_price: details.base_price,
            price_type: details.price_type,
            category: details.category,
            capacity: details.capacity,
            minimum_term: details.minimum_term,
            term: details.term,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteListingEmail {
    pub current_date: String,
    pub host_name: String,
    pub listings: Vec<ListingCard>,
}

impl CompleteListingEmail {
    pub fn new(host: &Person, listings: &[ListingRecords], ctx: &RenderContext) -> Self {
        Self {
            current_date: ctx.current_date(),
            host_name: host.first_name(),
            listings: listings
                .iter()
                .map(|records| ListingCard::from(listing_details(records, ctx)))
                .collect(),
        }
    }
}

impl TemplatePayload for CompleteListingEmail {
    const TEMPLATE: &'static str = "complete-listing-host";

    fn expected_fields() -> Vec<&'static str> {
        vec!["currentDate", "hostName", "listings"]
    }
}

// -------------------------
// MESSAGES
// -------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageHostEmail {
    pub current_date: String,
    pub app_link: String,
    pub message_id: String,
    pub host_name: String,
    pub guest_name: String,
    pub guest_photo: String,
    pub guest_location: String,
    pub message: String,
}

impl NewMessageHostEmail {
    pub fn new(message: &Message, item: &MessageItem, host: &Person, guest: &Person, ctx: &RenderContext) -> Self {
        Self {
            current_date: ctx.current_date(),
            app_link: ctx.app_link.to_string(),
            message_id: message.id.clone(),
            host_name: host.first_name(),
            guest_name: guest.first_name(),
            guest_photo: profile_picture(guest.profile.as_ref()),
            guest_location: profile_location(guest),
            message: item.content.clone().unwrap_or_default(),
        }
    }
}

impl TemplatePayload for NewMessageHostEmail {
    const TEMPLATE: &'static str = "message-host-email";

    fn expected_fields() -> Vec<&'static str> {
        vec![
            "currentDate",
            "appLink",
            "messageId",
            "hostName",
            "guestName",
            "guestPhoto",
            "guestLocation",
            "message",
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageGuestEmail {
    pub current_date: String,
    pub app_link: String,
    pub message_id: String,
    pub host_name: String,
    pub guest_name: String,
    pub host_photo: String,
    pub host_location: String,
    pub message: String,
}

impl NewMessageGuestEmail {
    pub fn new(message: &Message, item: &MessageItem, host: &Person, guest: &Person, ctx: &RenderContext) -> Self {
        Self {
            current_date: ctx.current_date(),
            app_link: ctx.app_link.to_string(),
            message_id: message.id.clone(),
            host_name: host.first_name(),
            guest_name: guest.first_name(),
            host_photo: profile_picture(host.profile.as_ref()),
            host_location: profile_location(host),
            message: item.content.clone().unwrap_or_default(),
        }
    }
}

impl TemplatePayload for NewMessageGuestEmail {
    const TEMPLATE: &'static str = "message-guest-email";

    fn expected_fields() -> Vec<&'static str> {
        vec![
            "currentDate",
            "appLink",
            "messageId",
            "hostName",
            "guestName",
            "hostPhoto",
            "hostLocation",
            "message",
        ]
    }
}

/// Digest of unread messages in one conversation from one sender
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageNotificationEmail {
    pub current_date: String,
    pub app_link: String,
    pub message_id: String,
    pub receiver_name: String,
    pub sender_name: String,
    pub sender_photo: String,
    pub message: String,
    pub unread_count: usize,
}

impl MessageNotificationEmail {
    pub fn new(
        message_id: &str,
        latest: &MessageItem,
        unread_count: usize,
        receiver: &Person,
        sender: &Person,
        ctx: &RenderContext,
    ) -> Self {
        Self {
            current_date: ctx.current_date(),
            app_link: ctx.app_link.to_string(),
            message_id: message_id.to_string(),
            receiver_name: receiver.first_name(),
            sender_name: sender.first_name(),
            sender_photo: profile_picture(sender.profile.as_ref()),
            message: latest.content.clone().unwrap_or_default(),
            unread_count,
        }
    }
}

impl TemplatePayload for MessageNotificationEmail {
    const TEMPLATE: &'static str = "message-notification-email";

    fn expected_fields() -> Vec<&'static str> {
        vec![
            "currentDate",
            "appLink",
            "messageId",
            "receiverName",
            "senderName",
            "senderPhoto",
            "message",
            "unreadCount",
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionCancelledEmail {
    pub current_date: String,
    pub app_link: String,
    pub message_id: String,
    pub host_name: String,
    pub guest_name: String,
    pub host_photo: String,
    pub list_title: String,
    pub list_address: String,
    pub list_image: String,
}

impl InspectionCancelledEmail {
    pub fn new(
        message: &Message,
        host: &Person,
        guest: &Person,
        listing: &Listing,
        location: &Location,
        photos: &[ListingPhoto],
        ctx: &RenderContext,
    ) -> Self {
        Self {
            current_date: ctx.current_date(),
            app_link: ctx.app_link.to_string(),
            message_id: message.id.clone(),
            host_name: host.first_name(),
            guest_name: guest.first_name(),
            host_photo: profile_picture(host.profile.as_ref()),
            list_title: listing.title.clone(),
            list_address: address_line(location),
            list_image: cover_photo(photos),
        }
    }
}

impl TemplatePayload for InspectionCancelledEmail {
    const TEMPLATE: &'static str = "cancel-inspection-guest";

    fn expected_fields() -> Vec<&'static str> {
        vec![
            "currentDate",
            "appLink",
            "messageId",
            "hostName",
            "guestName",
            "hostPhoto",
            "listTitle",
            "listAddress",
            "listImage",
        ]
    }
}

fn profile_location(person: &Person) -> String {
    person
        .profile
        .as_ref()
        .and_then(|p| p.location.clone())
        .unwrap_or_default()
}
