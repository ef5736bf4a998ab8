//! Handler modules for Lambda function

pub mod bookings;
pub mod listings;
pub mod messages;
pub mod templates;

// Re-export handler functions for convenience
pub use bookings::{
    handle_booking_confirmed, handle_booking_declined, handle_booking_expired,
    handle_booking_ready_to_pay, handle_booking_request,
};
pub use listings::{handle_complete_listing_reminders, handle_listing_published, handle_listing_referral};
pub use messages::{
    handle_inspection_cancelled, handle_message_notifications, handle_new_message_guest,
    handle_new_message_host,
};
pub use templates::handle_send_template;
