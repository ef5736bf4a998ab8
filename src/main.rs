mod booking_api;
mod config;
mod context;
mod db_utils;
mod display;
mod error;
mod handlers;
mod http;
mod mailer;
mod models;
mod payloads;
mod pricing;
mod schedule;
mod sms;
mod store;

use lambda_http::{Body, Request, Response, run, service_fn};
use serde_json::Value;
use tracing::{error, info};

use context::AppContext;
use error::NotifyError;
use handlers::{
    handle_booking_confirmed, handle_booking_declined, handle_booking_expired,
    handle_booking_ready_to_pay, handle_booking_request, handle_complete_listing_reminders,
    handle_inspection_cancelled, handle_listing_published, handle_listing_referral,
    handle_message_notifications, handle_new_message_guest, handle_new_message_host,
    handle_send_template,
};
use http::{error_response, parse_json_body, success_response, with_cors_origin};
use models::ReferralRequest;

/// Notification triggers, keyed by path and method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    SendTemplate,
    BookingReadyToPay(&'a str),
    BookingConfirmed(&'a str),
    BookingRequest(&'a str),
    BookingDeclined(&'a str),
    BookingExpired(&'a str),
    ListingPublished(&'a str),
    ListingReferral(&'a str),
    CompleteListingReminders,
    NewMessageHost(&'a str),
    NewMessageGuest(&'a str),
    MessageNotifications,
    InspectionCancelled(&'a str),
}

/// Strip /Prod or /prod prefix if it exists
fn strip_stage(path: &str) -> &str {
    path.strip_prefix("/Prod")
        .or_else(|| path.strip_prefix("/prod"))
        .unwrap_or(path)
}

fn resolve_route<'a>(method: &str, path: &'a str) -> Option<Route<'a>> {
    if method != "POST" {
        return None;
    }
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let route = match segments.as_slice() {
        ["send-email"] => Route::SendTemplate,
        ["bookings", id, "ready-to-pay"] => Route::BookingReadyToPay(id),
        ["bookings", id, "confirmed"] => Route::BookingConfirmed(id),
        ["bookings", id, "request"] => Route::BookingRequest(id),
        ["bookings", id, "declined"] => Route::BookingDeclined(id),
        ["bookings", id, "expired"] => Route::BookingExpired(id),
        ["listings", "complete-reminders"] => Route::CompleteListingReminders,
        ["listings", id, "published"] => Route::ListingPublished(id),
        ["listings", id, "referral"] => Route::ListingReferral(id),
        ["messages", "notifications"] => Route::MessageNotifications,
        ["messages", "items", id, "host"] => Route::NewMessageHost(id),
        ["messages", "items", id, "guest"] => Route::NewMessageGuest(id),
        ["messages", id, "inspection-cancelled"] => Route::InspectionCancelled(id),
        _ => return None,
    };
    Some(route)
}

fn parse_listing_id(raw: &str) -> Result<i64, NotifyError> {
    raw.parse()
        .map_err(|_| NotifyError::InvalidRequest(format!("'{}' is not a valid listing id", raw)))
}

async fn dispatch(route: Route<'_>, event: &Request, ctx: &AppContext) -> Result<Value, NotifyError> {
    match route {
        Route::SendTemplate => {
            let body = parse_json_body(event.body())?;
            handle_send_template(&body, ctx).await
        }
        Route::BookingReadyToPay(id) => handle_booking_ready_to_pay(id, ctx).await,
        Route::BookingConfirmed(id) => handle_booking_confirmed(id, ctx).await,
        Route::BookingRequest(id) => handle_booking_request(id, ctx).await,
        Route::BookingDeclined(id) => handle_booking_declined(id, ctx).await,
        Route::BookingExpired(id) => handle_booking_expired(id, ctx).await,
        Route::ListingPublished(id) => handle_listing_published(parse_listing_id(id)?, ctx).await,
        Route::ListingReferral(id) => {
            let listing_id = parse_listing_id(id)?;
            let body = parse_json_body(event.body())?;
            let request: ReferralRequest = serde_json::from_value(body)
                .map_err(|e| NotifyError::InvalidRequest(format!("Invalid referral body: {}", e)))?;
            handle_listing_referral(listing_id, request, ctx).await
        }
        Route::CompleteListingReminders => handle_complete_listing_reminders(ctx).await,
        Route::NewMessageHost(id) => handle_new_message_host(id, ctx).await,
        Route::NewMessageGuest(id) => handle_new_message_guest(id, ctx).await,
        Route::MessageNotifications => handle_message_notifications(ctx).await,
        Route::InspectionCancelled(id) => handle_inspection_cancelled(id, ctx).await,
    }
}

/// Handle the Lambda event
async fn handle_lambda_event(event: Request, ctx: &AppContext) -> Response<Body> {
    let method = event.method().as_str().to_string();
    let path = strip_stage(event.uri().path()).to_string();

    let response = match resolve_route(&method, &path) {
        Some(route) => {
            info!(?route, "handling notification trigger");
            match dispatch(route, &event, ctx).await {
                Ok(result) => success_response(200, &result),
                Err(e) => e.into_response(),
            }
        }
        None => error_response(
            405,
            "Method not allowed",
            &path,
            Some("You're sending a request that doesn't exist."),
        ),
    };

    with_cors_origin(response, &ctx.config.cors_origin)
}

/// Main Lambda handler function
async fn function_handler(event: Request, ctx: &AppContext) -> Result<Response<Body>, lambda_http::Error> {
    Ok(handle_lambda_event(event, ctx).await)
}

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    lambda_http::tracing::init_default_subscriber();

    let ctx = AppContext::load()
        .await
        .inspect_err(|e| error!(error = %e, "failed to initialise notification service"))?;
    let ctx = &ctx;
    run(service_fn(move |event: Request| async move { function_handler(event, ctx).await })).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_stage() {
        assert_eq!(strip_stage("/Prod/send-email"), "/send-email");
        assert_eq!(strip_stage("/prod/bookings/1/confirmed"), "/bookings/1/confirmed");
        assert_eq!(strip_stage("/send-email"), "/send-email");
    }

    #[test]
    fn test_booking_routes() {
        assert_eq!(
            resolve_route("POST", "/bookings/bk-1/ready-to-pay"),
            Some(Route::BookingReadyToPay("bk-1"))
        );
        assert_eq!(resolve_route("POST", "/bookings/bk-1/confirmed/"), Some(Route::BookingConfirmed("bk-1")));
        assert_eq!(resolve_route("POST", "/bookings/bk-1/request"), Some(Route::BookingRequest("bk-1")));
        assert_eq!(resolve_route("POST", "/bookings/bk-1/declined"), Some(Route::BookingDeclined("bk-1")));
        assert_eq!(resolve_route("POST", "/bookings/bk-1/expired"), Some(Route::BookingExpired("bk-1")));
    }

    #[test]
    fn test_listing_and_message_routes() {
        assert_eq!(resolve_route("POST", "/send-email"), Some(Route::SendTemplate));
        assert_eq!(
            resolve_route("POST", "/listings/complete-reminders"),
            Some(Route::CompleteListingReminders)
        );
        assert_eq!(resolve_route("POST", "/listings/42/published"), Some(Route::ListingPublished("42")));
        assert_eq!(resolve_route("POST", "/listings/42/referral"), Some(Route::ListingReferral("42")));
        assert_eq!(resolve_route("POST", "/messages/notifications"), Some(Route::MessageNotifications));
        assert_eq!(resolve_route("POST", "/messages/items/it-9/host"), Some(Route::NewMessageHost("it-9")));
        assert_eq!(resolve_route("POST", "/messages/items/it-9/guest"), Some(Route::NewMessageGuest("it-9")));
        assert_eq!(
            resolve_route("POST", "/messages/m-1/inspection-cancelled"),
            Some(Route::InspectionCancelled("m-1"))
        );
    }

    #[test]
    fn test_unknown_routes() {
        assert_eq!(resolve_route("GET", "/bookings/bk-1/confirmed"), None);
        assert_eq!(resolve_route("POST", "/bookings/bk-1"), None);
        assert_eq!(resolve_route("POST", "/"), None);
    }

    #[test]
    fn test_parse_listing_id() {
        assert_eq!(parse_listing_id("42").unwrap(), 42);
        assert_eq!(parse_listing_id("abc").unwrap_err().status(), 400);
    }
}
