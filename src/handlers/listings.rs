//! Listing notification handlers: publish confirmation, referral enquiries and the
//! "finish your listing" reminder sweep.
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::error::NotifyError;
use crate::models::{Listing, Person, ReferralRequest};
use crate::payloads::{
    CompleteListingEmail, ListingRecords, PublishListingEmail, ReferralEmail, RenderContext,
    listing_details,
};
use crate::store;

/// How far back the reminder sweep looks for unfinished listings
const REMINDER_WINDOW_HOURS: i64 = 48;

async fn load_listing_records(listing: Listing, host: Person, ctx: &AppContext) -> Result<ListingRecords, NotifyError> {
    let client = &ctx.dynamodb;
    let listing_data = store::get_listing_data(client, listing.id).await?;
    let location = store::get_location(client, listing.location_id).await?;
    let photos = store::listing_photos(client, listing.id).await?;
    let categories = store::category_names(client, listing.list_settings_parent_id).await?;

    Ok(ListingRecords {
        listing,
        listing_data,
        location,
        host,
        photos,
        categories,
    })
}

async fn load_listing_by_id(listing_id: i64, ctx: &AppContext) -> Result<ListingRecords, NotifyError> {
    let listing = store::get_listing(&ctx.dynamodb, listing_id).await?;
    let host = store::get_person(&ctx.dynamodb, &listing.user_id).await?;
    load_listing_records(listing, host, ctx).await
}

/// Confirms to the host that their space is live.
pub async fn handle_listing_published(listing_id: i64, ctx: &AppContext) -> Result<Value, NotifyError> {
    let records = load_listing_by_id(listing_id, ctx).await?;
    let render = RenderContext::new(&ctx.config, Utc::now());

    let payload = PublishListingEmail {
        details: listing_details(&records, &render),
    };
    let sent = ctx.mailer.send(&records.host.user.email, &payload).await?;

    Ok(json!({ "sent": [sent] }))
}

/// Forwards a visitor's enquiry about a listing to the team address.
pub async fn handle_listing_referral(
    listing_id: i64,
    request: ReferralRequest,
    ctx: &AppContext,
) -> Result<Value, NotifyError> {
    let records = load_listing_by_id(listing_id, ctx).await?;
    let render = RenderContext::new(&ctx.config, Utc::now());

    let payload = ReferralEmail::new(&request, &records, &render);
    let sent = ctx.mailer.send(&ctx.config.referral_email, &payload).await?;

    Ok(json!({ "sent": [sent] }))
}

/// Groups listings by owner, keeping each owner's listings in input order.
pub fn group_listings_by_host(listings: Vec<Listing>) -> BTreeMap<String, Vec<Listing>> {
    let mut grouped: BTreeMap<String, Vec<Listing>> = BTreeMap::new();
    for listing in listings {
        grouped.entry(listing.user_id.clone()).or_default().push(listing);
    }
    grouped
}

/// Emails every host who created a ready-but-unpublished listing in the last 48 hours,
/// one digest per host.
///
/// # Logic
/// - Hosts whose user row is gone are skipped with a warning.
/// - Each digest is sent independently; the first failure stops the sweep and earlier
///   digests stay sent.
pub async fn handle_complete_listing_reminders(ctx: &AppContext) -> Result<Value, NotifyError> {
    let now = Utc::now();
    let render = RenderContext::new(&ctx.config, now);

    let listings =
        store::unpublished_listings_between(&ctx.dynamodb, now - Duration::hours(REMINDER_WINDOW_HOURS), now).await?;
    let grouped = group_listings_by_host(listings);
    info!(hosts = grouped.len(), "sending complete-listing reminders");

    let host_ids: Vec<String> = grouped.keys().cloned().collect();
    let people = store::get_people(&ctx.dynamodb, &host_ids).await?;

    let mut sent = Vec::new();
    for (host_id, host_listings) in grouped {
        let Some(host) = people.iter().find(|p| p.user.id == host_id) else {
            warn!(%host_id, "listing owner not found, skipping reminder");
            continue;
        };

        let mut records = Vec::with_capacity(host_listings.len());
        for listing in host_listings {
            records.push(load_listing_records(listing, host.clone(), ctx).await?);
        }

        let payload = CompleteListingEmail::new(host, &records, &render);
        sent.push(ctx.mailer.send(&host.user.email, &payload).await?);
    }

    Ok(json!({ "sent": sent }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PriceType;

    fn listing(id: i64, owner: &str) -> Listing {
        Listing {
            id,
            user_id: owner.to_string(),
            title: format!("Space {}", id),
            booking_period: PriceType::Daily,
            location_id: 1,
            list_settings_parent_id: 1,
            is_published: false,
            is_ready: true,
            created_at: 1_700_000_000 + id,
        }
    }

    #[test]
    fn test_group_listings_by_host() {
        let grouped = group_listings_by_host(vec![
            listing(3, "host-b"),
            listing(1, "host-a"),
            listing(2, "host-b"),
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["host-a"].iter().map(|l| l.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(grouped["host-b"].iter().map(|l| l.id).collect::<Vec<_>>(), vec![3, 2]);
    }

    #[test]
    fn test_group_listings_empty() {
        assert!(group_listings_by_host(Vec::new()).is_empty());
    }
}
