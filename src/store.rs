//! Read-only record lookups for notifications, plus the one conversation get-or-create.
//!
//! # Tables
//! - `Listings`, `ListingData`, `Locations`, `ListSettings`, `ListSettingsParent`: numeric keys
//! - `Users`, `UserProfiles`, `Messages`, `MessageItems`: string keys
//! - `ListingPhotos`, `ListingAccessDays`, `Messages`: `ListingIdIndex` GSI on `listing_id`
//! - `ListingAccessHours`: `AccessDaysIndex` GSI on `listing_access_days_id`
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::db_utils::{batch_get_items, get_item, query_index, scan_with_filter};
use crate::error::NotifyError;
use crate::http::generate_short_id;
use crate::models::{
    CategoryNames, ListSettings, ListSettingsParent, Listing, ListingAccessDays, ListingAccessHours,
    ListingData, ListingPhoto, Location, Message, MessageItem, Person, User, UserProfile,
};

const LISTING_ID_INDEX: &str = "ListingIdIndex";

fn n(id: i64) -> AttributeValue {
    AttributeValue::N(id.to_string())
}

fn s(id: &str) -> AttributeValue {
    AttributeValue::S(id.to_string())
}

pub async fn get_listing(client: &Client, id: i64) -> Result<Listing, NotifyError> {
    get_item(client, "Listings", "id", n(id))
        .await?
        .ok_or_else(|| NotifyError::not_found("Listing", id))
}

/// Fee configuration rows are required; several notifications cannot be composed without them.
pub async fn get_listing_data(client: &Client, listing_id: i64) -> Result<ListingData, NotifyError> {
    get_item(client, "ListingData", "listing_id", n(listing_id))
        .await?
        .ok_or_else(|| NotifyError::DataShape(format!("listing {} has no ListingData row", listing_id)))
}

pub async fn get_location(client: &Client, id: i64) -> Result<Location, NotifyError> {
    get_item(client, "Locations", "id", n(id))
        .await?
        .ok_or_else(|| NotifyError::not_found("Location", id))
}

pub async fn get_person(client: &Client, user_id: &str) -> Result<Person, NotifyError> {
    let user: User = get_item(client, "Users", "id", s(user_id))
        .await?
        .ok_or_else(|| NotifyError::not_found("User", user_id))?;
    let profile: Option<UserProfile> = get_item(client, "UserProfiles", "user_id", s(user_id)).await?;
    Ok(Person { user, profile })
}

/// Users and profiles for many ids in two batch reads. Ids without a user row are skipped.
pub async fn get_people(client: &Client, user_ids: &[String]) -> Result<Vec<Person>, NotifyError> {
    let keys: Vec<AttributeValue> = user_ids.iter().map(|id| s(id)).collect();
    let users: Vec<User> = batch_get_items(client, "Users", "id", keys.clone()).await?;
    let profiles: Vec<UserProfile> = batch_get_items(client, "UserProfiles", "user_id", keys).await?;

    Ok(users
        .into_iter()
        .map(|user| {
            let profile = profiles.iter().find(|p| p.user_id == user.id).cloned();
            Person { user, profile }
        })
        .collect())
}

/// Photos of a listing in insertion order (ascending id)
pub async fn listing_photos(client: &Client, listing_id: i64) -> Result<Vec<ListingPhoto>, NotifyError> {
    let mut photos: Vec<ListingPhoto> =
        query_index(client, "ListingPhotos", LISTING_ID_INDEX, "listing_id", n(listing_id)).await?;
    photos.sort_by_key(|p| p.id);
    Ok(photos)
}

/// Resolve category and subcategory names through the settings hierarchy.
pub async fn category_names(client: &Client, list_settings_parent_id: i64) -> Result<CategoryNames, NotifyError> {
    let parent: ListSettingsParent = get_item(client, "ListSettingsParent", "id", n(list_settings_parent_id))
        .await?
        .ok_or_else(|| {
            NotifyError::DataShape(format!("ListSettingsParent {} is missing", list_settings_parent_id))
        })?;

    let category: Option<ListSettings> =
        get_item(client, "ListSettings", "id", n(parent.list_settings_parent_id)).await?;
    let sub_category: Option<ListSettings> =
        get_item(client, "ListSettings", "id", n(parent.list_settings_child_id)).await?;

    match (category, sub_category) {
        (Some(category), Some(sub_category)) => Ok(CategoryNames {
            category: category.item_name,
            sub_category: sub_category.item_name,
        }),
        _ => Err(NotifyError::DataShape(format!(
            "ListSettings rows for parent {} are missing",
            list_settings_parent_id
        ))),
    }
}

/// Weekly opening hours of a listing; no access-days row means no open days at all.
pub async fn access_hours(client: &Client, listing_id: i64) -> Result<Vec<ListingAccessHours>, NotifyError> {
    let days: Vec<ListingAccessDays> =
        query_index(client, "ListingAccessDays", LISTING_ID_INDEX, "listing_id", n(listing_id)).await?;
    let Some(days) = days.first() else {
        return Ok(Vec::new());
    };
    query_index(
        client,
        "ListingAccessHours",
        "AccessDaysIndex",
        "listing_access_days_id",
        n(days.id),
    )
    .await
}

pub async fn get_message(client: &Client, id: &str) -> Result<Message, NotifyError> {
    get_item(client, "Messages", "id", s(id))
        .await?
        .ok_or_else(|| NotifyError::not_found("Message", id))
}

pub async fn get_message_item(client: &Client, id: &str) -> Result<MessageItem, NotifyError> {
    get_item(client, "MessageItems", "id", s(id))
        .await?
        .ok_or_else(|| NotifyError::not_found("MessageItem", id))
}

/// Outcome of matching a listing's conversations against a host and guest
#[derive(Debug, Clone, PartialEq)]
pub enum Conversation {
    Existing(Message),
    New(Message),
}

/// Picks the conversation between `host_id` and `guest_id`, or builds a fresh unread one
/// with a new id.
pub fn conversation_for(
    existing: Vec<Message>,
    listing_id: i64,
    host_id: &str,
    guest_id: &str,
    now: DateTime<Utc>,
) -> Conversation {
    if let Some(message) = existing
        .into_iter()
        .find(|m| m.host_id == host_id && m.guest_id == guest_id)
    {
        return Conversation::Existing(message);
    }

    Conversation::New(Message {
        id: generate_short_id(24),
        listing_id,
        host_id: host_id.to_string(),
        guest_id: guest_id.to_string(),
        is_read: false,
        created_at: now.timestamp(),
        updated_at: now.timestamp(),
    })
}

/// Returns the conversation between host and guest about a listing, creating an empty
/// one when none exists yet.
///
/// # Database Interactions
/// - **`Messages` Table**: `Query` on `ListingIdIndex`, then a conditional `PutItem`
///   (`attribute_not_exists(id)`) when no conversation matches.
pub async fn find_or_create_message(
    client: &Client,
    listing_id: i64,
    host_id: &str,
    guest_id: &str,
    now: DateTime<Utc>,
) -> Result<Message, NotifyError> {
    let existing: Vec<Message> =
        query_index(client, "Messages", LISTING_ID_INDEX, "listing_id", n(listing_id)).await?;
    let message = match conversation_for(existing, listing_id, host_id, guest_id, now) {
        Conversation::Existing(message) => return Ok(message),
        Conversation::New(message) => message,
    };
    let item = serde_dynamo::to_item(&message)
        .map_err(|e| NotifyError::DataStore(format!("Failed to serialize message: {:?}", e)))?;

    client
        .put_item()
        .table_name("Messages")
        .set_item(Some(item))
        .condition_expression("attribute_not_exists(id)")
        .send()
        .await
        .map_err(|e| NotifyError::DataStore(format!("Failed to create message: {:?}", e)))?;

    info!(message_id = %message.id, listing_id, "created conversation for notification");
    Ok(message)
}

/// Listings that are ready but unpublished and were created inside `[from, to]`.
pub async fn unpublished_listings_between(
    client: &Client,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Listing>, NotifyError> {
    scan_with_filter(
        client,
        "Listings",
        "is_published = :false AND is_ready = :true AND created_at BETWEEN :start AND :end",
        vec![
            (":false", AttributeValue::Bool(false)),
            (":true", AttributeValue::Bool(true)),
            (":start", n(from.timestamp())),
            (":end", n(to.timestamp())),
        ],
    )
    .await
}

/// Unread message items created inside `[from, to]`.
pub async fn unread_message_items_between(
    client: &Client,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<MessageItem>, NotifyError> {
    scan_with_filter(
        client,
        "MessageItems",
        "is_read = :false AND created_at BETWEEN :start AND :end",
        vec![
            (":false", AttributeValue::Bool(false)),
            (":start", n(from.timestamp())),
            (":end", n(to.timestamp())),
        ],
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(id: &str, host_id: &str, guest_id: &str) -> Message {
        Message {
            id: id.to_string(),
            listing_id: 42,
            host_id: host_id.to_string(),
            guest_id: guest_id.to_string(),
            is_read: true,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_conversation_reuses_matching_pair() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let existing = vec![
            message("m-other-guest", "host-1", "guest-2"),
            message("m-match", "host-1", "guest-1"),
            message("m-swapped", "guest-1", "host-1"),
        ];
        assert_eq!(
            conversation_for(existing, 42, "host-1", "guest-1", now),
            Conversation::Existing(message("m-match", "host-1", "guest-1"))
        );
    }

    #[test]
    fn test_conversation_created_when_no_match() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let existing = vec![message("m-other-guest", "host-1", "guest-2")];

        let Conversation::New(created) = conversation_for(existing, 42, "host-1", "guest-1", now) else {
            panic!("expected a new conversation");
        };
        assert_eq!(created.id.len(), 24);
        assert!(created.id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(created.listing_id, 42);
        assert_eq!(created.host_id, "host-1");
        assert_eq!(created.guest_id, "guest-1");
        assert!(!created.is_read);
        assert_eq!(created.created_at, now.timestamp());
        assert_eq!(created.updated_at, now.timestamp());

        assert!(matches!(conversation_for(Vec::new(), 42, "h", "g", now), Conversation::New(_)));
    }
}
