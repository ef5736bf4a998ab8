//! Message notification handlers: new-message emails, the unread digest sweep and
//! inspection cancellations.
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::info;

use crate::context::AppContext;
use crate::error::NotifyError;
use crate::models::MessageItem;
use crate::payloads::{
    InspectionCancelledEmail, MessageNotificationEmail, NewMessageGuestEmail, NewMessageHostEmail,
    RenderContext,
};
use crate::store;

const UNREAD_WINDOW_HOURS: i64 = 1;

/// Tells the host a guest wrote to them.
pub async fn handle_new_message_host(message_item_id: &str, ctx: &AppContext) -> Result<Value, NotifyError> {
    let item = store::get_message_item(&ctx.dynamodb, message_item_id).await?;
    let message = store::get_message(&ctx.dynamodb, &item.message_id).await?;
    let host = store::get_person(&ctx.dynamodb, &message.host_id).await?;
    let guest = store::get_person(&ctx.dynamodb, &message.guest_id).await?;
    let render = RenderContext::new(&ctx.config, Utc::now());

    let payload = NewMessageHostEmail::new(&message, &item, &host, &guest, &render);
    let sent = ctx.mailer.send(&host.user.email, &payload).await?;

    Ok(json!({ "sent": [sent] }))
}

/// Tells the guest the host wrote to them.
pub async fn handle_new_message_guest(message_item_id: &str, ctx: &AppContext) -> Result<Value, NotifyError> {
    let item = store::get_message_item(&ctx.dynamodb, message_item_id).await?;
    let message = store::get_message(&ctx.dynamodb, &item.message_id).await?;
    let host = store::get_person(&ctx.dynamodb, &message.host_id).await?;
    let guest = store::get_person(&ctx.dynamodb, &message.guest_id).await?;
    let render = RenderContext::new(&ctx.config, Utc::now());

    let payload = NewMessageGuestEmail::new(&message, &item, &host, &guest, &render);
    let sent = ctx.mailer.send(&guest.user.email, &payload).await?;

    Ok(json!({ "sent": [sent] }))
}

/// Unread items from one sender in one conversation
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadThread {
    pub message_id: String,
    pub sender_id: String,
    pub latest: MessageItem,
    pub count: usize,
}

/// Collapse unread items into one entry per (conversation, sender), keeping the newest item.
pub fn group_unread_items(items: Vec<MessageItem>) -> Vec<UnreadThread> {
    let mut threads: BTreeMap<(String, String), UnreadThread> = BTreeMap::new();
    for item in items {
        let key = (item.message_id.clone(), item.sent_by.clone());
        match threads.get_mut(&key) {
            Some(thread) => {
                thread.count += 1;
                if item.created_at > thread.latest.created_at {
                    thread.latest = item;
                }
            }
            None => {
                threads.insert(
                    key,
                    UnreadThread {
                        message_id: item.message_id.clone(),
                        sender_id: item.sent_by.clone(),
                        latest: item,
                        count: 1,
                    },
                );
            }
        }
    }
    threads.into_values().collect()
}

/// Emails the other party of every conversation with unread items from the last hour.
pub async fn handle_message_notifications(ctx: &AppContext) -> Result<Value, NotifyError> {
    let now = Utc::now();
    let render = RenderContext::new(&ctx.config, now);

    let items =
        store::unread_message_items_between(&ctx.dynamodb, now - Duration::hours(UNREAD_WINDOW_HOURS), now).await?;
    let threads = group_unread_items(items);
    info!(threads = threads.len(), "sending unread message notifications");

    let mut sent = Vec::new();
    for thread in threads {
        let message = store::get_message(&ctx.dynamodb, &thread.message_id).await?;
        let receiver_id = if thread.sender_id == message.host_id {
            &message.guest_id
        } else {
            &message.host_id
        };
        let receiver = store::get_person(&ctx.dynamodb, receiver_id).await?;
        let sender = store::get_person(&ctx.dynamodb, &thread.sender_id).await?;

        let payload =
            MessageNotificationEmail::new(&message.id, &thread.latest, thread.count, &receiver, &sender, &render);
        sent.push(ctx.mailer.send(&receiver.user.email, &payload).await?);
    }

    Ok(json!({ "sent": sent }))
}

/// Tells the guest the host cancelled the inspection arranged in this conversation.
pub async fn handle_inspection_cancelled(message_id: &str, ctx: &AppContext) -> Result<Value, NotifyError> {
    let client = &ctx.dynamodb;
    let message = store::get_message(client, message_id).await?;
    let host = store::get_person(client, &message.host_id).await?;
    let guest = store::get_person(client, &message.guest_id).await?;
    let listing = store::get_listing(client, message.listing_id).await?;
    let location = store::get_location(client, listing.location_id).await?;
    let photos = store::listing_photos(client, listing.id).await?;
    let render = RenderContext::new(&ctx.config, Utc::now());

    let payload = InspectionCancelledEmail::new(&message, &host, &guest, &listing, &location, &photos, &render);
    let sent = ctx.mailer.send(&guest.user.email, &payload).await?;

    Ok(json!({ "sent": [sent] }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, message_id: &str, sent_by: &str, created_at: i64) -> MessageItem {
        MessageItem {
            id: id.to_string(),
            message_id: message_id.to_string(),
            sent_by: sent_by.to_string(),
            content: Some(format!("content {}", id)),
            is_read: false,
            created_at,
        }
    }

    #[test]
    fn test_group_unread_items() {
        let threads = group_unread_items(vec![
            item("a", "m1", "guest", 10),
            item("b", "m1", "guest", 30),
            item("c", "m1", "guest", 20),
            item("d", "m1", "host", 15),
            item("e", "m2", "guest", 5),
        ]);

        assert_eq!(threads.len(), 3);
        assert_eq!(threads[0].message_id, "m1");
        assert_eq!(threads[0].sender_id, "guest");
        assert_eq!(threads[0].count, 3);
        assert_eq!(threads[0].latest.id, "b");
        assert_eq!(threads[1].sender_id, "host");
        assert_eq!(threads[1].count, 1);
        assert_eq!(threads[2].message_id, "m2");
    }

    #[test]
    fn test_group_unread_items_empty() {
        assert!(group_unread_items(Vec::new()).is_empty());
    }
}
