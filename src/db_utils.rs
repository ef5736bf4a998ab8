//! Shared DynamoDB helpers: typed point lookups, paginated queries and scans, batch gets.
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::error::NotifyError;

fn dynamo_error(action: &str, table: &str, e: impl std::fmt::Debug) -> NotifyError {
    NotifyError::DataStore(format!("Failed to {} {}: {:?}", action, table, e))
}

fn deserialize_error(table: &str, e: impl std::fmt::Debug) -> NotifyError {
    NotifyError::DataStore(format!("Failed to deserialize {} item: {:?}", table, e))
}

/// `GetItem` on a single-attribute primary key, deserialized with `serde_dynamo`.
pub async fn get_item<T>(
    client: &DynamoDbClient,
    table: &str,
    key_name: &str,
    key: AttributeValue,
) -> Result<Option<T>, NotifyError>
where
    T: DeserializeOwned,
{
    let output = client
        .get_item()
        .table_name(table)
        .key(key_name, key)
        .send()
        .await
        .map_err(|e| dynamo_error("get item from", table, e))?;

    match output.item {
        Some(item) => serde_dynamo::from_item(item)
            .map(Some)
            .map_err(|e| deserialize_error(table, e)),
        None => Ok(None),
    }
}

/// `Query` on an index for all items sharing one partition key, following pagination.
pub async fn query_index<T>(
    client: &DynamoDbClient,
    table: &str,
    index: &str,
    key_name: &str,
    key: AttributeValue,
) -> Result<Vec<T>, NotifyError>
where
    T: DeserializeOwned,
{
    let mut results = Vec::new();
    let mut last_evaluated_key = None;

    loop {
        let output = client
            .query()
            .table_name(table)
            .index_name(index)
            .key_condition_expression("#k = :k")
            .expression_attribute_names("#k", key_name)
            .expression_attribute_values(":k", key.clone())
            .set_exclusive_start_key(last_evaluated_key)
            .send()
            .await
            .map_err(|e| dynamo_error("query", table, e))?;

        let items: Vec<T> = serde_dynamo::from_items(output.items.unwrap_or_default())
            .map_err(|e| deserialize_error(table, e))?;
        results.extend(items);

        last_evaluated_key = output.last_evaluated_key;
        if last_evaluated_key.is_none() {
            break;
        }
    }

    Ok(results)
}

/// Filtered `Scan` over a whole table, following pagination. Used by the periodic sweeps,
/// which only look at a small time window.
pub async fn scan_with_filter<T>(
    client: &DynamoDbClient,
    table: &str,
    filter_expression: &str,
    values: Vec<(&str, AttributeValue)>,
) -> Result<Vec<T>, NotifyError>
where
    T: DeserializeOwned,
{
    let mut base_builder = client
        .scan()
        .table_name(table)
        .filter_expression(filter_expression);
    for (k, v) in values {
        base_builder = base_builder.expression_attribute_values(k, v);
    }

    let mut results = Vec::new();
    let mut last_evaluated_key = None;

    loop {
        let output = base_builder
            .clone()
            .set_exclusive_start_key(last_evaluated_key)
            .send()
            .await
            .map_err(|e| dynamo_error("scan", table, e))?;

        let items: Vec<T> = serde_dynamo::from_items(output.items.unwrap_or_default())
            .map_err(|e| deserialize_error(table, e))?;
        results.extend(items);

        last_evaluated_key = output.last_evaluated_key;
        if last_evaluated_key.is_none() {
            break;
        }
    }

    Ok(results)
}

/// Fetches many items of one table by primary key.
///
/// # Logic
/// - **Deduplication**: Duplicate keys are removed before hitting the database.
/// - **Chunking**: Requests go out in chunks of 90 (DynamoDB limit is 100).
/// - **Missing items**: Keys with no item are simply absent from the result.
pub async fn batch_get_items<T>(
    client: &DynamoDbClient,
    table: &str,
    key_name: &str,
    keys: Vec<AttributeValue>,
) -> Result<Vec<T>, NotifyError>
where
    T: DeserializeOwned,
{
    let mut unique_keys = keys;
    unique_keys.sort_by_key(|k| format!("{:?}", k));
    unique_keys.dedup();

    let mut results = Vec::new();
    for chunk in unique_keys.chunks(90) {
        let key_maps: Vec<HashMap<String, AttributeValue>> = chunk
            .iter()
            .map(|k| HashMap::from([(key_name.to_string(), k.clone())]))
            .collect();

        let keys_and_attrs = KeysAndAttributes::builder()
            .set_keys(Some(key_maps))
            .build()
            .map_err(|e| dynamo_error("build batch keys for", table, e))?;

        let request_items = HashMap::from([(table.to_string(), keys_and_attrs)]);
        let mut responses = execute_batch_get_with_retries(client, request_items).await?;

        let items: Vec<T> = serde_dynamo::from_items(responses.remove(table).unwrap_or_default())
            .map_err(|e| deserialize_error(table, e))?;
        results.extend(items);
    }

    Ok(results)
}

/// Executes a `BatchGetItem` request with automatic retries for unprocessed keys.
///
/// # Logic
/// - **Exponential Backoff**: Waits exponentially longer (200ms, 400ms...) between retries to respect DynamoDB throttling.
/// - **Unprocessed Keys**: Automatically re-queues any keys that DynamoDB couldn't process in the initial batch.
/// - **Accumulation**: Merges results from all retry attempts into a single response map.
pub async fn execute_batch_get_with_retries(
    client: &DynamoDbClient,
    request_items: HashMap<String, KeysAndAttributes>,
) -> Result<HashMap<String, Vec<HashMap<String, AttributeValue>>>, NotifyError> {
    const MAX_RETRIES: u32 = 5;

    let mut accumulated_responses: HashMap<String, Vec<HashMap<String, AttributeValue>>> = HashMap::new();
    let mut current_request_items = request_items;
    let mut attempts = 0;

    loop {
        attempts += 1;
        let output = client
            .batch_get_item()
            .set_request_items(Some(current_request_items.clone()))
            .send()
            .await
            .map_err(|e| NotifyError::DataStore(format!("Failed to batch get items: {:?}", e)))?;

        if let Some(responses) = output.responses {
            for (table_name, items) in responses {
                accumulated_responses.entry(table_name).or_default().extend(items);
            }
        }

        let unprocessed = output.unprocessed_keys.unwrap_or_default();
        if unprocessed.is_empty() {
            break;
        }

        if attempts >= MAX_RETRIES {
            return Err(NotifyError::DataStore(
                "Exceeded max retries for batch operation. DynamoDB might be throttled.".to_string(),
            ));
        }

        tokio::time::sleep(std::time::Duration::from_millis(100 * (2_u64.pow(attempts)))).await;
        current_request_items = unprocessed;
    }

    Ok(accumulated_responses)
}
