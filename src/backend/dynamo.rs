//! # DynamoDB Backend
//!
//! Backend over the `aws-sdk-dynamodb` client. The client is built once from
//! explicit endpoint, region and static credentials, so the admin tool talks
//! to local table stores without any ambient AWS configuration.

use std::collections::HashMap;

use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{AttributeValue as SdkValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use serde::{Deserialize, Serialize};

use crate::table::{AttributeDefinition, KeyRole, KeySchema, ScalarType, SchemaError, TableDescription};
use crate::value::{AttributeValue, Item};

use super::{
    Backend, BackendError, BackendResult, BatchWriteOutcome, BoxFuture, Chunk, ChunkRequest,
    FilterParams,
};

/// Connection settings for the table store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamoBackendConfig {
    /// Endpoint URL (default: "http://localhost:8000")
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Signing region (default: "us-east-1")
    #[serde(default = "default_region")]
    pub region: String,

    /// Local table stores accept any key pair
    #[serde(default = "default_access_key_id")]
    pub access_key_id: String,

    #[serde(default = "default_secret_access_key")]
    pub secret_access_key: String,
}

fn default_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_access_key_id() -> String {
    "key".to_string()
}

fn default_secret_access_key() -> String {
    "secret".to_string()
}

impl Default for DynamoBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            region: default_region(),
            access_key_id: default_access_key_id(),
            secret_access_key: default_secret_access_key(),
        }
    }
}

/// Backend over a DynamoDB-compatible endpoint
#[derive(Debug, Clone)]
pub struct DynamoBackend {
    client: Client,
}

impl DynamoBackend {
    /// Build the client. No request is sent until the first call.
    pub fn new(config: &DynamoBackendConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "dynamo-admin",
        );
        let sdk_config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint.clone())
            .credentials_provider(credentials)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
        }
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Backend for DynamoBackend {
    fn list_tables(&self) -> BoxFuture<'_, BackendResult<Vec<String>>> {
        Box::pin(async move {
            let mut names = Vec::new();
            let mut start: Option<String> = None;
            loop {
                let output = self
                    .client
                    .list_tables()
                    .set_exclusive_start_table_name(start.take())
                    .send()
                    .await
                    .map_err(map_sdk_error)?;
                names.extend(output.table_names.unwrap_or_default());
                match output.last_evaluated_table_name {
                    Some(last) => start = Some(last),
                    None => break,
                }
            }
            Ok(names)
        })
    }

    fn describe_table<'a>(&'a self, table: &'a str) -> BoxFuture<'a, BackendResult<TableDescription>> {
        Box::pin(async move {
            let output = self
                .client
                .describe_table()
                .table_name(table)
                .send()
                .await
                .map_err(map_sdk_error)?;
            let description = output
                .table
                .ok_or_else(|| BackendError::TableNotFound(table.to_string()))?;

            convert_description(table, description)
                .map_err(|e| BackendError::Service(format!("invalid table description: {}", e)))
        })
    }

    fn scan_chunk<'a>(&'a self, request: &'a ChunkRequest) -> BoxFuture<'a, BackendResult<Chunk>> {
        Box::pin(async move {
            let (names, values) = placeholder_maps(&request.filter);
            let output = self
                .client
                .scan()
                .table_name(&request.table_name)
                .limit(sdk_limit(request.limit))
                .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(to_sdk_item))
                .set_filter_expression(request.filter.filter_expression())
                .set_expression_attribute_names(names)
                .set_expression_attribute_values(values)
                .send()
                .await
                .map_err(map_sdk_error)?;

            Ok(Chunk {
                items: from_sdk_items(output.items.unwrap_or_default())?,
                last_evaluated_key: output.last_evaluated_key.map(from_sdk_item).transpose()?,
            })
        })
    }

    fn query_chunk<'a>(&'a self, request: &'a ChunkRequest) -> BoxFuture<'a, BackendResult<Chunk>> {
        Box::pin(async move {
            let (names, values) = placeholder_maps(&request.filter);
            let output = self
                .client
                .query()
                .table_name(&request.table_name)
                .limit(sdk_limit(request.limit))
                .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(to_sdk_item))
                .set_key_condition_expression(request.filter.key_condition_expression())
                .set_filter_expression(request.filter.filter_expression())
                .set_expression_attribute_names(names)
                .set_expression_attribute_values(values)
                .send()
                .await
                .map_err(map_sdk_error)?;

            Ok(Chunk {
                items: from_sdk_items(output.items.unwrap_or_default())?,
                last_evaluated_key: output.last_evaluated_key.map(from_sdk_item).transpose()?,
            })
        })
    }

    fn get_item<'a>(&'a self, table: &'a str, key: &'a Item) -> BoxFuture<'a, BackendResult<Option<Item>>> {
        Box::pin(async move {
            let output = self
                .client
                .get_item()
                .table_name(table)
                .set_key(Some(to_sdk_item(key)))
                .send()
                .await
                .map_err(map_sdk_error)?;
            output.item.map(from_sdk_item).transpose()
        })
    }

    fn put_item<'a>(&'a self, table: &'a str, item: Item) -> BoxFuture<'a, BackendResult<()>> {
        Box::pin(async move {
            self.client
                .put_item()
                .table_name(table)
                .set_item(Some(to_sdk_item(&item)))
                .send()
                .await
                .map_err(map_sdk_error)?;
            Ok(())
        })
    }

    fn delete_item<'a>(&'a self, table: &'a str, key: &'a Item) -> BoxFuture<'a, BackendResult<()>> {
        Box::pin(async move {
            self.client
                .delete_item()
                .table_name(table)
                .set_key(Some(to_sdk_item(key)))
                .send()
                .await
                .map_err(map_sdk_error)?;
            Ok(())
        })
    }

    fn batch_write<'a>(
        &'a self,
        table: &'a str,
        items: Vec<Item>,
    ) -> BoxFuture<'a, BackendResult<BatchWriteOutcome>> {
        Box::pin(async move {
            let requested = items.len();
            let requests = items
                .iter()
                .map(|item| {
                    PutRequest::builder()
                        .set_item(Some(to_sdk_item(item)))
                        .build()
                        .map(|put| WriteRequest::builder().put_request(put).build())
                        .map_err(|e| BackendError::Validation(e.to_string()))
                })
                .collect::<BackendResult<Vec<_>>>()?;

            let output = self
                .client
                .batch_write_item()
                .request_items(table, requests)
                .send()
                .await
                .map_err(map_sdk_error)?;

            let unprocessed = output
                .unprocessed_items
                .as_ref()
                .and_then(|pending| pending.get(table))
                .map_or(0, Vec::len);

            Ok(BatchWriteOutcome {
                written: requested - unprocessed,
                unprocessed,
            })
        })
    }
}

fn sdk_limit(limit: usize) -> i32 {
    i32::try_from(limit).unwrap_or(i32::MAX)
}

/// Placeholder maps, omitted entirely when empty (the service rejects
/// empty maps).
fn placeholder_maps(
    params: &FilterParams,
) -> (Option<HashMap<String, String>>, Option<HashMap<String, SdkValue>>) {
    if params.is_empty() {
        return (None, None);
    }
    let names = params
        .names
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let values = params
        .values
        .iter()
        .map(|(k, v)| (k.clone(), to_sdk(v)))
        .collect();
    (Some(names), Some(values))
}

fn convert_description(
    table: &str,
    description: aws_sdk_dynamodb::types::TableDescription,
) -> Result<TableDescription, SchemaError> {
    let definitions = description
        .attribute_definitions
        .unwrap_or_default()
        .into_iter()
        .map(|d| {
            Ok(AttributeDefinition::new(
                d.attribute_name,
                d.attribute_type.as_str().parse::<ScalarType>()?,
            ))
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;

    let elements = description
        .key_schema
        .unwrap_or_default()
        .into_iter()
        .map(|k| Ok((k.attribute_name, k.key_type.as_str().parse::<KeyRole>()?)))
        .collect::<Result<Vec<_>, SchemaError>>()?;

    let key_schema = KeySchema::from_description(&elements, &definitions)?;

    Ok(TableDescription {
        name: description.table_name.unwrap_or_else(|| table.to_string()),
        key_schema,
        attribute_definitions: definitions,
        item_count: description.item_count.and_then(|n| u64::try_from(n).ok()),
        status: description.table_status.map(|s| s.as_str().to_string()),
    })
}

fn map_sdk_error<E, R>(err: SdkError<E, R>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    if matches!(err, SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)) {
        return BackendError::Transport(DisplayErrorContext(&err).to_string());
    }

    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    match err.code() {
        Some("ResourceNotFoundException") => BackendError::TableNotFound(message),
        Some("ValidationException") => BackendError::Validation(message),
        Some("ProvisionedThroughputExceededException")
        | Some("ThrottlingException")
        | Some("RequestLimitExceeded") => BackendError::Throttled(message),
        _ => BackendError::Service(message),
    }
}

fn to_sdk(value: &AttributeValue) -> SdkValue {
    match value {
        AttributeValue::S(s) => SdkValue::S(s.clone()),
        AttributeValue::N(n) => SdkValue::N(n.clone()),
        AttributeValue::B(b) => SdkValue::B(Blob::new(b.clone())),
        AttributeValue::Bool(b) => SdkValue::Bool(*b),
        AttributeValue::Null => SdkValue::Null(true),
        AttributeValue::L(list) => SdkValue::L(list.iter().map(to_sdk).collect()),
        AttributeValue::M(map) => SdkValue::M(to_sdk_item(map)),
        AttributeValue::Ss(set) => SdkValue::Ss(set.clone()),
        AttributeValue::Ns(set) => SdkValue::Ns(set.clone()),
        AttributeValue::Bs(set) => SdkValue::Bs(set.iter().map(|b| Blob::new(b.clone())).collect()),
    }
}

fn to_sdk_item(item: &Item) -> HashMap<String, SdkValue> {
    item.iter().map(|(k, v)| (k.clone(), to_sdk(v))).collect()
}

fn from_sdk(value: SdkValue) -> BackendResult<AttributeValue> {
    Ok(match value {
        SdkValue::S(s) => AttributeValue::S(s),
        SdkValue::N(n) => AttributeValue::N(n),
        SdkValue::B(b) => AttributeValue::B(b.into_inner()),
        SdkValue::Bool(b) => AttributeValue::Bool(b),
        SdkValue::Null(_) => AttributeValue::Null,
        SdkValue::L(list) => AttributeValue::L(list.into_iter().map(from_sdk).collect::<BackendResult<_>>()?),
        SdkValue::M(map) => AttributeValue::M(from_sdk_item(map)?),
        SdkValue::Ss(set) => AttributeValue::Ss(set),
        SdkValue::Ns(set) => AttributeValue::Ns(set),
        SdkValue::Bs(set) => AttributeValue::Bs(set.into_iter().map(Blob::into_inner).collect()),
        other => {
            return Err(BackendError::Service(format!(
                "unsupported attribute value: {:?}",
                other
            )))
        }
    })
}

fn from_sdk_item(item: HashMap<String, SdkValue>) -> BackendResult<Item> {
    item.into_iter()
        .map(|(k, v)| from_sdk(v).map(|v| (k, v)))
        .collect()
}

fn from_sdk_items(items: Vec<HashMap<String, SdkValue>>) -> BackendResult<Vec<Item>> {
    items.into_iter().map(from_sdk_item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_local_endpoint() {
        let config = DynamoBackendConfig::default();
        assert_eq!(config.endpoint, "http://localhost:8000");
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_value_conversion_round_trip() {
        let mut nested = Item::new();
        nested.insert("flag".into(), AttributeValue::Bool(false));

        let mut item = Item::new();
        item.insert("id".into(), AttributeValue::from("a"));
        item.insert("n".into(), AttributeValue::N("1.5".into()));
        item.insert("raw".into(), AttributeValue::B(vec![0, 255]));
        item.insert("none".into(), AttributeValue::Null);
        item.insert(
            "list".into(),
            AttributeValue::L(vec![AttributeValue::from("x"), AttributeValue::M(nested)]),
        );
        item.insert("tags".into(), AttributeValue::Ss(vec!["t1".into(), "t2".into()]));

        let back = from_sdk_item(to_sdk_item(&item)).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_placeholder_maps_omitted_when_empty() {
        let (names, values) = placeholder_maps(&FilterParams::new());
        assert!(names.is_none());
        assert!(values.is_none());

        let mut params = FilterParams::new();
        params.push_filter("age", AttributeValue::N("42".into()));
        let (names, values) = placeholder_maps(&params);
        assert_eq!(names.unwrap()["#f0"], "age");
        assert_eq!(values.unwrap()[":f0"], SdkValue::N("42".into()));
    }

    #[test]
    fn test_client_builds_without_network() {
        let _backend = DynamoBackend::new(&DynamoBackendConfig::default());
    }
}
