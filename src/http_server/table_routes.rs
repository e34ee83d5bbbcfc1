//! Table HTTP Routes
//!
//! Table listing and metadata, paged browsing, and single/bulk item
//! operations. Items travel as plain JSON documents; every listed item
//! carries its key token under `__key`.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::backend::MAX_BATCH_WRITE_ITEMS;
use crate::observability::{log_event, Event};
use crate::pagination::{FilterSpec, KeyCodec, KeyExtractor, KeyToken};
use crate::table::{KeyElement, KeySchema, ScalarType, TableDescription};
use crate::value::{item_from_json, item_to_json, Item};

use super::errors::{ApiError, ApiResult};
use super::state::AdminState;

/// Attribute under which listed items carry their key token
pub const KEY_FIELD: &str = "__key";

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct TablesListResponse {
    pub tables: Vec<TableDescription>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub table: String,
    pub items: Vec<Value>,
    /// Pass back as `startKey` for the next page
    pub next_key: Option<KeyToken>,
    pub page_num: u32,
    pub page_size: usize,
    pub filters: FilterSpec,
}

#[derive(Debug, Deserialize)]
pub struct KeyLookup {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KeyLookupForm {
    pub table: String,
    pub hash_key: KeyElement,
    pub range_key: Option<KeyElement>,
}

#[derive(Debug, Serialize)]
pub struct ItemKeyResponse {
    pub key: Value,
    pub token: KeyToken,
}

#[derive(Debug, Serialize)]
pub struct BatchWriteResponse {
    pub written: usize,
    pub unprocessed: usize,
    pub batches: usize,
}

// ==================
// Table Routes
// ==================

/// Create table routes
pub fn table_routes(state: Arc<AdminState>) -> Router {
    Router::new()
        .route("/", get(list_tables))
        .route("/:table", get(table_page))
        .route("/:table/meta", get(table_meta))
        .route("/:table/get", get(find_item))
        .route("/:table/add-item", get(new_item_template).put(add_item))
        .route("/:table/batch-write", put(batch_write))
        .route(
            "/:table/items/:key",
            get(get_item).put(update_item).delete(delete_item),
        )
        .with_state(state)
}

async fn list_tables(State(state): State<Arc<AdminState>>) -> ApiResult<Json<TablesListResponse>> {
    let names = state.backend.list_tables().await?;
    let mut tables = Vec::with_capacity(names.len());
    for name in &names {
        tables.push(state.backend.describe_table(name).await?);
    }

    Ok(Json(TablesListResponse {
        total: tables.len(),
        tables,
    }))
}

async fn table_meta(
    State(state): State<Arc<AdminState>>,
    Path(table): Path<String>,
) -> ApiResult<Json<TableDescription>> {
    Ok(Json(state.backend.describe_table(&table).await?))
}

/// One page of a table.
///
/// `startKey`, `pageNum` and `pageSize` are reserved; every other non-empty
/// parameter is an equality filter.
async fn table_page(
    State(state): State<Arc<AdminState>>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<PageResponse>> {
    let mut filters = FilterSpec::new();
    let mut start_key = None;
    let mut page_num: u32 = 1;
    let mut page_size = state.page_size;

    for (name, value) in params {
        match name.as_str() {
            "startKey" => {
                if !value.is_empty() {
                    start_key = Some(KeyToken::from_raw(value));
                }
            }
            "pageNum" => page_num = parse_param("pageNum", &value)?,
            "pageSize" => page_size = parse_param("pageSize", &value)?,
            _ if value.is_empty() => {}
            _ => {
                filters.insert(name, value);
            }
        }
    }
    if page_num < 1 {
        return Err(ApiError::BadRequest("pageNum must be at least 1".to_string()));
    }

    let description = state.backend.describe_table(&table).await?;
    let page = state
        .paginator
        .get_described_page(
            &description,
            &filters,
            page_size,
            start_key,
            &state.scan_control(),
        )
        .await?;

    let items = page
        .items
        .iter()
        .map(|item| document_with_key(item, &description.key_schema))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(PageResponse {
        table,
        items,
        next_key: page.next_token,
        page_num,
        page_size,
        filters,
    }))
}

/// Redirect a hash/range lookup to the item URL, or describe the key
/// attributes when no hash value is given.
async fn find_item(
    State(state): State<Arc<AdminState>>,
    Path(table): Path<String>,
    Query(lookup): Query<KeyLookup>,
) -> ApiResult<Response> {
    let hash = lookup.hash.filter(|h| !h.is_empty());
    if let Some(hash) = hash {
        let range = lookup.range.filter(|r| !r.is_empty());
        let token = KeyCodec::encode_text(&hash, range.as_deref());
        let location = format!("/tables/{}/items/{}", table, token.to_path_segment());
        return Ok(Redirect::to(&location).into_response());
    }

    let description = state.backend.describe_table(&table).await?;
    let form = KeyLookupForm {
        table,
        hash_key: description.key_schema.hash().clone(),
        range_key: description.key_schema.range().cloned(),
    };
    Ok(Json(form).into_response())
}

/// Skeleton of a new item: key attributes only, `""` for strings, `0`
/// otherwise.
async fn new_item_template(
    State(state): State<Arc<AdminState>>,
    Path(table): Path<String>,
) -> ApiResult<Json<Value>> {
    let description = state.backend.describe_table(&table).await?;
    let template: Map<String, Value> = description
        .key_schema
        .elements()
        .map(|element| {
            let placeholder = match element.attribute_type {
                ScalarType::String => Value::String(String::new()),
                ScalarType::Number | ScalarType::Binary => Value::from(0),
            };
            (element.name.clone(), placeholder)
        })
        .collect();
    Ok(Json(Value::Object(template)))
}

async fn add_item(
    State(state): State<Arc<AdminState>>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<ItemKeyResponse>> {
    let description = state.backend.describe_table(&table).await?;
    let schema = &description.key_schema;
    let item = item_from_json(&body)?;
    let key = KeyExtractor::extract(&item, schema).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let token = KeyCodec::encode_key(&key, schema)?;

    state.backend.put_item(&table, item).await?;
    record_write(&state, &table, &token);

    if state.backend.get_item(&table, &key).await?.is_none() {
        return Err(ApiError::NotFound(format!("item {} not found after write", token)));
    }

    Ok(Json(ItemKeyResponse {
        key: item_to_json(&key),
        token,
    }))
}

/// Put one item or an array of items, in batches of at most
/// [`MAX_BATCH_WRITE_ITEMS`].
async fn batch_write(
    State(state): State<Arc<AdminState>>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<BatchWriteResponse>> {
    let items = match &body {
        Value::Array(documents) => documents
            .iter()
            .map(item_from_json)
            .collect::<Result<Vec<_>, _>>()?,
        document => vec![item_from_json(document)?],
    };
    if items.is_empty() {
        return Err(ApiError::BadRequest("no items to write".to_string()));
    }

    let mut response = BatchWriteResponse {
        written: 0,
        unprocessed: 0,
        batches: 0,
    };
    for batch in items.chunks(MAX_BATCH_WRITE_ITEMS) {
        let outcome = state.backend.batch_write(&table, batch.to_vec()).await?;
        response.written += outcome.written;
        response.unprocessed += outcome.unprocessed;
        response.batches += 1;
    }

    state.metrics.add_items_written(response.written as u64);
    let written = response.written.to_string();
    let unprocessed = response.unprocessed.to_string();
    log_event(
        Event::BatchWriteComplete,
        &[
            ("table", table.as_str()),
            ("written", written.as_str()),
            ("unprocessed", unprocessed.as_str()),
        ],
    );

    Ok(Json(response))
}

async fn get_item(
    State(state): State<Arc<AdminState>>,
    Path((table, key)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let description = state.backend.describe_table(&table).await?;
    let key = KeyCodec::decode_key(&KeyToken::from_raw(key), &description.key_schema)?;

    match state.backend.get_item(&table, &key).await? {
        Some(item) => Ok(Json(item_to_json(&item))),
        None => Err(ApiError::NotFound("item not found".to_string())),
    }
}

/// Put the body, then return the item stored under the URL's key
async fn update_item(
    State(state): State<Arc<AdminState>>,
    Path((table, key)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let description = state.backend.describe_table(&table).await?;
    let token = KeyToken::from_raw(key);
    let key = KeyCodec::decode_key(&token, &description.key_schema)?;
    let item = item_from_json(&body)?;

    state.backend.put_item(&table, item).await?;
    record_write(&state, &table, &token);

    match state.backend.get_item(&table, &key).await? {
        Some(item) => Ok(Json(item_to_json(&item))),
        None => Err(ApiError::NotFound("item not found".to_string())),
    }
}

async fn delete_item(
    State(state): State<Arc<AdminState>>,
    Path((table, key)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let description = state.backend.describe_table(&table).await?;
    let token = KeyToken::from_raw(key);
    let key = KeyCodec::decode_key(&token, &description.key_schema)?;

    state.backend.delete_item(&table, &key).await?;
    state.metrics.increment_items_deleted();
    log_event(
        Event::ItemDeleted,
        &[("table", table.as_str()), ("key", token.as_str())],
    );

    Ok(StatusCode::NO_CONTENT)
}

fn record_write(state: &AdminState, table: &str, token: &KeyToken) {
    state.metrics.add_items_written(1);
    log_event(Event::ItemWritten, &[("table", table), ("key", token.as_str())]);
}

fn parse_param<T: FromStr>(name: &str, value: &str) -> ApiResult<T> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {}: {:?}", name, value)))
}

/// JSON document of `item` with its key token added
fn document_with_key(item: &Item, schema: &KeySchema) -> ApiResult<Value> {
    let token = KeyCodec::encode_key(item, schema)?;
    let mut document = item_to_json(item);
    if let Value::Object(map) = &mut document {
        map.insert(KEY_FIELD.to_string(), Value::String(token.into_string()));
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AttributeValue;

    #[test]
    fn test_document_with_key() {
        let schema = KeySchema::composite("pk", ScalarType::String, "sk", ScalarType::Number);
        let mut item = Item::new();
        item.insert("pk".into(), AttributeValue::from("a,b"));
        item.insert("sk".into(), AttributeValue::from(3i64));
        item.insert("name".into(), AttributeValue::from("x"));

        let document = document_with_key(&item, &schema).unwrap();
        assert_eq!(document[KEY_FIELD], "a%2Cb,3");
        assert_eq!(document["name"], "x");
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param::<usize>("pageSize", "10").unwrap(), 10);
        let err = parse_param::<usize>("pageSize", "ten").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
