//! # In-Memory Backend
//!
//! An in-process table store with the chunked read semantics of the real
//! service:
//!
//! - Items iterate in primary-key order
//! - `limit` counts items *evaluated*, before the filter is applied, so a
//!   chunk may come back empty while still carrying a cursor
//! - A cursor is returned whenever the limit was reached, even when no
//!   further items exist
//! - Start keys are exclusive
//!
//! Used for tests and for running the admin API without a table store.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde::Deserialize;

use crate::table::{KeyElement, KeySchema, ScalarType, TableDescription};
use crate::value::{item_from_json, AttributeValue, Decimal, Item};

use super::{
    Backend, BackendError, BackendResult, BatchWriteOutcome, BoxFuture, Chunk, ChunkRequest,
    MAX_BATCH_WRITE_ITEMS,
};

/// In-memory table store
#[derive(Debug)]
pub struct MemoryBackend {
    tables: RwLock<BTreeMap<String, MemoryTable>>,
    chunk_calls: AtomicUsize,
    fault: Mutex<Option<Fault>>,
    latency: Option<Duration>,
}

/// One table of a seed document
#[derive(Debug, Deserialize)]
struct SeedTable {
    name: String,
    hash_key: SeedKey,
    #[serde(default)]
    range_key: Option<SeedKey>,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SeedKey {
    name: String,
    #[serde(rename = "type")]
    attribute_type: ScalarType,
}

/// Injected failure for the `on_call`-th chunk read (1-based)
#[derive(Debug)]
struct Fault {
    on_call: usize,
    error: BackendError,
}

#[derive(Debug)]
struct MemoryTable {
    description: TableDescription,
    items: BTreeMap<PrimaryKey, Item>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct PrimaryKey {
    hash: KeyPart,
    range: Option<KeyPart>,
}

#[derive(Debug, Clone)]
enum KeyPart {
    Number(Decimal),
    String(String),
    Binary(Vec<u8>),
}

impl KeyPart {
    fn rank(&self) -> u8 {
        match self {
            KeyPart::Number(_) => 0,
            KeyPart::String(_) => 1,
            KeyPart::Binary(_) => 2,
        }
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Number(a), KeyPart::Number(b)) => a.cmp(b),
            (KeyPart::String(a), KeyPart::String(b)) => a.cmp(b),
            (KeyPart::Binary(a), KeyPart::Binary(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

impl MemoryTable {
    fn schema(&self) -> &KeySchema {
        &self.description.key_schema
    }

    /// Primary key of a full item or of a key map
    fn key_of(&self, item: &Item) -> BackendResult<PrimaryKey> {
        let schema = self.schema();
        Ok(PrimaryKey {
            hash: key_part(schema.hash(), item)?,
            range: schema.range().map(|r| key_part(r, item)).transpose()?,
        })
    }

    /// Like `key_of`, but the map must hold nothing except the key attributes
    fn exact_key_of(&self, key: &Item) -> BackendResult<PrimaryKey> {
        let expected = self.schema().elements().count();
        if key.len() != expected || key.keys().any(|name| !self.schema().contains(name)) {
            return Err(BackendError::Validation(
                "The provided key element does not match the schema".to_string(),
            ));
        }
        self.key_of(key)
    }

    fn project_key(&self, item: &Item) -> Item {
        self.schema()
            .elements()
            .filter_map(|e| item.get(&e.name).map(|v| (e.name.clone(), v.clone())))
            .collect()
    }

    fn lower_bound(&self, start: Option<&Item>) -> BackendResult<Bound<PrimaryKey>> {
        match start {
            Some(key) => Ok(Bound::Excluded(self.key_of(key)?)),
            None => Ok(Bound::Unbounded),
        }
    }

    /// Evaluate up to `request.limit` candidates and keep those that pass
    /// the filter.
    fn evaluate<'a>(&self, candidates: impl Iterator<Item = &'a Item>, request: &ChunkRequest) -> Chunk {
        let mut items = Vec::new();
        let mut evaluated = 0;
        let mut last = None;

        for item in candidates {
            evaluated += 1;
            if request.filter.matches_filter(item) {
                items.push(item.clone());
            }
            last = Some(item);
            if evaluated == request.limit {
                break;
            }
        }

        let last_evaluated_key = if evaluated == request.limit {
            last.map(|item| self.project_key(item))
        } else {
            None
        };

        Chunk {
            items,
            last_evaluated_key,
        }
    }
}

fn key_part(element: &KeyElement, item: &Item) -> BackendResult<KeyPart> {
    let value = item.get(&element.name).ok_or_else(|| {
        BackendError::Validation(format!(
            "One or more parameter values were invalid: Missing the key {} in the item",
            element.name
        ))
    })?;

    match (element.attribute_type, value) {
        (ScalarType::String, AttributeValue::S(s)) if s.is_empty() => Err(BackendError::Validation(format!(
            "One or more parameter values are not valid. The AttributeValue for a key attribute cannot contain an empty string value. Key: {}",
            element.name
        ))),
        (ScalarType::String, AttributeValue::S(s)) => Ok(KeyPart::String(s.clone())),
        (ScalarType::Number, AttributeValue::N(n)) => Decimal::parse(n).map(KeyPart::Number).ok_or_else(|| {
            BackendError::Validation(format!("The parameter cannot be converted to a numeric value: {}", n))
        }),
        (ScalarType::Binary, AttributeValue::B(b)) => Ok(KeyPart::Binary(b.clone())),
        (expected, actual) => Err(BackendError::Validation(format!(
            "One or more parameter values were invalid: Type mismatch for key {} expected: {} actual: {}",
            element.name,
            expected,
            actual.type_tag()
        ))),
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            chunk_calls: AtomicUsize::new(0),
            fault: Mutex::new(None),
            latency: None,
        }
    }

    /// Builder form of [`create_table`](Self::create_table); replaces an
    /// existing table of the same name.
    pub fn with_table(self, description: TableDescription) -> Self {
        if let Ok(mut tables) = self.tables.write() {
            tables.insert(
                description.name.clone(),
                MemoryTable {
                    description,
                    items: BTreeMap::new(),
                },
            );
        }
        self
    }

    /// Delay every chunk read by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn create_table(&self, description: TableDescription) -> BackendResult<()> {
        let mut tables = self.write_tables()?;
        if tables.contains_key(&description.name) {
            return Err(BackendError::Validation(format!(
                "Table already exists: {}",
                description.name
            )));
        }
        tables.insert(
            description.name.clone(),
            MemoryTable {
                description,
                items: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Build a store from a JSON seed document.
    ///
    /// The document is an array of tables, each with a `name`, a
    /// `hash_key` and optional `range_key` (`{"name", "type"}` with type
    /// `S`, `N` or `B`) and an optional `items` array of plain JSON objects.
    pub fn from_seed_json(text: &str) -> BackendResult<Self> {
        let tables: Vec<SeedTable> = serde_json::from_str(text)
            .map_err(|e| BackendError::Validation(format!("Invalid seed document: {}", e)))?;

        let backend = Self::new();
        for table in tables {
            let hash = table.hash_key;
            let schema = match table.range_key {
                Some(range) => KeySchema::composite(
                    hash.name,
                    hash.attribute_type,
                    range.name,
                    range.attribute_type,
                ),
                None => KeySchema::hash_only(hash.name, hash.attribute_type),
            };
            backend.create_table(TableDescription::new(table.name.clone(), schema))?;

            let items = table
                .items
                .iter()
                .map(item_from_json)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| BackendError::Validation(format!("{}: {}", table.name, e)))?;
            backend.insert_items(&table.name, items)?;
        }
        Ok(backend)
    }

    /// Insert items directly, bypassing the batch size limit
    pub fn insert_items(&self, table: &str, items: impl IntoIterator<Item = Item>) -> BackendResult<()> {
        let mut tables = self.write_tables()?;
        let table = tables
            .get_mut(table)
            .ok_or_else(|| BackendError::TableNotFound(table.to_string()))?;
        for item in items {
            let key = table.key_of(&item)?;
            table.items.insert(key, item);
        }
        Ok(())
    }

    /// Number of items stored in `table`
    pub fn item_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .ok()
            .and_then(|tables| tables.get(table).map(|t| t.items.len()))
            .unwrap_or(0)
    }

    /// Number of scan/query chunk reads issued so far
    pub fn chunk_calls(&self) -> usize {
        self.chunk_calls.load(AtomicOrdering::SeqCst)
    }

    /// Make the `on_call`-th chunk read (1-based, counted from backend
    /// creation) fail with `error`.
    pub fn fail_on_call(&self, on_call: usize, error: BackendError) {
        if let Ok(mut fault) = self.fault.lock() {
            *fault = Some(Fault { on_call, error });
        }
    }

    fn read_tables(&self) -> BackendResult<RwLockReadGuard<'_, BTreeMap<String, MemoryTable>>> {
        self.tables
            .read()
            .map_err(|_| BackendError::Service("Lock poisoned".to_string()))
    }

    fn write_tables(&self) -> BackendResult<RwLockWriteGuard<'_, BTreeMap<String, MemoryTable>>> {
        self.tables
            .write()
            .map_err(|_| BackendError::Service("Lock poisoned".to_string()))
    }

    /// Count the chunk read and apply any injected fault
    fn begin_chunk_call(&self) -> BackendResult<()> {
        let call = self.chunk_calls.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let fault = self
            .fault
            .lock()
            .map_err(|_| BackendError::Service("Lock poisoned".to_string()))?;
        match fault.as_ref() {
            Some(fault) if fault.on_call == call => Err(fault.error.clone()),
            _ => Ok(()),
        }
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn scan_now(&self, request: &ChunkRequest) -> BackendResult<Chunk> {
        self.begin_chunk_call()?;
        validate_limit(request)?;

        let tables = self.read_tables()?;
        let table = tables
            .get(&request.table_name)
            .ok_or_else(|| BackendError::TableNotFound(request.table_name.clone()))?;

        let lower = table.lower_bound(request.exclusive_start_key.as_ref())?;
        let candidates = table
            .items
            .range((lower, Bound::Unbounded))
            .map(|(_, item)| item);
        Ok(table.evaluate(candidates, request))
    }

    fn query_now(&self, request: &ChunkRequest) -> BackendResult<Chunk> {
        self.begin_chunk_call()?;
        validate_limit(request)?;

        let tables = self.read_tables()?;
        let table = tables
            .get(&request.table_name)
            .ok_or_else(|| BackendError::TableNotFound(request.table_name.clone()))?;

        let schema = table.schema();
        if request.filter.key_condition_value(&schema.hash().name).is_none() {
            return Err(BackendError::Validation(format!(
                "Query condition missed key schema element: {}",
                schema.hash().name
            )));
        }
        for clause in &request.filter.key_condition {
            match request.filter.resolve(clause) {
                Some((name, _)) if schema.contains(name) => {}
                _ => {
                    return Err(BackendError::Validation(
                        "Query key condition not supported".to_string(),
                    ))
                }
            }
        }

        let lower = table.lower_bound(request.exclusive_start_key.as_ref())?;
        let candidates = table
            .items
            .range((lower, Bound::Unbounded))
            .map(|(_, item)| item)
            .filter(|item| request.filter.matches_key_condition(item));
        Ok(table.evaluate(candidates, request))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_limit(request: &ChunkRequest) -> BackendResult<()> {
    if request.limit == 0 {
        return Err(BackendError::Validation(
            "Limit must be greater than or equal to 1".to_string(),
        ));
    }
    Ok(())
}

impl Backend for MemoryBackend {
    fn list_tables(&self) -> BoxFuture<'_, BackendResult<Vec<String>>> {
        Box::pin(async move { Ok(self.read_tables()?.keys().cloned().collect()) })
    }

    fn describe_table<'a>(&'a self, table: &'a str) -> BoxFuture<'a, BackendResult<TableDescription>> {
        Box::pin(async move {
            let tables = self.read_tables()?;
            let entry = tables
                .get(table)
                .ok_or_else(|| BackendError::TableNotFound(table.to_string()))?;
            let mut description = entry.description.clone();
            description.item_count = Some(entry.items.len() as u64);
            description.status = Some("ACTIVE".to_string());
            Ok(description)
        })
    }

    fn scan_chunk<'a>(&'a self, request: &'a ChunkRequest) -> BoxFuture<'a, BackendResult<Chunk>> {
        Box::pin(async move {
            self.pause().await;
            self.scan_now(request)
        })
    }

    fn query_chunk<'a>(&'a self, request: &'a ChunkRequest) -> BoxFuture<'a, BackendResult<Chunk>> {
        Box::pin(async move {
            self.pause().await;
            self.query_now(request)
        })
    }

    fn get_item<'a>(&'a self, table: &'a str, key: &'a Item) -> BoxFuture<'a, BackendResult<Option<Item>>> {
        Box::pin(async move {
            let tables = self.read_tables()?;
            let table = tables
                .get(table)
                .ok_or_else(|| BackendError::TableNotFound(table.to_string()))?;
            let key = table.exact_key_of(key)?;
            Ok(table.items.get(&key).cloned())
        })
    }

    fn put_item<'a>(&'a self, table: &'a str, item: Item) -> BoxFuture<'a, BackendResult<()>> {
        Box::pin(async move { self.insert_items(table, std::iter::once(item)) })
    }

    fn delete_item<'a>(&'a self, table: &'a str, key: &'a Item) -> BoxFuture<'a, BackendResult<()>> {
        Box::pin(async move {
            let mut tables = self.write_tables()?;
            let table = tables
                .get_mut(table)
                .ok_or_else(|| BackendError::TableNotFound(table.to_string()))?;
            let key = table.exact_key_of(key)?;
            table.items.remove(&key);
            Ok(())
        })
    }

    fn batch_write<'a>(
        &'a self,
        table: &'a str,
        items: Vec<Item>,
    ) -> BoxFuture<'a, BackendResult<BatchWriteOutcome>> {
        Box::pin(async move {
            if items.is_empty() || items.len() > MAX_BATCH_WRITE_ITEMS {
                return Err(BackendError::Validation(format!(
                    "Batch write must contain between 1 and {} put requests, got {}",
                    MAX_BATCH_WRITE_ITEMS,
                    items.len()
                )));
            }

            let mut tables = self.write_tables()?;
            let table = tables
                .get_mut(table)
                .ok_or_else(|| BackendError::TableNotFound(table.to_string()))?;

            // Validate every key before writing anything
            let keyed = items
                .into_iter()
                .map(|item| table.key_of(&item).map(|key| (key, item)))
                .collect::<BackendResult<Vec<_>>>()?;

            let written = keyed.len();
            table.items.extend(keyed);
            Ok(BatchWriteOutcome {
                written,
                unprocessed: 0,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FilterParams;

    fn orders_table() -> TableDescription {
        TableDescription::new(
            "orders",
            KeySchema::composite("customer", ScalarType::String, "seq", ScalarType::Number),
        )
    }

    fn order(customer: &str, seq: i64, status: &str) -> Item {
        let mut item = Item::new();
        item.insert("customer".into(), AttributeValue::from(customer));
        item.insert("seq".into(), AttributeValue::from(seq));
        item.insert("status".into(), AttributeValue::from(status));
        item
    }

    fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::new().with_table(orders_table());
        backend
            .insert_items(
                "orders",
                vec![
                    order("alice", 2, "open"),
                    order("alice", 10, "closed"),
                    order("alice", 1, "open"),
                    order("bob", 1, "open"),
                ],
            )
            .unwrap();
        backend
    }

    fn seqs(chunk: &Chunk) -> Vec<String> {
        chunk
            .items
            .iter()
            .map(|i| format!("{}/{}", i["customer"].as_s().unwrap(), i["seq"].as_n().unwrap()))
            .collect()
    }

    #[tokio::test]
    async fn test_scan_orders_by_key() {
        let backend = seeded();
        let request = ChunkRequest::new("orders", 10);
        let chunk = backend.scan_chunk(&request).await.unwrap();

        // Numeric range keys order by value, not text
        assert_eq!(seqs(&chunk), vec!["alice/1", "alice/2", "alice/10", "bob/1"]);
        assert!(chunk.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn test_limit_hit_returns_cursor_even_at_end() {
        let backend = seeded();
        let request = ChunkRequest::new("orders", 4);
        let chunk = backend.scan_chunk(&request).await.unwrap();
        assert_eq!(chunk.items.len(), 4);

        let cursor = chunk.last_evaluated_key.unwrap();
        assert_eq!(cursor.len(), 2);
        assert_eq!(cursor["customer"], AttributeValue::from("bob"));

        let mut next = ChunkRequest::new("orders", 4);
        next.exclusive_start_key = Some(cursor);
        let chunk = backend.scan_chunk(&next).await.unwrap();
        assert!(chunk.items.is_empty());
        assert!(chunk.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn test_limit_counts_items_before_filter() {
        let backend = seeded();
        let mut request = ChunkRequest::new("orders", 3);
        request.filter.push_filter("status", AttributeValue::from("closed"));

        let chunk = backend.scan_chunk(&request).await.unwrap();
        assert_eq!(seqs(&chunk), vec!["alice/10"]);
        assert!(chunk.last_evaluated_key.is_some());
    }

    #[tokio::test]
    async fn test_query_requires_hash_condition() {
        let backend = seeded();
        let request = ChunkRequest::new("orders", 10);
        let err = backend.query_chunk(&request).await.unwrap_err();
        assert!(matches!(err, BackendError::Validation(_)));
    }

    #[tokio::test]
    async fn test_query_by_hash_key() {
        let backend = seeded();
        let mut filter = FilterParams::new();
        filter.push_key_condition("customer", AttributeValue::from("alice"));
        filter.push_filter("status", AttributeValue::from("open"));

        let mut request = ChunkRequest::new("orders", 10);
        request.filter = filter;
        let chunk = backend.query_chunk(&request).await.unwrap();
        assert_eq!(seqs(&chunk), vec!["alice/1", "alice/2"]);
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let backend = seeded();
        backend.fail_on_call(2, BackendError::Throttled("slow down".into()));

        let request = ChunkRequest::new("orders", 1);
        assert!(backend.scan_chunk(&request).await.is_ok());
        let err = backend.scan_chunk(&request).await.unwrap_err();
        assert_eq!(err, BackendError::Throttled("slow down".into()));
        assert!(backend.scan_chunk(&request).await.is_ok());
        assert_eq!(backend.chunk_calls(), 3);
    }

    #[tokio::test]
    async fn test_item_operations() {
        let backend = seeded();

        let mut key = Item::new();
        key.insert("customer".into(), AttributeValue::from("bob"));
        key.insert("seq".into(), AttributeValue::from(1i64));

        let item = backend.get_item("orders", &key).await.unwrap().unwrap();
        assert_eq!(item["status"], AttributeValue::from("open"));

        backend.delete_item("orders", &key).await.unwrap();
        assert!(backend.get_item("orders", &key).await.unwrap().is_none());
        assert_eq!(backend.item_count("orders"), 3);
    }

    #[tokio::test]
    async fn test_key_validation_on_write() {
        let backend = seeded();
        let mut item = Item::new();
        item.insert("customer".into(), AttributeValue::from("carol"));
        item.insert("seq".into(), AttributeValue::from("not-a-number"));

        let err = backend.put_item("orders", item).await.unwrap_err();
        assert!(matches!(err, BackendError::Validation(_)));
    }

    #[tokio::test]
    async fn test_batch_write_limit() {
        let backend = seeded();
        let items: Vec<Item> = (0..26).map(|i| order("dave", i, "open")).collect();
        let err = backend.batch_write("orders", items).await.unwrap_err();
        assert!(matches!(err, BackendError::Validation(_)));

        let items: Vec<Item> = (0..25).map(|i| order("dave", i, "open")).collect();
        let outcome = backend.batch_write("orders", items).await.unwrap();
        assert_eq!(outcome.written, 25);
        assert_eq!(backend.item_count("orders"), 29);
    }

    fn ids_table() -> MemoryBackend {
        MemoryBackend::new().with_table(TableDescription::new(
            "ids",
            KeySchema::hash_only("id", ScalarType::Number),
        ))
    }

    fn id_item(id: &str, tag: &str) -> Item {
        let mut item = Item::new();
        item.insert("id".into(), AttributeValue::N(id.to_string()));
        item.insert("tag".into(), AttributeValue::from(tag));
        item
    }

    #[tokio::test]
    async fn test_large_numeric_keys_stay_distinct() {
        let backend = ids_table();
        backend
            .insert_items(
                "ids",
                vec![
                    id_item("9007199254740993", "odd"),
                    id_item("9007199254740992", "even"),
                ],
            )
            .unwrap();
        assert_eq!(backend.item_count("ids"), 2);

        let key: Item = [("id".to_string(), AttributeValue::N("9007199254740993".into()))]
            .into_iter()
            .collect();
        let item = backend.get_item("ids", &key).await.unwrap().unwrap();
        assert_eq!(item["tag"], AttributeValue::from("odd"));

        let first = backend.scan_chunk(&ChunkRequest::new("ids", 1)).await.unwrap();
        assert_eq!(first.items[0]["tag"], AttributeValue::from("even"));
        let mut next = ChunkRequest::new("ids", 1);
        next.exclusive_start_key = first.last_evaluated_key;
        let second = backend.scan_chunk(&next).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0]["tag"], AttributeValue::from("odd"));
    }

    #[tokio::test]
    async fn test_equal_numbers_share_one_key() {
        let backend = ids_table();
        backend
            .insert_items("ids", vec![id_item("0", "zero"), id_item("-0", "negative zero")])
            .unwrap();
        backend
            .insert_items("ids", vec![id_item("100", "hundred"), id_item("1e2", "exponent")])
            .unwrap();
        assert_eq!(backend.item_count("ids"), 2);
    }

    #[tokio::test]
    async fn test_seed_document_creates_tables() {
        let seed = r#"[
            {
                "name": "orders",
                "hash_key": {"name": "customer", "type": "S"},
                "range_key": {"name": "seq", "type": "N"},
                "items": [
                    {"customer": "ann", "seq": 2, "status": "open"},
                    {"customer": "ann", "seq": 1}
                ]
            },
            {"name": "empty", "hash_key": {"name": "id", "type": "N"}}
        ]"#;
        let backend = MemoryBackend::from_seed_json(seed).unwrap();

        assert_eq!(backend.item_count("orders"), 2);
        assert_eq!(backend.item_count("empty"), 0);
        let description = backend.describe_table("orders").await.unwrap();
        assert_eq!(description.key_schema, orders_table().key_schema);

        let chunk = backend.scan_chunk(&ChunkRequest::new("orders", 10)).await.unwrap();
        assert_eq!(seqs(&chunk), vec!["ann/1", "ann/2"]);
    }

    #[test]
    fn test_bad_seed_documents_rejected() {
        let cases = [
            "not json",
            r#"[{"name": "t", "hash_key": {"name": "id", "type": "X"}}]"#,
            r#"[{"name": "t", "hash_key": {"name": "id", "type": "N"}, "items": [3]}]"#,
            r#"[{"name": "t", "hash_key": {"name": "id", "type": "N"}, "items": [{"id": "x"}]}]"#,
            r#"[{"name": "t", "hash_key": {"name": "id", "type": "N"}},
                {"name": "t", "hash_key": {"name": "id", "type": "N"}}]"#,
        ];
        for seed in cases {
            let err = MemoryBackend::from_seed_json(seed).err();
            assert!(matches!(err, Some(BackendError::Validation(_))), "seed {:?}", seed);
        }
    }

    #[tokio::test]
    async fn test_missing_table() {
        let backend = MemoryBackend::new();
        let err = backend.describe_table("nope").await.unwrap_err();
        assert_eq!(err, BackendError::TableNotFound("nope".into()));
    }
}
