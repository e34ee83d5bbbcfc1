//! # Table Store Backends
//!
//! The capabilities the pagination engine and the admin API consume from
//! the table store: schema lookup, bounded chunked reads, and single/bulk
//! item operations.
//!
//! A backend handle is constructed once at startup and shared by `Arc`.
//! Implementations must be safe for concurrent use by independent requests.

mod dynamo;
mod errors;
mod expression;
mod memory;

use std::future::Future;
use std::pin::Pin;

use tokio::time::Instant;

use crate::table::TableDescription;
use crate::value::Item;

pub use dynamo::{DynamoBackend, DynamoBackendConfig};
pub use errors::{BackendError, BackendResult};
pub use expression::{EqualityClause, FilterParams};
pub use memory::MemoryBackend;

/// Boxed future returned by backend calls
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Most put requests a single batch write may carry
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Which chunked read primitive to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOperation {
    /// Unconditional iteration over the whole table
    Scan,
    /// Iteration bounded by a key condition
    Query,
}

impl ReadOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadOperation::Scan => "scan",
            ReadOperation::Query => "query",
        }
    }
}

/// Parameters of one bounded read
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    pub table_name: String,
    /// Maximum number of items the backend evaluates for this chunk
    pub limit: usize,
    /// Resume strictly after this key
    pub exclusive_start_key: Option<Item>,
    pub filter: FilterParams,
    /// Caller deadline for this request
    pub deadline: Option<Instant>,
}

impl ChunkRequest {
    pub fn new(table_name: impl Into<String>, limit: usize) -> Self {
        Self {
            table_name: table_name.into(),
            limit,
            exclusive_start_key: None,
            filter: FilterParams::default(),
            deadline: None,
        }
    }
}

/// One bounded batch of records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    pub items: Vec<Item>,
    /// Cursor for the next request; `None` when the read is exhausted
    pub last_evaluated_key: Option<Item>,
}

/// Result of a batch write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchWriteOutcome {
    pub written: usize,
    pub unprocessed: usize,
}

/// Table store capabilities
pub trait Backend: Send + Sync {
    /// Names of all tables
    fn list_tables(&self) -> BoxFuture<'_, BackendResult<Vec<String>>>;

    /// Key schema and attribute definitions of `table`
    fn describe_table<'a>(&'a self, table: &'a str) -> BoxFuture<'a, BackendResult<TableDescription>>;

    /// One bounded scan
    fn scan_chunk<'a>(&'a self, request: &'a ChunkRequest) -> BoxFuture<'a, BackendResult<Chunk>>;

    /// One bounded query; the request's key condition must pin the hash key
    fn query_chunk<'a>(&'a self, request: &'a ChunkRequest) -> BoxFuture<'a, BackendResult<Chunk>>;

    fn get_item<'a>(&'a self, table: &'a str, key: &'a Item) -> BoxFuture<'a, BackendResult<Option<Item>>>;

    fn put_item<'a>(&'a self, table: &'a str, item: Item) -> BoxFuture<'a, BackendResult<()>>;

    fn delete_item<'a>(&'a self, table: &'a str, key: &'a Item) -> BoxFuture<'a, BackendResult<()>>;

    /// Put at most [`MAX_BATCH_WRITE_ITEMS`] items
    fn batch_write<'a>(
        &'a self,
        table: &'a str,
        items: Vec<Item>,
    ) -> BoxFuture<'a, BackendResult<BatchWriteOutcome>>;

    /// Dispatch to `scan_chunk` or `query_chunk`
    fn read_chunk<'a>(
        &'a self,
        operation: ReadOperation,
        request: &'a ChunkRequest,
    ) -> BoxFuture<'a, BackendResult<Chunk>> {
        match operation {
            ReadOperation::Scan => self.scan_chunk(request),
            ReadOperation::Query => self.query_chunk(request),
        }
    }
}
