//! # Paginator
//!
//! Assembles exactly one fixed-size page from the chunked scanner.
//!
//! The stop predicate counts records and stops once `page_size + 1` have
//! been seen. The extra record only proves that more data exists; it and any
//! other surplus from the final chunk are dropped. The continuation token is
//! the key of the last record on the page, used as an exclusive cursor, so
//! the next page resumes exactly at the first dropped record.

use std::sync::Arc;

use crate::backend::{Backend, FilterParams, ReadOperation};
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::table::{KeySchema, TableDescription};
use crate::value::Item;

use super::errors::{PageError, PageResult};
use super::filter::{FilterExpressionBuilder, FilterSpec};
use super::key_codec::{KeyCodec, KeyToken};
use super::key_extractor::KeyExtractor;
use super::scanner::{ChunkedScanner, ScanControl, ScanRequest};

/// Records per page unless the caller asks otherwise
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// One page request
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub table_name: String,
    pub operation: ReadOperation,
    pub key_schema: KeySchema,
    pub filter: FilterParams,
    pub page_size: usize,
    /// `None` or an empty token starts at the beginning of the table
    pub start_token: Option<KeyToken>,
}

impl PageRequest {
    /// Unfiltered scan of `table_name` from the start
    pub fn new(table_name: impl Into<String>, key_schema: KeySchema) -> Self {
        Self {
            table_name: table_name.into(),
            operation: ReadOperation::Scan,
            key_schema,
            filter: FilterParams::default(),
            page_size: DEFAULT_PAGE_SIZE,
            start_token: None,
        }
    }

    pub fn with_operation(mut self, operation: ReadOperation) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_filter(mut self, filter: FilterParams) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_start_token(mut self, start_token: Option<KeyToken>) -> Self {
        self.start_token = start_token;
        self
    }
}

/// A page of records in backend iteration order
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    /// Key of the last record on the page when more records follow
    pub next_key: Option<Item>,
    /// `next_key` as a token; absent iff no further records exist
    pub next_token: Option<KeyToken>,
}

impl Page {
    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

/// Produces pages over a shared backend handle
#[derive(Clone)]
pub struct Paginator {
    scanner: ChunkedScanner,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Paginator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            scanner: ChunkedScanner::new(backend),
            metrics: None,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.scanner = self.scanner.with_chunk_size(chunk_size);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.scanner = self.scanner.with_metrics(Arc::clone(&metrics));
        self.metrics = Some(metrics);
        self
    }

    pub fn scanner(&self) -> &ChunkedScanner {
        &self.scanner
    }

    /// Fetch one page.
    pub async fn get_page(&self, request: &PageRequest) -> PageResult<Page> {
        self.get_page_with(request, &ScanControl::default()).await
    }

    /// Fetch one page under caller cancellation and deadline.
    pub async fn get_page_with(&self, request: &PageRequest, control: &ScanControl) -> PageResult<Page> {
        let page_size = request.page_size;
        if page_size < 1 {
            return Err(PageError::InvalidPageSize(page_size));
        }

        let schema = &request.key_schema;
        let start_key = match &request.start_token {
            Some(token) if !token.as_str().is_empty() => Some(KeyCodec::decode_key(token, schema)?),
            _ => None,
        };

        let page_size_text = page_size.to_string();
        log_event(
            Event::PageBegin,
            &[
                ("table", request.table_name.as_str()),
                ("operation", request.operation.as_str()),
                ("page_size", page_size_text.as_str()),
                ("resumed", if start_key.is_some() { "true" } else { "false" }),
            ],
        );

        let scan_request = ScanRequest::new(request.table_name.clone(), request.operation)
            .with_params(request.filter.clone())
            .with_start_key(start_key);

        let lookahead = page_size.saturating_add(1);
        let mut seen = 0usize;
        let mut records = self
            .scanner
            .scan(&scan_request, control, |chunk, _| {
                seen += chunk.len();
                seen >= lookahead
            })
            .await?;

        records.truncate(lookahead);

        let mut next_key = None;
        let mut next_token = None;
        if records.len() > page_size {
            records.truncate(page_size);
            if let Some(last) = records.last() {
                let key = KeyExtractor::extract(last, schema)?;
                next_token = Some(KeyCodec::encode_key(&key, schema)?);
                next_key = Some(key);
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.increment_pages_served();
        }
        let count = records.len().to_string();
        log_event(
            Event::PageComplete,
            &[
                ("table", request.table_name.as_str()),
                ("records", count.as_str()),
                ("last", if next_token.is_none() { "true" } else { "false" }),
            ],
        );

        Ok(Page {
            items: records,
            next_key,
            next_token,
        })
    }

    /// Fetch one page of `table` by filter text: looks up the table's key
    /// schema, plans a scan or query, and coerces the filter values.
    pub async fn get_table_page(
        &self,
        table: &str,
        spec: &FilterSpec,
        page_size: usize,
        start_token: Option<KeyToken>,
        control: &ScanControl,
    ) -> PageResult<Page> {
        let description = self.scanner.backend().describe_table(table).await?;
        self.get_described_page(&description, spec, page_size, start_token, control)
            .await
    }

    /// [`Paginator::get_table_page`] for a table already described.
    pub async fn get_described_page(
        &self,
        description: &TableDescription,
        spec: &FilterSpec,
        page_size: usize,
        start_token: Option<KeyToken>,
        control: &ScanControl,
    ) -> PageResult<Page> {
        let plan = FilterExpressionBuilder::plan(
            spec,
            &description.attribute_definitions,
            &description.key_schema,
        )?;

        let request = PageRequest::new(description.name.clone(), description.key_schema.clone())
            .with_operation(plan.operation)
            .with_filter(plan.params)
            .with_page_size(page_size)
            .with_start_token(start_token);

        self.get_page_with(&request, control).await
    }
}
