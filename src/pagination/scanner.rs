//! # Chunked Scanner
//!
//! Drives bounded scan/query calls against a [`Backend`], following the
//! continuation cursor of each chunk. Calls are strictly sequential: a
//! cursor is only valid relative to the chunk that produced it.
//!
//! Two shapes are offered:
//!
//! - [`ChunkStream`]: a lazy, finite, restartable sequence of chunks the
//!   caller pulls from and may abandon at any point.
//! - [`ChunkedScanner::scan`]: an accumulating loop over the stream that
//!   stops when a caller predicate fires or the backend is exhausted.
//!
//! Cancellation is checked before each backend call and raced against the
//! call in flight. A caller deadline is carried on every chunk request.

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::backend::{Backend, BackendResult, BoxFuture, Chunk, ChunkRequest, FilterParams, ReadOperation};
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::value::Item;

use super::errors::{PageError, PageResult};

/// Items requested per backend call unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Caller controls for one scan: cancellation and deadline
#[derive(Debug, Clone, Default)]
pub struct ScanControl {
    cancellation: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl ScanControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map_or(false, CancellationToken::is_cancelled)
    }
}

/// What to read
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub table_name: String,
    pub operation: ReadOperation,
    pub params: FilterParams,
    /// Resume strictly after this key; `None` starts at the beginning
    pub start_key: Option<Item>,
}

impl ScanRequest {
    pub fn new(table_name: impl Into<String>, operation: ReadOperation) -> Self {
        Self {
            table_name: table_name.into(),
            operation,
            params: FilterParams::default(),
            start_key: None,
        }
    }

    pub fn with_params(mut self, params: FilterParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_start_key(mut self, start_key: Option<Item>) -> Self {
        self.start_key = start_key;
        self
    }
}

/// Sequential chunk reader over a shared backend handle
#[derive(Clone)]
pub struct ChunkedScanner {
    backend: Arc<dyn Backend>,
    chunk_size: usize,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl ChunkedScanner {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            chunk_size: DEFAULT_CHUNK_SIZE,
            metrics: None,
        }
    }

    /// Set the per-call item limit. Zero is raised to one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Lazy chunk sequence for `request`, starting at its start key.
    pub fn stream<'a>(&'a self, request: &'a ScanRequest, control: &'a ScanControl) -> ChunkStream<'a> {
        ChunkStream {
            scanner: self,
            request,
            control,
            cursor: request.start_key.clone(),
            exhausted: false,
        }
    }

    /// Accumulate chunks until `stop` returns true or the backend is
    /// exhausted.
    ///
    /// `stop` sees each chunk's records and its continuation cursor. On any
    /// error the accumulated records are dropped.
    pub async fn scan<F>(&self, request: &ScanRequest, control: &ScanControl, mut stop: F) -> PageResult<Vec<Item>>
    where
        F: FnMut(&[Item], Option<&Item>) -> bool,
    {
        let mut stream = self.stream(request, control);
        let mut records = Vec::new();

        while let Some(chunk) = stream.next_chunk().await? {
            let done = stop(&chunk.items, chunk.last_evaluated_key.as_ref());
            records.extend(chunk.items);
            if done {
                break;
            }
        }

        Ok(records)
    }

    async fn await_chunk(
        &self,
        call: BoxFuture<'_, BackendResult<Chunk>>,
        control: &ScanControl,
    ) -> PageResult<Chunk> {
        let bounded = async {
            let result = match control.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                    Ok(result) => result,
                    Err(_) => return Err(PageError::DeadlineExceeded),
                },
                None => call.await,
            };
            result.map_err(PageError::from)
        };

        match &control.cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(PageError::Cancelled),
                    result = bounded => result,
                }
            }
            None => bounded.await,
        }
    }

    fn record_failure(&self, request: &ScanRequest, err: &PageError) {
        let table = request.table_name.as_str();
        match err {
            PageError::Cancelled | PageError::DeadlineExceeded => {
                if let Some(metrics) = &self.metrics {
                    metrics.increment_cancelled_scans();
                }
                log_event(Event::ScanCancelled, &[("table", table), ("reason", err.code())]);
            }
            PageError::BackendRequestFailed(cause) => {
                if let Some(metrics) = &self.metrics {
                    metrics.increment_backend_failures();
                }
                let message = cause.to_string();
                log_event(
                    Event::BackendRequestFailed,
                    &[
                        ("table", table),
                        ("code", cause.code()),
                        ("message", message.as_str()),
                    ],
                );
            }
            _ => {}
        }
    }
}

/// Lazy, finite, restartable sequence of chunks.
///
/// Once the backend reports no further cursor, or a call fails, the stream
/// yields `None` until restarted.
pub struct ChunkStream<'a> {
    scanner: &'a ChunkedScanner,
    request: &'a ScanRequest,
    control: &'a ScanControl,
    cursor: Option<Item>,
    exhausted: bool,
}

impl ChunkStream<'_> {
    /// Fetch the next chunk, or `None` when the read is exhausted.
    pub async fn next_chunk(&mut self) -> PageResult<Option<Chunk>> {
        if self.exhausted {
            return Ok(None);
        }

        match self.fetch().await {
            Ok(chunk) => {
                self.cursor = chunk.last_evaluated_key.clone();
                self.exhausted = self.cursor.is_none();
                Ok(Some(chunk))
            }
            Err(err) => {
                self.exhausted = true;
                self.scanner.record_failure(self.request, &err);
                Err(err)
            }
        }
    }

    async fn fetch(&self) -> PageResult<Chunk> {
        if self.control.is_cancelled() {
            return Err(PageError::Cancelled);
        }
        if let Some(deadline) = self.control.deadline {
            if deadline <= Instant::now() {
                return Err(PageError::DeadlineExceeded);
            }
        }

        let chunk_request = ChunkRequest {
            table_name: self.request.table_name.clone(),
            limit: self.scanner.chunk_size,
            exclusive_start_key: self.cursor.clone(),
            filter: self.request.params.clone(),
            deadline: self.control.deadline,
        };

        let call = self
            .scanner
            .backend
            .read_chunk(self.request.operation, &chunk_request);
        let chunk = self.scanner.await_chunk(call, self.control).await?;

        if let Some(metrics) = &self.scanner.metrics {
            metrics.record_chunk(chunk.items.len() as u64);
        }
        let records = chunk.items.len().to_string();
        log_event(
            Event::ChunkFetched,
            &[
                ("table", self.request.table_name.as_str()),
                ("operation", self.request.operation.as_str()),
                ("records", records.as_str()),
                ("more", if chunk.last_evaluated_key.is_some() { "true" } else { "false" }),
            ],
        );

        Ok(chunk)
    }

    /// Rewind to the request's start key.
    pub fn restart(&mut self) {
        self.cursor = self.request.start_key.clone();
        self.exhausted = false;
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Cursor the next call will resume after
    pub fn cursor(&self) -> Option<&Item> {
        self.cursor.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, MemoryBackend};
    use crate::table::{KeySchema, ScalarType, TableDescription};
    use crate::value::AttributeValue;

    fn backend_with(count: i64) -> Arc<MemoryBackend> {
        let schema = KeySchema::hash_only("id", ScalarType::Number);
        let backend = MemoryBackend::new().with_table(TableDescription::new("numbers", schema));
        backend
            .insert_items(
                "numbers",
                (0..count).map(|i| {
                    let mut item = Item::new();
                    item.insert("id".into(), AttributeValue::from(i));
                    item.insert("parity".into(), AttributeValue::from(if i % 2 == 0 { "even" } else { "odd" }));
                    item
                }),
            )
            .unwrap();
        Arc::new(backend)
    }

    fn ids(items: &[Item]) -> Vec<String> {
        items
            .iter()
            .map(|i| i["id"].as_n().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_scan_reads_until_exhausted() {
        let backend = backend_with(25);
        let scanner = ChunkedScanner::new(backend.clone()).with_chunk_size(10);
        let request = ScanRequest::new("numbers", ReadOperation::Scan);

        let records = scanner.scan(&request, &ScanControl::new(), |_, _| false).await.unwrap();
        assert_eq!(records.len(), 25);
        assert_eq!(backend.chunk_calls(), 3);
    }

    #[tokio::test]
    async fn test_scan_stops_when_predicate_fires() {
        let backend = backend_with(50);
        let scanner = ChunkedScanner::new(backend.clone()).with_chunk_size(10);
        let request = ScanRequest::new("numbers", ReadOperation::Scan);

        let mut calls = 0;
        let records = scanner
            .scan(&request, &ScanControl::new(), |_, _| {
                calls += 1;
                calls == 2
            })
            .await
            .unwrap();

        assert_eq!(records.len(), 20);
        assert_eq!(backend.chunk_calls(), 2);
    }

    #[tokio::test]
    async fn test_stream_is_restartable() {
        let backend = backend_with(15);
        let scanner = ChunkedScanner::new(backend).with_chunk_size(10);
        let request = ScanRequest::new("numbers", ReadOperation::Scan);
        let control = ScanControl::new();
        let mut stream = scanner.stream(&request, &control);

        let first = stream.next_chunk().await.unwrap().unwrap();
        assert_eq!(first.items.len(), 10);
        let second = stream.next_chunk().await.unwrap().unwrap();
        assert_eq!(second.items.len(), 5);
        assert!(stream.is_exhausted());
        assert!(stream.next_chunk().await.unwrap().is_none());

        stream.restart();
        let again = stream.next_chunk().await.unwrap().unwrap();
        assert_eq!(ids(&again.items), ids(&first.items));
    }

    #[tokio::test]
    async fn test_backend_error_discards_accumulation() {
        let backend = backend_with(30);
        backend.fail_on_call(2, BackendError::Throttled("rate exceeded".into()));
        let scanner = ChunkedScanner::new(backend.clone()).with_chunk_size(10);
        let request = ScanRequest::new("numbers", ReadOperation::Scan);

        let err = scanner.scan(&request, &ScanControl::new(), |_, _| false).await.unwrap_err();
        assert_eq!(
            err,
            PageError::BackendRequestFailed(BackendError::Throttled("rate exceeded".into()))
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_first_call() {
        let backend = backend_with(5);
        let scanner = ChunkedScanner::new(backend.clone());
        let token = CancellationToken::new();
        token.cancel();
        let control = ScanControl::new().with_cancellation(token);

        let err = scanner
            .scan(&ScanRequest::new("numbers", ReadOperation::Scan), &control, |_, _| false)
            .await
            .unwrap_err();
        assert_eq!(err, PageError::Cancelled);
        assert_eq!(backend.chunk_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_between_chunks() {
        let backend = backend_with(40);
        let scanner = ChunkedScanner::new(backend.clone()).with_chunk_size(10);
        let token = CancellationToken::new();
        let control = ScanControl::new().with_cancellation(token.clone());

        let err = scanner
            .scan(&ScanRequest::new("numbers", ReadOperation::Scan), &control, |_, _| {
                token.cancel();
                false
            })
            .await
            .unwrap_err();
        assert_eq!(err, PageError::Cancelled);
        assert_eq!(backend.chunk_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_slow_chunk() {
        let schema = KeySchema::hash_only("id", ScalarType::Number);
        let backend = Arc::new(
            MemoryBackend::new()
                .with_table(TableDescription::new("numbers", schema))
                .with_latency(std::time::Duration::from_secs(5)),
        );
        let scanner = ChunkedScanner::new(backend);
        let control = ScanControl::new().with_deadline(Instant::now() + std::time::Duration::from_secs(1));

        let err = scanner
            .scan(&ScanRequest::new("numbers", ReadOperation::Scan), &control, |_, _| false)
            .await
            .unwrap_err();
        assert_eq!(err, PageError::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_elapsed_deadline_skips_call() {
        let backend = backend_with(5);
        let scanner = ChunkedScanner::new(backend.clone());
        let control = ScanControl::new().with_deadline(Instant::now());

        let err = scanner
            .scan(&ScanRequest::new("numbers", ReadOperation::Scan), &control, |_, _| false)
            .await
            .unwrap_err();
        assert_eq!(err, PageError::DeadlineExceeded);
        assert_eq!(backend.chunk_calls(), 0);
    }

    #[tokio::test]
    async fn test_filtered_chunks_may_be_empty() {
        let backend = backend_with(20);
        let scanner = ChunkedScanner::new(backend).with_chunk_size(5);
        let mut params = FilterParams::new();
        params.push_filter("parity", AttributeValue::from("odd"));
        let request = ScanRequest::new("numbers", ReadOperation::Scan).with_params(params);

        let records = scanner.scan(&request, &ScanControl::new(), |_, _| false).await.unwrap();
        assert_eq!(records.len(), 10);
        assert!(records.iter().all(|r| r["parity"] == AttributeValue::from("odd")));
    }
}
