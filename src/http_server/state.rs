//! Shared handler state

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::backend::Backend;
use crate::observability::MetricsRegistry;
use crate::pagination::{Paginator, ScanControl};

use super::config::AdminConfig;

/// State shared by every handler. The backend handle is created once at
/// startup; nothing else is shared between requests.
pub struct AdminState {
    pub backend: Arc<dyn Backend>,
    pub paginator: Paginator,
    pub metrics: Arc<MetricsRegistry>,
    /// Page size used when a request does not ask for one
    pub page_size: usize,
    pub page_timeout: Option<Duration>,
    /// Cancelled on shutdown; in-flight scans observe it
    pub shutdown: CancellationToken,
}

impl AdminState {
    pub fn new(backend: Arc<dyn Backend>, config: &AdminConfig) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let paginator = Paginator::new(Arc::clone(&backend))
            .with_chunk_size(config.chunk_size)
            .with_metrics(Arc::clone(&metrics));

        Self {
            backend,
            paginator,
            metrics,
            page_size: config.page_size,
            page_timeout: config.page_timeout_ms.map(Duration::from_millis),
            shutdown: CancellationToken::new(),
        }
    }

    /// Controls for one page request: cancelled on shutdown, bounded by the
    /// configured page timeout.
    pub fn scan_control(&self) -> ScanControl {
        let control = ScanControl::new().with_cancellation(self.shutdown.child_token());
        match self.page_timeout {
            Some(timeout) => control.with_deadline(Instant::now() + timeout),
            None => control,
        }
    }
}
