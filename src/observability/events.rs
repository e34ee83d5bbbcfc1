//! Observable events
//!
//! Events are explicit and typed; each carries its own default severity.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    BootStart,
    ConfigLoaded,
    ServerListening,
    Shutdown,

    // Pagination
    PageBegin,
    PageComplete,
    ChunkFetched,
    ScanCancelled,
    BackendRequestFailed,

    // Item operations
    ItemWritten,
    ItemDeleted,
    BatchWriteComplete,

    // HTTP
    RequestHandled,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ServerListening => "SERVER_LISTENING",
            Event::Shutdown => "SHUTDOWN",

            Event::PageBegin => "PAGE_BEGIN",
            Event::PageComplete => "PAGE_COMPLETE",
            Event::ChunkFetched => "CHUNK_FETCHED",
            Event::ScanCancelled => "SCAN_CANCELLED",
            Event::BackendRequestFailed => "BACKEND_REQUEST_FAILED",

            Event::ItemWritten => "ITEM_WRITTEN",
            Event::ItemDeleted => "ITEM_DELETED",
            Event::BatchWriteComplete => "BATCH_WRITE_COMPLETE",

            Event::RequestHandled => "REQUEST_HANDLED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ChunkFetched | Event::PageBegin => Severity::Trace,
            Event::ScanCancelled => Severity::Warn,
            Event::BackendRequestFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake_case() {
        let events = [
            Event::BootStart,
            Event::ConfigLoaded,
            Event::ServerListening,
            Event::Shutdown,
            Event::PageBegin,
            Event::PageComplete,
            Event::ChunkFetched,
            Event::ScanCancelled,
            Event::BackendRequestFailed,
            Event::ItemWritten,
            Event::ItemDeleted,
            Event::BatchWriteComplete,
            Event::RequestHandled,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::ChunkFetched.severity(), Severity::Trace);
        assert_eq!(Event::BackendRequestFailed.severity(), Severity::Error);
        assert_eq!(Event::PageComplete.severity(), Severity::Info);
        assert_eq!(format!("{}", Event::ScanCancelled), "SCAN_CANCELLED");
    }
}
