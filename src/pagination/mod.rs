//! # Incremental Pagination
//!
//! Turns a backend's bounded, cursor-linked chunks into stable fixed-size
//! pages, and makes primary keys representable as opaque URL tokens.
//!
//! Components, leaves first:
//!
//! - [`KeyCodec`]: primary key to [`KeyToken`] and back
//! - [`KeyExtractor`]: record to its key attributes
//! - [`FilterExpressionBuilder`]: equality filter text to backend conditions
//! - [`ChunkedScanner`]: sequential chunk reads with an early-stop predicate
//! - [`Paginator`]: one page of a chosen size plus a continuation token
//!
//! No state is shared between page requests except the backend handle.

mod errors;
mod filter;
mod key_codec;
mod key_extractor;
mod paginator;
mod scanner;

pub use errors::{PageError, PageResult};
pub use filter::{FilterExpressionBuilder, FilterSpec, ReadPlan};
pub use key_codec::{DecodedKey, KeyCodec, KeyToken};
pub use key_extractor::KeyExtractor;
pub use paginator::{Page, PageRequest, Paginator, DEFAULT_PAGE_SIZE};
pub use scanner::{ChunkStream, ChunkedScanner, ScanControl, ScanRequest, DEFAULT_CHUNK_SIZE};
