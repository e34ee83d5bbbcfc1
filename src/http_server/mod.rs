//! # Admin HTTP Server Module
//!
//! JSON API for browsing and editing tables.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/observability/metrics` - Counters
//! - `/tables` - Table listing
//! - `/tables/:table` - Paged browsing with equality filters
//! - `/tables/:table/items/:key` - Single items by key token

pub mod config;
pub mod errors;
pub mod observability_routes;
pub mod server;
pub mod state;
pub mod table_routes;

pub use config::{AdminConfig, ConfigError};
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::AdminServer;
pub use state::AdminState;
