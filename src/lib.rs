//! dynamo-admin - stable cursor pagination over DynamoDB-style tables
//!
//! Pages are assembled from bounded backend chunks and resumed through
//! opaque key tokens; the admin HTTP API and CLI sit on top.

pub mod backend;
pub mod cli;
pub mod http_server;
pub mod observability;
pub mod pagination;
pub mod table;
pub mod value;
