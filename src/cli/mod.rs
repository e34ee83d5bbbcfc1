//! CLI module for dynamo-admin
//!
//! Provides command-line interface for:
//! - serve: run the admin API server
//! - page: print one page of a table
//! - encode-key: print the key token for a primary key

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{encode_key, page, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
