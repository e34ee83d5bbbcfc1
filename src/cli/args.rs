//! CLI argument definitions using clap
//!
//! Commands:
//! - dynamo-admin serve [--port] [--endpoint] [--memory [--seed FILE]]
//! - dynamo-admin page <table> [--page-size] [--start-key] [--filter k=v]...
//! - dynamo-admin encode-key <table> <hash> [range]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dynamo-admin - browse DynamoDB-style tables page by page
#[derive(Parser, Debug)]
#[command(name = "dynamo-admin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the admin API server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Table store endpoint (overrides DYNAMO_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,

        /// Serve an in-process table store instead
        #[arg(long)]
        memory: bool,

        /// JSON file of tables and items to load into the in-process store
        #[arg(long, value_name = "FILE", requires = "memory")]
        seed: Option<PathBuf>,
    },

    /// Print one page of a table as JSON
    Page {
        table: String,

        #[arg(long)]
        page_size: Option<usize>,

        /// Key token from a previous page's next_key
        #[arg(long)]
        start_key: Option<String>,

        /// Equality filter, repeatable
        #[arg(long = "filter", value_name = "ATTR=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Print the key token for a hash (and range) value
    EncodeKey {
        table: String,
        hash: String,
        range: Option<String>,

        #[arg(long)]
        endpoint: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected ATTR=VALUE, got {:?}", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_command() {
        let cli = Cli::try_parse_from([
            "dynamo-admin",
            "page",
            "users",
            "--page-size",
            "5",
            "--filter",
            "age=42",
            "--filter",
            "city=Oslo=West",
        ])
        .unwrap();

        match cli.command {
            Command::Page {
                table,
                page_size,
                filters,
                ..
            } => {
                assert_eq!(table, "users");
                assert_eq!(page_size, Some(5));
                assert_eq!(
                    filters,
                    vec![
                        ("age".to_string(), "42".to_string()),
                        ("city".to_string(), "Oslo=West".to_string())
                    ]
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_filter_rejected() {
        assert!(Cli::try_parse_from(["dynamo-admin", "page", "users", "--filter", "=x"]).is_err());
        assert!(Cli::try_parse_from(["dynamo-admin", "page", "users", "--filter", "novalue"]).is_err());
    }

    #[test]
    fn test_parse_encode_key() {
        let cli = Cli::try_parse_from(["dynamo-admin", "encode-key", "events", "bob", "7"]).unwrap();
        match cli.command {
            Command::EncodeKey { hash, range, .. } => {
                assert_eq!(hash, "bob");
                assert_eq!(range.as_deref(), Some("7"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_memory_flag() {
        let cli = Cli::try_parse_from(["dynamo-admin", "serve", "--memory", "--port", "9001"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Serve { memory: true, port: Some(9001), seed: None, .. }
        ));
    }

    #[test]
    fn test_seed_requires_memory() {
        let cli = Cli::try_parse_from(["dynamo-admin", "serve", "--memory", "--seed", "tables.json"]).unwrap();
        match cli.command {
            Command::Serve { seed, .. } => assert_eq!(seed, Some(PathBuf::from("tables.json"))),
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["dynamo-admin", "serve", "--seed", "tables.json"]).is_err());
    }
}
