//! CLI command implementations
//!
//! Every command loads configuration from the environment first, applies
//! its own flag overrides, and constructs exactly one backend handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::backend::{Backend, DynamoBackend, MemoryBackend};
use crate::http_server::{AdminConfig, AdminServer};
use crate::observability::{log_event, Event, Logger, Severity};
use crate::pagination::{FilterSpec, KeyCodec, KeyToken, Paginator, ScanControl};
use crate::value::item_to_json;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Parse arguments and run the chosen command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a parsed command on a fresh runtime
pub fn run_command(command: Command) -> CliResult<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        match command {
            Command::Serve {
                port,
                endpoint,
                memory,
                seed,
            } => serve(port, endpoint, memory, seed).await,
            Command::Page {
                table,
                page_size,
                start_key,
                filters,
                endpoint,
            } => {
                let result = page(&table, page_size, start_key, filters, endpoint).await;
                report(result)
            }
            Command::EncodeKey {
                table,
                hash,
                range,
                endpoint,
            } => {
                let result = encode_key(&table, &hash, range.as_deref(), endpoint).await;
                report(result)
            }
        }
    })
}

/// Print the command's data, or its error as JSON before returning it
fn report(result: CliResult<Value>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(data),
        Err(err) => {
            write_error(err.code_str(), err.message())?;
            Err(err)
        }
    }
}

/// Start the admin server
pub async fn serve(
    port: Option<u16>,
    endpoint: Option<String>,
    memory: bool,
    seed: Option<PathBuf>,
) -> CliResult<()> {
    log_event(Event::BootStart, &[]);

    let mut config = AdminConfig::from_env()?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(endpoint) = endpoint {
        config.backend.endpoint = endpoint;
    }
    config.validate()?;
    Logger::set_min_severity(config.log_severity()?);

    let backend_kind = if memory { "memory" } else { "dynamodb" };
    let port_text = config.port.to_string();
    log_event(
        Event::ConfigLoaded,
        &[
            ("backend", backend_kind),
            ("endpoint", config.backend.endpoint.as_str()),
            ("port", port_text.as_str()),
        ],
    );

    let backend: Arc<dyn Backend> = if memory {
        Arc::new(memory_backend(seed.as_deref())?)
    } else {
        Arc::new(DynamoBackend::new(&config.backend))
    };

    AdminServer::new(backend, config)
        .start()
        .await
        .map_err(|e| CliError::server_failed(e.to_string()))
}

/// In-process store, loaded from `seed` when given
fn memory_backend(seed: Option<&Path>) -> CliResult<MemoryBackend> {
    let Some(path) = seed else {
        return Ok(MemoryBackend::new());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("{}: {}", path.display(), e)))?;
    let backend = MemoryBackend::from_seed_json(&text)
        .map_err(|e| CliError::invalid_argument(format!("{}: {}", path.display(), e)))?;

    let path_text = path.display().to_string();
    Logger::info("MEMORY_STORE_SEEDED", &[("seed", path_text.as_str())]);
    Ok(backend)
}

/// Fetch one page and return it as a JSON document
pub async fn page(
    table: &str,
    page_size: Option<usize>,
    start_key: Option<String>,
    filters: Vec<(String, String)>,
    endpoint: Option<String>,
) -> CliResult<Value> {
    // Keep stdout clean for the JSON result
    Logger::set_min_severity(Severity::Error);

    let config = load_config(endpoint)?;
    let backend: Arc<dyn Backend> = Arc::new(DynamoBackend::new(&config.backend));
    let paginator = Paginator::new(backend).with_chunk_size(config.chunk_size);

    let spec: FilterSpec = filters.into_iter().collect();
    let start_token = start_key.filter(|k| !k.is_empty()).map(KeyToken::from_raw);
    let page = paginator
        .get_table_page(
            table,
            &spec,
            page_size.unwrap_or(config.page_size),
            start_token,
            &ScanControl::new(),
        )
        .await?;

    let items: Vec<Value> = page.items.iter().map(item_to_json).collect();
    Ok(json!({
        "table": table,
        "count": items.len(),
        "items": items,
        "next_key": page.next_token,
    }))
}

/// Build the key token for a table's key values, validated against the
/// table's key schema
pub async fn encode_key(
    table: &str,
    hash: &str,
    range: Option<&str>,
    endpoint: Option<String>,
) -> CliResult<Value> {
    Logger::set_min_severity(Severity::Error);

    let config = load_config(endpoint)?;
    let backend = DynamoBackend::new(&config.backend);
    let description = backend
        .describe_table(table)
        .await
        .map_err(crate::pagination::PageError::from)?;

    let token = KeyCodec::encode_text(hash, range);
    let key = KeyCodec::decode(&token, &description.key_schema)?;
    if range.is_some() && key.range.is_none() {
        return Err(CliError::invalid_argument(format!(
            "table '{}' has no range key",
            table
        )));
    }

    Ok(json!({
        "table": table,
        "token": token,
        "path": format!("/tables/{}/items/{}", table, token.to_path_segment()),
    }))
}

fn load_config(endpoint: Option<String>) -> CliResult<AdminConfig> {
    let mut config = AdminConfig::from_env()?;
    if let Some(endpoint) = endpoint {
        config.backend.endpoint = endpoint;
        config.validate()?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::cli::CliErrorCode;

    #[test]
    fn test_memory_backend_from_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "users", "hash_key": {{"name": "id", "type": "N"}}, "items": [{{"id": 1}}, {{"id": 2}}]}}]"#
        )
        .unwrap();

        let backend = memory_backend(Some(file.path())).unwrap();
        assert_eq!(backend.item_count("users"), 2);
    }

    #[test]
    fn test_memory_backend_without_seed_is_empty() {
        let backend = memory_backend(None).unwrap();
        assert_eq!(backend.item_count("users"), 0);
    }

    #[test]
    fn test_bad_seed_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = memory_backend(Some(&dir.path().join("missing.json"))).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::IoError);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();
        let err = memory_backend(Some(file.path())).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::InvalidArgument);
    }
}
