//! `vtable <data.json> [config.json]`
//!
//! Loads a JSON array of records and an optional table configuration, derives
//! the table state and prints it as JSON. A `revealId` key in the
//! configuration pages to the record with that `id`.

use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::LevelFilter;
use log::debug;
use log::info;
use log::warn;
use simplelog::Config;
use simplelog::WriteLogger;
use vtable_lib::Store;
use vtable_lib::TableConfig;
use vtable_lib::TableError;
use vtable_lib::error::ConfigError;
use vtable_lib::model::Record;
use vtable_lib::model::Value;

const LOG_FILE: &str = "vtable.log";
const LOG_ENV: &str = "VTABLE_LOG";
const REVEAL_KEY: &str = "revealId";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Failed to render state: {0}")]
    Render(#[source] serde_json::Error),
}

/// Derive a table state from JSON records and print it.
#[derive(Debug, Parser)]
#[command(name = "vtable", version)]
struct Args {
    /// JSON array of records.
    data: PathBuf,

    /// Table configuration; may carry a `revealId`.
    config: Option<PathBuf>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let file = File::open(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Splits the host-only `revealId` off a raw config.
fn load_config(path: &Path) -> Result<(TableConfig, Option<Value>), CliError> {
    let mut raw: serde_json::Value = read_json(path)?;
    let reveal = raw
        .as_object_mut()
        .and_then(|object| object.remove(REVEAL_KEY))
        .map(serde_json::from_value::<Value>)
        .transpose()
        .map_err(ConfigError::from)?;
    let config = serde_json::from_value(raw).map_err(ConfigError::from)?;
    Ok((config, reveal))
}

fn run(args: &Args) -> Result<String, CliError> {
    let records: Vec<Record> = read_json(&args.data)?;
    let data: Vec<Arc<Record>> = records.into_iter().map(Arc::new).collect();
    info!("loaded {} record(s) from {}", data.len(), args.data.display());

    let (config, reveal) = match &args.config {
        Some(path) => load_config(path)?,
        None => (TableConfig::default(), None),
    };
    debug!("config: {:?}", config);

    let store = Store::from_config(config, data)?;

    if let Some(id) = reveal {
        let found = store.reveal_where(move |row: &Record| row.get("id") == Some(&id))?;
        if !found {
            warn!("no visible record matches {}", REVEAL_KEY);
        }
    }

    let state = store.state();
    info!(
        "page {}/{} with {} of {} item(s)",
        state.current_page,
        state.total_pages,
        state.rows.len(),
        state.total_items
    );
    serde_json::to_string_pretty(&*state).map_err(CliError::Render)
}

fn init_logging() {
    let level = env::var(LOG_ENV)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    if let Ok(log_file) = File::create(LOG_FILE) {
        let _ = WriteLogger::init(level, Config::default(), log_file);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
