//! Tabfix RPC Server: JSON-RPC over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"session.capture", "params":{"name":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr so they never interleave with responses.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tabfix::app::App;
use tabfix::database::Database;
use tabfix::managers::tab_manager::TabManager;
use tabfix::rpc_handler::handle_method;
use tabfix::services::auto_close::spawn_inactivity_sweeper;
use tabfix::types::config::EngineConfig;

use serde_json::{json, Value};

const SWEEP_PERIOD: Duration = Duration::from_secs(60);

fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TABFIX_DATA_DIR") {
        PathBuf::from(dir)
    } else if let Ok(exe) = std::env::current_exe() {
        exe.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
    } else {
        PathBuf::from(".")
    }
}

async fn write_line(stdout: &mut io::Stdout, value: &Value) -> io::Result<()> {
    stdout.write_all(format!("{}\n", value).as_bytes()).await?;
    stdout.flush().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::var("TABFIX_CONFIG") {
        Ok(path) => EngineConfig::load(&PathBuf::from(path))?,
        Err(_) => EngineConfig::default(),
    };

    let db_path = data_dir().join("tabfix.db");
    let store = Arc::new(Database::open(&db_path)?);
    let app = App::with_browser(Arc::new(TabManager::new()), store, config);

    if let Err(e) = app.startup().await {
        error!(error = %e, "startup restore failed");
    }
    let sweeper = spawn_inactivity_sweeper(app.sweeper.clone(), SWEEP_PERIOD);
    info!(db = %db_path.display(), "tabfix-rpc ready");

    let mut stdout = io::stdout();
    write_line(&mut stdout, &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")})).await?;

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                write_line(&mut stdout, &json!({"id": null, "error": format!("parse error: {}", e)})).await?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        write_line(&mut stdout, &response).await?;
    }

    sweeper.abort();
    Ok(())
}
