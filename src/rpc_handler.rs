//! RPC method handler for the Tabfix JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! Each request maps to exactly one engine operation on the [`App`].

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::app::App;
use crate::managers::session_manager::SessionManagerTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::session::{RestoreMode, Session};
use crate::types::tab::WindowInfo;

fn to_json<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

/// `mode` param, falling back to the `restoreInNewWindow` setting.
async fn restore_mode(app: &App, params: &Value) -> Result<RestoreMode, String> {
    match params.get("mode") {
        Some(mode) => serde_json::from_value(mode.clone()).map_err(|e| format!("invalid mode: {}", e)),
        None => {
            let settings = app.settings_engine.load().await.map_err(|e| e.to_string())?;
            Ok(App::default_restore_mode(&settings))
        }
    }
}

/// Dispatch a JSON-RPC method call to the appropriate engine.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Sessions ───
        "session.capture" => {
            let name = params.get("name").and_then(|v| v.as_str());
            let session = app.session_manager.capture(name).await.map_err(|e| e.to_string())?;
            to_json(&session)
        }
        "session.list" => {
            let archive = app.session_manager.list().await.map_err(|e| e.to_string())?;
            to_json(&archive)
        }
        "session.delete" => {
            let id = str_param(params, "id")?;
            let archive = app.session_manager.delete(id).await.map_err(|e| e.to_string())?;
            to_json(&archive)
        }
        "session.rename" => {
            let id = str_param(params, "id")?;
            let name = str_param(params, "name")?;
            let session = app.session_manager.rename(id, name).await.map_err(|e| e.to_string())?;
            to_json(&session)
        }
        "session.setFavorite" => {
            let id = str_param(params, "id")?;
            let favorite = params
                .get("favorite")
                .and_then(|v| v.as_bool())
                .ok_or("missing favorite")?;
            let session = app
                .session_manager
                .set_favorite(id, favorite)
                .await
                .map_err(|e| e.to_string())?;
            to_json(&session)
        }
        "session.restore" => {
            let mode = restore_mode(app, params).await?;
            let result = match params.get("session") {
                Some(inline) => {
                    let session: Session = serde_json::from_value(inline.clone())
                        .map_err(|e| format!("invalid session: {}", e))?;
                    app.session_manager.restore(&session, mode).await
                }
                None => {
                    let id = str_param(params, "id")?;
                    app.session_manager.restore_by_id(id, mode).await
                }
            };
            let report = result.map_err(|e| e.to_string())?;
            to_json(&report)
        }
        "session.restoreLast" => {
            let mode = restore_mode(app, params).await?;
            let report = app.session_manager.restore_last(mode).await.map_err(|e| e.to_string())?;
            to_json(&report)
        }
        "session.restoreFavorite" => {
            let mode = restore_mode(app, params).await?;
            let report = app
                .session_manager
                .restore_favorite(mode)
                .await
                .map_err(|e| e.to_string())?;
            to_json(&report)
        }

        // ─── Tab cleanup ───
        "tabs.closeDuplicates" => {
            let report = app.duplicate_closer.close_duplicates().await.map_err(|e| e.to_string())?;
            to_json(&report)
        }
        "tabs.sweepInactive" => {
            let now = params
                .get("now")
                .and_then(|v| v.as_i64())
                .unwrap_or_else(|| Utc::now().timestamp_millis());
            let closed = app.sweeper.sweep(now).await.map_err(|e| e.to_string())?;
            Ok(json!({"closed": closed}))
        }
        "focus.enforce" => {
            let report = app.focus_engine.enforce().await.map_err(|e| e.to_string())?;
            to_json(&report)
        }

        // ─── Settings ───
        "settings.get" => {
            let settings = app.settings_engine.load().await.map_err(|e| e.to_string())?;
            to_json(&settings)
        }
        "settings.set" => {
            let patch = params.get("patch").ok_or("missing patch")?;
            let settings = app.settings_engine.update(patch).await.map_err(|e| e.to_string())?;
            to_json(&settings)
        }
        "settings.reset" => {
            let settings = app.settings_engine.reset().await.map_err(|e| e.to_string())?;
            to_json(&settings)
        }

        // ─── Archive ───
        "archive.export" => {
            let json = app.session_manager.export_json().await.map_err(|e| e.to_string())?;
            Ok(json!({"json": json}))
        }
        "archive.import" => {
            let text = str_param(params, "json")?;
            let count = app.session_manager.import_json(text).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "count": count}))
        }

        // ─── In-memory browser ───
        "browser.snapshot" => {
            let browser = app.browser.as_ref().ok_or("no in-memory browser attached")?;
            let windows = browser.snapshot().map_err(|e| e.to_string())?;
            to_json(&windows)
        }
        "browser.load" => {
            let browser = app.browser.as_ref().ok_or("no in-memory browser attached")?;
            let windows_val = params.get("windows").ok_or("missing windows")?;
            let windows: Vec<WindowInfo> =
                serde_json::from_value(windows_val.clone()).map_err(|e| format!("invalid windows: {}", e))?;
            browser.load(windows).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
