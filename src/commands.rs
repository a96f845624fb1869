use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tauri::State;

use crate::diaria_report::{process_document_path, report_to_json};
use crate::report_request::ReportRequest;
use crate::report_session::{PublishOutcome, PublishedReport, ReportSession};

#[derive(Debug, Default)]
pub struct SessionState(pub Mutex<ReportSession>);

#[derive(Debug, Serialize)]
pub struct HealthPing {
    pub status: &'static str,
    pub unix_ts: u64,
    pub mode: &'static str,
}

fn now_unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn lock_session<'a>(state: &'a State<'_, SessionState>) -> Result<MutexGuard<'a, ReportSession>, String> {
    state
        .0
        .lock()
        .map_err(|_| "report session lock poisoned".to_string())
}

fn published_json(published: &PublishedReport) -> Value {
    let mut payload = report_to_json(&published.report);
    payload["source_name"] = json!(published.source_name);
    payload
}

#[tauri::command]
pub fn diarias_health_ping() -> HealthPing {
    HealthPing {
        status: "ok",
        unix_ts: now_unix_ts(),
        mode: "desktop",
    }
}

#[tauri::command]
pub fn diarias_process_file(state: State<'_, SessionState>, req: ReportRequest) -> Result<Value, String> {
    let source = req.source_path().map_err(|e| e.to_string())?;
    let options = req
        .options(Local::now().date_naive())
        .map_err(|e| e.to_string())?;
    let source_name = source
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| source.to_string_lossy().to_string());

    let ticket = lock_session(&state)?.begin_load();
    // Decoding runs unlocked so a newer load can start meanwhile.
    let result = process_document_path(&source, &options);

    let mut session = lock_session(&state)?;
    match session
        .publish(ticket, source_name, result)
        .map_err(|e| e.to_string())?
    {
        PublishOutcome::Applied => session
            .current()
            .map(published_json)
            .ok_or_else(|| "report vanished after publish".to_string()),
        PublishOutcome::Stale => Ok(json!({ "stale": true })),
    }
}

#[tauri::command]
pub fn diarias_current_report(state: State<'_, SessionState>) -> Result<Value, String> {
    let session = lock_session(&state)?;
    Ok(session.current().map(published_json).unwrap_or(Value::Null))
}

#[tauri::command]
pub fn diarias_clear_report(state: State<'_, SessionState>) -> Result<Value, String> {
    lock_session(&state)?.clear();
    Ok(json!({ "cleared": true }))
}
