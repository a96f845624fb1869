use chrono::Local;
use diarias_monitor_lib::{process_document_path, report_to_json, DiariaError, ReportRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::io::{self, Read};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct AdapterRequest {
    schema_version: u64,
    case: Option<AdapterCaseMeta>,
    endpoint: AdapterEndpoint,
    #[serde(default)]
    query: Value,
}

#[derive(Debug, Deserialize)]
struct AdapterCaseMeta {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdapterEndpoint {
    path: Option<String>,
}

#[derive(Debug, Serialize)]
struct AdapterErrorBody {
    category: String,
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
enum AdapterResponse {
    #[serde(rename = "success")]
    Success { payload: Value },
    #[serde(rename = "error")]
    Error { error: AdapterErrorBody },
}

#[derive(Debug)]
enum AdapterFailure {
    Protocol(String),
    UnsupportedEndpoint(String),
    Report(DiariaError),
}

impl From<DiariaError> for AdapterFailure {
    fn from(err: DiariaError) -> Self {
        AdapterFailure::Report(err)
    }
}

impl AdapterFailure {
    fn into_response(self) -> AdapterResponse {
        let (category, message, error_type) = match self {
            AdapterFailure::Protocol(msg) => ("ADAPTER_PROTOCOL_ERROR", msg, "AdapterError"),
            AdapterFailure::UnsupportedEndpoint(path) => (
                "UNSUPPORTED_ENDPOINT",
                format!("unsupported endpoint path: {path}"),
                "AdapterError",
            ),
            AdapterFailure::Report(err) => (err.category(), err.to_string(), "DiariaError"),
        };
        AdapterResponse::Error {
            error: AdapterErrorBody {
                category: category.to_string(),
                message,
                error_type: error_type.to_string(),
            },
        }
    }
}

fn parse_bool_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn read_stdin_json() -> Result<Value, AdapterFailure> {
    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .map_err(|e| AdapterFailure::Protocol(format!("read stdin failed: {e}")))?;
    if raw.trim().is_empty() {
        return Err(AdapterFailure::Protocol("empty stdin request".to_string()));
    }
    serde_json::from_str::<Value>(&raw)
        .map_err(|e| AdapterFailure::Protocol(format!("invalid JSON request: {e}")))
}

fn dispatch(req: AdapterRequest) -> Result<Value, AdapterFailure> {
    if req.schema_version != 1 {
        return Err(AdapterFailure::Protocol(format!(
            "unsupported schema_version: {}",
            req.schema_version
        )));
    }

    let path = req
        .endpoint
        .path
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AdapterFailure::Protocol("request.endpoint.path missing".to_string()))?;

    match path {
        "/api/diarias/health" => Ok(json!({ "status": "ok", "mode": "adapter" })),
        "/api/diarias/report" => {
            let report_req: ReportRequest = serde_json::from_value(req.query).map_err(|e| {
                AdapterFailure::Protocol(format!("request.query invalid for report: {e}"))
            })?;
            let source = report_req.source_path()?;
            let options = report_req.options(Local::now().date_naive())?;
            debug!(source = %source.display(), ?options, "processing report request");
            let report = process_document_path(&source, &options)?;
            let mut payload = report_to_json(&report);
            payload["source_path"] = json!(source.to_string_lossy());
            Ok(payload)
        }
        other => Err(AdapterFailure::UnsupportedEndpoint(other.to_string())),
    }
}

fn main() {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let pretty = parse_bool_flag(&args, "--pretty");
    let verbose = parse_bool_flag(&args, "--verbose");
    init_tracing(verbose);

    let resp = match read_stdin_json()
        .and_then(|v| {
            serde_json::from_value::<AdapterRequest>(v)
                .map_err(|e| AdapterFailure::Protocol(format!("request root invalid: {e}")))
        })
        .and_then(|req| {
            if let Some(case_id) = req.case.as_ref().and_then(|c| c.id.as_deref()) {
                info!(case = case_id, "adapter request");
            }
            dispatch(req)
        }) {
        Ok(payload) => AdapterResponse::Success { payload },
        Err(failure) => failure.into_response(),
    };

    let out = if pretty {
        serde_json::to_string_pretty(&resp)
    } else {
        serde_json::to_string(&resp)
    }
    .unwrap_or_else(|e| {
        json!({
            "status": "error",
            "error": {
                "category": "ADAPTER_PROTOCOL_ERROR",
                "message": format!("serialize response failed: {e}"),
                "type": "SerializeError",
            }
        })
        .to_string()
    });

    print!("{out}");
}
