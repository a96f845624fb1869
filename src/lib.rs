pub mod aggregator;
pub mod approval_stage;
pub mod cell_value;
pub mod column_resolver;
#[cfg(feature = "desktop")]
mod commands;
pub mod date_parser;
pub mod diaria_report;
pub mod error;
pub mod money_parser;
pub mod records;
pub mod report_request;
pub mod report_session;
pub mod row_classifier;
pub mod workbook_reader;

pub use aggregator::{aggregate, Statistics};
pub use approval_stage::{approval_steps, completed_stages, ApprovalStep, StepState};
pub use cell_value::{CellValue, RawRow};
pub use column_resolver::{resolve_columns, ColumnField, ColumnMap};
pub use date_parser::{parse_date, parse_date_text};
pub use diaria_report::{
    build_report, process_document_bytes, process_document_path, report_to_json, DiariaReport,
};
pub use error::{DiariaError, Result};
pub use money_parser::{parse_money, parse_money_text};
pub use records::{NormalizedRecord, TimelineRecord};
pub use report_request::{ReportOptions, ReportRequest};
pub use report_session::{LoadTicket, PublishOutcome, ReportSession};
pub use row_classifier::{classify_row, RowOutcome};
pub use workbook_reader::decode_document;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(commands::SessionState::default())
        .invoke_handler(tauri::generate_handler![
            commands::diarias_health_ping,
            commands::diarias_process_file,
            commands::diarias_current_report,
            commands::diarias_clear_report,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
