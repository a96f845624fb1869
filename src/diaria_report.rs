use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::aggregator::{PendingTally, Statistics};
use crate::approval_stage::{approval_steps, completed_stages, most_recent};
use crate::cell_value::RawRow;
use crate::column_resolver::{resolve_columns, ColumnField};
use crate::date_parser::{format_date, format_date_complete, format_day};
use crate::error::{DiariaError, Result};
use crate::money_parser::format_brl;
use crate::records::{NormalizedRecord, TimelineRecord};
use crate::report_request::ReportOptions;
use crate::row_classifier::{classify_row, window_start, ExclusionReason, RowOutcome};
use crate::workbook_reader::{decode_document, read_document};

const ERROR_SAMPLE_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExclusionCounts {
    pub blank_row: usize,
    pub no_departure_date: usize,
    pub outside_window: usize,
    pub already_paid: usize,
}

impl ExclusionCounts {
    fn count(&mut self, reason: ExclusionReason) {
        match reason {
            ExclusionReason::BlankRow => self.blank_row += 1,
            ExclusionReason::NoDepartureDate => self.no_departure_date += 1,
            ExclusionReason::OutsideWindow => self.outside_window += 1,
            ExclusionReason::AlreadyPaid => self.already_paid += 1,
        }
    }
}

/// Everything derived from one loaded document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiariaReport {
    pub reference_date: NaiveDate,
    pub window_start: NaiveDate,
    pub data_row_count: usize,
    /// Pending records in document order.
    pub records: Vec<NormalizedRecord>,
    /// Pending records newest departure first, cut to the configured size.
    pub timeline: Vec<TimelineRecord>,
    pub statistics: Statistics,
    pub column_mapping: BTreeMap<String, String>,
    pub destination_fallback: bool,
    pub missing_columns: Vec<ColumnField>,
    pub skipped_rows: Vec<SkippedRow>,
    pub excluded: ExclusionCounts,
}

#[derive(Debug, Default)]
struct RowFold {
    records: Vec<NormalizedRecord>,
    timeline: Vec<TimelineRecord>,
    tally: PendingTally,
    skipped_rows: Vec<SkippedRow>,
    excluded: ExclusionCounts,
}

impl RowFold {
    fn absorb(mut self, (line, outcome): (usize, Result<RowOutcome>)) -> Self {
        match outcome {
            Ok(RowOutcome::Included(item)) => {
                self.tally = self.tally.add(&item.record);
                self.records.push(item.record.clone());
                self.timeline.push(item);
            }
            Ok(RowOutcome::Excluded(reason)) => self.excluded.count(reason),
            Err(err) => {
                warn!(line, error = %err, "row skipped");
                let message = match err {
                    DiariaError::RowProcessing { message, .. } => message,
                    other => other.to_string(),
                };
                self.skipped_rows.push(SkippedRow { line, message });
            }
        }
        self
    }
}

/// Runs the whole pipeline over decoded rows; the first row is the header.
pub fn build_report(rows: &[RawRow], options: &ReportOptions) -> Result<DiariaReport> {
    let Some((header, data)) = rows.split_first() else {
        return Err(DiariaError::EmptyDocument);
    };

    let columns = resolve_columns(header);
    let window_start = window_start(options.reference_date);
    let column_mapping = columns.header_labels(header);

    if options.strict_missing_columns {
        columns.validate()?;
    }
    let missing_columns = columns.missing_required();
    if !missing_columns.is_empty() {
        warn!(
            missing = ?missing_columns,
            "required columns missing, no rows processed"
        );
        return Ok(DiariaReport {
            reference_date: options.reference_date,
            window_start,
            data_row_count: data.len(),
            records: Vec::new(),
            timeline: Vec::new(),
            statistics: Statistics::default(),
            column_mapping,
            destination_fallback: columns.uses_destination_fallback(),
            missing_columns,
            skipped_rows: Vec::new(),
            excluded: ExclusionCounts::default(),
        });
    }

    let fold = data
        .iter()
        .enumerate()
        .map(|(offset, row)| {
            let line = offset + 2;
            (line, classify_row(row, &columns, window_start, line))
        })
        .fold(RowFold::default(), RowFold::absorb);

    let statistics = fold.tally.into_statistics();
    let timeline = most_recent(&fold.timeline, options.max_timeline_items);

    info!(
        rows = data.len(),
        pending = statistics.total_unpaid_count,
        skipped = fold.skipped_rows.len(),
        window_start = %window_start,
        "diárias document processed"
    );

    Ok(DiariaReport {
        reference_date: options.reference_date,
        window_start,
        data_row_count: data.len(),
        records: fold.records,
        timeline,
        statistics,
        column_mapping,
        destination_fallback: columns.uses_destination_fallback(),
        missing_columns,
        skipped_rows: fold.skipped_rows,
        excluded: fold.excluded,
    })
}

pub fn process_document_bytes(
    bytes: &[u8],
    extension_hint: Option<&str>,
    options: &ReportOptions,
) -> Result<DiariaReport> {
    let rows = decode_document(bytes, extension_hint)?;
    build_report(&rows, options)
}

pub fn process_document_path(path: &Path, options: &ReportOptions) -> Result<DiariaReport> {
    let rows = read_document(path)?;
    build_report(&rows, options)
}

fn record_json(record: &NormalizedRecord) -> Value {
    json!({
        "id": record.id,
        "creditor_name": record.creditor_name,
        "destination": record.destination,
        "travel_date_range": record.travel_date_range,
        "departure_date": record.departure_date,
        "amount": record.amount,
        "amount_text": record.amount_text(),
        "status": record.status,
        "reason": record.reason,
        "reason_excerpt": record.reason_excerpt(),
    })
}

fn timeline_json(item: &TimelineRecord) -> Value {
    json!({
        "id": item.record.id,
        "destination": item.record.destination,
        "amount_text": item.record.amount_text(),
        "reason": item.record.reason,
        "departure_date": item.record.departure_date,
        "departure_text_complete": format_date_complete(Some(item.record.departure_date)),
        "request_date_text": format_date(item.request_date),
        "completed_stages": completed_stages(item),
        "steps": approval_steps(item),
    })
}

/// Presentation payload: the report plus display-ready text.
pub fn report_to_json(report: &DiariaReport) -> Value {
    json!({
        "reference_date": report.reference_date,
        "window_start": report.window_start,
        "cutoff_text": format_day(report.window_start),
        "data_row_count": report.data_row_count,
        "statistics": {
            "total_unpaid_count": report.statistics.total_unpaid_count,
            "total_pending_amount": report.statistics.total_pending_amount,
            "total_pending_amount_text": format_brl(report.statistics.total_pending_amount),
            "analysis_window_days": report.statistics.analysis_window_days,
            "unique_creditor_count": report.statistics.unique_creditor_count,
        },
        "records": report.records.iter().map(record_json).collect::<Vec<_>>(),
        "timeline": report.timeline.iter().map(timeline_json).collect::<Vec<_>>(),
        "column_mapping": report.column_mapping,
        "destination_fallback": report.destination_fallback,
        "missing_columns": report.missing_columns,
        "skipped_row_count": report.skipped_rows.len(),
        "skipped_rows": report.skipped_rows.iter().take(ERROR_SAMPLE_LIMIT).collect::<Vec<_>>(),
        "excluded": report.excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::cell_value::CellValue;
    use chrono::Duration;
    use std::fs;
    use std::path::PathBuf;
    use uuid::Uuid;

    const HEADER: &str = "ID;NOME CREDOR;SAÍDA ORIGEM;CHEGADA DESTINO;DATA DE PAGAMENTO;VALOR À PAGAR;DATA SOLICITAÇÃO;DATA APROVAÇÃO CHEFE IMEDIATO;DATA APROVAÇÃO ORDENADOR;STATUS;MOTIVO;DESTINO";

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 20).expect("valid date")
    }

    fn ago(days: i64) -> String {
        format_day(reference() - Duration::days(days))
    }

    fn create_temp_path(prefix: &str, ext: &str) -> PathBuf {
        let unique = format!("{prefix}_{}_{}.{}", std::process::id(), Uuid::new_v4(), ext);
        std::env::temp_dir().join(unique)
    }

    fn sample_csv() -> String {
        [
            HEADER.to_string(),
            format!("120875;ANDRE LUIZ DOS SANTOS;{};;;69,16;{};;;Não Pago;Fiscalização de agentes regulados;SÃO JOSÉ DOS CAMPOS", ago(10), ago(10)),
            format!("121110;ANDRE LUIZ DOS SANTOS;{};{};N/A;345,78;{};{};;Não Pago;Operação Direção Segura Integrada;CAMPINAS", ago(5), ago(4), ago(3), ago(3)),
            format!("121200;MARIA SILVA;{};;{};500,00;;;;Pago;Curso;SANTOS", ago(7), ago(1)),
            format!("119000;JOSE SOUZA;{};;;80,00;;;;Não Pago;Antigo;SOROCABA", ago(61)),
            ";;;;;;;;;;;".to_string(),
            format!("121300;Maria Silva;{};;;1.250,50;;;{};Não Pago;Auditoria;RIBEIRÃO PRETO", ago(20), ago(2)),
        ]
        .join("\n")
    }

    fn options() -> ReportOptions {
        ReportOptions::new(reference())
    }

    #[test]
    fn csv_document_yields_pending_records_and_statistics() {
        let report = process_document_bytes(sample_csv().as_bytes(), Some("csv"), &options())
            .expect("process csv");

        let ids = report.records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["120875", "121110", "121300"]);
        assert_eq!(report.data_row_count, 6);
        assert_eq!(report.statistics.total_unpaid_count, 3);
        assert!((report.statistics.total_pending_amount - (69.16 + 345.78 + 1250.5)).abs() < 1e-9);
        assert_eq!(report.statistics.unique_creditor_count, 2);
        assert_eq!(report.statistics.analysis_window_days, 60);
        assert_eq!(report.excluded.already_paid, 1);
        assert_eq!(report.excluded.outside_window, 1);
        assert_eq!(report.excluded.blank_row, 1);
        assert_eq!(report.window_start, reference() - Duration::days(60));
        assert_eq!(
            report.records[1].travel_date_range,
            format!("{} a {}", ago(5), ago(4))
        );
    }

    #[test]
    fn statistics_match_an_independent_aggregate() {
        let report = process_document_bytes(sample_csv().as_bytes(), Some("csv"), &options())
            .expect("process csv");
        assert_eq!(report.statistics, aggregate(&report.records));
    }

    #[test]
    fn timeline_is_newest_first_and_truncated() {
        let mut opts = options();
        opts.max_timeline_items = Some(2);
        let report = process_document_bytes(sample_csv().as_bytes(), Some("csv"), &opts)
            .expect("process csv");
        let ids = report.timeline.iter().map(|t| t.record.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["121110", "120875"]);
        assert_eq!(report.records.len(), 3);
    }

    #[test]
    fn row_order_does_not_change_the_result_set() {
        let csv = sample_csv();
        let mut lines = csv.lines().collect::<Vec<_>>();
        let header = lines.remove(0);
        lines.reverse();
        let reversed = std::iter::once(header).chain(lines).collect::<Vec<_>>().join("\n");

        let opts = ReportOptions {
            max_timeline_items: None,
            ..options()
        };
        let a = process_document_bytes(csv.as_bytes(), Some("csv"), &opts).expect("forward");
        let b = process_document_bytes(reversed.as_bytes(), Some("csv"), &opts).expect("reversed");
        assert_eq!(a.statistics.total_unpaid_count, b.statistics.total_unpaid_count);
        assert_eq!(a.statistics.unique_creditor_count, b.statistics.unique_creditor_count);
        assert!((a.statistics.total_pending_amount - b.statistics.total_pending_amount).abs() < 1e-9);
        assert_eq!(a.timeline, b.timeline);
    }

    #[test]
    fn malformed_rows_are_skipped_without_aborting() {
        let header = ["SAÍDA ORIGEM", "DATA DE PAGAMENTO", "VALOR À PAGAR", "NOME CREDOR"]
            .iter()
            .map(|s| CellValue::from_text(s))
            .collect::<Vec<_>>();
        let rows = vec![
            header,
            vec![
                CellValue::Text(ago(3)),
                CellValue::Empty,
                CellValue::Invalid("#DIV/0!".to_string()),
                CellValue::Text("A".into()),
            ],
            vec![
                CellValue::Text(ago(3)),
                CellValue::Empty,
                CellValue::Number(42.0),
                CellValue::Text("B".into()),
            ],
        ];
        let report = build_report(&rows, &options()).expect("build report");
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].creditor_name, "B");
        assert_eq!(report.skipped_rows.len(), 1);
        assert_eq!(report.skipped_rows[0].line, 2);
        assert!(report.skipped_rows[0].message.contains("#DIV/0!"));
    }

    #[test]
    fn empty_document_is_an_error() {
        assert!(matches!(
            build_report(&[], &options()),
            Err(DiariaError::EmptyDocument)
        ));
        assert!(matches!(
            process_document_bytes(b"", Some("csv"), &options()),
            Err(DiariaError::EmptyDocument)
        ));
    }

    #[test]
    fn missing_columns_fail_strictly_or_yield_an_empty_report() {
        let csv = "ID;NOME CREDOR;DATA DE PAGAMENTO\n1;A;\n";
        match process_document_bytes(csv.as_bytes(), Some("csv"), &options()) {
            Err(DiariaError::MissingColumns { fields }) => assert_eq!(
                fields,
                vec![ColumnField::DepartureDate, ColumnField::AmountDue]
            ),
            other => panic!("expected MissingColumns, got {other:?}"),
        }

        let lenient = ReportOptions {
            strict_missing_columns: false,
            ..options()
        };
        let report = process_document_bytes(csv.as_bytes(), Some("csv"), &lenient)
            .expect("lenient report");
        assert!(report.records.is_empty());
        assert_eq!(report.statistics, Statistics::default());
        assert_eq!(report.missing_columns.len(), 2);
    }

    #[test]
    fn destination_fallback_reads_sixteenth_column() {
        let mut header = vec!["SAÍDA ORIGEM", "DATA DE PAGAMENTO", "VALOR À PAGAR"];
        header.resize(16, "EXTRA");
        let mut row = vec![ago(2), String::new(), "10".to_string()];
        row.resize(15, String::new());
        row.push("GUARULHOS".to_string());
        let csv = format!("{}\n{}\n", header.join(","), row.join(","));

        let report = process_document_bytes(csv.as_bytes(), Some("csv"), &options())
            .expect("process csv");
        assert!(report.destination_fallback);
        assert_eq!(report.records[0].destination, "GUARULHOS");
        assert!(!report.column_mapping.contains_key("destination"));
    }

    #[test]
    fn json_payload_carries_display_fields() {
        let report = process_document_bytes(sample_csv().as_bytes(), Some("csv"), &options())
            .expect("process csv");
        let payload = report_to_json(&report);
        assert_eq!(
            payload["statistics"]["total_pending_amount_text"],
            "R$ 1.665,44"
        );
        assert_eq!(payload["cutoff_text"], format_day(reference() - Duration::days(60)));
        assert_eq!(payload["records"][0]["amount_text"], "69.16");
        let first = &payload["timeline"][0];
        assert_eq!(first["id"], "121110");
        assert_eq!(first["completed_stages"], 2);
        assert_eq!(first["request_date_text"], ago(3));
        assert_eq!(first["steps"][2]["state"], "current");
        assert_eq!(payload["column_mapping"]["departure_date"], "SAÍDA ORIGEM");
    }

    #[test]
    fn documents_on_disk_go_through_the_same_pipeline() {
        let path = create_temp_path("diarias_report_fixture", "csv");
        fs::write(&path, sample_csv()).expect("write temp csv");
        let report = process_document_path(&path, &options()).expect("process path");
        assert_eq!(report.statistics.total_unpaid_count, 3);
        let _ = fs::remove_file(&path);
    }
}
