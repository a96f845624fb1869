use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::cell_value::CellValue;
use crate::error::{DiariaError, Result};

/// Zero-based Destination column used when no header is labelled `DESTINO`.
/// Older exports always carried it in the 16th column.
pub const DESTINATION_FALLBACK_INDEX: usize = 15;

pub const REQUIRED_FIELDS: [ColumnField; 3] = [
    ColumnField::DepartureDate,
    ColumnField::PaymentDate,
    ColumnField::AmountDue,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnField {
    RecordId,
    CreditorName,
    DepartureDate,
    ArrivalDate,
    PaymentDate,
    AmountDue,
    RequestDate,
    SupervisorApprovalDate,
    AuthorizingOfficerApprovalDate,
    Status,
    Reason,
    TotalPaid,
    Destination,
}

#[derive(Debug, Clone, Copy)]
enum MatchRule {
    Exact,
    Contains,
}

#[derive(Debug)]
struct HeaderSpec {
    field: ColumnField,
    rule: MatchRule,
}

const HEADER_SPECS: &[HeaderSpec] = &[
    HeaderSpec {
        field: ColumnField::RecordId,
        rule: MatchRule::Exact,
    },
    HeaderSpec {
        field: ColumnField::CreditorName,
        rule: MatchRule::Contains,
    },
    HeaderSpec {
        field: ColumnField::DepartureDate,
        rule: MatchRule::Exact,
    },
    HeaderSpec {
        field: ColumnField::ArrivalDate,
        rule: MatchRule::Exact,
    },
    HeaderSpec {
        field: ColumnField::PaymentDate,
        rule: MatchRule::Exact,
    },
    HeaderSpec {
        field: ColumnField::AmountDue,
        rule: MatchRule::Contains,
    },
    HeaderSpec {
        field: ColumnField::RequestDate,
        rule: MatchRule::Exact,
    },
    HeaderSpec {
        field: ColumnField::SupervisorApprovalDate,
        rule: MatchRule::Contains,
    },
    HeaderSpec {
        field: ColumnField::AuthorizingOfficerApprovalDate,
        rule: MatchRule::Contains,
    },
    HeaderSpec {
        field: ColumnField::Status,
        rule: MatchRule::Exact,
    },
    HeaderSpec {
        field: ColumnField::Reason,
        rule: MatchRule::Exact,
    },
    HeaderSpec {
        field: ColumnField::TotalPaid,
        rule: MatchRule::Contains,
    },
    HeaderSpec {
        field: ColumnField::Destination,
        rule: MatchRule::Exact,
    },
];

impl ColumnField {
    /// Upper-case header label (or label fragment) the field is recognised by.
    pub fn header_label(&self) -> &'static str {
        match self {
            ColumnField::RecordId => "ID",
            ColumnField::CreditorName => "NOME CREDOR",
            ColumnField::DepartureDate => "SAÍDA ORIGEM",
            ColumnField::ArrivalDate => "CHEGADA DESTINO",
            ColumnField::PaymentDate => "DATA DE PAGAMENTO",
            ColumnField::AmountDue => "VALOR À PAGAR",
            ColumnField::RequestDate => "DATA SOLICITAÇÃO",
            ColumnField::SupervisorApprovalDate => "CHEFE IMEDIATO",
            ColumnField::AuthorizingOfficerApprovalDate => "ORDENADOR",
            ColumnField::Status => "STATUS",
            ColumnField::Reason => "MOTIVO",
            ColumnField::TotalPaid => "TOTAL PAGO",
            ColumnField::Destination => "DESTINO",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ColumnField::RecordId => "record_id",
            ColumnField::CreditorName => "creditor_name",
            ColumnField::DepartureDate => "departure_date",
            ColumnField::ArrivalDate => "arrival_date",
            ColumnField::PaymentDate => "payment_date",
            ColumnField::AmountDue => "amount_due",
            ColumnField::RequestDate => "request_date",
            ColumnField::SupervisorApprovalDate => "supervisor_approval_date",
            ColumnField::AuthorizingOfficerApprovalDate => "authorizing_officer_approval_date",
            ColumnField::Status => "status",
            ColumnField::Reason => "reason",
            ColumnField::TotalPaid => "total_paid",
            ColumnField::Destination => "destination",
        }
    }
}

impl fmt::Display for ColumnField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_label())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    indices: BTreeMap<ColumnField, usize>,
    destination_fallback: bool,
}

impl ColumnMap {
    pub fn get(&self, field: ColumnField) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    pub fn missing_required(&self) -> Vec<ColumnField> {
        REQUIRED_FIELDS
            .iter()
            .filter(|f| !self.indices.contains_key(*f))
            .copied()
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let fields = self.missing_required();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(DiariaError::MissingColumns { fields })
        }
    }

    pub fn uses_destination_fallback(&self) -> bool {
        self.destination_fallback
    }

    /// Field key → header text actually matched, for previews. A fallback
    /// destination column was never matched, so it is left out.
    pub fn header_labels(&self, header: &[CellValue]) -> BTreeMap<String, String> {
        let mut mapping = BTreeMap::new();
        for (field, idx) in &self.indices {
            if *field == ColumnField::Destination && self.destination_fallback {
                continue;
            }
            if let Some(label) = header.get(*idx).and_then(CellValue::as_text) {
                mapping.insert(field.key().to_string(), label);
            }
        }
        mapping
    }
}

fn normalize_header(cell: &CellValue) -> Option<String> {
    cell.as_text().map(|text| text.trim().to_uppercase())
}

fn header_matches(header: &str, spec: &HeaderSpec) -> bool {
    let label = spec.field.header_label();
    match spec.rule {
        MatchRule::Exact => header == label,
        MatchRule::Contains => header.contains(label),
    }
}

/// Maps header labels to column positions. A later column matching the same
/// field replaces an earlier one.
pub fn resolve_columns(header: &[CellValue]) -> ColumnMap {
    let mut indices = BTreeMap::new();
    for (idx, cell) in header.iter().enumerate() {
        let Some(text) = normalize_header(cell) else {
            continue;
        };
        for spec in HEADER_SPECS {
            if header_matches(&text, spec) {
                indices.insert(spec.field, idx);
            }
        }
    }

    let destination_fallback = !indices.contains_key(&ColumnField::Destination);
    if destination_fallback {
        indices.insert(ColumnField::Destination, DESTINATION_FALLBACK_INDEX);
    }

    ColumnMap {
        indices,
        destination_fallback,
    }
}
