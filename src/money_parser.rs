use crate::cell_value::CellValue;

/// Amount held by a cell. Numbers pass through untouched; anything that does
/// not read as an amount counts as zero.
pub fn parse_money(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Number(v) => *v,
        CellValue::Text(text) => parse_money_text(text),
        CellValue::Empty | CellValue::Date(_) | CellValue::Invalid(_) => 0.0,
    }
}

pub fn parse_money_text(raw: &str) -> f64 {
    let cleaned = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect::<String>();
    if cleaned.is_empty() {
        return 0.0;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let normalized = match (last_comma, last_dot) {
        // 1.234,56
        (Some(comma), dot) if dot.map_or(true, |dot| comma > dot) => {
            cleaned.replace('.', "").replace(',', ".")
        }
        (_, Some(dot)) => {
            if cleaned.len() - dot - 1 == 2 {
                // 1,234.56
                cleaned.replace(',', "")
            } else {
                // 1.234 / 1.234.567 / 1234.5
                cleaned.replace(['.', ','], "")
            }
        }
        _ => cleaned,
    };

    normalized.parse::<f64>().unwrap_or(0.0)
}

pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

/// pt-BR currency text, e.g. "R$ 1.234,56".
pub fn format_brl(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits = int_part.chars().collect::<Vec<_>>();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("R$ {sign}{grouped},{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn decimal_separator_follows_the_rightmost_mark() {
        assert_close(parse_money(&text("1.234,56")), 1234.56);
        assert_close(parse_money(&text("1234.56")), 1234.56);
        assert_close(parse_money(&text("1,234.56")), 1234.56);
        assert_close(parse_money(&text("R$ 69,16")), 69.16);
        assert_close(parse_money(&text("1.234.567,89")), 1234567.89);
    }

    #[test]
    fn three_digit_tail_after_dot_is_a_thousands_group() {
        assert_close(parse_money(&text("1.234")), 1234.0);
        assert_close(parse_money(&text("R$ 2.500.000")), 2_500_000.0);
    }

    #[test]
    fn dot_without_two_digit_tail_is_a_thousands_mark() {
        assert_close(parse_money(&text("1234.5")), 12345.0);
        assert_close(parse_money(&text("0.125")), 125.0);
        assert_close(parse_money(&text("0.1")), 1.0);
    }

    #[test]
    fn separator_free_text_parses_directly() {
        assert_close(parse_money(&text("345")), 345.0);
        assert_close(parse_money(&text("R$ 42")), 42.0);
    }

    #[test]
    fn negative_amounts_keep_their_sign() {
        assert_close(parse_money(&text("-R$ 1.000,50")), -1000.5);
    }

    #[test]
    fn empty_and_garbage_yield_zero() {
        assert_close(parse_money(&text("")), 0.0);
        assert_close(parse_money(&CellValue::Empty), 0.0);
        assert_close(parse_money(&text("sem valor")), 0.0);
        assert_close(parse_money(&text("1-2-3")), 0.0);
        assert_close(parse_money(&CellValue::Invalid("#N/A".into())), 0.0);
    }

    #[test]
    fn numeric_cells_pass_through() {
        assert_close(parse_money(&CellValue::Number(345.78)), 345.78);
    }

    #[test]
    fn formats_fixed_and_brl_text() {
        assert_eq!(format_amount(69.16), "69.16");
        assert_eq!(format_amount(345.0), "345.00");
        assert_eq!(format_brl(414.94), "R$ 414,94");
        assert_eq!(format_brl(1234567.891), "R$ 1.234.567,89");
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(-1500.0), "R$ -1.500,00");
    }
}
