//! Cell -> typed value coercion. Bad cells become `None`, never errors.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::model::Cell;

/// How a numeric field is expressed in the exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// Counts and currency amounts.
    Plain,
    /// Fractions (cvr, conversions). `"2,5%"` reads as `0.025`.
    Ratio,
    /// Percentage points (lost impression share). `"25%"` reads as `25.0`.
    PercentPoints,
}

pub fn to_number(cell: &Cell, kind: NumberKind) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => parse_number_text(s, kind),
        _ => None,
    }
}

fn parse_number_text(s: &str, kind: NumberKind) -> Option<f64> {
    let mut t: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    let percent = t.ends_with('%');
    if percent {
        t.pop();
    }
    for marker in ["R$", "$"] {
        if let Some(rest) = t.strip_prefix(marker) {
            t = rest.to_string();
        }
    }
    // Negative amounts may carry the sign before the currency marker.
    if let Some(rest) = t.strip_prefix("-R$") {
        t = format!("-{rest}");
    }

    let canonical = match (t.rfind(','), t.rfind('.')) {
        (Some(c), Some(d)) if c > d => t.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => t.replace(',', ""),
        // Repeated separators can only be digit grouping.
        (Some(_), None) if t.matches(',').count() > 1 => t.replace(',', ""),
        (Some(_), None) => t.replace(',', "."),
        (None, Some(_)) if t.matches('.').count() > 1 => t.replace('.', ""),
        (None, Some(d)) if kind == NumberKind::Plain && is_thousands_group(&t, d) => t.replace('.', ""),
        _ => t,
    };

    let n: f64 = canonical.parse().ok().filter(|n: &f64| n.is_finite())?;
    if percent && kind == NumberKind::Ratio {
        Some(n / 100.0)
    } else {
        Some(n)
    }
}

/// A lone `.` in a count or amount groups thousands (`"12.345"`, `"1.234"`)
/// when exactly three digits follow it and the integer part is not zero.
fn is_thousands_group(t: &str, dot: usize) -> bool {
    let (int, frac) = (&t[..dot], &t[dot + 1..]);
    let int = int.trim_start_matches('-');
    frac.len() == 3
        && frac.bytes().all(|b| b.is_ascii_digit())
        && !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && !int.trim_start_matches('0').is_empty()
}

/// Excel 1900-system serial day -> date. The 1899-12-30 epoch absorbs
/// Excel's phantom 1900-02-29, so serials from 61 (1900-03-01) on are exact.
/// Serials 1 to 60 land one day early; exports never carry them.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

/// Dates are read day-first, which is how the platform's locale writes them.
pub fn to_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => from_excel_serial(*n),
        Cell::Text(s) => {
            let s = s.trim();
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                        .map(|dt| dt.date())
                })
        }
        _ => None,
    }
}

pub fn to_text(cell: &Cell) -> Option<String> {
    let s = cell.display();
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Canonical listing id: display text without the marketplace prefix.
pub fn strip_marketplace_prefix(raw: &str, prefix: &str) -> String {
    let raw = raw.trim();
    let n = prefix.len();
    match raw.get(..n) {
        Some(head) if n > 0 && head.eq_ignore_ascii_case(prefix) => raw[n..].trim_start_matches(['-', ' ']).to_string(),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    #[test]
    fn numbers_pass_through() {
        assert_eq!(to_number(&Cell::Number(12.5), NumberKind::Plain), Some(12.5));
        assert_eq!(to_number(&Cell::Number(f64::NAN), NumberKind::Plain), None);
    }

    #[test]
    fn locale_formatted_text() {
        assert_eq!(to_number(&text("1.234,56"), NumberKind::Plain), Some(1234.56));
        assert_eq!(to_number(&text("1,234.56"), NumberKind::Plain), Some(1234.56));
        assert_eq!(to_number(&text("R$ 99,90"), NumberKind::Plain), Some(99.90));
        assert_eq!(to_number(&text("-R$ 5,00"), NumberKind::Plain), Some(-5.0));
        assert_eq!(to_number(&text("42"), NumberKind::Plain), Some(42.0));
    }

    #[test]
    fn brazilian_thousands_groups() {
        assert_eq!(to_number(&text("12.345"), NumberKind::Plain), Some(12345.0));
        assert_eq!(to_number(&text("1.234"), NumberKind::Plain), Some(1234.0));
        assert_eq!(to_number(&text("1.234.567"), NumberKind::Plain), Some(1234567.0));
        assert_eq!(to_number(&text("1,234,567"), NumberKind::Plain), Some(1234567.0));
        assert_eq!(to_number(&text("R$ 1.500"), NumberKind::Plain), Some(1500.0));
        assert_eq!(to_number(&text("-1.500"), NumberKind::Plain), Some(-1500.0));
    }

    #[test]
    fn lone_dot_stays_decimal_when_not_a_group() {
        assert_eq!(to_number(&text("12.5"), NumberKind::Plain), Some(12.5));
        assert_eq!(to_number(&text("0.500"), NumberKind::Plain), Some(0.5));
        assert_eq!(to_number(&text("1.2345"), NumberKind::Plain), Some(1.2345));
        assert_eq!(to_number(&text("0.125"), NumberKind::Ratio), Some(0.125));
        assert_eq!(to_number(&text("1.234"), NumberKind::Ratio), Some(1.234));
    }

    #[test]
    fn percent_text_depends_on_kind() {
        assert_eq!(to_number(&text("2,5%"), NumberKind::Ratio), Some(0.025));
        assert_eq!(to_number(&text("25%"), NumberKind::PercentPoints), Some(25.0));
        assert_eq!(to_number(&text("0.03"), NumberKind::Ratio), Some(0.03));
    }

    #[test]
    fn invalid_cells_become_missing() {
        assert_eq!(to_number(&text("-"), NumberKind::Plain), None);
        assert_eq!(to_number(&text("n/a"), NumberKind::Plain), None);
        assert_eq!(to_number(&Cell::Empty, NumberKind::Plain), None);
        assert_eq!(to_number(&Cell::Bool(true), NumberKind::Plain), None);
    }

    #[test]
    fn dates_from_text_serial_and_cells() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(to_date(&text("2024-03-05")), Some(d));
        assert_eq!(to_date(&text("05/03/2024")), Some(d));
        assert_eq!(to_date(&text("05/03/2024 00:00:00")), Some(d));
        assert_eq!(to_date(&Cell::Number(45356.0)), Some(d));
        assert_eq!(to_date(&Cell::Date(d)), Some(d));
        assert_eq!(to_date(&text("yesterday")), None);
        assert_eq!(to_date(&Cell::Number(-3.0)), None);
        assert_eq!(to_date(&Cell::Number(61.0)), NaiveDate::from_ymd_opt(1900, 3, 1));
    }

    #[test]
    fn prefix_stripping() {
        assert_eq!(strip_marketplace_prefix("MLB123", "MLB"), "123");
        assert_eq!(strip_marketplace_prefix("mlb-123", "MLB"), "123");
        assert_eq!(strip_marketplace_prefix("123", "MLB"), "123");
        assert_eq!(strip_marketplace_prefix(" 123 ", ""), "123");
    }

    #[test]
    fn text_trims_and_drops_blank() {
        assert_eq!(to_text(&text("  Ativa ")), Some("Ativa".into()));
        assert_eq!(to_text(&text("   ")), None);
        assert_eq!(to_text(&Cell::Number(7.0)), Some("7".into()));
    }
}
