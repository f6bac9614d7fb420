// Utility helpers for parsing and formatting.
//
// This module centralizes the "dirty" cell handling (numbers with currency
// markers and thousands separators, dates in many layouts) so the rest of the
// engine can assume clean, typed values.
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

const CURRENCY_MARKERS: [&str; 5] = ["BDT", "Tk.", "TK", "৳", "$"];

/// Parse a text cell into `f64` while being forgiving about formatting
/// issues that are common in sales exports.
///
/// - Trims whitespace.
/// - Strips currency markers (`TK`, `Tk.`, `৳`, `$`, `BDT`) and `","`.
/// - Returns `None` for anything that cannot be safely parsed, including
///   `NaN` and infinities.
pub fn parse_f64_lenient(s: &str) -> Option<f64> {
    let mut s = s.trim().to_string();
    for marker in CURRENCY_MARKERS {
        s = s.replace(marker, "");
    }
    let s = s.replace(',', "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

const DATE_FORMATS: [&str; 11] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];

/// Best-effort calendar date parsing. Day-first wins for ambiguous
/// slashed dates.
pub fn parse_date_lenient(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Largest serial Excel accepts (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Convert an Excel 1900-system serial day number into a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // 1899-12-30 absorbs Excel's fictitious 1900-02-29.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Round to two decimals, halves away from zero.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Each part's percentage of their sum, in hundredths of a percent, summing
/// to exactly 100.00 when the sum is positive.
///
/// Shares are rounded half away from zero, then the residual is handed out
/// one hundredth at a time by largest remainder (ties go to the earlier
/// part). A non-positive sum yields all zeros.
pub fn shares_pct(parts: &[f64]) -> Vec<f64> {
    let whole: f64 = parts.iter().sum();
    if whole <= 0.0 || !whole.is_finite() {
        return vec![0.0; parts.len()];
    }
    let exact: Vec<f64> = parts.iter().map(|p| p / whole * 10_000.0).collect();
    let mut cents: Vec<i64> = exact.iter().map(|e| e.round() as i64).collect();
    let remainders: Vec<f64> = exact
        .iter()
        .zip(&cents)
        .map(|(e, c)| e - *c as f64)
        .collect();

    let residual = 10_000 - cents.iter().sum::<i64>();
    if residual != 0 && !cents.is_empty() {
        let mut order: Vec<usize> = (0..cents.len()).collect();
        // stable: equal remainders keep input order
        if residual > 0 {
            order.sort_by(|&a, &b| remainders[b].total_cmp(&remainders[a]));
        } else {
            order.sort_by(|&a, &b| remainders[a].total_cmp(&remainders[b]));
        }
        let step = residual.signum();
        for &i in order.iter().cycle().take(residual.unsigned_abs() as usize) {
            cents[i] += step;
        }
    }
    cents.into_iter().map(|c| c as f64 / 100.0).collect()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with a fixed number of decimal places and
    // locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = match int_part.parse::<u64>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        // beyond u64: keep the digits ungrouped rather than lose them
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Render a number the way a spreadsheet shows it in a text column:
/// integers without a fractional part.
pub fn number_to_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
