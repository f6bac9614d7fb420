//! Filename suffix derived from the observed date range.

use crate::types::CellValue;
use chrono::{Datelike, NaiveDate};

const FALLBACK_MAX_CHARS: usize = 20;

/// `""` for no dates, `March_2024` for a single month, otherwise
/// `05Mar_to_20Apr_24`.
pub fn label(dates: &[NaiveDate]) -> String {
    let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
        return String::new();
    };
    if min.year() == max.year() && min.month() == max.month() {
        format!("{}", min.format("%B_%Y"))
    } else {
        format!("{}_to_{}", min.format("%d%b"), max.format("%d%b_%y"))
    }
}

/// Best-effort label from the first non-empty raw value of the date
/// column, used when none of its values parsed as dates.
pub fn fallback_label<'a>(cells: impl IntoIterator<Item = &'a CellValue>) -> String {
    let Some(first) = cells.into_iter().find(|c| !c.is_empty()) else {
        return String::new();
    };
    first
        .to_string()
        .trim()
        .chars()
        .take(FALLBACK_MAX_CHARS)
        .map(|c| if c == ' ' || c == '/' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn empty_dates_give_empty_label() {
        assert_eq!(label(&[]), "");
    }

    #[test]
    fn single_month() {
        assert_eq!(label(&[d(2024, 3, 20), d(2024, 3, 1)]), "March_2024");
        assert_eq!(label(&[d(2023, 12, 31)]), "December_2023");
    }

    #[test]
    fn spanning_range() {
        assert_eq!(
            label(&[d(2024, 4, 20), d(2024, 3, 5), d(2024, 3, 30)]),
            "05Mar_to_20Apr_24"
        );
        // same month number, different years
        assert_eq!(label(&[d(2023, 3, 1), d(2024, 3, 1)]), "01Mar_to_01Mar_24");
    }

    #[test]
    fn fallback_uses_first_non_empty_value() {
        let cells = vec![
            CellValue::Empty,
            CellValue::Text("Week 12/13 of the spring season".into()),
            CellValue::Text("ignored".into()),
        ];
        assert_eq!(fallback_label(&cells), "Week_12_13_of_the_sp");
        assert_eq!(fallback_label(&[CellValue::Empty]), "");
    }
}
