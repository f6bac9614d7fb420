//! Raw row to [`NormalizedRow`] coercion.
//!
//! Invalid cells never fail a row: numbers fall back to 0, negative values
//! clamp to 0, names fall back to a placeholder and bad dates are dropped.
//! Each recovery is reported to the sink as a data-quality event.

use crate::classifier::Classifier;
use crate::diagnostics::{DataQualityIssue, DiagnosticEvent, DiagnosticSink, EventKind};
use crate::types::{CellValue, ColumnRoleMap, NormalizedRow, RawRow, Role};
use crate::util::{excel_serial_to_date, number_to_text, parse_date_lenient, parse_f64_lenient};
use chrono::NaiveDate;
use tracing::debug;

pub const DEFAULT_PLACEHOLDER_NAME: &str = "Unknown Product";

pub struct Normalizer<'a> {
    map: &'a ColumnRoleMap,
    classifier: &'a Classifier,
    placeholder: &'a str,
}

impl<'a> Normalizer<'a> {
    pub fn new(map: &'a ColumnRoleMap, classifier: &'a Classifier, placeholder: &'a str) -> Self {
        Self {
            map,
            classifier,
            placeholder,
        }
    }

    fn cell<'r>(&self, raw: &'r RawRow, role: Role) -> &'r CellValue {
        match self.map.get(role) {
            Some(col) => raw.get(col.index),
            None => &CellValue::Empty,
        }
    }

    /// Normalize and classify one row. `row` is the 1-based data row number
    /// used in events.
    pub fn normalize(
        &self,
        row: usize,
        raw: &RawRow,
        sink: &mut dyn DiagnosticSink,
    ) -> NormalizedRow {
        let mut report = |issue: DataQualityIssue| {
            debug!(row, ?issue, "data quality issue");
            sink.record(DiagnosticEvent::now(EventKind::DataQuality { row, issue }));
        };

        let product_name = match self.cell(raw, Role::Name) {
            CellValue::Text(s) if !s.trim().is_empty() => s.clone(),
            CellValue::Number(n) => number_to_text(*n),
            _ => {
                report(DataQualityIssue::MissingName);
                self.placeholder.to_string()
            }
        };

        let mut unit_cost = coerce_number(self.cell(raw, Role::Cost), Role::Cost, &mut report);
        if unit_cost < 0.0 {
            report(DataQualityIssue::NegativeCost { value: unit_cost });
            unit_cost = 0.0;
        }

        let mut quantity =
            coerce_number(self.cell(raw, Role::Quantity), Role::Quantity, &mut report);
        if quantity < 0.0 {
            report(DataQualityIssue::NegativeQuantity { value: quantity });
            quantity = 0.0;
        }

        let date = if self.map.get(Role::Date).is_some() {
            coerce_date(self.cell(raw, Role::Date), &mut report)
        } else {
            None
        };

        let unit_cost = positive_zero(unit_cost);
        let quantity = positive_zero(quantity);
        let category = self.classifier.classify(&product_name);

        NormalizedRow {
            product_name,
            unit_cost,
            quantity,
            amount: positive_zero(unit_cost * quantity),
            category,
            date,
        }
    }
}

// -0.0 and 0.0 must land in the same drilldown group.
fn positive_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

fn coerce_number(cell: &CellValue, role: Role, report: &mut impl FnMut(DataQualityIssue)) -> f64 {
    let parsed = match cell {
        CellValue::Empty => return 0.0,
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Number(_) => None,
        CellValue::Text(s) => parse_f64_lenient(s),
        CellValue::Date(_) => None,
    };
    parsed.unwrap_or_else(|| {
        report(DataQualityIssue::InvalidNumber {
            role,
            value: cell.to_string(),
        });
        0.0
    })
}

fn coerce_date(cell: &CellValue, report: &mut impl FnMut(DataQualityIssue)) -> Option<NaiveDate> {
    let parsed = match cell {
        CellValue::Empty => return None,
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => excel_serial_to_date(*n),
        CellValue::Text(s) => parse_date_lenient(s),
    };
    if parsed.is_none() {
        report(DataQualityIssue::InvalidDate {
            value: cell.to_string(),
        });
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::columns::{resolve, ColumnAliases};
    use crate::diagnostics::EventLog;

    fn text(s: &str) -> CellValue {
        CellValue::from_text(s)
    }

    fn map_for(columns: &[&str]) -> ColumnRoleMap {
        let cols: Vec<String> = columns.iter().map(|s| s.to_string()).collect();
        resolve(&cols, &ColumnAliases::default())
    }

    #[test]
    fn clean_row() {
        let map = map_for(&["Item Name", "Item Cost", "Quantity", "Date"]);
        let classifier = Classifier::default();
        let n = Normalizer::new(&map, &classifier, DEFAULT_PLACEHOLDER_NAME);
        let mut log = EventLog::new();
        let row = RawRow::new(vec![
            text("Men's Polo Shirt"),
            CellValue::Number(500.0),
            text("3"),
            text("2024-03-05"),
        ]);
        let out = n.normalize(1, &row, &mut log);
        assert_eq!(out.product_name, "Men's Polo Shirt");
        assert_eq!(out.unit_cost, 500.0);
        assert_eq!(out.quantity, 3.0);
        assert_eq!(out.amount, 1500.0);
        assert_eq!(out.category, Category::Polo);
        assert_eq!(out.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert!(log.events.is_empty());
    }

    #[test]
    fn negative_quantity_is_clamped_once() {
        let map = map_for(&["Item Name", "Item Cost", "Quantity"]);
        let classifier = Classifier::default();
        let n = Normalizer::new(&map, &classifier, DEFAULT_PLACEHOLDER_NAME);
        let mut log = EventLog::new();
        let row = RawRow::new(vec![text("Classic T-Shirt"), text("450"), text("-5")]);
        let out = n.normalize(7, &row, &mut log);
        assert_eq!(out.quantity, 0.0);
        assert_eq!(out.amount, 0.0);
        assert!(out.amount.is_sign_positive());
        assert_eq!(log.count("data_quality"), 1);
        assert_eq!(
            log.events[0].kind,
            EventKind::DataQuality {
                row: 7,
                issue: DataQualityIssue::NegativeQuantity { value: -5.0 }
            }
        );
    }

    #[test]
    fn invalid_numbers_degrade_to_zero() {
        let map = map_for(&["Item Name", "Item Cost", "Quantity"]);
        let classifier = Classifier::default();
        let n = Normalizer::new(&map, &classifier, DEFAULT_PLACEHOLDER_NAME);
        let mut log = EventLog::new();
        let row = RawRow::new(vec![text("Belt"), text("n/a"), CellValue::Empty]);
        let out = n.normalize(1, &row, &mut log);
        assert_eq!(out.unit_cost, 0.0);
        assert_eq!(out.quantity, 0.0);
        // blank quantity is silent, unparseable cost is reported
        assert_eq!(log.quality_counts().invalid_numbers, 1);
        assert_eq!(log.events.len(), 1);
    }

    #[test]
    fn missing_name_uses_placeholder_and_still_classifies() {
        let map = map_for(&["Item Name", "Item Cost", "Quantity"]);
        let classifier = Classifier::default();
        let n = Normalizer::new(&map, &classifier, DEFAULT_PLACEHOLDER_NAME);
        let mut log = EventLog::new();
        let row = RawRow::new(vec![CellValue::Empty, text("100"), text("2")]);
        let out = n.normalize(1, &row, &mut log);
        assert_eq!(out.product_name, DEFAULT_PLACEHOLDER_NAME);
        assert_eq!(out.category, Category::Others);
        assert_eq!(out.amount, 200.0);
        assert_eq!(log.quality_counts().missing_names, 1);
    }

    #[test]
    fn numeric_names_are_rendered() {
        let map = map_for(&["Item Name", "Item Cost", "Quantity"]);
        let classifier = Classifier::default();
        let n = Normalizer::new(&map, &classifier, DEFAULT_PLACEHOLDER_NAME);
        let mut log = EventLog::new();
        let row = RawRow::new(vec![CellValue::Number(1042.0), text("10"), text("1")]);
        assert_eq!(n.normalize(1, &row, &mut log).product_name, "1042");
    }

    #[test]
    fn bad_dates_are_dropped_but_row_kept() {
        let map = map_for(&["Item Name", "Item Cost", "Quantity", "Sale Date"]);
        let classifier = Classifier::default();
        let n = Normalizer::new(&map, &classifier, DEFAULT_PLACEHOLDER_NAME);
        let mut log = EventLog::new();
        let row = RawRow::new(vec![text("Kaftan"), text("900"), text("1"), text("soon")]);
        let out = n.normalize(4, &row, &mut log);
        assert_eq!(out.date, None);
        assert_eq!(out.amount, 900.0);
        assert_eq!(log.quality_counts().invalid_dates, 1);

        let serial = RawRow::new(vec![
            text("Kaftan"),
            text("900"),
            text("1"),
            CellValue::Number(45356.0),
        ]);
        assert_eq!(
            n.normalize(5, &serial, &mut log).date,
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
    }

    #[test]
    fn negative_cost_is_clamped() {
        let map = map_for(&["Item Name", "Item Cost", "Quantity"]);
        let classifier = Classifier::default();
        let n = Normalizer::new(&map, &classifier, DEFAULT_PLACEHOLDER_NAME);
        let mut log = EventLog::new();
        let row = RawRow::new(vec![text("Wallet"), text("-20"), text("2")]);
        let out = n.normalize(1, &row, &mut log);
        assert_eq!(out.unit_cost, 0.0);
        assert_eq!(out.amount, 0.0);
        assert_eq!(log.quality_counts().negative_costs, 1);
    }
}
