//! One report run over one dataset.
//!
//! Stages: resolve columns, normalize and classify each row, aggregate,
//! label the timeframe. The run is atomic: it either returns every table or
//! an error, never a partial report.

use crate::category::Category;
use crate::classifier::Classifier;
use crate::columns::{resolve_roles, ColumnOverrides};
use crate::config::Config;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, EventKind, EventLog};
use crate::error::{ReportError, Result};
use crate::normalize::Normalizer;
use crate::reports::aggregate;
use crate::timeframe;
use crate::types::{ColumnRoleMap, Dataset, NormalizedRow, ReportTables, Role, SummaryStats};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, info, info_span};

pub struct Engine {
    config: Config,
    classifier: Classifier,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let classifier = Classifier::new(&config.classifier);
        Self { config, classifier }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn resolve(&self, dataset: &Dataset, overrides: &ColumnOverrides) -> Result<ColumnRoleMap> {
        if dataset.columns.is_empty() {
            return Err(ReportError::EmptyDataset);
        }
        resolve_roles(dataset, &self.config.columns, overrides)
    }

    /// Run the whole pipeline. Diagnostic events reach `sink` whether the
    /// run succeeds or fails; on failure an `unexpected_failure` event is
    /// appended and no tables are returned.
    pub fn run(
        &self,
        dataset: &Dataset,
        overrides: &ColumnOverrides,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ReportTables> {
        let span = info_span!("report", rows = dataset.rows.len());
        let _enter = span.enter();

        let map = self.resolve(dataset, overrides)?;
        for (role, col) in map.iter() {
            info!(%role, column = %col.name, "column resolved");
        }

        let mut buffer = EventLog::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.process(dataset, &map, &mut buffer)
        }));
        let outcome = match outcome {
            Ok(result) => result,
            Err(payload) => Err(ReportError::Unexpected(panic_message(payload.as_ref()))),
        };
        let outcome = outcome.map_err(|e| match e {
            ReportError::Unexpected(message) => message,
            other => other.to_string(),
        });

        buffer.drain_into(sink);
        match outcome {
            Ok(tables) => {
                info!(stats = %tables.stats, timeframe = %tables.stats.timeframe, "report ready");
                Ok(tables)
            }
            Err(message) => {
                error!(error = %message, "report run failed");
                sink.record(DiagnosticEvent::now(EventKind::UnexpectedFailure {
                    message: message.clone(),
                }));
                Err(ReportError::Unexpected(message))
            }
        }
    }

    fn process(
        &self,
        dataset: &Dataset,
        map: &ColumnRoleMap,
        buffer: &mut EventLog,
    ) -> Result<ReportTables> {
        let normalizer = Normalizer::new(map, &self.classifier, &self.config.placeholder_name);
        let rows: Vec<NormalizedRow> = dataset
            .rows
            .iter()
            .enumerate()
            .map(|(i, raw)| normalizer.normalize(i + 1, raw, &mut *buffer))
            .collect();

        let uncategorized = uncategorized_products(&rows);
        let uncategorized_rows = rows.iter().filter(|r| r.category == Category::Others).count();
        if !uncategorized.is_empty() {
            info!(products = uncategorized.len(), rows = uncategorized_rows, "uncategorized products");
            buffer.record(DiagnosticEvent::now(EventKind::UncategorizedBatch {
                count: uncategorized.len(),
                products: uncategorized,
            }));
        }

        let aggregates = aggregate(&rows, self.config.top_products_limit);
        let total_quantity: f64 = aggregates.summary.iter().map(|r| r.total_quantity).sum();
        let total_revenue: f64 = aggregates.summary.iter().map(|r| r.total_amount).sum();
        if !total_quantity.is_finite() || !total_revenue.is_finite() {
            return Err(ReportError::Unexpected(
                "totals overflowed; check cost and quantity columns".to_string(),
            ));
        }

        let stats = SummaryStats {
            total_rows: rows.len(),
            total_quantity,
            total_revenue,
            total_categories: aggregates.summary.len(),
            uncategorized_rows,
            data_quality: buffer.quality_counts(),
            timeframe: self.timeframe(dataset, map, &rows),
        };

        Ok(ReportTables {
            summary: aggregates.summary,
            drilldown: aggregates.drilldown,
            top_products: aggregates.top_products,
            stats,
        })
    }

    fn timeframe(&self, dataset: &Dataset, map: &ColumnRoleMap, rows: &[NormalizedRow]) -> String {
        let dates: Vec<_> = rows.iter().filter_map(|r| r.date).collect();
        if !dates.is_empty() {
            return timeframe::label(&dates);
        }
        match map.get(Role::Date) {
            Some(col) => timeframe::fallback_label(dataset.rows.iter().map(|r| r.get(col.index))),
            None => String::new(),
        }
    }
}

/// Distinct product names classified `Others`, in first-seen order.
fn uncategorized_products(rows: &[NormalizedRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for r in rows {
        if r.category == Category::Others && seen.insert(r.product_name.as_str()) {
            out.push(r.product_name.clone());
        }
    }
    out
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown internal failure".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellValue, RawRow};

    fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::new(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| RawRow::new(r.iter().map(|c| CellValue::from_text(c)).collect()))
                .collect(),
        )
    }

    #[test]
    fn uncategorized_batch_is_single_event() {
        let ds = dataset(
            &["Item Name", "Item Cost", "Quantity"],
            &[
                &["Gift Voucher", "100", "1"],
                &["Gift Voucher", "100", "2"],
                &["Socks", "50", "1"],
                &["Polo", "500", "1"],
            ],
        );
        let engine = Engine::new(Config::default());
        let mut log = EventLog::new();
        let tables = engine.run(&ds, &ColumnOverrides::default(), &mut log).unwrap();
        assert_eq!(log.count("uncategorized_batch"), 1);
        match &log.events[0].kind {
            EventKind::UncategorizedBatch { count, products } => {
                assert_eq!(*count, 2);
                assert_eq!(products, &vec!["Gift Voucher".to_string(), "Socks".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(tables.stats.uncategorized_rows, 3);
    }

    #[test]
    fn unresolved_columns_fail_without_events() {
        let ds = dataset(&["Product", "Colour"], &[&["Polo", "Red"]]);
        let engine = Engine::new(Config::default());
        let mut log = EventLog::new();
        let err = engine.run(&ds, &ColumnOverrides::default(), &mut log).unwrap_err();
        assert!(err.is_configuration());
        assert!(log.events.is_empty());
    }

    #[test]
    fn empty_header_is_rejected() {
        let engine = Engine::new(Config::default());
        let mut log = EventLog::new();
        let err = engine
            .run(&Dataset::default(), &ColumnOverrides::default(), &mut log)
            .unwrap_err();
        assert!(matches!(err, ReportError::EmptyDataset));
    }

    #[test]
    fn overflowing_totals_fail_atomically() {
        let ds = dataset(
            &["Item Name", "Item Cost", "Quantity"],
            &[&["Polo", "1e308", "10"], &["Polo", "1e308", "10"]],
        );
        let engine = Engine::new(Config::default());
        let mut log = EventLog::new();
        let err = engine.run(&ds, &ColumnOverrides::default(), &mut log).unwrap_err();
        assert!(matches!(err, ReportError::Unexpected(_)));
        assert_eq!(log.count("unexpected_failure"), 1);
    }

    #[test]
    fn timeframe_falls_back_to_raw_date_text() {
        let ds = dataset(
            &["Item Name", "Item Cost", "Quantity", "Date"],
            &[&["Polo", "500", "1", "Spring Sale/Week 1"]],
        );
        let engine = Engine::new(Config::default());
        let mut log = EventLog::new();
        let tables = engine.run(&ds, &ColumnOverrides::default(), &mut log).unwrap();
        assert_eq!(tables.stats.timeframe, "Spring_Sale_Week_1");
        assert_eq!(tables.stats.data_quality.invalid_dates, 1);
        assert_eq!(tables.file_stem(), "Sales_Report_Spring_Sale_Week_1");
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload = std::panic::catch_unwind(|| panic!("kaboom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "kaboom");
    }
}
