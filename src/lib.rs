//! Sales line-item categorization and report engine.
//!
//! Raw rows are resolved to column roles, normalized, classified by an
//! ordered keyword table and aggregated into a category summary, a
//! price-wise drilldown and a top-products ranking.

pub mod category;
pub mod classifier;
pub mod columns;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod timeframe;
pub mod types;
pub mod util;

pub use category::Category;
pub use classifier::{classify, Classifier, RuleTable};
pub use columns::{resolve, ColumnAliases, ColumnOverrides};
pub use config::Config;
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, EventKind, EventLog, JsonLinesSink};
pub use error::ReportError;
pub use pipeline::Engine;
pub use types::{
    CellValue, ColumnRoleMap, Dataset, DrilldownRow, NormalizedRow, RawRow, ReportTables, Role,
    SummaryRow, TopProductRow,
};
