use crate::category::Category;
use crate::util::{format_int, format_number};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

/// A single input cell, typed at the loader boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl CellValue {
    /// Classify a raw text cell: blank text becomes `Empty`.
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Empty => Ok(()),
        }
    }
}

/// One data row, cells in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    pub cells: Vec<CellValue>,
}

impl RawRow {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Missing trailing cells read as `Empty`.
    pub fn get(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&CellValue::Empty)
    }
}

/// A loaded table: header names plus typed rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { columns, rows }
    }

    /// Position of the first column whose trimmed name equals `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.columns.iter().position(|c| c.trim() == wanted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Name,
    Cost,
    Quantity,
    Date,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Name, Role::Cost, Role::Quantity, Role::Date];

    pub fn is_required(self) -> bool {
        !matches!(self, Role::Date)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Name => "name",
            Role::Cost => "cost",
            Role::Quantity => "quantity",
            Role::Date => "date",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    pub name: String,
    pub index: usize,
}

/// Role to source column assignment for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ColumnRoleMap {
    roles: BTreeMap<Role, ColumnRef>,
}

impl ColumnRoleMap {
    pub fn insert(&mut self, role: Role, column: ColumnRef) {
        self.roles.insert(role, column);
    }

    pub fn get(&self, role: Role) -> Option<&ColumnRef> {
        self.roles.get(&role)
    }

    pub fn contains_index(&self, index: usize) -> bool {
        self.roles.values().any(|c| c.index == index)
    }

    /// Required roles that have no column.
    pub fn missing_required(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| r.is_required() && !self.roles.contains_key(r))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &ColumnRef)> {
        self.roles.iter().map(|(r, c)| (*r, c))
    }
}

/// A cleaned and classified sales line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    pub product_name: String,
    pub unit_cost: f64,
    pub quantity: f64,
    pub amount: f64,
    pub category: Category,
    pub date: Option<NaiveDate>,
}

fn show_money(v: &f64) -> String {
    format_number(*v, 2)
}

fn show_qty(v: &f64) -> String {
    if v.fract() == 0.0 {
        format_number(*v, 0)
    } else {
        format_number(*v, 2)
    }
}

fn show_pct(v: &f64) -> String {
    format!("{:.2}%", v)
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct SummaryRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Total Quantity Sold")]
    #[tabled(rename = "Total Quantity Sold", display_with = "show_qty")]
    pub total_quantity: f64,
    #[serde(rename = "Total Amount")]
    #[tabled(rename = "Total Amount", display_with = "show_money")]
    pub total_amount: f64,
    #[serde(rename = "Revenue Share %")]
    #[tabled(rename = "Revenue Share %", display_with = "show_pct")]
    pub revenue_share_pct: f64,
    #[serde(rename = "Quantity Share %")]
    #[tabled(rename = "Quantity Share %", display_with = "show_pct")]
    pub quantity_share_pct: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DrilldownRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Price")]
    #[tabled(rename = "Price", display_with = "show_money")]
    pub price: f64,
    #[serde(rename = "Total Quantity Sold")]
    #[tabled(rename = "Total Quantity Sold", display_with = "show_qty")]
    pub total_quantity: f64,
    #[serde(rename = "Total Amount")]
    #[tabled(rename = "Total Amount", display_with = "show_money")]
    pub total_amount: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TopProductRow {
    #[serde(rename = "Product")]
    #[tabled(rename = "Product")]
    pub product_name: String,
    #[serde(rename = "Total Quantity Sold")]
    #[tabled(rename = "Total Quantity Sold", display_with = "show_qty")]
    pub total_quantity: f64,
    #[serde(rename = "Total Amount")]
    #[tabled(rename = "Total Amount", display_with = "show_money")]
    pub total_amount: f64,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: Category,
}

/// Per-kind counts of recovered data-quality issues.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityCounts {
    pub invalid_numbers: usize,
    pub negative_quantities: usize,
    pub negative_costs: usize,
    pub invalid_dates: usize,
    pub missing_names: usize,
}

impl QualityCounts {
    pub fn total(&self) -> usize {
        self.invalid_numbers
            + self.negative_quantities
            + self.negative_costs
            + self.invalid_dates
            + self.missing_names
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_rows: usize,
    pub total_quantity: f64,
    pub total_revenue: f64,
    pub total_categories: usize,
    pub uncategorized_rows: usize,
    pub data_quality: QualityCounts,
    pub timeframe: String,
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows, {} categories, quantity {}, revenue {}",
            format_int(self.total_rows as u64),
            self.total_categories,
            format_number(self.total_quantity, 0),
            format_number(self.total_revenue, 2)
        )
    }
}

/// Everything one run hands to the presentation/export layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTables {
    pub summary: Vec<SummaryRow>,
    pub drilldown: Vec<DrilldownRow>,
    pub top_products: Vec<TopProductRow>,
    pub stats: SummaryStats,
}

impl ReportTables {
    /// Export file stem, e.g. `Sales_Report_March_2024`.
    pub fn file_stem(&self) -> String {
        if self.stats.timeframe.is_empty() {
            "Sales_Report".to_string()
        } else {
            format!("Sales_Report_{}", self.stats.timeframe)
        }
    }
}
