use crate::error::{ReportError, Result};
use crate::types::{DrilldownRow, ReportTables, SummaryRow, TopProductRow};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

fn export_err(path: &Path, e: impl ToString) -> ReportError {
    ReportError::Export {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| export_err(path, e))?;
    for r in rows {
        wtr.serialize(r).map_err(|e| export_err(path, e))?;
    }
    wtr.flush().map_err(|e| export_err(path, e))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value).map_err(|e| export_err(path, e))?;
    std::fs::write(path, s).map_err(|e| export_err(path, e))?;
    Ok(())
}

/// Write the report tables into `dir`, returning the files created.
pub fn export(tables: &ReportTables, dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
    let stem = tables.file_stem();
    match format {
        ExportFormat::Xlsx => {
            let path = dir.join(format!("{}.xlsx", stem));
            write_workbook(&path, tables)?;
            Ok(vec![path])
        }
        ExportFormat::Csv => {
            let summary = dir.join(format!("{}_summary.csv", stem));
            let drilldown = dir.join(format!("{}_drilldown.csv", stem));
            let top = dir.join(format!("{}_top_products.csv", stem));
            let stats = dir.join(format!("{}_stats.json", stem));
            write_csv(&summary, &tables.summary)?;
            write_csv(&drilldown, &tables.drilldown)?;
            write_csv(&top, &tables.top_products)?;
            write_json(&stats, &tables.stats)?;
            Ok(vec![summary, drilldown, top, stats])
        }
    }
}

/// One sheet per table: `Summary`, `Detailed Report`, `Top Products`.
pub fn write_workbook(path: &Path, tables: &ReportTables) -> Result<()> {
    let build = || -> std::result::Result<Workbook, XlsxError> {
        let mut wb = Workbook::new();
        let bold = Format::new().set_bold();
        let money = Format::new().set_num_format("#,##0.00");

        let ws = wb.add_worksheet().set_name("Summary")?;
        header(
            ws,
            &["Category", "Total Quantity Sold", "Total Amount", "Revenue Share %", "Quantity Share %"],
            &bold,
        )?;
        for (i, r) in tables.summary.iter().enumerate() {
            let row = i as u32 + 1;
            write_summary_row(ws, row, r, &money)?;
        }

        let ws = wb.add_worksheet().set_name("Detailed Report")?;
        header(ws, &["Category", "Price", "Total Quantity Sold", "Total Amount"], &bold)?;
        for (i, r) in tables.drilldown.iter().enumerate() {
            let row = i as u32 + 1;
            write_drilldown_row(ws, row, r, &money)?;
        }

        let ws = wb.add_worksheet().set_name("Top Products")?;
        header(ws, &["Product", "Total Quantity Sold", "Total Amount", "Category"], &bold)?;
        for (i, r) in tables.top_products.iter().enumerate() {
            let row = i as u32 + 1;
            write_top_row(ws, row, r, &money)?;
        }
        Ok(wb)
    };
    let mut wb = build().map_err(|e| export_err(path, e))?;
    wb.save(path).map_err(|e| export_err(path, e))?;
    Ok(())
}

fn header(ws: &mut Worksheet, names: &[&str], bold: &Format) -> std::result::Result<(), XlsxError> {
    for (col, name) in names.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *name, bold)?;
    }
    Ok(())
}

fn write_summary_row(
    ws: &mut Worksheet,
    row: u32,
    r: &SummaryRow,
    money: &Format,
) -> std::result::Result<(), XlsxError> {
    ws.write_string(row, 0, r.category.as_str())?;
    ws.write_number(row, 1, r.total_quantity)?;
    ws.write_number_with_format(row, 2, r.total_amount, money)?;
    ws.write_number(row, 3, r.revenue_share_pct)?;
    ws.write_number(row, 4, r.quantity_share_pct)?;
    Ok(())
}

fn write_drilldown_row(
    ws: &mut Worksheet,
    row: u32,
    r: &DrilldownRow,
    money: &Format,
) -> std::result::Result<(), XlsxError> {
    ws.write_string(row, 0, r.category.as_str())?;
    ws.write_number_with_format(row, 1, r.price, money)?;
    ws.write_number(row, 2, r.total_quantity)?;
    ws.write_number_with_format(row, 3, r.total_amount, money)?;
    Ok(())
}

fn write_top_row(
    ws: &mut Worksheet,
    row: u32,
    r: &TopProductRow,
    money: &Format,
) -> std::result::Result<(), XlsxError> {
    ws.write_string(row, 0, &r.product_name)?;
    ws.write_number(row, 1, r.total_quantity)?;
    ws.write_number_with_format(row, 2, r.total_amount, money)?;
    ws.write_string(row, 3, r.category.as_str())?;
    Ok(())
}

/// Render the first `max_rows` rows as a markdown table.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_table(rows, max_rows));
}
