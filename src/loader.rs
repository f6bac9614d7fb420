// Input boundary: CSV and spreadsheet files into a typed `Dataset`.
//
// Loaders only type cells; they never interpret columns. Fully blank rows
// are skipped and counted.
use crate::error::{ReportError, Result};
use crate::types::{CellValue, Dataset, RawRow};
use crate::util::{excel_serial_to_date, number_to_text, parse_date_lenient};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub blank_rows: usize,
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Spreadsheet,
}

impl InputFormat {
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(InputFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(InputFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// Load a file, choosing the reader by extension.
pub fn load(path: &Path, sheet: Option<&str>) -> Result<(Dataset, LoadReport)> {
    let format = InputFormat::detect(path).ok_or_else(|| ReportError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let (dataset, report) = match format {
        InputFormat::Csv => load_csv(path)?,
        InputFormat::Spreadsheet => load_spreadsheet(path, sheet)?,
    };
    info!(
        path = %path.display(),
        columns = dataset.columns.len(),
        rows = dataset.rows.len(),
        blank = report.blank_rows,
        "dataset loaded"
    );
    Ok((dataset, report))
}

pub fn load_csv(path: &Path) -> Result<(Dataset, LoadReport)> {
    let file = std::fs::File::open(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file).map_err(|source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Read CSV from any reader. The first record is the header row.
pub fn read_csv<R: Read>(reader: R) -> std::result::Result<(Dataset, LoadReport), csv::Error> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        report.total_rows += 1;
        let cells: Vec<CellValue> = record.iter().map(CellValue::from_text).collect();
        if cells.iter().all(CellValue::is_empty) {
            report.blank_rows += 1;
            continue;
        }
        rows.push(RawRow::new(cells));
    }
    Ok((Dataset::new(columns, rows), report))
}

/// Read the named sheet, or the first one, of a workbook. The first
/// non-blank row is the header row.
pub fn load_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<(Dataset, LoadReport)> {
    let fail = |message: String| ReportError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| fail(e.to_string()))?;
    let sheet_name = match sheet {
        Some(s) => s.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| fail("workbook contains no sheets".to_string()))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| fail(format!("sheet '{}': {}", sheet_name, e)))?;
    debug!(sheet = %sheet_name, size = ?range.get_size(), "reading sheet");

    let mut report = LoadReport {
        sheet: Some(sheet_name),
        ..Default::default()
    };
    let mut rows_iter = range
        .rows()
        .map(|r| r.iter().map(cell_from_data).collect::<Vec<_>>());

    let header = rows_iter
        .by_ref()
        .find(|cells| !cells.iter().all(CellValue::is_empty))
        .ok_or(ReportError::EmptyDataset)?;
    let columns = header.iter().map(|c| c.to_string()).collect();

    let mut rows = Vec::new();
    for cells in rows_iter {
        report.total_rows += 1;
        if cells.iter().all(CellValue::is_empty) {
            report.blank_rows += 1;
            continue;
        }
        rows.push(RawRow::new(cells));
    }
    Ok((Dataset::new(columns, rows), report))
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::from_text(s),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
            Some(d) => CellValue::Date(d),
            None => CellValue::Text(number_to_text(dt.as_f64())),
        },
        Data::DateTimeIso(s) => match parse_date_lenient(s) {
            Some(d) => CellValue::Date(d),
            None => CellValue::from_text(s),
        },
        Data::DurationIso(s) => CellValue::from_text(s),
    }
}
