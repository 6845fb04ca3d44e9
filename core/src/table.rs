//! Tabular input boundary.
//!
//! The engine is agnostic to where a batch came from (CSV, spreadsheet,
//! API payload). Whatever reads the file hands us a `DataTable`: normalized
//! column names plus rows of loosely-typed cells. Everything downstream
//! works off this view.

/// A single cell of an uploaded batch.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Numeric view of the cell. Text that parses as a number counts;
    /// anything else is absent.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Empty => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }
}

/// Column-oriented view of one uploaded batch.
///
/// Column names are normalized (lowercased, trimmed) at construction so
/// alias lookup never has to worry about `" Qtd_Torneios_3d "` style
/// headers from hand-edited exports.
#[derive(Debug, Clone)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>) -> Self {
        let columns = columns
            .into_iter()
            .map(|c| c.trim().to_lowercase())
            .collect();
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append one row. Short rows are padded with `Empty`; long rows are
    /// truncated to the header width.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column matching any of `aliases`, in alias order.
    pub fn find_column(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.columns.iter().position(|c| c == alias))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn number_at(&self, row: usize, col: usize) -> Option<f64> {
        self.cell(row, col).and_then(CellValue::as_number)
    }

    pub fn text_at(&self, row: usize, col: usize) -> Option<&str> {
        self.cell(row, col).and_then(CellValue::as_text)
    }
}
