use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical table names used to resolve the active external sheet id.
pub mod tables {
    pub const DUMP: &str = "dump";
    pub const PIVOT: &str = "pivot";
    pub const UTR: &str = "utr";
}

/// A single cell in a tabular structure.
///
/// External worksheets deliver everything as strings; `Empty` covers blank
/// cells and the sentinel values the dump uses for missing data. Null
/// handling is uniform per output format: `Empty` renders as `""` in sheet
/// uploads and CSV, and as a blank cell in xlsx output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Text(String),
    Number(f64),
}

impl Value {
    /// Builds a cell from a raw worksheet string, normalizing the dump's
    /// missing-value sentinels to `Empty`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "" | "None" => Value::Empty,
            _ => Value::Text(raw.to_string()),
        }
    }

    /// Builds a cell from a CSV field, inferring numbers where they parse.
    pub fn from_csv_field(field: &str) -> Self {
        if field.is_empty() {
            return Value::Empty;
        }
        match field.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(field.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Coerces the cell to a number. Non-numeric and missing values become 0.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Value::Empty => 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// String representation used for sheet uploads, CSV fields, and width
    /// calculations. Whole numbers render without a fractional part.
    pub fn render(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// An ordered, header-addressed table of cells.
///
/// Row 0 of an external worksheet is the header; `Table` keeps the header
/// separate and stores only data rows. Rows are padded or truncated to the
/// column count on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from raw worksheet rows (row 0 = header), sanitizing
    /// blank and sentinel cells. Returns `None` for an empty worksheet.
    pub fn from_sheet_rows(raw: &[Vec<String>]) -> Option<Self> {
        let (header, data) = raw.split_first()?;
        let mut table = Table::new(header.clone());
        for row in data {
            table.push_row(row.iter().map(|cell| Value::from_raw(cell)).collect());
        }
        Some(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Empty);
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serializes the table to raw sheet rows: header first, then each data
    /// row rendered to strings. This is the single conversion point for
    /// everything uploaded to the spreadsheet backend.
    pub fn to_sheet_rows(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.columns.clone());
        for row in &self.rows {
            out.push(row.iter().map(Value::render).collect());
        }
        out
    }
}

fn default_utr_column() -> String {
    "UTR".to_string()
}

/// One target-column-to-source-field binding in a layout spec. Declared
/// order is emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnBinding {
    pub target: String,
    pub source: String,
}

/// Per-company description of how a breakdown is formatted into a UTR
/// reconciliation sheet. Persisted as JSON by the layout spec store and
/// treated as read-only by the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    /// Identity key, unique within the spec collection.
    pub company_name: String,
    /// Lines rendered bold above the table, one row each.
    pub headers: Vec<String>,
    /// Blank rows between the header lines and the column-name row.
    pub line_gaps: usize,
    /// Target column name -> canonical breakdown field, in output order.
    pub column_mapping: Vec<ColumnBinding>,
    /// Name of the trailing column left empty for manual reconciliation.
    #[serde(default = "default_utr_column")]
    pub utr_column_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_sanitization() {
        assert_eq!(Value::from_raw(""), Value::Empty);
        assert_eq!(Value::from_raw(" "), Value::Empty);
        assert_eq!(Value::from_raw("None"), Value::Empty);
        assert_eq!(Value::from_raw("Acme"), Value::Text("Acme".to_string()));
    }

    #[test]
    fn test_numeric_coercion_defaults_to_zero() {
        assert_eq!(Value::Empty.to_number(), 0.0);
        assert_eq!(Value::Text("abc".to_string()).to_number(), 0.0);
        assert_eq!(Value::Text("12.5".to_string()).to_number(), 12.5);
        assert_eq!(Value::Number(3.0).to_number(), 3.0);
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(Value::Number(10.0).render(), "10");
        assert_eq!(Value::Number(10.25).render(), "10.25");
        assert_eq!(Value::Empty.render(), "");
    }

    #[test]
    fn test_table_from_sheet_rows() {
        let raw = vec![
            vec!["A".to_string(), "B".to_string()],
            vec!["1".to_string(), "None".to_string()],
            vec!["x".to_string()],
        ];
        let table = Table::from_sheet_rows(&raw).unwrap();
        assert_eq!(table.columns(), &["A".to_string(), "B".to_string()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "B"), Some(&Value::Empty));
        // Short rows are padded to the header width
        assert_eq!(table.value(1, "B"), Some(&Value::Empty));
    }

    #[test]
    fn test_empty_sheet_yields_none() {
        assert!(Table::from_sheet_rows(&[]).is_none());
    }

    #[test]
    fn test_layout_spec_round_trip() {
        let spec = LayoutSpec {
            company_name: "ACME".to_string(),
            headers: vec!["ACME Payouts".to_string()],
            line_gaps: 2,
            column_mapping: vec![ColumnBinding {
                target: "Waybill".to_string(),
                source: "Reference ID/Waybill No".to_string(),
            }],
            utr_column_name: "UTR".to_string(),
        };

        let json = serde_json::to_string(&spec).unwrap();
        let back: LayoutSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_layout_spec_default_utr_column() {
        let json = r#"{
            "company_name": "ACME",
            "headers": [],
            "line_gaps": 0,
            "column_mapping": []
        }"#;
        let spec: LayoutSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.utr_column_name, "UTR");
    }
}
