use crate::schema::{LayoutSpec, Table, Value};
use log::{info, warn};

/// Rendered column widths are capped here, matching the reconciliation
/// sheets the operators are used to.
pub const MAX_COLUMN_WIDTH: f64 = 50.0;

/// Style attributes a rendering backend may honor. Kept format-agnostic;
/// the xlsx renderer maps these onto concrete cell formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Plain,
    /// Bold, enlarged header line above the table.
    HeaderLine,
    /// Bold, shaded, centered column-name cell.
    ColumnHeader,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyledCell {
    pub value: Value,
    pub style: CellStyle,
}

impl StyledCell {
    fn new(value: Value, style: CellStyle) -> Self {
        Self { value, style }
    }
}

/// A format-agnostic tabular document: ordered rows of styled cells plus
/// per-column rendered widths.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetDocument {
    pub title: String,
    pub rows: Vec<Vec<StyledCell>>,
    pub column_widths: Vec<f64>,
}

/// Formats a breakdown table into a company-specific UTR document.
///
/// Emits each header line bold on its own row, `line_gaps` blank rows, a
/// styled column-name row in the spec's declared order, then one data row
/// per breakdown row with values pulled through the column mapping. A
/// mapped source field absent from the breakdown fills its column with
/// empty cells rather than failing. A trailing column named by the spec's
/// UTR column name is appended entirely empty for manual fill-in.
pub fn synthesize(breakdown: &Table, spec: &LayoutSpec) -> SheetDocument {
    info!(
        "Synthesizing UTR document for {} over {} breakdown row(s)",
        spec.company_name,
        breakdown.len()
    );

    let mut rows: Vec<Vec<StyledCell>> = Vec::new();

    for header in &spec.headers {
        rows.push(vec![StyledCell::new(
            Value::Text(header.clone()),
            CellStyle::HeaderLine,
        )]);
    }

    for _ in 0..spec.line_gaps {
        rows.push(Vec::new());
    }

    let mut column_row: Vec<StyledCell> = spec
        .column_mapping
        .iter()
        .map(|binding| {
            StyledCell::new(Value::Text(binding.target.clone()), CellStyle::ColumnHeader)
        })
        .collect();
    column_row.push(StyledCell::new(
        Value::Text(spec.utr_column_name.clone()),
        CellStyle::ColumnHeader,
    ));
    rows.push(column_row);

    let source_indices: Vec<Option<usize>> = spec
        .column_mapping
        .iter()
        .map(|binding| {
            let idx = breakdown.column_index(&binding.source);
            if idx.is_none() {
                warn!(
                    "Column '{}' not found in breakdown; filling '{}' with empty values",
                    binding.source, binding.target
                );
            }
            idx
        })
        .collect();

    for row in breakdown.rows() {
        let mut out: Vec<StyledCell> = source_indices
            .iter()
            .map(|idx| {
                let value = idx
                    .and_then(|i| row.get(i).cloned())
                    .unwrap_or(Value::Empty);
                StyledCell::new(value, CellStyle::Plain)
            })
            .collect();
        out.push(StyledCell::new(Value::Empty, CellStyle::Plain));
        rows.push(out);
    }

    let column_widths = compute_widths(&rows);

    SheetDocument {
        title: "Data".to_string(),
        rows,
        column_widths,
    }
}

/// Sizes each column to its longest rendered value (header lines included),
/// with a little padding, capped at [`MAX_COLUMN_WIDTH`].
fn compute_widths(rows: &[Vec<StyledCell>]) -> Vec<f64> {
    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; column_count];

    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            widths[col] = widths[col].max(cell.value.render().chars().count());
        }
    }

    widths
        .into_iter()
        .map(|w| ((w + 2) as f64).min(MAX_COLUMN_WIDTH))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnBinding;

    fn sample_spec() -> LayoutSpec {
        LayoutSpec {
            company_name: "ACME".to_string(),
            headers: vec!["ACME Logistics".to_string(), "Weekly Payout".to_string()],
            line_gaps: 2,
            column_mapping: vec![
                ColumnBinding {
                    target: "Waybill".to_string(),
                    source: "Reference ID/Waybill No".to_string(),
                },
                ColumnBinding {
                    target: "Amount".to_string(),
                    source: "COD Amount/Amount payable".to_string(),
                },
            ],
            utr_column_name: "UTR".to_string(),
        }
    }

    fn sample_breakdown() -> Table {
        let mut table = Table::new(vec![
            "Reference ID/Waybill No".to_string(),
            "COD Amount/Amount payable".to_string(),
        ]);
        table.push_row(vec![
            Value::Text("WB-1".to_string()),
            Value::Number(10.0),
        ]);
        table.push_row(vec![Value::Text("WB-2".to_string()), Value::Number(5.0)]);
        table
    }

    #[test]
    fn test_row_arithmetic() {
        let spec = sample_spec();
        let doc = synthesize(&sample_breakdown(), &spec);

        // headers + gaps + 1 column-name row before the first data row
        let preamble = spec.headers.len() + spec.line_gaps + 1;
        assert_eq!(doc.rows.len(), preamble + 2);

        // every emitted data row has len(mapping) + 1 cells
        for row in &doc.rows[preamble..] {
            assert_eq!(row.len(), spec.column_mapping.len() + 1);
        }
    }

    #[test]
    fn test_header_lines_bold_and_gaps_blank() {
        let doc = synthesize(&sample_breakdown(), &sample_spec());
        assert_eq!(doc.rows[0][0].style, CellStyle::HeaderLine);
        assert_eq!(
            doc.rows[0][0].value,
            Value::Text("ACME Logistics".to_string())
        );
        assert!(doc.rows[2].is_empty());
        assert!(doc.rows[3].is_empty());
    }

    #[test]
    fn test_column_row_order_and_styling() {
        let doc = synthesize(&sample_breakdown(), &sample_spec());
        let column_row = &doc.rows[4];
        let names: Vec<String> = column_row.iter().map(|c| c.value.render()).collect();
        assert_eq!(names, vec!["Waybill", "Amount", "UTR"]);
        assert!(column_row
            .iter()
            .all(|c| c.style == CellStyle::ColumnHeader));
    }

    #[test]
    fn test_utr_column_empty() {
        let doc = synthesize(&sample_breakdown(), &sample_spec());
        for row in &doc.rows[5..] {
            assert_eq!(row.last().unwrap().value, Value::Empty);
        }
    }

    #[test]
    fn test_missing_source_column_fills_empty() {
        let mut spec = sample_spec();
        spec.column_mapping.push(ColumnBinding {
            target: "Ghost".to_string(),
            source: "Not A Column".to_string(),
        });
        let doc = synthesize(&sample_breakdown(), &spec);
        for row in &doc.rows[5..] {
            // Ghost sits just before the trailing UTR column
            assert_eq!(row[row.len() - 2].value, Value::Empty);
        }
    }

    #[test]
    fn test_column_width_capped() {
        let mut breakdown = sample_breakdown();
        breakdown.push_row(vec![
            Value::Text("x".repeat(120)),
            Value::Number(1.0),
        ]);
        let doc = synthesize(&breakdown, &sample_spec());
        assert_eq!(doc.column_widths[0], MAX_COLUMN_WIDTH);
        // Short columns keep their natural padded width
        assert!(doc.column_widths[1] < MAX_COLUMN_WIDTH);
    }
}
