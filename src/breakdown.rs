//! Persistence for the intermediate breakdown artifact.
//!
//! The breakdown is written as a CSV whose first column is an unnamed index
//! holding each row's original position in the dump. The index column is an
//! observable part of the artifact's shape; readers skip it when rebuilding
//! the table but keep the positions alongside.

use crate::error::Result;
use crate::pivot::Breakdown;
use crate::schema::{Table, Value};
use log::info;
use std::path::Path;

/// Default artifact filename within a pipeline working directory.
pub const BREAKDOWN_FILE: &str = "breakdown.csv";

pub fn write_csv(breakdown: &Breakdown, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![String::new()];
    header.extend(breakdown.table.columns().iter().cloned());
    writer.write_record(&header)?;

    for (pos, row) in breakdown.table.rows().iter().enumerate() {
        let index = breakdown
            .source_rows
            .get(pos)
            .copied()
            .unwrap_or(pos)
            .to_string();
        let mut record = vec![index];
        record.extend(row.iter().map(Value::render));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!(
        "Breakdown artifact written to {} ({} rows)",
        path.display(),
        breakdown.table.len()
    );
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Breakdown> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => {
            return Ok(Breakdown {
                table: Table::new(Vec::new()),
                source_rows: Vec::new(),
            })
        }
    };

    let columns: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
    let mut table = Table::new(columns);
    let mut source_rows = Vec::new();

    for (pos, record) in records.enumerate() {
        let record = record?;
        let index = record
            .get(0)
            .and_then(|f| f.parse::<usize>().ok())
            .unwrap_or(pos);
        source_rows.push(index);
        table.push_row(record.iter().skip(1).map(Value::from_csv_field).collect());
    }

    Ok(Breakdown { table, source_rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_breakdown() -> Breakdown {
        let mut table = Table::new(vec![
            "Source".to_string(),
            "Reference ID/Waybill No".to_string(),
            "COD Amount/Amount payable".to_string(),
        ]);
        table.push_row(vec![
            Value::Text("LOADSHARE".to_string()),
            Value::Text("WB-1".to_string()),
            Value::Number(10.0),
        ]);
        table.push_row(vec![
            Value::Text("LOADSHARE".to_string()),
            Value::Empty,
            Value::Number(0.0),
        ]);
        Breakdown {
            table,
            source_rows: vec![4, 7],
        }
    }

    #[test]
    fn test_round_trip_preserves_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("breakdown.csv");

        let original = sample_breakdown();
        write_csv(&original, &path).unwrap();
        let restored = read_csv(&path).unwrap();

        assert_eq!(restored.source_rows, vec![4, 7]);
        assert_eq!(restored.table.columns(), original.table.columns());
        assert_eq!(restored.table.len(), 2);
        assert_eq!(
            restored.table.value(0, "COD Amount/Amount payable"),
            Some(&Value::Number(10.0))
        );
        assert_eq!(
            restored.table.value(1, "Reference ID/Waybill No"),
            Some(&Value::Empty)
        );
    }

    #[test]
    fn test_index_is_first_csv_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("breakdown.csv");
        write_csv(&sample_breakdown(), &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let mut lines = raw.lines();
        assert!(lines.next().unwrap().starts_with(",Source,"));
        assert!(lines.next().unwrap().starts_with("4,"));
    }

    #[test]
    fn test_read_missing_rows_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        let breakdown = read_csv(&path).unwrap();
        assert!(breakdown.table.is_empty());
    }
}
