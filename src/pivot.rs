use crate::error::{PayoutError, Result};
use crate::remap::{
    remap_columns, AMOUNT_COLUMN, BRAND_COLUMN, BRAND_SOURCE, CREATED_DATE_SOURCE,
    REFERENCE_COLUMN, SOURCE_COLUMN, SOURCE_TAG, WAYBILL_SOURCE,
};
use crate::schema::{Table, Value};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use std::collections::BTreeMap;

/// Brand name -> summed payout amount.
pub type Pivot = BTreeMap<String, f64>;

/// A breakdown table together with the dump positions its rows came from.
/// The positions are the observable index column of the persisted CSV
/// artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub table: Table,
    pub source_rows: Vec<usize>,
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parses a creation timestamp cell and truncates it to its calendar date.
/// Timestamps are treated as naive local datetimes; no timezone conversion
/// is applied. Unparseable cells yield `None` and the row is excluded by
/// the date filter.
pub fn parse_creation_date(cell: &Value) -> Option<NaiveDate> {
    let text = cell.as_str()?.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d);
        }
    }
    None
}

/// Filters the dump to one brand over a closed date range, derives the
/// canonical breakdown table, and aggregates the payout amount per brand.
///
/// A row is included iff its creation date, truncated to the calendar day,
/// lies in `[start, end]` and its brand field equals `brand` exactly. A
/// brand matching no rows yields an empty breakdown and an empty pivot, not
/// an error. Non-numeric or missing amounts are coerced to 0.
pub fn build_pivot(
    dump: &Table,
    start: NaiveDate,
    end: NaiveDate,
    brand: &str,
) -> Result<(Breakdown, Pivot)> {
    if start > end {
        return Err(PayoutError::InvalidDateRange { start, end });
    }

    let date_idx = dump
        .column_index(CREATED_DATE_SOURCE)
        .ok_or_else(|| PayoutError::MissingColumn(CREATED_DATE_SOURCE.to_string()))?;
    let brand_idx = dump
        .column_index(BRAND_SOURCE)
        .ok_or_else(|| PayoutError::MissingColumn(BRAND_SOURCE.to_string()))?;
    let waybill_idx = dump.column_index(WAYBILL_SOURCE);

    info!("Creating pivot for {} from {} to {}", brand, start, end);

    let selected: Vec<usize> = dump
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            let in_range = parse_creation_date(&row[date_idx])
                .map(|d| d >= start && d <= end)
                .unwrap_or(false);
            in_range && row[brand_idx].as_str() == Some(brand)
        })
        .map(|(idx, _)| idx)
        .collect();

    debug!(
        "Filtered dump to {} of {} rows for brand {}",
        selected.len(),
        dump.len(),
        brand
    );

    let mut filtered = Table::new(dump.columns().to_vec());
    for &idx in &selected {
        filtered.push_row(dump.rows()[idx].clone());
    }

    let remapped = remap_columns(&filtered);

    // Prepend the source tag and the copied reference id, then coerce the
    // amount column to a number.
    let mut columns = vec![SOURCE_COLUMN.to_string(), REFERENCE_COLUMN.to_string()];
    columns.extend(remapped.columns().iter().cloned());
    let mut breakdown_table = Table::new(columns);

    let amount_idx = remapped.column_index(AMOUNT_COLUMN);
    for (pos, row) in remapped.rows().iter().enumerate() {
        let reference = waybill_idx
            .and_then(|w| filtered.rows()[pos].get(w).cloned())
            .unwrap_or(Value::Empty);
        let mut out = vec![Value::Text(SOURCE_TAG.to_string()), reference];
        for (col, cell) in row.iter().enumerate() {
            if Some(col) == amount_idx {
                out.push(Value::Number(cell.to_number()));
            } else {
                out.push(cell.clone());
            }
        }
        breakdown_table.push_row(out);
    }

    let pivot = aggregate(&breakdown_table);
    info!("Pivot table created with {} brand group(s)", pivot.len());

    Ok((
        Breakdown {
            table: breakdown_table,
            source_rows: selected,
        },
        pivot,
    ))
}

/// Sums the amount column grouped by brand. Supports multi-brand input;
/// every brand present in the table gets an entry, summing missing amounts
/// as 0.
pub fn aggregate(breakdown: &Table) -> Pivot {
    let mut pivot = Pivot::new();
    let brand_idx = match breakdown.column_index(BRAND_COLUMN) {
        Some(idx) => idx,
        None => return pivot,
    };
    let amount_idx = breakdown.column_index(AMOUNT_COLUMN);

    for row in breakdown.rows() {
        let brand = row[brand_idx].render();
        let amount = amount_idx.map(|a| row[a].to_number()).unwrap_or(0.0);
        *pivot.entry(brand).or_insert(0.0) += amount;
    }
    pivot
}

/// Shapes a pivot into a two-column table for upload.
pub fn pivot_to_table(pivot: &Pivot) -> Table {
    let mut table = Table::new(vec![BRAND_COLUMN.to_string(), AMOUNT_COLUMN.to_string()]);
    for (brand, amount) in pivot {
        table.push_row(vec![Value::Text(brand.clone()), Value::Number(*amount)]);
    }
    table
}
