//! Upload paths to the external spreadsheet backend: plain whole-table
//! uploads and the capacity-bounded rolling append.

use crate::error::Result;
use crate::gateway::SpreadsheetGateway;
use crate::schema::Table;
use log::{info, warn};

/// Default rolling capacity, header row included. Sized so a wide dump
/// stays well below the backend's per-workbook cell limit.
pub const DEFAULT_MAX_ROWS: usize = 300_000;

const NEW_WORKSHEET_ROWS: u32 = 100;
const NEW_WORKSHEET_COLS: u32 = 20;

/// Replaces the contents of a worksheet with the given table. The worksheet
/// is created if absent, cleared otherwise, then header and rows are
/// written as one block at the top-left cell.
pub fn upload_table(
    gateway: &mut dyn SpreadsheetGateway,
    sheet_id: &str,
    worksheet: &str,
    table: &Table,
) -> Result<()> {
    info!(
        "Uploading {} row(s) to sheet {} worksheet {}",
        table.len(),
        sheet_id,
        worksheet
    );

    match gateway.read_all_rows(sheet_id, worksheet)? {
        Some(_) => gateway.clear(sheet_id, worksheet)?,
        None => {
            info!("Worksheet '{}' not found, creating", worksheet);
            gateway.create_worksheet(sheet_id, worksheet, NEW_WORKSHEET_ROWS, NEW_WORKSHEET_COLS)?
        }
    }

    gateway.write_block(sheet_id, worksheet, (0, 0), &table.to_sheet_rows())?;
    info!("Upload complete");
    Ok(())
}

/// Appends rows to a worksheet while keeping its total row count (header
/// included) at or below `max_rows`, evicting the oldest data rows first.
///
/// State machine:
/// - worksheet absent: create it and write header plus all rows;
/// - fits within capacity: append directly;
/// - would overflow: delete `min(current + new - max_rows, current - 1)`
///   rows starting at stored position 2 (the oldest data, right after the
///   header) BEFORE appending, then append everything.
///
/// The header row at position 1 is never evicted. An empty input table is a
/// no-op. The delete-then-append sequence is not atomic: a failure after
/// the delete leaves the worksheet short of rows and no rollback is
/// attempted.
pub fn append_rolling(
    gateway: &mut dyn SpreadsheetGateway,
    sheet_id: &str,
    worksheet: &str,
    table: &Table,
    max_rows: usize,
) -> Result<()> {
    if table.is_empty() {
        warn!("Empty table passed to rolling append, skipping");
        return Ok(());
    }

    let sheet_rows = table.to_sheet_rows();

    let existing = match gateway.read_all_rows(sheet_id, worksheet)? {
        Some(rows) => rows,
        None => {
            info!("Worksheet '{}' not found, creating and populating", worksheet);
            gateway.create_worksheet(sheet_id, worksheet, NEW_WORKSHEET_ROWS, NEW_WORKSHEET_COLS)?;
            gateway.write_block(sheet_id, worksheet, (0, 0), &sheet_rows)?;
            info!(
                "New worksheet populated with {} row(s) including header",
                sheet_rows.len()
            );
            return Ok(());
        }
    };

    let current_rows = existing.len();
    let new_rows = table.len();
    info!(
        "Rolling append: current rows (with header) {}, new rows {}, limit {}",
        current_rows, new_rows, max_rows
    );

    if current_rows + new_rows > max_rows {
        let mut rows_to_delete = current_rows + new_rows - max_rows;
        let max_deletable = current_rows.saturating_sub(1);
        if rows_to_delete > max_deletable {
            warn!(
                "Need to evict {} rows but only {} data rows exist, evicting all",
                rows_to_delete, max_deletable
            );
            rows_to_delete = max_deletable;
        }

        if rows_to_delete > 0 {
            // Oldest data sits immediately after the header; delete before
            // appending so the worksheet never transiently overflows.
            let start = 2;
            let end = start + rows_to_delete - 1;
            info!("Evicting rows {} to {} before append", start, end);
            gateway.delete_row_range(sheet_id, worksheet, start, end)?;
        }
    }

    // Data rows only; the header already exists.
    gateway.append_rows(sheet_id, worksheet, &sheet_rows[1..])?;
    info!("Append complete, added {} row(s)", new_rows);
    Ok(())
}
