//! Seam to the external spreadsheet backend.
//!
//! The core only ever needs whole-sheet reads, rectangular writes, appends,
//! and row-range deletes, so the gateway is a single synchronous trait over
//! `(sheet id, worksheet name)` pairs. Production deployments implement it
//! against the hosted spreadsheet service; tests and local runs use
//! [`MemoryGateway`].

use crate::error::{PayoutError, Result};
use std::collections::{BTreeMap, HashMap};

/// Access to a third-party spreadsheet service.
///
/// Row data crosses this boundary as plain strings; typed handling lives in
/// [`crate::schema::Table`]. `read_all_rows` returns `Ok(None)` when the
/// worksheet does not exist, which callers treat as a recoverable state
/// (usually by creating the worksheet). Backend failures surface as
/// [`PayoutError::Gateway`]; no retry is performed here.
pub trait SpreadsheetGateway {
    /// Reads every row of a worksheet, header included. `None` if the
    /// worksheet is absent.
    fn read_all_rows(&self, sheet_id: &str, worksheet: &str) -> Result<Option<Vec<Vec<String>>>>;

    fn create_worksheet(
        &mut self,
        sheet_id: &str,
        worksheet: &str,
        rows: u32,
        cols: u32,
    ) -> Result<()>;

    /// Overwrites a rectangular region starting at a 0-based (row, col)
    /// cell.
    fn write_block(
        &mut self,
        sheet_id: &str,
        worksheet: &str,
        top_left: (usize, usize),
        rows: &[Vec<String>],
    ) -> Result<()>;

    fn append_rows(&mut self, sheet_id: &str, worksheet: &str, rows: &[Vec<String>]) -> Result<()>;

    /// Deletes rows `start..=end` in place, 1-based and inclusive on both
    /// ends, matching the backend's row addressing.
    fn delete_row_range(
        &mut self,
        sheet_id: &str,
        worksheet: &str,
        start: usize,
        end: usize,
    ) -> Result<()>;

    fn clear(&mut self, sheet_id: &str, worksheet: &str) -> Result<()>;
}

/// In-memory spreadsheet backend for tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryGateway {
    sheets: HashMap<String, BTreeMap<String, Vec<Vec<String>>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty spreadsheet under the given id. Operations
    /// against unregistered ids fail, mirroring an invalid or inaccessible
    /// sheet id on the real backend.
    pub fn add_spreadsheet(&mut self, sheet_id: &str) {
        self.sheets.entry(sheet_id.to_string()).or_default();
    }

    fn spreadsheet(&self, sheet_id: &str) -> Result<&BTreeMap<String, Vec<Vec<String>>>> {
        self.sheets
            .get(sheet_id)
            .ok_or_else(|| PayoutError::Gateway(format!("spreadsheet not found: {sheet_id}")))
    }

    fn spreadsheet_mut(
        &mut self,
        sheet_id: &str,
    ) -> Result<&mut BTreeMap<String, Vec<Vec<String>>>> {
        self.sheets
            .get_mut(sheet_id)
            .ok_or_else(|| PayoutError::Gateway(format!("spreadsheet not found: {sheet_id}")))
    }

    fn worksheet_mut(&mut self, sheet_id: &str, worksheet: &str) -> Result<&mut Vec<Vec<String>>> {
        self.spreadsheet_mut(sheet_id)?
            .get_mut(worksheet)
            .ok_or_else(|| PayoutError::WorksheetNotFound(worksheet.to_string()))
    }
}

impl SpreadsheetGateway for MemoryGateway {
    fn read_all_rows(&self, sheet_id: &str, worksheet: &str) -> Result<Option<Vec<Vec<String>>>> {
        Ok(self.spreadsheet(sheet_id)?.get(worksheet).cloned())
    }

    fn create_worksheet(
        &mut self,
        sheet_id: &str,
        worksheet: &str,
        _rows: u32,
        _cols: u32,
    ) -> Result<()> {
        let spreadsheet = self.spreadsheet_mut(sheet_id)?;
        if spreadsheet.contains_key(worksheet) {
            return Err(PayoutError::Gateway(format!(
                "worksheet already exists: {worksheet}"
            )));
        }
        spreadsheet.insert(worksheet.to_string(), Vec::new());
        Ok(())
    }

    fn write_block(
        &mut self,
        sheet_id: &str,
        worksheet: &str,
        top_left: (usize, usize),
        rows: &[Vec<String>],
    ) -> Result<()> {
        let target = self.worksheet_mut(sheet_id, worksheet)?;
        let (top, left) = top_left;
        for (r, row) in rows.iter().enumerate() {
            let row_idx = top + r;
            if target.len() <= row_idx {
                target.resize(row_idx + 1, Vec::new());
            }
            let stored = &mut target[row_idx];
            if stored.len() < left + row.len() {
                stored.resize(left + row.len(), String::new());
            }
            stored[left..left + row.len()].clone_from_slice(row);
        }
        Ok(())
    }

    fn append_rows(&mut self, sheet_id: &str, worksheet: &str, rows: &[Vec<String>]) -> Result<()> {
        let target = self.worksheet_mut(sheet_id, worksheet)?;
        target.extend(rows.iter().cloned());
        Ok(())
    }

    fn delete_row_range(
        &mut self,
        sheet_id: &str,
        worksheet: &str,
        start: usize,
        end: usize,
    ) -> Result<()> {
        if start < 1 || end < start {
            return Err(PayoutError::Gateway(format!(
                "invalid row range: {start}..={end}"
            )));
        }
        let target = self.worksheet_mut(sheet_id, worksheet)?;
        if end > target.len() {
            return Err(PayoutError::Gateway(format!(
                "row range {start}..={end} exceeds {} stored rows",
                target.len()
            )));
        }
        target.drain(start - 1..end);
        Ok(())
    }

    fn clear(&mut self, sheet_id: &str, worksheet: &str) -> Result<()> {
        self.worksheet_mut(sheet_id, worksheet)?.clear();
        Ok(())
    }
}
