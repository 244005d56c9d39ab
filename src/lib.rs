//! # Payout Sheet Builder
//!
//! A library for turning raw delivery/logistics report dumps into per-brand
//! payout pivots and company-specific "UTR" reconciliation spreadsheets.
//!
//! ## Core Concepts
//!
//! - **Dump**: the raw report of delivery transactions, stored in an
//!   external spreadsheet with a rolling row capacity
//! - **Breakdown**: the per-line-item table derived from a dump, filtered
//!   by date range and brand and remapped to canonical field names
//! - **Pivot**: the brand-level payout aggregate over a breakdown
//! - **Layout Spec**: per-company description of headers, gaps, and column
//!   mapping used to format a breakdown into a UTR sheet with an empty
//!   reference column for manual reconciliation
//!
//! External collaborators (the spreadsheet backend, the sheet-id registry,
//! the layout spec store, an optional notifier) sit behind traits and are
//! constructed by the caller and injected into [`ReconcilerPipeline`];
//! nothing here holds process-global state.
//!
//! ## Example
//!
//! ```rust,ignore
//! use payout_sheet_builder::*;
//! use chrono::NaiveDate;
//!
//! let mut gateway = MemoryGateway::new();
//! gateway.add_spreadsheet("dump-sheet");
//! let mut registry = MemoryRegistry::new();
//! registry.set_current_id(tables::DUMP, "dump-sheet").unwrap();
//!
//! let mut pipeline =
//!     ReconcilerPipeline::new(gateway, registry, MemorySpecStore::new());
//! let pivot = pipeline.create_pivot(
//!     "Dump",
//!     "Pivot Table",
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
//!     "Acme",
//! )?;
//! ```

pub mod breakdown;
pub mod error;
pub mod excel;
pub mod gateway;
pub mod layout;
pub mod notify;
pub mod pivot;
pub mod registry;
pub mod remap;
pub mod schema;
pub mod writer;

pub use breakdown::BREAKDOWN_FILE;
pub use error::{PayoutError, Result};
pub use gateway::{MemoryGateway, SpreadsheetGateway};
pub use layout::{synthesize, CellStyle, SheetDocument, StyledCell};
pub use notify::Notifier;
pub use pivot::{build_pivot, Breakdown, Pivot};
pub use registry::{
    JsonFileRegistry, JsonSpecStore, LayoutSpecStore, MemoryRegistry, MemorySpecStore,
    SheetRegistry,
};
pub use remap::remap_columns;
pub use schema::{tables, ColumnBinding, LayoutSpec, Table, Value};
pub use writer::{append_rolling, upload_table, DEFAULT_MAX_ROWS};

use chrono::NaiveDate;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Orchestrates the operator-triggered flows: ingest a dump, create a
/// pivot, and format a UTR sheet. Each operation runs to completion within
/// one call; there is no locking around the external worksheet, so two
/// concurrent callers against the same table can race (documented
/// limitation of the rolling writer).
pub struct ReconcilerPipeline<G, R, S> {
    gateway: G,
    registry: R,
    specs: S,
    notifier: Option<Box<dyn Notifier>>,
    work_dir: PathBuf,
    max_rows: usize,
}

impl<G, R, S> ReconcilerPipeline<G, R, S>
where
    G: SpreadsheetGateway,
    R: SheetRegistry,
    S: LayoutSpecStore,
{
    pub fn new(gateway: G, registry: R, specs: S) -> Self {
        Self {
            gateway,
            registry,
            specs,
            notifier: None,
            work_dir: PathBuf::from("temp"),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Directory holding the intermediate breakdown artifact.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn specs_mut(&mut self) -> &mut S {
        &mut self.specs
    }

    fn resolve_sheet_id(&self, table_name: &str) -> Result<String> {
        self.registry
            .get_current_id(table_name)?
            .ok_or_else(|| PayoutError::MissingSheetId(table_name.to_string()))
    }

    fn breakdown_path(&self) -> PathBuf {
        self.work_dir.join(BREAKDOWN_FILE)
    }

    /// Rolling-appends an uploaded dump into the current dump sheet.
    pub fn ingest_dump(&mut self, worksheet: &str, table: &Table) -> Result<()> {
        let sheet_id = self.resolve_sheet_id(tables::DUMP)?;
        append_rolling(
            &mut self.gateway,
            &sheet_id,
            worksheet,
            table,
            self.max_rows,
        )
    }

    /// Loads the dump worksheet, builds the breakdown and pivot for one
    /// brand over a closed date range, persists the breakdown artifact for
    /// the UTR stage, and uploads the pivot.
    pub fn create_pivot(
        &mut self,
        dump_worksheet: &str,
        pivot_worksheet: &str,
        start: NaiveDate,
        end: NaiveDate,
        brand: &str,
    ) -> Result<Pivot> {
        let dump_sheet = self.resolve_sheet_id(tables::DUMP)?;
        let raw = self
            .gateway
            .read_all_rows(&dump_sheet, dump_worksheet)?
            .ok_or_else(|| PayoutError::WorksheetNotFound(dump_worksheet.to_string()))?;
        let dump = Table::from_sheet_rows(&raw)
            .ok_or_else(|| PayoutError::EmptyWorksheet(dump_worksheet.to_string()))?;
        info!(
            "Loaded dump worksheet '{}' with {} rows and {} columns",
            dump_worksheet,
            dump.len(),
            dump.columns().len()
        );

        let (breakdown, pivot) = build_pivot(&dump, start, end, brand)?;
        breakdown::write_csv(&breakdown, &self.breakdown_path())?;

        let pivot_sheet = self.resolve_sheet_id(tables::PIVOT)?;
        upload_table(
            &mut self.gateway,
            &pivot_sheet,
            pivot_worksheet,
            &pivot::pivot_to_table(&pivot),
        )?;

        Ok(pivot)
    }

    /// Formats the persisted breakdown into a company's UTR workbook.
    /// Fails before touching anything external when the company has no
    /// layout spec.
    pub fn create_utr(&mut self, company_name: &str, output: &Path) -> Result<PathBuf> {
        let spec = self
            .specs
            .get_spec(company_name)?
            .ok_or_else(|| PayoutError::MissingLayoutSpec(company_name.to_string()))?;

        let breakdown = breakdown::read_csv(&self.breakdown_path())?;
        let document = synthesize(&breakdown.table, &spec);
        excel::write_workbook(&document, output)?;
        Ok(output.to_path_buf())
    }

    /// Sends a finished workbook through the configured notifier. Skipped
    /// with a warning when no notifier is present.
    pub fn send_report(&self, recipient: &str, subject: &str, attachment: &Path) -> Result<()> {
        match &self.notifier {
            Some(notifier) => notifier.send_with_attachment(
                recipient,
                subject,
                "Attached is the generated reconciliation sheet.",
                attachment,
            ),
            None => {
                warn!("No notifier configured, skipping report delivery");
                Ok(())
            }
        }
    }
}
