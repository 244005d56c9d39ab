//! Small key-value settings behind the pipeline: which external sheet id
//! is current for each logical table, and the per-company layout spec
//! collection. Both are traits so production deployments can back them
//! with hosted stores while tests use the in-memory and JSON-file
//! implementations here.

use crate::error::{PayoutError, Result};
use crate::schema::LayoutSpec;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One active external sheet identifier per logical table name.
pub trait SheetRegistry {
    fn get_current_id(&self, table_name: &str) -> Result<Option<String>>;
    fn set_current_id(&mut self, table_name: &str, sheet_id: &str) -> Result<()>;
}

/// Per-company layout spec collection, keyed by company name.
pub trait LayoutSpecStore {
    fn list_specs(&self) -> Result<Vec<LayoutSpec>>;
    fn get_spec(&self, company_name: &str) -> Result<Option<LayoutSpec>>;
    fn upsert_spec(&mut self, spec: LayoutSpec) -> Result<()>;
}

/// In-memory registry for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryRegistry {
    ids: BTreeMap<String, String>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SheetRegistry for MemoryRegistry {
    fn get_current_id(&self, table_name: &str) -> Result<Option<String>> {
        Ok(self.ids.get(table_name).cloned())
    }

    fn set_current_id(&mut self, table_name: &str, sheet_id: &str) -> Result<()> {
        self.ids
            .insert(table_name.to_string(), sheet_id.to_string());
        Ok(())
    }
}

/// In-memory layout spec store for tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySpecStore {
    specs: Vec<LayoutSpec>,
}

impl MemorySpecStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayoutSpecStore for MemorySpecStore {
    fn list_specs(&self) -> Result<Vec<LayoutSpec>> {
        Ok(self.specs.clone())
    }

    fn get_spec(&self, company_name: &str) -> Result<Option<LayoutSpec>> {
        Ok(self
            .specs
            .iter()
            .find(|s| s.company_name == company_name)
            .cloned())
    }

    fn upsert_spec(&mut self, spec: LayoutSpec) -> Result<()> {
        match self
            .specs
            .iter_mut()
            .find(|s| s.company_name == spec.company_name)
        {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryEntry {
    sheet_id: String,
    updated_at: DateTime<Utc>,
}

/// Sheet registry persisted as a single JSON document on disk. Every
/// mutation rewrites the file; entries carry an update timestamp for
/// operator auditing.
#[derive(Debug, Clone)]
pub struct JsonFileRegistry {
    path: PathBuf,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, RegistryEntry>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, entries: &BTreeMap<String, RegistryEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl SheetRegistry for JsonFileRegistry {
    fn get_current_id(&self, table_name: &str) -> Result<Option<String>> {
        let entries = self.load()?;
        match entries.get(table_name) {
            Some(entry) => Ok(Some(entry.sheet_id.clone())),
            None => {
                warn!("No sheet id registered for table '{}'", table_name);
                Ok(None)
            }
        }
    }

    fn set_current_id(&mut self, table_name: &str, sheet_id: &str) -> Result<()> {
        if sheet_id.trim().is_empty() {
            return Err(PayoutError::MissingSheetId(table_name.to_string()));
        }
        let mut entries = self.load()?;
        let old = entries.insert(
            table_name.to_string(),
            RegistryEntry {
                sheet_id: sheet_id.to_string(),
                updated_at: Utc::now(),
            },
        );
        self.save(&entries)?;
        info!(
            "Updated sheet id for '{}': {:?} -> {}",
            table_name,
            old.map(|e| e.sheet_id),
            sheet_id
        );
        Ok(())
    }
}

/// Layout spec collection persisted as one JSON array, the same document
/// shape the config editor produces.
#[derive(Debug, Clone)]
pub struct JsonSpecStore {
    path: PathBuf,
}

impl JsonSpecStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<LayoutSpec>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, specs: &[LayoutSpec]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(specs)?)?;
        Ok(())
    }
}

impl LayoutSpecStore for JsonSpecStore {
    fn list_specs(&self) -> Result<Vec<LayoutSpec>> {
        self.load()
    }

    fn get_spec(&self, company_name: &str) -> Result<Option<LayoutSpec>> {
        Ok(self
            .load()?
            .into_iter()
            .find(|s| s.company_name == company_name))
    }

    fn upsert_spec(&mut self, spec: LayoutSpec) -> Result<()> {
        let mut specs = self.load()?;
        match specs
            .iter_mut()
            .find(|s| s.company_name == spec.company_name)
        {
            Some(existing) => {
                info!("Replacing layout spec for {}", spec.company_name);
                *existing = spec;
            }
            None => {
                info!("Adding layout spec for {}", spec.company_name);
                specs.push(spec);
            }
        }
        self.save(&specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnBinding;

    fn spec(company: &str) -> LayoutSpec {
        LayoutSpec {
            company_name: company.to_string(),
            headers: vec![format!("{company} Payouts")],
            line_gaps: 1,
            column_mapping: vec![ColumnBinding {
                target: "Waybill".to_string(),
                source: "Reference ID/Waybill No".to_string(),
            }],
            utr_column_name: "UTR".to_string(),
        }
    }

    #[test]
    fn test_memory_registry_round_trip() {
        let mut registry = MemoryRegistry::new();
        assert_eq!(registry.get_current_id("dump").unwrap(), None);
        registry.set_current_id("dump", "sheet-1").unwrap();
        registry.set_current_id("dump", "sheet-2").unwrap();
        assert_eq!(
            registry.get_current_id("dump").unwrap(),
            Some("sheet-2".to_string())
        );
    }

    #[test]
    fn test_json_registry_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        let mut registry = JsonFileRegistry::new(&path);
        registry.set_current_id("dump", "sheet-1").unwrap();

        let reopened = JsonFileRegistry::new(&path);
        assert_eq!(
            reopened.get_current_id("dump").unwrap(),
            Some("sheet-1".to_string())
        );
        assert_eq!(reopened.get_current_id("pivot").unwrap(), None);
    }

    #[test]
    fn test_json_registry_rejects_blank_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = JsonFileRegistry::new(dir.path().join("registry.json"));
        assert!(matches!(
            registry.set_current_id("dump", "  "),
            Err(PayoutError::MissingSheetId(_))
        ));
    }

    #[test]
    fn test_spec_store_upsert_replaces_by_company() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonSpecStore::new(dir.path().join("utr_config.json"));

        store.upsert_spec(spec("ACME")).unwrap();
        store.upsert_spec(spec("Globex")).unwrap();

        let mut updated = spec("ACME");
        updated.line_gaps = 5;
        store.upsert_spec(updated).unwrap();

        let specs = store.list_specs().unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(store.get_spec("ACME").unwrap().unwrap().line_gaps, 5);
        assert_eq!(store.get_spec("Initech").unwrap(), None);
    }
}
