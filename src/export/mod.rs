/*
    JSON cache files.

    Nothing here is a source of truth, every file can be regenerated from the
    input lists. Besides the full registry dump there is the curated snapshot
    format `{"functions": [...]}` which gets refreshed against new software data.
*/

pub mod translate;

use crate::models::ObisCodeEntry;
use crate::reconcile;
use crate::registry::{ObisRegistry, RegistryError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unable to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SnapshotFile {
    #[serde(default)]
    pub functions: Vec<ObisCodeEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub total: usize,
    pub with_class_id: usize,
    pub with_attribute_id: usize,
    pub with_unit: usize,
}

impl SnapshotSummary {
    pub fn of(functions: &[ObisCodeEntry]) -> Self {
        SnapshotSummary {
            total: functions.len(),
            with_class_id: functions.iter().filter(|f| f.class_id.is_some()).count(),
            with_attribute_id: functions.iter().filter(|f| f.attribute_id.is_some()).count(),
            with_unit: functions.iter().filter(|f| f.unit.as_deref().map(|u| !u.is_empty()).unwrap_or(false)).count(),
        }
    }
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let io_error = |e: std::io::Error| ExportError::Io { path: path.display().to_string(), source: e };

    let json = serde_json::to_string_pretty(value).map_err(|e| ExportError::Json {
        path: path.display().to_string(),
        source: e,
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
    }
    fs::write(path, json.as_bytes()).map_err(io_error)
}

/// Writes the per brand lists and the unified list as pretty JSON
pub fn export_registry(path: &Path, registry: &ObisRegistry) -> Result<(), ExportError> {
    write_pretty(path, registry)?;
    info!("OBIS functions exported to {}", path.display());
    Ok(())
}

pub fn export_snapshot(path: &Path, functions: &[ObisCodeEntry]) -> Result<(), ExportError> {
    write_pretty(path, &SnapshotFile { functions: functions.to_vec() })?;
    info!("Saved {} functions to {}", functions.len(), path.display());
    Ok(())
}

/// Reads a snapshot, a missing file is an empty snapshot
pub fn load_snapshot(path: &Path) -> Result<SnapshotFile, ExportError> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No snapshot at {}", path.display());
            return Ok(SnapshotFile::default());
        },
        Err(e) => return Err(ExportError::Io { path: path.display().to_string(), source: e }),
    };

    let snapshot: SnapshotFile = serde_json::from_str(&contents).map_err(|e| ExportError::Json {
        path: path.display().to_string(),
        source: e,
    })?;
    info!("Loaded {} existing functions from {}", snapshot.functions.len(), path.display());
    Ok(snapshot)
}

/// Merges `fresh` software entries into the snapshot at `existing` and writes
/// the result to `out`. `existing` and `out` may be the same file.
pub fn refresh_snapshot(existing: &Path, fresh: &[ObisCodeEntry], out: &Path) -> Result<SnapshotSummary, ExportError> {
    let snapshot = load_snapshot(existing)?;
    let merged = reconcile::reconcile_snapshot(&snapshot.functions, fresh);
    export_snapshot(out, &merged)?;

    let summary = SnapshotSummary::of(&merged);
    info!("Merged snapshot: {} total, {} with class id, {} with attribute id, {} with unit",
          summary.total, summary.with_class_id, summary.with_attribute_id, summary.with_unit);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BrandTag;

    fn registry() -> ObisRegistry {
        let entry = ObisCodeEntry::new("1-0:1.8.0.255", "Energy", BrandTag::Hexing);
        ObisRegistry {
            hexing: vec![entry.clone()],
            hexcell: Vec::new(),
            unified: vec![entry],
        }
    }

    #[test]
    fn test_export_registry_roundtrip_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/obis-functions.json");

        export_registry(&path, &registry()).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  \"hexing\": ["));

        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["unified"][0]["code"], "1-0:1.8.0.255");
        assert_eq!(value["hexcell"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_export_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let result = export_registry(&blocker.join("out.json"), &registry());
        assert!(matches!(result, Err(ExportError::Io { .. })));
    }

    #[test]
    fn test_load_snapshot_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_snapshot(&dir.path().join("none.json")).unwrap(), SnapshotFile::default());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{\"functions\": [").unwrap();
        assert!(matches!(load_snapshot(&bad), Err(ExportError::Json { .. })));
    }

    #[test]
    fn test_refresh_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obis-hexcell.json");
        fs::write(&path, r#"{"functions": [
            {"code": "1-0:1.8.0.255", "name": "Energy import", "description": "curated", "brand": "hexcell", "group": "Energy", "attributeId": 2},
            {"code": "0-0:1.0.0.255", "name": "Clock", "brand": "hexcell"}
        ]}"#).unwrap();

        let mut fresh = ObisCodeEntry::new("1-0:1.8.0.255", "正向有功总电能", BrandTag::Hexcell);
        fresh.class_id = Some(3);
        fresh.unit = Some("kWh".to_string());
        let discovered = ObisCodeEntry::new("1-0:32.7.0.255", "Voltage L1", BrandTag::Hexcell);

        let summary = refresh_snapshot(&path, &[fresh, discovered], &path).unwrap();
        assert_eq!(summary, SnapshotSummary { total: 3, with_class_id: 1, with_attribute_id: 1, with_unit: 1 });

        let written = load_snapshot(&path).unwrap();
        assert_eq!(written.functions[0].name, "Energy import");
        assert_eq!(written.functions[0].category, Some("Energy".to_string()));
        assert_eq!(written.functions[2].category, Some("General".to_string()));
    }
}
