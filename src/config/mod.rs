use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_yml;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_LOCATIONS: [&str; 2] = ["config/obis.yaml", "obis.yaml"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse config {path}: {message}")]
    Parse { path: String, message: String },
}

fn hexing_legacy_default() -> String { "uploads/Hexing OBIS Function.txt".to_string() }
fn hexcell_legacy_default() -> String { "uploads/Hexcell AMI System Unified OBIS List.txt".to_string() }
fn software_definitions_default() -> String { "defs/software".to_string() }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SourcesConfig {
    #[serde(default="hexing_legacy_default")]
    pub hexing_legacy: String,
    #[serde(default="hexcell_legacy_default")]
    pub hexcell_legacy: String,
    #[serde(default="software_definitions_default")]
    pub software_definitions: String,
}

fn export_path_default() -> String { "data/obis-functions.json".to_string() }
fn snapshot_dir_default() -> String { "data".to_string() }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ExportConfig {
    #[serde(default="export_path_default")]
    pub path: String,
    #[serde(default="snapshot_dir_default")]
    pub snapshot_dir: String,
}

fn sources_default() -> SourcesConfig {
    SourcesConfig {
        hexing_legacy: hexing_legacy_default(),
        hexcell_legacy: hexcell_legacy_default(),
        software_definitions: software_definitions_default(),
    }
}
fn export_default() -> ExportConfig {
    ExportConfig { path: export_path_default(), snapshot_dir: snapshot_dir_default() }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct RegistryConfig {
    #[serde(default="sources_default")]
    pub sources: SourcesConfig,
    #[serde(default="export_default")]
    pub export: ExportConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig { sources: sources_default(), export: export_default() }
    }
}

impl RegistryConfig {
    pub fn from_yaml(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        info!("Using config {}", path.display());
        Self::from_yaml(&contents, &path.display().to_string())
    }

    /// Tries `config/obis.yaml`, then `obis.yaml`, then falls back to defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        for location in CONFIG_LOCATIONS {
            let path = Path::new(location);
            if path.is_file() {
                return Self::load(path);
            }
        }

        debug!("No config file found, using defaults");
        Ok(RegistryConfig::default())
    }

    /// Snapshot file of one brand, e.g. `data/obis-hexing.json`
    pub fn snapshot_path(&self, brand: crate::models::Brand) -> PathBuf {
        Path::new(&self.export.snapshot_dir).join(format!("obis-{}.json", brand.as_str()))
    }
}
