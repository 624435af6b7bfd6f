use crate::config::RegistryConfig;
use crate::export::{self, ExportError};
use crate::legacy;
use crate::models::{Brand, ObisCodeEntry};
use crate::obis_utils;
use crate::reconcile;
use crate::software::{DefinitionSource, SoftwareConfigSource, SoftwareConfigurations, SoftwareLoad};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod utils;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unable to read source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which catalog a query runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Hexing,
    Hexcell,
    Unified,
}

impl From<Option<Brand>> for Scope {
    fn from(brand: Option<Brand>) -> Self {
        match brand {
            Some(Brand::Hexing) => Scope::Hexing,
            Some(Brand::Hexcell) => Scope::Hexcell,
            None => Scope::Unified,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStatistics {
    pub hexing_total: usize,
    pub hexcell_total: usize,
    pub unified_total: usize,
    pub groups: Vec<String>,
    pub hexing_groups: Vec<String>,
    pub hexcell_groups: Vec<String>,
}

/// Assembled registry: merged per brand catalogs plus the cross brand one
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ObisRegistry {
    pub hexing: Vec<ObisCodeEntry>,
    pub hexcell: Vec<ObisCodeEntry>,
    pub unified: Vec<ObisCodeEntry>,
}

impl ObisRegistry {
    pub fn entries(&self, scope: Scope) -> &[ObisCodeEntry] {
        match scope {
            Scope::Hexing => &self.hexing,
            Scope::Hexcell => &self.hexcell,
            Scope::Unified => &self.unified,
        }
    }

    pub fn lookup_by_code(&self, code: &str, scope: Scope) -> Option<&ObisCodeEntry> {
        let wanted = obis_utils::normalize_obis_code(code);
        self.entries(scope).iter().find(|e| e.key() == wanted)
    }

    /// Entries whose category contains `group`, ignoring case
    pub fn lookup_by_group(&self, group: &str, scope: Scope) -> Vec<&ObisCodeEntry> {
        let wanted = group.trim().to_lowercase();
        self.entries(scope).iter()
            .filter(|e| {
                e.category.as_deref()
                    .map(|c| c.to_lowercase().contains(&wanted))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Sorted distinct categories
    pub fn groups(&self, scope: Scope) -> Vec<String> {
        self.entries(scope).iter()
            .filter_map(|e| e.category.clone())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn unit_of(&self, code: &str) -> Option<&str> {
        self.lookup_by_code(code, Scope::Unified)?.unit.as_deref()
    }

    pub fn scaler_of(&self, code: &str) -> Option<i8> {
        self.lookup_by_code(code, Scope::Unified)?.scaler
    }

    pub fn format_value(&self, code: &str, value: f64) -> String {
        utils::format_value(self.lookup_by_code(code, Scope::Unified), value)
    }

    pub fn statistics(&self) -> RegistryStatistics {
        RegistryStatistics {
            hexing_total: self.hexing.len(),
            hexcell_total: self.hexcell.len(),
            unified_total: self.unified.len(),
            groups: self.groups(Scope::Unified),
            hexing_groups: self.groups(Scope::Hexing),
            hexcell_groups: self.groups(Scope::Hexcell),
        }
    }
}

/// Everything the pipeline reads, already parsed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryInputs {
    pub hexing_legacy: Vec<ObisCodeEntry>,
    pub hexcell_legacy: Vec<ObisCodeEntry>,
    pub software: SoftwareConfigurations,
}

/// Pure core of the pipeline
pub fn build_registry(inputs: &RegistryInputs) -> ObisRegistry {
    let hexing: Vec<ObisCodeEntry> = reconcile::merge_legacy_with_software(&inputs.hexing_legacy, &inputs.software.hexing)
        .into_values()
        .collect();
    let hexcell: Vec<ObisCodeEntry> = reconcile::merge_legacy_with_software(&inputs.hexcell_legacy, &inputs.software.hexcell)
        .into_values()
        .collect();
    info!("[OBIS] Total Hexing OBIS functions after merge: {}", hexing.len());
    info!("[OBIS] Total Hexcell OBIS functions after merge: {}", hexcell.len());

    let unified: Vec<ObisCodeEntry> = reconcile::unify_brands(&hexing, &hexcell)
        .into_values()
        .collect();
    info!("[OBIS] Total unified OBIS functions: {}", unified.len());

    ObisRegistry { hexing, hexcell, unified }
}

/// Reasons a build ran with less data than configured
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryWarning {
    MissingSource { brand: Brand, path: String },
    SoftwareUnavailable(String),
}

impl fmt::Display for RegistryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryWarning::MissingSource { brand, path } => write!(f, "{brand} legacy source {path} not found"),
            RegistryWarning::SoftwareUnavailable(reason) => write!(f, "software configuration unavailable: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryBuild {
    pub registry: ObisRegistry,
    pub warnings: Vec<RegistryWarning>,
}

impl RegistryBuild {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A missing file contributes nothing, any other read error fails the run
pub fn read_legacy_source(path: &Path, brand: Brand) -> Result<Option<Vec<ObisCodeEntry>>, RegistryError> {
    match legacy::parse_legacy_file(path, brand) {
        Ok(drafts) => Ok(Some(drafts)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RegistryError::Io { path: path.display().to_string(), source: e }),
    }
}

/// Registry pipeline bound to a configuration and a software source
pub struct ObisEngine<S: SoftwareConfigSource> {
    hexing_legacy: PathBuf,
    hexcell_legacy: PathBuf,
    source: S,
}

impl ObisEngine<DefinitionSource> {
    pub fn from_config(config: &RegistryConfig) -> Self {
        ObisEngine::new(config, DefinitionSource::new(&config.sources.software_definitions))
    }
}

impl<S: SoftwareConfigSource> ObisEngine<S> {
    pub fn new(config: &RegistryConfig, source: S) -> Self {
        ObisEngine {
            hexing_legacy: PathBuf::from(&config.sources.hexing_legacy),
            hexcell_legacy: PathBuf::from(&config.sources.hexcell_legacy),
            source,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn legacy_path(&self, brand: Brand) -> &Path {
        match brand {
            Brand::Hexing => &self.hexing_legacy,
            Brand::Hexcell => &self.hexcell_legacy,
        }
    }

    pub fn gather_inputs(&self) -> Result<(RegistryInputs, Vec<RegistryWarning>), RegistryError> {
        let mut inputs = RegistryInputs::default();
        let mut warnings = Vec::new();

        for brand in Brand::all() {
            let path = self.legacy_path(brand);
            let drafts = match read_legacy_source(path, brand)? {
                Some(drafts) => drafts,
                None => {
                    info!("[OBIS] No {brand} legacy source at {}", path.display());
                    warnings.push(RegistryWarning::MissingSource { brand, path: path.display().to_string() });
                    Vec::new()
                }
            };
            match brand {
                Brand::Hexing => inputs.hexing_legacy = drafts,
                Brand::Hexcell => inputs.hexcell_legacy = drafts,
            }
        }

        inputs.software = match SoftwareLoad::from_source(&self.source) {
            SoftwareLoad::Loaded(configs) => configs,
            SoftwareLoad::Warning(reason) => {
                warnings.push(RegistryWarning::SoftwareUnavailable(reason));
                SoftwareConfigurations::default()
            }
        };

        Ok((inputs, warnings))
    }

    pub fn build(&self) -> Result<RegistryBuild, RegistryError> {
        let (inputs, warnings) = self.gather_inputs()?;
        Ok(RegistryBuild { registry: build_registry(&inputs), warnings })
    }

    pub fn load_obis_functions(&self) -> Result<ObisRegistry, RegistryError> {
        Ok(self.build()?.registry)
    }

    /// Looks a code up in `registry`, or in a freshly built one when none is given
    pub fn get_obis_function_by_code(&self, code: &str, brand: Option<Brand>, registry: Option<&ObisRegistry>) -> Result<Option<ObisCodeEntry>, RegistryError> {
        match registry {
            Some(r) => Ok(r.lookup_by_code(code, Scope::from(brand)).cloned()),
            None => {
                let r = self.load_obis_functions()?;
                Ok(r.lookup_by_code(code, Scope::from(brand)).cloned())
            }
        }
    }

    pub fn get_obis_functions_by_group(&self, group: &str, brand: Option<Brand>, registry: Option<&ObisRegistry>) -> Result<Vec<ObisCodeEntry>, RegistryError> {
        let found = |r: &ObisRegistry| -> Vec<ObisCodeEntry> {
            r.lookup_by_group(group, Scope::from(brand)).into_iter().cloned().collect()
        };

        match registry {
            Some(r) => Ok(found(r)),
            None => Ok(found(&self.load_obis_functions()?)),
        }
    }

    pub fn export_to_json(&self, path: &Path, registry: Option<&ObisRegistry>) -> Result<(), ExportError> {
        match registry {
            Some(r) => export::export_registry(path, r),
            None => export::export_registry(path, &self.load_obis_functions()?),
        }
    }
}

/// Opt-in memoisation of a built registry
#[derive(Debug, Default)]
pub struct RegistryCache {
    registry: Option<ObisRegistry>,
}

impl RegistryCache {
    pub fn new() -> Self {
        RegistryCache { registry: None }
    }

    pub fn get_or_build<S: SoftwareConfigSource>(&mut self, engine: &ObisEngine<S>) -> Result<&ObisRegistry, RegistryError> {
        let registry = match self.registry.take() {
            Some(r) => r,
            None => engine.load_obis_functions()?,
        };
        let cached: &ObisRegistry = self.registry.insert(registry);
        Ok(cached)
    }

    pub fn invalidate(&mut self) {
        self.registry = None;
    }

    pub fn is_cached(&self) -> bool {
        self.registry.is_some()
    }
}
