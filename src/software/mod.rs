/*
    Software configuration sources.

    The vendor tooling ships richer OBIS data than the legacy lists (class ids,
    scalers, access rights). Parsing the vendor's own file formats happens
    elsewhere; here we only need the result, so every source implements
    `SoftwareConfigSource` and the registry pipeline works against the trait.
*/

use crate::models::{Brand, ConnectionParams, MeterConfiguration, ObisCodeEntry};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub mod definitions;

pub const CONNECTION_FILE: &str = "connection.yaml";
pub const DEFAULT_MODEL: &str = "default";

#[derive(Error, Debug)]
pub enum SoftwareConfigError {
    #[error("Unable to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("No {brand} definition declares model {model}")]
    UnknownModel { brand: Brand, model: String },
}

/// Software derived entries of both brands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoftwareConfigurations {
    pub hexing: Vec<ObisCodeEntry>,
    pub hexcell: Vec<ObisCodeEntry>,
}

impl SoftwareConfigurations {
    pub fn for_brand(&self, brand: Brand) -> &[ObisCodeEntry] {
        match brand {
            Brand::Hexing => &self.hexing,
            Brand::Hexcell => &self.hexcell,
        }
    }
}

/// Outcome of asking a source for its data. A failing source does not stop
/// the registry build, the caller gets the reason instead of the data.
#[derive(Debug, Clone, PartialEq)]
pub enum SoftwareLoad {
    Loaded(SoftwareConfigurations),
    Warning(String),
}

impl SoftwareLoad {
    pub fn from_source(source: &dyn SoftwareConfigSource) -> Self {
        match source.load_software_configurations() {
            Ok(configs) => {
                info!("[OBIS] Loaded {} Hexing OBIS codes from software config", configs.hexing.len());
                info!("[OBIS] Loaded {} Hexcell OBIS codes from software config", configs.hexcell.len());
                SoftwareLoad::Loaded(configs)
            },
            Err(e) => {
                warn!("[OBIS] Error loading software configurations: {e}");
                SoftwareLoad::Warning(e.to_string())
            }
        }
    }

    pub fn into_configurations(self) -> SoftwareConfigurations {
        match self {
            SoftwareLoad::Loaded(configs) => configs,
            SoftwareLoad::Warning(_) => SoftwareConfigurations::default(),
        }
    }
}

pub trait SoftwareConfigSource {
    /// Entries of one vendor OBIS list file
    fn parse_vendor_obis_list(&self, brand: Brand, path: &Path) -> Result<Vec<ObisCodeEntry>, SoftwareConfigError> {
        let file = definitions::read_definition_file(path)?;
        Ok(file.entries(brand))
    }

    /// Serial / network parameters of a meter management configuration
    fn parse_connection_config(&self, path: &Path) -> Result<ConnectionParams, SoftwareConfigError> {
        definitions::read_connection_file(path)
    }

    fn load_software_configurations(&self) -> Result<SoftwareConfigurations, SoftwareConfigError>;

    fn get_meter_model_configuration(&self, brand: Brand, model: Option<&str>) -> Result<MeterConfiguration, SoftwareConfigError>;
}

/// Reads curated definitions laid out as `<root>/<brand>/*.yaml`
pub struct DefinitionSource {
    root: PathBuf,
}

impl DefinitionSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        DefinitionSource { root: root.as_ref().to_path_buf() }
    }

    fn brand_dir(&self, brand: Brand) -> PathBuf {
        self.root.join(brand.as_str())
    }

    /// Definition files of a brand in file name order
    pub fn definition_files(&self, brand: Brand) -> Vec<PathBuf> {
        let dir = self.brand_dir(brand);
        if !dir.is_dir() {
            debug!("No software definitions for {brand} in {}", dir.display());
            return Vec::new();
        }

        WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                let is_yaml = matches!(p.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"));
                let is_connection = p.file_name().and_then(|n| n.to_str()) == Some(CONNECTION_FILE);
                is_yaml && !is_connection
            })
            .collect()
    }

    fn load_brand(&self, brand: Brand) -> Result<Vec<ObisCodeEntry>, SoftwareConfigError> {
        let mut entries = Vec::new();
        for path in self.definition_files(brand) {
            let mut parsed = self.parse_vendor_obis_list(brand, &path)?;
            debug!("Loaded {} {brand} definitions from {}", parsed.len(), path.display());
            entries.append(&mut parsed);
        }
        Ok(entries)
    }

    fn brand_connection(&self, brand: Brand) -> Option<ConnectionParams> {
        let path = self.brand_dir(brand).join(CONNECTION_FILE);
        if !path.is_file() {
            return None;
        }

        match self.parse_connection_config(&path) {
            Ok(params) => Some(params),
            Err(e) => {
                warn!("Ignoring connection parameters of {brand}: {e}");
                None
            }
        }
    }
}

impl SoftwareConfigSource for DefinitionSource {
    fn load_software_configurations(&self) -> Result<SoftwareConfigurations, SoftwareConfigError> {
        Ok(SoftwareConfigurations {
            hexing: self.load_brand(Brand::Hexing)?,
            hexcell: self.load_brand(Brand::Hexcell)?,
        })
    }

    fn get_meter_model_configuration(&self, brand: Brand, model: Option<&str>) -> Result<MeterConfiguration, SoftwareConfigError> {
        let Some(model) = model else {
            return Ok(MeterConfiguration {
                brand,
                model: DEFAULT_MODEL.to_string(),
                connection_params: self.brand_connection(brand),
                obis_codes: self.load_brand(brand)?,
            });
        };

        for path in self.definition_files(brand) {
            let file = definitions::read_definition_file(&path)?;
            let declared = file.model.as_deref().map(|m| m.eq_ignore_ascii_case(model)).unwrap_or(false);
            if !declared {
                continue;
            }

            info!("Using {} for {brand} model {model}", path.display());
            let connection_params = file.connection.clone().or_else(|| self.brand_connection(brand));
            return Ok(MeterConfiguration {
                brand,
                model: model.to_string(),
                connection_params,
                obis_codes: file.entries(brand),
            });
        }

        Err(SoftwareConfigError::UnknownModel { brand, model: model.to_string() })
    }
}

/// Already parsed software data held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub configurations: SoftwareConfigurations,
    pub connections: HashMap<Brand, ConnectionParams>,
}

impl StaticSource {
    pub fn new(hexing: Vec<ObisCodeEntry>, hexcell: Vec<ObisCodeEntry>) -> Self {
        StaticSource {
            configurations: SoftwareConfigurations { hexing, hexcell },
            connections: HashMap::new(),
        }
    }
}

impl SoftwareConfigSource for StaticSource {
    fn load_software_configurations(&self) -> Result<SoftwareConfigurations, SoftwareConfigError> {
        Ok(self.configurations.clone())
    }

    fn get_meter_model_configuration(&self, brand: Brand, model: Option<&str>) -> Result<MeterConfiguration, SoftwareConfigError> {
        Ok(MeterConfiguration {
            brand,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            connection_params: self.connections.get(&brand).cloned(),
            obis_codes: self.configurations.for_brand(brand).to_vec(),
        })
    }
}
