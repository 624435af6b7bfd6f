use crate::models::{AccessRight, Brand, BrandTag, ConnectionParams, ObisCodeEntry, DEFAULT_CATEGORY};
use crate::obis_utils;
use log::warn;
use serde::Deserialize;
use serde_yml;
use std::fs;
use std::path::Path;

use super::SoftwareConfigError;

/// One curated OBIS object of a vendor software configuration
#[derive(Deserialize, Clone, Debug)]
pub struct ObisDefinition {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub class_id: Option<u16>,
    pub attribute_id: Option<u8>,
    pub method_id: Option<u8>,
    pub data_type: Option<String>,
    pub data_length: Option<u32>,
    pub scaler: Option<i8>,
    pub unit: Option<String>,
    /// `R`, `W` or `RW`
    pub access: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ObisDefinition {
    pub fn into_entry(self, brand: Brand) -> ObisCodeEntry {
        let code = obis_utils::canonicalize_obis_code(&self.code);
        // blank text stays blank so merges can fall back to legacy text
        let name = self.name.trim();
        let description = self.description.trim();

        let category = non_blank(self.category);
        let subcategory = non_blank(self.subcategory);

        let mut entry = ObisCodeEntry::new(&code, name, BrandTag::from(brand));
        entry.description = description.to_string();
        entry.class_id = self.class_id;
        entry.attribute_id = self.attribute_id;
        entry.method_id = self.method_id;
        entry.data_type = non_blank(self.data_type);
        entry.data_length = self.data_length;
        entry.scaler = self.scaler;
        entry.unit = non_blank(self.unit);
        entry.access_right = self.access.as_deref().map(AccessRight::from_notation);
        entry.category = Some(category.clone()
            .or_else(|| subcategory.clone())
            .unwrap_or(DEFAULT_CATEGORY.to_string()));
        entry.subcategory = subcategory;
        entry
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SoftwareDefinitionFile {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub connection: Option<ConnectionParams>,
    #[serde(default)]
    pub obis_codes: Vec<ObisDefinition>,
}

impl SoftwareDefinitionFile {
    /// Converted entries, definitions with a malformed code are dropped
    pub fn entries(&self, brand: Brand) -> Vec<ObisCodeEntry> {
        self.obis_codes.iter()
            .cloned()
            .map(|d| d.into_entry(brand))
            .filter(|e| {
                let valid = obis_utils::validate_obis_code(&e.code);
                if !valid {
                    warn!("Skipping {brand} definition with malformed OBIS code {:?}", e.code);
                }
                valid
            })
            .collect()
    }
}

fn read_text(path: &Path) -> Result<String, SoftwareConfigError> {
    fs::read_to_string(path).map_err(|e| SoftwareConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn read_definition_file(path: &Path) -> Result<SoftwareDefinitionFile, SoftwareConfigError> {
    let contents = read_text(path)?;
    serde_yml::from_str(&contents).map_err(|e| SoftwareConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

pub fn read_connection_file(path: &Path) -> Result<ConnectionParams, SoftwareConfigError> {
    let contents = read_text(path)?;
    serde_yml::from_str(&contents).map_err(|e| SoftwareConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
