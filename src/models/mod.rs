use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CATEGORY: &str = "General";

/// Meter vendor whose configuration dialect a record came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    Hexing,
    Hexcell,
}

impl Brand {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hexing" => Some(Brand::Hexing),
            "hexcell" => Some(Brand::Hexcell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Brand::Hexing => "hexing",
            Brand::Hexcell => "hexcell",
        }
    }

    pub fn all() -> [Brand; 2] {
        [Brand::Hexing, Brand::Hexcell]
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Brand tag stored on a registry record. `Both` marks a code that the
/// unified registry found in the Hexing and the Hexcell catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BrandTag {
    #[serde(rename = "hexing")]
    Hexing,
    #[serde(rename = "hexcell")]
    Hexcell,
    #[serde(rename = "hexing,hexcell")]
    Both,
}

impl BrandTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrandTag::Hexing => "hexing",
            BrandTag::Hexcell => "hexcell",
            BrandTag::Both => "hexing,hexcell",
        }
    }

    pub fn contains(&self, brand: Brand) -> bool {
        match (self, brand) {
            (BrandTag::Both, _) => true,
            (BrandTag::Hexing, Brand::Hexing) => true,
            (BrandTag::Hexcell, Brand::Hexcell) => true,
            _ => false,
        }
    }
}

impl From<Brand> for BrandTag {
    fn from(brand: Brand) -> Self {
        match brand {
            Brand::Hexing => BrandTag::Hexing,
            Brand::Hexcell => BrandTag::Hexcell,
        }
    }
}

impl fmt::Display for BrandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AccessRight {
    pub read: bool,
    pub write: bool,
}

impl AccessRight {
    /// Parses the vendor notation `R`, `W`, `RW` (anything else is no access)
    pub fn from_notation(s: &str) -> Self {
        let s = s.trim().to_uppercase();
        AccessRight {
            read: s.contains('R'),
            write: s.contains('W'),
        }
    }
}

/// One catalog record of the registry.
///
/// `name` and `description` are plain strings; an empty string counts as
/// "not supplied" when records get merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObisCodeEntry {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_id: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_id: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_right: Option<AccessRight>,
    pub brand: BrandTag,
    #[serde(default, alias = "group", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

impl ObisCodeEntry {
    pub fn new(code: &str, name: &str, brand: BrandTag) -> Self {
        ObisCodeEntry {
            code: code.to_string(),
            name: name.to_string(),
            description: String::new(),
            class_id: None,
            attribute_id: None,
            method_id: None,
            data_type: None,
            data_length: None,
            scaler: None,
            unit: None,
            access_right: None,
            brand,
            category: None,
            subcategory: None,
        }
    }

    /// Key used by every merge and lookup
    pub fn key(&self) -> String {
        self.code.to_uppercase()
    }

    pub fn with_brand(&self, brand: BrandTag) -> Self {
        ObisCodeEntry {
            brand,
            ..self.clone()
        }
    }
}

fn baud_rate_default() -> u32 { 4800 }
fn data_bits_default() -> u8 { 8 }
fn stop_bits_default() -> u8 { 1 }
fn parity_default() -> u8 { 0 }

/// Serial / network parameters of a meter management configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionParams {
    #[serde(default="baud_rate_default")]
    pub baud_rate: u32,
    #[serde(default="data_bits_default")]
    pub data_bits: u8,
    #[serde(default="stop_bits_default")]
    pub stop_bits: u8,
    #[serde(default="parity_default")]
    pub parity: u8,
    #[serde(default)]
    pub meter_address: Option<String>,
    #[serde(default)]
    pub auth_type: Option<String>,
    #[serde(default)]
    pub server_address: Option<String>,
    #[serde(default)]
    pub client_address: Option<String>,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        ConnectionParams {
            baud_rate: baud_rate_default(),
            data_bits: data_bits_default(),
            stop_bits: stop_bits_default(),
            parity: parity_default(),
            meter_address: None,
            auth_type: None,
            server_address: None,
            client_address: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeterConfiguration {
    pub brand: Brand,
    pub model: String,
    pub connection_params: Option<ConnectionParams>,
    pub obis_codes: Vec<ObisCodeEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_tag_serialization() {
        let entry = ObisCodeEntry::new("1-0:1.8.0.255", "Energy", BrandTag::Both);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"brand\":\"hexing,hexcell\""));
        assert!(!json.contains("classId"));
    }

    #[test]
    fn test_group_alias_is_accepted() {
        let json = r#"{"code":"0-0:1.0.0.255","name":"Clock","brand":"hexcell","group":"Clock","classId":8}"#;
        let entry: ObisCodeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.category, Some("Clock".to_string()));
        assert_eq!(entry.class_id, Some(8));
        assert_eq!(entry.description, "");
    }

    #[test]
    fn test_access_right_notation() {
        assert_eq!(AccessRight::from_notation("RW"), AccessRight { read: true, write: true });
        assert_eq!(AccessRight::from_notation("r"), AccessRight { read: true, write: false });
        assert_eq!(AccessRight::from_notation("\\"), AccessRight::default());
    }

    #[test]
    fn test_brand_from_str() {
        assert_eq!(Brand::from_str(" Hexing "), Some(Brand::Hexing));
        assert_eq!(Brand::from_str("hexcell"), Some(Brand::Hexcell));
        assert_eq!(Brand::from_str("landis"), None);
        assert!(BrandTag::Both.contains(Brand::Hexcell));
        assert!(!BrandTag::Hexing.contains(Brand::Hexcell));
    }
}
