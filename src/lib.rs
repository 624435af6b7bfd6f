//! OBIS code registry for Hexing and Hexcell meters
//!
//! Turns vendor specific meter configuration text into one canonical,
//! queryable directory of OBIS codes. Legacy lists and curated software
//! configurations are merged per brand, then unified across brands.

pub mod config;
pub mod export;
pub mod legacy;
pub mod models;
pub mod obis_utils;
pub mod reconcile;
pub mod registry;
pub mod software;

// Re-export common types for easier access
pub use config::RegistryConfig;
pub use models::{Brand, BrandTag, ObisCodeEntry, MeterConfiguration};
pub use registry::{build_registry, ObisEngine, ObisRegistry, RegistryCache, Scope};
pub use software::{DefinitionSource, SoftwareConfigSource, StaticSource};
