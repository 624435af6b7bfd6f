use obis_registry::{export, Brand, ObisEngine, RegistryConfig, SoftwareConfigSource};
use std::{env, error::Error, path::Path};
use log::{info, warn};

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    let default_filter = env::var("OBIS_LOG_LEVEL").unwrap_or("info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    let config = match env::var("OBIS_CONFIG") {
        Ok(path) => RegistryConfig::load(Path::new(&path))?,
        Err(_) => RegistryConfig::load_default()?,
    };
    let engine = ObisEngine::from_config(&config);

    let command = env::args().nth(1).unwrap_or("export".to_string());
    match command.as_str() {
        "export" => {
            let build = engine.build()?;
            for warning in build.warnings.iter() {
                warn!("{warning}");
            }
            info!("Loaded {} Hexing OBIS functions", build.registry.hexing.len());
            info!("Loaded {} Hexcell OBIS functions", build.registry.hexcell.len());
            info!("Total unified: {}", build.registry.unified.len());

            engine.export_to_json(Path::new(&config.export.path), Some(&build.registry))?;
        },
        "refresh-snapshots" => {
            let software = engine.source().load_software_configurations()?;
            for brand in Brand::all() {
                let path = config.snapshot_path(brand);
                let out = path.with_file_name(format!("obis-{brand}-enhanced.json"));
                let summary = export::refresh_snapshot(&path, software.for_brand(brand), &out)?;
                info!("{brand}: {} functions, {} with class id, {} with unit",
                      summary.total, summary.with_class_id, summary.with_unit);
            }
        },
        "translate" => {
            for brand in Brand::all() {
                let count = export::translate::translate_snapshot(&config.snapshot_path(brand))?;
                info!("{brand}: translated {count} functions");
            }
        },
        other => {
            return Err(format!("Unknown command {other}, use export, refresh-snapshots or translate").into());
        }
    }

    Ok(())
}
