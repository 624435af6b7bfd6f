use crate::models::{Brand, BrandTag, ObisCodeEntry, DEFAULT_CATEGORY};
use crate::obis_utils;
use log::{debug, info};
use std::fs;
use std::path::Path;

pub mod utils;

/// Placeholder for the value attribute, applied to every legacy row
pub const LEGACY_ATTRIBUTE_ID: u8 = 2;

/// Text dialect of a vendor's legacy OBIS list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegacyDialect {
    pub brand: Brand,
    pub skip_section_headers: bool,
}

impl LegacyDialect {
    pub fn for_brand(brand: Brand) -> Self {
        match brand {
            Brand::Hexing => LegacyDialect { brand, skip_section_headers: false },
            Brand::Hexcell => LegacyDialect { brand, skip_section_headers: true },
        }
    }
}

fn draft_entry(code: String, name: &str, raw_line: &str, brand: Brand) -> ObisCodeEntry {
    let name = if name.is_empty() { code.as_str() } else { name };
    let mut entry = ObisCodeEntry::new(&code, name, BrandTag::from(brand));
    entry.description = raw_line.trim().to_string();
    entry.unit = utils::infer_unit(raw_line);
    entry.category = Some(DEFAULT_CATEGORY.to_string());
    entry.attribute_id = Some(LEGACY_ATTRIBUTE_ID);
    entry
}

/// Parses one raw line into zero or more draft entries. A line naming the
/// same code in dotted and in hex form yields two drafts, the merge collapses
/// them later.
pub fn parse_legacy_line(raw_line: &str, dialect: &LegacyDialect) -> Vec<ObisCodeEntry> {
    let mut drafts = Vec::new();
    if raw_line.trim().is_empty() {
        return drafts;
    }

    let tokens = utils::tokenize(raw_line);
    if dialect.skip_section_headers && utils::is_section_header(&tokens) {
        debug!("Skipping section header: {}", raw_line.trim());
        return drafts;
    }

    let name = utils::name_candidate(&tokens);
    let found = obis_utils::extract_identifiers(raw_line);

    for code in found.decimal {
        drafts.push(draft_entry(code, name, raw_line, dialect.brand));
    }

    for token in found.hex {
        if let Some(code) = obis_utils::decode_hex(&token) {
            drafts.push(draft_entry(code, name, raw_line, dialect.brand));
        }
    }

    drafts
}

pub fn parse_legacy_text(content: &str, dialect: &LegacyDialect) -> Vec<ObisCodeEntry> {
    content.lines()
        .flat_map(|line| parse_legacy_line(line, dialect))
        .collect()
}

/// Reads and parses a legacy list. Undecodable bytes are replaced instead of
/// failing the whole file.
pub fn parse_legacy_file(path: &Path, brand: Brand) -> std::io::Result<Vec<ObisCodeEntry>> {
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let drafts = parse_legacy_text(&content, &LegacyDialect::for_brand(brand));

    info!("[OBIS] Parsed {} {} legacy entries from {}", drafts.len(), brand, path.display());
    Ok(drafts)
}
