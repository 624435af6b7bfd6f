/*
    The three merge steps of the registry.

    All of them build fresh records and leave their inputs untouched, so the
    pipeline gives the same records for the same inputs every time. Keys are
    the upper cased codes, the result keeps first insertion order.
*/

use crate::models::{BrandTag, ObisCodeEntry, DEFAULT_CATEGORY};
use indexmap::IndexMap;
use log::debug;

fn prefer_text(preferred: &str, fallback: &str) -> String {
    if preferred.is_empty() { fallback.to_string() } else { preferred.to_string() }
}

/// Merges the legacy drafts of one brand with its software entries.
///
/// A software entry replaces the legacy record with the same code, only the
/// name and description of the legacy record survive when the software one
/// has none. Duplicate legacy drafts collapse onto one key.
pub fn merge_legacy_with_software(legacy: &[ObisCodeEntry], software: &[ObisCodeEntry]) -> IndexMap<String, ObisCodeEntry> {
    let mut merged: IndexMap<String, ObisCodeEntry> = IndexMap::new();
    for entry in legacy {
        merged.insert(entry.key(), entry.clone());
    }

    for entry in software {
        let key = entry.key();
        let replacement = match merged.get(&key) {
            Some(existing) => ObisCodeEntry {
                name: prefer_text(&entry.name, &existing.name),
                description: prefer_text(&entry.description, &existing.description),
                ..entry.clone()
            },
            None => entry.clone(),
        };
        merged.insert(key, replacement);
    }

    debug!("Merged {} legacy and {} software entries into {}", legacy.len(), software.len(), merged.len());
    merged
}

/// Builds the cross brand map. Hexing fields always win, a code known to
/// both brands only gets the combined brand tag.
pub fn unify_brands(hexing: &[ObisCodeEntry], hexcell: &[ObisCodeEntry]) -> IndexMap<String, ObisCodeEntry> {
    let mut unified: IndexMap<String, ObisCodeEntry> = IndexMap::new();
    for entry in hexing {
        unified.insert(entry.key(), entry.with_brand(BrandTag::Hexing));
    }

    for entry in hexcell {
        let key = entry.key();
        let record = match unified.get(&key) {
            Some(existing) => existing.with_brand(BrandTag::Both),
            None => entry.with_brand(BrandTag::Hexcell),
        };
        unified.insert(key, record);
    }

    unified
}

/// Refreshes a previously published snapshot with freshly parsed software
/// entries. Technical fields come from the fresh entry, curated text from the
/// snapshot. Fresh entries without a snapshot record are appended.
pub fn reconcile_snapshot(existing: &[ObisCodeEntry], fresh: &[ObisCodeEntry]) -> Vec<ObisCodeEntry> {
    let mut lookup: IndexMap<String, &ObisCodeEntry> = IndexMap::new();
    for entry in fresh {
        lookup.insert(entry.key(), entry);
    }

    let mut merged = Vec::with_capacity(existing.len() + lookup.len());
    for record in existing {
        match lookup.shift_remove(&record.key()) {
            Some(update) => merged.push(ObisCodeEntry {
                class_id: update.class_id.or(record.class_id),
                attribute_id: update.attribute_id.or(record.attribute_id),
                unit: update.unit.clone().or_else(|| record.unit.clone()),
                name: prefer_text(&record.name, &update.name),
                description: prefer_text(&record.description, &update.description),
                ..record.clone()
            }),
            None => merged.push(record.clone()),
        }
    }

    for (_, discovered) in lookup {
        let mut entry = discovered.clone();
        if entry.category.is_none() {
            entry.category = Some(entry.subcategory.clone().unwrap_or(DEFAULT_CATEGORY.to_string()));
        }
        merged.push(entry);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: &str, name: &str, brand: BrandTag) -> ObisCodeEntry {
        ObisCodeEntry::new(code, name, brand)
    }

    #[test]
    fn test_software_overrides_technical_fields() {
        let legacy = vec![entry("1-0:1.8.0.255", "Energy Import", BrandTag::Hexing)];
        let mut software = entry("1-0:1.8.0.255", "", BrandTag::Hexing);
        software.unit = Some("kWh".to_string());
        software.class_id = Some(3);

        let merged = merge_legacy_with_software(&legacy, &[software]);
        assert_eq!(merged.len(), 1);
        let result = &merged["1-0:1.8.0.255"];
        assert_eq!(result.name, "Energy Import");
        assert_eq!(result.unit, Some("kWh".to_string()));
        assert_eq!(result.class_id, Some(3));
    }

    #[test]
    fn test_software_fields_replace_legacy_wholesale() {
        let mut legacy = entry("0-0:1.0.0.255", "Clock", BrandTag::Hexing);
        legacy.description = "Clock\t0-0:1.0.0.255".to_string();
        legacy.unit = Some("V".to_string());
        legacy.attribute_id = Some(2);
        let mut software = entry("0-0:1.0.0.255", "Date time", BrandTag::Hexing);
        software.class_id = Some(8);

        let merged = merge_legacy_with_software(&[legacy.clone()], &[software]);
        let result = &merged["0-0:1.0.0.255"];
        assert_eq!(result.name, "Date time");
        assert_eq!(result.description, "Clock\t0-0:1.0.0.255");
        assert_eq!(result.unit, None);
        assert_eq!(result.attribute_id, None);
        assert_eq!(legacy.unit, Some("V".to_string()));
    }

    #[test]
    fn test_duplicate_drafts_collapse() {
        let legacy = vec![
            entry("1-0:1.8.0.255", "Energy", BrandTag::Hexing),
            entry("1-0:1.8.0.255", "Energy", BrandTag::Hexing),
            entry("0-0:1.0.0.255", "Clock", BrandTag::Hexing),
        ];
        let software = vec![entry("1-0:32.7.0.255", "Voltage L1", BrandTag::Hexing)];

        let merged = merge_legacy_with_software(&legacy, &software);
        assert_eq!(merged.len(), 3);
        assert!(merged.contains_key("1-0:32.7.0.255"));
    }

    #[test]
    fn test_unify_marks_shared_codes() {
        let mut hexing = entry("1-0:1.8.0.255", "Energy import", BrandTag::Hexing);
        hexing.class_id = Some(3);
        let mut hexcell = entry("1-0:1.8.0.255", "Forward active energy", BrandTag::Hexcell);
        hexcell.class_id = Some(4);
        hexcell.unit = Some("kWh".to_string());
        let only_hexcell = entry("0-0:96.1.0.255", "Serial", BrandTag::Hexcell);

        let unified = unify_brands(&[hexing.clone()], &[hexcell, only_hexcell]);
        assert_eq!(unified.len(), 2);

        let shared = &unified["1-0:1.8.0.255"];
        assert_eq!(shared.brand, BrandTag::Both);
        assert_eq!(shared, &hexing.with_brand(BrandTag::Both));
        assert_eq!(unified["0-0:96.1.0.255"].brand, BrandTag::Hexcell);
    }

    #[test]
    fn test_unify_forces_brand_tags() {
        let stray = entry("0-0:1.0.0.255", "Clock", BrandTag::Hexcell);
        let unified = unify_brands(&[stray], &[]);
        assert_eq!(unified["0-0:1.0.0.255"].brand, BrandTag::Hexing);
    }

    #[test]
    fn test_reconcile_snapshot() {
        let mut curated = entry("1-0:1.8.0.255", "Energy import", BrandTag::Hexcell);
        curated.unit = Some("Wh".to_string());
        curated.attribute_id = Some(2);
        curated.category = Some("Energy".to_string());
        let untouched = entry("0-0:1.0.0.255", "Clock", BrandTag::Hexcell);

        let mut update = entry("1-0:1.8.0.255", "正向有功总电能", BrandTag::Hexcell);
        update.unit = Some("kWh".to_string());
        update.class_id = Some(3);
        update.description = "Forward active energy".to_string();
        let mut discovered = entry("1-0:32.7.0.255", "Voltage L1", BrandTag::Hexcell);
        discovered.subcategory = Some("Instantaneous".to_string());
        let plain = entry("1-0:14.7.0.255", "Frequency", BrandTag::Hexcell);

        let merged = reconcile_snapshot(&[curated, untouched.clone()], &[update, discovered, plain]);
        assert_eq!(merged.len(), 4);

        assert_eq!(merged[0].name, "Energy import");
        assert_eq!(merged[0].description, "Forward active energy");
        assert_eq!(merged[0].unit, Some("kWh".to_string()));
        assert_eq!(merged[0].class_id, Some(3));
        assert_eq!(merged[0].attribute_id, Some(2));
        assert_eq!(merged[0].category, Some("Energy".to_string()));

        assert_eq!(merged[1], untouched);
        assert_eq!(merged[2].category, Some("Instantaneous".to_string()));
        assert_eq!(merged[3].category, Some("General".to_string()));
    }

    #[test]
    fn test_merges_are_repeatable() {
        let legacy = vec![entry("1-0:1.8.0.255", "Energy", BrandTag::Hexing)];
        let software = vec![entry("0-0:1.0.0.255", "Clock", BrandTag::Hexing)];
        assert_eq!(merge_legacy_with_software(&legacy, &software),
                   merge_legacy_with_software(&legacy, &software));
    }
}
