use super::{export_snapshot, load_snapshot, ExportError};
use crate::models::ObisCodeEntry;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref CHINESE: Regex = Regex::new(r"[\x{4E00}-\x{9FA5}]").unwrap();

    // Longest phrase first so compounds like 有功功率 are not split up by 功率
    static ref TRANSLATIONS: Vec<(&'static str, &'static str)> = {
        let mut table = vec![
            ("电网质量", "Power Grid Quality"),
            ("时间相关", "Time Related"),
            ("任意相短时间掉电次数", "Number of short power failures in any phase"),
            ("任意相长时间掉电次数", "Number of long power failures in any phase"),
            ("长时间掉电时间门限", "Long power failure time threshold"),
            ("短时间掉电时间门限", "Short power failure time threshold"),
            ("任意相长时间掉电持续时间", "Duration of long power failure in any phase"),
            ("电压", "Voltage"),
            ("电压质量", "Voltage Quality"),
            ("电压偏差", "Voltage Deviation"),
            ("过电压", "Over Voltage"),
            ("欠电压", "Under Voltage"),
            ("电压不平衡", "Voltage Imbalance"),
            ("电压波动", "Voltage Fluctuation"),
            ("电流", "Current"),
            ("电流不平衡", "Current Imbalance"),
            ("过电流", "Over Current"),
            ("功率", "Power"),
            ("有功功率", "Active Power"),
            ("无功功率", "Reactive Power"),
            ("视在功率", "Apparent Power"),
            ("功率因数", "Power Factor"),
            ("电能", "Energy"),
            ("有功电能", "Active Energy"),
            ("无功电能", "Reactive Energy"),
            ("正向有功电能", "Forward Active Energy"),
            ("反向有功电能", "Reverse Active Energy"),
            ("时间", "Time"),
            ("日期", "Date"),
            ("时钟", "Clock"),
            ("电表", "Meter"),
            ("表号", "Meter Number"),
            ("表计", "Meter"),
            ("费率", "Tariff"),
            ("尖", "Peak"),
            ("峰", "Peak"),
            ("平", "Normal"),
            ("谷", "Off-Peak"),
            ("事件", "Event"),
            ("报警", "Alarm"),
            ("故障", "Fault"),
            ("状态", "Status"),
            ("运行", "Running"),
            ("停止", "Stopped"),
            ("通信", "Communication"),
            ("连接", "Connection"),
            ("断开", "Disconnected"),
            ("继电器", "Relay"),
            ("开关", "Switch"),
            ("跳闸", "Trip"),
            ("合闸", "Close"),
            ("防窃电", "Anti-Tampering"),
            ("开盖", "Cover Open"),
            ("磁干扰", "Magnetic Interference"),
            ("反向", "Reverse"),
            ("失流", "Current Loss"),
            ("失压", "Voltage Loss"),
            ("测量", "Measurement"),
            ("瞬时", "Instantaneous"),
            ("累计", "Cumulative"),
            ("平均", "Average"),
            ("最大", "Maximum"),
            ("最小", "Minimum"),
            ("相", "Phase"),
            ("A相", "Phase A"),
            ("B相", "Phase B"),
            ("C相", "Phase C"),
            ("三相", "Three Phase"),
            ("单相", "Single Phase"),
            ("总", "Total"),
            ("当前", "Current"),
            ("历史", "Historical"),
            ("记录", "Record"),
            ("数据", "Data"),
            ("参数", "Parameter"),
            ("配置", "Configuration"),
            ("设置", "Setting"),
        ];
        table.sort_by_key(|(phrase, _)| std::cmp::Reverse(phrase.chars().count()));
        table
    };
}

pub fn contains_chinese(text: &str) -> bool {
    CHINESE.is_match(text)
}

/// Replaces every known phrase, unknown characters are left as they are
pub fn translate_text(text: &str) -> String {
    if !contains_chinese(text) {
        return text.to_string();
    }

    let mut translated = text.to_string();
    for (phrase, english) in TRANSLATIONS.iter() {
        if translated.contains(phrase) {
            translated = translated.replace(phrase, english);
        }
    }
    translated
}

/// Descriptions carry the raw tab separated legacy row, every column is
/// translated on its own
pub fn translate_description(description: &str) -> String {
    description.split('\t')
        .map(translate_text)
        .collect::<Vec<_>>()
        .join("\t")
}

/// Returns the translated entry, or `None` when nothing had to change
pub fn translate_entry(entry: &ObisCodeEntry) -> Option<ObisCodeEntry> {
    let category_has_chinese = entry.category.as_deref().map(contains_chinese).unwrap_or(false);
    if !contains_chinese(&entry.name) && !contains_chinese(&entry.description) && !category_has_chinese {
        return None;
    }

    let mut translated = entry.clone();
    translated.name = translate_text(&entry.name);
    translated.description = translate_description(&entry.description);
    translated.category = entry.category.as_deref().map(translate_text);
    debug!("Translated {}: {} -> {}", entry.code, entry.name, translated.name);
    Some(translated)
}

/// Translates every function of a snapshot in place. The file is only
/// rewritten when at least one entry changed. Returns the changed count.
pub fn translate_snapshot(path: &Path) -> Result<usize, ExportError> {
    let mut snapshot = load_snapshot(path)?;

    let mut count = 0;
    for function in snapshot.functions.iter_mut() {
        if let Some(translated) = translate_entry(function) {
            *function = translated;
            count += 1;
        }
    }

    if count > 0 {
        export_snapshot(path, &snapshot.functions)?;
        info!("Translated {} functions in {}", count, path.display());
    } else {
        info!("Nothing to translate in {}", path.display());
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BrandTag;
    use std::fs;

    #[test]
    fn test_contains_chinese() {
        assert!(contains_chinese("正向有功总电能"));
        assert!(contains_chinese("Energy 电能"));
        assert!(!contains_chinese("Active energy import"));
        assert!(!contains_chinese("√\t3\t1-0:1.8.0.255"));
    }

    #[test]
    fn test_translate_text_prefers_longest_phrase() {
        assert_eq!(translate_text("有功功率"), "Active Power");
        assert_eq!(translate_text("正向有功电能"), "Forward Active Energy");
        assert_eq!(translate_text("电压不平衡"), "Voltage Imbalance");
        assert_eq!(translate_text("A相"), "Phase A");
        assert_eq!(translate_text("Clock"), "Clock");
        // unknown characters stay
        assert_eq!(translate_text("电能表"), "Energy表");
    }

    #[test]
    fn test_translate_description_per_column() {
        assert_eq!(translate_description("√\t电压\t3\t1-0:32.7.0.255"), "√\tVoltage\t3\t1-0:32.7.0.255");
        assert_eq!(translate_description(""), "");
    }

    #[test]
    fn test_translate_entry() {
        let english = ObisCodeEntry::new("0-0:1.0.0.255", "Clock", BrandTag::Hexcell);
        assert_eq!(translate_entry(&english), None);

        let mut entry = ObisCodeEntry::new("1-0:21.7.0.255", "有功功率", BrandTag::Hexcell);
        entry.description = "√\t有功功率\t3".to_string();
        entry.category = Some("电网质量".to_string());
        entry.class_id = Some(3);

        let translated = translate_entry(&entry).unwrap();
        assert_eq!(translated.name, "Active Power");
        assert_eq!(translated.description, "√\tActive Power\t3");
        assert_eq!(translated.category, Some("Power Grid Quality".to_string()));
        assert_eq!(translated.class_id, Some(3));
        assert_eq!(translated.code, entry.code);
    }

    #[test]
    fn test_translate_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obis-hexcell.json");
        fs::write(&path, r#"{"functions": [
            {"code": "1-0:32.7.0.255", "name": "电压", "brand": "hexcell", "group": "电网质量"},
            {"code": "0-0:1.0.0.255", "name": "Clock", "brand": "hexcell"}
        ]}"#).unwrap();

        assert_eq!(translate_snapshot(&path).unwrap(), 1);
        let written = load_snapshot(&path).unwrap();
        assert_eq!(written.functions[0].name, "Voltage");
        assert_eq!(written.functions[0].category, Some("Power Grid Quality".to_string()));
        assert_eq!(written.functions[1].name, "Clock");
        assert!(!fs::read_to_string(&path).unwrap().contains("电压"));
    }

    #[test]
    fn test_translate_snapshot_leaves_english_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obis-hexing.json");
        let contents = r#"{"functions": [{"code": "0-0:1.0.0.255", "name": "Clock", "brand": "hexing"}]}"#;
        fs::write(&path, contents).unwrap();

        assert_eq!(translate_snapshot(&path).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);

        // missing snapshot is nothing to do, not an error
        assert_eq!(translate_snapshot(&dir.path().join("none.json")).unwrap(), 0);
    }
}
