use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SECTION_HEADER: Regex = Regex::new(r"^\d+\s").unwrap();

    // First match wins, order matters. Word edges are ASCII only, so a CJK
    // character right next to a unit still counts as a separator.
    static ref UNIT_RULES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)(?:^|[^A-Za-z0-9_])Wh(?:$|[^A-Za-z0-9_])").unwrap(), "Wh"),
        (Regex::new(r"(?i)(?:^|[^A-Za-z0-9_])V(?:$|[^A-Za-z0-9_])|voltage").unwrap(), "V"),
        (Regex::new(r"(?i)(?:^|[^A-Za-z0-9_])A(?:$|[^A-Za-z0-9_])|current").unwrap(), "A"),
        (Regex::new(r"(?i)hz|frequency").unwrap(), "Hz"),
        (Regex::new(r"(?i)(?:^|[^A-Za-z0-9_])W(?:$|[^A-Za-z0-9_])|power").unwrap(), "W"),
    ];
}

/// Splits a raw tab separated row into cleaned fields. Never fails, rows with
/// missing or extra columns just give a shorter or longer list.
pub fn tokenize(raw_line: &str) -> Vec<String> {
    raw_line.split('\t')
        .map(|field| {
            let field = field.strip_prefix('"').unwrap_or(field);
            let field = field.strip_suffix('"').unwrap_or(field);
            field.trim().to_string()
        })
        .filter(|field| !field.is_empty())
        .collect()
}

/// Second column is the name in both dialects, fall back to the first one
pub fn name_candidate(tokens: &[String]) -> &str {
    tokens.get(1)
        .or_else(|| tokens.first())
        .map(|s| s.as_str())
        .unwrap_or("")
}

/// Hexcell lists interleave numbered section headers like `3 Energy`
pub fn is_section_header(tokens: &[String]) -> bool {
    match tokens.first() {
        Some(first) => SECTION_HEADER.is_match(first),
        None => false,
    }
}

/// Best effort unit guess from free text
pub fn infer_unit(raw_line: &str) -> Option<String> {
    UNIT_RULES.iter()
        .find(|(rule, _)| rule.is_match(raw_line))
        .map(|(_, unit)| unit.to_string())
}
