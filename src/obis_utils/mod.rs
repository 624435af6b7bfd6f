use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DECIMAL_OBIS: Regex = Regex::new(r"(\d+-\d+:\d+\.\d+\.\d+\.\d+)").unwrap();
    static ref HEX_OBIS: Regex = Regex::new(r"\{?([0-9A-Fa-f]{12})\}?").unwrap();
}

/// Identifier mentions found on one raw source line, grouped by encoding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedIdentifiers {
    pub decimal: Vec<String>,
    pub hex: Vec<String>,
}

impl ExtractedIdentifiers {
    pub fn is_empty(&self) -> bool {
        self.decimal.is_empty() && self.hex.is_empty()
    }
}

/// Turns a packed 12 hex digit digest like `0000010008FF` into `0-0:1.0.8.255`.
/// Returns `None` when the token is not exactly six hex bytes.
pub fn decode_hex(token: &str) -> Option<String> {
    let bytes = hex::decode(token).ok()?;
    if bytes.len() != 6 {
        return None;
    }

    Some(format!("{}-{}:{}.{}.{}.{}",
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]))
}

/// Runs both identifier patterns over the whole raw line. Neither pattern
/// short-circuits the other and each may match several times.
pub fn extract_identifiers(raw_line: &str) -> ExtractedIdentifiers {
    let decimal = DECIMAL_OBIS.captures_iter(raw_line)
        .map(|c| c[1].trim().to_string())
        .collect();

    let hex = HEX_OBIS.captures_iter(raw_line)
        .map(|c| c[1].to_string())
        .collect();

    ExtractedIdentifiers { decimal, hex }
}

/// Accepts a dotted identifier or a (brace wrapped) hex digest and returns
/// the dotted form. Anything else is returned trimmed but unchanged.
pub fn canonicalize_obis_code(code: &str) -> String {
    let cleaned: String = code.chars()
        .filter(|c| !c.is_whitespace() && *c != '{' && *c != '}')
        .collect();

    if cleaned.len() == 12 {
        if let Some(decoded) = decode_hex(&cleaned) {
            return decoded;
        }
    }
    code.trim().to_string()
}

pub fn validate_obis_code(code: &str) -> bool {
    // OBIS code format: A-B:C.D.E.F, every group 0-255

    let parts: Vec<&str> = code.split(':').collect();
    if parts.len() != 2 {
        return false;
    }

    let ab_parts: Vec<&str> = parts[0].split('-').collect();
    if ab_parts.len() != 2 {
        return false;
    }

    let cdef_parts: Vec<&str> = parts[1].split('.').collect();
    if cdef_parts.len() != 4 {
        return false;
    }

    for part in ab_parts.iter().chain(cdef_parts.iter()) {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        if part.parse::<u8>().is_err() {
            return false;
        }
    }

    true
}

/// Lookup key form of a code
pub fn normalize_obis_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("0000010008FF"), Some("0-0:1.0.8.255".to_string()));
        assert_eq!(decode_hex("0100010800ff"), Some("1-0:1.8.0.255".to_string()));
        assert_eq!(decode_hex("0000600100FF"), Some("0-0:96.1.0.255".to_string()));
        assert_eq!(decode_hex("00006001"), None);
        assert_eq!(decode_hex("ZZ00600100FF"), None);
    }

    #[test]
    fn test_extract_identifiers_both_encodings() {
        let found = extract_identifiers("Active energy\t1-0:1.8.0.255\t{0100010800FF}\tkWh");
        assert_eq!(found.decimal, vec!["1-0:1.8.0.255".to_string()]);
        assert_eq!(found.hex, vec!["0100010800FF".to_string()]);
    }

    #[test]
    fn test_extract_identifiers_multiple_and_none() {
        let found = extract_identifiers("0-0:1.0.0.255 and 1-0:32.7.0.255");
        assert_eq!(found.decimal.len(), 2);
        assert!(found.hex.is_empty());

        assert!(extract_identifiers("Section header without codes").is_empty());
        assert!(extract_identifiers("").is_empty());
    }

    #[test]
    fn test_canonicalize_obis_code() {
        assert_eq!(canonicalize_obis_code("{0000600100FF}"), "0-0:96.1.0.255");
        assert_eq!(canonicalize_obis_code(" 0-0:96.1.0.255 "), "0-0:96.1.0.255");
    }

    #[test]
    fn test_validate_obis_code() {
        assert!(validate_obis_code("1-0:1.8.0.255"));
        assert!(validate_obis_code("0-0:96.1.0.255"));
        assert!(!validate_obis_code("1-0:1.8.0"));
        assert!(!validate_obis_code("1-0:1.8.0.256"));
        assert!(!validate_obis_code("invalid"));
        assert!(!validate_obis_code(" 1-0:1.8.0.255"));
    }

    #[test]
    fn test_normalize_obis_code() {
        assert_eq!(normalize_obis_code("  1-0:1.8.0.255  "), "1-0:1.8.0.255");
    }
}
