use crate::models::ObisCodeEntry;

pub fn apply_scaler(value: f64, scaler: Option<i8>) -> f64 {
    match scaler {
        Some(s) if s != 0 => value * 10_f64.powi(s as i32),
        _ => value,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{:.6}", value).trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Renders a raw register value with the scaler and unit of its entry
pub fn format_value(entry: Option<&ObisCodeEntry>, value: f64) -> String {
    let Some(entry) = entry else {
        return format_number(value);
    };

    let scaled = format_number(apply_scaler(value, entry.scaler));
    match entry.unit.as_deref() {
        Some(unit) if !unit.is_empty() => format!("{} {}", scaled, unit),
        _ => scaled,
    }
}
