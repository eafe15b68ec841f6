use super::CellValue;

/// Marker printed for cells that failed to evaluate.
pub const ERROR_MARKER: &str = "#ERR";

/// Format a resolved value for display.
pub fn format_value(value: &CellValue) -> String {
    match value {
        CellValue::Integer(n) => n.to_string(),
        CellValue::Empty => String::new(),
        CellValue::Error => ERROR_MARKER.to_string(),
    }
}
