pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    log::debug!("rendering output as {format:?}");
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render one JSON value as a plain cell. Decimals arrive as strings, so
/// they print without quotes; nested values fall back to compact JSON.
pub fn cell(value: &Value, null: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_renders_decimal_strings_bare() {
        assert_eq!(cell(&json!("1111.66"), ""), "1111.66");
        assert_eq!(cell(&json!(25), ""), "25");
        assert_eq!(cell(&json!(true), ""), "true");
    }

    #[test]
    fn test_cell_null_placeholder_is_per_format() {
        assert_eq!(cell(&Value::Null, ""), "");
        assert_eq!(cell(&Value::Null, "null"), "null");
    }

    #[test]
    fn test_cell_nested_values_are_compact_json() {
        assert_eq!(
            cell(&json!({ "status": "converged" }), ""),
            r#"{"status":"converged"}"#
        );
    }
}
