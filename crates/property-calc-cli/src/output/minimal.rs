use super::cell;
use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    // Try to extract the "result" envelope, preferring the headline summary
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    let result_obj = result_obj.get("summary").unwrap_or(result_obj);

    // Priority list of key output fields
    let priority_keys = [
        "monthly_payment",
        "total",
        "rate_percent",
        "last_estimate_percent",
        "reason",
        "cashflow_per_unit",
        "profit",
        "max_purchase_price",
        "max_renovation_budget",
        "irr",
        "failed",
    ];

    if let Value::Object(map) = result_obj {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", cell(val, "null"));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, cell(val, "null"));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", cell(result_obj, "null"));
}
