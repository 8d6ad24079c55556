use serde_json::Value;

use super::{format_scalar, result_of};

/// Print just the headline figure of the result.
pub fn print_minimal(value: &Value) {
    let result_obj = result_of(value);

    let priority_keys = ["total_expected_yield", "assigned_count", "loans_processed"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result_obj));
}
