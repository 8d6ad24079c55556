use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, is_record_list, result_of};

/// Format output as tables: one for the scalar result fields, then one per
/// record list (assignments, yields, capacity, rejections).
pub fn print_table(value: &Value) {
    match result_of(value) {
        Value::Object(result) => {
            print_scalars(result);
            for (key, val) in result {
                if let Value::Array(rows) = val {
                    if is_record_list(val) {
                        println!("\n{}:", key);
                        print_records(rows);
                    }
                }
            }
        }
        Value::Array(rows) => print_records(rows),
        other => println!("{}", format_scalar(other)),
    }

    if let Some(envelope) = value.as_object() {
        print_envelope_notes(envelope);
    }
}

fn print_scalars(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if !is_record_list(val) {
            builder.push_record([key.as_str(), &format_scalar(val)]);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_records(rows: &[Value]) {
    let headers: Vec<String> = match rows.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => {
            for row in rows {
                println!("{}", format_scalar(row));
            }
            return;
        }
    };

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let cells: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_scalar).unwrap_or_default())
                .collect();
            builder.push_record(cells);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
