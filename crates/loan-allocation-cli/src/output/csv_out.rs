use serde_json::Value;
use std::io;

use super::{format_scalar, is_record_list, result_of};

/// Write output as CSV to stdout.
///
/// Scalar result fields come first as `field,value` rows; each record list
/// follows as its own headered block.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    match result_of(value) {
        Value::Object(map) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                if !is_record_list(val) {
                    let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
                }
            }
            for val in map.values() {
                if let Value::Array(rows) = val {
                    if is_record_list(val) {
                        write_records(&mut wtr, rows);
                    }
                }
            }
        }
        Value::Array(rows) => write_records(&mut wtr, rows),
        other => {
            let _ = wtr.write_record([&format_scalar(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_records<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let headers: Vec<&str> = match rows.first() {
        Some(Value::Object(first)) => first.keys().map(|k| k.as_str()).collect(),
        _ => {
            for row in rows {
                let _ = wtr.write_record([&format_scalar(row)]);
            }
            return;
        }
    };

    let _ = wtr.write_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let cells: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&cells);
        }
    }
}
