use serde_json::{Map, Value};
use std::io;

/// Record lists written as rows in preference to a field/value dump.
const TABULAR_KEYS: [&str; 3] = ["cases", "observations", "yearly"];

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            match TABULAR_KEYS
                .iter()
                .find_map(|k| result.get(*k).and_then(Value::as_array))
            {
                Some(rows) => write_array_csv(&mut wtr, rows),
                None => write_fields_csv(&mut wtr, result),
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// Two-column CSV with nested objects flattened to dotted keys.
fn write_fields_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    let mut rows = Vec::new();
    flatten("", map, &mut rows);
    for (key, val) in rows {
        let _ = wtr.write_record([key.as_str(), val.as_str()]);
    }
}

fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(nested) => flatten(&name, nested, out),
            _ => out.push((name, format_csv_value(val))),
        }
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first
            .iter()
            .filter(|(_, v)| !v.is_object() || v.get("date").is_some() || v.get("status").is_some())
            .map(|(k, _)| k.as_str())
            .collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Object(map) => match (map.get("date"), map.get("status")) {
            (Some(date), _) => format_csv_value(date),
            (None, Some(status)) => format_csv_value(status),
            _ => serde_json::to_string(value).unwrap_or_default(),
        },
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
