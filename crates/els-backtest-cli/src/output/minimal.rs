use serde_json::Value;

/// Key answer fields, most specific first.
const PRIORITY_KEYS: [&str; 5] = [
    "success_rate",
    "net_return",
    "mean_return",
    "maturity_date",
    "issuance_date",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known fields in the result and in its nested objects
/// (`statistics`, `case`), then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
            let direct = map.get(*key);
            let nested = || {
                map.values()
                    .filter_map(Value::as_object)
                    .find_map(|inner| inner.get(*key))
            };
            if let Some(val) = direct.or_else(nested) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
