use serde_json::Value;
use std::io;

/// Row sets that make the natural CSV body for each command.
const ROW_KEYS: [&str; 5] = ["items", "steps", "entries", "events", "cash_flow"];

/// Write output as CSV to stdout. Results holding a row set (schedule items,
/// correction steps, projection entries) are written one row per element;
/// anything else as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            let rows = ROW_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_array));
            match rows {
                Some(arr) => write_rows(&mut wtr, arr),
                None => {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in map {
                        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                    }
                }
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        other => {
            let _ = wtr.write_record([&format_csv_value(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let mut headers: Vec<String> = Vec::new();
    for item in arr {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
    }

    if headers.is_empty() {
        // Plain vector (e.g. cash flows): month index plus value
        let _ = wtr.write_record(["month", "value"]);
        for (month, item) in arr.iter().enumerate() {
            let _ = wtr.write_record([month.to_string(), format_csv_value(item)]);
        }
        return;
    }

    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Object(map) => match (map.get("base"), map.get("corrected")) {
            (Some(_), Some(corrected)) => format_csv_value(corrected),
            _ => serde_json::to_string(value).unwrap_or_default(),
        },
        Value::Array(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
