use serde_json::Value;

/// Fields that answer each command, in priority order.
const PRIORITY_KEYS: [&str; 5] = [
    "base_installment",
    "final_accumulated",
    "roi",
    "irr",
    "net_profit",
];

/// Print just the headline figure of a result.
///
/// Projections print one `scenario: strategy roi` line per scenario from the
/// most-favorable summaries; other results print the first populated
/// priority field, falling back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Array(summaries)) = result_obj.get("summaries") {
        for s in summaries {
            let roi = s.get("roi");
            println!(
                "{}: roi {} ({})",
                s.get("scenario").map(format_minimal).unwrap_or_default(),
                roi.and_then(|r| r.get("value"))
                    .map(format_minimal)
                    .unwrap_or_else(|| "null".into()),
                roi.and_then(|r| r.get("strategy"))
                    .map(format_minimal)
                    .unwrap_or_else(|| "-".into()),
            );
        }
        return;
    }

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                println!("{}", format_minimal(val));
                return;
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
