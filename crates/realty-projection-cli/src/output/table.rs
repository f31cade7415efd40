use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables: scalar result fields first, then one table per
/// nested row set (schedule items, correction steps, projection entries).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result(result, map),
            None => print_fields(map),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_sections(res_map),
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow().bold());
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalars go into one Field/Value table; arrays of objects and nested
/// objects each get their own titled table.
fn print_sections(map: &Map<String, Value>) {
    let mut scalars = Map::new();
    let mut nested: Vec<(&String, &Value)> = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(arr) if arr.iter().any(Value::is_object) => nested.push((key, val)),
            Value::Object(_) => nested.push((key, val)),
            _ => {
                scalars.insert(key.clone(), val.clone());
            }
        }
    }

    if !scalars.is_empty() {
        print_fields(&scalars);
    }
    for (key, val) in nested {
        println!("\n{}", title(key).bold());
        match val {
            Value::Array(arr) => print_rows(arr),
            Value::Object(obj) => print_fields(obj),
            _ => {}
        }
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Headers are the union of keys in first-seen order; optional fields
    // (reinforcement, key payment) appear only on some rows.
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
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_cell).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn title(key: &str) -> String {
    key.split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Cells show nested base/corrected pairs as "base -> corrected".
fn format_cell(value: &Value) -> String {
    if let Value::Object(map) = value {
        if let (Some(base), Some(corrected)) = (map.get("base"), map.get("corrected")) {
            return format!("{} -> {}", format_value(base), format_value(corrected));
        }
    }
    format_value(value)
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
